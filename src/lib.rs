//! QMS: quality issue lifecycle engine
//!
//! Non-conformance reports and corrective/preventive actions move through
//! guarded state machines, numbered per tenant and year, cross-linked with
//! each other and with supplier qualifications. The [`quality::QualityEngine`]
//! is the entry point; the `qms` binary drives it over a project-local
//! SQLite database.

pub mod cli;
pub mod core;
pub mod entities;
pub mod quality;
