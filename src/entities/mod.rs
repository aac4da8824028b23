//! Entity type definitions
//!
//! - [`Ncr`] - Non-conformance reports with containment, investigation and disposition
//! - [`Capa`] - Corrective/preventive actions with root cause analysis and effectiveness checks
//! - [`SupplierQualification`] - Supplier qualification state, evaluations, audits and performance
//! - [`Inspection`] - Sampled inspections with checks, defects and a reviewed verdict
//! - [`QualityChecklist`] / [`DefectCode`] - Inspection templates and the defect catalogue
//! - [`Certification`] - Certificates with audits, renewals and expiry tracking
//! - [`QualityDocument`] - Controlled documents with review, approval and revisions

pub mod capa;
pub mod certification;
pub mod checklist;
pub mod document;
pub mod inspection;
pub mod ncr;
pub mod supplier;

pub use capa::Capa;
pub use certification::Certification;
pub use checklist::{DefectCode, QualityChecklist};
pub use document::QualityDocument;
pub use inspection::Inspection;
pub use ncr::Ncr;
pub use supplier::SupplierQualification;
