//! Core module - fundamental types and utilities

pub mod config;
pub mod entity;
pub mod error;
pub mod events;
pub mod identity;
pub mod logging;
pub mod project;
pub mod sequence;
pub mod sqlite;
pub mod store;

pub use config::Config;
pub use entity::{AuditResult, Entity, Priority};
pub use error::{QualityError, QualityResult};
pub use events::{DomainEvent, EventPublisher, NullPublisher, RecordingPublisher, TracingPublisher};
pub use identity::{EntityId, EntityPrefix, IdParseError, TenantId};
pub use project::{Project, ProjectError};
pub use sequence::{SequenceGenerator, SequenceKind};
pub use sqlite::SqliteStore;
pub use store::{MemoryStore, QualityStore, Repository};
