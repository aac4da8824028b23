//! Entity trait - common interface for all stored quality records

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};

use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// Common trait for all stored entities
pub trait Entity: Serialize + DeserializeOwned + Clone {
    /// The entity type prefix (e.g., NCR, CAPA)
    const PREFIX: EntityPrefix;

    /// Human-readable kind used in error messages
    const KIND: &'static str;

    /// Get the entity's unique ID
    fn id(&self) -> &EntityId;

    /// Get the owning tenant
    fn tenant_id(&self) -> &TenantId;

    /// Get the creation timestamp
    fn created_at(&self) -> DateTime<Utc>;

    /// Current lifecycle status as a label
    fn status_label(&self) -> String;
}

/// Priority values shared by CAPAs and their actions
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[derive(Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn all() -> &'static [Priority] {
        &[
            Priority::Critical,
            Priority::High,
            Priority::Medium,
            Priority::Low,
        ]
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Priority::Low => write!(f, "low"),
            Priority::Medium => write!(f, "medium"),
            Priority::High => write!(f, "high"),
            Priority::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!("Unknown priority: {}", s)),
        }
    }
}

/// Outcome of an external or supplier audit
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum AuditResult {
    #[default]
    Pass,
    Conditional,
    Fail,
}

impl AuditResult {
    pub fn all() -> &'static [AuditResult] {
        &[AuditResult::Pass, AuditResult::Conditional, AuditResult::Fail]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AuditResult::Pass => "pass",
            AuditResult::Conditional => "conditional",
            AuditResult::Fail => "fail",
        }
    }
}

impl std::fmt::Display for AuditResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AuditResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        AuditResult::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| format!("Invalid audit result: {}. Use pass, conditional, or fail", s))
    }
}
