//! Controlled quality document entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// Document family; each family has its own numbering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    #[default]
    Procedure,
    WorkInstruction,
    Specification,
    Standard,
    Form,
    Template,
    Policy,
    Manual,
    Drawing,
    Certificate,
    AuditReport,
    InspectionReport,
    CalibrationRecord,
    TrainingRecord,
}

impl DocumentType {
    pub fn all() -> &'static [DocumentType] {
        &[
            DocumentType::Procedure,
            DocumentType::WorkInstruction,
            DocumentType::Specification,
            DocumentType::Standard,
            DocumentType::Form,
            DocumentType::Template,
            DocumentType::Policy,
            DocumentType::Manual,
            DocumentType::Drawing,
            DocumentType::Certificate,
            DocumentType::AuditReport,
            DocumentType::InspectionReport,
            DocumentType::CalibrationRecord,
            DocumentType::TrainingRecord,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentType::Procedure => "procedure",
            DocumentType::WorkInstruction => "work_instruction",
            DocumentType::Specification => "specification",
            DocumentType::Standard => "standard",
            DocumentType::Form => "form",
            DocumentType::Template => "template",
            DocumentType::Policy => "policy",
            DocumentType::Manual => "manual",
            DocumentType::Drawing => "drawing",
            DocumentType::Certificate => "certificate",
            DocumentType::AuditReport => "audit_report",
            DocumentType::InspectionReport => "inspection_report",
            DocumentType::CalibrationRecord => "calibration_record",
            DocumentType::TrainingRecord => "training_record",
        }
    }

    /// Number prefix (e.g., "WI" for work instructions)
    pub fn prefix(&self) -> &'static str {
        match self {
            DocumentType::Procedure => "PROC",
            DocumentType::WorkInstruction => "WI",
            DocumentType::Specification => "SPEC",
            DocumentType::Standard => "STD",
            DocumentType::Form => "FORM",
            DocumentType::Template => "TMPL",
            DocumentType::Policy => "POL",
            DocumentType::Manual => "MAN",
            DocumentType::Drawing => "DWG",
            DocumentType::Certificate => "CERT",
            DocumentType::AuditReport => "AUD",
            DocumentType::InspectionReport => "INSP",
            DocumentType::CalibrationRecord => "CAL",
            DocumentType::TrainingRecord => "TRN",
        }
    }
}

impl std::fmt::Display for DocumentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        DocumentType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized || t.prefix().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("Invalid document type: {}", s))
    }
}

/// Document control status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    #[default]
    Draft,
    PendingReview,
    UnderReview,
    PendingApproval,
    Approved,
    Released,
    Obsolete,
    Archived,
}

impl DocumentStatus {
    pub fn all() -> &'static [DocumentStatus] {
        &[
            DocumentStatus::Draft,
            DocumentStatus::PendingReview,
            DocumentStatus::UnderReview,
            DocumentStatus::PendingApproval,
            DocumentStatus::Approved,
            DocumentStatus::Released,
            DocumentStatus::Obsolete,
            DocumentStatus::Archived,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Draft => "draft",
            DocumentStatus::PendingReview => "pending_review",
            DocumentStatus::UnderReview => "under_review",
            DocumentStatus::PendingApproval => "pending_approval",
            DocumentStatus::Approved => "approved",
            DocumentStatus::Released => "released",
            DocumentStatus::Obsolete => "obsolete",
            DocumentStatus::Archived => "archived",
        }
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DocumentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        DocumentStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid document status: {}", s))
    }
}

/// Who may read a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    #[default]
    Internal,
    Confidential,
    Restricted,
}

impl AccessLevel {
    pub fn all() -> &'static [AccessLevel] {
        &[
            AccessLevel::Public,
            AccessLevel::Internal,
            AccessLevel::Confidential,
            AccessLevel::Restricted,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Internal => "internal",
            AccessLevel::Confidential => "confidential",
            AccessLevel::Restricted => "restricted",
        }
    }
}

impl std::fmt::Display for AccessLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        AccessLevel::all()
            .iter()
            .copied()
            .find(|level| level.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid access level: {}. Use public, internal, confidential, or restricted",
                    s
                )
            })
    }
}

/// Entry in a document's revision history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentRevision {
    pub version: String,

    pub revision: u32,

    pub change_description: String,

    pub changed_by: String,

    pub changed_at: DateTime<Utc>,
}

/// A controlled document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityDocument {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// Document number (e.g., "WI-00012"), unique per tenant and type
    pub document_number: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub document_type: DocumentType,

    #[serde(default)]
    pub status: DocumentStatus,

    /// `<major>.<revision>`, starting at "1.0"
    pub version: String,

    #[serde(default)]
    pub revision: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    pub owner_id: String,

    #[serde(default)]
    pub access_level: AccessLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_comments: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approver_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effective_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub released_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub superseded_by: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obsolete_reason: Option<String>,

    #[serde(default)]
    pub revision_history: Vec<DocumentRevision>,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for QualityDocument {
    const PREFIX: EntityPrefix = EntityPrefix::Doc;
    const KIND: &'static str = "Document";

    fn id(&self) -> &EntityId {
        &self.id
    }

    fn tenant_id(&self) -> &TenantId {
        &self.tenant_id
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn status_label(&self) -> String {
        self.status.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateDocument {
    pub title: String,
    pub description: Option<String>,
    pub document_type: DocumentType,
    pub category: Option<String>,
    pub department_id: Option<String>,
    pub owner_id: String,
    pub access_level: AccessLevel,
    pub content: Option<String>,
    pub tags: Vec<String>,
    pub created_by: String,
}

/// Fields a draft may change; `None` leaves a field as it is
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateDocument {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub department_id: Option<String>,
    pub access_level: Option<AccessLevel>,
    pub content: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl QualityDocument {
    pub fn new(tenant_id: TenantId, document_number: String, input: CreateDocument) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Doc),
            tenant_id,
            document_number,
            title: input.title,
            description: input.description,
            document_type: input.document_type,
            status: DocumentStatus::Draft,
            version: "1.0".to_string(),
            revision: 0,
            category: input.category,
            department_id: input.department_id,
            owner_id: input.owner_id,
            access_level: input.access_level,
            content: input.content,
            tags: input.tags,
            reviewer_id: None,
            reviewed_at: None,
            review_comments: None,
            approver_id: None,
            approved_at: None,
            effective_date: None,
            released_at: None,
            superseded_by: None,
            obsolete_reason: None,
            revision_history: vec![DocumentRevision {
                version: "1.0".to_string(),
                revision: 0,
                change_description: "Initial creation".to_string(),
                changed_by: input.created_by.clone(),
                changed_at: now,
            }],
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Start the next revision: bump the counter and derive the version from it
    pub fn bump_revision(&mut self, change_description: String, changed_by: String) {
        let major = self.version.split('.').next().unwrap_or("1").to_string();
        self.revision += 1;
        self.version = format!("{}.{}", major, self.revision);
        self.revision_history.push(DocumentRevision {
            version: self.version.clone(),
            revision: self.revision,
            change_description,
            changed_by,
            changed_at: Utc::now(),
        });
    }

    /// Case-insensitive match on title, number and description
    pub fn matches_text(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.title.to_lowercase().contains(&needle)
            || self.document_number.to_lowercase().contains(&needle)
            || self
                .description
                .as_deref()
                .is_some_and(|d| d.to_lowercase().contains(&needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> QualityDocument {
        QualityDocument::new(
            TenantId::new("acme").unwrap(),
            "WI-00001".to_string(),
            CreateDocument {
                title: "Torque sequence for housing".to_string(),
                document_type: DocumentType::WorkInstruction,
                owner_id: "eng".to_string(),
                created_by: "eng".to_string(),
                ..CreateDocument::default()
            },
        )
    }

    #[test]
    fn test_new_document_starts_at_one_zero() {
        let doc = document();
        assert_eq!(doc.status, DocumentStatus::Draft);
        assert_eq!(doc.version, "1.0");
        assert_eq!(doc.revision, 0);
        assert_eq!(doc.revision_history.len(), 1);
        assert_eq!(doc.revision_history[0].change_description, "Initial creation");
    }

    #[test]
    fn test_bump_revision_keeps_major() {
        let mut doc = document();
        doc.bump_revision("New torque values".to_string(), "eng".to_string());
        doc.bump_revision("Typo".to_string(), "eng".to_string());
        assert_eq!(doc.version, "1.2");
        assert_eq!(doc.revision, 2);
        assert_eq!(doc.revision_history.last().unwrap().version, "1.2");
    }

    #[test]
    fn test_matches_text() {
        let doc = document();
        assert!(doc.matches_text("TORQUE"));
        assert!(doc.matches_text("wi-0000"));
        assert!(!doc.matches_text("welding"));
    }

    #[test]
    fn test_type_accepts_name_or_prefix() {
        assert_eq!("wi".parse::<DocumentType>().unwrap(), DocumentType::WorkInstruction);
        assert_eq!(
            "work-instruction".parse::<DocumentType>().unwrap(),
            DocumentType::WorkInstruction
        );
        assert!("memo".parse::<DocumentType>().is_err());
    }
}
