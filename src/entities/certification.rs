//! Certification entity
//!
//! Certificates held by the organisation, its suppliers, products, equipment
//! or staff, with their surveillance audits and renewals.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{AuditResult, Entity};
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// Days before expiry at which a certificate counts as expiring soon
pub const EXPIRY_WARNING_DAYS: i64 = 30;

/// Standard or scheme a certificate is issued under
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CertificationType {
    #[serde(rename = "iso_9001")]
    Iso9001,
    #[serde(rename = "iso_14001")]
    Iso14001,
    #[serde(rename = "iso_45001")]
    Iso45001,
    #[serde(rename = "iso_27001")]
    Iso27001,
    #[serde(rename = "iatf_16949")]
    Iatf16949,
    #[serde(rename = "as9100")]
    As9100,
    #[serde(rename = "ce_mark")]
    CeMark,
    #[serde(rename = "ul")]
    Ul,
    #[serde(rename = "fda")]
    Fda,
    #[serde(rename = "rohs")]
    Rohs,
    #[serde(rename = "reach")]
    Reach,
    #[serde(rename = "supplier")]
    Supplier,
    #[serde(rename = "product")]
    Product,
    #[serde(rename = "calibration")]
    Calibration,
    #[serde(rename = "training")]
    Training,
    #[default]
    #[serde(rename = "other")]
    Other,
}

impl CertificationType {
    pub fn all() -> &'static [CertificationType] {
        &[
            CertificationType::Iso9001,
            CertificationType::Iso14001,
            CertificationType::Iso45001,
            CertificationType::Iso27001,
            CertificationType::Iatf16949,
            CertificationType::As9100,
            CertificationType::CeMark,
            CertificationType::Ul,
            CertificationType::Fda,
            CertificationType::Rohs,
            CertificationType::Reach,
            CertificationType::Supplier,
            CertificationType::Product,
            CertificationType::Calibration,
            CertificationType::Training,
            CertificationType::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationType::Iso9001 => "iso_9001",
            CertificationType::Iso14001 => "iso_14001",
            CertificationType::Iso45001 => "iso_45001",
            CertificationType::Iso27001 => "iso_27001",
            CertificationType::Iatf16949 => "iatf_16949",
            CertificationType::As9100 => "as9100",
            CertificationType::CeMark => "ce_mark",
            CertificationType::Ul => "ul",
            CertificationType::Fda => "fda",
            CertificationType::Rohs => "rohs",
            CertificationType::Reach => "reach",
            CertificationType::Supplier => "supplier",
            CertificationType::Product => "product",
            CertificationType::Calibration => "calibration",
            CertificationType::Training => "training",
            CertificationType::Other => "other",
        }
    }
}

impl std::fmt::Display for CertificationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertificationType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        CertificationType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Invalid certification type: {}", s))
    }
}

/// Certificate validity status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationStatus {
    #[default]
    Pending,
    Active,
    ExpiringSoon,
    Expired,
    Suspended,
    Withdrawn,
    Renewed,
}

impl CertificationStatus {
    pub fn all() -> &'static [CertificationStatus] {
        &[
            CertificationStatus::Pending,
            CertificationStatus::Active,
            CertificationStatus::ExpiringSoon,
            CertificationStatus::Expired,
            CertificationStatus::Suspended,
            CertificationStatus::Withdrawn,
            CertificationStatus::Renewed,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationStatus::Pending => "pending",
            CertificationStatus::Active => "active",
            CertificationStatus::ExpiringSoon => "expiring_soon",
            CertificationStatus::Expired => "expired",
            CertificationStatus::Suspended => "suspended",
            CertificationStatus::Withdrawn => "withdrawn",
            CertificationStatus::Renewed => "renewed",
        }
    }

    /// States the expiry sweep looks at
    pub fn is_tracked(&self) -> bool {
        matches!(
            self,
            CertificationStatus::Active
                | CertificationStatus::Renewed
                | CertificationStatus::ExpiringSoon
        )
    }
}

impl std::fmt::Display for CertificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        CertificationStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid certification status: {}", s))
    }
}

/// Kind of certification-body audit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CertificationAuditType {
    Initial,
    #[default]
    Surveillance,
    Recertification,
    Special,
}

impl CertificationAuditType {
    pub fn all() -> &'static [CertificationAuditType] {
        &[
            CertificationAuditType::Initial,
            CertificationAuditType::Surveillance,
            CertificationAuditType::Recertification,
            CertificationAuditType::Special,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CertificationAuditType::Initial => "initial",
            CertificationAuditType::Surveillance => "surveillance",
            CertificationAuditType::Recertification => "recertification",
            CertificationAuditType::Special => "special",
        }
    }
}

impl std::fmt::Display for CertificationAuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CertificationAuditType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        CertificationAuditType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Invalid audit type: {}", s))
    }
}

/// Audit by the certification body
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationAudit {
    pub id: EntityId,

    pub audit_date: DateTime<Utc>,

    pub audit_type: CertificationAuditType,

    pub auditor: String,

    pub result: AuditResult,

    #[serde(default)]
    pub findings: u32,

    #[serde(default)]
    pub major_findings: u32,

    #[serde(default)]
    pub minor_findings: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Validity extension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CertificationRenewal {
    pub id: EntityId,

    pub renewal_date: DateTime<Utc>,

    pub previous_expiry_date: DateTime<Utc>,

    pub new_expiry_date: DateTime<Utc>,

    pub renewed_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A certificate and its audit history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Certification {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// Internal number (e.g., "CERT-2026-00004"), unique per tenant
    pub certification_number: String,

    pub name: String,

    pub certification_type: CertificationType,

    #[serde(default)]
    pub status: CertificationStatus,

    pub issuing_body: String,

    /// Number printed on the certificate by the issuing body
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,

    pub issue_date: DateTime<Utc>,

    pub expiry_date: DateTime<Utc>,

    // Holder: at most one of these is usually set; none means the organisation itself
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equipment_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_audit_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_audit_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub audits: Vec<CertificationAudit>,

    #[serde(default)]
    pub renewals: Vec<CertificationRenewal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Certification {
    const PREFIX: EntityPrefix = EntityPrefix::Cert;
    const KIND: &'static str = "Certification";

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

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCertification {
    pub name: String,
    pub certification_type: CertificationType,
    pub issuing_body: String,
    pub certificate_number: Option<String>,
    pub scope: Option<String>,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
    pub supplier_id: Option<String>,
    pub product_id: Option<String>,
    pub equipment_id: Option<String>,
    pub employee_id: Option<String>,
    pub next_audit_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub created_by: String,
}

impl Default for CreateCertification {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            name: String::new(),
            certification_type: CertificationType::default(),
            issuing_body: String::new(),
            certificate_number: None,
            scope: None,
            issue_date: now,
            expiry_date: now + Duration::days(3 * 365),
            supplier_id: None,
            product_id: None,
            equipment_id: None,
            employee_id: None,
            next_audit_date: None,
            notes: None,
            created_by: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordCertificationAudit {
    pub audit_date: DateTime<Utc>,
    pub audit_type: CertificationAuditType,
    pub auditor: String,
    pub result: AuditResult,
    pub findings: u32,
    pub major_findings: u32,
    pub minor_findings: u32,
    pub next_audit_date: Option<DateTime<Utc>>,
    pub notes: Option<String>,
}

impl Default for RecordCertificationAudit {
    fn default() -> Self {
        Self {
            audit_date: Utc::now(),
            audit_type: CertificationAuditType::default(),
            auditor: String::new(),
            result: AuditResult::default(),
            findings: 0,
            major_findings: 0,
            minor_findings: 0,
            next_audit_date: None,
            notes: None,
        }
    }
}

/// Status an active certificate should have at `now`, or `None` to leave it
pub fn expiry_status(expiry_date: DateTime<Utc>, now: DateTime<Utc>) -> Option<CertificationStatus> {
    if expiry_date <= now {
        Some(CertificationStatus::Expired)
    } else if expiry_date <= now + Duration::days(EXPIRY_WARNING_DAYS) {
        Some(CertificationStatus::ExpiringSoon)
    } else {
        None
    }
}

impl Certification {
    pub fn new(tenant_id: TenantId, certification_number: String, input: CreateCertification) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Cert),
            tenant_id,
            certification_number,
            name: input.name,
            certification_type: input.certification_type,
            status: CertificationStatus::Pending,
            issuing_body: input.issuing_body,
            certificate_number: input.certificate_number,
            scope: input.scope,
            issue_date: input.issue_date,
            expiry_date: input.expiry_date,
            supplier_id: input.supplier_id,
            product_id: input.product_id,
            equipment_id: input.equipment_id,
            employee_id: input.employee_id,
            last_audit_date: None,
            next_audit_date: input.next_audit_date,
            audits: Vec::new(),
            renewals: Vec::new(),
            status_reason: None,
            notes: input.notes,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        }
    }

    /// Whole days until expiry, negative once expired
    pub fn days_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        (self.expiry_date - now).num_days()
    }

    /// Who or what holds the certification, as `kind:id`
    pub fn holder(&self) -> Option<String> {
        [
            ("supplier", &self.supplier_id),
            ("product", &self.product_id),
            ("equipment", &self.equipment_id),
            ("employee", &self.employee_id),
        ]
        .into_iter()
        .find_map(|(kind, id)| id.as_ref().map(|id| format!("{}:{}", kind, id)))
    }
}
