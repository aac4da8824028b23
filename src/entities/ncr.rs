//! NCR entity type - Non-Conformance Reports for detected quality defects

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// NCR type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcrType {
    #[default]
    Product,
    Process,
    Service,
    Supplier,
    CustomerComplaint,
    InternalAudit,
    ExternalAudit,
    Regulatory,
}

impl NcrType {
    pub fn all() -> &'static [NcrType] {
        &[
            NcrType::Product,
            NcrType::Process,
            NcrType::Service,
            NcrType::Supplier,
            NcrType::CustomerComplaint,
            NcrType::InternalAudit,
            NcrType::ExternalAudit,
            NcrType::Regulatory,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NcrType::Product => "product",
            NcrType::Process => "process",
            NcrType::Service => "service",
            NcrType::Supplier => "supplier",
            NcrType::CustomerComplaint => "customer_complaint",
            NcrType::InternalAudit => "internal_audit",
            NcrType::ExternalAudit => "external_audit",
            NcrType::Regulatory => "regulatory",
        }
    }
}

impl std::fmt::Display for NcrType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NcrType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "product" => Ok(NcrType::Product),
            "process" => Ok(NcrType::Process),
            "service" => Ok(NcrType::Service),
            "supplier" => Ok(NcrType::Supplier),
            "customer_complaint" => Ok(NcrType::CustomerComplaint),
            "internal_audit" => Ok(NcrType::InternalAudit),
            "external_audit" => Ok(NcrType::ExternalAudit),
            "regulatory" => Ok(NcrType::Regulatory),
            _ => Err(format!(
                "Invalid NCR type: {}. Use product, process, service, supplier, customer_complaint, internal_audit, external_audit, or regulatory",
                s
            )),
        }
    }
}

/// NCR severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcrSeverity {
    Critical,
    Major,
    #[default]
    Minor,
    Observation,
}

impl NcrSeverity {
    pub fn all() -> &'static [NcrSeverity] {
        &[
            NcrSeverity::Critical,
            NcrSeverity::Major,
            NcrSeverity::Minor,
            NcrSeverity::Observation,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NcrSeverity::Critical => "critical",
            NcrSeverity::Major => "major",
            NcrSeverity::Minor => "minor",
            NcrSeverity::Observation => "observation",
        }
    }
}

impl std::fmt::Display for NcrSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NcrSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "critical" => Ok(NcrSeverity::Critical),
            "major" => Ok(NcrSeverity::Major),
            "minor" => Ok(NcrSeverity::Minor),
            "observation" => Ok(NcrSeverity::Observation),
            _ => Err(format!(
                "Invalid NCR severity: {}. Use critical, major, minor, or observation",
                s
            )),
        }
    }
}

/// Where the non-conformance was detected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcrSource {
    #[default]
    Inspection,
    Production,
    Customer,
    Audit,
    Supplier,
    Employee,
    ManagementReview,
}

impl NcrSource {
    pub fn all() -> &'static [NcrSource] {
        &[
            NcrSource::Inspection,
            NcrSource::Production,
            NcrSource::Customer,
            NcrSource::Audit,
            NcrSource::Supplier,
            NcrSource::Employee,
            NcrSource::ManagementReview,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NcrSource::Inspection => "inspection",
            NcrSource::Production => "production",
            NcrSource::Customer => "customer",
            NcrSource::Audit => "audit",
            NcrSource::Supplier => "supplier",
            NcrSource::Employee => "employee",
            NcrSource::ManagementReview => "management_review",
        }
    }
}

impl std::fmt::Display for NcrSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NcrSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "inspection" => Ok(NcrSource::Inspection),
            "production" => Ok(NcrSource::Production),
            "customer" => Ok(NcrSource::Customer),
            "audit" => Ok(NcrSource::Audit),
            "supplier" => Ok(NcrSource::Supplier),
            "employee" => Ok(NcrSource::Employee),
            "management_review" => Ok(NcrSource::ManagementReview),
            _ => Err(format!(
                "Invalid NCR source: {}. Use inspection, production, customer, audit, supplier, employee, or management_review",
                s
            )),
        }
    }
}

/// NCR workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NcrStatus {
    #[default]
    Draft,
    Open,
    UnderInvestigation,
    PendingDisposition,
    DispositionApproved,
    InProgress,
    PendingVerification,
    Closed,
    Cancelled,
}

impl NcrStatus {
    pub fn all() -> &'static [NcrStatus] {
        &[
            NcrStatus::Draft,
            NcrStatus::Open,
            NcrStatus::UnderInvestigation,
            NcrStatus::PendingDisposition,
            NcrStatus::DispositionApproved,
            NcrStatus::InProgress,
            NcrStatus::PendingVerification,
            NcrStatus::Closed,
            NcrStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            NcrStatus::Draft => "draft",
            NcrStatus::Open => "open",
            NcrStatus::UnderInvestigation => "under_investigation",
            NcrStatus::PendingDisposition => "pending_disposition",
            NcrStatus::DispositionApproved => "disposition_approved",
            NcrStatus::InProgress => "in_progress",
            NcrStatus::PendingVerification => "pending_verification",
            NcrStatus::Closed => "closed",
            NcrStatus::Cancelled => "cancelled",
        }
    }

    /// Closed or cancelled
    pub fn is_terminal(&self) -> bool {
        matches!(self, NcrStatus::Closed | NcrStatus::Cancelled)
    }
}

impl std::fmt::Display for NcrStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NcrStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        NcrStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid NCR status: {}", s))
    }
}

/// Containment action status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContainmentStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

impl std::fmt::Display for ContainmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContainmentStatus::Pending => write!(f, "pending"),
            ContainmentStatus::InProgress => write!(f, "in_progress"),
            ContainmentStatus::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for ContainmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "pending" => Ok(ContainmentStatus::Pending),
            "in_progress" => Ok(ContainmentStatus::InProgress),
            "completed" => Ok(ContainmentStatus::Completed),
            _ => Err(format!(
                "Invalid containment status: {}. Use pending, in_progress, or completed",
                s
            )),
        }
    }
}

/// Immediate action taken to contain the non-conforming material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainmentAction {
    pub id: EntityId,

    pub description: String,

    #[serde(default)]
    pub status: ContainmentStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// Disposition decision for non-conforming material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DispositionType {
    UseAsIs,
    Rework,
    Repair,
    #[default]
    Scrap,
    ReturnToSupplier,
    Regrade,
}

impl DispositionType {
    pub fn all() -> &'static [DispositionType] {
        &[
            DispositionType::UseAsIs,
            DispositionType::Rework,
            DispositionType::Repair,
            DispositionType::Scrap,
            DispositionType::ReturnToSupplier,
            DispositionType::Regrade,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DispositionType::UseAsIs => "use_as_is",
            DispositionType::Rework => "rework",
            DispositionType::Repair => "repair",
            DispositionType::Scrap => "scrap",
            DispositionType::ReturnToSupplier => "return_to_supplier",
            DispositionType::Regrade => "regrade",
        }
    }
}

impl std::fmt::Display for DispositionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DispositionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "use_as_is" | "useasis" => Ok(DispositionType::UseAsIs),
            "rework" => Ok(DispositionType::Rework),
            "repair" => Ok(DispositionType::Repair),
            "scrap" => Ok(DispositionType::Scrap),
            "return_to_supplier" | "rts" => Ok(DispositionType::ReturnToSupplier),
            "regrade" => Ok(DispositionType::Regrade),
            _ => Err(format!(
                "Invalid disposition: {}. Use use_as_is, rework, repair, scrap, return_to_supplier, or regrade",
                s
            )),
        }
    }
}

/// Approved disposition and its implementation record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Disposition {
    pub disposition_type: DispositionType,

    pub quantity: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub justification: Option<String>,

    pub approved_by: String,

    pub approved_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implemented_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub implemented_at: Option<DateTime<Utc>>,
}

/// Outcome of the investigation phase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investigation {
    pub root_cause: String,
    pub findings: String,
    pub investigated_by: String,
    pub investigated_at: DateTime<Utc>,
}

/// Cost impact. Components add up; none are validated for sign.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CostImpact {
    #[serde(default)]
    pub material_cost: f64,

    #[serde(default)]
    pub labor_cost: f64,

    #[serde(default)]
    pub rework_cost: f64,

    #[serde(default)]
    pub scrap_cost: f64,

    #[serde(default)]
    pub other_cost: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,
}

impl CostImpact {
    pub fn total(&self) -> f64 {
        self.material_cost + self.labor_cost + self.rework_cost + self.scrap_cost + self.other_cost
    }
}

/// References to records owned by other modules
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NcrLinks {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspection_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,
}

/// An NCR entity - Non-Conformance Report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ncr {
    /// Unique identifier
    pub id: EntityId,

    /// Owning tenant
    pub tenant_id: TenantId,

    /// NCR number (e.g., "NCR-2026-000042"), unique per tenant
    pub ncr_number: String,

    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub ncr_type: NcrType,

    #[serde(default)]
    pub severity: NcrSeverity,

    #[serde(default)]
    pub source: NcrSource,

    /// NCR workflow status
    #[serde(default)]
    pub status: NcrStatus,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quantity_affected: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default)]
    pub links: NcrLinks,

    /// Who detected the defect
    pub detected_by: String,

    pub detected_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,

    /// Target resolution date, drives the overdue view
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub containment_actions: Vec<ContainmentAction>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation: Option<Investigation>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<Disposition>,

    #[serde(default)]
    pub cost: CostImpact,

    /// Linked CAPA if one was raised
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capa_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capa_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Ncr {
    const PREFIX: EntityPrefix = EntityPrefix::Ncr;
    const KIND: &'static str = "NCR";

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

/// Fields accepted when raising an NCR
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateNcr {
    pub title: String,
    pub description: Option<String>,
    pub ncr_type: NcrType,
    pub severity: NcrSeverity,
    pub source: NcrSource,
    pub quantity_affected: Option<f64>,
    pub unit: Option<String>,
    pub links: NcrLinks,
    pub detected_by: String,
    pub assigned_to: Option<String>,
    pub target_date: Option<DateTime<Utc>>,
    pub tags: Vec<String>,
}

/// Findings recorded at the end of the investigation
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordInvestigation {
    pub root_cause: String,
    pub findings: String,
    pub investigated_by: String,
}

/// Disposition decision input
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetDisposition {
    pub disposition_type: DispositionType,
    pub quantity: f64,
    pub approved_by: String,
    pub justification: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddContainmentAction {
    pub description: String,
    pub assigned_to: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial update of a containment action; `None` leaves a field alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UpdateContainmentAction {
    pub status: Option<ContainmentStatus>,
    pub assigned_to: Option<String>,
    pub completed_by: Option<String>,
    pub notes: Option<String>,
}

/// Cost components to overwrite; `None` leaves a component alone
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SetNcrCost {
    pub material_cost: Option<f64>,
    pub labor_cost: Option<f64>,
    pub rework_cost: Option<f64>,
    pub scrap_cost: Option<f64>,
    pub other_cost: Option<f64>,
    pub currency: Option<String>,
}

impl Ncr {
    /// Build a draft NCR from creation input
    pub fn new(tenant_id: TenantId, ncr_number: String, input: CreateNcr) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Ncr),
            tenant_id,
            ncr_number,
            title: input.title,
            description: input.description,
            ncr_type: input.ncr_type,
            severity: input.severity,
            source: input.source,
            status: NcrStatus::Draft,
            quantity_affected: input.quantity_affected,
            unit: input.unit,
            links: input.links,
            detected_by: input.detected_by,
            detected_at: now,
            assigned_to: input.assigned_to,
            target_date: input.target_date,
            containment_actions: Vec::new(),
            investigation: None,
            disposition: None,
            cost: CostImpact::default(),
            capa_id: None,
            capa_number: None,
            verified_by: None,
            verification_notes: None,
            closed_date: None,
            closed_by: None,
            cancellation_reason: None,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Past its target date and still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.target_date.is_some_and(|target| target < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Ncr {
        Ncr::new(
            TenantId::new("acme").unwrap(),
            "NCR-2026-000001".to_string(),
            CreateNcr {
                title: "Bore diameter out of tolerance".to_string(),
                severity: NcrSeverity::Major,
                detected_by: "inspector".to_string(),
                ..CreateNcr::default()
            },
        )
    }

    #[test]
    fn test_ncr_creation() {
        let ncr = draft();
        assert!(ncr.id.to_string().starts_with("NCR-"));
        assert_eq!(ncr.status, NcrStatus::Draft);
        assert_eq!(ncr.severity, NcrSeverity::Major);
        assert!(ncr.closed_date.is_none());
        assert_eq!(ncr.status_label(), "draft");
    }

    #[test]
    fn test_ncr_json_roundtrip() {
        let ncr = draft();
        let json = serde_json::to_string(&ncr).unwrap();
        let parsed: Ncr = serde_json::from_str(&json).unwrap();
        assert_eq!(ncr, parsed);
    }

    #[test]
    fn test_cost_total_is_additive() {
        let cost = CostImpact {
            material_cost: 10.0,
            labor_cost: 5.5,
            scrap_cost: 4.5,
            ..CostImpact::default()
        };
        assert_eq!(cost.total(), 20.0);
    }

    #[test]
    fn test_status_from_str() {
        assert_eq!(
            "pending-disposition".parse::<NcrStatus>().unwrap(),
            NcrStatus::PendingDisposition
        );
        assert!("nonsense".parse::<NcrStatus>().is_err());
        for status in NcrStatus::all() {
            assert_eq!(status.as_str().parse::<NcrStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn test_overdue_view() {
        let mut ncr = draft();
        let now = Utc::now();
        ncr.target_date = Some(now - chrono::Duration::days(1));
        assert!(ncr.is_overdue(now));
        ncr.status = NcrStatus::Cancelled;
        assert!(!ncr.is_overdue(now));
    }
}
