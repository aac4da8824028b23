//! Quality inspection entity
//!
//! An inspection samples a lot of an item against a list of checks, records
//! the defects it finds and ends with a verdict that a reviewer accepts or
//! rejects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// Acceptance rate at or above which an inspection passes outright
pub const PASS_THRESHOLD: f64 = 95.0;

/// Acceptance rate at or above which an inspection passes with conditions
pub const CONDITIONAL_THRESHOLD: f64 = 80.0;

/// Where in the flow of material the inspection happens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionType {
    #[default]
    Incoming,
    InProcess,
    Final,
    Receiving,
    Shipping,
    Periodic,
    Random,
    CustomerReturn,
}

impl InspectionType {
    pub fn all() -> &'static [InspectionType] {
        &[
            InspectionType::Incoming,
            InspectionType::InProcess,
            InspectionType::Final,
            InspectionType::Receiving,
            InspectionType::Shipping,
            InspectionType::Periodic,
            InspectionType::Random,
            InspectionType::CustomerReturn,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionType::Incoming => "incoming",
            InspectionType::InProcess => "in_process",
            InspectionType::Final => "final",
            InspectionType::Receiving => "receiving",
            InspectionType::Shipping => "shipping",
            InspectionType::Periodic => "periodic",
            InspectionType::Random => "random",
            InspectionType::CustomerReturn => "customer_return",
        }
    }
}

impl std::fmt::Display for InspectionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InspectionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        InspectionType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Invalid inspection type: {}", s))
    }
}

/// Inspection workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionStatus {
    #[default]
    Planned,
    InProgress,
    PendingReview,
    Approved,
    Rejected,
    OnHold,
    Cancelled,
}

impl InspectionStatus {
    pub fn all() -> &'static [InspectionStatus] {
        &[
            InspectionStatus::Planned,
            InspectionStatus::InProgress,
            InspectionStatus::PendingReview,
            InspectionStatus::Approved,
            InspectionStatus::Rejected,
            InspectionStatus::OnHold,
            InspectionStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionStatus::Planned => "planned",
            InspectionStatus::InProgress => "in_progress",
            InspectionStatus::PendingReview => "pending_review",
            InspectionStatus::Approved => "approved",
            InspectionStatus::Rejected => "rejected",
            InspectionStatus::OnHold => "on_hold",
            InspectionStatus::Cancelled => "cancelled",
        }
    }

    /// A reviewer has accepted or rejected the verdict
    pub fn is_reviewed(&self) -> bool {
        matches!(self, InspectionStatus::Approved | InspectionStatus::Rejected)
    }
}

impl std::fmt::Display for InspectionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InspectionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        InspectionStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid inspection status: {}", s))
    }
}

/// Verdict of a check or of the whole inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InspectionResult {
    Pass,
    Fail,
    ConditionalPass,
    #[default]
    Pending,
}

impl InspectionResult {
    pub fn all() -> &'static [InspectionResult] {
        &[
            InspectionResult::Pass,
            InspectionResult::Fail,
            InspectionResult::ConditionalPass,
            InspectionResult::Pending,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InspectionResult::Pass => "pass",
            InspectionResult::Fail => "fail",
            InspectionResult::ConditionalPass => "conditional_pass",
            InspectionResult::Pending => "pending",
        }
    }

    /// Pass or conditional pass
    pub fn is_accepted(&self) -> bool {
        matches!(self, InspectionResult::Pass | InspectionResult::ConditionalPass)
    }
}

impl std::fmt::Display for InspectionResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InspectionResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        InspectionResult::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid inspection result: {}. Use pass, fail, conditional_pass, or pending",
                    s
                )
            })
    }
}

/// How the sample was drawn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMethod {
    #[default]
    Full,
    Random,
    Aql,
    SkipLot,
    FirstArticle,
}

impl SamplingMethod {
    pub fn all() -> &'static [SamplingMethod] {
        &[
            SamplingMethod::Full,
            SamplingMethod::Random,
            SamplingMethod::Aql,
            SamplingMethod::SkipLot,
            SamplingMethod::FirstArticle,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SamplingMethod::Full => "full",
            SamplingMethod::Random => "random",
            SamplingMethod::Aql => "aql",
            SamplingMethod::SkipLot => "skip_lot",
            SamplingMethod::FirstArticle => "first_article",
        }
    }
}

impl std::fmt::Display for SamplingMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SamplingMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        SamplingMethod::all()
            .iter()
            .copied()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("Invalid sampling method: {}", s))
    }
}

/// Defect severity, most severe first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefectSeverity {
    Critical,
    Major,
    #[default]
    Minor,
    Cosmetic,
}

impl DefectSeverity {
    pub fn all() -> &'static [DefectSeverity] {
        &[
            DefectSeverity::Critical,
            DefectSeverity::Major,
            DefectSeverity::Minor,
            DefectSeverity::Cosmetic,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DefectSeverity::Critical => "critical",
            DefectSeverity::Major => "major",
            DefectSeverity::Minor => "minor",
            DefectSeverity::Cosmetic => "cosmetic",
        }
    }
}

impl std::fmt::Display for DefectSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DefectSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        DefectSeverity::all()
            .iter()
            .copied()
            .find(|sev| sev.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid defect severity: {}. Use critical, major, minor, or cosmetic",
                    s
                )
            })
    }
}

/// What a check looks at
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckType {
    #[default]
    Visual,
    Dimensional,
    Functional,
    Electrical,
    Chemical,
    Documentation,
    Packaging,
    Labeling,
}

impl CheckType {
    pub fn all() -> &'static [CheckType] {
        &[
            CheckType::Visual,
            CheckType::Dimensional,
            CheckType::Functional,
            CheckType::Electrical,
            CheckType::Chemical,
            CheckType::Documentation,
            CheckType::Packaging,
            CheckType::Labeling,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CheckType::Visual => "visual",
            CheckType::Dimensional => "dimensional",
            CheckType::Functional => "functional",
            CheckType::Electrical => "electrical",
            CheckType::Chemical => "chemical",
            CheckType::Documentation => "documentation",
            CheckType::Packaging => "packaging",
            CheckType::Labeling => "labeling",
        }
    }
}

impl std::fmt::Display for CheckType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CheckType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        CheckType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Invalid check type: {}", s))
    }
}

/// Kind of document the inspected material belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceType {
    PurchaseOrder,
    ProductionOrder,
    SalesOrder,
    Inventory,
    #[default]
    Other,
}

impl ReferenceType {
    pub fn all() -> &'static [ReferenceType] {
        &[
            ReferenceType::PurchaseOrder,
            ReferenceType::ProductionOrder,
            ReferenceType::SalesOrder,
            ReferenceType::Inventory,
            ReferenceType::Other,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReferenceType::PurchaseOrder => "purchase_order",
            ReferenceType::ProductionOrder => "production_order",
            ReferenceType::SalesOrder => "sales_order",
            ReferenceType::Inventory => "inventory",
            ReferenceType::Other => "other",
        }
    }
}

impl std::fmt::Display for ReferenceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReferenceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        ReferenceType::all()
            .iter()
            .copied()
            .find(|r| r.as_str() == normalized)
            .ok_or_else(|| format!("Invalid reference type: {}", s))
    }
}

/// One line of the inspection checklist
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionCheck {
    pub id: EntityId,

    /// 1-based position in the checklist
    pub sequence: u32,

    pub check_type: CheckType,

    pub check_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// Measured or observed value, numeric or free text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_value: Option<String>,

    #[serde(default)]
    pub result: InspectionResult,

    /// Last defect recorded against this check
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub defect_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl InspectionCheck {
    /// Whether a numeric actual value lies inside the check's limits.
    /// `None` when there is no numeric value or no limit to compare against.
    pub fn within_limits(&self) -> Option<bool> {
        if self.min_value.is_none() && self.max_value.is_none() {
            return None;
        }
        let actual: f64 = self.actual_value.as_deref()?.trim().parse().ok()?;
        Some(
            self.min_value.map_or(true, |min| actual >= min)
                && self.max_value.map_or(true, |max| actual <= max),
        )
    }
}

/// Defect found while inspecting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionDefect {
    pub id: EntityId,

    pub defect_code: String,

    pub defect_name: String,

    pub severity: DefectSeverity,

    pub quantity: u32,

    pub description: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause: Option<String>,

    pub created_at: DateTime<Utc>,
}

/// A quality inspection record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// Inspection number (e.g., "QI-2026-000012"), unique per tenant
    pub inspection_number: String,

    #[serde(default)]
    pub inspection_type: InspectionType,

    #[serde(default)]
    pub status: InspectionStatus,

    /// Verdict, `pending` until the inspection is completed
    #[serde(default)]
    pub result: InspectionResult,

    #[serde(default)]
    pub reference_type: ReferenceType,

    #[serde(default)]
    pub reference_id: String,

    #[serde(default)]
    pub reference_number: String,

    pub item_id: String,

    #[serde(default)]
    pub item_code: String,

    #[serde(default)]
    pub item_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lot_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_number: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub serial_numbers: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warehouse_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_id: Option<String>,

    #[serde(default)]
    pub sampling_method: SamplingMethod,

    pub sample_size: u32,

    pub total_quantity: u32,

    #[serde(default)]
    pub passed_quantity: u32,

    #[serde(default)]
    pub failed_quantity: u32,

    /// Passed share of the sample, in percent
    #[serde(default)]
    pub acceptance_rate: f64,

    /// Template the checks were copied from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checklist_name: Option<String>,

    #[serde(default)]
    pub checks: Vec<InspectionCheck>,

    #[serde(default)]
    pub defects: Vec<InspectionDefect>,

    #[serde(default)]
    pub total_defects: u32,

    #[serde(default)]
    pub critical_defects: u32,

    #[serde(default)]
    pub major_defects: u32,

    /// Minor and cosmetic defects together
    #[serde(default)]
    pub minor_defects: u32,

    pub planned_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inspected_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reviewed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    /// NCRs raised from this inspection
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub ncr_ids: Vec<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Inspection {
    const PREFIX: EntityPrefix = EntityPrefix::Qi;
    const KIND: &'static str = "Inspection";

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

/// Check definition supplied when planning or extending an inspection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckSpec {
    pub check_type: CheckType,
    pub check_name: String,
    pub description: Option<String>,
    pub specification: Option<String>,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub target_value: Option<f64>,
    pub unit: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateInspection {
    pub inspection_type: InspectionType,
    pub reference_type: ReferenceType,
    pub reference_id: String,
    pub reference_number: String,
    pub item_id: String,
    pub item_code: String,
    pub item_name: String,
    pub lot_number: Option<String>,
    pub batch_number: Option<String>,
    pub serial_numbers: Vec<String>,
    pub supplier_id: Option<String>,
    pub supplier_name: Option<String>,
    pub warehouse_id: Option<String>,
    pub location_id: Option<String>,
    pub sampling_method: SamplingMethod,
    pub sample_size: u32,
    pub total_quantity: u32,
    pub checklist_id: Option<EntityId>,
    pub planned_date: DateTime<Utc>,
    pub notes: Option<String>,
}

impl Default for CreateInspection {
    fn default() -> Self {
        Self {
            inspection_type: InspectionType::default(),
            reference_type: ReferenceType::default(),
            reference_id: String::new(),
            reference_number: String::new(),
            item_id: String::new(),
            item_code: String::new(),
            item_name: String::new(),
            lot_number: None,
            batch_number: None,
            serial_numbers: Vec::new(),
            supplier_id: None,
            supplier_name: None,
            warehouse_id: None,
            location_id: None,
            sampling_method: SamplingMethod::default(),
            sample_size: 0,
            total_quantity: 0,
            checklist_id: None,
            planned_date: Utc::now(),
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordCheckResult {
    pub actual_value: Option<String>,
    pub result: InspectionResult,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordDefect {
    pub defect_code: String,
    pub defect_name: String,
    pub severity: DefectSeverity,
    pub quantity: u32,
    pub description: String,
    pub check_id: Option<EntityId>,
    pub root_cause: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteInspection {
    pub passed_quantity: u32,
    pub failed_quantity: u32,
    pub inspected_by: String,
    pub notes: Option<String>,
}

/// Verdict for a finished inspection: any critical defect fails it, otherwise
/// the acceptance rate decides.
pub fn inspection_verdict(critical_defects: u32, acceptance_rate: f64) -> InspectionResult {
    if critical_defects > 0 {
        InspectionResult::Fail
    } else if acceptance_rate >= PASS_THRESHOLD {
        InspectionResult::Pass
    } else if acceptance_rate >= CONDITIONAL_THRESHOLD {
        InspectionResult::ConditionalPass
    } else {
        InspectionResult::Fail
    }
}

/// Passed share of the sample in percent, 0 for an empty sample
pub fn acceptance_rate(passed: u32, sample_size: u32) -> f64 {
    if sample_size == 0 {
        0.0
    } else {
        f64::from(passed) * 100.0 / f64::from(sample_size)
    }
}

impl Inspection {
    pub fn new(tenant_id: TenantId, inspection_number: String, input: CreateInspection) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Qi),
            tenant_id,
            inspection_number,
            inspection_type: input.inspection_type,
            status: InspectionStatus::Planned,
            result: InspectionResult::Pending,
            reference_type: input.reference_type,
            reference_id: input.reference_id,
            reference_number: input.reference_number,
            item_id: input.item_id,
            item_code: input.item_code,
            item_name: input.item_name,
            lot_number: input.lot_number,
            batch_number: input.batch_number,
            serial_numbers: input.serial_numbers,
            supplier_id: input.supplier_id,
            supplier_name: input.supplier_name,
            warehouse_id: input.warehouse_id,
            location_id: input.location_id,
            sampling_method: input.sampling_method,
            sample_size: input.sample_size,
            total_quantity: input.total_quantity,
            passed_quantity: 0,
            failed_quantity: 0,
            acceptance_rate: 0.0,
            checklist_id: input.checklist_id,
            checklist_name: None,
            checks: Vec::new(),
            defects: Vec::new(),
            total_defects: 0,
            critical_defects: 0,
            major_defects: 0,
            minor_defects: 0,
            planned_date: input.planned_date,
            started_at: None,
            completed_at: None,
            inspected_by: None,
            reviewed_by: None,
            reviewed_at: None,
            review_notes: None,
            hold_reason: None,
            cancellation_reason: None,
            ncr_ids: Vec::new(),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Append a pending check at the end of the list
    pub fn push_check(&mut self, spec: CheckSpec) -> &InspectionCheck {
        let sequence = self.checks.len() as u32 + 1;
        self.checks.push(InspectionCheck {
            id: EntityId::new(EntityPrefix::Chk),
            sequence,
            check_type: spec.check_type,
            check_name: spec.check_name,
            description: spec.description,
            specification: spec.specification,
            min_value: spec.min_value,
            max_value: spec.max_value,
            target_value: spec.target_value,
            unit: spec.unit,
            actual_value: None,
            result: InspectionResult::Pending,
            defect_id: None,
            notes: None,
        });
        &self.checks[self.checks.len() - 1]
    }

    pub fn find_check(&self, id: &EntityId) -> Option<&InspectionCheck> {
        self.checks.iter().find(|c| &c.id == id)
    }

    pub fn find_check_mut(&mut self, id: &EntityId) -> Option<&mut InspectionCheck> {
        self.checks.iter_mut().find(|c| &c.id == id)
    }

    /// Add `quantity` to the running totals for `severity`
    pub fn tally_defects(&mut self, severity: DefectSeverity, quantity: u32) {
        self.total_defects += quantity;
        match severity {
            DefectSeverity::Critical => self.critical_defects += quantity,
            DefectSeverity::Major => self.major_defects += quantity,
            DefectSeverity::Minor | DefectSeverity::Cosmetic => self.minor_defects += quantity,
        }
    }

    /// Checks still waiting for a result
    pub fn pending_checks(&self) -> usize {
        self.checks
            .iter()
            .filter(|c| c.result == InspectionResult::Pending)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inspection() -> Inspection {
        Inspection::new(
            TenantId::new("acme").unwrap(),
            "QI-2026-000001".to_string(),
            CreateInspection {
                item_id: "ITEM-1".to_string(),
                sample_size: 50,
                total_quantity: 500,
                ..CreateInspection::default()
            },
        )
    }

    #[test]
    fn test_new_inspection_is_planned_and_pending() {
        let insp = inspection();
        assert!(insp.id.to_string().starts_with("QI-"));
        assert_eq!(insp.status, InspectionStatus::Planned);
        assert_eq!(insp.result, InspectionResult::Pending);
        assert_eq!(insp.sampling_method, SamplingMethod::Full);
        assert!(insp.checks.is_empty());
    }

    #[test]
    fn test_verdict_thresholds() {
        assert_eq!(inspection_verdict(0, 95.0), InspectionResult::Pass);
        assert_eq!(inspection_verdict(0, 94.9), InspectionResult::ConditionalPass);
        assert_eq!(inspection_verdict(0, 80.0), InspectionResult::ConditionalPass);
        assert_eq!(inspection_verdict(0, 79.9), InspectionResult::Fail);
        assert_eq!(inspection_verdict(1, 100.0), InspectionResult::Fail);
    }

    #[test]
    fn test_acceptance_rate_empty_sample() {
        assert_eq!(acceptance_rate(0, 0), 0.0);
        assert_eq!(acceptance_rate(45, 50), 90.0);
    }

    #[test]
    fn test_tally_merges_cosmetic_into_minor() {
        let mut insp = inspection();
        insp.tally_defects(DefectSeverity::Critical, 1);
        insp.tally_defects(DefectSeverity::Major, 2);
        insp.tally_defects(DefectSeverity::Minor, 3);
        insp.tally_defects(DefectSeverity::Cosmetic, 4);
        assert_eq!(insp.total_defects, 10);
        assert_eq!(insp.critical_defects, 1);
        assert_eq!(insp.major_defects, 2);
        assert_eq!(insp.minor_defects, 7);
    }

    #[test]
    fn test_checks_are_numbered_in_order() {
        let mut insp = inspection();
        insp.push_check(CheckSpec {
            check_name: "Surface finish".to_string(),
            ..CheckSpec::default()
        });
        let second = insp
            .push_check(CheckSpec {
                check_type: CheckType::Dimensional,
                check_name: "Bore diameter".to_string(),
                min_value: Some(9.95),
                max_value: Some(10.05),
                unit: Some("mm".to_string()),
                ..CheckSpec::default()
            })
            .clone();
        assert_eq!(second.sequence, 2);
        assert_eq!(insp.pending_checks(), 2);
        assert!(insp.find_check(&second.id).is_some());
    }

    #[test]
    fn test_within_limits() {
        let mut insp = inspection();
        let id = insp
            .push_check(CheckSpec {
                check_type: CheckType::Dimensional,
                check_name: "Bore".to_string(),
                min_value: Some(9.95),
                max_value: Some(10.05),
                ..CheckSpec::default()
            })
            .id
            .clone();
        let check = insp.find_check_mut(&id).unwrap();
        assert_eq!(check.within_limits(), None);

        check.actual_value = Some("10.01".to_string());
        assert_eq!(check.within_limits(), Some(true));
        check.actual_value = Some("10.2".to_string());
        assert_eq!(check.within_limits(), Some(false));
        check.actual_value = Some("scratched".to_string());
        assert_eq!(check.within_limits(), None);
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!(
            "in-process".parse::<InspectionType>().unwrap(),
            InspectionType::InProcess
        );
        assert_eq!(
            "conditional_pass".parse::<InspectionResult>().unwrap(),
            InspectionResult::ConditionalPass
        );
        assert_eq!("MAJOR".parse::<DefectSeverity>().unwrap(), DefectSeverity::Major);
        assert!("fatal".parse::<DefectSeverity>().is_err());
        assert_eq!(
            serde_json::to_value(InspectionType::CustomerReturn).unwrap(),
            "customer_return"
        );
    }
}
