//! CAPA entity type - Corrective and Preventive Actions

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{Entity, Priority};
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// CAPA type classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapaType {
    #[default]
    Corrective,
    Preventive,
    Both,
}

impl CapaType {
    pub fn all() -> &'static [CapaType] {
        &[CapaType::Corrective, CapaType::Preventive, CapaType::Both]
    }
}

impl std::fmt::Display for CapaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CapaType::Corrective => write!(f, "corrective"),
            CapaType::Preventive => write!(f, "preventive"),
            CapaType::Both => write!(f, "both"),
        }
    }
}

impl std::str::FromStr for CapaType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "corrective" => Ok(CapaType::Corrective),
            "preventive" => Ok(CapaType::Preventive),
            "both" => Ok(CapaType::Both),
            _ => Err(format!(
                "Invalid CAPA type: {}. Use corrective, preventive, or both",
                s
            )),
        }
    }
}

/// What triggered the CAPA
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapaSource {
    #[default]
    Ncr,
    Audit,
    CustomerComplaint,
    ManagementReview,
    ProcessDeviation,
    Regulatory,
    Supplier,
    Internal,
    RiskAssessment,
}

impl CapaSource {
    pub fn all() -> &'static [CapaSource] {
        &[
            CapaSource::Ncr,
            CapaSource::Audit,
            CapaSource::CustomerComplaint,
            CapaSource::ManagementReview,
            CapaSource::ProcessDeviation,
            CapaSource::Regulatory,
            CapaSource::Supplier,
            CapaSource::Internal,
            CapaSource::RiskAssessment,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapaSource::Ncr => "ncr",
            CapaSource::Audit => "audit",
            CapaSource::CustomerComplaint => "customer_complaint",
            CapaSource::ManagementReview => "management_review",
            CapaSource::ProcessDeviation => "process_deviation",
            CapaSource::Regulatory => "regulatory",
            CapaSource::Supplier => "supplier",
            CapaSource::Internal => "internal",
            CapaSource::RiskAssessment => "risk_assessment",
        }
    }
}

impl std::fmt::Display for CapaSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CapaSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        CapaSource::all()
            .iter()
            .copied()
            .find(|source| source.as_str() == normalized)
            .ok_or_else(|| {
                format!(
                    "Invalid source type: {}. Use ncr, audit, customer_complaint, management_review, process_deviation, regulatory, supplier, internal, or risk_assessment",
                    s
                )
            })
    }
}

/// CAPA workflow status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapaStatus {
    #[default]
    Draft,
    Open,
    Investigation,
    ActionPlanning,
    Implementation,
    Verification,
    EffectivenessCheck,
    Closed,
    Cancelled,
}

impl CapaStatus {
    pub fn all() -> &'static [CapaStatus] {
        &[
            CapaStatus::Draft,
            CapaStatus::Open,
            CapaStatus::Investigation,
            CapaStatus::ActionPlanning,
            CapaStatus::Implementation,
            CapaStatus::Verification,
            CapaStatus::EffectivenessCheck,
            CapaStatus::Closed,
            CapaStatus::Cancelled,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CapaStatus::Draft => "draft",
            CapaStatus::Open => "open",
            CapaStatus::Investigation => "investigation",
            CapaStatus::ActionPlanning => "action_planning",
            CapaStatus::Implementation => "implementation",
            CapaStatus::Verification => "verification",
            CapaStatus::EffectivenessCheck => "effectiveness_check",
            CapaStatus::Closed => "closed",
            CapaStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CapaStatus::Closed | CapaStatus::Cancelled)
    }
}

impl std::fmt::Display for CapaStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for CapaStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        CapaStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid CAPA status: {}", s))
    }
}

/// Root cause analysis method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RcaMethod {
    #[default]
    FiveWhy,
    Fishbone,
    FaultTree,
    Fmea,
    Pareto,
    Other,
}

impl std::fmt::Display for RcaMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RcaMethod::FiveWhy => write!(f, "five_why"),
            RcaMethod::Fishbone => write!(f, "fishbone"),
            RcaMethod::FaultTree => write!(f, "fault_tree"),
            RcaMethod::Fmea => write!(f, "fmea"),
            RcaMethod::Pareto => write!(f, "pareto"),
            RcaMethod::Other => write!(f, "other"),
        }
    }
}

impl std::str::FromStr for RcaMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "five_why" | "5why" | "5_why" => Ok(RcaMethod::FiveWhy),
            "fishbone" | "ishikawa" => Ok(RcaMethod::Fishbone),
            "fault_tree" => Ok(RcaMethod::FaultTree),
            "fmea" => Ok(RcaMethod::Fmea),
            "pareto" => Ok(RcaMethod::Pareto),
            "other" => Ok(RcaMethod::Other),
            _ => Err(format!(
                "Invalid RCA method: {}. Use five_why, fishbone, fault_tree, fmea, pareto, or other",
                s
            )),
        }
    }
}

/// One bone of a fishbone diagram
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FishboneCategory {
    pub name: String,
    #[serde(default)]
    pub causes: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FishboneDiagram {
    pub problem: String,
    #[serde(default)]
    pub categories: Vec<FishboneCategory>,
}

/// Root cause analysis
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RootCauseAnalysis {
    pub id: EntityId,

    /// Analysis method used
    pub method: RcaMethod,

    /// Identified root causes
    #[serde(default)]
    pub root_causes: Vec<String>,

    /// Contributing factors
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub contributing_factors: Vec<String>,

    #[serde(default)]
    pub analysis: String,

    pub analyzed_by: String,

    pub analyzed_at: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub five_why_steps: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fishbone: Option<FishboneDiagram>,
}

/// Action item status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
    Verified,
    Overdue,
    Cancelled,
}

impl ActionStatus {
    /// Counts as finished for the auto-advance to verification
    pub fn is_settled(&self) -> bool {
        matches!(self, ActionStatus::Verified | ActionStatus::Cancelled)
    }
}

impl std::fmt::Display for ActionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionStatus::Pending => write!(f, "pending"),
            ActionStatus::InProgress => write!(f, "in_progress"),
            ActionStatus::Completed => write!(f, "completed"),
            ActionStatus::Verified => write!(f, "verified"),
            ActionStatus::Overdue => write!(f, "overdue"),
            ActionStatus::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Action type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    #[default]
    Corrective,
    Preventive,
}

impl ActionType {
    /// Prefix of the sequential action number
    pub fn number_prefix(&self) -> &'static str {
        match self {
            ActionType::Corrective => "CA",
            ActionType::Preventive => "PA",
        }
    }
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Corrective => write!(f, "corrective"),
            ActionType::Preventive => write!(f, "preventive"),
        }
    }
}

impl std::str::FromStr for ActionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "corrective" | "ca" => Ok(ActionType::Corrective),
            "preventive" | "pa" => Ok(ActionType::Preventive),
            _ => Err(format!(
                "Invalid action type: {}. Use corrective or preventive",
                s
            )),
        }
    }
}

/// Individual action item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: EntityId,

    /// Sequential number within its list (CA-1, PA-2, ...)
    pub action_number: String,

    pub action_type: ActionType,

    pub description: String,

    #[serde(default)]
    pub expected_outcome: String,

    #[serde(default)]
    pub status: ActionStatus,

    #[serde(default)]
    pub priority: Priority,

    pub assigned_to: String,

    pub due_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_required: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub evidence_provided: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Action {
    /// Still pending after its due date. Computed, never stored as a status.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.status == ActionStatus::Pending && self.due_date < now
    }
}

/// Verification result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationResult {
    Pass,
    Fail,
    Partial,
}

impl std::fmt::Display for VerificationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VerificationResult::Pass => write!(f, "pass"),
            VerificationResult::Fail => write!(f, "fail"),
            VerificationResult::Partial => write!(f, "partial"),
        }
    }
}

impl std::str::FromStr for VerificationResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pass" => Ok(VerificationResult::Pass),
            "fail" => Ok(VerificationResult::Fail),
            "partial" => Ok(VerificationResult::Partial),
            _ => Err(format!(
                "Invalid verification result: {}. Use pass, fail, or partial",
                s
            )),
        }
    }
}

/// Verification that the implemented actions meet their criteria
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CapaVerification {
    pub id: EntityId,
    pub verified_by: String,
    pub verified_at: DateTime<Utc>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub criteria: String,
    pub result: VerificationResult,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Effectiveness result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectivenessResult {
    Effective,
    PartiallyEffective,
    NotEffective,
}

impl std::fmt::Display for EffectivenessResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EffectivenessResult::Effective => write!(f, "effective"),
            EffectivenessResult::PartiallyEffective => write!(f, "partially_effective"),
            EffectivenessResult::NotEffective => write!(f, "not_effective"),
        }
    }
}

impl std::str::FromStr for EffectivenessResult {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "effective" => Ok(EffectivenessResult::Effective),
            "partially_effective" | "partial" => Ok(EffectivenessResult::PartiallyEffective),
            "not_effective" | "ineffective" => Ok(EffectivenessResult::NotEffective),
            _ => Err(format!(
                "Invalid effectiveness result: {}. Use effective, partially_effective, or not_effective",
                s
            )),
        }
    }
}

/// Delayed follow-up confirming the actions prevented recurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectivenessCheck {
    pub id: EntityId,

    pub scheduled_date: DateTime<Utc>,

    #[serde(default)]
    pub method: String,

    #[serde(default)]
    pub criteria: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub checked_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<EffectivenessResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub findings: Option<String>,

    #[serde(default)]
    pub recurrence_check: bool,

    #[serde(default)]
    pub further_action_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// A CAPA entity - Corrective/Preventive Action
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Capa {
    /// Unique identifier
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// CAPA number (e.g., "CAPA-2026-000015")
    pub capa_number: String,

    /// CAPA workflow status
    #[serde(default)]
    pub status: CapaStatus,

    #[serde(default)]
    pub capa_type: CapaType,

    #[serde(default)]
    pub priority: Priority,

    #[serde(default)]
    pub source: CapaSource,

    pub title: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub problem_statement: String,

    /// Source NCR
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncr_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ncr_number: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub process_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<String>,

    pub initiated_by: String,

    pub owner: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_cause_analysis: Option<RootCauseAnalysis>,

    #[serde(default)]
    pub corrective_actions: Vec<Action>,

    #[serde(default)]
    pub preventive_actions: Vec<Action>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verification: Option<CapaVerification>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub effectiveness_check: Option<EffectivenessCheck>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_date: Option<DateTime<Utc>>,

    /// Stamped when every action is settled and the CAPA enters verification
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub closed_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_cost: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_cost: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currency: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for Capa {
    const PREFIX: EntityPrefix = EntityPrefix::Capa;
    const KIND: &'static str = "CAPA";

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

/// Fields accepted when creating a CAPA
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateCapa {
    pub capa_type: CapaType,
    pub priority: Priority,
    pub source: CapaSource,
    pub title: String,
    pub description: String,
    pub problem_statement: String,
    pub ncr_id: Option<EntityId>,
    pub ncr_number: Option<String>,
    pub supplier_id: Option<String>,
    pub product_id: Option<String>,
    pub process_id: Option<String>,
    pub department_id: Option<String>,
    pub initiated_by: String,
    pub owner: String,
    pub target_date: Option<DateTime<Utc>>,
    pub estimated_cost: Option<f64>,
    pub currency: Option<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordRootCause {
    pub method: RcaMethod,
    pub root_causes: Vec<String>,
    pub contributing_factors: Vec<String>,
    pub analysis: String,
    pub analyzed_by: String,
    pub five_why_steps: Vec<String>,
    pub fishbone: Option<FishboneDiagram>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddAction {
    pub action_type: ActionType,
    pub description: String,
    #[serde(default)]
    pub expected_outcome: String,
    #[serde(default)]
    pub priority: Priority,
    pub assigned_to: String,
    pub due_date: DateTime<Utc>,
    #[serde(default)]
    pub evidence_required: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CompleteAction {
    pub completed_by: String,
    pub evidence_provided: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VerifyAction {
    pub verified_by: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyCapa {
    pub verified_by: String,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub criteria: String,
    pub result: VerificationResult,
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleEffectivenessCheck {
    pub scheduled_date: DateTime<Utc>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub criteria: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteEffectivenessCheck {
    pub checked_by: String,
    pub result: EffectivenessResult,
    #[serde(default)]
    pub findings: Option<String>,
    #[serde(default)]
    pub recurrence_check: bool,
    #[serde(default)]
    pub further_action_required: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

impl Capa {
    /// Build a draft CAPA from creation input
    pub fn new(tenant_id: TenantId, capa_number: String, input: CreateCapa) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Capa),
            tenant_id,
            capa_number,
            status: CapaStatus::Draft,
            capa_type: input.capa_type,
            priority: input.priority,
            source: input.source,
            title: input.title,
            description: input.description,
            problem_statement: input.problem_statement,
            ncr_id: input.ncr_id,
            ncr_number: input.ncr_number,
            supplier_id: input.supplier_id,
            product_id: input.product_id,
            process_id: input.process_id,
            department_id: input.department_id,
            initiated_by: input.initiated_by,
            owner: input.owner,
            root_cause_analysis: None,
            corrective_actions: Vec::new(),
            preventive_actions: Vec::new(),
            verification: None,
            effectiveness_check: None,
            target_date: input.target_date,
            completed_date: None,
            closed_date: None,
            closed_by: None,
            estimated_cost: input.estimated_cost,
            actual_cost: None,
            currency: input.currency,
            notes: None,
            cancellation_reason: None,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        }
    }

    /// Corrective then preventive actions
    pub fn actions(&self) -> impl Iterator<Item = &Action> {
        self.corrective_actions
            .iter()
            .chain(self.preventive_actions.iter())
    }

    pub fn total_actions(&self) -> usize {
        self.corrective_actions.len() + self.preventive_actions.len()
    }

    pub fn find_action(&self, action_id: &EntityId) -> Option<&Action> {
        self.actions().find(|a| &a.id == action_id)
    }

    pub fn find_action_mut(&mut self, action_id: &EntityId) -> Option<&mut Action> {
        self.corrective_actions
            .iter_mut()
            .chain(self.preventive_actions.iter_mut())
            .find(|a| &a.id == action_id)
    }

    /// Past its target date and still open
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        !self.status.is_terminal() && self.target_date.is_some_and(|target| target < now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> Capa {
        Capa::new(
            TenantId::new("acme").unwrap(),
            "CAPA-2026-000001".to_string(),
            CreateCapa {
                title: "Tool wear detection".to_string(),
                capa_type: CapaType::Corrective,
                priority: Priority::High,
                initiated_by: "qa".to_string(),
                owner: "eng".to_string(),
                ..CreateCapa::default()
            },
        )
    }

    fn action(action_type: ActionType, status: ActionStatus) -> Action {
        Action {
            id: EntityId::new(EntityPrefix::Act),
            action_number: format!("{}-1", action_type.number_prefix()),
            action_type,
            description: "Replace fixture".to_string(),
            expected_outcome: String::new(),
            status,
            priority: Priority::Medium,
            assigned_to: "bob".to_string(),
            due_date: Utc::now(),
            started_at: None,
            completed_at: None,
            completed_by: None,
            verified_at: None,
            verified_by: None,
            evidence_required: None,
            evidence_provided: None,
            notes: None,
        }
    }

    #[test]
    fn test_capa_creation() {
        let capa = draft();
        assert!(capa.id.to_string().starts_with("CAPA-"));
        assert_eq!(capa.status, CapaStatus::Draft);
        assert_eq!(capa.priority, Priority::High);
        assert_eq!(capa.total_actions(), 0);
    }

    #[test]
    fn test_find_action_across_lists() {
        let mut capa = draft();
        let preventive = action(ActionType::Preventive, ActionStatus::Pending);
        let id = preventive.id.clone();
        capa.corrective_actions
            .push(action(ActionType::Corrective, ActionStatus::Pending));
        capa.preventive_actions.push(preventive);

        assert_eq!(capa.total_actions(), 2);
        assert_eq!(
            capa.find_action(&id).unwrap().action_type,
            ActionType::Preventive
        );
        capa.find_action_mut(&id).unwrap().status = ActionStatus::Cancelled;
        assert!(capa.find_action(&id).unwrap().status.is_settled());
    }

    #[test]
    fn test_action_overdue_is_computed() {
        let mut pending = action(ActionType::Corrective, ActionStatus::Pending);
        let now = Utc::now();
        pending.due_date = now - chrono::Duration::hours(1);
        assert!(pending.is_overdue(now));
        assert_eq!(pending.status, ActionStatus::Pending);

        pending.status = ActionStatus::InProgress;
        assert!(!pending.is_overdue(now));
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!("both".parse::<CapaType>().unwrap(), CapaType::Both);
        assert_eq!(
            "risk-assessment".parse::<CapaSource>().unwrap(),
            CapaSource::RiskAssessment
        );
        assert_eq!("five_why".parse::<RcaMethod>().unwrap(), RcaMethod::FiveWhy);
        assert_eq!(
            "ineffective".parse::<EffectivenessResult>().unwrap(),
            EffectivenessResult::NotEffective
        );
        assert!("maybe".parse::<VerificationResult>().is_err());
    }
}
