//! Supplier qualification entity

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::{AuditResult, Entity};
use crate::core::identity::{EntityId, EntityPrefix, TenantId};

/// Qualification state of a supplier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualificationStatus {
    #[default]
    Pending,
    UnderEvaluation,
    Qualified,
    ConditionallyQualified,
    OnHold,
    Disqualified,
    Expired,
}

impl QualificationStatus {
    pub fn all() -> &'static [QualificationStatus] {
        &[
            QualificationStatus::Pending,
            QualificationStatus::UnderEvaluation,
            QualificationStatus::Qualified,
            QualificationStatus::ConditionallyQualified,
            QualificationStatus::OnHold,
            QualificationStatus::Disqualified,
            QualificationStatus::Expired,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualificationStatus::Pending => "pending",
            QualificationStatus::UnderEvaluation => "under_evaluation",
            QualificationStatus::Qualified => "qualified",
            QualificationStatus::ConditionallyQualified => "conditionally_qualified",
            QualificationStatus::OnHold => "on_hold",
            QualificationStatus::Disqualified => "disqualified",
            QualificationStatus::Expired => "expired",
        }
    }

    /// States from which a supplier can be (re)qualified
    pub fn can_qualify(&self) -> bool {
        matches!(
            self,
            QualificationStatus::UnderEvaluation
                | QualificationStatus::ConditionallyQualified
                | QualificationStatus::OnHold
        )
    }
}

impl std::fmt::Display for QualificationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for QualificationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        QualificationStatus::all()
            .iter()
            .copied()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("Invalid qualification status: {}", s))
    }
}

/// Supplier risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn all() -> &'static [RiskLevel] {
        &[
            RiskLevel::Low,
            RiskLevel::Medium,
            RiskLevel::High,
            RiskLevel::Critical,
        ]
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskLevel::Low => write!(f, "low"),
            RiskLevel::Medium => write!(f, "medium"),
            RiskLevel::High => write!(f, "high"),
            RiskLevel::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for RiskLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "low" => Ok(RiskLevel::Low),
            "medium" | "med" => Ok(RiskLevel::Medium),
            "high" => Ok(RiskLevel::High),
            "critical" => Ok(RiskLevel::Critical),
            _ => Err(format!(
                "Invalid risk level: {}. Use low, medium, high, or critical",
                s
            )),
        }
    }
}

/// Dimension a supplier evaluation scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvaluationCriterion {
    Quality,
    Delivery,
    Price,
    Service,
    Technical,
    Financial,
    Compliance,
    Sustainability,
}

impl EvaluationCriterion {
    pub fn all() -> &'static [EvaluationCriterion] {
        &[
            EvaluationCriterion::Quality,
            EvaluationCriterion::Delivery,
            EvaluationCriterion::Price,
            EvaluationCriterion::Service,
            EvaluationCriterion::Technical,
            EvaluationCriterion::Financial,
            EvaluationCriterion::Compliance,
            EvaluationCriterion::Sustainability,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvaluationCriterion::Quality => "quality",
            EvaluationCriterion::Delivery => "delivery",
            EvaluationCriterion::Price => "price",
            EvaluationCriterion::Service => "service",
            EvaluationCriterion::Technical => "technical",
            EvaluationCriterion::Financial => "financial",
            EvaluationCriterion::Compliance => "compliance",
            EvaluationCriterion::Sustainability => "sustainability",
        }
    }
}

impl std::fmt::Display for EvaluationCriterion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EvaluationCriterion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase();
        EvaluationCriterion::all()
            .iter()
            .copied()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| format!("Invalid evaluation criterion: {}", s))
    }
}

/// Category of goods a supplier is approved to deliver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApprovedCategory {
    pub category_id: String,

    pub category_name: String,

    pub approved_date: DateTime<Utc>,

    pub approved_by: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specifications: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrictions: Option<String>,
}

/// Certificate a supplier has submitted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierCertificate {
    pub id: EntityId,

    pub certification_type: String,

    pub certificate_number: String,

    pub issuing_body: String,

    pub issue_date: DateTime<Utc>,

    pub expiry_date: DateTime<Utc>,

    #[serde(default)]
    pub verified: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

/// Periodic scorecard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierEvaluation {
    pub id: EntityId,

    pub evaluation_date: DateTime<Utc>,

    pub evaluated_by: String,

    /// Free-form period label (e.g., "2026-Q3")
    pub period: String,

    pub scores: BTreeMap<EvaluationCriterion, f64>,

    /// Mean of `scores`
    pub overall_score: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Supplier audit type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierAuditType {
    Initial,
    #[default]
    Periodic,
    Special,
    FollowUp,
    Surveillance,
}

impl SupplierAuditType {
    pub fn all() -> &'static [SupplierAuditType] {
        &[
            SupplierAuditType::Initial,
            SupplierAuditType::Periodic,
            SupplierAuditType::Special,
            SupplierAuditType::FollowUp,
            SupplierAuditType::Surveillance,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SupplierAuditType::Initial => "initial",
            SupplierAuditType::Periodic => "periodic",
            SupplierAuditType::Special => "special",
            SupplierAuditType::FollowUp => "follow_up",
            SupplierAuditType::Surveillance => "surveillance",
        }
    }
}

impl std::fmt::Display for SupplierAuditType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for SupplierAuditType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.to_lowercase().replace('-', "_");
        SupplierAuditType::all()
            .iter()
            .copied()
            .find(|t| t.as_str() == normalized)
            .ok_or_else(|| format!("Invalid audit type: {}", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupplierAuditStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl std::fmt::Display for SupplierAuditStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            SupplierAuditStatus::Scheduled => "scheduled",
            SupplierAuditStatus::InProgress => "in_progress",
            SupplierAuditStatus::Completed => "completed",
            SupplierAuditStatus::Cancelled => "cancelled",
        })
    }
}

/// Weight of an audit finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingSeverity {
    #[default]
    Observation,
    Minor,
    Major,
    Critical,
}

impl std::str::FromStr for FindingSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "observation" | "obs" => Ok(FindingSeverity::Observation),
            "minor" => Ok(FindingSeverity::Minor),
            "major" => Ok(FindingSeverity::Major),
            "critical" => Ok(FindingSeverity::Critical),
            _ => Err(format!(
                "Invalid finding severity: {}. Use observation, minor, major, or critical",
                s
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FindingStatus {
    #[default]
    Open,
    Closed,
    Verified,
}

/// Finding raised during a supplier audit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditFinding {
    pub id: EntityId,

    pub severity: FindingSeverity,

    pub description: String,

    /// Standard clause the finding refers to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause: Option<String>,

    #[serde(default)]
    pub corrective_action_required: bool,

    #[serde(default)]
    pub status: FindingStatus,
}

/// On-site or remote audit of a supplier
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierAudit {
    pub id: EntityId,

    /// Audit number (e.g., "SA-2026-00003"), unique per tenant
    pub audit_number: String,

    pub audit_type: SupplierAuditType,

    #[serde(default)]
    pub status: SupplierAuditStatus,

    pub scheduled_date: DateTime<Utc>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual_date: Option<DateTime<Utc>>,

    pub auditor: String,

    pub scope: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,

    #[serde(default)]
    pub findings: Vec<AuditFinding>,

    #[serde(default)]
    pub capa_required: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Running delivery performance over every recorded period
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceMetrics {
    pub quality_rate: f64,
    pub on_time_delivery_rate: f64,
    pub defect_rate: f64,
    pub return_rate: f64,
    pub total_orders: u64,
    pub total_defects: u64,
    pub total_late_deliveries: u64,
    pub total_returns: u64,
    pub last_updated: Option<DateTime<Utc>>,
}

impl PerformanceMetrics {
    /// Add one period's counts and recompute the rates
    pub fn accumulate(&mut self, orders: u32, defects: u32, late: u32, returns: u32) {
        self.total_orders += u64::from(orders);
        self.total_defects += u64::from(defects);
        self.total_late_deliveries += u64::from(late);
        self.total_returns += u64::from(returns);

        let total = self.total_orders as f64;
        if self.total_orders > 0 {
            self.quality_rate = percent(self.total_orders.saturating_sub(self.total_defects), total);
            self.on_time_delivery_rate =
                percent(self.total_orders.saturating_sub(self.total_late_deliveries), total);
            self.defect_rate = percent(self.total_defects, total);
            self.return_rate = percent(self.total_returns, total);
        }
        self.last_updated = Some(Utc::now());
    }

    /// Risk level implied by the cumulative rates
    pub fn risk_level(&self) -> RiskLevel {
        let (quality, on_time) = (self.quality_rate, self.on_time_delivery_rate);
        if quality < 90.0 || on_time < 85.0 {
            RiskLevel::Critical
        } else if quality < 95.0 || on_time < 90.0 {
            RiskLevel::High
        } else if quality < 98.0 || on_time < 95.0 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

/// `part` as a percentage of `whole`, 0 when `whole` is 0
pub fn percent(part: u64, whole: f64) -> f64 {
    if whole == 0.0 {
        0.0
    } else {
        part as f64 * 100.0 / whole
    }
}

/// Counts and rates for one reporting period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceRecord {
    pub period: String,
    pub quality_rate: f64,
    pub on_time_delivery_rate: f64,
    pub defect_rate: f64,
    pub orders_count: u32,
    pub defects_count: u32,
    pub late_deliveries_count: u32,
    #[serde(default)]
    pub returns_count: u32,
    pub recorded_at: DateTime<Utc>,
}

/// Qualification record for one supplier within a tenant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupplierQualification {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// External supplier reference
    pub supplier_id: String,

    #[serde(default)]
    pub supplier_code: String,

    pub supplier_name: String,

    #[serde(default)]
    pub status: QualificationStatus,

    #[serde(default)]
    pub risk_level: RiskLevel,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualification_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualified_by: Option<String>,

    /// Conditions attached to a conditional qualification
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conditions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hold_reason: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disqualification_reason: Option<String>,

    #[serde(default)]
    pub ncr_ids: Vec<EntityId>,

    #[serde(default)]
    pub capa_ids: Vec<EntityId>,

    #[serde(default)]
    pub active_ncr_count: u32,

    #[serde(default)]
    pub active_capa_count: u32,

    #[serde(default)]
    pub approved_categories: Vec<ApprovedCategory>,

    #[serde(default)]
    pub certifications: Vec<SupplierCertificate>,

    #[serde(default)]
    pub evaluations: Vec<SupplierEvaluation>,

    /// Score of the latest evaluation
    #[serde(default)]
    pub overall_score: f64,

    /// Latest score per criterion, across evaluations
    #[serde(default)]
    pub score_breakdown: BTreeMap<EvaluationCriterion, f64>,

    #[serde(default)]
    pub audits: Vec<SupplierAudit>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_audit_date: Option<DateTime<Utc>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_audit_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub performance: PerformanceMetrics,

    #[serde(default)]
    pub performance_history: Vec<PerformanceRecord>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for SupplierQualification {
    const PREFIX: EntityPrefix = EntityPrefix::Sq;
    const KIND: &'static str = "Qualification";

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
pub struct CreateSupplierQualification {
    pub supplier_id: String,
    pub supplier_code: String,
    pub supplier_name: String,
    pub risk_level: Option<RiskLevel>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AddApprovedCategory {
    pub category_id: String,
    pub category_name: String,
    pub approved_by: String,
    pub specifications: Option<String>,
    pub restrictions: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSupplierCertificate {
    pub certification_type: String,
    pub certificate_number: String,
    pub issuing_body: String,
    pub issue_date: DateTime<Utc>,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateEvaluation {
    pub evaluated_by: String,
    pub period: String,
    pub scores: BTreeMap<EvaluationCriterion, f64>,
    pub comments: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleAudit {
    pub audit_type: SupplierAuditType,
    pub scheduled_date: DateTime<Utc>,
    pub auditor: String,
    pub scope: String,
}

/// Finding as reported when an audit closes
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FindingInput {
    pub severity: FindingSeverity,
    pub description: String,
    pub clause: Option<String>,
    pub corrective_action_required: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompleteAudit {
    pub actual_date: DateTime<Utc>,
    pub result: AuditResult,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub findings: Vec<FindingInput>,
    #[serde(default)]
    pub capa_required: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPerformance {
    pub period: String,
    pub orders_count: u32,
    pub defects_count: u32,
    pub late_deliveries_count: u32,
    pub returns_count: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QualifySupplier {
    pub qualified_by: String,
    pub expiration_date: Option<DateTime<Utc>>,
    pub conditions: Vec<String>,
}

impl SupplierQualification {
    pub fn new(tenant_id: TenantId, input: CreateSupplierQualification) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Sq),
            tenant_id,
            supplier_id: input.supplier_id,
            supplier_code: input.supplier_code,
            supplier_name: input.supplier_name,
            status: QualificationStatus::Pending,
            risk_level: input.risk_level.unwrap_or_default(),
            qualification_date: None,
            expiration_date: None,
            qualified_by: None,
            conditions: Vec::new(),
            hold_reason: None,
            disqualification_reason: None,
            ncr_ids: Vec::new(),
            capa_ids: Vec::new(),
            active_ncr_count: 0,
            active_capa_count: 0,
            approved_categories: Vec::new(),
            certifications: Vec::new(),
            evaluations: Vec::new(),
            overall_score: 0.0,
            score_breakdown: BTreeMap::new(),
            audits: Vec::new(),
            last_audit_date: None,
            next_audit_date: None,
            performance: PerformanceMetrics::default(),
            performance_history: Vec::new(),
            notes: input.notes,
            created_at: now,
            updated_at: now,
        }
    }

    /// Qualification lapses on or before `cutoff`
    pub fn expires_by(&self, cutoff: DateTime<Utc>) -> bool {
        self.expiration_date.is_some_and(|date| date <= cutoff)
    }

    pub fn find_audit_mut(&mut self, id: &EntityId) -> Option<&mut SupplierAudit> {
        self.audits.iter_mut().find(|a| &a.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_qualification_defaults() {
        let sq = SupplierQualification::new(
            TenantId::new("acme").unwrap(),
            CreateSupplierQualification {
                supplier_id: "SUP-1".to_string(),
                supplier_name: "Acme Castings".to_string(),
                ..Default::default()
            },
        );
        assert!(sq.id.to_string().starts_with("SQ-"));
        assert_eq!(sq.status, QualificationStatus::Pending);
        assert_eq!(sq.risk_level, RiskLevel::Medium);
        assert!(!sq.expires_by(Utc::now()));
    }

    #[test]
    fn test_performance_accumulates_across_periods() {
        let mut metrics = PerformanceMetrics::default();
        metrics.accumulate(100, 1, 2, 0);
        assert_eq!(metrics.quality_rate, 99.0);
        assert_eq!(metrics.on_time_delivery_rate, 98.0);
        assert_eq!(metrics.risk_level(), RiskLevel::Low);

        metrics.accumulate(100, 15, 2, 4);
        assert_eq!(metrics.total_orders, 200);
        assert_eq!(metrics.quality_rate, 92.0);
        assert_eq!(metrics.return_rate, 2.0);
        assert_eq!(metrics.risk_level(), RiskLevel::High);
    }

    #[test]
    fn test_risk_thresholds() {
        let at = |quality: f64, on_time: f64| PerformanceMetrics {
            quality_rate: quality,
            on_time_delivery_rate: on_time,
            ..PerformanceMetrics::default()
        };
        assert_eq!(at(89.9, 100.0).risk_level(), RiskLevel::Critical);
        assert_eq!(at(100.0, 84.9).risk_level(), RiskLevel::Critical);
        assert_eq!(at(94.0, 99.0).risk_level(), RiskLevel::High);
        assert_eq!(at(97.0, 99.0).risk_level(), RiskLevel::Medium);
        assert_eq!(at(98.0, 95.0).risk_level(), RiskLevel::Low);
    }

    #[test]
    fn test_can_qualify_from() {
        assert!(QualificationStatus::UnderEvaluation.can_qualify());
        assert!(QualificationStatus::OnHold.can_qualify());
        assert!(!QualificationStatus::Pending.can_qualify());
        assert!(!QualificationStatus::Disqualified.can_qualify());
    }

    #[test]
    fn test_parse_status_and_risk() {
        assert_eq!(
            "on-hold".parse::<QualificationStatus>().unwrap(),
            QualificationStatus::OnHold
        );
        assert_eq!("HIGH".parse::<RiskLevel>().unwrap(), RiskLevel::High);
        assert!("extreme".parse::<RiskLevel>().is_err());
    }
}
