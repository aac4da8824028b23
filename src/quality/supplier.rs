//! Supplier qualification operations

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{ensure, require_text, QualityEngine};
use crate::core::entity::AuditResult;
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::supplier::{
    percent, AddApprovedCategory, AddSupplierCertificate, ApprovedCategory, AuditFinding,
    CompleteAudit, CreateEvaluation, CreateSupplierQualification, FindingStatus,
    PerformanceRecord, QualificationStatus, QualifySupplier, RecordPerformance, RiskLevel,
    ScheduleAudit, SupplierAudit, SupplierAuditStatus, SupplierCertificate, SupplierEvaluation,
};
use crate::entities::SupplierQualification;

/// Criteria for [`QualityEngine::list_supplier_qualifications`]
#[derive(Debug, Clone, Default)]
pub struct SupplierFilter {
    pub status: Option<QualificationStatus>,
    pub risk_level: Option<RiskLevel>,
    /// Only qualifications expiring on or before this instant
    pub expiring_before: Option<DateTime<Utc>>,
}

impl SupplierFilter {
    pub fn matches(&self, sq: &SupplierQualification) -> bool {
        self.status.map_or(true, |s| sq.status == s)
            && self.risk_level.map_or(true, |r| sq.risk_level == r)
            && self.expiring_before.map_or(true, |cutoff| sq.expires_by(cutoff))
    }
}

fn audit_mut<'a>(
    sq: &'a mut SupplierQualification,
    audit_id: &EntityId,
) -> QualityResult<&'a mut SupplierAudit> {
    sq.find_audit_mut(audit_id)
        .ok_or_else(|| QualityError::not_found("Audit", audit_id))
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    pub fn create_supplier_qualification(
        &mut self,
        tenant: &TenantId,
        input: CreateSupplierQualification,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.supplier_id, "supplier_id")?;
        require_text(&input.supplier_name, "supplier_name")?;

        let sq = SupplierQualification::new(tenant.clone(), input);
        self.save(&sq)?;

        self.emit(
            "supplier.qualification.created",
            tenant,
            json!({ "qualification_id": sq.id, "supplier_id": sq.supplier_id }),
        );
        Ok(sq)
    }

    pub fn get_supplier_qualification(
        &self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<SupplierQualification> {
        self.load(tenant, id)
    }

    /// Qualification for an external supplier id, if one exists
    pub fn find_by_supplier(
        &self,
        tenant: &TenantId,
        supplier_id: &str,
    ) -> QualityResult<Option<SupplierQualification>> {
        Ok(self
            .list_all::<SupplierQualification>(tenant)?
            .into_iter()
            .find(|sq| sq.supplier_id == supplier_id))
    }

    /// Qualifications matching `filter`, most recently updated first
    pub fn list_supplier_qualifications(
        &self,
        tenant: &TenantId,
        filter: &SupplierFilter,
    ) -> QualityResult<Vec<SupplierQualification>> {
        let mut items: Vec<SupplierQualification> = self
            .list_all::<SupplierQualification>(tenant)?
            .into_iter()
            .filter(|sq| filter.matches(sq))
            .collect();
        items.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        Ok(items)
    }

    pub fn start_evaluation(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        ensure(
            sq.status == QualificationStatus::Pending,
            "Supplier must be in pending status",
        )?;

        sq.status = QualificationStatus::UnderEvaluation;
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.qualification.evaluation_started",
            tenant,
            json!({ "qualification_id": sq.id }),
        );
        Ok(sq)
    }

    /// Qualify, conditionally when `conditions` is non-empty
    pub fn qualify_supplier(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: QualifySupplier,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        ensure(
            sq.status.can_qualify(),
            "Supplier cannot be qualified from current status",
        )?;

        let now = Utc::now();
        let conditional = !input.conditions.is_empty();
        sq.status = if conditional {
            QualificationStatus::ConditionallyQualified
        } else {
            QualificationStatus::Qualified
        };
        sq.qualification_date = Some(now);
        sq.qualified_by = Some(input.qualified_by);
        sq.expiration_date = input.expiration_date;
        sq.conditions = input.conditions;
        sq.updated_at = now;
        self.save(&sq)?;

        self.emit(
            "supplier.qualification.qualified",
            tenant,
            json!({
                "qualification_id": sq.id,
                "supplier_id": sq.supplier_id,
                "conditional": conditional,
            }),
        );
        Ok(sq)
    }

    /// Put on hold from any state
    pub fn put_supplier_on_hold(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        sq.status = QualificationStatus::OnHold;
        sq.hold_reason = Some(reason.to_string());
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.qualification.on_hold",
            tenant,
            json!({ "qualification_id": sq.id, "reason": reason }),
        );
        Ok(sq)
    }

    /// Disqualify from any state
    pub fn disqualify_supplier(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        sq.status = QualificationStatus::Disqualified;
        sq.disqualification_reason = Some(reason.to_string());
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.qualification.disqualified",
            tenant,
            json!({
                "qualification_id": sq.id,
                "supplier_id": sq.supplier_id,
                "reason": reason,
            }),
        );
        Ok(sq)
    }

    /// Change the risk level; publishes only when it actually changes
    pub fn set_supplier_risk_level(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        risk_level: RiskLevel,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let previous = sq.risk_level;
        sq.risk_level = risk_level;
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        if previous != risk_level {
            self.emit(
                "supplier.risk_level_changed",
                tenant,
                json!({
                    "qualification_id": sq.id,
                    "supplier_id": sq.supplier_id,
                    "previous_level": previous,
                    "new_level": risk_level,
                }),
            );
        }
        Ok(sq)
    }
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    pub fn add_approved_category(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: AddApprovedCategory,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.category_id, "category_id")?;
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        ensure(
            !sq.approved_categories
                .iter()
                .any(|c| c.category_id == input.category_id),
            "Category already approved",
        )?;

        let now = Utc::now();
        sq.approved_categories.push(ApprovedCategory {
            category_id: input.category_id.clone(),
            category_name: input.category_name,
            approved_date: now,
            approved_by: input.approved_by,
            specifications: input.specifications,
            restrictions: input.restrictions,
        });
        sq.updated_at = now;
        self.save(&sq)?;

        self.emit(
            "supplier.category_approved",
            tenant,
            json!({ "qualification_id": sq.id, "category_id": input.category_id }),
        );
        Ok(sq)
    }

    /// Drop an approved category; unknown categories are ignored
    pub fn remove_approved_category(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        category_id: &str,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let before = sq.approved_categories.len();
        sq.approved_categories.retain(|c| c.category_id != category_id);
        let removed = sq.approved_categories.len() != before;
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.category_removed",
            tenant,
            json!({ "qualification_id": sq.id, "category_id": category_id, "removed": removed }),
        );
        Ok(sq)
    }

    /// Attach a certificate submitted by the supplier, unverified
    pub fn add_supplier_certificate(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: AddSupplierCertificate,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.certificate_number, "certificate_number")?;
        ensure(
            input.expiry_date > input.issue_date,
            "Expiry date must be after issue date",
        )?;
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let certificate = SupplierCertificate {
            id: EntityId::new(EntityPrefix::Scert),
            certification_type: input.certification_type,
            certificate_number: input.certificate_number,
            issuing_body: input.issuing_body,
            issue_date: input.issue_date,
            expiry_date: input.expiry_date,
            verified: false,
            verified_by: None,
            verified_at: None,
        };
        let certificate_id = certificate.id.clone();
        sq.certifications.push(certificate);
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.certification_added",
            tenant,
            json!({ "qualification_id": sq.id, "certificate_id": certificate_id }),
        );
        Ok(sq)
    }

    pub fn verify_supplier_certificate(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        certificate_id: &EntityId,
        verified_by: &str,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        let now = Utc::now();

        let certificate = sq
            .certifications
            .iter_mut()
            .find(|c| &c.id == certificate_id)
            .ok_or_else(|| QualityError::not_found("Certificate", certificate_id))?;
        certificate.verified = true;
        certificate.verified_by = Some(verified_by.to_string());
        certificate.verified_at = Some(now);
        sq.updated_at = now;
        self.save(&sq)?;

        self.emit(
            "supplier.certification_verified",
            tenant,
            json!({ "qualification_id": sq.id, "certificate_id": certificate_id }),
        );
        Ok(sq)
    }

    /// Score the supplier; the mean of the scores becomes its overall score
    pub fn create_supplier_evaluation(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: CreateEvaluation,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.evaluated_by, "evaluated_by")?;
        ensure(
            input.scores.values().all(|s| (0.0..=100.0).contains(s)),
            "Scores must be between 0 and 100",
        )?;
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let overall_score = if input.scores.is_empty() {
            0.0
        } else {
            input.scores.values().sum::<f64>() / input.scores.len() as f64
        };
        let now = Utc::now();
        for (criterion, score) in &input.scores {
            sq.score_breakdown.insert(*criterion, *score);
        }
        sq.overall_score = overall_score;
        sq.evaluations.push(SupplierEvaluation {
            id: EntityId::new(EntityPrefix::Eval),
            evaluation_date: now,
            evaluated_by: input.evaluated_by,
            period: input.period,
            scores: input.scores,
            overall_score,
            comments: input.comments,
        });
        sq.updated_at = now;
        self.save(&sq)?;

        self.emit(
            "supplier.evaluation.completed",
            tenant,
            json!({
                "qualification_id": sq.id,
                "supplier_id": sq.supplier_id,
                "overall_score": overall_score,
            }),
        );
        Ok(sq)
    }

    /// Schedule an audit with the tenant's next audit number
    pub fn schedule_supplier_audit(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: ScheduleAudit,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.auditor, "auditor")?;
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let audit_number = self.allocate_number(tenant, SequenceKind::SupplierAudit)?;
        let audit = SupplierAudit {
            id: EntityId::new(EntityPrefix::Sa),
            audit_number,
            audit_type: input.audit_type,
            status: SupplierAuditStatus::Scheduled,
            scheduled_date: input.scheduled_date,
            actual_date: None,
            auditor: input.auditor,
            scope: input.scope,
            result: None,
            score: None,
            findings: Vec::new(),
            capa_required: false,
            notes: None,
        };
        let payload = json!({
            "qualification_id": sq.id,
            "audit_id": audit.id,
            "audit_number": audit.audit_number,
            "scheduled_date": audit.scheduled_date,
        });
        sq.next_audit_date = Some(audit.scheduled_date);
        sq.audits.push(audit);
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit("supplier.audit.scheduled", tenant, payload);
        Ok(sq)
    }

    pub fn start_supplier_audit(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        audit_id: &EntityId,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        let audit = audit_mut(&mut sq, audit_id)?;
        ensure(
            audit.status == SupplierAuditStatus::Scheduled,
            "Audit is not scheduled",
        )?;

        audit.status = SupplierAuditStatus::InProgress;
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.audit.started",
            tenant,
            json!({ "qualification_id": sq.id, "audit_id": audit_id }),
        );
        Ok(sq)
    }

    /// Close an audit with its findings. A failed audit puts the supplier on hold.
    pub fn complete_supplier_audit(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        audit_id: &EntityId,
        input: CompleteAudit,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        let audit = audit_mut(&mut sq, audit_id)?;
        ensure(
            audit.status == SupplierAuditStatus::InProgress,
            "Audit is not in progress",
        )?;

        audit.status = SupplierAuditStatus::Completed;
        audit.actual_date = Some(input.actual_date);
        audit.result = Some(input.result);
        audit.score = input.score;
        audit.capa_required = input.capa_required;
        audit.notes = input.notes;
        audit.findings = input
            .findings
            .into_iter()
            .map(|f| AuditFinding {
                id: EntityId::new(EntityPrefix::Fnd),
                severity: f.severity,
                description: f.description,
                clause: f.clause,
                corrective_action_required: f.corrective_action_required,
                status: FindingStatus::Open,
            })
            .collect();
        let findings = audit.findings.len();

        let failed = input.result == AuditResult::Fail;
        sq.last_audit_date = Some(input.actual_date);
        if failed {
            sq.status = QualificationStatus::OnHold;
            sq.hold_reason = Some("Failed supplier audit".to_string());
        }
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.audit.completed",
            tenant,
            json!({
                "qualification_id": sq.id,
                "audit_id": audit_id,
                "result": input.result,
                "findings": findings,
                "capa_required": input.capa_required,
            }),
        );
        if failed {
            self.emit(
                "supplier.qualification.on_hold",
                tenant,
                json!({ "qualification_id": sq.id, "reason": sq.hold_reason }),
            );
        }
        Ok(sq)
    }

    pub fn cancel_supplier_audit(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        audit_id: &EntityId,
        reason: &str,
    ) -> QualityResult<SupplierQualification> {
        let mut sq: SupplierQualification = self.load(tenant, id)?;
        let audit = audit_mut(&mut sq, audit_id)?;
        ensure(
            audit.status != SupplierAuditStatus::Completed,
            "Cannot cancel completed audit",
        )?;

        audit.status = SupplierAuditStatus::Cancelled;
        audit.notes = Some(reason.to_string());
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.audit.cancelled",
            tenant,
            json!({ "qualification_id": sq.id, "audit_id": audit_id, "reason": reason }),
        );
        Ok(sq)
    }

    /// Record one period of deliveries and re-derive the risk level from the
    /// cumulative rates.
    pub fn record_supplier_performance(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: RecordPerformance,
    ) -> QualityResult<SupplierQualification> {
        require_text(&input.period, "period")?;
        ensure(input.orders_count > 0, "Orders count must be positive")?;
        ensure(
            input.defects_count <= input.orders_count
                && input.late_deliveries_count <= input.orders_count
                && input.returns_count <= input.orders_count,
            "Counts cannot exceed orders count",
        )?;
        let mut sq: SupplierQualification = self.load(tenant, id)?;

        let orders = f64::from(input.orders_count);
        let record = PerformanceRecord {
            period: input.period,
            quality_rate: percent(u64::from(input.orders_count - input.defects_count), orders),
            on_time_delivery_rate: percent(
                u64::from(input.orders_count - input.late_deliveries_count),
                orders,
            ),
            defect_rate: percent(u64::from(input.defects_count), orders),
            orders_count: input.orders_count,
            defects_count: input.defects_count,
            late_deliveries_count: input.late_deliveries_count,
            returns_count: input.returns_count,
            recorded_at: Utc::now(),
        };
        sq.performance.accumulate(
            input.orders_count,
            input.defects_count,
            input.late_deliveries_count,
            input.returns_count,
        );
        let previous = sq.risk_level;
        let risk_level = sq.performance.risk_level();
        sq.risk_level = risk_level;
        let payload = json!({
            "qualification_id": sq.id,
            "supplier_id": sq.supplier_id,
            "period": record.period,
            "quality_rate": record.quality_rate,
            "on_time_delivery_rate": record.on_time_delivery_rate,
        });
        sq.performance_history.push(record);
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit("supplier.performance.recorded", tenant, payload);
        if previous != risk_level {
            tracing::warn!(
                supplier = %sq.supplier_id,
                from = %previous,
                to = %risk_level,
                "supplier risk level changed by performance"
            );
            self.emit(
                "supplier.risk_level_changed",
                tenant,
                json!({
                    "qualification_id": sq.id,
                    "supplier_id": sq.supplier_id,
                    "previous_level": previous,
                    "new_level": risk_level,
                    "reason": "Performance threshold breach",
                }),
            );
        }
        Ok(sq)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use chrono::Duration;

    fn create(engine: &mut TestEngine) -> SupplierQualification {
        engine
            .create_supplier_qualification(
                &tenant("acme"),
                CreateSupplierQualification {
                    supplier_id: "SUP-100".to_string(),
                    supplier_code: "ACAST".to_string(),
                    supplier_name: "Acme Castings".to_string(),
                    ..CreateSupplierQualification::default()
                },
            )
            .unwrap()
    }

    fn qualify(conditions: Vec<String>) -> QualifySupplier {
        QualifySupplier {
            qualified_by: "sqe".to_string(),
            expiration_date: Some(Utc::now() + Duration::days(365)),
            conditions,
        }
    }

    #[test]
    fn test_qualification_flow() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        assert_eq!(sq.risk_level, RiskLevel::Medium);

        let err = engine.qualify_supplier(&t, &sq.id, qualify(vec![])).unwrap_err();
        assert_eq!(err.to_string(), "Supplier cannot be qualified from current status");

        engine.start_evaluation(&t, &sq.id).unwrap();
        let sq = engine
            .qualify_supplier(&t, &sq.id, qualify(vec!["100% incoming inspection".to_string()]))
            .unwrap();
        assert_eq!(sq.status, QualificationStatus::ConditionallyQualified);
        assert_eq!(
            engine
                .publisher()
                .last("supplier.qualification.qualified")
                .unwrap()
                .payload["conditional"],
            true
        );

        let sq = engine.qualify_supplier(&t, &sq.id, qualify(vec![])).unwrap();
        assert_eq!(sq.status, QualificationStatus::Qualified);
        assert!(sq.conditions.is_empty());
    }

    #[test]
    fn test_evaluation_requires_pending() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        engine.start_evaluation(&t, &sq.id).unwrap();

        let err = engine.start_evaluation(&t, &sq.id).unwrap_err();
        assert_eq!(err.to_string(), "Supplier must be in pending status");
    }

    #[test]
    fn test_hold_then_requalify_and_disqualify() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);

        let sq = engine.put_supplier_on_hold(&t, &sq.id, "late audit").unwrap();
        assert_eq!(sq.status, QualificationStatus::OnHold);
        assert_eq!(sq.hold_reason.as_deref(), Some("late audit"));

        let sq = engine.qualify_supplier(&t, &sq.id, qualify(vec![])).unwrap();
        assert_eq!(sq.status, QualificationStatus::Qualified);

        let sq = engine.disqualify_supplier(&t, &sq.id, "fraud").unwrap();
        assert_eq!(sq.status, QualificationStatus::Disqualified);
        assert!(engine.qualify_supplier(&t, &sq.id, qualify(vec![])).is_err());
    }

    #[test]
    fn test_risk_event_only_on_change() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);

        engine.set_supplier_risk_level(&t, &sq.id, RiskLevel::Medium).unwrap();
        assert!(engine.publisher().last("supplier.risk_level_changed").is_none());

        engine.set_supplier_risk_level(&t, &sq.id, RiskLevel::High).unwrap();
        let event = engine.publisher().last("supplier.risk_level_changed").unwrap();
        assert_eq!(event.payload["previous_level"], "medium");
        assert_eq!(event.payload["new_level"], "high");
    }

    #[test]
    fn test_lookup_and_filters() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        engine.start_evaluation(&t, &sq.id).unwrap();
        engine
            .qualify_supplier(
                &t,
                &sq.id,
                QualifySupplier {
                    qualified_by: "sqe".to_string(),
                    expiration_date: Some(Utc::now() + Duration::days(10)),
                    conditions: vec![],
                },
            )
            .unwrap();

        assert_eq!(
            engine.find_by_supplier(&t, "SUP-100").unwrap().unwrap().id,
            sq.id
        );
        assert!(engine.find_by_supplier(&t, "SUP-999").unwrap().is_none());
        assert!(engine.find_by_supplier(&tenant("globex"), "SUP-100").unwrap().is_none());

        let expiring = engine
            .list_supplier_qualifications(
                &t,
                &SupplierFilter {
                    expiring_before: Some(Utc::now() + Duration::days(30)),
                    ..SupplierFilter::default()
                },
            )
            .unwrap();
        assert_eq!(expiring.len(), 1);

        let pending = engine
            .list_supplier_qualifications(
                &t,
                &SupplierFilter {
                    status: Some(QualificationStatus::Pending),
                    ..SupplierFilter::default()
                },
            )
            .unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn test_approved_categories() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        let input = AddApprovedCategory {
            category_id: "CAST".to_string(),
            category_name: "Castings".to_string(),
            approved_by: "sqe".to_string(),
            ..AddApprovedCategory::default()
        };

        let sq = engine.add_approved_category(&t, &sq.id, input.clone()).unwrap();
        assert_eq!(sq.approved_categories.len(), 1);

        let err = engine.add_approved_category(&t, &sq.id, input).unwrap_err();
        assert_eq!(err.to_string(), "Category already approved");

        let sq = engine.remove_approved_category(&t, &sq.id, "NOPE").unwrap();
        assert_eq!(sq.approved_categories.len(), 1);
        let sq = engine.remove_approved_category(&t, &sq.id, "CAST").unwrap();
        assert!(sq.approved_categories.is_empty());
    }

    #[test]
    fn test_certificate_verification() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        let sq = engine
            .add_supplier_certificate(
                &t,
                &sq.id,
                AddSupplierCertificate {
                    certification_type: "iso_9001".to_string(),
                    certificate_number: "Q-123".to_string(),
                    issuing_body: "BSI".to_string(),
                    issue_date: Utc::now() - Duration::days(10),
                    expiry_date: Utc::now() + Duration::days(1000),
                },
            )
            .unwrap();
        assert!(!sq.certifications[0].verified);

        let cert_id = sq.certifications[0].id.clone();
        let sq = engine.verify_supplier_certificate(&t, &sq.id, &cert_id, "sqe").unwrap();
        assert!(sq.certifications[0].verified);
        assert_eq!(sq.certifications[0].verified_by.as_deref(), Some("sqe"));

        let missing = EntityId::new(EntityPrefix::Scert);
        assert!(engine
            .verify_supplier_certificate(&t, &sq.id, &missing, "sqe")
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_evaluation_sets_overall_score() {
        use crate::entities::supplier::EvaluationCriterion;

        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        let scores = [
            (EvaluationCriterion::Quality, 90.0),
            (EvaluationCriterion::Delivery, 80.0),
            (EvaluationCriterion::Price, 70.0),
        ]
        .into_iter()
        .collect();

        let sq = engine
            .create_supplier_evaluation(
                &t,
                &sq.id,
                CreateEvaluation {
                    evaluated_by: "sqe".to_string(),
                    period: "2026-Q3".to_string(),
                    scores,
                    comments: None,
                },
            )
            .unwrap();
        assert_eq!(sq.overall_score, 80.0);
        assert_eq!(sq.score_breakdown[&EvaluationCriterion::Delivery], 80.0);
        assert_eq!(sq.evaluations.len(), 1);

        let err = engine
            .create_supplier_evaluation(
                &t,
                &sq.id,
                CreateEvaluation {
                    evaluated_by: "sqe".to_string(),
                    scores: [(EvaluationCriterion::Service, 120.0)].into_iter().collect(),
                    ..CreateEvaluation::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Scores must be between 0 and 100");
    }

    fn schedule(engine: &mut TestEngine, sq: &SupplierQualification) -> SupplierQualification {
        engine
            .schedule_supplier_audit(
                &tenant("acme"),
                &sq.id,
                ScheduleAudit {
                    audit_type: crate::entities::supplier::SupplierAuditType::Periodic,
                    scheduled_date: Utc::now() + Duration::days(14),
                    auditor: "lead".to_string(),
                    scope: "Casting line".to_string(),
                },
            )
            .unwrap()
    }

    fn outcome(result: AuditResult) -> CompleteAudit {
        CompleteAudit {
            actual_date: Utc::now(),
            result,
            score: Some(72.0),
            findings: vec![crate::entities::supplier::FindingInput {
                description: "Calibration overdue".to_string(),
                ..Default::default()
            }],
            capa_required: result == AuditResult::Fail,
            notes: None,
        }
    }

    #[test]
    fn test_audit_lifecycle_guards() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        let sq = schedule(&mut engine, &sq);
        let audit = sq.audits[0].clone();
        assert!(audit.audit_number.starts_with("SA-"));
        assert!(audit.audit_number.ends_with("-00001"));
        assert_eq!(sq.next_audit_date, Some(audit.scheduled_date));

        let err = engine
            .complete_supplier_audit(&t, &sq.id, &audit.id, outcome(AuditResult::Pass))
            .unwrap_err();
        assert_eq!(err.to_string(), "Audit is not in progress");

        engine.start_supplier_audit(&t, &sq.id, &audit.id).unwrap();
        let err = engine.start_supplier_audit(&t, &sq.id, &audit.id).unwrap_err();
        assert_eq!(err.to_string(), "Audit is not scheduled");

        let sq = engine
            .complete_supplier_audit(&t, &sq.id, &audit.id, outcome(AuditResult::Pass))
            .unwrap();
        assert_eq!(sq.audits[0].status, SupplierAuditStatus::Completed);
        assert_eq!(sq.audits[0].findings[0].status, FindingStatus::Open);
        assert!(sq.last_audit_date.is_some());
        assert_eq!(sq.status, QualificationStatus::Pending);

        let err = engine
            .cancel_supplier_audit(&t, &sq.id, &audit.id, "dup")
            .unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel completed audit");
    }

    #[test]
    fn test_failed_audit_holds_supplier() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);
        let sq = schedule(&mut engine, &sq);
        let audit_id = sq.audits[0].id.clone();
        engine.start_supplier_audit(&t, &sq.id, &audit_id).unwrap();

        engine.publisher().clear();
        let sq = engine
            .complete_supplier_audit(&t, &sq.id, &audit_id, outcome(AuditResult::Fail))
            .unwrap();
        assert_eq!(sq.status, QualificationStatus::OnHold);
        assert_eq!(
            engine.publisher().names(),
            vec!["supplier.audit.completed", "supplier.qualification.on_hold"]
        );
    }

    #[test]
    fn test_performance_drives_risk_level() {
        let mut engine = engine();
        let t = tenant("acme");
        let sq = create(&mut engine);

        let sq = engine
            .record_supplier_performance(
                &t,
                &sq.id,
                RecordPerformance {
                    period: "2026-09".to_string(),
                    orders_count: 100,
                    defects_count: 1,
                    late_deliveries_count: 2,
                    returns_count: 0,
                },
            )
            .unwrap();
        assert_eq!(sq.risk_level, RiskLevel::Low);
        assert_eq!(sq.performance_history[0].quality_rate, 99.0);
        let event = engine.publisher().last("supplier.risk_level_changed").unwrap();
        assert_eq!(event.payload["reason"], "Performance threshold breach");

        let sq = engine
            .record_supplier_performance(
                &t,
                &sq.id,
                RecordPerformance {
                    period: "2026-10".to_string(),
                    orders_count: 100,
                    defects_count: 25,
                    late_deliveries_count: 0,
                    returns_count: 0,
                },
            )
            .unwrap();
        assert_eq!(sq.performance.total_orders, 200);
        assert_eq!(sq.performance.quality_rate, 87.0);
        assert_eq!(sq.risk_level, RiskLevel::Critical);

        let err = engine
            .record_supplier_performance(
                &t,
                &sq.id,
                RecordPerformance {
                    period: "2026-11".to_string(),
                    orders_count: 5,
                    defects_count: 6,
                    ..RecordPerformance::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Counts cannot exceed orders count");
        let err = engine
            .record_supplier_performance(
                &t,
                &sq.id,
                RecordPerformance {
                    period: "2026-11".to_string(),
                    ..RecordPerformance::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Orders count must be positive");
    }
}
