//! Inspection lifecycle operations

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{ensure, newest_first, require_text, within, QualityEngine};
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::inspection::{
    acceptance_rate, inspection_verdict, CheckSpec, CompleteInspection, CreateInspection,
    InspectionCheck, InspectionDefect, InspectionResult, InspectionStatus, InspectionType,
    RecordCheckResult, RecordDefect, ReferenceType,
};
use crate::entities::{Inspection, QualityChecklist};

/// Criteria for [`QualityEngine::list_inspections`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct InspectionFilter {
    pub inspection_type: Option<InspectionType>,
    pub status: Option<InspectionStatus>,
    pub result: Option<InspectionResult>,
    pub reference_type: Option<ReferenceType>,
    pub reference_id: Option<String>,
    pub item_id: Option<String>,
    pub supplier_id: Option<String>,
    /// Bounds on the planned date
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
}

impl InspectionFilter {
    pub fn matches(&self, insp: &Inspection) -> bool {
        self.inspection_type.map_or(true, |t| insp.inspection_type == t)
            && self.status.map_or(true, |s| insp.status == s)
            && self.result.map_or(true, |r| insp.result == r)
            && self.reference_type.map_or(true, |r| insp.reference_type == r)
            && self
                .reference_id
                .as_ref()
                .map_or(true, |r| &insp.reference_id == r)
            && self.item_id.as_ref().map_or(true, |i| &insp.item_id == i)
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |s| insp.supplier_id.as_ref() == Some(s))
            && within(insp.planned_date, self.date_from, self.date_to)
    }
}

fn check_mut<'a>(
    insp: &'a mut Inspection,
    check_id: &EntityId,
) -> QualityResult<&'a mut InspectionCheck> {
    insp.find_check_mut(check_id)
        .ok_or_else(|| QualityError::not_found("Check", check_id))
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Plan an inspection with the tenant's next number. When a checklist is
    /// given its items become the inspection's checks.
    pub fn create_inspection(
        &mut self,
        tenant: &TenantId,
        input: CreateInspection,
    ) -> QualityResult<Inspection> {
        require_text(&input.item_id, "item_id")?;
        ensure(
            input.sample_size <= input.total_quantity,
            "Sample size exceeds total quantity",
        )?;

        let checklist = match &input.checklist_id {
            Some(id) => {
                let checklist: QualityChecklist = self.load(tenant, id)?;
                ensure(checklist.is_active, "Checklist is not active")?;
                Some(checklist)
            }
            None => None,
        };

        let number = self.allocate_number(tenant, SequenceKind::Inspection)?;
        let mut insp = Inspection::new(tenant.clone(), number, input);
        if let Some(checklist) = checklist {
            for item in &checklist.items {
                insp.push_check(item.to_check());
            }
            insp.checklist_name = Some(checklist.name);
        }
        self.save(&insp)?;

        tracing::info!(inspection = %insp.inspection_number, tenant = %tenant, "created inspection");
        self.emit(
            "inspection.created",
            tenant,
            json!({
                "inspection_id": insp.id,
                "inspection_number": insp.inspection_number,
                "inspection_type": insp.inspection_type,
                "item_id": insp.item_id,
                "checks": insp.checks.len(),
            }),
        );
        Ok(insp)
    }

    pub fn get_inspection(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<Inspection> {
        self.load(tenant, id)
    }

    pub fn find_inspection_by_number(
        &self,
        tenant: &TenantId,
        number: &str,
    ) -> QualityResult<Inspection> {
        self.list_all::<Inspection>(tenant)?
            .into_iter()
            .find(|insp| insp.inspection_number.eq_ignore_ascii_case(number))
            .ok_or_else(|| QualityError::not_found("Inspection", number))
    }

    /// Inspections of a tenant matching `filter`, newest first
    pub fn list_inspections(
        &self,
        tenant: &TenantId,
        filter: &InspectionFilter,
    ) -> QualityResult<Vec<Inspection>> {
        let mut items: Vec<Inspection> = self
            .list_all::<Inspection>(tenant)?
            .into_iter()
            .filter(|insp| filter.matches(insp))
            .collect();
        newest_first(&mut items);
        Ok(items)
    }

    pub fn start_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        inspector: &str,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::Planned,
            "Inspection is not in planned status",
        )?;

        let now = Utc::now();
        insp.status = InspectionStatus::InProgress;
        insp.started_at = Some(now);
        insp.inspected_by = Some(inspector.to_string());
        insp.updated_at = now;
        self.save(&insp)?;

        self.emit(
            "inspection.started",
            tenant,
            json!({ "inspection_id": insp.id, "inspected_by": inspector }),
        );
        Ok(insp)
    }

    pub fn add_inspection_check(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        spec: CheckSpec,
    ) -> QualityResult<Inspection> {
        require_text(&spec.check_name, "check_name")?;
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            matches!(
                insp.status,
                InspectionStatus::Planned | InspectionStatus::InProgress
            ),
            "Cannot add checks to this inspection",
        )?;

        let check_id = insp.push_check(spec).id.clone();
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.check_added",
            tenant,
            json!({ "inspection_id": insp.id, "check_id": check_id }),
        );
        Ok(insp)
    }

    pub fn record_check_result(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        check_id: &EntityId,
        input: RecordCheckResult,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::InProgress,
            "Inspection must be in progress",
        )?;

        let check = check_mut(&mut insp, check_id)?;
        check.actual_value = input.actual_value;
        check.result = input.result;
        if input.notes.is_some() {
            check.notes = input.notes;
        }
        let result = check.result;
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.check_recorded",
            tenant,
            json!({ "inspection_id": insp.id, "check_id": check_id, "result": result }),
        );
        Ok(insp)
    }

    /// Record a defect, adding it to the severity totals. A linked check that
    /// has no result yet fails.
    pub fn record_defect(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: RecordDefect,
    ) -> QualityResult<Inspection> {
        require_text(&input.defect_code, "defect_code")?;
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::InProgress,
            "Inspection must be in progress",
        )?;
        ensure(input.quantity > 0, "Defect quantity must be at least 1")?;

        let defect = InspectionDefect {
            id: EntityId::new(EntityPrefix::Def),
            defect_name: if input.defect_name.trim().is_empty() {
                input.defect_code.clone()
            } else {
                input.defect_name
            },
            defect_code: input.defect_code,
            severity: input.severity,
            quantity: input.quantity,
            description: input.description,
            check_id: input.check_id,
            root_cause: input.root_cause,
            created_at: Utc::now(),
        };

        if let Some(check_id) = &defect.check_id {
            let check = check_mut(&mut insp, check_id)?;
            check.defect_id = Some(defect.id.clone());
            if check.result == InspectionResult::Pending {
                check.result = InspectionResult::Fail;
            }
        }
        insp.tally_defects(defect.severity, defect.quantity);
        insp.updated_at = defect.created_at;

        let payload = json!({
            "inspection_id": insp.id,
            "defect_id": defect.id,
            "defect_code": defect.defect_code,
            "severity": defect.severity,
            "quantity": defect.quantity,
        });
        insp.defects.push(defect);
        self.save(&insp)?;

        self.emit("inspection.defect_recorded", tenant, payload);
        Ok(insp)
    }

    /// Close the inspection work and compute the verdict; the result then
    /// waits for review.
    pub fn complete_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: CompleteInspection,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::InProgress,
            "Inspection must be in progress",
        )?;
        ensure(
            u64::from(input.passed_quantity) + u64::from(input.failed_quantity)
                <= u64::from(insp.sample_size),
            "Quantities exceed sample size",
        )?;

        let now = Utc::now();
        insp.passed_quantity = input.passed_quantity;
        insp.failed_quantity = input.failed_quantity;
        insp.acceptance_rate = acceptance_rate(input.passed_quantity, insp.sample_size);
        insp.result = inspection_verdict(insp.critical_defects, insp.acceptance_rate);
        insp.status = InspectionStatus::PendingReview;
        insp.completed_at = Some(now);
        if !input.inspected_by.trim().is_empty() {
            insp.inspected_by = Some(input.inspected_by);
        }
        if input.notes.is_some() {
            insp.notes = input.notes;
        }
        insp.updated_at = now;
        self.save(&insp)?;

        tracing::info!(
            inspection = %insp.inspection_number,
            result = %insp.result,
            acceptance = insp.acceptance_rate,
            "inspection completed"
        );
        self.emit(
            "inspection.completed",
            tenant,
            json!({
                "inspection_id": insp.id,
                "result": insp.result,
                "acceptance_rate": insp.acceptance_rate,
                "total_defects": insp.total_defects,
            }),
        );
        Ok(insp)
    }

    /// Accept or reject a completed inspection
    pub fn review_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        approved: bool,
        reviewer: &str,
        notes: Option<String>,
    ) -> QualityResult<Inspection> {
        require_text(reviewer, "reviewer")?;
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::PendingReview,
            "Inspection is not pending review",
        )?;

        let now = Utc::now();
        insp.status = if approved {
            InspectionStatus::Approved
        } else {
            InspectionStatus::Rejected
        };
        insp.reviewed_by = Some(reviewer.to_string());
        insp.reviewed_at = Some(now);
        insp.review_notes = notes;
        insp.updated_at = now;
        self.save(&insp)?;

        self.emit(
            "inspection.reviewed",
            tenant,
            json!({
                "inspection_id": insp.id,
                "approved": approved,
                "result": insp.result,
                "reviewed_by": reviewer,
            }),
        );
        Ok(insp)
    }

    pub fn hold_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            !matches!(
                insp.status,
                InspectionStatus::Approved | InspectionStatus::Cancelled
            ),
            "Cannot put this inspection on hold",
        )?;

        insp.status = InspectionStatus::OnHold;
        insp.hold_reason = Some(reason.to_string());
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.on_hold",
            tenant,
            json!({ "inspection_id": insp.id, "reason": reason }),
        );
        Ok(insp)
    }

    /// Take an inspection off hold. Completed work goes back to review,
    /// anything else back to in progress.
    pub fn release_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status == InspectionStatus::OnHold,
            "Inspection is not on hold",
        )?;

        insp.status = if insp.completed_at.is_some() {
            InspectionStatus::PendingReview
        } else {
            InspectionStatus::InProgress
        };
        insp.hold_reason = None;
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.released",
            tenant,
            json!({ "inspection_id": insp.id, "status": insp.status }),
        );
        Ok(insp)
    }

    pub fn cancel_inspection(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<Inspection> {
        let mut insp: Inspection = self.load(tenant, id)?;
        ensure(
            insp.status != InspectionStatus::Approved,
            "Cannot cancel approved inspection",
        )?;

        insp.status = InspectionStatus::Cancelled;
        insp.cancellation_reason = Some(reason.to_string());
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.cancelled",
            tenant,
            json!({ "inspection_id": insp.id, "reason": reason }),
        );
        Ok(insp)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::entities::checklist::CreateChecklist;
    use crate::entities::inspection::{CheckType, DefectSeverity};

    fn plan(engine: &mut TestEngine, tenant_name: &str) -> Inspection {
        engine
            .create_inspection(
                &tenant(tenant_name),
                CreateInspection {
                    item_id: "ITEM-7".to_string(),
                    item_code: "BRK-7".to_string(),
                    supplier_id: Some("SUP-100".to_string()),
                    sample_size: 100,
                    total_quantity: 1000,
                    ..CreateInspection::default()
                },
            )
            .unwrap()
    }

    fn started(engine: &mut TestEngine) -> Inspection {
        let insp = plan(engine, "acme");
        engine.start_inspection(&tenant("acme"), &insp.id, "inspector").unwrap()
    }

    fn defect(severity: DefectSeverity, quantity: u32) -> RecordDefect {
        RecordDefect {
            defect_code: "SCR-01".to_string(),
            severity,
            quantity,
            description: "Scratch".to_string(),
            ..RecordDefect::default()
        }
    }

    fn complete(passed: u32, failed: u32) -> CompleteInspection {
        CompleteInspection {
            passed_quantity: passed,
            failed_quantity: failed,
            inspected_by: "inspector".to_string(),
            notes: None,
        }
    }

    #[test]
    fn test_numbers_are_per_tenant() {
        let mut engine = engine();
        let first = plan(&mut engine, "acme");
        let second = plan(&mut engine, "acme");
        let other = plan(&mut engine, "globex");

        assert!(first.inspection_number.starts_with("QI-"));
        assert!(first.inspection_number.ends_with("-000001"));
        assert!(second.inspection_number.ends_with("-000002"));
        assert!(other.inspection_number.ends_with("-000001"));
        assert_eq!(first.status, InspectionStatus::Planned);
        assert_eq!(first.result, InspectionResult::Pending);
    }

    #[test]
    fn test_sample_larger_than_lot_is_rejected() {
        let mut engine = engine();
        let err = engine
            .create_inspection(
                &tenant("acme"),
                CreateInspection {
                    item_id: "ITEM-7".to_string(),
                    sample_size: 20,
                    total_quantity: 10,
                    ..CreateInspection::default()
                },
            )
            .unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(err.to_string(), "Sample size exceeds total quantity");
    }

    #[test]
    fn test_checklist_items_become_checks() {
        let mut engine = engine();
        let t = tenant("acme");
        let checklist = engine
            .create_checklist(
                &t,
                CreateChecklist {
                    code: "INC-STD".to_string(),
                    name: "Standard incoming".to_string(),
                    items: vec![
                        CheckSpec {
                            check_name: "Packaging".to_string(),
                            check_type: CheckType::Packaging,
                            ..CheckSpec::default()
                        },
                        CheckSpec {
                            check_name: "Bore".to_string(),
                            check_type: CheckType::Dimensional,
                            min_value: Some(9.95),
                            max_value: Some(10.05),
                            ..CheckSpec::default()
                        },
                    ],
                    created_by: "qa".to_string(),
                    ..CreateChecklist::default()
                },
            )
            .unwrap();

        let insp = engine
            .create_inspection(
                &t,
                CreateInspection {
                    item_id: "ITEM-7".to_string(),
                    sample_size: 5,
                    total_quantity: 50,
                    checklist_id: Some(checklist.id.clone()),
                    ..CreateInspection::default()
                },
            )
            .unwrap();
        assert_eq!(insp.checks.len(), 2);
        assert_eq!(insp.checks[1].check_name, "Bore");
        assert_eq!(insp.checks[1].result, InspectionResult::Pending);
        assert_eq!(insp.checklist_name.as_deref(), Some("Standard incoming"));

        engine.toggle_checklist(&t, &checklist.id).unwrap();
        let err = engine
            .create_inspection(
                &t,
                CreateInspection {
                    item_id: "ITEM-7".to_string(),
                    checklist_id: Some(checklist.id.clone()),
                    ..CreateInspection::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Checklist is not active");

        let foreign = engine
            .create_inspection(
                &tenant("globex"),
                CreateInspection {
                    item_id: "ITEM-7".to_string(),
                    checklist_id: Some(checklist.id),
                    ..CreateInspection::default()
                },
            )
            .unwrap_err();
        assert!(foreign.is_not_found());
    }

    #[test]
    fn test_start_requires_planned() {
        let mut engine = engine();
        let insp = started(&mut engine);
        assert_eq!(insp.status, InspectionStatus::InProgress);
        assert!(insp.started_at.is_some());

        let err = engine
            .start_inspection(&tenant("acme"), &insp.id, "inspector")
            .unwrap_err();
        assert_eq!(err.to_string(), "Inspection is not in planned status");
    }

    #[test]
    fn test_check_results_require_in_progress() {
        let mut engine = engine();
        let t = tenant("acme");
        let insp = plan(&mut engine, "acme");
        let insp = engine
            .add_inspection_check(
                &t,
                &insp.id,
                CheckSpec {
                    check_name: "Thread gauge".to_string(),
                    ..CheckSpec::default()
                },
            )
            .unwrap();
        let check_id = insp.checks[0].id.clone();

        let err = engine
            .record_check_result(&t, &insp.id, &check_id, RecordCheckResult::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Inspection must be in progress");

        engine.start_inspection(&t, &insp.id, "inspector").unwrap();
        let insp = engine
            .record_check_result(
                &t,
                &insp.id,
                &check_id,
                RecordCheckResult {
                    actual_value: Some("go".to_string()),
                    result: InspectionResult::Pass,
                    notes: None,
                },
            )
            .unwrap();
        assert_eq!(insp.checks[0].result, InspectionResult::Pass);

        let missing = EntityId::new(EntityPrefix::Chk);
        let err = engine
            .record_check_result(&t, &insp.id, &missing, RecordCheckResult::default())
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_defect_fails_linked_pending_check() {
        let mut engine = engine();
        let t = tenant("acme");
        let insp = started(&mut engine);
        let insp = engine
            .add_inspection_check(
                &t,
                &insp.id,
                CheckSpec {
                    check_name: "Surface".to_string(),
                    ..CheckSpec::default()
                },
            )
            .unwrap();
        let check_id = insp.checks[0].id.clone();

        let insp = engine
            .record_defect(
                &t,
                &insp.id,
                RecordDefect {
                    check_id: Some(check_id.clone()),
                    ..defect(DefectSeverity::Major, 2)
                },
            )
            .unwrap();
        let insp = engine
            .record_defect(&t, &insp.id, defect(DefectSeverity::Cosmetic, 3))
            .unwrap();

        assert_eq!(insp.checks[0].result, InspectionResult::Fail);
        assert_eq!(insp.checks[0].defect_id.as_ref(), Some(&insp.defects[0].id));
        assert_eq!(insp.total_defects, 5);
        assert_eq!(insp.major_defects, 2);
        assert_eq!(insp.minor_defects, 3);
        assert_eq!(insp.defects[1].defect_name, "SCR-01");

        let err = engine
            .record_defect(&t, &insp.id, defect(DefectSeverity::Minor, 0))
            .unwrap_err();
        assert!(err.is_bad_request());
    }

    #[test]
    fn test_complete_computes_verdict() {
        let mut engine = engine();
        let t = tenant("acme");

        let insp = started(&mut engine);
        let err = engine
            .complete_inspection(&t, &insp.id, complete(90, 20))
            .unwrap_err();
        assert_eq!(err.to_string(), "Quantities exceed sample size");
        assert_eq!(
            engine.get_inspection(&t, &insp.id).unwrap().status,
            InspectionStatus::InProgress
        );

        let done = engine
            .complete_inspection(&t, &insp.id, complete(96, 4))
            .unwrap();
        assert_eq!(done.status, InspectionStatus::PendingReview);
        assert_eq!(done.result, InspectionResult::Pass);
        assert_eq!(done.acceptance_rate, 96.0);

        let insp = started(&mut engine);
        let done = engine
            .complete_inspection(&t, &insp.id, complete(85, 15))
            .unwrap();
        assert_eq!(done.result, InspectionResult::ConditionalPass);

        let insp = started(&mut engine);
        engine
            .record_defect(&t, &insp.id, defect(DefectSeverity::Critical, 1))
            .unwrap();
        let done = engine
            .complete_inspection(&t, &insp.id, complete(100, 0))
            .unwrap();
        assert_eq!(done.result, InspectionResult::Fail);
        assert_eq!(
            engine.publisher().last("inspection.completed").unwrap().payload["result"],
            "fail"
        );
    }

    #[test]
    fn test_review_and_cancel_guards() {
        let mut engine = engine();
        let t = tenant("acme");
        let insp = started(&mut engine);

        let err = engine
            .review_inspection(&t, &insp.id, true, "qm", None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Inspection is not pending review");

        engine.complete_inspection(&t, &insp.id, complete(100, 0)).unwrap();
        let insp = engine
            .review_inspection(&t, &insp.id, true, "qm", Some("ok".to_string()))
            .unwrap();
        assert_eq!(insp.status, InspectionStatus::Approved);
        assert_eq!(insp.reviewed_by.as_deref(), Some("qm"));

        let err = engine.cancel_inspection(&t, &insp.id, "dup").unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel approved inspection");
        let err = engine.hold_inspection(&t, &insp.id, "recall").unwrap_err();
        assert_eq!(err.to_string(), "Cannot put this inspection on hold");
    }

    #[test]
    fn test_release_returns_to_prior_stage() {
        let mut engine = engine();
        let t = tenant("acme");

        let insp = started(&mut engine);
        engine.hold_inspection(&t, &insp.id, "gauge broken").unwrap();
        let insp = engine.release_inspection(&t, &insp.id).unwrap();
        assert_eq!(insp.status, InspectionStatus::InProgress);
        assert!(insp.hold_reason.is_none());

        engine.complete_inspection(&t, &insp.id, complete(100, 0)).unwrap();
        engine.hold_inspection(&t, &insp.id, "awaiting lab").unwrap();
        let insp = engine.release_inspection(&t, &insp.id).unwrap();
        assert_eq!(insp.status, InspectionStatus::PendingReview);

        let err = engine.release_inspection(&t, &insp.id).unwrap_err();
        assert_eq!(err.to_string(), "Inspection is not on hold");
    }

    #[test]
    fn test_list_filters() {
        let mut engine = engine();
        let t = tenant("acme");
        let a = plan(&mut engine, "acme");
        let b = engine
            .create_inspection(
                &t,
                CreateInspection {
                    inspection_type: InspectionType::Final,
                    item_id: "ITEM-9".to_string(),
                    ..CreateInspection::default()
                },
            )
            .unwrap();
        plan(&mut engine, "globex");

        let all = engine.list_inspections(&t, &InspectionFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, b.id);

        let by_supplier = engine
            .list_inspections(
                &t,
                &InspectionFilter {
                    supplier_id: Some("SUP-100".to_string()),
                    ..InspectionFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_supplier.len(), 1);
        assert_eq!(by_supplier[0].id, a.id);

        let finals = engine
            .list_inspections(
                &t,
                &InspectionFilter {
                    inspection_type: Some(InspectionType::Final),
                    item_id: Some("ITEM-9".to_string()),
                    ..InspectionFilter::default()
                },
            )
            .unwrap();
        assert_eq!(finals.len(), 1);

        assert_eq!(
            engine
                .find_inspection_by_number(&t, &a.inspection_number.to_lowercase())
                .unwrap()
                .id,
            a.id
        );
    }
}
