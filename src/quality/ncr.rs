//! NCR lifecycle operations

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{ensure, newest_first, require_text, within, QualityEngine};
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::ncr::{
    AddContainmentAction, ContainmentAction, ContainmentStatus, CreateNcr, Disposition, Investigation,
    NcrSeverity, NcrSource, NcrStatus, NcrType, RecordInvestigation, SetDisposition, SetNcrCost,
    UpdateContainmentAction,
};
use crate::entities::Ncr;

/// Criteria for [`QualityEngine::list_ncrs`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct NcrFilter {
    pub status: Option<NcrStatus>,
    pub ncr_type: Option<NcrType>,
    pub severity: Option<NcrSeverity>,
    pub source: Option<NcrSource>,
    pub assigned_to: Option<String>,
    pub supplier_id: Option<String>,
    pub capa_id: Option<EntityId>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    /// Only NCRs past their target date and still open
    pub overdue: bool,
}

impl NcrFilter {
    pub fn matches(&self, ncr: &Ncr, now: DateTime<Utc>) -> bool {
        self.status.map_or(true, |s| ncr.status == s)
            && self.ncr_type.map_or(true, |t| ncr.ncr_type == t)
            && self.severity.map_or(true, |s| ncr.severity == s)
            && self.source.map_or(true, |s| ncr.source == s)
            && self
                .assigned_to
                .as_ref()
                .map_or(true, |a| ncr.assigned_to.as_ref() == Some(a))
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |s| ncr.links.supplier_id.as_ref() == Some(s))
            && self
                .capa_id
                .as_ref()
                .map_or(true, |c| ncr.capa_id.as_ref() == Some(c))
            && within(ncr.created_at, self.date_from, self.date_to)
            && (!self.overdue || ncr.is_overdue(now))
    }
}

fn containment_rank(status: ContainmentStatus) -> u8 {
    match status {
        ContainmentStatus::Pending => 0,
        ContainmentStatus::InProgress => 1,
        ContainmentStatus::Completed => 2,
    }
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Create a draft NCR with the tenant's next number
    pub fn create_ncr(&mut self, tenant: &TenantId, input: CreateNcr) -> QualityResult<Ncr> {
        require_text(&input.title, "title")?;
        require_text(&input.detected_by, "detected_by")?;

        let number = self.allocate_number(tenant, SequenceKind::Ncr)?;
        let ncr = Ncr::new(tenant.clone(), number, input);
        self.save(&ncr)?;

        tracing::info!(ncr = %ncr.ncr_number, tenant = %tenant, "created NCR");
        self.emit(
            "ncr.created",
            tenant,
            json!({
                "ncr_id": ncr.id,
                "ncr_number": ncr.ncr_number,
                "severity": ncr.severity,
                "ncr_type": ncr.ncr_type,
            }),
        );
        Ok(ncr)
    }

    pub fn get_ncr(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<Ncr> {
        self.load(tenant, id)
    }

    /// Look up an NCR by its human-readable number
    pub fn find_ncr_by_number(&self, tenant: &TenantId, number: &str) -> QualityResult<Ncr> {
        self.list_all::<Ncr>(tenant)?
            .into_iter()
            .find(|ncr| ncr.ncr_number.eq_ignore_ascii_case(number))
            .ok_or_else(|| QualityError::not_found("NCR", number))
    }

    /// NCRs of a tenant matching `filter`, newest first
    pub fn list_ncrs(&self, tenant: &TenantId, filter: &NcrFilter) -> QualityResult<Vec<Ncr>> {
        let now = Utc::now();
        let mut ncrs: Vec<Ncr> = self
            .list_all::<Ncr>(tenant)?
            .into_iter()
            .filter(|ncr| filter.matches(ncr, now))
            .collect();
        newest_first(&mut ncrs);
        Ok(ncrs)
    }

    pub fn open_ncr(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(ncr.status == NcrStatus::Draft, "NCR is not in draft status")?;

        ncr.status = NcrStatus::Open;
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit("ncr.opened", tenant, json!({ "ncr_id": ncr.id }));
        Ok(ncr)
    }

    pub fn start_ncr_investigation(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            ncr.status == NcrStatus::Open,
            "NCR must be open to start investigation",
        )?;

        ncr.status = NcrStatus::UnderInvestigation;
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit("ncr.investigation_started", tenant, json!({ "ncr_id": ncr.id }));
        Ok(ncr)
    }

    pub fn record_investigation(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: RecordInvestigation,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            ncr.status == NcrStatus::UnderInvestigation,
            "NCR is not under investigation",
        )?;

        let now = Utc::now();
        ncr.investigation = Some(Investigation {
            root_cause: input.root_cause,
            findings: input.findings,
            investigated_by: input.investigated_by,
            investigated_at: now,
        });
        ncr.status = NcrStatus::PendingDisposition;
        ncr.updated_at = now;
        self.save(&ncr)?;

        self.emit(
            "ncr.investigation_completed",
            tenant,
            json!({ "ncr_id": ncr.id }),
        );
        Ok(ncr)
    }

    /// Approve a disposition. Accepted while pending disposition or still under investigation.
    pub fn set_disposition(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: SetDisposition,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            matches!(
                ncr.status,
                NcrStatus::PendingDisposition | NcrStatus::UnderInvestigation
            ),
            "NCR is not ready for disposition",
        )?;

        let now = Utc::now();
        let disposition_type = input.disposition_type;
        ncr.disposition = Some(Disposition {
            disposition_type,
            quantity: input.quantity,
            justification: input.justification,
            approved_by: input.approved_by,
            approved_at: now,
            implemented_by: None,
            implemented_at: None,
        });
        ncr.status = NcrStatus::DispositionApproved;
        ncr.updated_at = now;
        self.save(&ncr)?;

        self.emit(
            "ncr.disposition_set",
            tenant,
            json!({
                "ncr_id": ncr.id,
                "disposition_type": disposition_type,
                "quantity": input.quantity,
            }),
        );
        Ok(ncr)
    }

    pub fn implement_disposition(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        implemented_by: &str,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            ncr.status == NcrStatus::DispositionApproved,
            "NCR disposition is not approved",
        )?;

        let now = Utc::now();
        let disposition = ncr
            .disposition
            .as_mut()
            .ok_or_else(|| QualityError::bad_request("No disposition has been set"))?;
        disposition.implemented_by = Some(implemented_by.to_string());
        disposition.implemented_at = Some(now);
        ncr.status = NcrStatus::InProgress;
        ncr.updated_at = now;
        self.save(&ncr)?;

        self.emit(
            "ncr.disposition_implemented",
            tenant,
            json!({ "ncr_id": ncr.id, "implemented_by": implemented_by }),
        );
        Ok(ncr)
    }

    pub fn request_verification(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(ncr.status == NcrStatus::InProgress, "NCR is not in progress")?;

        ncr.status = NcrStatus::PendingVerification;
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit(
            "ncr.verification_requested",
            tenant,
            json!({ "ncr_id": ncr.id }),
        );
        Ok(ncr)
    }

    pub fn verify_and_close(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        verified_by: &str,
        notes: Option<String>,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            ncr.status == NcrStatus::PendingVerification,
            "NCR is not pending verification",
        )?;

        let now = Utc::now();
        ncr.status = NcrStatus::Closed;
        ncr.verified_by = Some(verified_by.to_string());
        ncr.verification_notes = notes;
        ncr.closed_date = Some(now);
        ncr.closed_by = Some(verified_by.to_string());
        ncr.updated_at = now;
        self.save(&ncr)?;

        tracing::info!(ncr = %ncr.ncr_number, "closed NCR");
        self.emit(
            "ncr.closed",
            tenant,
            json!({ "ncr_id": ncr.id, "closed_by": verified_by }),
        );
        Ok(ncr)
    }

    pub fn cancel_ncr(&mut self, tenant: &TenantId, id: &EntityId, reason: &str) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(ncr.status != NcrStatus::Closed, "Cannot cancel closed NCR")?;
        ensure(ncr.status != NcrStatus::Cancelled, "NCR is already cancelled")?;

        ncr.status = NcrStatus::Cancelled;
        ncr.cancellation_reason = Some(reason.to_string());
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit(
            "ncr.cancelled",
            tenant,
            json!({ "ncr_id": ncr.id, "reason": reason }),
        );
        Ok(ncr)
    }

    /// Set the assignee. Allowed in any state.
    pub fn assign_ncr(&mut self, tenant: &TenantId, id: &EntityId, assignee: &str) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;

        ncr.assigned_to = Some(assignee.to_string());
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit(
            "ncr.assigned",
            tenant,
            json!({ "ncr_id": ncr.id, "assigned_to": assignee }),
        );
        Ok(ncr)
    }

    pub fn add_containment_action(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: AddContainmentAction,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            !ncr.status.is_terminal(),
            "Cannot add containment actions to a closed or cancelled NCR",
        )?;
        require_text(&input.description, "description")?;

        let now = Utc::now();
        let action = ContainmentAction {
            id: EntityId::new(EntityPrefix::Cnt),
            description: input.description,
            status: ContainmentStatus::Pending,
            assigned_to: input.assigned_to,
            due_date: input.due_date,
            completed_at: None,
            completed_by: None,
            notes: None,
            created_at: now,
        };
        let action_id = action.id.clone();
        ncr.containment_actions.push(action);
        ncr.updated_at = now;
        self.save(&ncr)?;

        self.emit(
            "ncr.containment_action_added",
            tenant,
            json!({ "ncr_id": ncr.id, "action_id": action_id }),
        );
        Ok(ncr)
    }

    /// Update a containment action. Status only moves forward.
    pub fn update_containment_action(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        action_id: &EntityId,
        input: UpdateContainmentAction,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;
        ensure(
            !ncr.status.is_terminal(),
            "Cannot update containment actions on a closed or cancelled NCR",
        )?;

        let now = Utc::now();
        let action = ncr
            .containment_actions
            .iter_mut()
            .find(|a| &a.id == action_id)
            .ok_or_else(|| QualityError::not_found("Containment action", action_id))?;

        if let Some(next) = input.status {
            if containment_rank(next) < containment_rank(action.status) {
                return Err(QualityError::bad_request(format!(
                    "Containment action cannot move from {} to {}",
                    action.status, next
                )));
            }
            if next == ContainmentStatus::Completed && action.status != ContainmentStatus::Completed {
                action.completed_at = Some(now);
                action.completed_by = input.completed_by.clone();
            }
            action.status = next;
        }
        if let Some(assignee) = input.assigned_to {
            action.assigned_to = Some(assignee);
        }
        if let Some(notes) = input.notes {
            action.notes = Some(notes);
        }
        let status = action.status;
        ncr.updated_at = now;
        self.save(&ncr)?;

        self.emit(
            "ncr.containment_action_updated",
            tenant,
            json!({ "ncr_id": ncr.id, "action_id": action_id, "status": status }),
        );
        Ok(ncr)
    }

    /// Overwrite the given cost components; omitted ones keep their value
    pub fn set_ncr_cost(&mut self, tenant: &TenantId, id: &EntityId, input: SetNcrCost) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, id)?;

        let cost = &mut ncr.cost;
        if let Some(v) = input.material_cost {
            cost.material_cost = v;
        }
        if let Some(v) = input.labor_cost {
            cost.labor_cost = v;
        }
        if let Some(v) = input.rework_cost {
            cost.rework_cost = v;
        }
        if let Some(v) = input.scrap_cost {
            cost.scrap_cost = v;
        }
        if let Some(v) = input.other_cost {
            cost.other_cost = v;
        }
        if input.currency.is_some() {
            cost.currency = input.currency;
        }
        let total = cost.total();
        ncr.updated_at = Utc::now();
        self.save(&ncr)?;

        self.emit(
            "ncr.cost_updated",
            tenant,
            json!({ "ncr_id": ncr.id, "total_cost": total }),
        );
        Ok(ncr)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::entities::ncr::DispositionType;

    fn create(engine: &mut TestEngine, tenant_name: &str) -> Ncr {
        engine
            .create_ncr(
                &tenant(tenant_name),
                CreateNcr {
                    title: "Burr on machined edge".to_string(),
                    severity: NcrSeverity::Critical,
                    detected_by: "inspector".to_string(),
                    ..CreateNcr::default()
                },
            )
            .unwrap()
    }

    fn investigation() -> RecordInvestigation {
        RecordInvestigation {
            root_cause: "Worn deburring tool".to_string(),
            findings: "Tool past service interval".to_string(),
            investigated_by: "eng".to_string(),
        }
    }

    fn scrap() -> SetDisposition {
        SetDisposition {
            disposition_type: DispositionType::Scrap,
            quantity: 12.0,
            approved_by: "mrb".to_string(),
            justification: None,
        }
    }

    fn matches_number_format(number: &str) -> bool {
        let parts: Vec<&str> = number.split('-').collect();
        parts.len() == 3
            && parts[0] == "NCR"
            && parts[1].len() == 4
            && parts[1].chars().all(|c| c.is_ascii_digit())
            && parts[2].len() == 6
            && parts[2].chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn test_critical_ncr_end_to_end() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");
        assert_eq!(ncr.status, NcrStatus::Draft);

        engine.open_ncr(&t, &ncr.id).unwrap();
        engine.start_ncr_investigation(&t, &ncr.id).unwrap();
        let ncr = engine.record_investigation(&t, &ncr.id, investigation()).unwrap();
        assert_eq!(ncr.status, NcrStatus::PendingDisposition);

        let ncr = engine.set_disposition(&t, &ncr.id, scrap()).unwrap();
        assert_eq!(ncr.status, NcrStatus::DispositionApproved);

        let ncr = engine.implement_disposition(&t, &ncr.id, "ops").unwrap();
        assert_eq!(ncr.status, NcrStatus::InProgress);

        let ncr = engine.request_verification(&t, &ncr.id).unwrap();
        assert_eq!(ncr.status, NcrStatus::PendingVerification);
        assert!(ncr.closed_date.is_none());

        let ncr = engine
            .verify_and_close(&t, &ncr.id, "qa-lead", Some("Scrapped and logged".to_string()))
            .unwrap();
        assert_eq!(ncr.status, NcrStatus::Closed);
        assert!(ncr.closed_date.is_some());
        assert_eq!(ncr.closed_by.as_deref(), Some("qa-lead"));
        assert_eq!(ncr.verified_by.as_deref(), Some("qa-lead"));

        assert_eq!(
            engine.publisher().names(),
            vec![
                "ncr.created",
                "ncr.opened",
                "ncr.investigation_started",
                "ncr.investigation_completed",
                "ncr.disposition_set",
                "ncr.disposition_implemented",
                "ncr.verification_requested",
                "ncr.closed",
            ]
        );
    }

    #[test]
    fn test_disposition_allowed_during_investigation() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");
        engine.open_ncr(&t, &ncr.id).unwrap();
        engine.start_ncr_investigation(&t, &ncr.id).unwrap();

        let ncr = engine.set_disposition(&t, &ncr.id, scrap()).unwrap();
        assert_eq!(ncr.status, NcrStatus::DispositionApproved);
        assert!(ncr.investigation.is_none());
    }

    #[test]
    fn test_failed_transition_leaves_ncr_unchanged() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");
        let before = engine.get_ncr(&t, &ncr.id).unwrap();
        engine.publisher().clear();

        let err = engine.start_ncr_investigation(&t, &ncr.id).unwrap_err();
        assert!(err.is_bad_request());
        assert!(engine.set_disposition(&t, &ncr.id, scrap()).unwrap_err().is_bad_request());
        assert!(engine.implement_disposition(&t, &ncr.id, "ops").unwrap_err().is_bad_request());
        assert!(engine.request_verification(&t, &ncr.id).unwrap_err().is_bad_request());
        assert!(engine
            .verify_and_close(&t, &ncr.id, "qa", None)
            .unwrap_err()
            .is_bad_request());

        assert_eq!(engine.get_ncr(&t, &ncr.id).unwrap(), before);
        assert!(engine.publisher().events().is_empty());
    }

    #[test]
    fn test_cancel_rules() {
        let mut engine = engine();
        let t = tenant("acme");
        let open = create(&mut engine, "acme");
        engine.open_ncr(&t, &open.id).unwrap();

        let cancelled = engine.cancel_ncr(&t, &open.id, "duplicate").unwrap();
        assert_eq!(cancelled.status, NcrStatus::Cancelled);
        assert_eq!(cancelled.cancellation_reason.as_deref(), Some("duplicate"));
        assert!(engine.cancel_ncr(&t, &open.id, "again").unwrap_err().is_bad_request());

        let mut closed = create(&mut engine, "acme");
        engine.open_ncr(&t, &closed.id).unwrap();
        engine.start_ncr_investigation(&t, &closed.id).unwrap();
        engine.set_disposition(&t, &closed.id, scrap()).unwrap();
        engine.implement_disposition(&t, &closed.id, "ops").unwrap();
        engine.request_verification(&t, &closed.id).unwrap();
        closed = engine.verify_and_close(&t, &closed.id, "qa", None).unwrap();

        let err = engine.cancel_ncr(&t, &closed.id, "too late").unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(engine.get_ncr(&t, &closed.id).unwrap(), closed);
    }

    #[test]
    fn test_tenant_isolation() {
        let mut engine = engine();
        let ncr = create(&mut engine, "a");
        let other = tenant("b");

        assert!(engine.get_ncr(&other, &ncr.id).unwrap_err().is_not_found());
        assert!(engine.open_ncr(&other, &ncr.id).unwrap_err().is_not_found());
        assert!(engine
            .list_ncrs(&other, &NcrFilter::default())
            .unwrap()
            .is_empty());
        assert!(engine
            .find_ncr_by_number(&other, &ncr.ncr_number)
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            engine.get_ncr(&tenant("a"), &ncr.id).unwrap().status,
            NcrStatus::Draft
        );
    }

    #[test]
    fn test_numbers_are_sequential_per_tenant() {
        let mut engine = engine();
        let t = tenant("acme");
        let first = create(&mut engine, "acme");
        engine.cancel_ncr(&t, &first.id, "entered twice").unwrap();
        let second = create(&mut engine, "acme");
        let elsewhere = create(&mut engine, "globex");

        assert!(matches_number_format(&first.ncr_number));
        assert!(first.ncr_number.ends_with("-000001"));
        assert!(second.ncr_number.ends_with("-000002"));
        assert!(elsewhere.ncr_number.ends_with("-000001"));
        assert_eq!(
            engine.find_ncr_by_number(&t, &second.ncr_number).unwrap().id,
            second.id
        );
    }

    #[test]
    fn test_containment_lifecycle() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");

        let ncr = engine
            .add_containment_action(
                &t,
                &ncr.id,
                AddContainmentAction {
                    description: "Quarantine lot 42".to_string(),
                    assigned_to: Some("stores".to_string()),
                    due_date: None,
                },
            )
            .unwrap();
        let action_id = ncr.containment_actions[0].id.clone();
        assert!(action_id.to_string().starts_with("CNT-"));

        let ncr = engine
            .update_containment_action(
                &t,
                &ncr.id,
                &action_id,
                UpdateContainmentAction {
                    status: Some(ContainmentStatus::Completed),
                    completed_by: Some("stores".to_string()),
                    ..UpdateContainmentAction::default()
                },
            )
            .unwrap();
        let action = &ncr.containment_actions[0];
        assert_eq!(action.status, ContainmentStatus::Completed);
        assert!(action.completed_at.is_some());
        assert_eq!(action.completed_by.as_deref(), Some("stores"));

        let backwards = engine.update_containment_action(
            &t,
            &ncr.id,
            &action_id,
            UpdateContainmentAction {
                status: Some(ContainmentStatus::Pending),
                ..UpdateContainmentAction::default()
            },
        );
        assert!(backwards.unwrap_err().is_bad_request());

        let missing = engine.update_containment_action(
            &t,
            &ncr.id,
            &EntityId::new(EntityPrefix::Cnt),
            UpdateContainmentAction::default(),
        );
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_containment_rejected_after_cancel() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");
        let ncr = engine.cancel_ncr(&t, &ncr.id, "not a defect").unwrap();

        let err = engine
            .add_containment_action(
                &t,
                &ncr.id,
                AddContainmentAction {
                    description: "Hold shipment".to_string(),
                    ..AddContainmentAction::default()
                },
            )
            .unwrap_err();
        assert!(err.is_bad_request());
        assert!(engine.get_ncr(&t, &ncr.id).unwrap().containment_actions.is_empty());
    }

    #[test]
    fn test_assign_and_cost_in_any_state() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = create(&mut engine, "acme");
        engine.cancel_ncr(&t, &ncr.id, "dup").unwrap();

        let ncr = engine.assign_ncr(&t, &ncr.id, "dana").unwrap();
        assert_eq!(ncr.assigned_to.as_deref(), Some("dana"));

        let ncr = engine
            .set_ncr_cost(
                &t,
                &ncr.id,
                SetNcrCost {
                    material_cost: Some(100.0),
                    labor_cost: Some(40.5),
                    ..SetNcrCost::default()
                },
            )
            .unwrap();
        let ncr = engine
            .set_ncr_cost(
                &t,
                &ncr.id,
                SetNcrCost {
                    scrap_cost: Some(9.5),
                    currency: Some("EUR".to_string()),
                    ..SetNcrCost::default()
                },
            )
            .unwrap();
        assert_eq!(ncr.cost.total(), 150.0);
        assert_eq!(ncr.cost.currency.as_deref(), Some("EUR"));
        assert_eq!(
            engine.publisher().last("ncr.cost_updated").unwrap().payload["total_cost"],
            150.0
        );
    }

    #[test]
    fn test_list_filters_and_order() {
        let mut engine = engine();
        let t = tenant("acme");
        let first = create(&mut engine, "acme");
        let second = engine
            .create_ncr(
                &t,
                CreateNcr {
                    title: "Late delivery".to_string(),
                    ncr_type: NcrType::Supplier,
                    detected_by: "buyer".to_string(),
                    target_date: Some(Utc::now() - chrono::Duration::days(2)),
                    ..CreateNcr::default()
                },
            )
            .unwrap();

        let all = engine.list_ncrs(&t, &NcrFilter::default()).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, second.id);
        assert_eq!(all[1].id, first.id);

        let supplier = engine
            .list_ncrs(
                &t,
                &NcrFilter {
                    ncr_type: Some(NcrType::Supplier),
                    ..NcrFilter::default()
                },
            )
            .unwrap();
        assert_eq!(supplier.len(), 1);

        let overdue = engine
            .list_ncrs(
                &t,
                &NcrFilter {
                    overdue: true,
                    ..NcrFilter::default()
                },
            )
            .unwrap();
        assert_eq!(overdue.len(), 1);
        assert_eq!(overdue[0].id, second.id);
    }

    #[test]
    fn test_create_requires_title() {
        let mut engine = engine();
        let err = engine
            .create_ncr(
                &tenant("acme"),
                CreateNcr {
                    detected_by: "qa".to_string(),
                    ..CreateNcr::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, QualityError::InvalidInput(_)));
    }
}
