//! CAPA lifecycle operations

use chrono::{DateTime, Utc};
use serde_json::json;

use super::{ensure, newest_first, require_text, within, QualityEngine};
use crate::core::entity::Priority;
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::capa::{
    Action, ActionStatus, ActionType, AddAction, CapaSource, CapaStatus, CapaType,
    CapaVerification, CompleteAction, CompleteEffectivenessCheck, CreateCapa, EffectivenessCheck,
    EffectivenessResult, RecordRootCause, RootCauseAnalysis, ScheduleEffectivenessCheck,
    VerificationResult, VerifyAction, VerifyCapa,
};
use crate::entities::Capa;

/// Status the CAPA should be in after an action changed.
///
/// A CAPA in implementation whose actions are all verified or cancelled moves
/// to verification; every other CAPA keeps its status.
pub fn next_status(capa: &Capa) -> CapaStatus {
    if capa.status == CapaStatus::Implementation
        && capa.actions().all(|action| action.status.is_settled())
    {
        CapaStatus::Verification
    } else {
        capa.status
    }
}

/// Criteria for [`QualityEngine::list_capas`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CapaFilter {
    pub status: Option<CapaStatus>,
    pub capa_type: Option<CapaType>,
    pub priority: Option<Priority>,
    pub source: Option<CapaSource>,
    pub owner: Option<String>,
    pub ncr_id: Option<EntityId>,
    pub supplier_id: Option<String>,
    pub product_id: Option<String>,
    pub process_id: Option<String>,
    pub department_id: Option<String>,
    pub date_from: Option<DateTime<Utc>>,
    pub date_to: Option<DateTime<Utc>>,
    pub overdue: bool,
}

impl CapaFilter {
    pub fn matches(&self, capa: &Capa, now: DateTime<Utc>) -> bool {
        self.status.map_or(true, |s| capa.status == s)
            && self.capa_type.map_or(true, |t| capa.capa_type == t)
            && self.priority.map_or(true, |p| capa.priority == p)
            && self.source.map_or(true, |s| capa.source == s)
            && self.owner.as_ref().map_or(true, |o| &capa.owner == o)
            && self
                .ncr_id
                .as_ref()
                .map_or(true, |n| capa.ncr_id.as_ref() == Some(n))
            && self
                .supplier_id
                .as_ref()
                .map_or(true, |s| capa.supplier_id.as_ref() == Some(s))
            && self
                .product_id
                .as_ref()
                .map_or(true, |p| capa.product_id.as_ref() == Some(p))
            && self
                .process_id
                .as_ref()
                .map_or(true, |p| capa.process_id.as_ref() == Some(p))
            && self
                .department_id
                .as_ref()
                .map_or(true, |d| capa.department_id.as_ref() == Some(d))
            && within(capa.created_at, self.date_from, self.date_to)
            && (!self.overdue || capa.is_overdue(now))
    }
}

fn action_mut<'a>(capa: &'a mut Capa, action_id: &EntityId) -> QualityResult<&'a mut Action> {
    capa.find_action_mut(action_id)
        .ok_or_else(|| QualityError::not_found("Action", action_id))
}

fn append_note(existing: Option<String>, note: String) -> String {
    match existing {
        Some(previous) if !previous.is_empty() => format!("{}\n{}", previous, note),
        _ => note,
    }
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Create a draft CAPA with the tenant's next number
    pub fn create_capa(&mut self, tenant: &TenantId, input: CreateCapa) -> QualityResult<Capa> {
        require_text(&input.title, "title")?;
        require_text(&input.owner, "owner")?;

        let number = self.allocate_number(tenant, SequenceKind::Capa)?;
        let capa = Capa::new(tenant.clone(), number, input);
        self.save(&capa)?;

        tracing::info!(capa = %capa.capa_number, tenant = %tenant, "created CAPA");
        self.emit(
            "capa.created",
            tenant,
            json!({
                "capa_id": capa.id,
                "capa_number": capa.capa_number,
                "capa_type": capa.capa_type,
                "priority": capa.priority,
            }),
        );
        Ok(capa)
    }

    pub fn get_capa(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<Capa> {
        self.load(tenant, id)
    }

    pub fn find_capa_by_number(&self, tenant: &TenantId, number: &str) -> QualityResult<Capa> {
        self.list_all::<Capa>(tenant)?
            .into_iter()
            .find(|capa| capa.capa_number.eq_ignore_ascii_case(number))
            .ok_or_else(|| QualityError::not_found("CAPA", number))
    }

    /// CAPAs of a tenant matching `filter`, newest first
    pub fn list_capas(&self, tenant: &TenantId, filter: &CapaFilter) -> QualityResult<Vec<Capa>> {
        let now = Utc::now();
        let mut capas: Vec<Capa> = self
            .list_all::<Capa>(tenant)?
            .into_iter()
            .filter(|capa| filter.matches(capa, now))
            .collect();
        newest_first(&mut capas);
        Ok(capas)
    }

    pub fn open_capa(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(capa.status == CapaStatus::Draft, "CAPA is not in draft status")?;

        capa.status = CapaStatus::Open;
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit("capa.opened", tenant, json!({ "capa_id": capa.id }));
        Ok(capa)
    }

    pub fn start_capa_investigation(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::Open,
            "CAPA must be open to start investigation",
        )?;

        capa.status = CapaStatus::Investigation;
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit(
            "capa.investigation_started",
            tenant,
            json!({ "capa_id": capa.id }),
        );
        Ok(capa)
    }

    pub fn record_root_cause_analysis(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: RecordRootCause,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::Investigation,
            "CAPA is not in investigation phase",
        )?;

        let now = Utc::now();
        let method = input.method;
        let root_cause_count = input.root_causes.len();
        capa.root_cause_analysis = Some(RootCauseAnalysis {
            id: EntityId::new(EntityPrefix::Rca),
            method,
            root_causes: input.root_causes,
            contributing_factors: input.contributing_factors,
            analysis: input.analysis,
            analyzed_by: input.analyzed_by,
            analyzed_at: now,
            five_why_steps: input.five_why_steps,
            fishbone: input.fishbone,
        });
        capa.status = CapaStatus::ActionPlanning;
        capa.updated_at = now;
        self.save(&capa)?;

        self.emit(
            "capa.rca_completed",
            tenant,
            json!({
                "capa_id": capa.id,
                "method": method,
                "root_cause_count": root_cause_count,
            }),
        );
        Ok(capa)
    }

    /// Append a corrective or preventive action numbered `CA-n` / `PA-n`
    pub fn add_action(&mut self, tenant: &TenantId, id: &EntityId, input: AddAction) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            matches!(
                capa.status,
                CapaStatus::ActionPlanning | CapaStatus::Implementation
            ),
            "CAPA is not ready for actions",
        )?;
        require_text(&input.description, "description")?;

        let list = match input.action_type {
            ActionType::Corrective => &mut capa.corrective_actions,
            ActionType::Preventive => &mut capa.preventive_actions,
        };
        let action = Action {
            id: EntityId::new(EntityPrefix::Act),
            action_number: format!("{}-{}", input.action_type.number_prefix(), list.len() + 1),
            action_type: input.action_type,
            description: input.description,
            expected_outcome: input.expected_outcome,
            status: ActionStatus::Pending,
            priority: input.priority,
            assigned_to: input.assigned_to,
            due_date: input.due_date,
            started_at: None,
            completed_at: None,
            completed_by: None,
            verified_at: None,
            verified_by: None,
            evidence_required: input.evidence_required,
            evidence_provided: None,
            notes: None,
        };
        let payload = json!({
            "capa_id": capa.id,
            "action_id": action.id,
            "action_number": action.action_number,
            "action_type": action.action_type,
        });
        list.push(action);
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit("capa.action_added", tenant, payload);
        Ok(capa)
    }

    /// Move a planned CAPA into implementation.
    ///
    /// After a failed verification the CAPA is back in planning with its old
    /// actions already verified; implementation may restart, but the CAPA only
    /// reaches verification again once a new action is added and settled.
    pub fn start_implementation(&mut self, tenant: &TenantId, id: &EntityId) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::ActionPlanning,
            "CAPA is not in action planning phase",
        )?;
        ensure(capa.total_actions() > 0, "At least one action is required")?;

        capa.status = CapaStatus::Implementation;
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit(
            "capa.implementation_started",
            tenant,
            json!({ "capa_id": capa.id, "action_count": capa.total_actions() }),
        );
        Ok(capa)
    }

    pub fn start_action(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        action_id: &EntityId,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        let now = Utc::now();

        let action = action_mut(&mut capa, action_id)?;
        ensure(action.status == ActionStatus::Pending, "Action is not pending")?;
        action.status = ActionStatus::InProgress;
        action.started_at = Some(now);

        self.settle_action_change(tenant, capa, action_id, "capa.action_started", now)
    }

    pub fn complete_action(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        action_id: &EntityId,
        input: CompleteAction,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        let now = Utc::now();

        let action = action_mut(&mut capa, action_id)?;
        ensure(
            action.status == ActionStatus::InProgress,
            "Action is not in progress",
        )?;
        action.status = ActionStatus::Completed;
        action.completed_at = Some(now);
        action.completed_by = Some(input.completed_by);
        if input.evidence_provided.is_some() {
            action.evidence_provided = input.evidence_provided;
        }
        if let Some(notes) = input.notes {
            action.notes = Some(append_note(action.notes.take(), notes));
        }

        self.settle_action_change(tenant, capa, action_id, "capa.action_completed", now)
    }

    /// Verify a completed action; may advance the CAPA to verification
    pub fn verify_action(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        action_id: &EntityId,
        input: VerifyAction,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        let now = Utc::now();

        let action = action_mut(&mut capa, action_id)?;
        ensure(
            action.status == ActionStatus::Completed,
            "Action is not completed",
        )?;
        action.status = ActionStatus::Verified;
        action.verified_at = Some(now);
        action.verified_by = Some(input.verified_by);
        if let Some(notes) = input.notes {
            action.notes = Some(append_note(
                action.notes.take(),
                format!("Verification: {}", notes),
            ));
        }

        self.settle_action_change(tenant, capa, action_id, "capa.action_verified", now)
    }

    /// Apply the cascade after an action mutation, persist, then publish
    fn settle_action_change(
        &mut self,
        tenant: &TenantId,
        mut capa: Capa,
        action_id: &EntityId,
        event: &str,
        now: DateTime<Utc>,
    ) -> QualityResult<Capa> {
        let next = next_status(&capa);
        let advanced = next != capa.status;
        if advanced {
            capa.status = next;
            capa.completed_date = Some(now);
        }
        capa.updated_at = now;
        self.save(&capa)?;

        let status = capa.find_action(action_id).map(|a| a.status);
        self.emit(
            event,
            tenant,
            json!({ "capa_id": capa.id, "action_id": action_id, "status": status }),
        );
        if advanced {
            tracing::info!(capa = %capa.capa_number, "all actions settled, ready for verification");
            self.emit(
                "capa.ready_for_verification",
                tenant,
                json!({ "capa_id": capa.id }),
            );
        }
        Ok(capa)
    }

    /// Record the CAPA verification. Pass moves on to the effectiveness check,
    /// fail returns to action planning, partial stays in verification.
    pub fn verify_capa(&mut self, tenant: &TenantId, id: &EntityId, input: VerifyCapa) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::Verification,
            "CAPA is not ready for verification",
        )?;

        let now = Utc::now();
        let result = input.result;
        let findings = input.findings.clone();
        capa.verification = Some(CapaVerification {
            id: EntityId::new(EntityPrefix::Ver),
            verified_by: input.verified_by,
            verified_at: now,
            method: input.method,
            criteria: input.criteria,
            result,
            findings: input.findings,
            notes: input.notes,
        });
        match result {
            VerificationResult::Pass => capa.status = CapaStatus::EffectivenessCheck,
            VerificationResult::Fail => capa.status = CapaStatus::ActionPlanning,
            VerificationResult::Partial => {}
        }
        capa.updated_at = now;
        self.save(&capa)?;

        if result == VerificationResult::Fail {
            self.emit(
                "capa.verification_failed",
                tenant,
                json!({ "capa_id": capa.id, "findings": findings }),
            );
        }
        self.emit(
            "capa.verified",
            tenant,
            json!({ "capa_id": capa.id, "result": result }),
        );
        Ok(capa)
    }

    pub fn schedule_effectiveness_check(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: ScheduleEffectivenessCheck,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::EffectivenessCheck,
            "CAPA is not ready for effectiveness check",
        )?;

        let scheduled_date = input.scheduled_date;
        capa.effectiveness_check = Some(EffectivenessCheck {
            id: EntityId::new(EntityPrefix::Eff),
            scheduled_date,
            method: input.method,
            criteria: input.criteria,
            completed_date: None,
            checked_by: None,
            result: None,
            findings: None,
            recurrence_check: false,
            further_action_required: false,
            notes: None,
        });
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit(
            "capa.effectiveness_check_scheduled",
            tenant,
            json!({ "capa_id": capa.id, "scheduled_date": scheduled_date }),
        );
        Ok(capa)
    }

    /// Record the effectiveness result. Effective without further action
    /// closes the CAPA; further action sends it back to planning.
    pub fn complete_effectiveness_check(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: CompleteEffectivenessCheck,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            capa.status == CapaStatus::EffectivenessCheck,
            "CAPA is not in effectiveness check phase",
        )?;

        let now = Utc::now();
        let check = capa
            .effectiveness_check
            .as_mut()
            .ok_or_else(|| QualityError::bad_request("No effectiveness check scheduled"))?;
        check.completed_date = Some(now);
        check.checked_by = Some(input.checked_by.clone());
        check.result = Some(input.result);
        check.findings = input.findings;
        check.recurrence_check = input.recurrence_check;
        check.further_action_required = input.further_action_required;
        check.notes = input.notes;

        let closes = input.result == EffectivenessResult::Effective && !input.further_action_required;
        if closes {
            capa.status = CapaStatus::Closed;
            capa.closed_date = Some(now);
            capa.closed_by = Some(input.checked_by);
        } else if input.further_action_required {
            capa.status = CapaStatus::ActionPlanning;
        }
        capa.updated_at = now;
        self.save(&capa)?;

        if closes {
            tracing::info!(capa = %capa.capa_number, "closed CAPA after effectiveness check");
            self.emit(
                "capa.closed",
                tenant,
                json!({ "capa_id": capa.id, "effectiveness_result": input.result }),
            );
        } else if input.further_action_required {
            self.emit(
                "capa.further_action_required",
                tenant,
                json!({ "capa_id": capa.id, "result": input.result }),
            );
        }
        Ok(capa)
    }

    /// Close directly from verification or effectiveness check
    pub fn close_capa(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        closed_by: &str,
        notes: Option<String>,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(
            matches!(
                capa.status,
                CapaStatus::Verification | CapaStatus::EffectivenessCheck
            ),
            "CAPA cannot be closed in current status",
        )?;

        let now = Utc::now();
        capa.status = CapaStatus::Closed;
        capa.closed_date = Some(now);
        capa.closed_by = Some(closed_by.to_string());
        if let Some(notes) = notes {
            capa.notes = Some(append_note(capa.notes.take(), format!("Closure: {}", notes)));
        }
        capa.updated_at = now;
        self.save(&capa)?;

        tracing::info!(capa = %capa.capa_number, "closed CAPA");
        self.emit(
            "capa.closed",
            tenant,
            json!({ "capa_id": capa.id, "closed_by": closed_by }),
        );
        Ok(capa)
    }

    pub fn cancel_capa(&mut self, tenant: &TenantId, id: &EntityId, reason: &str) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;
        ensure(capa.status != CapaStatus::Closed, "Cannot cancel closed CAPA")?;
        ensure(
            capa.status != CapaStatus::Cancelled,
            "CAPA is already cancelled",
        )?;

        capa.status = CapaStatus::Cancelled;
        capa.cancellation_reason = Some(reason.to_string());
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit(
            "capa.cancelled",
            tenant,
            json!({ "capa_id": capa.id, "reason": reason }),
        );
        Ok(capa)
    }

    /// Record the actual cost. Allowed in any state.
    pub fn set_capa_cost(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        actual_cost: f64,
        currency: &str,
    ) -> QualityResult<Capa> {
        let mut capa: Capa = self.load(tenant, id)?;

        capa.actual_cost = Some(actual_cost);
        capa.currency = Some(currency.to_string());
        capa.updated_at = Utc::now();
        self.save(&capa)?;

        self.emit(
            "capa.cost_updated",
            tenant,
            json!({ "capa_id": capa.id, "actual_cost": actual_cost, "currency": currency }),
        );
        Ok(capa)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::entities::capa::RcaMethod;
    use chrono::Duration;

    fn create(engine: &mut TestEngine) -> Capa {
        engine
            .create_capa(
                &tenant("acme"),
                CreateCapa {
                    title: "Recurring burrs on housings".to_string(),
                    capa_type: CapaType::Corrective,
                    priority: Priority::High,
                    initiated_by: "qa".to_string(),
                    owner: "eng".to_string(),
                    ..CreateCapa::default()
                },
            )
            .unwrap()
    }

    fn rca() -> RecordRootCause {
        RecordRootCause {
            method: RcaMethod::FiveWhy,
            root_causes: vec!["No tool life tracking".to_string()],
            analyzed_by: "eng".to_string(),
            ..RecordRootCause::default()
        }
    }

    fn action(action_type: ActionType) -> AddAction {
        AddAction {
            action_type,
            description: "Add tool life counter".to_string(),
            expected_outcome: "Tools replaced before wear".to_string(),
            priority: Priority::High,
            assigned_to: "maint".to_string(),
            due_date: Utc::now() + Duration::days(14),
            evidence_required: None,
        }
    }

    fn to_planning(engine: &mut TestEngine) -> Capa {
        let t = tenant("acme");
        let capa = create(engine);
        engine.open_capa(&t, &capa.id).unwrap();
        engine.start_capa_investigation(&t, &capa.id).unwrap();
        engine.record_root_cause_analysis(&t, &capa.id, rca()).unwrap()
    }

    fn run_action(engine: &mut TestEngine, capa_id: &EntityId, action_id: &EntityId) -> Capa {
        let t = tenant("acme");
        engine.start_action(&t, capa_id, action_id).unwrap();
        engine
            .complete_action(
                &t,
                capa_id,
                action_id,
                CompleteAction {
                    completed_by: "maint".to_string(),
                    ..CompleteAction::default()
                },
            )
            .unwrap();
        engine
            .verify_action(
                &t,
                capa_id,
                action_id,
                VerifyAction {
                    verified_by: "qa".to_string(),
                    notes: Some("Counter in place".to_string()),
                },
            )
            .unwrap()
    }

    fn verify(result: VerificationResult) -> VerifyCapa {
        VerifyCapa {
            verified_by: "qa-lead".to_string(),
            method: "Audit of tool log".to_string(),
            criteria: "No burrs in 3 lots".to_string(),
            result,
            findings: Some("Observed".to_string()),
            notes: None,
        }
    }

    fn effectiveness(result: EffectivenessResult, further: bool) -> CompleteEffectivenessCheck {
        CompleteEffectivenessCheck {
            checked_by: "qa-lead".to_string(),
            result,
            findings: None,
            recurrence_check: true,
            further_action_required: further,
            notes: None,
        }
    }

    fn schedule() -> ScheduleEffectivenessCheck {
        ScheduleEffectivenessCheck {
            scheduled_date: Utc::now() + Duration::days(90),
            method: "Lot review".to_string(),
            criteria: "Zero recurrence".to_string(),
        }
    }

    #[test]
    fn test_corrective_capa_end_to_end() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);
        assert_eq!(capa.status, CapaStatus::ActionPlanning);
        assert_eq!(
            capa.root_cause_analysis.as_ref().unwrap().method,
            RcaMethod::FiveWhy
        );

        let capa = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        let action_id = capa.corrective_actions[0].id.clone();
        assert_eq!(capa.corrective_actions[0].action_number, "CA-1");

        let capa = engine.start_implementation(&t, &capa.id).unwrap();
        assert_eq!(capa.status, CapaStatus::Implementation);
        assert!(capa.completed_date.is_none());

        let capa = run_action(&mut engine, &capa.id, &action_id);
        assert_eq!(capa.status, CapaStatus::Verification);
        assert!(capa.completed_date.is_some());
        assert_eq!(
            capa.corrective_actions[0].notes.as_deref(),
            Some("Verification: Counter in place")
        );

        let capa = engine.verify_capa(&t, &capa.id, verify(VerificationResult::Pass)).unwrap();
        assert_eq!(capa.status, CapaStatus::EffectivenessCheck);

        let capa = engine.schedule_effectiveness_check(&t, &capa.id, schedule()).unwrap();
        assert_eq!(capa.status, CapaStatus::EffectivenessCheck);

        let capa = engine
            .complete_effectiveness_check(
                &t,
                &capa.id,
                effectiveness(EffectivenessResult::Effective, false),
            )
            .unwrap();
        assert_eq!(capa.status, CapaStatus::Closed);
        assert!(capa.closed_date.is_some());
        assert_eq!(capa.closed_by.as_deref(), Some("qa-lead"));

        assert_eq!(
            engine.publisher().names(),
            vec![
                "capa.created",
                "capa.opened",
                "capa.investigation_started",
                "capa.rca_completed",
                "capa.action_added",
                "capa.implementation_started",
                "capa.action_started",
                "capa.action_completed",
                "capa.action_verified",
                "capa.ready_for_verification",
                "capa.verified",
                "capa.effectiveness_check_scheduled",
                "capa.closed",
            ]
        );
    }

    #[test]
    fn test_implementation_requires_an_action() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);

        let err = engine.start_implementation(&t, &capa.id).unwrap_err();
        assert_eq!(err.to_string(), "At least one action is required");
        assert_eq!(engine.get_capa(&t, &capa.id).unwrap(), capa);
    }

    #[test]
    fn test_action_numbers_per_list() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);

        engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        engine.add_action(&t, &capa.id, action(ActionType::Preventive)).unwrap();
        let capa = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();

        let numbers: Vec<&str> = capa.actions().map(|a| a.action_number.as_str()).collect();
        assert_eq!(numbers, vec!["CA-1", "CA-2", "PA-1"]);
    }

    #[test]
    fn test_add_action_rejected_outside_planning() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = create(&mut engine);

        let err = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap_err();
        assert_eq!(err.to_string(), "CAPA is not ready for actions");
    }

    #[test]
    fn test_cascade_waits_for_last_action() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);
        engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        let capa = engine.add_action(&t, &capa.id, action(ActionType::Preventive)).unwrap();
        let first = capa.corrective_actions[0].id.clone();
        let second = capa.preventive_actions[0].id.clone();
        engine.start_implementation(&t, &capa.id).unwrap();

        let capa = run_action(&mut engine, &capa.id, &first);
        assert_eq!(capa.status, CapaStatus::Implementation);
        assert!(capa.completed_date.is_none());
        assert!(engine.publisher().last("capa.ready_for_verification").is_none());

        let capa = run_action(&mut engine, &capa.id, &second);
        assert_eq!(capa.status, CapaStatus::Verification);
        assert!(capa.completed_date.is_some());
    }

    #[test]
    fn test_next_status_treats_cancelled_as_settled() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);
        let mut capa = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        capa.status = CapaStatus::Implementation;

        assert_eq!(next_status(&capa), CapaStatus::Implementation);
        capa.corrective_actions[0].status = ActionStatus::Cancelled;
        assert_eq!(next_status(&capa), CapaStatus::Verification);

        capa.status = CapaStatus::ActionPlanning;
        assert_eq!(next_status(&capa), CapaStatus::ActionPlanning);
    }

    #[test]
    fn test_action_guards() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);
        let capa = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        let action_id = capa.corrective_actions[0].id.clone();
        let before = engine.get_capa(&t, &capa.id).unwrap();

        let err = engine
            .complete_action(&t, &capa.id, &action_id, CompleteAction::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Action is not in progress");
        let err = engine
            .verify_action(&t, &capa.id, &action_id, VerifyAction::default())
            .unwrap_err();
        assert_eq!(err.to_string(), "Action is not completed");
        let err = engine
            .start_action(&t, &capa.id, &EntityId::new(EntityPrefix::Act))
            .unwrap_err();
        assert!(err.is_not_found());

        assert_eq!(engine.get_capa(&t, &capa.id).unwrap(), before);

        engine.start_action(&t, &capa.id, &action_id).unwrap();
        let err = engine.start_action(&t, &capa.id, &action_id).unwrap_err();
        assert_eq!(err.to_string(), "Action is not pending");
    }

    fn to_verification(engine: &mut TestEngine) -> Capa {
        let t = tenant("acme");
        let capa = to_planning(engine);
        let capa = engine.add_action(&t, &capa.id, action(ActionType::Corrective)).unwrap();
        let action_id = capa.corrective_actions[0].id.clone();
        engine.start_implementation(&t, &capa.id).unwrap();
        run_action(engine, &capa.id, &action_id)
    }

    #[test]
    fn test_verification_outcomes() {
        let mut engine = engine();
        let t = tenant("acme");

        let capa = to_verification(&mut engine);
        let capa = engine.verify_capa(&t, &capa.id, verify(VerificationResult::Partial)).unwrap();
        assert_eq!(capa.status, CapaStatus::Verification);

        let capa = engine.verify_capa(&t, &capa.id, verify(VerificationResult::Fail)).unwrap();
        assert_eq!(capa.status, CapaStatus::ActionPlanning);
        let failed = engine.publisher().last("capa.verification_failed").unwrap();
        assert_eq!(failed.payload["findings"], "Observed");
        assert_eq!(
            engine.publisher().last("capa.verified").unwrap().payload["result"],
            "fail"
        );
    }

    #[test]
    fn test_effectiveness_requires_schedule() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_verification(&mut engine);
        let capa = engine.verify_capa(&t, &capa.id, verify(VerificationResult::Pass)).unwrap();

        let err = engine
            .complete_effectiveness_check(
                &t,
                &capa.id,
                effectiveness(EffectivenessResult::Effective, false),
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "No effectiveness check scheduled");
        assert_eq!(engine.get_capa(&t, &capa.id).unwrap(), capa);
    }

    #[test]
    fn test_effectiveness_further_action_returns_to_planning() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_verification(&mut engine);
        engine.verify_capa(&t, &capa.id, verify(VerificationResult::Pass)).unwrap();
        engine.schedule_effectiveness_check(&t, &capa.id, schedule()).unwrap();

        let capa = engine
            .complete_effectiveness_check(
                &t,
                &capa.id,
                effectiveness(EffectivenessResult::Effective, true),
            )
            .unwrap();
        assert_eq!(capa.status, CapaStatus::ActionPlanning);
        assert!(capa.closed_date.is_none());
        assert!(engine.publisher().last("capa.further_action_required").is_some());
    }

    #[test]
    fn test_partially_effective_stays_in_check() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_verification(&mut engine);
        engine.verify_capa(&t, &capa.id, verify(VerificationResult::Pass)).unwrap();
        engine.schedule_effectiveness_check(&t, &capa.id, schedule()).unwrap();

        let capa = engine
            .complete_effectiveness_check(
                &t,
                &capa.id,
                effectiveness(EffectivenessResult::PartiallyEffective, false),
            )
            .unwrap();
        assert_eq!(capa.status, CapaStatus::EffectivenessCheck);
        assert_eq!(
            capa.effectiveness_check.unwrap().result,
            Some(EffectivenessResult::PartiallyEffective)
        );
    }

    #[test]
    fn test_close_shortcut_from_verification() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_verification(&mut engine);

        let capa = engine
            .close_capa(&t, &capa.id, "director", Some("Accepted as is".to_string()))
            .unwrap();
        assert_eq!(capa.status, CapaStatus::Closed);
        assert_eq!(capa.closed_by.as_deref(), Some("director"));
        assert_eq!(capa.notes.as_deref(), Some("Closure: Accepted as is"));
    }

    #[test]
    fn test_close_rejected_before_verification() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_planning(&mut engine);

        let err = engine.close_capa(&t, &capa.id, "director", None).unwrap_err();
        assert!(err.is_bad_request());
        assert_eq!(engine.get_capa(&t, &capa.id).unwrap(), capa);
    }

    #[test]
    fn test_cancel_rules() {
        let mut engine = engine();
        let t = tenant("acme");

        let capa = create(&mut engine);
        let capa = engine.cancel_capa(&t, &capa.id, "superseded").unwrap();
        assert_eq!(capa.status, CapaStatus::Cancelled);
        assert!(engine.cancel_capa(&t, &capa.id, "again").unwrap_err().is_bad_request());

        let capa = to_verification(&mut engine);
        let closed = engine.close_capa(&t, &capa.id, "director", None).unwrap();
        let err = engine.cancel_capa(&t, &closed.id, "late").unwrap_err();
        assert_eq!(err.to_string(), "Cannot cancel closed CAPA");
        assert_eq!(engine.get_capa(&t, &closed.id).unwrap(), closed);
    }

    #[test]
    fn test_cost_and_tenant_isolation() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = create(&mut engine);

        let capa = engine.set_capa_cost(&t, &capa.id, 2500.0, "USD").unwrap();
        assert_eq!(capa.actual_cost, Some(2500.0));
        assert!(engine.publisher().last("capa.cost_updated").is_some());

        let other = tenant("globex");
        assert!(engine.get_capa(&other, &capa.id).unwrap_err().is_not_found());
        assert!(engine
            .set_capa_cost(&other, &capa.id, 1.0, "USD")
            .unwrap_err()
            .is_not_found());
        assert_eq!(
            engine.find_capa_by_number(&t, &capa.capa_number).unwrap().id,
            capa.id
        );
    }

    #[test]
    fn test_list_filters() {
        let mut engine = engine();
        let t = tenant("acme");
        let high = create(&mut engine);
        engine
            .create_capa(
                &t,
                CreateCapa {
                    title: "Supplier packaging".to_string(),
                    priority: Priority::Low,
                    source: CapaSource::Supplier,
                    initiated_by: "buyer".to_string(),
                    owner: "buyer".to_string(),
                    ..CreateCapa::default()
                },
            )
            .unwrap();

        let found = engine
            .list_capas(
                &t,
                &CapaFilter {
                    priority: Some(Priority::High),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, high.id);

        let by_owner = engine
            .list_capas(
                &t,
                &CapaFilter {
                    owner: Some("buyer".to_string()),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_owner.len(), 1);
        assert_eq!(by_owner[0].source, CapaSource::Supplier);
    }

    #[test]
    fn test_list_filters_by_product_process_and_department() {
        let mut engine = engine();
        let t = tenant("acme");
        let housing = engine
            .create_capa(
                &t,
                CreateCapa {
                    title: "Housing porosity".to_string(),
                    initiated_by: "qa".to_string(),
                    owner: "eng".to_string(),
                    product_id: Some("PRD-HOUSING".to_string()),
                    process_id: Some("PRC-CASTING".to_string()),
                    department_id: Some("foundry".to_string()),
                    ..CreateCapa::default()
                },
            )
            .unwrap();
        engine
            .create_capa(
                &t,
                CreateCapa {
                    title: "Label misprint".to_string(),
                    initiated_by: "qa".to_string(),
                    owner: "eng".to_string(),
                    product_id: Some("PRD-LABEL".to_string()),
                    department_id: Some("packaging".to_string()),
                    ..CreateCapa::default()
                },
            )
            .unwrap();

        let by_product = engine
            .list_capas(
                &t,
                &CapaFilter {
                    product_id: Some("PRD-HOUSING".to_string()),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_product.len(), 1);
        assert_eq!(by_product[0].id, housing.id);

        let by_process = engine
            .list_capas(
                &t,
                &CapaFilter {
                    process_id: Some("PRC-CASTING".to_string()),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_process.len(), 1);

        let by_department = engine
            .list_capas(
                &t,
                &CapaFilter {
                    department_id: Some("packaging".to_string()),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert_eq!(by_department.len(), 1);
        assert_eq!(by_department[0].title, "Label misprint");

        let none = engine
            .list_capas(
                &t,
                &CapaFilter {
                    product_id: Some("PRD-HOUSING".to_string()),
                    department_id: Some("packaging".to_string()),
                    ..CapaFilter::default()
                },
            )
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_reimplementation_after_failed_verification_waits_for_new_action() {
        let mut engine = engine();
        let t = tenant("acme");
        let capa = to_verification(&mut engine);
        let capa = engine.verify_capa(&t, &capa.id, verify(VerificationResult::Fail)).unwrap();
        assert_eq!(capa.status, CapaStatus::ActionPlanning);
        assert!(capa.actions().all(|a| a.status == ActionStatus::Verified));

        // every existing action is already settled, yet nothing advances
        let capa = engine.start_implementation(&t, &capa.id).unwrap();
        assert_eq!(capa.status, CapaStatus::Implementation);
        assert_eq!(next_status(&capa), CapaStatus::Verification);
        assert_eq!(
            engine.get_capa(&t, &capa.id).unwrap().status,
            CapaStatus::Implementation
        );

        let capa = engine.add_action(&t, &capa.id, action(ActionType::Preventive)).unwrap();
        assert_eq!(capa.status, CapaStatus::Implementation);
        let added = capa.preventive_actions[0].id.clone();

        let capa = run_action(&mut engine, &capa.id, &added);
        assert_eq!(capa.status, CapaStatus::Verification);
    }
}
