//! Metrics over NCRs, CAPAs, inspections and supplier qualifications
//!
//! The `summarize_*` functions are pure: they take the entities and the
//! current instant and never touch a store. The engine wrappers load the
//! tenant's entities and call them. Nothing is cached.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use super::QualityEngine;
use crate::core::entity::Priority;
use crate::core::error::QualityResult;
use crate::core::events::EventPublisher;
use crate::core::identity::TenantId;
use crate::core::store::QualityStore;
use crate::entities::capa::{ActionStatus, CapaSource, CapaStatus, CapaType, EffectivenessResult};
use crate::entities::inspection::{DefectSeverity, InspectionResult, InspectionType};
use crate::entities::ncr::{DispositionType, NcrSeverity, NcrSource, NcrStatus, NcrType};
use crate::entities::supplier::{QualificationStatus, RiskLevel};
use crate::entities::{Capa, Inspection, Ncr, SupplierQualification};

/// Qualifications expiring within this many days count as "expiring soon"
const EXPIRY_WINDOW_DAYS: i64 = 30;

/// Length of the most-frequent defect code list
const TOP_DEFECT_CODES: usize = 10;

/// Inclusive window on `created_at`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    /// Everything ever recorded
    pub fn all_time() -> Self {
        Self {
            from: DateTime::<Utc>::MIN_UTC,
            to: DateTime::<Utc>::MAX_UTC,
        }
    }

    /// The last `days` days up to `now`
    pub fn last_days(days: i64, now: DateTime<Utc>) -> Self {
        Self {
            from: now - Duration::days(days),
            to: now,
        }
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.from && at <= self.to
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NcrMetrics {
    pub total: u64,
    pub open: u64,
    pub closed: u64,
    pub cancelled: u64,
    pub overdue: u64,
    /// Mean of `closed_date - created_at` over closed NCRs, 0 when none closed
    pub average_closure_time_ms: f64,
    pub by_type: BTreeMap<String, u64>,
    pub by_severity: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    pub by_disposition: BTreeMap<String, u64>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ActionMetrics {
    pub total: u64,
    /// Completed or verified
    pub completed: u64,
    /// Due date passed while still pending
    pub overdue: u64,
    /// Mean of `completed_at - started_at`, 0 when none
    pub average_completion_time_ms: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CapaMetrics {
    pub total: u64,
    pub open: u64,
    pub closed: u64,
    pub overdue: u64,
    pub average_closure_time_ms: f64,
    pub by_type: BTreeMap<String, u64>,
    pub by_priority: BTreeMap<String, u64>,
    pub by_source: BTreeMap<String, u64>,
    pub by_status: BTreeMap<String, u64>,
    pub actions: ActionMetrics,
    /// Effective checks as a percentage of completed checks, 0 when none
    pub effectiveness_rate: f64,
    pub estimated_cost: f64,
    pub actual_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupplierMetrics {
    pub total: u64,
    pub by_status: BTreeMap<String, u64>,
    pub by_risk_level: BTreeMap<String, u64>,
    pub expiring_soon: u64,
    pub active_ncr_links: u64,
    pub active_capa_links: u64,
    /// Mean overall score of evaluated suppliers, 0 when none
    pub average_score: f64,
    /// Mean cumulative quality rate of suppliers with recorded orders
    pub average_quality_rate: f64,
    pub average_on_time_delivery: f64,
    /// Next audit due within the expiry window
    pub suppliers_requiring_audit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DefectCodeCount {
    pub code: String,
    pub count: u64,
}

/// Outcome metrics over reviewed inspections
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InspectionMetrics {
    pub total: u64,
    pub passed: u64,
    pub conditional: u64,
    pub failed: u64,
    pub pass_rate: f64,
    pub conditional_rate: f64,
    pub fail_rate: f64,
    pub by_type: BTreeMap<String, u64>,
    pub by_result: BTreeMap<String, u64>,
    pub total_defects: u64,
    pub defects_by_severity: BTreeMap<String, u64>,
    pub average_acceptance_rate: f64,
    /// Most frequent defect codes by quantity, ties by code
    pub top_defect_codes: Vec<DefectCodeCount>,
}

/// Narrows [`summarize_inspections`] to one supplier or item
#[derive(Debug, Clone, Default)]
pub struct InspectionScope {
    pub supplier_id: Option<String>,
    pub item_id: Option<String>,
}

impl InspectionScope {
    fn matches(&self, insp: &Inspection) -> bool {
        self.supplier_id
            .as_ref()
            .map_or(true, |s| insp.supplier_id.as_ref() == Some(s))
            && self.item_id.as_ref().map_or(true, |i| &insp.item_id == i)
    }
}

/// Map with every label present at zero
fn zeroed<T: ToString>(values: &[T]) -> BTreeMap<String, u64> {
    values.iter().map(|v| (v.to_string(), 0)).collect()
}

fn bump(map: &mut BTreeMap<String, u64>, key: impl ToString) {
    *map.entry(key.to_string()).or_insert(0) += 1;
}

fn share(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 * 100.0 / whole as f64
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn mean_ms(total_ms: i64, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_ms as f64 / count as f64
    }
}

pub fn summarize_ncrs(ncrs: &[Ncr], range: &DateRange, now: DateTime<Utc>) -> NcrMetrics {
    let mut metrics = NcrMetrics {
        total: 0,
        open: 0,
        closed: 0,
        cancelled: 0,
        overdue: 0,
        average_closure_time_ms: 0.0,
        by_type: zeroed(NcrType::all()),
        by_severity: zeroed(NcrSeverity::all()),
        by_source: zeroed(NcrSource::all()),
        by_status: zeroed(NcrStatus::all()),
        by_disposition: zeroed(DispositionType::all()),
        total_cost: 0.0,
    };
    let mut closure_ms: i64 = 0;
    let mut closure_count: u64 = 0;

    for ncr in ncrs.iter().filter(|n| range.contains(n.created_at)) {
        metrics.total += 1;
        match ncr.status {
            NcrStatus::Closed => metrics.closed += 1,
            NcrStatus::Cancelled => metrics.cancelled += 1,
            _ => metrics.open += 1,
        }
        if ncr.is_overdue(now) {
            metrics.overdue += 1;
        }
        if let (NcrStatus::Closed, Some(closed)) = (ncr.status, ncr.closed_date) {
            closure_ms += (closed - ncr.created_at).num_milliseconds();
            closure_count += 1;
        }

        bump(&mut metrics.by_type, ncr.ncr_type);
        bump(&mut metrics.by_severity, ncr.severity);
        bump(&mut metrics.by_source, ncr.source);
        bump(&mut metrics.by_status, ncr.status);
        if let Some(disposition) = &ncr.disposition {
            bump(&mut metrics.by_disposition, disposition.disposition_type);
        }
        metrics.total_cost += ncr.cost.total();
    }

    metrics.average_closure_time_ms = mean_ms(closure_ms, closure_count);
    metrics
}

pub fn summarize_capas(capas: &[Capa], range: &DateRange, now: DateTime<Utc>) -> CapaMetrics {
    let mut metrics = CapaMetrics {
        total: 0,
        open: 0,
        closed: 0,
        overdue: 0,
        average_closure_time_ms: 0.0,
        by_type: zeroed(CapaType::all()),
        by_priority: zeroed(Priority::all()),
        by_source: zeroed(CapaSource::all()),
        by_status: zeroed(CapaStatus::all()),
        actions: ActionMetrics {
            total: 0,
            completed: 0,
            overdue: 0,
            average_completion_time_ms: 0.0,
        },
        effectiveness_rate: 0.0,
        estimated_cost: 0.0,
        actual_cost: 0.0,
    };
    let mut closure_ms: i64 = 0;
    let mut closure_count: u64 = 0;
    let mut completion_ms: i64 = 0;
    let mut completion_count: u64 = 0;
    let mut checked: u64 = 0;
    let mut effective: u64 = 0;

    for capa in capas.iter().filter(|c| range.contains(c.created_at)) {
        metrics.total += 1;
        if capa.status == CapaStatus::Closed {
            metrics.closed += 1;
            if let Some(closed) = capa.closed_date {
                closure_ms += (closed - capa.created_at).num_milliseconds();
                closure_count += 1;
            }
        } else if capa.status != CapaStatus::Cancelled {
            metrics.open += 1;
        }
        if capa.is_overdue(now) {
            metrics.overdue += 1;
        }

        bump(&mut metrics.by_type, capa.capa_type);
        bump(&mut metrics.by_priority, capa.priority);
        bump(&mut metrics.by_source, capa.source);
        bump(&mut metrics.by_status, capa.status);

        for action in capa.actions() {
            metrics.actions.total += 1;
            if matches!(action.status, ActionStatus::Completed | ActionStatus::Verified) {
                metrics.actions.completed += 1;
                if let (Some(started), Some(completed)) = (action.started_at, action.completed_at) {
                    completion_ms += (completed - started).num_milliseconds();
                    completion_count += 1;
                }
            }
            if action.is_overdue(now) {
                metrics.actions.overdue += 1;
            }
        }

        if let Some(result) = capa.effectiveness_check.as_ref().and_then(|c| c.result) {
            checked += 1;
            if result == EffectivenessResult::Effective {
                effective += 1;
            }
        }

        metrics.estimated_cost += capa.estimated_cost.unwrap_or(0.0);
        metrics.actual_cost += capa.actual_cost.unwrap_or(0.0);
    }

    metrics.average_closure_time_ms = mean_ms(closure_ms, closure_count);
    metrics.actions.average_completion_time_ms = mean_ms(completion_ms, completion_count);
    metrics.effectiveness_rate = if checked == 0 {
        0.0
    } else {
        effective as f64 / checked as f64 * 100.0
    };
    metrics
}

pub fn summarize_suppliers(items: &[SupplierQualification], now: DateTime<Utc>) -> SupplierMetrics {
    let cutoff = now + Duration::days(EXPIRY_WINDOW_DAYS);
    let mut metrics = SupplierMetrics {
        total: 0,
        by_status: zeroed(QualificationStatus::all()),
        by_risk_level: zeroed(RiskLevel::all()),
        expiring_soon: 0,
        active_ncr_links: 0,
        active_capa_links: 0,
        average_score: 0.0,
        average_quality_rate: 0.0,
        average_on_time_delivery: 0.0,
        suppliers_requiring_audit: 0,
    };
    let mut scores = Vec::new();
    let mut quality_rates = Vec::new();
    let mut on_time_rates = Vec::new();

    for sq in items {
        metrics.total += 1;
        bump(&mut metrics.by_status, sq.status);
        bump(&mut metrics.by_risk_level, sq.risk_level);
        if sq.expires_by(cutoff) {
            metrics.expiring_soon += 1;
        }
        if sq.next_audit_date.is_some_and(|date| date <= cutoff) {
            metrics.suppliers_requiring_audit += 1;
        }
        metrics.active_ncr_links += u64::from(sq.active_ncr_count);
        metrics.active_capa_links += u64::from(sq.active_capa_count);
        if !sq.evaluations.is_empty() {
            scores.push(sq.overall_score);
        }
        if sq.performance.total_orders > 0 {
            quality_rates.push(sq.performance.quality_rate);
            on_time_rates.push(sq.performance.on_time_delivery_rate);
        }
    }

    metrics.average_score = mean(&scores);
    metrics.average_quality_rate = mean(&quality_rates);
    metrics.average_on_time_delivery = mean(&on_time_rates);
    metrics
}

/// Only approved or rejected inspections count; the range applies to
/// `completed_at`, falling back to `created_at`.
pub fn summarize_inspections(
    inspections: &[Inspection],
    range: &DateRange,
    scope: &InspectionScope,
) -> InspectionMetrics {
    let mut metrics = InspectionMetrics {
        total: 0,
        passed: 0,
        conditional: 0,
        failed: 0,
        pass_rate: 0.0,
        conditional_rate: 0.0,
        fail_rate: 0.0,
        by_type: zeroed(InspectionType::all()),
        by_result: zeroed(InspectionResult::all()),
        total_defects: 0,
        defects_by_severity: zeroed(DefectSeverity::all()),
        average_acceptance_rate: 0.0,
        top_defect_codes: Vec::new(),
    };
    let mut rates = Vec::new();
    let mut codes: BTreeMap<String, u64> = BTreeMap::new();

    let reviewed = inspections.iter().filter(|i| {
        i.status.is_reviewed()
            && range.contains(i.completed_at.unwrap_or(i.created_at))
            && scope.matches(i)
    });
    for insp in reviewed {
        metrics.total += 1;
        match insp.result {
            InspectionResult::Pass => metrics.passed += 1,
            InspectionResult::ConditionalPass => metrics.conditional += 1,
            InspectionResult::Fail => metrics.failed += 1,
            InspectionResult::Pending => {}
        }
        bump(&mut metrics.by_type, insp.inspection_type);
        bump(&mut metrics.by_result, insp.result);
        rates.push(insp.acceptance_rate);

        for defect in &insp.defects {
            let quantity = u64::from(defect.quantity);
            metrics.total_defects += quantity;
            *metrics
                .defects_by_severity
                .entry(defect.severity.to_string())
                .or_insert(0) += quantity;
            *codes.entry(defect.defect_code.clone()).or_insert(0) += quantity;
        }
    }

    metrics.pass_rate = share(metrics.passed, metrics.total);
    metrics.conditional_rate = share(metrics.conditional, metrics.total);
    metrics.fail_rate = share(metrics.failed, metrics.total);
    metrics.average_acceptance_rate = mean(&rates);

    let mut ranked: Vec<DefectCodeCount> = codes
        .into_iter()
        .map(|(code, count)| DefectCodeCount { code, count })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.code.cmp(&b.code)));
    ranked.truncate(TOP_DEFECT_CODES);
    metrics.top_defect_codes = ranked;
    metrics
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    pub fn ncr_metrics(&self, tenant: &TenantId, range: &DateRange) -> QualityResult<NcrMetrics> {
        let ncrs = self.list_all::<Ncr>(tenant)?;
        Ok(summarize_ncrs(&ncrs, range, Utc::now()))
    }

    pub fn capa_metrics(&self, tenant: &TenantId, range: &DateRange) -> QualityResult<CapaMetrics> {
        let capas = self.list_all::<Capa>(tenant)?;
        Ok(summarize_capas(&capas, range, Utc::now()))
    }

    pub fn supplier_metrics(&self, tenant: &TenantId) -> QualityResult<SupplierMetrics> {
        let items = self.list_all::<SupplierQualification>(tenant)?;
        Ok(summarize_suppliers(&items, Utc::now()))
    }

    pub fn inspection_metrics(
        &self,
        tenant: &TenantId,
        range: &DateRange,
        scope: &InspectionScope,
    ) -> QualityResult<InspectionMetrics> {
        let inspections = self.list_all::<Inspection>(tenant)?;
        Ok(summarize_inspections(&inspections, range, scope))
    }
}
