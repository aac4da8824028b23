//! Quality issue lifecycle engine
//!
//! [`QualityEngine`] owns a store and an event publisher and exposes every
//! NCR, CAPA, supplier, inspection, certification and document operation. The operations are split
//! across submodules by entity; each one loads the entity for the caller's
//! tenant, checks its guards, mutates a copy, writes it back, then publishes
//! exactly one event (two for cascades).
//!
//! A failed guard returns [`QualityError::BadRequest`] before anything is
//! written, so the stored entity is unchanged.

mod capa;
mod certification;
mod checklist;
mod document;
mod inspection;
mod links;
pub mod metrics;
mod ncr;
mod supplier;

pub use capa::{next_status, CapaFilter};
pub use certification::CertificationFilter;
pub use checklist::DefectCodeFilter;
pub use document::DocumentFilter;
pub use inspection::InspectionFilter;
pub use metrics::{
    ActionMetrics, CapaMetrics, DateRange, DefectCodeCount, InspectionMetrics, InspectionScope,
    NcrMetrics, SupplierMetrics,
};
pub use ncr::NcrFilter;
pub use supplier::SupplierFilter;

use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::core::entity::Entity;
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::{EventPublisher, TracingPublisher};
use crate::core::identity::{EntityId, TenantId};
use crate::core::sequence::{next_number, SequenceKind};
use crate::core::store::{QualityStore, Repository};

/// The lifecycle engine
pub struct QualityEngine<S, P = TracingPublisher> {
    store: S,
    events: P,
}

impl<S: QualityStore> QualityEngine<S, TracingPublisher> {
    /// Engine that logs events through `tracing`
    pub fn new(store: S) -> Self {
        Self::with_publisher(store, TracingPublisher)
    }
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    pub fn with_publisher(store: S, events: P) -> Self {
        Self { store, events }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn publisher(&self) -> &P {
        &self.events
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Fetch an entity owned by `tenant`. Absent and foreign entities look the same.
    fn load<T>(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<T>
    where
        T: Entity,
        S: Repository<T>,
    {
        match Repository::<T>::get(&self.store, id)? {
            Some(entity) if entity.tenant_id() == tenant => Ok(entity),
            _ => Err(QualityError::not_found(T::KIND, id)),
        }
    }

    fn save<T>(&mut self, entity: &T) -> QualityResult<()>
    where
        T: Entity,
        S: Repository<T>,
    {
        Repository::<T>::put(&mut self.store, entity)
    }

    fn list_all<T>(&self, tenant: &TenantId) -> QualityResult<Vec<T>>
    where
        T: Entity,
        S: Repository<T>,
    {
        Repository::<T>::list(&self.store, tenant)
    }

    fn allocate_number(&mut self, tenant: &TenantId, kind: SequenceKind) -> QualityResult<String> {
        next_number(&mut self.store, tenant, kind, Utc::now())
    }

    /// Publish `name` with the tenant merged into `payload`
    fn emit(&self, name: &str, tenant: &TenantId, payload: Value) {
        let mut body = json!({ "tenant_id": tenant.as_str() });
        if let (Some(target), Value::Object(extra)) = (body.as_object_mut(), payload) {
            target.extend(extra);
        }
        tracing::debug!(event = name, tenant = %tenant, "publishing");
        self.events.publish(name, body);
    }
}

/// Guard helper: `BadRequest(message)` unless `condition` holds
fn ensure(condition: bool, message: &str) -> QualityResult<()> {
    if condition {
        Ok(())
    } else {
        tracing::debug!(reason = message, "operation rejected");
        Err(QualityError::bad_request(message))
    }
}

fn require_text(value: &str, field: &str) -> QualityResult<()> {
    if value.trim().is_empty() {
        Err(QualityError::InvalidInput(format!("{} is required", field)))
    } else {
        Ok(())
    }
}

/// Newest first, the order every list query returns
fn newest_first<T: Entity>(items: &mut [T]) {
    items.sort_by(|a, b| {
        b.created_at()
            .cmp(&a.created_at())
            .then_with(|| b.id().cmp(a.id()))
    });
}

fn within(at: DateTime<Utc>, from: Option<DateTime<Utc>>, to: Option<DateTime<Utc>>) -> bool {
    from.map_or(true, |f| at >= f) && to.map_or(true, |t| at <= t)
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;

    #[test]
    fn test_emit_merges_tenant_into_payload() {
        let engine = engine();
        engine.emit("ncr.opened", &tenant("acme"), json!({ "ncr_id": "NCR-1" }));

        let event = engine.publisher().last("ncr.opened").unwrap();
        assert_eq!(event.payload["tenant_id"], "acme");
        assert_eq!(event.payload["ncr_id"], "NCR-1");
    }

    #[test]
    fn test_within_is_inclusive() {
        let now = Utc::now();
        assert!(within(now, Some(now), Some(now)));
        assert!(within(now, None, None));
        assert!(!within(now, Some(now + chrono::Duration::seconds(1)), None));
    }
}
