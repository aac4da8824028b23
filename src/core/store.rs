//! Repository interfaces and the in-memory store
//!
//! The engine depends only on [`Repository`] and [`SequenceGenerator`]; the
//! concrete store (hash maps here, SQLite in [`crate::core::sqlite`]) is a
//! type parameter.

use std::collections::HashMap;

use serde_json::Value;

use crate::core::entity::Entity;
use crate::core::error::QualityResult;
use crate::core::identity::{EntityId, TenantId};
use crate::core::sequence::{SequenceGenerator, SequenceKind};
use crate::entities::{
    Capa, Certification, DefectCode, Inspection, Ncr, QualityChecklist, QualityDocument,
    SupplierQualification,
};

/// Keyed storage for one entity type
pub trait Repository<T: Entity> {
    /// Fetch by id regardless of tenant; tenant checks happen in the engine
    fn get(&self, id: &EntityId) -> QualityResult<Option<T>>;

    /// Insert or replace
    fn put(&mut self, entity: &T) -> QualityResult<()>;

    /// All entities of a tenant, oldest first
    fn list(&self, tenant: &TenantId) -> QualityResult<Vec<T>>;
}

/// Everything the lifecycle engine needs from a backing store
pub trait QualityStore:
    Repository<Ncr>
    + Repository<Capa>
    + Repository<SupplierQualification>
    + Repository<Inspection>
    + Repository<QualityChecklist>
    + Repository<DefectCode>
    + Repository<Certification>
    + Repository<QualityDocument>
    + SequenceGenerator
{
}

impl<S> QualityStore for S where
    S: Repository<Ncr>
        + Repository<Capa>
        + Repository<SupplierQualification>
        + Repository<Inspection>
        + Repository<QualityChecklist>
        + Repository<DefectCode>
        + Repository<Certification>
        + Repository<QualityDocument>
        + SequenceGenerator
{
}

/// Process-local store. Contents live until the process exits.
///
/// Records are held as JSON values keyed by kind and id, the same shape the
/// SQLite store persists.
#[derive(Debug, Default)]
pub struct MemoryStore {
    rows: HashMap<(&'static str, EntityId), Value>,
    counters: HashMap<(TenantId, SequenceKind), u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<T: Entity> Repository<T> for MemoryStore {
    fn get(&self, id: &EntityId) -> QualityResult<Option<T>> {
        match self.rows.get(&(T::KIND, id.clone())) {
            Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
            None => Ok(None),
        }
    }

    fn put(&mut self, entity: &T) -> QualityResult<()> {
        let value = serde_json::to_value(entity)?;
        self.rows.insert((T::KIND, entity.id().clone()), value);
        Ok(())
    }

    fn list(&self, tenant: &TenantId) -> QualityResult<Vec<T>> {
        let mut items = Vec::new();
        for ((kind, _), value) in &self.rows {
            if *kind != T::KIND {
                continue;
            }
            let entity: T = serde_json::from_value(value.clone())?;
            if entity.tenant_id() == tenant {
                items.push(entity);
            }
        }
        items.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.id().cmp(b.id()))
        });
        Ok(items)
    }
}

impl SequenceGenerator for MemoryStore {
    fn next_value(&mut self, tenant: &TenantId, kind: SequenceKind) -> QualityResult<u64> {
        let counter = self.counters.entry((tenant.clone(), kind)).or_insert(0);
        *counter += 1;
        Ok(*counter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::ncr::{CreateNcr, NcrSeverity, NcrSource, NcrType};

    fn sample_ncr(tenant: &str, number: &str) -> Ncr {
        let input = CreateNcr {
            title: "Scratch on housing".to_string(),
            ncr_type: NcrType::Product,
            severity: NcrSeverity::Minor,
            source: NcrSource::Inspection,
            detected_by: "qa".to_string(),
            ..CreateNcr::default()
        };
        Ncr::new(TenantId::new(tenant).unwrap(), number.to_string(), input)
    }

    #[test]
    fn test_put_get_list_by_tenant() {
        let mut store = MemoryStore::new();
        let a = sample_ncr("a", "NCR-2026-000001");
        let b = sample_ncr("b", "NCR-2026-000001");
        store.put(&a).unwrap();
        store.put(&b).unwrap();

        let fetched: Option<Ncr> = store.get(&a.id).unwrap();
        assert_eq!(fetched.unwrap().ncr_number, "NCR-2026-000001");

        let listed: Vec<Ncr> = store.list(&TenantId::new("a").unwrap()).unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);
    }

    #[test]
    fn test_missing_id_is_none() {
        let store = MemoryStore::new();
        let missing: Option<Capa> = store
            .get(&EntityId::new(crate::core::identity::EntityPrefix::Capa))
            .unwrap();
        assert!(missing.is_none());
    }

    #[test]
    fn test_counters_start_at_one() {
        let mut store = MemoryStore::new();
        let tenant = TenantId::new("acme").unwrap();
        assert_eq!(store.next_value(&tenant, SequenceKind::Capa).unwrap(), 1);
        assert_eq!(store.next_value(&tenant, SequenceKind::Capa).unwrap(), 2);
    }

    #[test]
    fn test_kinds_do_not_collide() {
        let mut store = MemoryStore::new();
        let record = sample_ncr("a", "NCR-2026-000001");
        store.put(&record).unwrap();

        let as_inspection: Option<Inspection> = store.get(&record.id).unwrap();
        assert!(as_inspection.is_none());
        let inspections: Vec<Inspection> = store.list(&TenantId::new("a").unwrap()).unwrap();
        assert!(inspections.is_empty());
    }
}
