//! SQLite-backed store
//!
//! Each entity is kept as one JSON document in the `entities` table, with the
//! columns needed for tenant-scoped listing pulled out alongside it. Sequence
//! counters live in `sequences` and are bumped inside an immediate
//! transaction so concurrent processes never hand out the same number.

use std::fs;
use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};

use crate::core::entity::Entity;
use crate::core::error::{QualityError, QualityResult};
use crate::core::identity::{EntityId, TenantId};
use crate::core::sequence::{SequenceGenerator, SequenceKind};
use crate::core::store::Repository;

/// Current schema version
const SCHEMA_VERSION: i32 = 1;

/// Durable store for a project
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open or create the database at `path`
    pub fn open(path: &Path) -> QualityResult<Self> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| QualityError::Storage(e.to_string()))?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")?;

        let mut store = Self { conn };
        store.init_schema()?;
        Ok(store)
    }

    /// Throwaway database, used by tests
    pub fn open_in_memory() -> QualityResult<Self> {
        let mut store = Self {
            conn: Connection::open_in_memory()?,
        };
        store.init_schema()?;
        Ok(store)
    }

    fn init_schema(&mut self) -> QualityResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS schema_version (
                version INTEGER PRIMARY KEY
            );

            CREATE TABLE IF NOT EXISTS entities (
                id TEXT PRIMARY KEY,
                kind TEXT NOT NULL,
                tenant_id TEXT NOT NULL,
                created_at TEXT NOT NULL,
                body TEXT NOT NULL
            );
            CREATE INDEX IF NOT EXISTS idx_entities_tenant ON entities(tenant_id, kind);

            CREATE TABLE IF NOT EXISTS sequences (
                tenant_id TEXT NOT NULL,
                kind TEXT NOT NULL,
                value INTEGER NOT NULL,
                PRIMARY KEY (tenant_id, kind)
            );
            "#,
        )?;

        let version: Option<i32> = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?;

        match version {
            None => {
                self.conn.execute(
                    "INSERT INTO schema_version (version) VALUES (?1)",
                    params![SCHEMA_VERSION],
                )?;
            }
            Some(v) if v > SCHEMA_VERSION => {
                return Err(QualityError::Storage(format!(
                    "database schema version {} is newer than supported version {}",
                    v, SCHEMA_VERSION
                )));
            }
            Some(_) => {}
        }

        Ok(())
    }

    fn get_entity<T: Entity>(&self, id: &EntityId) -> QualityResult<Option<T>> {
        let body: Option<String> = self
            .conn
            .query_row(
                "SELECT body FROM entities WHERE id = ?1 AND kind = ?2",
                params![id.to_string(), T::KIND],
                |row| row.get(0),
            )
            .optional()?;

        match body {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    fn put_entity<T: Entity>(&mut self, entity: &T) -> QualityResult<()> {
        let body = serde_json::to_string(entity)?;
        self.conn.execute(
            r#"INSERT INTO entities (id, kind, tenant_id, created_at, body)
               VALUES (?1, ?2, ?3, ?4, ?5)
               ON CONFLICT(id) DO UPDATE SET body = excluded.body"#,
            params![
                entity.id().to_string(),
                T::KIND,
                entity.tenant_id().as_str(),
                entity.created_at().to_rfc3339(),
                body,
            ],
        )?;
        Ok(())
    }

    fn list_entities<T: Entity>(&self, tenant: &TenantId) -> QualityResult<Vec<T>> {
        let mut stmt = self.conn.prepare(
            "SELECT body FROM entities WHERE tenant_id = ?1 AND kind = ?2 ORDER BY created_at, id",
        )?;
        let rows = stmt.query_map(params![tenant.as_str(), T::KIND], |row| {
            row.get::<_, String>(0)
        })?;

        let mut items = Vec::new();
        for row in rows {
            items.push(serde_json::from_str(&row?)?);
        }
        Ok(items)
    }
}

impl<T: Entity> Repository<T> for SqliteStore {
    fn get(&self, id: &EntityId) -> QualityResult<Option<T>> {
        self.get_entity(id)
    }

    fn put(&mut self, entity: &T) -> QualityResult<()> {
        self.put_entity(entity)
    }

    fn list(&self, tenant: &TenantId) -> QualityResult<Vec<T>> {
        self.list_entities(tenant)
    }
}

impl SequenceGenerator for SqliteStore {
    fn next_value(&mut self, tenant: &TenantId, kind: SequenceKind) -> QualityResult<u64> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        tx.execute(
            r#"INSERT INTO sequences (tenant_id, kind, value) VALUES (?1, ?2, 1)
               ON CONFLICT(tenant_id, kind) DO UPDATE SET value = value + 1"#,
            params![tenant.as_str(), kind.key()],
        )?;
        let value: i64 = tx.query_row(
            "SELECT value FROM sequences WHERE tenant_id = ?1 AND kind = ?2",
            params![tenant.as_str(), kind.key()],
            |row| row.get(0),
        )?;

        tx.commit()?;
        Ok(value as u64)
    }
}
