//! Inspection checklist templates and the defect-code catalogue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::entity::Entity;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::entities::inspection::{CheckSpec, CheckType, DefectSeverity, InspectionType};

/// One step of a checklist template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub sequence: u32,

    pub check_type: CheckType,

    pub check_name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub specification: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_value: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    #[serde(default)]
    pub is_required: bool,
}

impl ChecklistItem {
    /// Check definition for an inspection built from this template
    pub fn to_check(&self) -> CheckSpec {
        CheckSpec {
            check_type: self.check_type,
            check_name: self.check_name.clone(),
            description: self.description.clone(),
            specification: self.specification.clone(),
            min_value: self.min_value,
            max_value: self.max_value,
            target_value: self.target_value,
            unit: self.unit.clone(),
        }
    }
}

/// Reusable list of checks for a type of inspection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityChecklist {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// Short code, unique per tenant
    pub code: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub inspection_type: InspectionType,

    /// Items that apply only to some item categories
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub item_category: Option<String>,

    #[serde(default)]
    pub items: Vec<ChecklistItem>,

    pub is_active: bool,

    /// Bumped each time the item list is replaced
    pub version: u32,

    pub created_by: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Entity for QualityChecklist {
    const PREFIX: EntityPrefix = EntityPrefix::Qcl;
    const KIND: &'static str = "Checklist";

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
        if self.is_active { "active" } else { "inactive" }.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateChecklist {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub inspection_type: InspectionType,
    pub item_category: Option<String>,
    /// Checks in order; sequence numbers are assigned on creation
    pub items: Vec<CheckSpec>,
    pub created_by: String,
}

/// Number `specs` from 1 in the order given
pub fn number_items(specs: Vec<CheckSpec>) -> Vec<ChecklistItem> {
    specs
        .into_iter()
        .enumerate()
        .map(|(i, spec)| ChecklistItem {
            sequence: i as u32 + 1,
            check_type: spec.check_type,
            check_name: spec.check_name,
            description: spec.description,
            specification: spec.specification,
            min_value: spec.min_value,
            max_value: spec.max_value,
            target_value: spec.target_value,
            unit: spec.unit,
            is_required: true,
        })
        .collect()
}

impl QualityChecklist {
    pub fn new(tenant_id: TenantId, input: CreateChecklist) -> Self {
        let now = Utc::now();
        Self {
            id: EntityId::new(EntityPrefix::Qcl),
            tenant_id,
            code: input.code,
            name: input.name,
            description: input.description,
            inspection_type: input.inspection_type,
            item_category: input.item_category,
            items: number_items(input.items),
            is_active: true,
            version: 1,
            created_by: input.created_by,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Catalogue entry for a kind of defect
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefectCode {
    pub id: EntityId,

    pub tenant_id: TenantId,

    /// Short code, unique per tenant (e.g., "SCR-01")
    pub code: String,

    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub severity: DefectSeverity,

    #[serde(default)]
    pub category: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

impl Entity for DefectCode {
    const PREFIX: EntityPrefix = EntityPrefix::Dfc;
    const KIND: &'static str = "DefectCode";

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
        if self.is_active { "active" } else { "inactive" }.to_string()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CreateDefectCode {
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub severity: DefectSeverity,
    pub category: String,
}

impl DefectCode {
    pub fn new(tenant_id: TenantId, input: CreateDefectCode) -> Self {
        Self {
            id: EntityId::new(EntityPrefix::Dfc),
            tenant_id,
            code: input.code,
            name: input.name,
            description: input.description,
            severity: input.severity,
            category: input.category,
            is_active: true,
            created_at: Utc::now(),
        }
    }
}
