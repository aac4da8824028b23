//! Checklist templates and the defect-code catalogue

use chrono::Utc;
use serde_json::json;

use super::{ensure, require_text, QualityEngine};
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, TenantId};
use crate::core::store::QualityStore;
use crate::entities::checklist::{number_items, CreateChecklist, CreateDefectCode};
use crate::entities::inspection::{CheckSpec, DefectSeverity, InspectionType};
use crate::entities::{DefectCode, QualityChecklist};

/// Criteria for [`QualityEngine::list_defect_codes`]
#[derive(Debug, Clone, Default)]
pub struct DefectCodeFilter {
    pub severity: Option<DefectSeverity>,
    pub category: Option<String>,
    pub active_only: bool,
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    pub fn create_checklist(
        &mut self,
        tenant: &TenantId,
        input: CreateChecklist,
    ) -> QualityResult<QualityChecklist> {
        require_text(&input.code, "code")?;
        require_text(&input.name, "name")?;
        let taken = self
            .list_all::<QualityChecklist>(tenant)?
            .iter()
            .any(|c| c.code.eq_ignore_ascii_case(&input.code));
        ensure(!taken, "Checklist code already exists")?;

        let checklist = QualityChecklist::new(tenant.clone(), input);
        self.save(&checklist)?;

        self.emit(
            "checklist.created",
            tenant,
            json!({
                "checklist_id": checklist.id,
                "code": checklist.code,
                "items": checklist.items.len(),
            }),
        );
        Ok(checklist)
    }

    pub fn get_checklist(&self, tenant: &TenantId, id: &EntityId) -> QualityResult<QualityChecklist> {
        self.load(tenant, id)
    }

    pub fn find_checklist_by_code(
        &self,
        tenant: &TenantId,
        code: &str,
    ) -> QualityResult<QualityChecklist> {
        self.list_all::<QualityChecklist>(tenant)?
            .into_iter()
            .find(|c| c.code.eq_ignore_ascii_case(code))
            .ok_or_else(|| QualityError::not_found("Checklist", code))
    }

    /// Checklists ordered by code
    pub fn list_checklists(
        &self,
        tenant: &TenantId,
        inspection_type: Option<InspectionType>,
        active_only: bool,
    ) -> QualityResult<Vec<QualityChecklist>> {
        let mut items: Vec<QualityChecklist> = self
            .list_all::<QualityChecklist>(tenant)?
            .into_iter()
            .filter(|c| inspection_type.map_or(true, |t| c.inspection_type == t))
            .filter(|c| !active_only || c.is_active)
            .collect();
        items.sort_by(|a, b| a.code.cmp(&b.code));
        Ok(items)
    }

    /// Replace the item list; the version goes up by one
    pub fn update_checklist_items(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        items: Vec<CheckSpec>,
    ) -> QualityResult<QualityChecklist> {
        let mut checklist: QualityChecklist = self.load(tenant, id)?;

        checklist.items = number_items(items);
        checklist.version += 1;
        checklist.updated_at = Utc::now();
        self.save(&checklist)?;

        self.emit(
            "checklist.updated",
            tenant,
            json!({ "checklist_id": checklist.id, "version": checklist.version }),
        );
        Ok(checklist)
    }

    /// Flip between active and inactive
    pub fn toggle_checklist(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<QualityChecklist> {
        let mut checklist: QualityChecklist = self.load(tenant, id)?;

        checklist.is_active = !checklist.is_active;
        checklist.updated_at = Utc::now();
        self.save(&checklist)?;

        self.emit(
            "checklist.toggled",
            tenant,
            json!({ "checklist_id": checklist.id, "is_active": checklist.is_active }),
        );
        Ok(checklist)
    }

    pub fn create_defect_code(
        &mut self,
        tenant: &TenantId,
        input: CreateDefectCode,
    ) -> QualityResult<DefectCode> {
        require_text(&input.code, "code")?;
        require_text(&input.name, "name")?;
        let taken = self
            .list_all::<DefectCode>(tenant)?
            .iter()
            .any(|d| d.code.eq_ignore_ascii_case(&input.code));
        ensure(!taken, "Defect code already exists")?;

        let code = DefectCode::new(tenant.clone(), input);
        self.save(&code)?;

        self.emit(
            "defect_code.created",
            tenant,
            json!({ "defect_code_id": code.id, "code": code.code, "severity": code.severity }),
        );
        Ok(code)
    }

    /// Defect codes, most severe first then by code
    pub fn list_defect_codes(
        &self,
        tenant: &TenantId,
        filter: &DefectCodeFilter,
    ) -> QualityResult<Vec<DefectCode>> {
        let mut items: Vec<DefectCode> = self
            .list_all::<DefectCode>(tenant)?
            .into_iter()
            .filter(|d| filter.severity.map_or(true, |s| d.severity == s))
            .filter(|d| {
                filter
                    .category
                    .as_ref()
                    .map_or(true, |c| d.category.eq_ignore_ascii_case(c))
            })
            .filter(|d| !filter.active_only || d.is_active)
            .collect();
        items.sort_by(|a, b| a.severity.cmp(&b.severity).then_with(|| a.code.cmp(&b.code)));
        Ok(items)
    }
}
