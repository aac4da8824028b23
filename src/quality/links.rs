//! Cross-links between NCRs, CAPAs, inspections and supplier qualifications

use chrono::Utc;
use serde_json::json;

use super::{ensure, QualityEngine};
use crate::core::error::QualityResult;
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, TenantId};
use crate::core::store::QualityStore;
use crate::entities::capa::{CapaSource, CreateCapa};
use crate::entities::inspection::InspectionResult;
use crate::entities::ncr::{CreateNcr, NcrSource};
use crate::entities::{Capa, Inspection, Ncr, SupplierQualification};

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Point an NCR at a CAPA, replacing any earlier link. The CAPA gets the
    /// NCR as its source only if it has none yet.
    pub fn link_ncr_to_capa(
        &mut self,
        tenant: &TenantId,
        ncr_id: &EntityId,
        capa_id: &EntityId,
    ) -> QualityResult<Ncr> {
        let mut ncr: Ncr = self.load(tenant, ncr_id)?;
        let mut capa: Capa = self.load(tenant, capa_id)?;
        let now = Utc::now();

        ncr.capa_id = Some(capa.id.clone());
        ncr.capa_number = Some(capa.capa_number.clone());
        ncr.updated_at = now;

        let backfill = capa.ncr_id.is_none();
        if backfill {
            capa.ncr_id = Some(ncr.id.clone());
            capa.ncr_number = Some(ncr.ncr_number.clone());
            capa.updated_at = now;
        }

        self.save(&ncr)?;
        if backfill {
            self.save(&capa)?;
        }

        self.emit(
            "ncr.linked_to_capa",
            tenant,
            json!({
                "ncr_id": ncr.id,
                "capa_id": capa.id,
                "capa_number": capa.capa_number,
            }),
        );
        Ok(ncr)
    }

    /// Open a CAPA for an NCR, linked in both directions
    pub fn raise_capa_from_ncr(
        &mut self,
        tenant: &TenantId,
        ncr_id: &EntityId,
        mut input: CreateCapa,
    ) -> QualityResult<Capa> {
        let ncr: Ncr = self.load(tenant, ncr_id)?;

        input.source = CapaSource::Ncr;
        input.ncr_id = Some(ncr.id.clone());
        input.ncr_number = Some(ncr.ncr_number.clone());
        if input.supplier_id.is_none() {
            input.supplier_id = ncr.links.supplier_id.clone();
        }
        if input.problem_statement.is_empty() {
            input.problem_statement = ncr.title.clone();
        }

        let capa = self.create_capa(tenant, input)?;
        self.link_ncr_to_capa(tenant, &ncr.id, &capa.id)?;
        Ok(capa)
    }

    /// Open an NCR for a finished inspection. Item, supplier and quantity
    /// default to the inspection's own values.
    pub fn raise_ncr_from_inspection(
        &mut self,
        tenant: &TenantId,
        inspection_id: &EntityId,
        mut input: CreateNcr,
    ) -> QualityResult<Ncr> {
        let mut insp: Inspection = self.load(tenant, inspection_id)?;
        ensure(
            insp.result != InspectionResult::Pending,
            "Inspection has no result yet",
        )?;

        input.source = NcrSource::Inspection;
        input.links.inspection_id = Some(insp.id.to_string());
        if input.links.item_id.is_none() {
            input.links.item_id = Some(insp.item_id.clone());
        }
        if input.links.supplier_id.is_none() {
            input.links.supplier_id = insp.supplier_id.clone();
        }
        if input.quantity_affected.is_none() && insp.failed_quantity > 0 {
            input.quantity_affected = Some(f64::from(insp.failed_quantity));
        }
        if input.description.is_none() {
            input.description = Some(format!(
                "Raised from inspection {} ({})",
                insp.inspection_number, insp.result
            ));
        }

        let ncr = self.create_ncr(tenant, input)?;
        insp.ncr_ids.push(ncr.id.clone());
        insp.updated_at = Utc::now();
        self.save(&insp)?;

        self.emit(
            "inspection.ncr_raised",
            tenant,
            json!({
                "inspection_id": insp.id,
                "ncr_id": ncr.id,
                "ncr_number": ncr.ncr_number,
            }),
        );
        Ok(ncr)
    }

    /// Record an NCR against a supplier. Linking twice is a no-op.
    pub fn link_ncr_to_supplier(
        &mut self,
        tenant: &TenantId,
        qualification_id: &EntityId,
        ncr_id: &EntityId,
    ) -> QualityResult<SupplierQualification> {
        let _: Ncr = self.load(tenant, ncr_id)?;
        let mut sq: SupplierQualification = self.load(tenant, qualification_id)?;

        if !sq.ncr_ids.contains(ncr_id) {
            sq.ncr_ids.push(ncr_id.clone());
            sq.active_ncr_count += 1;
        }
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.ncr_linked",
            tenant,
            json!({ "qualification_id": sq.id, "ncr_id": ncr_id }),
        );
        Ok(sq)
    }

    /// Record a CAPA against a supplier. Linking twice is a no-op.
    pub fn link_capa_to_supplier(
        &mut self,
        tenant: &TenantId,
        qualification_id: &EntityId,
        capa_id: &EntityId,
    ) -> QualityResult<SupplierQualification> {
        let _: Capa = self.load(tenant, capa_id)?;
        let mut sq: SupplierQualification = self.load(tenant, qualification_id)?;

        if !sq.capa_ids.contains(capa_id) {
            sq.capa_ids.push(capa_id.clone());
            sq.active_capa_count += 1;
        }
        sq.updated_at = Utc::now();
        self.save(&sq)?;

        self.emit(
            "supplier.capa_linked",
            tenant,
            json!({ "qualification_id": sq.id, "capa_id": capa_id }),
        );
        Ok(sq)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::entities::inspection::{CompleteInspection, CreateInspection};
    use crate::entities::supplier::CreateSupplierQualification;

    fn ncr(engine: &mut TestEngine, tenant_name: &str) -> Ncr {
        engine
            .create_ncr(
                &tenant(tenant_name),
                CreateNcr {
                    title: "Cracked casting".to_string(),
                    detected_by: "qa".to_string(),
                    ..CreateNcr::default()
                },
            )
            .unwrap()
    }

    fn capa_input() -> CreateCapa {
        CreateCapa {
            title: "Casting process review".to_string(),
            initiated_by: "qa".to_string(),
            owner: "eng".to_string(),
            ..CreateCapa::default()
        }
    }

    #[test]
    fn test_link_sets_both_sides() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = ncr(&mut engine, "acme");
        let capa = engine.create_capa(&t, capa_input()).unwrap();

        let linked = engine.link_ncr_to_capa(&t, &ncr.id, &capa.id).unwrap();
        assert_eq!(linked.capa_id.as_ref(), Some(&capa.id));
        assert_eq!(linked.capa_number.as_deref(), Some(capa.capa_number.as_str()));

        let capa = engine.get_capa(&t, &capa.id).unwrap();
        assert_eq!(capa.ncr_id.as_ref(), Some(&ncr.id));
        assert!(engine.publisher().last("ncr.linked_to_capa").is_some());
    }

    #[test]
    fn test_link_keeps_existing_capa_source() {
        let mut engine = engine();
        let t = tenant("acme");
        let first = ncr(&mut engine, "acme");
        let second = ncr(&mut engine, "acme");
        let capa = engine.create_capa(&t, capa_input()).unwrap();

        engine.link_ncr_to_capa(&t, &first.id, &capa.id).unwrap();
        engine.link_ncr_to_capa(&t, &second.id, &capa.id).unwrap();

        assert_eq!(
            engine.get_capa(&t, &capa.id).unwrap().ncr_id.as_ref(),
            Some(&first.id)
        );
        assert_eq!(
            engine.get_ncr(&t, &second.id).unwrap().capa_id.as_ref(),
            Some(&capa.id)
        );
    }

    #[test]
    fn test_link_across_tenants_is_not_found() {
        let mut engine = engine();
        let foreign = ncr(&mut engine, "globex");
        let t = tenant("acme");
        let capa = engine.create_capa(&t, capa_input()).unwrap();
        let before = engine.get_capa(&t, &capa.id).unwrap();

        let err = engine.link_ncr_to_capa(&t, &foreign.id, &capa.id).unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(engine.get_capa(&t, &capa.id).unwrap(), before);
    }

    #[test]
    fn test_raise_capa_from_ncr() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = ncr(&mut engine, "acme");

        let capa = engine.raise_capa_from_ncr(&t, &ncr.id, capa_input()).unwrap();
        assert_eq!(capa.source, CapaSource::Ncr);
        assert_eq!(capa.ncr_number.as_deref(), Some(ncr.ncr_number.as_str()));
        assert_eq!(capa.problem_statement, "Cracked casting");
        assert_eq!(
            engine.get_ncr(&t, &ncr.id).unwrap().capa_id.as_ref(),
            Some(&capa.id)
        );
    }

    #[test]
    fn test_supplier_links_are_idempotent() {
        let mut engine = engine();
        let t = tenant("acme");
        let ncr = ncr(&mut engine, "acme");
        let capa = engine.create_capa(&t, capa_input()).unwrap();
        let sq = engine
            .create_supplier_qualification(
                &t,
                CreateSupplierQualification {
                    supplier_id: "SUP-7".to_string(),
                    supplier_name: "Bolt Co".to_string(),
                    ..CreateSupplierQualification::default()
                },
            )
            .unwrap();

        engine.link_ncr_to_supplier(&t, &sq.id, &ncr.id).unwrap();
        let sq = engine.link_ncr_to_supplier(&t, &sq.id, &ncr.id).unwrap();
        assert_eq!(sq.ncr_ids.len(), 1);
        assert_eq!(sq.active_ncr_count, 1);

        let sq = engine.link_capa_to_supplier(&t, &sq.id, &capa.id).unwrap();
        assert_eq!(sq.active_capa_count, 1);
    }

    #[test]
    fn test_raise_ncr_from_inspection() {
        let mut engine = engine();
        let t = tenant("acme");
        let insp = engine
            .create_inspection(
                &t,
                CreateInspection {
                    item_id: "ITEM-9".to_string(),
                    supplier_id: Some("SUP-7".to_string()),
                    sample_size: 20,
                    total_quantity: 200,
                    ..CreateInspection::default()
                },
            )
            .unwrap();
        let input = CreateNcr {
            title: "Incoming lot rejected".to_string(),
            detected_by: "qa".to_string(),
            ..CreateNcr::default()
        };

        let err = engine
            .raise_ncr_from_inspection(&t, &insp.id, input.clone())
            .unwrap_err();
        assert_eq!(err.to_string(), "Inspection has no result yet");

        engine.start_inspection(&t, &insp.id, "qa").unwrap();
        engine
            .complete_inspection(
                &t,
                &insp.id,
                CompleteInspection {
                    passed_quantity: 10,
                    failed_quantity: 10,
                    inspected_by: "qa".to_string(),
                    notes: None,
                },
            )
            .unwrap();

        let ncr = engine.raise_ncr_from_inspection(&t, &insp.id, input).unwrap();
        assert_eq!(ncr.source, NcrSource::Inspection);
        assert_eq!(ncr.links.inspection_id, Some(insp.id.to_string()));
        assert_eq!(ncr.links.supplier_id.as_deref(), Some("SUP-7"));
        assert_eq!(ncr.quantity_affected, Some(10.0));

        let insp = engine.get_inspection(&t, &insp.id).unwrap();
        assert_eq!(insp.ncr_ids, vec![ncr.id.clone()]);
        assert!(engine.publisher().last("inspection.ncr_raised").is_some());
    }
}
