//! Certification lifecycle and expiry tracking

use chrono::{DateTime, Duration, Utc};
use serde_json::json;

use super::{ensure, require_text, QualityEngine};
use crate::core::entity::AuditResult;
use crate::core::error::{QualityError, QualityResult};
use crate::core::events::EventPublisher;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::sequence::SequenceKind;
use crate::core::store::QualityStore;
use crate::entities::certification::{
    expiry_status, CertificationAudit, CertificationRenewal, CertificationStatus,
    CertificationType, CreateCertification, RecordCertificationAudit,
};
use crate::entities::Certification;

/// Criteria for [`QualityEngine::list_certifications`]. Unset fields match everything.
#[derive(Debug, Clone, Default)]
pub struct CertificationFilter {
    pub certification_type: Option<CertificationType>,
    pub status: Option<CertificationStatus>,
    pub supplier_id: Option<String>,
    pub product_id: Option<String>,
    pub equipment_id: Option<String>,
    pub employee_id: Option<String>,
    /// Only certificates expiring within this many days from now
    pub expiring_within_days: Option<i64>,
}

impl CertificationFilter {
    pub fn matches(&self, cert: &Certification, now: DateTime<Utc>) -> bool {
        self.certification_type
            .map_or(true, |t| cert.certification_type == t)
            && self.status.map_or(true, |s| cert.status == s)
            && holder_matches(&self.supplier_id, &cert.supplier_id)
            && holder_matches(&self.product_id, &cert.product_id)
            && holder_matches(&self.equipment_id, &cert.equipment_id)
            && holder_matches(&self.employee_id, &cert.employee_id)
            && self
                .expiring_within_days
                .map_or(true, |days| cert.expiry_date <= now + Duration::days(days))
    }
}

fn holder_matches(wanted: &Option<String>, actual: &Option<String>) -> bool {
    wanted.as_ref().map_or(true, |w| actual.as_ref() == Some(w))
}

fn ensure_not_withdrawn(cert: &Certification) -> QualityResult<()> {
    ensure(
        cert.status != CertificationStatus::Withdrawn,
        "Certification has been withdrawn",
    )
}

impl<S: QualityStore, P: EventPublisher> QualityEngine<S, P> {
    /// Register a pending certificate with the tenant's next number
    pub fn create_certification(
        &mut self,
        tenant: &TenantId,
        input: CreateCertification,
    ) -> QualityResult<Certification> {
        require_text(&input.name, "name")?;
        require_text(&input.issuing_body, "issuing_body")?;
        ensure(
            input.expiry_date > input.issue_date,
            "Expiry date must be after issue date",
        )?;

        let number = self.allocate_number(tenant, SequenceKind::Certification)?;
        let cert = Certification::new(tenant.clone(), number, input);
        self.save(&cert)?;

        tracing::info!(
            certification = %cert.certification_number,
            tenant = %tenant,
            "created certification"
        );
        self.emit(
            "certification.created",
            tenant,
            json!({
                "certification_id": cert.id,
                "certification_number": cert.certification_number,
                "certification_type": cert.certification_type,
                "expiry_date": cert.expiry_date,
            }),
        );
        Ok(cert)
    }

    pub fn get_certification(
        &self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<Certification> {
        self.load(tenant, id)
    }

    pub fn find_certification_by_number(
        &self,
        tenant: &TenantId,
        number: &str,
    ) -> QualityResult<Certification> {
        self.list_all::<Certification>(tenant)?
            .into_iter()
            .find(|c| c.certification_number.eq_ignore_ascii_case(number))
            .ok_or_else(|| QualityError::not_found("Certification", number))
    }

    /// Certificates matching `filter`, soonest expiry first
    pub fn list_certifications(
        &self,
        tenant: &TenantId,
        filter: &CertificationFilter,
    ) -> QualityResult<Vec<Certification>> {
        let now = Utc::now();
        let mut items: Vec<Certification> = self
            .list_all::<Certification>(tenant)?
            .into_iter()
            .filter(|c| filter.matches(c, now))
            .collect();
        items.sort_by(|a, b| a.expiry_date.cmp(&b.expiry_date));
        Ok(items)
    }

    pub fn activate_certification(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
    ) -> QualityResult<Certification> {
        let mut cert: Certification = self.load(tenant, id)?;
        ensure(
            cert.status == CertificationStatus::Pending,
            "Only pending certifications can be activated",
        )?;

        cert.status = CertificationStatus::Active;
        cert.updated_at = Utc::now();
        self.save(&cert)?;

        self.emit(
            "certification.activated",
            tenant,
            json!({ "certification_id": cert.id }),
        );
        Ok(cert)
    }

    /// Record a certification-body audit. A failed audit suspends the certificate.
    pub fn record_certification_audit(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        input: RecordCertificationAudit,
    ) -> QualityResult<Certification> {
        require_text(&input.auditor, "auditor")?;
        let mut cert: Certification = self.load(tenant, id)?;
        ensure_not_withdrawn(&cert)?;

        let audit = CertificationAudit {
            id: EntityId::new(EntityPrefix::Aud),
            audit_date: input.audit_date,
            audit_type: input.audit_type,
            auditor: input.auditor,
            result: input.result,
            findings: input.findings,
            major_findings: input.major_findings,
            minor_findings: input.minor_findings,
            notes: input.notes,
        };
        let failed = audit.result == AuditResult::Fail;

        cert.last_audit_date = Some(audit.audit_date);
        if input.next_audit_date.is_some() {
            cert.next_audit_date = input.next_audit_date;
        }
        if failed {
            cert.status = CertificationStatus::Suspended;
            cert.status_reason = Some(format!("Failed {} audit", audit.audit_type));
        }
        let payload = json!({
            "certification_id": cert.id,
            "audit_id": audit.id,
            "audit_type": audit.audit_type,
            "result": audit.result,
        });
        cert.audits.push(audit);
        cert.updated_at = Utc::now();
        self.save(&cert)?;

        self.emit("certification.audit_recorded", tenant, payload);
        if failed {
            tracing::warn!(certification = %cert.certification_number, "certification suspended after failed audit");
            self.emit(
                "certification.suspended",
                tenant,
                json!({ "certification_id": cert.id, "reason": cert.status_reason }),
            );
        }
        Ok(cert)
    }

    /// Extend validity to `new_expiry`
    pub fn renew_certification(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        new_expiry: DateTime<Utc>,
        renewed_by: &str,
        notes: Option<String>,
    ) -> QualityResult<Certification> {
        let mut cert: Certification = self.load(tenant, id)?;
        ensure_not_withdrawn(&cert)?;
        ensure(
            new_expiry > cert.expiry_date,
            "New expiry date must be after the current expiry date",
        )?;

        let now = Utc::now();
        cert.renewals.push(CertificationRenewal {
            id: EntityId::new(EntityPrefix::Rnw),
            renewal_date: now,
            previous_expiry_date: cert.expiry_date,
            new_expiry_date: new_expiry,
            renewed_by: renewed_by.to_string(),
            notes,
        });
        cert.expiry_date = new_expiry;
        cert.status = CertificationStatus::Renewed;
        cert.status_reason = None;
        cert.updated_at = now;
        self.save(&cert)?;

        self.emit(
            "certification.renewed",
            tenant,
            json!({ "certification_id": cert.id, "new_expiry_date": new_expiry }),
        );
        Ok(cert)
    }

    pub fn suspend_certification(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<Certification> {
        let mut cert: Certification = self.load(tenant, id)?;
        ensure_not_withdrawn(&cert)?;

        cert.status = CertificationStatus::Suspended;
        cert.status_reason = Some(reason.to_string());
        cert.updated_at = Utc::now();
        self.save(&cert)?;

        self.emit(
            "certification.suspended",
            tenant,
            json!({ "certification_id": cert.id, "reason": reason }),
        );
        Ok(cert)
    }

    pub fn withdraw_certification(
        &mut self,
        tenant: &TenantId,
        id: &EntityId,
        reason: &str,
    ) -> QualityResult<Certification> {
        let mut cert: Certification = self.load(tenant, id)?;
        ensure_not_withdrawn(&cert)?;

        cert.status = CertificationStatus::Withdrawn;
        cert.status_reason = Some(reason.to_string());
        cert.updated_at = Utc::now();
        self.save(&cert)?;

        self.emit(
            "certification.withdrawn",
            tenant,
            json!({ "certification_id": cert.id, "reason": reason }),
        );
        Ok(cert)
    }

    /// Move live certificates to `expired` or `expiring_soon` by their expiry
    /// date. Returns how many changed; each change publishes its own event.
    pub fn update_certification_status(&mut self, tenant: &TenantId) -> QualityResult<usize> {
        let now = Utc::now();
        let mut changed = 0;

        for mut cert in self.list_all::<Certification>(tenant)? {
            if !cert.status.is_tracked() {
                continue;
            }
            let Some(next) = expiry_status(cert.expiry_date, now) else {
                continue;
            };
            if next == cert.status {
                continue;
            }

            cert.status = next;
            cert.updated_at = now;
            self.save(&cert)?;
            changed += 1;

            let name = match next {
                CertificationStatus::Expired => "certification.expired",
                _ => "certification.expiring_soon",
            };
            self.emit(
                name,
                tenant,
                json!({
                    "certification_id": cert.id,
                    "certification_number": cert.certification_number,
                    "expiry_date": cert.expiry_date,
                }),
            );
        }

        tracing::info!(tenant = %tenant, changed, "certification expiry sweep");
        Ok(changed)
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::*;
    use super::*;
    use crate::entities::certification::CertificationAuditType;

    fn register(engine: &mut TestEngine, expires_in_days: i64) -> Certification {
        engine
            .create_certification(
                &tenant("acme"),
                CreateCertification {
                    name: "ISO 9001 site certificate".to_string(),
                    certification_type: CertificationType::Iso9001,
                    issuing_body: "TUV".to_string(),
                    issue_date: Utc::now() - Duration::days(400),
                    expiry_date: Utc::now() + Duration::days(expires_in_days),
                    created_by: "qm".to_string(),
                    ..CreateCertification::default()
                },
            )
            .unwrap()
    }

    fn active(engine: &mut TestEngine, expires_in_days: i64) -> Certification {
        let cert = register(engine, expires_in_days);
        engine.activate_certification(&tenant("acme"), &cert.id).unwrap()
    }

    fn audit(result: AuditResult) -> RecordCertificationAudit {
        RecordCertificationAudit {
            audit_type: CertificationAuditType::Surveillance,
            auditor: "Lead auditor".to_string(),
            result,
            ..RecordCertificationAudit::default()
        }
    }

    #[test]
    fn test_numbering_and_activation() {
        let mut engine = engine();
        let t = tenant("acme");
        let cert = register(&mut engine, 365);
        assert!(cert.certification_number.starts_with("CERT-"));
        assert!(cert.certification_number.ends_with("-00001"));
        assert_eq!(cert.status, CertificationStatus::Pending);

        let cert = engine.activate_certification(&t, &cert.id).unwrap();
        assert_eq!(cert.status, CertificationStatus::Active);

        let err = engine.activate_certification(&t, &cert.id).unwrap_err();
        assert_eq!(err.to_string(), "Only pending certifications can be activated");
    }

    #[test]
    fn test_expiry_must_follow_issue() {
        let mut engine = engine();
        let now = Utc::now();
        let err = engine
            .create_certification(
                &tenant("acme"),
                CreateCertification {
                    name: "CE".to_string(),
                    issuing_body: "NB".to_string(),
                    issue_date: now,
                    expiry_date: now,
                    ..CreateCertification::default()
                },
            )
            .unwrap_err();
        assert_eq!(err.to_string(), "Expiry date must be after issue date");
    }

    #[test]
    fn test_failed_audit_suspends() {
        let mut engine = engine();
        let t = tenant("acme");
        let cert = active(&mut engine, 365);

        let cert = engine
            .record_certification_audit(&t, &cert.id, audit(AuditResult::Conditional))
            .unwrap();
        assert_eq!(cert.status, CertificationStatus::Active);
        assert!(cert.last_audit_date.is_some());

        engine.publisher().clear();
        let cert = engine
            .record_certification_audit(&t, &cert.id, audit(AuditResult::Fail))
            .unwrap();
        assert_eq!(cert.status, CertificationStatus::Suspended);
        assert_eq!(cert.audits.len(), 2);
        assert_eq!(
            engine.publisher().names(),
            vec!["certification.audit_recorded", "certification.suspended"]
        );
    }

    #[test]
    fn test_renew_extends_expiry() {
        let mut engine = engine();
        let t = tenant("acme");
        let cert = active(&mut engine, 10);
        let new_expiry = cert.expiry_date + Duration::days(3 * 365);

        let err = engine
            .renew_certification(&t, &cert.id, cert.expiry_date, "qm", None)
            .unwrap_err();
        assert!(err.is_bad_request());

        let cert = engine
            .renew_certification(&t, &cert.id, new_expiry, "qm", None)
            .unwrap();
        assert_eq!(cert.status, CertificationStatus::Renewed);
        assert_eq!(cert.expiry_date, new_expiry);
        assert_eq!(cert.renewals.len(), 1);
        assert!(cert.renewals[0].previous_expiry_date < new_expiry);
    }

    #[test]
    fn test_withdrawn_is_final() {
        let mut engine = engine();
        let t = tenant("acme");
        let cert = active(&mut engine, 365);

        engine.suspend_certification(&t, &cert.id, "scope change").unwrap();
        let cert = engine.withdraw_certification(&t, &cert.id, "site closed").unwrap();
        assert_eq!(cert.status, CertificationStatus::Withdrawn);
        assert_eq!(cert.status_reason.as_deref(), Some("site closed"));

        for err in [
            engine.suspend_certification(&t, &cert.id, "x").unwrap_err(),
            engine.withdraw_certification(&t, &cert.id, "x").unwrap_err(),
            engine
                .renew_certification(&t, &cert.id, cert.expiry_date + Duration::days(1), "qm", None)
                .unwrap_err(),
            engine
                .record_certification_audit(&t, &cert.id, audit(AuditResult::Pass))
                .unwrap_err(),
        ] {
            assert_eq!(err.to_string(), "Certification has been withdrawn");
        }
    }

    #[test]
    fn test_sweep_marks_expiring_and_expired() {
        let mut engine = engine();
        let t = tenant("acme");
        let far = active(&mut engine, 365);
        let soon = active(&mut engine, 10);
        let past = active(&mut engine, -1);
        let pending = register(&mut engine, -5);

        engine.publisher().clear();
        assert_eq!(engine.update_certification_status(&t).unwrap(), 2);

        let status = |engine: &TestEngine, id: &EntityId| {
            engine.get_certification(&t, id).unwrap().status
        };
        assert_eq!(status(&engine, &far.id), CertificationStatus::Active);
        assert_eq!(status(&engine, &soon.id), CertificationStatus::ExpiringSoon);
        assert_eq!(status(&engine, &past.id), CertificationStatus::Expired);
        assert_eq!(status(&engine, &pending.id), CertificationStatus::Pending);
        assert!(engine.publisher().last("certification.expired").is_some());
        assert!(engine.publisher().last("certification.expiring_soon").is_some());

        // a second sweep changes nothing
        assert_eq!(engine.update_certification_status(&t).unwrap(), 0);
    }

    #[test]
    fn test_list_sorted_by_expiry_with_window() {
        let mut engine = engine();
        let t = tenant("acme");
        let late = active(&mut engine, 300);
        let early = active(&mut engine, 20);

        let all = engine
            .list_certifications(&t, &CertificationFilter::default())
            .unwrap();
        assert_eq!(all[0].id, early.id);
        assert_eq!(all[1].id, late.id);

        let window = engine
            .list_certifications(
                &t,
                &CertificationFilter {
                    expiring_within_days: Some(30),
                    ..CertificationFilter::default()
                },
            )
            .unwrap();
        assert_eq!(window.len(), 1);
        assert_eq!(
            engine
                .find_certification_by_number(&t, &late.certification_number)
                .unwrap()
                .id,
            late.id
        );
    }
}
