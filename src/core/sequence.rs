//! Human-readable per-tenant record numbers (e.g. `NCR-2026-000007`)

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::core::error::QualityResult;
use crate::core::identity::TenantId;
use crate::entities::document::DocumentType;

/// Record families that draw numbers from their own counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceKind {
    Ncr,
    Capa,
    Inspection,
    Certification,
    SupplierAudit,
    /// Controlled documents count separately per document type
    Document(DocumentType),
}

impl SequenceKind {
    /// Prefix printed in front of the counter
    pub fn prefix(&self) -> &'static str {
        match self {
            SequenceKind::Ncr => "NCR",
            SequenceKind::Capa => "CAPA",
            SequenceKind::Inspection => "QI",
            SequenceKind::Certification => "CERT",
            SequenceKind::SupplierAudit => "SA",
            SequenceKind::Document(doc_type) => doc_type.prefix(),
        }
    }

    /// Zero-padded width of the counter part
    pub fn width(&self) -> usize {
        match self {
            SequenceKind::Ncr | SequenceKind::Capa | SequenceKind::Inspection => 6,
            SequenceKind::Certification
            | SequenceKind::SupplierAudit
            | SequenceKind::Document(_) => 5,
        }
    }

    /// Whether the number carries the allocation year
    pub fn yearly(&self) -> bool {
        !matches!(self, SequenceKind::Document(_))
    }

    /// Storage key
    pub fn key(&self) -> String {
        match self {
            SequenceKind::Ncr => "ncr".to_string(),
            SequenceKind::Capa => "capa".to_string(),
            SequenceKind::Inspection => "inspection".to_string(),
            SequenceKind::Certification => "certification".to_string(),
            SequenceKind::SupplierAudit => "supplier_audit".to_string(),
            SequenceKind::Document(doc_type) => format!("document_{}", doc_type.as_str()),
        }
    }
}

/// Source of monotonically increasing counters, one per (tenant, kind)
pub trait SequenceGenerator {
    /// Increment and return the counter. The first value for a pair is 1.
    fn next_value(&mut self, tenant: &TenantId, kind: SequenceKind) -> QualityResult<u64>;
}

/// Format `<PREFIX>-<year>-<counter>`, or `<PREFIX>-<counter>` for kinds without a year
pub fn format_number(kind: SequenceKind, year: i32, value: u64) -> String {
    if kind.yearly() {
        format!(
            "{}-{}-{:0width$}",
            kind.prefix(),
            year,
            value,
            width = kind.width()
        )
    } else {
        format!("{}-{:0width$}", kind.prefix(), value, width = kind.width())
    }
}

/// Allocate the next number for a tenant.
///
/// The year comes from `now`; the counter itself never resets when the year rolls over.
pub fn next_number<S>(
    sequences: &mut S,
    tenant: &TenantId,
    kind: SequenceKind,
    now: DateTime<Utc>,
) -> QualityResult<String>
where
    S: SequenceGenerator + ?Sized,
{
    let value = sequences.next_value(tenant, kind)?;
    Ok(format_number(kind, now.year(), value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    #[derive(Default)]
    struct Counters(HashMap<(TenantId, SequenceKind), u64>);

    impl SequenceGenerator for Counters {
        fn next_value(&mut self, tenant: &TenantId, kind: SequenceKind) -> QualityResult<u64> {
            let slot = self.0.entry((tenant.clone(), kind)).or_insert(0);
            *slot += 1;
            Ok(*slot)
        }
    }

    #[test]
    fn test_format_number() {
        insta::assert_snapshot!(format_number(SequenceKind::Ncr, 2024, 7), @"NCR-2024-000007");
        insta::assert_snapshot!(format_number(SequenceKind::Capa, 2026, 123456), @"CAPA-2026-123456");
        insta::assert_snapshot!(format_number(SequenceKind::Inspection, 2026, 12), @"QI-2026-000012");
        insta::assert_snapshot!(format_number(SequenceKind::Certification, 2026, 3), @"CERT-2026-00003");
        insta::assert_snapshot!(format_number(SequenceKind::SupplierAudit, 2026, 41), @"SA-2026-00041");
    }

    #[test]
    fn test_document_numbers_have_no_year() {
        let kind = SequenceKind::Document(DocumentType::WorkInstruction);
        insta::assert_snapshot!(format_number(kind, 2026, 7), @"WI-00007");
        assert_eq!(kind.key(), "document_work_instruction");
    }

    #[test]
    fn test_counter_survives_year_rollover() {
        let tenant = TenantId::new("acme").unwrap();
        let mut counters = Counters::default();
        let dec = Utc.with_ymd_and_hms(2025, 12, 31, 23, 0, 0).unwrap();
        let jan = Utc.with_ymd_and_hms(2026, 1, 1, 1, 0, 0).unwrap();

        let first = next_number(&mut counters, &tenant, SequenceKind::Ncr, dec).unwrap();
        let second = next_number(&mut counters, &tenant, SequenceKind::Ncr, jan).unwrap();

        assert_eq!(first, "NCR-2025-000001");
        assert_eq!(second, "NCR-2026-000002");
    }

    #[test]
    fn test_kinds_and_tenants_are_independent() {
        let a = TenantId::new("a").unwrap();
        let b = TenantId::new("b").unwrap();
        let mut counters = Counters::default();

        assert_eq!(counters.next_value(&a, SequenceKind::Ncr).unwrap(), 1);
        assert_eq!(counters.next_value(&a, SequenceKind::Ncr).unwrap(), 2);
        assert_eq!(counters.next_value(&a, SequenceKind::Capa).unwrap(), 1);
        assert_eq!(counters.next_value(&b, SequenceKind::Ncr).unwrap(), 1);

        let procedure = SequenceKind::Document(DocumentType::Procedure);
        let form = SequenceKind::Document(DocumentType::Form);
        assert_eq!(counters.next_value(&a, procedure).unwrap(), 1);
        assert_eq!(counters.next_value(&a, form).unwrap(), 1);
        assert_eq!(counters.next_value(&a, procedure).unwrap(), 2);
    }
}
