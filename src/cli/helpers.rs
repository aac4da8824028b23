//! Shared helper functions for CLI commands
//!
//! Every command opens a [`Session`]: the discovered project, its merged
//! config, the tenant to act as and an engine over the project database.
//! References typed by the user are resolved here, so each command accepts
//! either a full id (`NCR-01J...`) or a human number (`NCR-2026-000007`).

use chrono::{DateTime, NaiveDate, Utc};
use miette::{IntoDiagnostic, Result};

use crate::cli::GlobalOpts;
use crate::core::identity::{EntityId, EntityPrefix, TenantId};
use crate::core::project::Project;
use crate::core::{Config, SqliteStore};
use crate::entities::{
    Capa, Certification, Inspection, Ncr, QualityChecklist, QualityDocument, SupplierQualification,
};
use crate::quality::{DateRange, QualityEngine};

/// Everything a command needs to talk to the engine
pub struct Session {
    pub project: Project,
    pub config: Config,
    pub tenant: TenantId,
    pub engine: QualityEngine<SqliteStore>,
    actor: Option<String>,
}

impl Session {
    /// Discover the project, merge config and open its database
    pub fn open(global: &GlobalOpts) -> Result<Self> {
        let project = match global.project {
            Some(ref root) => Project::discover_from(root),
            None => Project::discover(),
        }
        .map_err(|e| miette::miette!("{}", e))?;

        let config = Config::load_for(Some(&project));
        let tenant_name = global.tenant.clone().unwrap_or_else(|| config.tenant());
        let tenant = TenantId::new(tenant_name).map_err(|e| miette::miette!("{}", e))?;

        let store = SqliteStore::open(&project.database_path())?;
        tracing::debug!(
            root = %project.root().display(),
            tenant = %tenant,
            "opened project"
        );

        Ok(Self {
            project,
            config,
            tenant,
            engine: QualityEngine::new(store),
            actor: global.actor.clone(),
        })
    }

    /// Name recorded on a transition: explicit flag, then `--as`, then config
    pub fn actor(&self, explicit: Option<String>) -> String {
        explicit
            .or_else(|| self.actor.clone())
            .unwrap_or_else(|| self.config.author())
    }

    /// Resolve an NCR id or number within the session tenant
    pub fn resolve_ncr(&self, reference: &str) -> Result<Ncr> {
        let ncr = match parse_id(reference, EntityPrefix::Ncr) {
            Some(id) => self.engine.get_ncr(&self.tenant, &id)?,
            None => self.engine.find_ncr_by_number(&self.tenant, reference)?,
        };
        Ok(ncr)
    }

    /// Resolve a CAPA id or number within the session tenant
    pub fn resolve_capa(&self, reference: &str) -> Result<Capa> {
        let capa = match parse_id(reference, EntityPrefix::Capa) {
            Some(id) => self.engine.get_capa(&self.tenant, &id)?,
            None => self.engine.find_capa_by_number(&self.tenant, reference)?,
        };
        Ok(capa)
    }

    /// Resolve a qualification by its id or by the external supplier id
    pub fn resolve_supplier(&self, reference: &str) -> Result<SupplierQualification> {
        if let Some(id) = parse_id(reference, EntityPrefix::Sq) {
            return Ok(self.engine.get_supplier_qualification(&self.tenant, &id)?);
        }
        self.engine
            .find_by_supplier(&self.tenant, reference)?
            .ok_or_else(|| miette::miette!("No supplier qualification found for '{}'", reference))
    }

    /// Resolve an inspection id or number (QI-2026-000001)
    pub fn resolve_inspection(&self, reference: &str) -> Result<Inspection> {
        let insp = match parse_id(reference, EntityPrefix::Qi) {
            Some(id) => self.engine.get_inspection(&self.tenant, &id)?,
            None => self.engine.find_inspection_by_number(&self.tenant, reference)?,
        };
        Ok(insp)
    }

    /// Resolve a checklist by id or code
    pub fn resolve_checklist(&self, reference: &str) -> Result<QualityChecklist> {
        let checklist = match parse_id(reference, EntityPrefix::Qcl) {
            Some(id) => self.engine.get_checklist(&self.tenant, &id)?,
            None => self.engine.find_checklist_by_code(&self.tenant, reference)?,
        };
        Ok(checklist)
    }

    /// Resolve a certification id or number (CERT-2026-00001)
    pub fn resolve_certification(&self, reference: &str) -> Result<Certification> {
        let cert = match parse_id(reference, EntityPrefix::Cert) {
            Some(id) => self.engine.get_certification(&self.tenant, &id)?,
            None => self
                .engine
                .find_certification_by_number(&self.tenant, reference)?,
        };
        Ok(cert)
    }

    /// Resolve a document id or number (WI-00007)
    pub fn resolve_document(&self, reference: &str) -> Result<QualityDocument> {
        let doc = match parse_id(reference, EntityPrefix::Doc) {
            Some(id) => self.engine.get_document(&self.tenant, &id)?,
            None => self.engine.find_document_by_number(&self.tenant, reference)?,
        };
        Ok(doc)
    }
}

/// Parse `reference` as an id of the given kind, `None` when it is something else
pub fn parse_id(reference: &str, prefix: EntityPrefix) -> Option<EntityId> {
    EntityId::parse(reference.trim())
        .ok()
        .filter(|id| id.prefix() == prefix)
}

/// Find an action inside a CAPA by id or by number (`CA-1`, `PA-2`)
pub fn resolve_action(capa: &Capa, reference: &str) -> Result<EntityId> {
    let found = match parse_id(reference, EntityPrefix::Act) {
        Some(id) => capa.find_action(&id),
        None => capa
            .actions()
            .find(|a| a.action_number.eq_ignore_ascii_case(reference.trim())),
    };
    found
        .map(|a| a.id.clone())
        .ok_or_else(|| miette::miette!("Action {} not found on {}", reference, capa.capa_number))
}

/// Find a containment action by id or by 1-based position
pub fn resolve_containment(ncr: &Ncr, reference: &str) -> Result<EntityId> {
    let found = match parse_id(reference, EntityPrefix::Cnt) {
        Some(id) => ncr.containment_actions.iter().find(|c| c.id == id),
        None => reference
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| ncr.containment_actions.get(i)),
    };
    found.map(|c| c.id.clone()).ok_or_else(|| {
        miette::miette!(
            "Containment action {} not found on {}",
            reference,
            ncr.ncr_number
        )
    })
}

/// Parse a date given as `YYYY-MM-DD` (midnight UTC) or RFC 3339
pub fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return date
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .ok_or_else(|| miette::miette!("Invalid date: {}", s));
    }
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| miette::miette!("Invalid date: {}. Use YYYY-MM-DD or RFC 3339", s))
}

/// Reporting window shared by the `metrics` subcommands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct RangeArgs {
    /// Only count records created in the last N days
    #[arg(long, conflicts_with = "from")]
    pub days: Option<i64>,

    /// Window start (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Window end (YYYY-MM-DD, inclusive instant)
    #[arg(long)]
    pub to: Option<String>,
}

impl RangeArgs {
    pub fn range(&self) -> Result<DateRange> {
        let mut range = match self.days {
            Some(days) => DateRange::last_days(days, Utc::now()),
            None => DateRange::all_time(),
        };
        if let Some(ref from) = self.from {
            range.from = parse_date(from)?;
        }
        if let Some(ref to) = self.to {
            range.to = parse_date(to)?;
        }
        Ok(range)
    }
}

/// Ask before an irreversible change
pub fn confirm(prompt: &str) -> Result<bool> {
    use dialoguer::{theme::ColorfulTheme, Confirm};

    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Parse an enum value through its `FromStr`, turning the message into a diagnostic
pub fn parse_enum<T>(s: &str) -> Result<T>
where
    T: std::str::FromStr<Err = String>,
{
    s.parse::<T>().map_err(|e| miette::miette!("{}", e))
}

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

pub fn format_date(at: Option<DateTime<Utc>>) -> String {
    at.map(|dt| dt.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Ncr);
        let formatted = format_short_id(&id);
        assert!(formatted.len() <= 16);
        assert!(formatted.starts_with("NCR-"));
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("çalışma izni", 6), "çal...");
    }

    #[test]
    fn test_parse_id_checks_prefix() {
        let id = EntityId::new(EntityPrefix::Capa);
        assert_eq!(parse_id(&id.to_string(), EntityPrefix::Capa), Some(id.clone()));
        assert_eq!(parse_id(&id.to_string(), EntityPrefix::Ncr), None);
        assert_eq!(parse_id("NCR-2026-000007", EntityPrefix::Ncr), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let day = parse_date("2026-03-15").unwrap();
        assert_eq!((day.year(), day.month(), day.day(), day.hour()), (2026, 3, 15, 0));

        let stamp = parse_date("2026-03-15T10:30:00+02:00").unwrap();
        assert_eq!(stamp.hour(), 8);

        assert!(parse_date("15/03/2026").is_err());
    }

    #[test]
    fn test_range_args() {
        let all = RangeArgs::default().range().unwrap();
        assert_eq!(all, DateRange::all_time());

        let bounded = RangeArgs {
            from: Some("2026-01-01".to_string()),
            to: Some("2026-02-01".to_string()),
            ..RangeArgs::default()
        }
        .range()
        .unwrap();
        assert!(bounded.contains(parse_date("2026-01-15").unwrap()));
        assert!(!bounded.contains(parse_date("2026-03-01").unwrap()));
    }

    #[test]
    fn test_format_date_placeholder() {
        assert_eq!(format_date(None), "-");
    }
}
