//! `qms sup` command - Supplier qualification management

use chrono::{Duration, Utc};
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, format_date, format_short_id, parse_date, parse_enum, parse_id, truncate_str,
    Session,
};
use crate::cli::output::{
    print_breakdown, print_field, print_heading, print_list, print_metrics, print_outcome,
    print_record, Tabular,
};
use crate::cli::GlobalOpts;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::supplier::{
    AddApprovedCategory, AddSupplierCertificate, CompleteAudit, CreateEvaluation,
    CreateSupplierQualification, EvaluationCriterion, FindingInput, FindingSeverity,
    QualifySupplier, RecordPerformance, RiskLevel, ScheduleAudit,
};
use crate::entities::SupplierQualification;
use crate::quality::{SupplierFilter, SupplierMetrics};

#[derive(Subcommand, Debug)]
pub enum SupCommands {
    /// List supplier qualifications
    List(ListArgs),

    /// Start tracking a supplier's qualification (pending)
    New(NewArgs),

    /// Show a qualification's details
    Show(IdArgs),

    /// Begin evaluating a pending supplier
    Evaluate(IdArgs),

    /// Qualify a supplier, conditionally when conditions are given
    Qualify(QualifyArgs),

    /// Put a supplier on hold
    Hold(ReasonArgs),

    /// Disqualify a supplier
    Disqualify(DisqualifyArgs),

    /// Change the supplier risk level
    Risk(RiskArgs),

    /// Record an NCR against the supplier
    LinkNcr(LinkArgs),

    /// Record a CAPA against the supplier
    LinkCapa(LinkArgs),

    /// Approved supply categories
    #[command(subcommand)]
    Category(CategoryCommands),

    /// Certificates submitted by the supplier
    #[command(subcommand)]
    Certificate(CertificateCommands),

    /// Score the supplier against evaluation criteria
    Score(ScoreArgs),

    /// Supplier audits
    #[command(subcommand)]
    Audit(AuditCommands),

    /// Record delivery performance for a period
    Performance(PerformanceArgs),

    /// Supplier qualification metrics
    Metrics,
}

#[derive(Subcommand, Debug)]
pub enum CategoryCommands {
    /// Approve the supplier for a category
    Add(CategoryAddArgs),

    /// Withdraw a category approval
    Remove(CategoryRemoveArgs),
}

#[derive(Subcommand, Debug)]
pub enum CertificateCommands {
    /// Attach a certificate (unverified)
    Add(CertificateAddArgs),

    /// Mark a certificate as verified
    Verify(CertificateVerifyArgs),
}

#[derive(Subcommand, Debug)]
pub enum AuditCommands {
    /// Schedule an audit
    Schedule(AuditScheduleArgs),

    /// Start a scheduled audit
    Start(AuditRefArgs),

    /// Close an audit with its result; a failed audit puts the supplier on hold
    Complete(AuditCompleteArgs),

    /// Cancel an audit that has not completed
    Cancel(AuditCancelArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Qualification ID (SQ-...) or supplier ID
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by risk level
    #[arg(long, short = 'r')]
    pub risk: Option<String>,

    /// Show only qualifications expiring within N days
    #[arg(long)]
    pub expiring: Option<i64>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// External supplier ID
    #[arg(long)]
    pub supplier: String,

    /// Supplier name
    #[arg(long, short = 'N')]
    pub name: String,

    /// Short supplier code
    #[arg(long, short = 'c', default_value = "")]
    pub code: String,

    /// Initial risk level (low, medium, high, critical)
    #[arg(long, short = 'r')]
    pub risk: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct QualifyArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Expiration date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: Option<String>,

    /// Condition attached to the qualification (repeatable)
    #[arg(long = "condition")]
    pub conditions: Vec<String>,

    /// Who qualified the supplier (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReasonArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,
}

#[derive(clap::Args, Debug)]
pub struct DisqualifyArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct RiskArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// New risk level (low, medium, high, critical)
    pub level: String,
}

#[derive(clap::Args, Debug)]
pub struct LinkArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// NCR or CAPA ID or number
    pub target: String,
}

#[derive(clap::Args, Debug)]
pub struct CategoryAddArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Category ID
    pub category: String,

    /// Category name
    #[arg(long, short = 'N', default_value = "")]
    pub name: String,

    /// Specifications the supplier must meet
    #[arg(long)]
    pub specifications: Option<String>,

    /// Restrictions on the approval
    #[arg(long)]
    pub restrictions: Option<String>,

    /// Approver (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CategoryRemoveArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Category ID
    pub category: String,
}

#[derive(clap::Args, Debug)]
pub struct CertificateAddArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Certification type (e.g., iso_9001)
    #[arg(long = "type", short = 'T')]
    pub certification_type: String,

    /// Certificate number
    #[arg(long)]
    pub number: String,

    /// Issuing body
    #[arg(long)]
    pub issuer: String,

    /// Issue date (YYYY-MM-DD)
    #[arg(long)]
    pub issued: String,

    /// Expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: String,
}

#[derive(clap::Args, Debug)]
pub struct CertificateVerifyArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Certificate ID (SCERT-...) or certificate number
    pub certificate: String,

    /// Verifier (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ScoreArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Period label (e.g., 2026-Q3)
    #[arg(long)]
    pub period: String,

    /// Score as CRITERION=VALUE, 0-100 (repeatable)
    #[arg(long = "score", required = true)]
    pub scores: Vec<String>,

    /// Comments
    #[arg(long)]
    pub comments: Option<String>,

    /// Evaluator (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AuditScheduleArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Audit type (initial, periodic, special, follow_up, surveillance)
    #[arg(long = "type", short = 'T', default_value = "periodic")]
    pub audit_type: String,

    /// Scheduled date (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// Lead auditor (default: --as or configured author)
    #[arg(long)]
    pub auditor: Option<String>,

    /// Audit scope
    #[arg(long, default_value = "")]
    pub scope: String,
}

#[derive(clap::Args, Debug)]
pub struct AuditRefArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Audit ID (SA-...) or audit number
    pub audit: String,
}

#[derive(clap::Args, Debug)]
pub struct AuditCompleteArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Audit ID or audit number
    pub audit: String,

    /// Result (pass, conditional, fail)
    #[arg(long, short = 'r')]
    pub result: String,

    /// Audit score
    #[arg(long)]
    pub score: Option<f64>,

    /// Finding, as SEVERITY:DESCRIPTION (repeatable)
    #[arg(long = "finding")]
    pub findings: Vec<String>,

    /// A CAPA is required
    #[arg(long)]
    pub capa_required: bool,

    /// Date the audit took place (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AuditCancelArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Audit ID or audit number
    pub audit: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,
}

#[derive(clap::Args, Debug)]
pub struct PerformanceArgs {
    /// Qualification ID or supplier ID
    pub id: String,

    /// Period label (e.g., 2026-09)
    #[arg(long)]
    pub period: String,

    /// Orders delivered
    #[arg(long)]
    pub orders: u32,

    /// Orders with defects
    #[arg(long, default_value_t = 0)]
    pub defects: u32,

    /// Late deliveries
    #[arg(long, default_value_t = 0)]
    pub late: u32,

    /// Returned orders
    #[arg(long, default_value_t = 0)]
    pub returns: u32,
}

/// Run a supplier subcommand
pub fn run(cmd: SupCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        SupCommands::List(args) => run_list(&session, args, global),
        SupCommands::New(args) => run_new(&mut session, args, global),
        SupCommands::Show(args) => run_show(&session, args, global),
        SupCommands::Evaluate(args) => run_evaluate(&mut session, args, global),
        SupCommands::Qualify(args) => run_qualify(&mut session, args, global),
        SupCommands::Hold(args) => run_hold(&mut session, args, global),
        SupCommands::Disqualify(args) => run_disqualify(&mut session, args, global),
        SupCommands::Risk(args) => run_risk(&mut session, args, global),
        SupCommands::LinkNcr(args) => run_link_ncr(&mut session, args, global),
        SupCommands::LinkCapa(args) => run_link_capa(&mut session, args, global),
        SupCommands::Category(cmd) => run_category(&mut session, cmd, global),
        SupCommands::Certificate(cmd) => run_certificate(&mut session, cmd, global),
        SupCommands::Score(args) => run_score(&mut session, args, global),
        SupCommands::Audit(cmd) => run_audit(&mut session, cmd, global),
        SupCommands::Performance(args) => run_performance(&mut session, args, global),
        SupCommands::Metrics => run_metrics(&session, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = SupplierFilter {
        status: args.status.as_deref().map(parse_enum).transpose()?,
        risk_level: args.risk.as_deref().map(parse_enum).transpose()?,
        expiring_before: args.expiring.map(|days| Utc::now() + Duration::days(days)),
    };

    let mut items = session
        .engine
        .list_supplier_qualifications(&session.tenant, &filter)?;
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }
    print_list(&items, global.format, "supplier(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    if session
        .engine
        .find_by_supplier(&session.tenant, &args.supplier)?
        .is_some()
    {
        return Err(miette::miette!(
            "Supplier {} already has a qualification record",
            args.supplier
        ));
    }

    let input = CreateSupplierQualification {
        supplier_id: args.supplier,
        supplier_code: args.code,
        supplier_name: args.name,
        risk_level: args.risk.as_deref().map(parse_enum).transpose()?,
        notes: args.notes,
    };
    let sq = session
        .engine
        .create_supplier_qualification(&session.tenant, input)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "Tracking {} ({})",
            style(&sq.supplier_name).yellow(),
            style(&sq.supplier_id).cyan()
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let sq = session.resolve_supplier(&args.id)?;
    print_record(&sq, global.format, print_detail)
}

fn run_evaluate(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let sq = session.engine.start_evaluation(&session.tenant, &id)?;
    print_outcome(&sq, global, &transition_message(&sq))
}

fn run_qualify(session: &mut Session, args: QualifyArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let input = QualifySupplier {
        qualified_by: session.actor(args.by),
        expiration_date: args.expires.as_deref().map(parse_date).transpose()?,
        conditions: args.conditions,
    };
    let sq = session.engine.qualify_supplier(&session.tenant, &id, input)?;
    print_outcome(&sq, global, &transition_message(&sq))
}

fn run_hold(session: &mut Session, args: ReasonArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let sq = session
        .engine
        .put_supplier_on_hold(&session.tenant, &id, &args.reason)?;
    print_outcome(&sq, global, &transition_message(&sq))
}

fn run_disqualify(session: &mut Session, args: DisqualifyArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_supplier(&args.id)?;

    if !args.yes && !confirm(&format!("Disqualify {}?", current.supplier_name))? {
        println!("Cancelled.");
        return Ok(());
    }

    let sq = session
        .engine
        .disqualify_supplier(&session.tenant, &current.id, &args.reason)?;
    print_outcome(&sq, global, &transition_message(&sq))
}

fn run_risk(session: &mut Session, args: RiskArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let level: RiskLevel = parse_enum(&args.level)?;
    let sq = session
        .engine
        .set_supplier_risk_level(&session.tenant, &id, level)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "{} risk level is now {}",
            style(&sq.supplier_id).cyan(),
            style(sq.risk_level).yellow()
        ),
    )
}

fn run_link_ncr(session: &mut Session, args: LinkArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let ncr = session.resolve_ncr(&args.target)?;
    let sq = session
        .engine
        .link_ncr_to_supplier(&session.tenant, &id, &ncr.id)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "Linked {} to {} ({} NCR(s))",
            style(&ncr.ncr_number).cyan(),
            style(&sq.supplier_id).cyan(),
            sq.active_ncr_count
        ),
    )
}

fn run_link_capa(session: &mut Session, args: LinkArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let capa = session.resolve_capa(&args.target)?;
    let sq = session
        .engine
        .link_capa_to_supplier(&session.tenant, &id, &capa.id)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "Linked {} to {} ({} CAPA(s))",
            style(&capa.capa_number).cyan(),
            style(&sq.supplier_id).cyan(),
            sq.active_capa_count
        ),
    )
}

fn run_category(session: &mut Session, cmd: CategoryCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CategoryCommands::Add(args) => {
            let id = session.resolve_supplier(&args.id)?.id;
            let input = AddApprovedCategory {
                category_name: if args.name.is_empty() {
                    args.category.clone()
                } else {
                    args.name
                },
                category_id: args.category,
                approved_by: session.actor(args.by),
                specifications: args.specifications,
                restrictions: args.restrictions,
            };
            let sq = session
                .engine
                .add_approved_category(&session.tenant, &id, input)?;
            print_outcome(
                &sq,
                global,
                &format!(
                    "{} is approved for {} categor(ies)",
                    style(&sq.supplier_id).cyan(),
                    sq.approved_categories.len()
                ),
            )
        }
        CategoryCommands::Remove(args) => {
            let id = session.resolve_supplier(&args.id)?.id;
            let sq = session
                .engine
                .remove_approved_category(&session.tenant, &id, &args.category)?;
            print_outcome(
                &sq,
                global,
                &format!(
                    "{} is approved for {} categor(ies)",
                    style(&sq.supplier_id).cyan(),
                    sq.approved_categories.len()
                ),
            )
        }
    }
}

fn run_certificate(
    session: &mut Session,
    cmd: CertificateCommands,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        CertificateCommands::Add(args) => {
            let id = session.resolve_supplier(&args.id)?.id;
            let input = AddSupplierCertificate {
                certification_type: args.certification_type,
                certificate_number: args.number,
                issuing_body: args.issuer,
                issue_date: parse_date(&args.issued)?,
                expiry_date: parse_date(&args.expires)?,
            };
            let sq = session
                .engine
                .add_supplier_certificate(&session.tenant, &id, input)?;
            print_outcome(
                &sq,
                global,
                &format!(
                    "Added certificate to {} ({} on file)",
                    style(&sq.supplier_id).cyan(),
                    sq.certifications.len()
                ),
            )
        }
        CertificateCommands::Verify(args) => {
            let current = session.resolve_supplier(&args.id)?;
            let certificate_id = resolve_certificate(&current, &args.certificate)?;
            let by = session.actor(args.by);
            let sq = session.engine.verify_supplier_certificate(
                &session.tenant,
                &current.id,
                &certificate_id,
                &by,
            )?;
            print_outcome(
                &sq,
                global,
                &format!("Verified certificate {}", style(&args.certificate).cyan()),
            )
        }
    }
}

fn run_score(session: &mut Session, args: ScoreArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let input = CreateEvaluation {
        evaluated_by: session.actor(args.by),
        period: args.period,
        scores: args
            .scores
            .iter()
            .map(|raw| parse_score(raw))
            .collect::<Result<_>>()?,
        comments: args.comments,
    };
    let sq = session
        .engine
        .create_supplier_evaluation(&session.tenant, &id, input)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "{} scored {:.1}",
            style(&sq.supplier_id).cyan(),
            sq.overall_score
        ),
    )
}

fn run_audit(session: &mut Session, cmd: AuditCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        AuditCommands::Schedule(args) => {
            let id = session.resolve_supplier(&args.id)?.id;
            let input = ScheduleAudit {
                audit_type: parse_enum(&args.audit_type)?,
                scheduled_date: parse_date(&args.date)?,
                auditor: session.actor(args.auditor),
                scope: args.scope,
            };
            let sq = session
                .engine
                .schedule_supplier_audit(&session.tenant, &id, input)?;
            let number = sq
                .audits
                .last()
                .map(|a| a.audit_number.clone())
                .unwrap_or_default();
            print_outcome(
                &sq,
                global,
                &format!(
                    "Scheduled {} for {} on {}",
                    style(number).cyan(),
                    style(&sq.supplier_id).cyan(),
                    format_date(sq.next_audit_date)
                ),
            )
        }
        AuditCommands::Start(args) => {
            let current = session.resolve_supplier(&args.id)?;
            let audit_id = resolve_audit(&current, &args.audit)?;
            let sq = session
                .engine
                .start_supplier_audit(&session.tenant, &current.id, &audit_id)?;
            print_outcome(&sq, global, &audit_message(&sq, &audit_id))
        }
        AuditCommands::Complete(args) => {
            let current = session.resolve_supplier(&args.id)?;
            let audit_id = resolve_audit(&current, &args.audit)?;
            let input = CompleteAudit {
                actual_date: match args.date {
                    Some(ref date) => parse_date(date)?,
                    None => Utc::now(),
                },
                result: parse_enum(&args.result)?,
                score: args.score,
                findings: args
                    .findings
                    .iter()
                    .map(|raw| parse_finding(raw))
                    .collect::<Result<_>>()?,
                capa_required: args.capa_required,
                notes: args.notes,
            };
            let sq = session.engine.complete_supplier_audit(
                &session.tenant,
                &current.id,
                &audit_id,
                input,
            )?;
            print_outcome(
                &sq,
                global,
                &format!(
                    "{}; supplier is {}",
                    audit_message(&sq, &audit_id),
                    style(sq.status).yellow()
                ),
            )
        }
        AuditCommands::Cancel(args) => {
            let current = session.resolve_supplier(&args.id)?;
            let audit_id = resolve_audit(&current, &args.audit)?;
            let sq = session.engine.cancel_supplier_audit(
                &session.tenant,
                &current.id,
                &audit_id,
                &args.reason,
            )?;
            print_outcome(&sq, global, &audit_message(&sq, &audit_id))
        }
    }
}

fn run_performance(session: &mut Session, args: PerformanceArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_supplier(&args.id)?.id;
    let input = RecordPerformance {
        period: args.period,
        orders_count: args.orders,
        defects_count: args.defects,
        late_deliveries_count: args.late,
        returns_count: args.returns,
    };
    let sq = session
        .engine
        .record_supplier_performance(&session.tenant, &id, input)?;
    print_outcome(
        &sq,
        global,
        &format!(
            "{} quality {:.1}%, on time {:.1}%, risk {}",
            style(&sq.supplier_id).cyan(),
            sq.performance.quality_rate,
            sq.performance.on_time_delivery_rate,
            style(sq.risk_level).yellow()
        ),
    )
}

/// Find an audit by id or by audit number
fn resolve_audit(sq: &SupplierQualification, reference: &str) -> Result<EntityId> {
    let found = match parse_id(reference, EntityPrefix::Sa) {
        Some(id) => sq.audits.iter().find(|a| a.id == id),
        None => sq
            .audits
            .iter()
            .find(|a| a.audit_number.eq_ignore_ascii_case(reference.trim())),
    };
    found
        .map(|a| a.id.clone())
        .ok_or_else(|| miette::miette!("Audit {} not found on {}", reference, sq.supplier_id))
}

/// Find a certificate by id or by certificate number
fn resolve_certificate(sq: &SupplierQualification, reference: &str) -> Result<EntityId> {
    let found = match parse_id(reference, EntityPrefix::Scert) {
        Some(id) => sq.certifications.iter().find(|c| c.id == id),
        None => sq
            .certifications
            .iter()
            .find(|c| c.certificate_number.eq_ignore_ascii_case(reference.trim())),
    };
    found.map(|c| c.id.clone()).ok_or_else(|| {
        miette::miette!("Certificate {} not found on {}", reference, sq.supplier_id)
    })
}

/// `quality=92.5`
fn parse_score(raw: &str) -> Result<(EvaluationCriterion, f64)> {
    let (criterion, value) = raw
        .split_once('=')
        .ok_or_else(|| miette::miette!("Score must look like CRITERION=VALUE: '{}'", raw))?;
    let value: f64 = value
        .trim()
        .parse()
        .map_err(|_| miette::miette!("Invalid score value: '{}'", value))?;
    Ok((parse_enum(criterion.trim())?, value))
}

/// `major:Calibration overdue`; without a known severity prefix the finding is an observation
fn parse_finding(raw: &str) -> Result<FindingInput> {
    let (severity, description) = match raw.split_once(':') {
        Some((prefix, rest)) => match prefix.trim().parse::<FindingSeverity>() {
            Ok(severity) => (severity, rest.trim()),
            Err(_) => (FindingSeverity::default(), raw.trim()),
        },
        None => (FindingSeverity::default(), raw.trim()),
    };
    if description.is_empty() {
        return Err(miette::miette!("Finding needs a description: '{}'", raw));
    }
    Ok(FindingInput {
        severity,
        description: description.to_string(),
        clause: None,
        corrective_action_required: false,
    })
}

fn audit_message(sq: &SupplierQualification, audit_id: &EntityId) -> String {
    match sq.audits.iter().find(|a| &a.id == audit_id) {
        Some(audit) => format!(
            "{} is now {}",
            style(&audit.audit_number).cyan(),
            style(audit.status).yellow()
        ),
        None => format!("Updated {}", style(&sq.supplier_id).cyan()),
    }
}

fn run_metrics(session: &Session, global: &GlobalOpts) -> Result<()> {
    let metrics = session.engine.supplier_metrics(&session.tenant)?;
    print_metrics(&metrics, global.format, print_metrics_summary)
}

fn transition_message(sq: &SupplierQualification) -> String {
    format!(
        "{} ({}) is now {}",
        style(&sq.supplier_name).yellow(),
        style(&sq.supplier_id).cyan(),
        style(sq.status).yellow()
    )
}

impl Tabular for SupplierQualification {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "SUPPLIER", "CODE", "NAME", "STATUS", "RISK", "EXPIRES", "NCRS", "CAPAS",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.supplier_id.clone(),
            self.supplier_code.clone(),
            self.supplier_name.clone(),
            self.status.to_string(),
            self.risk_level.to_string(),
            self.expiration_date
                .map(|d| d.to_rfc3339())
                .unwrap_or_default(),
            self.active_ncr_count.to_string(),
            self.active_capa_count.to_string(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.supplier_id.clone(),
            self.supplier_code.clone(),
            truncate_str(&self.supplier_name, 30),
            self.status.to_string(),
            self.risk_level.to_string(),
            format_date(self.expiration_date),
            self.active_ncr_count.to_string(),
            self.active_capa_count.to_string(),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(sq: &SupplierQualification) {
    print_heading(&format!("{}  {}", sq.supplier_id, sq.supplier_name));
    print_field("ID", sq.id.to_string());
    print_field("Code", &sq.supplier_code);
    print_field("Status", sq.status.to_string());
    print_field("Risk level", sq.risk_level.to_string());
    print_field("Qualified", format_date(sq.qualification_date));
    if let Some(ref by) = sq.qualified_by {
        print_field("Qualified by", by);
    }
    print_field("Expires", format_date(sq.expiration_date));
    if !sq.conditions.is_empty() {
        println!("{}", style("Conditions").bold());
        for condition in &sq.conditions {
            println!("  - {}", condition);
        }
    }
    if let Some(ref reason) = sq.hold_reason {
        print_field("Hold reason", reason);
    }
    if let Some(ref reason) = sq.disqualification_reason {
        print_field("Disqualified", reason);
    }
    print_field("Linked NCRs", sq.active_ncr_count.to_string());
    print_field("Linked CAPAs", sq.active_capa_count.to_string());
    if !sq.evaluations.is_empty() {
        print_field("Score", format!("{:.1}", sq.overall_score));
    }
    if sq.performance.total_orders > 0 {
        print_field(
            "Performance",
            format!(
                "{:.1}% quality, {:.1}% on time over {} order(s)",
                sq.performance.quality_rate,
                sq.performance.on_time_delivery_rate,
                sq.performance.total_orders
            ),
        );
    }
    print_field("Last audit", format_date(sq.last_audit_date));
    print_field("Next audit", format_date(sq.next_audit_date));
    if !sq.approved_categories.is_empty() {
        println!("{}", style("Approved categories").bold());
        for category in &sq.approved_categories {
            println!("  - {} {}", category.category_id, category.category_name);
        }
    }
    if !sq.certifications.is_empty() {
        println!("{}", style("Certificates").bold());
        for cert in &sq.certifications {
            println!(
                "  - {} {} expires {}{}",
                cert.certification_type,
                cert.certificate_number,
                format_date(Some(cert.expiry_date)),
                if cert.verified { " (verified)" } else { "" }
            );
        }
    }
    if !sq.audits.is_empty() {
        println!("{}", style("Audits").bold());
        for audit in &sq.audits {
            println!(
                "  - {} {} {} {}",
                audit.audit_number,
                audit.audit_type,
                format_date(Some(audit.scheduled_date)),
                audit.status
            );
        }
    }
}

fn print_metrics_summary(metrics: &SupplierMetrics) {
    print_heading("Supplier metrics");
    print_field("Total", metrics.total.to_string());
    print_field("Expiring soon", metrics.expiring_soon.to_string());
    print_field("NCR links", metrics.active_ncr_links.to_string());
    print_field("CAPA links", metrics.active_capa_links.to_string());
    print_field("Audits due", metrics.suppliers_requiring_audit.to_string());
    print_field("Average score", format!("{:.1}", metrics.average_score));
    print_field(
        "Avg quality rate",
        format!("{:.1}%", metrics.average_quality_rate),
    );
    print_field(
        "Avg on-time rate",
        format!("{:.1}%", metrics.average_on_time_delivery),
    );
    println!();
    print_breakdown("By status", &metrics.by_status);
    print_breakdown("By risk level", &metrics.by_risk_level);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_score() {
        let (criterion, value) = parse_score("Quality = 92.5").unwrap();
        assert_eq!(criterion, EvaluationCriterion::Quality);
        assert_eq!(value, 92.5);
        assert!(parse_score("quality").is_err());
        assert!(parse_score("taste=80").is_err());
        assert!(parse_score("delivery=high").is_err());
    }

    #[test]
    fn test_parse_finding() {
        let major = parse_finding("major: Calibration overdue").unwrap();
        assert_eq!(major.severity, FindingSeverity::Major);
        assert_eq!(major.description, "Calibration overdue");

        let plain = parse_finding("Clause 8.5: no traceability").unwrap();
        assert_eq!(plain.severity, FindingSeverity::Observation);
        assert_eq!(plain.description, "Clause 8.5: no traceability");

        assert!(parse_finding("minor:").is_err());
    }
}
