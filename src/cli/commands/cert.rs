//! `qms cert` command - Certification tracking

use chrono::Utc;
use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, format_date, format_short_id, parse_date, parse_enum, truncate_str, Session,
};
use crate::cli::output::{print_field, print_heading, print_list, print_outcome, print_record, Tabular};
use crate::cli::GlobalOpts;
use crate::entities::certification::{CreateCertification, RecordCertificationAudit};
use crate::entities::Certification;
use crate::quality::CertificationFilter;

#[derive(Subcommand, Debug)]
pub enum CertCommands {
    /// List certifications, soonest expiry first
    List(ListArgs),

    /// Register a certification (pending)
    New(NewArgs),

    /// Show a certification's details
    Show(IdArgs),

    /// Activate a pending certification
    Activate(IdArgs),

    /// Record an audit; a failed audit suspends the certification
    Audit(AuditArgs),

    /// Renew with a later expiry date
    Renew(RenewArgs),

    /// Suspend a certification
    Suspend(ReasonArgs),

    /// Withdraw a certification for good
    Withdraw(WithdrawArgs),

    /// Move certifications to expiring_soon or expired by date
    Sweep,
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Certification ID or number (CERT-2026-00001)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by certification type
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Filter by product
    #[arg(long)]
    pub product: Option<String>,

    /// Filter by equipment
    #[arg(long)]
    pub equipment: Option<String>,

    /// Filter by employee
    #[arg(long)]
    pub employee: Option<String>,

    /// Show only certifications expiring within N days
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
    /// Certification name
    #[arg(long, short = 'N')]
    pub name: String,

    /// Type (iso_9001, iso_14001, iso_45001, iso_27001, iatf_16949, as9100, ce_mark, ul, fda, rohs, reach, supplier, product, calibration, training, other)
    #[arg(long = "type", short = 'T', default_value = "other")]
    pub certification_type: String,

    /// Issuing body
    #[arg(long)]
    pub issuer: String,

    /// Number printed on the certificate
    #[arg(long)]
    pub certificate: Option<String>,

    /// Scope statement
    #[arg(long)]
    pub scope: Option<String>,

    /// Issue date (YYYY-MM-DD)
    #[arg(long)]
    pub issued: String,

    /// Expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: String,

    /// Supplier holding the certification
    #[arg(long)]
    pub supplier: Option<String>,

    /// Product covered
    #[arg(long)]
    pub product: Option<String>,

    /// Equipment covered
    #[arg(long)]
    pub equipment: Option<String>,

    /// Employee holding the certification
    #[arg(long)]
    pub employee: Option<String>,

    /// Next audit date (YYYY-MM-DD)
    #[arg(long)]
    pub next_audit: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AuditArgs {
    /// Certification ID or number
    pub id: String,

    /// Audit type (initial, surveillance, recertification, special)
    #[arg(long = "type", short = 'T', default_value = "surveillance")]
    pub audit_type: String,

    /// Result (pass, conditional, fail)
    #[arg(long, short = 'r')]
    pub result: String,

    /// Audit date (YYYY-MM-DD, default: today)
    #[arg(long)]
    pub date: Option<String>,

    /// Auditor (default: --as or configured author)
    #[arg(long)]
    pub auditor: Option<String>,

    /// Total number of findings
    #[arg(long, default_value_t = 0)]
    pub findings: u32,

    /// Major findings
    #[arg(long, default_value_t = 0)]
    pub major: u32,

    /// Minor findings
    #[arg(long, default_value_t = 0)]
    pub minor: u32,

    /// Next audit date (YYYY-MM-DD)
    #[arg(long)]
    pub next_audit: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct RenewArgs {
    /// Certification ID or number
    pub id: String,

    /// New expiry date (YYYY-MM-DD)
    #[arg(long)]
    pub expires: String,

    /// Who renewed it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReasonArgs {
    /// Certification ID or number
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,
}

#[derive(clap::Args, Debug)]
pub struct WithdrawArgs {
    /// Certification ID or number
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run a certification subcommand
pub fn run(cmd: CertCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        CertCommands::List(args) => run_list(&session, args, global),
        CertCommands::New(args) => run_new(&mut session, args, global),
        CertCommands::Show(args) => run_show(&session, args, global),
        CertCommands::Activate(args) => run_activate(&mut session, args, global),
        CertCommands::Audit(args) => run_audit(&mut session, args, global),
        CertCommands::Renew(args) => run_renew(&mut session, args, global),
        CertCommands::Suspend(args) => run_suspend(&mut session, args, global),
        CertCommands::Withdraw(args) => run_withdraw(&mut session, args, global),
        CertCommands::Sweep => run_sweep(&mut session, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = CertificationFilter {
        certification_type: args.r#type.as_deref().map(parse_enum).transpose()?,
        status: args.status.as_deref().map(parse_enum).transpose()?,
        supplier_id: args.supplier,
        product_id: args.product,
        equipment_id: args.equipment,
        employee_id: args.employee,
        expiring_within_days: args.expiring,
    };

    let mut items = session
        .engine
        .list_certifications(&session.tenant, &filter)?;
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }
    print_list(&items, global.format, "certification(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let input = CreateCertification {
        name: args.name,
        certification_type: parse_enum(&args.certification_type)?,
        issuing_body: args.issuer,
        certificate_number: args.certificate,
        scope: args.scope,
        issue_date: parse_date(&args.issued)?,
        expiry_date: parse_date(&args.expires)?,
        supplier_id: args.supplier,
        product_id: args.product,
        equipment_id: args.equipment,
        employee_id: args.employee,
        next_audit_date: args.next_audit.as_deref().map(parse_date).transpose()?,
        notes: args.notes,
        created_by: session.actor(None),
    };

    let cert = session
        .engine
        .create_certification(&session.tenant, input)?;
    print_outcome(
        &cert,
        global,
        &format!(
            "Registered {} {} (expires {})",
            style(&cert.certification_number).cyan(),
            style(&cert.name).yellow(),
            format_date(Some(cert.expiry_date))
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let cert = session.resolve_certification(&args.id)?;
    print_record(&cert, global.format, print_detail)
}

fn run_activate(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_certification(&args.id)?.id;
    let cert = session
        .engine
        .activate_certification(&session.tenant, &id)?;
    print_outcome(&cert, global, &transition_message(&cert))
}

fn run_audit(session: &mut Session, args: AuditArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_certification(&args.id)?.id;
    let input = RecordCertificationAudit {
        audit_date: match args.date {
            Some(ref date) => parse_date(date)?,
            None => Utc::now(),
        },
        audit_type: parse_enum(&args.audit_type)?,
        auditor: session.actor(args.auditor),
        result: parse_enum(&args.result)?,
        findings: args.findings,
        major_findings: args.major,
        minor_findings: args.minor,
        next_audit_date: args.next_audit.as_deref().map(parse_date).transpose()?,
        notes: args.notes,
    };
    let cert = session
        .engine
        .record_certification_audit(&session.tenant, &id, input)?;
    print_outcome(
        &cert,
        global,
        &format!(
            "Recorded audit on {}; status {}",
            style(&cert.certification_number).cyan(),
            style(cert.status).yellow()
        ),
    )
}

fn run_renew(session: &mut Session, args: RenewArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_certification(&args.id)?.id;
    let expires = parse_date(&args.expires)?;
    let by = session.actor(args.by);
    let cert = session
        .engine
        .renew_certification(&session.tenant, &id, expires, &by, args.notes)?;
    print_outcome(
        &cert,
        global,
        &format!(
            "Renewed {} until {}",
            style(&cert.certification_number).cyan(),
            format_date(Some(cert.expiry_date))
        ),
    )
}

fn run_suspend(session: &mut Session, args: ReasonArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_certification(&args.id)?.id;
    let cert = session
        .engine
        .suspend_certification(&session.tenant, &id, &args.reason)?;
    print_outcome(&cert, global, &transition_message(&cert))
}

fn run_withdraw(session: &mut Session, args: WithdrawArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_certification(&args.id)?;

    if !args.yes
        && !confirm(&format!(
            "Withdraw {}? This cannot be undone",
            current.certification_number
        ))?
    {
        println!("Cancelled.");
        return Ok(());
    }

    let cert = session
        .engine
        .withdraw_certification(&session.tenant, &current.id, &args.reason)?;
    print_outcome(&cert, global, &transition_message(&cert))
}

fn run_sweep(session: &mut Session, global: &GlobalOpts) -> Result<()> {
    let changed = session.engine.update_certification_status(&session.tenant)?;
    if !global.quiet {
        println!(
            "{} {} certification(s) changed status",
            style("✓").green(),
            changed
        );
    }
    Ok(())
}

fn transition_message(cert: &Certification) -> String {
    format!(
        "{} is now {}",
        style(&cert.certification_number).cyan(),
        style(cert.status).yellow()
    )
}

impl Tabular for Certification {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "NUMBER", "NAME", "TYPE", "STATUS", "ISSUER", "HOLDER", "EXPIRES",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.certification_number.clone(),
            self.name.clone(),
            self.certification_type.to_string(),
            self.status.to_string(),
            self.issuing_body.clone(),
            self.holder().unwrap_or_default(),
            self.expiry_date.to_rfc3339(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.certification_number.clone(),
            truncate_str(&self.name, 30),
            self.certification_type.to_string(),
            self.status.to_string(),
            truncate_str(&self.issuing_body, 20),
            self.holder().unwrap_or_else(|| "-".to_string()),
            format_date(Some(self.expiry_date)),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(cert: &Certification) {
    print_heading(&format!("{}  {}", cert.certification_number, cert.name));
    print_field("ID", cert.id.to_string());
    print_field("Type", cert.certification_type.to_string());
    print_field("Status", cert.status.to_string());
    print_field("Issuing body", &cert.issuing_body);
    if let Some(ref number) = cert.certificate_number {
        print_field("Certificate", number);
    }
    if let Some(ref scope) = cert.scope {
        print_field("Scope", scope);
    }
    if let Some(holder) = cert.holder() {
        print_field("Holder", holder);
    }
    print_field("Issued", format_date(Some(cert.issue_date)));
    print_field("Expires", format_date(Some(cert.expiry_date)));
    print_field("Last audit", format_date(cert.last_audit_date));
    print_field("Next audit", format_date(cert.next_audit_date));
    if let Some(ref reason) = cert.status_reason {
        print_field("Reason", reason);
    }

    if !cert.audits.is_empty() {
        println!();
        println!("{}", style("Audits").bold());
        for audit in &cert.audits {
            println!(
                "  {} {} {} ({} finding(s)) by {}",
                format_date(Some(audit.audit_date)),
                audit.audit_type,
                audit.result,
                audit.findings,
                audit.auditor
            );
        }
    }
    if !cert.renewals.is_empty() {
        println!();
        println!("{}", style("Renewals").bold());
        for renewal in &cert.renewals {
            println!(
                "  {} {} -> {} by {}",
                format_date(Some(renewal.renewal_date)),
                format_date(Some(renewal.previous_expiry_date)),
                format_date(Some(renewal.new_expiry_date)),
                renewal.renewed_by
            );
        }
    }
}
