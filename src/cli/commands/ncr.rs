//! `qms ncr` command - Non-conformance report management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, format_date, format_short_id, parse_date, parse_enum, truncate_str, RangeArgs,
    Session,
};
use crate::cli::output::{
    print_breakdown, print_field, print_heading, print_list, print_metrics, print_outcome,
    print_record, Tabular,
};
use crate::cli::GlobalOpts;
use crate::entities::capa::CreateCapa;
use crate::entities::ncr::{
    AddContainmentAction, ContainmentStatus, CreateNcr, NcrLinks, RecordInvestigation,
    SetDisposition, SetNcrCost, UpdateContainmentAction,
};
use crate::entities::Ncr;
use crate::quality::{NcrFilter, NcrMetrics};

#[derive(Subcommand, Debug)]
pub enum NcrCommands {
    /// List NCRs with filtering
    List(ListArgs),

    /// Raise a new NCR (starts in draft)
    New(NewArgs),

    /// Show an NCR's details
    Show(IdArgs),

    /// Open a draft NCR
    Open(IdArgs),

    /// Start the investigation of an open NCR
    Investigate(IdArgs),

    /// Record investigation findings and root cause
    RecordInvestigation(RecordInvestigationArgs),

    /// Set and approve the disposition
    Disposition(DispositionArgs),

    /// Mark the approved disposition as implemented
    Implement(ActorArgs),

    /// Ask for verification of the implemented disposition
    RequestVerification(IdArgs),

    /// Verify and close
    Close(CloseArgs),

    /// Cancel an NCR
    Cancel(CancelArgs),

    /// Assign an NCR to someone
    Assign(AssignArgs),

    /// Containment actions
    #[command(subcommand)]
    Containment(ContainmentCommands),

    /// Link an NCR to an existing CAPA
    LinkCapa(LinkCapaArgs),

    /// Open a new CAPA for an NCR and link both ways
    RaiseCapa(RaiseCapaArgs),

    /// Update the cost impact
    Cost(CostArgs),

    /// NCR metrics for a reporting window
    Metrics(RangeArgs),
}

#[derive(Subcommand, Debug)]
pub enum ContainmentCommands {
    /// Add a containment action
    Add(ContainmentAddArgs),

    /// Update a containment action
    Update(ContainmentUpdateArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// NCR ID or number (NCR-2026-000001)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ActorArgs {
    /// NCR ID or number
    pub id: String,

    /// Who did it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by NCR type
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Filter by severity
    #[arg(long, short = 'S')]
    pub severity: Option<String>,

    /// Filter by source
    #[arg(long)]
    pub source: Option<String>,

    /// Filter by assignee
    #[arg(long)]
    pub assigned_to: Option<String>,

    /// Filter by supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Filter by linked CAPA (ID or number)
    #[arg(long)]
    pub capa: Option<String>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Show only NCRs past their target date
    #[arg(long)]
    pub overdue: bool,

    /// Show only NCRs that are not closed or cancelled
    #[arg(long)]
    pub open: bool,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// NCR title
    #[arg(long, short = 't')]
    pub title: String,

    /// Detailed description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// NCR type (product, process, service, supplier, customer_complaint, internal_audit, external_audit, regulatory)
    #[arg(long = "type", short = 'T', default_value = "product")]
    pub ncr_type: String,

    /// Severity (critical, major, minor, observation)
    #[arg(long, short = 'S', default_value = "minor")]
    pub severity: String,

    /// Where it was detected (inspection, production, customer, audit, supplier, employee, management_review)
    #[arg(long, default_value = "inspection")]
    pub source: String,

    /// Quantity affected
    #[arg(long)]
    pub quantity: Option<f64>,

    /// Unit of the affected quantity
    #[arg(long)]
    pub unit: Option<String>,

    /// Affected item or part
    #[arg(long)]
    pub item: Option<String>,

    /// Supplier responsible
    #[arg(long)]
    pub supplier: Option<String>,

    /// Customer affected
    #[arg(long)]
    pub customer: Option<String>,

    /// Inspection that found it
    #[arg(long)]
    pub inspection: Option<String>,

    /// Process involved
    #[arg(long)]
    pub process: Option<String>,

    /// Location
    #[arg(long)]
    pub location: Option<String>,

    /// Department
    #[arg(long)]
    pub department: Option<String>,

    /// Person who detected it (default: --as or configured author)
    #[arg(long)]
    pub detected_by: Option<String>,

    /// Assignee
    #[arg(long)]
    pub assign: Option<String>,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RecordInvestigationArgs {
    /// NCR ID or number
    pub id: String,

    /// Root cause
    #[arg(long, short = 'r')]
    pub root_cause: String,

    /// Investigation findings
    #[arg(long)]
    pub findings: String,

    /// Investigator (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DispositionArgs {
    /// NCR ID or number
    pub id: String,

    /// Disposition (use_as_is, rework, repair, scrap, return_to_supplier, regrade)
    #[arg(long = "type", short = 'T')]
    pub disposition_type: String,

    /// Quantity the disposition applies to
    #[arg(long)]
    pub quantity: f64,

    /// Justification
    #[arg(long, short = 'j')]
    pub justification: Option<String>,

    /// Approver (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CloseArgs {
    /// NCR ID or number
    pub id: String,

    /// Verifier (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Verification notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CancelArgs {
    /// NCR ID or number
    pub id: String,

    /// Why the NCR is cancelled
    #[arg(long, short = 'r')]
    pub reason: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct AssignArgs {
    /// NCR ID or number
    pub id: String,

    /// New assignee
    pub assignee: String,
}

#[derive(clap::Args, Debug)]
pub struct ContainmentAddArgs {
    /// NCR ID or number
    pub id: String,

    /// What is being done
    #[arg(long, short = 'd')]
    pub description: String,

    /// Assignee
    #[arg(long)]
    pub assign: Option<String>,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ContainmentUpdateArgs {
    /// NCR ID or number
    pub id: String,

    /// Containment action ID or position (1, 2, ...)
    pub action: String,

    /// New status (pending, in_progress, completed)
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// New assignee
    #[arg(long)]
    pub assign: Option<String>,

    /// Who completed it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct LinkCapaArgs {
    /// NCR ID or number
    pub id: String,

    /// CAPA ID or number
    pub capa: String,
}

#[derive(clap::Args, Debug)]
pub struct RaiseCapaArgs {
    /// NCR ID or number
    pub id: String,

    /// CAPA title (default: the NCR title)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// CAPA owner (default: the NCR assignee, then --as)
    #[arg(long)]
    pub owner: Option<String>,

    /// Priority (low, medium, high, critical)
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: String,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CostArgs {
    /// NCR ID or number
    pub id: String,

    #[arg(long)]
    pub material: Option<f64>,

    #[arg(long)]
    pub labor: Option<f64>,

    #[arg(long)]
    pub rework: Option<f64>,

    #[arg(long)]
    pub scrap: Option<f64>,

    #[arg(long)]
    pub other: Option<f64>,

    /// ISO currency code
    #[arg(long)]
    pub currency: Option<String>,
}

/// Run an NCR subcommand
pub fn run(cmd: NcrCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        NcrCommands::List(args) => run_list(&session, args, global),
        NcrCommands::New(args) => run_new(&mut session, args, global),
        NcrCommands::Show(args) => run_show(&session, args, global),
        NcrCommands::Open(args) => run_open(&mut session, args, global),
        NcrCommands::Investigate(args) => run_investigate(&mut session, args, global),
        NcrCommands::RecordInvestigation(args) => {
            run_record_investigation(&mut session, args, global)
        }
        NcrCommands::Disposition(args) => run_disposition(&mut session, args, global),
        NcrCommands::Implement(args) => run_implement(&mut session, args, global),
        NcrCommands::RequestVerification(args) => {
            run_request_verification(&mut session, args, global)
        }
        NcrCommands::Close(args) => run_close(&mut session, args, global),
        NcrCommands::Cancel(args) => run_cancel(&mut session, args, global),
        NcrCommands::Assign(args) => run_assign(&mut session, args, global),
        NcrCommands::Containment(ContainmentCommands::Add(args)) => {
            run_containment_add(&mut session, args, global)
        }
        NcrCommands::Containment(ContainmentCommands::Update(args)) => {
            run_containment_update(&mut session, args, global)
        }
        NcrCommands::LinkCapa(args) => run_link_capa(&mut session, args, global),
        NcrCommands::RaiseCapa(args) => run_raise_capa(&mut session, args, global),
        NcrCommands::Cost(args) => run_cost(&mut session, args, global),
        NcrCommands::Metrics(args) => run_metrics(&session, args, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = NcrFilter {
        status: args.status.as_deref().map(parse_enum).transpose()?,
        ncr_type: args.r#type.as_deref().map(parse_enum).transpose()?,
        severity: args.severity.as_deref().map(parse_enum).transpose()?,
        source: args.source.as_deref().map(parse_enum).transpose()?,
        assigned_to: args.assigned_to,
        supplier_id: args.supplier,
        capa_id: match args.capa {
            Some(ref capa) => Some(session.resolve_capa(capa)?.id),
            None => None,
        },
        date_from: args.from.as_deref().map(parse_date).transpose()?,
        date_to: args.to.as_deref().map(parse_date).transpose()?,
        overdue: args.overdue,
    };

    let mut ncrs = session.engine.list_ncrs(&session.tenant, &filter)?;
    if args.open {
        ncrs.retain(|ncr| !ncr.status.is_terminal());
    }
    if let Some(limit) = args.limit {
        ncrs.truncate(limit);
    }

    if args.count {
        println!("{}", ncrs.len());
        return Ok(());
    }
    print_list(&ncrs, global.format, "NCR(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let input = CreateNcr {
        title: args.title,
        description: args.description,
        ncr_type: parse_enum(&args.ncr_type)?,
        severity: parse_enum(&args.severity)?,
        source: parse_enum(&args.source)?,
        quantity_affected: args.quantity,
        unit: args.unit,
        links: NcrLinks {
            item_id: args.item,
            supplier_id: args.supplier,
            customer_id: args.customer,
            inspection_id: args.inspection,
            process_id: args.process,
            location_id: args.location,
            department_id: args.department,
        },
        detected_by: session.actor(args.detected_by),
        assigned_to: args.assign,
        target_date: args.due.as_deref().map(parse_date).transpose()?,
        tags: args.tags,
    };

    let ncr = session.engine.create_ncr(&session.tenant, input)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Created {} {}",
            style(&ncr.ncr_number).cyan(),
            style(&ncr.title).yellow()
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let ncr = session.resolve_ncr(&args.id)?;
    print_record(&ncr, global.format, print_detail)
}

fn run_open(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let ncr = session.engine.open_ncr(&session.tenant, &id)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_investigate(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let ncr = session.engine.start_ncr_investigation(&session.tenant, &id)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_record_investigation(
    session: &mut Session,
    args: RecordInvestigationArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let input = RecordInvestigation {
        root_cause: args.root_cause,
        findings: args.findings,
        investigated_by: session.actor(args.by),
    };
    let ncr = session.engine.record_investigation(&session.tenant, &id, input)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_disposition(session: &mut Session, args: DispositionArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let input = SetDisposition {
        disposition_type: parse_enum(&args.disposition_type)?,
        quantity: args.quantity,
        approved_by: session.actor(args.by),
        justification: args.justification,
    };
    let ncr = session.engine.set_disposition(&session.tenant, &id, input)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_implement(session: &mut Session, args: ActorArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let by = session.actor(args.by);
    let ncr = session.engine.implement_disposition(&session.tenant, &id, &by)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_request_verification(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let ncr = session.engine.request_verification(&session.tenant, &id)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_close(session: &mut Session, args: CloseArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let by = session.actor(args.by);
    let ncr = session
        .engine
        .verify_and_close(&session.tenant, &id, &by, args.notes)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_cancel(session: &mut Session, args: CancelArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_ncr(&args.id)?;

    if !args.yes && !confirm(&format!("Cancel {} \"{}\"?", current.ncr_number, current.title))? {
        println!("Cancelled.");
        return Ok(());
    }

    let ncr = session
        .engine
        .cancel_ncr(&session.tenant, &current.id, &args.reason)?;
    print_outcome(&ncr, global, &transition_message(&ncr))
}

fn run_assign(session: &mut Session, args: AssignArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let ncr = session.engine.assign_ncr(&session.tenant, &id, &args.assignee)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Assigned {} to {}",
            style(&ncr.ncr_number).cyan(),
            style(&args.assignee).yellow()
        ),
    )
}

fn run_containment_add(
    session: &mut Session,
    args: ContainmentAddArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let input = AddContainmentAction {
        description: args.description,
        assigned_to: args.assign,
        due_date: args.due.as_deref().map(parse_date).transpose()?,
    };
    let ncr = session.engine.add_containment_action(&session.tenant, &id, input)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Added containment action #{} to {}",
            ncr.containment_actions.len(),
            style(&ncr.ncr_number).cyan()
        ),
    )
}

fn run_containment_update(
    session: &mut Session,
    args: ContainmentUpdateArgs,
    global: &GlobalOpts,
) -> Result<()> {
    let current = session.resolve_ncr(&args.id)?;
    let action_id = crate::cli::helpers::resolve_containment(&current, &args.action)?;

    let status: Option<ContainmentStatus> = args.status.as_deref().map(parse_enum).transpose()?;
    let completed_by = match status {
        Some(ContainmentStatus::Completed) => Some(session.actor(args.by)),
        _ => args.by,
    };
    let input = UpdateContainmentAction {
        status,
        assigned_to: args.assign,
        completed_by,
        notes: args.notes,
    };

    let ncr = session
        .engine
        .update_containment_action(&session.tenant, &current.id, &action_id, input)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Updated containment action {} on {}",
            args.action,
            style(&ncr.ncr_number).cyan()
        ),
    )
}

fn run_link_capa(session: &mut Session, args: LinkCapaArgs, global: &GlobalOpts) -> Result<()> {
    let ncr_id = session.resolve_ncr(&args.id)?.id;
    let capa = session.resolve_capa(&args.capa)?;
    let ncr = session
        .engine
        .link_ncr_to_capa(&session.tenant, &ncr_id, &capa.id)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Linked {} to {}",
            style(&ncr.ncr_number).cyan(),
            style(&capa.capa_number).cyan()
        ),
    )
}

fn run_raise_capa(session: &mut Session, args: RaiseCapaArgs, global: &GlobalOpts) -> Result<()> {
    let ncr = session.resolve_ncr(&args.id)?;
    let initiated_by = session.actor(None);
    let owner = args
        .owner
        .or_else(|| ncr.assigned_to.clone())
        .unwrap_or_else(|| initiated_by.clone());

    let input = CreateCapa {
        title: args.title.unwrap_or_else(|| ncr.title.clone()),
        description: ncr.description.clone().unwrap_or_default(),
        priority: parse_enum(&args.priority)?,
        initiated_by,
        owner,
        target_date: args.due.as_deref().map(parse_date).transpose()?,
        ..CreateCapa::default()
    };

    let capa = session
        .engine
        .raise_capa_from_ncr(&session.tenant, &ncr.id, input)?;
    print_outcome(
        &capa,
        global,
        &format!(
            "Raised {} from {}",
            style(&capa.capa_number).cyan(),
            style(&ncr.ncr_number).cyan()
        ),
    )
}

fn run_cost(session: &mut Session, args: CostArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_ncr(&args.id)?.id;
    let input = SetNcrCost {
        material_cost: args.material,
        labor_cost: args.labor,
        rework_cost: args.rework,
        scrap_cost: args.scrap,
        other_cost: args.other,
        currency: args.currency,
    };
    let ncr = session.engine.set_ncr_cost(&session.tenant, &id, input)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "{} cost impact is now {:.2} {}",
            style(&ncr.ncr_number).cyan(),
            ncr.cost.total(),
            ncr.cost.currency.as_deref().unwrap_or("")
        ),
    )
}

fn run_metrics(session: &Session, args: RangeArgs, global: &GlobalOpts) -> Result<()> {
    let range = args.range()?;
    let metrics = session.engine.ncr_metrics(&session.tenant, &range)?;
    print_metrics(&metrics, global.format, print_metrics_summary)
}

fn transition_message(ncr: &Ncr) -> String {
    format!(
        "{} is now {}",
        style(&ncr.ncr_number).cyan(),
        style(ncr.status).yellow()
    )
}

impl Tabular for Ncr {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "NUMBER", "TITLE", "TYPE", "SEVERITY", "STATUS", "ASSIGNED", "CREATED",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.ncr_number.clone(),
            self.title.clone(),
            self.ncr_type.to_string(),
            self.severity.to_string(),
            self.status.to_string(),
            self.assigned_to.clone().unwrap_or_default(),
            self.created_at.to_rfc3339(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.ncr_number.clone(),
            truncate_str(&self.title, 36),
            self.ncr_type.to_string(),
            self.severity.to_string(),
            self.status.to_string(),
            self.assigned_to.clone().unwrap_or_else(|| "-".to_string()),
            format_date(Some(self.created_at)),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(ncr: &Ncr) {
    print_heading(&format!("{}  {}", ncr.ncr_number, ncr.title));
    print_field("ID", ncr.id.to_string());
    print_field("Status", ncr.status.to_string());
    print_field("Type", ncr.ncr_type.to_string());
    print_field("Severity", ncr.severity.to_string());
    print_field("Source", ncr.source.to_string());
    print_field("Detected by", &ncr.detected_by);
    print_field("Detected", format_date(Some(ncr.detected_at)));
    print_field("Assigned to", ncr.assigned_to.as_deref().unwrap_or("-"));
    print_field("Target date", format_date(ncr.target_date));
    if let Some(quantity) = ncr.quantity_affected {
        print_field(
            "Quantity",
            format!("{} {}", quantity, ncr.unit.as_deref().unwrap_or("")),
        );
    }
    if let Some(ref supplier) = ncr.links.supplier_id {
        print_field("Supplier", supplier);
    }
    if let Some(ref item) = ncr.links.item_id {
        print_field("Item", item);
    }
    if let Some(ref description) = ncr.description {
        println!();
        println!("{}", description);
    }

    if !ncr.containment_actions.is_empty() {
        println!();
        println!("{}", style("Containment").bold());
        for (i, action) in ncr.containment_actions.iter().enumerate() {
            println!(
                "  {}. [{}] {} ({})",
                i + 1,
                action.status,
                action.description,
                action.assigned_to.as_deref().unwrap_or("unassigned")
            );
        }
    }

    if let Some(ref investigation) = ncr.investigation {
        println!();
        println!("{}", style("Investigation").bold());
        print_field("Root cause", &investigation.root_cause);
        print_field("Findings", &investigation.findings);
        print_field("Investigated by", &investigation.investigated_by);
    }

    if let Some(ref disposition) = ncr.disposition {
        println!();
        println!("{}", style("Disposition").bold());
        print_field(
            "Decision",
            format!("{} x {}", disposition.disposition_type, disposition.quantity),
        );
        print_field("Approved by", &disposition.approved_by);
        if let Some(ref justification) = disposition.justification {
            print_field("Justification", justification);
        }
        if let Some(ref implementer) = disposition.implemented_by {
            print_field("Implemented by", implementer);
        }
    }

    let total = ncr.cost.total();
    if total > 0.0 {
        println!();
        print_field(
            "Cost impact",
            format!("{:.2} {}", total, ncr.cost.currency.as_deref().unwrap_or("")),
        );
    }
    if let Some(ref capa_number) = ncr.capa_number {
        print_field("CAPA", capa_number);
    }
    if let Some(ref closed_by) = ncr.closed_by {
        print_field("Closed by", closed_by);
        print_field("Closed", format_date(ncr.closed_date));
    }
    if let Some(ref reason) = ncr.cancellation_reason {
        print_field("Cancelled", reason);
    }
}

fn print_metrics_summary(metrics: &NcrMetrics) {
    print_heading("NCR metrics");
    print_field("Total", metrics.total.to_string());
    print_field("Open", metrics.open.to_string());
    print_field("Closed", metrics.closed.to_string());
    print_field("Cancelled", metrics.cancelled.to_string());
    print_field("Overdue", metrics.overdue.to_string());
    print_field(
        "Avg closure",
        format!("{:.1} days", metrics.average_closure_time_ms / 86_400_000.0),
    );
    print_field("Total cost", format!("{:.2}", metrics.total_cost));
    println!();
    print_breakdown("By status", &metrics.by_status);
    print_breakdown("By severity", &metrics.by_severity);
    print_breakdown("By type", &metrics.by_type);
    print_breakdown("By source", &metrics.by_source);
    print_breakdown("By disposition", &metrics.by_disposition);
}
