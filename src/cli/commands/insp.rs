//! `qms insp` command - Quality inspections, checklists and defect codes

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, format_date, format_short_id, parse_date, parse_enum, parse_id, truncate_str,
    RangeArgs, Session,
};
use crate::cli::output::{
    print_breakdown, print_field, print_heading, print_list, print_metrics, print_outcome,
    print_record, Tabular,
};
use crate::cli::GlobalOpts;
use crate::core::identity::{EntityId, EntityPrefix};
use crate::entities::checklist::{CreateChecklist, CreateDefectCode};
use crate::entities::inspection::{
    CheckSpec, CheckType, CompleteInspection, CreateInspection, RecordCheckResult, RecordDefect,
};
use crate::entities::ncr::{CreateNcr, NcrLinks};
use crate::entities::{DefectCode, Inspection, QualityChecklist};
use crate::quality::{DefectCodeFilter, InspectionFilter, InspectionMetrics, InspectionScope};

#[derive(Subcommand, Debug)]
pub enum InspCommands {
    /// List inspections with filtering
    List(ListArgs),

    /// Plan a new inspection
    New(NewArgs),

    /// Show an inspection's details
    Show(IdArgs),

    /// Start a planned inspection
    Start(ActorArgs),

    /// Append a check to an inspection
    AddCheck(AddCheckArgs),

    /// Record the result of one check
    Check(CheckArgs),

    /// Record a defect found during the inspection
    Defect(DefectArgs),

    /// Finish inspecting and compute the verdict
    Complete(CompleteArgs),

    /// Approve or reject a completed inspection
    Review(ReviewArgs),

    /// Put an inspection on hold
    Hold(ReasonArgs),

    /// Release an inspection from hold
    Release(IdArgs),

    /// Cancel an inspection
    Cancel(CancelArgs),

    /// Open an NCR for a finished inspection
    RaiseNcr(RaiseNcrArgs),

    /// Inspection metrics for a reporting window
    Metrics(MetricsArgs),

    /// Checklist templates
    #[command(subcommand)]
    Checklist(ChecklistCommands),

    /// Defect code catalogue
    #[command(subcommand)]
    DefectCode(DefectCodeCommands),
}

#[derive(Subcommand, Debug)]
pub enum ChecklistCommands {
    /// List checklists
    List(ChecklistListArgs),

    /// Create a checklist
    New(ChecklistNewArgs),

    /// Show a checklist
    Show(ChecklistIdArgs),

    /// Replace the checks of a checklist
    Items(ChecklistItemsArgs),

    /// Activate or deactivate a checklist
    Toggle(ChecklistIdArgs),
}

#[derive(Subcommand, Debug)]
pub enum DefectCodeCommands {
    /// List defect codes
    List(DefectCodeListArgs),

    /// Add a defect code
    New(DefectCodeNewArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Inspection ID or number (QI-2026-000001)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ActorArgs {
    /// Inspection ID or number
    pub id: String,

    /// Inspector (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by inspection type
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by result (pass, fail, conditional_pass, pending)
    #[arg(long, short = 'r')]
    pub result: Option<String>,

    /// Filter by item
    #[arg(long)]
    pub item: Option<String>,

    /// Filter by supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Filter by reference document (purchase order, production order, ...)
    #[arg(long)]
    pub reference: Option<String>,

    /// Planned on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Planned on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Item being inspected
    #[arg(long)]
    pub item: String,

    /// Item code
    #[arg(long, default_value = "")]
    pub item_code: String,

    /// Item name
    #[arg(long, default_value = "")]
    pub item_name: String,

    /// Inspection type (incoming, in_process, final, receiving, shipping, periodic, random, customer_return)
    #[arg(long = "type", short = 'T', default_value = "incoming")]
    pub inspection_type: String,

    /// Reference type (purchase_order, production_order, sales_order, inventory, other)
    #[arg(long, default_value = "other")]
    pub reference_type: String,

    /// Reference document ID
    #[arg(long, default_value = "")]
    pub reference: String,

    /// Reference document number
    #[arg(long, default_value = "")]
    pub reference_number: String,

    /// Lot number
    #[arg(long)]
    pub lot: Option<String>,

    /// Batch number
    #[arg(long)]
    pub batch: Option<String>,

    /// Supplier of the lot
    #[arg(long)]
    pub supplier: Option<String>,

    /// Sample size
    #[arg(long)]
    pub sample: u32,

    /// Lot quantity
    #[arg(long)]
    pub quantity: u32,

    /// Sampling method (full, random, aql, skip_lot, first_article)
    #[arg(long, default_value = "random")]
    pub sampling: String,

    /// Checklist to copy checks from (ID or code)
    #[arg(long)]
    pub checklist: Option<String>,

    /// Planned date (YYYY-MM-DD, default: now)
    #[arg(long)]
    pub planned: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct AddCheckArgs {
    /// Inspection ID or number
    pub id: String,

    /// Check name
    #[arg(long, short = 'N')]
    pub name: String,

    /// Check type (visual, dimensional, functional, electrical, chemical, documentation, packaging, labeling)
    #[arg(long = "type", short = 'T', default_value = "visual")]
    pub check_type: String,

    /// Specification text
    #[arg(long)]
    pub spec: Option<String>,

    /// Lower limit
    #[arg(long)]
    pub min: Option<f64>,

    /// Upper limit
    #[arg(long)]
    pub max: Option<f64>,

    /// Nominal value
    #[arg(long)]
    pub target: Option<f64>,

    /// Unit of the limits
    #[arg(long)]
    pub unit: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Inspection ID or number
    pub id: String,

    /// Check ID or 1-based sequence number
    pub check: String,

    /// Result (pass, fail, conditional_pass)
    #[arg(long, short = 'r')]
    pub result: String,

    /// Measured value
    #[arg(long)]
    pub value: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct DefectArgs {
    /// Inspection ID or number
    pub id: String,

    /// Defect code
    #[arg(long, short = 'c')]
    pub code: String,

    /// Defect name (default: the code)
    #[arg(long, short = 'N', default_value = "")]
    pub name: String,

    /// Severity (critical, major, minor, cosmetic)
    #[arg(long, short = 'S', default_value = "minor")]
    pub severity: String,

    /// Number of defective units
    #[arg(long, default_value_t = 1)]
    pub quantity: u32,

    /// Description
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Check the defect was found on (ID or sequence number)
    #[arg(long)]
    pub check: Option<String>,

    /// Suspected root cause
    #[arg(long)]
    pub root_cause: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CompleteArgs {
    /// Inspection ID or number
    pub id: String,

    /// Units that passed
    #[arg(long)]
    pub passed: u32,

    /// Units that failed
    #[arg(long, default_value_t = 0)]
    pub failed: u32,

    /// Inspector (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReviewArgs {
    /// Inspection ID or number
    pub id: String,

    /// Reject instead of approve
    #[arg(long)]
    pub reject: bool,

    /// Reviewer (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,

    /// Review notes
    #[arg(long)]
    pub notes: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReasonArgs {
    /// Inspection ID or number
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,
}

#[derive(clap::Args, Debug)]
pub struct CancelArgs {
    /// Inspection ID or number
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct RaiseNcrArgs {
    /// Inspection ID or number
    pub id: String,

    /// NCR title
    #[arg(long, short = 't')]
    pub title: String,

    /// Severity (critical, major, minor, observation)
    #[arg(long, short = 'S', default_value = "major")]
    pub severity: String,

    /// NCR type
    #[arg(long = "type", short = 'T', default_value = "product")]
    pub ncr_type: String,

    /// Who detected it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct MetricsArgs {
    #[command(flatten)]
    pub range: RangeArgs,

    /// Only inspections of this supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Only inspections of this item
    #[arg(long)]
    pub item: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ChecklistIdArgs {
    /// Checklist ID or code
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ChecklistListArgs {
    /// Filter by inspection type
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Show only active checklists
    #[arg(long)]
    pub active: bool,
}

#[derive(clap::Args, Debug)]
pub struct ChecklistNewArgs {
    /// Unique checklist code
    #[arg(long, short = 'c')]
    pub code: String,

    /// Checklist name
    #[arg(long, short = 'N')]
    pub name: String,

    /// Inspection type the checklist is for
    #[arg(long = "type", short = 'T', default_value = "incoming")]
    pub inspection_type: String,

    /// Item category the checklist applies to
    #[arg(long)]
    pub category: Option<String>,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Check, as NAME or TYPE:NAME (repeatable)
    #[arg(long = "item")]
    pub items: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct ChecklistItemsArgs {
    /// Checklist ID or code
    pub id: String,

    /// Check, as NAME or TYPE:NAME (repeatable)
    #[arg(long = "item", required = true)]
    pub items: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct DefectCodeListArgs {
    /// Filter by severity
    #[arg(long, short = 'S')]
    pub severity: Option<String>,

    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Show only active codes
    #[arg(long)]
    pub active: bool,
}

#[derive(clap::Args, Debug)]
pub struct DefectCodeNewArgs {
    /// Unique code
    #[arg(long, short = 'c')]
    pub code: String,

    /// Name
    #[arg(long, short = 'N')]
    pub name: String,

    /// Severity (critical, major, minor, cosmetic)
    #[arg(long, short = 'S', default_value = "minor")]
    pub severity: String,

    /// Category (e.g., dimensional, surface)
    #[arg(long, default_value = "general")]
    pub category: String,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,
}

/// Run an inspection subcommand
pub fn run(cmd: InspCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        InspCommands::List(args) => run_list(&session, args, global),
        InspCommands::New(args) => run_new(&mut session, args, global),
        InspCommands::Show(args) => run_show(&session, args, global),
        InspCommands::Start(args) => run_start(&mut session, args, global),
        InspCommands::AddCheck(args) => run_add_check(&mut session, args, global),
        InspCommands::Check(args) => run_check(&mut session, args, global),
        InspCommands::Defect(args) => run_defect(&mut session, args, global),
        InspCommands::Complete(args) => run_complete(&mut session, args, global),
        InspCommands::Review(args) => run_review(&mut session, args, global),
        InspCommands::Hold(args) => run_hold(&mut session, args, global),
        InspCommands::Release(args) => run_release(&mut session, args, global),
        InspCommands::Cancel(args) => run_cancel(&mut session, args, global),
        InspCommands::RaiseNcr(args) => run_raise_ncr(&mut session, args, global),
        InspCommands::Metrics(args) => run_metrics(&session, args, global),
        InspCommands::Checklist(cmd) => run_checklist(&mut session, cmd, global),
        InspCommands::DefectCode(cmd) => run_defect_code(&mut session, cmd, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = InspectionFilter {
        inspection_type: args.r#type.as_deref().map(parse_enum).transpose()?,
        status: args.status.as_deref().map(parse_enum).transpose()?,
        result: args.result.as_deref().map(parse_enum).transpose()?,
        reference_type: None,
        reference_id: args.reference,
        item_id: args.item,
        supplier_id: args.supplier,
        date_from: args.from.as_deref().map(parse_date).transpose()?,
        date_to: args.to.as_deref().map(parse_date).transpose()?,
    };

    let mut items = session.engine.list_inspections(&session.tenant, &filter)?;
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }
    print_list(&items, global.format, "inspection(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let checklist_id = match args.checklist {
        Some(ref reference) => Some(session.resolve_checklist(reference)?.id),
        None => None,
    };
    let mut input = CreateInspection {
        inspection_type: parse_enum(&args.inspection_type)?,
        reference_type: parse_enum(&args.reference_type)?,
        reference_id: args.reference,
        reference_number: args.reference_number,
        item_id: args.item,
        item_code: args.item_code,
        item_name: args.item_name,
        lot_number: args.lot,
        batch_number: args.batch,
        supplier_id: args.supplier,
        sampling_method: parse_enum(&args.sampling)?,
        sample_size: args.sample,
        total_quantity: args.quantity,
        checklist_id,
        notes: args.notes,
        ..CreateInspection::default()
    };
    if let Some(ref planned) = args.planned {
        input.planned_date = parse_date(planned)?;
    }

    let insp = session.engine.create_inspection(&session.tenant, input)?;
    print_outcome(
        &insp,
        global,
        &format!(
            "Planned {} for {} ({} check(s))",
            style(&insp.inspection_number).cyan(),
            style(&insp.item_id).yellow(),
            insp.checks.len()
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let insp = session.resolve_inspection(&args.id)?;
    print_record(&insp, global.format, print_detail)
}

fn run_start(session: &mut Session, args: ActorArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let inspector = session.actor(args.by);
    let insp = session
        .engine
        .start_inspection(&session.tenant, &id, &inspector)?;
    print_outcome(&insp, global, &transition_message(&insp))
}

fn run_add_check(session: &mut Session, args: AddCheckArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let spec = CheckSpec {
        check_type: parse_enum(&args.check_type)?,
        check_name: args.name,
        specification: args.spec,
        min_value: args.min,
        max_value: args.max,
        target_value: args.target,
        unit: args.unit,
        ..CheckSpec::default()
    };
    let insp = session
        .engine
        .add_inspection_check(&session.tenant, &id, spec)?;
    print_outcome(
        &insp,
        global,
        &format!(
            "Added check #{} to {}",
            insp.checks.len(),
            style(&insp.inspection_number).cyan()
        ),
    )
}

fn run_check(session: &mut Session, args: CheckArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_inspection(&args.id)?;
    let check_id = resolve_check(&current, &args.check)?;
    let input = RecordCheckResult {
        actual_value: args.value,
        result: parse_enum(&args.result)?,
        notes: args.notes,
    };
    let insp = session
        .engine
        .record_check_result(&session.tenant, &current.id, &check_id, input)?;
    print_outcome(
        &insp,
        global,
        &format!(
            "Recorded check on {} ({} pending)",
            style(&insp.inspection_number).cyan(),
            insp.pending_checks()
        ),
    )
}

fn run_defect(session: &mut Session, args: DefectArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_inspection(&args.id)?;
    let check_id = match args.check {
        Some(ref reference) => Some(resolve_check(&current, reference)?),
        None => None,
    };
    let input = RecordDefect {
        defect_code: args.code,
        defect_name: args.name,
        severity: parse_enum(&args.severity)?,
        quantity: args.quantity,
        description: args.description,
        check_id,
        root_cause: args.root_cause,
    };
    let insp = session
        .engine
        .record_defect(&session.tenant, &current.id, input)?;
    print_outcome(
        &insp,
        global,
        &format!(
            "{} now has {} defect(s), {} critical",
            style(&insp.inspection_number).cyan(),
            insp.total_defects,
            insp.critical_defects
        ),
    )
}

fn run_complete(session: &mut Session, args: CompleteArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let input = CompleteInspection {
        passed_quantity: args.passed,
        failed_quantity: args.failed,
        inspected_by: session.actor(args.by),
        notes: args.notes,
    };
    let insp = session
        .engine
        .complete_inspection(&session.tenant, &id, input)?;
    print_outcome(
        &insp,
        global,
        &format!(
            "{} completed: {} ({:.1}% accepted)",
            style(&insp.inspection_number).cyan(),
            style(insp.result).yellow(),
            insp.acceptance_rate
        ),
    )
}

fn run_review(session: &mut Session, args: ReviewArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let reviewer = session.actor(args.by);
    let insp = session.engine.review_inspection(
        &session.tenant,
        &id,
        !args.reject,
        &reviewer,
        args.notes,
    )?;
    print_outcome(&insp, global, &transition_message(&insp))
}

fn run_hold(session: &mut Session, args: ReasonArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let insp = session
        .engine
        .hold_inspection(&session.tenant, &id, &args.reason)?;
    print_outcome(&insp, global, &transition_message(&insp))
}

fn run_release(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let insp = session.engine.release_inspection(&session.tenant, &id)?;
    print_outcome(&insp, global, &transition_message(&insp))
}

fn run_cancel(session: &mut Session, args: CancelArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_inspection(&args.id)?;

    if !args.yes && !confirm(&format!("Cancel {}?", current.inspection_number))? {
        println!("Cancelled.");
        return Ok(());
    }

    let insp = session
        .engine
        .cancel_inspection(&session.tenant, &current.id, &args.reason)?;
    print_outcome(&insp, global, &transition_message(&insp))
}

fn run_raise_ncr(session: &mut Session, args: RaiseNcrArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_inspection(&args.id)?.id;
    let input = CreateNcr {
        title: args.title,
        ncr_type: parse_enum(&args.ncr_type)?,
        severity: parse_enum(&args.severity)?,
        links: NcrLinks::default(),
        detected_by: session.actor(args.by),
        ..CreateNcr::default()
    };
    let ncr = session
        .engine
        .raise_ncr_from_inspection(&session.tenant, &id, input)?;
    print_outcome(
        &ncr,
        global,
        &format!(
            "Raised {} {}",
            style(&ncr.ncr_number).cyan(),
            style(&ncr.title).yellow()
        ),
    )
}

fn run_metrics(session: &Session, args: MetricsArgs, global: &GlobalOpts) -> Result<()> {
    let range = args.range.range()?;
    let scope = InspectionScope {
        supplier_id: args.supplier,
        item_id: args.item,
    };
    let metrics = session
        .engine
        .inspection_metrics(&session.tenant, &range, &scope)?;
    print_metrics(&metrics, global.format, print_metrics_summary)
}

fn run_checklist(session: &mut Session, cmd: ChecklistCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ChecklistCommands::List(args) => {
            let inspection_type = args.r#type.as_deref().map(parse_enum).transpose()?;
            let items = session
                .engine
                .list_checklists(&session.tenant, inspection_type, args.active)?;
            print_list(&items, global.format, "checklist(s)")
        }
        ChecklistCommands::New(args) => {
            let input = CreateChecklist {
                code: args.code,
                name: args.name,
                description: args.description,
                inspection_type: parse_enum(&args.inspection_type)?,
                item_category: args.category,
                items: args
                    .items
                    .iter()
                    .map(|item| parse_check_item(item))
                    .collect::<Result<_>>()?,
                created_by: session.actor(None),
            };
            let checklist = session.engine.create_checklist(&session.tenant, input)?;
            print_outcome(
                &checklist,
                global,
                &format!(
                    "Created checklist {} with {} item(s)",
                    style(&checklist.code).cyan(),
                    checklist.items.len()
                ),
            )
        }
        ChecklistCommands::Show(args) => {
            let checklist = session.resolve_checklist(&args.id)?;
            print_record(&checklist, global.format, print_checklist)
        }
        ChecklistCommands::Items(args) => {
            let id = session.resolve_checklist(&args.id)?.id;
            let items = args
                .items
                .iter()
                .map(|item| parse_check_item(item))
                .collect::<Result<_>>()?;
            let checklist = session
                .engine
                .update_checklist_items(&session.tenant, &id, items)?;
            print_outcome(
                &checklist,
                global,
                &format!(
                    "{} is now at version {}",
                    style(&checklist.code).cyan(),
                    checklist.version
                ),
            )
        }
        ChecklistCommands::Toggle(args) => {
            let id = session.resolve_checklist(&args.id)?.id;
            let checklist = session.engine.toggle_checklist(&session.tenant, &id)?;
            let state = if checklist.is_active { "active" } else { "inactive" };
            print_outcome(
                &checklist,
                global,
                &format!("{} is now {}", style(&checklist.code).cyan(), style(state).yellow()),
            )
        }
    }
}

fn run_defect_code(
    session: &mut Session,
    cmd: DefectCodeCommands,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        DefectCodeCommands::List(args) => {
            let filter = DefectCodeFilter {
                severity: args.severity.as_deref().map(parse_enum).transpose()?,
                category: args.category,
                active_only: args.active,
            };
            let items = session.engine.list_defect_codes(&session.tenant, &filter)?;
            print_list(&items, global.format, "defect code(s)")
        }
        DefectCodeCommands::New(args) => {
            let input = CreateDefectCode {
                code: args.code,
                name: args.name,
                description: args.description,
                severity: parse_enum(&args.severity)?,
                category: args.category,
            };
            let code = session.engine.create_defect_code(&session.tenant, input)?;
            print_outcome(
                &code,
                global,
                &format!(
                    "Added defect code {} ({})",
                    style(&code.code).cyan(),
                    code.severity
                ),
            )
        }
    }
}

/// Find a check by id or by 1-based sequence number
fn resolve_check(insp: &Inspection, reference: &str) -> Result<EntityId> {
    let found = match parse_id(reference, EntityPrefix::Chk) {
        Some(id) => insp.find_check(&id),
        None => reference
            .trim()
            .parse::<u32>()
            .ok()
            .and_then(|n| insp.checks.iter().find(|c| c.sequence == n)),
    };
    found.map(|c| c.id.clone()).ok_or_else(|| {
        miette::miette!(
            "Check {} not found on {}",
            reference,
            insp.inspection_number
        )
    })
}

/// `NAME` or `TYPE:NAME`; a prefix that is not a check type stays in the name
fn parse_check_item(raw: &str) -> Result<CheckSpec> {
    let (check_type, name) = match raw.split_once(':') {
        Some((prefix, rest)) => match prefix.trim().parse::<CheckType>() {
            Ok(check_type) => (check_type, rest.trim()),
            Err(_) => (CheckType::default(), raw.trim()),
        },
        None => (CheckType::default(), raw.trim()),
    };
    if name.is_empty() {
        return Err(miette::miette!("Checklist item needs a name: '{}'", raw));
    }
    Ok(CheckSpec {
        check_type,
        check_name: name.to_string(),
        ..CheckSpec::default()
    })
}

fn transition_message(insp: &Inspection) -> String {
    format!(
        "{} is now {}",
        style(&insp.inspection_number).cyan(),
        style(insp.status).yellow()
    )
}

impl Tabular for Inspection {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "NUMBER", "TYPE", "ITEM", "SUPPLIER", "STATUS", "RESULT", "ACCEPT%", "DEFECTS",
            "PLANNED",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.inspection_number.clone(),
            self.inspection_type.to_string(),
            self.item_id.clone(),
            self.supplier_id.clone().unwrap_or_default(),
            self.status.to_string(),
            self.result.to_string(),
            format!("{:.1}", self.acceptance_rate),
            self.total_defects.to_string(),
            self.planned_date.to_rfc3339(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.inspection_number.clone(),
            self.inspection_type.to_string(),
            truncate_str(&self.item_id, 20),
            self.supplier_id.clone().unwrap_or_else(|| "-".to_string()),
            self.status.to_string(),
            self.result.to_string(),
            format!("{:.1}", self.acceptance_rate),
            self.total_defects.to_string(),
            format_date(Some(self.planned_date)),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

impl Tabular for QualityChecklist {
    fn headers() -> &'static [&'static str] {
        &["ID", "CODE", "NAME", "TYPE", "ITEMS", "VERSION", "ACTIVE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.code.clone(),
            self.name.clone(),
            self.inspection_type.to_string(),
            self.items.len().to_string(),
            self.version.to_string(),
            self.is_active.to_string(),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

impl Tabular for DefectCode {
    fn headers() -> &'static [&'static str] {
        &["ID", "CODE", "NAME", "SEVERITY", "CATEGORY", "ACTIVE"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.code.clone(),
            self.name.clone(),
            self.severity.to_string(),
            self.category.clone(),
            self.is_active.to_string(),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(insp: &Inspection) {
    print_heading(&format!("{}  {}", insp.inspection_number, insp.item_id));
    print_field("ID", insp.id.to_string());
    print_field("Type", insp.inspection_type.to_string());
    print_field("Status", insp.status.to_string());
    print_field("Result", insp.result.to_string());
    print_field("Item", format!("{} {}", insp.item_code, insp.item_name).trim());
    if let Some(ref supplier) = insp.supplier_id {
        print_field("Supplier", supplier);
    }
    if let Some(ref lot) = insp.lot_number {
        print_field("Lot", lot);
    }
    print_field(
        "Sample",
        format!(
            "{} of {} ({})",
            insp.sample_size, insp.total_quantity, insp.sampling_method
        ),
    );
    print_field(
        "Accepted",
        format!(
            "{} passed, {} failed ({:.1}%)",
            insp.passed_quantity, insp.failed_quantity, insp.acceptance_rate
        ),
    );
    print_field("Planned", format_date(Some(insp.planned_date)));
    print_field("Completed", format_date(insp.completed_at));
    if let Some(ref by) = insp.inspected_by {
        print_field("Inspector", by);
    }
    if let Some(ref by) = insp.reviewed_by {
        print_field("Reviewer", by);
    }
    if let Some(ref reason) = insp.hold_reason {
        print_field("Hold reason", reason);
    }

    if !insp.checks.is_empty() {
        println!();
        println!("{}", style("Checks").bold());
        for check in &insp.checks {
            println!(
                "  {:>2}. [{}] {} {}",
                check.sequence,
                check.result,
                check.check_name,
                style(check.actual_value.as_deref().unwrap_or("")).dim()
            );
        }
    }
    if !insp.defects.is_empty() {
        println!();
        println!(
            "{} ({} total, {} critical, {} major, {} minor)",
            style("Defects").bold(),
            insp.total_defects,
            insp.critical_defects,
            insp.major_defects,
            insp.minor_defects
        );
        for defect in &insp.defects {
            println!(
                "  - {} x{} {} [{}]",
                defect.defect_code, defect.quantity, defect.defect_name, defect.severity
            );
        }
    }
    if !insp.ncr_ids.is_empty() {
        print_field("NCRs", insp.ncr_ids.len().to_string());
    }
}

fn print_checklist(checklist: &QualityChecklist) {
    print_heading(&format!("{}  {}", checklist.code, checklist.name));
    print_field("ID", checklist.id.to_string());
    print_field("Type", checklist.inspection_type.to_string());
    print_field("Version", checklist.version.to_string());
    print_field("Active", checklist.is_active.to_string());
    for item in &checklist.items {
        println!("  {:>2}. {} ({})", item.sequence, item.check_name, item.check_type);
    }
}

fn print_metrics_summary(metrics: &InspectionMetrics) {
    print_heading("Inspection metrics");
    print_field("Reviewed", metrics.total.to_string());
    print_field("Pass rate", format!("{:.1}%", metrics.pass_rate));
    print_field("Conditional", format!("{:.1}%", metrics.conditional_rate));
    print_field("Fail rate", format!("{:.1}%", metrics.fail_rate));
    print_field(
        "Avg acceptance",
        format!("{:.1}%", metrics.average_acceptance_rate),
    );
    print_field("Defects", metrics.total_defects.to_string());
    println!();
    print_breakdown("By type", &metrics.by_type);
    print_breakdown("Defects by severity", &metrics.defects_by_severity);
    if !metrics.top_defect_codes.is_empty() {
        println!("{}", style("Top defect codes").bold());
        for entry in &metrics.top_defect_codes {
            println!("  {:<24} {}", entry.code, entry.count);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_check_item() {
        let plain = parse_check_item("Torque marks").unwrap();
        assert_eq!(plain.check_name, "Torque marks");
        assert_eq!(plain.check_type, CheckType::default());

        let typed = parse_check_item("dimensional: Bore diameter").unwrap();
        assert_eq!(typed.check_type, CheckType::Dimensional);
        assert_eq!(typed.check_name, "Bore diameter");

        let colon = parse_check_item("Note: see drawing").unwrap();
        assert_eq!(colon.check_name, "Note: see drawing");

        assert!(parse_check_item("visual:").is_err());
    }
}
