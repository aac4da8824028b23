//! `qms capa` command - Corrective/Preventive Action management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{
    confirm, format_date, format_short_id, parse_date, parse_enum, resolve_action, truncate_str,
    RangeArgs, Session,
};
use crate::cli::output::{
    print_breakdown, print_field, print_heading, print_list, print_metrics, print_outcome,
    print_record, Tabular,
};
use crate::cli::GlobalOpts;
use crate::entities::capa::{
    ActionType, AddAction, CompleteAction, CompleteEffectivenessCheck, CreateCapa, FishboneCategory,
    FishboneDiagram, RecordRootCause, ScheduleEffectivenessCheck, VerifyAction, VerifyCapa,
};
use crate::entities::Capa;
use crate::quality::{CapaFilter, CapaMetrics};

#[derive(Subcommand, Debug)]
pub enum CapaCommands {
    /// List CAPAs with filtering
    List(ListArgs),

    /// Create a new CAPA (starts in draft)
    New(NewArgs),

    /// Show a CAPA's details
    Show(IdArgs),

    /// Open a draft CAPA
    Open(IdArgs),

    /// Start the investigation
    Investigate(IdArgs),

    /// Record the root cause analysis
    Rca(RcaArgs),

    /// Corrective and preventive actions
    #[command(subcommand)]
    Action(ActionCommands),

    /// Start implementing the planned actions
    Implement(IdArgs),

    /// Record the CAPA verification
    Verify(VerifyArgs),

    /// Effectiveness check
    #[command(subcommand)]
    Effectiveness(EffectivenessCommands),

    /// Close a CAPA
    Close(CloseArgs),

    /// Cancel a CAPA
    Cancel(CancelArgs),

    /// Record the actual cost
    Cost(CostArgs),

    /// CAPA metrics for a reporting window
    Metrics(RangeArgs),
}

#[derive(Subcommand, Debug)]
pub enum ActionCommands {
    /// Add an action to the plan
    Add(ActionAddArgs),

    /// Start working on an action
    Start(ActionRefArgs),

    /// Mark an action completed
    Complete(ActionCompleteArgs),

    /// Verify a completed action
    Verify(ActionVerifyArgs),
}

#[derive(Subcommand, Debug)]
pub enum EffectivenessCommands {
    /// Schedule the effectiveness check
    Schedule(ScheduleArgs),

    /// Record the effectiveness check outcome
    Complete(EffectivenessCompleteArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// CAPA ID or number (CAPA-2026-000001)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by CAPA type (corrective, preventive, both)
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Filter by priority
    #[arg(long, short = 'p')]
    pub priority: Option<String>,

    /// Filter by source
    #[arg(long)]
    pub source: Option<String>,

    /// Filter by owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Filter by source NCR (ID or number)
    #[arg(long)]
    pub ncr: Option<String>,

    /// Filter by supplier
    #[arg(long)]
    pub supplier: Option<String>,

    /// Filter by product
    #[arg(long)]
    pub product: Option<String>,

    /// Filter by process
    #[arg(long)]
    pub process: Option<String>,

    /// Filter by department
    #[arg(long)]
    pub department: Option<String>,

    /// Created on or after (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// Created on or before (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Show only CAPAs past their target date
    #[arg(long)]
    pub overdue: bool,

    /// Show only CAPAs that are not closed or cancelled
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
    /// CAPA title
    #[arg(long, short = 't')]
    pub title: String,

    /// CAPA type (corrective, preventive, both)
    #[arg(long = "type", short = 'T', default_value = "corrective")]
    pub capa_type: String,

    /// Priority (low, medium, high, critical)
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: String,

    /// Source (ncr, audit, customer_complaint, management_review, process_deviation, regulatory, supplier, internal, risk_assessment)
    #[arg(long, short = 's', default_value = "internal")]
    pub source: String,

    /// Description
    #[arg(long, short = 'd', default_value = "")]
    pub description: String,

    /// Problem statement
    #[arg(long)]
    pub problem: Option<String>,

    /// Owner (default: --as or configured author)
    #[arg(long)]
    pub owner: Option<String>,

    /// Source NCR (ID or number); links both ways
    #[arg(long)]
    pub ncr: Option<String>,

    /// Supplier involved
    #[arg(long)]
    pub supplier: Option<String>,

    /// Product involved
    #[arg(long)]
    pub product: Option<String>,

    /// Process involved
    #[arg(long)]
    pub process: Option<String>,

    /// Department
    #[arg(long)]
    pub department: Option<String>,

    /// Target date (YYYY-MM-DD)
    #[arg(long)]
    pub due: Option<String>,

    /// Estimated cost
    #[arg(long)]
    pub estimated_cost: Option<f64>,

    /// ISO currency code
    #[arg(long)]
    pub currency: Option<String>,

    /// Tags
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct RcaArgs {
    /// CAPA ID or number
    pub id: String,

    /// Method (five_why, fishbone, fault_tree, fmea, pareto, other)
    #[arg(long, short = 'm')]
    pub method: String,

    /// Root cause (repeatable)
    #[arg(long = "cause", required = true)]
    pub causes: Vec<String>,

    /// Contributing factor (repeatable)
    #[arg(long = "factor")]
    pub factors: Vec<String>,

    /// Analysis narrative
    #[arg(long, short = 'a', default_value = "")]
    pub analysis: String,

    /// Five-why step, in order (repeatable)
    #[arg(long = "why")]
    pub whys: Vec<String>,

    /// Fishbone category as NAME=cause,cause (repeatable)
    #[arg(long = "fishbone")]
    pub fishbone: Vec<String>,

    /// Analyst (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ActionAddArgs {
    /// CAPA ID or number
    pub id: String,

    /// Action type (corrective, preventive)
    #[arg(long = "type", short = 'T', default_value = "corrective")]
    pub action_type: String,

    /// What will be done
    #[arg(long, short = 'd')]
    pub description: String,

    /// Expected outcome
    #[arg(long, default_value = "")]
    pub outcome: String,

    /// Priority (low, medium, high, critical)
    #[arg(long, short = 'p', default_value = "medium")]
    pub priority: String,

    /// Assignee
    #[arg(long)]
    pub assign: String,

    /// Due date (YYYY-MM-DD)
    #[arg(long)]
    pub due: String,

    /// Evidence expected on completion
    #[arg(long)]
    pub evidence: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ActionRefArgs {
    /// CAPA ID or number
    pub id: String,

    /// Action ID or number (CA-1, PA-2)
    pub action: String,
}

#[derive(clap::Args, Debug)]
pub struct ActionCompleteArgs {
    /// CAPA ID or number
    pub id: String,

    /// Action ID or number (CA-1, PA-2)
    pub action: String,

    /// Evidence provided
    #[arg(long)]
    pub evidence: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Who completed it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ActionVerifyArgs {
    /// CAPA ID or number
    pub id: String,

    /// Action ID or number (CA-1, PA-2)
    pub action: String,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Verifier (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct VerifyArgs {
    /// CAPA ID or number
    pub id: String,

    /// Result (pass, fail, partial)
    #[arg(long, short = 'r')]
    pub result: String,

    /// Verification method
    #[arg(long, short = 'm', default_value = "")]
    pub method: String,

    /// Acceptance criteria
    #[arg(long, default_value = "")]
    pub criteria: String,

    /// Findings
    #[arg(long)]
    pub findings: Option<String>,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Verifier (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ScheduleArgs {
    /// CAPA ID or number
    pub id: String,

    /// When the check is due (YYYY-MM-DD)
    #[arg(long)]
    pub date: String,

    /// How effectiveness will be measured
    #[arg(long, short = 'm', default_value = "")]
    pub method: String,

    /// Acceptance criteria
    #[arg(long, default_value = "")]
    pub criteria: String,
}

#[derive(clap::Args, Debug)]
pub struct EffectivenessCompleteArgs {
    /// CAPA ID or number
    pub id: String,

    /// Result (effective, partially_effective, not_effective)
    #[arg(long, short = 'r')]
    pub result: String,

    /// Findings
    #[arg(long)]
    pub findings: Option<String>,

    /// The problem was checked for recurrence
    #[arg(long)]
    pub recurrence_checked: bool,

    /// Further action is required
    #[arg(long)]
    pub further_action: bool,

    /// Notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Checker (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CloseArgs {
    /// CAPA ID or number
    pub id: String,

    /// Closure notes
    #[arg(long)]
    pub notes: Option<String>,

    /// Who closes it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct CancelArgs {
    /// CAPA ID or number
    pub id: String,

    /// Why the CAPA is cancelled
    #[arg(long, short = 'r')]
    pub reason: String,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

#[derive(clap::Args, Debug)]
pub struct CostArgs {
    /// CAPA ID or number
    pub id: String,

    /// Actual cost
    #[arg(long)]
    pub actual: f64,

    /// ISO currency code
    #[arg(long, default_value = "USD")]
    pub currency: String,
}

/// Run a CAPA subcommand
pub fn run(cmd: CapaCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        CapaCommands::List(args) => run_list(&session, args, global),
        CapaCommands::New(args) => run_new(&mut session, args, global),
        CapaCommands::Show(args) => run_show(&session, args, global),
        CapaCommands::Open(args) => run_open(&mut session, args, global),
        CapaCommands::Investigate(args) => run_investigate(&mut session, args, global),
        CapaCommands::Rca(args) => run_rca(&mut session, args, global),
        CapaCommands::Action(cmd) => run_action(&mut session, cmd, global),
        CapaCommands::Implement(args) => run_implement(&mut session, args, global),
        CapaCommands::Verify(args) => run_verify(&mut session, args, global),
        CapaCommands::Effectiveness(cmd) => run_effectiveness(&mut session, cmd, global),
        CapaCommands::Close(args) => run_close(&mut session, args, global),
        CapaCommands::Cancel(args) => run_cancel(&mut session, args, global),
        CapaCommands::Cost(args) => run_cost(&mut session, args, global),
        CapaCommands::Metrics(args) => run_metrics(&session, args, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = CapaFilter {
        status: args.status.as_deref().map(parse_enum).transpose()?,
        capa_type: args.r#type.as_deref().map(parse_enum).transpose()?,
        priority: args.priority.as_deref().map(parse_enum).transpose()?,
        source: args.source.as_deref().map(parse_enum).transpose()?,
        owner: args.owner,
        ncr_id: match args.ncr {
            Some(ref ncr) => Some(session.resolve_ncr(ncr)?.id),
            None => None,
        },
        supplier_id: args.supplier,
        product_id: args.product,
        process_id: args.process,
        department_id: args.department,
        date_from: args.from.as_deref().map(parse_date).transpose()?,
        date_to: args.to.as_deref().map(parse_date).transpose()?,
        overdue: args.overdue,
    };

    let mut capas = session.engine.list_capas(&session.tenant, &filter)?;
    if args.open {
        capas.retain(|capa| !capa.status.is_terminal());
    }
    if let Some(limit) = args.limit {
        capas.truncate(limit);
    }

    if args.count {
        println!("{}", capas.len());
        return Ok(());
    }
    print_list(&capas, global.format, "CAPA(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let initiated_by = session.actor(None);
    let input = CreateCapa {
        capa_type: parse_enum(&args.capa_type)?,
        priority: parse_enum(&args.priority)?,
        source: parse_enum(&args.source)?,
        problem_statement: args.problem.unwrap_or_else(|| args.title.clone()),
        title: args.title,
        description: args.description,
        ncr_id: None,
        ncr_number: None,
        supplier_id: args.supplier,
        product_id: args.product,
        process_id: args.process,
        department_id: args.department,
        owner: args.owner.unwrap_or_else(|| initiated_by.clone()),
        initiated_by,
        target_date: args.due.as_deref().map(parse_date).transpose()?,
        estimated_cost: args.estimated_cost,
        currency: args.currency,
        tags: args.tags,
    };

    let capa = match args.ncr {
        Some(ref reference) => {
            let ncr_id = session.resolve_ncr(reference)?.id;
            session
                .engine
                .raise_capa_from_ncr(&session.tenant, &ncr_id, input)?
        }
        None => session.engine.create_capa(&session.tenant, input)?,
    };

    print_outcome(
        &capa,
        global,
        &format!(
            "Created {} {}",
            style(&capa.capa_number).cyan(),
            style(&capa.title).yellow()
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let capa = session.resolve_capa(&args.id)?;
    print_record(&capa, global.format, print_detail)
}

fn run_open(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let capa = session.engine.open_capa(&session.tenant, &id)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_investigate(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let capa = session.engine.start_capa_investigation(&session.tenant, &id)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_rca(session: &mut Session, args: RcaArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_capa(&args.id)?;

    let fishbone = if args.fishbone.is_empty() {
        None
    } else {
        let categories = args
            .fishbone
            .iter()
            .map(|entry| parse_fishbone_category(entry))
            .collect::<Result<Vec<_>>>()?;
        Some(FishboneDiagram {
            problem: current.problem_statement.clone(),
            categories,
        })
    };

    let input = RecordRootCause {
        method: parse_enum(&args.method)?,
        root_causes: args.causes,
        contributing_factors: args.factors,
        analysis: args.analysis,
        analyzed_by: session.actor(args.by),
        five_why_steps: args.whys,
        fishbone,
    };

    let capa = session
        .engine
        .record_root_cause_analysis(&session.tenant, &current.id, input)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_action(session: &mut Session, cmd: ActionCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ActionCommands::Add(args) => {
            let id = session.resolve_capa(&args.id)?.id;
            let action_type: ActionType = parse_enum(&args.action_type)?;
            let input = AddAction {
                action_type,
                description: args.description,
                expected_outcome: args.outcome,
                priority: parse_enum(&args.priority)?,
                assigned_to: args.assign,
                due_date: parse_date(&args.due)?,
                evidence_required: args.evidence,
            };
            let capa = session.engine.add_action(&session.tenant, &id, input)?;
            let added = match action_type {
                ActionType::Corrective => capa.corrective_actions.last(),
                ActionType::Preventive => capa.preventive_actions.last(),
            };
            let number = added.map(|a| a.action_number.clone()).unwrap_or_default();
            print_outcome(
                &capa,
                global,
                &format!(
                    "Added action {} to {}",
                    style(number).cyan(),
                    style(&capa.capa_number).cyan()
                ),
            )
        }
        ActionCommands::Start(args) => {
            let current = session.resolve_capa(&args.id)?;
            let action_id = resolve_action(&current, &args.action)?;
            let capa = session
                .engine
                .start_action(&session.tenant, &current.id, &action_id)?;
            print_outcome(&capa, global, &action_message(&capa, &args.action))
        }
        ActionCommands::Complete(args) => {
            let current = session.resolve_capa(&args.id)?;
            let action_id = resolve_action(&current, &args.action)?;
            let input = CompleteAction {
                completed_by: session.actor(args.by),
                evidence_provided: args.evidence,
                notes: args.notes,
            };
            let capa = session
                .engine
                .complete_action(&session.tenant, &current.id, &action_id, input)?;
            print_outcome(&capa, global, &action_message(&capa, &args.action))
        }
        ActionCommands::Verify(args) => {
            let current = session.resolve_capa(&args.id)?;
            let action_id = resolve_action(&current, &args.action)?;
            let input = VerifyAction {
                verified_by: session.actor(args.by),
                notes: args.notes,
            };
            let capa = session
                .engine
                .verify_action(&session.tenant, &current.id, &action_id, input)?;
            print_outcome(&capa, global, &action_message(&capa, &args.action))
        }
    }
}

fn run_implement(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let capa = session.engine.start_implementation(&session.tenant, &id)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_verify(session: &mut Session, args: VerifyArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let input = VerifyCapa {
        verified_by: session.actor(args.by),
        method: args.method,
        criteria: args.criteria,
        result: parse_enum(&args.result)?,
        findings: args.findings,
        notes: args.notes,
    };
    let capa = session.engine.verify_capa(&session.tenant, &id, input)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_effectiveness(
    session: &mut Session,
    cmd: EffectivenessCommands,
    global: &GlobalOpts,
) -> Result<()> {
    match cmd {
        EffectivenessCommands::Schedule(args) => {
            let id = session.resolve_capa(&args.id)?.id;
            let input = ScheduleEffectivenessCheck {
                scheduled_date: parse_date(&args.date)?,
                method: args.method,
                criteria: args.criteria,
            };
            let capa = session
                .engine
                .schedule_effectiveness_check(&session.tenant, &id, input)?;
            print_outcome(
                &capa,
                global,
                &format!(
                    "Effectiveness check for {} scheduled on {}",
                    style(&capa.capa_number).cyan(),
                    format_date(capa.effectiveness_check.as_ref().map(|c| c.scheduled_date))
                ),
            )
        }
        EffectivenessCommands::Complete(args) => {
            let id = session.resolve_capa(&args.id)?.id;
            let input = CompleteEffectivenessCheck {
                checked_by: session.actor(args.by),
                result: parse_enum(&args.result)?,
                findings: args.findings,
                recurrence_check: args.recurrence_checked,
                further_action_required: args.further_action,
                notes: args.notes,
            };
            let capa = session
                .engine
                .complete_effectiveness_check(&session.tenant, &id, input)?;
            print_outcome(&capa, global, &transition_message(&capa))
        }
    }
}

fn run_close(session: &mut Session, args: CloseArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let by = session.actor(args.by);
    let capa = session
        .engine
        .close_capa(&session.tenant, &id, &by, args.notes)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_cancel(session: &mut Session, args: CancelArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_capa(&args.id)?;

    if !args.yes && !confirm(&format!("Cancel {} \"{}\"?", current.capa_number, current.title))? {
        println!("Cancelled.");
        return Ok(());
    }

    let capa = session
        .engine
        .cancel_capa(&session.tenant, &current.id, &args.reason)?;
    print_outcome(&capa, global, &transition_message(&capa))
}

fn run_cost(session: &mut Session, args: CostArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_capa(&args.id)?.id;
    let capa = session
        .engine
        .set_capa_cost(&session.tenant, &id, args.actual, &args.currency)?;
    print_outcome(
        &capa,
        global,
        &format!(
            "{} actual cost is now {:.2} {}",
            style(&capa.capa_number).cyan(),
            args.actual,
            args.currency
        ),
    )
}

fn run_metrics(session: &Session, args: RangeArgs, global: &GlobalOpts) -> Result<()> {
    let range = args.range()?;
    let metrics = session.engine.capa_metrics(&session.tenant, &range)?;
    print_metrics(&metrics, global.format, print_metrics_summary)
}

/// Parse `NAME=cause,cause` into a fishbone category
fn parse_fishbone_category(entry: &str) -> Result<FishboneCategory> {
    let (name, causes) = entry
        .split_once('=')
        .ok_or_else(|| miette::miette!("Invalid fishbone category: {}. Use NAME=cause,cause", entry))?;
    Ok(FishboneCategory {
        name: name.trim().to_string(),
        causes: causes
            .split(',')
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .map(String::from)
            .collect(),
    })
}

fn transition_message(capa: &Capa) -> String {
    format!(
        "{} is now {}",
        style(&capa.capa_number).cyan(),
        style(capa.status).yellow()
    )
}

fn action_message(capa: &Capa, reference: &str) -> String {
    let action = resolve_action(capa, reference)
        .ok()
        .and_then(|id| capa.find_action(&id).cloned());
    match action {
        Some(action) => format!(
            "{} {} is {} ({} is {})",
            style(&capa.capa_number).cyan(),
            action.action_number,
            style(action.status).yellow(),
            capa.capa_number,
            capa.status
        ),
        None => transition_message(capa),
    }
}

impl Tabular for Capa {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "NUMBER", "TITLE", "TYPE", "PRIORITY", "STATUS", "OWNER", "ACTIONS", "TARGET",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.capa_number.clone(),
            self.title.clone(),
            self.capa_type.to_string(),
            self.priority.to_string(),
            self.status.to_string(),
            self.owner.clone(),
            self.total_actions().to_string(),
            self.target_date.map(|d| d.to_rfc3339()).unwrap_or_default(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.capa_number.clone(),
            truncate_str(&self.title, 36),
            self.capa_type.to_string(),
            self.priority.to_string(),
            self.status.to_string(),
            truncate_str(&self.owner, 20),
            self.total_actions().to_string(),
            format_date(self.target_date),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(capa: &Capa) {
    print_heading(&format!("{}  {}", capa.capa_number, capa.title));
    print_field("ID", capa.id.to_string());
    print_field("Status", capa.status.to_string());
    print_field("Type", capa.capa_type.to_string());
    print_field("Priority", capa.priority.to_string());
    print_field("Source", capa.source.to_string());
    if let Some(ref ncr_number) = capa.ncr_number {
        print_field("Source NCR", ncr_number);
    }
    if let Some(ref supplier) = capa.supplier_id {
        print_field("Supplier", supplier);
    }
    print_field("Initiated by", &capa.initiated_by);
    print_field("Owner", &capa.owner);
    print_field("Target date", format_date(capa.target_date));
    println!();
    print_field("Problem", &capa.problem_statement);
    if !capa.description.is_empty() {
        println!("{}", capa.description);
    }

    if let Some(ref rca) = capa.root_cause_analysis {
        println!();
        println!("{}", style("Root cause analysis").bold());
        print_field("Method", rca.method.to_string());
        for cause in &rca.root_causes {
            println!("  - {}", cause);
        }
        for (i, why) in rca.five_why_steps.iter().enumerate() {
            println!("  why {}: {}", i + 1, why);
        }
    }

    if capa.total_actions() > 0 {
        println!();
        println!("{}", style("Actions").bold());
        for action in capa.actions() {
            println!(
                "  {:<6} [{}] {} ({}, due {})",
                action.action_number,
                action.status,
                truncate_str(&action.description, 48),
                action.assigned_to,
                format_date(Some(action.due_date))
            );
        }
    }

    if let Some(ref verification) = capa.verification {
        println!();
        println!("{}", style("Verification").bold());
        print_field("Result", verification.result.to_string());
        print_field("Verified by", &verification.verified_by);
    }

    if let Some(ref check) = capa.effectiveness_check {
        println!();
        println!("{}", style("Effectiveness check").bold());
        print_field("Scheduled", format_date(Some(check.scheduled_date)));
        if let Some(result) = check.result {
            print_field("Result", result.to_string());
        }
    }

    if let Some(cost) = capa.actual_cost {
        println!();
        print_field(
            "Actual cost",
            format!("{:.2} {}", cost, capa.currency.as_deref().unwrap_or("")),
        );
    }
    if let Some(ref closed_by) = capa.closed_by {
        print_field("Closed by", closed_by);
        print_field("Closed", format_date(capa.closed_date));
    }
    if let Some(ref reason) = capa.cancellation_reason {
        print_field("Cancelled", reason);
    }
}

fn print_metrics_summary(metrics: &CapaMetrics) {
    print_heading("CAPA metrics");
    print_field("Total", metrics.total.to_string());
    print_field("Open", metrics.open.to_string());
    print_field("Closed", metrics.closed.to_string());
    print_field("Overdue", metrics.overdue.to_string());
    print_field(
        "Avg closure",
        format!("{:.1} days", metrics.average_closure_time_ms / 86_400_000.0),
    );
    print_field(
        "Effectiveness",
        format!("{:.1}%", metrics.effectiveness_rate),
    );
    print_field(
        "Cost",
        format!(
            "{:.2} estimated / {:.2} actual",
            metrics.estimated_cost, metrics.actual_cost
        ),
    );
    print_field(
        "Actions",
        format!(
            "{} total, {} completed, {} overdue",
            metrics.actions.total, metrics.actions.completed, metrics.actions.overdue
        ),
    );
    println!();
    print_breakdown("By status", &metrics.by_status);
    print_breakdown("By priority", &metrics.by_priority);
    print_breakdown("By type", &metrics.by_type);
    print_breakdown("By source", &metrics.by_source);
}
