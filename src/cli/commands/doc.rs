//! `qms doc` command - Controlled quality documents

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::helpers::{confirm, format_date, format_short_id, parse_enum, truncate_str, Session};
use crate::cli::output::{print_field, print_heading, print_list, print_outcome, print_record, Tabular};
use crate::cli::GlobalOpts;
use crate::entities::document::{CreateDocument, UpdateDocument};
use crate::entities::QualityDocument;
use crate::quality::DocumentFilter;

#[derive(Subcommand, Debug)]
pub enum DocCommands {
    /// List documents, most recently changed first
    List(ListArgs),

    /// Create a document (draft, version 1.0)
    New(NewArgs),

    /// Show a document's details and revision history
    Show(IdArgs),

    /// Edit a draft document
    Edit(EditArgs),

    /// Send a draft to a reviewer
    Submit(SubmitArgs),

    /// Begin reviewing a submitted document
    StartReview(IdArgs),

    /// Finish the review; rejected documents return to draft
    Review(DecisionArgs),

    /// Approve or reject a reviewed document
    Approve(DecisionArgs),

    /// Release an approved document
    Release(IdArgs),

    /// Start a new revision of a released document
    Revise(ReviseArgs),

    /// Mark a document obsolete
    Obsolete(ObsoleteArgs),

    /// Archive an obsolete document
    Archive(IdArgs),
}

#[derive(clap::Args, Debug)]
pub struct IdArgs {
    /// Document ID or number (WI-00007)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Filter by document type
    #[arg(long, short = 't')]
    pub r#type: Option<String>,

    /// Filter by status
    #[arg(long, short = 's')]
    pub status: Option<String>,

    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Filter by department
    #[arg(long)]
    pub department: Option<String>,

    /// Filter by owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Filter by access level
    #[arg(long)]
    pub access: Option<String>,

    /// Text search in number, title and description
    #[arg(long)]
    pub search: Option<String>,

    /// Limit number of results
    #[arg(long, short = 'n')]
    pub limit: Option<usize>,

    /// Show only count
    #[arg(long)]
    pub count: bool,
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Document title
    #[arg(long, short = 't')]
    pub title: String,

    /// Type (procedure, work_instruction, specification, standard, form, template, policy, manual, drawing, certificate, audit_report, inspection_report, calibration_record, training_record)
    #[arg(long = "type", short = 'T', default_value = "procedure")]
    pub document_type: String,

    /// Description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Category
    #[arg(long)]
    pub category: Option<String>,

    /// Owning department
    #[arg(long)]
    pub department: Option<String>,

    /// Document owner (default: --as or configured author)
    #[arg(long)]
    pub owner: Option<String>,

    /// Access level (public, internal, confidential, restricted)
    #[arg(long, default_value = "internal")]
    pub access: String,

    /// Tag (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct EditArgs {
    /// Document ID or number
    pub id: String,

    /// New title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// New description
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// New category
    #[arg(long)]
    pub category: Option<String>,

    /// New department
    #[arg(long)]
    pub department: Option<String>,

    /// New access level
    #[arg(long)]
    pub access: Option<String>,

    /// Replace the body text
    #[arg(long)]
    pub content: Option<String>,

    /// Replace the tags (repeatable)
    #[arg(long = "tag")]
    pub tags: Vec<String>,
}

#[derive(clap::Args, Debug)]
pub struct SubmitArgs {
    /// Document ID or number
    pub id: String,

    /// Reviewer
    #[arg(long, short = 'r')]
    pub reviewer: String,
}

#[derive(clap::Args, Debug)]
pub struct DecisionArgs {
    /// Document ID or number
    pub id: String,

    /// Reject instead of pass/approve
    #[arg(long)]
    pub reject: bool,

    /// Comments
    #[arg(long)]
    pub comments: Option<String>,

    /// Approver (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ReviseArgs {
    /// Document ID or number
    pub id: String,

    /// What changes in this revision
    #[arg(long, short = 'm')]
    pub message: String,

    /// Who is revising it (default: --as or configured author)
    #[arg(long)]
    pub by: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ObsoleteArgs {
    /// Document ID or number
    pub id: String,

    /// Reason
    #[arg(long, short = 'R')]
    pub reason: String,

    /// Document that replaces this one (ID or number)
    #[arg(long)]
    pub superseded_by: Option<String>,

    /// Skip confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

/// Run a document subcommand
pub fn run(cmd: DocCommands, global: &GlobalOpts) -> Result<()> {
    let mut session = Session::open(global)?;

    match cmd {
        DocCommands::List(args) => run_list(&session, args, global),
        DocCommands::New(args) => run_new(&mut session, args, global),
        DocCommands::Show(args) => run_show(&session, args, global),
        DocCommands::Edit(args) => run_edit(&mut session, args, global),
        DocCommands::Submit(args) => run_submit(&mut session, args, global),
        DocCommands::StartReview(args) => run_start_review(&mut session, args, global),
        DocCommands::Review(args) => run_review(&mut session, args, global),
        DocCommands::Approve(args) => run_approve(&mut session, args, global),
        DocCommands::Release(args) => run_release(&mut session, args, global),
        DocCommands::Revise(args) => run_revise(&mut session, args, global),
        DocCommands::Obsolete(args) => run_obsolete(&mut session, args, global),
        DocCommands::Archive(args) => run_archive(&mut session, args, global),
    }
}

fn run_list(session: &Session, args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let filter = DocumentFilter {
        document_type: args.r#type.as_deref().map(parse_enum).transpose()?,
        status: args.status.as_deref().map(parse_enum).transpose()?,
        category: args.category,
        department_id: args.department,
        owner_id: args.owner,
        access_level: args.access.as_deref().map(parse_enum).transpose()?,
        search: args.search,
    };

    let mut items = session.engine.list_documents(&session.tenant, &filter)?;
    if let Some(limit) = args.limit {
        items.truncate(limit);
    }

    if args.count {
        println!("{}", items.len());
        return Ok(());
    }
    print_list(&items, global.format, "document(s)")
}

fn run_new(session: &mut Session, args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let author = session.actor(None);
    let input = CreateDocument {
        title: args.title,
        description: args.description,
        document_type: parse_enum(&args.document_type)?,
        category: args.category,
        department_id: args.department,
        owner_id: args.owner.unwrap_or_else(|| author.clone()),
        access_level: parse_enum(&args.access)?,
        content: None,
        tags: args.tags,
        created_by: author,
    };

    let doc = session.engine.create_document(&session.tenant, input)?;
    print_outcome(
        &doc,
        global,
        &format!(
            "Created {} {}",
            style(&doc.document_number).cyan(),
            style(&doc.title).yellow()
        ),
    )
}

fn run_show(session: &Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let doc = session.resolve_document(&args.id)?;
    print_record(&doc, global.format, print_detail)
}

fn run_edit(session: &mut Session, args: EditArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let input = UpdateDocument {
        title: args.title,
        description: args.description,
        category: args.category,
        department_id: args.department,
        access_level: args.access.as_deref().map(parse_enum).transpose()?,
        content: args.content,
        tags: (!args.tags.is_empty()).then_some(args.tags),
    };
    let doc = session
        .engine
        .update_document(&session.tenant, &id, input)?;
    print_outcome(
        &doc,
        global,
        &format!("Updated {}", style(&doc.document_number).cyan()),
    )
}

fn run_submit(session: &mut Session, args: SubmitArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let doc = session
        .engine
        .submit_document_for_review(&session.tenant, &id, &args.reviewer)?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_start_review(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let doc = session.engine.start_document_review(&session.tenant, &id)?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_review(session: &mut Session, args: DecisionArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let doc = session.engine.complete_document_review(
        &session.tenant,
        &id,
        !args.reject,
        args.comments,
    )?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_approve(session: &mut Session, args: DecisionArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let approver = session.actor(args.by);
    let doc = session
        .engine
        .approve_document(&session.tenant, &id, !args.reject, &approver)?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_release(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let doc = session.engine.release_document(&session.tenant, &id)?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_revise(session: &mut Session, args: ReviseArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let by = session.actor(args.by);
    let doc = session
        .engine
        .revise_document(&session.tenant, &id, &args.message, &by)?;
    print_outcome(
        &doc,
        global,
        &format!(
            "{} is now version {} ({})",
            style(&doc.document_number).cyan(),
            style(&doc.version).yellow(),
            doc.status
        ),
    )
}

fn run_obsolete(session: &mut Session, args: ObsoleteArgs, global: &GlobalOpts) -> Result<()> {
    let current = session.resolve_document(&args.id)?;
    let successor = match args.superseded_by {
        Some(ref reference) => Some(session.resolve_document(reference)?.id),
        None => None,
    };

    if !args.yes && !confirm(&format!("Mark {} obsolete?", current.document_number))? {
        println!("Cancelled.");
        return Ok(());
    }

    let doc = session.engine.obsolete_document(
        &session.tenant,
        &current.id,
        &args.reason,
        successor,
    )?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn run_archive(session: &mut Session, args: IdArgs, global: &GlobalOpts) -> Result<()> {
    let id = session.resolve_document(&args.id)?.id;
    let doc = session.engine.archive_document(&session.tenant, &id)?;
    print_outcome(&doc, global, &transition_message(&doc))
}

fn transition_message(doc: &QualityDocument) -> String {
    format!(
        "{} v{} is now {}",
        style(&doc.document_number).cyan(),
        doc.version,
        style(doc.status).yellow()
    )
}

impl Tabular for QualityDocument {
    fn headers() -> &'static [&'static str] {
        &[
            "ID", "NUMBER", "TITLE", "TYPE", "VERSION", "STATUS", "OWNER", "ACCESS", "UPDATED",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.to_string(),
            self.document_number.clone(),
            self.title.clone(),
            self.document_type.to_string(),
            self.version.clone(),
            self.status.to_string(),
            self.owner_id.clone(),
            self.access_level.to_string(),
            self.updated_at.to_rfc3339(),
        ]
    }

    fn display_row(&self) -> Vec<String> {
        vec![
            format_short_id(&self.id),
            self.document_number.clone(),
            truncate_str(&self.title, 36),
            self.document_type.to_string(),
            self.version.clone(),
            self.status.to_string(),
            self.owner_id.clone(),
            self.access_level.to_string(),
            format_date(Some(self.updated_at)),
        ]
    }

    fn id_string(&self) -> String {
        self.id.to_string()
    }
}

fn print_detail(doc: &QualityDocument) {
    print_heading(&format!("{}  {}", doc.document_number, doc.title));
    print_field("ID", doc.id.to_string());
    print_field("Type", doc.document_type.to_string());
    print_field("Status", doc.status.to_string());
    print_field("Version", &doc.version);
    print_field("Owner", &doc.owner_id);
    print_field("Access", doc.access_level.to_string());
    if let Some(ref category) = doc.category {
        print_field("Category", category);
    }
    if let Some(ref reviewer) = doc.reviewer_id {
        print_field("Reviewer", reviewer);
    }
    if let Some(ref approver) = doc.approver_id {
        print_field("Approver", approver);
    }
    print_field("Effective", format_date(doc.effective_date));
    if let Some(ref successor) = doc.superseded_by {
        print_field("Superseded by", successor.to_string());
    }
    if let Some(ref reason) = doc.obsolete_reason {
        print_field("Obsolete", reason);
    }
    if let Some(ref description) = doc.description {
        println!();
        println!("{}", description);
    }

    println!();
    println!("{}", style("Revisions").bold());
    for rev in &doc.revision_history {
        println!(
            "  {:<6} {} {} ({})",
            rev.version,
            format_date(Some(rev.changed_at)),
            rev.change_description,
            rev.changed_by
        );
    }
}
