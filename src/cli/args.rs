//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    capa::CapaCommands, cert::CertCommands, completions::CompletionsArgs, doc::DocCommands,
    init::InitArgs, insp::InspCommands, ncr::NcrCommands, sup::SupCommands,
};

#[derive(Parser)]
#[command(name = "qms")]
#[command(author, version, about = "Quality issue lifecycle engine")]
#[command(long_about = "Track non-conformance reports, corrective/preventive actions, supplier qualifications, inspections, certifications and controlled documents through their lifecycles.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Project root (default: auto-detect by finding .qms/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Tenant to act as (overrides config)
    #[arg(long, global = true, env = "QMS_TENANT")]
    pub tenant: Option<String>,

    /// Actor recorded on transitions (overrides config and git user.name)
    #[arg(long = "as", global = true, value_name = "NAME")]
    pub actor: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new QMS project
    Init(InitArgs),

    /// Non-conformance report management
    #[command(subcommand)]
    Ncr(NcrCommands),

    /// Corrective/preventive action management
    #[command(subcommand)]
    Capa(CapaCommands),

    /// Supplier qualification management
    #[command(subcommand)]
    Sup(SupCommands),

    /// Quality inspections, checklists and defect codes
    #[command(subcommand)]
    Insp(InspCommands),

    /// Certification management
    #[command(subcommand)]
    Cert(CertCommands),

    /// Document control
    #[command(subcommand)]
    Doc(DocCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable (table for list, details for show)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Just IDs, one per line
    Id,
}
