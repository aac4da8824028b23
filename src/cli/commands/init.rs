//! `qms init` command - Initialize a new QMS project

use console::style;
use miette::{IntoDiagnostic, Result};

use crate::core::project::{Project, ProjectError, PROJECT_DIR};
use crate::cli::GlobalOpts;
use crate::core::SqliteStore;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .qms/ already exists
    #[arg(long)]
    pub force: bool,
}

/// `--tenant` (or `QMS_TENANT`) is written into the new config as the default tenant
pub fn run(args: InitArgs, global: &GlobalOpts) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let tenant = global.tenant.as_deref();
    let project = if args.force {
        Project::init_force(&path, tenant)
    } else {
        Project::init(&path, tenant)
    };

    match project {
        Ok(project) => {
            // Create the schema up front so the first command starts from a valid database
            SqliteStore::open(&project.database_path())?;

            println!(
                "{} Initialized QMS project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created:");
            for entry in ["config.yaml", "quality.db"] {
                println!("  {}", style(format!("{}/{}", PROJECT_DIR, entry)).dim());
            }
            println!();
            println!("Next steps:");
            println!(
                "  {} Raise your first non-conformance",
                style("qms ncr new --title \"...\"").yellow()
            );
            println!(
                "  {} Review open CAPAs",
                style("qms capa list --open").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} QMS project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!(
                "Use {} to reinitialize",
                style("qms init --force").yellow()
            );
            Ok(())
        }
        Err(e) => Err(miette::miette!("{}", e)),
    }
}
