use clap::{Parser, ValueEnum};
use miette::Result;
use qms::cli::{Cli, Commands, OutputFormat};
use qms::core::logging::{self, Verbosity};
use qms::core::{Config, Project};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let mut global = cli.global;

    let project = match global.project {
        Some(ref root) => Project::discover_from(root).ok(),
        None => Project::discover().ok(),
    };
    let config = Config::load_for(project.as_ref());

    let verbosity = if global.verbose {
        Verbosity::Verbose
    } else if global.quiet {
        Verbosity::Quiet
    } else {
        Verbosity::Normal
    };
    logging::init(verbosity, config.log_level.as_deref());

    if global.format == OutputFormat::Auto {
        if let Some(format) = config
            .default_format
            .as_deref()
            .and_then(|f| OutputFormat::from_str(f, true).ok())
        {
            global.format = format;
        }
    }

    match cli.command {
        Commands::Init(args) => qms::cli::commands::init::run(args, &global),
        Commands::Ncr(cmd) => qms::cli::commands::ncr::run(cmd, &global),
        Commands::Capa(cmd) => qms::cli::commands::capa::run(cmd, &global),
        Commands::Sup(cmd) => qms::cli::commands::sup::run(cmd, &global),
        Commands::Insp(cmd) => qms::cli::commands::insp::run(cmd, &global),
        Commands::Cert(cmd) => qms::cli::commands::cert::run(cmd, &global),
        Commands::Doc(cmd) => qms::cli::commands::doc::run(cmd, &global),
        Commands::Completions(args) => qms::cli::commands::completions::run(args),
    }
}
