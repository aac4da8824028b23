//! Shell completion scripts
//!
//! ```bash
//! source <(qms completions bash)
//! qms completions fish > ~/.config/fish/completions/qms.fish
//! ```

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use miette::Result;

use crate::cli::Cli;

#[derive(clap::Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell
    #[arg(value_enum)]
    pub shell: Shell,
}

pub fn run(args: CompletionsArgs) -> Result<()> {
    let mut cmd = Cli::command();
    let bin = cmd.get_name().to_string();
    tracing::debug!(shell = %args.shell, "generating completions");
    generate(args.shell, &mut cmd, bin, &mut std::io::stdout().lock());
    Ok(())
}
