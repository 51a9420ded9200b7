use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use ephemeral_app::scaffold::{self, Options};

#[derive(Parser)]
#[command(name = "adopt")]
#[command(about = "Copy the ephemeral-app guide documents into a repository", long_about = None)]
struct Cli {
    /// Target repository directory
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Overwrite existing files (backs up originals)
    #[arg(long)]
    force: bool,

    /// Print actions without writing
    #[arg(long)]
    dry_run: bool,

    /// Skip writing AGENTS.md
    #[arg(long)]
    no_agents: bool,

    /// Skip writing the architecture plan
    #[arg(long)]
    no_architecture: bool,

    /// Skip writing the /adopt skill into codex/skills/
    #[arg(long)]
    no_skill: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse_from(scaffold::long_flags(std::env::args_os()));
    let options = Options {
        dir: cli.dir,
        force: cli.force,
        dry_run: cli.dry_run,
        no_agents: cli.no_agents,
        no_architecture: cli.no_architecture,
        no_skill: cli.no_skill,
    };

    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S").to_string();
    match scaffold::adopt(&options, &timestamp, |action| println!("{action}")) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("adopt: {err}");
            ExitCode::FAILURE
        }
    }
}
