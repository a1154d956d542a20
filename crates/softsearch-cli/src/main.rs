use std::error::Error;

use clap::{ArgAction, Parser, Subcommand};
use commands::{
    generate::{self, GenerateArgs},
    search::{self, SearchArgs},
    submit::{self, SubmitArgs},
};
use softsearch_core::errors::SwsError;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

mod commands;

#[derive(Parser, Debug)]
#[command(
    name = "softsearch",
    about = "Enumerate, submit and search combinatorial software configurations"
)]
struct Cli {
    /// Raise log verbosity; repeat for more detail. `RUST_LOG` takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate experiment descriptors from a role-candidate document.
    Generate(GenerateArgs),
    /// Submit the dependency build and the run jobs of an experiment set to Slurm.
    Submit(SubmitArgs),
    /// Build and run a component across a search space on this machine.
    Search(SearchArgs),
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    let outcome = match cli.command {
        Command::Generate(args) => generate::run(&args),
        Command::Submit(args) => submit::run(&args),
        Command::Search(args) => search::run(&args),
    };
    if let Err(err) = &outcome {
        if let Some(sws) = err.downcast_ref::<SwsError>() {
            error!(family = sws.family(), code = sws.code(), "command failed");
        }
    }
    outcome
}
