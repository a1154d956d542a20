use std::error::Error;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use clap::Args;
use softsearch_core::ExperimentSet;
use softsearch_exp::{
    app_shorthand, generate, read_experiment_set, write_experiment_set, EnumerationRequest,
    RoleDocument,
};
use tracing::info;

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Role-candidate document; `.yaml`/`.yml` files are read as YAML, anything else as JSON.
    #[arg(short, long)]
    pub input: PathBuf,
    /// Where to write the experiments. `-` writes to stdout.
    #[arg(short, long, default_value = "-")]
    pub output: String,
    /// Existing experiments file to prepend to the generated ones.
    #[arg(short, long)]
    pub join: Option<PathBuf>,
    /// Rank counts to run each configuration with.
    #[arg(
        short,
        long,
        num_args = 1..,
        default_values_t = [64],
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub ranks: Vec<u32>,
    /// Command line arguments for the application, one entry per problem.
    #[arg(long, num_args = 0.., default_values_t = [String::new()])]
    pub input_problems: Vec<String>,
    /// Spack spec of the application.
    #[arg(short, long)]
    pub app: String,
    /// Short application name; derived from `--app` when omitted.
    #[arg(long)]
    pub app_name: Option<String>,
    /// Slurm wall time for every run.
    #[arg(long, default_value = "00:15:00")]
    pub max_wall_time: String,
}

pub fn run(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let previous = match &args.join {
        Some(path) => read_experiment_set(path)?,
        None => ExperimentSet::new(),
    };
    let document = RoleDocument::load(&args.input)?;
    let request = EnumerationRequest {
        roles: document.roles,
        inputs: args.input_problems.clone(),
        ranks: args.ranks.clone(),
        spec: args.app.clone(),
        app_name: args
            .app_name
            .clone()
            .unwrap_or_else(|| app_shorthand(&args.app)),
        max_wall_time: args.max_wall_time.clone(),
    };
    let experiments = previous.join(generate(&request, &document.rules)?);

    if args.output == "-" {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        write_experiment_set(&mut out, &experiments)?;
    } else {
        let mut out = BufWriter::new(File::create(&args.output)?);
        write_experiment_set(&mut out, &experiments)?;
        out.flush()?;
    }
    info!(
        experiments = experiments.len(),
        output = %args.output,
        "wrote experiments"
    );
    Ok(())
}
