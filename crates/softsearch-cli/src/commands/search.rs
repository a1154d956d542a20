use std::error::Error;
use std::path::PathBuf;

use clap::{Args, ValueEnum};
use softsearch_core::to_canonical_json_string;
use softsearch_exp::{BoundedRandom, Exhaustive, SearchStrategy};
use softsearch_sched::{run_search, SearchDriverOptions, SearchPlan, ShellRunner, Spack};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum StrategyKind {
    /// Every point in product order.
    Exhaustive,
    /// A seeded random sample of `--max-iter` points.
    Random,
}

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// YAML plan naming the component, compilers and dependency groups.
    #[arg(long)]
    pub plan: PathBuf,
    #[arg(long, value_enum, default_value_t = StrategyKind::Exhaustive)]
    pub strategy: StrategyKind,
    /// Number of points the random strategy visits.
    #[arg(long, default_value_t = 10)]
    pub max_iter: usize,
    #[arg(long, default_value_t = 0)]
    pub seed: u64,
    /// Print the commands instead of running them.
    #[arg(long, alias = "dry-run")]
    pub dry: bool,
    #[arg(long)]
    pub spack_env: Option<String>,
    /// Directory for per-spec build logs.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,
    #[arg(long)]
    pub no_build: bool,
    #[arg(long)]
    pub no_run: bool,
}

pub fn run(args: &SearchArgs) -> Result<(), Box<dyn Error>> {
    let plan = SearchPlan::load(&args.plan)?;
    let mut strategy: Box<dyn SearchStrategy> = match args.strategy {
        StrategyKind::Exhaustive => Box::new(Exhaustive::new()),
        StrategyKind::Random => Box::new(BoundedRandom::new(args.max_iter, args.seed)),
    };
    let spack = match &args.spack_env {
        Some(env) => Spack::default().with_env(env.clone()),
        None => Spack::default(),
    };
    let options = SearchDriverOptions {
        spack_env: args.spack_env.clone(),
        output_dir: args.output_dir.clone(),
        skip_build: args.no_build,
        skip_run: args.no_run,
        dry_run: args.dry,
    };
    let reports = run_search(
        strategy.as_mut(),
        &plan,
        &options,
        &spack,
        &mut ShellRunner,
    )?;
    for report in &reports {
        if args.dry {
            for command in report.build_commands.iter().chain(&report.run_commands) {
                println!("{command}");
            }
            println!();
        } else {
            println!("{}", to_canonical_json_string(report)?);
        }
    }
    Ok(())
}
