// src/main.rs — skillbench entry point

use clap::Parser;

use skillbench::cli::evaluate::{run_evaluate, run_report};
use skillbench::cli::{Cli, Commands};
use skillbench::evaluator::report::SUMMARY_FILE;
use skillbench::infra::config::Config;
use skillbench::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Initialize logging (respects RUST_LOG)
    logger::init_logging(logger::level_for(cli.verbose));

    match run(cli).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("error: {e}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<bool> {
    // Load config (falls back to defaults if no skillbench.toml)
    let mut config = if let Some(ref path) = cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };
    cli.apply_overrides(&mut config)?;

    let default_summary = config.results_dir.join(SUMMARY_FILE);
    match &cli.command {
        Some(Commands::Report { path }) => {
            run_report(path.as_ref().unwrap_or(&default_summary))?;
            return Ok(true);
        }
        None if cli.report_only() => {
            run_report(&default_summary)?;
            return Ok(true);
        }
        None => {}
    }

    run_evaluate(&config, cli.skill_filters(), cli.report).await
}
