use anyhow::{anyhow, Result};
use clap::Parser;
use joiner::{format_evaluation, format_stats, run_evaluate, run_join, Cli, Commands};
use tracing_subscriber::{fmt, EnvFilter};

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Join(args) => {
            let report = run_join(&args)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("{}", format_stats(&report.stats));
                if let Some(e) = &report.evaluation {
                    println!("{}", format_evaluation(e));
                }
            }
            if let Some(err) = report.evaluation_error {
                return Err(anyhow!(err).context("join succeeded but evaluation failed"));
            }
        }
        Commands::Evaluate(args) => {
            let e = run_evaluate(&args)?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&e)?);
            } else {
                println!("{}", format_evaluation(&e));
            }
        }
    }
    Ok(())
}
