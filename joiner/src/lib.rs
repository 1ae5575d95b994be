use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use simjoin_core::persist::{
    load_dataset, load_pairs_csv, save_results_csv, save_results_jsonl, save_summary, CsvOptions, RunSummary,
    SUMMARY_VERSION,
};
use simjoin_core::{evaluate, EvalError, Evaluation, JoinConfig, JoinStats, Side, SimilarityJoin, TokenizerOptions};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "joiner")]
#[command(about = "Match records across two datasets by token-set Jaccard similarity", long_about = None)]
pub struct Cli {
    /// Print reports as JSON instead of text
    #[arg(long, global = true, default_value_t = false)]
    pub json: bool,
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Join two CSV/JSONL datasets and optionally score the result against a ground truth
    Join(JoinArgs),
    /// Score a saved result file against a ground truth
    Evaluate(EvaluateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct JoinArgs {
    /// Left dataset (.csv or .jsonl)
    #[arg(long)]
    pub left: PathBuf,
    /// Right dataset (.csv or .jsonl)
    #[arg(long)]
    pub right: PathBuf,
    /// Comma-separated left fields, concatenated in order into the join key
    #[arg(long, value_delimiter = ',', required = true)]
    pub left_fields: Vec<String>,
    /// Comma-separated right fields
    #[arg(long, value_delimiter = ',', required = true)]
    pub right_fields: Vec<String>,
    #[arg(long, default_value = "id")]
    pub left_id: String,
    #[arg(long, default_value = "id")]
    pub right_id: String,
    /// Minimum Jaccard similarity, inclusive, in [0, 1]
    #[arg(long, default_value_t = 0.5)]
    pub threshold: f64,
    /// Result file; nothing is written when omitted
    #[arg(long)]
    pub output: Option<PathBuf>,
    /// Result format; inferred from the output extension when omitted
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
    /// Worker threads (defaults to one per core)
    #[arg(long)]
    pub threads: Option<usize>,
    /// NFKC-normalize text before tokenizing
    #[arg(long, default_value_t = false)]
    pub nfkc: bool,
    /// Ground-truth CSV of matching (left id, right id) pairs
    #[arg(long)]
    pub ground_truth: Option<PathBuf>,
    /// Write a JSON run summary (config, stage sizes, evaluation)
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Result CSV; the first two columns are read as (id1, id2)
    #[arg(long)]
    pub results: PathBuf,
    #[arg(long)]
    pub ground_truth: PathBuf,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Csv,
    Jsonl,
}

impl OutputFormat {
    fn for_path(explicit: Option<OutputFormat>, path: &Path) -> OutputFormat {
        explicit.unwrap_or_else(|| match path.extension().and_then(|s| s.to_str()) {
            Some("jsonl") => OutputFormat::Jsonl,
            _ => OutputFormat::Csv,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct JoinReport {
    pub stats: JoinStats,
    pub evaluation: Option<Evaluation>,
    /// Evaluation was requested but is undefined for this result; the join itself succeeded.
    pub evaluation_error: Option<EvalError>,
    pub output: Option<PathBuf>,
}

pub fn run_join(args: &JoinArgs) -> Result<JoinReport> {
    let mut config = JoinConfig::new(&args.left_fields, &args.right_fields, args.threshold);
    config.threads = args.threads;
    config.tokenizer = TokenizerOptions { nfkc: args.nfkc };
    // Validate before reading any input.
    let engine = SimilarityJoin::new(config)?;

    let csv_options = CsvOptions::default();
    let left = load_dataset(&args.left, Side::Left, &args.left_id, &csv_options)?;
    let right = load_dataset(&args.right, Side::Right, &args.right_id, &csv_options)?;
    let truth = match &args.ground_truth {
        Some(gt) => Some(load_pairs_csv(gt)?),
        None => None,
    };

    let output = engine.run(&left, &right)?;
    tracing::info!(
        left = left.len(),
        right = right.len(),
        candidates = output.stats.candidates,
        matches = output.stats.matches,
        "join complete"
    );

    if let Some(path) = &args.output {
        match OutputFormat::for_path(args.format, path) {
            OutputFormat::Csv => save_results_csv(path, &output.pairs)?,
            OutputFormat::Jsonl => save_results_jsonl(path, &output.pairs)?,
        }
        tracing::info!(path = %path.display(), "results written");
    }

    // An undefined score is reported alongside the join, never in place of it.
    let (evaluation, evaluation_error) = match truth {
        Some(truth) => match evaluate(output.id_pairs(), truth) {
            Ok(e) => (Some(e), None),
            Err(err) => {
                tracing::warn!(error = %err, "evaluation undefined");
                (None, Some(err))
            }
        },
        None => (None, None),
    };

    if let Some(path) = &args.summary {
        let summary = RunSummary {
            config: engine.config().clone(),
            stats: output.stats,
            evaluation,
            evaluation_error,
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "".into()),
            version: SUMMARY_VERSION,
        };
        save_summary(path, &summary)?;
    }

    Ok(JoinReport { stats: output.stats, evaluation, evaluation_error, output: args.output.clone() })
}

pub fn run_evaluate(args: &EvaluateArgs) -> Result<Evaluation> {
    let result = load_pairs_csv(&args.results)?;
    let truth = load_pairs_csv(&args.ground_truth)?;
    let e = evaluate(result, truth).with_context(|| format!("evaluate {:?}", args.results))?;
    Ok(e)
}

pub fn format_stats(stats: &JoinStats) -> String {
    format!(
        "Before filtering: {} pairs in total\nAfter filtering: {} pairs left\nAfter verification: {} similar pairs",
        stats.cross_product, stats.candidates, stats.matches
    )
}

pub fn format_evaluation(e: &Evaluation) -> String {
    format!("(precision, recall, fmeasure) = ({:.4}, {:.4}, {:.4})", e.precision, e.recall, e.f_measure)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_command() {
        let cli = Cli::try_parse_from([
            "joiner", "join", "--left", "a.csv", "--right", "b.csv",
            "--left-fields", "title,manufacturer", "--right-fields", "name,manufacturer",
            "--threshold", "0.7",
        ])
        .unwrap();
        match cli.command {
            Commands::Join(args) => {
                assert_eq!(args.left_fields, vec!["title", "manufacturer"]);
                assert_eq!(args.right_fields, vec!["name", "manufacturer"]);
                assert_eq!(args.threshold, 0.7);
                assert_eq!(args.left_id, "id");
                assert!(args.output.is_none());
            }
            Commands::Evaluate(_) => panic!("expected join"),
        }
    }

    #[test]
    fn join_requires_fields() {
        assert!(Cli::try_parse_from(["joiner", "join", "--left", "a.csv", "--right", "b.csv"]).is_err());
    }

    #[test]
    fn format_follows_extension() {
        assert_eq!(OutputFormat::for_path(None, Path::new("out.jsonl")), OutputFormat::Jsonl);
        assert_eq!(OutputFormat::for_path(None, Path::new("out.csv")), OutputFormat::Csv);
        assert_eq!(OutputFormat::for_path(Some(OutputFormat::Csv), Path::new("out.jsonl")), OutputFormat::Csv);
    }
}
