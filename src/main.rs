use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use otterc_inline::{
    AdvisorConfig, AdvisorMode, CallSite, ConfigDiff, DecisionRecord, DecisionSummary,
    InlineAdvisor, codec, config::DEFAULT_CONFIG_FILE,
};
use tracing::info;

mod trace;

use crate::trace::CallTrace;

/// Record and replay inlining decisions for compiler experiments
#[derive(Debug, Parser)]
#[command(name = "otter-inline-tuner", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Make random decisions for every call in a trace and record them
    Record {
        /// Call-edge trace to decide on
        #[arg(long)]
        trace: PathBuf,
        /// Seed for the decision generator (defaults to the current time)
        #[arg(long)]
        seed: Option<u64>,
        /// Where to write the recorded config (`-` for stdout)
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
        /// Pretty-print the recorded config
        #[arg(long)]
        pretty: bool,
    },
    /// Replay a recorded config against a trace
    Replay {
        #[arg(long)]
        trace: PathBuf,
        /// Recorded config to replay (`-` for stdin)
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
    },
    /// Drive a trace with mode, seed and file from a TOML config and
    /// OTTER_INLINE_* variables (variables win)
    Run {
        #[arg(long)]
        trace: PathBuf,
        /// Advisor config file (needs the `toml-config` feature)
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Summarise a recorded config
    Inspect {
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        file: PathBuf,
    },
    /// Compare two recorded configs; exits with status 1 when they differ
    Diff { baseline: PathBuf, candidate: PathBuf },
}

fn main() -> ExitCode {
    otterc_utils::init_logging();

    match run(Cli::parse()) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {err:#}", "error:".red().bold());
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Command::Record {
            trace,
            seed,
            file,
            pretty,
        } => {
            let config = AdvisorConfig {
                mode: AdvisorMode::Stochastic,
                seed,
                config_path: file,
                pretty,
            };
            drive(config, &trace)?;
        }
        Command::Replay { trace, file } => {
            drive(AdvisorConfig::predefined(file), &trace)?;
        }
        Command::Run { trace, config } => {
            let config = AdvisorConfig::load(config.as_deref())
                .context("invalid inline advisor configuration")?;
            drive(config, &trace)?;
        }
        Command::Inspect { file } => inspect(&file)?,
        Command::Diff {
            baseline,
            candidate,
        } => {
            let diff = otterc_inline::compare(&load_records(&baseline)?, &load_records(&candidate)?);
            print_diff(&diff);
            if !diff.is_identical() {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Feed every traced call to a fresh advisor, printing its verdicts.
fn drive(config: AdvisorConfig, trace_path: &Path) -> Result<()> {
    let trace = CallTrace::load(trace_path)?;
    // Keep stdout clean for the document when recording to `-`.
    let document_on_stdout =
        config.mode == AdvisorMode::Stochastic && codec::is_stdio(&config.config_path);
    let mut advisor = InlineAdvisor::select(config)?;

    for call in &trace.calls {
        let decision = advisor.decide_call_site(call)?;
        if document_on_stdout {
            eprintln!("{} {}", verdict(decision), call.edge_key());
        } else {
            println!("{} {}", verdict(decision), call.edge_key());
        }
    }

    advisor.teardown()?;
    info!(mode = %advisor.mode(), summary = %advisor.summary(), "inline session finished");
    Ok(())
}

fn load_records(path: &Path) -> Result<Vec<DecisionRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read inline config {}", path.display()))?;
    codec::decode_str(&text).with_context(|| format!("invalid inline config {}", path.display()))
}

fn inspect(path: &Path) -> Result<()> {
    let records = load_records(path)?;
    let summary = DecisionSummary::from_records(&records);
    let inlined_chains = records
        .iter()
        .filter(|record| record.edge.is_inlined())
        .count();

    println!("{}", path.display().to_string().bold());
    println!("  {summary}");
    println!("  {inlined_chains} edges reached through earlier inlining");
    Ok(())
}

fn print_diff(diff: &ConfigDiff) {
    for flip in &diff.flipped {
        println!(
            "{} {} ({} -> {})",
            "~".yellow(),
            flip.edge,
            verdict(flip.baseline),
            verdict(flip.candidate)
        );
    }
    for record in &diff.only_in_baseline {
        println!("{} {} ({})", "-".red(), record.edge, verdict(record.decision));
    }
    for record in &diff.only_in_candidate {
        println!("{} {} ({})", "+".green(), record.edge, verdict(record.decision));
    }

    println!(
        "{} matching, {} flipped, {} removed, {} added",
        diff.matching,
        diff.flipped.len(),
        diff.only_in_baseline.len(),
        diff.only_in_candidate.len()
    );
}

fn verdict(decision: bool) -> colored::ColoredString {
    if decision {
        "inline".green()
    } else {
        "no-inline".dimmed()
    }
}
