//! Replay a chat transcript through a token window and print what survives.
//!
//! Reads one JSON message per line (OpenAI chat shape) from `--input` or
//! stdin, adds each to a [`TokenWindowMemory`], and prints the retained
//! window as JSON. Usage is logged to stderr after every message.
//!
//! # Examples
//!
//! ```sh
//! # Heuristic estimator, 2k budget
//! cinch-memory --max-tokens 2048 --input transcript.jsonl
//!
//! # Exact counts for a specific model, with eviction logging
//! cat transcript.jsonl | cinch-memory --estimator openai --model gpt-4o \
//!   --max-tokens 8192 --verbose
//!
//! # Settings from a config file, budget overridden on the command line
//! cinch-memory --config window.json --max-tokens 512 --summary < transcript.jsonl
//! ```

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;
use std::process;

use cinch_memory::config::{EstimatorConfig, WindowConfig};
use cinch_memory::estimate::DEFAULT_CHARS_PER_TOKEN;
use cinch_memory::{ChatMemory, Message, TokenWindowMemory};
use clap::{Parser, ValueEnum};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Model used with `--estimator openai` when `--model` is not given.
const DEFAULT_OPENAI_MODEL: &str = "gpt-4o";

/// Replay a chat transcript through a token window and print what survives.
#[derive(Parser)]
#[command(name = "cinch-memory")]
struct Cli {
    // ── Input ──────────────────────────────────────────────────
    /// JSONL transcript, one message per line (default: stdin)
    #[arg(long)]
    input: Option<PathBuf>,

    // ── Window ─────────────────────────────────────────────────
    /// JSON window config; flags below override its fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Memory id
    #[arg(long)]
    id: Option<String>,

    /// Token budget for the window
    #[arg(long)]
    max_tokens: Option<usize>,

    // ── Estimation ─────────────────────────────────────────────
    /// Token estimator
    #[arg(long, value_enum)]
    estimator: Option<EstimatorKind>,

    /// Model whose tokenizer prices messages (openai estimator)
    #[arg(long)]
    model: Option<String>,

    /// Characters per token (heuristic estimator)
    #[arg(long)]
    chars_per_token: Option<f64>,

    // ── Output ─────────────────────────────────────────────────
    /// Log replacements and evictions
    #[arg(long, short)]
    verbose: bool,

    /// Print only the final usage line instead of the window
    #[arg(long)]
    summary: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EstimatorKind {
    Heuristic,
    Openai,
}

// ── Helpers ────────────────────────────────────────────────────────

fn init_tracing(verbose: bool) {
    let default_filter = if verbose { "cinch_memory=debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

/// Merge the config file (if any) with command-line overrides.
fn resolve_config(cli: &Cli) -> Result<WindowConfig, String> {
    let mut config = match &cli.config {
        Some(path) => WindowConfig::from_json_file(path).map_err(|e| e.to_string())?,
        None => WindowConfig::default(),
    };

    if let Some(id) = &cli.id {
        config.id = id.clone();
    }
    if let Some(max_tokens) = cli.max_tokens {
        config.max_tokens = max_tokens;
    }

    // Switching kinds starts from that kind's defaults; naming the kind the
    // config already has keeps its settings.
    match (cli.estimator, &config.estimator) {
        (Some(EstimatorKind::Openai), EstimatorConfig::Heuristic { .. }) => {
            config.estimator = EstimatorConfig::OpenAi {
                model: DEFAULT_OPENAI_MODEL.to_string(),
            };
        }
        (Some(EstimatorKind::Heuristic), EstimatorConfig::OpenAi { .. }) => {
            config.estimator = EstimatorConfig::Heuristic {
                chars_per_token: DEFAULT_CHARS_PER_TOKEN,
            };
        }
        _ => {}
    }

    match &mut config.estimator {
        EstimatorConfig::Heuristic { chars_per_token } => {
            if let Some(cpt) = cli.chars_per_token {
                *chars_per_token = cpt;
            }
        }
        EstimatorConfig::OpenAi { model } => {
            if let Some(m) = &cli.model {
                *model = m.clone();
            }
        }
    }

    Ok(config)
}

/// Parse a JSONL transcript. Blank lines are skipped.
fn read_transcript(reader: impl BufRead) -> Result<Vec<Message>, String> {
    let mut messages = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| format!("failed to read transcript: {e}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Message = serde_json::from_str(&line)
            .map_err(|e| format!("line {}: invalid message: {e}", idx + 1))?;
        messages.push(message);
    }
    Ok(messages)
}

/// Add every message to `memory`, logging usage after each.
fn replay(memory: &mut TokenWindowMemory, messages: Vec<Message>) -> Result<(), String> {
    for (idx, message) in messages.into_iter().enumerate() {
        let role = message.role;
        memory
            .add(message)
            .map_err(|e| format!("message {}: {e}", idx + 1))?;
        let usage = memory.usage().map_err(|e| e.to_string())?;
        info!("#{} {role}: {}", idx + 1, usage.to_log_string());
    }
    Ok(())
}

fn run(cli: &Cli) -> Result<String, String> {
    let config = resolve_config(cli)?;
    let mut memory = config.build().map_err(|e| e.to_string())?;

    let messages = match &cli.input {
        Some(path) => {
            let file = File::open(path)
                .map_err(|e| format!("failed to open '{}': {e}", path.display()))?;
            read_transcript(BufReader::new(file))?
        }
        None => read_transcript(io::stdin().lock())?,
    };
    info!(
        "replaying {} message(s) into memory '{}' ({} token budget)",
        messages.len(),
        memory.id(),
        memory.max_tokens()
    );

    replay(&mut memory, messages)?;

    if cli.summary {
        let usage = memory.usage().map_err(|e| e.to_string())?;
        return Ok(format!("{}\n", usage.to_log_string()));
    }
    serde_json::to_string_pretty(&memory.messages())
        .map(|json| format!("{json}\n"))
        .map_err(|e| format!("failed to serialize window: {e}"))
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli) {
        Ok(output) => print!("{output}"),
        Err(e) => {
            eprintln!("Error: {e}");
            process::exit(1);
        }
    }
}
