//! sift — schema inspection demo CLI
//!
//! Loads a schema document and a candidate value, both as JSON files,
//! and runs one of the two inspection modes.
//!
//! Usage:
//!   cargo run -p demo -- validate --schema schema.json --candidate data.json
//!   cargo run -p demo -- sanitize --schema schema.json --candidate data.json
//!
//! `validate` exits 0 when the candidate conforms and 2 when it does
//! not; `sanitize` prints the change report followed by the sanitized
//! JSON. Hard errors (unreadable files, malformed schemas, hook
//! faults) exit 1.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use sift_contracts::{SiftError, SiftResult};
use sift_core::{sanitize, validate, SchemaNode};

// ── CLI definition ────────────────────────────────────────────────────────────

/// sift — declarative validation and sanitization for JSON values.
#[derive(Parser)]
#[command(
    name = "demo",
    about = "sift schema inspection demo",
    long_about = "Validates or sanitizes a JSON candidate against a JSON schema document.\n\
                  Schema documents use the sift vocabulary (type, properties, items,\n\
                  optional, def, pattern, rules, ...); hooks are builder-only and not\n\
                  available from JSON."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Report every schema violation without touching the candidate.
    Validate {
        /// Path to the JSON schema document.
        #[arg(long)]
        schema: PathBuf,
        /// Path to the JSON candidate value.
        #[arg(long)]
        candidate: PathBuf,
    },
    /// Coerce, default, and rewrite the candidate, reporting each change.
    Sanitize {
        /// Path to the JSON schema document.
        #[arg(long)]
        schema: PathBuf,
        /// Path to the JSON candidate value.
        #[arg(long)]
        candidate: PathBuf,
    },
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Structured logging; set RUST_LOG=debug to watch the traversal.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Validate { schema, candidate } => run_validate(&schema, &candidate),
        Command::Sanitize { schema, candidate } => run_sanitize(&schema, &candidate),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("demo error: {}", e);
            std::process::exit(1);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn run_validate(schema_path: &Path, candidate_path: &Path) -> SiftResult<i32> {
    let schema = load_schema(schema_path)?;
    let candidate = load_json(candidate_path)?;

    let outcome = validate(&schema, &candidate)?;
    println!("{}", outcome.format());
    Ok(if outcome.valid { 0 } else { 2 })
}

fn run_sanitize(schema_path: &Path, candidate_path: &Path) -> SiftResult<i32> {
    let schema = load_schema(schema_path)?;
    let candidate = load_json(candidate_path)?;

    let outcome = sanitize(&schema, candidate)?;
    println!("{}", outcome.format());
    let rendered =
        serde_json::to_string_pretty(&outcome.data).map_err(|e| SiftError::ConfigError {
            reason: format!("failed to render sanitized value: {}", e),
        })?;
    println!("{}", rendered);
    Ok(0)
}

// ── File loading ──────────────────────────────────────────────────────────────

fn load_schema(path: &Path) -> SiftResult<SchemaNode> {
    SchemaNode::from_json(&load_json(path)?)
}

fn load_json(path: &Path) -> SiftResult<Value> {
    let contents = std::fs::read_to_string(path).map_err(|e| SiftError::ConfigError {
        reason: format!("failed to read '{}': {}", path.display(), e),
    })?;
    serde_json::from_str(&contents).map_err(|e| SiftError::ConfigError {
        reason: format!("'{}' is not valid JSON: {}", path.display(), e),
    })
}
