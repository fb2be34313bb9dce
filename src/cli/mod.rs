//! CLI support for djc
//!
//! The binary is a thin layer over these functions, which take document
//! text and return rendered JSON so they can be driven from other tools.

mod check;
mod extract;

pub use check::{CheckOptions, CheckResult, execute_check};
pub use extract::{ExtractOptions, execute_extract, split_document_arg};

use std::io;

use thiserror::Error;

/// Errors that can occur during CLI operations
#[derive(Debug, Error)]
pub enum CliError {
    #[error("Parse error: {0}")]
    Parse(#[from] crate::ParseError),

    #[error("Evaluation error: {0}")]
    Eval(#[from] crate::EvalError),

    #[error("Job error: {0}")]
    Config(#[from] crate::ConfigError),

    #[error("Invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("No input provided. Use --input or pipe JSON to stdin.")]
    NoInput,

    #[error("Invalid document argument '{0}'; expected name=FILE")]
    BadDocument(String),
}
