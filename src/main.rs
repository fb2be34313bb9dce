use clap::{Parser as ClapParser, Subcommand};
use djc::cli::{self, CheckOptions, CheckResult, CliError, ExtractOptions};
use std::fs;
use std::io::{self, Read};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(ClapParser)]
#[command(name = "djc")]
#[command(about = "djc - path queries, merges and row projection over JSON documents")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a path expression and print it normalized
    Check {
        /// The path expression
        path: String,
    },

    /// Evaluate a path expression against JSON
    Eval {
        /// The path expression
        path: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Run a job file's merge rules and projection
    Extract {
        /// Job file
        #[arg(short, long)]
        config: String,

        /// JSON input (reads from stdin if not provided)
        #[arg(short, long)]
        input: Option<String>,

        /// Named document as name=FILE; repeatable
        #[arg(short, long = "document")]
        documents: Vec<String>,

        /// Pretty-print the output
        #[arg(short, long)]
        pretty: bool,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Check { path } => run_check(path, None, false, true),
        Commands::Eval {
            path,
            input,
            pretty,
        } => run_check(path, input, pretty, false),
        Commands::Extract {
            config,
            input,
            documents,
            pretty,
        } => run_extract(config, input, documents, pretty),
    };

    if let Err(e) = result {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn read_stdin(input: Option<String>) -> Result<Option<String>, CliError> {
    match input {
        Some(s) => Ok(Some(s)),
        None if !atty::is(atty::Stream::Stdin) => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(Some(buffer))
        }
        None => Ok(None),
    }
}

fn print_json(output: &serde_json::Value, pretty: bool) -> Result<(), CliError> {
    let json = if pretty {
        serde_json::to_string_pretty(output)?
    } else {
        serde_json::to_string(output)?
    };
    println!("{}", json);
    Ok(())
}

fn run_check(
    path: String,
    input: Option<String>,
    pretty: bool,
    syntax_only: bool,
) -> Result<(), CliError> {
    let input = if syntax_only { None } else { read_stdin(input)? };

    let options = CheckOptions {
        path,
        input,
        syntax_only,
    };

    match cli::execute_check(&options)? {
        CheckResult::SyntaxValid(normalized) => println!("Syntax is valid: {}", normalized),
        CheckResult::Success(output) => print_json(&output, pretty)?,
    }
    Ok(())
}

fn run_extract(
    config: String,
    input: Option<String>,
    documents: Vec<String>,
    pretty: bool,
) -> Result<(), CliError> {
    let job = fs::read_to_string(&config)?;

    let documents = documents
        .iter()
        .map(|arg| {
            let (name, file) = cli::split_document_arg(arg)?;
            Ok((name, fs::read_to_string(file)?))
        })
        .collect::<Result<Vec<_>, CliError>>()?;

    let input = if documents.is_empty() {
        read_stdin(input)?
    } else {
        input
    };

    let options = ExtractOptions {
        job,
        input,
        documents,
    };
    print_json(&cli::execute_extract(&options)?, pretty)
}
