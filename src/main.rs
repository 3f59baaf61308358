//! CLI tool to tokenize, structure, and compare C/C++ source files.

use std::fs;
use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use clexer_rs::{Analysis, Error, TokenStats, analyze, compare, export, render};
use tracing::{Level, info};

#[derive(Parser)]
#[command(name = "clexer")]
#[command(about = "Tokenize and structure C/C++ source files")]
#[command(version)]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List tokens and lexical errors
    Tokens {
        /// Output format
        #[arg(short, long, value_enum, default_value_t = Format::Table)]
        format: Format,
        /// Source files, `-` for stdin
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Print the parse tree and structural warnings
    Tree {
        /// Print the full analysis as JSON instead
        #[arg(long)]
        json: bool,
        /// Source files, `-` for stdin
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Print token counts by category
    Stats {
        /// Source files, `-` for stdin
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Compare two files token by token
    Compare { left: String, right: String },
    /// Report diagnostics and fail if there are any
    Check {
        /// Source files, `-` for stdin
        #[arg(required = true)]
        files: Vec<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Table,
    Csv,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(&cli.command) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(io::stderr)
        .init();
}

/// Returns whether the command succeeded.
fn run(command: &Command) -> Result<bool, Error> {
    match command {
        Command::Compare { left, right } => compare_files(left, right),
        Command::Tokens { files, .. }
        | Command::Tree { files, .. }
        | Command::Stats { files }
        | Command::Check { files } => analyze_files(command, files),
    }
}

/// Exits like `cmp`: success only when the files are lexically
/// identical.
fn compare_files(left: &str, right: &str) -> Result<bool, Error> {
    let (Some(left_src), Some(right_src)) = (read_source(left), read_source(right)) else {
        return Ok(false);
    };
    let comparison = compare(&analyze(&left_src).tokens, &analyze(&right_src).tokens);
    writeln!(io::stdout().lock(), "{left} <-> {right}: {comparison}")?;
    Ok(comparison.identical)
}

fn analyze_files(command: &Command, files: &[String]) -> Result<bool, Error> {
    let mut out = io::stdout().lock();
    let mut ok = true;
    for path in files {
        let Some(source) = read_source(path) else {
            ok = false;
            continue;
        };
        let analysis = analyze(&source);
        info!(
            path = path.as_str(),
            tokens = analysis.tokens.len(),
            errors = analysis.errors.len(),
            warnings = analysis.warnings().len(),
            "analyzed"
        );

        match command {
            Command::Tokens { format, .. } => {
                print_tokens(&mut out, path, &analysis, *format)?;
                if *format == Format::Csv && !analysis.errors.is_empty() {
                    export::write_errors_csv(io::stderr().lock(), &analysis.errors)?;
                } else {
                    report_errors(path, &analysis);
                }
            }
            Command::Tree { json: true, .. } => {
                writeln!(out, "{}", export::to_json(&analysis)?)?;
            }
            Command::Tree { json: false, .. } => {
                write!(out, "{}", render(&analysis.tree, &analysis.tokens))?;
                report_warnings(path, &analysis);
            }
            Command::Stats { .. } => {
                writeln!(out, "{path}:")?;
                writeln!(out, "{}", TokenStats::from_tokens(&analysis.tokens))?;
            }
            Command::Check { .. } => {
                report_errors(path, &analysis);
                report_warnings(path, &analysis);
                if analysis.is_clean() {
                    eprintln!(
                        "{path}: ok ({} token(s), {} node(s))",
                        analysis.tokens.len(),
                        analysis.tree.len()
                    );
                } else {
                    ok = false;
                }
            }
            Command::Compare { .. } => {}
        }
    }

    Ok(ok)
}

fn read_source(path: &str) -> Option<String> {
    let result = if path == "-" {
        let mut buf = String::new();
        io::stdin().read_to_string(&mut buf).map(|_| buf)
    } else {
        fs::read_to_string(path)
    };
    result.inspect_err(|e| eprintln!("{path}: {e}")).ok()
}

fn print_tokens<W: Write>(
    out: &mut W,
    path: &str,
    analysis: &Analysis,
    format: Format,
) -> Result<(), Error> {
    match format {
        Format::Csv => export::write_tokens_csv(out, &analysis.tokens),
        Format::Json => {
            export::write_tokens_json(&mut *out, &analysis.tokens)?;
            writeln!(out)?;
            Ok(())
        }
        Format::Table => {
            writeln!(out, "{path}:")?;
            for token in &analysis.tokens {
                writeln!(
                    out,
                    "{:>5}:{:<4} {:<15} {}",
                    token.span.line,
                    token.span.column,
                    token.kind.name(),
                    token.text.escape_debug()
                )?;
            }
            Ok(())
        }
    }
}

fn report_errors(path: &str, analysis: &Analysis) {
    for error in &analysis.errors {
        eprintln!("{path}: {error}");
    }
}

fn report_warnings(path: &str, analysis: &Analysis) {
    for warning in analysis.warnings() {
        eprintln!("{path}: {warning}");
    }
}
