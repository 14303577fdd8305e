//! # `rainc` — Rain expression compiler CLI
//!
//! Command-line front-end over the [`rainlang`] library: compiles a
//! `.rain` source file (or stdin) to a [`rainlang::state_config::StateConfig`]
//! and prints it as hex or JSON. With no file argument and an empty/absent
//! stdin, starts an interactive REPL instead. A pure consumer of the
//! public API — never evaluates bytecode, only produces and displays it.

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};

use rainlang::error::Diagnostic;
use rainlang::state_config::StateConfig;

mod repl;

/// Compiles Rain expression source text to a `StateConfig`.
#[derive(Parser, Debug)]
#[command(name = "rainc")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to a `.rain` source file. Omit to read from stdin, or to
    /// start an interactive REPL if stdin is empty.
    file: Option<PathBuf>,

    /// Output format for the compiled `StateConfig`.
    #[arg(short, long, value_enum, default_value = "hex")]
    format: OutputFormat,

    /// Also print the resolved parse tree's diagnostics, even on success.
    #[arg(short, long)]
    tree: bool,

    /// Placeholder token used for unconsumed multi-output slots.
    #[arg(short, long, default_value = "_")]
    placeholder: String,

    /// Enable debug logging.
    #[arg(short, long)]
    verbose: bool,
}

/// Output format options for a compiled `StateConfig`.
#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Hex dump of the envelope produced by `StateConfig::to_bytes`.
    Hex,
    /// JSON, requires the `serde` feature.
    Json,
}

fn main() -> ExitCode {
    let args = Args::parse();

    if args.verbose {
        tracing_subscriber::fmt()
            .with_env_filter("rainlang=debug")
            .init();
    }

    let text = match &args.file {
        Some(path) => match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) => {
                eprintln!("error reading {}: {e}", path.display());
                return ExitCode::FAILURE;
            }
        },
        None => {
            let mut buf = String::new();
            let read_ok = std::io::stdin().read_to_string(&mut buf).is_ok();
            if !read_ok || buf.trim().is_empty() {
                repl::run(&args.placeholder);
                return ExitCode::SUCCESS;
            }
            buf
        }
    };

    compile_and_report(&text, &args)
}

fn compile_and_report(text: &str, args: &Args) -> ExitCode {
    let (tree, config) = rainlang::parse(text, None, Some(&args.placeholder));

    if args.tree || tree.has_errors() {
        for diag in tree.errors() {
            print_diagnostic(text, diag);
        }
    }

    if tree.has_errors() {
        return ExitCode::FAILURE;
    }

    print_config(&config, args.format);
    ExitCode::SUCCESS
}

fn print_diagnostic(source: &str, diag: &Diagnostic) {
    let snippet = diag.span.slice(source);
    eprintln!(
        "error: {} (bytes {}..{}: {:?})",
        diag.message, diag.span.start, diag.span.end, snippet
    );
}

fn print_config(config: &StateConfig, format: OutputFormat) {
    match format {
        OutputFormat::Hex => println!("{}", hex::encode(config.to_bytes())),
        OutputFormat::Json => print_json(config),
    }
}

#[cfg(feature = "serde")]
fn print_json(config: &StateConfig) {
    match serde_json::to_string_pretty(config) {
        Ok(json) => println!("{json}"),
        Err(e) => eprintln!("error serializing StateConfig: {e}"),
    }
}

#[cfg(not(feature = "serde"))]
fn print_json(_config: &StateConfig) {
    eprintln!("JSON output requires the `serde` feature; rebuild with --features serde");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_file_argument() {
        let args = Args::try_parse_from(["rainc", "example.rain"]).unwrap();
        assert_eq!(args.file, Some(PathBuf::from("example.rain")));
        assert!(!args.verbose);
    }

    #[test]
    fn parses_format_flag() {
        let args = Args::try_parse_from(["rainc", "-f", "json", "example.rain"]).unwrap();
        assert!(matches!(args.format, OutputFormat::Json));
    }

    #[test]
    fn defaults_placeholder_to_underscore() {
        let args = Args::try_parse_from(["rainc"]).unwrap();
        assert_eq!(args.placeholder, "_");
    }
}
