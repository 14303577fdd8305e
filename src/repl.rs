//! # Rain Expression REPL
//!
//! An interactive read-compile-print loop over the public [`rainlang`]
//! API: each line the user types is treated as one `;`-terminated
//! sub-expression (a trailing `;` is appended automatically), parsed, and
//! either its diagnostics or its emitted hex bytecode are printed.
//! Nothing is executed — there is no VM in this crate's scope, so a
//! "result" here is a compiled instruction stream, not a value.
//!
//! Supports graceful exit with `exit` or `quit`.

use std::io::{self, Write};

/// Runs an interactive REPL, echoing the compiled `StateConfig` (as hex)
/// or diagnostics for each line of input.
///
/// `placeholder` is threaded through to [`rainlang::parse`] exactly as the
/// CLI's `--placeholder` flag is, so REPL behavior matches file-mode
/// compilation.
pub fn run(placeholder: &str) {
    println!("rainc REPL - compiles Rain expressions, one line at a time.");
    println!("Type `exit` or `quit` to leave.");

    loop {
        print!(">>> ");
        if io::stdout().flush().is_err() {
            break;
        }

        let mut line = String::new();
        if io::stdin().read_line(&mut line).unwrap_or(0) == 0 {
            println!();
            break;
        }

        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed == "exit" || trimmed == "quit" {
            break;
        }

        compile_line(trimmed, placeholder);
    }
}

fn compile_line(line: &str, placeholder: &str) {
    let source = if line.ends_with(';') {
        line.to_string()
    } else {
        format!("{line};")
    };

    let (tree, config) = rainlang::parse(&source, None, Some(placeholder));

    if tree.has_errors() {
        for diag in tree.errors() {
            println!("  error: {} ({}..{})", diag.message, diag.span.start, diag.span.end);
        }
        return;
    }

    for (i, source) in config.sources.iter().enumerate() {
        print!("  source[{i}] = ");
        if source.is_empty() {
            println!("(empty)");
        } else {
            println!("{}", hex::encode(source));
        }
    }
    if !config.constants.is_empty() {
        print!("  constants  = [");
        for (i, c) in config.constants.iter().enumerate() {
            if i > 0 {
                print!(", ");
            }
            print!("{c}");
        }
        println!("]");
    }
}
