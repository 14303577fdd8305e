//! # rainlang — a compiler front-end for Rain expressions
//!
//! Parses a textual Rain expression into an annotated [`ast::ParseTree`]
//! and lowers that tree to a [`state_config::StateConfig`] ready for
//! deployment to the on-chain virtual machine this crate targets. The
//! VM itself, the reverse
//! formatter, and SDK packaging are out of scope — this crate's only
//! contract with them is the wire format of [`state_config`].
//!
//! ## Layout
//!
//! - [`span`] / [`error`] — source positions and diagnostics.
//! - [`value`] — the 256-bit constant type and literal parsing.
//! - [`ast`] — the tagged-variant parse tree.
//! - [`lexer`] — the stateless boundary scanner.
//! - [`opcode`] — operand codecs and the opcode metadata registry.
//! - [`parser`] — the notation-aware recursive-descent parser.
//! - [`resolver`] — per-node operand/output-arity/placeholder resolution.
//! - [`codegen`] — the post-order bytecode emitter.
//! - [`state_config`] — the compiled artifact and its wire format.
//!
//! The free functions below are the crate's public, programmatic entry
//! points.

pub mod ast;
pub mod codegen;
pub mod error;
pub mod lexer;
pub mod opcode;
pub mod parser;
pub mod resolver;
pub mod span;
pub mod state_config;
pub mod value;

use once_cell::sync::Lazy;
use std::sync::RwLock;

use ast::ParseTree;
use error::RainlangError;
use opcode::OpMetaRegistry;
use state_config::StateConfig;

/// The default, process-wide opcode registry. Shared and read-mostly:
/// every `parse` call takes a read lock; `set_opmeta`/`set_gte_meta`/
/// `set_lte_meta`/`set_ineq_meta` take a write lock, and callers are
/// responsible for not overlapping those with in-flight parses.
static REGISTRY: Lazy<RwLock<OpMetaRegistry>> = Lazy::new(|| RwLock::new(OpMetaRegistry::default()));

const DEFAULT_PLACEHOLDER: &str = "_";

/// Parses `text` and lowers the result to a [`StateConfig`] in one call,
/// using the process-wide registry unless `opmeta` overrides it.
///
/// This is the crate's core entry point: parse the text, then hand the
/// resulting tree straight to the code generator.
pub fn parse(
    text: &str,
    opmeta: Option<&OpMetaRegistry>,
    placeholder: Option<&str>,
) -> (ParseTree, StateConfig) {
    let placeholder = placeholder.unwrap_or(DEFAULT_PLACEHOLDER);
    let span = tracing::debug_span!("parse", bytes = text.len(), placeholder);
    let _entered = span.enter();
    tracing::trace!("parse entry");

    let tree = match opmeta {
        Some(registry) => parser::Parser::new(text, registry, placeholder).parse(),
        None => {
            let guard = REGISTRY.read().expect("registry lock poisoned");
            parser::Parser::new(text, &guard, placeholder).parse()
        }
    };
    let sub_exprs = tree.sub_exprs.len();
    let errors = tree.errors().len();
    let config = codegen::generate(&tree);
    tracing::debug!(sub_exprs, errors, sources = config.sources.len(), "parse exit");
    (tree, config)
}

/// Parses `text` and returns only the [`ParseTree`], for callers that only
/// need diagnostics (e.g. an editor integration) and not the compiled
/// bytecode.
pub fn get_parse_tree(
    text: &str,
    opmeta: Option<&OpMetaRegistry>,
    placeholder: Option<&str>,
) -> ParseTree {
    parse(text, opmeta, placeholder).0
}

/// Parses `text` and returns only the [`StateConfig`]. Equivalent to
/// `parse(...).1` but avoids a caller needing to name the tree type.
pub fn get_state_config(
    text: &str,
    opmeta: Option<&OpMetaRegistry>,
    placeholder: Option<&str>,
) -> StateConfig {
    parse(text, opmeta, placeholder).1
}

/// Lowers an already-parsed tree straight to bytecode, skipping the parse
/// step. Offered for callers (e.g. the CLI's `--tree` mode, or an editor
/// re-emitting after a local edit) that already hold a [`ParseTree`].
pub fn build_bytes(tree: &ParseTree) -> StateConfig {
    codegen::generate(tree)
}

/// Replaces the process-wide opcode table. Must not be called while a
/// `parse` using the default registry is in flight on another thread.
pub fn set_opmeta(opcodes: Vec<opcode::registry::OpMeta>) -> Result<(), RainlangError> {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    guard.set_opmeta(opcodes)
}

/// Renames/redescribes the `GTE` pseudo-opcode in the process-wide
/// registry.
pub fn set_gte_meta(
    name: Option<String>,
    description: Option<String>,
    aliases: Option<Vec<String>>,
) -> Result<(), RainlangError> {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    guard.set_gte_meta(name, description, aliases)
}

/// Renames/redescribes the `LTE` pseudo-opcode in the process-wide
/// registry.
pub fn set_lte_meta(
    name: Option<String>,
    description: Option<String>,
    aliases: Option<Vec<String>>,
) -> Result<(), RainlangError> {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    guard.set_lte_meta(name, description, aliases)
}

/// Renames/redescribes the `INEQ` pseudo-opcode in the process-wide
/// registry.
pub fn set_ineq_meta(
    name: Option<String>,
    description: Option<String>,
    aliases: Option<Vec<String>>,
) -> Result<(), RainlangError> {
    let mut guard = REGISTRY.write().expect("registry lock poisoned");
    guard.set_ineq_meta(name, description, aliases)
}

/// Returns a clone of the current process-wide registry, e.g. so a caller
/// can snapshot it, mutate the clone, and pass it explicitly to `parse`
/// rather than touching the shared instance.
pub fn current_opmeta() -> OpMetaRegistry {
    REGISTRY.read().expect("registry lock poisoned").clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_through_the_default_registry() {
        let (tree, config) = parse("add(1 2)", None, None);
        assert!(!tree.has_errors());
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn get_state_config_matches_parse_result() {
        let config = get_state_config("less_than(1 2)", None, None);
        assert_eq!(config.constants.len(), 2);
    }

    #[test]
    fn build_bytes_matches_full_parse() {
        let tree = get_parse_tree("mul(2 3)", None, None);
        let config = build_bytes(&tree);
        assert_eq!(config, get_state_config("mul(2 3)", None, None));
    }

    #[test]
    fn custom_placeholder_is_threaded_through() {
        let tree = get_parse_tree("question call<1 2 1>(5)", None, Some("question"));
        assert!(!tree.has_errors());
    }
}
