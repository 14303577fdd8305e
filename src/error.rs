//! # Error Handling for the Rain Expression Compiler
//!
//! Two tiers:
//!
//! - [`Diagnostic`] — an **in-tree** error: a message anchored to a
//!   [`Span`]. These never abort parsing; they are attached to `Err`
//!   nodes or `Op::error` and only affect code generation (any
//!   diagnostic anywhere in the tree makes [`crate::codegen::generate`]
//!   return the empty [`crate::state_config::StateConfig`]). The
//!   constructors below spell out the exact message text a given defect
//!   must carry, so the wording stays consistent across the parser,
//!   resolver, and tests.
//! - [`RainlangError`] — a **hard** error: registry misconfiguration or
//!   CLI I/O failure. Never returned by `parse`/`get_parse_tree`/
//!   `get_state_config`, which always succeed and report problems
//!   in-tree instead.

use std::fmt;

use thiserror::Error;

use crate::span::Span;

/// A single in-tree diagnostic: a human-readable message anchored to the
/// byte span of the source text that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Diagnostic {
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn new(message: impl Into<String>, span: Span) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }

    // --- Lexical -----------------------------------------------------

    pub fn invalid_comma(span: Span, context: &str) -> Self {
        Self::new(format!("invalid comma: {context}"), span)
    }

    // --- Structural ----------------------------------------------------

    pub fn no_closing_paren(span: Span) -> Self {
        Self::new("no closing parenthesis", span)
    }

    pub fn invalid_closing_paren(span: Span) -> Self {
        Self::new("invalid closing paren", span)
    }

    pub fn invalid_notation(span: Span) -> Self {
        Self::new("invalid notation", span)
    }

    pub fn invalid_infix_expression(span: Span) -> Self {
        Self::new("invalid infix expression", span)
    }

    // --- Opcode resolution ----------------------------------------------

    pub fn unknown_opcode(span: Span) -> Self {
        Self::new("unknown opcode", span)
    }

    pub fn ambiguous_expression_opcode(span: Span) -> Self {
        Self::new("ambiguous expression/opcode", span)
    }

    pub fn illegal_characters_between_opcode_and_paren(span: Span) -> Self {
        Self::new("illegal characters between opcode and parenthesis", span)
    }

    // --- Arity -----------------------------------------------------------

    pub fn invalid_param_count(span: Span) -> Self {
        Self::new("invalid number of parameters", span)
    }

    pub fn invalid_param_count_comparison(span: Span) -> Self {
        Self::new(
            "invalid number of parameters, need 2 items to compare",
            span,
        )
    }

    // --- Operand -----------------------------------------------------------

    pub fn expected_close_angle(span: Span) -> Self {
        Self::new("expected \">\"", span)
    }

    pub fn invalid_character_in_operand_args(span: Span) -> Self {
        Self::new("found invalid character in operand arguments", span)
    }

    pub fn invalid_use_of_operand_args(span: Span) -> Self {
        Self::new("invalid use of <...>", span)
    }

    pub fn out_of_bound_operand_arg(span: Span, index: usize) -> Self {
        Self::new(
            format!("out-of-bound operand argument at index {index}"),
            span,
        )
    }

    pub fn invalid_operand_args(span: Span) -> Self {
        Self::new("invalid operand arguments", span)
    }

    // --- Multi-output ------------------------------------------------------

    pub fn illegal_placement_of_outputs(span: Span, param_index: usize) -> Self {
        Self::new(
            format!(
                "illegal placement of outputs, parameter {param_index} cannot be accessed by this opcode"
            ),
            span,
        )
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}..{})", self.message, self.span.start, self.span.end)
    }
}

/// Hard failures: registry misuse or I/O. Never produced by the parsing
/// pipeline itself, which always returns a tree (with diagnostics attached
/// where needed) rather than a `Result`.
#[derive(Debug, Error)]
pub enum RainlangError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("duplicate opcode alias: {name:?} is already registered")]
    DuplicateAlias { name: String },

    #[error("unknown opcode id {id}: registry holds {len} opcodes")]
    UnknownOpcodeId { id: u16, len: usize },

    #[error("placeholder must be a single character, got {0:?}")]
    InvalidPlaceholder(String),
}
