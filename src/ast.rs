//! # Parse Tree
//!
//! `ParseNode` is a tagged-variant sum type: a node is exactly one of a
//! literal-ish [`ValueNode`], an operator [`OpNode`], or an error. Downstream
//! code always matches on the variant explicitly — there is no shared base
//! "has an opcode" field to probe, by design.

use crate::error::Diagnostic;
use crate::span::Span;

/// A literal integer, the placeholder, an `arg(n)` reference, or the
/// `MaxUint256`/`Infinity` sentinel. Which of these `text` denotes is
/// decided later, by the code generator — the parser only records the raw
/// token and its span.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ValueNode {
    pub text: String,
    pub span: Span,
}

/// One integer supplied inside a `<...>` operand-argument list, with the
/// span of just that integer (used for `out-of-bound operand argument at
/// index i` diagnostics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OperandArg {
    pub value: i64,
    pub span: Span,
}

/// Which pseudo-opcode an [`OpNode`] lowers to, if any. Recorded explicitly
/// during resolution rather than re-derived from `name` every time codegen
/// needs it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PseudoOp {
    Gte,
    Lte,
    Ineq,
}

/// An operator node: `name(params...)` in whichever of the three notations
/// produced it. Most fields start `None`/empty and are filled in by the
/// resolver as the enclosing `)` is processed.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpNode {
    /// The operator word exactly as written (pre-normalisation).
    pub name: String,
    pub name_span: Span,
    /// Resolved opcode id, once known. `None` for an unresolved node and
    /// always `None` for a pseudo-opcode, which has no stable id of its
    /// own.
    pub opcode_id: Option<u16>,
    /// Packed 16-bit operand, once resolved.
    pub operand: Option<u16>,
    /// Output arity, once resolved.
    pub output_arity: Option<u8>,
    /// Span covering the whole node, name through closing paren.
    pub full_span: Span,
    /// Spans of every `(`/`)` this node's resolution touched, in the order
    /// encountered — kept so "invalid notation" diagnostics can point at
    /// both the offending parens.
    pub paren_spans: Vec<Span>,
    pub parameters: Vec<ParseNode>,
    /// Raw `<...>` integers attached to this op's head, if any were
    /// written, each with its own span.
    pub operand_args: Option<Vec<OperandArg>>,
    /// Set if this node was parsed in infix notation (`a op b`) rather
    /// than prefix/postfix, prior to the resolver's infix-lowering step.
    pub infix: bool,
    /// Which pseudo-opcode this lowers to, if any.
    pub pseudo: Option<PseudoOp>,
    /// Populated by the resolver if this node failed to resolve (unknown
    /// opcode, bad arity, out-of-range operand argument, ...).
    pub error: Option<Diagnostic>,
}

impl OpNode {
    pub fn new(name: String, name_span: Span, full_span: Span) -> Self {
        Self {
            name,
            name_span,
            opcode_id: None,
            operand: None,
            output_arity: None,
            full_span,
            paren_spans: Vec::new(),
            parameters: Vec::new(),
            operand_args: None,
            infix: false,
            pseudo: None,
            error: None,
        }
    }

    pub fn param_count(&self) -> usize {
        self.parameters.len()
    }
}

/// A single parse-tree node: a value, an operator, or an error.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ParseNode {
    Value(ValueNode),
    Op(OpNode),
    Err(Diagnostic),
}

impl ParseNode {
    pub fn span(&self) -> Span {
        match self {
            ParseNode::Value(v) => v.span,
            ParseNode::Op(o) => o.full_span,
            ParseNode::Err(e) => e.span,
        }
    }

    /// True for the placeholder sentinel `Value` node — the default text
    /// is `_`, but the parser threads the configured placeholder through
    /// so callers can use something else.
    pub fn is_placeholder(&self, placeholder: &str) -> bool {
        matches!(self, ParseNode::Value(v) if v.text == placeholder)
    }

    /// Collects every diagnostic reachable from this node: its own error
    /// (if it is an `Err` node, or an `Op` with a resolution error) plus
    /// all parameters', recursively.
    pub fn collect_errors<'a>(&'a self, out: &mut Vec<&'a Diagnostic>) {
        match self {
            ParseNode::Err(d) => out.push(d),
            ParseNode::Op(op) => {
                if let Some(d) = &op.error {
                    out.push(d);
                }
                for p in &op.parameters {
                    p.collect_errors(out);
                }
            }
            ParseNode::Value(_) => {}
        }
    }
}

/// One compiled sub-expression: the source span it occupied in the
/// original text, and its root-level nodes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SubExpr {
    pub source_span: Span,
    pub root_nodes: Vec<ParseNode>,
}

/// The result of parsing a whole program: one [`SubExpr`] per `;`-separated
/// sub-expression, in textual order. A `Vec` rather than a map keyed by
/// index keeps iteration order == sub-expression order for free, since
/// sources are emitted in the order their sub-expressions appear in the
/// source text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ParseTree {
    pub sub_exprs: Vec<SubExpr>,
}

impl ParseTree {
    pub fn has_errors(&self) -> bool {
        let mut out = Vec::new();
        for sub in &self.sub_exprs {
            for node in &sub.root_nodes {
                node.collect_errors(&mut out);
                if !out.is_empty() {
                    return true;
                }
            }
        }
        false
    }

    pub fn errors(&self) -> Vec<&Diagnostic> {
        let mut out = Vec::new();
        for sub in &self.sub_exprs {
            for node in &sub.root_nodes {
                node.collect_errors(&mut out);
            }
        }
        out
    }
}
