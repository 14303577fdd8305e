//! # Tree Resolver
//!
//! Runs on an [`OpNode`] the instant its closing paren/notation is
//! recognised, once every parameter has already been resolved (the parser
//! drives this bottom-up, so resolution is post-order by construction).
//! Infix reshaping happens earlier, in [`crate::parser`], where the flat
//! operand/operator slot list is collapsed into a prefix-shaped `OpNode`
//! before this module ever sees it — by the time `resolve_op` runs, `infix`
//! is just a flag recording which notation produced the node.

use crate::ast::{OpNode, ParseNode, PseudoOp, ValueNode};
use crate::error::Diagnostic;
use crate::opcode::registry::NameTarget;
use crate::opcode::OpMetaRegistry;
use crate::span::Span;

/// Resolves operand, output arity, and pseudo-opcode expansion for `op`.
/// Leaves `op.error` set on any failure; never panics or discards the
/// node.
pub fn resolve_op(op: &mut OpNode, registry: &OpMetaRegistry) {
    match registry.lookup(&op.name) {
        Some(NameTarget::Pseudo(pseudo)) => resolve_pseudo(op, pseudo),
        Some(NameTarget::Opcode(id)) => resolve_real(op, id, registry),
        None => op.error = Some(Diagnostic::unknown_opcode(op.name_span)),
    }
}

fn resolve_pseudo(op: &mut OpNode, pseudo: PseudoOp) {
    op.pseudo = Some(pseudo);
    op.opcode_id = None;
    if op.param_count() != 2 {
        op.error = Some(Diagnostic::invalid_param_count_comparison(op.full_span));
        return;
    }
    op.operand = Some(0);
    op.output_arity = Some(1);
}

fn resolve_real(op: &mut OpNode, id: u16, registry: &OpMetaRegistry) {
    let meta = registry
        .get(id)
        .expect("registry.lookup only returns ids present in the table");
    op.opcode_id = Some(id);

    let args: Vec<i64> = op
        .operand_args
        .as_ref()
        .map(|a| a.iter().map(|arg| arg.value).collect())
        .unwrap_or_default();

    if meta.codec.is_zero() {
        if !args.is_empty() {
            op.error = Some(Diagnostic::invalid_operand_args(op.full_span));
            return;
        }
        op.operand = Some(0);
    } else if args.len() != meta.codec.expected_arg_count() {
        op.error = Some(Diagnostic::invalid_operand_args(op.full_span));
        return;
    } else {
        match meta.codec.validate(&args, op.param_count()) {
            Ok(()) => op.operand = Some(meta.codec.encode(&args, op.param_count())),
            Err(bad_index) => {
                let span = op
                    .operand_args
                    .as_ref()
                    .and_then(|a| a.get(bad_index))
                    .map(|a| a.span)
                    .unwrap_or(op.name_span);
                op.error = Some(Diagnostic::out_of_bound_operand_arg(span, bad_index));
                return;
            }
        }
    }

    let operand = op.operand.unwrap();
    op.output_arity = Some((meta.output_arity)(operand));

    if !(meta.params_valid)(op.param_count()) {
        op.error = Some(Diagnostic::invalid_param_count(op.full_span));
    }
}

/// A placeholder's generated text.
fn placeholder_text(name: &str, k: u8) -> String {
    format!("{name} output {k} placeholder")
}

/// Fills in multi-output placeholders over one fully-scanned sibling list:
/// for every multi-output `Op` in `nodes`, replace the `output_arity - 1`
/// right-most placeholder-sentinel (`value == placeholder`) siblings to
/// its left with generated placeholder values. Reports
/// `illegal_placement_of_outputs` on the op itself if there aren't enough
/// sentinels to consume.
///
/// A naive implementation would carry a cache of pending placeholder
/// slots across recursion levels; that collapses here into direct
/// in-place replacement, since every multi-output op's extra outputs are
/// always consumed from the same sibling list it was just appended to.
pub fn apply_multi_output_placeholders(nodes: &mut Vec<ParseNode>, placeholder: &str) {
    let op_positions: Vec<usize> = nodes
        .iter()
        .enumerate()
        .filter_map(|(i, n)| match n {
            ParseNode::Op(op) if op.output_arity.unwrap_or(1) > 1 && op.error.is_none() => Some(i),
            _ => None,
        })
        .collect();

    for op_index in op_positions {
        let (name, full_span, needed) = match &nodes[op_index] {
            ParseNode::Op(op) => (
                op.name.clone(),
                op.full_span,
                (op.output_arity.unwrap() - 1) as usize,
            ),
            _ => unreachable!(),
        };

        let mut slots_to_fill = Vec::new();
        for i in (0..op_index).rev() {
            if slots_to_fill.len() == needed {
                break;
            }
            if nodes[i].is_placeholder(placeholder) {
                slots_to_fill.push(i);
            }
        }

        if slots_to_fill.len() < needed {
            if let ParseNode::Op(op) = &mut nodes[op_index] {
                op.error = Some(Diagnostic::illegal_placement_of_outputs(
                    full_span,
                    slots_to_fill.len(),
                ));
            }
            continue;
        }

        // `slots_to_fill` was collected right-to-left; output k=1 (the
        // first extra output) fills the right-most sentinel.
        for (k, &slot) in slots_to_fill.iter().enumerate() {
            let output_index = (k + 1) as u8;
            nodes[slot] = ParseNode::Value(ValueNode {
                text: placeholder_text(&name, output_index),
                span: full_span,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::ValueNode;
    use crate::opcode::ids::OP_CALL;

    fn value(text: &str) -> ParseNode {
        ParseNode::Value(ValueNode {
            text: text.to_string(),
            span: Span::new(0, 0),
        })
    }

    #[test]
    fn unknown_name_is_an_error() {
        let mut op = OpNode::new("NOT_REAL".into(), Span::new(0, 8), Span::new(0, 11));
        resolve_op(&mut op, &OpMetaRegistry::default());
        assert!(op.error.is_some());
    }

    #[test]
    fn pseudo_requires_exactly_two_params() {
        let registry = OpMetaRegistry::default();
        let mut op = OpNode::new("GTE".into(), Span::new(0, 3), Span::new(0, 6));
        op.parameters = vec![value("1")];
        resolve_op(&mut op, &registry);
        assert!(op.error.is_some());
        assert_eq!(op.pseudo, Some(PseudoOp::Gte));
    }

    #[test]
    fn pseudo_resolves_to_operand_zero_output_one() {
        let registry = OpMetaRegistry::default();
        let mut op = OpNode::new("LTE".into(), Span::new(0, 3), Span::new(0, 8));
        op.parameters = vec![value("1"), value("2")];
        resolve_op(&mut op, &registry);
        assert_eq!(op.error, None);
        assert_eq!(op.operand, Some(0));
        assert_eq!(op.output_arity, Some(1));
    }

    #[test]
    fn multi_output_fills_placeholder_siblings() {
        let registry = OpMetaRegistry::default();
        let mut call = OpNode::new("CALL".into(), Span::new(10, 14), Span::new(10, 20));
        call.operand_args = Some(vec![
            crate::ast::OperandArg { value: 1, span: Span::new(0, 0) },
            crate::ast::OperandArg { value: 2, span: Span::new(0, 0) },
            crate::ast::OperandArg { value: 1, span: Span::new(0, 0) },
        ]);
        call.parameters = vec![value("1")];
        resolve_op(&mut call, &registry);
        assert_eq!(call.error, None);
        assert_eq!(call.opcode_id, Some(OP_CALL));
        assert_eq!(call.output_arity, Some(2));

        let mut nodes = vec![value("_"), ParseNode::Op(call)];
        apply_multi_output_placeholders(&mut nodes, "_");
        assert!(!nodes[0].is_placeholder("_"));
        if let ParseNode::Value(v) = &nodes[0] {
            assert!(v.text.contains("output 1 placeholder"));
        } else {
            panic!("expected value node");
        }
    }

    #[test]
    fn missing_placeholder_is_reported() {
        let registry = OpMetaRegistry::default();
        let mut call = OpNode::new("CALL".into(), Span::new(0, 4), Span::new(0, 10));
        call.operand_args = Some(vec![
            crate::ast::OperandArg { value: 1, span: Span::new(0, 0) },
            crate::ast::OperandArg { value: 2, span: Span::new(0, 0) },
            crate::ast::OperandArg { value: 1, span: Span::new(0, 0) },
        ]);
        call.parameters = vec![value("1")];
        resolve_op(&mut call, &registry);
        let mut nodes = vec![ParseNode::Op(call)];
        apply_multi_output_placeholders(&mut nodes, "_");
        if let ParseNode::Op(op) = &nodes[0] {
            assert!(op.error.is_some());
        } else {
            panic!("expected op node");
        }
    }
}
