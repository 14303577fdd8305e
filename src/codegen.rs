//! # Code Generator
//!
//! Post-order traversal over a resolved parse tree, emitting one byte
//! buffer per sub-expression. Generation is all-or-nothing: any error
//! anywhere in the tree short-circuits straight to an empty `StateConfig`.

use crate::ast::{ParseNode, ParseTree, PseudoOp, SubExpr, ValueNode};
use crate::opcode::codec::OperandCodec;
use crate::opcode::ids::{OP_EQUAL_TO, OP_GREATER_THAN, OP_ISZERO, OP_LESS_THAN, OP_STATE};
use crate::state_config::{Instruction, StateConfig};
use crate::value::{self, U256};

/// Lowers a fully-resolved parse tree into a `StateConfig`. Returns the
/// empty config if `tree` contains any error node — the tree remains
/// available for diagnostics regardless. Opcode ids and operands are
/// already resolved on every node by the time a tree reaches here, so
/// generation itself needs no registry.
pub fn generate(tree: &ParseTree) -> StateConfig {
    let _span = tracing::debug_span!("codegen", sub_exprs = tree.sub_exprs.len()).entered();
    if tree.has_errors() {
        tracing::debug!("tree has errors, emitting empty StateConfig");
        return StateConfig::empty();
    }

    let arg_offsets = arg_offsets(&tree.sub_exprs);

    let mut constants: Vec<U256> = Vec::new();
    let mut raw_sources: Vec<Vec<Instruction>> = Vec::new();

    for (sub, &offset) in tree.sub_exprs.iter().zip(&arg_offsets) {
        let mut instructions = Vec::new();
        for node in &sub.root_nodes {
            emit_node(node, offset, &mut constants, &mut instructions);
        }
        raw_sources.push(instructions);
    }

    // Every `arg(n)` sentinel so far carries `n + arg_offsets[source]`; now
    // that the constant pool is final, fold its length in too so each
    // source's arguments land in their own disjoint tail slice.
    rewrite_arg_sentinels(&mut raw_sources, constants.len());

    let sources = raw_sources
        .into_iter()
        .map(|instructions| {
            let mut buf = Vec::with_capacity(instructions.len() * 4);
            for instr in instructions {
                buf.extend_from_slice(&instr.to_bytes());
            }
            buf
        })
        .collect();

    StateConfig { constants, sources }
}

/// Computes each sub-expression's starting offset into the shared
/// `arg(n)` index space: sub-expression `i` owns the half-open range
/// `[offsets[i], offsets[i] + arg_count(i))`, where `arg_count(i)` is one
/// past the highest `arg(n)` it references. Sources that reference no
/// `arg(n)` at all claim a zero-width range and don't shift anyone after
/// them.
fn arg_offsets(sub_exprs: &[SubExpr]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(sub_exprs.len());
    let mut running = 0usize;
    for sub in sub_exprs {
        offsets.push(running);
        running += arg_count(sub);
    }
    offsets
}

fn arg_count(sub: &SubExpr) -> usize {
    sub.root_nodes
        .iter()
        .filter_map(highest_arg_index)
        .max()
        .map_or(0, |highest| highest + 1)
}

fn highest_arg_index(node: &ParseNode) -> Option<usize> {
    match node {
        ParseNode::Value(v) => arg_ref_index(&v.text).map(|n| n as usize),
        ParseNode::Op(op) => op.parameters.iter().filter_map(highest_arg_index).max(),
        ParseNode::Err(_) => None,
    }
}

fn emit_node(node: &ParseNode, arg_offset: usize, constants: &mut Vec<U256>, out: &mut Vec<Instruction>) {
    match node {
        ParseNode::Value(v) => emit_value(v, arg_offset, constants, out),
        ParseNode::Op(op) => emit_op(op, arg_offset, constants, out),
        ParseNode::Err(_) => {
            unreachable!("generate() returns early when the tree has any error node")
        }
    }
}

fn emit_value(v: &ValueNode, arg_offset: usize, constants: &mut Vec<U256>, out: &mut Vec<Instruction>) {
    if let Some(n) = arg_ref_index(&v.text) {
        // Sentinel rewritten by `rewrite_arg_sentinels` once every
        // regular constant has been collected; the operand already holds
        // this source's offset so concurrent sources never collide.
        out.push(Instruction::new(u16::MAX, (n as usize + arg_offset) as u16));
        return;
    }

    let value = if value::is_max_uint_keyword(&v.text) {
        value::max_uint256()
    } else if let Some(literal) = value::parse_integer_literal(&v.text) {
        literal
    } else {
        // The placeholder, or a generated multi-output placeholder that
        // went unconsumed: neither pushes a value of its own.
        return;
    };

    let index = constant_index(constants, value);
    push_state_constant(out, index);
}

fn emit_op(op: &crate::ast::OpNode, arg_offset: usize, constants: &mut Vec<U256>, out: &mut Vec<Instruction>) {
    for param in &op.parameters {
        emit_node(param, arg_offset, constants, out);
    }

    if let Some(pseudo) = op.pseudo {
        let comparison = match pseudo {
            PseudoOp::Gte => OP_LESS_THAN,
            PseudoOp::Lte => OP_GREATER_THAN,
            PseudoOp::Ineq => OP_EQUAL_TO,
        };
        out.push(Instruction::new(comparison, 0));
        out.push(Instruction::new(OP_ISZERO, 0));
        return;
    }

    let id = op
        .opcode_id
        .expect("a resolved, error-free Op always has an opcode id or is a pseudo-op");
    let operand = op
        .operand
        .expect("a resolved, error-free Op always has an operand");
    out.push(Instruction::new(id, operand));
}

/// Linear-search constant dedup: every distinct literal value appears at
/// most once in the pool, regardless of how many times it's referenced.
fn constant_index(constants: &mut Vec<U256>, value: U256) -> usize {
    match constants.iter().position(|c| *c == value) {
        Some(i) => i,
        None => {
            constants.push(value);
            constants.len() - 1
        }
    }
}

fn push_state_constant(out: &mut Vec<Instruction>, index: usize) {
    let operand = OperandCodec::State.encode(&[0, index as i64], 0);
    out.push(Instruction::new(OP_STATE, operand));
}

fn arg_ref_index(text: &str) -> Option<i64> {
    text.strip_prefix("arg(")?.strip_suffix(')')?.parse().ok()
}

/// Rewrites every `arg(n)` sentinel (`opcode_id == u16::MAX`, used only
/// as an in-flight marker, never a real opcode id) into
/// `STATE(constant, operand + final_constants_len)`, where `operand`
/// already carries the emitting source's `arg_offset`.
fn rewrite_arg_sentinels(sources: &mut [Vec<Instruction>], final_constants_len: usize) {
    for source in sources.iter_mut() {
        for instr in source.iter_mut() {
            if instr.opcode_id == u16::MAX {
                let index = instr.operand as usize + final_constants_len;
                let operand = OperandCodec::State.encode(&[0, index as i64], 0);
                *instr = Instruction::new(OP_STATE, operand);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::opcode::ids::{OP_ADD, OP_MUL};
    use crate::opcode::OpMetaRegistry;
    use crate::parser::Parser;
    // Bytecode vectors are long and easy to eyeball-miss a single mismatched
    // instruction in; pretty_assertions' diff makes the offending element
    // obvious instead of dumping both vectors in full.
    use pretty_assertions::assert_eq;

    fn compile(text: &str) -> StateConfig {
        let registry = OpMetaRegistry::default();
        let tree = Parser::new(text, &registry, "_").parse();
        generate(&tree)
    }

    #[test]
    fn add_with_nested_mul_matches_worked_example() {
        let config = compile("add(9 5 6 mul(9 6))");
        assert_eq!(config.constants, vec![U256::from(9u64), U256::from(5u64), U256::from(6u64)]);
        assert_eq!(config.sources.len(), 1);

        let instrs = StateConfig::decode_source(&config.sources[0]);
        let expected = vec![
            Instruction::new(OP_STATE, 0),
            Instruction::new(OP_STATE, 2),
            Instruction::new(OP_STATE, 4),
            Instruction::new(OP_STATE, 0),
            Instruction::new(OP_STATE, 4),
            Instruction::new(OP_MUL, 2),
            Instruction::new(OP_ADD, 4),
        ];
        assert_eq!(instrs, expected);
    }

    #[test]
    fn gte_lowers_to_less_than_then_iszero() {
        let config = compile("gte(5 3)");
        let instrs = StateConfig::decode_source(&config.sources[0]);
        let tail = &instrs[instrs.len() - 2..];
        assert_eq!(tail, &[Instruction::new(OP_LESS_THAN, 0), Instruction::new(OP_ISZERO, 0)]);
    }

    #[test]
    fn context_emits_single_instruction_with_no_params() {
        let config = compile("context<2 6>()");
        let instrs = StateConfig::decode_source(&config.sources[0]);
        assert_eq!(instrs, vec![Instruction::new(crate::opcode::ids::OP_CONTEXT, 0x0206)]);
    }

    #[test]
    fn two_empty_subexprs_have_no_errors_and_two_empty_sources() {
        let config = compile(";;");
        assert_eq!(config.sources, vec![Vec::<u8>::new(), Vec::<u8>::new()]);
        assert!(config.constants.is_empty());
    }

    #[test]
    fn any_error_anywhere_yields_the_empty_config() {
        let config = compile("not_a_real_opcode(1 2)");
        assert_eq!(config, StateConfig::empty());
    }

    #[test]
    fn repeated_literal_is_deduplicated() {
        let config = compile("add(4 4 4)");
        assert_eq!(config.constants, vec![U256::from(4u64)]);
        let instrs = StateConfig::decode_source(&config.sources[0]);
        assert!(instrs.iter().all(|i| i.opcode_id != u16::MAX));
    }

    #[test]
    fn arg_refs_in_different_sources_get_disjoint_constant_slices() {
        // Each source's `arg(0)` must resolve to a distinct constant index:
        // the first source owns offset 0 (one arg slot), the second owns
        // offset 1, both appended after the two literal constants.
        let config = compile("add(1 arg(0)); mul(2 arg(0))");
        assert_eq!(config.constants, vec![U256::from(1u64), U256::from(2u64)]);
        assert_eq!(config.sources.len(), 2);

        let first = StateConfig::decode_source(&config.sources[0]);
        let second = StateConfig::decode_source(&config.sources[1]);

        // STATE(constant, 2) == index 2 == the first source's arg(0) slot.
        assert_eq!(first, vec![
            Instruction::new(OP_STATE, 0),
            Instruction::new(OP_STATE, 4),
            Instruction::new(OP_ADD, 2),
        ]);
        // STATE(constant, 3) == index 3 == the second source's arg(0) slot,
        // not a collision with the first source's.
        assert_eq!(second, vec![
            Instruction::new(OP_STATE, 2),
            Instruction::new(OP_STATE, 6),
            Instruction::new(OP_MUL, 2),
        ]);
    }

    #[test]
    fn arg_ref_offset_skips_past_a_prior_sources_own_arg_count() {
        // First source references arg(0) and arg(1) (arg_count == 2), so
        // the second source's arg(0) must land at offset 2, not 1.
        let config = compile("add(arg(0) arg(1)); arg(0)");
        assert!(config.constants.is_empty());

        let second = StateConfig::decode_source(&config.sources[1]);
        let op = OperandCodec::State.encode(&[0, 2], 0);
        assert_eq!(second, vec![Instruction::new(OP_STATE, op)]);
    }
}
