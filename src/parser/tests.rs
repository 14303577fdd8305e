use super::*;

fn parse(text: &str) -> ParseTree {
    let registry = OpMetaRegistry::default();
    Parser::new(text, &registry, "_").parse()
}

fn only_root(tree: &ParseTree) -> &ParseNode {
    assert_eq!(tree.sub_exprs.len(), 1);
    assert_eq!(tree.sub_exprs[0].root_nodes.len(), 1);
    &tree.sub_exprs[0].root_nodes[0]
}

#[test]
fn empty_sub_expressions_have_no_errors() {
    let tree = parse(";;");
    assert_eq!(tree.sub_exprs.len(), 2);
    assert!(tree.sub_exprs[0].root_nodes.is_empty());
    assert!(tree.sub_exprs[1].root_nodes.is_empty());
    assert!(!tree.has_errors());
}

#[test]
fn prefix_binary_comparison() {
    let tree = parse("less_than(1 2)");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert_eq!(op.name, "less_than");
            assert_eq!(op.operand, Some(0));
            assert_eq!(op.output_arity, Some(1));
            assert_eq!(op.parameters.len(), 2);
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn nested_prefix_dedupes_at_codegen_not_parse_time() {
    let tree = parse("add(9 5 6 mul(9 6))");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert_eq!(op.name, "add");
            assert_eq!(op.parameters.len(), 4);
            assert_eq!(op.operand, Some(4));
            match &op.parameters[3] {
                ParseNode::Op(inner) => assert_eq!(inner.name, "mul"),
                other => panic!("expected nested Op, got {other:?}"),
            }
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn pseudo_op_gte_is_a_single_node() {
    let tree = parse("gte(5 3)");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert_eq!(op.pseudo, Some(crate::ast::PseudoOp::Gte));
            assert_eq!(op.opcode_id, None);
            assert_eq!(op.output_arity, Some(1));
            assert_eq!(op.error, None);
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn context_operand_matches_worked_example() {
    let tree = parse("context<2 6>()");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert_eq!(op.operand, Some(0x0206));
            assert_eq!(op.parameters.len(), 0);
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn postfix_notation_resolves_like_prefix() {
    let tree = parse("(5 3)gte");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert_eq!(op.pseudo, Some(crate::ast::PseudoOp::Gte));
            assert_eq!(op.parameters.len(), 2);
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn infix_chain_collapses_to_one_op() {
    let tree = parse("1 add 2 add 3");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => {
            assert!(op.infix);
            assert_eq!(op.name, "add");
            assert_eq!(op.parameters.len(), 3);
        }
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn infix_name_mismatch_is_an_error() {
    let tree = parse("1 add 2 mul 3");
    let node = only_root(&tree);
    assert!(matches!(node, ParseNode::Err(_)));
    assert!(tree.has_errors());
}

#[test]
fn unknown_opcode_is_reported() {
    let tree = parse("not_a_real_opcode(1 2)");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => assert!(op.error.is_some()),
        other => panic!("expected Op, got {other:?}"),
    }
    assert!(tree.has_errors());
}

#[test]
fn unclosed_paren_is_reported() {
    let tree = parse("add(1 2");
    assert!(tree.has_errors());
}

#[test]
fn call_out_of_bound_operand_arg_is_reported() {
    // inputSize must equal param_count (1 param supplied here, but the
    // operand-arg claims 2).
    let tree = parse("call<2 1 1>(5)");
    let node = only_root(&tree);
    match node {
        ParseNode::Op(op) => assert!(op.error.is_some()),
        other => panic!("expected Op, got {other:?}"),
    }
}

#[test]
fn multi_output_call_fills_placeholder_to_the_left() {
    let tree = parse("_ call<1 2 1>(5)");
    let sub = &tree.sub_exprs[0];
    assert_eq!(sub.root_nodes.len(), 2);
    match &sub.root_nodes[0] {
        ParseNode::Value(v) => assert!(v.text.contains("output 1 placeholder")),
        other => panic!("expected placeholder Value, got {other:?}"),
    }
}

#[test]
fn arg_reference_is_a_value_node() {
    let tree = parse("arg(2)");
    let node = only_root(&tree);
    match node {
        ParseNode::Value(v) => assert_eq!(v.text, "arg(2)"),
        other => panic!("expected Value, got {other:?}"),
    }
}
