//! # Notation-Aware Recursive-Descent Parser
//!
//! Turns source text into a [`ParseTree`]. The three
//! notations share one engine: a flat "slot list" is scanned for a given
//! nesting level (sub-expression body, parenthesised group, or a prefix
//! op's parameter list), then reduced — if the slots are a strict
//! `operand OP operand OP ... operand` alternation, they collapse into a
//! single infix [`OpNode`]; otherwise they stand as sibling nodes
//! unchanged. Prefix and postfix forms are recognised and resolved
//! in-line as the scan encounters them, so by the time a level's slot
//! list is assembled every element in it is already a fully resolved
//! node — resolution is bottom-up (post-order) for free.

#[cfg(test)]
mod tests;

use crate::ast::{OpNode, OperandArg, ParseNode, ParseTree, SubExpr, ValueNode};
use crate::error::Diagnostic;
use crate::lexer::{self, LeadChar};
use crate::opcode::registry::NameTarget;
use crate::opcode::OpMetaRegistry;
use crate::span::Span;
use crate::value;

/// One item of a level's flat scan before infix reduction.
enum Slot {
    Node(ParseNode),
    /// A bare word that normalises to a known opcode/pseudo name and was
    /// not consumed as a prefix or postfix head — an infix-operator
    /// candidate.
    Operator(String, Span),
}

pub struct Parser<'a> {
    source: &'a str,
    registry: &'a OpMetaRegistry,
    placeholder: &'a str,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a str, registry: &'a OpMetaRegistry, placeholder: &'a str) -> Self {
        Self {
            source,
            registry,
            placeholder,
        }
    }

    /// Parses the whole program: split on `;` at the top level, each slice
    /// becoming one [`SubExpr`].
    pub fn parse(&self) -> ParseTree {
        let mut sub_exprs = Vec::new();
        let mut start = 0usize;
        for (i, c) in self.source.char_indices() {
            if c == ';' {
                sub_exprs.push(self.parse_sub_expr(start, i));
                start = i + 1;
            }
        }
        if start < self.source.len() {
            sub_exprs.push(self.parse_sub_expr(start, self.source.len()));
        }
        ParseTree { sub_exprs }
    }

    fn parse_sub_expr(&self, start: usize, end: usize) -> SubExpr {
        SubExpr {
            source_span: Span::new(start, end),
            root_nodes: self.parse_elements(start, end),
        }
    }

    /// Scans then reduces one nesting level.
    fn parse_elements(&self, start: usize, end: usize) -> Vec<ParseNode> {
        let mut slots = self.scan_slots(start, end);
        self.apply_placeholders_in_slots(&mut slots);
        self.reduce_slots(slots, Span::new(start, end))
    }

    /// Fills in multi-output placeholder siblings over just the `Node`
    /// slots of this level, leaving interleaved `Operator` slots untouched.
    fn apply_placeholders_in_slots(&self, slots: &mut [Slot]) {
        let node_indices: Vec<usize> = slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| matches!(s, Slot::Node(_)).then_some(i))
            .collect();
        let mut nodes: Vec<ParseNode> = node_indices
            .iter()
            .map(|&i| match std::mem::replace(&mut slots[i], Slot::Operator(String::new(), Span::default())) {
                Slot::Node(n) => n,
                Slot::Operator(..) => unreachable!(),
            })
            .collect();
        crate::resolver::apply_multi_output_placeholders(&mut nodes, self.placeholder);
        for (idx, node) in node_indices.into_iter().zip(nodes) {
            slots[idx] = Slot::Node(node);
        }
    }

    fn scan_slots(&self, start: usize, end: usize) -> Vec<Slot> {
        let mut slots = Vec::new();
        let mut pos = start;
        while pos < end {
            let trimmed = lexer::trim_separators(&self.source[pos..end]);
            pos = end - trimmed.len();
            if pos >= end {
                break;
            }
            match lexer::classify_lead(trimmed) {
                Some(LeadChar::Open) => pos = self.scan_paren(pos, end, &mut slots),
                Some(LeadChar::Close) => {
                    slots.push(Slot::Node(ParseNode::Err(Diagnostic::invalid_closing_paren(
                        Span::point(pos),
                    ))));
                    pos += 1;
                }
                Some(LeadChar::OperandArgsOpen) => {
                    // A `<...>` block with no preceding opcode word at all.
                    let (result, next_pos) = self.scan_operand_args(pos, end);
                    let diag = match result {
                        Ok(_) => Diagnostic::invalid_use_of_operand_args(Span::new(pos, next_pos)),
                        Err(d) => d,
                    };
                    slots.push(Slot::Node(ParseNode::Err(diag)));
                    pos = next_pos;
                }
                Some(LeadChar::Word) | None => pos = self.scan_word(pos, end, &mut slots),
            }
        }
        slots
    }

    /// Handles the `(` branch: parse the inner group, then check for an
    /// immediately-trailing opcode name (postfix) or the tie-break
    /// "invalid notation" case of a second prefix occurrence.
    fn scan_paren(&self, open_idx: usize, end: usize, slots: &mut Vec<Slot>) -> usize {
        let close_idx = match find_matching_paren(self.source, open_idx, end) {
            Some(idx) => idx,
            None => {
                slots.push(Slot::Node(ParseNode::Err(Diagnostic::no_closing_paren(
                    Span::new(open_idx, end),
                ))));
                return end;
            }
        };
        let inner = self.parse_elements(open_idx + 1, close_idx);
        let mut pos = close_idx + 1;

        let trimmed = lexer::trim_separators(&self.source[pos..end]);
        let after_sep = end - trimmed.len();
        if matches!(lexer::classify_lead(trimmed), Some(LeadChar::Word)) {
            let word_end = after_sep + lexer::next_boundary(trimmed).unwrap_or(trimmed.len());
            let word = &self.source[after_sep..word_end];
            if self.registry.contains(word) {
                let name_span = Span::new(after_sep, word_end);
                pos = word_end;

                let next_trimmed = lexer::trim_separators(&self.source[pos..end]);
                let next_pos = end - next_trimmed.len();
                if matches!(lexer::classify_lead(next_trimmed), Some(LeadChar::Open)) {
                    // `)OP(` — ambiguous between postfix-on-first-group and
                    // a fresh prefix occurrence.
                    let second_close =
                        find_matching_paren(self.source, next_pos, end).unwrap_or(end);
                    let span = Span::new(open_idx, second_close.min(end) + 1);
                    slots.push(Slot::Node(ParseNode::Err(Diagnostic::invalid_notation(span))));
                    return (second_close + 1).min(end);
                }

                let full_span = Span::new(open_idx, word_end);
                let mut op = OpNode::new(word.to_string(), name_span, full_span);
                op.paren_spans.push(Span::new(open_idx, close_idx + 1));
                op.parameters = inner;
                crate::resolver::resolve_op(&mut op, self.registry);
                slots.push(Slot::Node(ParseNode::Op(op)));
                return pos;
            }
        }

        // No postfix tail: splice the group's contents in as siblings.
        for node in inner {
            slots.push(Slot::Node(node));
        }
        pos
    }

    /// Handles a leading word: `arg(n)`, a prefix head, a bare
    /// literal/placeholder/keyword, or an infix-operator candidate.
    fn scan_word(&self, start: usize, end: usize, slots: &mut Vec<Slot>) -> usize {
        let text = &self.source[start..end];
        let word_len = lexer::next_boundary(text).unwrap_or(text.len());
        let word_end = start + word_len;
        let word = &self.source[start..word_end];
        let name_span = Span::new(start, word_end);

        if word.eq_ignore_ascii_case("arg") && self.source[word_end..end].starts_with('(') {
            return self.scan_arg_ref(start, word_end, end, slots);
        }

        let mut pos = word_end;
        let mut operand_args: Option<Vec<OperandArg>> = None;
        let mut args_span_end = word_end;

        let trimmed = lexer::trim_separators(&self.source[pos..end]);
        pos = end - trimmed.len();
        if matches!(lexer::classify_lead(trimmed), Some(LeadChar::OperandArgsOpen)) {
            let (result, next_pos) = self.scan_operand_args(pos, end);
            match result {
                Ok(args) => {
                    operand_args = Some(args);
                    args_span_end = next_pos;
                }
                Err(diag) => {
                    slots.push(Slot::Node(ParseNode::Err(diag)));
                    return next_pos;
                }
            }
            pos = next_pos;
        }

        let trimmed = lexer::trim_separators(&self.source[pos..end]);
        let after_args_pos = end - trimmed.len();
        match lexer::classify_lead(trimmed) {
            Some(LeadChar::Open) => {
                let open_idx = after_args_pos;
                let close_idx = match find_matching_paren(self.source, open_idx, end) {
                    Some(idx) => idx,
                    None => {
                        slots.push(Slot::Node(ParseNode::Err(Diagnostic::no_closing_paren(
                            Span::new(open_idx, end),
                        ))));
                        return end;
                    }
                };
                let params = self.parse_elements(open_idx + 1, close_idx);
                let full_span = Span::new(start, close_idx + 1);
                let mut op = OpNode::new(word.to_string(), name_span, full_span);
                op.paren_spans.push(Span::new(open_idx, close_idx + 1));
                op.parameters = params;
                op.operand_args = operand_args;
                crate::resolver::resolve_op(&mut op, self.registry);
                slots.push(Slot::Node(ParseNode::Op(op)));
                close_idx + 1
            }
            // Operand-args were supplied, so this word has committed to
            // being a prefix head — anything other than `(` next is
            // illegal.
            _ if operand_args.is_some() => {
                let span = Span::new(start, args_span_end);
                slots.push(Slot::Node(ParseNode::Err(
                    Diagnostic::illegal_characters_between_opcode_and_paren(span),
                )));
                pos
            }
            _ => {
                slots.push(self.classify_bare_word(word, name_span));
                pos
            }
        }
    }

    fn classify_bare_word(&self, word: &str, span: Span) -> Slot {
        if word == self.placeholder {
            return Slot::Node(ParseNode::Value(ValueNode {
                text: word.to_string(),
                span,
            }));
        }
        if value::is_max_uint_keyword(word) || value::parse_integer_literal(word).is_some() {
            return Slot::Node(ParseNode::Value(ValueNode {
                text: word.to_string(),
                span,
            }));
        }
        if self.registry.contains(word) {
            return Slot::Operator(word.to_string(), span);
        }
        Slot::Node(ParseNode::Value(ValueNode {
            text: word.to_string(),
            span,
        }))
    }

    fn scan_arg_ref(
        &self,
        start: usize,
        word_end: usize,
        end: usize,
        slots: &mut Vec<Slot>,
    ) -> usize {
        let open_idx = word_end;
        let close_idx = match find_matching_paren(self.source, open_idx, end) {
            Some(idx) => idx,
            None => {
                slots.push(Slot::Node(ParseNode::Err(Diagnostic::no_closing_paren(
                    Span::new(open_idx, end),
                ))));
                return end;
            }
        };
        let inner = self.source[open_idx + 1..close_idx].trim();
        let full_span = Span::new(start, close_idx + 1);
        match inner.parse::<i64>() {
            Ok(n) => {
                slots.push(Slot::Node(ParseNode::Value(ValueNode {
                    text: format!("arg({n})"),
                    span: full_span,
                })));
            }
            Err(_) => {
                slots.push(Slot::Node(ParseNode::Err(Diagnostic::invalid_operand_args(
                    full_span,
                ))));
            }
        }
        close_idx + 1
    }

    /// Scans a `<...>` block starting at `pos` (which points at `<`).
    /// Returns the parsed args (or the diagnostic explaining why scanning
    /// failed) and the position just after the block.
    fn scan_operand_args(
        &self,
        pos: usize,
        end: usize,
    ) -> (Result<Vec<OperandArg>, Diagnostic>, usize) {
        let bytes = self.source.as_bytes();
        let mut i = pos + 1;
        while i < end {
            match bytes[i] {
                b'>' => {
                    let text_span = Span::new(pos + 1, i);
                    let result = self
                        .parse_operand_arg_ints(text_span)
                        .ok_or_else(|| Diagnostic::invalid_operand_args(Span::new(pos, i + 1)));
                    return (result, i + 1);
                }
                b'(' | b')' | b'<' => {
                    return (
                        Err(Diagnostic::invalid_character_in_operand_args(Span::point(i))),
                        i,
                    );
                }
                _ => i += 1,
            }
        }
        (Err(Diagnostic::expected_close_angle(Span::point(end))), end)
    }

    fn parse_operand_arg_ints(&self, span: Span) -> Option<Vec<OperandArg>> {
        let text = span.slice(self.source);
        let mut args = Vec::new();
        let mut offset = 0usize;
        for token in text.split(|c: char| c == ' ' || c == ',') {
            if token.is_empty() {
                offset += 1;
                continue;
            }
            let token_start = span.start + offset;
            let token_span = Span::new(token_start, token_start + token.len());
            match token.parse::<i64>() {
                Ok(value) => args.push(OperandArg {
                    value,
                    span: token_span,
                }),
                Err(_) => return None,
            }
            offset += token.len() + 1;
        }
        Some(args)
    }

    /// Collapses a flat slot list into its final sibling nodes, applying
    /// infix lowering and its tie-break rule for adjacent infix operators.
    fn reduce_slots(&self, slots: Vec<Slot>, full_span: Span) -> Vec<ParseNode> {
        if !slots.iter().any(|s| matches!(s, Slot::Operator(..))) {
            return slots
                .into_iter()
                .map(|s| match s {
                    Slot::Node(n) => n,
                    Slot::Operator(..) => unreachable!(),
                })
                .collect();
        }

        if slots.len() == 1 {
            if let Slot::Operator(_, span) = &slots[0] {
                return vec![ParseNode::Err(Diagnostic::ambiguous_expression_opcode(*span))];
            }
        }

        // Strict alternation: Node, Operator, Node, Operator, ..., Node,
        // every operator sharing the same canonical opcode/pseudo target.
        let mut canonical: Option<NameTarget> = None;
        let mut operands = Vec::new();
        let mut op_name: Option<String> = None;
        let mut valid_shape = slots.len() % 2 == 1;
        for (i, slot) in slots.iter().enumerate() {
            let expect_operand = i % 2 == 0;
            match slot {
                Slot::Node(_) if expect_operand => {}
                Slot::Operator(name, _) if !expect_operand => {
                    let target = self.registry.lookup(name);
                    match (canonical, target) {
                        (None, Some(t)) => {
                            canonical = Some(t);
                            op_name = Some(name.clone());
                        }
                        (Some(c), Some(t)) if c == t => {}
                        _ => valid_shape = false,
                    }
                }
                _ => valid_shape = false,
            }
        }

        if !valid_shape || canonical.is_none() {
            return vec![ParseNode::Err(Diagnostic::invalid_infix_expression(full_span))];
        }

        for slot in slots {
            if let Slot::Node(n) = slot {
                operands.push(n);
            }
        }

        let name = op_name.unwrap();
        let name_span = full_span;
        let mut op = OpNode::new(name, name_span, full_span);
        op.infix = true;
        op.parameters = operands;
        crate::resolver::resolve_op(&mut op, self.registry);
        vec![ParseNode::Op(op)]
    }
}

/// Finds the `)` matching the `(` at `open_idx`, scanning only within
/// `[open_idx, end)`.
fn find_matching_paren(source: &str, open_idx: usize, end: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0i32;
    let mut i = open_idx;
    while i < end {
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Parses `source` into a [`ParseTree`] using the default placeholder
/// `_`. Thin convenience wrapper around [`Parser`] for callers that don't
/// need to customise it.
pub fn parse_tree(source: &str, registry: &OpMetaRegistry) -> ParseTree {
    Parser::new(source, registry, "_").parse()
}
