//! # Opcode Metadata Registry
//!
//! An immutable-at-parse-time, indexable table of opcode descriptors:
//! name, aliases, arity functions, operand codec, and a short
//! documentation payload. Alias lookup goes through a single shared hash
//! map from normalised name to target — there is one map, not a separate
//! canonical table plus an alias table, so collisions between a canonical
//! name and someone else's alias are caught at construction time rather
//! than silently shadowed.
//!
//! The three pseudo-opcodes (`GTE`/`LTE`/`INEQ`) live in the same name
//! index but carry no [`OperandCodec`] or arity functions of their own:
//! their descriptors expose only `name`, `aliases`, and a documentation
//! payload, since they lower to a fixed two-instruction sequence rather
//! than being encoded directly.

use std::collections::HashMap;

use crate::ast::PseudoOp;
use crate::error::RainlangError;
use crate::lexer::normalize_name;
use crate::opcode::codec::{InputArity, OperandCodec};
use crate::opcode::ids::*;

pub type ParamsValidFn = fn(usize) -> bool;
pub type OutputArityFn = fn(u16) -> u8;
pub type InputArityFn = fn(u16) -> InputArity;

/// One opcode's full descriptor.
#[derive(Debug, Clone)]
pub struct OpMeta {
    pub id: u16,
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub input_arity: InputArityFn,
    pub output_arity: OutputArityFn,
    pub params_valid: ParamsValidFn,
    pub codec: OperandCodec,
    pub doc: String,
}

/// The reduced descriptor carried by a pseudo-opcode: no id, no codec, no
/// arity functions.
#[derive(Debug, Clone)]
pub struct PseudoMeta {
    pub canonical_name: String,
    pub aliases: Vec<String>,
    pub doc: String,
}

impl PseudoMeta {
    fn new(name: &str, doc: &str, aliases: &[&str]) -> Self {
        Self {
            canonical_name: name.to_string(),
            aliases: aliases.iter().map(|a| a.to_string()).collect(),
            doc: doc.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameTarget {
    Opcode(u16),
    Pseudo(PseudoOp),
}

#[derive(Debug, Clone)]
pub struct OpMetaRegistry {
    opcodes: Vec<OpMeta>,
    gte: PseudoMeta,
    lte: PseudoMeta,
    ineq: PseudoMeta,
    name_index: HashMap<String, NameTarget>,
}

impl OpMetaRegistry {
    /// Number of real (non-pseudo) opcodes.
    pub fn size(&self) -> u16 {
        self.opcodes.len() as u16
    }

    pub fn get(&self, id: u16) -> Option<&OpMeta> {
        self.opcodes.get(id as usize)
    }

    pub fn gte(&self) -> &PseudoMeta {
        &self.gte
    }

    pub fn lte(&self) -> &PseudoMeta {
        &self.lte
    }

    pub fn ineq(&self) -> &PseudoMeta {
        &self.ineq
    }

    /// Resolve a raw (un-normalised) identifier to an opcode or
    /// pseudo-opcode, applying the same normalisation as [`normalize_name`].
    pub fn lookup(&self, raw_name: &str) -> Option<NameTarget> {
        self.name_index.get(&normalize_name(raw_name)).copied()
    }

    pub fn contains(&self, raw_name: &str) -> bool {
        self.lookup(raw_name).is_some()
    }

    /// Rebuild the registry from a fresh set of opcode descriptors and
    /// pseudo-opcode metadata, validating that no two normalised names
    /// collide. A collision is a fatal registry-load error.
    pub fn build(
        opcodes: Vec<OpMeta>,
        gte: PseudoMeta,
        lte: PseudoMeta,
        ineq: PseudoMeta,
    ) -> Result<Self, RainlangError> {
        let _span = tracing::debug_span!("opcode_registry_build", opcodes = opcodes.len()).entered();
        let mut name_index = HashMap::new();
        for op in &opcodes {
            insert_unique(&mut name_index, &op.canonical_name, NameTarget::Opcode(op.id))?;
            for alias in &op.aliases {
                insert_unique(&mut name_index, alias, NameTarget::Opcode(op.id))?;
            }
        }
        for (pseudo, meta) in [
            (PseudoOp::Gte, &gte),
            (PseudoOp::Lte, &lte),
            (PseudoOp::Ineq, &ineq),
        ] {
            insert_unique(&mut name_index, &meta.canonical_name, NameTarget::Pseudo(pseudo))?;
            for alias in &meta.aliases {
                insert_unique(&mut name_index, alias, NameTarget::Pseudo(pseudo))?;
            }
        }
        Ok(Self {
            opcodes,
            gte,
            lte,
            ineq,
            name_index,
        })
    }

    /// Replace the entire opcode table, re-validating alias uniqueness.
    pub fn set_opmeta(&mut self, opcodes: Vec<OpMeta>) -> Result<(), RainlangError> {
        let rebuilt = Self::build(opcodes, self.gte.clone(), self.lte.clone(), self.ineq.clone())?;
        *self = rebuilt;
        Ok(())
    }

    fn set_pseudo_meta(
        &mut self,
        which: PseudoOp,
        name: Option<String>,
        description: Option<String>,
        aliases: Option<Vec<String>>,
    ) -> Result<(), RainlangError> {
        let mut updated = match which {
            PseudoOp::Gte => self.gte.clone(),
            PseudoOp::Lte => self.lte.clone(),
            PseudoOp::Ineq => self.ineq.clone(),
        };
        if let Some(name) = name {
            updated.canonical_name = name;
        }
        if let Some(desc) = description {
            updated.doc = desc;
        }
        if let Some(aliases) = aliases {
            updated.aliases = aliases;
        }
        let (gte, lte, ineq) = match which {
            PseudoOp::Gte => (updated, self.lte.clone(), self.ineq.clone()),
            PseudoOp::Lte => (self.gte.clone(), updated, self.ineq.clone()),
            PseudoOp::Ineq => (self.gte.clone(), self.lte.clone(), updated),
        };
        let rebuilt = Self::build(self.opcodes.clone(), gte, lte, ineq)?;
        *self = rebuilt;
        Ok(())
    }

    pub fn set_gte_meta(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        aliases: Option<Vec<String>>,
    ) -> Result<(), RainlangError> {
        self.set_pseudo_meta(PseudoOp::Gte, name, description, aliases)
    }

    pub fn set_lte_meta(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        aliases: Option<Vec<String>>,
    ) -> Result<(), RainlangError> {
        self.set_pseudo_meta(PseudoOp::Lte, name, description, aliases)
    }

    pub fn set_ineq_meta(
        &mut self,
        name: Option<String>,
        description: Option<String>,
        aliases: Option<Vec<String>>,
    ) -> Result<(), RainlangError> {
        self.set_pseudo_meta(PseudoOp::Ineq, name, description, aliases)
    }
}

fn insert_unique(
    index: &mut HashMap<String, NameTarget>,
    raw_name: &str,
    target: NameTarget,
) -> Result<(), RainlangError> {
    let key = normalize_name(raw_name);
    if index.insert(key, target).is_some() {
        tracing::error!(name = raw_name, "duplicate opcode alias during registry build");
        return Err(RainlangError::DuplicateAlias {
            name: raw_name.to_string(),
        });
    }
    Ok(())
}

// --- Arity/validity helpers, one small named fn per distinct rule --------

fn output_one(_: u16) -> u8 {
    1
}
fn output_zero(_: u16) -> u8 {
    0
}
fn output_call(operand: u16) -> u8 {
    // Bits 3-4 already hold the user-supplied outputSize value directly
    // (validated to [1,4)), not a zero-based field.
    ((operand >> 3) & 0b11) as u8
}
fn output_batch(operand: u16) -> u8 {
    operand as u8
}

fn input_fixed<const N: u8>(_: u16) -> InputArity {
    InputArity::Fixed(N)
}
fn input_dynamic(_: u16) -> InputArity {
    InputArity::Dynamic
}
fn input_call(operand: u16) -> InputArity {
    InputArity::Fixed((operand & 0b111) as u8)
}

fn valid_eq<const N: usize>(n: usize) -> bool {
    n == N
}
fn valid_gt<const N: usize>(n: usize) -> bool {
    n > N
}
fn valid_itierv2(n: usize) -> bool {
    matches!(n, 2 | 3 | 10)
}
fn valid_balance_batch(n: usize) -> bool {
    n > 2 && n % 2 == 1
}
fn valid_select_lte(n: usize) -> bool {
    n > 1
}
fn valid_any(_: usize) -> bool {
    true
}

/// Builds the default opcode table: the representative core set
/// (`ADD`/`MUL`/`HASH`/`ANY`/`ENSURE` and friends) rounded out with a
/// small supplement of common arithmetic and logic opcodes
/// (`SUB`/`DIV`/`MOD`/`MIN`/`MAX`/`AND`/`OR`/`EVERY`).
pub fn default_opcodes() -> Vec<OpMeta> {
    vec![
        OpMeta {
            id: OP_BLOCK_NUMBER,
            canonical_name: "BLOCK_NUMBER".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::Zero,
            doc: "Pushes the current block number.".into(),
        },
        OpMeta {
            id: OP_EAGER_IF,
            canonical_name: "EAGER_IF".into(),
            aliases: vec!["IF".into()],
            input_arity: input_fixed::<3>,
            output_arity: output_one,
            params_valid: valid_eq::<3>,
            codec: OperandCodec::Zero,
            doc: "Eagerly evaluates condition/then/else and selects one.".into(),
        },
        OpMeta {
            id: OP_LESS_THAN,
            canonical_name: "LESS_THAN".into(),
            aliases: vec!["LT".into()],
            input_arity: input_fixed::<2>,
            output_arity: output_one,
            params_valid: valid_eq::<2>,
            codec: OperandCodec::Zero,
            doc: "1 if the first operand is less than the second, else 0.".into(),
        },
        OpMeta {
            id: OP_GREATER_THAN,
            canonical_name: "GREATER_THAN".into(),
            aliases: vec!["GT".into()],
            input_arity: input_fixed::<2>,
            output_arity: output_one,
            params_valid: valid_eq::<2>,
            codec: OperandCodec::Zero,
            doc: "1 if the first operand is greater than the second, else 0.".into(),
        },
        OpMeta {
            id: OP_EQUAL_TO,
            canonical_name: "EQUAL_TO".into(),
            aliases: vec!["EQ".into()],
            input_arity: input_fixed::<2>,
            output_arity: output_one,
            params_valid: valid_eq::<2>,
            codec: OperandCodec::Zero,
            doc: "1 if both operands are equal, else 0.".into(),
        },
        OpMeta {
            id: OP_ISZERO,
            canonical_name: "ISZERO".into(),
            aliases: vec![],
            input_arity: input_fixed::<1>,
            output_arity: output_one,
            params_valid: valid_eq::<1>,
            codec: OperandCodec::Zero,
            doc: "1 if the operand is zero, else 0.".into(),
        },
        // ISALEV2_TOKEN and TOTAL_RESERVE_RECEIVED below are easy to mix up:
        // their name and description pair differently than a naive reading
        // of the underlying contract functions would suggest.
        OpMeta {
            id: OP_ISALEV2_TOKEN,
            canonical_name: "ISALEV2_TOKEN".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::Zero,
            doc: "Address of the sale's rTKN.".into(),
        },
        OpMeta {
            id: OP_ISALEV2_TOTAL_RESERVE_RECEIVED,
            canonical_name: "ISALEV2_TOTAL_RESERVE_RECEIVED".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::Zero,
            doc: "Total reserve token amount received by the sale so far.".into(),
        },
        OpMeta {
            id: OP_ADD,
            canonical_name: "ADD".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Sums all parameters.".into(),
        },
        OpMeta {
            id: OP_SUB,
            canonical_name: "SUB".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Subtracts each parameter from the first, in order.".into(),
        },
        OpMeta {
            id: OP_MUL,
            canonical_name: "MUL".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Multiplies all parameters.".into(),
        },
        OpMeta {
            id: OP_DIV,
            canonical_name: "DIV".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Divides the first parameter by each subsequent one, in order.".into(),
        },
        OpMeta {
            id: OP_MOD,
            canonical_name: "MOD".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Remainder of the first parameter by each subsequent one, in order.".into(),
        },
        OpMeta {
            id: OP_MIN,
            canonical_name: "MIN".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Smallest of all parameters.".into(),
        },
        OpMeta {
            id: OP_MAX,
            canonical_name: "MAX".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "Largest of all parameters.".into(),
        },
        OpMeta {
            id: OP_AND,
            canonical_name: "AND".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "1 if every parameter is non-zero, else 0.".into(),
        },
        OpMeta {
            id: OP_OR,
            canonical_name: "OR".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<1>,
            codec: OperandCodec::ParamCount,
            doc: "1 if any parameter is non-zero, else 0.".into(),
        },
        OpMeta {
            id: OP_ANY,
            canonical_name: "ANY".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<0>,
            codec: OperandCodec::ParamCount,
            doc: "The first non-zero parameter, or 0.".into(),
        },
        OpMeta {
            id: OP_EVERY,
            canonical_name: "EVERY".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<0>,
            codec: OperandCodec::ParamCount,
            doc: "The last parameter if all are non-zero, else 0.".into(),
        },
        OpMeta {
            id: OP_HASH,
            canonical_name: "HASH".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_gt::<0>,
            codec: OperandCodec::ParamCount,
            doc: "Keccak256 of all parameters, packed big-endian.".into(),
        },
        OpMeta {
            id: OP_ENSURE,
            canonical_name: "ENSURE".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_zero,
            params_valid: valid_gt::<0>,
            codec: OperandCodec::ParamCount,
            doc: "Reverts unless every parameter is non-zero.".into(),
        },
        OpMeta {
            id: OP_CALL,
            canonical_name: "CALL".into(),
            aliases: vec![],
            input_arity: input_call,
            output_arity: output_call,
            params_valid: valid_any,
            codec: OperandCodec::Call,
            doc: "Invokes another source by index, passing the top N stack values.".into(),
        },
        OpMeta {
            id: OP_CONTEXT,
            canonical_name: "CONTEXT".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::Context,
            doc: "Pushes a value from the context grid at (row, column).".into(),
        },
        OpMeta {
            id: OP_LOOP_N,
            canonical_name: "LOOP_N".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_zero,
            params_valid: valid_any,
            codec: OperandCodec::LoopN,
            doc: "Runs another source n times.".into(),
        },
        OpMeta {
            id: OP_STATE,
            canonical_name: "STATE".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::State,
            doc: "Pushes a constant or re-reads a stack slot, by memory kind and index.".into(),
        },
        OpMeta {
            id: OP_STORAGE,
            canonical_name: "STORAGE".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_one,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::SingleValue { bits: 16, signed: false },
            doc: "Reads a value from contract storage by slot index.".into(),
        },
        OpMeta {
            id: OP_DO_WHILE,
            canonical_name: "DO_WHILE".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_zero,
            params_valid: valid_gt::<0>,
            codec: OperandCodec::SingleValue { bits: 4, signed: false },
            doc: "Runs another source while its trailing condition is non-zero.".into(),
        },
        OpMeta {
            id: OP_SCALE_BY,
            canonical_name: "SCALE_BY".into(),
            aliases: vec![],
            input_arity: input_fixed::<1>,
            output_arity: output_one,
            params_valid: valid_eq::<1>,
            codec: OperandCodec::SingleValue { bits: 8, signed: true },
            doc: "Scales a fixed-point value by 10^n (n signed).".into(),
        },
        OpMeta {
            id: OP_SELECT_LTE,
            canonical_name: "SELECT_LTE".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_select_lte,
            codec: OperandCodec::SelectLte,
            doc: "Selects from report/reference pairs whose reference is <= a pivot.".into(),
        },
        OpMeta {
            id: OP_ITIERV2_REPORT,
            canonical_name: "ITIERV2_REPORT".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_one,
            params_valid: valid_itierv2,
            codec: OperandCodec::ItierV2Report,
            doc: "Reads a tier report from an ITierV2 contract.".into(),
        },
        OpMeta {
            id: OP_UPDATE_TIMES_FOR_TIER_RANGE,
            canonical_name: "UPDATE_TIMES_FOR_TIER_RANGE".into(),
            aliases: vec![],
            input_arity: input_fixed::<0>,
            output_arity: output_zero,
            params_valid: valid_eq::<0>,
            codec: OperandCodec::UpdateTimesForTierRange,
            doc: "Updates tier change timestamps across a tier range.".into(),
        },
        OpMeta {
            id: OP_IERC1155_BALANCE_OF_BATCH,
            canonical_name: "IERC1155_BALANCE_OF_BATCH".into(),
            aliases: vec![],
            input_arity: input_dynamic,
            output_arity: output_batch,
            params_valid: valid_balance_batch,
            codec: OperandCodec::Ierc1155BalanceOfBatch,
            doc: "Batch-queries ERC1155 balances; one output per (account, id) pair.".into(),
        },
    ]
}

/// Default pseudo-opcode descriptors.
pub fn default_gte() -> PseudoMeta {
    PseudoMeta::new(
        "GTE",
        "1 if the first operand is greater than or equal to the second, else 0.",
        &["GE"],
    )
}

pub fn default_lte() -> PseudoMeta {
    PseudoMeta::new(
        "LTE",
        "1 if the first operand is less than or equal to the second, else 0.",
        &["LE"],
    )
}

pub fn default_ineq() -> PseudoMeta {
    PseudoMeta::new("INEQ", "1 if the two operands are not equal, else 0.", &["NEQ"])
}

impl Default for OpMetaRegistry {
    fn default() -> Self {
        Self::build(default_opcodes(), default_gte(), default_lte(), default_ineq())
            .expect("default registry has no alias collisions")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_resolves_canonical_and_alias() {
        let reg = OpMetaRegistry::default();
        assert_eq!(reg.lookup("add"), Some(NameTarget::Opcode(OP_ADD)));
        assert_eq!(reg.lookup("less-than"), Some(NameTarget::Opcode(OP_LESS_THAN)));
        assert_eq!(reg.lookup("lt"), Some(NameTarget::Opcode(OP_LESS_THAN)));
        assert_eq!(reg.lookup("gte"), Some(NameTarget::Pseudo(PseudoOp::Gte)));
        assert_eq!(reg.lookup("nonexistent"), None);
    }

    #[test]
    fn set_gte_meta_renames_without_disturbing_other_entries() {
        let mut reg = OpMetaRegistry::default();
        reg.set_gte_meta(Some("GREATER_EQUAL".into()), None, None).unwrap();
        assert_eq!(reg.lookup("gte"), None);
        assert_eq!(
            reg.lookup("greater_equal"),
            Some(NameTarget::Pseudo(PseudoOp::Gte))
        );
        assert_eq!(reg.lookup("add"), Some(NameTarget::Opcode(OP_ADD)));
    }

    #[test]
    fn colliding_alias_is_rejected() {
        let mut opcodes = default_opcodes();
        opcodes[0].aliases.push("MUL".to_string());
        let err = OpMetaRegistry::build(opcodes, default_gte(), default_lte(), default_ineq());
        assert!(err.is_err());
    }

    #[test]
    fn arg_sentinel_id_is_opcode_count() {
        let reg = OpMetaRegistry::default();
        assert_eq!(reg.size(), OPCODE_COUNT);
    }
}
