//! # Opcode Id Constants
//!
//! Stable numeric tags for every opcode the default registry ships, laid
//! out the way `fuel-asm`'s `opcode/consts.rs` enumerates its own opcode
//! bytes: one `pub const` per id, grouped by family, so a decoder can
//! `match` on them without reaching into the registry.
//!
//! These ids are the `opcode_id` half of every emitted [`crate::state_config::Instruction`].
//! The pseudo-opcodes (`GTE`/`LTE`/`INEQ`) deliberately have no id here —
//! they only ever exist as a name in the registry and are lowered away
//! before codegen emits any instruction.

// --- Zero-operand --------------------------------------------------------

pub const OP_BLOCK_NUMBER: u16 = 0;
pub const OP_EAGER_IF: u16 = 1;
pub const OP_LESS_THAN: u16 = 2;
pub const OP_GREATER_THAN: u16 = 3;
pub const OP_EQUAL_TO: u16 = 4;
pub const OP_ISZERO: u16 = 5;
pub const OP_ISALEV2_TOKEN: u16 = 6;
pub const OP_ISALEV2_TOTAL_RESERVE_RECEIVED: u16 = 7;

// --- Dynamic-arity reducers (operand = param_count) -----------------------

pub const OP_ADD: u16 = 8;
pub const OP_SUB: u16 = 9;
pub const OP_MUL: u16 = 10;
pub const OP_DIV: u16 = 11;
pub const OP_MOD: u16 = 12;
pub const OP_MIN: u16 = 13;
pub const OP_MAX: u16 = 14;
pub const OP_AND: u16 = 15;
pub const OP_OR: u16 = 16;
pub const OP_ANY: u16 = 17;
pub const OP_EVERY: u16 = 18;
pub const OP_HASH: u16 = 19;
pub const OP_ENSURE: u16 = 20;

// --- Packed/bit-field operands --------------------------------------------

pub const OP_CALL: u16 = 21;
pub const OP_CONTEXT: u16 = 22;
pub const OP_LOOP_N: u16 = 23;
pub const OP_STATE: u16 = 24;
pub const OP_STORAGE: u16 = 25;
pub const OP_DO_WHILE: u16 = 26;
pub const OP_SCALE_BY: u16 = 27;
pub const OP_SELECT_LTE: u16 = 28;
pub const OP_ITIERV2_REPORT: u16 = 29;
pub const OP_UPDATE_TIMES_FOR_TIER_RANGE: u16 = 30;
pub const OP_IERC1155_BALANCE_OF_BATCH: u16 = 31;

/// One past the highest real opcode id. Equal to `registry.size()` for
/// the default opcode table.
pub const OPCODE_COUNT: u16 = 32;
