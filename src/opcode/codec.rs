//! # Operand Codecs
//!
//! An [`OperandCodec`] packs a small vector of signed integer
//! operand-arguments (plus, for a handful of opcodes, the parameter count)
//! into the single `u16` operand every instruction carries, and unpacks it
//! back. `validate` checks each supplied argument against the codec's
//! range rules — rules that may themselves depend on `param_count` (e.g.
//! `CALL`'s `inputSize` must equal the number of parameters).
//!
//! Every codec here is total over the ranges it accepts: `decode(encode(a))
//! == a` field-wise for any `a` that `validate` passed.

/// Arity of an opcode's input (parameter count), as a function of its
/// resolved operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputArity {
    Fixed(u8),
    Dynamic,
}

fn in_range(value: i64, lo: i64, hi_exclusive: i64) -> bool {
    value >= lo && value < hi_exclusive
}

/// Per-opcode operand layout. Each variant knows how many operand-arguments
/// it expects, how to validate them, and how to pack/unpack the `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandCodec {
    /// Operand is always `0`; the opcode accepts no `<...>` arguments.
    Zero,
    /// Operand is the parameter count itself; no explicit `<...>` args.
    /// `min` is the exclusive lower bound enforced on `param_count`
    /// elsewhere (`params_valid`), not here.
    ParamCount,
    /// `CALL`: bits 0-2 inputSize, 3-4 outputSize, 5-15 sourceIndex.
    /// Args, in order: `[inputSize, outputSize, sourceIndex]`.
    Call,
    /// `CONTEXT`: bits 0-7 row, 8-15 column (`context<2 6>()` packs to
    /// `0x0206`) — the *first* supplied argument lands in the high byte
    /// (column), the second in the low byte (row). See `DESIGN.md` for
    /// this resolution. Args, in order: `[column, row]`.
    Context,
    /// `LOOP_N`: bits 0-3 `n`, bits 4-7 `sourceIndex`. Args: `[n, sourceIndex]`.
    LoopN,
    /// `STATE`: bit 0 memory-kind, bits 1-7 index. Args: `[kind, index]`.
    State,
    /// A single packed value occupying the low `bits` bits of the operand.
    /// Covers `STORAGE`, `DO_WHILE`, and the scale opcodes.
    SingleValue { bits: u32, signed: bool },
    /// `SELECT_LTE`: bits 0-4 length, 5-6 mode, 7 logic. Args, with
    /// `length` as the *third* argument: `[logic, mode, length]`.
    SelectLte,
    /// `ITIERV2_REPORT`: operand = `param_count - 2`; no explicit args.
    ItierV2Report,
    /// `UPDATE_TIMES_FOR_TIER_RANGE`: bits 0-3 startTier, bits 4-7
    /// endTier — the encoder's layout. Args: `[startTier, endTier]`.
    UpdateTimesForTierRange,
    /// `IERC1155_BALANCE_OF_BATCH`: operand = `(param_count - 1) / 2`; no
    /// explicit args.
    Ierc1155BalanceOfBatch,
}

impl OperandCodec {
    pub fn is_zero(&self) -> bool {
        matches!(self, OperandCodec::Zero)
    }

    /// Number of `<...>` integers this codec expects to be supplied
    /// explicitly. Opcodes whose operand is wholly derived from
    /// `param_count` (`ParamCount`, `ItierV2Report`,
    /// `Ierc1155BalanceOfBatch`) expect none.
    pub fn expected_arg_count(&self) -> usize {
        match self {
            OperandCodec::Zero => 0,
            OperandCodec::ParamCount => 0,
            OperandCodec::Call => 3,
            OperandCodec::Context => 2,
            OperandCodec::LoopN => 2,
            OperandCodec::State => 2,
            OperandCodec::SingleValue { .. } => 1,
            OperandCodec::SelectLte => 3,
            OperandCodec::ItierV2Report => 0,
            OperandCodec::UpdateTimesForTierRange => 2,
            OperandCodec::Ierc1155BalanceOfBatch => 0,
        }
    }

    /// Validates each explicitly-supplied operand argument against this
    /// codec's range rules. Returns the index of the first offending
    /// argument on failure.
    pub fn validate(&self, args: &[i64], param_count: usize) -> Result<(), usize> {
        let pc = param_count as i64;
        match self {
            OperandCodec::Zero
            | OperandCodec::ParamCount
            | OperandCodec::ItierV2Report
            | OperandCodec::Ierc1155BalanceOfBatch => Ok(()),
            OperandCodec::Call => {
                let rules: [fn(i64, i64) -> bool; 3] = [
                    |v, pc| in_range(v, 0, 8) && v == pc,
                    |v, _| in_range(v, 1, 4),
                    |v, _| in_range(v, 1, 8),
                ];
                check(args, |i, v| rules[i](v, pc))
            }
            OperandCodec::Context => check(args, |_, v| in_range(v, 0, 256)),
            OperandCodec::LoopN => {
                let rules: [fn(i64) -> bool; 2] =
                    [|v| in_range(v, 0, 16), |v| in_range(v, 1, 16)];
                check(args, |i, v| rules[i](v))
            }
            OperandCodec::State => {
                let rules: [fn(i64) -> bool; 2] =
                    [|v| v == 0 || v == 1, |v| in_range(v, 0, 128)];
                check(args, |i, v| rules[i](v))
            }
            OperandCodec::SingleValue { bits, signed } => {
                let (lo, hi) = single_value_range(*bits, *signed);
                check(args, |_, v| in_range(v, lo, hi))
            }
            OperandCodec::SelectLte => {
                let rules: [fn(i64, i64) -> bool; 3] = [
                    |v, _| v == 0 || v == 1,
                    |v, _| in_range(v, 0, 3),
                    // The true constraint is `param_count == length + 1`,
                    // not a standalone range on `length`.
                    |v, pc| v == pc - 1,
                ];
                check(args, |i, v| rules[i](v, pc))
            }
            OperandCodec::UpdateTimesForTierRange => check(args, |_, v| in_range(v, 0, 9)),
        }
    }

    /// Packs already-validated arguments (plus `param_count`, for the
    /// codecs that need it) into the `u16` operand.
    pub fn encode(&self, args: &[i64], param_count: usize) -> u16 {
        match self {
            OperandCodec::Zero => 0,
            OperandCodec::ParamCount => param_count as u16,
            OperandCodec::Call => {
                let (input, output, source) = (args[0] as u16, args[1] as u16, args[2] as u16);
                (input & 0b111) | ((output & 0b11) << 3) | ((source & 0x7ff) << 5)
            }
            OperandCodec::Context => {
                let (column, row) = (args[0] as u16, args[1] as u16);
                (row & 0xff) | ((column & 0xff) << 8)
            }
            OperandCodec::LoopN => {
                let (n, source) = (args[0] as u16, args[1] as u16);
                (n & 0xf) | ((source & 0xf) << 4)
            }
            OperandCodec::State => {
                let (kind, index) = (args[0] as u16, args[1] as u16);
                (kind & 0x1) | ((index & 0x7f) << 1)
            }
            OperandCodec::SingleValue { bits, .. } => {
                let mask = if *bits >= 16 { 0xffff } else { (1u16 << bits) - 1 };
                (args[0] as u16) & mask
            }
            OperandCodec::SelectLte => {
                let (logic, mode, length) = (args[0] as u16, args[1] as u16, args[2] as u16);
                (length & 0x1f) | ((mode & 0b11) << 5) | ((logic & 0x1) << 7)
            }
            OperandCodec::ItierV2Report => (param_count as u16).wrapping_sub(2),
            OperandCodec::UpdateTimesForTierRange => {
                let (start, end) = (args[0] as u16, args[1] as u16);
                (start & 0xf) | ((end & 0xf) << 4)
            }
            OperandCodec::Ierc1155BalanceOfBatch => ((param_count - 1) / 2) as u16,
        }
    }

    /// Unpacks an operand back into its field values. For the codecs whose
    /// operand is derived from `param_count` rather than explicit
    /// arguments, `decode` reconstructs the inputs to `encode` (i.e. the
    /// parameter count itself), not the original values that produced it.
    pub fn decode(&self, operand: u16) -> Vec<i64> {
        match self {
            OperandCodec::Zero => vec![],
            OperandCodec::ParamCount => vec![operand as i64],
            OperandCodec::Call => {
                let input = operand & 0b111;
                let output = (operand >> 3) & 0b11;
                let source = (operand >> 5) & 0x7ff;
                vec![input as i64, output as i64, source as i64]
            }
            OperandCodec::Context => {
                let row = operand & 0xff;
                let column = (operand >> 8) & 0xff;
                vec![column as i64, row as i64]
            }
            OperandCodec::LoopN => {
                let n = operand & 0xf;
                let source = (operand >> 4) & 0xf;
                vec![n as i64, source as i64]
            }
            OperandCodec::State => {
                let kind = operand & 0x1;
                let index = (operand >> 1) & 0x7f;
                vec![kind as i64, index as i64]
            }
            OperandCodec::SingleValue { bits, signed } => {
                let mask = if *bits >= 16 { 0xffff } else { (1u16 << bits) - 1 };
                let raw = operand & mask;
                if *signed {
                    let sign_bit = 1u16 << (bits - 1);
                    if raw & sign_bit != 0 {
                        vec![(raw as i64) - (1i64 << bits)]
                    } else {
                        vec![raw as i64]
                    }
                } else {
                    vec![raw as i64]
                }
            }
            OperandCodec::SelectLte => {
                let length = operand & 0x1f;
                let mode = (operand >> 5) & 0b11;
                let logic = (operand >> 7) & 0x1;
                vec![logic as i64, mode as i64, length as i64]
            }
            // operand = param_count - 2, so decode inverts that.
            OperandCodec::ItierV2Report => vec![(operand as i64) + 2],
            OperandCodec::UpdateTimesForTierRange => {
                // Mask with 0xf (`& 15`) to match the encoder's 4-bit fields.
                let start = operand & 0xf;
                let end = (operand >> 4) & 0xf;
                vec![start as i64, end as i64]
            }
            // Reconstructs param_count, not the address/id pairs that were
            // originally supplied.
            OperandCodec::Ierc1155BalanceOfBatch => vec![(operand as i64) * 2 + 1],
        }
    }
}

fn single_value_range(bits: u32, signed: bool) -> (i64, i64) {
    if signed {
        let half = 1i64 << (bits - 1);
        (-half, half)
    } else {
        (0, 1i64 << bits)
    }
}

fn check(args: &[i64], rule: impl Fn(usize, i64) -> bool) -> Result<(), usize> {
    for (i, &v) in args.iter().enumerate() {
        if !rule(i, v) {
            return Err(i);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(codec: OperandCodec, args: &[i64], param_count: usize) {
        assert!(codec.validate(args, param_count).is_ok());
        let operand = codec.encode(args, param_count);
        assert_eq!(codec.decode(operand), args);
    }

    #[test]
    fn call_roundtrips() {
        roundtrip(OperandCodec::Call, &[1, 1, 1], 1);
    }

    #[test]
    fn context_matches_worked_example() {
        let operand = OperandCodec::Context.encode(&[2, 6], 0);
        assert_eq!(operand, 0x0206);
    }

    #[test]
    fn loop_n_roundtrips() {
        roundtrip(OperandCodec::LoopN, &[3, 5], 0);
    }

    #[test]
    fn state_roundtrips() {
        roundtrip(OperandCodec::State, &[1, 42], 0);
    }

    #[test]
    fn scale_by_handles_negatives() {
        let codec = OperandCodec::SingleValue { bits: 8, signed: true };
        assert!(codec.validate(&[-5], 1).is_ok());
        let operand = codec.encode(&[-5], 1);
        assert_eq!(operand, 0xfb);
        assert_eq!(codec.decode(operand), vec![-5]);
    }

    #[test]
    fn select_lte_enforces_param_count_relation() {
        let codec = OperandCodec::SelectLte;
        // param_count = 4 -> length must equal 3.
        assert!(codec.validate(&[0, 1, 3], 4).is_ok());
        assert_eq!(codec.validate(&[0, 1, 2], 4), Err(2));
    }

    #[test]
    fn update_times_for_tier_range_decoder_uses_4_bit_mask() {
        let codec = OperandCodec::UpdateTimesForTierRange;
        let operand = codec.encode(&[5, 7], 0);
        assert_eq!(codec.decode(operand), vec![5, 7]);
    }

    #[test]
    fn ierc1155_batch_decode_reconstructs_param_count() {
        let codec = OperandCodec::Ierc1155BalanceOfBatch;
        let operand = codec.encode(&[], 5);
        assert_eq!(operand, 2);
        assert_eq!(codec.decode(operand), vec![5]);
    }
}
