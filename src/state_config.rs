//! # StateConfig — the Compiled Artifact
//!
//! The wire format the code generator emits: a vector of 256-bit
//! constants plus a vector of per-source instruction buffers. Fixed
//! little-endian fields throughout, no varint cleverness — just two
//! `u16`s per instruction instead of a variable-length opcode/operand
//! scheme.

use crate::error::RainlangError;
use crate::value::{from_be_bytes, to_be_bytes, U256};

/// Magic header for the serialised [`StateConfig`] envelope.
const MAGIC: &[u8; 4] = b"RAIN";
/// Packed `(MAJOR << 16) | (MINOR << 8) | PATCH`.
const FORMAT_VERSION: u32 = (0 << 16) | (1 << 8) | 0;

/// One packed VM instruction: `opcode_id` then `operand`, each a
/// little-endian `u16`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Instruction {
    pub opcode_id: u16,
    pub operand: u16,
}

impl Instruction {
    pub fn new(opcode_id: u16, operand: u16) -> Self {
        Self { opcode_id, operand }
    }

    /// 4-byte little-endian encoding: `opcode_id || operand`.
    pub fn to_bytes(self) -> [u8; 4] {
        let mut out = [0u8; 4];
        out[0..2].copy_from_slice(&self.opcode_id.to_le_bytes());
        out[2..4].copy_from_slice(&self.operand.to_le_bytes());
        out
    }

    pub fn from_bytes(bytes: [u8; 4]) -> Self {
        let opcode_id = u16::from_le_bytes([bytes[0], bytes[1]]);
        let operand = u16::from_le_bytes([bytes[2], bytes[3]]);
        Self { opcode_id, operand }
    }
}

/// The deployable artifact a successful compile produces. An erroring
/// tree produces `StateConfig::empty()`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StateConfig {
    pub constants: Vec<U256>,
    pub sources: Vec<Vec<u8>>,
}

impl StateConfig {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Big-endian 32-byte encoding of every constant, in order.
    pub fn encoded_constants(&self) -> Vec<[u8; 32]> {
        self.constants.iter().map(to_be_bytes).collect()
    }

    /// Decodes one source buffer back into its instruction stream. Used
    /// by tests and the CLI's `--disassemble` mode; the core compiler
    /// never needs to read its own output back.
    pub fn decode_source(source: &[u8]) -> Vec<Instruction> {
        source
            .chunks_exact(4)
            .map(|chunk| Instruction::from_bytes(chunk.try_into().unwrap()))
            .collect()
    }

    /// Serialises the whole config into one self-describing envelope:
    /// magic, version, constants (length-prefixed, 32 bytes each), then
    /// sources (length-prefixed byte buffers), all little-endian.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(MAGIC);
        out.extend_from_slice(&FORMAT_VERSION.to_le_bytes());

        out.extend_from_slice(&(self.constants.len() as u32).to_le_bytes());
        for constant in &self.constants {
            out.extend_from_slice(&to_be_bytes(constant));
        }

        out.extend_from_slice(&(self.sources.len() as u32).to_le_bytes());
        for source in &self.sources {
            out.extend_from_slice(&(source.len() as u32).to_le_bytes());
            out.extend_from_slice(source);
        }
        out
    }

    /// Inverse of [`to_bytes`](Self::to_bytes). Rejects a bad magic/version
    /// header or a truncated buffer as a [`RainlangError::Io`].
    pub fn from_bytes(data: &[u8]) -> Result<Self, RainlangError> {
        let mut cursor = Cursor::new(data);

        if cursor.take(4)? != MAGIC.as_slice() {
            return Err(truncated("bad magic header"));
        }
        let version = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap());
        if version != FORMAT_VERSION {
            return Err(truncated("unsupported StateConfig format version"));
        }

        let constant_count = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap());
        let mut constants = Vec::with_capacity(constant_count as usize);
        for _ in 0..constant_count {
            let bytes: [u8; 32] = cursor.take(32)?.try_into().unwrap();
            constants.push(from_be_bytes(bytes));
        }

        let source_count = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap());
        let mut sources = Vec::with_capacity(source_count as usize);
        for _ in 0..source_count {
            let len = u32::from_le_bytes(cursor.take(4)?.try_into().unwrap()) as usize;
            sources.push(cursor.take(len)?.to_vec());
        }

        Ok(Self { constants, sources })
    }
}

/// A minimal forward-only cursor over a byte slice, just enough for
/// `from_bytes` to read fixed-size and length-prefixed fields without
/// pulling in a framing crate for a handful of reads.
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], RainlangError> {
        let end = self.pos.checked_add(n).ok_or_else(|| truncated("length overflow"))?;
        let slice = self.data.get(self.pos..end).ok_or_else(|| truncated("buffer too short"))?;
        self.pos = end;
        Ok(slice)
    }
}

fn truncated(reason: &str) -> RainlangError {
    RainlangError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, reason.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn instruction_roundtrips_through_bytes() {
        let instr = Instruction::new(8, 4);
        assert_eq!(Instruction::from_bytes(instr.to_bytes()), instr);
    }

    #[test]
    fn decode_source_recovers_instruction_stream() {
        let instrs = vec![Instruction::new(24, 0), Instruction::new(8, 2)];
        let mut bytes = Vec::new();
        for i in &instrs {
            bytes.extend_from_slice(&i.to_bytes());
        }
        assert_eq!(StateConfig::decode_source(&bytes), instrs);
    }

    #[test]
    fn empty_config_has_no_constants_or_sources() {
        assert_eq!(StateConfig::empty(), StateConfig::default());
    }

    #[test]
    fn envelope_roundtrips() {
        let config = StateConfig {
            constants: vec![U256::from(1u64), U256::MAX],
            sources: vec![vec![24, 0, 0, 0], vec![]],
        };
        let bytes = config.to_bytes();
        assert_eq!(StateConfig::from_bytes(&bytes).unwrap(), config);
    }

    #[test]
    fn from_bytes_rejects_bad_magic() {
        assert!(StateConfig::from_bytes(b"nope").is_err());
    }

    #[test]
    fn from_bytes_rejects_truncated_buffer() {
        let mut bytes = StateConfig::empty().to_bytes();
        bytes.pop();
        bytes.extend_from_slice(&[0, 0, 0, 0, 0]);
        assert!(StateConfig::from_bytes(&bytes[..bytes.len() - 3]).is_err());
    }
}
