//! # Opcode Metadata
//!
//! Everything the parser, resolver, and code generator need to know about
//! opcodes without hard-coding a single one: stable ids ([`ids`]), operand
//! packing rules ([`codec`]), and the name-indexed descriptor table
//! ([`registry`]).

pub mod codec;
pub mod ids;
pub mod registry;

pub use codec::{InputArity, OperandCodec};
pub use registry::{NameTarget, OpMeta, OpMetaRegistry, PseudoMeta};
