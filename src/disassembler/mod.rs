//! CIL instruction decoding.
//!
//! This module turns the raw bytes of a method body into an ordered sequence of typed
//! [`Instruction`] values. It covers the full ECMA-335 opcode encoding (single-byte and
//! `0xFE`-prefixed tables) and resolves embedded metadata tokens through the
//! [`crate::metadata::TokenResolver`] capability while decoding.
//!
//! # Key Types
//! - [`Instruction`] - One decoded CIL instruction with its operand
//! - [`Operand`] / [`Immediate`] - Decoded operand variants
//! - [`FlowType`] - How an instruction affects control flow
//! - [`Parser`] - Bounds-checked little-endian cursor over the body bytes
//!
//! # Main Functions
//! - [`decode_instruction`] - Decode a single instruction
//! - [`decode_stream`] - Decode a whole body eagerly
//! - [`InstructionIter`] - Decode lazily, one instruction per step

mod decoder;
mod instruction;
mod opcodes;
mod parser;

pub use decoder::{decode_instruction, decode_stream, InstructionIter};
pub use instruction::{FlowType, Immediate, Instruction, Operand, OperandKind};
pub use opcodes::{CilOpcode, INSTRUCTIONS, INSTRUCTIONS_FE};
pub use parser::{Parser, ReadLe};
