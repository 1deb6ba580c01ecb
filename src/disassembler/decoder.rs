//! CIL instruction decoding.
//!
//! Turns the raw bytes of a method body into typed [`Instruction`] values. Decoding is
//! strictly linear: one opcode (plus its declared operand bytes) per step, in ascending
//! offset order. Metadata tokens are resolved eagerly through the supplied
//! [`TokenResolver`], and branch operands are converted from signed relative offsets to
//! absolute offsets within the body.
//!
//! # Example
//!
//! ```rust
//! use exprscope::{disassembler::decode_stream, metadata::TokenResolver, Parser};
//! # use exprscope::metadata::{FieldRef, MethodRef, TypeRef};
//! # struct NoTokens;
//! # impl TokenResolver for NoTokens {
//! #     fn resolve_string(&self, _: u32) -> exprscope::Result<String> { unreachable!() }
//! #     fn resolve_method(&self, _: u32) -> exprscope::Result<MethodRef> { unreachable!() }
//! #     fn resolve_field(&self, _: u32) -> exprscope::Result<FieldRef> { unreachable!() }
//! #     fn resolve_type(&self, _: u32) -> exprscope::Result<TypeRef> { unreachable!() }
//! # }
//!
//! let code = [0x00, 0x2A]; // nop, ret
//! let mut parser = Parser::new(&code);
//! let instructions = decode_stream(&mut parser, &NoTokens)?;
//! assert_eq!(instructions.len(), 2);
//! assert_eq!(instructions[1].mnemonic, "ret");
//! # Ok::<(), exprscope::Error>(())
//! ```

use crate::{
    disassembler::{
        instruction::{Immediate, Instruction, Operand, OperandKind},
        opcodes::{INSTRUCTIONS, INSTRUCTIONS_FE},
        parser::Parser,
    },
    metadata::TokenResolver,
    Error, Result,
};

/// Decodes a single CIL instruction from the current parser position.
///
/// Handles both single-byte and `0xFE`-prefixed opcodes via the two-level constant
/// tables, then reads 0, 1, 2, 4 or 8 further bytes according to the opcode's declared
/// operand kind. The parser advances exactly past the instruction, so repeated calls
/// decode a well-formed body sequentially.
///
/// # Arguments
/// * `parser` - A parser positioned at the start of an instruction
/// * `resolver` - Capability for resolving string/method/field/type tokens
///
/// # Errors
///
/// Returns an error if:
/// - The opcode byte (or prefixed pair) is reserved or unassigned
/// - The opcode's operand kind has no decoding rule ([`Error::UnsupportedOperand`])
/// - Operand bytes are truncated ([`Error::OutOfBounds`])
/// - Token resolution fails in the supplied resolver
pub fn decode_instruction(
    parser: &mut Parser,
    resolver: &dyn TokenResolver,
) -> Result<Instruction> {
    let offset = parser.pos();
    let first_byte = parser.read_le::<u8>()?;

    let (definition, prefix, opcode) = match first_byte {
        0xFE => {
            let second_byte = parser.read_le::<u8>()?;

            match INSTRUCTIONS_FE.get(second_byte as usize) {
                Some(def) if !def.is_reserved() => (def, 0xFE_u8, second_byte),
                _ => return Err(malformed_error!("Invalid opcode: FE {:02X}", second_byte)),
            }
        }
        _ => {
            let def = &INSTRUCTIONS[first_byte as usize];
            if def.is_reserved() {
                return Err(malformed_error!("Invalid opcode: {:02X}", first_byte));
            }
            (def, 0_u8, first_byte)
        }
    };

    let operand = match definition.operand {
        OperandKind::None => Operand::None,
        OperandKind::Int8 => Operand::Immediate(Immediate::Int8(parser.read_le::<i8>()?)),
        OperandKind::Int32 => Operand::Immediate(Immediate::Int32(parser.read_le::<i32>()?)),
        OperandKind::Int64 => Operand::Immediate(Immediate::Int64(parser.read_le::<i64>()?)),
        OperandKind::Float32 => Operand::Immediate(Immediate::Float32(parser.read_le::<f32>()?)),
        OperandKind::Float64 => Operand::Immediate(Immediate::Float64(parser.read_le::<f64>()?)),
        OperandKind::String => {
            Operand::String(resolver.resolve_string(parser.read_le::<u32>()?)?)
        }
        OperandKind::Variable => Operand::Variable(parser.read_le::<u16>()?),
        OperandKind::ShortVariable => Operand::Variable(u16::from(parser.read_le::<u8>()?)),
        OperandKind::BranchTarget => {
            let relative = parser.read_le::<i32>()?;
            // Absolute target = position immediately after the operand + signed offset
            Operand::Target(parser.pos() as i64 + i64::from(relative))
        }
        OperandKind::ShortBranchTarget => {
            let relative = parser.read_le::<i8>()?;
            Operand::Target(parser.pos() as i64 + i64::from(relative))
        }
        OperandKind::Method => {
            Operand::Method(resolver.resolve_method(parser.read_le::<u32>()?)?)
        }
        OperandKind::Field => Operand::Field(resolver.resolve_field(parser.read_le::<u32>()?)?),
        OperandKind::Type => Operand::Type(resolver.resolve_type(parser.read_le::<u32>()?)?),
        OperandKind::Token | OperandKind::Signature | OperandKind::SwitchTable => {
            return Err(Error::UnsupportedOperand {
                mnemonic: definition.mnemonic,
            })
        }
    };

    Ok(Instruction {
        offset,
        prefix,
        opcode,
        mnemonic: definition.mnemonic,
        flow: definition.flow,
        operand,
    })
}

/// Decodes a complete method body into an instruction vector.
///
/// Convenience wrapper over [`InstructionIter`] that stops at the first error.
///
/// # Arguments
/// * `parser` - A parser positioned at the start of the body
/// * `resolver` - Capability for resolving string/method/field/type tokens
///
/// # Errors
/// Propagates the first decoding failure; no partial prefix of the body is returned.
pub fn decode_stream(
    parser: &mut Parser,
    resolver: &dyn TokenResolver,
) -> Result<Vec<Instruction>> {
    let mut instructions = Vec::new();

    while parser.has_more_data() {
        instructions.push(decode_instruction(parser, resolver)?);
    }

    Ok(instructions)
}

/// A lazy, finite, non-restartable instruction sequence over a method body.
///
/// Yields one `Result<Instruction>` per decode step. After the first error the
/// iterator is fused: the failed decode consumed an unknown number of bytes, so
/// continuing would produce garbage offsets.
pub struct InstructionIter<'a> {
    parser: Parser<'a>,
    resolver: &'a dyn TokenResolver,
    failed: bool,
}

impl<'a> InstructionIter<'a> {
    /// Create an iterator over `body`, resolving tokens through `resolver`.
    #[must_use]
    pub fn new(body: &'a [u8], resolver: &'a dyn TokenResolver) -> Self {
        InstructionIter {
            parser: Parser::new(body),
            resolver,
            failed: false,
        }
    }
}

impl Iterator for InstructionIter<'_> {
    type Item = Result<Instruction>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || !self.parser.has_more_data() {
            return None;
        }

        let result = decode_instruction(&mut self.parser, self.resolver);
        if result.is_err() {
            self.failed = true;
        }
        Some(result)
    }
}
