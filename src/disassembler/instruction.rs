//! Decoded CIL instruction representation.
//!
//! A method body decodes into an ordered sequence of [`Instruction`] values, one per
//! opcode, in ascending offset order. Instructions are immutable once decoded; all
//! later pipeline work happens on elements wrapping them, never on the instruction
//! itself.

use crate::metadata::{FieldRef, MethodRef, TypeRef};

/// Classification of how an opcode affects control flow.
///
/// Only the distinctions the decompilation pipeline acts on are modelled;
/// everything that falls through to the next instruction is [`FlowType::Sequential`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum FlowType {
    /// Execution continues with the next instruction
    Sequential,
    /// Method or constructor invocation, continues sequentially afterwards
    Call,
    /// Jump taken only when the popped condition matches the opcode's polarity
    ConditionalBranch,
    /// Jump always taken
    UnconditionalBranch,
    /// Returns from the current method
    Return,
    /// Raises or re-raises an exception
    Throw,
    /// Multi-way jump through an offset table
    Switch,
    /// Exception-region bookkeeping (`endfinally`, `endfilter`)
    EndRegion,
}

/// The operand kind an opcode declares in the instruction table.
///
/// Drives how many bytes follow the opcode and how they are interpreted.
/// Kinds without a decoding rule ([`OperandKind::Token`], [`OperandKind::Signature`],
/// [`OperandKind::SwitchTable`]) are kept in the table so the decoder can fail with
/// a named [`crate::Error::UnsupportedOperand`] instead of misreading the stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    /// No operand bytes
    None,
    /// Signed byte immediate
    Int8,
    /// 32-bit signed integer immediate
    Int32,
    /// 64-bit signed integer immediate
    Int64,
    /// 32-bit float immediate
    Float32,
    /// 64-bit float immediate
    Float64,
    /// 4-byte string token, resolved through the metadata capability
    String,
    /// 2-byte local/argument slot index (long form)
    Variable,
    /// 1-byte local/argument slot index (short form)
    ShortVariable,
    /// 4-byte signed relative branch target
    BranchTarget,
    /// 1-byte signed relative branch target
    ShortBranchTarget,
    /// 4-byte method token, resolved through the metadata capability
    Method,
    /// 4-byte field token, resolved through the metadata capability
    Field,
    /// 4-byte type token, resolved through the metadata capability
    Type,
    /// 4-byte metadata token of unknown table (`ldtoken`) - no decoding rule
    Token,
    /// 4-byte standalone signature token (`calli`) - no decoding rule
    Signature,
    /// Variable-length jump table (`switch`) - no decoding rule
    SwitchTable,
}

/// An immediate operand value carried inline in the instruction stream.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Immediate {
    /// Signed 8-bit value (`ldc.i4.s` and friends)
    Int8(i8),
    /// Signed 32-bit value
    Int32(i32),
    /// Signed 64-bit value
    Int64(i64),
    /// 32-bit float
    Float32(f32),
    /// 64-bit float
    Float64(f64),
}

/// A decoded instruction operand.
///
/// Token-based operands arrive already resolved: the decoder consults the
/// [`crate::metadata::TokenResolver`] capability while reading, so no raw token
/// values survive into the element pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// The opcode takes no operand
    None,
    /// Inline numeric value
    Immediate(Immediate),
    /// Resolved string literal (`ldstr`)
    String(String),
    /// Local variable or argument slot index
    Variable(u16),
    /// Absolute branch target offset within the method body.
    ///
    /// Computed as the position immediately after the operand plus the encoded
    /// signed relative value. May be negative for backward jumps; branch
    /// resolution rejects those, the decoder does not.
    Target(i64),
    /// Resolved method reference (`call`, `callvirt`, `newobj`, ...)
    Method(MethodRef),
    /// Resolved field reference (`ldfld`, `ldsfld`, ...)
    Field(FieldRef),
    /// Resolved type reference (`box`, `castclass`, ...)
    Type(TypeRef),
}

/// A single decoded CIL instruction.
///
/// Immutable once produced by the decoder. `prefix` is `0xFE` for two-byte
/// opcodes and `0` otherwise, mirroring the on-disk encoding.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Byte offset of the opcode within the method body
    pub offset: usize,
    /// First byte of a two-byte encoding, `0` for single-byte opcodes
    pub prefix: u8,
    /// The opcode value (second byte for `0xFE`-prefixed opcodes)
    pub opcode: u8,
    /// Human-readable opcode name, e.g. `"brfalse.s"`
    pub mnemonic: &'static str,
    /// How this instruction affects control flow
    pub flow: FlowType,
    /// The decoded operand
    pub operand: Operand,
}

impl Instruction {
    /// The absolute branch target, when this instruction carries one.
    #[must_use]
    pub fn branch_target(&self) -> Option<i64> {
        match self.operand {
            Operand::Target(target) => Some(target),
            _ => None,
        }
    }

    /// Polarity of a `brtrue`/`brfalse` conditional jump.
    ///
    /// Returns `Some(true)` when the jump is taken on a truthy condition,
    /// `Some(false)` for the `brfalse` family, and `None` for everything else -
    /// including the fused comparison branches (`beq`, `bgt`, ...), which branch
    /// resolution deliberately does not claim.
    #[must_use]
    pub fn conditional_polarity(&self) -> Option<bool> {
        match self.mnemonic {
            "brtrue" | "brtrue.s" => Some(true),
            "brfalse" | "brfalse.s" => Some(false),
            _ => None,
        }
    }
}

impl std::fmt::Display for Instruction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IL_{:04x}: {}", self.offset, self.mnemonic)?;
        match &self.operand {
            Operand::None => Ok(()),
            Operand::Immediate(Immediate::Int8(v)) => write!(f, " {v}"),
            Operand::Immediate(Immediate::Int32(v)) => write!(f, " {v}"),
            Operand::Immediate(Immediate::Int64(v)) => write!(f, " {v}"),
            Operand::Immediate(Immediate::Float32(v)) => write!(f, " {v}"),
            Operand::Immediate(Immediate::Float64(v)) => write!(f, " {v}"),
            Operand::String(s) => write!(f, " \"{s}\""),
            Operand::Variable(slot) => write!(f, " {slot}"),
            // Backward targets are negative; hex-formatting those would print
            // the two's-complement bit pattern, so they render in decimal.
            Operand::Target(target) if *target >= 0 => write!(f, " IL_{target:04x}"),
            Operand::Target(target) => write!(f, " {target}"),
            Operand::Method(m) => write!(f, " {}::{}", m.declaring_type, m.name),
            Operand::Field(fld) => write!(f, " {}::{}", fld.declaring_type, fld.name),
            Operand::Type(ty) => write!(f, " {}", ty.name),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::test::branch_at;

    #[test]
    fn forward_target_displays_as_il_label() {
        let instruction = branch_at(1, "br.s", 0x0A);

        assert_eq!(instruction.to_string(), "IL_0001: br.s IL_000a");
    }

    #[test]
    fn backward_target_displays_signed() {
        let instruction = branch_at(4, "br.s", -2);

        assert_eq!(instruction.to_string(), "IL_0004: br.s -2");
    }
}
