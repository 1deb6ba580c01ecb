//! Constant CIL opcode tables.
//!
//! The ECMA-335 instruction set is encoded in two compile-time tables: one indexed by
//! the first byte ([`INSTRUCTIONS`]) and one for the `0xFE`-prefixed extended opcodes
//! ([`INSTRUCTIONS_FE`]). Each entry declares the mnemonic, the operand kind (which
//! fully determines how many bytes follow and how to interpret them) and the flow
//! classification. Reserved encodings carry an empty mnemonic and are rejected by the
//! decoder.

use crate::disassembler::instruction::{FlowType, OperandKind};

/// One entry of the opcode tables.
#[derive(Debug, Clone, Copy)]
pub struct CilOpcode {
    /// Opcode name, empty for reserved encodings
    pub mnemonic: &'static str,
    /// Declared operand kind
    pub operand: OperandKind,
    /// Control flow classification
    pub flow: FlowType,
}

impl CilOpcode {
    /// Whether this table slot is a reserved, unassigned encoding.
    #[must_use]
    pub fn is_reserved(&self) -> bool {
        self.mnemonic.is_empty()
    }
}

const RESERVED: CilOpcode = CilOpcode {
    mnemonic: "",
    operand: OperandKind::None,
    flow: FlowType::Sequential,
};

const fn op(mnemonic: &'static str, operand: OperandKind, flow: FlowType) -> CilOpcode {
    CilOpcode {
        mnemonic,
        operand,
        flow,
    }
}

/// Single-byte opcode table, indexed by the opcode value.
pub static INSTRUCTIONS: [CilOpcode; 256] = build_instructions();

/// `0xFE`-prefixed opcode table, indexed by the second byte.
pub static INSTRUCTIONS_FE: [CilOpcode; 0x1F] = build_instructions_fe();

#[allow(clippy::too_many_lines)]
const fn build_instructions() -> [CilOpcode; 256] {
    use FlowType as F;
    use OperandKind as K;

    let mut t = [RESERVED; 256];

    t[0x00] = op("nop", K::None, F::Sequential);
    t[0x01] = op("break", K::None, F::Sequential);
    t[0x02] = op("ldarg.0", K::None, F::Sequential);
    t[0x03] = op("ldarg.1", K::None, F::Sequential);
    t[0x04] = op("ldarg.2", K::None, F::Sequential);
    t[0x05] = op("ldarg.3", K::None, F::Sequential);
    t[0x06] = op("ldloc.0", K::None, F::Sequential);
    t[0x07] = op("ldloc.1", K::None, F::Sequential);
    t[0x08] = op("ldloc.2", K::None, F::Sequential);
    t[0x09] = op("ldloc.3", K::None, F::Sequential);
    t[0x0A] = op("stloc.0", K::None, F::Sequential);
    t[0x0B] = op("stloc.1", K::None, F::Sequential);
    t[0x0C] = op("stloc.2", K::None, F::Sequential);
    t[0x0D] = op("stloc.3", K::None, F::Sequential);
    t[0x0E] = op("ldarg.s", K::ShortVariable, F::Sequential);
    t[0x0F] = op("ldarga.s", K::ShortVariable, F::Sequential);
    t[0x10] = op("starg.s", K::ShortVariable, F::Sequential);
    t[0x11] = op("ldloc.s", K::ShortVariable, F::Sequential);
    t[0x12] = op("ldloca.s", K::ShortVariable, F::Sequential);
    t[0x13] = op("stloc.s", K::ShortVariable, F::Sequential);
    t[0x14] = op("ldnull", K::None, F::Sequential);
    t[0x15] = op("ldc.i4.m1", K::None, F::Sequential);
    t[0x16] = op("ldc.i4.0", K::None, F::Sequential);
    t[0x17] = op("ldc.i4.1", K::None, F::Sequential);
    t[0x18] = op("ldc.i4.2", K::None, F::Sequential);
    t[0x19] = op("ldc.i4.3", K::None, F::Sequential);
    t[0x1A] = op("ldc.i4.4", K::None, F::Sequential);
    t[0x1B] = op("ldc.i4.5", K::None, F::Sequential);
    t[0x1C] = op("ldc.i4.6", K::None, F::Sequential);
    t[0x1D] = op("ldc.i4.7", K::None, F::Sequential);
    t[0x1E] = op("ldc.i4.8", K::None, F::Sequential);
    t[0x1F] = op("ldc.i4.s", K::Int8, F::Sequential);
    t[0x20] = op("ldc.i4", K::Int32, F::Sequential);
    t[0x21] = op("ldc.i8", K::Int64, F::Sequential);
    t[0x22] = op("ldc.r4", K::Float32, F::Sequential);
    t[0x23] = op("ldc.r8", K::Float64, F::Sequential);
    t[0x25] = op("dup", K::None, F::Sequential);
    t[0x26] = op("pop", K::None, F::Sequential);
    t[0x27] = op("jmp", K::Method, F::UnconditionalBranch);
    t[0x28] = op("call", K::Method, F::Call);
    t[0x29] = op("calli", K::Signature, F::Call);
    t[0x2A] = op("ret", K::None, F::Return);
    t[0x2B] = op("br.s", K::ShortBranchTarget, F::UnconditionalBranch);
    t[0x2C] = op("brfalse.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x2D] = op("brtrue.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x2E] = op("beq.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x2F] = op("bge.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x30] = op("bgt.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x31] = op("ble.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x32] = op("blt.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x33] = op("bne.un.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x34] = op("bge.un.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x35] = op("bgt.un.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x36] = op("ble.un.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x37] = op("blt.un.s", K::ShortBranchTarget, F::ConditionalBranch);
    t[0x38] = op("br", K::BranchTarget, F::UnconditionalBranch);
    t[0x39] = op("brfalse", K::BranchTarget, F::ConditionalBranch);
    t[0x3A] = op("brtrue", K::BranchTarget, F::ConditionalBranch);
    t[0x3B] = op("beq", K::BranchTarget, F::ConditionalBranch);
    t[0x3C] = op("bge", K::BranchTarget, F::ConditionalBranch);
    t[0x3D] = op("bgt", K::BranchTarget, F::ConditionalBranch);
    t[0x3E] = op("ble", K::BranchTarget, F::ConditionalBranch);
    t[0x3F] = op("blt", K::BranchTarget, F::ConditionalBranch);
    t[0x40] = op("bne.un", K::BranchTarget, F::ConditionalBranch);
    t[0x41] = op("bge.un", K::BranchTarget, F::ConditionalBranch);
    t[0x42] = op("bgt.un", K::BranchTarget, F::ConditionalBranch);
    t[0x43] = op("ble.un", K::BranchTarget, F::ConditionalBranch);
    t[0x44] = op("blt.un", K::BranchTarget, F::ConditionalBranch);
    t[0x45] = op("switch", K::SwitchTable, F::Switch);
    t[0x46] = op("ldind.i1", K::None, F::Sequential);
    t[0x47] = op("ldind.u1", K::None, F::Sequential);
    t[0x48] = op("ldind.i2", K::None, F::Sequential);
    t[0x49] = op("ldind.u2", K::None, F::Sequential);
    t[0x4A] = op("ldind.i4", K::None, F::Sequential);
    t[0x4B] = op("ldind.u4", K::None, F::Sequential);
    t[0x4C] = op("ldind.i8", K::None, F::Sequential);
    t[0x4D] = op("ldind.i", K::None, F::Sequential);
    t[0x4E] = op("ldind.r4", K::None, F::Sequential);
    t[0x4F] = op("ldind.r8", K::None, F::Sequential);
    t[0x50] = op("ldind.ref", K::None, F::Sequential);
    t[0x51] = op("stind.ref", K::None, F::Sequential);
    t[0x52] = op("stind.i1", K::None, F::Sequential);
    t[0x53] = op("stind.i2", K::None, F::Sequential);
    t[0x54] = op("stind.i4", K::None, F::Sequential);
    t[0x55] = op("stind.i8", K::None, F::Sequential);
    t[0x56] = op("stind.r4", K::None, F::Sequential);
    t[0x57] = op("stind.r8", K::None, F::Sequential);
    t[0x58] = op("add", K::None, F::Sequential);
    t[0x59] = op("sub", K::None, F::Sequential);
    t[0x5A] = op("mul", K::None, F::Sequential);
    t[0x5B] = op("div", K::None, F::Sequential);
    t[0x5C] = op("div.un", K::None, F::Sequential);
    t[0x5D] = op("rem", K::None, F::Sequential);
    t[0x5E] = op("rem.un", K::None, F::Sequential);
    t[0x5F] = op("and", K::None, F::Sequential);
    t[0x60] = op("or", K::None, F::Sequential);
    t[0x61] = op("xor", K::None, F::Sequential);
    t[0x62] = op("shl", K::None, F::Sequential);
    t[0x63] = op("shr", K::None, F::Sequential);
    t[0x64] = op("shr.un", K::None, F::Sequential);
    t[0x65] = op("neg", K::None, F::Sequential);
    t[0x66] = op("not", K::None, F::Sequential);
    t[0x67] = op("conv.i1", K::None, F::Sequential);
    t[0x68] = op("conv.i2", K::None, F::Sequential);
    t[0x69] = op("conv.i4", K::None, F::Sequential);
    t[0x6A] = op("conv.i8", K::None, F::Sequential);
    t[0x6B] = op("conv.r4", K::None, F::Sequential);
    t[0x6C] = op("conv.r8", K::None, F::Sequential);
    t[0x6D] = op("conv.u4", K::None, F::Sequential);
    t[0x6E] = op("conv.u8", K::None, F::Sequential);
    t[0x6F] = op("callvirt", K::Method, F::Call);
    t[0x70] = op("cpobj", K::Type, F::Sequential);
    t[0x71] = op("ldobj", K::Type, F::Sequential);
    t[0x72] = op("ldstr", K::String, F::Sequential);
    t[0x73] = op("newobj", K::Method, F::Call);
    t[0x74] = op("castclass", K::Type, F::Sequential);
    t[0x75] = op("isinst", K::Type, F::Sequential);
    t[0x76] = op("conv.r.un", K::None, F::Sequential);
    t[0x79] = op("unbox", K::Type, F::Sequential);
    t[0x7A] = op("throw", K::None, F::Throw);
    t[0x7B] = op("ldfld", K::Field, F::Sequential);
    t[0x7C] = op("ldflda", K::Field, F::Sequential);
    t[0x7D] = op("stfld", K::Field, F::Sequential);
    t[0x7E] = op("ldsfld", K::Field, F::Sequential);
    t[0x7F] = op("ldsflda", K::Field, F::Sequential);
    t[0x80] = op("stsfld", K::Field, F::Sequential);
    t[0x81] = op("stobj", K::Type, F::Sequential);
    t[0x82] = op("conv.ovf.i1.un", K::None, F::Sequential);
    t[0x83] = op("conv.ovf.i2.un", K::None, F::Sequential);
    t[0x84] = op("conv.ovf.i4.un", K::None, F::Sequential);
    t[0x85] = op("conv.ovf.i8.un", K::None, F::Sequential);
    t[0x86] = op("conv.ovf.u1.un", K::None, F::Sequential);
    t[0x87] = op("conv.ovf.u2.un", K::None, F::Sequential);
    t[0x88] = op("conv.ovf.u4.un", K::None, F::Sequential);
    t[0x89] = op("conv.ovf.u8.un", K::None, F::Sequential);
    t[0x8A] = op("conv.ovf.i.un", K::None, F::Sequential);
    t[0x8B] = op("conv.ovf.u.un", K::None, F::Sequential);
    t[0x8C] = op("box", K::Type, F::Sequential);
    t[0x8D] = op("newarr", K::Type, F::Sequential);
    t[0x8E] = op("ldlen", K::None, F::Sequential);
    t[0x8F] = op("ldelema", K::Type, F::Sequential);
    t[0x90] = op("ldelem.i1", K::None, F::Sequential);
    t[0x91] = op("ldelem.u1", K::None, F::Sequential);
    t[0x92] = op("ldelem.i2", K::None, F::Sequential);
    t[0x93] = op("ldelem.u2", K::None, F::Sequential);
    t[0x94] = op("ldelem.i4", K::None, F::Sequential);
    t[0x95] = op("ldelem.u4", K::None, F::Sequential);
    t[0x96] = op("ldelem.i8", K::None, F::Sequential);
    t[0x97] = op("ldelem.i", K::None, F::Sequential);
    t[0x98] = op("ldelem.r4", K::None, F::Sequential);
    t[0x99] = op("ldelem.r8", K::None, F::Sequential);
    t[0x9A] = op("ldelem.ref", K::None, F::Sequential);
    t[0x9B] = op("stelem.i", K::None, F::Sequential);
    t[0x9C] = op("stelem.i1", K::None, F::Sequential);
    t[0x9D] = op("stelem.i2", K::None, F::Sequential);
    t[0x9E] = op("stelem.i4", K::None, F::Sequential);
    t[0x9F] = op("stelem.i8", K::None, F::Sequential);
    t[0xA0] = op("stelem.r4", K::None, F::Sequential);
    t[0xA1] = op("stelem.r8", K::None, F::Sequential);
    t[0xA2] = op("stelem.ref", K::None, F::Sequential);
    t[0xA3] = op("ldelem", K::Type, F::Sequential);
    t[0xA4] = op("stelem", K::Type, F::Sequential);
    t[0xA5] = op("unbox.any", K::Type, F::Sequential);
    t[0xB3] = op("conv.ovf.i1", K::None, F::Sequential);
    t[0xB4] = op("conv.ovf.u1", K::None, F::Sequential);
    t[0xB5] = op("conv.ovf.i2", K::None, F::Sequential);
    t[0xB6] = op("conv.ovf.u2", K::None, F::Sequential);
    t[0xB7] = op("conv.ovf.i4", K::None, F::Sequential);
    t[0xB8] = op("conv.ovf.u4", K::None, F::Sequential);
    t[0xB9] = op("conv.ovf.i8", K::None, F::Sequential);
    t[0xBA] = op("conv.ovf.u8", K::None, F::Sequential);
    t[0xC2] = op("refanyval", K::Type, F::Sequential);
    t[0xC3] = op("ckfinite", K::None, F::Sequential);
    t[0xC6] = op("mkrefany", K::Type, F::Sequential);
    t[0xD0] = op("ldtoken", K::Token, F::Sequential);
    t[0xD1] = op("conv.u2", K::None, F::Sequential);
    t[0xD2] = op("conv.u1", K::None, F::Sequential);
    t[0xD3] = op("conv.i", K::None, F::Sequential);
    t[0xD4] = op("conv.ovf.i", K::None, F::Sequential);
    t[0xD5] = op("conv.ovf.u", K::None, F::Sequential);
    t[0xD6] = op("add.ovf", K::None, F::Sequential);
    t[0xD7] = op("add.ovf.un", K::None, F::Sequential);
    t[0xD8] = op("mul.ovf", K::None, F::Sequential);
    t[0xD9] = op("mul.ovf.un", K::None, F::Sequential);
    t[0xDA] = op("sub.ovf", K::None, F::Sequential);
    t[0xDB] = op("sub.ovf.un", K::None, F::Sequential);
    t[0xDC] = op("endfinally", K::None, F::EndRegion);
    t[0xDD] = op("leave", K::BranchTarget, F::UnconditionalBranch);
    t[0xDE] = op("leave.s", K::ShortBranchTarget, F::UnconditionalBranch);
    t[0xDF] = op("stind.i", K::None, F::Sequential);
    t[0xE0] = op("conv.u", K::None, F::Sequential);

    t
}

const fn build_instructions_fe() -> [CilOpcode; 0x1F] {
    use FlowType as F;
    use OperandKind as K;

    let mut t = [RESERVED; 0x1F];

    t[0x00] = op("arglist", K::None, F::Sequential);
    t[0x01] = op("ceq", K::None, F::Sequential);
    t[0x02] = op("cgt", K::None, F::Sequential);
    t[0x03] = op("cgt.un", K::None, F::Sequential);
    t[0x04] = op("clt", K::None, F::Sequential);
    t[0x05] = op("clt.un", K::None, F::Sequential);
    t[0x06] = op("ldftn", K::Method, F::Sequential);
    t[0x07] = op("ldvirtftn", K::Method, F::Sequential);
    t[0x09] = op("ldarg", K::Variable, F::Sequential);
    t[0x0A] = op("ldarga", K::Variable, F::Sequential);
    t[0x0B] = op("starg", K::Variable, F::Sequential);
    t[0x0C] = op("ldloc", K::Variable, F::Sequential);
    t[0x0D] = op("ldloca", K::Variable, F::Sequential);
    t[0x0E] = op("stloc", K::Variable, F::Sequential);
    t[0x0F] = op("localloc", K::None, F::Sequential);
    t[0x11] = op("endfilter", K::None, F::EndRegion);
    t[0x12] = op("unaligned.", K::ShortVariable, F::Sequential);
    t[0x13] = op("volatile.", K::None, F::Sequential);
    t[0x14] = op("tail.", K::None, F::Sequential);
    t[0x15] = op("initobj", K::Type, F::Sequential);
    t[0x16] = op("constrained.", K::Type, F::Sequential);
    t[0x17] = op("cpblk", K::None, F::Sequential);
    t[0x18] = op("initblk", K::None, F::Sequential);
    t[0x19] = op("no.", K::ShortVariable, F::Sequential);
    t[0x1A] = op("rethrow", K::None, F::Throw);
    t[0x1C] = op("sizeof", K::Type, F::Sequential);
    t[0x1D] = op("refanytype", K::None, F::Sequential);
    t[0x1E] = op("readonly.", K::None, F::Sequential);

    t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_opcodes_are_assigned() {
        assert_eq!(INSTRUCTIONS[0x00].mnemonic, "nop");
        assert_eq!(INSTRUCTIONS[0x2A].mnemonic, "ret");
        assert_eq!(INSTRUCTIONS[0x72].mnemonic, "ldstr");
        assert_eq!(INSTRUCTIONS_FE[0x02].mnemonic, "cgt");
    }

    #[test]
    fn reserved_gaps_are_marked() {
        assert!(INSTRUCTIONS[0x24].is_reserved());
        assert!(INSTRUCTIONS[0xFF].is_reserved());
        assert!(INSTRUCTIONS_FE[0x08].is_reserved());
    }

    #[test]
    fn branch_opcodes_declare_targets() {
        assert_eq!(INSTRUCTIONS[0x2C].operand, OperandKind::ShortBranchTarget);
        assert_eq!(INSTRUCTIONS[0x3A].operand, OperandKind::BranchTarget);
        assert_eq!(INSTRUCTIONS[0x38].flow, FlowType::UnconditionalBranch);
        assert_eq!(INSTRUCTIONS[0x2D].flow, FlowType::ConditionalBranch);
    }
}
