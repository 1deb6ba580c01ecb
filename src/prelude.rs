//! # exprscope Prelude
//!
//! Convenient re-exports of the most commonly used types. Import this module to
//! get quick access to the decompiler entry points, the expression model and
//! the metadata capabilities in one line.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all exprscope operations
pub use crate::Error;

/// The result type used throughout exprscope
pub use crate::Result;

// ================================================================================================
// Main Entry Points
// ================================================================================================

/// Decompiles method bodies into expression trees
pub use crate::Decompiler;

/// Rewrites member accesses into their accessor bodies
pub use crate::Inliner;

/// Bounds-checked little-endian cursor over body bytes
pub use crate::Parser;

// ================================================================================================
// Decompilation Pipeline
// ================================================================================================

/// Pipeline composition and the per-step interface
pub use crate::decompilation::{DecompilationContext, Pipeline, Step, StepKind};

/// Per-opcode interpretation rules
pub use crate::decompilation::translators::{InstructionTranslator, TranslationContext};

// ================================================================================================
// Disassembler
// ================================================================================================

/// Instruction decoding functions and decoded instruction types
pub use crate::disassembler::{
    decode_instruction, decode_stream, FlowType, Immediate, Instruction, InstructionIter, Operand,
    OperandKind,
};

// ================================================================================================
// Elements and Expressions
// ================================================================================================

/// The element sequence the pipeline transforms
pub use crate::elements::{ConditionalBranch, Element, Matcher};

/// The decompiled expression model
pub use crate::expressions::{BinaryOp, Constant, Expression, Parameter, UnaryOp};

// ================================================================================================
// Metadata Capabilities
// ================================================================================================

/// Host-supplied metadata interfaces and reference types
pub use crate::metadata::{
    FieldRef, MemberRef, MetadataProvider, MethodDef, MethodRef, ParamDef, TokenResolver, TypeRef,
};
