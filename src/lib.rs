#![doc(html_no_source)]
#![deny(missing_docs)]

//! # exprscope
//!
//! Decompiles .NET CIL method bodies back into the expression trees they were
//! compiled from.
//!
//! Expression-tree based APIs (LINQ providers, specification patterns) lose
//! composability the moment logic hides inside a compiled method: a computed
//! property or a helper predicate arrives as an opaque `call` instead of a tree
//! the provider can translate. `exprscope` reverses that compilation for the
//! restricted, side-effect-free bodies such APIs produce: it decodes the CIL,
//! reconstructs structured conditionals from the branch-compiled form and
//! rebuilds the original boolean and arithmetic expression - including the
//! short-circuit operators the compiler lowered into jumps.
//!
//! ## Features
//!
//! - **Full ECMA-335 opcode tables** - single-byte and `0xFE`-prefixed encodings,
//!   decoded against constant tables with eager token resolution
//! - **Branch reconstruction** - forward `br`/`brtrue`/`brfalse` control flow is
//!   folded back into conditionals, `&&` and `||`
//! - **Accessor inlining** - member accesses can be replaced by their accessor's
//!   decompiled body, receiver substituted in
//! - **Host-neutral metadata** - the crate never parses metadata itself; hosts
//!   supply the [`metadata::TokenResolver`] / [`metadata::MetadataProvider`]
//!   capabilities
//! - **Fail-closed** - anything outside the supported subset (loops, exception
//!   handling, stores) is a typed [`Error`], never a guessed tree
//!
//! ## Quick Start
//!
//! ```rust
//! use exprscope::{
//!     metadata::{
//!         FieldRef, MemberRef, MetadataProvider, MethodDef, MethodRef, ParamDef,
//!         TokenResolver, TypeRef,
//!     },
//!     Decompiler,
//! };
//! # struct NoTokens;
//! # impl TokenResolver for NoTokens {
//! #     fn resolve_string(&self, _: u32) -> exprscope::Result<String> { unreachable!() }
//! #     fn resolve_method(&self, _: u32) -> exprscope::Result<MethodRef> { unreachable!() }
//! #     fn resolve_field(&self, _: u32) -> exprscope::Result<FieldRef> { unreachable!() }
//! #     fn resolve_type(&self, _: u32) -> exprscope::Result<TypeRef> { unreachable!() }
//! # }
//! # impl MetadataProvider for NoTokens {
//! #     fn accessor(&self, _: &MemberRef) -> Option<&MethodDef> { None }
//! # }
//!
//! let method = MethodDef {
//!     reference: MethodRef {
//!         declaring_type: "Program".into(),
//!         name: "Lambda".into(),
//!         is_static: true,
//!         param_count: 1,
//!     },
//!     parameters: vec![ParamDef {
//!         name: "c".into(),
//!         param_type: "Customer".into(),
//!     }],
//!     body: vec![0x17, 0x2A], // ldc.i4.1; ret
//! };
//!
//! let metadata = NoTokens;
//! let decompiler = Decompiler::new(&metadata);
//! assert_eq!(decompiler.decompile_lambda(&method)?.to_string(), "c => 1");
//! # Ok::<(), exprscope::Error>(())
//! ```
//!
//! ## Architecture
//!
//! Decompilation is a pipeline over a sequence of [`elements::Element`] values:
//!
//! 1. [`disassembler`] decodes the body bytes into instructions
//! 2. The branch-cut step extracts spans skipped by unconditional jumps
//! 3. The branch-resolution step links conditional jumps into nested branches
//! 4. The interpretation step replays the evaluation stack through per-opcode
//!    translators, reducing everything to one [`expressions::Expression`]
//!
//! The [`inliner::Inliner`] then optionally rewrites member accesses in the
//! result using the same machinery on their accessor bodies.
//!
//! ## Supported Subset
//!
//! The decompiler handles straight-line, forward-branching, value-producing
//! bodies: loads, constants, calls, field and property reads, arithmetic,
//! comparisons and conditionals. Loops (backward branches), exception regions,
//! stores and indirect calls are rejected with a descriptive [`Error`]; callers
//! inline opportunistically and fall back to the original expression.

#[macro_use]
pub(crate) mod error;

#[cfg(test)]
pub(crate) mod test;

/// Common imports for working with the decompiler.
///
/// `use exprscope::prelude::*;` brings the entry points, the element and
/// expression models and the metadata capabilities into scope.
pub mod prelude;

/// CIL instruction decoding: opcode tables, the bounds-checked [`Parser`] and
/// the decoders turning body bytes into [`disassembler::Instruction`] values.
pub mod disassembler;

/// The host-supplied metadata capabilities and the plain reference types
/// (methods, fields, members) resolved through them.
pub mod metadata;

/// The decompiled output model: [`expressions::Expression`] and its rendering.
pub mod expressions;

/// The element sequence the pipeline transforms, plus the [`elements::Matcher`]
/// query combinator used by the steps.
pub mod elements;

/// The decompilation pipeline: steps, translators, context and the
/// [`Decompiler`] entry point.
pub mod decompilation;

/// Rewriting of member accesses into their decompiled accessor bodies.
pub mod inliner;

pub use decompilation::Decompiler;
pub use disassembler::Parser;
pub use error::Error;
pub use inliner::Inliner;

/// The result type used throughout this crate.
pub type Result<T> = std::result::Result<T, Error>;
