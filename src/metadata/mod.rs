//! Interface to the managed metadata layer.
//!
//! Real metadata parsing (heaps, tables, signatures) is not this crate's concern; the
//! decompiler only needs two narrow capabilities from whatever hosts it:
//!
//! - [`TokenResolver`] - turn the 4-byte tokens embedded in the instruction stream into
//!   resolved string/method/field/type references while decoding.
//! - [`MetadataProvider`] - additionally locate the accessor method backing a member
//!   access, so the [`crate::inliner::Inliner`] can decompile it.
//!
//! The reference types here are deliberately plain data: name, declaring type and the
//! few shape facts (static flag, arity) the pipeline consults.

use crate::Result;

/// A reference to a managed method, as resolved from a `call`/`callvirt` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodRef {
    /// Simple name of the declaring type
    pub declaring_type: String,
    /// Method name; property accessors follow the `get_*` convention
    pub name: String,
    /// Whether the method has no `this` receiver
    pub is_static: bool,
    /// Number of declared parameters, excluding the receiver
    pub param_count: usize,
}

impl MethodRef {
    /// The property name when this method is a `get_*` accessor, `None` otherwise.
    #[must_use]
    pub fn property_name(&self) -> Option<&str> {
        if self.param_count == 0 {
            self.name.strip_prefix("get_")
        } else {
            None
        }
    }
}

/// A reference to a managed field, as resolved from a `ldfld`/`ldsfld` token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    /// Simple name of the declaring type
    pub declaring_type: String,
    /// Field name
    pub name: String,
}

/// A reference to a managed type, as resolved from a type token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeRef {
    /// Simple type name
    pub name: String,
}

/// Identifies a member (field or property) appearing in a member-access expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberRef {
    /// Simple name of the declaring type
    pub declaring_type: String,
    /// Member name, without any `get_` accessor prefix
    pub name: String,
}

/// A declared parameter of a method under decompilation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamDef {
    /// Parameter name
    pub name: String,
    /// Simple name of the parameter type
    pub param_type: String,
}

/// A method body handed to the decompiler, with the metadata needed to seed the context.
///
/// Argument slots follow the CLI convention: for instance methods slot `0` is the
/// implicit receiver and declared parameters start at slot `1`; for static methods
/// declared parameters start at slot `0`.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodDef {
    /// Identity and shape of the method
    pub reference: MethodRef,
    /// Ordered declared parameters, excluding the receiver
    pub parameters: Vec<ParamDef>,
    /// Raw CIL of the method body
    pub body: Vec<u8>,
}

/// Capability for resolving the metadata tokens embedded in an instruction stream.
///
/// Supplied by the host to the decoder; every token is resolved eagerly while
/// decoding so no raw token values survive into the element pipeline.
pub trait TokenResolver {
    /// Resolve a user-string token (`ldstr` operand) to its literal value.
    ///
    /// # Errors
    /// Fails when the token does not name a string in the host's string heap.
    fn resolve_string(&self, token: u32) -> Result<String>;

    /// Resolve a method token (`call`/`callvirt`/`newobj` operand).
    ///
    /// # Errors
    /// Fails when the token does not name a known method.
    fn resolve_method(&self, token: u32) -> Result<MethodRef>;

    /// Resolve a field token (`ldfld`/`ldsfld` operand).
    ///
    /// # Errors
    /// Fails when the token does not name a known field.
    fn resolve_field(&self, token: u32) -> Result<FieldRef>;

    /// Resolve a type token (`box`/`castclass`/... operand).
    ///
    /// # Errors
    /// Fails when the token does not name a known type.
    fn resolve_type(&self, token: u32) -> Result<TypeRef>;
}

/// Full metadata capability consumed by the inliner.
///
/// Extends token resolution with accessor lookup: given a member reference from a
/// member-access expression, supply the `get` method that backs it, or `None` when
/// the member has no decompilable accessor (e.g. a plain field).
pub trait MetadataProvider: TokenResolver {
    /// The accessor method body backing `member`, if one exists.
    fn accessor(&self, member: &MemberRef) -> Option<&MethodDef>;
}
