//! Accessor inlining over decompiled expression trees.
//!
//! Computed properties hide logic behind a `get_*` accessor; a remote query
//! engine that only understands stored members cannot evaluate them. The
//! [`Inliner`] rewrites selected member accesses into their accessor's
//! decompiled body, with the access target substituted for the accessor's
//! receiver, producing a tree equivalent to what the source would have been
//! had the property's logic been written inline.
//!
//! Inlining is all-or-nothing per call: any failure (no accessor, undecodable
//! body) aborts with an error, and callers fall back to the original tree.

use crate::{
    decompilation::Decompiler,
    expressions::{Expression, Parameter},
    metadata::MemberRef,
    Result,
};

/// Rewrites member accesses into their decompiled accessor bodies.
pub struct Inliner<'a> {
    decompiler: Decompiler<'a>,
}

impl<'a> Inliner<'a> {
    /// An inliner decompiling accessors through `decompiler`.
    #[must_use]
    pub fn new(decompiler: Decompiler<'a>) -> Self {
        Inliner { decompiler }
    }

    /// The decompiler used for accessor bodies.
    #[must_use]
    pub fn decompiler(&self) -> &Decompiler<'a> {
        &self.decompiler
    }

    /// Inlines every member access selected by `predicate`.
    ///
    /// The rewrite runs bottom-up: receivers are rebuilt before the access
    /// wrapping them, so chained properties inline innermost first, and a
    /// substituted body is never re-visited. Re-running with a predicate that
    /// does not match the substituted bodies is a no-op.
    ///
    /// # Errors
    /// - [`crate::Error::Malformed`] when a selected member has no accessor
    /// - Any decompilation error from the accessor's body
    pub fn inline<P>(&self, expression: Expression, predicate: P) -> Result<Expression>
    where
        P: Fn(&MemberRef) -> bool,
    {
        expression.rewrite(&mut |node| match node {
            Expression::MemberAccess { target, ref member } if predicate(member) => {
                let Some(accessor) = self.decompiler.metadata().accessor(member) else {
                    return Err(malformed_error!(
                        "member {}.{} was selected for inlining but has no accessor",
                        member.declaring_type,
                        member.name
                    ));
                };

                let body = self.decompiler.decompile(accessor)?;
                Ok(match target {
                    Some(receiver) => body.substitute_parameter(Parameter::RECEIVER, &receiver),
                    None => body,
                })
            }
            other => Ok(other),
        })
    }
}
