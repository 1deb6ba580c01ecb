//! Bytecode-to-expression decompilation.
//!
//! [`Decompiler`] is the crate's main entry point: it decodes a method body into
//! elements, runs the step [`Pipeline`] over them and demands that exactly one
//! expression remains. The [`DecompilationContext`] carries the parameter
//! environment, with argument slot `0` bound to the implicit receiver for
//! instance methods; nested bodies (accessors, closures) link back to their
//! enclosing context.
//!
//! # Example
//!
//! ```rust,ignore
//! let decompiler = Decompiler::new(&metadata);
//! let predicate = decompiler.decompile_lambda(&method)?;
//! println!("{predicate}");
//! ```

mod pipeline;
pub mod steps;
pub mod translators;

pub use pipeline::{Pipeline, Step, StepKind};

use crate::{
    disassembler::{decode_stream, Parser},
    elements::Element,
    expressions::{Expression, Parameter},
    metadata::{MetadataProvider, MethodDef, TokenResolver},
    Error, Result,
};

/// Parameter environment of the method being decompiled.
///
/// Built once per body and shared read-only across the pipeline steps. For
/// instance methods the receiver occupies slot `0` under the reserved name
/// [`Parameter::RECEIVER`] and declared parameters follow; for static methods
/// declared parameters start at slot `0`.
pub struct DecompilationContext<'a> {
    method: &'a MethodDef,
    parameters: Vec<Parameter>,
    parent: Option<&'a DecompilationContext<'a>>,
}

impl<'a> DecompilationContext<'a> {
    /// Context for a top-level method body.
    #[must_use]
    pub fn new(method: &'a MethodDef) -> Self {
        Self::with_parent(method, None)
    }

    /// Context for a nested body decompiled inside `parent`.
    #[must_use]
    pub fn with_parent(
        method: &'a MethodDef,
        parent: Option<&'a DecompilationContext<'a>>,
    ) -> Self {
        let mut parameters = Vec::with_capacity(method.parameters.len() + 1);
        if !method.reference.is_static {
            parameters.push(Parameter::receiver());
        }
        parameters.extend(
            method
                .parameters
                .iter()
                .map(|parameter| Parameter::new(parameter.name.as_str())),
        );

        DecompilationContext {
            method,
            parameters,
            parent,
        }
    }

    /// The method this context describes.
    #[must_use]
    pub fn method(&self) -> &MethodDef {
        self.method
    }

    /// The enclosing context, when this body is nested.
    #[must_use]
    pub fn parent(&self) -> Option<&DecompilationContext<'a>> {
        self.parent
    }

    /// Declared parameters, receiver first for instance methods.
    #[must_use]
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// The parameter expression bound to argument slot `slot`.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] when the slot exceeds the declared
    /// parameter list.
    pub fn parameter(&self, slot: usize) -> Result<Expression> {
        self.parameters
            .get(slot)
            .map(|parameter| Expression::Parameter(parameter.clone()))
            .ok_or_else(|| malformed_error!("argument slot {} is out of range", slot))
    }
}

/// Decodes and decompiles method bodies into expression trees.
///
/// Holds the metadata capability and the step pipeline; one instance serves any
/// number of bodies.
pub struct Decompiler<'a> {
    metadata: &'a dyn MetadataProvider,
    pipeline: Pipeline,
}

impl<'a> Decompiler<'a> {
    /// A decompiler over `metadata` with the default pipeline.
    #[must_use]
    pub fn new(metadata: &'a dyn MetadataProvider) -> Self {
        Self::with_pipeline(metadata, Pipeline::default_pipeline())
    }

    /// A decompiler running a custom pipeline, e.g. one derived via
    /// [`Pipeline::without`].
    #[must_use]
    pub fn with_pipeline(metadata: &'a dyn MetadataProvider, pipeline: Pipeline) -> Self {
        Decompiler { metadata, pipeline }
    }

    /// The metadata capability this decompiler resolves against.
    #[must_use]
    pub fn metadata(&self) -> &'a dyn MetadataProvider {
        self.metadata
    }

    /// The pipeline applied to each body.
    #[must_use]
    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Decompiles `method`'s body to the expression it returns.
    ///
    /// # Errors
    /// - [`Error::Empty`] when the body holds no bytes
    /// - Decode errors ([`Error::OutOfBounds`], [`Error::UnsupportedOperand`], ...)
    /// - Pipeline errors ([`Error::UnsupportedInstruction`],
    ///   [`Error::BranchTargetNotFound`], [`Error::BackwardBranchUnsupported`], ...)
    pub fn decompile(&self, method: &MethodDef) -> Result<Expression> {
        self.decompile_with_parent(method, None)
    }

    /// Decompiles `method` as a body nested inside `parent`'s context.
    ///
    /// # Errors
    /// Same conditions as [`Decompiler::decompile`].
    pub fn decompile_with_parent(
        &self,
        method: &MethodDef,
        parent: Option<&DecompilationContext<'_>>,
    ) -> Result<Expression> {
        if method.body.is_empty() {
            return Err(Error::Empty);
        }

        let resolver: &dyn TokenResolver = self.metadata;
        let mut parser = Parser::new(&method.body);
        let instructions = decode_stream(&mut parser, resolver)?;
        let mut elements: Vec<Element> = instructions.into_iter().map(Element::Instruction).collect();

        let context = DecompilationContext::with_parent(method, parent);
        self.pipeline.run(&mut elements, &context)?;

        match elements.pop() {
            Some(Element::Expression(expression)) if elements.is_empty() => Ok(expression),
            _ => Err(malformed_error!(
                "pipeline did not reduce the body to a single expression"
            )),
        }
    }

    /// Decompiles `method` and wraps the result in a lambda over its parameters.
    ///
    /// # Errors
    /// Same conditions as [`Decompiler::decompile`].
    pub fn decompile_lambda(&self, method: &MethodDef) -> Result<Expression> {
        let parameters = DecompilationContext::new(method).parameters().to_vec();
        let body = self.decompile(method)?;

        Ok(Expression::Lambda {
            parameters,
            body: Box::new(body),
        })
    }
}
