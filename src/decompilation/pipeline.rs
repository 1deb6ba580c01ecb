//! The step pipeline driving decompilation.
//!
//! A [`Pipeline`] is an ordered list of [`Step`]s applied once each, in declared order,
//! to the whole element sequence. Steps mutate the sequence in place; some (branch
//! resolution) recurse into sub-ranges they carve out. Each step is identified by a
//! [`StepKind`] tag so a variant pipeline can be derived with [`Pipeline::without`],
//! which is how individual steps are tested in isolation.

use crate::{
    decompilation::{
        steps::{BranchCutStep, BranchResolutionStep, InterpretationStep},
        translators, DecompilationContext,
    },
    elements::Element,
    Result,
};

/// Identity tag of a pipeline step, used for removal and substitution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum StepKind {
    /// Extraction of spans skipped by unconditional forward jumps
    BranchCut,
    /// Structuring of conditional jumps into nested branches
    BranchResolution,
    /// Stack-based reduction of elements to expressions
    Interpretation,
}

/// One transformation over the element sequence.
///
/// A step may inspect, replace, remove or collapse elements in place. It must be
/// idempotent when re-applied to an already fully-reduced sequence: a second
/// application changes nothing.
pub trait Step {
    /// The tag identifying this step within a pipeline.
    fn kind(&self) -> StepKind;

    /// Applies the step to the whole sequence.
    ///
    /// # Errors
    /// Any error aborts the pipeline run; partially transformed sequences are
    /// never handed back to callers.
    fn apply(&self, elements: &mut Vec<Element>, context: &DecompilationContext) -> Result<()>;
}

/// An ordered sequence of steps.
pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    /// Builds a pipeline from an explicit step list.
    #[must_use]
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Pipeline { steps }
    }

    /// The default decompilation pipeline: branch cutting, branch resolution,
    /// then interpretation through the default translator registry.
    #[must_use]
    pub fn default_pipeline() -> Self {
        Pipeline::new(vec![
            Box::new(BranchCutStep),
            Box::new(BranchResolutionStep),
            Box::new(InterpretationStep::new(translators::default_translators())),
        ])
    }

    /// Derives a variant pipeline excluding every step tagged `kind`.
    #[must_use]
    pub fn without(mut self, kind: StepKind) -> Self {
        self.steps.retain(|step| step.kind() != kind);
        self
    }

    /// Tags of the contained steps, in application order.
    #[must_use]
    pub fn step_kinds(&self) -> Vec<StepKind> {
        self.steps.iter().map(|step| step.kind()).collect()
    }

    /// Applies each step once, in declared order, over the whole sequence.
    ///
    /// # Errors
    /// Propagates the first step failure; the sequence is left in an
    /// unspecified intermediate state and must be discarded by the caller.
    pub fn run(&self, elements: &mut Vec<Element>, context: &DecompilationContext) -> Result<()> {
        for step in &self.steps {
            step.apply(elements, context)?;
        }
        Ok(())
    }
}
