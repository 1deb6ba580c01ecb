//! The built-in pipeline steps.
//!
//! Applied in order by [`crate::decompilation::Pipeline::default_pipeline`]:
//!
//! 1. [`BranchCutStep`] - extracts spans skipped by unconditional forward jumps
//!    into [`crate::elements::Element::CutBranch`] elements
//! 2. [`BranchResolutionStep`] - links `brtrue`/`brfalse` jumps into nested
//!    [`crate::elements::ConditionalBranch`] structures
//! 3. [`InterpretationStep`] - reduces the structured sequence to a single
//!    expression via an evaluation-stack walk

mod branch_cut;
mod branch_resolution;
mod interpretation;

pub use branch_cut::BranchCutStep;
pub use branch_resolution::BranchResolutionStep;
pub use interpretation::InterpretationStep;

/// Maximum branch nesting depth before resolution gives up.
///
/// Each level corresponds to one nested conditional in the source expression;
/// real predicate lambdas stay in the single digits.
pub(crate) const MAX_BRANCH_DEPTH: usize = 50;
