//! The element model the decompilation pipeline manipulates.
//!
//! Every pipeline step reads and rewrites an ordered sequence of [`Element`] values.
//! A sequence starts as raw instructions, passes through structural intermediates
//! (cut branches, conditional branches) and, after a successful run, collapses to a
//! single [`Element::Expression`].
//!
//! Ownership is exclusive: an element lives in exactly one sequence. When branch
//! resolution moves a span into a [`ConditionalBranch`], the span is drained from the
//! parent sequence first, so inner elements are never referenced from two places.

mod matcher;

pub use matcher::Matcher;

use crate::{disassembler::Instruction, expressions::Expression};

/// The two arms of a structured conditional.
///
/// `if_true` holds the elements executed when the resolved condition is truthy,
/// `if_false` the alternate path. Either arm may be empty; an empty arm means the
/// jump went straight to the merge point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConditionalBranch {
    /// Elements of the truthy path
    pub if_true: Vec<Element>,
    /// Elements of the falsy path
    pub if_false: Vec<Element>,
}

/// One unit of the pipeline's working sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Element {
    /// A raw decoded instruction, not yet interpreted
    Instruction(Instruction),
    /// A fully resolved sub-expression
    Expression(Expression),
    /// A structured conditional produced by branch resolution
    ConditionalBranch(ConditionalBranch),
    /// A self-contained sub-sequence extracted from the main sequence by an earlier
    /// resolution pass - an alternate control-flow path whose originating jump has
    /// not been linked yet
    CutBranch(Vec<Element>),
}

impl Element {
    /// The wrapped instruction, when this element still is one.
    #[must_use]
    pub fn as_instruction(&self) -> Option<&Instruction> {
        match self {
            Element::Instruction(instruction) => Some(instruction),
            _ => None,
        }
    }

    /// The byte offset this element corresponds to in the original body.
    ///
    /// Only instruction elements keep an offset; structured elements have no
    /// single source location and return `None`, which keeps them invisible
    /// to branch-target searches.
    #[must_use]
    pub fn offset(&self) -> Option<i64> {
        self.as_instruction().map(|i| i.offset as i64)
    }
}

/// Index of the element corresponding to byte offset `target`, if present.
#[must_use]
pub fn find_offset(elements: &[Element], target: i64) -> Option<usize> {
    elements.iter().position(|e| e.offset() == Some(target))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::instruction_at;

    #[test]
    fn find_offset_matches_instruction_elements_only() {
        let elements = vec![
            Element::Instruction(instruction_at(0, "nop")),
            Element::CutBranch(vec![Element::Instruction(instruction_at(4, "nop"))]),
            Element::Instruction(instruction_at(8, "ret")),
        ];

        assert_eq!(find_offset(&elements, 0), Some(0));
        assert_eq!(find_offset(&elements, 8), Some(2));
        // Offsets inside cut branches are not visible from the parent sequence
        assert_eq!(find_offset(&elements, 4), None);
    }
}
