//! Structuring of conditional jumps into nested branches.
//!
//! After branch cutting, every `brtrue`/`brfalse` splits execution into a fallthrough
//! span and a taken path. This step locates the jump target and folds both paths into
//! one [`Element::ConditionalBranch`]:
//!
//! - Target in the same sequence: the elements between the jump and its target form
//!   the fallthrough arm; the taken path is empty (the jump went straight to the
//!   merge point).
//! - Target inside a later cut branch: the elements up to the cut form the
//!   fallthrough arm, and the cut's tail from the target onward becomes the taken
//!   arm. Anything in the cut before the target is unreachable from this jump and
//!   is dropped.
//!
//! Both arms are resolved recursively, so nested conditionals structure inside out.
//! Fused comparison branches (`beq`, `bgt.un`, ...) are not claimed here; they reach
//! interpretation unhandled and fail as unsupported instructions.

use crate::{
    decompilation::{
        pipeline::{Step, StepKind},
        steps::MAX_BRANCH_DEPTH,
        DecompilationContext,
    },
    elements::{find_offset, ConditionalBranch, Element, Matcher},
    Error, Result,
};

/// Pipeline step linking `brtrue`/`brfalse` jumps into conditional branches.
pub struct BranchResolutionStep;

impl Step for BranchResolutionStep {
    fn kind(&self) -> StepKind {
        StepKind::BranchResolution
    }

    fn apply(&self, elements: &mut Vec<Element>, _context: &DecompilationContext) -> Result<()> {
        resolve(elements, 0)
    }
}

/// Offset, absolute target and polarity of a conditional-jump element.
fn conditional_jump(element: &Element) -> Option<(usize, i64, bool)> {
    Matcher::of(element)
        .narrow(Element::as_instruction)
        .narrow(|instruction| {
            let polarity = instruction.conditional_polarity()?;
            let target = instruction.branch_target()?;
            Some((instruction.offset, target, polarity))
        })
        .choose(Some, None)
}

/// Orients the taken and fallthrough spans by the jump's polarity.
///
/// A `brtrue` takes its jump on a truthy condition, so the taken span is the
/// `if_true` arm; `brfalse` is the mirror image.
fn branch(polarity: bool, taken: Vec<Element>, fallthrough: Vec<Element>) -> ConditionalBranch {
    if polarity {
        ConditionalBranch {
            if_true: taken,
            if_false: fallthrough,
        }
    } else {
        ConditionalBranch {
            if_true: fallthrough,
            if_false: taken,
        }
    }
}

/// Position of the cut branch containing `target`, searched after `after`,
/// together with the target's index inside it.
fn locate_in_cut(elements: &[Element], after: usize, target: i64) -> Option<(usize, usize)> {
    elements
        .iter()
        .enumerate()
        .skip(after + 1)
        .find_map(|(position, element)| match element {
            Element::CutBranch(inner) => {
                find_offset(inner, target).map(|inner_start| (position, inner_start))
            }
            _ => None,
        })
}

fn resolve(elements: &mut Vec<Element>, depth: usize) -> Result<()> {
    if depth >= MAX_BRANCH_DEPTH {
        return Err(Error::RecursionLimit(MAX_BRANCH_DEPTH));
    }

    let mut index = 0;
    while index < elements.len() {
        let Some((offset, target, polarity)) = conditional_jump(&elements[index]) else {
            index += 1;
            continue;
        };

        if target <= offset as i64 {
            return Err(Error::BackwardBranchUnsupported { offset, target });
        }

        if let Some(end) = find_offset(elements, target) {
            if end <= index {
                return Err(Error::BranchTargetNotFound { target });
            }

            let mut fallthrough: Vec<Element> = elements.drain(index + 1..end).collect();
            resolve(&mut fallthrough, depth + 1)?;

            elements[index] = Element::ConditionalBranch(branch(polarity, Vec::new(), fallthrough));
            index += 1;
            continue;
        }

        let Some((cut_index, inner_start)) = locate_in_cut(elements, index, target) else {
            return Err(Error::BranchTargetNotFound { target });
        };

        let mut fallthrough: Vec<Element> = elements.drain(index + 1..=cut_index).collect();
        let mut taken = match fallthrough.pop() {
            Some(Element::CutBranch(mut cut)) => cut.split_off(inner_start),
            _ => return Err(Error::BranchTargetNotFound { target }),
        };

        resolve(&mut fallthrough, depth + 1)?;
        resolve(&mut taken, depth + 1)?;

        elements[index] = Element::ConditionalBranch(branch(polarity, taken, fallthrough));
        index += 1;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{branch_at, instruction_at};

    #[test]
    fn target_in_sequence_gives_empty_taken_path() {
        // cond; brfalse 6; body; 6: ret
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "ldc.i4.1")),
            Element::Instruction(branch_at(1, "brfalse.s", 6)),
            Element::Instruction(instruction_at(3, "ldc.i4.5")),
            Element::Instruction(instruction_at(6, "ret")),
        ];

        resolve(&mut elements, 0).unwrap();

        assert_eq!(elements.len(), 3);
        let Element::ConditionalBranch(branch) = &elements[1] else {
            panic!("expected conditional branch, got {:?}", elements[1]);
        };
        // brfalse: fallthrough is the truthy arm, taken path (empty) the falsy one
        assert_eq!(branch.if_true.len(), 1);
        assert!(branch.if_false.is_empty());
    }

    #[test]
    fn target_in_cut_branch_joins_both_paths() {
        // cond; brfalse 7; a; [cut: b]; ret - the ternary shape after cutting
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "ldc.i4.1")),
            Element::Instruction(branch_at(1, "brfalse.s", 7)),
            Element::Instruction(instruction_at(3, "ldc.i4.2")),
            Element::CutBranch(vec![Element::Instruction(instruction_at(7, "ldc.i4.3"))]),
            Element::Instruction(instruction_at(8, "ret")),
        ];

        resolve(&mut elements, 0).unwrap();

        assert_eq!(elements.len(), 3);
        let Element::ConditionalBranch(branch) = &elements[1] else {
            panic!("expected conditional branch, got {:?}", elements[1]);
        };
        assert_eq!(branch.if_true.len(), 1);
        assert_eq!(branch.if_true[0].offset(), Some(3));
        assert_eq!(branch.if_false.len(), 1);
        assert_eq!(branch.if_false[0].offset(), Some(7));
    }

    #[test]
    fn unreachable_cut_head_is_dropped() {
        let mut elements = vec![
            Element::Instruction(branch_at(0, "brtrue.s", 5)),
            Element::CutBranch(vec![
                Element::Instruction(instruction_at(3, "nop")),
                Element::Instruction(instruction_at(5, "ldc.i4.1")),
            ]),
            Element::Instruction(instruction_at(6, "ret")),
        ];

        resolve(&mut elements, 0).unwrap();

        let Element::ConditionalBranch(branch) = &elements[0] else {
            panic!("expected conditional branch, got {:?}", elements[0]);
        };
        // brtrue: the cut tail from the target onward is the truthy arm
        assert_eq!(branch.if_true.len(), 1);
        assert_eq!(branch.if_true[0].offset(), Some(5));
        assert!(branch.if_false.is_empty());
    }

    #[test]
    fn backward_target_is_rejected_up_front() {
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "nop")),
            Element::Instruction(branch_at(1, "brtrue.s", 0)),
        ];

        assert!(matches!(
            resolve(&mut elements, 0),
            Err(Error::BackwardBranchUnsupported { offset: 1, target: 0 })
        ));
    }

    #[test]
    fn missing_target_is_rejected() {
        let mut elements = vec![
            Element::Instruction(branch_at(0, "brfalse.s", 42)),
            Element::Instruction(instruction_at(2, "ret")),
        ];

        assert!(matches!(
            resolve(&mut elements, 0),
            Err(Error::BranchTargetNotFound { target: 42 })
        ));
    }

    #[test]
    fn nesting_past_the_depth_limit_is_rejected() {
        // Branch `level` at offset `level` targets the nop at `2 * levels - 1 - level`,
        // so every branch's target sits inside the enclosing fallthrough span and
        // each one peels off a new recursion level.
        let levels = MAX_BRANCH_DEPTH + 1;
        let mut elements = Vec::new();
        for level in 0..levels {
            elements.push(Element::Instruction(branch_at(
                level,
                "brfalse.s",
                (2 * levels - 1 - level) as i64,
            )));
        }
        for offset in levels..2 * levels {
            elements.push(Element::Instruction(instruction_at(offset, "nop")));
        }
        elements.push(Element::Instruction(instruction_at(2 * levels, "ret")));

        assert!(matches!(
            resolve(&mut elements, 0),
            Err(Error::RecursionLimit(MAX_BRANCH_DEPTH))
        ));
    }
}
