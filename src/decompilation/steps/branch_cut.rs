//! Extraction of spans skipped by unconditional forward jumps.
//!
//! A forward `br`/`br.s` marks the end of one control-flow path: everything between
//! the jump and its target only executes via some other entry (typically the taken
//! side of an earlier conditional). This step drains that span out of the main
//! sequence into an [`Element::CutBranch`] replacing the jump itself, so branch
//! resolution later finds the alternate path as a self-contained sub-sequence.
//!
//! Only the plain `br` family is claimed. `leave`/`leave.s` are also unconditional
//! jumps but additionally unwind exception regions; rewriting them as cut branches
//! would be wrong, so they stay untouched and fail later as unsupported.

use crate::{
    decompilation::{
        pipeline::{Step, StepKind},
        steps::MAX_BRANCH_DEPTH,
        DecompilationContext,
    },
    elements::{find_offset, Element, Matcher},
    Error, Result,
};

/// Pipeline step replacing forward `br`/`br.s` jumps with cut branches.
pub struct BranchCutStep;

impl Step for BranchCutStep {
    fn kind(&self) -> StepKind {
        StepKind::BranchCut
    }

    fn apply(&self, elements: &mut Vec<Element>, _context: &DecompilationContext) -> Result<()> {
        cut_jumps(elements, None, 0)
    }
}

/// Offset and absolute target of an unconditional forward-jump element.
fn unconditional_jump(element: &Element) -> Option<(usize, i64)> {
    Matcher::of(element)
        .narrow(Element::as_instruction)
        .filter(|instruction| matches!(instruction.mnemonic, "br" | "br.s"))
        .narrow(|instruction| {
            instruction
                .branch_target()
                .map(|target| (instruction.offset, target))
        })
        .choose(Some, None)
}

/// Left-to-right scan cutting every `br` span, recursing into each cut span.
///
/// `merge` is the offset just past this sub-sequence: a jump inside a span that
/// targets the same merge point as the jump that created the span lands exactly
/// at the sub-sequence end, even though no element carries that offset.
fn cut_jumps(elements: &mut Vec<Element>, merge: Option<i64>, depth: usize) -> Result<()> {
    if depth >= MAX_BRANCH_DEPTH {
        return Err(Error::RecursionLimit(MAX_BRANCH_DEPTH));
    }

    let mut index = 0;
    while index < elements.len() {
        let Some((offset, target)) = unconditional_jump(&elements[index]) else {
            index += 1;
            continue;
        };

        if target <= offset as i64 {
            return Err(Error::BackwardBranchUnsupported { offset, target });
        }

        let end = match find_offset(elements, target) {
            Some(end) => end,
            None if merge == Some(target) => elements.len(),
            None => return Err(Error::BranchTargetNotFound { target }),
        };
        if end <= index {
            return Err(Error::BranchTargetNotFound { target });
        }

        let mut span: Vec<Element> = elements.drain(index + 1..end).collect();
        cut_jumps(&mut span, Some(target), depth + 1)?;

        if span.is_empty() {
            // A jump to the immediately following element does nothing
            elements.remove(index);
        } else {
            elements[index] = Element::CutBranch(span);
            index += 1;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test::{branch_at, instruction_at};

    fn run(elements: &mut Vec<Element>) -> Result<()> {
        cut_jumps(elements, None, 0)
    }

    #[test]
    fn forward_jump_becomes_cut_branch() {
        // 0: ldc.i4.1; 1: br 5; 4: ldc.i4.0; 5: ret - the skipped constant is cut out
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "ldc.i4.1")),
            Element::Instruction(branch_at(1, "br.s", 5)),
            Element::Instruction(instruction_at(4, "ldc.i4.0")),
            Element::Instruction(instruction_at(5, "ret")),
        ];

        run(&mut elements).unwrap();

        assert_eq!(elements.len(), 3);
        assert!(matches!(&elements[1], Element::CutBranch(inner) if inner.len() == 1));
        assert_eq!(elements[2].offset(), Some(5));
    }

    #[test]
    fn jump_to_next_element_is_removed() {
        let mut elements = vec![
            Element::Instruction(branch_at(0, "br.s", 2)),
            Element::Instruction(instruction_at(2, "ret")),
        ];

        run(&mut elements).unwrap();

        assert_eq!(elements.len(), 1);
        assert_eq!(elements[0].offset(), Some(2));
    }

    #[test]
    fn inner_jump_to_shared_merge_nests_cut_branches() {
        // Both jumps target the merge at 10: the inner one ends up inside the
        // outer span, pointing one past its end.
        let mut elements = vec![
            Element::Instruction(branch_at(0, "br.s", 10)),
            Element::Instruction(instruction_at(2, "ldc.i4.1")),
            Element::Instruction(branch_at(3, "br.s", 10)),
            Element::Instruction(instruction_at(5, "ldc.i4.0")),
            Element::Instruction(instruction_at(10, "ret")),
        ];

        run(&mut elements).unwrap();

        assert_eq!(elements.len(), 2);
        let Element::CutBranch(outer) = &elements[0] else {
            panic!("expected outer cut branch, got {:?}", elements[0]);
        };
        assert_eq!(outer.len(), 2);
        assert!(matches!(&outer[1], Element::CutBranch(inner) if inner.len() == 1));
    }

    #[test]
    fn backward_jump_is_rejected() {
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "nop")),
            Element::Instruction(branch_at(1, "br.s", 0)),
        ];

        let result = run(&mut elements);

        assert!(matches!(
            result,
            Err(Error::BackwardBranchUnsupported { offset: 1, target: 0 })
        ));
    }

    #[test]
    fn unknown_target_is_rejected() {
        let mut elements = vec![
            Element::Instruction(branch_at(0, "br.s", 99)),
            Element::Instruction(instruction_at(2, "ret")),
        ];

        assert!(matches!(
            run(&mut elements),
            Err(Error::BranchTargetNotFound { target: 99 })
        ));
    }

    #[test]
    fn leave_is_not_claimed() {
        let mut elements = vec![
            Element::Instruction(branch_at(0, "leave.s", 4)),
            Element::Instruction(instruction_at(2, "nop")),
            Element::Instruction(instruction_at(4, "ret")),
        ];
        let before = elements.clone();

        run(&mut elements).unwrap();

        assert_eq!(elements, before);
    }
}
