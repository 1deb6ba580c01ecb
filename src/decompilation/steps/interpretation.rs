//! Reduction of a structured element sequence to a single expression.
//!
//! Walks the sequence with an evaluation stack: expression elements push
//! themselves, instructions go through the translator registry, and conditional
//! branches pop their condition and recursively reduce both arms. `ret` pops the
//! final value and must leave the stack empty.
//!
//! An empty branch arm means the jump went straight to the merge point, so the
//! condition itself decided the outcome: the arm reduces to the boolean constant
//! of its polarity. Conditionals with a constant arm then fold into the
//! short-circuit operators, which is how `&&` and `||` chains come back out of
//! the branch-compiled form.

use crate::{
    decompilation::{
        pipeline::{Step, StepKind},
        translators::{InstructionTranslator, TranslationContext},
        DecompilationContext,
    },
    disassembler::FlowType,
    elements::{ConditionalBranch, Element},
    expressions::{BinaryOp, Constant, Expression, UnaryOp},
    Error, Result,
};

/// Pipeline step reducing the element sequence via an evaluation-stack walk.
pub struct InterpretationStep {
    translators: Vec<Box<dyn InstructionTranslator>>,
}

impl InterpretationStep {
    /// Builds the step over an explicit translator registry.
    #[must_use]
    pub fn new(translators: Vec<Box<dyn InstructionTranslator>>) -> Self {
        InterpretationStep { translators }
    }

    /// Reduces `elements` to the single expression the sequence produces.
    ///
    /// A sequence ending in `ret` returns the popped value; a branch arm
    /// without `ret` reduces to the one value left on the stack.
    fn reduce(&self, elements: Vec<Element>, context: &DecompilationContext) -> Result<Expression> {
        let mut stack: Vec<Expression> = Vec::new();
        let mut iter = elements.into_iter();

        while let Some(element) = iter.next() {
            match element {
                Element::Expression(expression) => stack.push(expression),
                Element::ConditionalBranch(branch) => {
                    let condition = stack
                        .pop()
                        .ok_or_else(|| malformed_error!("conditional branch without a condition"))?;
                    let folded = self.fold_branch(condition, branch, context)?;
                    stack.push(folded);
                }
                Element::CutBranch(_) => {
                    return Err(malformed_error!(
                        "cut branch was never linked to a conditional jump"
                    ))
                }
                Element::Instruction(instruction) => {
                    if instruction.mnemonic == "nop" {
                        continue;
                    }

                    if instruction.flow == FlowType::Return {
                        let value = stack
                            .pop()
                            .ok_or_else(|| malformed_error!("ret with an empty evaluation stack"))?;
                        if !stack.is_empty() {
                            return Err(malformed_error!("evaluation stack not empty at ret"));
                        }
                        if iter.next().is_some() {
                            return Err(malformed_error!("unreachable elements after ret"));
                        }
                        return Ok(value);
                    }

                    let translator = self
                        .translators
                        .iter()
                        .find(|translator| translator.can_interpret(&instruction))
                        .ok_or_else(|| Error::UnsupportedInstruction {
                            mnemonic: instruction.mnemonic.to_string(),
                        })?;

                    let mut translation = TranslationContext {
                        stack: &mut stack,
                        method: context,
                    };
                    let produced = translator.interpret(&instruction, &mut translation)?;
                    stack.push(produced);
                }
            }
        }

        let value = stack
            .pop()
            .ok_or_else(|| malformed_error!("sequence produced no value"))?;
        if !stack.is_empty() {
            return Err(malformed_error!(
                "evaluation stack not reduced to a single value"
            ));
        }
        Ok(value)
    }

    /// Reduces one branch arm; an empty arm yields the boolean constant of its
    /// polarity.
    fn arm(
        &self,
        elements: Vec<Element>,
        polarity: bool,
        context: &DecompilationContext,
    ) -> Result<Expression> {
        if elements.is_empty() {
            Ok(Expression::bool(polarity))
        } else {
            self.reduce(elements, context)
        }
    }

    fn fold_branch(
        &self,
        condition: Expression,
        branch: ConditionalBranch,
        context: &DecompilationContext,
    ) -> Result<Expression> {
        let if_true = self.arm(branch.if_true, true, context)?;
        let if_false = self.arm(branch.if_false, false, context)?;
        Ok(fold_conditional(condition, if_true, if_false))
    }
}

fn truthy(expression: &Expression) -> bool {
    matches!(
        expression,
        Expression::Constant(Constant::Bool(true) | Constant::Int32(1))
    )
}

fn falsy(expression: &Expression) -> bool {
    matches!(
        expression,
        Expression::Constant(Constant::Bool(false) | Constant::Int32(0))
    )
}

/// Folds conditionals with constant boolean arms into the short-circuit form
/// the source expression used before branch compilation.
fn fold_conditional(condition: Expression, if_true: Expression, if_false: Expression) -> Expression {
    if truthy(&if_true) && falsy(&if_false) {
        return condition;
    }
    if falsy(&if_true) && truthy(&if_false) {
        return Expression::Unary {
            op: UnaryOp::Not,
            operand: Box::new(condition),
        };
    }
    if truthy(&if_true) {
        return Expression::Binary {
            op: BinaryOp::OrElse,
            left: Box::new(condition),
            right: Box::new(if_false),
        };
    }
    if falsy(&if_false) {
        return Expression::Binary {
            op: BinaryOp::AndAlso,
            left: Box::new(condition),
            right: Box::new(if_true),
        };
    }

    Expression::Conditional {
        condition: Box::new(condition),
        if_true: Box::new(if_true),
        if_false: Box::new(if_false),
    }
}

impl Step for InterpretationStep {
    fn kind(&self) -> StepKind {
        StepKind::Interpretation
    }

    fn apply(&self, elements: &mut Vec<Element>, context: &DecompilationContext) -> Result<()> {
        let drained = std::mem::take(elements);
        let expression = self.reduce(drained, context)?;
        elements.push(Element::Expression(expression));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        decompilation::translators::default_translators,
        expressions::Parameter,
        metadata::{MethodDef, MethodRef, ParamDef},
        test::instruction_at,
    };

    fn predicate_method() -> MethodDef {
        MethodDef {
            reference: MethodRef {
                declaring_type: "Program".into(),
                name: "Predicate".into(),
                is_static: true,
                param_count: 2,
            },
            parameters: vec![
                ParamDef {
                    name: "a".into(),
                    param_type: "Boolean".into(),
                },
                ParamDef {
                    name: "b".into(),
                    param_type: "Boolean".into(),
                },
            ],
            body: Vec::new(),
        }
    }

    fn reduce(elements: Vec<Element>) -> Result<Expression> {
        let method = predicate_method();
        let context = DecompilationContext::new(&method);
        InterpretationStep::new(default_translators()).reduce(elements, &context)
    }

    fn parameter(name: &str) -> Element {
        Element::Expression(Expression::Parameter(Parameter::new(name)))
    }

    #[test]
    fn arithmetic_reduces_through_translators() {
        let elements = vec![
            Element::Instruction(instruction_at(0, "ldc.i4.2")),
            Element::Instruction(instruction_at(1, "ldc.i4.3")),
            Element::Instruction(instruction_at(2, "add")),
            Element::Instruction(instruction_at(3, "ret")),
        ];

        assert_eq!(reduce(elements).unwrap().to_string(), "2 + 3");
    }

    #[test]
    fn empty_false_arm_folds_to_and_also() {
        let elements = vec![
            parameter("a"),
            Element::ConditionalBranch(ConditionalBranch {
                if_true: vec![parameter("b")],
                if_false: Vec::new(),
            }),
            Element::Instruction(instruction_at(9, "ret")),
        ];

        assert_eq!(reduce(elements).unwrap().to_string(), "a && b");
    }

    #[test]
    fn empty_true_arm_folds_to_or_else() {
        let elements = vec![
            parameter("a"),
            Element::ConditionalBranch(ConditionalBranch {
                if_true: Vec::new(),
                if_false: vec![parameter("b")],
            }),
            Element::Instruction(instruction_at(9, "ret")),
        ];

        assert_eq!(reduce(elements).unwrap().to_string(), "a || b");
    }

    #[test]
    fn both_arms_empty_collapse_to_the_condition() {
        let elements = vec![
            parameter("a"),
            Element::ConditionalBranch(ConditionalBranch::default()),
            Element::Instruction(instruction_at(9, "ret")),
        ];

        assert_eq!(reduce(elements).unwrap().to_string(), "a");
    }

    #[test]
    fn value_arms_stay_a_conditional() {
        let elements = vec![
            parameter("a"),
            Element::ConditionalBranch(ConditionalBranch {
                if_true: vec![Element::Instruction(instruction_at(3, "ldc.i4.2"))],
                if_false: vec![Element::Instruction(instruction_at(7, "ldc.i4.3"))],
            }),
            Element::Instruction(instruction_at(9, "ret")),
        ];

        assert_eq!(reduce(elements).unwrap().to_string(), "(a ? 2 : 3)");
    }

    #[test]
    fn unhandled_instruction_is_reported_by_mnemonic() {
        let elements = vec![
            parameter("a"),
            Element::Instruction(instruction_at(1, "throw")),
        ];

        let result = reduce(elements);

        assert!(matches!(
            result,
            Err(Error::UnsupportedInstruction { mnemonic }) if mnemonic == "throw"
        ));
    }

    #[test]
    fn unlinked_cut_branch_is_malformed() {
        let elements = vec![
            Element::CutBranch(vec![parameter("a")]),
            Element::Instruction(instruction_at(5, "ret")),
        ];

        assert!(matches!(reduce(elements), Err(Error::Malformed { .. })));
    }

    #[test]
    fn applying_twice_is_idempotent() {
        let method = predicate_method();
        let context = DecompilationContext::new(&method);
        let step = InterpretationStep::new(default_translators());
        let mut elements = vec![
            Element::Instruction(instruction_at(0, "ldc.i4.4")),
            Element::Instruction(instruction_at(1, "ret")),
        ];

        step.apply(&mut elements, &context).unwrap();
        let once = elements.clone();
        step.apply(&mut elements, &context).unwrap();

        assert_eq!(elements, once);
    }
}
