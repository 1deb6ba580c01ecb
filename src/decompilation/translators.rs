//! Per-opcode interpretation rules.
//!
//! Each [`InstructionTranslator`] owns one opcode family's stack effect: it pops the
//! operands the instruction would consume from the evaluation stack and returns the
//! expression the instruction pushes. The registry assembled by
//! [`default_translators`] covers the loads, calls and operators that occur in
//! compiler-generated predicate bodies; anything outside it surfaces as
//! [`crate::Error::UnsupportedInstruction`] during interpretation.

use crate::{
    decompilation::DecompilationContext,
    disassembler::{Immediate, Instruction, Operand},
    expressions::{BinaryOp, Constant, Expression, UnaryOp},
    metadata::MemberRef,
    Result,
};

/// Mutable interpretation state handed to a translator.
pub struct TranslationContext<'a, 'b> {
    /// The evaluation stack being reduced
    pub stack: &'a mut Vec<Expression>,
    /// Parameter environment of the method under decompilation
    pub method: &'a DecompilationContext<'b>,
}

impl TranslationContext<'_, '_> {
    /// Pops the top of the evaluation stack.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] when the stack is empty; verifiable
    /// CIL never underflows, so this indicates a damaged body.
    pub fn pop(&mut self) -> Result<Expression> {
        self.stack
            .pop()
            .ok_or_else(|| malformed_error!("evaluation stack underflow"))
    }

    /// Pops `count` values and returns them in push order.
    ///
    /// # Errors
    /// Returns [`crate::Error::Malformed`] when fewer than `count` values are
    /// on the stack.
    pub fn pop_args(&mut self, count: usize) -> Result<Vec<Expression>> {
        let mut arguments = Vec::with_capacity(count);
        for _ in 0..count {
            arguments.push(self.pop()?);
        }
        arguments.reverse();
        Ok(arguments)
    }
}

/// One opcode family's interpretation rule.
///
/// Translators are stateless; the interpretation step probes its registry in
/// order and uses the first translator that claims the instruction.
pub trait InstructionTranslator {
    /// Whether this translator handles `instruction`.
    fn can_interpret(&self, instruction: &Instruction) -> bool;

    /// Produces the expression `instruction` pushes.
    ///
    /// Consumed operands are popped from `context`; the returned expression is
    /// pushed onto the stack by the caller.
    ///
    /// # Errors
    /// Fails on stack underflow or when the instruction's operand does not
    /// match the shape its mnemonic promises.
    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression>;
}

/// The built-in translator registry, in probe order.
#[must_use]
pub fn default_translators() -> Vec<Box<dyn InstructionTranslator>> {
    vec![
        Box::new(ArgumentLoad),
        Box::new(ConstantLoad),
        Box::new(StringLoad),
        Box::new(NullLoad),
        Box::new(FieldLoad),
        Box::new(CallTranslator),
        Box::new(BinaryOperator),
        Box::new(UnaryOperator),
        Box::new(Duplicate),
        Box::new(Conversion),
    ]
}

/// `ldarg` family: pushes the parameter bound to an argument slot.
pub struct ArgumentLoad;

impl InstructionTranslator for ArgumentLoad {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        matches!(
            instruction.mnemonic,
            "ldarg.0" | "ldarg.1" | "ldarg.2" | "ldarg.3" | "ldarg.s" | "ldarg"
        )
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let slot = match (instruction.mnemonic, &instruction.operand) {
            ("ldarg.0", _) => 0,
            ("ldarg.1", _) => 1,
            ("ldarg.2", _) => 2,
            ("ldarg.3", _) => 3,
            (_, Operand::Variable(slot)) => usize::from(*slot),
            _ => return Err(malformed_error!("ldarg without a slot operand")),
        };

        context.method.parameter(slot)
    }
}

/// `ldc` family: pushes a numeric literal.
pub struct ConstantLoad;

impl InstructionTranslator for ConstantLoad {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        instruction.mnemonic.starts_with("ldc.")
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        _context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let constant = match (instruction.mnemonic, &instruction.operand) {
            ("ldc.i4.m1", _) => Constant::Int32(-1),
            // ldc.i4.0 through ldc.i4.8 encode their value in the opcode
            (mnemonic, Operand::None) if mnemonic.starts_with("ldc.i4.") => {
                Constant::Int32(i32::from(instruction.opcode) - 0x16)
            }
            ("ldc.i4.s", Operand::Immediate(Immediate::Int8(value))) => {
                Constant::Int32(i32::from(*value))
            }
            ("ldc.i4", Operand::Immediate(Immediate::Int32(value))) => Constant::Int32(*value),
            ("ldc.i8", Operand::Immediate(Immediate::Int64(value))) => Constant::Int64(*value),
            ("ldc.r4", Operand::Immediate(Immediate::Float32(value))) => Constant::Float32(*value),
            ("ldc.r8", Operand::Immediate(Immediate::Float64(value))) => Constant::Float64(*value),
            _ => {
                return Err(malformed_error!(
                    "constant load '{}' carries an unexpected operand",
                    instruction.mnemonic
                ))
            }
        };

        Ok(Expression::Constant(constant))
    }
}

/// `ldstr`: pushes the resolved string literal.
pub struct StringLoad;

impl InstructionTranslator for StringLoad {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        instruction.mnemonic == "ldstr"
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        _context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        match &instruction.operand {
            Operand::String(value) => Ok(Expression::Constant(Constant::String(value.clone()))),
            _ => Err(malformed_error!("ldstr without a resolved string operand")),
        }
    }
}

/// `ldnull`: pushes the null constant.
pub struct NullLoad;

impl InstructionTranslator for NullLoad {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        instruction.mnemonic == "ldnull"
    }

    fn interpret(
        &self,
        _instruction: &Instruction,
        _context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        Ok(Expression::Constant(Constant::Null))
    }
}

/// `ldfld`/`ldsfld`: pushes a field access.
pub struct FieldLoad;

impl InstructionTranslator for FieldLoad {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        matches!(instruction.mnemonic, "ldfld" | "ldsfld")
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let Operand::Field(field) = &instruction.operand else {
            return Err(malformed_error!(
                "'{}' without a resolved field operand",
                instruction.mnemonic
            ));
        };

        let target = match instruction.mnemonic {
            "ldfld" => Some(Box::new(context.pop()?)),
            _ => None,
        };

        Ok(Expression::MemberAccess {
            target,
            member: MemberRef {
                declaring_type: field.declaring_type.clone(),
                name: field.name.clone(),
            },
        })
    }
}

/// `call`/`callvirt`: pushes a call, or a member access for `get_*` accessors.
pub struct CallTranslator;

impl InstructionTranslator for CallTranslator {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        matches!(instruction.mnemonic, "call" | "callvirt")
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let Operand::Method(method) = &instruction.operand else {
            return Err(malformed_error!(
                "'{}' without a resolved method operand",
                instruction.mnemonic
            ));
        };

        // Arguments sit on top of the receiver, so they come off first.
        let arguments = context.pop_args(method.param_count)?;
        let target = if method.is_static {
            None
        } else {
            Some(Box::new(context.pop()?))
        };

        // Property getters surface as member accesses, which is also what makes
        // them visible to the inliner.
        if let Some(property) = method.property_name() {
            return Ok(Expression::MemberAccess {
                target,
                member: MemberRef {
                    declaring_type: method.declaring_type.clone(),
                    name: property.to_string(),
                },
            });
        }

        Ok(Expression::Call {
            target,
            method: method.clone(),
            arguments,
        })
    }
}

/// Inverse of a comparison operator, for recovering negated comparisons.
fn comparison_inverse(op: BinaryOp) -> Option<BinaryOp> {
    match op {
        BinaryOp::Equal => Some(BinaryOp::NotEqual),
        BinaryOp::NotEqual => Some(BinaryOp::Equal),
        BinaryOp::GreaterThan => Some(BinaryOp::LessThanOrEqual),
        BinaryOp::LessThanOrEqual => Some(BinaryOp::GreaterThan),
        BinaryOp::LessThan => Some(BinaryOp::GreaterThanOrEqual),
        BinaryOp::GreaterThanOrEqual => Some(BinaryOp::LessThan),
        _ => None,
    }
}

/// Binary arithmetic, bitwise and comparison opcodes.
pub struct BinaryOperator;

impl BinaryOperator {
    fn operator(mnemonic: &str) -> Option<BinaryOp> {
        match mnemonic {
            "add" | "add.ovf" | "add.ovf.un" => Some(BinaryOp::Add),
            "sub" | "sub.ovf" | "sub.ovf.un" => Some(BinaryOp::Subtract),
            "mul" | "mul.ovf" | "mul.ovf.un" => Some(BinaryOp::Multiply),
            "div" | "div.un" => Some(BinaryOp::Divide),
            "rem" | "rem.un" => Some(BinaryOp::Modulo),
            "and" => Some(BinaryOp::And),
            "or" => Some(BinaryOp::Or),
            "xor" => Some(BinaryOp::ExclusiveOr),
            "shl" => Some(BinaryOp::LeftShift),
            "shr" | "shr.un" => Some(BinaryOp::RightShift),
            "ceq" => Some(BinaryOp::Equal),
            "cgt" | "cgt.un" => Some(BinaryOp::GreaterThan),
            "clt" | "clt.un" => Some(BinaryOp::LessThan),
            _ => None,
        }
    }
}

impl InstructionTranslator for BinaryOperator {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        Self::operator(instruction.mnemonic).is_some()
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let Some(op) = Self::operator(instruction.mnemonic) else {
            return Err(malformed_error!(
                "'{}' is not a binary operator",
                instruction.mnemonic
            ));
        };

        let right = context.pop()?;
        let left = context.pop()?;

        // The C# compiler spells `a != b` as `(a == b) == 0`, and `a >= b` as
        // `(a < b) == 0`; fold the comparison-against-zero back into the
        // inverted comparison.
        if op == BinaryOp::Equal {
            if let (
                Expression::Binary {
                    op: inner,
                    left: inner_left,
                    right: inner_right,
                },
                Expression::Constant(Constant::Int32(0) | Constant::Bool(false)),
            ) = (&left, &right)
            {
                if let Some(inverted) = comparison_inverse(*inner) {
                    return Ok(Expression::Binary {
                        op: inverted,
                        left: inner_left.clone(),
                        right: inner_right.clone(),
                    });
                }
            }
        }

        Ok(Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }
}

/// `neg`/`not`: unary operators.
pub struct UnaryOperator;

impl InstructionTranslator for UnaryOperator {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        matches!(instruction.mnemonic, "neg" | "not")
    }

    fn interpret(
        &self,
        instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let op = match instruction.mnemonic {
            "neg" => UnaryOp::Negate,
            _ => UnaryOp::Not,
        };

        Ok(Expression::Unary {
            op,
            operand: Box::new(context.pop()?),
        })
    }
}

/// `dup`: duplicates the top of the stack.
pub struct Duplicate;

impl InstructionTranslator for Duplicate {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        instruction.mnemonic == "dup"
    }

    fn interpret(
        &self,
        _instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        let value = context.pop()?;
        context.stack.push(value.clone());
        Ok(value)
    }
}

/// `conv.*`/`box`: numeric and boxing conversions, treated as identity.
///
/// Expression-tree comparison does not track the CLR's widening rules, so the
/// converted value is passed through unchanged.
pub struct Conversion;

impl InstructionTranslator for Conversion {
    fn can_interpret(&self, instruction: &Instruction) -> bool {
        instruction.mnemonic.starts_with("conv.") || instruction.mnemonic == "box"
    }

    fn interpret(
        &self,
        _instruction: &Instruction,
        context: &mut TranslationContext<'_, '_>,
    ) -> Result<Expression> {
        context.pop()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metadata::{MethodDef, MethodRef, ParamDef},
        test::instruction_at,
    };

    fn customer_method() -> MethodDef {
        MethodDef {
            reference: MethodRef {
                declaring_type: "Program".into(),
                name: "Predicate".into(),
                is_static: true,
                param_count: 1,
            },
            parameters: vec![ParamDef {
                name: "c".into(),
                param_type: "Customer".into(),
            }],
            body: Vec::new(),
        }
    }

    fn interpret_one(
        translator: &dyn InstructionTranslator,
        instruction: &Instruction,
        stack: &mut Vec<Expression>,
    ) -> Result<Expression> {
        let method = customer_method();
        let context = DecompilationContext::new(&method);
        let mut translation = TranslationContext {
            stack,
            method: &context,
        };
        translator.interpret(instruction, &mut translation)
    }

    #[test]
    fn short_constant_value_comes_from_the_opcode() {
        let mut stack = Vec::new();
        let five = interpret_one(&ConstantLoad, &instruction_at(0, "ldc.i4.5"), &mut stack).unwrap();
        let minus_one =
            interpret_one(&ConstantLoad, &instruction_at(1, "ldc.i4.m1"), &mut stack).unwrap();

        assert_eq!(five, Expression::Constant(Constant::Int32(5)));
        assert_eq!(minus_one, Expression::Constant(Constant::Int32(-1)));
    }

    #[test]
    fn ldarg_0_resolves_the_first_slot() {
        let mut stack = Vec::new();
        let result = interpret_one(&ArgumentLoad, &instruction_at(0, "ldarg.0"), &mut stack);

        assert_eq!(result.unwrap().to_string(), "c");
    }

    #[test]
    fn getter_call_becomes_member_access() {
        let mut stack = vec![Expression::Parameter(
            crate::expressions::Parameter::new("c"),
        )];
        let instruction = Instruction {
            offset: 0,
            prefix: 0,
            opcode: 0x6F,
            mnemonic: "callvirt",
            flow: crate::disassembler::FlowType::Call,
            operand: Operand::Method(MethodRef {
                declaring_type: "Customer".into(),
                name: "get_FirstName".into(),
                is_static: false,
                param_count: 0,
            }),
        };

        let result = interpret_one(&CallTranslator, &instruction, &mut stack).unwrap();

        assert_eq!(result.to_string(), "c.FirstName");
        assert!(stack.is_empty());
    }

    #[test]
    fn comparison_against_zero_inverts() {
        let comparison = Expression::Binary {
            op: BinaryOp::LessThan,
            left: Box::new(Expression::Constant(Constant::Int32(1))),
            right: Box::new(Expression::Constant(Constant::Int32(2))),
        };
        let mut stack = vec![comparison, Expression::Constant(Constant::Int32(0))];

        let result = interpret_one(&BinaryOperator, &instruction_at(0, "ceq"), &mut stack).unwrap();

        assert_eq!(result.to_string(), "1 >= 2");
    }

    #[test]
    fn dup_leaves_two_copies() {
        let mut stack = vec![Expression::Constant(Constant::Int32(7))];

        let result = interpret_one(&Duplicate, &instruction_at(0, "dup"), &mut stack).unwrap();

        assert_eq!(result, Expression::Constant(Constant::Int32(7)));
        assert_eq!(stack.len(), 1);
    }

    #[test]
    fn underflow_is_malformed() {
        let mut stack = Vec::new();
        let result = interpret_one(&BinaryOperator, &instruction_at(0, "add"), &mut stack);

        assert!(matches!(result, Err(crate::Error::Malformed { .. })));
    }
}
