//! The expression tree produced by decompilation.
//!
//! [`Expression`] is the host-compatible output representation: a small sum type over
//! constants, parameters, member accesses, calls, operators and conditionals, plus the
//! lambda wrapper tying a body to its parameter list. The `Display` implementation
//! renders the C#-flavoured textual form used throughout the tests
//! (`c.FirstName.Length > 5`, `Concat(c.FirstName, " ", c.LastName)`).
//!
//! The only structural operation offered is [`Expression::rewrite`], a bottom-up
//! fallible map; parameter substitution and inlining are both built on it.

use std::fmt;

use crate::{
    metadata::{MemberRef, MethodRef},
    Result,
};

/// A literal value in an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    /// The `null` reference
    Null,
    /// Boolean constant
    Bool(bool),
    /// 32-bit integer constant
    Int32(i32),
    /// 64-bit integer constant
    Int64(i64),
    /// 32-bit float constant
    Float32(f32),
    /// 64-bit float constant
    Float64(f64),
    /// String literal
    String(String),
}

/// A lambda parameter, identified by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    /// Parameter name; the implicit receiver uses [`Parameter::RECEIVER`]
    pub name: String,
}

impl Parameter {
    /// Name given to the implicit instance receiver (argument slot 0).
    pub const RECEIVER: &'static str = "<this>";

    /// Create a named parameter.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Parameter { name: name.into() }
    }

    /// Create the implicit receiver parameter.
    #[must_use]
    pub fn receiver() -> Self {
        Parameter::new(Self::RECEIVER)
    }
}

/// Binary operator of a [`Expression::Binary`] node, rendered with its C# spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum BinaryOp {
    /// `+`
    #[strum(serialize = "+")]
    Add,
    /// `-`
    #[strum(serialize = "-")]
    Subtract,
    /// `*`
    #[strum(serialize = "*")]
    Multiply,
    /// `/`
    #[strum(serialize = "/")]
    Divide,
    /// `%`
    #[strum(serialize = "%")]
    Modulo,
    /// `&` (bitwise)
    #[strum(serialize = "&")]
    And,
    /// `|` (bitwise)
    #[strum(serialize = "|")]
    Or,
    /// `^`
    #[strum(serialize = "^")]
    ExclusiveOr,
    /// `<<`
    #[strum(serialize = "<<")]
    LeftShift,
    /// `>>`
    #[strum(serialize = ">>")]
    RightShift,
    /// `==`
    #[strum(serialize = "==")]
    Equal,
    /// `!=`
    #[strum(serialize = "!=")]
    NotEqual,
    /// `>`
    #[strum(serialize = ">")]
    GreaterThan,
    /// `>=`
    #[strum(serialize = ">=")]
    GreaterThanOrEqual,
    /// `<`
    #[strum(serialize = "<")]
    LessThan,
    /// `<=`
    #[strum(serialize = "<=")]
    LessThanOrEqual,
    /// `&&` (short-circuit)
    #[strum(serialize = "&&")]
    AndAlso,
    /// `||` (short-circuit)
    #[strum(serialize = "||")]
    OrElse,
}

/// Unary operator of a [`Expression::Unary`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
pub enum UnaryOp {
    /// Arithmetic negation, `-x`
    #[strum(serialize = "-")]
    Negate,
    /// Bitwise/logical complement, `!x`
    #[strum(serialize = "!")]
    Not,
}

/// A node of the decompiled expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// Literal value
    Constant(Constant),
    /// Reference to a lambda/method parameter
    Parameter(Parameter),
    /// Field or property access; `target` is `None` for static members
    MemberAccess {
        /// Receiver expression, `None` for static members
        target: Option<Box<Expression>>,
        /// The accessed member
        member: MemberRef,
    },
    /// Method invocation; `target` is `None` for static calls
    Call {
        /// Receiver expression, `None` for static calls
        target: Option<Box<Expression>>,
        /// The invoked method
        method: MethodRef,
        /// Argument expressions, in declaration order
        arguments: Vec<Expression>,
    },
    /// Binary operator application
    Binary {
        /// The operator
        op: BinaryOp,
        /// Left operand
        left: Box<Expression>,
        /// Right operand
        right: Box<Expression>,
    },
    /// Unary operator application
    Unary {
        /// The operator
        op: UnaryOp,
        /// The operand
        operand: Box<Expression>,
    },
    /// Ternary conditional, `condition ? if_true : if_false`
    Conditional {
        /// The tested condition
        condition: Box<Expression>,
        /// Value when the condition holds
        if_true: Box<Expression>,
        /// Value when the condition does not hold
        if_false: Box<Expression>,
    },
    /// A lambda tying a body to its parameters
    Lambda {
        /// Declared parameters, receiver first when present
        parameters: Vec<Parameter>,
        /// The lambda body
        body: Box<Expression>,
    },
}

impl Expression {
    /// Shorthand for a boolean constant node.
    #[must_use]
    pub fn bool(value: bool) -> Self {
        Expression::Constant(Constant::Bool(value))
    }

    /// Rewrites the tree bottom-up through a fallible mapping.
    ///
    /// Children are rebuilt first, then `f` is applied to the rebuilt node, so a
    /// replacement produced by `f` is never re-visited. The identity mapping
    /// returns a structurally equal tree.
    ///
    /// # Errors
    /// Propagates the first error returned by `f`; no partially rewritten tree
    /// escapes.
    pub fn rewrite<F>(self, f: &mut F) -> Result<Expression>
    where
        F: FnMut(Expression) -> Result<Expression>,
    {
        let rebuilt = match self {
            Expression::Constant(_) | Expression::Parameter(_) => self,
            Expression::MemberAccess { target, member } => Expression::MemberAccess {
                target: rewrite_boxed_opt(target, f)?,
                member,
            },
            Expression::Call {
                target,
                method,
                arguments,
            } => Expression::Call {
                target: rewrite_boxed_opt(target, f)?,
                method,
                arguments: arguments
                    .into_iter()
                    .map(|a| a.rewrite(f))
                    .collect::<Result<_>>()?,
            },
            Expression::Binary { op, left, right } => Expression::Binary {
                op,
                left: Box::new(left.rewrite(f)?),
                right: Box::new(right.rewrite(f)?),
            },
            Expression::Unary { op, operand } => Expression::Unary {
                op,
                operand: Box::new(operand.rewrite(f)?),
            },
            Expression::Conditional {
                condition,
                if_true,
                if_false,
            } => Expression::Conditional {
                condition: Box::new(condition.rewrite(f)?),
                if_true: Box::new(if_true.rewrite(f)?),
                if_false: Box::new(if_false.rewrite(f)?),
            },
            Expression::Lambda { parameters, body } => Expression::Lambda {
                parameters,
                body: Box::new(body.rewrite(f)?),
            },
        };

        f(rebuilt)
    }

    /// Substitutes every reference to the parameter named `name` with `replacement`.
    #[must_use]
    pub fn substitute_parameter(self, name: &str, replacement: &Expression) -> Expression {
        let result = self.rewrite(&mut |node| match node {
            Expression::Parameter(ref p) if p.name == name => Ok(replacement.clone()),
            other => Ok(other),
        });

        // The mapping above is infallible
        match result {
            Ok(expression) => expression,
            Err(_) => unreachable!(),
        }
    }
}

fn rewrite_boxed_opt<F>(
    target: Option<Box<Expression>>,
    f: &mut F,
) -> Result<Option<Box<Expression>>>
where
    F: FnMut(Expression) -> Result<Expression>,
{
    match target {
        Some(expression) => Ok(Some(Box::new(expression.rewrite(f)?))),
        None => Ok(None),
    }
}

impl fmt::Display for Constant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Constant::Null => write!(f, "null"),
            Constant::Bool(true) => write!(f, "True"),
            Constant::Bool(false) => write!(f, "False"),
            Constant::Int32(v) => write!(f, "{v}"),
            Constant::Int64(v) => write!(f, "{v}"),
            Constant::Float32(v) => write!(f, "{v}"),
            Constant::Float64(v) => write!(f, "{v}"),
            Constant::String(s) => {
                write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
            }
        }
    }
}

/// Wraps composite operands in parentheses so operator nesting stays readable
/// without reproducing full precedence rules.
fn fmt_operand(expression: &Expression, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match expression {
        Expression::Binary { .. } => write!(f, "({expression})"),
        _ => write!(f, "{expression}"),
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Constant(constant) => write!(f, "{constant}"),
            Expression::Parameter(parameter) => write!(f, "{}", parameter.name),
            Expression::MemberAccess { target, member } => match target {
                Some(target) => write!(f, "{target}.{}", member.name),
                None => write!(f, "{}.{}", member.declaring_type, member.name),
            },
            Expression::Call {
                target,
                method,
                arguments,
            } => {
                // Static calls render bare, the way .NET expression trees print them
                if let Some(target) = target {
                    write!(f, "{target}.{}(", method.name)?;
                } else {
                    write!(f, "{}(", method.name)?;
                }
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{argument}")?;
                }
                write!(f, ")")
            }
            Expression::Binary { op, left, right } => {
                fmt_operand(left, f)?;
                write!(f, " {op} ")?;
                fmt_operand(right, f)
            }
            Expression::Unary { op, operand } => {
                write!(f, "{op}")?;
                fmt_operand(operand, f)
            }
            Expression::Conditional {
                condition,
                if_true,
                if_false,
            } => write!(f, "({condition} ? {if_true} : {if_false})"),
            Expression::Lambda { parameters, body } => {
                match parameters.len() {
                    1 => write!(f, "{}", parameters[0].name)?,
                    _ => {
                        write!(f, "(")?;
                        for (index, parameter) in parameters.iter().enumerate() {
                            if index > 0 {
                                write!(f, ", ")?;
                            }
                            write!(f, "{}", parameter.name)?;
                        }
                        write!(f, ")")?;
                    }
                }
                write!(f, " => {body}")
            }
        }
    }
}
