//! Evaluation of the constant expressions of `#if` and `#elif`, section 6.10.1 of C17.
//!
//! Every signed integer type behaves like `intmax_t` and every unsigned one like `uintmax_t`, so
//! a value is one of two 64-bit integers. Binary operators follow the usual arithmetic
//! conversions: if either operand is unsigned, both are converted to unsigned.
mod character;
mod integer;

#[cfg(test)]
mod tests;

use std::cmp::Ordering;

use derive_more::IsVariant;

pub use self::{
    character::{decode_escape, evaluate_character},
    integer::parse_integer,
};
use crate::{
    diagnostics::Diagnostics,
    earley::ParseTree,
    error::{Error, ErrorKind, Location, Result},
    grammar::c::{BinaryOperator, Tag, UnaryOperator},
    preprocessor::PpToken,
};

/// The value of a constant expression.
#[derive(Copy, Clone, Debug, PartialEq, Eq, IsVariant)]
pub enum Value {
    Signed(i64),
    Unsigned(u64),
}

impl Value {
    fn from_bool(value: bool) -> Value {
        Value::Signed(i64::from(value))
    }

    pub fn is_true(self) -> bool {
        match self {
            Value::Signed(value) => value != 0,
            Value::Unsigned(value) => value != 0,
        }
    }

    fn to_unsigned(self) -> u64 {
        match self {
            Value::Signed(value) => value as u64,
            Value::Unsigned(value) => value,
        }
    }
}

/// Both operands after the usual arithmetic conversions.
enum Converted {
    Signed(i64, i64),
    Unsigned(u64, u64),
}

fn convert(lhs: Value, rhs: Value) -> Converted {
    match (lhs, rhs) {
        (Value::Signed(lhs), Value::Signed(rhs)) => Converted::Signed(lhs, rhs),
        (lhs, rhs) => Converted::Unsigned(lhs.to_unsigned(), rhs.to_unsigned()),
    }
}

type Tree<'t, 'i> = &'t ParseTree<'i, PpToken, Tag>;

/// Evaluate a tree parsed from the `constant-expression` rule.
///
/// `at` is the location of the directive, used for diagnostics about the expression as a whole.
pub fn eval_constant_expression(
    tree: &ParseTree<'_, PpToken, Tag>,
    diagnostics: &Diagnostics,
    at: &Location,
) -> Result<Value> {
    Evaluator { diagnostics, at }.eval(tree)
}

struct Evaluator<'a> {
    diagnostics: &'a Diagnostics,
    at: &'a Location,
}

impl Evaluator<'_> {
    /// The location of the tokens of `tree`.
    fn location(&self, tree: Tree<'_, '_>) -> Location {
        let leaves = tree.leaves();
        let (Some(first), Some(last)) = (leaves.first(), leaves.last()) else {
            return self.at.clone();
        };
        let columns = if first.line == last.line {
            first.column..last.columns().end
        } else {
            first.columns()
        };
        Location::new(self.at.file.clone(), first.line, columns)
    }

    fn error(&self, kind: ErrorKind, tree: Tree<'_, '_>) -> Error {
        kind.at(self.location(tree))
    }

    fn child<'t, 'i>(&self, tree: Tree<'t, 'i>, index: usize) -> Result<Tree<'t, 'i>> {
        tree.tree(index)
            .ok_or_else(|| self.error(ErrorKind::MissingTerminal("expression"), tree))
    }

    /// Evaluate `tree`. Division by zero is only an error in operands whose value is used.
    ///
    /// Chains of left-associative operators make trees as deep as the expression is long, so
    /// the work is kept on an explicit stack of tasks.
    fn eval<'t, 'i>(&self, tree: Tree<'t, 'i>) -> Result<Value> {
        let mut tasks = vec![Task::Eval(tree, true)];
        let mut values = Vec::new();

        while let Some(task) = tasks.pop() {
            match task {
                Task::Eval(tree, live) => self.visit(tree, live, &mut tasks, &mut values)?,
                Task::Unary(tree, operator) => {
                    let operand = self.pop(&mut values)?;
                    values.push(unary(operator, operand).map_err(|kind| self.error(kind, tree))?);
                }
                Task::Rhs(tree, operator, live) => {
                    let lhs = self.pop(&mut values)?;
                    // The right operand of `&&` and `||` is not evaluated when the left one
                    // decides.
                    let rhs_live = match operator {
                        BinaryOperator::LogicalAnd => live && lhs.is_true(),
                        BinaryOperator::LogicalOr => live && !lhs.is_true(),
                        _ => live,
                    };
                    tasks.push(Task::Binary(tree, operator, lhs, live));
                    tasks.push(Task::Eval(self.child(tree, 2)?, rhs_live));
                }
                Task::Binary(tree, operator, lhs, live) => {
                    let rhs = self.pop(&mut values)?;
                    let value = match operator {
                        BinaryOperator::LogicalAnd => {
                            Value::from_bool(lhs.is_true() && rhs.is_true())
                        }
                        BinaryOperator::LogicalOr => {
                            Value::from_bool(lhs.is_true() || rhs.is_true())
                        }
                        _ => apply(operator, lhs, rhs, live).map_err(|kind| self.error(kind, tree))?,
                    };
                    values.push(value);
                }
                Task::Branches(tree, live) => {
                    let condition = self.pop(&mut values)?.is_true();
                    tasks.push(Task::Select(condition));
                    tasks.push(Task::Eval(self.child(tree, 4)?, live && !condition));
                    tasks.push(Task::Eval(self.child(tree, 2)?, live && condition));
                }
                Task::Select(condition) => {
                    let otherwise = self.pop(&mut values)?;
                    let then = self.pop(&mut values)?;
                    let value = if condition { then } else { otherwise };
                    values.push(if then.is_signed() && otherwise.is_signed() {
                        value
                    } else {
                        Value::Unsigned(value.to_unsigned())
                    });
                }
            }
        }

        self.pop(&mut values)
    }

    /// Start evaluating `tree`: constants are pushed on `values`, operators push their operands
    /// on `tasks` after the task that combines them.
    fn visit<'t, 'i>(
        &self,
        tree: Tree<'t, 'i>,
        live: bool,
        tasks: &mut Vec<Task<'t, 'i>>,
        values: &mut Vec<Value>,
    ) -> Result<()> {
        match tree.tag {
            Tag::Next => tasks.push(Task::Eval(self.child(tree, 0)?, live)),
            Tag::Parenthesized => tasks.push(Task::Eval(self.child(tree, 1)?, live)),
            Tag::Number => {
                let token = self.token(tree)?;
                values.push(parse_integer(&token.text).map_err(|kind| self.error(kind, tree))?);
            }
            Tag::Character => {
                let token = self.token(tree)?;
                let location = self.location(tree);
                let value = evaluate_character(&token.text, self.diagnostics, &location)
                    .map_err(|kind| kind.at(location))?;
                values.push(value);
            }
            Tag::Unary(operator @ (UnaryOperator::AddressOf | UnaryOperator::Dereference)) => {
                let construct = disallowed(Tag::Unary(operator));
                return Err(self.error(ErrorKind::Disallowed(construct), tree));
            }
            Tag::Unary(operator) => {
                tasks.push(Task::Unary(tree, operator));
                tasks.push(Task::Eval(self.child(tree, 1)?, live));
            }
            Tag::Binary(operator) => {
                tasks.push(Task::Rhs(tree, operator, live));
                tasks.push(Task::Eval(self.child(tree, 0)?, live));
            }
            Tag::Conditional => {
                tasks.push(Task::Branches(tree, live));
                tasks.push(Task::Eval(self.child(tree, 0)?, live));
            }
            tag => return Err(self.error(ErrorKind::Disallowed(disallowed(tag)), tree)),
        }
        Ok(())
    }

    fn pop(&self, values: &mut Vec<Value>) -> Result<Value> {
        values
            .pop()
            .ok_or_else(|| ErrorKind::MissingTerminal("expression").at(self.at.clone()))
    }

    fn token<'i>(&self, tree: Tree<'_, 'i>) -> Result<&'i PpToken> {
        tree.leaf(0)
            .ok_or_else(|| self.error(ErrorKind::MissingTerminal("constant"), tree))
    }
}

/// A step of [`Evaluator::eval`].
enum Task<'t, 'i> {
    /// Evaluate a tree, with division by zero an error if the flag is set.
    Eval(Tree<'t, 'i>, bool),
    /// Replace the value on top with the result of the operator.
    Unary(Tree<'t, 'i>, UnaryOperator),
    /// Take the left operand from the top and evaluate the right one.
    Rhs(Tree<'t, 'i>, BinaryOperator, bool),
    /// Replace the right operand on top with the result of the operator.
    Binary(Tree<'t, 'i>, BinaryOperator, Value, bool),
    /// The condition is on top, evaluate both branches.
    Branches(Tree<'t, 'i>, bool),
    /// Replace both branches with the one the condition picked.
    Select(bool),
}

fn unary(operator: UnaryOperator, operand: Value) -> std::result::Result<Value, ErrorKind> {
    Ok(match (operator, operand) {
        (UnaryOperator::Plus, value) => value,
        (UnaryOperator::Minus, Value::Signed(value)) => Value::Signed(value.wrapping_neg()),
        (UnaryOperator::Minus, Value::Unsigned(value)) => Value::Unsigned(value.wrapping_neg()),
        (UnaryOperator::Complement, Value::Signed(value)) => Value::Signed(!value),
        (UnaryOperator::Complement, Value::Unsigned(value)) => Value::Unsigned(!value),
        (UnaryOperator::Not, value) => Value::from_bool(!value.is_true()),
        (UnaryOperator::AddressOf | UnaryOperator::Dereference, _) => {
            return Err(ErrorKind::Disallowed(disallowed(Tag::Unary(operator))));
        }
    })
}

/// Apply an operator that evaluates both of its operands.
fn apply(
    operator: BinaryOperator,
    lhs: Value,
    rhs: Value,
    live: bool,
) -> std::result::Result<Value, ErrorKind> {
    use BinaryOperator::*;

    match operator {
        ShiftLeft | ShiftRight => return Ok(shift(operator, lhs, rhs)),
        Less | Greater | LessEqual | GreaterEqual | Equal | NotEqual => {
            let ordering = match convert(lhs, rhs) {
                Converted::Signed(lhs, rhs) => lhs.cmp(&rhs),
                Converted::Unsigned(lhs, rhs) => lhs.cmp(&rhs),
            };
            return Ok(Value::from_bool(match operator {
                Less => ordering == Ordering::Less,
                Greater => ordering == Ordering::Greater,
                LessEqual => ordering != Ordering::Greater,
                GreaterEqual => ordering != Ordering::Less,
                Equal => ordering == Ordering::Equal,
                _ => ordering != Ordering::Equal,
            }));
        }
        _ => {}
    }

    if matches!(operator, Divide | Remainder) && !rhs.is_true() {
        if live {
            return Err(ErrorKind::DivisionByZero);
        }
        return Ok(match convert(lhs, rhs) {
            Converted::Signed(..) => Value::Signed(0),
            Converted::Unsigned(..) => Value::Unsigned(0),
        });
    }

    Ok(match convert(lhs, rhs) {
        Converted::Signed(lhs, rhs) => Value::Signed(match operator {
            Multiply => lhs.wrapping_mul(rhs),
            Divide => lhs.wrapping_div(rhs),
            Remainder => lhs.wrapping_rem(rhs),
            Add => lhs.wrapping_add(rhs),
            Subtract => lhs.wrapping_sub(rhs),
            BitAnd => lhs & rhs,
            BitXor => lhs ^ rhs,
            _ => lhs | rhs,
        }),
        Converted::Unsigned(lhs, rhs) => Value::Unsigned(match operator {
            Multiply => lhs.wrapping_mul(rhs),
            Divide => lhs / rhs,
            Remainder => lhs % rhs,
            Add => lhs.wrapping_add(rhs),
            Subtract => lhs.wrapping_sub(rhs),
            BitAnd => lhs & rhs,
            BitXor => lhs ^ rhs,
            _ => lhs | rhs,
        }),
    })
}

/// Shift operators only promote their left operand, which gives the type of the result. A
/// negative amount shifts the other way.
fn shift(operator: BinaryOperator, lhs: Value, rhs: Value) -> Value {
    let (left, amount) = match rhs {
        Value::Signed(amount) if amount < 0 => (
            operator == BinaryOperator::ShiftRight,
            amount.unsigned_abs(),
        ),
        amount => (operator == BinaryOperator::ShiftLeft, amount.to_unsigned()),
    };
    let amount = u32::try_from(amount).unwrap_or(u32::MAX);

    match lhs {
        Value::Signed(value) if left => Value::Signed(value.checked_shl(amount).unwrap_or(0)),
        Value::Signed(value) => Value::Signed(value >> amount.min(63)),
        Value::Unsigned(value) if left => Value::Unsigned(value.checked_shl(amount).unwrap_or(0)),
        Value::Unsigned(value) => Value::Unsigned(value.checked_shr(amount).unwrap_or(0)),
    }
}

/// The name of a construct a preprocessor constant expression cannot contain.
fn disallowed(tag: Tag) -> &'static str {
    match tag {
        Tag::Comma => "comma operator",
        Tag::Assign => "assignment",
        Tag::Cast => "cast",
        Tag::Sizeof => "sizeof",
        Tag::Alignof => "_Alignof",
        Tag::PreIncrement | Tag::PostIncrement => "increment operator",
        Tag::PreDecrement | Tag::PostDecrement => "decrement operator",
        Tag::Subscript => "array subscript",
        Tag::Call => "function call",
        Tag::Member | Tag::Arrow => "member access",
        Tag::Identifier => "identifier",
        Tag::Unary(UnaryOperator::AddressOf) => "address-of operator",
        Tag::Unary(UnaryOperator::Dereference) => "indirection operator",
        Tag::StringLiteral => "string literal",
        _ => "this construct",
    }
}
