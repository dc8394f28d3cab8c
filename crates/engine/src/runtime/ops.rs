use std::cmp::Ordering;

use remote::{BinaryOp, UnaryOp};
use value::Value;

use super::EvalError;

/// Operands are compared and computed on once their present optional layers are peeled.
pub(super) fn binary(op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
    let left = peel(left);
    let right = peel(right);

    match op {
        BinaryOp::Equal => return Ok(Value::Bool(left == right)),
        BinaryOp::NotEqual => return Ok(Value::Bool(left != right)),
        _ if op.is_comparison() => return compare(op, &left, &right),
        _ => {}
    }

    match (op, left, right) {
        (BinaryOp::And, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l && r)),
        (BinaryOp::Or, Value::Bool(l), Value::Bool(r)) => Ok(Value::Bool(l || r)),
        (BinaryOp::Concat, Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
        (op, Value::Int(l), Value::Int(r)) if is_arithmetic(op) => int_arithmetic(op, l, r).map(Value::Int),
        (op, Value::Float(l), Value::Float(r)) if is_arithmetic(op) => Ok(Value::Float(float_arithmetic(op, l, r))),
        (op, left, right) => Err(EvalError::type_mismatch(
            format_args!("{} {op} {}", left.kind(), right.kind()),
            expected_operands(op),
            right.kind(),
        )),
    }
}

pub(super) fn unary(op: UnaryOp, operand: Value) -> Result<Value, EvalError> {
    match (op, peel(operand)) {
        (UnaryOp::Neg, Value::Int(n)) => n
            .checked_neg()
            .map(Value::Int)
            .ok_or_else(|| EvalError::Arithmetic(format!("Integer overflow in -{n}"))),
        (UnaryOp::Neg, Value::Float(n)) => Ok(Value::Float(-n)),
        (UnaryOp::Not, Value::Bool(b)) => Ok(Value::Bool(!b)),
        (UnaryOp::Neg, operand) => Err(EvalError::type_mismatch(op, "Int or Float", operand.kind())),
        (UnaryOp::Not, operand) => Err(EvalError::type_mismatch(op, "Bool", operand.kind())),
    }
}

fn peel(value: Value) -> Value {
    match value {
        Value::Optional(Some(inner)) => peel(*inner),
        value => value,
    }
}

fn is_arithmetic(op: BinaryOp) -> bool {
    matches!(
        op,
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Rem
    )
}

fn expected_operands(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::And | BinaryOp::Or => "two Bool",
        BinaryOp::Concat => "two String",
        _ => "two Int or two Float",
    }
}

fn int_arithmetic(op: BinaryOp, l: i64, r: i64) -> Result<i64, EvalError> {
    if matches!(op, BinaryOp::Div | BinaryOp::Rem) && r == 0 {
        return Err(EvalError::Arithmetic(format!("Division by zero in {l} {op} {r}")));
    }
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div => l.checked_div(r),
        BinaryOp::Rem => l.checked_rem(r),
        _ => None,
    };
    result.ok_or_else(|| EvalError::Arithmetic(format!("Integer overflow in {l} {op} {r}")))
}

fn float_arithmetic(op: BinaryOp, l: f64, r: f64) -> f64 {
    match op {
        BinaryOp::Add => l + r,
        BinaryOp::Sub => l - r,
        BinaryOp::Mul => l * r,
        BinaryOp::Div => l / r,
        _ => l % r,
    }
}

/// Ordering only makes sense between values of the same kind.
fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, EvalError> {
    if left.kind() != right.kind() {
        return Err(EvalError::type_mismatch(
            format_args!("{} {op} {}", left.kind(), right.kind()),
            left.kind(),
            right.kind(),
        ));
    }
    let ordering = left.cmp(right);
    let result = match op {
        BinaryOp::LessThan => ordering == Ordering::Less,
        BinaryOp::LessOrEqual => ordering != Ordering::Greater,
        BinaryOp::GreaterThan => ordering == Ordering::Greater,
        _ => ordering != Ordering::Less,
    };
    Ok(Value::Bool(result))
}
