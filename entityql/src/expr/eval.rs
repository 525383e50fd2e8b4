// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar operator semantics
//!
//! Shared by constant folding during translation and by the reference
//! executor. Comparisons and arithmetic follow three-valued logic: a null
//! operand yields null ("unknown"), and `and`/`or` use Kleene semantics.

use crate::expr::expression::{BinaryOp, UnaryOp};
use crate::functions::FunctionError;
use crate::types::{TypeCoercion, Value, ValueType};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScalarError {
    #[error("Division by zero")]
    DivisionByZero,

    #[error("Arithmetic overflow in {0}")]
    Overflow(&'static str),

    #[error("Operator '{op}' cannot be applied to {operand}")]
    InvalidOperand { op: &'static str, operand: String },

    #[error("Cannot convert {value} to {to}")]
    Conversion { value: String, to: ValueType },

    #[error(transparent)]
    Function(#[from] FunctionError),
}

pub type ScalarResult<T> = Result<T, ScalarError>;

pub fn binary(op: BinaryOp, left: &Value, right: &Value) -> ScalarResult<Value> {
    match op {
        BinaryOp::And => logical_and(left, right),
        BinaryOp::Or => logical_or(left, right),
        _ if left.is_null() || right.is_null() => Ok(Value::Null),
        BinaryOp::Eq => Ok(Value::from(left.equals(right))),
        BinaryOp::Ne => Ok(Value::from(left.equals(right).map(|eq| !eq))),
        BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
            let ordering = left.compare(right).ok_or_else(|| invalid(op, left, right))?;
            let result = match op {
                BinaryOp::Lt => ordering.is_lt(),
                BinaryOp::Le => ordering.is_le(),
                BinaryOp::Gt => ordering.is_gt(),
                _ => ordering.is_ge(),
            };
            Ok(Value::Boolean(result))
        }
        BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod => {
            arithmetic(op, left, right)
        }
    }
}

fn invalid(op: BinaryOp, left: &Value, right: &Value) -> ScalarError {
    ScalarError::InvalidOperand {
        op: op.symbol(),
        operand: format!("{} and {}", left, right),
    }
}

fn truth(op: BinaryOp, value: &Value) -> ScalarResult<Option<bool>> {
    match value {
        Value::Null => Ok(None),
        Value::Boolean(b) => Ok(Some(*b)),
        other => Err(ScalarError::InvalidOperand {
            op: op.symbol(),
            operand: other.to_string(),
        }),
    }
}

fn logical_and(left: &Value, right: &Value) -> ScalarResult<Value> {
    let result = match (truth(BinaryOp::And, left)?, truth(BinaryOp::And, right)?) {
        (Some(false), _) | (_, Some(false)) => Some(false),
        (Some(true), Some(true)) => Some(true),
        _ => None,
    };
    Ok(Value::from(result))
}

fn logical_or(left: &Value, right: &Value) -> ScalarResult<Value> {
    let result = match (truth(BinaryOp::Or, left)?, truth(BinaryOp::Or, right)?) {
        (Some(true), _) | (_, Some(true)) => Some(true),
        (Some(false), Some(false)) => Some(false),
        _ => None,
    };
    Ok(Value::from(result))
}

fn arithmetic(op: BinaryOp, left: &Value, right: &Value) -> ScalarResult<Value> {
    if matches!(left, Value::Double(_)) || matches!(right, Value::Double(_)) {
        let (l, r) = match (left.as_f64(), right.as_f64()) {
            (Some(l), Some(r)) => (l, r),
            _ => return Err(invalid(op, left, right)),
        };
        let result = match op {
            BinaryOp::Add => l + r,
            BinaryOp::Sub => l - r,
            BinaryOp::Mul => l * r,
            BinaryOp::Div => l / r,
            _ => l % r,
        };
        return Ok(Value::Double(result));
    }

    if let (Value::Int32(l), Value::Int32(r)) = (left, right) {
        return integer_op(op, i64::from(*l), i64::from(*r)).and_then(|n| {
            i32::try_from(n)
                .map(Value::Int32)
                .map_err(|_| ScalarError::Overflow(op.symbol()))
        });
    }

    match (left.as_i64(), right.as_i64()) {
        (Some(l), Some(r)) => integer_op(op, l, r).map(Value::Int64),
        _ => Err(invalid(op, left, right)),
    }
}

fn integer_op(op: BinaryOp, l: i64, r: i64) -> ScalarResult<i64> {
    let result = match op {
        BinaryOp::Add => l.checked_add(r),
        BinaryOp::Sub => l.checked_sub(r),
        BinaryOp::Mul => l.checked_mul(r),
        BinaryOp::Div | BinaryOp::Mod if r == 0 => return Err(ScalarError::DivisionByZero),
        BinaryOp::Div => l.checked_div(r),
        _ => l.checked_rem(r),
    };
    result.ok_or(ScalarError::Overflow(op.symbol()))
}

pub fn unary(op: UnaryOp, operand: &Value) -> ScalarResult<Value> {
    match op {
        UnaryOp::IsNull => Ok(Value::Boolean(operand.is_null())),
        UnaryOp::IsNotNull => Ok(Value::Boolean(!operand.is_null())),
        UnaryOp::Not => match operand {
            Value::Null => Ok(Value::Null),
            Value::Boolean(b) => Ok(Value::Boolean(!b)),
            other => Err(ScalarError::InvalidOperand {
                op: "!",
                operand: other.to_string(),
            }),
        },
        UnaryOp::Negate => match operand {
            Value::Null => Ok(Value::Null),
            Value::Int32(n) => n.checked_neg().map(Value::Int32).ok_or(ScalarError::Overflow("-")),
            Value::Int64(n) => n.checked_neg().map(Value::Int64).ok_or(ScalarError::Overflow("-")),
            Value::Double(n) => Ok(Value::Double(-n)),
            other => Err(ScalarError::InvalidOperand {
                op: "-",
                operand: other.to_string(),
            }),
        },
    }
}

pub fn convert(value: &Value, to: ValueType) -> ScalarResult<Value> {
    TypeCoercion::convert(value, to).ok_or_else(|| ScalarError::Conversion {
        value: value.to_string(),
        to,
    })
}
