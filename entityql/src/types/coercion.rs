// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Implicit promotion and explicit conversion rules

use crate::types::{Value, ValueType};
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Type coercion engine
#[derive(Debug)]
pub struct TypeCoercion;

impl TypeCoercion {
    /// Find the common type two operands are promoted to before comparison
    /// or arithmetic. Numeric types widen (Int32 < Int64 < Double); any other
    /// pair must match exactly.
    pub fn find_common_type(left: ValueType, right: ValueType) -> Option<ValueType> {
        if left == right {
            return Some(left);
        }

        match (left.numeric_rank(), right.numeric_rank()) {
            (Some(l), Some(r)) => Some(if l >= r { left } else { right }),
            _ => None,
        }
    }

    /// Whether an explicit cast from one type to another is allowed
    pub fn can_convert(from: ValueType, to: ValueType) -> bool {
        if from == to {
            return true;
        }

        match (from, to) {
            (f, t) if f.is_numeric() && t.is_numeric() => true,
            (_, ValueType::String) => true,
            (ValueType::String, ValueType::Guid | ValueType::DateTime) => true,
            _ => false,
        }
    }

    /// Convert a value to the given type; `None` when the conversion is not
    /// allowed or the value does not parse. Null converts to null.
    pub fn convert(value: &Value, to: ValueType) -> Option<Value> {
        if value.is_null() {
            return Some(Value::Null);
        }
        if value.value_type() == Some(to) {
            return Some(value.clone());
        }

        match to {
            ValueType::Int32 => match value {
                Value::Int64(n) => i32::try_from(*n).ok().map(Value::Int32),
                Value::Double(n) => {
                    truncate_in_range(*n, i32::MIN as f64).map(|t| Value::Int32(t as i32))
                }
                _ => None,
            },
            ValueType::Int64 => match value {
                Value::Int32(n) => Some(Value::Int64(i64::from(*n))),
                Value::Double(n) => {
                    truncate_in_range(*n, i64::MIN as f64).map(|t| Value::Int64(t as i64))
                }
                _ => None,
            },
            ValueType::Double => value.as_f64().map(Value::Double),
            ValueType::String => {
                let text = match value {
                    Value::Boolean(b) => b.to_string(),
                    Value::Int32(n) => n.to_string(),
                    Value::Int64(n) => n.to_string(),
                    Value::Double(n) => n.to_string(),
                    Value::DateTime(dt) => dt.to_rfc3339(),
                    Value::Guid(g) => g.to_string(),
                    _ => return None,
                };
                Some(Value::String(text))
            }
            ValueType::Guid => value
                .as_str()
                .and_then(|s| Uuid::parse_str(s).ok())
                .map(Value::Guid),
            ValueType::DateTime => value
                .as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc))),
            ValueType::Boolean => None,
        }
    }
}

/// Truncated `n` when it fits a two's complement integer whose smallest
/// value is `min`; NaN and infinities never fit
fn truncate_in_range(n: f64, min: f64) -> Option<f64> {
    let truncated = n.trunc();
    (truncated >= min && truncated < -min).then_some(truncated)
}
