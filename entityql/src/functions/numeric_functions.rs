// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Rounding functions over doubles

use super::{argument, type_error, BuiltinFunction, FunctionResult};
use crate::types::Value;

pub(super) fn evaluate(function: BuiltinFunction, arguments: &[Value]) -> FunctionResult<Value> {
    let value = argument(function, arguments, 0)?;
    let number = value.as_f64().ok_or_else(|| type_error(function, value))?;

    let result = match function {
        // Midpoints round away from zero
        BuiltinFunction::Round => number.round(),
        BuiltinFunction::Floor => number.floor(),
        BuiltinFunction::Ceiling => number.ceil(),
        _ => return Err(type_error(function, value)),
    };

    Ok(Value::Double(result))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounding() {
        assert_eq!(
            BuiltinFunction::Round.evaluate(&[Value::Double(2.5)]).unwrap(),
            Value::Double(3.0)
        );
        assert_eq!(
            BuiltinFunction::Floor.evaluate(&[Value::Double(-1.2)]).unwrap(),
            Value::Double(-2.0)
        );
        assert_eq!(
            BuiltinFunction::Ceiling.evaluate(&[Value::Int32(4)]).unwrap(),
            Value::Double(4.0)
        );
    }
}
