// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! String function implementations
//!
//! Indices are zero-based and counted in characters, not bytes.

use super::{argument, type_error, BuiltinFunction, FunctionError, FunctionResult};
use crate::types::Value;
use regex::Regex;

fn string_arg(function: BuiltinFunction, arguments: &[Value], index: usize) -> FunctionResult<&str> {
    let value = argument(function, arguments, index)?;
    value.as_str().ok_or_else(|| type_error(function, value))
}

fn int_arg(function: BuiltinFunction, arguments: &[Value], index: usize) -> FunctionResult<i64> {
    let value = argument(function, arguments, index)?;
    value.as_i64().ok_or_else(|| type_error(function, value))
}

pub(super) fn evaluate(function: BuiltinFunction, arguments: &[Value]) -> FunctionResult<Value> {
    let subject = string_arg(function, arguments, 0)?;

    let result = match function {
        // ==============================================================================
        // PREDICATES
        // ==============================================================================
        BuiltinFunction::Contains => {
            Value::Boolean(subject.contains(string_arg(function, arguments, 1)?))
        }
        BuiltinFunction::StartsWith => {
            Value::Boolean(subject.starts_with(string_arg(function, arguments, 1)?))
        }
        BuiltinFunction::EndsWith => {
            Value::Boolean(subject.ends_with(string_arg(function, arguments, 1)?))
        }
        BuiltinFunction::MatchesPattern => {
            let pattern = string_arg(function, arguments, 1)?;
            let regex = Regex::new(pattern).map_err(|e| FunctionError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;
            Value::Boolean(regex.is_match(subject))
        }

        // ==============================================================================
        // MEASURES
        // ==============================================================================
        BuiltinFunction::Length => Value::Int32(subject.chars().count() as i32),
        BuiltinFunction::IndexOf => {
            let needle = string_arg(function, arguments, 1)?;
            let index = subject
                .find(needle)
                .map(|byte_index| subject[..byte_index].chars().count() as i32)
                .unwrap_or(-1);
            Value::Int32(index)
        }

        // ==============================================================================
        // TRANSFORMS
        // ==============================================================================
        BuiltinFunction::Substring => {
            let start = int_arg(function, arguments, 1)?.max(0) as usize;
            let chars = subject.chars().skip(start);
            let taken: String = if arguments.len() > 2 {
                let length = int_arg(function, arguments, 2)?.max(0) as usize;
                chars.take(length).collect()
            } else {
                chars.collect()
            };
            Value::String(taken)
        }
        BuiltinFunction::ToLower => Value::String(subject.to_lowercase()),
        BuiltinFunction::ToUpper => Value::String(subject.to_uppercase()),
        BuiltinFunction::Trim => Value::String(subject.trim().to_string()),
        BuiltinFunction::Concat => {
            let tail = string_arg(function, arguments, 1)?;
            Value::String(format!("{}{}", subject, tail))
        }

        _ => return Err(type_error(function, &arguments[0])),
    };

    Ok(result)
}
