// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Built-in scalar functions
//!
//! Function calls in clause trees are mapped onto this closed set. Each
//! function declares its accepted argument types; the node translator checks
//! and promotes arguments against them, and the reference executor evaluates
//! them with null propagation.

mod numeric_functions;
mod string_functions;
mod temporal_functions;

use crate::types::{Value, ValueType};
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;

/// Error type for function evaluation
#[derive(Debug, thiserror::Error)]
pub enum FunctionError {
    #[error("Invalid argument count for {function}: got {actual}")]
    InvalidArgumentCount { function: &'static str, actual: usize },

    #[error("Invalid argument type for {function}: {message}")]
    InvalidArgumentType {
        function: &'static str,
        message: String,
    },

    #[error("Invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

pub type FunctionResult<T> = Result<T, FunctionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuiltinFunction {
    // String
    Contains,
    StartsWith,
    EndsWith,
    Length,
    IndexOf,
    Substring,
    ToLower,
    ToUpper,
    Trim,
    Concat,
    MatchesPattern,

    // Date/time parts
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,

    // Numeric
    Round,
    Floor,
    Ceiling,
}

static REGISTRY: Lazy<HashMap<&'static str, BuiltinFunction>> = Lazy::new(|| {
    BuiltinFunction::ALL
        .iter()
        .map(|function| (function.name(), *function))
        .collect()
});

use ValueType::{DateTime, Double, Int32, String as Str};

impl BuiltinFunction {
    pub const ALL: [BuiltinFunction; 20] = [
        BuiltinFunction::Contains,
        BuiltinFunction::StartsWith,
        BuiltinFunction::EndsWith,
        BuiltinFunction::Length,
        BuiltinFunction::IndexOf,
        BuiltinFunction::Substring,
        BuiltinFunction::ToLower,
        BuiltinFunction::ToUpper,
        BuiltinFunction::Trim,
        BuiltinFunction::Concat,
        BuiltinFunction::MatchesPattern,
        BuiltinFunction::Year,
        BuiltinFunction::Month,
        BuiltinFunction::Day,
        BuiltinFunction::Hour,
        BuiltinFunction::Minute,
        BuiltinFunction::Second,
        BuiltinFunction::Round,
        BuiltinFunction::Floor,
        BuiltinFunction::Ceiling,
    ];

    /// Look up a function by its query-language name
    pub fn lookup(name: &str) -> Option<BuiltinFunction> {
        REGISTRY.get(name).copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            BuiltinFunction::Contains => "contains",
            BuiltinFunction::StartsWith => "startswith",
            BuiltinFunction::EndsWith => "endswith",
            BuiltinFunction::Length => "length",
            BuiltinFunction::IndexOf => "indexof",
            BuiltinFunction::Substring => "substring",
            BuiltinFunction::ToLower => "tolower",
            BuiltinFunction::ToUpper => "toupper",
            BuiltinFunction::Trim => "trim",
            BuiltinFunction::Concat => "concat",
            BuiltinFunction::MatchesPattern => "matchesPattern",
            BuiltinFunction::Year => "year",
            BuiltinFunction::Month => "month",
            BuiltinFunction::Day => "day",
            BuiltinFunction::Hour => "hour",
            BuiltinFunction::Minute => "minute",
            BuiltinFunction::Second => "second",
            BuiltinFunction::Round => "round",
            BuiltinFunction::Floor => "floor",
            BuiltinFunction::Ceiling => "ceiling",
        }
    }

    /// Accepted parameter lists, one entry per overload
    pub fn overloads(self) -> &'static [&'static [ValueType]] {
        match self {
            BuiltinFunction::Contains
            | BuiltinFunction::StartsWith
            | BuiltinFunction::EndsWith
            | BuiltinFunction::IndexOf
            | BuiltinFunction::Concat
            | BuiltinFunction::MatchesPattern => &[&[Str, Str]],
            BuiltinFunction::Length
            | BuiltinFunction::ToLower
            | BuiltinFunction::ToUpper
            | BuiltinFunction::Trim => &[&[Str]],
            BuiltinFunction::Substring => &[&[Str, Int32], &[Str, Int32, Int32]],
            BuiltinFunction::Year
            | BuiltinFunction::Month
            | BuiltinFunction::Day
            | BuiltinFunction::Hour
            | BuiltinFunction::Minute
            | BuiltinFunction::Second => &[&[DateTime]],
            BuiltinFunction::Round | BuiltinFunction::Floor | BuiltinFunction::Ceiling => {
                &[&[Double]]
            }
        }
    }

    pub fn return_type(self) -> ValueType {
        match self {
            BuiltinFunction::Contains
            | BuiltinFunction::StartsWith
            | BuiltinFunction::EndsWith
            | BuiltinFunction::MatchesPattern => ValueType::Boolean,
            BuiltinFunction::Length
            | BuiltinFunction::IndexOf
            | BuiltinFunction::Year
            | BuiltinFunction::Month
            | BuiltinFunction::Day
            | BuiltinFunction::Hour
            | BuiltinFunction::Minute
            | BuiltinFunction::Second => ValueType::Int32,
            BuiltinFunction::Substring
            | BuiltinFunction::ToLower
            | BuiltinFunction::ToUpper
            | BuiltinFunction::Trim
            | BuiltinFunction::Concat => ValueType::String,
            BuiltinFunction::Round | BuiltinFunction::Floor | BuiltinFunction::Ceiling => {
                ValueType::Double
            }
        }
    }

    /// Evaluate with null propagation: any null argument yields null
    pub fn evaluate(self, arguments: &[Value]) -> FunctionResult<Value> {
        if arguments.iter().any(Value::is_null) {
            return Ok(Value::Null);
        }

        match self {
            BuiltinFunction::Contains
            | BuiltinFunction::StartsWith
            | BuiltinFunction::EndsWith
            | BuiltinFunction::Length
            | BuiltinFunction::IndexOf
            | BuiltinFunction::Substring
            | BuiltinFunction::ToLower
            | BuiltinFunction::ToUpper
            | BuiltinFunction::Trim
            | BuiltinFunction::Concat
            | BuiltinFunction::MatchesPattern => string_functions::evaluate(self, arguments),
            BuiltinFunction::Year
            | BuiltinFunction::Month
            | BuiltinFunction::Day
            | BuiltinFunction::Hour
            | BuiltinFunction::Minute
            | BuiltinFunction::Second => temporal_functions::evaluate(self, arguments),
            BuiltinFunction::Round | BuiltinFunction::Floor | BuiltinFunction::Ceiling => {
                numeric_functions::evaluate(self, arguments)
            }
        }
    }
}

pub(crate) fn argument<'a>(
    function: BuiltinFunction,
    arguments: &'a [Value],
    index: usize,
) -> FunctionResult<&'a Value> {
    arguments
        .get(index)
        .ok_or(FunctionError::InvalidArgumentCount {
            function: function.name(),
            actual: arguments.len(),
        })
}

pub(crate) fn type_error(function: BuiltinFunction, value: &Value) -> FunctionError {
    FunctionError::InvalidArgumentType {
        function: function.name(),
        message: format!("unexpected {}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_by_name() {
        assert_eq!(
            BuiltinFunction::lookup("contains"),
            Some(BuiltinFunction::Contains)
        );
        assert_eq!(
            BuiltinFunction::lookup("matchesPattern"),
            Some(BuiltinFunction::MatchesPattern)
        );
        assert_eq!(BuiltinFunction::lookup("geo.distance"), None);
    }

    #[test]
    fn test_every_function_has_an_overload() {
        for function in BuiltinFunction::ALL {
            assert!(!function.overloads().is_empty(), "{}", function.name());
        }
    }

    #[test]
    fn test_null_propagates() {
        let result = BuiltinFunction::ToUpper.evaluate(&[Value::Null]).unwrap();
        assert!(result.is_null());
    }
}
