// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Date/time part extraction

use super::{argument, type_error, BuiltinFunction, FunctionResult};
use crate::types::Value;
use chrono::{Datelike, Timelike};

pub(super) fn evaluate(function: BuiltinFunction, arguments: &[Value]) -> FunctionResult<Value> {
    let value = argument(function, arguments, 0)?;
    let Value::DateTime(timestamp) = value else {
        return Err(type_error(function, value));
    };

    let part = match function {
        BuiltinFunction::Year => timestamp.year(),
        BuiltinFunction::Month => timestamp.month() as i32,
        BuiltinFunction::Day => timestamp.day() as i32,
        BuiltinFunction::Hour => timestamp.hour() as i32,
        BuiltinFunction::Minute => timestamp.minute() as i32,
        BuiltinFunction::Second => timestamp.second() as i32,
        _ => return Err(type_error(function, value)),
    };

    Ok(Value::Int32(part))
}
