// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Scalar type system
//!
//! Declared property types, the runtime value representation and the
//! implicit promotion rules used when operand types differ.

pub mod coercion;
pub mod value;

use serde::{Deserialize, Serialize};
use std::fmt;

pub use self::coercion::TypeCoercion;
pub use self::value::{Record, Value};

/// Declared type of a structural property or scalar expression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueType {
    Boolean,
    Int32,
    Int64,
    Double,
    String,
    DateTime,
    Guid,
}

impl ValueType {
    pub fn is_numeric(self) -> bool {
        self.numeric_rank().is_some()
    }

    /// Position in the numeric promotion order, narrowest first
    pub fn numeric_rank(self) -> Option<u8> {
        match self {
            ValueType::Int32 => Some(0),
            ValueType::Int64 => Some(1),
            ValueType::Double => Some(2),
            _ => None,
        }
    }

    pub fn is_integral(self) -> bool {
        matches!(self, ValueType::Int32 | ValueType::Int64)
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueType::Boolean => "Boolean",
            ValueType::Int32 => "Int32",
            ValueType::Int64 => "Int64",
            ValueType::Double => "Double",
            ValueType::String => "String",
            ValueType::DateTime => "DateTime",
            ValueType::Guid => "Guid",
        };
        f.write_str(name)
    }
}
