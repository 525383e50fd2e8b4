// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Structural fingerprints of translated expressions
//!
//! Placeholders hash by identity (kind and clause path), never by the value
//! bound to them, so requests differing only in bound literals fingerprint
//! alike. Inline literals hash by value.

use crate::expr::QueryExpr;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

pub fn fingerprint(expression: &QueryExpr) -> u64 {
    let mut hasher = DefaultHasher::new();
    expression.hash(&mut hasher);
    hasher.finish()
}
