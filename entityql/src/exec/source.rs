// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Data sources the reference executor reads entity sets from

use super::error::{ExecutionError, ExecutionResult};
use crate::types::{Record, Value};
use std::collections::HashMap;

/// Rows of named entity sets
///
/// Each row is a [`Value::Record`]. Navigation properties hold a nested
/// record (single-valued, or null) or a list of records (collection-valued).
pub trait DataSource: Send + Sync {
    fn rows(&self, entity_set: &str) -> ExecutionResult<&[Value]>;
}

/// Entity sets held in memory
#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    entity_sets: HashMap<String, Vec<Value>>,
}

impl InMemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style `insert_records`
    pub fn with_records(mut self, entity_set: &str, records: Vec<Record>) -> Self {
        self.insert_records(entity_set, records);
        self
    }

    /// Replace the rows of an entity set
    pub fn insert_records(&mut self, entity_set: &str, records: Vec<Record>) {
        log::debug!("Loaded {} rows into {}", records.len(), entity_set);
        self.entity_sets.insert(
            entity_set.to_string(),
            records.into_iter().map(Value::Record).collect(),
        );
    }

    pub fn len(&self, entity_set: &str) -> usize {
        self.entity_sets.get(entity_set).map_or(0, Vec::len)
    }
}

impl DataSource for InMemorySource {
    fn rows(&self, entity_set: &str) -> ExecutionResult<&[Value]> {
        self.entity_sets
            .get(entity_set)
            .map(Vec::as_slice)
            .ok_or_else(|| ExecutionError::UnknownEntitySet(entity_set.to_string()))
    }
}
