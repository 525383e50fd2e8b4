// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Translation settings

use serde::{Deserialize, Serialize};

/// Where nulls sort relative to every non-null value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NullOrdering {
    /// Null is the smallest value: first ascending, last descending
    #[default]
    Lowest,
    /// Null is the largest value: last ascending, first descending
    Highest,
}

/// Per-service translation options, shared by every request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TranslationOptions {
    /// Server-driven page size; 0 disables paging
    pub page_size: i64,

    /// Null ordering of the underlying store
    pub null_ordering: NullOrdering,

    /// Deepest allowed nesting of expanded navigations
    pub max_expand_depth: usize,
}

impl Default for TranslationOptions {
    fn default() -> Self {
        Self {
            page_size: 0,
            null_ordering: NullOrdering::Lowest,
            max_expand_depth: 8,
        }
    }
}

impl TranslationOptions {
    pub fn with_page_size(mut self, page_size: i64) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_null_ordering(mut self, null_ordering: NullOrdering) -> Self {
        self.null_ordering = null_ordering;
        self
    }

    pub fn with_max_expand_depth(mut self, depth: usize) -> Self {
        self.max_expand_depth = depth;
        self
    }

    pub fn is_paging(&self) -> bool {
        self.page_size > 0
    }

    /// Load options from JSON; absent fields keep their defaults
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
