// Copyright (c) 2024-2025 DeepGraph Inc.
// SPDX-License-Identifier: Apache-2.0
//
//! Entity metadata and row shapes

pub mod error;
pub mod provider;
pub mod shape;

pub use error::{ModelError, ModelResult};
pub use provider::{EntitySet, EntityTypeBuilder, MetadataProvider, Model, ModelBuilder};
pub use shape::{Member, MemberType, Multiplicity, Shape, ShapeKind};
