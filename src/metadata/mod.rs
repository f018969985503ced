// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Vector layer metadata: the value types and the merge that aggregates them.

mod merge;
mod types;

pub use merge::{merge, merge_with_conflicts, MergeConflict, MetadataAggregator};
pub use types::{ArchiveMetadata, FieldType, VectorLayer, PARTIAL_KEY};
