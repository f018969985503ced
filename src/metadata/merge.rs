// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Merging metadata fragments.
//!
//! A large build arrives as several streams (or one stream per chunk), each with
//! its own `metadata:` line. They all describe the same archive, so layers that
//! share an id have to collapse into one descriptor: zoom ranges union, field
//! maps union, disagreeing field types widen to `Mixed`.
//!
//! Merging never fails. The worst case is a field typed `Mixed`, which is
//! reported as a [`MergeConflict`] and logged, never returned as an error.
//!
//! Content (field sets, zoom bounds) is commutative, associative and
//! idempotent. Layer *order* is first-seen, so it depends on call order.

use super::types::{ArchiveMetadata, FieldType, VectorLayer};

/// Two fragments declared the same field of the same layer with different types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeConflict {
    pub layer: String,
    pub field: String,
    pub existing: FieldType,
    pub incoming: FieldType,
}

/// Merge two fragments into one descriptor.
pub fn merge(existing: ArchiveMetadata, incoming: ArchiveMetadata) -> ArchiveMetadata {
    merge_with_conflicts(existing, incoming, &mut Vec::new())
}

fn min_opt(a: Option<u8>, b: Option<u8>) -> Option<u8> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, b) => a.or(b),
    }
}

fn max_opt(a: Option<u8>, b: Option<u8>) -> Option<u8> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.max(b)),
        (a, b) => a.or(b),
    }
}

/// Fold `incoming` into `existing` (same id), recording type conflicts.
fn merge_layer(existing: &mut VectorLayer, incoming: VectorLayer, conflicts: &mut Vec<MergeConflict>) {
    existing.minzoom = existing.minzoom.min(incoming.minzoom);
    existing.maxzoom = existing.maxzoom.max(incoming.maxzoom);
    if existing.description.is_empty() {
        existing.description = incoming.description;
    }

    for (name, incoming_type) in incoming.fields {
        match existing.fields.get_mut(&name) {
            Some(current) => {
                if *current != incoming_type {
                    let widened = current.widen(&incoming_type);
                    // Already Mixed: nothing new to report.
                    if *current != FieldType::Mixed {
                        conflicts.push(MergeConflict {
                            layer: existing.id.clone(),
                            field: name.clone(),
                            existing: current.clone(),
                            incoming: incoming_type,
                        });
                    }
                    *current = widened;
                }
            }
            None => {
                existing.fields.insert(name, incoming_type);
            }
        }
    }
}

/// [`merge`], collecting every field type conflict it resolves.
pub fn merge_with_conflicts(
    mut existing: ArchiveMetadata,
    incoming: ArchiveMetadata,
    conflicts: &mut Vec<MergeConflict>,
) -> ArchiveMetadata {
    existing.min_zoom = min_opt(existing.min_zoom, incoming.min_zoom);
    existing.max_zoom = max_opt(existing.max_zoom, incoming.max_zoom);
    if existing.name.is_none() {
        existing.name = incoming.name;
    }
    if existing.format.is_none() {
        existing.format = incoming.format;
    }
    for (key, value) in incoming.extra {
        existing.extra.entry(key).or_insert(value);
    }

    // A fragment may itself repeat a layer id; fold those too.
    let mut layers: Vec<VectorLayer> = Vec::with_capacity(existing.vector_layers.len());
    for layer in existing.vector_layers.drain(..).chain(incoming.vector_layers) {
        match layers.iter_mut().find(|l| l.id == layer.id) {
            Some(current) => merge_layer(current, layer, conflicts),
            None => layers.push(layer),
        }
    }

    for layer in &layers {
        existing.min_zoom = min_opt(existing.min_zoom, Some(layer.minzoom));
        existing.max_zoom = max_opt(existing.max_zoom, Some(layer.maxzoom));
    }
    existing.vector_layers = layers;
    existing
}

/// Accumulates metadata fragments across streams and chunks.
///
/// ```
/// use pmstream::{ArchiveMetadata, MetadataAggregator, VectorLayer};
///
/// let mut agg = MetadataAggregator::new();
/// agg.add(ArchiveMetadata::new().with_layer(VectorLayer::new("water", 0, 8)));
/// agg.add(ArchiveMetadata::new().with_layer(VectorLayer::new("water", 4, 12)));
/// let merged = agg.finish();
/// assert_eq!(merged.vector_layers.len(), 1);
/// assert_eq!(merged.max_zoom, Some(12));
/// ```
#[derive(Debug, Default)]
pub struct MetadataAggregator {
    merged: Option<ArchiveMetadata>,
    conflicts: Vec<MergeConflict>,
    fragments: usize,
}

impl MetadataAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, incoming: ArchiveMetadata) {
        let before = self.conflicts.len();
        let merged = match self.merged.take() {
            Some(existing) => merge_with_conflicts(existing, incoming, &mut self.conflicts),
            // Run the first fragment through merge too, so repeated ids inside it collapse.
            None => merge_with_conflicts(ArchiveMetadata::default(), incoming, &mut self.conflicts),
        };
        for conflict in &self.conflicts[before..] {
            tracing::warn!(
                layer = %conflict.layer,
                field = %conflict.field,
                existing = %conflict.existing,
                incoming = %conflict.incoming,
                "field type conflict, widened to Mixed"
            );
        }
        self.fragments += 1;
        self.merged = Some(merged);
    }

    /// Number of fragments merged so far.
    pub fn fragments(&self) -> usize {
        self.fragments
    }

    pub fn conflicts(&self) -> &[MergeConflict] {
        &self.conflicts
    }

    pub fn current(&self) -> Option<&ArchiveMetadata> {
        self.merged.as_ref()
    }

    /// The merged descriptor (empty if nothing was added).
    pub fn finish(self) -> ArchiveMetadata {
        self.merged.unwrap_or_default()
    }
}
