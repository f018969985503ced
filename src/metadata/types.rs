// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Layer metadata value types.
//!
//! These mirror the JSON tippecanoe writes on the `metadata:` line of the
//! stream. Unknown keys are kept in [`ArchiveMetadata::extra`] so nothing the
//! generator says is lost on the way into the archive.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Inferred attribute type of a layer field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FieldType {
    Number,
    String,
    Boolean,
    /// Two sources disagreed on the type.
    Mixed,
    /// A tag this crate does not interpret, kept verbatim.
    Other(String),
}

impl FieldType {
    /// Combine two observations of the same field.
    pub fn widen(&self, other: &FieldType) -> FieldType {
        if self == other {
            self.clone()
        } else {
            FieldType::Mixed
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldType::Number => "Number",
            FieldType::String => "String",
            FieldType::Boolean => "Boolean",
            FieldType::Mixed => "Mixed",
            FieldType::Other(tag) => tag,
        }
    }
}

impl From<String> for FieldType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "number" => FieldType::Number,
            "string" => FieldType::String,
            "boolean" => FieldType::Boolean,
            "mixed" => FieldType::Mixed,
            _ => FieldType::Other(tag),
        }
    }
}

impl From<&str> for FieldType {
    fn from(tag: &str) -> Self {
        FieldType::from(tag.to_string())
    }
}

impl From<FieldType> for String {
    fn from(field_type: FieldType) -> Self {
        field_type.as_str().to_string()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One vector layer as described by the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VectorLayer {
    pub id: String,
    #[serde(default)]
    pub description: String,
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(default)]
    pub fields: BTreeMap<String, FieldType>,
}

impl VectorLayer {
    pub fn new(id: impl Into<String>, minzoom: u8, maxzoom: u8) -> Self {
        Self {
            id: id.into(),
            description: String::new(),
            minzoom,
            maxzoom,
            fields: BTreeMap::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, field_type: impl Into<FieldType>) -> Self {
        self.fields.insert(name.into(), field_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

/// Archive-level descriptor: the `metadata:` line of a stream, and the JSON
/// blob embedded in the finished archive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(default, alias = "minzoom", skip_serializing_if = "Option::is_none")]
    pub min_zoom: Option<u8>,
    #[serde(default, alias = "maxzoom", skip_serializing_if = "Option::is_none")]
    pub max_zoom: Option<u8>,
    #[serde(default)]
    pub vector_layers: Vec<VectorLayer>,
    /// Every other key (attribution, bounds, center, generator, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Key marking an archive assembled from a stream that never reached `END_STREAM`.
pub const PARTIAL_KEY: &str = "partial";

impl ArchiveMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_layer(mut self, layer: VectorLayer) -> Self {
        self.vector_layers.push(layer);
        self
    }

    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = Some(min_zoom);
        self.max_zoom = Some(max_zoom);
        self
    }

    pub fn layer(&self, id: &str) -> Option<&VectorLayer> {
        self.vector_layers.iter().find(|layer| layer.id == id)
    }

    /// Whether the archive was flagged as built from a truncated stream.
    pub fn is_partial(&self) -> bool {
        matches!(self.extra.get(PARTIAL_KEY), Some(Value::Bool(true)))
    }

    /// The JSON object embedded in an archive.
    ///
    /// Uses the TileJSON spellings (`minzoom`, `maxzoom`) readers expect,
    /// rather than the stream's `min_zoom` / `max_zoom`.
    pub fn to_archive_json(&self, partial: bool) -> Result<Value, serde_json::Error> {
        let mut object = Map::new();
        for (key, value) in &self.extra {
            object.insert(key.clone(), value.clone());
        }
        if let Some(name) = &self.name {
            object.insert("name".into(), Value::String(name.clone()));
        }
        if let Some(format) = &self.format {
            object.insert("format".into(), Value::String(format.clone()));
        }
        if let Some(min_zoom) = self.min_zoom {
            object.insert("minzoom".into(), Value::from(min_zoom));
        }
        if let Some(max_zoom) = self.max_zoom {
            object.insert("maxzoom".into(), Value::from(max_zoom));
        }
        object.insert(
            "vector_layers".into(),
            serde_json::to_value(&self.vector_layers)?,
        );
        if partial {
            object.insert(PARTIAL_KEY.into(), Value::Bool(true));
        }
        Ok(Value::Object(object))
    }
}
