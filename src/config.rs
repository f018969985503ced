// Copyright 2025-present Harīṣh Tummalachērla
// SPDX-License-Identifier: Apache-2.0

//! Assembler configuration, loaded from JSON.
//!
//! Every field has a default, so `{}` is a complete config. CLI flags are
//! applied on top of whatever the file provides.
//!
//! ```json
//! {
//!   "name": "buildings",
//!   "internal_compression": "gzip",
//!   "tile_compression": "gzip",
//!   "tile_type": "mvt",
//!   "leaf_threshold": 4096,
//!   "root_budget": 16257,
//!   "dedup": true
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::archive::WriteOptions;
use crate::compression::{Compression, TileType};
use crate::directory::{LEAF_THRESHOLD, ROOT_BUDGET};
use crate::error::AssembleError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AssemblerConfig {
    /// Replaces the `name` from the stream metadata.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub internal_compression: Compression,
    /// Sniffed from the payloads when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_compression: Option<Compression>,
    /// Derived from the metadata `format` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tile_type: Option<TileType>,
    pub leaf_threshold: usize,
    pub root_budget: usize,
    /// Share storage between identical payloads anywhere in the stream.
    pub dedup: bool,
}

impl Default for AssemblerConfig {
    fn default() -> Self {
        Self {
            name: None,
            internal_compression: Compression::Gzip,
            tile_compression: None,
            tile_type: None,
            leaf_threshold: LEAF_THRESHOLD,
            root_budget: ROOT_BUDGET,
            dedup: true,
        }
    }
}

impl AssemblerConfig {
    pub fn from_json(json: &str) -> Result<Self, AssembleError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| AssembleError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, AssembleError> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| AssembleError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), AssembleError> {
        if !self.internal_compression.is_supported() {
            return Err(AssembleError::Config(format!(
                "internal compression {:?} cannot be written",
                self.internal_compression
            )));
        }
        if self.leaf_threshold == 0 {
            return Err(AssembleError::Config("leaf_threshold must be positive".into()));
        }
        if self.root_budget == 0 {
            return Err(AssembleError::Config("root_budget must be positive".into()));
        }
        Ok(())
    }

    /// Writer options for an archive that is or is not partial.
    pub fn write_options(&self, partial: bool) -> WriteOptions {
        WriteOptions {
            internal_compression: self.internal_compression,
            tile_compression: self.tile_compression,
            tile_type: self.tile_type,
            leaf_threshold: self.leaf_threshold,
            root_budget: self.root_budget,
            partial,
        }
    }
}
