//! The declarative parameter document driving a generation run.
//!
//! Loaded from a JSON file; a missing file or a missing/ill-typed field is
//! fatal. The heightmap generator block stays untyped here and is resolved
//! by the generator dispatch, so an unknown `type` can be reported as a
//! missing-module error rather than a parse error.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::erosion::ErosionParams;
use crate::error::{GenerationError, Result};
use crate::waters::WaterParams;

#[derive(Debug, Clone, Deserialize)]
pub struct Parameters {
    pub seed: u64,
    #[serde(default)]
    pub randomize_seed: bool,
    pub map: MapParams,
    pub heightmap_generation: serde_json::Value,
    pub erosion: ErosionParams,
    pub cliff_mapping: CliffParams,
    pub water_mapping: WaterParams,
    /// Output directory template with `{directory}` and `{folder}` holes.
    pub outputs: String,
    #[serde(rename = "_debug", default)]
    pub debug: Option<DebugParams>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MapParams {
    pub width: usize,
    pub height: usize,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct CliffParams {
    pub step_count: usize,
}

/// Step-checkpoint controls; absent in release runs.
#[derive(Debug, Clone, Deserialize)]
pub struct DebugParams {
    pub enabled: bool,
    /// Resume point: steps with id <= this are restored, later ones run.
    pub step: u32,
    /// Generation folder name, so resumed runs share one output directory.
    pub name: String,
}

impl Parameters {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|source| GenerationError::ParametersIo {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| GenerationError::ParametersFormat {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Substitute the template holes of `outputs`.
    pub fn resolve_outputs(&self, directory: &Path, folder: &str) -> PathBuf {
        PathBuf::from(
            self.outputs
                .replace("{directory}", &directory.to_string_lossy())
                .replace("{folder}", folder),
        )
    }
}
