//! Heightmap synthesis.
//!
//! Generators are a closed set dispatched on the `type` field of the
//! `heightmap_generation` parameter block. `simple` and `island` are the
//! coherent-noise generators; `ramp` and `peaks` are deterministic fixtures
//! used to exercise the downstream stages.

pub mod island;
pub mod peaks;
pub mod ramp;
pub mod simple;

use serde::de::DeserializeOwned;

use crate::error::{GenerationError, Result};
use crate::rawmap::Heightmap;

/// Run the generator selected by `config["type"]`.
pub fn generate(
    config: &serde_json::Value,
    width: usize,
    height: usize,
    seed: u64,
) -> Result<Heightmap> {
    let type_name = config
        .get("type")
        .and_then(|v| v.as_str())
        .ok_or_else(|| GenerationError::UnknownGenerator(String::from("<missing type>")))?;
    match type_name {
        "simple" => Ok(simple::generate(&parse(config)?, width, height, seed)),
        "island" => Ok(island::generate(&parse(config)?, width, height, seed)),
        "ramp" => Ok(ramp::generate(width, height)),
        "peaks" => Ok(peaks::generate(width, height)),
        other => Err(GenerationError::UnknownGenerator(other.to_string())),
    }
}

fn parse<P: DeserializeOwned>(config: &serde_json::Value) -> Result<P> {
    serde_json::from_value(config.clone()).map_err(GenerationError::GeneratorParams)
}

/// Rescale to `[0, 1]`; a constant field becomes all zeros.
pub(crate) fn normalize(map: &mut Heightmap) {
    let (min, max) = map.min_max();
    if min == max {
        map.fill(0.0);
        return;
    }
    let delta = max - min;
    for v in map.as_mut_slice() {
        *v = (*v - min) / delta;
    }
}
