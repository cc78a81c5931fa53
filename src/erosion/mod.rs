//! Droplet-based hydraulic erosion.
//!
//! Simulated water droplets follow the terrain gradient, picking up
//! sediment on descents and depositing it when they slow down or climb.
//! Erosion is spread over a circular brush; deposition goes to the four
//! corners of the droplet's cell so it can fill single-cell pits.

pub mod brush;
pub mod hydraulic;
pub mod utils;

use serde::Deserialize;

use crate::rawmap::Heightmap;

/// Erosion stage parameters, straight from the parameter document.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ErosionParams {
    /// Number of droplets to simulate. Zero disables the stage.
    pub droplets: usize,
    pub brush_radius: usize,
    /// 0 = droplets turn downhill instantly, 1 = they never turn.
    pub inertia: f64,
    pub sediment_capacity_factor: f64,
    /// Keeps capacity away from zero on flat terrain.
    pub sediment_min_capacity: f64,
    pub erode_speed: f64,
    pub deposit_speed: f64,
    pub evaporate_speed: f64,
    pub gravity: f64,
    /// Maximum steps a droplet lives.
    pub droplet_lifetime: usize,
    pub initial_water_volume: f64,
    pub initial_speed: f64,
    /// Droplets die on reaching this height, when set.
    #[serde(default)]
    pub sea_level: Option<f64>,
}

/// Erode the heightmap in place. No-op without droplets or without any
/// interior cell to spawn them on.
pub fn erode(heightmap: &mut Heightmap, params: &ErosionParams, seed: u64) {
    if params.droplets == 0 || heightmap.width < 3 || heightmap.height < 3 {
        return;
    }
    hydraulic::simulate(heightmap, params, seed);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::Raster;

    pub(crate) fn test_params() -> ErosionParams {
        ErosionParams {
            droplets: 30_000,
            brush_radius: 3,
            inertia: 0.05,
            sediment_capacity_factor: 4.0,
            sediment_min_capacity: 0.1,
            erode_speed: 0.3,
            deposit_speed: 0.3,
            evaporate_speed: 0.01,
            gravity: 4.0,
            droplet_lifetime: 30,
            initial_water_volume: 1.0,
            initial_speed: 1.0,
            sea_level: None,
        }
    }

    #[test]
    fn test_zero_droplets_is_identity() {
        let mut map = Raster::new_with(16, 16, 0.5);
        map.set(4, 4, 0.9);
        let before = map.clone();
        let params = ErosionParams {
            droplets: 0,
            ..test_params()
        };
        erode(&mut map, &params, 7);
        assert_eq!(map, before);
    }

    #[test]
    fn test_tiny_map_is_untouched() {
        let mut map = Raster::new_with(2, 2, 0.5);
        let before = map.clone();
        erode(&mut map, &test_params(), 7);
        assert_eq!(map, before);
    }
}
