//! Island variant of the noise generator: the octave field is masked by a
//! radial falloff whose rim radius wobbles with an angular noise term, so
//! the coastline is irregular but the island stays centered.

use noise::{NoiseFn, OpenSimplex};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Deserialize;

use super::simple::{octave_offsets, octave_value, SimpleParams};
use crate::rawmap::Heightmap;
use crate::raster::Raster;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct IslandParams {
    pub octaves: usize,
    pub persistence: f64,
    pub lacunarity: f64,
    pub initial_scale: f64,
    /// Island radius, as a coefficient of half the smaller map dimension.
    pub radius_coef: f64,
    /// Radius of the untapered center plateau, same unit as `radius_coef`.
    pub center_radius_coef: f64,
    pub variation_initial_scale: f64,
    /// Peak amplitude of the rim wobble, same unit as `radius_coef`.
    pub variation_amplitude_coef: f64,
    /// Exponent of the radial ease curve; higher keeps the interior flatter.
    pub ease_power: f64,
}

pub fn generate(params: &IslandParams, width: usize, height: usize, seed: u64) -> Heightmap {
    if width == 0 || height == 0 {
        return Raster::new(width, height);
    }
    let mut prng = ChaCha8Rng::seed_from_u64(seed);
    let noise = OpenSimplex::new(seed as u32);
    let offsets = octave_offsets(&mut prng, params.octaves);
    let noise_params = SimpleParams {
        octaves: params.octaves,
        persistence: params.persistence,
        lacunarity: params.lacunarity,
        initial_scale: params.initial_scale,
    };

    let scale_clamp = width.min(height) as f64;
    let radius = params.radius_coef * scale_clamp / 2.0;
    let radius_center = params.center_radius_coef * scale_clamp / 2.0;
    let variation_amplitude = params.variation_amplitude_coef * scale_clamp / 2.0;
    let center_x = width / 2;
    let center_y = height / 2;
    let radius_eased = radius.powf(params.ease_power);

    let mut values = vec![0.0f64; width * height];
    values
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                if x == center_x && y == center_y {
                    continue;
                }
                let dx = x as f64 - center_x as f64;
                let dy = y as f64 - center_y as f64;
                let distance = (dx * dx + dy * dy).sqrt();
                if distance > radius {
                    continue;
                }
                // Angular rim wobble; the ratios are clamped because f64
                // rounding can push them a hair past +-1.
                let angle = (dy / distance).clamp(-1.0, 1.0).asin()
                    * (dx / distance).clamp(-1.0, 1.0).acos();
                let angle_noise = (noise.get([angle, 0.0]) + 1.0) / 2.0;
                let variation = variation_amplitude * angle_noise;
                if distance > radius - variation {
                    continue;
                }
                // Emerged land: eased and tapered octave noise.
                let coef_ease = 1.0 - distance.powf(params.ease_power) / radius_eased;
                let coef_variation = if distance <= radius_center {
                    1.0
                } else {
                    1.0 - (distance - radius_center) / (radius - variation - radius_center)
                };
                *cell = octave_value(&noise, &offsets, &noise_params, x, y, scale_clamp)
                    * coef_ease
                    * coef_variation;
            }
        });

    let mut map = Raster::from_vec(width, height, values);
    fill_center(&mut map, center_x, center_y);
    super::normalize(&mut map);
    map
}

/// The center cell has no defined angle; it takes the mean of its existing
/// N4 neighbors instead.
fn fill_center(map: &mut Heightmap, center_x: usize, center_y: usize) {
    let mut sum = 0.0;
    let mut count = 0;
    for (dx, dy) in [(0i64, 1i64), (1, 0), (0, -1), (-1, 0)] {
        let nx = center_x as i64 + dx;
        let ny = center_y as i64 + dy;
        if map.contains(nx, ny) {
            sum += *map.get(nx as usize, ny as usize);
            count += 1;
        }
    }
    if count > 0 {
        map.set(center_x, center_y, sum / count as f64);
    }
}
