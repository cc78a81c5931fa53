//! Octave-summed coherent noise over the whole map.

use noise::{NoiseFn, OpenSimplex};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::Deserialize;

use crate::rawmap::Heightmap;
use crate::raster::Raster;

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SimpleParams {
    pub octaves: usize,
    pub persistence: f64,
    pub lacunarity: f64,
    pub initial_scale: f64,
}

/// Per-octave sample-space offsets, drawn once from the seeded PRNG so the
/// octaves decorrelate while staying reproducible.
pub(crate) fn octave_offsets(prng: &mut ChaCha8Rng, octaves: usize) -> Vec<(f64, f64)> {
    (0..octaves)
        .map(|_| {
            (
                prng.gen_range(-1000..=1000) as f64,
                prng.gen_range(-1000..=1000) as f64,
            )
        })
        .collect()
}

/// Sum the octaves at one cell. Noise output is shifted to `[0, 2]` before
/// weighting so the sum stays positive.
pub(crate) fn octave_value(
    noise: &OpenSimplex,
    offsets: &[(f64, f64)],
    params: &SimpleParams,
    x: usize,
    y: usize,
    scale_clamp: f64,
) -> f64 {
    let mut value = 0.0;
    let mut scale = params.initial_scale;
    let mut weight = 1.0;
    for &(ox, oy) in offsets {
        value += (noise.get([ox + scale * x as f64 / scale_clamp,
                             oy + scale * y as f64 / scale_clamp]) + 1.0)
            * weight;
        weight *= params.persistence;
        scale *= params.lacunarity;
    }
    value
}

pub fn generate(params: &SimpleParams, width: usize, height: usize, seed: u64) -> Heightmap {
    if width == 0 || height == 0 {
        return Raster::new(width, height);
    }
    let mut prng = ChaCha8Rng::seed_from_u64(seed);
    let noise = OpenSimplex::new(seed as u32);
    let offsets = octave_offsets(&mut prng, params.octaves);
    let scale_clamp = width.min(height) as f64;

    let mut values = vec![0.0f64; width * height];
    values
        .par_chunks_mut(width)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, cell) in row.iter_mut().enumerate() {
                *cell = octave_value(&noise, &offsets, params, x, y, scale_clamp);
            }
        });

    let mut map = Raster::from_vec(width, height, values);
    super::normalize(&mut map);
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_params() -> SimpleParams {
        SimpleParams {
            octaves: 4,
            persistence: 0.5,
            lacunarity: 2.0,
            initial_scale: 2.0,
        }
    }

    #[test]
    fn test_output_in_unit_range() {
        let map = generate(&test_params(), 32, 32, 7);
        for (_, _, &v) in map.iter() {
            assert!((0.0..=1.0).contains(&v), "height {v} out of range");
        }
    }

    #[test]
    fn test_same_seed_same_field() {
        let a = generate(&test_params(), 24, 16, 123);
        let b = generate(&test_params(), 24, 16, 123);
        assert_eq!(a, b);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a = generate(&test_params(), 24, 24, 1);
        let b = generate(&test_params(), 24, 24, 2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_single_cell_map() {
        let map = generate(&test_params(), 1, 1, 5);
        assert_eq!(*map.get(0, 0), 0.0);
    }
}
