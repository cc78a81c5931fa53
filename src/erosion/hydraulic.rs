//! The droplet simulation itself.
//!
//! Strictly sequential: every droplet reads the field as left by the
//! previous one, so the whole stage is a single deterministic pass for a
//! given seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::area::Area;
use crate::erosion::brush::ErosionBrush;
use crate::erosion::utils::height_gradient_at;
use crate::erosion::ErosionParams;
use crate::rawmap::Heightmap;

const LOGGING_STEP: usize = 10_000;

pub fn simulate(heightmap: &mut Heightmap, params: &ErosionParams, seed: u64) {
    let brush = ErosionBrush::new(params.brush_radius);
    // Offset from the synthesis seed so the two stages draw uncorrelated
    // sequences.
    let mut prng = ChaCha8Rng::seed_from_u64(seed.wrapping_add(1));
    let width = heightmap.width;
    let height = heightmap.height;
    let area = Area::new(width, height);

    for iteration in 0..params.droplets {
        if iteration % LOGGING_STEP == 0 {
            log::debug!(
                "erosion: {iteration} droplets of {} ({:.2}%)",
                params.droplets,
                100.0 * iteration as f64 / params.droplets as f64
            );
        }

        let mut pos_x = prng.gen_range(1..=width - 2) as f64;
        let mut pos_y = prng.gen_range(1..=height - 2) as f64;
        let mut dir_x = 0.0;
        let mut dir_y = 0.0;
        let mut speed = params.initial_speed;
        let mut water = params.initial_water_volume;
        let mut sediment = 0.0f64;

        for _ in 0..params.droplet_lifetime {
            let node_x = pos_x as usize;
            let node_y = pos_y as usize;
            let cell_offset_x = pos_x - node_x as f64;
            let cell_offset_y = pos_y - node_y as f64;

            let hg = height_gradient_at(heightmap, pos_x, pos_y);

            // Blend the downhill pull into the current direction, then move
            // one unit regardless of speed.
            dir_x = dir_x * params.inertia - hg.gradient_x * (1.0 - params.inertia);
            dir_y = dir_y * params.inertia - hg.gradient_y * (1.0 - params.inertia);
            let length = (dir_x * dir_x + dir_y * dir_y).sqrt();
            if length != 0.0 {
                dir_x /= length;
                dir_y /= length;
            }
            pos_x += dir_x;
            pos_y += dir_y;

            // Dead stop, or drifted out of the interior where the bilinear
            // corners exist.
            if (dir_x == 0.0 && dir_y == 0.0)
                || pos_x < 1.0
                || pos_x >= (width - 2) as f64
                || pos_y < 1.0
                || pos_y >= (height - 2) as f64
            {
                break;
            }

            let new_height = height_gradient_at(heightmap, pos_x, pos_y).height;
            let delta_height = new_height - hg.height;

            // Fell into the sea: the droplet ends here.
            if let Some(sea_level) = params.sea_level {
                if new_height <= sea_level {
                    break;
                }
            }

            // Carrying capacity grows with slope, speed and volume.
            let capacity = (-delta_height * speed * water * params.sediment_capacity_factor)
                .max(params.sediment_min_capacity);

            if sediment > capacity || delta_height > 0.0 {
                // Moving uphill fills the pit behind; otherwise drop a
                // fraction of the excess. Deposition goes to the departure
                // cell's corners, not the brush, so single-cell pits fill.
                let amount_to_deposit = if delta_height > 0.0 {
                    delta_height.min(sediment)
                } else {
                    (sediment - capacity) * params.deposit_speed
                };
                sediment -= amount_to_deposit;

                let w_nw = (1.0 - cell_offset_x) * (1.0 - cell_offset_y);
                let w_ne = cell_offset_x * (1.0 - cell_offset_y);
                let w_sw = (1.0 - cell_offset_x) * cell_offset_y;
                let w_se = cell_offset_x * cell_offset_y;
                let add = |map: &mut Heightmap, x: usize, y: usize, delta: f64| {
                    let current = *map.get(x, y);
                    map.set(x, y, current + delta);
                };
                add(heightmap, node_x, node_y, amount_to_deposit * w_nw);
                add(heightmap, node_x + 1, node_y, amount_to_deposit * w_ne);
                add(heightmap, node_x, node_y + 1, amount_to_deposit * w_sw);
                add(heightmap, node_x + 1, node_y + 1, amount_to_deposit * w_se);
            } else {
                // Erode from the brush disc, clamped to the height drop so
                // the droplet doesn't dig a hole behind itself.
                let amount_to_erode =
                    ((capacity - sediment) * params.erode_speed).min(-delta_height);

                for (dx, dy, weight) in brush.iter() {
                    let x = node_x as i64 + dx;
                    let y = node_y as i64 + dy;
                    if !area.valid(x, y) {
                        continue;
                    }
                    let (x, y) = (x as usize, y as usize);
                    let delta_sediment = heightmap.get(x, y).min(amount_to_erode * weight);
                    let current = *heightmap.get(x, y);
                    heightmap.set(x, y, current - delta_sediment);
                    sediment += delta_sediment;
                }
            }

            speed = (speed * speed + delta_height * params.gravity).max(0.0).sqrt();
            water *= 1.0 - params.evaporate_speed;
        }
    }

    log::debug!("erosion: {} droplets of {} (100%)", params.droplets, params.droplets);
}
