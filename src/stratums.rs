//! Quantization of the heightmap into discrete stratum levels.
//!
//! Three passes: snap every height down to a multiple of the step, then
//! repair broken contour lines so neighboring stratums never differ by more
//! than one step, then dissolve orphan cells that match none of their
//! cardinal neighbors.

use crate::cliffs::N8_OFFSETS;
use crate::rawmap::{Heightmap, Stratums};
use crate::raster::Raster;
use crate::waters::N4_OFFSETS;

/// Quantize `heightmap` into `step_count` levels.
pub fn calculate_stratums(heightmap: &Heightmap, step_count: usize) -> Stratums {
    let mut stratums = Raster::new(heightmap.width, heightmap.height);
    let (lowest, highest) = heightmap.min_max();
    let step = (highest - lowest) / step_count as f64;
    if step == 0.0 {
        return stratums; // Flatland
    }

    base_quantization(heightmap, &mut stratums, step);
    correct_broken_lines(&mut stratums, step, step_count);
    repair_orphans(&mut stratums, step);
    stratums
}

fn base_quantization(heightmap: &Heightmap, stratums: &mut Stratums, step: f64) {
    for y in 0..heightmap.height {
        for x in 0..heightmap.width {
            let height = *heightmap.get(x, y);
            stratums.set(x, y, height - height % step);
        }
    }
}

/// Sweep the levels from the top down; wherever a cell sits more than one
/// step above a neighbor, raise the neighbor to one step below. The raised
/// cell lands on the next level and is picked up by the following sweep, so
/// corrections cascade and every cliff ends up spanning exactly one step.
fn correct_broken_lines(stratums: &mut Stratums, step: f64, step_count: usize) {
    let (_, highest) = stratums.min_max();
    let filter_range = 0.1 * step;
    for i in 0..=step_count {
        let filter_height = highest - step * i as f64;
        for y in 0..stratums.height {
            for x in 0..stratums.width {
                let current = *stratums.get(x, y);
                if (current - filter_height).abs() >= filter_range {
                    continue;
                }
                for (dx, dy) in N8_OFFSETS {
                    let nx = x as i64 + dx;
                    let ny = y as i64 + dy;
                    if !stratums.contains(nx, ny) {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    if current - *stratums.get(nx, ny) > step {
                        stratums.set(nx, ny, current - step);
                    }
                }
            }
        }
    }
}

/// A cell that equals none of its cardinal neighbors is an orphan left over
/// from quantizing an isolated spike; replace it with the quantized mean of
/// those neighbors.
fn repair_orphans(stratums: &mut Stratums, step: f64) {
    for y in 0..stratums.height {
        for x in 0..stratums.width {
            let current = *stratums.get(x, y);
            let mut sum = 0.0;
            let mut count = 0;
            let mut isolated = true;
            for (dx, dy) in N4_OFFSETS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if !stratums.contains(nx, ny) {
                    continue;
                }
                let neighbor = *stratums.get(nx as usize, ny as usize);
                sum += neighbor;
                count += 1;
                if neighbor == current {
                    isolated = false;
                }
            }
            if isolated && count > 0 {
                let mean = sum / count as f64;
                stratums.set(x, y, (mean / step).floor() * step);
            }
        }
    }
}
