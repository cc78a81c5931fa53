//! Fixture generator: a north-south ramp, full height at the top edge,
//! zero at the bottom. Exercises stratums banding and cliff orientation.

use crate::rawmap::Heightmap;
use crate::raster::Raster;

pub fn generate(width: usize, height: usize) -> Heightmap {
    let mut map = Raster::new(width, height);
    let h = height as f64;
    for y in 0..height {
        let fy = y as f64;
        let value = if fy < 0.1 * h {
            1.0
        } else if fy > 0.9 * h {
            0.0
        } else {
            1.0 - (fy - 0.1 * h) / (0.9 * h - 0.1 * h)
        };
        for x in 0..width {
            map.set(x, y, value);
        }
    }
    map
}
