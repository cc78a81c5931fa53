//! Cliff orientation mask derived from the stratums.
//!
//! Each cell gets one byte: walking the 8 neighbors in a fixed order, a bit
//! is set when that neighbor's stratum is strictly lower. The byte both
//! marks cliff cells (non-zero) and encodes which way the drop faces.

use crate::rawmap::{Cliffs, Stratums};
use crate::raster::Raster;

/// Neighbor order for the mask, first entry lands on bit 7.
pub const N8_OFFSETS: [(i64, i64); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

/// Straight cliff faces: the three neighbors on one side are all lower.
pub const NORTH: u8 = 0b1100_0001;
pub const EAST: u8 = 0b0111_0000;
pub const SOUTH: u8 = 0b0001_1100;
pub const WEST: u8 = 0b0000_0111;

/// Flow direction off a cliff byte. Only the four straight faces are
/// traversable; corners and mixed masks return `None` (water can't cross).
pub fn dir_vector(cliff: u8) -> Option<(i64, i64)> {
    match cliff {
        NORTH => Some((0, -1)),
        EAST => Some((1, 0)),
        SOUTH => Some((0, 1)),
        WEST => Some((-1, 0)),
        _ => None,
    }
}

/// Compute the cliff byte for every cell.
pub fn calculate_cliffs(stratums: &Stratums) -> Cliffs {
    let mut cliffs = Raster::new(stratums.width, stratums.height);
    let (lowest, highest) = stratums.min_max();
    if lowest == highest {
        return cliffs; // Flatland
    }

    for y in 0..stratums.height {
        for x in 0..stratums.width {
            let current_height = *stratums.get(x, y);
            let mut current = 0u8;
            for (dx, dy) in N8_OFFSETS {
                current <<= 1;
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if stratums.contains(nx, ny)
                    && *stratums.get(nx as usize, ny as usize) < current_height
                {
                    current |= 1;
                }
            }
            cliffs.set(x, y, current);
        }
    }
    cliffs
}

/// RGB preview of a cliff map: east/west drops shift the red channel,
/// north/south drops the green one, against a mid-grey background.
pub fn to_rgb_cliffs(cliffs: &Cliffs) -> [Raster<f64>; 3] {
    const MID: f64 = 127.0;
    const NORTH_BIT: u8 = 0b1000_0000;
    const EAST_BIT: u8 = 0b0010_0000;
    const SOUTH_BIT: u8 = 0b0000_1000;
    const WEST_BIT: u8 = 0b0000_0010;

    let mut red = Raster::new(cliffs.width, cliffs.height);
    let mut green = Raster::new(cliffs.width, cliffs.height);
    let blue = Raster::new_with(cliffs.width, cliffs.height, MID);
    for (x, y, &cliff) in cliffs.iter() {
        let bit = |mask: u8| if cliff & mask != 0 { MID } else { 0.0 };
        red.set(x, y, MID + bit(EAST_BIT) - bit(WEST_BIT));
        green.set(x, y, MID + bit(NORTH_BIT) - bit(SOUTH_BIT));
    }
    [red, green, blue]
}
