//! Fixture generator: a flat field with two mid peaks and one corner peak.
//! Exercises stratums orphan repair and broken-line correction.

use crate::rawmap::Heightmap;
use crate::raster::Raster;

const PEAKS: [(usize, usize, f64); 3] = [(0, 0, 3.0), (6, 5, 3.0), (9, 9, 4.0)];

pub fn generate(width: usize, height: usize) -> Heightmap {
    let mut map = Raster::new_with(width, height, 1.0);
    for &(x, y, value) in &PEAKS {
        if x < width && y < height {
            map.set(x, y, value);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peak_placement() {
        let map = generate(10, 10);
        assert_eq!(*map.get(0, 0), 3.0);
        assert_eq!(*map.get(6, 5), 3.0);
        assert_eq!(*map.get(9, 9), 4.0);
        assert_eq!(*map.get(5, 5), 1.0);
    }

    #[test]
    fn test_small_map_clips_peaks() {
        let map = generate(4, 4);
        assert_eq!(*map.get(0, 0), 3.0);
        assert_eq!(*map.get(3, 3), 1.0);
    }
}
