//! The shared map container mutated by the pipeline stages.

use crate::error::{GenerationError, Result};
use crate::raster::Raster;

pub type Heightmap = Raster<f64>;
pub type Stratums = Raster<f64>;
pub type Cliffs = Raster<u8>;
pub type Watermap = Raster<f64>;

/// All raster layers of a map under generation.
///
/// `width`/`height` are the parameter-declared dimensions. The generation
/// stages run at working resolution (half the declared size); the resizing
/// stage replaces every raster with its 2x upscale, so the final resolution
/// is `2 * (width / 2)` per axis.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMap {
    pub width: usize,
    pub height: usize,
    pub heightmap: Heightmap,
    pub stratums: Stratums,
    pub cliffs: Cliffs,
    pub rivermap: Watermap,
    pub poolmap: Watermap,
    pub waterfallmap: Watermap,
}

impl RawMap {
    /// Create a map with zero-filled rasters at working resolution.
    pub fn new(width: usize, height: usize) -> Self {
        let ww = width / 2;
        let wh = height / 2;
        Self {
            width,
            height,
            heightmap: Raster::new(ww, wh),
            stratums: Raster::new(ww, wh),
            cliffs: Raster::new(ww, wh),
            rivermap: Raster::new(ww, wh),
            poolmap: Raster::new(ww, wh),
            waterfallmap: Raster::new(ww, wh),
        }
    }

    pub fn working_width(&self) -> usize {
        self.width / 2
    }

    pub fn working_height(&self) -> usize {
        self.height / 2
    }

    /// Resolution the rasters currently hold (working before the resizing
    /// step, final after it).
    pub fn raster_width(&self) -> usize {
        self.heightmap.width
    }

    pub fn raster_height(&self) -> usize {
        self.heightmap.height
    }

    /// Flatten to `[W, H, heightmap.., stratums.., cliffs.., rivermap..,
    /// poolmap.., waterfallmap..]`. All six rasters share one resolution.
    pub fn to_array(&self) -> Vec<f64> {
        let cells = self.heightmap.as_slice().len();
        let mut arr = Vec::with_capacity(2 + 6 * cells);
        arr.push(self.width as f64);
        arr.push(self.height as f64);
        arr.extend_from_slice(self.heightmap.as_slice());
        arr.extend_from_slice(self.stratums.as_slice());
        arr.extend(self.cliffs.as_slice().iter().map(|&c| c as f64));
        arr.extend_from_slice(self.rivermap.as_slice());
        arr.extend_from_slice(self.poolmap.as_slice());
        arr.extend_from_slice(self.waterfallmap.as_slice());
        arr
    }

    /// Rebuild a map from [`RawMap::to_array`] output. The raster
    /// resolution (working or final) is inferred from the array length.
    pub fn from_array(step: u32, arr: &[f64]) -> Result<Self> {
        let malformed = |reason: String| GenerationError::StepData { step, reason };
        if arr.len() < 2 {
            return Err(malformed(format!("array of {} values has no header", arr.len())));
        }
        let width = arr[0] as usize;
        let height = arr[1] as usize;
        let cells = (arr.len() - 2) / 6;
        if cells * 6 != arr.len() - 2 {
            return Err(malformed(format!(
                "{} raster values don't split into 6 layers",
                arr.len() - 2
            )));
        }
        let (ww, wh) = (width / 2, height / 2);
        let (rw, rh) = if cells == ww * wh {
            (ww, wh)
        } else if cells == 4 * ww * wh {
            (2 * ww, 2 * wh)
        } else {
            return Err(malformed(format!(
                "{cells} cells match neither working ({ww}x{wh}) nor final ({}x{}) resolution",
                2 * ww,
                2 * wh
            )));
        };
        let layer = |i: usize| arr[2 + i * cells..2 + (i + 1) * cells].to_vec();
        Ok(Self {
            width,
            height,
            heightmap: Raster::from_vec(rw, rh, layer(0)),
            stratums: Raster::from_vec(rw, rh, layer(1)),
            cliffs: Raster::from_vec(rw, rh, layer(2).into_iter().map(|c| c as u8).collect()),
            rivermap: Raster::from_vec(rw, rh, layer(3)),
            poolmap: Raster::from_vec(rw, rh, layer(4)),
            waterfallmap: Raster::from_vec(rw, rh, layer(5)),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_allocates_working_resolution() {
        let map = RawMap::new(10, 8);
        assert_eq!(map.working_width(), 5);
        assert_eq!(map.working_height(), 4);
        assert_eq!(map.heightmap.width, 5);
        assert_eq!(map.cliffs.height, 4);
    }

    #[test]
    fn test_array_round_trip() {
        let mut map = RawMap::new(8, 8);
        map.heightmap.set(1, 2, 0.75);
        map.stratums.set(3, 3, 0.5);
        map.cliffs.set(0, 1, 0b1100_0001);
        map.rivermap.set(2, 2, 1.0);
        map.poolmap.set(1, 1, 1.0);
        map.waterfallmap.set(3, 0, 28.0);

        let restored = RawMap::from_array(1, &map.to_array()).unwrap();
        assert_eq!(restored, map);
    }

    #[test]
    fn test_from_array_rejects_bad_shape() {
        let map = RawMap::new(8, 8);
        let mut arr = map.to_array();
        arr.pop();
        assert!(RawMap::from_array(3, &arr).is_err());
    }

    #[test]
    fn test_from_array_infers_final_resolution() {
        let mut map = RawMap::new(8, 8);
        map.heightmap = Raster::new(8, 8);
        map.stratums = Raster::new(8, 8);
        map.cliffs = Raster::new(8, 8);
        map.rivermap = Raster::new(8, 8);
        map.poolmap = Raster::new(8, 8);
        map.waterfallmap = Raster::new(8, 8);

        let restored = RawMap::from_array(6, &map.to_array()).unwrap();
        assert_eq!(restored.raster_width(), 8);
        assert_eq!(restored.width, 8);
    }
}
