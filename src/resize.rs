//! Nearest-neighbor raster upscaling.

use crate::raster::Raster;

/// Upscale by an integer factor: `out[x, y] = in[x / factor, y / factor]`.
pub fn resize<T: Clone + Default>(data: &Raster<T>, factor: usize) -> Raster<T> {
    let new_width = data.width * factor;
    let new_height = data.height * factor;
    let mut resized = Raster::new(new_width, new_height);
    for y in 0..new_height {
        for x in 0..new_width {
            resized.set(x, y, data.get(x / factor, y / factor).clone());
        }
    }
    resized
}
