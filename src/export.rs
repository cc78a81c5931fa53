//! PNG export of raster layers.
//!
//! One channel renders as greyscale RGB, rescaled so the full value range
//! maps onto 0..255; three channels share a single global coefficient.
//! Any other channel count is a caller bug and fails the export.

use std::path::Path;

use image::{ImageBuffer, Rgb, RgbImage};

use crate::error::{GenerationError, Result};
use crate::raster::Raster;

pub fn export(path: &Path, channels: &[&Raster<f64>]) -> Result<()> {
    match channels {
        [grey] => export_greyscale(path, grey),
        [red, green, blue] => export_rgb(path, [*red, *green, *blue]),
        other => Err(GenerationError::ImageChannels(other.len())),
    }
}

fn export_greyscale(path: &Path, data: &Raster<f64>) -> Result<()> {
    if data.width == 0 || data.height == 0 {
        log::debug!("empty raster, skipping export of {path:?}");
        return Ok(());
    }
    let (min, max) = data.min_max();
    let coef = if min != max { 255.0 / (max - min) } else { 1.0 };

    let mut img: RgbImage = ImageBuffer::new(data.width as u32, data.height as u32);
    for (x, y, &v) in data.iter() {
        let value = ((v - min) * coef).clamp(0.0, 255.0) as u8;
        img.put_pixel(x as u32, y as u32, Rgb([value, value, value]));
    }
    img.save(path)?;
    Ok(())
}

fn export_rgb(path: &Path, channels: [&Raster<f64>; 3]) -> Result<()> {
    let width = channels[0].width;
    let height = channels[0].height;
    if width == 0 || height == 0 {
        log::debug!("empty raster, skipping export of {path:?}");
        return Ok(());
    }

    // One shared coefficient keeps the channels comparable.
    let mut min = f64::MAX;
    let mut max = f64::MIN;
    for channel in &channels {
        let (lo, hi) = channel.min_max();
        min = min.min(lo);
        max = max.max(hi);
    }
    let coef = if min != max { 255.0 / (max - min) } else { 1.0 };

    let mut img: RgbImage = ImageBuffer::new(width as u32, height as u32);
    for y in 0..height {
        for x in 0..width {
            let pixel = [
                (*channels[0].get(x, y) * coef).clamp(0.0, 255.0) as u8,
                (*channels[1].get(x, y) * coef).clamp(0.0, 255.0) as u8,
                (*channels[2].get(x, y) * coef).clamp(0.0, 255.0) as u8,
            ];
            img.put_pixel(x as u32, y as u32, Rgb(pixel));
        }
    }
    img.save(path)?;
    Ok(())
}
