//! Circular erosion brush.

use crate::area::OffsetedArea;

/// Precomputed set of `(dx, dy, weight)` offsets covering the disc of the
/// given radius, weights normalized to sum to 1. Erosion amounts are spread
/// over the disc so channels come out rounded instead of one cell wide.
#[derive(Debug, Clone)]
pub struct ErosionBrush {
    offsets: Vec<(i64, i64, f64)>,
}

impl ErosionBrush {
    pub fn new(radius: usize) -> Self {
        let r = radius as i64;
        let sweep = OffsetedArea::new(radius * 2, radius * 2, -r, -r);
        let sqr_radius = (r * r) as f64;
        let mut offsets = Vec::new();
        let mut weight_sum = 0.0;

        for (x, y) in sweep.iter() {
            let sqr_dst = (x * x + y * y) as f64;
            if sqr_dst < sqr_radius {
                let weight = 1.0 - sqr_dst.sqrt() / radius as f64;
                weight_sum += weight;
                offsets.push((x, y, weight));
            }
        }
        for entry in &mut offsets {
            entry.2 /= weight_sum;
        }

        Self { offsets }
    }

    pub fn iter(&self) -> impl Iterator<Item = (i64, i64, f64)> + '_ {
        self.offsets.iter().copied()
    }

    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weights_sum_to_one() {
        for radius in [1, 2, 3, 5, 8] {
            let brush = ErosionBrush::new(radius);
            let total: f64 = brush.iter().map(|(_, _, w)| w).sum();
            assert!((total - 1.0).abs() < 1e-9, "radius {radius}: sum {total}");
        }
    }

    #[test]
    fn test_offsets_inside_radius() {
        let radius = 4;
        let brush = ErosionBrush::new(radius);
        for (dx, dy, weight) in brush.iter() {
            assert!(dx * dx + dy * dy < (radius * radius) as i64);
            assert!(weight > 0.0);
        }
    }

    #[test]
    fn test_radius_one_is_single_cell() {
        let brush = ErosionBrush::new(1);
        let offsets: Vec<_> = brush.iter().collect();
        assert_eq!(offsets, vec![(0, 0, 1.0)]);
    }
}
