//! River and pool hydrology.
//!
//! Rivers start at randomly placed sources, follow a height-priority search
//! to the next sink (sea, basin floor, or an existing pool's drain), and
//! flood basins layer by rising layer until a drain appears or the pool
//! gets too deep. Pool cells remember their drain so later rivers can flow
//! straight through.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;

use crate::cliffs::dir_vector;
use crate::rawmap::{Cliffs, Heightmap, Stratums, Watermap};
use crate::raster::Raster;

/// Cardinal neighbor order; contractual for the search tie-breaks.
pub const N4_OFFSETS: [(i64, i64); 4] = [(0, 1), (1, 0), (0, -1), (-1, 0)];

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct WaterParams {
    /// Maximum number of sink-to-sink hops per source.
    pub river_lifetime: usize,
    /// Sea height as a coefficient of the heightmap range.
    pub sea_level: f64,
    pub sources: SourceParams,
    pub pooling: PoolingParams,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SourceParams {
    pub amount: usize,
    /// Minimum distance between sources, in cells.
    pub distance: f64,
    /// River intensity added per path cell, uniform in `[a, b)`.
    pub power_range: [f64; 2],
    /// Spawn window, coefficients of the map dimensions.
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    /// Accepted spawn heights, coefficients of the heightmap range.
    pub height_range: [f64; 2],
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PoolingParams {
    /// Water-plane rise per flood layer.
    pub layer_size: f64,
    /// Flooding past this depth abandons the pool.
    pub max_depth: f64,
    /// Uphill steps at least this high wall the river search.
    pub basin_trim: f64,
}

/// A river origin. Transient: consumed by the stage, never persisted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Source {
    pub x: usize,
    pub y: usize,
    pub power: f64,
}

/// Per-cell drain coordinate for flooded cells, `None` outside pools.
pub type DrainsMap = Raster<Option<(u32, u32)>>;

/// Output of the water mapping stage.
pub struct Waters {
    pub rivermap: Watermap,
    pub poolmap: Watermap,
    pub drains: DrainsMap,
    pub sources: Vec<Source>,
}

pub fn generate(
    heightmap: &Heightmap,
    stratums: &Stratums,
    cliffmap: &Cliffs,
    params: &WaterParams,
    seed: u64,
) -> Waters {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut waters = Waters {
        rivermap: Raster::new(width, height),
        poolmap: Raster::new(width, height),
        drains: Raster::new(width, height),
        sources: Vec::new(),
    };
    if width == 0 || height == 0 {
        return waters;
    }

    let (lowest, highest) = heightmap.min_max();
    if lowest == highest {
        log::debug!("flat heightmap, skipping water mapping");
        return waters;
    }

    // Resolve coefficients to absolute heights and coordinates.
    let range = highest - lowest;
    let sea_level = lowest + params.sea_level * range;
    let height_min = lowest + params.sources.height_range[0] * range;
    let height_max = lowest + params.sources.height_range[1] * range;
    let x_range = resolve_axis(params.sources.x_range, width);
    let y_range = resolve_axis(params.sources.y_range, height);

    let mut prng = ChaCha8Rng::seed_from_u64(seed);

    for i in 0..params.sources.amount {
        let (pos_x, pos_y) = pick_source(
            &mut prng,
            &waters.sources,
            x_range,
            y_range,
            params.sources.distance,
            cliffmap,
            heightmap,
            height_min,
            height_max,
        );
        let power = prng.gen_range(params.sources.power_range[0]..params.sources.power_range[1]);
        waters.sources.push(Source { x: pos_x, y: pos_y, power });
        log::debug!("source {i}: placed at ({pos_x}, {pos_y})");

        run_source(
            (pos_x, pos_y),
            power,
            heightmap,
            cliffmap,
            &mut waters,
            sea_level,
            params,
        );
    }

    cleanup(&mut waters.rivermap, &mut waters.poolmap, stratums);
    waters
}

fn resolve_axis(range: [f64; 2], dim: usize) -> (usize, usize) {
    let max = (dim - 1) as f64;
    let lo = (range[0] * max) as usize;
    let hi = ((range[1] * max) as usize).max(lo).min(dim - 1);
    (lo, hi)
}

/// Try up to 100 random positions; accept the first that is off-cliff, in
/// the height window, and far enough from every prior source. Falls back to
/// the last attempt.
#[allow(clippy::too_many_arguments)]
fn pick_source(
    prng: &mut ChaCha8Rng,
    sources: &[Source],
    x_range: (usize, usize),
    y_range: (usize, usize),
    distance: f64,
    cliffmap: &Cliffs,
    heightmap: &Heightmap,
    height_min: f64,
    height_max: f64,
) -> (usize, usize) {
    let sqr_exclusion = distance * distance;
    let mut pos_x = x_range.0;
    let mut pos_y = y_range.0;
    for _ in 0..100 {
        pos_x = prng.gen_range(x_range.0..=x_range.1);
        pos_y = prng.gen_range(y_range.0..=y_range.1);
        if *cliffmap.get(pos_x, pos_y) > 0 {
            continue;
        }
        let height = *heightmap.get(pos_x, pos_y);
        if height < height_min || height > height_max {
            continue;
        }
        let far_enough = sources.iter().all(|s| {
            let dx = s.x as f64 - pos_x as f64;
            let dy = s.y as f64 - pos_y as f64;
            dx * dx + dy * dy >= sqr_exclusion
        });
        if far_enough {
            return (pos_x, pos_y);
        }
    }
    (pos_x, pos_y)
}

/// Simulate one source: alternate river paths and basin floods until the
/// river reaches the sea, the pool gets too deep, or the lifetime runs out.
fn run_source(
    source: (usize, usize),
    power: f64,
    heightmap: &Heightmap,
    cliffmap: &Cliffs,
    waters: &mut Waters,
    sea_level: f64,
    params: &WaterParams,
) {
    let mut head = source;
    for _ in 0..params.river_lifetime {
        let river = find_river(
            head,
            heightmap,
            cliffmap,
            &waters.drains,
            sea_level,
            params.pooling.basin_trim,
        );
        for &(x, y) in &river {
            let current = *waters.rivermap.get(x, y);
            waters.rivermap.set(x, y, current + power);
        }

        head = match river.last() {
            Some(&cell) => cell,
            None => break,
        };
        if *waters.poolmap.get(head.0, head.1) > 0.0 {
            if let Some((dx, dy)) = *waters.drains.get(head.0, head.1) {
                head = (dx as usize, dy as usize);
            }
        }
        if *heightmap.get(head.0, head.1) <= sea_level {
            break;
        }

        let (drain, too_deep) = flood(
            head,
            heightmap,
            cliffmap,
            &mut waters.poolmap,
            &mut waters.drains,
            sea_level,
            &params.pooling,
        );
        if too_deep {
            log::debug!("no drain found, pool too deep");
            break;
        }
        match drain {
            Some(drain) => {
                head = drain;
                // A drain sitting inside another pool would loop the
                // drains chain; end the river there instead.
                if *waters.poolmap.get(head.0, head.1) > 0.0
                    && *heightmap.get(head.0, head.1) > sea_level
                {
                    break;
                }
            }
            None => break,
        }
    }
}

/// Height-priority search from `start` to the next sink.
///
/// The frontier is relaxed on height, not distance: the lowest open node is
/// processed first, ties keep insertion order. Pool nodes teleport to their
/// drain. A sea neighbor ends the search immediately; if the frontier dries
/// up, the lowest closed non-cliff node is the sink (a basin floor).
fn find_river(
    start: (usize, usize),
    heightmap: &Heightmap,
    cliffmap: &Cliffs,
    drains: &DrainsMap,
    sea_level: f64,
    basin_trim: f64,
) -> Vec<(usize, usize)> {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut tried = Raster::new_with(width, height, false);
    let mut parents: Raster<Option<(u32, u32)>> = Raster::new(width, height);
    let mut frontier: Vec<(usize, usize)> = vec![start];
    tried.set(start.0, start.1, true);

    let mut target: Option<(usize, usize)> = None;
    let mut fallback: Option<(usize, usize)> = None;

    'search: while !frontier.is_empty() {
        // Stable min-by-height keeps first-enqueued on ties.
        let mut best = 0;
        for i in 1..frontier.len() {
            if heightmap.get(frontier[i].0, frontier[i].1)
                < heightmap.get(frontier[best].0, frontier[best].1)
            {
                best = i;
            }
        }
        let mut current = frontier.remove(best);

        // Flow through pools straight to their drain.
        if let Some((dx, dy)) = *drains.get(current.0, current.1) {
            let drain = (dx as usize, dy as usize);
            if drain != current {
                if *tried.get(drain.0, drain.1) {
                    continue;
                }
                tried.set(drain.0, drain.1, true);
                parents.set(drain.0, drain.1, Some((current.0 as u32, current.1 as u32)));
                current = drain;
                if *heightmap.get(current.0, current.1) <= sea_level {
                    target = Some(current);
                    break 'search;
                }
            }
        }

        let cliff = *cliffmap.get(current.0, current.1);
        if cliff == 0 {
            let lower = fallback
                .map(|f| heightmap.get(current.0, current.1) < heightmap.get(f.0, f.1))
                .unwrap_or(true);
            if lower {
                fallback = Some(current);
            }
        }

        // Non-cliff nodes expand to all cardinals; cliff nodes only along a
        // vertical face. Lateral and angled cliffs block the flow.
        let steps: &[(i64, i64)] = if cliff == 0 {
            &N4_OFFSETS
        } else {
            match dir_vector(cliff) {
                Some((0, dy)) => {
                    if dy < 0 {
                        &[(0, -1)]
                    } else {
                        &[(0, 1)]
                    }
                }
                _ => &[],
            }
        };
        for &(dx, dy) in steps {
            let nx = current.0 as i64 + dx;
            let ny = current.1 as i64 + dy;
            if !heightmap.contains(nx, ny) {
                continue;
            }
            let next = (nx as usize, ny as usize);
            if *tried.get(next.0, next.1) {
                continue;
            }
            if *heightmap.get(next.0, next.1) <= sea_level {
                parents.set(next.0, next.1, Some((current.0 as u32, current.1 as u32)));
                target = Some(next);
                break 'search;
            }
            if heightmap.get(next.0, next.1) - heightmap.get(current.0, current.1) >= basin_trim {
                continue; // Wall
            }
            tried.set(next.0, next.1, true);
            parents.set(next.0, next.1, Some((current.0 as u32, current.1 as u32)));
            frontier.push(next);
        }
    }

    // Backtrack the predecessor chain.
    let end = target.or(fallback).unwrap_or(start);
    let mut path = vec![end];
    let mut cursor = end;
    while let Some((px, py)) = *parents.get(cursor.0, cursor.1) {
        cursor = (px as usize, py as usize);
        path.push(cursor);
    }
    path.reverse();
    path
}

/// Flood the basin around `head` with rising layers.
///
/// Each pass raises the water plane by one layer, collects the connected
/// cells under it, and looks for a neighbor already below the previous
/// plane (or sea): the drain. Returns the drain, plus whether the pool
/// exceeded the depth limit.
pub(crate) fn flood(
    head: (usize, usize),
    heightmap: &Heightmap,
    cliffmap: &Cliffs,
    poolmap: &mut Watermap,
    drains: &mut DrainsMap,
    sea_level: f64,
    pooling: &PoolingParams,
) -> (Option<(usize, usize)>, bool) {
    let width = heightmap.width;
    let height = heightmap.height;
    let mut top = *heightmap.get(head.0, head.1) + *poolmap.get(head.0, head.1);
    let mut tried = Raster::new_with(width, height, false);
    let mut layer: Vec<(usize, usize)> = Vec::new();
    let mut drain: Option<(usize, usize)> = None;
    let mut too_deep = false;

    loop {
        let bottom = top;
        top += pooling.layer_size;
        layer.clear();
        tried.fill(false);

        let mut stack = vec![head];
        tried.set(head.0, head.1, true);
        while let Some((x, y)) = stack.pop() {
            layer.push((x, y));
            for (dx, dy) in N4_OFFSETS {
                let nx = x as i64 + dx;
                let ny = y as i64 + dy;
                if !heightmap.contains(nx, ny) {
                    continue;
                }
                let next = (nx as usize, ny as usize);
                if *tried.get(next.0, next.1) {
                    continue;
                }
                tried.set(next.0, next.1, true);
                if *cliffmap.get(next.0, next.1) > 0 {
                    continue;
                }
                let surface = *heightmap.get(next.0, next.1) + *poolmap.get(next.0, next.1);
                if surface < bottom || *heightmap.get(next.0, next.1) <= sea_level {
                    // Drain candidate; the lowest one wins.
                    let better = drain
                        .map(|d| heightmap.get(next.0, next.1) < heightmap.get(d.0, d.1))
                        .unwrap_or(true);
                    if better {
                        drain = Some(next);
                    }
                } else if *heightmap.get(next.0, next.1) < top {
                    stack.push(next);
                }
            }
        }

        for &(x, y) in &layer {
            let depth = top - *heightmap.get(x, y);
            poolmap.set(x, y, depth);
            if depth > pooling.max_depth {
                too_deep = true;
            }
        }
        if let Some(d) = drain {
            let coord = Some((d.0 as u32, d.1 as u32));
            for &(x, y) in &layer {
                drains.set(x, y, coord);
            }
            return (Some(d), too_deep);
        }
        if too_deep {
            return (None, true);
        }
    }
}

/// Collapse intensities to binary maps: sea and pools become pool cells,
/// rivers lose their pool overlap, everything else is 0/1.
fn cleanup(rivermap: &mut Watermap, poolmap: &mut Watermap, stratums: &Stratums) {
    let (min_stratum, max_stratum) = stratums.min_max();
    let has_sea = min_stratum != max_stratum;
    for y in 0..rivermap.height {
        for x in 0..rivermap.width {
            if *poolmap.get(x, y) > 0.0 || (has_sea && *stratums.get(x, y) <= min_stratum) {
                rivermap.set(x, y, 0.0);
                poolmap.set(x, y, 1.0);
            }
            if *rivermap.get(x, y) > 0.0 {
                rivermap.set(x, y, 1.0);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cliffs::calculate_cliffs;
    use crate::heightmap::ramp;
    use crate::stratums::calculate_stratums;

    fn test_params() -> WaterParams {
        WaterParams {
            river_lifetime: 20,
            sea_level: 0.05,
            sources: SourceParams {
                amount: 4,
                distance: 2.0,
                power_range: [1.0, 2.0],
                x_range: [0.1, 0.9],
                y_range: [0.1, 0.5],
                height_range: [0.3, 1.0],
            },
            pooling: PoolingParams {
                layer_size: 0.005,
                max_depth: 0.5,
                basin_trim: 0.02,
            },
        }
    }

    #[test]
    fn test_flat_heightmap_yields_zero_maps() {
        let heightmap = Raster::new_with(8, 8, 0.5);
        let stratums = Raster::new(8, 8);
        let cliffmap = Raster::new(8, 8);
        let waters = generate(&heightmap, &stratums, &cliffmap, &test_params(), 3);
        assert!(waters.rivermap.iter().all(|(_, _, &v)| v == 0.0));
        assert!(waters.poolmap.iter().all(|(_, _, &v)| v == 0.0));
    }

    #[test]
    fn test_sources_respect_window_and_count() {
        let heightmap = ramp::generate(20, 20);
        let stratums = calculate_stratums(&heightmap, 5);
        let cliffmap = calculate_cliffs(&stratums);
        let waters = generate(&heightmap, &stratums, &cliffmap, &test_params(), 11);

        assert_eq!(waters.sources.len(), 4);
        for source in &waters.sources {
            assert!((1..=18).contains(&source.x), "x = {}", source.x);
            assert!((1..=10).contains(&source.y), "y = {}", source.y);
            assert!((1.0..2.0).contains(&source.power));
        }
    }

    #[test]
    fn test_river_reaches_sea_on_ramp() {
        let heightmap = ramp::generate(10, 10);
        let cliffmap = calculate_cliffs(&calculate_stratums(&heightmap, 5));
        let drains: DrainsMap = Raster::new(10, 10);

        let river = find_river((5, 2), &heightmap, &cliffmap, &drains, 0.01, 0.02);
        assert_eq!(river[0], (5, 2));
        let (ex, ey) = *river.last().unwrap();
        assert!(*heightmap.get(ex, ey) <= 0.01, "ended at height {}", heightmap.get(ex, ey));
        // No pools on the way: consecutive cells are cardinal neighbors.
        for pair in river.windows(2) {
            let dx = pair[1].0 as i64 - pair[0].0 as i64;
            let dy = pair[1].1 as i64 - pair[0].1 as i64;
            assert_eq!(dx.abs() + dy.abs(), 1, "gap between {:?} and {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_basin_search_falls_back_to_floor() {
        // A crater with no outlet: the search must end on the crater floor.
        let mut heightmap = Raster::new_with(9, 9, 0.8);
        heightmap.set(4, 4, 0.3);
        heightmap.set(4, 5, 0.4);
        heightmap.set(4, 3, 0.5);
        let cliffmap = Raster::new(9, 9);
        let drains: DrainsMap = Raster::new(9, 9);

        let river = find_river((4, 3), &heightmap, &cliffmap, &drains, 0.0, 0.02);
        assert_eq!(*river.last().unwrap(), (4, 4));
    }

    #[test]
    fn test_pool_fills_until_drain() {
        // Flat plateau at 0.5 with a one-cell depression: flooding raises
        // the plane until the rim is below it, then drains there.
        let mut heightmap = Raster::new_with(10, 10, 0.5);
        heightmap.set(5, 5, 0.3);
        let cliffmap = Raster::new(10, 10);
        let mut poolmap: Watermap = Raster::new(10, 10);
        let mut drains: DrainsMap = Raster::new(10, 10);
        let pooling = PoolingParams {
            layer_size: 0.05,
            max_depth: 0.5,
            basin_trim: 0.02,
        };

        let (drain, too_deep) = flood(
            (5, 5),
            &heightmap,
            &cliffmap,
            &mut poolmap,
            &mut drains,
            0.0,
            &pooling,
        );
        assert!(!too_deep);
        let drain = drain.unwrap();
        let neighbors = [(5, 6), (6, 5), (5, 4), (4, 5)];
        assert!(neighbors.contains(&drain), "drain at {drain:?}");
        assert_eq!(*drains.get(5, 5), Some((drain.0 as u32, drain.1 as u32)));
        assert!(*poolmap.get(5, 5) > 0.0);
    }

    #[test]
    fn test_too_deep_pool_has_no_drain() {
        let mut heightmap = Raster::new_with(10, 10, 0.9);
        heightmap.set(5, 5, 0.1);
        let cliffmap = Raster::new(10, 10);
        let mut poolmap: Watermap = Raster::new(10, 10);
        let mut drains: DrainsMap = Raster::new(10, 10);
        let pooling = PoolingParams {
            layer_size: 0.05,
            max_depth: 0.3,
            basin_trim: 0.02,
        };

        let (drain, too_deep) = flood(
            (5, 5),
            &heightmap,
            &cliffmap,
            &mut poolmap,
            &mut drains,
            0.0,
            &pooling,
        );
        assert!(too_deep);
        assert!(drain.is_none());
        assert_eq!(*drains.get(5, 5), None);
    }

    #[test]
    fn test_cleanup_binarizes_and_separates() {
        let heightmap = ramp::generate(16, 16);
        let stratums = calculate_stratums(&heightmap, 5);
        let cliffmap = calculate_cliffs(&stratums);
        let waters = generate(&heightmap, &stratums, &cliffmap, &test_params(), 21);

        for (x, y, &river) in waters.rivermap.iter() {
            assert!(river == 0.0 || river == 1.0);
            let pool = *waters.poolmap.get(x, y);
            assert!(pool == 0.0 || pool == 1.0);
            assert_eq!(river * pool, 0.0, "overlap at ({x}, {y})");
        }
        // The lowest stratum band is sea.
        for (x, y, &s) in stratums.iter() {
            if s == 0.0 {
                assert_eq!(*waters.poolmap.get(x, y), 1.0, "sea missing at ({x}, {y})");
            }
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let heightmap = ramp::generate(16, 16);
        let stratums = calculate_stratums(&heightmap, 5);
        let cliffmap = calculate_cliffs(&stratums);
        let a = generate(&heightmap, &stratums, &cliffmap, &test_params(), 5);
        let b = generate(&heightmap, &stratums, &cliffmap, &test_params(), 5);
        assert_eq!(a.rivermap, b.rivermap);
        assert_eq!(a.poolmap, b.poolmap);
        assert_eq!(a.sources, b.sources);
    }
}
