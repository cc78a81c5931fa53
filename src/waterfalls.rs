//! Waterfall detection: a waterfall is a river cell on a cliff. The mask
//! keeps the cliff byte so renderers know which way the water falls.

use crate::rawmap::{Cliffs, Watermap};
use crate::raster::Raster;

pub fn calculate_waterfalls(rivermap: &Watermap, cliffmap: &Cliffs) -> Watermap {
    let mut waterfalls = Raster::new(rivermap.width, rivermap.height);
    for (x, y, &river) in rivermap.iter() {
        let cliff = *cliffmap.get(x, y);
        if cliff > 0 && river > 0.0 {
            waterfalls.set(x, y, cliff as f64);
        }
    }
    waterfalls
}
