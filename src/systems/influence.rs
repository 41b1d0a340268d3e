//! EQ pressure exerted by buildings on villagers.

use crate::{
    hex::Pixel,
    world::Building,
};

/// Buildings further than this (in hex steps) have no effect.
pub const INFLUENCE_RADIUS: i32 = 3;
const FALLOFF_DISTANCE: f64 = 4.0;
const ARRIVAL_DIVISOR: f64 = 10.0;

/// Instantaneous EQ rate for a villager standing at `position`.
///
/// Each building within three steps contributes `eq_impact * (1 - d/4)`. The
/// caller scales the result by elapsed time before applying it.
pub fn proximity_rate<'a>(
    position: Pixel,
    buildings: impl IntoIterator<Item = &'a Building>,
    hex_size: f64,
) -> f64 {
    let cell = position.to_hex(hex_size);
    buildings
        .into_iter()
        .filter_map(|building| {
            let distance = cell.distance(building.cell());
            (distance <= INFLUENCE_RADIUS).then(|| {
                building.spec.eq_impact as f64 * (1.0 - distance as f64 / FALLOFF_DISTANCE)
            })
        })
        .sum()
}

/// One-off EQ step applied when a villager arrives at `building`.
pub fn arrival_step(building: &Building) -> f64 {
    building.spec.eq_impact as f64 / ARRIVAL_DIVISOR
}
