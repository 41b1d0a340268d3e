use tracing::trace;

use crate::{
    engine::{System, SystemContext},
    events::{EventQueue, SimEvent},
    world::Colony,
};

const MS_PER_HOUR: f64 = 3_600_000.0;
const UPKEEP_RATE: f64 = 0.01;
const INCOME_RATE: f64 = 0.05;

/// Credits per hour produced (positive) or consumed (negative) by a building.
///
/// Paid structures cost 1% of their price per hour in upkeep; structures with
/// a non-positive cost yield 5% of its magnitude per hour.
pub fn hourly_rate(cost: f64) -> f64 {
    if cost > 0.0 {
        cost * -UPKEEP_RATE
    } else {
        cost.abs() * INCOME_RATE
    }
}

/// Credits after `elapsed_ms` of upkeep and income from every building.
pub fn update_credits(colony: &Colony, elapsed_ms: f64) -> f64 {
    let hours = elapsed_ms / MS_PER_HOUR;
    let change: f64 = colony
        .buildings()
        .map(|building| hourly_rate(building.spec.cost) * hours)
        .sum();
    colony.credits() + change
}

pub struct EconomySystem;

impl EconomySystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for EconomySystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for EconomySystem {
    fn name(&self) -> &str {
        "economy"
    }

    fn run(&mut self, ctx: &SystemContext, colony: &mut Colony, events: &mut EventQueue) {
        let credits = update_credits(colony, ctx.elapsed_ms);
        trace!(tick = ctx.tick, delta = credits - colony.credits(), "credits updated");
        colony.set_credits(credits);
        events.push(SimEvent::CreditsChanged { credits });
    }
}
