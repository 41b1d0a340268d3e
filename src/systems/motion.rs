use tracing::debug;

use crate::{
    engine::{System, SystemContext},
    events::{EventQueue, SimEvent},
    systems::influence,
    world::{Colony, Villager},
};

pub const VILLAGER_SPEED_PX_PER_MS: f64 = 0.1;
/// Villagers closer than this to their target snap onto it.
pub const ARRIVAL_RADIUS_PX: f64 = 5.0;
const EQ_RATE_WINDOW_MS: f64 = 10_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Motion {
    Idle,
    Moving,
    Arrived,
}

/// Step a villager towards its target.
///
/// Within the arrival radius the villager snaps onto the target and goes idle.
/// Otherwise it covers `speed * elapsed` pixels along the straight line, never
/// passing the target in a single step.
pub fn advance(villager: &mut Villager, elapsed_ms: f64) -> Motion {
    let Some(target) = villager.current_target else {
        return Motion::Idle;
    };

    let distance = villager.position.distance(target);
    if distance < ARRIVAL_RADIUS_PX {
        villager.position = target;
        villager.current_target = None;
        return Motion::Arrived;
    }

    // Capped at 1: an uncapped long frame overshoots and the villager orbits the target.
    let ratio = (VILLAGER_SPEED_PX_PER_MS * elapsed_ms / distance).min(1.0);
    villager.position.x += (target.x - villager.position.x) * ratio;
    villager.position.y += (target.y - villager.position.y) * ratio;
    Motion::Moving
}

pub struct MotionSystem;

impl MotionSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for MotionSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for MotionSystem {
    fn name(&self) -> &str {
        "motion"
    }

    fn run(&mut self, ctx: &SystemContext, colony: &mut Colony, events: &mut EventQueue) {
        for id in colony.villager_ids() {
            let villager = match colony.villagers.get_mut(&id) {
                Some(villager) => villager,
                None => continue,
            };

            match advance(villager, ctx.elapsed_ms) {
                Motion::Idle => {}
                Motion::Moving => {
                    let rate = influence::proximity_rate(
                        villager.position,
                        colony.buildings.values(),
                        ctx.hex_size,
                    );
                    villager.adjust_eq(rate * ctx.elapsed_ms / EQ_RATE_WINDOW_MS);
                    events.push(SimEvent::VillagerMoved {
                        villager: id,
                        x: villager.position.x,
                        y: villager.position.y,
                    });
                }
                Motion::Arrived => {
                    events.push(SimEvent::VillagerMoved {
                        villager: id,
                        x: villager.position.x,
                        y: villager.position.y,
                    });
                    let cell = villager.cell(ctx.hex_size);
                    let building = match colony.buildings.values_mut().find(|b| b.cell() == cell) {
                        Some(building) => building,
                        None => continue,
                    };
                    building.add_occupant(id);
                    villager.adjust_eq(influence::arrival_step(building));
                    debug!(
                        villager = %id,
                        building = %building.id,
                        eq = villager.eq(),
                        "villager arrived"
                    );
                    events.push(SimEvent::VillagerArrived {
                        villager: id,
                        building: building.id,
                    });
                }
            }
        }
    }
}
