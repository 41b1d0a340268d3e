use crate::{
    engine::{System, SystemContext},
    events::{EventQueue, SimEvent},
    world::{Colony, Villager, DEFAULT_EQ},
};

/// Mean EQ across villagers; an empty colony sits at the neutral 50.
pub fn average_eq<'a>(villagers: impl IntoIterator<Item = &'a Villager>) -> f64 {
    let (total, count) = villagers
        .into_iter()
        .fold((0.0, 0usize), |(total, count), v| (total + v.eq(), count + 1));
    if count == 0 {
        DEFAULT_EQ
    } else {
        total / count as f64
    }
}

pub struct BookkeepingSystem;

impl BookkeepingSystem {
    pub fn new() -> Self {
        Self
    }
}

impl Default for BookkeepingSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl System for BookkeepingSystem {
    fn name(&self) -> &str {
        "bookkeeping"
    }

    fn run(&mut self, _ctx: &SystemContext, colony: &mut Colony, events: &mut EventQueue) {
        let average = average_eq(colony.villagers());
        colony.set_average_eq(average);
        events.push(SimEvent::EqChanged {
            average_eq: average,
        });
    }
}
