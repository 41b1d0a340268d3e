use serde::Serialize;

use crate::world::{BuildingId, VillagerId};

/// Everything a renderer needs to keep its own visuals in sync.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SimEvent {
    BuildingPlaced {
        building: BuildingId,
        q: i32,
        r: i32,
    },
    VillagerDeployed {
        villager: VillagerId,
        x: f64,
        y: f64,
    },
    VillagerMoved {
        villager: VillagerId,
        x: f64,
        y: f64,
    },
    /// Fired once per arrival, not while the villager idles at the building.
    VillagerArrived {
        villager: VillagerId,
        building: BuildingId,
    },
    EqChanged {
        average_eq: f64,
    },
    CreditsChanged {
        credits: f64,
    },
}

#[derive(Debug, Default)]
pub struct EventQueue {
    pending: Vec<SimEvent>,
}

impl EventQueue {
    pub fn push(&mut self, event: SimEvent) {
        self.pending.push(event);
    }

    pub fn drain(&mut self) -> Vec<SimEvent> {
        std::mem::take(&mut self.pending)
    }
}
