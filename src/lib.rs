pub mod content;
pub mod engine;
pub mod events;
pub mod hex;
pub mod rng;
pub mod scenario;
pub mod snapshot;
pub mod systems;
pub mod world;

pub use engine::{ColonySimulation, SimulationSettings, TickSummary};
pub use events::SimEvent;
pub use scenario::Scenario;
pub use world::{Building, BuildingId, BuildingSpec, Colony, Villager, VillagerId, VillagerSpec};
