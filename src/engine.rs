use std::path::PathBuf;

use anyhow::Result;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

use crate::{
    events::{EventQueue, SimEvent},
    hex::{find_path, HexCoord},
    rng::{RngManager, DEPLOYMENT_STREAM},
    snapshot::SnapshotWriter,
    systems::{BookkeepingSystem, EconomySystem, MotionSystem},
    world::{
        Building, BuildingId, BuildingSpec, ChatMessage, Colony, ColonySnapshot, Villager,
        VillagerId, VillagerSpec,
    },
};

pub const DEFAULT_HEX_SIZE: f64 = 40.0;
pub const DEFAULT_STARTING_CREDITS: f64 = 1000.0;

/// Where freshly deployed villagers appear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentMode {
    /// A random cell on the top or left edge of the visible grid.
    #[default]
    Edge,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SimulationSettings {
    pub colony_name: String,
    pub seed: u64,
    pub starting_credits: f64,
    pub hex_size: f64,
    pub viewport: Viewport,
    pub deployment: DeploymentMode,
    /// Clock reading the first tick is measured against.
    pub start_ms: f64,
    pub snapshot_interval_ticks: u64,
    pub snapshot_dir: PathBuf,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            colony_name: String::new(),
            seed: 0,
            starting_credits: DEFAULT_STARTING_CREDITS,
            hex_size: DEFAULT_HEX_SIZE,
            viewport: Viewport::default(),
            deployment: DeploymentMode::default(),
            start_ms: 0.0,
            snapshot_interval_ticks: 0,
            snapshot_dir: PathBuf::from("snapshots"),
        }
    }
}

pub struct SystemContext {
    pub tick: u64,
    pub elapsed_ms: f64,
    pub hex_size: f64,
}

pub trait System {
    fn name(&self) -> &str;
    fn run(&mut self, ctx: &SystemContext, colony: &mut Colony, events: &mut EventQueue);
}

pub struct SimulationBuilder {
    settings: SimulationSettings,
    systems: Vec<Box<dyn System>>,
}

impl SimulationBuilder {
    pub fn new(settings: SimulationSettings) -> Self {
        Self {
            settings,
            systems: Vec::new(),
        }
    }

    pub fn with_system(mut self, system: impl System + 'static) -> Self {
        self.systems.push(Box::new(system));
        self
    }

    /// Economy, then villager motion, then the EQ average.
    pub fn with_default_systems(self) -> Self {
        self.with_system(EconomySystem::new())
            .with_system(MotionSystem::new())
            .with_system(BookkeepingSystem::new())
    }

    pub fn build(self) -> ColonySimulation {
        let settings = self.settings;
        ColonySimulation {
            colony: Colony::new(settings.colony_name.clone(), settings.starting_credits),
            rng: RngManager::new(settings.seed),
            systems: self.systems,
            snapshot_writer: SnapshotWriter::new(
                &settings.snapshot_dir,
                settings.snapshot_interval_ticks,
            ),
            tick: 0,
            last_tick_ms: settings.start_ms,
            pending_placement: None,
            events: EventQueue::default(),
            settings,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TickSummary {
    pub tick: u64,
    pub elapsed_ms: f64,
    pub credits: f64,
    pub average_eq: f64,
    /// Events queued since the previous summary, in emission order.
    pub events: Vec<SimEvent>,
}

/// Owns one colony and advances it one frame at a time.
///
/// All calls are expected from a single frame-loop thread; placement and
/// deployment must not be interleaved with a tick in flight.
pub struct ColonySimulation {
    colony: Colony,
    rng: RngManager,
    systems: Vec<Box<dyn System>>,
    snapshot_writer: SnapshotWriter,
    settings: SimulationSettings,
    tick: u64,
    last_tick_ms: f64,
    pending_placement: Option<BuildingSpec>,
    events: EventQueue,
}

impl ColonySimulation {
    pub fn new(settings: SimulationSettings) -> Self {
        SimulationBuilder::new(settings)
            .with_default_systems()
            .build()
    }

    /// Advance the colony to `now_ms`.
    ///
    /// A clock reading at or before the previous one changes nothing.
    pub fn tick(&mut self, now_ms: f64) -> TickSummary {
        let elapsed_ms = now_ms - self.last_tick_ms;
        if !(elapsed_ms > 0.0) {
            trace!(now_ms, last_tick_ms = self.last_tick_ms, "tick skipped");
            return TickSummary {
                tick: self.tick,
                elapsed_ms: 0.0,
                credits: self.colony.credits(),
                average_eq: self.colony.average_eq(),
                events: Vec::new(),
            };
        }

        self.last_tick_ms = now_ms;
        self.tick += 1;
        let ctx = SystemContext {
            tick: self.tick,
            elapsed_ms,
            hex_size: self.settings.hex_size,
        };
        for system in &mut self.systems {
            trace!(tick = ctx.tick, system = system.name(), "running system");
            system.run(&ctx, &mut self.colony, &mut self.events);
        }

        TickSummary {
            tick: self.tick,
            elapsed_ms,
            credits: self.colony.credits(),
            average_eq: self.colony.average_eq(),
            events: self.events.drain(),
        }
    }

    /// Tick `frames` times, `frame_ms` apart, writing snapshots as configured.
    pub fn run(&mut self, frames: u64, frame_ms: f64) -> Result<()> {
        self.run_with_hook(frames, frame_ms, |_| {})
    }

    pub fn run_with_hook<F>(&mut self, frames: u64, frame_ms: f64, mut hook: F) -> Result<()>
    where
        F: FnMut(&TickSummary),
    {
        for _ in 0..frames {
            let summary = self.tick(self.last_tick_ms + frame_ms);
            if self.snapshot_writer.is_due(summary.elapsed_ms > 0.0, summary.tick) {
                let path = self.snapshot_writer.write(&self.snapshot())?;
                debug!(tick = summary.tick, path = %path.display(), "snapshot written");
            }
            hook(&summary);
        }
        Ok(())
    }

    /// Begin dragging `spec`. Fails when the colony cannot afford it.
    ///
    /// Nothing is charged until the placement is confirmed.
    pub fn start_placement(&mut self, spec: BuildingSpec) -> bool {
        if self.colony.credits() < spec.cost {
            debug!(
                building = %spec.name,
                cost = spec.cost,
                credits = self.colony.credits(),
                "placement rejected: insufficient credits"
            );
            return false;
        }
        self.pending_placement = Some(spec);
        true
    }

    /// Drop the pending building on cell (q, r).
    ///
    /// The pending slot is cleared either way. Returns `None` when nothing was
    /// pending or the cell is taken.
    pub fn confirm_placement(&mut self, q: i32, r: i32) -> Option<Building> {
        let spec = self.pending_placement.take()?;
        let cell = HexCoord::new(q, r);
        if !self.colony.can_place(cell) {
            debug!(building = %spec.name, q, r, "placement rejected: cell occupied");
            return None;
        }

        let building = Building {
            id: BuildingId::from_random_bytes(self.rng.identity_bytes()),
            spec,
            grid_x: q,
            grid_y: r,
            occupants: Vec::new(),
        };
        let credits = self.colony.credits() - building.spec.cost;
        self.colony.set_credits(credits);
        self.colony.insert_building(building.clone());
        info!(
            building = %building.id,
            name = %building.spec.name,
            q,
            r,
            credits,
            "building placed"
        );
        self.events.push(SimEvent::BuildingPlaced {
            building: building.id,
            q,
            r,
        });
        self.events.push(SimEvent::CreditsChanged { credits });
        Some(building)
    }

    pub fn cancel_placement(&mut self) -> Option<BuildingSpec> {
        self.pending_placement.take()
    }

    pub fn pending_placement(&self) -> Option<&BuildingSpec> {
        self.pending_placement.as_ref()
    }

    /// Whether the pending building could be dropped on (q, r); `None` when
    /// nothing is being placed.
    pub fn placement_preview(&self, q: i32, r: i32) -> Option<bool> {
        self.pending_placement
            .as_ref()
            .map(|_| self.colony.can_place(HexCoord::new(q, r)))
    }

    pub fn deploy_villager(&mut self, spec: VillagerSpec) -> VillagerId {
        let id = VillagerId::from_random_bytes(self.rng.identity_bytes());
        let cell = self.spawn_cell();
        let position = cell.to_pixel(self.settings.hex_size);
        let villager = Villager::new(id, spec, position);
        info!(
            villager = %id,
            name = %villager.name,
            role = %villager.role,
            q = cell.q,
            r = cell.r,
            "villager deployed"
        );
        self.colony.insert_villager(villager);
        self.events.push(SimEvent::VillagerDeployed {
            villager: id,
            x: position.x,
            y: position.y,
        });
        id
    }

    fn spawn_cell(&mut self) -> HexCoord {
        match self.settings.deployment {
            DeploymentMode::Center => HexCoord::ORIGIN,
            DeploymentMode::Edge => {
                let viewport = self.settings.viewport;
                let grid_size = (viewport.width.min(viewport.height)
                    / (self.settings.hex_size * 2.0))
                    .floor() as i32;
                if grid_size <= 0 {
                    return HexCoord::ORIGIN;
                }
                let half = grid_size / 2;
                let mut rng = self.rng.stream(DEPLOYMENT_STREAM);
                let along = rng.gen_range(0..grid_size) - half;
                if rng.gen_bool(0.5) {
                    HexCoord::new(along, -half)
                } else {
                    HexCoord::new(-half, along)
                }
            }
        }
    }

    /// Send a villager towards a building's cell. False if either is unknown.
    pub fn move_villager_to_building(&mut self, villager: VillagerId, building: BuildingId) -> bool {
        let hex_size = self.settings.hex_size;
        let destination = match self.colony.building(building) {
            Some(building) => building.cell(),
            None => {
                debug!(%building, "move rejected: unknown building");
                return false;
            }
        };
        let villager = match self.colony.villagers.get_mut(&villager) {
            Some(villager) => villager,
            None => {
                debug!(%villager, "move rejected: unknown villager");
                return false;
            }
        };

        let path = find_path(villager.cell(hex_size), destination);
        let last = path.last().copied().unwrap_or(destination);
        villager.current_target = Some(last.to_pixel(hex_size));
        debug!(villager = %villager.id, q = last.q, r = last.r, "villager moving");
        true
    }

    pub fn remember(&mut self, villager: VillagerId, message: ChatMessage) -> bool {
        self.colony.remember(villager, message)
    }

    pub fn set_colony_name(&mut self, name: impl Into<String>) {
        self.colony.set_name(name);
    }

    pub fn building_at(&self, q: i32, r: i32) -> Option<&Building> {
        self.colony.building_at(HexCoord::new(q, r))
    }

    /// Events queued by placement or deployment since the last tick.
    pub fn drain_events(&mut self) -> Vec<SimEvent> {
        self.events.drain()
    }

    pub fn colony(&self) -> &Colony {
        &self.colony
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    pub fn current_tick(&self) -> u64 {
        self.tick
    }

    pub fn last_tick_ms(&self) -> f64 {
        self.last_tick_ms
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        let mut snapshot = self.colony.snapshot();
        snapshot.tick = self.tick;
        snapshot.pending_placement = self.pending_placement.clone();
        snapshot
    }
}
