use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::hex::{HexCoord, Pixel};

pub const DEFAULT_EQ: f64 = 50.0;
pub const MIN_EQ: f64 = 0.0;
pub const MAX_EQ: f64 = 100.0;
pub const DEFAULT_VILLAGER_NAME: &str = "Drone";

macro_rules! opaque_id {
    ($name:ident) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            pub(crate) fn from_random_bytes(bytes: [u8; 16]) -> Self {
                Self(uuid::Builder::from_random_bytes(bytes).into_uuid())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

opaque_id!(BuildingId);
opaque_id!(VillagerId);

/// Unplaced building template handed over by the content generator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BuildingSpec {
    pub name: String,
    pub cost: f64,
    #[serde(alias = "eqImpact")]
    pub eq_impact: i32,
    pub sprite: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Building {
    pub id: BuildingId,
    #[serde(flatten)]
    pub spec: BuildingSpec,
    pub grid_x: i32,
    pub grid_y: i32,
    pub occupants: Vec<VillagerId>,
}

impl Building {
    pub fn cell(&self) -> HexCoord {
        HexCoord::new(self.grid_x, self.grid_y)
    }

    /// Returns false when the villager was already an occupant.
    pub fn add_occupant(&mut self, villager: VillagerId) -> bool {
        if self.occupants.contains(&villager) {
            return false;
        }
        self.occupants.push(villager);
        true
    }
}

/// Persona for a villager about to be deployed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VillagerSpec {
    #[serde(default)]
    pub name: Option<String>,
    pub role: String,
    #[serde(default)]
    pub traits: Vec<String>,
    #[serde(default)]
    pub eq: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub sender: String,
    pub role: ChatRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: impl Into<String>, role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            sender: sender.into(),
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Villager {
    pub id: VillagerId,
    pub name: String,
    pub role: String,
    pub traits: Vec<String>,
    eq: f64,
    pub position: Pixel,
    #[serde(default)]
    pub current_target: Option<Pixel>,
    #[serde(default)]
    memory: Vec<ChatMessage>,
}

impl Villager {
    pub(crate) fn new(id: VillagerId, spec: VillagerSpec, position: Pixel) -> Self {
        Self {
            id,
            name: spec
                .name
                .unwrap_or_else(|| DEFAULT_VILLAGER_NAME.to_string()),
            role: spec.role,
            traits: spec.traits,
            eq: clamp_eq(spec.eq.unwrap_or(DEFAULT_EQ)),
            position,
            current_target: None,
            memory: Vec::new(),
        }
    }

    pub fn eq(&self) -> f64 {
        self.eq
    }

    /// Shift EQ by `delta`, clamped to [0, 100].
    pub fn adjust_eq(&mut self, delta: f64) {
        self.eq = clamp_eq(self.eq + delta);
    }

    pub fn is_moving(&self) -> bool {
        self.current_target.is_some()
    }

    pub fn cell(&self, hex_size: f64) -> HexCoord {
        self.position.to_hex(hex_size)
    }

    pub fn memory(&self) -> &[ChatMessage] {
        &self.memory
    }

    /// Last `limit` messages sent by either `a` or `b`, oldest first.
    pub fn conversation_window(&self, a: &str, b: &str, limit: usize) -> Vec<&ChatMessage> {
        let exchanged: Vec<&ChatMessage> = self
            .memory
            .iter()
            .filter(|m| m.sender == a || m.sender == b)
            .collect();
        let skip = exchanged.len().saturating_sub(limit);
        exchanged.into_iter().skip(skip).collect()
    }

    pub(crate) fn remember(&mut self, message: ChatMessage) {
        self.memory.push(message);
    }
}

fn clamp_eq(value: f64) -> f64 {
    if value.is_nan() {
        return DEFAULT_EQ;
    }
    value.clamp(MIN_EQ, MAX_EQ)
}

/// True iff no building occupies (q, r).
pub fn can_place(q: i32, r: i32, buildings: &HashMap<BuildingId, Building>) -> bool {
    !buildings
        .values()
        .any(|building| building.grid_x == q && building.grid_y == r)
}

/// Aggregate root for a single colony.
pub struct Colony {
    name: String,
    credits: f64,
    average_eq: f64,
    pub(crate) buildings: HashMap<BuildingId, Building>,
    pub(crate) villagers: HashMap<VillagerId, Villager>,
}

impl Colony {
    pub fn new(name: impl Into<String>, starting_credits: f64) -> Self {
        Self {
            name: name.into(),
            credits: starting_credits,
            average_eq: DEFAULT_EQ,
            buildings: HashMap::new(),
            villagers: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn credits(&self) -> f64 {
        self.credits
    }

    pub(crate) fn set_credits(&mut self, credits: f64) {
        self.credits = credits;
    }

    pub fn average_eq(&self) -> f64 {
        self.average_eq
    }

    pub(crate) fn set_average_eq(&mut self, average_eq: f64) {
        self.average_eq = average_eq;
    }

    pub fn can_place(&self, cell: HexCoord) -> bool {
        can_place(cell.q, cell.r, &self.buildings)
    }

    /// Callers must have checked `can_place` for the building's cell.
    pub(crate) fn insert_building(&mut self, building: Building) {
        debug_assert!(
            self.can_place(building.cell()),
            "cell {:?} already holds a building",
            building.cell()
        );
        self.buildings.insert(building.id, building);
    }

    pub(crate) fn insert_villager(&mut self, villager: Villager) {
        self.villagers.insert(villager.id, villager);
    }

    pub fn building(&self, id: BuildingId) -> Option<&Building> {
        self.buildings.get(&id)
    }

    pub fn building_at(&self, cell: HexCoord) -> Option<&Building> {
        self.buildings.values().find(|b| b.cell() == cell)
    }

    pub(crate) fn building_at_mut(&mut self, cell: HexCoord) -> Option<&mut Building> {
        self.buildings.values_mut().find(|b| b.cell() == cell)
    }

    pub fn buildings(&self) -> impl Iterator<Item = &Building> {
        self.buildings.values()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn villager(&self, id: VillagerId) -> Option<&Villager> {
        self.villagers.get(&id)
    }

    pub fn villagers(&self) -> impl Iterator<Item = &Villager> {
        self.villagers.values()
    }

    pub fn villager_count(&self) -> usize {
        self.villagers.len()
    }

    pub fn villager_ids(&self) -> Vec<VillagerId> {
        let mut ids: Vec<_> = self.villagers.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Append a chat message to a villager's memory. False if the villager is unknown.
    pub fn remember(&mut self, villager: VillagerId, message: ChatMessage) -> bool {
        match self.villagers.get_mut(&villager) {
            Some(v) => {
                v.remember(message);
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> ColonySnapshot {
        let mut buildings: Vec<Building> = self.buildings.values().cloned().collect();
        buildings.sort_by_key(|b| (b.grid_x, b.grid_y));
        let mut villagers: Vec<Villager> = self.villagers.values().cloned().collect();
        villagers.sort_by_key(|v| v.id);
        ColonySnapshot {
            name: self.name.clone(),
            tick: 0,
            credits: self.credits,
            average_eq: self.average_eq,
            pending_placement: None,
            buildings,
            villagers,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColonySnapshot {
    pub name: String,
    pub tick: u64,
    pub credits: f64,
    pub average_eq: f64,
    pub pending_placement: Option<BuildingSpec>,
    pub buildings: Vec<Building>,
    pub villagers: Vec<Villager>,
}
