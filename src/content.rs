//! Boundary with the content-generation service.
//!
//! The engine never calls a generator. The application asks for building
//! offers, status reports and chat replies, then feeds the results back in
//! through placement, deployment and `remember`.

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    engine::ColonySimulation,
    systems::hourly_rate,
    world::{BuildingSpec, ChatMessage, ChatRole, ColonySnapshot, Villager, VillagerId, VillagerSpec},
};

pub const DEFAULT_THEME: &str = "Neo-Colony on a terraformed moon";
/// Prior messages a chat reply may draw on.
pub const CHAT_HISTORY_LIMIT: usize = 10;
const BUILDINGS_PER_OFFER: usize = 3;
const CHAT_APOLOGY: &str = "I apologize, but I cannot respond at the moment.";

/// Offline roster: name, role and traits.
const ROSTER: [(&str, &str, [&str; 2]); 4] = [
    ("Mara Quill", "Botanist", ["patient", "curious"]),
    ("Teodor Vance", "Engineer", ["precise", "blunt"]),
    ("Sunniva Hale", "Medic", ["calm", "empathetic"]),
    ("Rafi Osei", "Geologist", ["stubborn", "cheerful"]),
];

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("content service unavailable: {0}")]
    Unavailable(String),
    #[error("malformed content response: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mood {
    Positive,
    Neutral,
    Negative,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReport {
    pub status: String,
    pub mood: Mood,
    pub insights: Vec<String>,
}

impl StatusReport {
    pub fn fallback() -> Self {
        Self {
            status: "Error generating status report".to_string(),
            mood: Mood::Neutral,
            insights: vec!["System malfunction".to_string()],
        }
    }
}

/// A generated colonist and the line they greet the colony with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VillagerPersona {
    #[serde(flatten)]
    pub spec: VillagerSpec,
    pub introduction: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub message: ChatMessage,
    pub updated_memory: Vec<ChatMessage>,
}

pub trait ContentGenerator {
    fn generate_buildings(
        &mut self,
        colony_name: &str,
        theme: &str,
        existing: &[BuildingSpec],
    ) -> Result<Vec<BuildingSpec>, ContentError>;

    fn generate_villager(
        &mut self,
        colony_name: &str,
        theme: &str,
    ) -> Result<VillagerPersona, ContentError>;

    fn status_report(
        &mut self,
        villager: &Villager,
        colony: &ColonySnapshot,
    ) -> Result<StatusReport, ContentError>;

    fn chat(
        &mut self,
        initiator: &Villager,
        target: &Villager,
        message: &str,
    ) -> Result<ChatReply, ContentError>;
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    buildings: Vec<BuildingSpec>,
}

/// Parse a `{ "buildings": [...] }` payload. A missing list means no offer.
pub fn parse_buildings(json: &str) -> Result<Vec<BuildingSpec>, ContentError> {
    let response: GenerateResponse = serde_json::from_str(json)?;
    Ok(response.buildings)
}

/// Offer from a generator, or nothing if it failed.
pub fn buildings_or_fallback(result: Result<Vec<BuildingSpec>, ContentError>) -> Vec<BuildingSpec> {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "building generation failed");
        Vec::new()
    })
}

/// Generated persona, or a generic colonist if generation failed.
pub fn villager_or_fallback<R: Rng>(
    result: Result<VillagerPersona, ContentError>,
    rng: &mut R,
) -> VillagerPersona {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "villager generation failed");
        let name = format!("Colonist-{}", rng.gen_range(0..1000));
        VillagerPersona {
            introduction: format!("Hello, I'm {name}. I've arrived to help with the colony."),
            spec: VillagerSpec {
                name: Some(name),
                role: "Colonist".to_string(),
                traits: vec!["Adaptable".to_string(), "Resourceful".to_string()],
                eq: Some(f64::from(rng.gen_range(40u32..80))),
            },
        }
    })
}

/// Reply, or an apology from `target` that leaves its memory untouched.
pub fn chat_or_fallback(result: Result<ChatReply, ContentError>, target: &Villager) -> ChatReply {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, villager = %target.id, "chat failed");
        ChatReply {
            message: ChatMessage::new(target.id.to_string(), ChatRole::Assistant, CHAT_APOLOGY),
            updated_memory: target.memory().to_vec(),
        }
    })
}

/// Deploy a persona and file its introduction in its own memory.
pub fn deploy_persona(sim: &mut ColonySimulation, persona: VillagerPersona) -> VillagerId {
    let id = sim.deploy_villager(persona.spec);
    sim.remember(
        id,
        ChatMessage::new(id.to_string(), ChatRole::Assistant, persona.introduction),
    );
    id
}

pub fn status_or_fallback(result: Result<StatusReport, ContentError>) -> StatusReport {
    result.unwrap_or_else(|err| {
        tracing::warn!(error = %err, "status report failed");
        StatusReport::fallback()
    })
}

pub fn mood_for_eq(eq: f64) -> Mood {
    if eq >= 60.0 {
        Mood::Positive
    } else if eq < 40.0 {
        Mood::Negative
    } else {
        Mood::Neutral
    }
}

/// Generator backed by a fixed catalog, for running without the service.
pub struct OfflineContent {
    catalog: Vec<BuildingSpec>,
    recruited: usize,
}

impl OfflineContent {
    pub fn new(catalog: Vec<BuildingSpec>) -> Self {
        Self {
            catalog,
            recruited: 0,
        }
    }
}

impl ContentGenerator for OfflineContent {
    fn generate_buildings(
        &mut self,
        _colony_name: &str,
        _theme: &str,
        existing: &[BuildingSpec],
    ) -> Result<Vec<BuildingSpec>, ContentError> {
        Ok(self
            .catalog
            .iter()
            .filter(|spec| !existing.iter().any(|e| e.name == spec.name))
            .take(BUILDINGS_PER_OFFER)
            .cloned()
            .collect())
    }

    fn generate_villager(
        &mut self,
        colony_name: &str,
        _theme: &str,
    ) -> Result<VillagerPersona, ContentError> {
        let (name, role, traits) = ROSTER[self.recruited % ROSTER.len()];
        let round = self.recruited / ROSTER.len();
        self.recruited += 1;

        let name = if round == 0 {
            name.to_string()
        } else {
            format!("{name} {}", round + 1)
        };
        Ok(VillagerPersona {
            introduction: format!("Hello, I'm {name}. I've arrived at {colony_name}."),
            spec: VillagerSpec {
                name: Some(name),
                role: role.to_string(),
                traits: traits.iter().map(|t| t.to_string()).collect(),
                eq: None,
            },
        })
    }

    fn status_report(
        &mut self,
        villager: &Villager,
        colony: &ColonySnapshot,
    ) -> Result<StatusReport, ContentError> {
        let net_hourly: f64 = colony
            .buildings
            .iter()
            .map(|b| hourly_rate(b.spec.cost))
            .sum();
        let draining = colony
            .buildings
            .iter()
            .filter(|b| b.spec.eq_impact < 0)
            .count();

        let mut insights = Vec::new();
        if net_hourly < 0.0 {
            insights.push(format!("Upkeep outpaces income by {:.1} credits/h", -net_hourly));
        } else {
            insights.push(format!("Income covers upkeep with {:.1} credits/h to spare", net_hourly));
        }
        if draining > 0 {
            insights.push(format!("{draining} structure(s) are wearing on morale"));
        }

        Ok(StatusReport {
            status: format!(
                "{} the {} reporting from {}: {} structures online, colony EQ {:.0}.",
                villager.name,
                villager.role,
                colony.name,
                colony.buildings.len(),
                colony.average_eq
            ),
            mood: mood_for_eq(villager.eq()),
            insights,
        })
    }

    fn chat(
        &mut self,
        initiator: &Villager,
        target: &Villager,
        message: &str,
    ) -> Result<ChatReply, ContentError> {
        let target_id = target.id.to_string();
        let initiator_id = initiator.id.to_string();
        let history =
            initiator.conversation_window(&initiator_id, &target_id, CHAT_HISTORY_LIMIT);
        let opener = match mood_for_eq(target.eq()) {
            Mood::Positive => "Happy to help",
            Mood::Neutral => "Understood",
            Mood::Negative => "If I must",
        };
        let content = if history.is_empty() {
            format!("{opener}, {}. You said: \"{message}\"", initiator.name)
        } else {
            format!("{opener}. Picking up where we left off: \"{message}\"")
        };

        let reply = ChatMessage::new(target_id, ChatRole::Assistant, content);
        let mut updated_memory = target.memory().to_vec();
        updated_memory.push(reply.clone());
        Ok(ChatReply {
            message: reply,
            updated_memory,
        })
    }
}
