use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::{
    content::DEFAULT_THEME,
    engine::{
        ColonySimulation, DeploymentMode, SimulationSettings, Viewport, DEFAULT_HEX_SIZE,
        DEFAULT_STARTING_CREDITS,
    },
    world::{BuildingId, BuildingSpec, VillagerId, VillagerSpec},
};

fn default_starting_credits() -> f64 {
    DEFAULT_STARTING_CREDITS
}

fn default_hex_size() -> f64 {
    DEFAULT_HEX_SIZE
}

fn default_frame_ms() -> f64 {
    16.0
}

fn default_log_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct Scenario {
    pub name: String,
    #[serde(default)]
    pub theme: Option<String>,
    pub seed: u64,
    #[serde(default = "default_starting_credits")]
    pub starting_credits: f64,
    #[serde(default = "default_hex_size")]
    pub hex_size: f64,
    #[serde(default)]
    pub viewport: Viewport,
    #[serde(default)]
    pub deployment: DeploymentMode,
    #[serde(default = "default_frame_ms")]
    pub frame_ms: f64,
    #[serde(default)]
    pub frames: Option<u64>,
    #[serde(default)]
    pub snapshot_interval_ticks: u64,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub catalog: Vec<BuildingSpec>,
    #[serde(default)]
    pub script: Vec<ScriptAction>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One scripted UI action. Indices refer to the catalog, to earlier
/// successful placements, and to earlier deployments respectively.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptAction {
    Place { building: usize, q: i32, r: i32 },
    Deploy(VillagerSpec),
    Move { villager: usize, building: usize },
}

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("hex_size must be a positive number, got {0}")]
    HexSize(f64),
    #[error("viewport must have a positive width and height")]
    Viewport,
    #[error("frame_ms must be a finite, non-negative number, got {0}")]
    FrameMs(f64),
    #[error("script step {step} places catalog entry {index}, but the catalog has {len}")]
    UnknownCatalogEntry { step: usize, index: usize, len: usize },
    #[error("script step {step} refers to {what} {index}, but only {available} precede it")]
    ForwardReference {
        step: usize,
        what: &'static str,
        index: usize,
        available: usize,
    },
}

#[derive(Debug, Default)]
pub struct ScriptOutcome {
    pub placed: Vec<BuildingId>,
    pub deployed: Vec<VillagerId>,
    pub rejected: usize,
}

pub struct ScenarioLoader {
    base_dir: PathBuf,
}

impl ScenarioLoader {
    pub fn new(base_dir: impl AsRef<Path>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
        }
    }

    pub fn load(&self, file: impl AsRef<Path>) -> Result<Scenario> {
        let path = self.base_dir.join(file);
        let data = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read scenario file {}", path.display()))?;
        let scenario = Scenario::from_yaml(&data)
            .with_context(|| format!("Failed to load {}", path.display()))?;
        Ok(scenario)
    }
}

impl Scenario {
    pub fn from_yaml(text: &str) -> Result<Self> {
        let scenario: Scenario = serde_yaml::from_str(text)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn validate(&self) -> Result<(), ScenarioError> {
        if !(self.hex_size > 0.0) || !self.hex_size.is_finite() {
            return Err(ScenarioError::HexSize(self.hex_size));
        }
        if !(self.viewport.width > 0.0 && self.viewport.height > 0.0) {
            return Err(ScenarioError::Viewport);
        }
        if !(self.frame_ms >= 0.0) || !self.frame_ms.is_finite() {
            return Err(ScenarioError::FrameMs(self.frame_ms));
        }

        let mut placements = 0;
        let mut deployments = 0;
        for (step, action) in self.script.iter().enumerate() {
            match action {
                ScriptAction::Place { building, .. } => {
                    if *building >= self.catalog.len() {
                        return Err(ScenarioError::UnknownCatalogEntry {
                            step,
                            index: *building,
                            len: self.catalog.len(),
                        });
                    }
                    placements += 1;
                }
                ScriptAction::Deploy(_) => deployments += 1,
                ScriptAction::Move { villager, building } => {
                    if *villager >= deployments {
                        return Err(ScenarioError::ForwardReference {
                            step,
                            what: "villager",
                            index: *villager,
                            available: deployments,
                        });
                    }
                    if *building >= placements {
                        return Err(ScenarioError::ForwardReference {
                            step,
                            what: "building",
                            index: *building,
                            available: placements,
                        });
                    }
                }
            }
        }
        Ok(())
    }

    pub fn theme(&self) -> &str {
        self.theme.as_deref().unwrap_or(DEFAULT_THEME)
    }

    pub fn frames(&self, override_frames: Option<u64>) -> u64 {
        override_frames.or(self.frames).unwrap_or(600)
    }

    pub fn settings(&self) -> SimulationSettings {
        SimulationSettings {
            colony_name: self.name.clone(),
            seed: self.seed,
            starting_credits: self.starting_credits,
            hex_size: self.hex_size,
            viewport: self.viewport,
            deployment: self.deployment,
            snapshot_interval_ticks: self.snapshot_interval_ticks,
            ..SimulationSettings::default()
        }
    }

    pub fn build_simulation(&self) -> ColonySimulation {
        ColonySimulation::new(self.settings())
    }

    /// Play the script against `sim`. Rejected placements and moves are
    /// counted rather than treated as errors.
    pub fn apply_script(&self, sim: &mut ColonySimulation) -> ScriptOutcome {
        let mut outcome = ScriptOutcome::default();
        for action in &self.script {
            match action {
                ScriptAction::Place { building, q, r } => {
                    let placed = match self.catalog.get(*building) {
                        Some(spec) if sim.start_placement(spec.clone()) => {
                            sim.confirm_placement(*q, *r)
                        }
                        _ => None,
                    };
                    match placed {
                        Some(building) => outcome.placed.push(building.id),
                        None => outcome.rejected += 1,
                    }
                }
                ScriptAction::Deploy(spec) => {
                    outcome.deployed.push(sim.deploy_villager(spec.clone()));
                }
                ScriptAction::Move { villager, building } => {
                    let moved = match (outcome.deployed.get(*villager), outcome.placed.get(*building)) {
                        (Some(v), Some(b)) => sim.move_villager_to_building(*v, *b),
                        _ => false,
                    };
                    if !moved {
                        debug!(villager, building, "scripted move skipped");
                        outcome.rejected += 1;
                    }
                }
            }
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
name: Outpost
seed: 3
catalog:
  - name: Solar Array
    cost: 200
    eq_impact: 1
    sprite: building-placeholder-blue
script:
  - action: place
    building: 0
    q: 0
    r: 0
  - action: deploy
    role: Engineer
    traits: [curious]
  - action: move
    villager: 0
    building: 0
"#;

    #[test]
    fn defaults_fill_in() {
        let scenario = Scenario::from_yaml(MINIMAL).unwrap();
        assert_eq!(scenario.starting_credits, 1000.0);
        assert_eq!(scenario.hex_size, 40.0);
        assert_eq!(scenario.deployment, DeploymentMode::Edge);
        assert_eq!(scenario.logging.level, "info");
        assert_eq!(scenario.theme(), DEFAULT_THEME);
        assert_eq!(scenario.frames(None), 600);
        assert_eq!(scenario.frames(Some(5)), 5);
        assert_eq!(scenario.script.len(), 3);
    }

    #[test]
    fn rejects_forward_references() {
        let text = MINIMAL.replace("villager: 0", "villager: 2");
        let err = Scenario::from_yaml(&text).unwrap_err();
        let err = err.downcast::<ScenarioError>().unwrap();
        assert!(matches!(
            err,
            ScenarioError::ForwardReference { what: "villager", index: 2, .. }
        ));
    }

    #[test]
    fn rejects_bad_hex_size() {
        let text = format!("{MINIMAL}hex_size: 0\n");
        let err = Scenario::from_yaml(&text).unwrap_err();
        assert!(matches!(
            err.downcast::<ScenarioError>().unwrap(),
            ScenarioError::HexSize(_)
        ));
    }

    #[test]
    fn script_counts_rejections() {
        let text = MINIMAL.replace("    q: 0\n    r: 0\n", "    q: 0\n    r: 0\n  - action: place\n    building: 0\n    q: 0\n    r: 0\n");
        let scenario = Scenario::from_yaml(&text).unwrap();
        let mut sim = scenario.build_simulation();
        let outcome = scenario.apply_script(&mut sim);
        assert_eq!(outcome.placed.len(), 1);
        assert_eq!(outcome.deployed.len(), 1);
        assert_eq!(outcome.rejected, 1);
        assert_eq!(sim.colony().credits(), 800.0);
    }
}
