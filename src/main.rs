use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::info;
use tracing_subscriber::EnvFilter;

use neocolony::{
    content::{
        buildings_or_fallback, chat_or_fallback, deploy_persona, status_or_fallback,
        villager_or_fallback, ContentGenerator, OfflineContent,
    },
    scenario::ScenarioLoader,
    world::{ChatMessage, ChatRole},
    SimEvent,
};

const GREETING: &str = "How are the domes holding up?";

#[derive(Debug, Parser)]
#[command(author, version, about = "Headless neo-colony runner")]
struct Cli {
    /// Path to the scenario YAML file
    #[arg(long, default_value = "scenarios/terraformed_moon.yaml")]
    scenario: PathBuf,

    /// Override frame count (uses scenario default when omitted)
    #[arg(long)]
    frames: Option<u64>,

    /// Override snapshot interval in ticks
    #[arg(long)]
    snapshot_interval: Option<u64>,

    /// Directory for snapshots
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,

    /// Rename the colony after loading the scenario
    #[arg(long)]
    colony_name: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let loader = ScenarioLoader::new(".");
    let scenario = loader.load(&cli.scenario)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&scenario.logging.level)),
        )
        .init();

    let mut settings = scenario.settings();
    if let Some(interval) = cli.snapshot_interval {
        settings.snapshot_interval_ticks = interval;
    }
    if let Some(dir) = cli.snapshot_dir {
        settings.snapshot_dir = dir;
    }
    let frames = scenario.frames(cli.frames);

    let mut content = OfflineContent::new(scenario.catalog.clone());
    let offer = buildings_or_fallback(content.generate_buildings(
        &scenario.name,
        scenario.theme(),
        &[],
    ));
    info!(
        theme = scenario.theme(),
        offered = offer.len(),
        "building catalog ready"
    );

    let mut sim = neocolony::ColonySimulation::new(settings);
    if let Some(name) = cli.colony_name {
        sim.set_colony_name(name);
    }
    let outcome = scenario.apply_script(&mut sim);

    let mut persona_rng = ChaCha8Rng::seed_from_u64(scenario.seed);
    let persona = villager_or_fallback(
        content.generate_villager(sim.colony().name(), scenario.theme()),
        &mut persona_rng,
    );
    let recruit = deploy_persona(&mut sim, persona);
    info!(villager = %recruit, "recruit deployed");

    if let Some(&first) = outcome.deployed.first() {
        sim.remember(first, ChatMessage::new(first.to_string(), ChatRole::User, GREETING));
        let reply = match (sim.colony().villager(first), sim.colony().villager(recruit)) {
            (Some(initiator), Some(target)) => {
                Some(chat_or_fallback(content.chat(initiator, target, GREETING), target))
            }
            _ => None,
        };
        if let Some(reply) = reply {
            info!(from = %reply.message.sender, "{}", reply.message.content);
            sim.remember(first, reply.message.clone());
            sim.remember(recruit, reply.message);
        }
    }
    info!(
        placed = outcome.placed.len(),
        deployed = outcome.deployed.len(),
        rejected = outcome.rejected,
        "script applied"
    );
    sim.drain_events();

    let mut arrivals = 0usize;
    sim.run_with_hook(frames, scenario.frame_ms, |summary| {
        for event in &summary.events {
            if let SimEvent::VillagerArrived { villager, building } = event {
                arrivals += 1;
                info!(tick = summary.tick, %villager, %building, "arrival");
            }
        }
    })?;

    let snapshot = sim.snapshot();
    for villager in sim.colony().villagers() {
        let report = status_or_fallback(content.status_report(villager, &snapshot));
        info!(
            villager = %villager.name,
            mood = ?report.mood,
            insights = ?report.insights,
            "{}",
            report.status
        );
    }

    println!(
        "Colony '{}' ran {} frames: {} buildings, {} villagers, {} arrivals, credits {:.0}, average EQ {:.1}",
        sim.colony().name(),
        frames,
        sim.colony().building_count(),
        sim.colony().villager_count(),
        arrivals,
        sim.colony().credits(),
        sim.colony().average_eq()
    );
    Ok(())
}
