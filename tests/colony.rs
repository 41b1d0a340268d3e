use neocolony::{
    engine::{ColonySimulation, DeploymentMode, SimulationSettings},
    hex::{hex_to_pixel, HexCoord, Pixel},
    systems::average_eq,
    BuildingSpec, SimEvent, VillagerSpec,
};

const HOUR_MS: f64 = 3_600_000.0;

fn settings() -> SimulationSettings {
    SimulationSettings {
        colony_name: "Tycho Reach".into(),
        seed: 5,
        deployment: DeploymentMode::Center,
        ..SimulationSettings::default()
    }
}

fn spec(name: &str, cost: f64, eq_impact: i32) -> BuildingSpec {
    BuildingSpec {
        name: name.into(),
        cost,
        eq_impact,
        sprite: "building-placeholder-blue".into(),
        description: None,
    }
}

fn worker() -> VillagerSpec {
    VillagerSpec {
        role: "Worker".into(),
        traits: vec!["diligent".into()],
        ..VillagerSpec::default()
    }
}

fn place(sim: &mut ColonySimulation, spec: BuildingSpec, q: i32, r: i32) -> neocolony::Building {
    assert!(sim.start_placement(spec));
    sim.confirm_placement(q, r).expect("cell should be free")
}

#[test]
fn upkeep_drains_five_credits_per_hour_for_a_500_building() {
    let mut sim = ColonySimulation::new(settings());
    place(&mut sim, spec("Fusion Relay", 500.0, 0), 0, 0);
    assert_eq!(sim.colony().credits(), 500.0);

    let summary = sim.tick(HOUR_MS);
    assert!((sim.colony().credits() - 495.0).abs() < 1e-9);
    assert_eq!(summary.elapsed_ms, HOUR_MS);
}

#[test]
fn income_structure_earns_ten_credits_per_hour() {
    let mut sim = ColonySimulation::new(settings());
    place(&mut sim, spec("Ice Mine", -200.0, 0), 1, 1);
    assert_eq!(sim.colony().credits(), 1200.0);

    sim.tick(HOUR_MS);
    assert!((sim.colony().credits() - 1210.0).abs() < 1e-9);
}

#[test]
fn non_positive_elapsed_is_a_no_op() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 8), 3, 0);
    let villager = sim.deploy_villager(worker());
    assert!(sim.move_villager_to_building(villager, building.id));
    sim.tick(1_000.0);

    let credits = sim.colony().credits();
    let position = sim.colony().villager(villager).unwrap().position;
    let eq = sim.colony().villager(villager).unwrap().eq();

    for now in [1_000.0, 500.0, -10.0, f64::NAN] {
        let summary = sim.tick(now);
        assert!(summary.events.is_empty());
        assert_eq!(summary.elapsed_ms, 0.0);
    }

    assert_eq!(sim.colony().credits(), credits);
    assert_eq!(sim.colony().villager(villager).unwrap().position, position);
    assert_eq!(sim.colony().villager(villager).unwrap().eq(), eq);
    assert_eq!(sim.current_tick(), 1);
    assert_eq!(sim.last_tick_ms(), 1_000.0);
}

#[test]
fn placement_requires_credits_and_leaves_them_untouched() {
    let mut sim = ColonySimulation::new(settings());
    assert!(!sim.start_placement(spec("Orbital Elevator", 1_500.0, 10)));
    assert_eq!(sim.colony().credits(), 1000.0);
    assert!(sim.pending_placement().is_none());
    assert!(sim.confirm_placement(0, 0).is_none());
    assert_eq!(sim.colony().building_count(), 0);
}

#[test]
fn start_placement_does_not_charge() {
    let mut sim = ColonySimulation::new(settings());
    assert!(sim.start_placement(spec("Commons", 300.0, 4)));
    assert_eq!(sim.colony().credits(), 1000.0);
    assert_eq!(sim.placement_preview(0, 0), Some(true));

    let cancelled = sim.cancel_placement().unwrap();
    assert_eq!(cancelled.name, "Commons");
    assert_eq!(sim.placement_preview(0, 0), None);
    assert!(sim.confirm_placement(0, 0).is_none());
    assert_eq!(sim.colony().credits(), 1000.0);
}

#[test]
fn one_building_per_cell() {
    let mut sim = ColonySimulation::new(settings());
    let first = place(&mut sim, spec("Commons", 100.0, 4), 2, -1);

    assert!(sim.start_placement(spec("Lounge", 100.0, 6)));
    assert_eq!(sim.placement_preview(2, -1), Some(false));
    assert!(sim.confirm_placement(2, -1).is_none());
    assert!(sim.pending_placement().is_none(), "slot clears on a failed drop");
    assert_eq!(sim.colony().credits(), 900.0);
    assert_eq!(sim.colony().building_count(), 1);
    assert_eq!(sim.building_at(2, -1).map(|b| b.id), Some(first.id));

    let second = place(&mut sim, spec("Lounge", 100.0, 6), -2, 1);
    assert_ne!(first.id, second.id);

    let mut cells: Vec<_> = sim.colony().buildings().map(|b| b.cell()).collect();
    cells.sort();
    cells.dedup();
    assert_eq!(cells.len(), sim.colony().building_count());
}

#[test]
fn placement_events_are_queued() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 250.0, 4), 0, 1);
    let villager = sim.deploy_villager(worker());

    let events = sim.drain_events();
    assert_eq!(
        events[0],
        SimEvent::BuildingPlaced {
            building: building.id,
            q: 0,
            r: 1
        }
    );
    assert_eq!(events[1], SimEvent::CreditsChanged { credits: 750.0 });
    assert!(matches!(
        events[2],
        SimEvent::VillagerDeployed { villager: v, .. } if v == villager
    ));
    assert!(sim.drain_events().is_empty());
}

#[test]
fn nearby_target_arrives_in_one_tick_and_fires_once() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 8), 0, 0);
    let villager = sim.deploy_villager(worker());
    assert!(sim.move_villager_to_building(villager, building.id));
    sim.drain_events();

    let summary = sim.tick(0.001);
    let arrivals: Vec<_> = summary
        .events
        .iter()
        .filter(|e| matches!(e, SimEvent::VillagerArrived { .. }))
        .collect();
    assert_eq!(arrivals.len(), 1);
    assert_eq!(
        *arrivals[0],
        SimEvent::VillagerArrived {
            villager,
            building: building.id
        }
    );

    let v = sim.colony().villager(villager).unwrap();
    assert!(!v.is_moving());
    assert!((v.eq() - 50.8).abs() < 1e-9, "arrival adds impact / 10");
    assert_eq!(sim.colony().building(building.id).unwrap().occupants, vec![villager]);

    for frame in 1..=5 {
        let summary = sim.tick(0.001 + frame as f64 * 16.0);
        assert!(!summary
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::VillagerArrived { .. })));
    }
    assert!((sim.colony().villager(villager).unwrap().eq() - 50.8).abs() < 1e-9);
}

#[test]
fn second_visit_does_not_duplicate_occupant() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 5), 0, 0);
    let villager = sim.deploy_villager(worker());

    for now in [10.0, 20.0] {
        assert!(sim.move_villager_to_building(villager, building.id));
        sim.tick(now);
    }
    assert_eq!(sim.colony().building(building.id).unwrap().occupants.len(), 1);
    assert!((sim.colony().villager(villager).unwrap().eq() - 51.0).abs() < 1e-9);
}

#[test]
fn villager_walks_to_a_distant_building() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 4), 2, 0);
    let villager = sim.deploy_villager(worker());
    assert!(sim.move_villager_to_building(villager, building.id));
    let target = hex_to_pixel(2, 0, 40.0);

    let summary = sim.tick(100.0);
    let v = sim.colony().villager(villager).unwrap();
    assert!((v.position.distance(Pixel::default()) - 10.0).abs() < 1e-9);
    assert!(v.is_moving());
    assert!(v.eq() > 50.0, "a positive building nearby lifts EQ while walking");
    assert!(summary
        .events
        .iter()
        .any(|e| matches!(e, SimEvent::VillagerMoved { .. })));

    let mut arrived_at = None;
    let mut now = 100.0;
    for _ in 0..200 {
        now += 16.0;
        let summary = sim.tick(now);
        if summary
            .events
            .iter()
            .any(|e| matches!(e, SimEvent::VillagerArrived { .. }))
        {
            arrived_at = Some(summary.tick);
            break;
        }
    }
    assert!(arrived_at.is_some(), "villager should reach the building");
    assert_eq!(sim.colony().villager(villager).unwrap().position, target);
    assert_eq!(
        sim.colony().villager(villager).unwrap().cell(40.0),
        HexCoord::new(2, 0)
    );
}

#[test]
fn unknown_identities_are_rejected() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 4), 0, 0);
    let villager = sim.deploy_villager(worker());

    let mut other = ColonySimulation::new(SimulationSettings {
        seed: 99,
        ..settings()
    });
    let foreign_building = place(&mut other, spec("Commons", 100.0, 4), 0, 0);
    let foreign_villager = other.deploy_villager(worker());

    assert!(!sim.move_villager_to_building(foreign_villager, building.id));
    assert!(!sim.move_villager_to_building(villager, foreign_building.id));
    assert!(!sim.colony().villager(villager).unwrap().is_moving());
}

#[test]
fn tick_order_emits_credits_then_motion_then_eq() {
    let mut sim = ColonySimulation::new(settings());
    let building = place(&mut sim, spec("Commons", 100.0, 4), 3, 0);
    let villager = sim.deploy_villager(worker());
    sim.move_villager_to_building(villager, building.id);
    sim.drain_events();

    let events = sim.tick(16.0).events;
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], SimEvent::CreditsChanged { .. }));
    assert!(matches!(events[1], SimEvent::VillagerMoved { .. }));
    assert!(matches!(events[2], SimEvent::EqChanged { .. }));
}

#[test]
fn average_eq_defaults_to_fifty() {
    let mut sim = ColonySimulation::new(settings());
    assert_eq!(average_eq(sim.colony().villagers()), 50.0);
    let summary = sim.tick(16.0);
    assert_eq!(summary.average_eq, 50.0);
    assert!(summary
        .events
        .contains(&SimEvent::EqChanged { average_eq: 50.0 }));
}

#[test]
fn supplied_eq_is_clamped_and_averaged() {
    let mut sim = ColonySimulation::new(settings());
    sim.deploy_villager(VillagerSpec {
        eq: Some(250.0),
        ..worker()
    });
    sim.deploy_villager(VillagerSpec {
        eq: Some(-20.0),
        ..worker()
    });
    sim.tick(16.0);
    assert_eq!(sim.colony().average_eq(), 50.0);
    let mut eqs: Vec<_> = sim.colony().villagers().map(|v| v.eq()).collect();
    eqs.sort_by(|a, b| a.total_cmp(b));
    assert_eq!(eqs, vec![0.0, 100.0]);
}

#[test]
fn snapshot_reflects_pending_placement() {
    let mut sim = ColonySimulation::new(settings());
    sim.start_placement(spec("Lounge", 100.0, 6));
    sim.tick(16.0);
    let snapshot = sim.snapshot();
    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.name, "Tycho Reach");
    assert_eq!(
        snapshot.pending_placement.as_ref().map(|s| s.name.as_str()),
        Some("Lounge")
    );
}

#[test]
fn far_flung_building_does_not_break_ticks() {
    let mut sim = ColonySimulation::new(settings());
    let near = place(&mut sim, spec("Commons", 100.0, 4), 5, 0);
    place(&mut sim, spec("Beacon", 100.0, -6), i32::MIN, 0);
    let villager = sim.deploy_villager(worker());
    assert!(sim.move_villager_to_building(villager, near.id));

    let summary = sim.tick(16.0);
    assert_eq!(summary.tick, 1);
    let v = sim.colony().villager(villager).unwrap();
    assert!(v.is_moving());
    assert_eq!(v.eq(), 50.0, "both buildings are out of range");
}

#[test]
fn renamed_colony_shows_in_snapshot() {
    let mut sim = ColonySimulation::new(settings());
    sim.set_colony_name("Mare Imbrium");
    assert_eq!(sim.colony().name(), "Mare Imbrium");
    assert_eq!(sim.snapshot().name, "Mare Imbrium");
}
