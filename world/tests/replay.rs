use theme_park_core::{
    CellKind, Command, Event, GenerationConfig, SimulationConfig, VisitorState,
};
use theme_park_world::{apply, query, Park};

fn small_park() -> GenerationConfig {
    GenerationConfig {
        width: 48,
        height: 32,
        internal_node_count: 20,
        attraction_count: 8,
        seed: Some(0x5eed),
        ..GenerationConfig::default()
    }
}

fn busy_simulation() -> SimulationConfig {
    SimulationConfig {
        spawn_probability: 0.8,
        ..SimulationConfig::default()
    }
}

fn replay(ticks: usize) -> (Park, Vec<Event>) {
    let mut park = Park::new(99);
    let mut events = Vec::new();
    apply(
        &mut park,
        Command::GeneratePark {
            config: small_park(),
        },
        &mut events,
    );
    apply(
        &mut park,
        Command::ConfigureSimulation {
            config: busy_simulation(),
        },
        &mut events,
    );
    for _ in 0..ticks {
        apply(&mut park, Command::Tick, &mut events);
    }
    (park, events)
}

#[test]
fn identical_command_scripts_replay_identically() {
    let (first_park, first_events) = replay(300);
    let (second_park, second_events) = replay(300);

    assert_eq!(first_events, second_events);
    assert_eq!(query::grid(&first_park), query::grid(&second_park));
    assert_eq!(query::visitors(&first_park), query::visitors(&second_park));
}

#[test]
fn generation_seed_overrides_the_park_seed() {
    let mut first = Park::new(1);
    let mut second = Park::new(2);
    let mut events = Vec::new();
    apply(
        &mut first,
        Command::GeneratePark {
            config: small_park(),
        },
        &mut events,
    );
    apply(
        &mut second,
        Command::GeneratePark {
            config: small_park(),
        },
        &mut events,
    );

    assert_eq!(query::grid(&first), query::grid(&second));
    assert_eq!(query::attractions(&first), query::attractions(&second));
}

#[test]
fn long_run_keeps_park_invariants() {
    let mut park = Park::new(4);
    let mut events = Vec::new();
    apply(
        &mut park,
        Command::GeneratePark {
            config: small_park(),
        },
        &mut events,
    );
    apply(
        &mut park,
        Command::ConfigureSimulation {
            config: busy_simulation(),
        },
        &mut events,
    );

    let simulation = query::simulation_config(&park).clone();
    for _ in 0..600 {
        apply(&mut park, Command::Tick, &mut events);

        for attraction in query::attractions(&park) {
            assert!(attraction.riders <= attraction.capacity);
            let slots = query::queue_cells(&park, attraction.id);
            for slot in slots {
                let sharing = query::visitors(&park)
                    .iter()
                    .filter(|visitor| {
                        visitor.state == VisitorState::InQueue && visitor.cell == *slot
                    })
                    .count();
                assert!(sharing <= simulation.visitors_per_queue_cell as usize);
            }
        }

        for visitor in query::visitors(&park) {
            assert!(!visitor.is_departed());
            assert!((0.0..=100.0).contains(&visitor.satisfaction));
            match visitor.state {
                VisitorState::InQueue => {
                    assert_eq!(
                        query::cell_kind(&park, visitor.cell),
                        Some(CellKind::Queue)
                    );
                    assert_eq!(query::cell_owner(&park, visitor.cell), visitor.target);
                }
                VisitorState::Riding => {
                    let attraction = visitor
                        .target
                        .and_then(|id| query::attraction(&park, id))
                        .expect("riders have an attraction");
                    assert_eq!(visitor.cell, attraction.cell);
                }
                VisitorState::Moving | VisitorState::Leaving => {}
            }
        }
    }

    let spawned = events
        .iter()
        .filter(|event| matches!(event, Event::VisitorSpawned { .. }))
        .count();
    let exited = events
        .iter()
        .filter(|event| matches!(event, Event::VisitorExited { .. }))
        .count();
    assert_eq!(spawned - exited, query::visitors(&park).len());
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::RideCompleted { .. })));
}
