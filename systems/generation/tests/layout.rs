use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use theme_park_core::{CellCoord, CellKind, GenerationConfig, Grid};
use theme_park_system_generation::generate;
use theme_park_system_pathfinding::PathFinder;

fn compact_config() -> GenerationConfig {
    GenerationConfig {
        width: 48,
        height: 30,
        entry_count: 2,
        internal_node_count: 40,
        attraction_count: 8,
        ..GenerationConfig::default()
    }
}

fn generate_seeded(config: &GenerationConfig, seed: u64) -> Grid {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    generate(config, &mut rng)
}

#[test]
fn single_entrance_park_places_one_attraction_with_a_three_cell_queue() {
    let config = GenerationConfig {
        width: 20,
        height: 20,
        entry_count: 1,
        internal_node_count: 0,
        queue_length: 3,
        attraction_count: 1,
        ..GenerationConfig::default()
    };

    for seed in 0..8 {
        let grid = generate_seeded(&config, seed);

        assert_eq!(grid.cells_of_kind(CellKind::Entrance).len(), 1);
        assert!(!grid.cells_of_kind(CellKind::Road).is_empty());
        let attractions = grid.cells_of_kind(CellKind::Attraction);
        assert_eq!(attractions.len(), 1, "seed {seed}");
        let queue = grid.cells_of_kind(CellKind::Queue);
        assert_eq!(queue.len(), 3, "seed {seed}");

        let attraction = attractions[0];
        let mut line = queue.clone();
        line.sort_by_key(|cell| std::cmp::Reverse(cell.manhattan_distance(attraction)));
        assert!(grid.touches(line[0], CellKind::Road));
        assert!(!grid.touches(line[1], CellKind::Road));
        assert!(!grid.touches(line[2], CellKind::Road));
        assert_eq!(line[2].manhattan_distance(attraction), 1);
    }
}

#[test]
fn queue_cells_form_lines_toward_their_attraction() {
    let config = compact_config();
    for seed in 0..6 {
        let grid = generate_seeded(&config, seed);
        for cell in grid.cells_of_kind(CellKind::Queue) {
            let owner = grid.owner(cell);
            assert!(owner.is_some(), "queue cell {cell:?} has no owner");
            let linked = grid.neighbors(cell).any(|neighbor| {
                let kind = grid.kind(neighbor);
                (kind == Some(CellKind::Queue) || kind == Some(CellKind::Attraction))
                    && grid.owner(neighbor) == owner
            });
            assert!(linked, "queue cell {cell:?} is detached (seed {seed})");
        }
    }
}

#[test]
fn every_attraction_is_reachable_from_an_entrance() {
    let config = compact_config();
    let mut finder = PathFinder::new();

    for seed in 0..6 {
        let grid = generate_seeded(&config, seed);
        let entrances = grid.cells_of_kind(CellKind::Entrance);
        assert!(!entrances.is_empty());

        for attraction in grid.cells_of_kind(CellKind::Attraction) {
            let boarding: Vec<CellCoord> = grid
                .neighbors(attraction)
                .filter(|cell| grid.is_kind(*cell, CellKind::Queue))
                .collect();
            assert!(!boarding.is_empty());
            let reachable = entrances.iter().any(|&entrance| {
                boarding
                    .iter()
                    .any(|&goal| !finder.find_path(&grid, entrance, goal).is_empty())
            });
            assert!(reachable, "attraction {attraction:?} unreachable (seed {seed})");
        }
    }
}

#[test]
fn attractions_keep_their_distance() {
    let config = compact_config();
    let grid = generate_seeded(&config, 21);
    let attractions = grid.cells_of_kind(CellKind::Attraction);
    for (index, a) in attractions.iter().enumerate() {
        for b in &attractions[index + 1..] {
            assert!(a.euclidean_distance(*b) >= config.min_attraction_distance);
        }
    }
}

#[test]
fn border_stays_walled() {
    let config = compact_config();
    let grid = generate_seeded(&config, 4);
    for (cell, contents) in grid.iter() {
        let border = cell.column() < config.margin
            || cell.row() < config.margin
            || cell.column() + config.margin >= config.width
            || cell.row() + config.margin >= config.height;
        if border {
            assert_eq!(contents.kind, CellKind::Wall, "{cell:?}");
        }
    }
}

#[test]
fn same_seed_produces_the_same_park() {
    let config = compact_config();
    assert_eq!(generate_seeded(&config, 77), generate_seeded(&config, 77));
}
