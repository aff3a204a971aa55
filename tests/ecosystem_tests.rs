#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use xenobots::simulation::ecosystem::{Ecosystem, SpawnError};
use xenobots::simulation::genome::{CellType, Genome, SpeciesId};
use xenobots::simulation::params::{ConfigError, Params};
use xenobots::simulation::population::species_home;

fn create_test_params() -> Params {
    Params {
        seed: Some(42),
        population_size: 30,
        per_species_cap: 8,
        species_count: 3,
        initial_per_species: 5,
        nutrient_count: 10,
        evolution_interval: 10_000,
        ..Params::default()
    }
}

#[test]
fn test_ecosystem_creation() {
    let params = create_test_params();
    let ecosystem = Ecosystem::new(params.clone()).unwrap();

    assert_eq!(ecosystem.organisms().len(), 15);
    assert_eq!(ecosystem.nutrients().len(), params.nutrient_count);
    assert_eq!(ecosystem.tick(), 0);
    assert_eq!(ecosystem.generation(), 0);
    assert_eq!(ecosystem.population().species().count(), 3);

    for organism in ecosystem.organisms() {
        assert!(organism.is_alive());
        assert!(!organism.particles.is_empty());
        assert_eq!(organism.energy, params.initial_energy);
        assert_eq!(organism.fitness(), 0.0);
        for particle in &organism.particles {
            assert!(particle.pos[0] > 0.0 && particle.pos[0] < params.world_width);
            assert!(particle.pos[1] > 0.0 && particle.pos[1] < params.world_height);
        }
    }

    let mut ids: Vec<usize> = ecosystem.organisms().iter().map(|o| o.id).collect();
    ids.dedup();
    assert_eq!(ids.len(), 15);
}

#[test]
fn test_same_seed_same_world() {
    let mut a = Ecosystem::new(create_test_params()).unwrap();
    let mut b = Ecosystem::new(create_test_params()).unwrap();

    for _ in 0..20 {
        a.step_fixed();
        b.step_fixed();
    }

    assert_eq!(a.snapshot(), b.snapshot());
}

#[test]
fn test_invalid_params_rejected() {
    let bad_friction = Params {
        fluid_friction: 1.5,
        ..create_test_params()
    };
    assert!(matches!(
        Ecosystem::new(bad_friction),
        Err(ConfigError::OutOfRange {
            field: "fluid_friction",
            ..
        })
    ));

    let nan_gravity = Params {
        gravity: f32::NAN,
        ..create_test_params()
    };
    assert!(matches!(
        Ecosystem::new(nan_gravity),
        Err(ConfigError::NonFinite { field: "gravity" })
    ));

    let too_many_species = Params {
        species_count: 31,
        ..create_test_params()
    };
    assert!(Ecosystem::new(too_many_species).is_err());
}

#[test]
fn test_every_species_starts_populated() {
    let params = Params {
        population_size: 10,
        species_count: 3,
        initial_per_species: 6,
        per_species_cap: 12,
        ..create_test_params()
    };
    let ecosystem = Ecosystem::new(params.clone()).unwrap();
    let population = ecosystem.population();

    let counts: Vec<usize> = population
        .species()
        .map(|s| population.count_species(s))
        .collect();
    assert_eq!(counts, vec![3, 3, 3]);
    assert!(population.len() <= params.population_size);
}

#[test]
fn test_elite_count_must_be_one_or_two() {
    for elite_count in [0, 3] {
        let params = Params {
            elite_count,
            ..create_test_params()
        };
        assert!(matches!(
            Ecosystem::new(params),
            Err(ConfigError::OutOfRange {
                field: "elite_count",
                ..
            })
        ));
    }
    let single = Params {
        elite_count: 1,
        ..create_test_params()
    };
    assert!(Ecosystem::new(single).is_ok());
}

#[test]
fn test_params_fill_missing_json_fields() {
    let params: Params = serde_json::from_str(r#"{ "gravity": 50.0, "seed": 3 }"#).unwrap();

    assert_eq!(params.gravity, 50.0);
    assert_eq!(params.seed, Some(3));
    assert_eq!(params.world_width, Params::default().world_width);
    assert!(params.validate().is_ok());
}

#[test]
fn test_create_organism_rejects_wrong_grid() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut rng = StdRng::seed_from_u64(1);
    let small = Genome::random(3, SpeciesId(0), 0, &mut rng);

    let result = ecosystem.create_organism(small, 500.0, 400.0);

    assert!(matches!(result, Err(SpawnError::Genome(_))));
    assert_eq!(ecosystem.organisms().len(), 15);
}

#[test]
fn test_create_organism_respects_caps() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let rows = vec![vec![CellType::Structural; 5]; 5];
    let genome = Genome::from_rows(&rows, 5, 0.5, SpeciesId(0)).unwrap();

    for _ in 0..3 {
        ecosystem.create_organism(genome.clone(), 500.0, 400.0).unwrap();
    }
    assert!(matches!(
        ecosystem.create_organism(genome.clone(), 500.0, 400.0),
        Err(SpawnError::SpeciesFull { cap: 8, .. })
    ));

    let mut full = Ecosystem::new(Params {
        population_size: 15,
        ..create_test_params()
    })
    .unwrap();
    assert!(matches!(
        full.create_organism(genome, 500.0, 400.0),
        Err(SpawnError::PopulationFull(15))
    ));
}

#[test]
fn test_created_organism_is_placed_at_position() {
    let params = Params {
        build_jitter: 0.0,
        ..create_test_params()
    };
    let mut ecosystem = Ecosystem::new(params).unwrap();
    let rows = vec![vec![CellType::Signaling; 5]; 5];
    let genome = Genome::from_rows(&rows, 5, 0.5, SpeciesId(2)).unwrap();

    let organism = ecosystem.create_organism(genome, 500.0, 300.0).unwrap();

    assert!((organism.center_of_mass[0] - 500.0).abs() < 1e-3);
    assert!((organism.center_of_mass[1] - 300.0).abs() < 1e-3);
    assert_eq!(organism.species, SpeciesId(2));
    assert_eq!(organism.id, 15);
}

#[test]
fn test_advance_clamps_frame_time() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let max_ticks = (ecosystem.params().max_frame_time / ecosystem.params().fixed_dt).ceil() as usize;

    let ticks = ecosystem.advance(10.0);
    assert!(ticks > 0);
    assert!(ticks <= max_ticks);
    assert_eq!(ecosystem.tick(), ticks as u64);

    assert_eq!(ecosystem.advance(f32::NAN), 0);
    assert_eq!(ecosystem.advance(-1.0), 0);
}

#[test]
fn test_advance_accumulates_small_frames() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let dt = ecosystem.params().fixed_dt;

    assert_eq!(ecosystem.advance(dt * 0.6), 0);
    assert_eq!(ecosystem.advance(dt * 0.6), 1);
    assert_eq!(ecosystem.tick(), 1);
}

#[test]
fn test_step_triggers_evolution() {
    let mut ecosystem = Ecosystem::new(Params {
        evolution_interval: 5,
        ..create_test_params()
    })
    .unwrap();

    for _ in 0..4 {
        ecosystem.step_fixed();
    }
    assert_eq!(ecosystem.generation(), 0);

    ecosystem.step_fixed();
    assert_eq!(ecosystem.generation(), 1);
    assert_eq!(ecosystem.history().len(), 1);
    assert_eq!(ecosystem.history().latest().unwrap().generation, 1);
}

#[test]
fn test_sim_time_tracks_ticks() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    for _ in 0..60 {
        ecosystem.step_fixed();
    }

    assert_eq!(ecosystem.tick(), 60);
    assert!((ecosystem.sim_time() - 1.0).abs() < 1e-3);
}

#[test]
fn test_population_stats_count_cells() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let stats = ecosystem.population_stats(0);

    assert_eq!(stats.total, 15);
    let cells = stats.cell_counts;
    assert_eq!(
        cells.empty + cells.structural + cells.actuator + cells.signaling,
        15 * 25
    );
    assert!(cells.structural + cells.actuator + cells.signaling >= 15);
    assert_eq!(stats.per_species.values().sum::<usize>(), 15);
    assert_eq!(stats.per_species.get(&SpeciesId(1)), Some(&5));
}

#[test]
fn test_snapshot_mirrors_world() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    ecosystem.step_fixed();

    let snapshot = ecosystem.snapshot();

    assert_eq!(snapshot.tick, 1);
    assert_eq!(snapshot.organisms.len(), ecosystem.organisms().len());
    assert_eq!(snapshot.nutrients.len(), ecosystem.nutrients().len());
    assert!(snapshot.best_genome.is_some());
    for (view, organism) in snapshot.organisms.iter().zip(ecosystem.organisms()) {
        assert_eq!(view.id, organism.id);
        assert_eq!(view.particles.len(), organism.particles.len());
        assert_eq!(view.springs.len(), organism.springs.len());
        assert!(view.particles.iter().all(Option::is_some));
    }
}

#[test]
fn test_species_homes_are_spread_out() {
    let params = create_test_params();
    let homes: Vec<(f32, f32)> = (0..3).map(|i| species_home(SpeciesId(i), &params)).collect();

    assert_eq!(homes[0], (300.0, 400.0));
    assert_eq!(homes[1], (600.0, 400.0));
    assert_eq!(homes[2], (900.0, 400.0));
}
