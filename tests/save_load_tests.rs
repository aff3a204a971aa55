#![allow(missing_docs)]

use rand::SeedableRng;
use rand::rngs::StdRng;
use xenobots::simulation::ecosystem::Ecosystem;
use xenobots::simulation::genome::{Genome, SpeciesId};
use xenobots::simulation::params::Params;
use xenobots::simulation::snapshot::{SavedState, SnapshotError};

fn create_test_params() -> Params {
    Params {
        seed: Some(8),
        population_size: 20,
        per_species_cap: 6,
        species_count: 2,
        initial_per_species: 4,
        nutrient_count: 5,
        evolution_interval: 50,
        ..Params::default()
    }
}

#[test]
fn test_save_and_restore() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    for _ in 0..120 {
        ecosystem.step_fixed();
    }
    assert_eq!(ecosystem.generation(), 2);

    let saved = ecosystem.to_saved_state();
    let json = saved.to_json().unwrap();
    let loaded = SavedState::from_json(&json).unwrap();

    assert_eq!(loaded.generation, 2);
    assert_eq!(loaded.config, *ecosystem.params());
    assert_eq!(loaded.genomes, saved.genomes);
    assert_eq!(loaded.timestamp, saved.timestamp);

    let restored = Ecosystem::from_saved_state(loaded).unwrap();
    assert_eq!(restored.generation(), 2);
    assert_eq!(restored.tick(), 0);
    assert_eq!(restored.organisms().len(), saved.genomes.len());
    assert_eq!(
        restored.params().initial_per_species,
        ecosystem.params().initial_per_species
    );
    for (organism, genome) in restored.organisms().iter().zip(&saved.genomes) {
        assert_eq!(&organism.genome, genome);
        assert!(organism.is_alive());
    }
}

#[test]
fn test_saved_state_skips_dead_organisms() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    ecosystem.organisms_mut()[0].kill();

    let saved = ecosystem.to_saved_state();

    assert_eq!(saved.genomes.len(), ecosystem.organisms().len() - 1);
}

#[test]
fn test_restore_rejects_wrong_grid() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut saved = ecosystem.to_saved_state();
    let mut rng = StdRng::seed_from_u64(3);
    saved.genomes.push(Genome::random(4, SpeciesId(0), 0, &mut rng));
    let bad_index = saved.genomes.len() - 1;

    let result = Ecosystem::from_saved_state(saved);

    match result {
        Err(SnapshotError::Genome { index, .. }) => assert_eq!(index, bad_index),
        other => panic!("expected a genome error, got {other:?}"),
    }
}

#[test]
fn test_restore_rejects_bad_config() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut saved = ecosystem.to_saved_state();
    saved.config.world_width = -10.0;

    assert!(matches!(
        Ecosystem::from_saved_state(saved),
        Err(SnapshotError::Config(_))
    ));
}

#[test]
fn test_malformed_json_is_an_error() {
    assert!(matches!(
        SavedState::from_json("{ not json"),
        Err(SnapshotError::Json(_))
    ));
}

#[test]
fn test_restore_drops_genomes_beyond_cap() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut saved = ecosystem.to_saved_state();
    let extra = saved.genomes.clone();
    saved.genomes.extend(extra.iter().cloned());
    saved.genomes.extend(extra);
    saved.config.population_size = 10;

    let restored = Ecosystem::from_saved_state(saved).unwrap();

    assert_eq!(restored.organisms().len(), 10);
}

#[test]
fn test_restore_respects_species_cap() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut saved = ecosystem.to_saved_state();
    let mut rng = StdRng::seed_from_u64(4);
    saved.genomes = (0..15)
        .map(|_| Genome::random(5, SpeciesId(0), 0, &mut rng))
        .collect();
    saved
        .genomes
        .push(Genome::random(5, SpeciesId(1), 0, &mut rng));

    let restored = Ecosystem::from_saved_state(saved).unwrap();
    let population = restored.population();

    assert_eq!(population.count_species(SpeciesId(0)), 6);
    assert_eq!(population.count_species(SpeciesId(1)), 1);
    assert_eq!(population.len(), 7);
}
