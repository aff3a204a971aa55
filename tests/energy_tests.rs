#![allow(missing_docs)]
#![allow(clippy::float_cmp)]

use ndarray::Array1;
use rand::SeedableRng;
use rand::rngs::StdRng;
use xenobots::simulation::body::BodyBuilder;
use xenobots::simulation::ecosystem::Ecosystem;
use xenobots::simulation::energy;
use xenobots::simulation::genome::{CellType, Genome, SpeciesId};
use xenobots::simulation::nutrient::Nutrient;
use xenobots::simulation::organism::Organism;
use xenobots::simulation::params::Params;

fn create_test_params() -> Params {
    Params {
        seed: Some(5),
        species_count: 2,
        initial_per_species: 3,
        nutrient_count: 0,
        evolution_interval: 10_000,
        ..Params::default()
    }
}

fn build_organism(params: &Params, cell: CellType, x: f32, y: f32) -> Organism {
    let rows = vec![vec![cell; 5]; 5];
    let genome = Genome::from_rows(&rows, 5, 0.5, SpeciesId(0)).unwrap();
    let mut rng = StdRng::seed_from_u64(9);
    BodyBuilder::new(params).build(0, genome, x, y, &mut rng)
}

#[test]
fn test_energy_never_increases_without_food() {
    let mut ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let mut previous: Vec<f32> = ecosystem.organisms().iter().map(|o| o.energy).collect();

    for _ in 0..200 {
        ecosystem.step_fixed();
        for (organism, before) in ecosystem.organisms().iter().zip(&previous) {
            assert!(organism.energy <= *before);
        }
        previous = ecosystem.organisms().iter().map(|o| o.energy).collect();
    }
}

#[test]
fn test_starved_organisms_die_with_zero_energy() {
    let mut ecosystem = Ecosystem::new(Params {
        metabolic_cost: 0.1,
        ..create_test_params()
    })
    .unwrap();

    for _ in 0..20 {
        ecosystem.step_fixed();
    }

    assert!(!ecosystem.organisms().is_empty());
    for organism in ecosystem.organisms() {
        assert!(!organism.is_alive());
        assert_eq!(organism.energy, 0.0);
    }
}

#[test]
fn test_dead_organism_is_frozen() {
    let params = create_test_params();
    let mut organism = build_organism(&params, CellType::Actuator, 600.0, 400.0);
    organism.energy = params.metabolic_cost / 2.0;

    energy::tick(&mut organism, &params);
    assert!(!organism.is_alive());
    assert_eq!(organism.energy, 0.0);
    let age = organism.age;

    energy::tick(&mut organism, &params);
    energy::feed(&mut organism, 0.5, &params);
    assert_eq!(organism.energy, 0.0);
    assert_eq!(organism.age, age);
}

#[test]
fn test_muscles_cost_extra() {
    let params = create_test_params();
    let mut passive = build_organism(&params, CellType::Structural, 600.0, 400.0);
    let mut active = build_organism(&params, CellType::Actuator, 600.0, 400.0);

    energy::tick(&mut passive, &params);
    energy::tick(&mut active, &params);

    assert!((1.0 - passive.energy - params.metabolic_cost).abs() < 1e-6);
    assert!((1.0 - active.energy - params.metabolic_cost - params.muscle_cost).abs() < 1e-6);
}

#[test]
fn test_fitness_ignores_leftward_motion() {
    let params = create_test_params();
    let mut organism = build_organism(&params, CellType::Structural, 600.0, 400.0);

    for particle in &mut organism.particles {
        particle.pos[0] -= 50.0;
    }
    organism.update_center_of_mass();
    assert_eq!(organism.fitness(), 0.0);

    for particle in &mut organism.particles {
        particle.pos[0] += 80.0;
    }
    organism.update_center_of_mass();
    assert!((organism.fitness() - 30.0).abs() < 1e-3);
}

#[test]
fn test_feeding_consumes_pellet() {
    let params = create_test_params();
    let mut organisms = vec![
        build_organism(&params, CellType::Structural, 600.0, 400.0),
        build_organism(&params, CellType::Structural, 605.0, 400.0),
    ];
    organisms[0].energy = 0.5;
    organisms[1].energy = 0.5;
    let mut nutrients = vec![
        Nutrient {
            pos: Array1::from_vec(vec![602.0, 400.0]),
            energy: params.nutrient_energy,
        },
        Nutrient {
            pos: Array1::from_vec(vec![100.0, 100.0]),
            energy: params.nutrient_energy,
        },
    ];

    let eaten = energy::feed_all(&mut organisms, &mut nutrients, &params);

    assert_eq!(eaten, 1);
    assert!(nutrients[0].is_consumed());
    assert!(!nutrients[1].is_consumed());
    assert!((organisms[0].energy - 0.75).abs() < 1e-6);
    assert_eq!(organisms[1].energy, 0.5);
}

#[test]
fn test_energy_capped_at_max() {
    let params = create_test_params();
    let mut organism = build_organism(&params, CellType::Structural, 600.0, 400.0);

    energy::feed(&mut organism, 10.0, &params);

    assert_eq!(organism.energy, params.max_energy);
}

#[test]
fn test_reproduction_threshold() {
    let params = create_test_params();
    let mut organism = build_organism(&params, CellType::Structural, 600.0, 400.0);
    assert!(energy::can_reproduce(&organism, &params));

    organism.energy = params.reproduction_energy / 2.0;
    assert!(!energy::can_reproduce(&organism, &params));
}
