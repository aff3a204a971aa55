#![allow(missing_docs)]

use std::sync::mpsc::Receiver;
use std::time::Duration;

use xenobots::simulation::ecosystem::Ecosystem;
use xenobots::simulation::params::Params;
use xenobots::simulation::runner::{Pacing, RunnerOptions, SimulationRunner};
use xenobots::simulation::snapshot::WorldSnapshot;

fn create_test_params() -> Params {
    Params {
        seed: Some(13),
        population_size: 6,
        per_species_cap: 3,
        species_count: 2,
        initial_per_species: 3,
        nutrient_count: 4,
        evolution_interval: 10_000,
        ..Params::default()
    }
}

fn batch_runner(ticks: usize) -> (SimulationRunner, Receiver<WorldSnapshot>) {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    SimulationRunner::new(
        ecosystem,
        RunnerOptions {
            pacing: Pacing::Batch(ticks),
            channel_capacity: 2,
        },
    )
}

#[test]
fn test_runner_delivers_snapshots() {
    let (mut runner, snapshots) = batch_runner(5);
    assert!(!runner.is_running());

    runner.start();
    assert!(runner.is_running());
    assert!(runner.ecosystem().is_none());

    let first = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(first.tick >= 5);
    assert_eq!(first.tick % 5, 0);
    assert_eq!(first.organisms.len(), 6);

    runner.stop().unwrap();
    assert!(!runner.is_running());
    assert!(runner.ecosystem().unwrap().tick() >= first.tick);
}

#[test]
fn test_start_and_stop_are_idempotent() {
    let (mut runner, _snapshots) = batch_runner(1);

    runner.stop().unwrap();
    runner.start();
    runner.start();
    assert!(runner.is_running());

    runner.stop().unwrap();
    runner.stop().unwrap();
    assert!(!runner.is_running());
    assert!(runner.ecosystem().is_some());
}

#[test]
fn test_runner_resumes_where_it_stopped() {
    let (mut runner, snapshots) = batch_runner(3);

    runner.start();
    snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    runner.stop().unwrap();
    let paused_at = runner.ecosystem().unwrap().tick();
    while snapshots.try_recv().is_ok() {}

    runner.start();
    let resumed = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(resumed.tick > paused_at);

    let ecosystem = runner.shutdown().unwrap();
    assert!(ecosystem.tick() >= resumed.tick);
}

#[test]
fn test_runner_survives_dropped_receiver() {
    let (mut runner, snapshots) = batch_runner(2);
    drop(snapshots);

    runner.start();
    std::thread::sleep(Duration::from_millis(50));
    let ecosystem = runner.shutdown().unwrap();

    assert!(ecosystem.tick() > 0);
}

#[test]
fn test_realtime_runner_advances() {
    let ecosystem = Ecosystem::new(create_test_params()).unwrap();
    let (mut runner, snapshots) = SimulationRunner::new(ecosystem, RunnerOptions::default());

    runner.start();
    let snapshot = snapshots.recv_timeout(Duration::from_secs(10)).unwrap();
    assert!(snapshot.tick > 0);

    runner.stop().unwrap();
}
