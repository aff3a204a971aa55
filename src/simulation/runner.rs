//! Runs an [`Ecosystem`] on a background thread.
//!
//! The worker owns the ecosystem while running and sends a [`WorldSnapshot`]
//! after every batch of ticks over a bounded channel. Snapshots are dropped
//! when the consumer falls behind; the worker never waits for it.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::{debug, error, info};

use super::ecosystem::Ecosystem;
use super::snapshot::WorldSnapshot;

/// Errors reported by [`SimulationRunner`].
#[derive(Debug, Error)]
pub enum RunnerError {
    /// The worker thread panicked and its ecosystem is lost.
    #[error("simulation worker panicked")]
    WorkerPanicked,
}

/// How the worker paces itself.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Pacing {
    /// Follow wall-clock time through the fixed-timestep accumulator.
    Realtime,
    /// Run this many ticks per batch as fast as possible.
    Batch(usize),
}

/// Options for a [`SimulationRunner`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunnerOptions {
    /// Pacing of the worker loop.
    pub pacing: Pacing,
    /// Snapshots buffered before new ones are dropped.
    pub channel_capacity: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            pacing: Pacing::Realtime,
            channel_capacity: 4,
        }
    }
}

enum RunnerState {
    Stopped(Box<Ecosystem>),
    Running(JoinHandle<Ecosystem>),
    Lost,
}

/// Start/stop handle around an [`Ecosystem`].
///
/// Starting a running runner or stopping a stopped one does nothing. Stopping
/// hands the ecosystem back untouched, so a later start resumes where it left
/// off.
pub struct SimulationRunner {
    state: RunnerState,
    running: Arc<AtomicBool>,
    sender: SyncSender<WorldSnapshot>,
    options: RunnerOptions,
}

impl SimulationRunner {
    /// Wraps `ecosystem` in a stopped runner and returns the snapshot receiver.
    pub fn new(ecosystem: Ecosystem, options: RunnerOptions) -> (Self, Receiver<WorldSnapshot>) {
        let (sender, receiver) = mpsc::sync_channel(options.channel_capacity.max(1));
        let runner = Self {
            state: RunnerState::Stopped(Box::new(ecosystem)),
            running: Arc::new(AtomicBool::new(false)),
            sender,
            options,
        };
        (runner, receiver)
    }

    /// Starts the worker thread.
    pub fn start(&mut self) {
        let state = std::mem::replace(&mut self.state, RunnerState::Lost);
        let RunnerState::Stopped(ecosystem) = state else {
            self.state = state;
            return;
        };

        self.running.store(true, Ordering::Release);
        let running = Arc::clone(&self.running);
        let sender = self.sender.clone();
        let pacing = self.options.pacing;
        info!(tick = ecosystem.tick(), "starting simulation worker");

        let handle = thread::spawn(move || run_worker(*ecosystem, &running, &sender, pacing));
        self.state = RunnerState::Running(handle);
    }

    /// Stops the worker thread and takes the ecosystem back.
    pub fn stop(&mut self) -> Result<(), RunnerError> {
        let state = std::mem::replace(&mut self.state, RunnerState::Lost);
        let RunnerState::Running(handle) = state else {
            self.state = state;
            return match self.state {
                RunnerState::Lost => Err(RunnerError::WorkerPanicked),
                _ => Ok(()),
            };
        };

        self.running.store(false, Ordering::Release);
        match handle.join() {
            Ok(ecosystem) => {
                info!(tick = ecosystem.tick(), "simulation worker stopped");
                self.state = RunnerState::Stopped(Box::new(ecosystem));
                Ok(())
            }
            Err(_) => {
                error!("simulation worker panicked");
                Err(RunnerError::WorkerPanicked)
            }
        }
    }

    /// Whether the worker thread is running.
    pub fn is_running(&self) -> bool {
        matches!(self.state, RunnerState::Running(_))
    }

    /// The ecosystem, while stopped.
    pub fn ecosystem(&self) -> Option<&Ecosystem> {
        match &self.state {
            RunnerState::Stopped(ecosystem) => Some(ecosystem),
            _ => None,
        }
    }

    /// Stops the worker if needed and returns the ecosystem.
    pub fn shutdown(mut self) -> Result<Ecosystem, RunnerError> {
        self.stop()?;
        match std::mem::replace(&mut self.state, RunnerState::Lost) {
            RunnerState::Stopped(ecosystem) => Ok(*ecosystem),
            _ => Err(RunnerError::WorkerPanicked),
        }
    }
}

impl Drop for SimulationRunner {
    fn drop(&mut self) {
        if self.is_running() {
            let _ = self.stop();
        }
    }
}

fn run_worker(
    mut ecosystem: Ecosystem,
    running: &AtomicBool,
    sender: &SyncSender<WorldSnapshot>,
    pacing: Pacing,
) -> Ecosystem {
    let tick_period = Duration::from_secs_f32(ecosystem.params().fixed_dt);
    let mut last = Instant::now();
    let mut connected = true;

    while running.load(Ordering::Acquire) {
        let ticks = match pacing {
            Pacing::Realtime => {
                let now = Instant::now();
                let frame = now.duration_since(last).as_secs_f32();
                last = now;
                ecosystem.advance(frame)
            }
            Pacing::Batch(n) => {
                let n = n.max(1);
                for _ in 0..n {
                    ecosystem.step_fixed();
                }
                n
            }
        };

        if ticks > 0 && connected {
            match sender.try_send(ecosystem.snapshot()) {
                Ok(()) | Err(TrySendError::Full(_)) => {}
                Err(TrySendError::Disconnected(_)) => {
                    debug!("snapshot receiver dropped, worker keeps running");
                    connected = false;
                }
            }
        }

        if pacing == Pacing::Realtime {
            thread::sleep(tick_period);
        }
    }
    ecosystem
}
