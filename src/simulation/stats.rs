//! Gene-pool statistics recorded once per generation.

use std::collections::{BTreeMap, VecDeque};

use serde::{Deserialize, Serialize};

use super::genome::{CellType, SpeciesId};
use super::population::Population;

/// Number of genome cells of each type across the living population.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellCounts {
    /// Empty cells.
    pub empty: usize,
    /// Structural (skin) cells.
    pub structural: usize,
    /// Actuator (muscle) cells.
    pub actuator: usize,
    /// Signaling (neuron) cells.
    pub signaling: usize,
}

impl CellCounts {
    /// Count for one cell type.
    pub fn get(&self, cell: CellType) -> usize {
        match cell {
            CellType::Empty => self.empty,
            CellType::Structural => self.structural,
            CellType::Actuator => self.actuator,
            CellType::Signaling => self.signaling,
        }
    }

    fn add(&mut self, cell: CellType, n: usize) {
        match cell {
            CellType::Empty => self.empty += n,
            CellType::Structural => self.structural += n,
            CellType::Actuator => self.actuator += n,
            CellType::Signaling => self.signaling += n,
        }
    }
}

/// Gene-pool summary for one generation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PopulationStats {
    /// Generation the summary was taken at.
    pub generation: u32,
    /// Cell type totals over all living genomes.
    pub cell_counts: CellCounts,
    /// Number of living organisms.
    pub total: usize,
    /// Living organisms per species.
    pub per_species: BTreeMap<SpeciesId, usize>,
    /// Best fitness among living organisms.
    pub best_fitness: f32,
}

impl PopulationStats {
    /// Summarises the living members of `population`.
    pub fn collect(population: &Population, generation: u32) -> Self {
        let mut cell_counts = CellCounts::default();
        let mut per_species: BTreeMap<SpeciesId, usize> =
            population.species().map(|s| (s, 0)).collect();
        let mut total = 0;
        let mut best_fitness = 0.0f32;

        for organism in population.organisms.iter().filter(|o| o.is_alive()) {
            for cell in CellType::ALL {
                cell_counts.add(cell, organism.genome.count(cell));
            }
            *per_species.entry(organism.species).or_default() += 1;
            total += 1;
            best_fitness = best_fitness.max(organism.fitness());
        }

        Self {
            generation,
            cell_counts,
            total,
            per_species,
            best_fitness,
        }
    }
}

/// Rolling record of per-generation statistics for drift tracking.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsHistory {
    records: VecDeque<PopulationStats>,
    /// Maximum number of generations to keep.
    pub max_history: usize,
}

impl Default for StatsHistory {
    fn default() -> Self {
        Self::new(500)
    }
}

impl StatsHistory {
    /// Creates an empty history keeping at most `max_history` records.
    pub fn new(max_history: usize) -> Self {
        Self {
            records: VecDeque::new(),
            max_history,
        }
    }

    /// Appends a record, dropping the oldest beyond `max_history`.
    pub fn record(&mut self, stats: PopulationStats) {
        self.records.push_back(stats);
        while self.records.len() > self.max_history {
            self.records.pop_front();
        }
    }

    /// Records, oldest first.
    pub fn records(&self) -> &VecDeque<PopulationStats> {
        &self.records
    }

    /// Most recent record.
    pub fn latest(&self) -> Option<&PopulationStats> {
        self.records.back()
    }

    /// Number of records held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no record is held.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
