//! The set of organisms in an ecosystem, partitioned into species pools.

use std::collections::{BTreeMap, BTreeSet};

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::body::BodyBuilder;
use super::genome::{Genome, SpeciesId};
use super::organism::Organism;
use super::params::Params;

/// Ordered collection of organisms plus the set of known species.
///
/// Species stay known after their last member died, so an extinct pool can
/// be reseeded by the next evolutionary step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Population {
    /// Organisms in creation order.
    pub organisms: Vec<Organism>,
    species: BTreeSet<SpeciesId>,
    next_id: usize,
}

impl Population {
    /// Creates an empty population that knows the given species.
    pub fn new(species: impl IntoIterator<Item = SpeciesId>) -> Self {
        Self {
            organisms: Vec::new(),
            species: species.into_iter().collect(),
            next_id: 0,
        }
    }

    /// Creates an empty successor that keeps species and the id sequence.
    pub fn successor(&self) -> Self {
        Self {
            organisms: Vec::new(),
            species: self.species.clone(),
            next_id: self.next_id,
        }
    }

    /// Hands out a fresh organism id.
    pub fn allocate_id(&mut self) -> usize {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Builds `genome` at `(x, y)` and adds it. Returns the new organism's id.
    pub fn spawn_at<R: Rng + ?Sized>(
        &mut self,
        genome: Genome,
        x: f32,
        y: f32,
        params: &Params,
        rng: &mut R,
    ) -> usize {
        let id = self.allocate_id();
        self.species.insert(genome.species);
        let organism = BodyBuilder::new(params).build(id, genome, x, y, rng);
        self.organisms.push(organism);
        id
    }

    /// Builds `genome` near its origin hint (or its species' home) and adds it.
    pub fn spawn<R: Rng + ?Sized>(&mut self, genome: Genome, params: &Params, rng: &mut R) -> usize {
        let (ox, oy) = genome
            .origin
            .map_or_else(|| species_home(genome.species, params), |[x, y]| (x, y));
        let scatter = params.spawn_scatter;
        let (dx, dy) = if scatter > 0.0 {
            (rng.random_range(-scatter..scatter), rng.random_range(-scatter..scatter))
        } else {
            (0.0, 0.0)
        };
        let (x, y) = clamp_spawn(ox + dx, oy + dy, params);
        self.spawn_at(genome, x, y, params, rng)
    }

    /// Known species, in ascending order.
    pub fn species(&self) -> impl Iterator<Item = SpeciesId> + '_ {
        self.species.iter().copied()
    }

    /// Living members of every known species, sorted by descending fitness.
    ///
    /// Every known species has an entry, possibly empty.
    pub fn pools(&self) -> BTreeMap<SpeciesId, Vec<&Organism>> {
        let mut pools: BTreeMap<SpeciesId, Vec<&Organism>> =
            self.species.iter().map(|&s| (s, Vec::new())).collect();
        for organism in self.organisms.iter().filter(|o| o.is_alive()) {
            pools.entry(organism.species).or_default().push(organism);
        }
        for pool in pools.values_mut() {
            pool.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        }
        pools
    }

    /// Removes dead organisms. Returns how many were removed.
    pub fn evict_dead(&mut self) -> usize {
        let before = self.organisms.len();
        self.organisms.retain(Organism::is_alive);
        before - self.organisms.len()
    }

    /// Number of organisms, dead or alive.
    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    /// Whether there are no organisms.
    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Number of living organisms.
    pub fn living(&self) -> usize {
        self.organisms.iter().filter(|o| o.is_alive()).count()
    }

    /// Number of organisms (dead or alive) of one species.
    pub fn count_species(&self, species: SpeciesId) -> usize {
        self.organisms.iter().filter(|o| o.species == species).count()
    }

    /// Fittest living organism.
    pub fn best(&self) -> Option<&Organism> {
        self.organisms
            .iter()
            .filter(|o| o.is_alive())
            .max_by(|a, b| a.fitness().total_cmp(&b.fitness()))
    }
}

/// Default spawn point of a species: evenly spaced along the world's
/// horizontal midline.
pub fn species_home(species: SpeciesId, params: &Params) -> (f32, f32) {
    let n = params.species_count.max(1);
    let slot = usize::from(species.0) % n;
    (
        params.world_width * (slot + 1) as f32 / (n + 1) as f32,
        params.world_height / 2.0,
    )
}

/// Keeps a spawn point far enough from the walls for a whole body to fit.
fn clamp_spawn(x: f32, y: f32, params: &Params) -> (f32, f32) {
    let margin = params.grid_size as f32 * params.cell_spacing / 2.0 + params.build_jitter + 1.0;
    let clamp = |v: f32, extent: f32| {
        if extent > 2.0 * margin {
            v.clamp(margin, extent - margin)
        } else {
            extent / 2.0
        }
    };
    (clamp(x, params.world_width), clamp(y, params.world_height))
}
