//! Selection, crossover, mutation and pool-size control.
//!
//! Each species evolves in its own pool; there is no cross-species breeding.
//! Per pool: the fittest individuals survive unchanged, a random growth factor
//! sets the next pool size within `[min_viable_pool, per_species_cap]`, and the
//! remaining slots are filled with mutated offspring of tournament-selected
//! parents. The total is then trimmed to `population_size`.

use std::collections::BTreeMap;

use rand::Rng;
use tracing::{debug, warn};

use super::energy;
use super::genome::{self, Genome, SpeciesId};
use super::organism::Organism;
use super::params::Params;
use super::population::{Population, species_home};

/// Produces the next generation of a [`Population`].
#[derive(Debug, Clone, Copy)]
pub struct EvolutionEngine<'a> {
    params: &'a Params,
}

impl<'a> EvolutionEngine<'a> {
    /// Creates an engine using the given parameters.
    pub fn new(params: &'a Params) -> Self {
        Self { params }
    }

    /// Breeds the next generation from the living members of `population`.
    ///
    /// Dead organisms take no part. A species without living members is
    /// reseeded with one random genome at its home position.
    pub fn evolve<R: Rng + ?Sized>(
        &self,
        population: &Population,
        generation: u32,
        rng: &mut R,
    ) -> Population {
        let mut next_genomes: BTreeMap<SpeciesId, Vec<Genome>> = BTreeMap::new();

        for (species, members) in population.pools() {
            let genomes = if members.is_empty() {
                debug!(%species, generation, "reseeding extinct species");
                let (x, y) = species_home(species, self.params);
                vec![Genome::random(self.params.grid_size, species, generation, rng).with_origin(x, y)]
            } else {
                self.breed_pool(&members, generation, rng)
            };
            next_genomes.insert(species, genomes);
        }

        self.enforce_population_cap(&mut next_genomes);

        let mut next = population.successor();
        for genomes in next_genomes.into_values() {
            for genome in genomes {
                next.spawn(genome, self.params, rng);
            }
        }
        next
    }

    /// Breeds one species pool. `members` must be sorted by descending fitness.
    fn breed_pool<R: Rng + ?Sized>(
        &self,
        members: &[&Organism],
        generation: u32,
        rng: &mut R,
    ) -> Vec<Genome> {
        let params = self.params;
        let target = self.pool_target(members.len(), rng);

        // Parents carry their current position as origin hint for the children.
        let located: Vec<Genome> = members
            .iter()
            .map(|o| {
                let genome = o.genome.clone();
                if o.center_of_mass.iter().all(|v| v.is_finite()) {
                    genome.with_origin(o.center_of_mass[0], o.center_of_mass[1])
                } else {
                    genome
                }
            })
            .collect();

        let elite = params.elite_count.min(members.len()).min(target);
        let mut genomes: Vec<Genome> = located[..elite].to_vec();

        let eligible: Vec<usize> = members
            .iter()
            .enumerate()
            .filter(|(_, o)| energy::can_reproduce(o, params))
            .map(|(i, _)| i)
            .collect();
        let candidates: Vec<usize> = if eligible.len() >= 2 {
            eligible
        } else {
            (0..members.len()).collect()
        };

        while genomes.len() < target {
            let Some((i, j)) = select_parents(
                &candidates,
                params.tournament_size,
                |&idx| members[idx].fitness(),
                rng,
            ) else {
                break;
            };
            let mut child = genome::crossover(
                &located[candidates[i]],
                &located[candidates[j]],
                generation,
                params.origin_merge_radius,
                rng,
            );
            genome::mutate(&mut child, params, rng);
            genomes.push(child);
        }

        debug!(
            species = %members[0].species,
            current = members.len(),
            target,
            elite,
            "bred species pool"
        );
        genomes
    }

    /// Random next size of a pool currently holding `current` members.
    pub fn pool_target<R: Rng + ?Sized>(&self, current: usize, rng: &mut R) -> usize {
        let params = self.params;
        let factor = if params.growth_factor_max > params.growth_factor_min {
            rng.random_range(params.growth_factor_min..=params.growth_factor_max)
        } else {
            params.growth_factor_min
        };
        let target = (current as f32 * factor).round() as usize;
        target.clamp(params.min_viable_pool, params.per_species_cap)
    }

    /// Trims the largest pools until the total fits `population_size`.
    ///
    /// Offspring are dropped before elites since they sit at the end of each
    /// pool. No pool is trimmed below one genome unless there are more species
    /// than the cap allows.
    fn enforce_population_cap(&self, pools: &mut BTreeMap<SpeciesId, Vec<Genome>>) {
        let cap = self.params.population_size;
        let mut total: usize = pools.values().map(Vec::len).sum();

        while total > cap {
            let Some(largest) = pools.values_mut().filter(|p| p.len() > 1).max_by_key(|p| p.len())
            else {
                break;
            };
            largest.pop();
            total -= 1;
        }

        if total > cap {
            warn!(
                species = pools.len(),
                cap, "more species than the population cap, dropping pools"
            );
            let mut kept = 0;
            pools.retain(|_, p| {
                kept += p.len();
                kept <= cap
            });
        }
    }
}

/// Tournament selection: samples `k` candidates uniformly (with replacement)
/// and returns the index of the fittest. Ties keep the earlier sample.
pub fn tournament_select<T, R: Rng + ?Sized>(
    candidates: &[T],
    k: usize,
    fitness: impl Fn(&T) -> f32,
    rng: &mut R,
) -> Option<usize> {
    if candidates.is_empty() {
        return None;
    }
    let mut best: Option<(usize, f32)> = None;
    for _ in 0..k.max(1) {
        let idx = rng.random_range(0..candidates.len());
        let score = fitness(&candidates[idx]);
        if best.is_none_or(|(_, s)| score > s) {
            best = Some((idx, score));
        }
    }
    best.map(|(idx, _)| idx)
}

/// Runs two independent tournaments and returns the winners' indices.
pub fn select_parents<T, R: Rng + ?Sized>(
    candidates: &[T],
    k: usize,
    fitness: impl Fn(&T) -> f32,
    rng: &mut R,
) -> Option<(usize, usize)> {
    let first = tournament_select(candidates, k, &fitness, rng)?;
    let second = tournament_select(candidates, k, &fitness, rng)?;
    Some((first, second))
}
