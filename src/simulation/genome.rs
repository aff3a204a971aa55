//! Genetic encoding of a xenobot body plan.
//!
//! A genome is a square grid of [`CellType`]s plus a handful of evolvable
//! scalars. Crossover and mutation live here as well, next to the data they
//! operate on.

use std::fmt;

use ndarray::Array2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::params::Params;

/// Errors raised when a genome cannot be compiled into a body.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenomeError {
    /// The grid is not the configured square size.
    #[error("genome grid is {rows}x{cols}, expected {expected}x{expected}")]
    GridDimensions {
        /// Configured side length.
        expected: usize,
        /// Rows in the rejected grid.
        rows: usize,
        /// Columns in the rejected grid.
        cols: usize,
    },
    /// Bio-electric memory outside `[0, 1]` or not finite.
    #[error("bio-electric memory {0} is outside [0, 1]")]
    Memory(f32),
}

/// Tissue type of one grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CellType {
    /// No tissue.
    Empty,
    /// Passive skin cell.
    Structural,
    /// Muscle cell producing periodic contraction.
    Actuator,
    /// Neuron-like cell that stiffens its springs.
    Signaling,
}

impl CellType {
    /// All cell types, in a fixed order.
    pub const ALL: [CellType; 4] = [
        CellType::Empty,
        CellType::Structural,
        CellType::Actuator,
        CellType::Signaling,
    ];

    /// Draws any cell type uniformly, including [`CellType::Empty`].
    pub fn random<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(0..Self::ALL.len())]
    }

    /// Draws a non-empty cell type uniformly.
    pub fn random_tissue<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self::ALL[rng.random_range(1..Self::ALL.len())]
    }

    /// Whether the cell carries tissue.
    pub fn is_tissue(self) -> bool {
        self != CellType::Empty
    }
}

/// Breeding-isolated lineage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpeciesId(pub u16);

impl SpeciesId {
    /// Hue of the species' display colour in degrees.
    pub fn hue(self) -> f32 {
        (f32::from(self.0) * 137.508).rem_euclid(360.0)
    }

    /// Display colour tag, e.g. `hsl(137, 70%, 55%)`.
    pub fn color_tag(self) -> String {
        format!("hsl({:.0}, 70%, 55%)", self.hue())
    }
}

impl fmt::Display for SpeciesId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "species-{}", self.0)
    }
}

/// Grid-encoded body plan plus evolvable scalar traits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    grid: Array2<CellType>,
    /// Plasticity coefficient in `[0, 1]`; higher values forget learned
    /// spring lengths more slowly.
    pub bio_electric_memory: f32,
    /// Lineage the genome breeds within.
    pub species: SpeciesId,
    /// Display tag, inherited from one parent.
    pub color: String,
    /// Generation in which the genome was created.
    pub generation: u32,
    /// Preferred spawn position, if any.
    pub origin: Option<[f32; 2]>,
}

impl Genome {
    /// Builds a genome, rejecting grids of the wrong dimensions.
    pub fn new(
        grid: Array2<CellType>,
        grid_size: usize,
        bio_electric_memory: f32,
        species: SpeciesId,
        generation: u32,
    ) -> Result<Self, GenomeError> {
        let genome = Self {
            grid,
            bio_electric_memory,
            species,
            color: species.color_tag(),
            generation,
            origin: None,
        };
        genome.validate(grid_size)?;
        Ok(genome)
    }

    /// Builds a genome from rows of cells.
    pub fn from_rows(
        rows: &[Vec<CellType>],
        grid_size: usize,
        bio_electric_memory: f32,
        species: SpeciesId,
    ) -> Result<Self, GenomeError> {
        let cols = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|row| row.len() != cols) {
            return Err(GenomeError::GridDimensions {
                expected: grid_size,
                rows: rows.len(),
                cols,
            });
        }
        let cells: Vec<CellType> = rows.iter().flatten().copied().collect();
        let grid = Array2::from_shape_vec((rows.len(), cols), cells).map_err(|_| {
            GenomeError::GridDimensions {
                expected: grid_size,
                rows: rows.len(),
                cols,
            }
        })?;
        Self::new(grid, grid_size, bio_electric_memory, species, 0)
    }

    /// Creates a random, non-empty genome.
    pub fn random<R: Rng + ?Sized>(
        grid_size: usize,
        species: SpeciesId,
        generation: u32,
        rng: &mut R,
    ) -> Self {
        let mut grid = Array2::from_shape_fn((grid_size, grid_size), |_| {
            if rng.random_bool(0.3) {
                CellType::Empty
            } else {
                CellType::random_tissue(rng)
            }
        });
        ensure_viable(&mut grid);

        Self {
            grid,
            bio_electric_memory: rng.random::<f32>(),
            species,
            color: species.color_tag(),
            generation,
            origin: None,
        }
    }

    /// Returns the genome with a spawn origin set.
    #[must_use]
    pub fn with_origin(mut self, x: f32, y: f32) -> Self {
        self.origin = Some([x, y]);
        self
    }

    /// Checks grid dimensions and scalar ranges.
    pub fn validate(&self, grid_size: usize) -> Result<(), GenomeError> {
        let (rows, cols) = self.grid.dim();
        if rows != grid_size || cols != grid_size {
            return Err(GenomeError::GridDimensions {
                expected: grid_size,
                rows,
                cols,
            });
        }
        if !(0.0..=1.0).contains(&self.bio_electric_memory) {
            return Err(GenomeError::Memory(self.bio_electric_memory));
        }
        Ok(())
    }

    /// The cell grid, indexed `[row, col]`.
    pub fn grid(&self) -> &Array2<CellType> {
        &self.grid
    }

    /// Number of cells of the given type.
    pub fn count(&self, cell: CellType) -> usize {
        self.grid.iter().filter(|&&c| c == cell).count()
    }

    /// Whether the grid holds no tissue at all.
    pub fn is_empty(&self) -> bool {
        !self.grid.iter().any(|c| c.is_tissue())
    }
}

/// Breeds a child from two parents of the same species.
///
/// Every cell is inherited from either parent with equal probability. The
/// display tag, species and (for distant parents) the spawn origin come from
/// the same randomly chosen parent; bio-electric memory is averaged.
pub fn crossover<R: Rng + ?Sized>(
    parent_1: &Genome,
    parent_2: &Genome,
    generation: u32,
    merge_radius: f32,
    rng: &mut R,
) -> Genome {
    let grid = Array2::from_shape_fn(parent_1.grid.dim(), |idx| {
        let own = parent_1.grid[idx];
        if rng.random_bool(0.5) {
            own
        } else {
            parent_2.grid.get(idx).copied().unwrap_or(own)
        }
    });

    let (tag_parent, other) = if rng.random_bool(0.5) {
        (parent_1, parent_2)
    } else {
        (parent_2, parent_1)
    };

    let origin = match (tag_parent.origin, other.origin) {
        (Some(a), Some(b)) => {
            let dist = ((a[0] - b[0]).powi(2) + (a[1] - b[1]).powi(2)).sqrt();
            if dist <= merge_radius {
                Some([(a[0] + b[0]) / 2.0, (a[1] + b[1]) / 2.0])
            } else {
                Some(a)
            }
        }
        (Some(a), None) | (None, Some(a)) => Some(a),
        (None, None) => None,
    };

    Genome {
        grid,
        bio_electric_memory: (parent_1.bio_electric_memory + parent_2.bio_electric_memory) / 2.0,
        species: tag_parent.species,
        color: tag_parent.color.clone(),
        generation,
        origin,
    }
}

/// Mutates a genome in place.
///
/// Each cell is replaced by a random cell type with probability
/// `cell_mutation_rate`, memory drifts by at most `memory_mutation_delta`, and
/// with probability `growth_mutation_rate` one empty cell next to existing
/// tissue is filled. The result always holds at least one tissue cell.
pub fn mutate<R: Rng + ?Sized>(genome: &mut Genome, params: &Params, rng: &mut R) {
    for cell in genome.grid.iter_mut() {
        if rng.random_bool(f64::from(params.cell_mutation_rate)) {
            *cell = CellType::random(rng);
        }
    }

    if params.memory_mutation_delta > 0.0 {
        let delta = rng.random_range(-params.memory_mutation_delta..=params.memory_mutation_delta);
        genome.bio_electric_memory = (genome.bio_electric_memory + delta).clamp(0.0, 1.0);
    }

    if rng.random_bool(f64::from(params.growth_mutation_rate)) {
        grow(&mut genome.grid, rng);
    }

    ensure_viable(&mut genome.grid);
}

/// Fills one random empty cell that touches existing tissue.
fn grow<R: Rng + ?Sized>(grid: &mut Array2<CellType>, rng: &mut R) {
    let (rows, cols) = grid.dim();
    let frontier: Vec<(usize, usize)> = grid
        .indexed_iter()
        .filter(|&(_, cell)| !cell.is_tissue())
        .map(|(idx, _)| idx)
        .filter(|&(r, c)| {
            let neighbours = [
                (r.wrapping_sub(1), c),
                (r + 1, c),
                (r, c.wrapping_sub(1)),
                (r, c + 1),
            ];
            neighbours
                .iter()
                .any(|&(nr, nc)| nr < rows && nc < cols && grid[(nr, nc)].is_tissue())
        })
        .collect();

    if frontier.is_empty() {
        return;
    }
    let idx = frontier[rng.random_range(0..frontier.len())];
    grid[idx] = CellType::random_tissue(rng);
}

fn ensure_viable(grid: &mut Array2<CellType>) {
    if grid.iter().any(|c| c.is_tissue()) {
        return;
    }
    let (rows, cols) = grid.dim();
    if rows > 0 && cols > 0 {
        grid[(rows / 2, cols / 2)] = CellType::Structural;
    }
}
