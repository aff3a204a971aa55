//! Spatial indexing for efficient neighbour queries.

use kdtree::KdTree;
use kdtree::distance::squared_euclidean;
use ndarray::Array1;
use tracing::warn;

/// Type alias for 2D spatial KD-tree used for efficient neighbor queries.
pub type Tree2D = KdTree<f32, usize, Vec<f32>>;

/// Result of a spatial radius query: (`distance_squared`, index) pairs.
pub type SpatialQueryResult = Vec<(f32, usize)>;

/// KD-tree over the positions of one kind of entity.
pub struct SpatialIndex {
    tree: Tree2D,
}

impl SpatialIndex {
    /// Builds an index over `items`.
    ///
    /// Items for which `get_pos` returns `None`, or a non-finite position, are
    /// left out; the stored value is the item's index in `items`.
    pub fn build<T>(items: &[T], get_pos: impl Fn(&T) -> Option<Vec<f32>>) -> Self {
        let mut tree = KdTree::with_capacity(2, items.len().max(1));
        for (i, item) in items.iter().enumerate() {
            let Some(pos) = get_pos(item) else { continue };
            if !pos.iter().all(|v| v.is_finite()) {
                continue;
            }
            if let Err(e) = tree.add(pos, i) {
                warn!(index = i, error = ?e, "failed to insert into spatial index");
            }
        }
        Self { tree }
    }

    /// Query items within a radius.
    ///
    /// # Arguments
    ///
    /// * `pos` - Center position for the query
    /// * `radius` - Search radius (will be squared internally)
    pub fn query(&self, pos: &Array1<f32>, radius: f32) -> SpatialQueryResult {
        self.tree
            .within(&pos.to_vec(), radius.powi(2), &squared_euclidean)
            .unwrap_or_default()
            .into_iter()
            .map(|(dist, &idx)| (dist, idx))
            .collect()
    }

    /// Number of indexed items.
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
