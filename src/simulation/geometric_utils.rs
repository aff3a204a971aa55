//! Geometric helpers shared by the physics and field modules.

use geo::algorithm::Distance;
use geo::{BoundingRect, Centroid, Euclidean, MultiPoint, Point};
use ndarray::Array1;

/// Centroid of a set of 2D points, skipping non-finite ones.
///
/// Returns `None` when no finite point is left.
pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Array1<f32>>) -> Option<Array1<f32>> {
    let points = finite_points(points);
    if points.is_empty() {
        return None;
    }
    MultiPoint::new(points)
        .centroid()
        .map(|c| Array1::from_vec(vec![c.x(), c.y()]))
}

/// Width and height of the axis-aligned box around a set of points.
pub fn extent<'a>(points: impl IntoIterator<Item = &'a Array1<f32>>) -> (f32, f32) {
    MultiPoint::new(finite_points(points))
        .bounding_rect()
        .map_or((0.0, 0.0), |rect| (rect.width(), rect.height()))
}

/// Euclidean distance between two 2D vectors.
pub fn distance(a: &Array1<f32>, b: &Array1<f32>) -> f32 {
    Euclidean.distance(Point::new(a[0], a[1]), Point::new(b[0], b[1]))
}

/// Whether both components of a 2D vector are finite.
pub fn is_finite(v: &Array1<f32>) -> bool {
    v.iter().all(|x| x.is_finite())
}

fn finite_points<'a>(points: impl IntoIterator<Item = &'a Array1<f32>>) -> Vec<Point<f32>> {
    points
        .into_iter()
        .filter(|p| is_finite(p))
        .map(|p| Point::new(p[0], p[1]))
        .collect()
}
