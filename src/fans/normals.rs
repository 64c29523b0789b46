//! Per-vertex normal estimation from neighbor fans.

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use tracing::debug;

use crate::cloud::PointCloud;
use crate::error::{FanError, FanResult};
use crate::fans::FanStore;
use crate::progress::{ProgressCallback, ProgressCounter};

/// Facets with a cross product shorter than this contribute no direction.
const DEGENERATE_SQ: f64 = f64::EPSILON * f64::EPSILON;

/// Computes the normal of vertex `v` from its fan.
///
/// Each valid fan triangle contributes its unit facet normal weighted by
/// the angle it subtends at `v`, which keeps slivers from dominating the
/// estimate. With clockwise-wound fans the result points toward the
/// viewer of that winding.
///
/// Returns the zero vector for empty or fully degenerate fans; the
/// caller decides whether that is an error.
///
/// # Example
///
/// ```
/// use mesh_fans::{fan_normal, FanStore};
/// use nalgebra::Point3;
///
/// let store = FanStore {
///     offsets: vec![0, 3, 3, 3, 3],
///     borders: vec![None; 4],
///     neighbors: vec![1, 2, 3],
/// };
/// let points = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(-0.5, -1.0, 0.0),
///     Point3::new(-0.5, 1.0, 0.0),
/// ];
/// let normal = fan_normal(&store, &points, 0);
/// assert!((normal.norm() - 1.0).abs() < 1e-12);
/// ```
#[must_use]
pub fn fan_normal(store: &FanStore, points: &[Point3<f64>], v: u32) -> Vector3<f64> {
    let pv = points[v as usize];
    let mut sum = Vector3::zeros();
    for [_, next, curr] in store.fan_triangles(v) {
        let d0 = points[next as usize] - pv;
        let d1 = points[curr as usize] - pv;
        let facet = d0.cross(&d1);
        let norm_sq = facet.norm_squared();
        if norm_sq <= DEGENERATE_SQ {
            continue;
        }
        sum += d0.angle(&d1) * (facet / norm_sq.sqrt());
    }
    let len = sum.norm();
    if len * len <= DEGENERATE_SQ {
        Vector3::zeros()
    } else {
        sum / len
    }
}

/// Computes normals for every vertex covered by the store.
///
/// Invalid vertices and vertices without fans get the zero vector.
/// Runs data-parallel over vertices.
///
/// # Errors
///
/// [`FanError::Cancelled`] if the progress callback asked to stop.
pub fn estimate_fan_normals(
    store: &FanStore,
    cloud: &PointCloud,
    progress: Option<&ProgressCallback>,
) -> FanResult<Vec<Vector3<f64>>> {
    let counter = ProgressCounter::new(progress, store.vertex_count(), 0.0, 1.0);
    let normals: Vec<Vector3<f64>> = (0..store.vertex_count() as u32)
        .into_par_iter()
        .with_min_len(ProgressCounter::CHECK_EVERY)
        .map(|v| {
            if !counter.add(1) || !cloud.is_valid(v) {
                return Vector3::zeros();
            }
            fan_normal(store, &cloud.points, v)
        })
        .collect();
    if counter.is_cancelled() {
        return Err(FanError::Cancelled);
    }
    debug!(vertices = normals.len(), "estimated fan normals");
    Ok(normals)
}
