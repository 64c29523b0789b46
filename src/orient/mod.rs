//! Winding orientation of neighbor fans.
//!
//! Fans arriving from a local triangulation builder agree on geometry but
//! not on winding: each chunk picks its own handedness per vertex. This
//! module corrects windings at two levels:
//!
//! - [`orient_fans_by_direction`] — a per-vertex, data-parallel pass that
//!   flips a fan when the majority of its triangle normals disagree with
//!   a caller-supplied target direction.
//! - [`auto_orient_fans`] — a global pass that needs no usable direction
//!   field: it seeds from a bounding-box heuristic, then region-grows a
//!   single mutually consistent winding across the cloud by voting over
//!   shared triangles.
//!
//! [`auto_orient_fans`]: crate::auto_orient_fans

pub mod consensus;
mod heap;
pub mod propagate;

use nalgebra::{Point3, Vector3};
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

use crate::error::{FanError, FanResult};
use crate::fans::{reverse_fan_slice, FanStore};
use crate::progress::{report, ProgressCallback, ProgressCounter};

/// Flips every fan whose winding disagrees with a target direction.
///
/// For each vertex `v` independently, every valid fan triangle votes with
/// the sign of `dot(dir(v), cross(p[next] - p[v], p[curr] - p[v]))`. A
/// negative net vote reverses the fan in place; a tie keeps the input
/// order. The pass is order-independent and runs data-parallel, each
/// worker owning its vertex's slice of the store exclusively.
///
/// Returns the number of flipped fans.
///
/// # Errors
///
/// [`FanError::Cancelled`] if the progress callback asked to stop. The
/// callback is consulted before any mutation, so an immediate cancel
/// leaves the store untouched; a mid-run cancel may leave some fans
/// already flipped (their individual flips are valid on their own).
pub fn orient_fans_by_direction(
    store: &mut FanStore,
    points: &[Point3<f64>],
    target_dir: impl Fn(u32) -> Vector3<f64> + Sync,
    progress: Option<&ProgressCallback>,
) -> FanResult<usize> {
    if store.vertex_count() == 0 {
        return Ok(0);
    }
    if !report(progress, 0.0) {
        return Err(FanError::Cancelled);
    }

    let counter = ProgressCounter::new(progress, store.vertex_count(), 0.0, 1.0);
    let flipped = AtomicUsize::new(0);
    store
        .par_fans_mut()
        .with_min_len(ProgressCounter::CHECK_EVERY)
        .for_each(|(v, border, fan)| {
            if !counter.add(1) || fan.is_empty() {
                return;
            }
            let dir = target_dir(v);
            let pv = points[v as usize];
            let mut sum = 0i64;
            for i in 0..fan.len() {
                let curr = fan[i];
                if Some(curr) == *border {
                    continue;
                }
                let next = fan[if i + 1 < fan.len() { i + 1 } else { 0 }];
                let d = dir.dot(
                    &(points[next as usize] - pv).cross(&(points[curr as usize] - pv)),
                );
                if d > 0.0 {
                    sum += 1;
                } else if d < 0.0 {
                    sum -= 1;
                }
            }
            if sum >= 0 {
                return; // majority already agrees with the target
            }
            reverse_fan_slice(fan, border);
            flipped.fetch_add(1, Ordering::Relaxed);
        });
    if counter.is_cancelled() {
        return Err(FanError::Cancelled);
    }

    let flipped = flipped.into_inner();
    debug!(flipped, "oriented fans against target direction field");
    Ok(flipped)
}

/// Flips every fan whose winding disagrees with a precomputed normal
/// field, one normal per vertex id.
///
/// Convenience wrapper over [`orient_fans_by_direction`].
///
/// # Errors
///
/// Same as [`orient_fans_by_direction`].
pub fn orient_fans_to_normals(
    store: &mut FanStore,
    points: &[Point3<f64>],
    normals: &[Vector3<f64>],
    progress: Option<&ProgressCallback>,
) -> FanResult<usize> {
    orient_fans_by_direction(store, points, |v| normals[v as usize], progress)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fans::test_fixtures::grid_store;

    #[test]
    fn test_aligned_fans_are_untouched() {
        let (mut store, points) = grid_store();
        let before = store.clone();
        // Grid fans are wound clockwise seen from +z, so they agree with +z.
        let flips =
            orient_fans_by_direction(&mut store, &points, |_| Vector3::z(), None).unwrap();
        assert_eq!(flips, 0);
        assert_eq!(store, before);
    }

    #[test]
    fn test_opposing_direction_flips_every_fan() {
        let (mut store, points) = grid_store();
        let flips =
            orient_fans_by_direction(&mut store, &points, |_| -Vector3::z(), None).unwrap();
        assert_eq!(flips, 9);
        // The corner fan keeps its gap between the same neighbor pair.
        assert_eq!(store.neighbors_of(0), &[1, 4, 3]);
        assert_eq!(store.border(0), Some(3));
    }

    #[test]
    fn test_corrector_is_idempotent() {
        let (mut store, points) = grid_store();
        orient_fans_by_direction(&mut store, &points, |_| -Vector3::z(), None).unwrap();
        let once = store.clone();
        let second_flips =
            orient_fans_by_direction(&mut store, &points, |_| -Vector3::z(), None).unwrap();
        assert_eq!(second_flips, 0);
        assert_eq!(store, once);
    }

    #[test]
    fn test_in_plane_direction_is_a_tie_and_keeps_order() {
        let (mut store, points) = grid_store();
        let before = store.clone();
        // All triangle normals are ±z; an in-plane target scores zero.
        let flips =
            orient_fans_by_direction(&mut store, &points, |_| Vector3::x(), None).unwrap();
        assert_eq!(flips, 0);
        assert_eq!(store, before);
    }

    #[test]
    fn test_orient_to_normals_field() {
        let (mut store, points) = grid_store();
        let normals = vec![-Vector3::z(); points.len()];
        let flips = orient_fans_to_normals(&mut store, &points, &normals, None).unwrap();
        assert_eq!(flips, 9);
    }

    #[test]
    fn test_immediate_cancel_leaves_store_untouched() {
        let (mut store, points) = grid_store();
        let before = store.clone();
        let cancel: ProgressCallback = Box::new(|_| false);
        let result =
            orient_fans_by_direction(&mut store, &points, |_| -Vector3::z(), Some(&cancel));
        assert_eq!(result, Err(FanError::Cancelled));
        assert_eq!(store, before);
    }
}
