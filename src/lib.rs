//! Local triangulation fans for point cloud surfacing.
//!
//! A local triangulation builder produces, per point, a *fan*: the
//! cyclically ordered neighbor ids around that point, plus a border
//! marker for points near the cloud edge. This crate takes those fans
//! from there to a consistent surface preview:
//!
//! - **Merging** - Combine per-chunk partial fan collections into one
//!   cloud-wide CSR store
//! - **Normals** - Angle-weighted per-vertex normals from fan geometry
//! - **Orientation** - Flip fans against a direction field, or derive
//!   one globally consistent winding with no field at all
//! - **Diagnostics** - Triangle repetition and winding-conflict counts
//!   over the whole store
//!
//! Every long pass accepts an optional cancellable progress callback.
//!
//! # Quick Start
//!
//! ```
//! use mesh_fans::{auto_orient_fans, estimate_fan_normals, merge_fans};
//! use mesh_fans::{PartialFans, PointCloud};
//! use nalgebra::Point3;
//!
//! // Fans for a single triangle, one partial collection per chunk.
//! let mut chunk = PartialFans::new();
//! chunk.push_fan(0, Some(2), &[1, 2]);
//! chunk.push_fan(1, Some(0), &[2, 0]);
//! chunk.push_fan(2, Some(1), &[0, 1]);
//!
//! let mut store = merge_fans(&[chunk], None).unwrap();
//!
//! let cloud = PointCloud::from_positions(vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ]);
//!
//! // Make all windings mutually consistent, then read off normals.
//! auto_orient_fans(&cloud, &mut store, None).unwrap();
//! let normals = estimate_fan_normals(&store, &cloud, None).unwrap();
//! assert_eq!(normals.len(), 3);
//! ```
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`fans`] | CSR fan storage, merging, and fan normals |
//! | [`orient`] | Winding correction, consensus, and propagation |
//! | [`cloud`] | Point positions with per-vertex validity |
//! | [`bounds`] | Axis-aligned bounding box |
//! | [`progress`] | Cancellable progress reporting |
//! | [`error`] | Error types |

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![deny(clippy::unwrap_used, clippy::expect_used)]
#![allow(clippy::module_name_repetitions)]
// Allow certain pedantic lints that are too strict for this crate
#![allow(clippy::missing_const_for_fn)] // Not all functions benefit from const
#![allow(clippy::cast_precision_loss)] // Expected when converting counts to f64
#![allow(clippy::cast_possible_truncation)] // Expected for vertex counts into u32
#![allow(clippy::needless_range_loop)] // Sometimes indices are clearer
#![allow(clippy::manual_let_else)] // Match expressions can be clearer

pub mod bounds;
pub mod cloud;
pub mod error;
pub mod fans;
pub mod orient;
pub mod progress;

// Re-export main types at crate root for convenience
pub use bounds::Aabb;
pub use cloud::PointCloud;
pub use error::{FanError, FanResult};
pub use fans::merge::merge_fans;
pub use fans::normals::{estimate_fan_normals, fan_normal};
pub use fans::{FanStore, PartialFans};
pub use orient::consensus::{
    compute_triangle_repetitions, find_repeated_triangles, TriangleRepetitions,
    UnorientedTriangle, WindingVotes,
};
pub use orient::propagate::{auto_orient_fans, OrientStats};
pub use orient::{orient_fans_by_direction, orient_fans_to_normals};
pub use progress::ProgressCallback;

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Point3, Vector3};

    /// End-to-end pass over two chunks of a flat strip: merge, auto
    /// orient, diagnose, and estimate normals.
    #[test]
    fn test_fan_pipeline_workflow() {
        // Strip 0-1-2-3 in the z = 0 plane, split into two chunks with
        // clashing per-chunk windings.
        let mut left = PartialFans::new();
        left.push_fan(0, Some(2), &[1, 2]);
        left.push_fan(1, Some(0), &[3, 2, 0]);
        let mut right = PartialFans::new();
        right.push_fan(2, Some(0), &[3, 1, 0]);
        right.push_fan(3, Some(2), &[1, 2]);

        let mut store = merge_fans(&[left, right], None).unwrap();
        assert_eq!(store.vertex_count(), 4);

        let cloud = PointCloud::from_positions(vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(1.5, 1.0, 0.0),
        ]);
        let stats = auto_orient_fans(&cloud, &mut store, None).unwrap();
        assert_eq!(stats.visited, 4);
        assert_eq!(stats.unreached, 0);

        let reps = compute_triangle_repetitions(&store, None).unwrap();
        assert_eq!(reps.conflicts, 0);
        assert_eq!(reps.thrice, 2);

        let normals = estimate_fan_normals(&store, &cloud, None).unwrap();
        assert_eq!(normals.len(), 4);
        // One consistent side for the whole strip, whichever it is.
        let z = normals[0].z;
        assert!(z.abs() > 0.99);
        for normal in &normals {
            assert!((normal - Vector3::new(0.0, 0.0, z)).norm() < 1e-9);
        }
    }

    #[test]
    fn test_re_exports() {
        let _: FanError = FanError::EmptyInput;
        let _: FanStore = FanStore::new();
        let _: PartialFans = PartialFans::new();
        let _: PointCloud = PointCloud::new();
        let _: Aabb = Aabb::empty();
        let _: OrientStats = OrientStats::default();
        let _: TriangleRepetitions = TriangleRepetitions::default();
        let _: WindingVotes = WindingVotes::default();
    }
}
