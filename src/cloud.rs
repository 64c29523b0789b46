//! Point cloud positions with per-vertex validity.
//!
//! The cloud is an external input here: building neighbor fans from raw
//! points is the job of a local triangulation builder upstream. This type
//! carries only what the fan passes need — positions, which vertex ids
//! are in use, and a bounding-box query.

use nalgebra::Point3;

use crate::bounds::Aabb;

/// A point cloud with per-vertex validity flags.
///
/// Vertex ids are indices into `points`; `valid` marks which ids are in
/// use. Invalid vertices keep a position slot so ids stay stable, but no
/// pass ever orients or visits them.
///
/// # Example
///
/// ```
/// use mesh_fans::PointCloud;
/// use nalgebra::Point3;
///
/// let cloud = PointCloud::from_positions(vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
/// ]);
/// assert_eq!(cloud.len(), 2);
/// assert_eq!(cloud.valid_count(), 2);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PointCloud {
    /// Vertex positions, indexed by vertex id.
    pub points: Vec<Point3<f64>>,

    /// Validity flag per vertex id, same length as `points`.
    pub valid: Vec<bool>,
}

impl PointCloud {
    /// Creates an empty cloud.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a cloud where every position is a valid vertex.
    #[must_use]
    pub fn from_positions(points: Vec<Point3<f64>>) -> Self {
        let valid = vec![true; points.len()];
        Self { points, valid }
    }

    /// Number of vertex id slots (valid or not).
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if the cloud has no vertex slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Number of valid vertices.
    #[must_use]
    pub fn valid_count(&self) -> usize {
        self.valid.iter().filter(|&&v| v).count()
    }

    /// Returns true if vertex `v` exists and is valid.
    #[must_use]
    pub fn is_valid(&self, v: u32) -> bool {
        self.valid.get(v as usize).copied().unwrap_or(false)
    }

    /// Bounding box of the valid vertices.
    ///
    /// Empty box if the cloud has no valid vertices.
    #[must_use]
    pub fn bounding_box(&self) -> Aabb {
        Aabb::from_points(
            self.points
                .iter()
                .zip(&self.valid)
                .filter_map(|(p, &ok)| ok.then_some(p)),
        )
    }
}
