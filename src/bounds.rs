//! Axis-aligned bounding box for point clouds.

use nalgebra::{Point3, Vector3};

/// An axis-aligned bounding box.
///
/// Used by the orientation propagator to derive its seed direction field
/// (away from the box center) and its initial visiting priorities.
///
/// # Example
///
/// ```
/// use mesh_fans::Aabb;
/// use nalgebra::Point3;
///
/// let points = vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 4.0, 6.0)];
/// let aabb = Aabb::from_points(points.iter());
///
/// assert_eq!(aabb.center(), Point3::new(1.0, 2.0, 3.0));
/// assert_eq!(aabb.size().y, 4.0);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner (smallest x, y, z values).
    pub min: Point3<f64>,
    /// Maximum corner (largest x, y, z values).
    pub max: Point3<f64>,
}

impl Aabb {
    /// Creates an empty (inverted) box that any point expands.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Creates a box covering all given points.
    ///
    /// Returns an empty box for an empty iterator.
    #[must_use]
    pub fn from_points<'a>(points: impl Iterator<Item = &'a Point3<f64>>) -> Self {
        let mut aabb = Self::empty();
        for point in points {
            aabb.expand_to_include(point);
        }
        aabb
    }

    /// Grows the box to include `point`.
    pub fn expand_to_include(&mut self, point: &Point3<f64>) {
        self.min.x = self.min.x.min(point.x);
        self.min.y = self.min.y.min(point.y);
        self.min.z = self.min.z.min(point.z);
        self.max.x = self.max.x.max(point.x);
        self.max.y = self.max.y.max(point.y);
        self.max.z = self.max.z.max(point.z);
    }

    /// Returns true if the box contains no points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Center of the box.
    #[must_use]
    pub fn center(&self) -> Point3<f64> {
        nalgebra::center(&self.min, &self.max)
    }

    /// Edge lengths of the box.
    #[must_use]
    pub fn size(&self) -> Vector3<f64> {
        self.max - self.min
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_box() {
        let aabb = Aabb::empty();
        assert!(aabb.is_empty());
    }

    #[test]
    fn test_from_points() {
        let points = vec![
            Point3::new(1.0, 2.0, 3.0),
            Point3::new(-1.0, 0.0, 5.0),
            Point3::new(0.0, 4.0, 4.0),
        ];
        let aabb = Aabb::from_points(points.iter());
        assert!(!aabb.is_empty());
        assert_eq!(aabb.min, Point3::new(-1.0, 0.0, 3.0));
        assert_eq!(aabb.max, Point3::new(1.0, 4.0, 5.0));
        assert_eq!(aabb.center(), Point3::new(0.0, 2.0, 4.0));
        assert_eq!(aabb.size(), Vector3::new(2.0, 4.0, 2.0));
    }

    #[test]
    fn test_expand_single_point() {
        let mut aabb = Aabb::empty();
        aabb.expand_to_include(&Point3::new(3.0, 3.0, 3.0));
        assert!(!aabb.is_empty());
        assert_eq!(aabb.center(), Point3::new(3.0, 3.0, 3.0));
        assert_eq!(aabb.size(), Vector3::zeros());
    }
}
