//! Axis-aligned extents

use serde::{Deserialize, Serialize};

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl BoundingBox {
    pub fn new(min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Self {
        Self { min_x, min_y, max_x, max_y }
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Grow the box to include (x, y)
    pub fn expand_to(self, x: f64, y: f64) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
        }
    }

    /// Smallest box containing both
    pub fn union(self, other: &BoundingBox) -> Self {
        Self {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains_point(&self, x: f64, y: f64) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }

    /// Closed-interval overlap test; touching boxes intersect
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    pub fn is_disjoint(&self, other: &BoundingBox) -> bool {
        !self.intersects(other)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intersects() {
        let a = BoundingBox::new(0.0, 0.0, 10.0, 10.0);
        let b = BoundingBox::new(5.0, 5.0, 15.0, 15.0);
        let c = BoundingBox::new(20.0, 20.0, 30.0, 30.0);
        let touching = BoundingBox::new(10.0, 0.0, 12.0, 10.0);

        assert!(a.intersects(&b));
        assert!(a.is_disjoint(&c));
        assert!(a.intersects(&touching));
    }

    #[test]
    fn test_union_and_expand() {
        let a = BoundingBox::new(0.0, 0.0, 1.0, 1.0);
        let b = BoundingBox::new(-1.0, 2.0, 0.5, 3.0);
        let u = a.union(&b);
        assert_eq!(u, BoundingBox::new(-1.0, 0.0, 1.0, 3.0));
        assert_eq!(u.expand_to(4.0, -2.0), BoundingBox::new(-1.0, -2.0, 4.0, 3.0));
        assert!(u.contains_point(0.0, 2.5));
        assert_eq!(u.width(), 2.0);
        assert_eq!(u.height(), 3.0);
    }
}
