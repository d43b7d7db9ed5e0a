//! Affine georeferencing for rasters

use serde::{Deserialize, Serialize};

use crate::vector::BoundingBox;

/// Affine transformation between pixel space (col, row) and map space (x, y):
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up rasters have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size in X
    pub pixel_width: f64,
    /// Cell size in Y, usually negative
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// Map coordinates of the pixel center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64 + 0.5, row as f64 + 0.5)
    }

    /// Map coordinates of the pixel's upper-left corner
    pub fn pixel_to_geo_corner(&self, col: usize, row: usize) -> (f64, f64) {
        self.apply(col as f64, row as f64)
    }

    fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        let x = self.origin_x + col * self.pixel_width + row * self.row_rotation;
        let y = self.origin_y + col * self.col_rotation + row * self.pixel_height;
        (x, y)
    }

    /// Fractional pixel coordinates (col, row) of a map position.
    ///
    /// Returns NaN for a degenerate transform.
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        let det = self.pixel_width * self.pixel_height - self.row_rotation * self.col_rotation;

        if det.abs() < 1e-12 {
            return (f64::NAN, f64::NAN);
        }

        let dx = x - self.origin_x;
        let dy = y - self.origin_y;

        let col = (self.pixel_height * dx - self.row_rotation * dy) / det;
        let row = (-self.col_rotation * dx + self.pixel_width * dy) / det;

        (col, row)
    }

    /// Cell width in map units
    pub fn cell_width(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Cell height in map units
    pub fn cell_height(&self) -> f64 {
        self.pixel_height.abs()
    }

    /// Bounding box of a raster with `cols` x `rows` cells
    pub fn bounds(&self, cols: usize, rows: usize) -> BoundingBox {
        let corners = [
            self.pixel_to_geo_corner(0, 0),
            self.pixel_to_geo_corner(cols, 0),
            self.pixel_to_geo_corner(0, rows),
            self.pixel_to_geo_corner(cols, rows),
        ];

        corners.iter().skip(1).fold(
            BoundingBox::new(corners[0].0, corners[0].1, corners[0].0, corners[0].1),
            |bb, &(x, y)| bb.expand_to(x, y),
        )
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_to_geo_center() {
        let gt = GeoTransform::new(100.0, 200.0, 10.0, -10.0);

        let (x, y) = gt.pixel_to_geo(5, 10);
        assert_relative_eq!(x, 155.0, epsilon = 1e-10);
        assert_relative_eq!(y, 95.0, epsilon = 1e-10);

        let (col, row) = gt.geo_to_pixel(x, y);
        assert_relative_eq!(col, 5.5, epsilon = 1e-10);
        assert_relative_eq!(row, 10.5, epsilon = 1e-10);
    }

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 2.0, -1.0);
        let bb = gt.bounds(50, 100);

        assert_relative_eq!(bb.min_x, 0.0);
        assert_relative_eq!(bb.min_y, 0.0);
        assert_relative_eq!(bb.max_x, 100.0);
        assert_relative_eq!(bb.max_y, 100.0);
        assert_relative_eq!(gt.cell_width(), 2.0);
        assert_relative_eq!(gt.cell_height(), 1.0);
    }
}
