//! Main Raster type

use crate::error::{Error, Result};
use crate::raster::{GeoTransform, RasterElement};
use crate::vector::BoundingBox;
use ndarray::{Array2, ArrayView2};

/// A georeferenced 2D raster grid.
///
/// `Raster<T>` stores values of type `T` in row-major order together with
/// the affine transform that places it in map space and an optional
/// no-data value.
///
/// # Example
///
/// ```ignore
/// use geodiv_core::{GeoTransform, Raster};
///
/// let mut dem: Raster<f64> = Raster::filled(10, 10, 250.0);
/// dem.set_transform(GeoTransform::new(0.0, 10.0, 1.0, -1.0));
/// let z = dem.sample(4.5, 4.5);
/// ```
#[derive(Debug, Clone)]
pub struct Raster<T: RasterElement> {
    data: Array2<T>,
    transform: GeoTransform,
    nodata: Option<T>,
}

impl<T: RasterElement> Raster<T> {
    /// Create a new raster filled with zeros
    pub fn new(rows: usize, cols: usize) -> Self {
        Self::from_array(Array2::zeros((rows, cols)))
    }

    /// Create a new raster filled with a specific value
    pub fn filled(rows: usize, cols: usize, value: T) -> Self {
        Self::from_array(Array2::from_elem((rows, cols), value))
    }

    /// Create a raster from row-major data
    pub fn from_vec(data: Vec<T>, rows: usize, cols: usize) -> Result<Self> {
        if data.len() != rows * cols {
            return Err(Error::InvalidDimensions {
                width: cols,
                height: rows,
            });
        }

        let array = Array2::from_shape_vec((rows, cols), data)
            .map_err(|e| Error::Other(e.to_string()))?;

        Ok(Self::from_array(array))
    }

    /// Create a raster from an ndarray
    pub fn from_array(data: Array2<T>) -> Self {
        Self {
            data,
            transform: GeoTransform::default(),
            nodata: None,
        }
    }

    /// Raster with the same shape and georeferencing, values mapped through `f`.
    ///
    /// No-data cells become NaN in the output.
    pub fn map_valid<F>(&self, f: F) -> Raster<f64>
    where
        F: Fn(f64) -> f64,
    {
        let data = self.data.mapv(|v| {
            if v.is_nodata(self.nodata) {
                f64::NAN
            } else {
                v.to_f64().map(&f).unwrap_or(f64::NAN)
            }
        });

        Raster {
            data,
            transform: self.transform,
            nodata: Some(f64::NAN),
        }
    }

    pub fn rows(&self) -> usize {
        self.data.nrows()
    }

    pub fn cols(&self) -> usize {
        self.data.ncols()
    }

    /// Dimensions as (rows, cols)
    pub fn shape(&self) -> (usize, usize) {
        self.data.dim()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get value at (row, col)
    pub fn get(&self, row: usize, col: usize) -> Result<T> {
        self.data
            .get((row, col))
            .copied()
            .ok_or(Error::IndexOutOfBounds {
                row,
                col,
                rows: self.rows(),
                cols: self.cols(),
            })
    }

    /// Set value at (row, col)
    pub fn set(&mut self, row: usize, col: usize, value: T) -> Result<()> {
        let (rows, cols) = self.shape();
        match self.data.get_mut((row, col)) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(Error::IndexOutOfBounds { row, col, rows, cols }),
        }
    }

    /// Valid cell value as `f64`, `None` for no-data or out-of-range cells
    pub fn value(&self, row: usize, col: usize) -> Option<f64> {
        let v = *self.data.get((row, col))?;
        if v.is_nodata(self.nodata) {
            return None;
        }
        v.to_f64().filter(|f| f.is_finite())
    }

    pub fn view(&self) -> ArrayView2<'_, T> {
        self.data.view()
    }

    pub fn data(&self) -> &Array2<T> {
        &self.data
    }

    pub fn transform(&self) -> &GeoTransform {
        &self.transform
    }

    pub fn set_transform(&mut self, transform: GeoTransform) {
        self.transform = transform;
    }

    pub fn nodata(&self) -> Option<T> {
        self.nodata
    }

    pub fn set_nodata(&mut self, nodata: Option<T>) {
        self.nodata = nodata;
    }

    pub fn cell_width(&self) -> f64 {
        self.transform.cell_width()
    }

    pub fn cell_height(&self) -> f64 {
        self.transform.cell_height()
    }

    /// Map-space extent of the raster
    pub fn extent(&self) -> BoundingBox {
        self.transform.bounds(self.cols(), self.rows())
    }

    /// Map coordinates of a cell center
    pub fn pixel_to_geo(&self, col: usize, row: usize) -> (f64, f64) {
        self.transform.pixel_to_geo(col, row)
    }

    /// Fractional pixel coordinates of a map position
    pub fn geo_to_pixel(&self, x: f64, y: f64) -> (f64, f64) {
        self.transform.geo_to_pixel(x, y)
    }

    /// Bilinear sample at a map position.
    ///
    /// Interpolates between the four surrounding cell centers. Positions
    /// within half a cell of the edge are clamped to the outermost centers.
    /// When one of the four neighbours is no-data the value of the cell
    /// containing the point is used instead. Returns `None` outside the
    /// raster extent or on a no-data cell.
    pub fn sample(&self, x: f64, y: f64) -> Option<f64> {
        let (rows, cols) = self.shape();
        if rows == 0 || cols == 0 {
            return None;
        }

        let (c, r) = self.geo_to_pixel(x, y);
        if !c.is_finite() || !r.is_finite() {
            return None;
        }

        // Points on the far edge of the extent belong to the last cell.
        const EDGE_EPS: f64 = 1e-9;
        if c < -EDGE_EPS || r < -EDGE_EPS || c > cols as f64 + EDGE_EPS || r > rows as f64 + EDGE_EPS {
            return None;
        }

        let cell_col = (c.floor().max(0.0) as usize).min(cols - 1);
        let cell_row = (r.floor().max(0.0) as usize).min(rows - 1);

        let fx = (c - 0.5).clamp(0.0, (cols - 1) as f64);
        let fy = (r - 0.5).clamp(0.0, (rows - 1) as f64);
        let c0 = fx.floor() as usize;
        let r0 = fy.floor() as usize;
        let c1 = (c0 + 1).min(cols - 1);
        let r1 = (r0 + 1).min(rows - 1);
        let tx = fx - c0 as f64;
        let ty = fy - r0 as f64;

        match (
            self.value(r0, c0),
            self.value(r0, c1),
            self.value(r1, c0),
            self.value(r1, c1),
        ) {
            (Some(v00), Some(v01), Some(v10), Some(v11)) => {
                let top = v00 * (1.0 - tx) + v01 * tx;
                let bottom = v10 * (1.0 - tx) + v11 * tx;
                Some(top * (1.0 - ty) + bottom * ty)
            }
            _ => self.value(cell_row, cell_col),
        }
    }

    /// Check if a value is no-data
    pub fn is_nodata(&self, value: T) -> bool {
        value.is_nodata(self.nodata)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn ramp() -> Raster<f64> {
        // value = col, 4x4 cells of size 1, origin (0, 4)
        let mut r = Raster::new(4, 4);
        r.set_transform(GeoTransform::new(0.0, 4.0, 1.0, -1.0));
        for row in 0..4 {
            for col in 0..4 {
                r.set(row, col, col as f64).unwrap();
            }
        }
        r
    }

    #[test]
    fn test_raster_access() {
        let mut raster: Raster<f32> = Raster::new(10, 10);
        raster.set(5, 5, 42.0).unwrap();
        assert_eq!(raster.get(5, 5).unwrap(), 42.0);
        assert!(raster.set(10, 0, 1.0).is_err());
    }

    #[test]
    fn test_extent() {
        let r = ramp();
        let bb = r.extent();
        assert_relative_eq!(bb.min_x, 0.0);
        assert_relative_eq!(bb.max_y, 4.0);
        assert_relative_eq!(bb.max_x, 4.0);
    }

    #[test]
    fn test_sample_bilinear() {
        let r = ramp();
        // Halfway between centers of col 1 (x=1.5) and col 2 (x=2.5)
        assert_relative_eq!(r.sample(2.0, 2.0).unwrap(), 1.5, epsilon = 1e-10);
        // Exactly on a center
        assert_relative_eq!(r.sample(0.5, 3.5).unwrap(), 0.0, epsilon = 1e-10);
        // Clamped at the outer edge
        assert_relative_eq!(r.sample(4.0, 2.0).unwrap(), 3.0, epsilon = 1e-10);
        assert!(r.sample(5.0, 2.0).is_none());
    }

    #[test]
    fn test_sample_nodata_falls_back_to_cell() {
        let mut r = ramp();
        r.set(1, 2, f64::NAN).unwrap();
        // Neighbourhood includes the NaN cell, containing cell is (1, 1)
        assert_relative_eq!(r.sample(1.9, 2.6).unwrap(), 1.0, epsilon = 1e-10);
        assert!(r.sample(2.5, 2.5).is_none());
    }

    #[test]
    fn test_map_valid() {
        let mut r: Raster<i32> = Raster::filled(2, 2, 90);
        r.set_nodata(Some(-1));
        r.set(0, 0, -1).unwrap();
        let m = r.map_valid(|v| v / 90.0);
        assert!(m.get(0, 0).unwrap().is_nan());
        assert_relative_eq!(m.get(1, 1).unwrap(), 1.0);
    }
}
