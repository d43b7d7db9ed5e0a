//! Zone rasterization onto a value raster's cell grid

use geo::{Intersects, Point};
use geodiv_core::{Raster, Result};

use crate::maybe_rayon::*;
use crate::zones::ZoneIndex;

/// Burn zones into an `i32` raster aligned with `template`.
///
/// Each cell holds the grid-order position of its zone plus one, or 0 when
/// its center lies in no zone. A center on a shared border goes to the first
/// zone in grid order.
pub fn rasterize_zones<T>(zones: &ZoneIndex, template: &Raster<T>) -> Result<Raster<i32>>
where
    T: geodiv_core::RasterElement,
{
    let (rows, cols) = template.shape();

    let data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![0i32; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let (x, y) = template.pixel_to_geo(col, row);
                let center = Point::new(x, y);
                *out = zones
                    .iter()
                    .position(|zone| {
                        zone.bounds.is_some_and(|bb| bb.contains_point(x, y))
                            && zone.polygon.intersects(&center)
                    })
                    .map_or(0, |i| i as i32 + 1);
            }
            row_data
        })
        .collect();

    let mut output = Raster::from_vec(data, rows, cols)?;
    output.set_transform(*template.transform());
    output.set_nodata(Some(0));
    Ok(output)
}
