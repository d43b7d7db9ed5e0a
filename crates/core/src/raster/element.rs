//! Cell value trait for landscape rasters

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can be stored in a landscape raster cell.
///
/// All metric computations run in `f64`; integer rasters (categorical maps,
/// integer DEMs) are converted on access through [`RasterElement::to_f64`].
pub trait RasterElement:
    Copy + Debug + PartialOrd + NumCast + Zero + Send + Sync + 'static
{
    /// Whether this value represents no-data
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Convert to `f64`, `None` when the value is not representable
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    nodata.is_some_and(|nd| *self == nd)
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    if self.is_nan() {
                        return true;
                    }
                    nodata.is_some_and(|nd| (self - nd).abs() < <$t>::EPSILON * 100.0)
                }
            }
        )*
    };
}

impl_int_element!(i8, i16, i32, i64, u8, u16, u32);
impl_float_element!(f32, f64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_nan_is_nodata() {
        assert!(f64::NAN.is_nodata(None));
        assert!(!1.0f64.is_nodata(None));
        assert!((-9999.0f64).is_nodata(Some(-9999.0)));
    }

    #[test]
    fn test_int_nodata() {
        assert!(0u8.is_nodata(Some(0)));
        assert!(!5i32.is_nodata(Some(0)));
        assert!(!5i32.is_nodata(None));
    }
}
