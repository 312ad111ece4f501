//! Cell value types

use num_traits::{NumCast, Zero};
use std::fmt::Debug;

/// Types that can be stored in a raster cell.
///
/// Classification inputs are `f64`; class rasters are `i32`. The remaining
/// integer widths exist so that GeoTIFFs of any common sample type can be
/// read and cast.
pub trait RasterElement:
    Copy + Debug + PartialOrd + PartialEq + NumCast + Zero + Send + Sync + 'static
{
    /// Sentinel used when a value cannot be represented in this type
    fn default_nodata() -> Self;

    /// Whether this value is nodata under the given sentinel.
    ///
    /// Float NaN is always nodata, with or without a sentinel.
    fn is_nodata(&self, nodata: Option<Self>) -> bool;

    /// Whether this type is a floating point type
    fn is_float() -> bool;

    /// Lossy conversion to f64
    fn to_f64(self) -> Option<f64> {
        NumCast::from(self)
    }
}

macro_rules! impl_int_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::MIN
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    nodata == Some(*self)
                }

                fn is_float() -> bool {
                    false
                }
            }
        )*
    };
}

macro_rules! impl_float_element {
    ($($t:ty),*) => {
        $(
            impl RasterElement for $t {
                fn default_nodata() -> Self {
                    <$t>::NAN
                }

                fn is_nodata(&self, nodata: Option<Self>) -> bool {
                    if self.is_nan() {
                        return true;
                    }
                    match nodata {
                        Some(nd) if *self == nd => true,
                        // Cells stored as f32 samples match the sentinel at f32 precision.
                        Some(nd) => {
                            let nd32 = nd as f32;
                            nd32.is_finite() && *self as f32 == nd32
                        }
                        None => false,
                    }
                }

                fn is_float() -> bool {
                    true
                }
            }
        )*
    };
}

impl_int_element!(i8, i16, i32, i64, u8, u16, u32, u64);
impl_float_element!(f32, f64);
