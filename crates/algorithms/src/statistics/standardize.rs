//! Standardized BPI
//!
//! Rescales a BPI raster to a z-score in hundredths of a standard deviation,
//! rounded half up and truncated toward zero:
//!
//!   std_bpi = trunc((bpi - mean) / std * 100 + 0.5)
//!
//! Mean and population standard deviation are taken over valid cells, so
//! fine and broad scale BPI become comparable against one rule table.

use crate::maybe_rayon::*;
use benthic_core::raster::Raster;
use benthic_core::{Algorithm, Error, Result};

/// BPI standardization algorithm
#[derive(Debug, Clone, Default)]
pub struct StandardizeBpi;

impl Algorithm for StandardizeBpi {
    type Input = Raster<f64>;
    type Output = Raster<f64>;
    type Params = ();
    type Error = Error;

    fn name(&self) -> &'static str {
        "Standardize BPI"
    }

    fn description(&self) -> &'static str {
        "BPI z-score scaled by 100 and rounded"
    }

    fn execute(&self, input: Self::Input, _params: Self::Params) -> Result<Self::Output> {
        standardize_bpi(&input)
    }
}

/// Standardize a BPI raster.
///
/// Nodata cells stay nodata (NaN in the output).
///
/// # Errors
/// `InvalidParameter` if the raster has no valid cells or is constant.
pub fn standardize_bpi(bpi: &Raster<f64>) -> Result<Raster<f64>> {
    let stats = bpi.statistics();
    let (mean, std) = match (stats.mean, stats.std_dev) {
        (Some(mean), Some(std)) => (mean, std),
        _ => {
            return Err(Error::InvalidParameter {
                name: "bpi",
                value: format!("{} valid cells", stats.valid_count),
                reason: "raster has no valid cells".into(),
            })
        }
    };
    if std <= f64::EPSILON * mean.abs().max(1.0) {
        return Err(Error::InvalidParameter {
            name: "bpi",
            value: format!("std = {}", std),
            reason: "cannot standardize a constant raster".into(),
        });
    }

    let (rows, cols) = bpi.shape();
    let data: Vec<f64> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![f64::NAN; cols];
            for (col, out) in row_data.iter_mut().enumerate() {
                let v = unsafe { bpi.get_unchecked(row, col) };
                if !bpi.is_nodata(v) {
                    *out = ((v - mean) / std * 100.0 + 0.5).trunc();
                }
            }
            row_data
        })
        .collect();

    let mut output = bpi.derive(data)?;
    output.set_nodata(Some(f64::NAN));
    Ok(output)
}
