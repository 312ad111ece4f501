//! Multi-layer rule classification
//!
//! Every cell of an aligned layer stack (fine BPI, broad BPI, slope, depth,
//! ...) is assigned the code of the first rule in a [`RuleTable`] whose
//! ranges all contain the cell's values:
//!
//! 1. nodata in any layer → output nodata
//! 2. first matching rule in table order → its class code
//! 3. no match → the table's unclassified code
//!
//! All structural checks run before the per-cell pass, so a failed call
//! never yields a partial raster.

use crate::maybe_rayon::*;
use benthic_core::raster::Raster;
use benthic_core::{Algorithm, Error, Result};
use tracing::debug;

use super::rule::{RuleTable, CLASS_NODATA};

/// Parameters for rule classification
#[derive(Debug, Clone)]
pub struct ClassifyParams {
    /// Value written to cells where any layer is nodata
    pub nodata: i32,
}

impl Default for ClassifyParams {
    fn default() -> Self {
        Self {
            nodata: CLASS_NODATA,
        }
    }
}

/// Rule-table classification algorithm
#[derive(Debug, Clone, Default)]
pub struct Classify;

impl Algorithm for Classify {
    type Input = (Vec<Raster<f64>>, RuleTable);
    type Output = Raster<i32>;
    type Params = ClassifyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Classify"
    }

    fn description(&self) -> &'static str {
        "Assign terrain classes from an ordered rule table over a stack of layers"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        let (layers, rules) = input;
        classify(&layers, &rules, params)
    }
}

/// Classify a stack of aligned layers against a rule table.
///
/// # Arguments
/// * `layers` - Input rasters, in the same order as `rules.layers()`
/// * `rules` - Ordered rule table
/// * `params` - Output nodata value
///
/// # Errors
/// `SchemaMismatch` when the stack is empty, its length differs from the
/// table's layer count, or any raster's grid differs from the first one.
/// `InvalidParameter` / `InvalidRule` when the nodata value collides with
/// the unclassified code or with a class code.
pub fn classify(layers: &[Raster<f64>], rules: &RuleTable, params: ClassifyParams) -> Result<Raster<i32>> {
    check_stack(layers, rules)?;
    check_nodata_code(rules, params.nodata)?;

    let first = &layers[0];
    let (rows, cols) = first.shape();
    let depth = layers.len();
    let nodata = params.nodata;
    debug!(
        "Classifying {}x{} cells over {} layers with {} rules",
        rows,
        cols,
        depth,
        rules.len()
    );

    let data: Vec<i32> = (0..rows)
        .into_par_iter()
        .flat_map(|row| {
            let mut row_data = vec![nodata; cols];
            let mut stack = vec![0.0; depth];
            for (col, out) in row_data.iter_mut().enumerate() {
                if gather(layers, row, col, &mut stack) {
                    *out = rules.classify_values(&stack);
                }
            }
            row_data
        })
        .collect();

    let mut output = first.derive(data)?;
    output.set_nodata(Some(nodata));
    Ok(output)
}

/// Load the stack values at (row, col) into `stack`.
///
/// Stops at the first nodata layer and returns false.
#[inline]
fn gather(layers: &[Raster<f64>], row: usize, col: usize, stack: &mut [f64]) -> bool {
    layers.iter().zip(stack.iter_mut()).all(|(layer, slot)| {
        // SAFETY: check_stack guarantees every layer has the shape being iterated
        let v = unsafe { layer.get_unchecked(row, col) };
        *slot = v;
        !layer.is_nodata(v)
    })
}

fn layer_label(rules: &RuleTable, index: usize) -> String {
    format!("layer {} ({})", index + 1, rules.layers()[index])
}

fn check_stack(layers: &[Raster<f64>], rules: &RuleTable) -> Result<()> {
    let first = layers
        .first()
        .ok_or_else(|| Error::schema("layer stack", "at least one layer is required"))?;

    if layers.len() != rules.layer_count() {
        return Err(Error::schema(
            "rule table",
            format!(
                "rules have {} ranges per class but {} layers were supplied",
                rules.layer_count(),
                layers.len()
            ),
        ));
    }

    for (i, layer) in layers.iter().enumerate().skip(1) {
        if layer.shape() != first.shape() {
            return Err(Error::schema(
                layer_label(rules, i),
                format!(
                    "grid is {} rows x {} cols but {} is {} rows x {} cols",
                    layer.rows(),
                    layer.cols(),
                    layer_label(rules, 0),
                    first.rows(),
                    first.cols()
                ),
            ));
        }
        if !layer.same_grid(first) {
            return Err(Error::schema(
                layer_label(rules, i),
                format!(
                    "origin or cell size {:?} differs from {} {:?}",
                    layer.transform(),
                    layer_label(rules, 0),
                    first.transform()
                ),
            ));
        }
    }

    Ok(())
}

fn check_nodata_code(rules: &RuleTable, nodata: i32) -> Result<()> {
    if nodata == rules.unclassified() {
        return Err(Error::InvalidParameter {
            name: "nodata",
            value: nodata.to_string(),
            reason: "must differ from the unclassified code".into(),
        });
    }
    if let Some(pos) = rules.rules().iter().position(|r| r.code == nodata) {
        return Err(Error::rule(
            pos + 1,
            format!("class code {} collides with the output nodata value", nodata),
        ));
    }
    Ok(())
}
