//! File-to-file classification run

use std::path::PathBuf;

use benthic_core::io::{read_geotiff, write_geotiff};
use benthic_core::raster::Raster;
use benthic_core::Result;
use tracing::{debug, info, warn};

use super::classify::{classify, ClassifyParams};
use super::rule::{RuleTable, UNCLASSIFIED};
use super::summary::{summarize, write_class_key, ClassSummary};

/// Everything needed to classify a set of layer files
#[derive(Debug, Clone)]
pub struct ClassificationJob {
    /// `(layer name, raster path)` in rule-table order
    pub layers: Vec<(String, PathBuf)>,
    /// Rule table CSV
    pub rules: PathBuf,
    /// Classified GeoTIFF to write
    pub output: PathBuf,
    /// Optional `Value,Zone,Count` CSV
    pub key: Option<PathBuf>,
    /// Code for valid cells that match no rule
    pub unclassified: i32,
    pub params: ClassifyParams,
}

impl ClassificationJob {
    pub fn new(layers: Vec<(String, PathBuf)>, rules: impl Into<PathBuf>, output: impl Into<PathBuf>) -> Self {
        Self {
            layers,
            rules: rules.into(),
            output: output.into(),
            key: None,
            unclassified: UNCLASSIFIED,
            params: ClassifyParams::default(),
        }
    }

    pub fn layer_names(&self) -> Vec<&str> {
        self.layers.iter().map(|(name, _)| name.as_str()).collect()
    }
}

/// Run a classification job.
///
/// The rule table is validated before any raster is opened, and every
/// check runs before the output is created. If the class key cannot be
/// written the classified raster is removed again, so on error nothing is
/// left behind.
pub fn run(job: &ClassificationJob) -> Result<ClassSummary> {
    let rules = RuleTable::from_csv_path(&job.rules, &job.layer_names(), job.unclassified)?;
    info!("Rule table: {} classes over {} layers", rules.len(), rules.layer_count());

    let layers = job
        .layers
        .iter()
        .map(|(name, path)| -> Result<Raster<f64>> {
            let raster: Raster<f64> = read_geotiff(path, None)?;
            debug!(
                "Layer {}: {} x {} from {}",
                name,
                raster.cols(),
                raster.rows(),
                path.display()
            );
            Ok(raster)
        })
        .collect::<Result<Vec<_>>>()?;

    let classified = classify(&layers, &rules, job.params.clone())?;
    write_geotiff(&classified, &job.output, None)?;
    info!("Classified raster written to {}", job.output.display());

    let summary = summarize(&classified, &rules);
    if let Some(key) = &job.key {
        if let Err(e) = write_class_key(&summary, key) {
            if let Err(rm) = std::fs::remove_file(&job.output) {
                warn!("Cannot remove {}: {}", job.output.display(), rm);
            }
            return Err(e);
        }
        debug!("Class key written to {}", key.display());
    }

    Ok(summary)
}
