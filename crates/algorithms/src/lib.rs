//! # Benthic Algorithms
//!
//! Seafloor terrain classification on top of `benthic-core`.
//!
//! - **classification**: ordered rule tables, the multi-layer classifier,
//!   class summaries and file-to-file runs
//! - **statistics**: BPI standardization
//!
//! Terrain derivatives (slope, BPI, rugosity) are expected to come from
//! upstream tools and enter here as layers.

pub mod classification;
pub mod statistics;

mod maybe_rayon;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::classification::{
        classify, load_rule_table, summarize, ClassSummary, Classify, ClassifyParams, Rule,
        RuleTable, ValueRange, CLASS_NODATA, UNCLASSIFIED,
    };
    pub use crate::statistics::{standardize_bpi, StandardizeBpi};
    pub use benthic_core::prelude::*;
}
