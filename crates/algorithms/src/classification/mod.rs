//! Rule-table terrain classification
//!
//! - **rule**: value ranges, rules and the ordered [`RuleTable`]
//! - **table**: loading rule tables from BTM-style CSV
//! - **classify**: the per-cell classifier over an aligned layer stack
//! - **summary**: per-class counts and the `Value,Zone,Count` key
//! - **pipeline**: file-to-file runs used by the CLI

mod classify;
mod pipeline;
mod rule;
mod summary;
mod table;

pub use classify::{classify, Classify, ClassifyParams};
pub use pipeline::{run, ClassificationJob};
pub use rule::{
    Bound, Rule, RuleTable, ValueRange, CLASS_NODATA, NO_MATCHING_ZONE, UNCLASSIFIED,
    UNCLASSIFIED_ZONE,
};
pub use summary::{summarize, write_class_key, ClassCount, ClassSummary};
pub use table::load_rule_table;
