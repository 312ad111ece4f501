//! Raster-wide statistics used to prepare classification layers

mod standardize;

pub use standardize::{standardize_bpi, StandardizeBpi};
