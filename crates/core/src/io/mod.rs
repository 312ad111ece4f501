//! Raster source: reading and writing GeoTIFFs
//!
//! The native codec is always compiled. With the `gdal` feature the
//! path-based functions are served by GDAL instead.

#[cfg(feature = "gdal")]
mod gdal_io;
mod native;

#[cfg(feature = "gdal")]
pub use gdal_io::{read_geotiff, write_geotiff, GeoTiffOptions};

#[cfg(not(feature = "gdal"))]
pub use native::{read_geotiff, write_geotiff, GeoTiffOptions};

pub use native::{read_geotiff_from_buffer, write_geotiff_to_buffer};
