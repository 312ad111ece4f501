//! GeoTIFF reading and writing through GDAL

use crate::error::Result;
use crate::raster::{GeoTransform, Raster, RasterElement};
use gdal::raster::GdalType;
use gdal::{Dataset, DriverManager};
use std::path::Path;

/// Creation options for GDAL-written GeoTIFFs
#[derive(Debug, Clone)]
pub struct GeoTiffOptions {
    /// Compression: "DEFLATE", "LZW", "ZSTD", "NONE"
    pub compression: String,
    /// Tile edge in pixels (0 for strips)
    pub tile_size: usize,
    /// Force BigTIFF for outputs above 4GB
    pub bigtiff: bool,
}

impl Default for GeoTiffOptions {
    fn default() -> Self {
        Self {
            compression: "LZW".to_string(),
            tile_size: 256,
            bigtiff: false,
        }
    }
}

impl GeoTiffOptions {
    fn creation_options(&self) -> Vec<String> {
        let mut opts = vec![format!("COMPRESS={}", self.compression)];
        if self.tile_size > 0 {
            opts.push("TILED=YES".to_string());
            opts.push(format!("BLOCKXSIZE={}", self.tile_size));
            opts.push(format!("BLOCKYSIZE={}", self.tile_size));
        }
        if self.bigtiff {
            opts.push("BIGTIFF=YES".to_string());
        }
        opts
    }
}

/// Read one band (1-indexed, default 1) of any GDAL-readable raster
pub fn read_geotiff<T, P>(path: P, band: Option<usize>) -> Result<Raster<T>>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let dataset = Dataset::open(path.as_ref())?;
    let rasterband = dataset.rasterband(band.unwrap_or(1))?;
    let (cols, rows) = dataset.raster_size();

    let buffer = rasterband.read_as::<T>((0, 0), (cols, rows), (cols, rows), None)?;
    let mut raster = Raster::from_vec(buffer.data().to_vec(), rows, cols)?;

    if let Ok(gt) = dataset.geo_transform() {
        raster.set_transform(GeoTransform::from_gdal(gt));
    }
    if let Some(nd) = rasterband.no_data_value().and_then(num_traits::cast) {
        raster.set_nodata(Some(nd));
    }

    Ok(raster)
}

/// Write a Raster as a single-band GeoTIFF
pub fn write_geotiff<T, P>(
    raster: &Raster<T>,
    path: P,
    options: Option<GeoTiffOptions>,
) -> Result<()>
where
    T: RasterElement + GdalType,
    P: AsRef<Path>,
{
    let opts = options.unwrap_or_default().creation_options();
    let opt_refs: Vec<&str> = opts.iter().map(String::as_str).collect();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let (rows, cols) = raster.shape();

    let mut dataset = driver.create_with_band_type_with_options::<T, _>(
        path.as_ref(),
        cols,
        rows,
        1,
        &opt_refs.as_slice().try_into()?,
    )?;
    dataset.set_geo_transform(&raster.transform().to_gdal())?;

    let mut band = dataset.rasterband(1)?;
    if let Some(nd) = raster.nodata().and_then(|v| v.to_f64()) {
        band.set_no_data_value(Some(nd))?;
    }

    let mut buffer = gdal::raster::Buffer::new((cols, rows), raster.data().iter().copied().collect());
    band.write((0, 0), (cols, rows), &mut buffer)?;

    Ok(())
}
