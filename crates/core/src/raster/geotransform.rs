//! Affine georeferencing for rasters

/// Affine transformation between pixel (col, row) and map (x, y) coordinates:
///
/// ```text
/// x = origin_x + col * pixel_width + row * row_rotation
/// y = origin_y + col * col_rotation + row * pixel_height
/// ```
///
/// North-up grids have zero rotation terms and a negative `pixel_height`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    /// X coordinate of the upper-left corner
    pub origin_x: f64,
    /// Y coordinate of the upper-left corner
    pub origin_y: f64,
    /// Cell size along X
    pub pixel_width: f64,
    /// Cell size along Y (negative for north-up)
    pub pixel_height: f64,
    pub row_rotation: f64,
    pub col_rotation: f64,
}

impl GeoTransform {
    /// North-up transform with no rotation
    pub fn new(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self {
            origin_x,
            origin_y,
            pixel_width,
            pixel_height,
            row_rotation: 0.0,
            col_rotation: 0.0,
        }
    }

    /// From GDAL coefficient order `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]`
    pub fn from_gdal(coeffs: [f64; 6]) -> Self {
        Self {
            origin_x: coeffs[0],
            pixel_width: coeffs[1],
            row_rotation: coeffs[2],
            origin_y: coeffs[3],
            col_rotation: coeffs[4],
            pixel_height: coeffs[5],
        }
    }

    /// To GDAL coefficient order
    pub fn to_gdal(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    /// Map coordinates of the upper-left corner of a cell
    pub fn corner(&self, col: usize, row: usize) -> (f64, f64) {
        let (c, r) = (col as f64, row as f64);
        (
            self.origin_x + c * self.pixel_width + r * self.row_rotation,
            self.origin_y + c * self.col_rotation + r * self.pixel_height,
        )
    }

    /// Cell size (square cells assumed)
    pub fn cell_size(&self) -> f64 {
        self.pixel_width.abs()
    }

    /// Bounding box `(min_x, min_y, max_x, max_y)` of a grid of the given size
    pub fn bounds(&self, cols: usize, rows: usize) -> (f64, f64, f64, f64) {
        let corners = [
            self.corner(0, 0),
            self.corner(cols, 0),
            self.corner(0, rows),
            self.corner(cols, rows),
        ];
        corners.iter().fold(
            (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
            |(min_x, min_y, max_x, max_y), &(x, y)| {
                (min_x.min(x), min_y.min(y), max_x.max(x), max_y.max(y))
            },
        )
    }

    /// Whether two transforms describe the same grid.
    ///
    /// Coefficients are compared with a tolerance of 1e-6 cell sizes, which
    /// absorbs the rounding introduced by storing coordinates in TIFF tags.
    pub fn same_grid(&self, other: &GeoTransform) -> bool {
        let tol = 1e-6 * self.cell_size().max(other.cell_size()).max(f64::MIN_POSITIVE);
        self.to_gdal()
            .iter()
            .zip(other.to_gdal().iter())
            .all(|(a, b)| (a - b).abs() <= tol)
    }
}

impl Default for GeoTransform {
    fn default() -> Self {
        Self::new(0.0, 0.0, 1.0, -1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_bounds() {
        let gt = GeoTransform::new(0.0, 100.0, 1.0, -1.0);
        let (min_x, min_y, max_x, max_y) = gt.bounds(100, 100);

        assert_relative_eq!(min_x, 0.0, epsilon = 1e-10);
        assert_relative_eq!(min_y, 0.0, epsilon = 1e-10);
        assert_relative_eq!(max_x, 100.0, epsilon = 1e-10);
        assert_relative_eq!(max_y, 100.0, epsilon = 1e-10);
    }

    #[test]
    fn test_same_grid() {
        let a = GeoTransform::new(500_000.0, 5_400_000.0, 20.0, -20.0);
        let nudged = GeoTransform::new(500_000.000001, 5_400_000.0, 20.0, -20.0);
        let shifted = GeoTransform::new(500_020.0, 5_400_000.0, 20.0, -20.0);
        let coarser = GeoTransform::new(500_000.0, 5_400_000.0, 100.0, -100.0);

        assert!(a.same_grid(&a));
        assert!(a.same_grid(&nudged));
        assert!(!a.same_grid(&shifted));
        assert!(!a.same_grid(&coarser));
    }

    #[test]
    fn test_gdal_order() {
        let gt = GeoTransform::from_gdal([10.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
        assert_eq!(gt, GeoTransform::new(10.0, 50.0, 2.0, -2.0));
        assert_eq!(gt.to_gdal(), [10.0, 2.0, 0.0, 50.0, 0.0, -2.0]);
    }
}
