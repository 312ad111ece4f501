//! Per-class cell counts and the class key sidecar

use std::collections::HashMap;
use std::path::Path;

use benthic_core::raster::Raster;
use benthic_core::{Error, Result};

use super::rule::{RuleTable, UNCLASSIFIED_ZONE};

/// Cell count for one class code
#[derive(Debug, Clone, PartialEq)]
pub struct ClassCount {
    pub code: i32,
    pub zone: String,
    pub cells: usize,
}

/// Outcome of a classification run
#[derive(Debug, Clone, PartialEq)]
pub struct ClassSummary {
    /// One entry per distinct rule code, in table order
    pub classes: Vec<ClassCount>,
    pub unclassified_code: i32,
    /// Valid cells that matched no rule
    pub unclassified: usize,
    /// Cells with nodata in at least one layer
    pub nodata: usize,
}

impl ClassSummary {
    /// Classes that were assigned to no cell
    pub fn empty_classes(&self) -> impl Iterator<Item = &ClassCount> {
        self.classes.iter().filter(|c| c.cells == 0)
    }

    /// Cells that received a class code
    pub fn classified(&self) -> usize {
        self.classes.iter().map(|c| c.cells).sum()
    }

    pub fn total(&self) -> usize {
        self.classified() + self.unclassified + self.nodata
    }
}

/// Count the cells of a classified raster per class of `rules`
pub fn summarize(classified: &Raster<i32>, rules: &RuleTable) -> ClassSummary {
    let mut counts: HashMap<i32, usize> = HashMap::new();
    let mut nodata = 0;
    for &code in classified.data().iter() {
        if classified.is_nodata(code) {
            nodata += 1;
        } else {
            *counts.entry(code).or_default() += 1;
        }
    }

    let classes = rules
        .codes()
        .into_iter()
        .map(|code| ClassCount {
            code,
            zone: rules.zone_name(code).to_string(),
            cells: counts.get(&code).copied().unwrap_or(0),
        })
        .collect();

    ClassSummary {
        classes,
        unclassified_code: rules.unclassified(),
        unclassified: counts.get(&rules.unclassified()).copied().unwrap_or(0),
        nodata,
    }
}

/// Write the class key as CSV: `Value,Zone,Count`, unclassified row first
pub fn write_class_key<P: AsRef<Path>>(summary: &ClassSummary, path: P) -> Result<()> {
    let csv_err = |e: csv::Error| Error::Csv(e.to_string());
    let mut wtr = csv::Writer::from_path(path.as_ref()).map_err(csv_err)?;

    wtr.write_record(["Value", "Zone", "Count"]).map_err(csv_err)?;
    wtr.write_record([
        summary.unclassified_code.to_string(),
        UNCLASSIFIED_ZONE.to_string(),
        summary.unclassified.to_string(),
    ])
    .map_err(csv_err)?;
    for class in &summary.classes {
        wtr.write_record([class.code.to_string(), class.zone.clone(), class.cells.to_string()])
            .map_err(csv_err)?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classification::rule::{Rule, ValueRange, CLASS_NODATA};

    fn table() -> RuleTable {
        RuleTable::new(
            vec!["depth".to_string()],
            vec![
                Rule::new("Shelf", 1, vec![ValueRange::closed(-200.0, 0.0)]),
                Rule::new("Trench", 5, vec![ValueRange::at_most(-6000.0)]),
                Rule::new("Slope", 2, vec![ValueRange::open(-3000.0, -200.0)]),
                Rule::new("Shelf break", 1, vec![ValueRange::closed(-250.0, -200.0)]),
            ],
        )
        .unwrap()
    }

    fn classified() -> Raster<i32> {
        let mut r = Raster::from_vec(vec![1, 1, 2, 0, CLASS_NODATA, 1], 2, 3).unwrap();
        r.set_nodata(Some(CLASS_NODATA));
        r
    }

    #[test]
    fn test_counts_in_table_order() {
        let summary = summarize(&classified(), &table());
        let codes: Vec<(i32, &str, usize)> = summary
            .classes
            .iter()
            .map(|c| (c.code, c.zone.as_str(), c.cells))
            .collect();
        assert_eq!(codes, vec![(1, "Shelf", 3), (5, "Trench", 0), (2, "Slope", 1)]);
        assert_eq!(summary.unclassified, 1);
        assert_eq!(summary.nodata, 1);
        assert_eq!(summary.total(), 6);
    }

    #[test]
    fn test_empty_classes() {
        let summary = summarize(&classified(), &table());
        let empty: Vec<i32> = summary.empty_classes().map(|c| c.code).collect();
        assert_eq!(empty, vec![5]);
    }

    #[test]
    fn test_write_class_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("classes.csv");
        write_class_key(&summarize(&classified(), &table()), &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines,
            vec!["Value,Zone,Count", "0,None,1", "1,Shelf,3", "5,Trench,0", "2,Slope,1"]
        );
    }
}
