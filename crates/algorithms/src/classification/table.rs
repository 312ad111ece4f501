//! Rule table loading from Benthic Terrain Modeler style CSV files.
//!
//! ```text
//! Class,Zone,FineBPI_LowerBounds,FineBPI_UpperBounds,Slope_LowerBounds,Slope_UpperBounds
//! 1,Narrow depression,,-100,,
//! 2,Flat,-100,100,,5
//! ```
//!
//! Empty cells (or `None`/`NA`) leave a bound open. Optional
//! `<Layer>_LowerInclusive` / `<Layer>_UpperInclusive` columns override the
//! default inclusivity of [`ValueRange::new`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use benthic_core::{Error, Result};
use tracing::debug;

use super::rule::{Rule, RuleTable, ValueRange, UNCLASSIFIED};

const LOWER_BOUNDS: &str = "_lowerbounds";
const UPPER_BOUNDS: &str = "_upperbounds";
const LOWER_INCLUSIVE: &str = "_lowerinclusive";
const UPPER_INCLUSIVE: &str = "_upperinclusive";

/// Column positions of one layer's range
struct LayerColumns {
    name: String,
    lower: usize,
    upper: usize,
    lower_inclusive: Option<usize>,
    upper_inclusive: Option<usize>,
}

/// Load a rule table with the default fallback code ([`UNCLASSIFIED`])
pub fn load_rule_table<P, S>(path: P, layers: &[S]) -> Result<RuleTable>
where
    P: AsRef<Path>,
    S: AsRef<str>,
{
    RuleTable::from_csv_path(path, layers, UNCLASSIFIED)
}

impl RuleTable {
    /// Load a rule table from a CSV file.
    ///
    /// `layers` fixes the range order of every rule and must match the
    /// order of the rasters later passed to the classifier.
    pub fn from_csv_path<P, S>(path: P, layers: &[S], unclassified: i32) -> Result<Self>
    where
        P: AsRef<Path>,
        S: AsRef<str>,
    {
        let file = File::open(path.as_ref())?;
        debug!("Reading rule table {}", path.as_ref().display());
        Self::from_csv_reader(file, layers, unclassified)
    }

    /// Load a rule table from any CSV source
    pub fn from_csv_reader<R, S>(reader: R, layers: &[S], unclassified: i32) -> Result<Self>
    where
        R: Read,
        S: AsRef<str>,
    {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = rdr
            .headers()
            .map_err(|e| Error::Csv(e.to_string()))?
            .iter()
            .map(|h| h.to_lowercase())
            .collect();

        let find = |name: &str| headers.iter().position(|h| h == name);
        let class_col = find("class")
            .ok_or_else(|| Error::schema("rule table header", "missing 'Class' column"))?;
        let zone_col = find("zone")
            .ok_or_else(|| Error::schema("rule table header", "missing 'Zone' column"))?;

        let columns = layers
            .iter()
            .map(|layer| {
                let layer = layer.as_ref();
                let key = layer.to_lowercase();
                let lower = find(&format!("{key}{LOWER_BOUNDS}"));
                let upper = find(&format!("{key}{UPPER_BOUNDS}"));
                match (lower, upper) {
                    (Some(lower), Some(upper)) => Ok(LayerColumns {
                        name: layer.to_string(),
                        lower,
                        upper,
                        lower_inclusive: find(&format!("{key}{LOWER_INCLUSIVE}")),
                        upper_inclusive: find(&format!("{key}{UPPER_INCLUSIVE}")),
                    }),
                    _ => Err(Error::schema(
                        format!("rule table columns for layer '{layer}'"),
                        format!("expected {layer}_LowerBounds and {layer}_UpperBounds"),
                    )),
                }
            })
            .collect::<Result<Vec<_>>>()?;

        // A range column for a layer nobody supplied means the table was
        // written for a different layer set.
        for header in &headers {
            let prefix = header
                .strip_suffix(LOWER_BOUNDS)
                .or_else(|| header.strip_suffix(UPPER_BOUNDS));
            if let Some(prefix) = prefix {
                if !columns.iter().any(|c| c.name.to_lowercase() == prefix) {
                    return Err(Error::schema(
                        format!("rule table column '{header}'"),
                        "no layer with that name was supplied",
                    ));
                }
            }
        }

        let mut rules = Vec::new();
        for (i, record) in rdr.records().enumerate() {
            let position = i + 1;
            let record = record.map_err(|e| Error::rule(position, e.to_string()))?;
            let field = |idx: usize| record.get(idx).unwrap_or("");

            let code = parse_code(field(class_col)).map_err(|r| Error::rule(position, r))?;
            let name = match field(zone_col) {
                "" => format!("Class {code}"),
                zone => zone.to_string(),
            };

            let ranges = columns
                .iter()
                .map(|c| -> Result<ValueRange> {
                    let lower = parse_bound(field(c.lower))
                        .map_err(|r| Error::rule(position, format!("{} lower bound {r}", c.name)))?;
                    let upper = parse_bound(field(c.upper))
                        .map_err(|r| Error::rule(position, format!("{} upper bound {r}", c.name)))?;
                    let lower_inc = parse_flag(c.lower_inclusive.map(field))
                        .map_err(|r| Error::rule(position, format!("{} lower inclusivity {r}", c.name)))?;
                    let upper_inc = parse_flag(c.upper_inclusive.map(field))
                        .map_err(|r| Error::rule(position, format!("{} upper inclusivity {r}", c.name)))?;
                    Ok(ValueRange::new(lower, upper).with_inclusivity(lower_inc, upper_inc))
                })
                .collect::<Result<Vec<_>>>()?;

            rules.push(Rule::new(name, code, ranges));
        }

        let names = columns.into_iter().map(|c| c.name).collect();
        let table = RuleTable::with_fallback(names, rules, unclassified)?;
        debug!(
            "Loaded {} rules over {} layers",
            table.len(),
            table.layer_count()
        );
        Ok(table)
    }
}

fn is_blank(s: &str) -> bool {
    s.is_empty() || ["none", "na", "null"].iter().any(|t| s.eq_ignore_ascii_case(t))
}

fn parse_bound(s: &str) -> std::result::Result<Option<f64>, String> {
    if is_blank(s) {
        return Ok(None);
    }
    match s.parse::<f64>() {
        Ok(v) if v.is_nan() => Err("is NaN".to_string()),
        Ok(v) => Ok(Some(v)),
        Err(_) => Err(format!("'{s}' is not a number")),
    }
}

fn parse_code(s: &str) -> std::result::Result<i32, String> {
    if let Ok(code) = s.parse::<i32>() {
        return Ok(code);
    }
    // Spreadsheet exports often write integer columns as "3.0"
    match s.parse::<f64>() {
        Ok(v) if v.fract() == 0.0 && v >= i32::MIN as f64 && v <= i32::MAX as f64 => Ok(v as i32),
        _ => Err(format!("class code '{s}' is not an integer")),
    }
}

fn parse_flag(s: Option<&str>) -> std::result::Result<Option<bool>, String> {
    match s.map(str::to_lowercase).as_deref() {
        None | Some("") => Ok(None),
        Some("true" | "yes" | "y" | "1") => Ok(Some(true)),
        Some("false" | "no" | "n" | "0") => Ok(Some(false)),
        Some(other) => Err(format!("'{other}' is not true/false")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LAYERS: [&str; 4] = ["FineBPI", "BroadBPI", "Slope", "Depth"];

    const BTM_TABLE: &str = "\
Class,Zone,BroadBPI_LowerBounds,BroadBPI_UpperBounds,FineBPI_LowerBounds,FineBPI_UpperBounds,Slope_LowerBounds,Slope_UpperBounds,Depth_LowerBounds,Depth_UpperBounds
1,Narrow depression,,-100,,-100,,,,
2,Crest,100,,100,,,,,
3,Flat,-100,100,-100,100,,5,,
4,Slope,-100,100,-100,100,5,,,
";

    fn load(text: &str) -> Result<RuleTable> {
        RuleTable::from_csv_reader(text.as_bytes(), &LAYERS, UNCLASSIFIED)
    }

    #[test]
    fn test_columns_follow_layer_order() {
        let table = load(BTM_TABLE).unwrap();
        assert_eq!(table.len(), 4);
        assert_eq!(table.layers(), &LAYERS.map(String::from));

        // header lists BroadBPI before FineBPI; ranges follow `LAYERS`
        let flat = &table.rules()[2];
        assert_eq!(flat.name, "Flat");
        assert_eq!(flat.ranges[0], ValueRange::open(-100.0, 100.0));
        assert_eq!(flat.ranges[2], ValueRange::at_most(5.0));
        assert!(flat.ranges[3].is_unbounded());
    }

    #[test]
    fn test_classifies_like_btm() {
        let table = load(BTM_TABLE).unwrap();
        // fine, broad, slope, depth
        assert_eq!(table.classify_values(&[-150.0, -150.0, 2.0, -40.0]), 1);
        assert_eq!(table.classify_values(&[150.0, 100.0, 2.0, -40.0]), 2);
        assert_eq!(table.classify_values(&[0.0, 0.0, 5.0, -40.0]), 3);
        assert_eq!(table.classify_values(&[0.0, 0.0, 5.5, -40.0]), 4);
        // fine BPI exactly 100 is outside the open (-100, 100) ranges and below the crest
        assert_eq!(table.classify_values(&[100.0, 0.0, 2.0, -40.0]), UNCLASSIFIED);
    }

    #[test]
    fn test_case_insensitive_headers_and_blank_tokens() {
        let text = "class,ZONE,fine_bpi_lowerbounds,FINE_BPI_UPPERBOUNDS\n7,Ridge,None,NA\n";
        let table = RuleTable::from_csv_reader(text.as_bytes(), &["fine_bpi"], UNCLASSIFIED).unwrap();
        assert!(table.rules()[0].ranges[0].is_unbounded());
        assert_eq!(table.rules()[0].code, 7);
    }

    #[test]
    fn test_inclusive_columns() {
        let text = "\
Class,Zone,Slope_LowerBounds,Slope_UpperBounds,Slope_LowerInclusive,Slope_UpperInclusive
1,Gentle,0,5,true,false
2,Steep,5,,,
";
        let table = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).unwrap();
        assert_eq!(table.rules()[0].ranges[0], ValueRange::half_open(0.0, 5.0));
        assert_eq!(table.classify_values(&[0.0]), 1);
        assert_eq!(table.classify_values(&[5.0]), 2);
    }

    #[test]
    fn test_inverted_range_reports_row() {
        let text = "\
Class,Zone,Slope_LowerBounds,Slope_UpperBounds
1,Gentle,0,5
2,Broken,30,10
";
        let err = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).unwrap_err();
        assert!(matches!(err, Error::InvalidRule { position: 2, .. }));
    }

    #[test]
    fn test_non_numeric_bound() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n1,Gentle,zero,5\n";
        let err = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).unwrap_err();
        match err {
            Error::InvalidRule { position, reason } => {
                assert_eq!(position, 1);
                assert!(reason.contains("'zero'"), "{reason}");
            }
            other => panic!("expected InvalidRule, got {other:?}"),
        }
    }

    #[test]
    fn test_bad_code_and_flag() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\nA,Gentle,0,5\n";
        assert!(matches!(
            RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED),
            Err(Error::InvalidRule { position: 1, .. })
        ));

        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n3.0,Gentle,0,5\n";
        let table = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).unwrap();
        assert_eq!(table.rules()[0].code, 3);

        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds,Slope_LowerInclusive\n1,Gentle,0,5,maybe\n";
        assert!(matches!(
            RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED),
            Err(Error::InvalidRule { position: 1, .. })
        ));
    }

    #[test]
    fn test_missing_layer_columns() {
        let err = RuleTable::from_csv_reader(BTM_TABLE.as_bytes(), &["FineBPI", "Rugosity"], UNCLASSIFIED)
            .unwrap_err();
        match err {
            Error::SchemaMismatch { subject, .. } => assert!(subject.contains("Rugosity")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupplied_layer_column() {
        let err = RuleTable::from_csv_reader(
            BTM_TABLE.as_bytes(),
            &["FineBPI", "BroadBPI", "Slope"],
            UNCLASSIFIED,
        )
        .unwrap_err();
        match err {
            Error::SchemaMismatch { subject, .. } => assert!(subject.contains("depth_lowerbounds")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_class_column() {
        let text = "Code,Zone,Slope_LowerBounds,Slope_UpperBounds\n1,Gentle,0,5\n";
        assert!(matches!(
            RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED),
            Err(Error::SchemaMismatch { .. })
        ));
    }

    #[test]
    fn test_empty_zone_gets_default_name() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n5,,0,5\n";
        let table = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).unwrap();
        assert_eq!(table.zone_name(5), "Class 5");
    }

    #[test]
    fn test_custom_fallback_allows_zero_class() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n0,Flat,,5\n";
        assert!(RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED).is_err());
        let table = RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], 255).unwrap();
        assert_eq!(table.classify_values(&[10.0]), 255);
    }

    #[test]
    fn test_header_only_table() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n";
        assert!(matches!(
            RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED),
            Err(Error::InvalidRule { position: 0, .. })
        ));
    }

    #[test]
    fn test_ragged_row() {
        let text = "Class,Zone,Slope_LowerBounds,Slope_UpperBounds\n1,Gentle,0\n";
        assert!(matches!(
            RuleTable::from_csv_reader(text.as_bytes(), &["Slope"], UNCLASSIFIED),
            Err(Error::InvalidRule { position: 1, .. })
        ));
    }
}
