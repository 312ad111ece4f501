//! Rule model: per-layer value ranges, rules and the ordered rule table.

use std::collections::HashSet;
use std::fmt;

use benthic_core::{Error, Result};

/// Code assigned to valid cells that match no rule
pub const UNCLASSIFIED: i32 = 0;

/// Default nodata value of classified rasters
pub const CLASS_NODATA: i32 = -9999;

/// Zone name reported for the unclassified code
pub const UNCLASSIFIED_ZONE: &str = "None";

/// Zone name reported for codes that no rule produces
pub const NO_MATCHING_ZONE: &str = "No Matching Zone";

/// One end of a [`ValueRange`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bound {
    pub value: f64,
    pub inclusive: bool,
}

/// A numeric interval over one layer. A missing bound is unbounded on that side.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ValueRange {
    pub lower: Option<Bound>,
    pub upper: Option<Bound>,
}

impl ValueRange {
    /// Matches every value
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Range using the Benthic Terrain Modeler convention.
    ///
    /// With both bounds the range is open, `lower < v < upper`. With a
    /// single bound it is closed on that side, `v >= lower` or `v <= upper`.
    pub fn new(lower: Option<f64>, upper: Option<f64>) -> Self {
        let inclusive = lower.is_none() || upper.is_none();
        Self {
            lower: lower.map(|value| Bound { value, inclusive }),
            upper: upper.map(|value| Bound { value, inclusive }),
        }
    }

    /// `lower <= v <= upper`
    pub fn closed(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(Bound { value: lower, inclusive: true }),
            upper: Some(Bound { value: upper, inclusive: true }),
        }
    }

    /// `lower < v < upper`
    pub fn open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(Bound { value: lower, inclusive: false }),
            upper: Some(Bound { value: upper, inclusive: false }),
        }
    }

    /// `lower <= v < upper`
    pub fn half_open(lower: f64, upper: f64) -> Self {
        Self {
            lower: Some(Bound { value: lower, inclusive: true }),
            upper: Some(Bound { value: upper, inclusive: false }),
        }
    }

    /// `v >= lower`
    pub fn at_least(lower: f64) -> Self {
        Self::new(Some(lower), None)
    }

    /// `v <= upper`
    pub fn at_most(upper: f64) -> Self {
        Self::new(None, Some(upper))
    }

    /// Override the inclusivity of whichever bounds are present
    pub fn with_inclusivity(mut self, lower: Option<bool>, upper: Option<bool>) -> Self {
        if let (Some(b), Some(inclusive)) = (self.lower.as_mut(), lower) {
            b.inclusive = inclusive;
        }
        if let (Some(b), Some(inclusive)) = (self.upper.as_mut(), upper) {
            b.inclusive = inclusive;
        }
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.lower.is_none() && self.upper.is_none()
    }

    /// Whether `v` falls inside the range
    #[inline]
    pub fn contains(&self, v: f64) -> bool {
        let above = match self.lower {
            Some(Bound { value, inclusive: true }) => v >= value,
            Some(Bound { value, inclusive: false }) => v > value,
            None => true,
        };
        above
            && match self.upper {
                Some(Bound { value, inclusive: true }) => v <= value,
                Some(Bound { value, inclusive: false }) => v < value,
                None => true,
            }
    }

    /// False for degenerate ranges like `(3, 3)` that accept no value
    pub fn can_match(&self) -> bool {
        match (self.lower, self.upper) {
            (Some(lo), Some(hi)) if lo.value == hi.value => lo.inclusive && hi.inclusive,
            _ => true,
        }
    }

    fn check(&self) -> std::result::Result<(), String> {
        for bound in [self.lower, self.upper].into_iter().flatten() {
            if bound.value.is_nan() {
                return Err("bound is NaN".to_string());
            }
        }
        if let (Some(lo), Some(hi)) = (self.lower, self.upper) {
            if lo.value > hi.value {
                return Err(format!(
                    "lower bound {} is greater than upper bound {}",
                    lo.value, hi.value
                ));
            }
        }
        Ok(())
    }
}

impl fmt::Display for ValueRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.lower {
            Some(b) if b.inclusive => write!(f, "[{}", b.value)?,
            Some(b) => write!(f, "({}", b.value)?,
            None => write!(f, "(-inf")?,
        }
        match self.upper {
            Some(b) if b.inclusive => write!(f, ", {}]", b.value),
            Some(b) => write!(f, ", {})", b.value),
            None => write!(f, ", +inf)"),
        }
    }
}

/// A class definition: one range per layer plus the code it assigns
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: String,
    pub code: i32,
    /// Ranges in the table's layer order
    pub ranges: Vec<ValueRange>,
}

impl Rule {
    pub fn new(name: impl Into<String>, code: i32, ranges: Vec<ValueRange>) -> Self {
        Self {
            name: name.into(),
            code,
            ranges,
        }
    }

    /// Whether every layer value lies in its range
    #[inline]
    pub fn matches(&self, values: &[f64]) -> bool {
        self.ranges
            .iter()
            .zip(values)
            .all(|(range, &v)| range.contains(v))
    }
}

/// Ordered, validated set of rules over a fixed list of layers.
///
/// Table order is evaluation order: the first matching rule wins.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleTable {
    layers: Vec<String>,
    rules: Vec<Rule>,
    unclassified: i32,
}

impl RuleTable {
    /// Build a table using [`UNCLASSIFIED`] as the fallback code
    pub fn new(layers: Vec<String>, rules: Vec<Rule>) -> Result<Self> {
        Self::with_fallback(layers, rules, UNCLASSIFIED)
    }

    /// Build a table with an explicit fallback code.
    ///
    /// Fails with `SchemaMismatch` for an empty or duplicated layer list or a
    /// rule whose range count differs from the layer count, and with
    /// `InvalidRule` for an empty rule list (position 0), malformed ranges or
    /// a rule that uses the fallback code.
    pub fn with_fallback(layers: Vec<String>, rules: Vec<Rule>, unclassified: i32) -> Result<Self> {
        if layers.is_empty() {
            return Err(Error::schema("rule table", "no classification layers given"));
        }
        let mut seen = HashSet::new();
        for name in &layers {
            if !seen.insert(name.to_lowercase()) {
                return Err(Error::schema(
                    format!("layer '{}'", name),
                    "layer names must be unique",
                ));
            }
        }
        if rules.is_empty() {
            return Err(Error::rule(0, "table contains no rules"));
        }

        for (i, rule) in rules.iter().enumerate() {
            let position = i + 1;
            if rule.ranges.len() != layers.len() {
                return Err(Error::schema(
                    format!("rule {} ({})", position, rule.name),
                    format!(
                        "has {} ranges but the table has {} layers",
                        rule.ranges.len(),
                        layers.len()
                    ),
                ));
            }
            if rule.code == unclassified {
                return Err(Error::rule(
                    position,
                    format!("class code {} is reserved for unclassified cells", rule.code),
                ));
            }
            for (range, layer) in rule.ranges.iter().zip(&layers) {
                range
                    .check()
                    .map_err(|reason| Error::rule(position, format!("{}: {}", layer, reason)))?;
                if !range.can_match() {
                    tracing::warn!(
                        "rule {} ({}) range {} on {} can never match",
                        position,
                        rule.name,
                        range,
                        layer
                    );
                }
            }
        }

        Ok(Self {
            layers,
            rules,
            unclassified,
        })
    }

    /// Same rules under a different fallback code
    pub fn with_unclassified(self, code: i32) -> Result<Self> {
        Self::with_fallback(self.layers, self.rules, code)
    }

    /// Layer names, in range order
    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Code given to valid cells that no rule matches
    pub fn unclassified(&self) -> i32 {
        self.unclassified
    }

    /// Class code for one cell's stack of layer values.
    ///
    /// Rules are scanned in table order and the first full match wins.
    #[inline]
    pub fn classify_values(&self, values: &[f64]) -> i32 {
        self.rules
            .iter()
            .find(|rule| rule.matches(values))
            .map_or(self.unclassified, |rule| rule.code)
    }

    /// Distinct class codes in first-appearance order
    pub fn codes(&self) -> Vec<i32> {
        let mut seen = HashSet::new();
        self.rules
            .iter()
            .map(|r| r.code)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Zone name for a class code
    pub fn zone_name(&self, code: i32) -> &str {
        if code == self.unclassified {
            return UNCLASSIFIED_ZONE;
        }
        self.rules
            .iter()
            .find(|r| r.code == code)
            .map_or(NO_MATCHING_ZONE, |r| r.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    /// Flat / Depression table over fine BPI, broad BPI and slope
    fn example_table() -> RuleTable {
        RuleTable::new(
            layers(&["fine_bpi", "broad_bpi", "slope"]),
            vec![
                Rule::new(
                    "Flat",
                    1,
                    vec![
                        ValueRange::new(Some(-5.0), Some(5.0)),
                        ValueRange::unbounded(),
                        ValueRange::new(Some(0.0), Some(5.0)),
                    ],
                ),
                Rule::new(
                    "Depression",
                    2,
                    vec![
                        ValueRange::unbounded(),
                        ValueRange::at_most(-10.0),
                        ValueRange::unbounded(),
                    ],
                ),
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_btm_convention() {
        let two_sided = ValueRange::new(Some(-5.0), Some(5.0));
        assert!(!two_sided.contains(-5.0));
        assert!(two_sided.contains(0.0));
        assert!(!two_sided.contains(5.0));

        let lower_only = ValueRange::at_least(10.0);
        assert!(lower_only.contains(10.0));
        assert!(!lower_only.contains(9.999));

        let upper_only = ValueRange::at_most(-10.0);
        assert!(upper_only.contains(-10.0));
        assert!(!upper_only.contains(-9.0));

        assert!(ValueRange::unbounded().contains(f64::MAX));
    }

    #[test]
    fn test_explicit_inclusivity() {
        let r = ValueRange::closed(0.0, 5.0);
        assert!(r.contains(0.0) && r.contains(5.0));

        let r = ValueRange::half_open(0.0, 5.0);
        assert!(r.contains(0.0) && !r.contains(5.0));

        let r = ValueRange::new(Some(0.0), Some(5.0)).with_inclusivity(None, Some(true));
        assert!(!r.contains(0.0) && r.contains(5.0));

        // flags for absent bounds are ignored
        let r = ValueRange::at_most(3.0).with_inclusivity(Some(false), None);
        assert_eq!(r, ValueRange::at_most(3.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(ValueRange::open(-5.0, 5.0).to_string(), "(-5, 5)");
        assert_eq!(ValueRange::at_least(0.5).to_string(), "[0.5, +inf)");
        assert_eq!(ValueRange::at_most(-10.0).to_string(), "(-inf, -10]");
        assert_eq!(ValueRange::unbounded().to_string(), "(-inf, +inf)");
    }

    #[test]
    fn test_example_cell_falls_through_to_second_rule() {
        let table = example_table();
        // slope 12 is outside (0, 5); broad BPI -20 is below -10
        assert_eq!(table.classify_values(&[5.0, -20.0, 12.0]), 2);
        assert_eq!(table.classify_values(&[0.0, 100.0, 2.0]), 1);
        assert_eq!(table.classify_values(&[0.0, 100.0, 12.0]), UNCLASSIFIED);
    }

    #[test]
    fn test_first_match_wins() {
        let table = RuleTable::new(
            layers(&["depth"]),
            vec![
                Rule::new("Shelf", 3, vec![ValueRange::closed(-200.0, 0.0)]),
                Rule::new("Anything", 9, vec![ValueRange::unbounded()]),
            ],
        )
        .unwrap();

        assert_eq!(table.classify_values(&[-50.0]), 3);
        assert_eq!(table.classify_values(&[-500.0]), 9);
    }

    #[test]
    fn test_inverted_range_is_invalid_rule() {
        let err = RuleTable::new(
            layers(&["slope"]),
            vec![
                Rule::new("Ok", 1, vec![ValueRange::closed(0.0, 5.0)]),
                Rule::new("Bad", 2, vec![ValueRange::closed(10.0, 5.0)]),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRule { position: 2, .. }));
    }

    #[test]
    fn test_nan_bound_is_invalid_rule() {
        let err = RuleTable::new(
            layers(&["slope"]),
            vec![Rule::new("Bad", 1, vec![ValueRange::at_least(f64::NAN)])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRule { position: 1, .. }));
    }

    #[test]
    fn test_arity_mismatch_is_schema_error() {
        let err = RuleTable::new(
            layers(&["fine_bpi", "slope"]),
            vec![Rule::new("Short", 1, vec![ValueRange::unbounded()])],
        )
        .unwrap_err();
        match err {
            Error::SchemaMismatch { subject, .. } => assert!(subject.contains("Short")),
            other => panic!("expected SchemaMismatch, got {other:?}"),
        }
    }

    #[test]
    fn test_duplicate_layers_rejected() {
        let err = RuleTable::new(
            layers(&["slope", "Slope"]),
            vec![Rule::new("A", 1, vec![ValueRange::unbounded(); 2])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::SchemaMismatch { .. }));
    }

    #[test]
    fn test_reserved_code() {
        let err = RuleTable::new(
            layers(&["slope"]),
            vec![Rule::new("Zero", UNCLASSIFIED, vec![ValueRange::unbounded()])],
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidRule { position: 1, .. }));

        let table = example_table().with_unclassified(99).unwrap();
        assert_eq!(table.classify_values(&[50.0, 0.0, 50.0]), 99);
        assert!(example_table().with_unclassified(2).is_err());
    }

    #[test]
    fn test_zone_names() {
        let table = example_table();
        assert_eq!(table.zone_name(1), "Flat");
        assert_eq!(table.zone_name(2), "Depression");
        assert_eq!(table.zone_name(UNCLASSIFIED), UNCLASSIFIED_ZONE);
        assert_eq!(table.zone_name(42), NO_MATCHING_ZONE);
    }

    #[test]
    fn test_codes_deduplicated_in_order() {
        let table = RuleTable::new(
            layers(&["depth"]),
            vec![
                Rule::new("Deep basin", 4, vec![ValueRange::at_most(-300.0)]),
                Rule::new("Shelf", 2, vec![ValueRange::closed(-100.0, 0.0)]),
                Rule::new("Deep slope", 4, vec![ValueRange::open(-300.0, -100.0)]),
            ],
        )
        .unwrap();
        assert_eq!(table.codes(), vec![4, 2]);
    }
}
