//! Equal-frequency binning of numeric and categorical variables
//!
//! Numeric variables are cut at the j/b quantiles of their non-missing values.
//! Ties collapse adjacent candidate bins, so a variable can end up with fewer
//! bins than requested. Categorical variables get one bin per distinct level.
//! Missing values always form their own bin, placed last.

use std::collections::HashMap;
use std::fmt;

use serde::Serialize;

use super::error::{InfoError, InfoResult};

/// Label used for the missing-value bin
pub const MISSING_LABEL: &str = "MISSING";

/// Label of the validation group that matched no training bin
pub const OTHER_LABEL: &str = "OTHER";

/// Declared type of a variable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VariableKind {
    Numeric,
    Categorical,
}

impl fmt::Display for VariableKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VariableKind::Numeric => write!(f, "numeric"),
            VariableKind::Categorical => write!(f, "categorical"),
        }
    }
}

/// Raw values of one variable, one entry per record. `None` marks a missing value.
#[derive(Debug, Clone, PartialEq)]
pub enum VariableValues {
    Numeric(Vec<Option<f64>>),
    Categorical(Vec<Option<String>>),
}

impl VariableValues {
    pub fn kind(&self) -> VariableKind {
        match self {
            VariableValues::Numeric(_) => VariableKind::Numeric,
            VariableValues::Categorical(_) => VariableKind::Categorical,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            VariableValues::Numeric(v) => v.len(),
            VariableValues::Categorical(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Keep only the records whose mask entry is true
    pub fn filter(&self, keep: &[bool]) -> VariableValues {
        match self {
            VariableValues::Numeric(v) => VariableValues::Numeric(
                v.iter()
                    .zip(keep)
                    .filter(|&(_, &k)| k)
                    .map(|(x, _)| *x)
                    .collect(),
            ),
            VariableValues::Categorical(v) => VariableValues::Categorical(
                v.iter()
                    .zip(keep)
                    .filter(|&(_, &k)| k)
                    .map(|(x, _)| x.clone())
                    .collect(),
            ),
        }
    }
}

/// Membership predicate of a bin
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BinKind {
    /// Values in `(lower, upper]`. The outermost edges are infinite and are
    /// left out when serialized.
    /// `min`/`max` are the smallest and largest training values in the bin.
    Range {
        #[serde(skip_serializing_if = "is_unbounded")]
        lower: f64,
        #[serde(skip_serializing_if = "is_unbounded")]
        upper: f64,
        min: f64,
        max: f64,
    },
    /// A single categorical level
    Category { value: String },
    /// Records with a missing value
    Missing,
}

fn is_unbounded(edge: &f64) -> bool {
    edge.is_infinite()
}

/// One bin of a variable, with its training record count
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bin {
    #[serde(flatten)]
    pub kind: BinKind,
    pub count: usize,
}

impl Bin {
    /// Human-readable label, e.g. `[1, 4]`, `red`, `MISSING`
    pub fn label(&self) -> String {
        match &self.kind {
            BinKind::Range { min, max, .. } => {
                if min == max {
                    format!("{}", min)
                } else {
                    format!("[{}, {}]", min, max)
                }
            }
            BinKind::Category { value } => value.clone(),
            BinKind::Missing => MISSING_LABEL.to_string(),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self.kind, BinKind::Missing)
    }
}

/// A value to be routed to a bin
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BinValue<'a> {
    Number(f64),
    Category(&'a str),
    Missing,
}

/// Boundaries used to route values to bins
#[derive(Debug, Clone, PartialEq)]
enum Boundaries {
    /// Sorted, strictly increasing right-closed cut points
    Numeric { cuts: Vec<f64> },
    /// Level -> bin index
    Categorical { levels: HashMap<String, usize> },
}

/// Ordered bins of one variable, plus the bin of every training record
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BinTable {
    pub variable: String,
    pub kind: VariableKind,
    pub bins: Vec<Bin>,
    #[serde(skip)]
    boundaries: Boundaries,
    #[serde(skip)]
    assignments: Vec<usize>,
}

impl BinTable {
    /// Number of bins, including the missing bin
    pub fn len(&self) -> usize {
        self.bins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }

    /// Bin index of each training record, in record order
    pub fn assignments(&self) -> &[usize] {
        &self.assignments
    }

    /// Index of the missing bin, if the training data had missing values
    pub fn missing_index(&self) -> Option<usize> {
        self.bins.iter().position(Bin::is_missing)
    }

    /// Cut points of a numeric table (empty for categorical tables)
    pub fn cut_points(&self) -> &[f64] {
        match &self.boundaries {
            Boundaries::Numeric { cuts } => cuts,
            Boundaries::Categorical { .. } => &[],
        }
    }

    /// Route a value to a bin using the boundaries learned on training data.
    ///
    /// Numeric values outside the training range land in the first or last
    /// range bin. Unseen categorical levels and missing values go to the
    /// missing bin if one exists; otherwise `None`, and validation groups them
    /// under [`OTHER_LABEL`]. A value of the wrong type for this table is
    /// never assigned.
    pub fn assign(&self, value: BinValue<'_>) -> Option<usize> {
        match (&self.boundaries, value) {
            (_, BinValue::Missing) => self.missing_index(),
            (Boundaries::Numeric { .. }, BinValue::Number(x)) if x.is_nan() => {
                self.missing_index()
            }
            (Boundaries::Numeric { cuts }, BinValue::Number(x)) => {
                Some(cuts.partition_point(|&c| c < x))
            }
            (Boundaries::Categorical { levels }, BinValue::Category(level)) => {
                levels.get(level).copied().or_else(|| self.missing_index())
            }
            _ => None,
        }
    }

    /// Route every value of a (validation) variable to a bin
    pub fn assign_values(&self, values: &VariableValues) -> Vec<Option<usize>> {
        match values {
            VariableValues::Numeric(v) => v
                .iter()
                .map(|x| self.assign(x.map_or(BinValue::Missing, BinValue::Number)))
                .collect(),
            VariableValues::Categorical(v) => v
                .iter()
                .map(|x| {
                    self.assign(
                        x.as_deref()
                            .map_or(BinValue::Missing, BinValue::Category),
                    )
                })
                .collect(),
        }
    }
}

/// Bin a variable into (at most) `target_bins` equal-frequency groups.
///
/// # Arguments
/// * `variable` - Variable name, carried into the table and errors
/// * `values` - One value per record
/// * `target_bins` - Requested number of numeric bins (ignored for categorical)
///
/// # Errors
/// `InsufficientData` when the variable has no non-missing values.
pub fn bin_variable(
    variable: &str,
    values: &VariableValues,
    target_bins: usize,
) -> InfoResult<BinTable> {
    if target_bins == 0 {
        return Err(InfoError::InvalidConfig(
            "bins must be at least 1".to_string(),
        ));
    }
    match values {
        VariableValues::Numeric(v) => bin_numeric(variable, v, target_bins),
        VariableValues::Categorical(v) => bin_categorical(variable, v),
    }
}

fn bin_numeric(
    variable: &str,
    values: &[Option<f64>],
    target_bins: usize,
) -> InfoResult<BinTable> {
    // NaN is treated as missing
    let mut sorted: Vec<f64> = values
        .iter()
        .flatten()
        .copied()
        .filter(|x| !x.is_nan())
        .collect();
    if sorted.is_empty() {
        return Err(InfoError::InsufficientData {
            variable: variable.to_string(),
        });
    }
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let mut distinct = sorted.clone();
    distinct.dedup();

    let cuts = if distinct.len() < target_bins {
        // Low cardinality: one bin per distinct value
        distinct[..distinct.len() - 1].to_vec()
    } else {
        quantile_cuts(&sorted, target_bins)
    };

    let n_ranges = cuts.len() + 1;
    let mut counts = vec![0usize; n_ranges];
    let mut mins = vec![f64::INFINITY; n_ranges];
    let mut maxs = vec![f64::NEG_INFINITY; n_ranges];
    let mut missing = 0usize;
    let mut assignments = Vec::with_capacity(values.len());

    for value in values {
        match value {
            Some(x) if !x.is_nan() => {
                let idx = cuts.partition_point(|&c| c < *x);
                counts[idx] += 1;
                mins[idx] = mins[idx].min(*x);
                maxs[idx] = maxs[idx].max(*x);
                assignments.push(idx);
            }
            _ => {
                missing += 1;
                assignments.push(n_ranges);
            }
        }
    }

    let mut bins: Vec<Bin> = (0..n_ranges)
        .map(|i| Bin {
            kind: BinKind::Range {
                lower: if i == 0 { f64::NEG_INFINITY } else { cuts[i - 1] },
                upper: if i == n_ranges - 1 { f64::INFINITY } else { cuts[i] },
                min: mins[i],
                max: maxs[i],
            },
            count: counts[i],
        })
        .collect();

    if missing > 0 {
        bins.push(Bin {
            kind: BinKind::Missing,
            count: missing,
        });
    }

    Ok(BinTable {
        variable: variable.to_string(),
        kind: VariableKind::Numeric,
        bins,
        boundaries: Boundaries::Numeric { cuts },
        assignments,
    })
}

/// Cut points at the j/b quantiles (j = 1..b-1), deduplicated.
///
/// Uses linear interpolation between order statistics at rank `(n-1)·j/b`.
/// The rank is split into integer and fractional parts with integer arithmetic
/// so that exact ranks hit an order statistic exactly. A candidate cut is kept
/// only if the bin it closes is non-empty and values remain above it, which
/// collapses tied quantiles.
fn quantile_cuts(sorted: &[f64], target_bins: usize) -> Vec<f64> {
    let n = sorted.len();
    let mut cuts: Vec<f64> = Vec::with_capacity(target_bins.saturating_sub(1));
    // number of values <= the last kept cut
    let mut covered = 0usize;

    for j in 1..target_bins {
        let rank = (n - 1) * j;
        let lo = rank / target_bins;
        let rem = rank % target_bins;
        let q = if rem == 0 || lo + 1 >= n {
            sorted[lo]
        } else {
            let frac = rem as f64 / target_bins as f64;
            sorted[lo] + frac * (sorted[lo + 1] - sorted[lo])
        };

        let below = sorted.partition_point(|&x| x <= q);
        if below > covered && below < n {
            cuts.push(q);
            covered = below;
        }
    }

    cuts
}

fn bin_categorical(variable: &str, values: &[Option<String>]) -> InfoResult<BinTable> {
    let mut levels: HashMap<String, usize> = HashMap::new();
    let mut bins: Vec<Bin> = Vec::new();
    let mut missing_rows: Vec<usize> = Vec::new();
    let mut assignments = Vec::with_capacity(values.len());

    for (row, value) in values.iter().enumerate() {
        match value {
            Some(level) => {
                let idx = match levels.get(level) {
                    Some(&idx) => idx,
                    None => {
                        let idx = bins.len();
                        levels.insert(level.clone(), idx);
                        bins.push(Bin {
                            kind: BinKind::Category {
                                value: level.clone(),
                            },
                            count: 0,
                        });
                        idx
                    }
                };
                bins[idx].count += 1;
                assignments.push(idx);
            }
            None => {
                missing_rows.push(row);
                // patched once the number of levels is known
                assignments.push(usize::MAX);
            }
        }
    }

    if bins.is_empty() {
        return Err(InfoError::InsufficientData {
            variable: variable.to_string(),
        });
    }

    if !missing_rows.is_empty() {
        let missing_idx = bins.len();
        for row in &missing_rows {
            assignments[*row] = missing_idx;
        }
        bins.push(Bin {
            kind: BinKind::Missing,
            count: missing_rows.len(),
        });
    }

    Ok(BinTable {
        variable: variable.to_string(),
        kind: VariableKind::Categorical,
        bins,
        boundaries: Boundaries::Categorical { levels },
        assignments,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numeric(values: &[f64]) -> VariableValues {
        VariableValues::Numeric(values.iter().map(|&v| Some(v)).collect())
    }

    fn categorical(values: &[Option<&str>]) -> VariableValues {
        VariableValues::Categorical(values.iter().map(|v| v.map(String::from)).collect())
    }

    #[test]
    fn test_two_bins_split_at_median() {
        let values = numeric(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
        let table = bin_variable("x", &values, 2).unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.bins[0].count, 4);
        assert_eq!(table.bins[1].count, 4);
        assert_eq!(table.bins[0].label(), "[1, 4]");
        assert_eq!(table.bins[1].label(), "[5, 8]");
        assert_eq!(table.cut_points(), &[4.5]);
    }

    #[test]
    fn test_no_ties_gives_exact_bin_count_and_balanced_sizes() {
        for n in [7usize, 10, 23, 50, 101] {
            for b in [2usize, 3, 4, 5, 7] {
                if n < b {
                    continue;
                }
                let values: Vec<f64> = (0..n).map(|i| (i as f64) * 1.5 - 3.0).collect();
                let table = bin_variable("x", &numeric(&values), b).unwrap();
                assert_eq!(table.len(), b, "n={} b={}", n, b);
                let floor = n / b;
                let ceil = (n + b - 1) / b;
                for bin in &table.bins {
                    assert!(
                        bin.count == floor || bin.count == ceil,
                        "n={} b={} got bin of size {}",
                        n,
                        b,
                        bin.count
                    );
                }
            }
        }
    }

    #[test]
    fn test_ties_collapse_bins() {
        let values = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let table = bin_variable("x", &numeric(&values), 5).unwrap();
        assert!(table.len() < 5);
        let total: usize = table.bins.iter().map(|b| b.count).sum();
        assert_eq!(total, values.len());
        assert!(table.bins.iter().all(|b| b.count > 0));
    }

    #[test]
    fn test_constant_variable_single_bin() {
        let table = bin_variable("x", &numeric(&[3.0; 12]), 10).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.bins[0].count, 12);
        assert_eq!(table.bins[0].label(), "3");
    }

    #[test]
    fn test_low_cardinality_one_bin_per_value() {
        let values: Vec<f64> = (0..40).map(|i| (i % 5) as f64).collect();
        let table = bin_variable("x", &numeric(&values), 20).unwrap();
        assert_eq!(table.len(), 5);
        for bin in &table.bins {
            assert_eq!(bin.count, 8);
            match bin.kind {
                BinKind::Range { min, max, .. } => assert_eq!(min, max),
                _ => panic!("expected range bin"),
            }
        }
    }

    #[test]
    fn test_missing_values_get_last_bin() {
        let values = VariableValues::Numeric(vec![
            Some(1.0),
            None,
            Some(2.0),
            Some(f64::NAN),
            Some(3.0),
            Some(4.0),
        ]);
        let table = bin_variable("x", &values, 2).unwrap();
        let last = table.bins.last().unwrap();
        assert!(last.is_missing());
        assert_eq!(last.count, 2);
        assert_eq!(table.missing_index(), Some(table.len() - 1));
        assert_eq!(table.assignments()[1], table.len() - 1);
        assert_eq!(table.assignments()[3], table.len() - 1);
    }

    #[test]
    fn test_all_missing_is_insufficient_data() {
        let values = VariableValues::Numeric(vec![None, None, Some(f64::NAN)]);
        let err = bin_variable("x", &values, 4).unwrap_err();
        assert!(matches!(err, InfoError::InsufficientData { .. }));

        let values = categorical(&[None, None]);
        let err = bin_variable("c", &values, 4).unwrap_err();
        assert!(matches!(err, InfoError::InsufficientData { .. }));
    }

    #[test]
    fn test_assignments_partition_records() {
        let values: Vec<f64> = (0..37).map(|i| ((i * 7) % 13) as f64).collect();
        let table = bin_variable("x", &numeric(&values), 4).unwrap();
        assert_eq!(table.assignments().len(), values.len());
        let mut counts = vec![0usize; table.len()];
        for &idx in table.assignments() {
            counts[idx] += 1;
        }
        let table_counts: Vec<usize> = table.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, table_counts);
    }

    #[test]
    fn test_numeric_bins_are_ordered() {
        let values: Vec<f64> = (0..100).map(|i| ((i * 37) % 101) as f64).collect();
        let table = bin_variable("x", &numeric(&values), 6).unwrap();
        let mut prev_max = f64::NEG_INFINITY;
        for bin in &table.bins {
            if let BinKind::Range { lower, upper, min, max } = bin.kind {
                assert!(min > prev_max);
                assert!(min > lower && max <= upper);
                prev_max = max;
            }
        }
    }

    #[test]
    fn test_categorical_first_seen_order() {
        let values = categorical(&[Some("b"), Some("a"), None, Some("b"), Some("c")]);
        let table = bin_variable("c", &values, 2).unwrap();
        let labels: Vec<String> = table.bins.iter().map(Bin::label).collect();
        assert_eq!(labels, vec!["b", "a", "c", MISSING_LABEL]);
        assert_eq!(table.bins[0].count, 2);
        assert_eq!(table.assignments(), &[0, 1, 3, 0, 2]);
    }

    #[test]
    fn test_assign_out_of_range_and_unseen() {
        let table = bin_variable("x", &numeric(&[1.0, 2.0, 3.0, 4.0]), 2).unwrap();
        assert_eq!(table.assign(BinValue::Number(-100.0)), Some(0));
        assert_eq!(table.assign(BinValue::Number(100.0)), Some(1));
        assert_eq!(table.assign(BinValue::Missing), None);
        assert_eq!(table.assign(BinValue::Category("a")), None);

        let values = categorical(&[Some("a"), Some("b"), None]);
        let table = bin_variable("c", &values, 2).unwrap();
        assert_eq!(table.assign(BinValue::Category("b")), Some(1));
        assert_eq!(table.assign(BinValue::Category("zzz")), Some(2));

        let values = categorical(&[Some("a"), Some("b")]);
        let table = bin_variable("c", &values, 2).unwrap();
        assert_eq!(table.assign(BinValue::Category("zzz")), None);
    }

    #[test]
    fn test_filter_values() {
        let values = numeric(&[1.0, 2.0, 3.0]);
        let filtered = values.filter(&[true, false, true]);
        assert_eq!(filtered, numeric(&[1.0, 3.0]));
    }

    #[test]
    fn test_outer_edges_are_not_serialized() {
        let table = bin_variable("x", &numeric(&[1.0, 2.0, 3.0, 4.0]), 2).unwrap();

        let first = serde_json::to_value(&table.bins[0]).unwrap();
        assert_eq!(first["type"], "range");
        assert!(first.get("lower").is_none());
        assert_eq!(first["upper"], 2.5);

        let last = serde_json::to_value(&table.bins[1]).unwrap();
        assert_eq!(last["lower"], 2.5);
        assert!(last.get("upper").is_none());
        assert_eq!(last["count"], 2);
    }
}
