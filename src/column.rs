//! Per-column statistical accumulator and the classifier that resolves a
//! finished column into a statistical class.

use std::num::NonZeroU64;

use foldhash::HashSet;
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::tunables::Tunables;

/// Syntactic type a field was classified as on a single line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Empty,
    String,
    Integer,
    Float,
}

impl FieldType {
    fn vote_index(self) -> usize {
        match self {
            FieldType::Empty => 0,
            FieldType::String => 1,
            FieldType::Integer => 2,
            FieldType::Float => 3,
        }
    }
}

/// Statistical class a column is ultimately resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatClass {
    Unknown,
    Categorical,
    Quantitative,
    Ordinal,
}

static MISSING_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(n/?a|missing|null|none|unavailable|empty)$").expect("valid regex literal")
});

/// Classify one field string, mirroring the reference's speculative
/// `strtol`/`strtod` attempts: the most restrictive type that parses the
/// *entire* field wins.
fn classify_field(field: &str) -> FieldType {
    if field.is_empty() {
        FieldType::Empty
    } else if field.parse::<i64>().is_ok() {
        FieldType::Integer
    } else if field.parse::<f64>().is_ok() {
        FieldType::Float
    } else {
        FieldType::String
    }
}

/// Accumulated statistics and syntactic-type votes for a single column.
#[derive(Debug, Clone)]
pub struct ColumnAccumulator {
    pub type_vote: [u32; 4],
    pub stat_class: StatClass,
    pub mean: f64,
    pub variance: f64,
    pub extrema: (f64, f64),
    pub has_negative_integers: bool,
    pub integer_magnitudes: u32,
    value_set: HashSet<String>,
    pub excess_values: Option<NonZeroU64>,
    pub max_field_len: usize,
    pub long_field_count: u64,
    max_category_cardinality: usize,
}

impl ColumnAccumulator {
    pub fn new(tunables: &Tunables) -> Self {
        ColumnAccumulator {
            type_vote: [0; 4],
            stat_class: StatClass::Unknown,
            mean: 0.0,
            variance: 0.0,
            extrema: (0.0, 0.0),
            has_negative_integers: false,
            integer_magnitudes: 0,
            value_set: HashSet::default(),
            excess_values: None,
            max_field_len: 0,
            long_field_count: 0,
            max_category_cardinality: tunables.max_category_cardinality,
        }
    }

    pub fn value_set_size(&self) -> usize {
        self.value_set.len()
    }

    /// Labels currently admitted into the value set, for JSON emission.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.value_set.iter().map(|s| s.as_str())
    }

    /// Fold one observed field into the accumulator. `row_ordinal` is the
    /// 1-based ordinal of the row this field came from, used to stamp
    /// `excess_values` at the moment the value set would overflow.
    pub fn observe(&mut self, field: &str, row_ordinal: u64, tunables: &Tunables) {
        if field.is_empty() {
            self.type_vote[FieldType::Empty.vote_index()] += 1;
            return;
        }

        if field.len() > self.max_field_len {
            self.max_field_len = field.len();
        }

        let ty = classify_field(field);

        if ty == FieldType::Integer {
            // Field parsed as i64 above; re-parse is cheap and keeps the
            // classifier and the stat update from drifting apart.
            let ival: i64 = field.parse().expect("classified as Integer");
            self.has_negative_integers = self.has_negative_integers || ival < 0;
            let magnitude = (1.0 + (ival.unsigned_abs() as f64)).log10().floor() as u32;
            self.integer_magnitudes |= 1 << magnitude;
        }

        if field.len() <= tunables.maxlen_category_label && ty != FieldType::Float {
            if self.excess_values.is_none() {
                if self.value_set.contains(field) {
                    // Duplicate: silently accepted, nothing to update.
                } else if self.value_set.len() < self.max_category_cardinality {
                    self.value_set.insert(field.to_string());
                } else {
                    self.excess_values = NonZeroU64::new(row_ordinal.max(1));
                }
            }
        } else if ty != FieldType::Float {
            self.long_field_count += 1;
        }

        if ty == FieldType::Integer || ty == FieldType::Float {
            let n = (self.type_vote[FieldType::Integer.vote_index()]
                + self.type_vote[FieldType::Float.vote_index()]) as f64;
            let x: f64 = field.parse().expect("classified as numeric");

            let delta_old = x - self.mean;
            self.mean += delta_old / (n + 1.0);
            let delta_new = x - self.mean;
            self.variance = (n * self.variance + delta_old * delta_new) / (n + 1.0);

            if n > 0.0 {
                if self.extrema.0 > x {
                    self.extrema.0 = x;
                } else if self.extrema.1 < x {
                    self.extrema.1 = x;
                }
            } else {
                self.extrema = (x, x);
            }
        }

        self.type_vote[ty.vote_index()] += 1;
    }

    fn observed_type_count(&self) -> usize {
        self.type_vote[1..].iter().filter(|&&v| v > 0).count()
    }

    fn unique_alphabetic_string(&self) -> Option<&str> {
        if self.type_vote[FieldType::String.vote_index()] == 0 {
            return None;
        }
        let mut alpha = self.value_set.iter().filter(|s| s.chars().all(|c| c.is_alphabetic()));
        let first = alpha.next()?;
        if alpha.next().is_some() {
            None
        } else {
            Some(first.as_str())
        }
    }

    fn has_missing_data_placeholder(&self) -> bool {
        self.unique_alphabetic_string()
            .is_some_and(|s| MISSING_DATA_RE.is_match(s))
    }

    fn integer_heuristic(&self, tunables: &Tunables) -> StatClass {
        let n = self.type_vote[FieldType::Integer.vote_index()];
        let k = self.value_set.len();
        let (min, max) = self.extrema;

        if self.excess_values.is_some() {
            if self.has_negative_integers {
                StatClass::Quantitative
            } else {
                let max_mag = max.log10().floor() as u32;
                let m = self.integer_magnitudes.count_ones();
                if m == max_mag && min.round() as i64 == 1 && max.round() as i64 == n as i64 {
                    StatClass::Ordinal
                } else {
                    StatClass::Quantitative
                }
            }
        } else if self.has_negative_integers {
            let half = tunables.max_absolute_categorical_value / 2;
            if -half <= min as i64 && max as i64 <= half {
                StatClass::Categorical
            } else {
                StatClass::Quantitative
            }
        } else if k <= tunables.max_category_cardinality
            && max as i64 <= tunables.max_absolute_categorical_value
            && (k as u32) < n / 2
        {
            StatClass::Categorical
        } else {
            StatClass::Quantitative
        }
    }

    /// Resolve `stat_class` from the accumulated votes and statistics.
    /// Call once, after the scan reaches end of stream.
    pub fn finalize(&mut self, tunables: &Tunables) {
        self.stat_class = match self.observed_type_count() {
            0 => StatClass::Unknown,
            1 => {
                if self.type_vote[FieldType::Integer.vote_index()] > 0 {
                    self.integer_heuristic(tunables)
                } else if self.type_vote[FieldType::String.vote_index()] > 0 {
                    if self.excess_values.is_none()
                        && self.value_set.len() < self.type_vote[FieldType::String.vote_index()] as usize
                        && self.long_field_count == 0
                    {
                        StatClass::Categorical
                    } else {
                        StatClass::Unknown
                    }
                } else {
                    StatClass::Quantitative // Float
                }
            }
            2 => {
                if self.type_vote[FieldType::String.vote_index()] > 0 {
                    if self.has_missing_data_placeholder() {
                        if self.type_vote[FieldType::Integer.vote_index()] > 0 {
                            self.integer_heuristic(tunables)
                        } else {
                            StatClass::Quantitative
                        }
                    } else {
                        StatClass::Unknown
                    }
                } else {
                    StatClass::Quantitative
                }
            }
            _ => {
                if self.has_missing_data_placeholder() {
                    StatClass::Quantitative
                } else {
                    StatClass::Unknown
                }
            }
        };
    }
}
