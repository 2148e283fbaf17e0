//! JSON serialization of a finished [`TableDescription`], in the two
//! shapes the reference implementation's own serializer supports: an
//! exhaustive shape (full per-column labels) and an abridged shape (a
//! stable hash of the label set in place of the labels themselves).

use serde::Serialize;

use crate::charclass::{CharClassCounts, CoarseClass, TransitionMatrix};
use crate::column::{ColumnAccumulator, FieldType, StatClass};
use crate::error::TabularError;
use crate::status::Status;
use crate::table::TableDescription;

#[derive(Serialize)]
struct Histogram {
    lf: u64,
    cr: u64,
    ascii: u64,
    #[serde(rename = "utf8-2")]
    utf8_2: u64,
    #[serde(rename = "utf8-3")]
    utf8_3: u64,
    #[serde(rename = "utf8-4")]
    utf8_4: u64,
}

impl From<&CharClassCounts> for Histogram {
    fn from(c: &CharClassCounts) -> Self {
        Histogram {
            lf: c.lf,
            cr: c.cr,
            ascii: c.ascii,
            utf8_2: c.utf8_2,
            utf8_3: c.utf8_3,
            utf8_4: c.utf8_4,
        }
    }
}

#[derive(Serialize)]
struct TransitionRow {
    lf: u64,
    cr: u64,
    oc: u64,
}

#[derive(Serialize)]
struct TransitionHistogram {
    lf: TransitionRow,
    cr: TransitionRow,
    oc: TransitionRow,
}

impl From<&TransitionMatrix> for TransitionHistogram {
    fn from(m: &TransitionMatrix) -> Self {
        let row = |c| {
            let (lf, cr, oc) = m.row(c);
            TransitionRow { lf, cr, oc }
        };
        TransitionHistogram {
            lf: row(CoarseClass::Lf),
            cr: row(CoarseClass::Cr),
            oc: row(CoarseClass::Char),
        }
    }
}

fn non_utf8_value(td: &TableDescription) -> serde_json::Value {
    match td.status() {
        Status::Utf8Prefix | Status::Utf8Suffix => serde_json::Value::from(td.ordinal()),
        _ => serde_json::Value::Bool(false),
    }
}

#[derive(Serialize)]
struct Votes {
    empty: u32,
    integer: u32,
    float: u32,
    string: u32,
}

#[derive(Serialize)]
struct Stats {
    mean: f64,
    stddev: f64,
}

#[derive(Serialize)]
struct Extrema {
    min: f64,
    max: f64,
}

#[derive(Serialize)]
struct ExhaustiveColumn {
    inferred_class: StatClass,
    votes: Votes,
    stats: Stats,
    extrema: Extrema,
    max_field_length: usize,
    long_field_count: u64,
    labels: Vec<String>,
    max_labels_exceeded: bool,
}

impl From<&ColumnAccumulator> for ExhaustiveColumn {
    fn from(c: &ColumnAccumulator) -> Self {
        let mut labels: Vec<String> = c.labels().map(|s| s.to_string()).collect();
        labels.sort();
        ExhaustiveColumn {
            inferred_class: c.stat_class,
            votes: Votes {
                empty: c.type_vote[FieldType::Empty as usize],
                integer: c.type_vote[FieldType::Integer as usize],
                float: c.type_vote[FieldType::Float as usize],
                string: c.type_vote[FieldType::String as usize],
            },
            stats: Stats {
                mean: c.mean,
                stddev: c.variance.sqrt(),
            },
            extrema: Extrema {
                min: c.extrema.0,
                max: c.extrema.1,
            },
            max_field_length: c.max_field_len,
            long_field_count: c.long_field_count,
            labels,
            max_labels_exceeded: c.excess_values.is_some(),
        }
    }
}

#[derive(Serialize)]
struct ExhaustiveTable {
    metadata_prefix: String,
    column_separator: String,
    separator_is_regex: bool,
    column_count: usize,
    empty_lines: u32,
    data_lines: u32,
    meta_lines: u32,
    aberrant_lines: u32,
    columns: Vec<ExhaustiveColumn>,
}

#[derive(Serialize)]
struct ExhaustiveReport {
    non_utf8: serde_json::Value,
    character_histogram: Histogram,
    transition_histogram: TransitionHistogram,
    table: Option<ExhaustiveTable>,
}

/// Serialize the full report: per-column label sets included verbatim.
pub fn to_exhaustive(td: &TableDescription) -> Result<String, TabularError> {
    let table = td.format().map(|fmt| {
        let rows = td.rows();
        ExhaustiveTable {
            metadata_prefix: String::from_utf8_lossy(&fmt.metadata_prefix).into_owned(),
            column_separator: String::from_utf8_lossy(&fmt.column_separator).into_owned(),
            separator_is_regex: fmt.separator_is_regex,
            column_count: fmt.column_count,
            empty_lines: rows.empty,
            data_lines: rows.data,
            meta_lines: rows.meta,
            aberrant_lines: rows.aberrant,
            columns: td.columns().iter().map(ExhaustiveColumn::from).collect(),
        }
    });

    let report = ExhaustiveReport {
        non_utf8: non_utf8_value(td),
        character_histogram: Histogram::from(td.char_class_counts()),
        transition_histogram: TransitionHistogram::from(td.transitions()),
        table,
    };
    Ok(serde_json::to_string(&report)?)
}

#[derive(Serialize)]
struct AbridgedColumn {
    #[serde(rename = "type")]
    field_type: &'static str,
    class: StatClass,
    label_set_hash: String,
}

/// Presence-precedence, not majority: a single stray string vote still
/// reports `"string"` even alongside a hundred integers.
fn dominant_field_type(c: &ColumnAccumulator) -> &'static str {
    if c.type_vote[FieldType::String as usize] > 0 {
        "string"
    } else if c.type_vote[FieldType::Float as usize] > 0 {
        "float"
    } else if c.type_vote[FieldType::Integer as usize] > 0 {
        "int"
    } else {
        "empty"
    }
}

/// FNV-1a over the sorted label set, each label separated by an ASCII unit
/// separator byte so that `["ab", "c"]` and `["a", "bc"]` hash differently.
fn label_set_hash(labels: &[&str]) -> u32 {
    const FNV_OFFSET: u32 = 0x811c_9dc5;
    const FNV_PRIME: u32 = 0x0100_0193;

    let mut sorted: Vec<&str> = labels.to_vec();
    sorted.sort_unstable();

    let mut hash = FNV_OFFSET;
    for label in sorted {
        for &b in label.as_bytes() {
            hash ^= b as u32;
            hash = hash.wrapping_mul(FNV_PRIME);
        }
        hash ^= 0x1F;
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}

impl From<&ColumnAccumulator> for AbridgedColumn {
    fn from(c: &ColumnAccumulator) -> Self {
        let hash = if c.excess_values.is_some() {
            0xFFFF_FFFF
        } else if c.value_set_size() == 0 {
            0
        } else {
            let labels: Vec<&str> = c.labels().collect();
            label_set_hash(&labels)
        };
        AbridgedColumn {
            field_type: dominant_field_type(c),
            class: c.stat_class,
            label_set_hash: format!("{hash:08X}"),
        }
    }
}

#[derive(Serialize)]
struct AbridgedReport {
    non_utf8: serde_json::Value,
    lines_empty: u32,
    lines_data: u32,
    lines_meta: u32,
    lines_aberrant: u32,
    columns: Vec<AbridgedColumn>,
}

/// Serialize the abridged report: labels replaced by a stable hash of the
/// sorted label set, intended for plugin/pipeline consumption where the
/// raw label strings are unnecessary payload.
pub fn to_abridged(td: &TableDescription) -> Result<String, TabularError> {
    let rows = td.rows();
    let report = AbridgedReport {
        non_utf8: non_utf8_value(td),
        lines_empty: rows.empty,
        lines_data: rows.data,
        lines_meta: rows.meta,
        lines_aberrant: rows.aberrant,
        columns: td.columns().iter().map(AbridgedColumn::from).collect(),
    };
    Ok(serde_json::to_string(&report)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::scan_with_tunables;
    use crate::tunables::Tunables;
    use std::io::Cursor;

    #[test]
    fn exhaustive_emission_is_idempotent() {
        let td = scan_with_tunables(Cursor::new(b"a,b,c\n1,2,3\n4,5,6\n".as_slice()), &Tunables::default());
        let first = to_exhaustive(&td).unwrap();
        let second = to_exhaustive(&td).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn abridged_emission_has_no_labels_field() {
        let td = scan_with_tunables(Cursor::new(b"a,b,c\n1,2,3\n4,5,6\n".as_slice()), &Tunables::default());
        let body = to_abridged(&td).unwrap();
        assert!(!body.contains("labels"));
        assert!(body.contains("lines_data"));
    }

    #[test]
    fn label_hash_is_order_independent() {
        let a = label_set_hash(&["red", "green", "blue"]);
        let b = label_set_hash(&["blue", "red", "green"]);
        assert_eq!(a, b);
    }

    #[test]
    fn empty_label_set_hashes_to_zero() {
        assert_eq!(label_set_hash(&[]), 0);
    }
}
