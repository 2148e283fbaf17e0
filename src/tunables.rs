//! Process-wide heuristic knobs, optionally overridden via environment
//! variables at the start of a scan.

/// Value-set capacity per column before `excess_values` latches.
pub const DEFAULT_MAX_CATEGORY_CARDINALITY: usize = 32;
/// Upper bound on `max(|value|)` for an integer column to still be
/// considered categorical.
pub const DEFAULT_MAX_ABSOLUTE_CATEGORICAL_VALUE: i64 = 16;
/// Fields longer than this are never admitted to a column's value set.
pub const DEFAULT_MAXLEN_CATEGORY_LABEL: usize = 63;

pub(crate) const MAX_HEADER_LINES: u32 = 256;
pub(crate) const MAX_SAMPLE_LINES: u32 = 16;
pub(crate) const MAXLEN_STRING: usize = 15;
pub(crate) const MAXLEN_METADATA_PREFIX: usize = 7;

/// Immutable configuration snapshot, read once from the environment at the
/// start of a scan. Never mutated afterward.
#[derive(Debug, Clone, Copy)]
pub struct Tunables {
    pub max_category_cardinality: usize,
    pub max_absolute_categorical_value: i64,
    pub maxlen_category_label: usize,
}

impl Default for Tunables {
    fn default() -> Self {
        Tunables {
            max_category_cardinality: DEFAULT_MAX_CATEGORY_CARDINALITY,
            max_absolute_categorical_value: DEFAULT_MAX_ABSOLUTE_CATEGORICAL_VALUE,
            maxlen_category_label: DEFAULT_MAXLEN_CATEGORY_LABEL,
        }
    }
}

impl Tunables {
    /// Build from defaults, overriding any of the three knobs that are
    /// set (and parse) in the process environment.
    pub fn from_env() -> Self {
        let mut t = Tunables::default();
        if let Some(v) = env_usize("MAX_CATEGORY_CARDINALITY") {
            t.max_category_cardinality = v;
        }
        if let Some(v) = env_i64("MAX_ABSOLUTE_CATEGORICAL_VALUE") {
            t.max_absolute_categorical_value = v;
        }
        if let Some(v) = env_usize("MAXLEN_CATEGORY_LABEL") {
            t.maxlen_category_label = v;
        }
        tracing::debug!(?t, "tunables initialized from environment");
        t
    }
}

fn env_usize(name: &str) -> Option<usize> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

fn env_i64(name: &str) -> Option<i64> {
    std::env::var(name).ok().and_then(|s| s.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_implementation() {
        let t = Tunables::default();
        assert_eq!(t.max_category_cardinality, 32);
        assert_eq!(t.max_absolute_categorical_value, 16);
        assert_eq!(t.maxlen_category_label, 63);
    }
}
