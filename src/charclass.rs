//! Character classification and the running histogram/transition matrix.

use serde::Serialize;

/// Coarse classification used by the line-terminator inference and the
/// transition matrix: every character is either a terminator byte or
/// "ordinary content".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoarseClass {
    Lf,
    Cr,
    Char,
}

impl CoarseClass {
    fn index(self) -> usize {
        match self {
            CoarseClass::Lf => 0,
            CoarseClass::Cr => 1,
            CoarseClass::Char => 2,
        }
    }
}

/// Fine classification: `Char` is refined by UTF-8 encoded length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FineClass {
    Lf,
    Cr,
    Ascii,
    Utf8_2,
    Utf8_3,
    Utf8_4,
}

impl FineClass {
    fn index(self) -> usize {
        match self {
            FineClass::Lf => 0,
            FineClass::Cr => 1,
            FineClass::Ascii => 2,
            FineClass::Utf8_2 => 3,
            FineClass::Utf8_3 => 4,
            FineClass::Utf8_4 => 5,
        }
    }

    pub fn coarse(self) -> CoarseClass {
        match self {
            FineClass::Lf => CoarseClass::Lf,
            FineClass::Cr => CoarseClass::Cr,
            FineClass::Ascii | FineClass::Utf8_2 | FineClass::Utf8_3 | FineClass::Utf8_4 => {
                CoarseClass::Char
            }
        }
    }
}

/// Per-class character counts: `[lf, cr, ascii, utf8-2, utf8-3, utf8-4]`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct CharClassCounts {
    pub lf: u64,
    pub cr: u64,
    pub ascii: u64,
    pub utf8_2: u64,
    pub utf8_3: u64,
    pub utf8_4: u64,
}

impl CharClassCounts {
    pub(crate) fn record(&mut self, class: FineClass) {
        match class {
            FineClass::Lf => self.lf += 1,
            FineClass::Cr => self.cr += 1,
            FineClass::Ascii => self.ascii += 1,
            FineClass::Utf8_2 => self.utf8_2 += 1,
            FineClass::Utf8_3 => self.utf8_3 += 1,
            FineClass::Utf8_4 => self.utf8_4 += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.lf + self.cr + self.ascii + self.utf8_2 + self.utf8_3 + self.utf8_4
    }
}

/// 3x3 transition matrix over the coarse classes, row = previous character,
/// column = current character, ordered `[lf, cr, oc]` (`oc` = "other
/// content", i.e. `Char`).
#[derive(Debug, Clone, Copy, Default)]
pub struct TransitionMatrix {
    counts: [u64; 9],
}

impl TransitionMatrix {
    pub(crate) fn record(&mut self, prev: CoarseClass, curr: CoarseClass) {
        self.counts[prev.index() * 3 + curr.index()] += 1;
    }

    pub fn row(&self, class: CoarseClass) -> (u64, u64, u64) {
        let base = class.index() * 3;
        (
            self.counts[base],
            self.counts[base + 1],
            self.counts[base + 2],
        )
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }
}

/// Tracks the previous character's coarse class so the transition matrix
/// can be updated; `None` before the first character has been seen.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClassAccounting {
    pub counts: CharClassCounts,
    pub transitions: TransitionMatrix,
    prev_coarse: Option<CoarseClass>,
}

impl ClassAccounting {
    /// Record one decoded character; returns its coarse class for callers
    /// (phase handlers) that need to branch on it immediately.
    pub(crate) fn observe(&mut self, class: FineClass) -> CoarseClass {
        self.counts.record(class);
        let coarse = class.coarse();
        if let Some(prev) = self.prev_coarse {
            self.transitions.record(prev, coarse);
        }
        self.prev_coarse = Some(coarse);
        coarse
    }

    pub fn prev_coarse(&self) -> Option<CoarseClass> {
        self.prev_coarse
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn histogram_and_transitions_sum_correctly() {
        let mut acc = ClassAccounting::default();
        for class in [FineClass::Ascii, FineClass::Ascii, FineClass::Lf, FineClass::Utf8_2] {
            acc.observe(class);
        }
        assert_eq!(acc.counts.total(), 4);
        assert_eq!(acc.transitions.total(), 3);
    }
}
