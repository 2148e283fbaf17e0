use serde::Serialize;

/// Outcome of a scan.
///
/// `Complete` and `NoTable` are the two "successful" terminations: character
/// and transition histograms are always valid for both, and the table
/// section (format descriptor + column accumulators) is valid for
/// `Complete` only. The remaining variants are fatal: the phase loop
/// stopped before reaching end of stream and only a partial histogram (if
/// any) survives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Scan reached end of stream and a table was recognized.
    Complete,
    /// Scan reached end of stream but format inference never resolved a
    /// column separator (format-inference exhaustion is folded into this
    /// variant, per design).
    NoTable,
    /// The first byte of a multi-byte UTF-8 sequence was not a valid
    /// prefix byte. `ordinal` on the owning [`crate::TableDescription`] is
    /// the 1-based position of the offending byte.
    Utf8Prefix,
    /// A continuation byte did not have the `10xxxxxx` form.
    Utf8Suffix,
    /// The byte source itself failed.
    FileIo,
    /// `scan` was invoked against a `TableDescription` that was not
    /// zero-initialized.
    UninitializedOutput,
}

impl Status {
    /// `true` for the two non-fatal terminations; matches the CLI's exit
    /// code contract (`0` iff this is `true`).
    pub fn is_success(self) -> bool {
        matches!(self, Status::Complete | Status::NoTable)
    }
}
