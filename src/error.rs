use std::io;
use thiserror::Error;

/// Error type for conditions the scanner cannot recover from.
///
/// Everything the original design treats as "not an error, only statistics"
/// (aberrant rows, value-set overflow, format-inference exhaustion) is
/// carried in [`crate::Status`] instead of here.
#[derive(Error, Debug)]
pub enum TabularError {
    /// IO error opening or reading the underlying byte source.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The codec-sniffing open routine matched a compression signature but
    /// the external decoder failed partway through the stream.
    #[error("decompression error ({codec}): {source}")]
    Decompress {
        codec: &'static str,
        #[source]
        source: io::Error,
    },

    /// A CSV field was opened with a quote but never closed before the line
    /// ended.
    #[error("unterminated quoted field at byte {0}")]
    UnterminatedQuotedField(u64),

    /// JSON serialization of a [`crate::TableDescription`] failed.
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// `TableDescription::scan` was called on a non-zero-initialized value.
    #[error("scan called on an already-populated TableDescription")]
    UninitializedOutput,
}

/// Result type alias for fallible scan-adjacent operations.
pub type Result<T> = std::result::Result<T, TabularError>;
