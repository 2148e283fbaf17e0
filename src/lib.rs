//! tabular-scan: single-pass streaming analyzer for tabular text files.
//!
//! Given an arbitrary byte stream, [`scan`] infers in one left-to-right
//! traversal: whether it is valid UTF-8, its line-termination convention,
//! whether its body is a structured table (and if so its metadata-line
//! prefix, column separator, and column count), per-column statistics,
//! and a per-column statistical classification.
//!
//! # Quick start
//!
//! ```no_run
//! use tabular::scan;
//!
//! let data = b"a,b,c\n1,2,3\n4,5,6\n";
//! let table = scan(&data[..]);
//! println!("status: {:?}", table.status());
//! if let Some(fmt) = table.format() {
//!     println!("columns: {}", fmt.column_count);
//! }
//! ```

mod cache;
mod charclass;
mod column;
mod decompress;
mod error;
mod format;
mod json;
mod prefix;
mod scan;
mod splitter;
pub mod stats;
mod status;
mod table;
mod tunables;
mod utf8;

use cache::SampleCache;

pub use column::{ColumnAccumulator, FieldType, StatClass};
pub use decompress::open_transparent;
pub use error::{Result, TabularError};
pub use format::FormatDescriptor;
pub use json::{to_abridged, to_exhaustive};
pub use scan::{scan, scan_with_tunables};
pub use splitter::Splitter;
pub use status::Status;
pub use table::{RowCounts, TableDescription};
pub use tunables::Tunables;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn public_api_scans_a_simple_csv() {
        let table = scan(Cursor::new(b"a,b,c\n1,2,3\n4,5,6\n".as_slice()));
        assert_eq!(table.status(), Status::Complete);
        assert_eq!(table.format().unwrap().column_count, 3);
    }

    #[test]
    fn public_api_serializes_to_json() {
        let table = scan(Cursor::new(b"a,b,c\n1,2,3\n4,5,6\n".as_slice()));
        let body = to_exhaustive(&table).unwrap();
        assert!(body.contains("column_count"));
    }
}
