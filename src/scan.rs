//! The phase dispatcher: a single byte-consuming loop that drives UTF-8
//! decoding, character-class accounting, header discard, sample
//! acquisition, format inference, and per-column content analysis in one
//! pass.

use std::io::Read;

use crate::charclass::CoarseClass;
use crate::format::{infer_format, rstrip_terminators};
use crate::prefix::{GroupEvent, PrefixPartitioner};
use crate::status::Status;
use crate::table::TableDescription;
use crate::tunables::{Tunables, MAXLEN_METADATA_PREFIX, MAX_HEADER_LINES, MAX_SAMPLE_LINES};
use crate::utf8::{Utf8Fault, Utf8Reader};
use crate::SampleCache;

/// Which stage of the pipeline is currently consuming characters.
enum Phase {
    InferLineTerminator,
    DiscardHeader,
    AcquireSample,
    AnalyzeContent,
    /// Format inference gave up; keep decoding for character statistics
    /// only, matching `NoTable`'s contract that histograms stay valid.
    CharactersOnly,
}

fn terminator_byte(coarse: CoarseClass) -> u8 {
    match coarse {
        CoarseClass::Lf => b'\n',
        CoarseClass::Cr => b'\r',
        CoarseClass::Char => unreachable!("not a terminator class"),
    }
}

fn is_terminator_class(coarse: CoarseClass) -> bool {
    matches!(coarse, CoarseClass::Lf | CoarseClass::Cr)
}

/// Punctuation-only prefix, clipped to `MAXLEN_METADATA_PREFIX`, or `None`
/// if the group's leading bytes don't start with punctuation at all.
fn admissible_metadata_prefix(raw: &[u8]) -> Option<Vec<u8>> {
    if !raw.first().is_some_and(|b| b.is_ascii_punctuation()) {
        return None;
    }
    let clipped: Vec<u8> = raw
        .iter()
        .take(MAXLEN_METADATA_PREFIX)
        .take_while(|b| b.is_ascii_punctuation())
        .copied()
        .collect();
    Some(clipped)
}

/// Classify and (if recognized) split one already-complete physical line,
/// folding the result into row counters and per-column accumulators.
fn analyze_line(td: &mut TableDescription, raw_line: &[u8], tunables: &Tunables) {
    let line = rstrip_terminators(raw_line);
    if line.is_empty() {
        td.rows.empty += 1;
        return;
    }

    let fmt = td.format.as_ref().expect("AnalyzeContent requires a resolved format");
    if !fmt.metadata_prefix.is_empty() && line.starts_with(fmt.metadata_prefix.as_slice()) {
        td.rows.meta += 1;
        return;
    }

    let row_ordinal = td.rows.next_ordinal();
    let column_count = fmt.column_count;
    let columns = &mut td.columns;
    let mut field_count = 0usize;
    let split_result = fmt.splitter.split(line, &mut |field_bytes| {
        if field_count < columns.len() {
            let field_str = String::from_utf8_lossy(field_bytes);
            columns[field_count].observe(&field_str, row_ordinal, tunables);
        }
        field_count += 1;
    });

    match split_result {
        Ok(n) if n != column_count => td.rows.aberrant += 1,
        Ok(_) => {}
        // An unterminated quoted field is a hard parse error for the CSV
        // splitter; content never aborts analysis, so it's just tallied.
        Err(_) => td.rows.aberrant += 1,
    }
    td.rows.data += 1;
}

struct Scanner {
    td: TableDescription,
    phase: Phase,
    final_separator: Option<u8>,
    partitioner: PrefixPartitioner,
    sample_cache: SampleCache,
    metadata_prefix: Vec<u8>,
    header_budget: u32,
    sample_budget: u32,
    current_line: Vec<u8>,
}

impl Scanner {
    fn new() -> Self {
        Scanner {
            td: TableDescription::new(),
            phase: Phase::InferLineTerminator,
            final_separator: None,
            partitioner: PrefixPartitioner::new(2),
            sample_cache: SampleCache::new(),
            metadata_prefix: Vec::new(),
            header_budget: 0,
            sample_budget: 0,
            current_line: Vec::new(),
        }
    }

    /// Attempt format inference over everything cached so far. On success,
    /// allocates columns, replays every cached line, and switches to
    /// `AnalyzeContent`; on failure, gives up for good (`NoTable`).
    fn resolve_format_or_give_up(&mut self, tunables: &Tunables) {
        let separator = self.final_separator.unwrap_or(b'\n');
        let lines: Vec<Vec<u8>> = self.sample_cache.lines(separator).map(|l| l.to_vec()).collect();
        let fmt = infer_format(lines.iter().map(|l| l.as_slice()), &self.metadata_prefix);

        match fmt {
            Some(fmt) => {
                self.td.columns = (0..fmt.column_count).map(|_| crate::column::ColumnAccumulator::new(tunables)).collect();
                self.td.format = Some(fmt);
                for line in &lines {
                    analyze_line(&mut self.td, line, tunables);
                }
                self.sample_cache = SampleCache::new();
                self.phase = Phase::AnalyzeContent;
            }
            None => {
                self.td.status = Status::NoTable;
                self.sample_cache = SampleCache::new();
                self.phase = Phase::CharactersOnly;
            }
        }
    }

    fn handle_char(&mut self, bytes: &[u8], byte0: u8, prev_coarse: Option<CoarseClass>, coarse: CoarseClass, tunables: &Tunables) {
        match self.phase {
            Phase::InferLineTerminator => {
                self.sample_cache.push(bytes);

                if let Some(prev) = prev_coarse {
                    if is_terminator_class(prev) {
                        if is_terminator_class(coarse) {
                            let sep = if prev == coarse {
                                terminator_byte(prev)
                            } else {
                                terminator_byte(coarse)
                            };
                            self.final_separator = Some(sep);
                        } else {
                            self.final_separator = Some(terminator_byte(prev));
                        }
                        self.partitioner.flush();
                        self.phase = Phase::DiscardHeader;
                        self.header_budget = MAX_HEADER_LINES - 1;
                    }
                }

                if !is_terminator_class(coarse) {
                    self.partitioner.push_bytes(bytes);
                }
            }
            Phase::DiscardHeader => {
                self.sample_cache.push(bytes);
                if !is_terminator_class(coarse) {
                    self.partitioner.push_bytes(bytes);
                }
                if Some(byte0) == self.final_separator {
                    self.header_budget = self.header_budget.saturating_sub(1);
                    match self.partitioner.flush() {
                        GroupEvent::Completion => {
                            if let Some(g) = self.partitioner.first_completed_group() {
                                if let Some(prefix) = admissible_metadata_prefix(&g.prefix) {
                                    self.metadata_prefix = prefix;
                                }
                            }
                            self.phase = Phase::AcquireSample;
                            self.sample_budget = MAX_SAMPLE_LINES - 1;
                        }
                        GroupEvent::Incomplete => {
                            if self.header_budget == 0 {
                                self.resolve_format_or_give_up(tunables);
                            }
                        }
                    }
                }
            }
            Phase::AcquireSample => {
                self.sample_cache.push(bytes);
                if Some(byte0) == self.final_separator {
                    self.sample_budget = self.sample_budget.saturating_sub(1);
                    if self.sample_budget == 0 {
                        self.resolve_format_or_give_up(tunables);
                    }
                }
            }
            Phase::AnalyzeContent => {
                self.current_line.extend_from_slice(bytes);
                if Some(byte0) == self.final_separator {
                    let line = std::mem::take(&mut self.current_line);
                    analyze_line(&mut self.td, &line, tunables);
                }
            }
            Phase::CharactersOnly => {}
        }
    }

    fn finish(mut self, tunables: &Tunables) -> TableDescription {
        match self.phase {
            Phase::InferLineTerminator | Phase::DiscardHeader | Phase::AcquireSample => {
                self.resolve_format_or_give_up(tunables);
            }
            Phase::AnalyzeContent | Phase::CharactersOnly => {}
        }
        if self.td.status.is_success() {
            for column in &mut self.td.columns {
                column.finalize(tunables);
            }
        }
        self.td
    }
}

impl PrefixPartitioner {
    /// Push a full (possibly multi-byte) character's worth of bytes.
    fn push_bytes(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.push(b);
        }
    }
}

/// Run the analyzer over `reader` to completion, using tunables read from
/// the process environment.
pub fn scan(reader: impl Read) -> TableDescription {
    scan_with_tunables(reader, &Tunables::from_env())
}

/// Run the analyzer over `reader` to completion with an explicit set of
/// tunables (primarily for tests, to avoid coupling to process env state).
pub fn scan_with_tunables(reader: impl Read, tunables: &Tunables) -> TableDescription {
    let mut utf8 = Utf8Reader::new(reader);
    let mut scanner = Scanner::new();

    loop {
        let decoded = match utf8.next_char() {
            Ok(inner) => inner,
            Err(io_err) => {
                tracing::warn!(error = %io_err, "scan aborted on I/O error");
                scanner.td.status = Status::FileIo;
                return scanner.td;
            }
        };

        match decoded {
            Ok(None) => break,
            Err((fault, ordinal)) => {
                scanner.td.status = match fault {
                    Utf8Fault::Prefix => Status::Utf8Prefix,
                    Utf8Fault::Suffix => Status::Utf8Suffix,
                };
                scanner.td.ordinal = ordinal;
                return scanner.td;
            }
            Ok(Some(character)) => {
                let prev_coarse = scanner.td.class_accounting.prev_coarse();
                let coarse = scanner.td.class_accounting.observe(character.class);
                scanner.handle_char(character.as_bytes(), character.byte(), prev_coarse, coarse, tunables);
            }
        }
    }

    scanner.finish(tunables)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn run(input: &[u8]) -> TableDescription {
        scan_with_tunables(Cursor::new(input), &Tunables::default())
    }

    #[test]
    fn simple_csv_without_header_is_detected_as_a_table() {
        let d = run(b"a,b,c\n1,2,3\n4,5,6\n");
        assert_eq!(d.status(), Status::Complete);
        let fmt = d.format().unwrap();
        assert_eq!(fmt.column_separator, b",");
        assert_eq!(fmt.column_count, 3);
        assert_eq!(d.rows().data, 3);
        assert_eq!(d.rows().aberrant, 0);
    }

    #[test]
    fn metadata_prefixed_header_lines_are_skipped() {
        let d = run(b"# header\n# notes\nx\ty\n1\t2\n3\t4\n");
        assert_eq!(d.status(), Status::Complete);
        let fmt = d.format().unwrap();
        assert_eq!(fmt.metadata_prefix, b"#");
        assert_eq!(fmt.column_separator, b"\t");
        assert_eq!(d.rows().meta, 2);
        assert_eq!(d.rows().data, 3);
    }

    #[test]
    fn whitespace_separated_columns() {
        let d = run(b"a b c\n1 2 3\n4 5 6\n");
        assert_eq!(d.status(), Status::Complete);
        let fmt = d.format().unwrap();
        assert_eq!(fmt.column_separator, b" +");
        assert!(fmt.separator_is_regex);
        assert_eq!(fmt.column_count, 3);
    }

    #[test]
    fn invalid_utf8_reports_prefix_fault_with_ordinal() {
        let d = run(b"ab\xFEcd\n");
        assert_eq!(d.status(), Status::Utf8Prefix);
        assert_eq!(d.ordinal(), 3);
    }

    #[test]
    fn single_column_data_has_no_stable_separator_and_yields_no_table() {
        // A genuine single-column file has no byte that recurs with an
        // identical nonzero count on every sampled line, so the separator
        // histogram never stabilizes on a candidate and inference gives
        // up -- the histograms are still populated even though no table
        // is recognized.
        let d = run(b"v\n1\nNA\n2\n3\n");
        assert_eq!(d.status(), Status::NoTable);
        assert!(d.format().is_none());
        assert!(d.char_class_counts().total() > 0);
    }

    #[test]
    fn trailing_separator_single_value_column_is_detected() {
        let d = run(b"v,\n1,\nNA,\n2,\n3,\n");
        assert_eq!(d.status(), Status::Complete);
        let fmt = d.format().unwrap();
        assert_eq!(fmt.column_separator, b",");
        assert_eq!(fmt.column_count, 2);
    }

    #[test]
    fn no_consistent_table_structure_yields_no_table_but_keeps_histograms() {
        let d = run(b"alpha\nbeta,gamma\ndelta;epsilon;zeta\n");
        assert_eq!(d.status(), Status::NoTable);
        assert!(d.format().is_none());
        assert!(d.char_class_counts().total() > 0);
    }
}
