//! Field splitters. A [`Splitter`] turns one already terminator-stripped
//! line into a sequence of field byte-slices delivered to a callback.

use crate::error::TabularError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Splitter {
    /// Fields are maximal spans not containing `sep`; produces exactly
    /// `count(sep) + 1` fields.
    SingleByte(u8),
    /// Maximal non-whitespace spans; runs of whitespace collapse to a
    /// single separator.
    CoalesceWhitespace,
    /// RFC4180, tolerant of an unquoted field and `""` as an escaped
    /// quote; an unterminated quoted field is a hard error.
    Csv,
}

impl Splitter {
    /// Split `line` into fields, invoking `sink` once per field in order.
    /// Returns the field count.
    pub fn split(
        &self,
        line: &[u8],
        sink: &mut dyn FnMut(&[u8]),
    ) -> Result<usize, TabularError> {
        match self {
            Splitter::SingleByte(sep) => {
                let mut count = 0;
                for field in line.split(|b| b == sep) {
                    sink(field);
                    count += 1;
                }
                Ok(count)
            }
            Splitter::CoalesceWhitespace => {
                let mut count = 0;
                for field in line.split(|b| b.is_ascii_whitespace()) {
                    if field.is_empty() {
                        continue;
                    }
                    sink(field);
                    count += 1;
                }
                Ok(count)
            }
            Splitter::Csv => split_csv(line, sink),
        }
    }
}

/// RFC4180-ish state machine over a single line, grounded in the
/// reference `csv.c` state machine (`Entry` / `InQuotedField` /
/// `InBareField` / `PossibleExit`). Operates on one physical line at a
/// time since line assembly (and thus line-terminator handling) already
/// happened upstream in the scan loop.
fn split_csv(line: &[u8], sink: &mut dyn FnMut(&[u8])) -> Result<usize, TabularError> {
    #[derive(PartialEq)]
    enum State {
        Entry,
        InQuotedField,
        InBareField,
        PossibleExit,
    }

    const QUOTE: u8 = b'"';
    const COMMA: u8 = b',';

    let mut state = State::Entry;
    let mut field: Vec<u8> = Vec::new();
    let mut count = 0usize;
    let mut flush = |field: &mut Vec<u8>, sink: &mut dyn FnMut(&[u8]), count: &mut usize| {
        sink(field);
        field.clear();
        *count += 1;
    };

    for (i, &c) in line.iter().enumerate() {
        match state {
            State::Entry => {
                if c == QUOTE {
                    state = State::InQuotedField;
                } else if c == COMMA {
                    flush(&mut field, sink, &mut count);
                } else {
                    field.push(c);
                    state = State::InBareField;
                }
            }
            State::InQuotedField => {
                if c == QUOTE {
                    state = State::PossibleExit;
                } else {
                    field.push(c);
                }
            }
            State::InBareField => {
                if c == COMMA {
                    flush(&mut field, sink, &mut count);
                    state = State::Entry;
                } else {
                    field.push(c);
                }
            }
            State::PossibleExit => {
                if c == QUOTE {
                    field.push(QUOTE);
                    state = State::InQuotedField;
                } else if c == COMMA {
                    flush(&mut field, sink, &mut count);
                    state = State::Entry;
                } else {
                    return Err(TabularError::UnterminatedQuotedField(i as u64));
                }
            }
        }
    }

    match state {
        State::InQuotedField => {
            return Err(TabularError::UnterminatedQuotedField(line.len() as u64));
        }
        _ => {
            // Covers Entry (including a genuinely empty line, which still
            // yields one empty field), InBareField, and PossibleExit.
            flush(&mut field, sink, &mut count);
        }
    }

    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(splitter: &Splitter, line: &[u8]) -> Result<Vec<Vec<u8>>, TabularError> {
        let mut out = Vec::new();
        splitter.split(line, &mut |f| out.push(f.to_vec()))?;
        Ok(out)
    }

    #[test]
    fn single_byte_splits_on_separator() {
        let f = fields(&Splitter::SingleByte(b','), b"a,b,,c").unwrap();
        assert_eq!(f, vec![b"a".to_vec(), b"b".to_vec(), b"".to_vec(), b"c".to_vec()]);
    }

    #[test]
    fn coalesce_whitespace_collapses_runs() {
        let f = fields(&Splitter::CoalesceWhitespace, b"  1   2  3").unwrap();
        assert_eq!(f, vec![b"1".to_vec(), b"2".to_vec(), b"3".to_vec()]);
    }

    #[test]
    fn csv_handles_quoted_commas_and_escaped_quotes() {
        let line: &[u8] = b"a,\"b,c\",\"he said \"\"hi\"\"\"";
        let f = fields(&Splitter::Csv, line).unwrap();
        assert_eq!(
            f,
            vec![b"a".to_vec(), b"b,c".to_vec(), b"he said \"hi\"".to_vec()]
        );
    }

    #[test]
    fn csv_unterminated_quote_is_an_error() {
        let line: &[u8] = b"a,\"unterminated";
        let result = fields(&Splitter::Csv, line);
        assert!(matches!(result, Err(TabularError::UnterminatedQuotedField(_))));
    }
}
