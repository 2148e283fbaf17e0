//! Byte-by-byte UTF-8 decoder used by the scan loop.
//!
//! This is deliberately not a bulk whole-buffer validator: the scan needs
//! the exact 1-based byte ordinal of the first offending byte, and needs
//! to hand exactly one decoded character at a time to the phase
//! dispatcher, cooperating with a pull-based reader.

use std::io::Read;

use crate::charclass::FineClass;
use crate::error::TabularError;

/// One decoded logical character: its class and the raw bytes that
/// encoded it (1-4 bytes).
#[derive(Debug, Clone)]
pub struct Character {
    pub class: FineClass,
    pub bytes: [u8; 4],
    pub len: u8,
}

impl Character {
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// The single byte value when this character is ASCII (LF, CR, or any
    /// other one-byte character); used by line-terminator and prefix
    /// logic that only cares about single bytes.
    pub fn byte(&self) -> u8 {
        self.bytes[0]
    }
}

/// Outcome of decoding failure, distinguishing a bad lead byte from a bad
/// continuation byte, per the reference `utf8_suffix_len` /
/// `utf8_consume_suffix` contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Utf8Fault {
    /// The byte could not begin a valid UTF-8 sequence.
    Prefix,
    /// A continuation byte did not have the `10xxxxxx` form.
    Suffix,
}

/// How many continuation bytes follow a lead byte, or `None` if the byte
/// is not a valid UTF-8 lead byte (including stray continuation bytes).
fn suffix_len(first_byte: u8) -> Option<u8> {
    if first_byte & 0x80 == 0 {
        Some(0)
    } else if first_byte & 0xE0 == 0xC0 {
        Some(1)
    } else if first_byte & 0xF0 == 0xE0 {
        Some(2)
    } else if first_byte & 0xF8 == 0xF0 {
        Some(3)
    } else {
        None
    }
}

fn fine_class(first_byte: u8, suffix: u8) -> FineClass {
    match first_byte {
        0x0A => FineClass::Lf,
        0x0D => FineClass::Cr,
        _ if suffix == 0 => FineClass::Ascii,
        _ if suffix == 1 => FineClass::Utf8_2,
        _ if suffix == 2 => FineClass::Utf8_3,
        _ => FineClass::Utf8_4,
    }
}

/// Pull-based UTF-8 decoder over an arbitrary byte source.
///
/// Tracks the 1-based ordinal of the next byte to be read so that a
/// decoding fault can be reported with the position of its first
/// offending byte.
pub struct Utf8Reader<R> {
    inner: R,
    next_ordinal: u64,
}

impl<R: Read> Utf8Reader<R> {
    pub fn new(inner: R) -> Self {
        Utf8Reader {
            inner,
            next_ordinal: 1,
        }
    }

    /// Ordinal (1-based) of the next byte this reader will consume.
    pub fn ordinal(&self) -> u64 {
        self.next_ordinal
    }

    fn read_byte(&mut self) -> Result<Option<u8>, TabularError> {
        let mut buf = [0u8; 1];
        loop {
            return match self.inner.read(&mut buf) {
                Ok(0) => Ok(None),
                Ok(_) => {
                    self.next_ordinal += 1;
                    Ok(Some(buf[0]))
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => Err(TabularError::Io(e)),
            };
        }
    }

    /// Decode the next logical character.
    ///
    /// Returns `Ok(None)` at end of stream, `Ok(Some(_))` on success, and
    /// `Err((fault, ordinal))` with the 1-based ordinal of the offending
    /// byte on a UTF-8 violation. IO errors propagate as
    /// `TabularError::Io` via the outer `Result`.
    pub fn next_char(
        &mut self,
    ) -> Result<Result<Option<Character>, (Utf8Fault, u64)>, TabularError> {
        let lead_ordinal = self.next_ordinal;
        let first = match self.read_byte()? {
            None => return Ok(Ok(None)),
            Some(b) => b,
        };

        let suffix = match suffix_len(first) {
            Some(n) => n,
            None => return Ok(Err((Utf8Fault::Prefix, lead_ordinal))),
        };

        let mut bytes = [0u8; 4];
        bytes[0] = first;
        for i in 0..suffix as usize {
            let b = match self.read_byte()? {
                None => return Ok(Err((Utf8Fault::Suffix, lead_ordinal))),
                Some(b) => b,
            };
            if b & 0xC0 != 0x80 {
                return Ok(Err((Utf8Fault::Suffix, lead_ordinal)));
            }
            bytes[i + 1] = b;
        }

        Ok(Ok(Some(Character {
            class: fine_class(first, suffix),
            bytes,
            len: suffix + 1,
        })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn decode_all(data: &[u8]) -> Result<Vec<FineClass>, (Utf8Fault, u64)> {
        let mut reader = Utf8Reader::new(Cursor::new(data));
        let mut out = Vec::new();
        loop {
            match reader.next_char().unwrap() {
                Ok(None) => return Ok(out),
                Ok(Some(c)) => out.push(c.class),
                Err(fault) => return Err(fault),
            }
        }
    }

    #[test]
    fn ascii_decodes_as_ascii() {
        let classes = decode_all(b"abc").unwrap();
        assert_eq!(classes.len(), 3);
        assert!(classes.iter().all(|c| matches!(c, FineClass::Ascii)));
    }

    #[test]
    fn lf_and_cr_are_distinguished() {
        let classes = decode_all(b"a\nb\r").unwrap();
        assert!(matches!(classes[1], FineClass::Lf));
        assert!(matches!(classes[3], FineClass::Cr));
    }

    #[test]
    fn multibyte_sequences_classify_by_length() {
        // 2-byte: U+00E9 (é) = 0xC3 0xA9
        // 3-byte: U+20AC (€) = 0xE2 0x82 0xAC
        // 4-byte: U+1F600 (😀) = 0xF0 0x9F 0x98 0x80
        let mut data = Vec::new();
        data.extend_from_slice(&[0xC3, 0xA9]);
        data.extend_from_slice(&[0xE2, 0x82, 0xAC]);
        data.extend_from_slice(&[0xF0, 0x9F, 0x98, 0x80]);
        let classes = decode_all(&data).unwrap();
        assert_eq!(classes.len(), 3);
        assert!(matches!(classes[0], FineClass::Utf8_2));
        assert!(matches!(classes[1], FineClass::Utf8_3));
        assert!(matches!(classes[2], FineClass::Utf8_4));
    }

    #[test]
    fn invalid_lead_byte_reports_prefix_fault_at_ordinal() {
        let err = decode_all(b"ab\xFEcd").unwrap_err();
        assert_eq!(err, (Utf8Fault::Prefix, 3));
    }

    #[test]
    fn bad_continuation_byte_reports_suffix_fault_at_lead_ordinal() {
        // 0xC3 expects one continuation byte; 'a' is not 10xxxxxx.
        let err = decode_all(b"x\xC3a").unwrap_err();
        assert_eq!(err, (Utf8Fault::Suffix, 2));
    }

    #[test]
    fn truncated_multibyte_sequence_at_eof_is_a_suffix_fault() {
        let err = decode_all(&[b'x', 0xE2, 0x82]).unwrap_err();
        assert_eq!(err, (Utf8Fault::Suffix, 2));
    }
}
