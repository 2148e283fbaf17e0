//! Format inference: derive the column separator and column count from a
//! sample of cached lines by histogramming candidate separators and
//! requiring identical per-line counts.

use crate::splitter::Splitter;

/// Virtual histogram slot counting `/ +/` occurrences (space-to-non-space
/// transitions), one past the 128 ASCII byte slots.
const P_SPC_GROUP: usize = 128;
const SEPARATOR_SLOTS: usize = 129;

/// Format of the table body, as resolved by format inference.
#[derive(Debug, Clone)]
pub struct FormatDescriptor {
    pub metadata_prefix: Vec<u8>,
    pub column_separator: Vec<u8>,
    pub separator_is_regex: bool,
    pub column_count: usize,
    pub data_lines_sampled: u32,
    pub splitter: Splitter,
}

fn is_admissible_separator(c: usize) -> bool {
    if c < 128 {
        !(c as u8).is_ascii_alphanumeric()
    } else {
        true
    }
}

pub(crate) fn rstrip_terminators(line: &[u8]) -> &[u8] {
    let mut end = line.len();
    while end > 0 && (line[end - 1] == b'\r' || line[end - 1] == b'\n') {
        end -= 1;
    }
    &line[..end]
}

fn count_candidate_separators(line: &[u8]) -> [u32; SEPARATOR_SLOTS] {
    let mut counts = [0u32; SEPARATOR_SLOTS];
    let mut last: Option<u8> = None;
    for &c in line {
        counts[(c & 0x7F) as usize] += 1;
        if last == Some(b' ') && c != b' ' {
            counts[P_SPC_GROUP] += 1;
        }
        last = Some(c);
    }
    if last == Some(b' ') {
        counts[P_SPC_GROUP] += 1;
    }
    counts
}

/// Run format inference over a sample of cached lines. `lines` should
/// yield each cached line still carrying its trailing terminator bytes
/// (they are stripped here, matching the reference's `rstrip`); lines
/// matching `metadata_prefix` are skipped, as are empty lines.
pub fn infer_format<'a>(
    lines: impl Iterator<Item = &'a [u8]>,
    metadata_prefix: &[u8],
) -> Option<FormatDescriptor> {
    let mut reference: Option<[u32; SEPARATOR_SLOTS]> = None;
    let mut candidate_count = 0usize;
    let mut data_lines_sampled = 0u32;
    let mut last_line: Vec<u8> = Vec::new();

    for raw_line in lines {
        if !metadata_prefix.is_empty() && raw_line.starts_with(metadata_prefix) {
            continue;
        }
        let line = rstrip_terminators(raw_line);
        if line.is_empty() {
            continue;
        }

        data_lines_sampled += 1;
        last_line = line.to_vec();
        let counts = count_candidate_separators(line);

        match &mut reference {
            None => {
                reference = Some(counts);
                // Not a real count; just a nonzero placeholder so the
                // reference established on this first line is used as-is
                // should sampling end here.
                candidate_count = SEPARATOR_SLOTS;
            }
            Some(reference_arr) => {
                candidate_count = 0;
                for i in 0..SEPARATOR_SLOTS {
                    if reference_arr[i] > 0 {
                        if counts[i] == reference_arr[i] {
                            candidate_count += 1;
                        } else {
                            reference_arr[i] = 0;
                        }
                    }
                }
                if candidate_count < 2 {
                    break;
                }
            }
        }
    }

    let reference = reference?;
    resolve(reference, candidate_count, &last_line, data_lines_sampled, metadata_prefix)
}

fn resolve(
    reference: [u32; SEPARATOR_SLOTS],
    candidate_count: usize,
    last_line: &[u8],
    data_lines_sampled: u32,
    metadata_prefix: &[u8],
) -> Option<FormatDescriptor> {
    if candidate_count == 1 {
        let c = (0..SEPARATOR_SLOTS).rev().find(|&i| reference[i] > 0)?;
        if c == 0 || !is_admissible_separator(c) {
            return None;
        }
        let sep = c as u8;
        return Some(FormatDescriptor {
            metadata_prefix: metadata_prefix.to_vec(),
            column_separator: vec![sep],
            separator_is_regex: false,
            column_count: reference[c] as usize + 1,
            data_lines_sampled,
            splitter: Splitter::SingleByte(sep),
        });
    }

    if candidate_count > 1 {
        if reference[P_SPC_GROUP] > 0 {
            return Some(FormatDescriptor {
                metadata_prefix: metadata_prefix.to_vec(),
                column_separator: b" +".to_vec(),
                separator_is_regex: true,
                column_count: reference[P_SPC_GROUP] as usize + 1,
                data_lines_sampled,
                splitter: Splitter::CoalesceWhitespace,
            });
        }
        if reference[b'\t' as usize] > 0 {
            return Some(FormatDescriptor {
                metadata_prefix: metadata_prefix.to_vec(),
                column_separator: vec![b'\t'],
                separator_is_regex: false,
                column_count: reference[b'\t' as usize] as usize + 1,
                data_lines_sampled,
                splitter: Splitter::SingleByte(b'\t'),
            });
        }

        let candidates: Vec<u8> = (0..127)
            .filter(|&c| is_admissible_separator(c) && reference[c] > 0)
            .map(|c| c as u8)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let sep = *last_line.iter().find(|b| candidates.contains(b))?;
        return Some(FormatDescriptor {
            metadata_prefix: metadata_prefix.to_vec(),
            column_separator: vec![sep],
            separator_is_regex: false,
            column_count: reference[sep as usize] as usize + 1,
            data_lines_sampled,
            splitter: Splitter::SingleByte(sep),
        });
    }

    None
}
