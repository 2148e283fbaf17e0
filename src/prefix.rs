//! Prefix Partitioner: groups contiguous lines sharing a non-empty leading
//! byte sequence, tolerating embedded empty lines.
//!
//! A "group" is zero or more empty lines followed by one or more lines
//! sharing a common non-empty prefix. Completion of a group (a line whose
//! leading bytes share nothing with the current group's prefix) is the
//! signal the header-discard phase uses to find the end of a header run.

use crate::tunables::MAXLEN_STRING;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupEvent {
    Incomplete,
    Completion,
}

#[derive(Debug, Clone, Default)]
pub struct PrefixGroup {
    /// Count of empty lines preceding the first non-empty line of this
    /// group.
    pub empty: u32,
    /// Ordinal of the first line belonging to this group.
    pub snum: u32,
    /// Count of non-empty lines in this group.
    pub count: u32,
    /// The group's common prefix (may shrink, never grows, as new lines
    /// are folded in).
    pub prefix: Vec<u8>,
}

fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b.iter()).take_while(|(x, y)| x == y).count()
}

/// Accumulates one line's leading bytes (bounded to `MAXLEN_STRING`) and
/// folds completed lines into the group sequence.
pub struct PrefixPartitioner {
    max_groups: usize,
    completed: Vec<PrefixGroup>,
    open: PrefixGroup,
    line_buf: Vec<u8>,
    next_snum: u32,
}

impl PrefixPartitioner {
    pub fn new(max_groups: usize) -> Self {
        PrefixPartitioner {
            max_groups,
            completed: Vec::with_capacity(max_groups),
            open: PrefixGroup::default(),
            line_buf: Vec::with_capacity(MAXLEN_STRING),
            next_snum: 0,
        }
    }

    /// Append bytes to the current line's leading accumulator; bytes past
    /// `MAXLEN_STRING` are silently dropped.
    pub fn push(&mut self, byte: u8) {
        if self.line_buf.len() < MAXLEN_STRING {
            self.line_buf.push(byte);
        }
    }

    /// Commit the accumulated line and fold it into the group sequence.
    pub fn flush(&mut self) -> GroupEvent {
        let line = std::mem::take(&mut self.line_buf);
        let snum = self.next_snum;
        self.next_snum += 1;
        self.analyze(&line, snum)
    }

    fn analyze(&mut self, line: &[u8], snum: u32) -> GroupEvent {
        if !line.is_empty() {
            let cur_len = self.open.prefix.len();
            if cur_len > 0 {
                let new_len = common_prefix_len(&self.open.prefix, line);
                if new_len > 0 {
                    if new_len < cur_len {
                        self.open.prefix.truncate(new_len);
                    }
                    self.open.count += 1;
                    return GroupEvent::Incomplete;
                }
                self.commit_open();
                self.open = PrefixGroup {
                    snum,
                    prefix: line.to_vec(),
                    count: 1,
                    empty: 0,
                };
                return GroupEvent::Completion;
            }
            self.open.snum = snum;
            self.open.prefix = line.to_vec();
            self.open.count = 1;
            GroupEvent::Incomplete
        } else {
            // An empty line never closes a group on its own: it is
            // attributed to whichever group is currently open, leaving
            // that group's prefix untouched.
            self.open.empty += 1;
            GroupEvent::Incomplete
        }
    }

    fn commit_open(&mut self) {
        if self.completed.len() < self.max_groups {
            self.completed.push(std::mem::take(&mut self.open));
        }
    }

    /// The first completed group, if any — what `DiscardHeader` consults
    /// to decide whether a metadata-line prefix was found.
    pub fn first_completed_group(&self) -> Option<&PrefixGroup> {
        self.completed.first()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(lines: &[&[u8]]) -> (Vec<GroupEvent>, PrefixPartitioner) {
        let mut p = PrefixPartitioner::new(2);
        let mut events = Vec::new();
        for line in lines {
            for &b in *line {
                p.push(b);
            }
            events.push(p.flush());
        }
        (events, p)
    }

    #[test]
    fn comment_header_then_data_completes_first_group() {
        let (events, p) = run(&[b"#comment one", b"#comment two", b"a,b,c", b"1,2,3"]);
        assert_eq!(events[2], GroupEvent::Completion);
        let g = p.first_completed_group().unwrap();
        assert_eq!(g.prefix, b"#comment ");
        assert_eq!(g.count, 2);
    }

    #[test]
    fn embedded_empty_lines_stay_in_the_same_group() {
        let (events, p) = run(&[b"#one", b"", b"#two", b"data"]);
        assert_eq!(events[0], GroupEvent::Incomplete);
        assert_eq!(events[1], GroupEvent::Incomplete);
        assert_eq!(events[2], GroupEvent::Incomplete);
        assert_eq!(events[3], GroupEvent::Completion);
        let g = p.first_completed_group().unwrap();
        assert_eq!(g.prefix, b"#");
        assert_eq!(g.empty, 1);
        assert_eq!(g.count, 2);
    }

    #[test]
    fn no_shared_prefix_between_first_two_lines_completes_immediately() {
        let (events, p) = run(&[b"a,b,c", b"1,2,3"]);
        assert_eq!(events[1], GroupEvent::Completion);
        assert_eq!(p.first_completed_group().unwrap().prefix, b"a,b,c");
    }
}
