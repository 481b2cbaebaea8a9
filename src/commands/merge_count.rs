//! K-way merge with distinct counting.
//!
//! Opens every spill segment for sequential reading and merges them
//! with a min-heap keyed by (address, segment index). Because each
//! segment is internally sorted and the heap always yields the global
//! minimum among the current segment heads, the popped sequence is
//! globally non-decreasing; collapsing adjacent duplicates therefore
//! counts each distinct canonical address exactly once, no matter how
//! many segments it is spread across.
//!
//! Memory is O(k) where k = number of segments: one buffered reader
//! and one heap entry per segment, held for the full merge.

use crate::canon::Result;
use crate::spill::Segment;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::fs::File;
use std::io::{BufRead, BufReader, Write};

/// Wrapper for min-heap ordering (BinaryHeap is max-heap by default).
/// The segment index is a deterministic tie-break between equal heads;
/// it does not affect the distinct count.
#[derive(Debug, Eq, PartialEq)]
struct HeapEntry {
    address: String,
    segment_idx: usize,
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .address
            .cmp(&self.address)
            .then(other.segment_idx.cmp(&self.segment_idx))
    }
}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Sequential reader over one segment.
struct SegmentReader {
    reader: BufReader<File>,
    line_buf: String,
    exhausted: bool,
}

impl SegmentReader {
    fn new(reader: BufReader<File>) -> Self {
        Self {
            reader,
            line_buf: String::with_capacity(64),
            exhausted: false,
        }
    }

    /// Read the next address from this segment.
    fn next_address(&mut self) -> Result<Option<String>> {
        if self.exhausted {
            return Ok(None);
        }
        loop {
            self.line_buf.clear();
            let bytes_read = self.reader.read_line(&mut self.line_buf)?;
            if bytes_read == 0 {
                self.exhausted = true;
                return Ok(None);
            }
            let address = self.line_buf.trim_end();
            if address.is_empty() {
                continue;
            }
            return Ok(Some(address.to_string()));
        }
    }
}

/// Merge-and-count command.
#[derive(Debug, Clone, Default)]
pub struct MergeCountCommand;

impl MergeCountCommand {
    pub fn new() -> Self {
        Self
    }

    /// Merge all segments and count distinct canonical addresses.
    ///
    /// Writes the final count as a decimal string to `output` (a
    /// single write, not newline-terminated) and returns it. An empty
    /// segment list yields 0 and leaves the sink untouched. Any I/O
    /// failure aborts the whole merge; no partial count is emitted.
    pub fn run<W: Write>(&self, segments: &[Segment], output: &mut W) -> Result<u64> {
        if segments.is_empty() {
            return Ok(0);
        }

        // One open read handle per segment for the full merge; all of
        // them close when this function returns, on any exit path.
        let mut readers = Vec::with_capacity(segments.len());
        for segment in segments {
            readers.push(SegmentReader::new(segment.reader()?));
        }

        let mut heap: BinaryHeap<HeapEntry> = BinaryHeap::with_capacity(readers.len());
        for (segment_idx, reader) in readers.iter_mut().enumerate() {
            if let Some(address) = reader.next_address()? {
                heap.push(HeapEntry {
                    address,
                    segment_idx,
                });
            }
        }

        let mut distinct: u64 = 0;
        let mut last_seen: Option<String> = None;

        while let Some(entry) = heap.pop() {
            if let Some(next) = readers[entry.segment_idx].next_address()? {
                heap.push(HeapEntry {
                    address: next,
                    segment_idx: entry.segment_idx,
                });
            }

            if last_seen.as_deref() != Some(entry.address.as_str()) {
                distinct += 1;
                last_seen = Some(entry.address);
            }
        }

        let mut itoa_buf = itoa::Buffer::new();
        output.write_all(itoa_buf.format(distinct).as_bytes())?;

        Ok(distinct)
    }
}
