//! Bounded-memory chunked sorting.
//!
//! Streams the input line by line, canonicalizes each address, and
//! buffers up to `capacity` canonical addresses. Each full buffer is
//! sorted and flushed to the spill store as one sorted segment; the
//! final undersized buffer is flushed after input exhaustion. Peak
//! working set is O(capacity) addresses, independent of input size.

use crate::canon::{canonicalize, is_well_formed, CountError, Result};
use crate::spill::{Segment, SpillStore};
use std::io::{BufRead, Write};

/// Default number of addresses buffered per chunk.
pub const DEFAULT_CHUNK_CAPACITY: usize = 10_000_000;

/// Buffer pre-allocation cap, so tiny inputs with a huge capacity
/// setting do not reserve gigabytes up front.
const BUFFER_RESERVE_LIMIT: usize = 64 * 1024;

/// Statistics from a chunk-sort pass.
#[derive(Debug, Default, Clone)]
pub struct ChunkSortStats {
    pub addresses_read: usize,
    pub segments_written: usize,
}

impl std::fmt::Display for ChunkSortStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Addresses: {}, Segments: {}",
            self.addresses_read, self.segments_written
        )
    }
}

/// Chunk-sort command configuration.
#[derive(Debug, Clone)]
pub struct ChunkSortCommand {
    /// Addresses buffered in memory before a segment is flushed.
    pub capacity: usize,
    /// Reject structurally malformed address literals instead of
    /// canonicalizing them best-effort.
    pub strict: bool,
}

impl Default for ChunkSortCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSortCommand {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CHUNK_CAPACITY,
            strict: false,
        }
    }

    /// Set the chunk capacity (builder pattern). Clamped to at least 1.
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set strict mode (builder pattern).
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Stream `reader`, producing sorted segments in `store`.
    ///
    /// Segment handles are pushed into the caller-owned `segments`
    /// collection as they are created, so the caller can release every
    /// segment unconditionally even when this returns an error midway.
    /// Zero non-blank input lines produce zero segments.
    pub fn run<R: BufRead>(
        &self,
        mut reader: R,
        store: &mut SpillStore,
        segments: &mut Vec<Segment>,
    ) -> Result<ChunkSortStats> {
        let mut stats = ChunkSortStats::default();
        let mut buffer: Vec<String> = Vec::with_capacity(self.capacity.min(BUFFER_RESERVE_LIMIT));
        let mut line = String::with_capacity(64);
        let mut line_number = 0;

        loop {
            line.clear();
            if reader.read_line(&mut line)? == 0 {
                break;
            }
            line_number += 1;

            let address = line.trim();
            if address.is_empty() {
                continue;
            }
            if self.strict && !is_well_formed(address) {
                return Err(CountError::MalformedAddress {
                    line: line_number,
                    address: address.to_string(),
                });
            }

            buffer.push(canonicalize(address));
            stats.addresses_read += 1;

            if buffer.len() >= self.capacity {
                flush_segment(&mut buffer, store, segments)?;
                stats.segments_written += 1;
            }
        }

        if !buffer.is_empty() {
            flush_segment(&mut buffer, store, segments)?;
            stats.segments_written += 1;
        }

        Ok(stats)
    }
}

/// Sort the buffer, write it as one newline-delimited segment and
/// record the handle before clearing the buffer.
fn flush_segment(
    buffer: &mut Vec<String>,
    store: &mut SpillStore,
    segments: &mut Vec<Segment>,
) -> Result<()> {
    buffer.sort_unstable();

    let segment = store.create()?;
    // Record the handle before any write so a failed flush still gets
    // released by the caller.
    segments.push(segment.clone());

    let mut writer = segment.writer()?;
    for address in buffer.iter() {
        writer.write_all(address.as_bytes())?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    buffer.clear();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn run_chunks(input: &str, capacity: usize) -> (Vec<Vec<String>>, ChunkSortStats) {
        let mut store = SpillStore::new().unwrap();
        let mut segments = Vec::new();
        let cmd = ChunkSortCommand::new().with_capacity(capacity);
        let stats = cmd.run(input.as_bytes(), &mut store, &mut segments).unwrap();

        let contents = segments
            .iter()
            .map(|seg| {
                let mut text = String::new();
                seg.reader().unwrap().read_to_string(&mut text).unwrap();
                text.lines().map(|l| l.to_string()).collect()
            })
            .collect();
        (contents, stats)
    }

    #[test]
    fn test_empty_input_produces_no_segments() {
        let (segments, stats) = run_chunks("", 4);
        assert!(segments.is_empty());
        assert_eq!(stats.addresses_read, 0);
        assert_eq!(stats.segments_written, 0);
    }

    #[test]
    fn test_blank_lines_skipped() {
        let (segments, stats) = run_chunks("\n\n::1\n\n", 4);
        assert_eq!(stats.addresses_read, 1);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0], vec!["0000:0000:0000:0000:0000:0000:0000:0001"]);
    }

    #[test]
    fn test_segments_are_sorted() {
        let (segments, _) = run_chunks("ff::\n::1\n2001:db8::\n", 10);
        assert_eq!(segments.len(), 1);
        let seg = &segments[0];
        assert_eq!(seg.len(), 3);
        let mut sorted = seg.clone();
        sorted.sort();
        assert_eq!(*seg, sorted);
    }

    #[test]
    fn test_capacity_splits_into_segments() {
        // 5 addresses at capacity 2: two full segments plus one
        // undersized final flush.
        let (segments, stats) = run_chunks("::1\n::2\n::3\n::4\n::5\n", 2);
        assert_eq!(stats.segments_written, 3);
        assert_eq!(segments.len(), 3);
        assert_eq!(segments[0].len(), 2);
        assert_eq!(segments[1].len(), 2);
        assert_eq!(segments[2].len(), 1);
    }

    #[test]
    fn test_exact_multiple_of_capacity() {
        let (segments, _) = run_chunks("::1\n::2\n::3\n::4\n", 2);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_strict_rejects_with_line_number() {
        let mut store = SpillStore::new().unwrap();
        let mut segments = Vec::new();
        let cmd = ChunkSortCommand::new().with_capacity(4).with_strict(true);
        let err = cmd
            .run("::1\n\nnot-an-address\n".as_bytes(), &mut store, &mut segments)
            .unwrap_err();

        match err {
            CountError::MalformedAddress { line, address } => {
                assert_eq!(line, 3);
                assert_eq!(address, "not-an-address");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_lenient_accepts_malformed() {
        let (segments, stats) = run_chunks("1:2:3\n", 4);
        assert_eq!(stats.addresses_read, 1);
        assert_eq!(segments[0], vec!["0001:0002:0003"]);
    }

    #[test]
    fn test_capacity_clamped_to_one() {
        let cmd = ChunkSortCommand::new().with_capacity(0);
        assert_eq!(cmd.capacity, 1);
    }
}
