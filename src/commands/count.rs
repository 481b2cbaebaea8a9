//! End-to-end distinct-count pipeline.
//!
//! Wires the chunk sorter and the k-way merger together over a spill
//! store: input file -> sorted segments -> merged distinct count ->
//! output file. Every segment created during a run is released when
//! the run ends, whether it succeeded or failed.

use crate::canon::{CountError, Result};
use crate::commands::chunk_sort::{ChunkSortCommand, DEFAULT_CHUNK_CAPACITY};
use crate::commands::merge_count::MergeCountCommand;
use crate::spill::{Segment, SpillStore};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

/// Input read buffer size (256KB for better throughput).
const BUF_SIZE: usize = 256 * 1024;

/// Statistics from one counting run.
#[derive(Debug, Default, Clone)]
pub struct CountStats {
    pub addresses_read: usize,
    pub segments_written: usize,
    pub distinct: u64,
}

impl std::fmt::Display for CountStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Addresses: {}, Segments: {}, Distinct: {}",
            self.addresses_read, self.segments_written, self.distinct
        )
    }
}

/// Count command configuration.
#[derive(Debug, Clone)]
pub struct CountCommand {
    /// Addresses buffered in memory per chunk.
    pub capacity: usize,
    /// Reject malformed address literals instead of canonicalizing
    /// them best-effort.
    pub strict: bool,
}

impl Default for CountCommand {
    fn default() -> Self {
        Self::new()
    }
}

impl CountCommand {
    pub fn new() -> Self {
        Self {
            capacity: DEFAULT_CHUNK_CAPACITY,
            strict: false,
        }
    }

    /// Set the chunk capacity (builder pattern).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Set strict mode (builder pattern).
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Count distinct addresses in `input`, writing the decimal count
    /// to `output`.
    ///
    /// Fails fast with [`CountError::MissingInput`] before any segment
    /// is created when the input path does not exist. The output file
    /// is always produced on success, containing "0" for empty input.
    pub fn run<P: AsRef<Path>, Q: AsRef<Path>>(&self, input: P, output: Q) -> Result<CountStats> {
        let input = input.as_ref();
        if !input.exists() {
            return Err(CountError::MissingInput {
                path: input.to_path_buf(),
            });
        }

        let mut store = SpillStore::new()?;
        // Segment handles are collected here, outside the fallible
        // pipeline, so release runs for every segment created before a
        // mid-run failure.
        let mut segments: Vec<Segment> = Vec::new();

        let result = self.count_distinct(input, output.as_ref(), &mut store, &mut segments);

        for segment in &segments {
            store.release(segment);
        }

        result
    }

    fn count_distinct(
        &self,
        input: &Path,
        output: &Path,
        store: &mut SpillStore,
        segments: &mut Vec<Segment>,
    ) -> Result<CountStats> {
        let reader = BufReader::with_capacity(BUF_SIZE, File::open(input)?);
        let chunk_stats = ChunkSortCommand::new()
            .with_capacity(self.capacity)
            .with_strict(self.strict)
            .run(reader, store, segments)?;

        let mut out = File::create(output)?;
        let distinct = if segments.is_empty() {
            // The merger leaves its sink untouched for an empty
            // segment list; the output artifact is still produced.
            out.write_all(b"0")?;
            0
        } else {
            MergeCountCommand::new().run(segments, &mut out)?
        };

        Ok(CountStats {
            addresses_read: chunk_stats.addresses_read,
            segments_written: chunk_stats.segments_written,
            distinct,
        })
    }
}
