//! Ephemeral spill storage for sorted segments.
//!
//! Segments live in a process-unique temp directory for the duration
//! of one run. Their names and location are not a stable contract.

use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Read/write buffer size for segment I/O (256KB for better throughput).
const BUF_SIZE: usize = 256 * 1024;

/// Handle to one externally-stored sorted run.
///
/// A segment is written once by the chunk sorter, read sequentially
/// exactly once by the merger, then released. It is never re-sorted
/// after creation.
#[derive(Debug, Clone)]
pub struct Segment {
    path: PathBuf,
}

impl Segment {
    /// Open the segment for writing.
    pub fn writer(&self) -> io::Result<BufWriter<File>> {
        Ok(BufWriter::with_capacity(BUF_SIZE, File::create(&self.path)?))
    }

    /// Open the segment for sequential reading.
    pub fn reader(&self) -> io::Result<BufReader<File>> {
        Ok(BufReader::with_capacity(BUF_SIZE, File::open(&self.path)?))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Factory for uniquely-named spill segments inside a temp directory.
pub struct SpillStore {
    dir: TempDir,
    next_id: usize,
}

impl SpillStore {
    /// Create a spill store backed by a fresh temp directory.
    pub fn new() -> io::Result<Self> {
        let dir = tempfile::Builder::new().prefix("uniq6-spill-").tempdir()?;
        Ok(Self { dir, next_id: 0 })
    }

    /// Allocate a new segment with a unique identity.
    pub fn create(&mut self) -> io::Result<Segment> {
        let path = self.dir.path().join(format!("segment-{:06}.txt", self.next_id));
        self.next_id += 1;
        Ok(Segment { path })
    }

    /// Delete a segment's underlying storage.
    ///
    /// Best-effort by contract: a failed deletion is swallowed, never
    /// reported. Callers release every segment they created regardless
    /// of whether the run succeeded; the temp directory itself is
    /// removed on drop as a backstop.
    pub fn release(&self, segment: &Segment) {
        let _ = fs::remove_file(&segment.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};

    #[test]
    fn test_segments_have_unique_paths() {
        let mut store = SpillStore::new().unwrap();
        let a = store.create().unwrap();
        let b = store.create().unwrap();
        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn test_write_then_read_back() {
        let mut store = SpillStore::new().unwrap();
        let segment = store.create().unwrap();

        let mut writer = segment.writer().unwrap();
        writer.write_all(b"0000:0000:0000:0000:0000:0000:0000:0001\n").unwrap();
        writer.flush().unwrap();
        drop(writer);

        let mut contents = String::new();
        segment.reader().unwrap().read_to_string(&mut contents).unwrap();
        assert_eq!(contents, "0000:0000:0000:0000:0000:0000:0000:0001\n");
    }

    #[test]
    fn test_release_deletes_storage() {
        let mut store = SpillStore::new().unwrap();
        let segment = store.create().unwrap();
        segment.writer().unwrap().write_all(b"x\n").unwrap();
        assert!(segment.path().exists());

        store.release(&segment);
        assert!(!segment.path().exists());
    }

    #[test]
    fn test_release_never_fails() {
        let mut store = SpillStore::new().unwrap();
        let segment = store.create().unwrap();
        // Never written, so nothing exists on disk. Releasing twice is fine.
        store.release(&segment);
        store.release(&segment);
    }
}
