//! Command implementations for uniq6.

pub mod chunk_sort;
pub mod count;
pub mod merge_count;

pub use chunk_sort::{ChunkSortCommand, ChunkSortStats, DEFAULT_CHUNK_CAPACITY};
pub use count::{CountCommand, CountStats};
pub use merge_count::MergeCountCommand;
