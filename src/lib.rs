//! uniq6: distinct IPv6 address counting via external sort-merge.
//!
//! This library counts the number of distinct IPv6 addresses in inputs
//! too large to sort in memory.
//!
//! # Pipeline
//!
//! - **Canonicalization**: every textual form of an address maps to
//!   one fixed-width canonical string, so lexicographic comparison
//!   matches numeric comparison.
//! - **Chunked sorting**: the input is streamed through a bounded
//!   buffer; each full buffer is sorted and spilled to disk as one
//!   sorted segment.
//! - **K-way merge**: all segments are merged with a min-heap while
//!   adjacent duplicates are collapsed, yielding the distinct count in
//!   one pass.
//!
//! # Example
//!
//! ```rust,no_run
//! use uniq6::CountCommand;
//!
//! let stats = CountCommand::new()
//!     .with_capacity(1_000_000)
//!     .run("addresses.txt", "count.txt")
//!     .unwrap();
//! println!("{} distinct addresses", stats.distinct);
//! ```

pub mod canon;
pub mod commands;
pub mod spill;

// Re-export commonly used types
pub use canon::{canonicalize, is_well_formed, CountError};
pub use commands::{ChunkSortCommand, CountCommand, CountStats, MergeCountCommand};
pub use spill::{Segment, SpillStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::canon::{canonicalize, is_well_formed, CountError};
    pub use crate::commands::{
        ChunkSortCommand, ChunkSortStats, CountCommand, CountStats, MergeCountCommand,
    };
    pub use crate::spill::{Segment, SpillStore};
}

#[cfg(test)]
mod tests {
    #[test]
    fn test_basic_workflow() {
        use crate::commands::{ChunkSortCommand, MergeCountCommand};
        use crate::spill::SpillStore;

        let input = "::1\n2001:db8::1\n::1\n";
        let mut store = SpillStore::new().unwrap();
        let mut segments = Vec::new();

        let stats = ChunkSortCommand::new()
            .with_capacity(2)
            .run(input.as_bytes(), &mut store, &mut segments)
            .unwrap();
        assert_eq!(stats.addresses_read, 3);

        let mut output = Vec::new();
        let distinct = MergeCountCommand::new().run(&segments, &mut output).unwrap();
        assert_eq!(distinct, 2);
    }
}
