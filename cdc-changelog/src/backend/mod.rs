pub mod disk;
pub mod memory;

use cdc_common::err::CResult;

/// Per-table append-only queue of opaque byte values. Both the disk
/// and in-memory backends implement this trait with identical semantics;
/// the Syncer and the replication-reader only ever see this interface.
pub trait ChangeLog: Send + Sync {
    /// Durable before returning `Ok`.
    fn append(&self, table: &str, bytes: Vec<u8>) -> CResult<()>;

    /// Inclusive range; `end < 0` means "to tail". Returns a snapshot — a
    /// concurrent append after this call does not affect the result.
    fn range_read(&self, table: &str, start: i64, end: i64) -> CResult<Vec<Vec<u8>>>;

    fn size(&self, table: &str) -> CResult<usize>;

    /// Removes the first `n` records; atomic with respect to concurrent
    /// `append` on the same table.
    fn trim_head(&self, table: &str, n: usize) -> CResult<()>;

    /// Deletes all records for `table`; tolerates a table that never
    /// existed.
    fn truncate(&self, table: &str) -> CResult<()>;
}

pub use disk::DiskChangeLog;
pub use memory::MemoryChangeLog;
