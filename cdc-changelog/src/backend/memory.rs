use std::collections::VecDeque;
use std::sync::RwLock;

use dashmap::DashMap;

use cdc_common::err::{CResult, ReError};

use super::ChangeLog;

/// In-memory change-log backend, for tests and the local smoke-testing
/// CLI. Same per-table queue semantics as [`super::disk::DiskChangeLog`],
/// backed by `dashmap` for concurrent per-table access (grounded on the
/// teacher's pervasive use of `dashmap` for concurrent key-scoped maps in
/// `binlog` and `relay_log`).
#[derive(Default)]
pub struct MemoryChangeLog {
    tables: DashMap<String, RwLock<VecDeque<Vec<u8>>>>,
}

impl MemoryChangeLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ChangeLog for MemoryChangeLog {
    fn append(&self, table: &str, bytes: Vec<u8>) -> CResult<()> {
        let queue = self.tables.entry(table.to_string()).or_default();
        queue
            .write()
            .map_err(|e| ReError::StoreUnavailable(format!("lock poisoned: {}", e)))?
            .push_back(bytes);
        Ok(())
    }

    fn range_read(&self, table: &str, start: i64, end: i64) -> CResult<Vec<Vec<u8>>> {
        let Some(queue) = self.tables.get(table) else {
            return Ok(Vec::new());
        };
        let guard = queue
            .read()
            .map_err(|e| ReError::StoreUnavailable(format!("lock poisoned: {}", e)))?;
        let len = guard.len();
        if len == 0 || start as usize >= len {
            return Ok(Vec::new());
        }
        let start = start.max(0) as usize;
        let end = if end < 0 { len - 1 } else { (end as usize).min(len - 1) };
        if start > end {
            return Ok(Vec::new());
        }
        Ok(guard.range(start..=end).cloned().collect())
    }

    fn size(&self, table: &str) -> CResult<usize> {
        let Some(queue) = self.tables.get(table) else {
            return Ok(0);
        };
        Ok(queue
            .read()
            .map_err(|e| ReError::StoreUnavailable(format!("lock poisoned: {}", e)))?
            .len())
    }

    fn trim_head(&self, table: &str, n: usize) -> CResult<()> {
        let Some(queue) = self.tables.get(table) else {
            return Ok(());
        };
        let mut guard = queue
            .write()
            .map_err(|e| ReError::StoreUnavailable(format!("lock poisoned: {}", e)))?;
        let n = n.min(guard.len());
        guard.drain(0..n);
        Ok(())
    }

    fn truncate(&self, table: &str) -> CResult<()> {
        self.tables.remove(table);
        Ok(())
    }
}
