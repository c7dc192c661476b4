use async_trait::async_trait;
use regex::Regex;

use cdc_binlog::SourceEvent;
use cdc_common::err::CResult;

/// The seam the replication-reader task polls. The driver itself — wire
/// protocol, TLS, resuming from a persisted position — is out of scope;
/// this is the contract the core depends on. `Ok(None)` means the stream
/// ended cleanly; `Err` surfaces a transport failure.
#[async_trait]
pub trait ReplicationSource: Send {
    async fn next_event(&mut self) -> CResult<Option<SourceEvent>>;
}

/// Compiles a `SourceConfig`'s include/exclude regex lists once, so the
/// replication-reader task doesn't recompile a pattern per event. This
/// helper exists for drivers implemented in terms of this crate's traits,
/// and for the CLI smoke-test driver.
pub struct TableFilter {
    include: Vec<Regex>,
    exclude: Vec<Regex>,
}

impl TableFilter {
    pub fn compile(include_tables: &[String], exclude_tables: &[String]) -> CResult<Self> {
        let compile_all = |patterns: &[String]| -> CResult<Vec<Regex>> {
            patterns
                .iter()
                .map(|p| {
                    Regex::new(p).map_err(|e| {
                        cdc_common::err::ReError::ConfigInvalid(format!(
                            "invalid table filter regex '{}': {}",
                            p, e
                        ))
                    })
                })
                .collect()
        };
        Ok(TableFilter {
            include: compile_all(include_tables)?,
            exclude: compile_all(exclude_tables)?,
        })
    }

    /// `fully_qualified` is `schema.table`. An empty include list means "no
    /// inclusion filter" (everything passes unless excluded).
    pub fn matches(&self, fully_qualified: &str) -> bool {
        if self.exclude.iter().any(|re| re.is_match(fully_qualified)) {
            return false;
        }
        self.include.is_empty() || self.include.iter().any(|re| re.is_match(fully_qualified))
    }
}
