use async_trait::async_trait;

use cdc_common::err::CResult;

use crate::param::BoundParam;

/// Outcome of one `execute` call against the target database.
pub trait ExecuteResult: Send {
    fn rows_affected(&self) -> u64;
}

/// A prepared statement handle held open against the target connection for
/// the Syncer's lifetime.
#[async_trait]
pub trait PreparedStatement: Send + Sync {
    async fn execute(&self, params: &[BoundParam]) -> CResult<Box<dyn ExecuteResult>>;
}

/// The target database driver contract: `open`/`prepare`/`execute`/
/// `close`, with `?` placeholder syntax (binary columns wrapped in a
/// cast). The driver itself — wire encoding, the actual SQL-Server-family
/// client — is out of scope; this trait is the seam the core depends on.
#[async_trait]
pub trait TargetConnection: Send + Sync {
    async fn prepare(&self, statement_text: &str) -> CResult<Box<dyn PreparedStatement>>;
    async fn close(&self) -> CResult<()>;
}
