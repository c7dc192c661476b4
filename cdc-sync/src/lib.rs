pub mod cache;
pub mod connection;
pub mod param;
pub mod statement;
pub mod syncer;

pub use cache::StatementCache;
pub use connection::{ExecuteResult, PreparedStatement, TargetConnection};
pub use param::{bind_pk, bind_row, bind_value, BoundParam};
pub use statement::Operation;
pub use syncer::Syncer;
