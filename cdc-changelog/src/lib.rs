pub mod backend;
pub mod codec;

pub use backend::{ChangeLog, DiskChangeLog, MemoryChangeLog};
pub use codec::{CodecStyle, RecordCodec};
