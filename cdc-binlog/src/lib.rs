pub mod decode;
pub mod dispatch;
pub mod event;

pub use decode::decode_row;
pub use dispatch::{dispatch, ChangeHandler};
pub use event::{RawValue, SourceColumn, SourceEvent, SourceTypeTag};
