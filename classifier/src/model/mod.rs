pub mod record;
pub mod summary;

pub use record::{DisplayRow, Record, RecordStatus};
