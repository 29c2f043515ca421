//! Record storage
//!
//! Records hold encoded field bytes rather than native values, mirroring
//! the on-disk representation. There is no delete operation; the deletion
//! flag of rows read from a file is kept so it survives re-encoding.

mod store;

pub use store::{Record, RecordStore};
