//! In-memory backend implementations.
//!
//! Used by tests and the demo binary. Each mock counts calls and supports
//! failure injection so partial-failure paths can be exercised.

mod records;
mod session;
mod storage;

pub use records::{InMemoryRecordStore, RecordOperation};
pub use session::StaticSession;
pub use storage::InMemoryObjectStorage;
