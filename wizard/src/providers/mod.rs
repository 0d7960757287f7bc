//! Backend capability traits.
//!
//! The wizard reaches the backend-as-a-service only through these traits.
//! Production code plugs in the real client; tests and the demo use the
//! in-memory implementations from [`crate::mocks`].

mod records;
mod session;
mod storage;

pub use records::RecordStore;
pub use session::SessionProvider;
pub use storage::ObjectStorage;
