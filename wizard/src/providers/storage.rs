//! Object storage trait.

use crate::error::Result;

/// Object storage for banner images.
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `name` and return its public URL.
    ///
    /// `name` must be unique per call; callers generate collision-resistant
    /// names.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Storage` if the upload is rejected.
    fn put(
        &self,
        name: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    /// Remove the object stored under `name`.
    ///
    /// # Errors
    ///
    /// Returns error if the object cannot be removed.
    fn remove(&self, name: &str) -> impl std::future::Future<Output = Result<()>> + Send;
}
