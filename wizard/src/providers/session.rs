//! Session provider trait.

use crate::error::Result;
use crate::types::UserId;

/// Auth/session provider.
///
/// Used to stamp the organizer on event creation.
pub trait SessionProvider: Send + Sync {
    /// Get the signed-in user.
    ///
    /// Returns `Ok(None)` when nobody is signed in.
    ///
    /// # Errors
    ///
    /// Returns error if the session backend cannot be reached.
    fn current_user(&self) -> impl std::future::Future<Output = Result<Option<UserId>>> + Send;
}
