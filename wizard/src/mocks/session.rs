//! Mock session provider.

use crate::error::{RemoteError, Result};
use crate::providers::SessionProvider;
use crate::types::UserId;
use std::future::Future;

/// Session provider with a fixed answer.
#[derive(Debug, Clone)]
pub struct StaticSession {
    user: Option<UserId>,
    failure: Option<RemoteError>,
}

impl StaticSession {
    /// A session with `user` signed in.
    #[must_use]
    pub const fn signed_in(user: UserId) -> Self {
        Self {
            user: Some(user),
            failure: None,
        }
    }

    /// A session with nobody signed in.
    #[must_use]
    pub const fn signed_out() -> Self {
        Self {
            user: None,
            failure: None,
        }
    }

    /// A session whose backend always fails with `error`.
    #[must_use]
    pub const fn failing(error: RemoteError) -> Self {
        Self {
            user: None,
            failure: Some(error),
        }
    }
}

impl SessionProvider for StaticSession {
    fn current_user(&self) -> impl Future<Output = Result<Option<UserId>>> + Send {
        let answer = self.failure.clone().map_or(Ok(self.user), Err);
        async move { answer }
    }
}
