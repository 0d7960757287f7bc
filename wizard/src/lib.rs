//! # Event Wizard
//!
//! A three-step wizard that creates an event, its location, and its ticket
//! types against a remote backend.
//!
//! ## Flow
//!
//! ```text
//! Event Details ──submit──▶ Location ──submit──▶ Ticket ⟲ ──finish──▶ Done
//! ```
//!
//! Each step owns a serializable [`form::Form`]. Submitting validates the
//! form locally; only a valid draft reaches the backend, and the wizard moves
//! forward only when the remote action succeeds. Partial failures are
//! compensated: uploaded banners are removed when the event insert fails, and
//! a location whose link-back fails is deleted.
//!
//! ## Architecture
//!
//! The wizard is a reducer run by an [`event_wizard_runtime::Store`]:
//!
//! ```text
//! WizardAction → WizardReducer → (WizardState, Effects) → Backend → outcome action
//! ```
//!
//! The backend is three capabilities ([`providers::SessionProvider`],
//! [`providers::ObjectStorage`], [`providers::RecordStore`]) behind a
//! [`remote::Backend`] that adds timeouts and rollback. In-memory versions
//! live in [`mocks`] (feature `test-utils`).
//!
//! ## Example
//!
//! ```rust,ignore
//! use event_wizard::prelude::*;
//!
//! let store = new_store(environment);
//! store.send(WizardAction::LoadCategories).await?.wait().await;
//! store.send(WizardAction::EditEvent(EventEdit::Name("Rooftop Jazz".into()))).await?;
//! store.send(WizardAction::SubmitEventStep).await?.wait().await;
//!
//! let step = store.state(|s| s.step).await;
//! ```

#![warn(missing_docs)]
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]

pub mod config;
pub mod error;
pub mod feedback;
pub mod form;
pub mod providers;
pub mod remote;
pub mod steps;
pub mod types;
pub mod validation;
pub mod wizard;

#[cfg(any(test, feature = "test-utils"))]
pub mod mocks;

pub use config::WizardConfig;
pub use error::{RemoteError, Result};
pub use feedback::{FeedbackChannel, Notification, NotificationLevel};
pub use remote::{Backend, LinkedLocation};
pub use wizard::{
    WizardAction, WizardEnvironment, WizardReducer, WizardState, WizardStep, WizardStore,
    WizardSummary, new_store,
};

/// Common imports for driving a wizard
pub mod prelude {
    pub use crate::config::WizardConfig;
    pub use crate::error::RemoteError;
    pub use crate::feedback::{FeedbackChannel, Notification, NotificationLevel};
    pub use crate::providers::{ObjectStorage, RecordStore, SessionProvider};
    pub use crate::steps::{
        EventEdit, EventField, LocationEdit, LocationField, TicketEdit, TicketField,
    };
    pub use crate::types::{ImageUpload, StructuredAddress};
    pub use crate::wizard::{
        WizardAction, WizardEnvironment, WizardState, WizardStep, WizardStore, new_store,
    };
}
