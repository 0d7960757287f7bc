//! Wizard environment.

use crate::config::WizardConfig;
use crate::feedback::FeedbackChannel;
use crate::providers::{ObjectStorage, RecordStore, SessionProvider};
use crate::remote::Backend;
use event_wizard_core::environment::Clock;
use std::sync::Arc;

/// Wizard environment.
///
/// Contains all external dependencies needed by the wizard reducer.
///
/// # Type Parameters
///
/// - `S`: Session provider
/// - `O`: Object storage
/// - `R`: Record store
#[derive(Clone)]
pub struct WizardEnvironment<S, O, R>
where
    S: SessionProvider + Clone,
    O: ObjectStorage + Clone,
    R: RecordStore + Clone,
{
    /// Backend handle used by every remote action
    pub backend: Backend<S, O, R>,

    /// Notification sink
    pub feedback: FeedbackChannel,

    /// Clock for timestamps
    pub clock: Arc<dyn Clock>,

    /// Loaded configuration
    pub config: WizardConfig,
}

impl<S, O, R> WizardEnvironment<S, O, R>
where
    S: SessionProvider + Clone,
    O: ObjectStorage + Clone,
    R: RecordStore + Clone,
{
    /// Create a new wizard environment.
    #[must_use]
    pub fn new(session: S, storage: O, records: R, clock: Arc<dyn Clock>, config: WizardConfig) -> Self {
        let backend = Backend::new(
            session,
            storage,
            records,
            Arc::clone(&clock),
            config.remote_timeout(),
        );
        let feedback = FeedbackChannel::from_config(&config, Arc::clone(&clock));

        Self {
            backend,
            feedback,
            clock,
            config,
        }
    }
}
