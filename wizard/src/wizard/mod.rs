//! The wizard controller: state, actions, environment, and reducer.
//!
//! Run it inside a [`Store`]; see [`new_store`].

pub mod actions;
pub mod environment;
pub mod reducer;
pub mod state;

pub use actions::WizardAction;
pub use environment::WizardEnvironment;
pub use reducer::WizardReducer;
pub use state::{StepIndicator, WizardState, WizardStep, WizardSummary};

use crate::providers::{ObjectStorage, RecordStore, SessionProvider};
use event_wizard_runtime::Store;

/// Store running one wizard session
pub type WizardStore<S, O, R> =
    Store<WizardState, WizardAction, WizardEnvironment<S, O, R>, WizardReducer<S, O, R>>;

/// Start a fresh wizard session over `environment`
#[must_use]
pub fn new_store<S, O, R>(environment: WizardEnvironment<S, O, R>) -> WizardStore<S, O, R>
where
    S: SessionProvider + Clone + 'static,
    O: ObjectStorage + Clone + 'static,
    R: RecordStore + Clone + 'static,
{
    let state = WizardState::new(environment.config.max_banner_images);
    Store::new(state, WizardReducer::new(), environment)
}
