//! Wizard actions.
//!
//! Commands are user intents; events are outcomes of remote actions fed back
//! by the runtime.

use crate::error::RemoteError;
use crate::remote::LinkedLocation;
use crate::steps::{EventEdit, EventField, LocationEdit, LocationField, TicketEdit, TicketField};
use crate::types::{Category, EventRecord, TicketRecord};
use event_wizard_macros::Action;

/// Every input the wizard reacts to
#[derive(Action, Clone, Debug, PartialEq)]
pub enum WizardAction {
    /// Fetch the category list (once per session)
    #[command]
    LoadCategories,

    /// Categories arrived
    #[event]
    CategoriesLoaded {
        /// Categories, ordered by name
        categories: Vec<Category>,
    },

    /// Category fetch failed
    #[event]
    CategoriesFailed {
        /// Cause
        error: RemoteError,
    },

    /// Change a field of the event form
    #[command]
    EditEvent(EventEdit),

    /// A field of the event form lost focus
    #[command]
    BlurEvent(EventField),

    /// Submit step 1
    #[command]
    SubmitEventStep,

    /// Step 1 succeeded
    #[event]
    EventCreated {
        /// Submission this outcome answers
        submission: u64,
        /// The new event
        event: EventRecord,
    },

    /// Step 1 failed
    #[event]
    EventCreationFailed {
        /// Submission this outcome answers
        submission: u64,
        /// Cause
        error: RemoteError,
    },

    /// Change a field of the location form
    #[command]
    EditLocation(LocationEdit),

    /// A field of the location form lost focus
    #[command]
    BlurLocation(LocationField),

    /// Submit step 2
    #[command]
    SubmitLocationStep,

    /// Step 2 succeeded (location inserted and linked back)
    #[event]
    LocationCreated {
        /// Submission this outcome answers
        submission: u64,
        /// The new location and the updated event
        linked: LinkedLocation,
    },

    /// Step 2 failed
    #[event]
    LocationCreationFailed {
        /// Submission this outcome answers
        submission: u64,
        /// Cause
        error: RemoteError,
    },

    /// Change a field of the ticket form
    #[command]
    EditTicket(TicketEdit),

    /// A field of the ticket form lost focus
    #[command]
    BlurTicket(TicketField),

    /// Submit the ticket form
    #[command]
    SubmitTicket,

    /// A ticket type was created
    #[event]
    TicketCreated {
        /// Submission this outcome answers
        submission: u64,
        /// The new ticket
        ticket: TicketRecord,
    },

    /// Ticket creation failed
    #[event]
    TicketCreationFailed {
        /// Submission this outcome answers
        submission: u64,
        /// Cause
        error: RemoteError,
    },

    /// Complete the wizard
    #[command]
    Finish,

    /// Discard everything and start over
    #[command]
    Reset,
}
