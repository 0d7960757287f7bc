//! The three wizard steps: field enums, raw values, edits, and validators.

pub mod event;
pub mod location;
pub mod ticket;

pub use event::{EventEdit, EventField, EventValues};
pub use location::{LocationEdit, LocationField, LocationValues};
pub use ticket::{TicketEdit, TicketField, TicketValues};
