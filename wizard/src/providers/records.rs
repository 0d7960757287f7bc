//! Record store trait.

use crate::error::Result;
use crate::types::{
    Category, EventId, EventPatch, EventRecord, LocationDraft, LocationId, LocationRecord,
    NewEvent, TicketDraft, TicketRecord,
};

/// Relational record store.
///
/// Table-shaped operations over categories, events, locations, and tickets.
/// Each row gets an opaque id on insert. There is no transaction spanning
/// several calls.
pub trait RecordStore: Send + Sync {
    /// List all categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Database` if the query fails.
    fn select_categories(&self) -> impl std::future::Future<Output = Result<Vec<Category>>> + Send;

    /// Insert an event row.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Database` if the insert fails. No row is left behind.
    fn insert_event(
        &self,
        event: &NewEvent,
    ) -> impl std::future::Future<Output = Result<EventRecord>> + Send;

    /// Apply `patch` to an event row and return the updated row.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `RemoteError::NotFound`
    /// - Update fails → `RemoteError::Database`
    fn update_event(
        &self,
        id: EventId,
        patch: &EventPatch,
    ) -> impl std::future::Future<Output = Result<EventRecord>> + Send;

    /// Delete an event row.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Event not found → `RemoteError::NotFound`
    /// - Delete fails → `RemoteError::Database`
    fn delete_event(&self, id: EventId) -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert a location row owned by `event`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Database` if the insert fails.
    fn insert_location(
        &self,
        event: EventId,
        location: &LocationDraft,
    ) -> impl std::future::Future<Output = Result<LocationRecord>> + Send;

    /// Delete a location row.
    ///
    /// # Errors
    ///
    /// Returns error if:
    /// - Location not found → `RemoteError::NotFound`
    /// - Delete fails → `RemoteError::Database`
    fn delete_location(&self, id: LocationId)
    -> impl std::future::Future<Output = Result<()>> + Send;

    /// Insert a ticket row owned by `event`.
    ///
    /// # Errors
    ///
    /// Returns `RemoteError::Database` if the insert fails.
    fn insert_ticket(
        &self,
        event: EventId,
        ticket: &TicketDraft,
    ) -> impl std::future::Future<Output = Result<TicketRecord>> + Send;
}
