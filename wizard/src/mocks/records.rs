//! Mock record store.

use crate::error::{RemoteError, Result};
use crate::providers::RecordStore;
use crate::types::{
    Category, CategoryId, EventId, EventPatch, EventRecord, LocationDraft, LocationId,
    LocationRecord, NewEvent, TicketDraft, TicketId, TicketRecord,
};
use event_wizard_core::environment::Clock;
use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Record store operation, for failure injection and call counting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordOperation {
    /// `select_categories`
    SelectCategories,
    /// `insert_event`
    InsertEvent,
    /// `update_event`
    UpdateEvent,
    /// `delete_event`
    DeleteEvent,
    /// `insert_location`
    InsertLocation,
    /// `delete_location`
    DeleteLocation,
    /// `insert_ticket`
    InsertTicket,
}

#[derive(Debug, Default)]
struct Tables {
    categories: Vec<Category>,
    events: BTreeMap<EventId, EventRecord>,
    locations: BTreeMap<LocationId, LocationRecord>,
    tickets: Vec<TicketRecord>,
}

/// What one call should do before touching the tables
struct CallPlan {
    latency: Option<Duration>,
    failure: Option<RemoteError>,
}

impl CallPlan {
    async fn run(self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        self.failure.map_or(Ok(()), Err)
    }
}

/// Mock record store.
///
/// Uses in-memory tables for testing. Clones share the same tables,
/// injected failures, and call counters.
#[derive(Clone)]
pub struct InMemoryRecordStore {
    tables: Arc<Mutex<Tables>>,
    failures: Arc<Mutex<HashMap<RecordOperation, RemoteError>>>,
    calls: Arc<Mutex<HashMap<RecordOperation, usize>>>,
    latency: Arc<Mutex<Option<Duration>>>,
    clock: Arc<dyn Clock>,
}

impl InMemoryRecordStore {
    /// Create an empty store stamping rows with `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            failures: Arc::new(Mutex::new(HashMap::new())),
            calls: Arc::new(Mutex::new(HashMap::new())),
            latency: Arc::new(Mutex::new(None)),
            clock,
        }
    }

    /// Seed a category and return it.
    pub fn add_category(&self, name: &str, description: Option<&str>) -> Category {
        let category = Category {
            id: CategoryId::new(),
            name: name.to_string(),
            description: description.map(str::to_string),
            parent: None,
            created_at: self.clock.now(),
        };
        if let Ok(mut tables) = self.tables.lock() {
            tables.categories.push(category.clone());
        }
        category
    }

    /// Seed an existing event row, bypassing call counters.
    pub fn seed_event(&self, event: EventRecord) {
        if let Ok(mut tables) = self.tables.lock() {
            tables.events.insert(event.id, event);
        }
    }

    /// Make every call of `operation` fail with `error` until [`Self::recover`].
    pub fn fail(&self, operation: RecordOperation, error: RemoteError) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.insert(operation, error);
        }
    }

    /// Stop failing `operation`.
    pub fn recover(&self, operation: RecordOperation) {
        if let Ok(mut failures) = self.failures.lock() {
            failures.remove(&operation);
        }
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Option<Duration>) {
        if let Ok(mut current) = self.latency.lock() {
            *current = latency;
        }
    }

    /// Number of calls of `operation` so far, failed ones included.
    #[must_use]
    pub fn calls(&self, operation: RecordOperation) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(&operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total number of calls that write a row.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        [
            RecordOperation::InsertEvent,
            RecordOperation::UpdateEvent,
            RecordOperation::DeleteEvent,
            RecordOperation::InsertLocation,
            RecordOperation::DeleteLocation,
            RecordOperation::InsertTicket,
        ]
        .into_iter()
        .map(|operation| self.calls(operation))
        .sum()
    }

    /// Stored events.
    #[must_use]
    pub fn events(&self) -> Vec<EventRecord> {
        self.read(|tables| tables.events.values().cloned().collect())
    }

    /// Stored locations.
    #[must_use]
    pub fn locations(&self) -> Vec<LocationRecord> {
        self.read(|tables| tables.locations.values().cloned().collect())
    }

    /// Stored tickets, in insertion order.
    #[must_use]
    pub fn tickets(&self) -> Vec<TicketRecord> {
        self.read(|tables| tables.tickets.clone())
    }

    fn read<T: Default>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        self.tables.lock().map(|tables| f(&tables)).unwrap_or_default()
    }

    fn plan(&self, operation: RecordOperation) -> CallPlan {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }

        CallPlan {
            latency: self.latency.lock().ok().and_then(|latency| *latency),
            failure: self
                .failures
                .lock()
                .ok()
                .and_then(|failures| failures.get(&operation).cloned()),
        }
    }
}

fn poisoned() -> RemoteError {
    RemoteError::Internal("record store lock poisoned".into())
}

impl RecordStore for InMemoryRecordStore {
    fn select_categories(&self) -> impl Future<Output = Result<Vec<Category>>> + Send {
        let plan = self.plan(RecordOperation::SelectCategories);
        let tables = Arc::clone(&self.tables);

        async move {
            plan.run().await?;
            let tables = tables.lock().map_err(|_| poisoned())?;
            Ok(tables.categories.clone())
        }
    }

    fn insert_event(&self, event: &NewEvent) -> impl Future<Output = Result<EventRecord>> + Send {
        let plan = self.plan(RecordOperation::InsertEvent);
        let tables = Arc::clone(&self.tables);
        let record = EventRecord {
            id: EventId::new(),
            title: event.title.clone(),
            description: event.description.clone(),
            date: event.date,
            start_time: event.start_time,
            duration: event.duration,
            end_time: event.end_time,
            category: event.category,
            image_urls: event.image_urls.clone(),
            organizer: event.organizer,
            venue: None,
            created_at: self.clock.now(),
        };

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            tables.events.insert(record.id, record.clone());
            Ok(record)
        }
    }

    fn update_event(
        &self,
        id: EventId,
        patch: &EventPatch,
    ) -> impl Future<Output = Result<EventRecord>> + Send {
        let plan = self.plan(RecordOperation::UpdateEvent);
        let tables = Arc::clone(&self.tables);
        let patch = patch.clone();

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            let event = tables
                .events
                .get_mut(&id)
                .ok_or_else(|| RemoteError::NotFound(format!("event {id}")))?;
            if let Some(venue) = patch.venue {
                event.venue = Some(venue);
            }
            Ok(event.clone())
        }
    }

    fn delete_event(&self, id: EventId) -> impl Future<Output = Result<()>> + Send {
        let plan = self.plan(RecordOperation::DeleteEvent);
        let tables = Arc::clone(&self.tables);

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            tables
                .events
                .remove(&id)
                .ok_or_else(|| RemoteError::NotFound(format!("event {id}")))?;
            tables.locations.retain(|_, location| location.event != id);
            tables.tickets.retain(|ticket| ticket.event != id);
            Ok(())
        }
    }

    fn insert_location(
        &self,
        event: EventId,
        location: &LocationDraft,
    ) -> impl Future<Output = Result<LocationRecord>> + Send {
        let plan = self.plan(RecordOperation::InsertLocation);
        let tables = Arc::clone(&self.tables);
        let record = LocationRecord {
            id: LocationId::new(),
            event,
            details: location.clone(),
        };

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            if !tables.events.contains_key(&event) {
                return Err(RemoteError::Database(format!(
                    "foreign key violation: event {event} does not exist"
                )));
            }
            tables.locations.insert(record.id, record.clone());
            Ok(record)
        }
    }

    fn delete_location(&self, id: LocationId) -> impl Future<Output = Result<()>> + Send {
        let plan = self.plan(RecordOperation::DeleteLocation);
        let tables = Arc::clone(&self.tables);

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            tables
                .locations
                .remove(&id)
                .map(|_| ())
                .ok_or_else(|| RemoteError::NotFound(format!("location {id}")))
        }
    }

    fn insert_ticket(
        &self,
        event: EventId,
        ticket: &TicketDraft,
    ) -> impl Future<Output = Result<TicketRecord>> + Send {
        let plan = self.plan(RecordOperation::InsertTicket);
        let tables = Arc::clone(&self.tables);
        let record = TicketRecord {
            id: TicketId::new(),
            event,
            details: ticket.clone(),
        };

        async move {
            plan.run().await?;
            let mut tables = tables.lock().map_err(|_| poisoned())?;
            if !tables.events.contains_key(&event) {
                return Err(RemoteError::Database(format!(
                    "foreign key violation: event {event} does not exist"
                )));
            }
            tables.tickets.push(record.clone());
            Ok(record)
        }
    }
}

impl std::fmt::Debug for InMemoryRecordStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (events, locations, tickets) = self.read(|tables| {
            (tables.events.len(), tables.locations.len(), tables.tickets.len())
        });
        f.debug_struct("InMemoryRecordStore")
            .field("events", &events)
            .field("locations", &locations)
            .field("tickets", &tickets)
            .finish_non_exhaustive()
    }
}
