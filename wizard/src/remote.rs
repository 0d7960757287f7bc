//! Remote actions against the backend.
//!
//! Every action goes through an explicit [`Backend`] handle, returns a tagged
//! [`Result`], and is bounded by the configured timeout. Nothing is retried.
//!
//! Two actions span several calls and compensate on partial failure:
//!
//! - Event submission uploads the banner batch, then inserts the event. A
//!   failed upload or insert removes every object already uploaded.
//! - Location creation inserts the location, then links it back onto the
//!   event. A failed link-back deletes the new location row.
//!
//! Rows that arrive after the wizard has moved on are discarded with
//! [`Backend::discard_event`] and [`Backend::discard_location`].

use crate::error::{RemoteError, Result};
use crate::providers::{ObjectStorage, RecordStore, SessionProvider};
use crate::types::{
    Category, EventDraft, EventId, EventPatch, EventRecord, ImageUpload, LocationDraft,
    LocationRecord, NewEvent, TicketDraft, TicketRecord, UserId,
};
use event_wizard_core::environment::Clock;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Object uploaded during an event submission
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoredObject {
    /// Object name in storage
    pub name: String,
    /// Public URL
    pub url: String,
}

/// A new location together with the event it was linked onto
#[derive(Clone, Debug, PartialEq)]
pub struct LinkedLocation {
    /// Inserted location row
    pub location: LocationRecord,
    /// Event row after the link-back (`venue` set)
    pub event: EventRecord,
}

/// Handle on the backend capabilities
///
/// Cheap to clone; the object-name sequence is shared between clones.
#[derive(Clone)]
pub struct Backend<S, O, R> {
    session: S,
    storage: O,
    records: R,
    clock: Arc<dyn Clock>,
    timeout: Duration,
    sequence: Arc<AtomicU64>,
}

impl<S, O, R> Backend<S, O, R>
where
    S: SessionProvider,
    O: ObjectStorage,
    R: RecordStore,
{
    /// Create a backend handle
    #[must_use]
    pub fn new(session: S, storage: O, records: R, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            session,
            storage,
            records,
            clock,
            timeout,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Session provider
    pub const fn session(&self) -> &S {
        &self.session
    }

    /// Object storage
    pub const fn storage(&self) -> &O {
        &self.storage
    }

    /// Record store
    pub const fn records(&self) -> &R {
        &self.records
    }

    /// Bound on each remote call
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Run one remote call under the timeout
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if let Ok(result) = tokio::time::timeout(self.timeout, call).await {
            if let Err(error) = &result {
                tracing::debug!(operation, %error, "Remote call failed");
            }
            result
        } else {
            let timeout_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
            tracing::warn!(operation, timeout_ms, "Remote call timed out");
            Err(RemoteError::Timeout {
                operation: operation.to_string(),
                timeout_ms,
            })
        }
    }

    /// List categories, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns the record store's error, or `RemoteError::Timeout`.
    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        let mut categories = self
            .bounded("select_categories", self.records.select_categories())
            .await?;
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        tracing::debug!(count = categories.len(), "Loaded categories");
        Ok(categories)
    }

    /// Collision-resistant storage name: `<unix-millis>_<sequence>_<file name>`
    #[must_use]
    pub fn object_name(&self, file_name: &str) -> String {
        let millis = self.clock.now().timestamp_millis();
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        format!("{millis}_{sequence}_{}", sanitize_file_name(file_name))
    }

    /// Upload a batch of banner images and return their public URLs.
    ///
    /// # Errors
    ///
    /// Returns the first upload failure. Remaining files are not attempted
    /// and files already uploaded are removed.
    pub async fn upload_images(&self, files: &[ImageUpload]) -> Result<Vec<String>> {
        let stored = self.upload_batch(files).await?;
        Ok(stored.into_iter().map(|object| object.url).collect())
    }

    async fn upload_batch(&self, files: &[ImageUpload]) -> Result<Vec<StoredObject>> {
        let mut stored = Vec::with_capacity(files.len());

        for file in files {
            let name = self.object_name(&file.file_name);
            let upload = self.storage.put(&name, &file.bytes, &file.content_type);

            match self.bounded("put_object", upload).await {
                Ok(url) => {
                    tracing::debug!(object = %name, "Uploaded banner image");
                    stored.push(StoredObject { name, url });
                },
                Err(error) => {
                    tracing::warn!(
                        file = %file.file_name,
                        uploaded = stored.len(),
                        %error,
                        "Image upload failed, rolling back batch"
                    );
                    self.remove_objects(&stored).await;
                    return Err(error);
                },
            }
        }

        Ok(stored)
    }

    /// Best-effort removal; leaked names are logged
    async fn remove_objects(&self, objects: &[StoredObject]) {
        let mut leaked = Vec::new();

        for object in objects {
            if let Err(error) = self
                .bounded("remove_object", self.storage.remove(&object.name))
                .await
            {
                tracing::warn!(object = %object.name, %error, "Could not remove uploaded image");
                leaked.push(object.name.clone());
            }
        }

        if !leaked.is_empty() {
            tracing::error!(?leaked, "Rollback left uploaded images in storage");
        }
    }

    /// Insert an event row for an already-uploaded banner set.
    ///
    /// # Errors
    ///
    /// Returns the record store's error, or `RemoteError::Timeout`.
    pub async fn create_event(
        &self,
        draft: &EventDraft,
        image_urls: Vec<String>,
        organizer: UserId,
    ) -> Result<EventRecord> {
        let event = NewEvent::from_draft(draft, image_urls, organizer);
        self.bounded("insert_event", self.records.insert_event(&event))
            .await
    }

    /// Submit the event step: resolve the organizer, upload banners, insert.
    ///
    /// # Errors
    ///
    /// - `RemoteError::Unauthenticated` if nobody is signed in (nothing uploaded)
    /// - The first upload failure (batch rolled back)
    /// - The insert failure (uploads rolled back)
    #[tracing::instrument(skip_all, fields(title = %draft.title, images = draft.images.len()))]
    pub async fn submit_event(&self, draft: EventDraft) -> Result<EventRecord> {
        let organizer = self
            .bounded("current_user", self.session.current_user())
            .await?
            .ok_or(RemoteError::Unauthenticated)?;

        let stored = self.upload_batch(&draft.images).await?;
        let urls = stored.iter().map(|object| object.url.clone()).collect();

        match self.create_event(&draft, urls, organizer).await {
            Ok(event) => {
                tracing::info!(event_id = %event.id, "Event created");
                Ok(event)
            },
            Err(error) => {
                tracing::warn!(%error, "Event insert failed, removing uploaded images");
                self.remove_objects(&stored).await;
                Err(error)
            },
        }
    }

    /// Apply a patch to an event row.
    ///
    /// # Errors
    ///
    /// Returns the record store's error, or `RemoteError::Timeout`.
    pub async fn update_event(&self, id: EventId, patch: &EventPatch) -> Result<EventRecord> {
        self.bounded("update_event", self.records.update_event(id, patch))
            .await
    }

    /// Insert a location for `event` and link it back onto the event.
    ///
    /// The link-back runs only after the insert succeeded.
    ///
    /// # Errors
    ///
    /// - The insert failure (nothing to undo)
    /// - The link-back failure (location row deleted; if that also fails the
    ///   orphan is logged)
    #[tracing::instrument(skip_all, fields(event_id = %event))]
    pub async fn create_location(&self, draft: &LocationDraft, event: EventId) -> Result<LinkedLocation> {
        let location = self
            .bounded("insert_location", self.records.insert_location(event, draft))
            .await?;

        let patch = EventPatch {
            venue: Some(location.id),
        };

        match self.update_event(event, &patch).await {
            Ok(updated) => {
                tracing::info!(location_id = %location.id, "Location created and linked");
                Ok(LinkedLocation {
                    location,
                    event: updated,
                })
            },
            Err(error) => {
                tracing::warn!(location_id = %location.id, %error, "Link-back failed, deleting location");
                if let Err(delete_error) = self
                    .bounded("delete_location", self.records.delete_location(location.id))
                    .await
                {
                    tracing::error!(
                        location_id = %location.id,
                        %delete_error,
                        "Orphaned location row left in store"
                    );
                }
                Err(error)
            },
        }
    }

    /// Delete an event row nobody will finish, and its banner images.
    ///
    /// Best-effort: whatever cannot be removed is logged as an orphan.
    #[tracing::instrument(skip_all, fields(event_id = %event.id))]
    pub async fn discard_event(&self, event: &EventRecord) {
        if let Err(error) = self
            .bounded("delete_event", self.records.delete_event(event.id))
            .await
        {
            tracing::error!(%error, "Orphaned event row left in store");
        }

        let objects: Vec<StoredObject> = event
            .image_urls
            .iter()
            .filter_map(|url| {
                url.rsplit('/').next().map(|name| StoredObject {
                    name: name.to_string(),
                    url: url.clone(),
                })
            })
            .collect();
        self.remove_objects(&objects).await;
        tracing::info!(images = objects.len(), "Discarded event");
    }

    /// Delete a location row nobody will finish.
    ///
    /// Best-effort: a failed delete is logged as an orphan.
    #[tracing::instrument(skip_all, fields(location_id = %location.id))]
    pub async fn discard_location(&self, location: &LocationRecord) {
        match self
            .bounded("delete_location", self.records.delete_location(location.id))
            .await
        {
            Ok(()) => tracing::info!("Discarded location"),
            Err(error) => tracing::error!(%error, "Orphaned location row left in store"),
        }
    }

    /// Insert a ticket for `event`.
    ///
    /// # Errors
    ///
    /// Returns the record store's error, or `RemoteError::Timeout`.
    #[tracing::instrument(skip_all, fields(event_id = %event, name = %draft.name))]
    pub async fn create_ticket(&self, draft: &TicketDraft, event: EventId) -> Result<TicketRecord> {
        let ticket = self
            .bounded("insert_ticket", self.records.insert_ticket(event, draft))
            .await?;
        tracing::info!(ticket_id = %ticket.id, "Ticket created");
        Ok(ticket)
    }
}

impl<S, O, R> std::fmt::Debug for Backend<S, O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend")
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

/// Keep storage-safe characters, replace the rest with `_`
fn sanitize_file_name(file_name: &str) -> String {
    let cleaned: String = file_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mocks::{InMemoryObjectStorage, InMemoryRecordStore, RecordOperation, StaticSession};
    use crate::types::{EventDuration, Money};
    use chrono::{NaiveDate, NaiveTime};
    use event_wizard_testing::test_clock;

    type TestBackend = Backend<StaticSession, InMemoryObjectStorage, InMemoryRecordStore>;

    fn backend_with(session: StaticSession, timeout: Duration) -> TestBackend {
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        let records = InMemoryRecordStore::new(Arc::clone(&clock));
        Backend::new(
            session,
            InMemoryObjectStorage::new("event-images"),
            records,
            clock,
            timeout,
        )
    }

    fn backend() -> TestBackend {
        backend_with(StaticSession::signed_in(UserId::new()), Duration::from_secs(5))
    }

    fn draft(files: &[&str]) -> EventDraft {
        EventDraft {
            title: "Rooftop Jazz".to_string(),
            description: "Live quartet".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            start_time: NaiveTime::from_hms_opt(19, 30, 0).unwrap(),
            duration: EventDuration::TwoHours,
            category: crate::types::CategoryId::new(),
            images: files
                .iter()
                .map(|name| ImageUpload::new(*name, "image/png", vec![1, 2, 3]))
                .collect(),
        }
    }

    fn location_draft() -> LocationDraft {
        LocationDraft {
            venue: "Blue Hall".to_string(),
            address_line_1: "12 Harbor St".to_string(),
            address_line_2: None,
            city: "Portland".to_string(),
            state: "OR".to_string(),
            country: "US".to_string(),
            postal_code: "97201".to_string(),
            capacity: Some(300),
            latitude: Some(45.52),
            longitude: Some(-122.68),
        }
    }

    #[test]
    fn object_names_are_unique_and_sanitized() {
        let backend = backend();
        let first = backend.object_name("my banner.png");
        let second = backend.object_name("my banner.png");

        assert_ne!(first, second);
        assert!(first.ends_with("_0_my_banner.png"));
        assert!(first.starts_with(&test_clock().now().timestamp_millis().to_string()));
        assert_eq!(sanitize_file_name("../"), ".._");
        assert_eq!(sanitize_file_name("  "), "image");
    }

    #[tokio::test]
    async fn submit_event_uploads_then_inserts() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png", "b.png"])).await.unwrap();

        assert_eq!(event.image_urls.len(), 2);
        assert!(event.image_urls[0].starts_with("memory://event-images/"));
        assert_eq!(event.end_time.to_string(), "2025-06-01 21:30:00");
        assert_eq!(backend.storage().object_names().len(), 2);
        assert_eq!(backend.records().calls(RecordOperation::InsertEvent), 1);
    }

    #[tokio::test]
    async fn failed_upload_rolls_back_and_skips_insert() {
        let backend = backend();
        backend.storage().fail_uploads_of("b.png");

        let result = backend.submit_event(draft(&["a.png", "b.png", "c.png"])).await;

        assert!(matches!(result, Err(RemoteError::Storage(_))));
        assert!(backend.storage().object_names().is_empty());
        assert_eq!(backend.storage().put_calls(), 2);
        assert_eq!(backend.records().calls(RecordOperation::InsertEvent), 0);
    }

    #[tokio::test]
    async fn failed_insert_removes_uploaded_images() {
        let backend = backend();
        backend
            .records()
            .fail(RecordOperation::InsertEvent, RemoteError::Database("down".into()));

        let result = backend.submit_event(draft(&["a.png"])).await;

        assert_eq!(result, Err(RemoteError::Database("down".into())));
        assert!(backend.storage().object_names().is_empty());
    }

    #[tokio::test]
    async fn failed_rollback_keeps_original_error() {
        let backend = backend();
        backend.storage().fail_uploads_of("b.png");
        backend.storage().fail_removals(true);

        let result = backend.submit_event(draft(&["a.png", "b.png"])).await;

        assert!(matches!(result, Err(RemoteError::Storage(message)) if message.contains("b.png")));
        assert_eq!(backend.storage().object_names().len(), 1);
    }

    #[tokio::test]
    async fn signed_out_user_uploads_nothing() {
        let backend = backend_with(StaticSession::signed_out(), Duration::from_secs(5));

        let result = backend.submit_event(draft(&["a.png"])).await;

        assert_eq!(result, Err(RemoteError::Unauthenticated));
        assert_eq!(backend.storage().put_calls(), 0);
    }

    #[tokio::test]
    async fn create_location_links_back() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();

        let linked = backend.create_location(&location_draft(), event.id).await.unwrap();

        assert_eq!(linked.location.event, event.id);
        assert_eq!(linked.event.venue, Some(linked.location.id));
        assert_eq!(backend.records().calls(RecordOperation::UpdateEvent), 1);
    }

    #[tokio::test]
    async fn failed_location_insert_skips_link_back() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();
        backend
            .records()
            .fail(RecordOperation::InsertLocation, RemoteError::Database("constraint".into()));

        let result = backend.create_location(&location_draft(), event.id).await;

        assert!(result.is_err());
        assert_eq!(backend.records().calls(RecordOperation::UpdateEvent), 0);
    }

    #[tokio::test]
    async fn failed_link_back_deletes_location() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();
        backend
            .records()
            .fail(RecordOperation::UpdateEvent, RemoteError::Database("locked".into()));

        let result = backend.create_location(&location_draft(), event.id).await;

        assert_eq!(result, Err(RemoteError::Database("locked".into())));
        assert!(backend.records().locations().is_empty());
        assert_eq!(backend.records().calls(RecordOperation::DeleteLocation), 1);
    }

    #[tokio::test]
    async fn slow_backend_times_out() {
        let backend = backend_with(
            StaticSession::signed_in(UserId::new()),
            Duration::from_millis(20),
        );
        backend.records().set_latency(Some(Duration::from_millis(500)));

        let result = backend.list_categories().await;

        assert!(matches!(
            result,
            Err(RemoteError::Timeout { ref operation, timeout_ms: 20 }) if operation == "select_categories"
        ));
    }

    #[tokio::test]
    async fn categories_come_back_sorted() {
        let backend = backend();
        backend.records().add_category("Theatre", None);
        backend.records().add_category("Comedy", Some("Stand-up"));

        let names: Vec<_> = backend
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();

        assert_eq!(names, vec!["Comedy", "Theatre"]);
    }

    #[tokio::test]
    async fn discard_event_deletes_row_and_images() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png", "b.png"])).await.unwrap();

        backend.discard_event(&event).await;

        assert!(backend.records().events().is_empty());
        assert!(backend.storage().object_names().is_empty());
        assert_eq!(backend.records().calls(RecordOperation::DeleteEvent), 1);
    }

    #[tokio::test]
    async fn discard_event_still_removes_images_when_delete_fails() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();
        backend
            .records()
            .fail(RecordOperation::DeleteEvent, RemoteError::Database("locked".into()));

        backend.discard_event(&event).await;

        assert_eq!(backend.records().events().len(), 1);
        assert!(backend.storage().object_names().is_empty());
    }

    #[tokio::test]
    async fn discard_location_deletes_row() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();
        let linked = backend.create_location(&location_draft(), event.id).await.unwrap();

        backend.discard_location(&linked.location).await;

        assert!(backend.records().locations().is_empty());
        assert_eq!(backend.records().calls(RecordOperation::DeleteLocation), 1);
    }

    #[tokio::test]
    async fn create_ticket_keeps_unlimited_as_none() {
        let backend = backend();
        let event = backend.submit_event(draft(&["a.png"])).await.unwrap();
        let ticket = TicketDraft {
            name: "General".to_string(),
            quantity: None,
            per_customer_limit: Some(4),
            display_order: 1,
            description: "Standing room".to_string(),
            price: Money::from_cents(2500),
            early_bird_discount: None,
        };

        let record = backend.create_ticket(&ticket, event.id).await.unwrap();

        assert_eq!(record.event, event.id);
        assert_eq!(record.details.quantity, None);
        assert_eq!(backend.records().tickets().len(), 1);
    }
}
