//! Wizard reducer.
//!
//! Drives the three steps. Form edits are pure state changes; every submit
//! hands one remote action to the runtime and waits for its outcome event.
//! Every submit takes a fresh submission id and its outcome carries it back.
//! An outcome whose id is no longer current (the wizard was reset meanwhile)
//! is dropped, and any row it created is discarded.

use crate::error::RemoteError;
use crate::form::Form;
use crate::providers::{ObjectStorage, RecordStore, SessionProvider};
use crate::steps::TicketValues;
use crate::types::{EventRecord, LocationRecord};
use crate::wizard::actions::WizardAction;
use crate::wizard::environment::WizardEnvironment;
use crate::wizard::state::{WizardState, WizardStep};
use event_wizard_core::effect::Effect;
use event_wizard_core::reducer::Reducer;
use event_wizard_core::{SmallVec, async_effect, remote_effect, smallvec};
use std::marker::PhantomData;

type Effects = SmallVec<[Effect<WizardAction>; 4]>;

/// Reducer for the event-creation wizard
pub struct WizardReducer<S, O, R> {
    _phantom: PhantomData<fn() -> (S, O, R)>,
}

impl<S, O, R> WizardReducer<S, O, R> {
    /// Create a new wizard reducer
    #[must_use]
    pub const fn new() -> Self {
        Self {
            _phantom: PhantomData,
        }
    }
}

impl<S, O, R> Default for WizardReducer<S, O, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S, O, R> Clone for WizardReducer<S, O, R> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<S, O, R> std::fmt::Debug for WizardReducer<S, O, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WizardReducer").finish()
    }
}

fn notify_success<S, O, R>(env: &WizardEnvironment<S, O, R>, message: &'static str) -> Effect<WizardAction>
where
    S: SessionProvider + Clone,
    O: ObjectStorage + Clone,
    R: RecordStore + Clone,
{
    let feedback = env.feedback.clone();
    async_effect! {
        feedback.success(message);
        None::<WizardAction>
    }
}

fn notify_error<S, O, R>(
    env: &WizardEnvironment<S, O, R>,
    context: &'static str,
    error: RemoteError,
) -> Effect<WizardAction>
where
    S: SessionProvider + Clone,
    O: ObjectStorage + Clone,
    R: RecordStore + Clone,
{
    let feedback = env.feedback.clone();
    async_effect! {
        feedback.error(context, &error);
        None::<WizardAction>
    }
}

fn notify_reject<S, O, R>(env: &WizardEnvironment<S, O, R>, message: &'static str) -> Effect<WizardAction>
where
    S: SessionProvider + Clone,
    O: ObjectStorage + Clone,
    R: RecordStore + Clone,
{
    let feedback = env.feedback.clone();
    async_effect! {
        feedback.reject(message);
        None::<WizardAction>
    }
}

fn step_completed(step: WizardStep) {
    metrics::counter!("wizard.step.completed", "step" => step.as_str()).increment(1);
}

fn step_failed(step: WizardStep, error: &RemoteError) {
    metrics::counter!(
        "wizard.step.failed",
        "step" => step.as_str(),
        "reason" => error.kind(),
    )
    .increment(1);
}

fn outcome_dropped(step: WizardStep) {
    metrics::counter!("wizard.outcome.stale", "step" => step.as_str()).increment(1);
}

impl<S, O, R> WizardReducer<S, O, R>
where
    S: SessionProvider + Clone + 'static,
    O: ObjectStorage + Clone + 'static,
    R: RecordStore + Clone + 'static,
{
    fn load_categories(state: &WizardState, env: &WizardEnvironment<S, O, R>) -> Effects {
        if state.categories_loaded {
            tracing::debug!("Categories already loaded");
            return SmallVec::new();
        }

        let backend = env.backend.clone();
        smallvec![remote_effect! {
            call: backend.list_categories(),
            on_success: |categories| Some(WizardAction::CategoriesLoaded { categories }),
            on_error: |error| Some(WizardAction::CategoriesFailed { error })
        }]
    }

    fn submit_event(state: &mut WizardState, env: &WizardEnvironment<S, O, R>) -> Effects {
        if !state.accepts_input(WizardStep::Event) {
            tracing::debug!(step = ?state.step, "Event step is not accepting input");
            return SmallVec::new();
        }

        let (form, ctx) = state.event_form_mut();
        let Some(draft) = form.submit(&ctx) else {
            tracing::debug!(errors = form.errors().len(), "Event form is invalid");
            return SmallVec::new();
        };

        let submission = state.begin_submission();
        let backend = env.backend.clone();
        smallvec![remote_effect! {
            call: backend.submit_event(draft),
            on_success: |event| Some(WizardAction::EventCreated { submission, event }),
            on_error: |error| Some(WizardAction::EventCreationFailed { submission, error })
        }]
    }

    fn submit_location(state: &mut WizardState, env: &WizardEnvironment<S, O, R>) -> Effects {
        if !state.accepts_input(WizardStep::Location) {
            tracing::debug!(step = ?state.step, "Location step is not accepting input");
            return SmallVec::new();
        }
        let Some(event_id) = state.created_event.as_ref().map(|event| event.id) else {
            tracing::error!("Location step reached without an event");
            return SmallVec::new();
        };

        let (form, ctx) = state.location_form_mut();
        let Some(draft) = form.submit(&ctx) else {
            tracing::debug!(errors = form.errors().len(), "Location form is invalid");
            return SmallVec::new();
        };

        let submission = state.begin_submission();
        let backend = env.backend.clone();
        smallvec![remote_effect! {
            call: backend.create_location(&draft, event_id),
            on_success: |linked| Some(WizardAction::LocationCreated { submission, linked }),
            on_error: |error| Some(WizardAction::LocationCreationFailed { submission, error })
        }]
    }

    fn submit_ticket(state: &mut WizardState, env: &WizardEnvironment<S, O, R>) -> Effects {
        if !state.accepts_input(WizardStep::Tickets) {
            tracing::debug!(step = ?state.step, "Ticket step is not accepting input");
            return SmallVec::new();
        }
        let Some(event_id) = state.created_event.as_ref().map(|event| event.id) else {
            tracing::error!("Ticket step reached without an event");
            return SmallVec::new();
        };

        let (form, ctx) = state.ticket_form_mut();
        let Some(draft) = form.submit(&ctx) else {
            tracing::debug!(errors = form.errors().len(), "Ticket form is invalid");
            return SmallVec::new();
        };

        let submission = state.begin_submission();
        let backend = env.backend.clone();
        smallvec![remote_effect! {
            call: backend.create_ticket(&draft, event_id),
            on_success: |ticket| Some(WizardAction::TicketCreated { submission, ticket }),
            on_error: |error| Some(WizardAction::TicketCreationFailed { submission, error })
        }]
    }

    /// Delete an event created for a submission nobody waits for
    fn discard_event(event: EventRecord, env: &WizardEnvironment<S, O, R>) -> Effects {
        tracing::warn!(event_id = %event.id, "Discarding event from a stale submission");
        outcome_dropped(WizardStep::Event);
        let backend = env.backend.clone();
        smallvec![async_effect! {
            backend.discard_event(&event).await;
            None::<WizardAction>
        }]
    }

    /// Delete a location created for a submission nobody waits for
    fn discard_location(location: LocationRecord, env: &WizardEnvironment<S, O, R>) -> Effects {
        tracing::warn!(location_id = %location.id, "Discarding location from a stale submission");
        outcome_dropped(WizardStep::Location);
        let backend = env.backend.clone();
        smallvec![async_effect! {
            backend.discard_location(&location).await;
            None::<WizardAction>
        }]
    }

    fn finish(state: &mut WizardState, env: &WizardEnvironment<S, O, R>) -> Effects {
        if !state.accepts_input(WizardStep::Tickets) {
            tracing::debug!(step = ?state.step, submitting = state.submitting, "Cannot finish now");
            return SmallVec::new();
        }
        if state.created_tickets.is_empty() {
            return smallvec![notify_reject(env, "Add at least one ticket before finishing")];
        }

        state.step = WizardStep::Done;
        step_completed(WizardStep::Tickets);
        tracing::info!(
            event_id = ?state.created_event.as_ref().map(|event| event.id),
            tickets = state.created_tickets.len(),
            "Wizard finished"
        );
        smallvec![notify_success(env, "Your event is ready")]
    }
}

impl<S, O, R> Reducer for WizardReducer<S, O, R>
where
    S: SessionProvider + Clone + 'static,
    O: ObjectStorage + Clone + 'static,
    R: RecordStore + Clone + 'static,
{
    type State = WizardState;
    type Action = WizardAction;
    type Environment = WizardEnvironment<S, O, R>;

    #[allow(clippy::too_many_lines)] // one arm per action
    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::trace!(action = action.name(), step = ?state.step, "Reducing");

        match action {
            WizardAction::LoadCategories => Self::load_categories(state, env),

            WizardAction::CategoriesLoaded { categories } => {
                tracing::debug!(count = categories.len(), "Categories loaded");
                state.categories = categories;
                state.categories_loaded = true;
                // The category rule depends on the list.
                let (form, ctx) = state.event_form_mut();
                let _ = form.validate(&ctx);
                SmallVec::new()
            },

            WizardAction::CategoriesFailed { error } => {
                state.categories.clear();
                state.categories_loaded = false;
                smallvec![notify_error(env, "Could not load categories", error)]
            },

            WizardAction::EditEvent(edit) => {
                if state.accepts_input(WizardStep::Event) {
                    let (form, ctx) = state.event_form_mut();
                    form.edit(|values| edit.apply(values), &ctx);
                }
                SmallVec::new()
            },

            WizardAction::BlurEvent(field) => {
                if state.accepts_input(WizardStep::Event) {
                    let (form, ctx) = state.event_form_mut();
                    form.blur(field, &ctx);
                }
                SmallVec::new()
            },

            WizardAction::SubmitEventStep => Self::submit_event(state, env),

            WizardAction::EventCreated { submission, event } => {
                if !state.awaits(WizardStep::Event, submission) {
                    if state.created_event.as_ref().is_some_and(|current| current.id == event.id) {
                        return SmallVec::new();
                    }
                    return Self::discard_event(event, env);
                }
                tracing::info!(event_id = %event.id, "Event created");
                state.submitting = false;
                state.created_event = Some(event);
                state.step = WizardStep::Location;
                step_completed(WizardStep::Event);
                smallvec![notify_success(env, "Event created successfully")]
            },

            WizardAction::EventCreationFailed { submission, error } => {
                if !state.awaits(WizardStep::Event, submission) {
                    tracing::warn!(%error, "Ignoring stale event failure");
                    return SmallVec::new();
                }
                state.submitting = false;
                step_failed(WizardStep::Event, &error);
                smallvec![notify_error(env, "Failed to create event", error)]
            },

            WizardAction::EditLocation(edit) => {
                if state.accepts_input(WizardStep::Location) {
                    let (form, ctx) = state.location_form_mut();
                    form.edit(|values| edit.apply(values), &ctx);
                }
                SmallVec::new()
            },

            WizardAction::BlurLocation(field) => {
                if state.accepts_input(WizardStep::Location) {
                    let (form, ctx) = state.location_form_mut();
                    form.blur(field, &ctx);
                }
                SmallVec::new()
            },

            WizardAction::SubmitLocationStep => Self::submit_location(state, env),

            WizardAction::LocationCreated { submission, linked } => {
                if !state.awaits(WizardStep::Location, submission) {
                    if state
                        .created_location
                        .as_ref()
                        .is_some_and(|current| current.id == linked.location.id)
                    {
                        return SmallVec::new();
                    }
                    return Self::discard_location(linked.location, env);
                }
                tracing::info!(
                    location_id = %linked.location.id,
                    event_id = %linked.event.id,
                    "Location created and linked"
                );
                state.submitting = false;
                state.created_event = Some(linked.event);
                state.created_location = Some(linked.location);
                state.step = WizardStep::Tickets;
                step_completed(WizardStep::Location);
                smallvec![notify_success(env, "Location saved successfully")]
            },

            WizardAction::LocationCreationFailed { submission, error } => {
                if !state.awaits(WizardStep::Location, submission) {
                    tracing::warn!(%error, "Ignoring stale location failure");
                    return SmallVec::new();
                }
                state.submitting = false;
                step_failed(WizardStep::Location, &error);
                smallvec![notify_error(env, "Failed to save location", error)]
            },

            WizardAction::EditTicket(edit) => {
                if state.accepts_input(WizardStep::Tickets) {
                    let (form, ctx) = state.ticket_form_mut();
                    form.edit(|values| edit.apply(values), &ctx);
                }
                SmallVec::new()
            },

            WizardAction::BlurTicket(field) => {
                if state.accepts_input(WizardStep::Tickets) {
                    let (form, ctx) = state.ticket_form_mut();
                    form.blur(field, &ctx);
                }
                SmallVec::new()
            },

            WizardAction::SubmitTicket => Self::submit_ticket(state, env),

            WizardAction::TicketCreated { submission, ticket } => {
                if !state.awaits(WizardStep::Tickets, submission) {
                    // Its event was left behind by the reset as well.
                    tracing::error!(
                        ticket_id = %ticket.id,
                        event_id = %ticket.event,
                        "Orphaned ticket row from a stale submission"
                    );
                    outcome_dropped(WizardStep::Tickets);
                    return SmallVec::new();
                }
                tracing::info!(ticket_id = %ticket.id, name = %ticket.details.name, "Ticket created");
                state.submitting = false;
                state.created_tickets.push(ticket);
                state.ticket_form = Form::new(TicketValues::for_order(state.created_tickets.len() + 1));
                metrics::counter!("wizard.tickets.created").increment(1);
                smallvec![notify_success(env, "Ticket created successfully")]
            },

            WizardAction::TicketCreationFailed { submission, error } => {
                if !state.awaits(WizardStep::Tickets, submission) {
                    tracing::warn!(%error, "Ignoring stale ticket failure");
                    return SmallVec::new();
                }
                state.submitting = false;
                step_failed(WizardStep::Tickets, &error);
                smallvec![notify_error(env, "Failed to create ticket", error)]
            },

            WizardAction::Finish => Self::finish(state, env),

            WizardAction::Reset => {
                if state.submitting {
                    tracing::warn!(
                        step = ?state.step,
                        submission = state.submission,
                        "Reset while a step was in flight, its outcome will be discarded"
                    );
                }
                state.reset();
                SmallVec::new()
            },
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::config::WizardConfig;
    use crate::feedback::NotificationLevel;
    use crate::mocks::{InMemoryObjectStorage, InMemoryRecordStore, RecordOperation, StaticSession};
    use crate::remote::LinkedLocation;
    use crate::steps::{EventEdit, EventField, LocationEdit, TicketEdit};
    use crate::types::{
        CategoryId, EventDuration, EventId, EventRecord, ImageUpload, LocationDraft, LocationId,
        LocationRecord, Money, TicketDraft, TicketId, TicketRecord, UserId, end_time,
    };
    use chrono::{NaiveDate, NaiveTime};
    use event_wizard_core::environment::Clock;
    use event_wizard_testing::{ReducerTest, assertions, resolve_effects, test_clock};
    use std::sync::Arc;

    type TestReducer = WizardReducer<StaticSession, InMemoryObjectStorage, InMemoryRecordStore>;
    type TestEnv = WizardEnvironment<StaticSession, InMemoryObjectStorage, InMemoryRecordStore>;

    fn env() -> TestEnv {
        let clock: Arc<dyn Clock> = Arc::new(test_clock());
        WizardEnvironment::new(
            StaticSession::signed_in(UserId::new()),
            InMemoryObjectStorage::new("event-images"),
            InMemoryRecordStore::new(Arc::clone(&clock)),
            clock,
            WizardConfig::default(),
        )
    }

    fn event_edits() -> Vec<WizardAction> {
        vec![
            WizardAction::EditEvent(EventEdit::Name("Rooftop Jazz".to_string())),
            WizardAction::EditEvent(EventEdit::Category(CategoryId::new().to_string())),
            WizardAction::EditEvent(EventEdit::Date("2025-06-01".to_string())),
            WizardAction::EditEvent(EventEdit::Time("19:30".to_string())),
            WizardAction::EditEvent(EventEdit::Description("Live quartet".to_string())),
            WizardAction::EditEvent(EventEdit::AddImages(vec![ImageUpload::new(
                "a.png",
                "image/png",
                vec![1, 2, 3],
            )])),
        ]
    }

    fn event_record() -> EventRecord {
        let date = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let start_time = NaiveTime::from_hms_opt(19, 30, 0).unwrap();
        EventRecord {
            id: EventId::new(),
            title: "Rooftop Jazz".to_string(),
            description: "Live quartet".to_string(),
            date,
            start_time,
            duration: EventDuration::OneHour,
            end_time: end_time(date, start_time, EventDuration::OneHour),
            category: CategoryId::new(),
            image_urls: vec!["memory://event-images/a.png".to_string()],
            organizer: UserId::new(),
            venue: None,
            created_at: test_clock().now(),
        }
    }

    fn on_step(step: WizardStep) -> WizardState {
        let mut state = WizardState::default();
        state.step = step;
        if step > WizardStep::Event {
            state.created_event = Some(event_record());
        }
        state
    }

    fn ticket_record(event: EventId) -> TicketRecord {
        TicketRecord {
            id: TicketId::new(),
            event,
            details: TicketDraft {
                name: "General Admission".to_string(),
                quantity: None,
                per_customer_limit: Some(4),
                display_order: 1,
                description: "Standing room".to_string(),
                price: Money::from_cents(2500),
                early_bird_discount: None,
            },
        }
    }

    #[test]
    fn invalid_event_submit_touches_fields_without_effects() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(WizardState::default())
            .when_action(WizardAction::SubmitEventStep)
            .then_state(|state| {
                assert!(!state.submitting);
                assert_eq!(state.step, WizardStep::Event);
                assert_eq!(
                    state.event_form.error(EventField::Name),
                    Some("Event name is required")
                );
                assert_eq!(
                    state.event_form.error(EventField::Images),
                    Some("At least one image is required")
                );
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn valid_event_submit_locks_the_form() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(WizardState::default())
            .given_actions(event_edits())
            .when_action(WizardAction::SubmitEventStep)
            .then_state(|state| {
                assert!(state.submitting);
                assert!(state.event_form.visible_errors().is_empty());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn edits_are_ignored_while_submitting() {
        let mut state = WizardState::default();
        state.submitting = true;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EditEvent(EventEdit::Name("Changed".to_string())))
            .then_state(|state| assert_eq!(state.event_form.values().name, ""))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn event_created_moves_to_location() {
        let mut state = WizardState::default();
        let submission = state.begin_submission();
        let event = event_record();
        let expected = event.id;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreated { submission, event })
            .then_state(move |state| {
                assert_eq!(state.step, WizardStep::Location);
                assert!(!state.submitting);
                assert_eq!(state.created_event.as_ref().map(|e| e.id), Some(expected));
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn stale_event_created_is_discarded() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(WizardState::default())
            .when_action(WizardAction::EventCreated {
                submission: 0,
                event: event_record(),
            })
            .then_state(|state| {
                assert_eq!(state.step, WizardStep::Event);
                assert!(state.created_event.is_none());
            })
            .then_effects(|effects| {
                assertions::assert_effects_count(effects, 1);
                assertions::assert_has_future_effect(effects);
            })
            .run();
    }

    #[test]
    fn event_created_for_an_older_submission_is_discarded() {
        let mut state = WizardState::default();
        let old = state.begin_submission();
        state.reset();
        let _current = state.begin_submission();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreated {
                submission: old,
                event: event_record(),
            })
            .then_state(|state| {
                assert!(state.submitting);
                assert_eq!(state.step, WizardStep::Event);
                assert!(state.created_event.is_none());
            })
            .then_effects(assertions::assert_has_future_effect)
            .run();
    }

    #[test]
    fn failure_for_an_older_submission_keeps_the_form_locked() {
        let mut state = WizardState::default();
        let old = state.begin_submission();
        state.reset();
        let _current = state.begin_submission();

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreationFailed {
                submission: old,
                error: RemoteError::Database("down".to_string()),
            })
            .then_state(|state| assert!(state.submitting))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn stale_ticket_created_is_dropped() {
        let state = on_step(WizardStep::Tickets);
        let event = state.created_event.as_ref().unwrap().id;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::TicketCreated {
                submission: 7,
                ticket: ticket_record(event),
            })
            .then_state(|state| assert!(state.created_tickets.is_empty()))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn event_failure_keeps_values() {
        let mut state = WizardState::default();
        let submission = state.begin_submission();
        let (form, ctx) = state.event_form_mut();
        form.edit(|values| values.name = "Rooftop Jazz".to_string(), &ctx);

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::EventCreationFailed {
                submission,
                error: RemoteError::Storage("bucket full".to_string()),
            })
            .then_state(|state| {
                assert_eq!(state.step, WizardStep::Event);
                assert!(!state.submitting);
                assert_eq!(state.event_form.values().name, "Rooftop Jazz");
            })
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn location_created_links_event_and_moves_to_tickets() {
        let mut state = on_step(WizardStep::Location);
        let submission = state.begin_submission();
        let mut event = state.created_event.clone().unwrap();
        let location = LocationRecord {
            id: LocationId::new(),
            event: event.id,
            details: LocationDraft {
                venue: "Blue Room".to_string(),
                address_line_1: "12 Main St".to_string(),
                address_line_2: None,
                city: "Austin".to_string(),
                state: "TX".to_string(),
                country: "US".to_string(),
                postal_code: "78701".to_string(),
                capacity: None,
                latitude: None,
                longitude: None,
            },
        };
        event.venue = Some(location.id);
        let venue = location.id;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::LocationCreated {
                submission,
                linked: LinkedLocation { location, event },
            })
            .then_state(move |state| {
                assert_eq!(state.step, WizardStep::Tickets);
                assert_eq!(state.created_event.as_ref().unwrap().venue, Some(venue));
                assert_eq!(state.created_location.as_ref().unwrap().id, venue);
            })
            .run();
    }

    #[test]
    fn location_edits_are_ignored_on_other_steps() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(WizardState::default())
            .when_action(WizardAction::EditLocation(LocationEdit::City("Austin".to_string())))
            .then_state(|state| assert_eq!(state.location_form.values().city, ""))
            .run();
    }

    #[test]
    fn ticket_created_stays_on_tickets_with_fresh_form() {
        let mut state = on_step(WizardStep::Tickets);
        let submission = state.begin_submission();
        let event = state.created_event.as_ref().unwrap().id;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::TicketCreated {
                submission,
                ticket: ticket_record(event),
            })
            .then_state(|state| {
                assert_eq!(state.step, WizardStep::Tickets);
                assert_eq!(state.created_tickets.len(), 1);
                assert_eq!(state.ticket_form.values().display_order, "2");
                assert_eq!(state.ticket_form.values().name, "");
            })
            .run();
    }

    #[test]
    fn finish_without_tickets_is_rejected() {
        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(on_step(WizardStep::Tickets))
            .when_action(WizardAction::Finish)
            .then_state(|state| assert_eq!(state.step, WizardStep::Tickets))
            .then_effects(|effects| assertions::assert_effects_count(effects, 1))
            .run();
    }

    #[test]
    fn finish_with_a_ticket_is_done() {
        let mut state = on_step(WizardStep::Tickets);
        let event = state.created_event.as_ref().unwrap().id;
        state.created_tickets.push(ticket_record(event));

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::Finish)
            .then_state(|state| {
                assert_eq!(state.step, WizardStep::Done);
                assert!(state.progress().iter().all(|step| step.is_completed));
            })
            .run();
    }

    #[test]
    fn reset_returns_to_step_one_keeping_categories() {
        let mut state = on_step(WizardStep::Tickets);
        state.categories_loaded = true;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::Reset)
            .then_state(|state| {
                assert_eq!(state.step, WizardStep::Event);
                assert!(state.created_event.is_none());
                assert!(state.categories_loaded);
            })
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn load_categories_is_skipped_once_loaded() {
        let mut state = WizardState::default();
        state.categories_loaded = true;

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(state)
            .when_action(WizardAction::LoadCategories)
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn unknown_category_is_flagged_once_categories_load() {
        let category = crate::types::Category {
            id: CategoryId::new(),
            name: "Music".to_string(),
            description: None,
            parent: None,
            created_at: test_clock().now(),
        };

        ReducerTest::new(TestReducer::new())
            .with_env(env())
            .given_state(WizardState::default())
            .given_actions(event_edits())
            .given_actions([WizardAction::BlurEvent(EventField::Category)])
            .when_action(WizardAction::CategoriesLoaded {
                categories: vec![category],
            })
            .then_state(|state| {
                assert!(state.categories_loaded);
                assert_eq!(
                    state.event_form.error(EventField::Category),
                    Some("Select a category from the list")
                );
            })
            .run();
    }

    #[tokio::test]
    async fn submit_event_effect_resolves_to_created_event() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = WizardState::default();
        for action in event_edits() {
            let _ = reducer.reduce(&mut state, action, &env);
        }

        let effects = reducer.reduce(&mut state, WizardAction::SubmitEventStep, &env);
        let actions = resolve_effects(effects.into_vec()).await;

        assert_eq!(actions.len(), 1);
        let WizardAction::EventCreated { submission, event } = &actions[0] else {
            panic!("expected EventCreated, got {actions:?}");
        };
        assert_eq!(event.title, "Rooftop Jazz");
        assert_eq!(*submission, state.submission);
        assert_eq!(env.backend.records().calls(RecordOperation::InsertEvent), 1);
    }

    #[tokio::test]
    async fn failure_effect_publishes_notification() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = WizardState::default();
        let submission = state.begin_submission();

        let effects = reducer.reduce(
            &mut state,
            WizardAction::EventCreationFailed {
                submission,
                error: RemoteError::Unauthenticated,
            },
            &env,
        );
        let actions = resolve_effects(effects.into_vec()).await;

        assert!(actions.is_empty());
        let last = env.feedback.last().unwrap();
        assert_eq!(last.level, NotificationLevel::Error);
        assert!(last.message.starts_with("Failed to create event"));
    }

    #[tokio::test]
    async fn stale_event_outcome_deletes_the_row_and_its_images() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = WizardState::default();
        for action in event_edits() {
            let _ = reducer.reduce(&mut state, action, &env);
        }

        let effects = reducer.reduce(&mut state, WizardAction::SubmitEventStep, &env);
        let _ = reducer.reduce(&mut state, WizardAction::Reset, &env);
        let outcome = resolve_effects(effects.into_vec()).await;
        assert_eq!(env.backend.records().events().len(), 1);

        let effects = reducer.reduce(&mut state, outcome.into_iter().next().unwrap(), &env);
        let actions = resolve_effects(effects.into_vec()).await;

        assert!(actions.is_empty());
        assert!(state.created_event.is_none());
        assert!(env.backend.records().events().is_empty());
        assert!(env.backend.storage().object_names().is_empty());
        assert_eq!(env.backend.records().calls(RecordOperation::DeleteEvent), 1);
    }

    #[tokio::test]
    async fn unlimited_ticket_is_submitted_without_quantity() {
        let env = env();
        let reducer = TestReducer::new();
        let mut state = on_step(WizardStep::Tickets);
        let event_id = state.created_event.as_ref().unwrap().id;
        env.backend.records().seed_event(state.created_event.clone().unwrap());

        for edit in [
            TicketEdit::Name("General Admission".to_string()),
            TicketEdit::Quantity("500".to_string()),
            TicketEdit::PerCustomerLimit("4".to_string()),
            TicketEdit::Description("Standing room".to_string()),
            TicketEdit::Price("25.00".to_string()),
        ] {
            let _ = reducer.reduce(&mut state, WizardAction::EditTicket(edit), &env);
        }

        let effects = reducer.reduce(&mut state, WizardAction::SubmitTicket, &env);
        let actions = resolve_effects(effects.into_vec()).await;

        let WizardAction::TicketCreated { ticket, .. } = &actions[0] else {
            panic!("expected TicketCreated, got {actions:?}");
        };
        assert_eq!(ticket.event, event_id);
        assert_eq!(ticket.details.quantity, None);
        assert_eq!(ticket.details.per_customer_limit, Some(4));
        assert_eq!(ticket.details.early_bird_discount, None);
    }
}
