//! Wizard state.

use crate::config::WizardConfig;
use crate::form::{Form, ValidationContext};
use crate::steps::{EventValues, LocationValues, TicketValues};
use crate::types::{Category, EventRecord, LocationRecord, TicketRecord};
use serde::{Deserialize, Serialize};

/// Where the wizard is
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WizardStep {
    /// Step 1: event details
    #[default]
    Event,
    /// Step 2: location
    Location,
    /// Step 3: tickets
    Tickets,
    /// Finished
    Done,
}

impl WizardStep {
    /// The three form steps, in order
    pub const FORM_STEPS: [Self; 3] = [Self::Event, Self::Location, Self::Tickets];

    /// 1-based position (`Done` is 4)
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Event => 1,
            Self::Location => 2,
            Self::Tickets => 3,
            Self::Done => 4,
        }
    }

    /// Label shown in the step indicator
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Event => "Event Details",
            Self::Location => "Location",
            Self::Tickets => "Ticket",
            Self::Done => "Done",
        }
    }

    /// Metrics label
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Event => "event",
            Self::Location => "location",
            Self::Tickets => "tickets",
            Self::Done => "done",
        }
    }
}

/// One entry of the step indicator
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    /// Step label
    pub label: &'static str,
    /// The wizard is on this step
    pub is_active: bool,
    /// The wizard is past this step
    pub is_completed: bool,
}

/// Everything created by a finished wizard
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WizardSummary {
    /// The event (with its venue linked)
    pub event: EventRecord,
    /// Its location
    pub location: LocationRecord,
    /// Its ticket types, in creation order
    pub tickets: Vec<TicketRecord>,
}

/// State of one wizard session
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WizardState {
    /// Current step
    pub step: WizardStep,
    /// A step's remote action is in flight; its form is locked
    pub submitting: bool,
    /// Id of the latest submission; outcomes carrying another id are stale
    pub submission: u64,
    /// Categories for the event form (empty if loading failed)
    pub categories: Vec<Category>,
    /// Categories were fetched successfully
    pub categories_loaded: bool,
    /// Step 1 form
    pub event_form: Form<EventValues>,
    /// Step 2 form
    pub location_form: Form<LocationValues>,
    /// Step 3 form
    pub ticket_form: Form<TicketValues>,
    /// Result of step 1
    pub created_event: Option<EventRecord>,
    /// Result of step 2
    pub created_location: Option<LocationRecord>,
    /// Results of step 3
    pub created_tickets: Vec<TicketRecord>,
    /// Upper bound on banner images, from configuration
    pub max_banner_images: usize,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(WizardConfig::default().max_banner_images)
    }
}

impl WizardState {
    /// Fresh wizard allowing up to `max_banner_images` banners
    #[must_use]
    pub fn new(max_banner_images: usize) -> Self {
        Self {
            step: WizardStep::Event,
            submitting: false,
            submission: 0,
            categories: Vec::new(),
            categories_loaded: false,
            event_form: Form::default(),
            location_form: Form::default(),
            ticket_form: Form::default(),
            created_event: None,
            created_location: None,
            created_tickets: Vec::new(),
            max_banner_images,
        }
    }

    /// Start over, keeping the loaded categories.
    ///
    /// The submission id moves on so an in-flight outcome stays stale.
    pub fn reset(&mut self) {
        let categories = std::mem::take(&mut self.categories);
        let categories_loaded = self.categories_loaded;
        *self = Self {
            submission: self.submission.wrapping_add(1),
            categories,
            categories_loaded,
            ..Self::new(self.max_banner_images)
        };
    }

    /// Lock the current step and return the id its outcome must carry
    pub fn begin_submission(&mut self) -> u64 {
        self.submitting = true;
        self.submission = self.submission.wrapping_add(1);
        self.submission
    }

    /// The current step is waiting for the outcome of `submission`
    #[must_use]
    pub fn awaits(&self, step: WizardStep, submission: u64) -> bool {
        self.step == step && self.submitting && self.submission == submission
    }

    /// Context the step validators run with
    #[must_use]
    pub fn validation_context(&self) -> ValidationContext<'_> {
        ValidationContext {
            categories: &self.categories,
            max_banner_images: self.max_banner_images,
        }
    }

    /// Event form with the context to validate it
    pub fn event_form_mut(&mut self) -> (&mut Form<EventValues>, ValidationContext<'_>) {
        let ctx = ValidationContext {
            categories: &self.categories,
            max_banner_images: self.max_banner_images,
        };
        (&mut self.event_form, ctx)
    }

    /// Location form with the context to validate it
    pub fn location_form_mut(&mut self) -> (&mut Form<LocationValues>, ValidationContext<'_>) {
        let ctx = ValidationContext {
            categories: &self.categories,
            max_banner_images: self.max_banner_images,
        };
        (&mut self.location_form, ctx)
    }

    /// Ticket form with the context to validate it
    pub fn ticket_form_mut(&mut self) -> (&mut Form<TicketValues>, ValidationContext<'_>) {
        let ctx = ValidationContext {
            categories: &self.categories,
            max_banner_images: self.max_banner_images,
        };
        (&mut self.ticket_form, ctx)
    }

    /// Step indicator for the three form steps
    #[must_use]
    pub fn progress(&self) -> Vec<StepIndicator> {
        WizardStep::FORM_STEPS
            .into_iter()
            .map(|step| StepIndicator {
                label: step.label(),
                is_active: self.step == step,
                is_completed: self.step > step,
            })
            .collect()
    }

    /// What the wizard created, once it is done
    #[must_use]
    pub fn summary(&self) -> Option<WizardSummary> {
        if self.step != WizardStep::Done {
            return None;
        }
        Some(WizardSummary {
            event: self.created_event.clone()?,
            location: self.created_location.clone()?,
            tickets: self.created_tickets.clone(),
        })
    }

    /// Accepts input for `step` right now
    #[must_use]
    pub fn accepts_input(&self, step: WizardStep) -> bool {
        self.step == step && !self.submitting
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::steps::EventField;

    #[test]
    fn reset_moves_the_submission_on() {
        let mut state = WizardState::default();
        let first = state.begin_submission();
        assert!(state.awaits(WizardStep::Event, first));

        state.reset();

        assert!(!state.submitting);
        assert!(!state.awaits(WizardStep::Event, first));
        let second = state.begin_submission();
        assert_ne!(first, second);
        assert!(state.awaits(WizardStep::Event, second));
    }

    #[test]
    fn state_round_trips_through_json() {
        let mut state = WizardState::default();
        let (form, ctx) = state.event_form_mut();
        form.blur(EventField::Name, &ctx);

        let json = serde_json::to_string(&state).unwrap();
        let restored: WizardState = serde_json::from_str(&json).unwrap();

        assert_eq!(restored.submission, state.submission);
        assert!(restored.event_form.is_touched(EventField::Name));
    }
}
