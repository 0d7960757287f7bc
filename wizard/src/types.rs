//! Domain types for the event wizard.
//!
//! Records as stored by the backend, the validated drafts each step submits,
//! and the small value objects (money, duration, time slots) the forms parse.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

// ============================================================================
// Identifiers
// ============================================================================

macro_rules! record_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            #[doc = concat!("Creates a new random `", stringify!($name), "`")]
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[doc = concat!("Create a `", stringify!($name), "` from a `Uuid`")]
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Get the inner UUID
            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

record_id!(
    /// Identifier of an event row
    EventId
);
record_id!(
    /// Identifier of a location row
    LocationId
);
record_id!(
    /// Identifier of a ticket row
    TicketId
);
record_id!(
    /// Identifier of a category row
    CategoryId
);
record_id!(
    /// Identifier of a signed-in user (event organizer)
    UserId
);

// ============================================================================
// Money Value Object (cents-based to avoid floating point errors)
// ============================================================================

/// Represents money in cents to avoid floating-point arithmetic errors
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Money(u64);

/// Why a price string was rejected
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ParseMoneyError {
    /// Nothing entered
    #[error("amount is empty")]
    Empty,
    /// Not a non-negative decimal number
    #[error("amount must be a non-negative number")]
    Invalid,
    /// More than two digits after the decimal point
    #[error("amount can have at most two decimal places")]
    TooPrecise,
    /// Does not fit in cents
    #[error("amount is too large")]
    Overflow,
}

impl Money {
    /// Creates a `Money` value from cents
    #[must_use]
    pub const fn from_cents(cents: u64) -> Self {
        Self(cents)
    }

    /// Returns the amount in cents
    #[must_use]
    pub const fn cents(&self) -> u64 {
        self.0
    }

    /// Returns the amount in dollars (rounded down)
    #[must_use]
    pub const fn dollars(&self) -> u64 {
        self.0 / 100
    }

    /// Checks if the amount is zero
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }
}

impl FromStr for Money {
    type Err = ParseMoneyError;

    /// Parses `"12"`, `"12.5"`, or `"12.50"` into cents.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ParseMoneyError::Empty);
        }

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if whole.is_empty() || !all_digits(whole) || !all_digits(fraction) {
            return Err(ParseMoneyError::Invalid);
        }
        if s.ends_with('.') {
            return Err(ParseMoneyError::Invalid);
        }
        if fraction.len() > 2 {
            return Err(ParseMoneyError::TooPrecise);
        }

        let whole: u64 = whole.parse().map_err(|_| ParseMoneyError::Overflow)?;
        let cents = match fraction.len() {
            0 => 0,
            1 => fraction.parse::<u64>().map_err(|_| ParseMoneyError::Invalid)? * 10,
            _ => fraction.parse::<u64>().map_err(|_| ParseMoneyError::Invalid)?,
        };

        whole
            .checked_mul(100)
            .and_then(|c| c.checked_add(cents))
            .map(Self)
            .ok_or(ParseMoneyError::Overflow)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}.{:02}", self.0 / 100, self.0 % 100)
    }
}

// ============================================================================
// Event timing
// ============================================================================

/// Length of an event, from the fixed set the form offers
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventDuration {
    /// 30 minutes
    #[serde(rename = "30m")]
    ThirtyMinutes,
    /// 1 hour
    #[default]
    #[serde(rename = "1h")]
    OneHour,
    /// 2 hours
    #[serde(rename = "2h")]
    TwoHours,
    /// 3 hours
    #[serde(rename = "3h")]
    ThreeHours,
}

impl EventDuration {
    /// Every selectable duration, shortest first
    pub const ALL: [Self; 4] = [
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
        Self::ThreeHours,
    ];

    /// Form value (`30m`, `1h`, `2h`, `3h`)
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::TwoHours => "2h",
            Self::ThreeHours => "3h",
        }
    }

    /// Length in minutes
    #[must_use]
    pub const fn minutes(self) -> i64 {
        match self {
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::TwoHours => 120,
            Self::ThreeHours => 180,
        }
    }
}

/// Unknown duration string
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown duration `{0}`")]
pub struct ParseDurationError(pub String);

impl FromStr for EventDuration {
    type Err = ParseDurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| ParseDurationError(s.to_string()))
    }
}

impl fmt::Display for EventDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Minutes between selectable start times
pub const TIME_SLOT_MINUTES: u32 = 15;

/// Every selectable start time of a day (`00:00` to `23:45`)
#[must_use]
pub fn time_slots() -> Vec<NaiveTime> {
    (0..24 * 60 / TIME_SLOT_MINUTES)
        .filter_map(|slot| {
            let minutes = slot * TIME_SLOT_MINUTES;
            NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0)
        })
        .collect()
}

/// Parse an `HH:MM` start time that falls on the slot grid
#[must_use]
pub fn parse_time_slot(s: &str) -> Option<NaiveTime> {
    let s = s.trim();
    if s.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .ok()
        .filter(|t| t.minute() % TIME_SLOT_MINUTES == 0)
}

/// When an event starting at `date`/`start` ends
#[must_use]
pub fn end_time(date: NaiveDate, start: NaiveTime, duration: EventDuration) -> NaiveDateTime {
    date.and_time(start) + chrono::Duration::minutes(duration.minutes())
}

// ============================================================================
// Records
// ============================================================================

/// Event category (read-only reference data)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// Category id
    pub id: CategoryId,
    /// Display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Parent category, for nested categories
    pub parent: Option<CategoryId>,
    /// When the row was created
    pub created_at: DateTime<Utc>,
}

/// Banner image picked in the event form
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageUpload {
    /// Original file name
    pub file_name: String,
    /// MIME type
    pub content_type: String,
    /// File contents
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Build an upload from its parts
    #[must_use]
    pub fn new(file_name: impl Into<String>, content_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }
}

impl fmt::Debug for ImageUpload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageUpload")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Validated output of the event step, before images are uploaded
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventDraft {
    /// Event name
    pub title: String,
    /// Event description
    pub description: String,
    /// Event date
    pub date: NaiveDate,
    /// Start time (on the slot grid)
    pub start_time: NaiveTime,
    /// Event length
    pub duration: EventDuration,
    /// Selected category
    pub category: CategoryId,
    /// Banner images, in display order
    pub images: Vec<ImageUpload>,
}

/// Row inserted into the events table
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewEvent {
    /// Event name
    pub title: String,
    /// Event description
    pub description: String,
    /// Event date
    pub date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// Event length
    pub duration: EventDuration,
    /// Derived from date, start time, and duration
    pub end_time: NaiveDateTime,
    /// Selected category
    pub category: CategoryId,
    /// Public URLs of the uploaded banners
    pub image_urls: Vec<String>,
    /// Signed-in user creating the event
    pub organizer: UserId,
}

impl NewEvent {
    /// Combine a draft with its uploaded image URLs and organizer
    #[must_use]
    pub fn from_draft(draft: &EventDraft, image_urls: Vec<String>, organizer: UserId) -> Self {
        Self {
            title: draft.title.clone(),
            description: draft.description.clone(),
            date: draft.date,
            start_time: draft.start_time,
            duration: draft.duration,
            end_time: end_time(draft.date, draft.start_time, draft.duration),
            category: draft.category,
            image_urls,
            organizer,
        }
    }
}

/// Event row as stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Event id
    pub id: EventId,
    /// Event name
    pub title: String,
    /// Event description
    pub description: String,
    /// Event date
    pub date: NaiveDate,
    /// Start time
    pub start_time: NaiveTime,
    /// Event length
    pub duration: EventDuration,
    /// When the event ends
    pub end_time: NaiveDateTime,
    /// Category reference
    pub category: CategoryId,
    /// Banner URLs
    pub image_urls: Vec<String>,
    /// Organizer reference
    pub organizer: UserId,
    /// Location reference, set by the link-back after step 2
    pub venue: Option<LocationId>,
    /// When the row was created
    pub created_at: DateTime<Utc>,
}

/// Partial update of an event row
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventPatch {
    /// New venue reference
    pub venue: Option<LocationId>,
}

/// Validated output of the location step
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationDraft {
    /// Venue name
    pub venue: String,
    /// Street address
    pub address_line_1: String,
    /// Apartment, suite, etc.
    pub address_line_2: Option<String>,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
    /// Country
    pub country: String,
    /// Postal code
    pub postal_code: String,
    /// Venue capacity, if known
    pub capacity: Option<u32>,
    /// Latitude in degrees
    pub latitude: Option<f64>,
    /// Longitude in degrees
    pub longitude: Option<f64>,
}

/// Location row as stored
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    /// Location id
    pub id: LocationId,
    /// Owning event
    pub event: EventId,
    /// Address and venue details
    #[serde(flatten)]
    pub details: LocationDraft,
}

/// Validated output of the ticket step
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketDraft {
    /// Ticket type name
    pub name: String,
    /// Total available; `None` means unlimited
    pub quantity: Option<u32>,
    /// Limit per customer; `None` means unlimited
    pub per_customer_limit: Option<u32>,
    /// Position in the ticket list
    pub display_order: u32,
    /// Ticket description
    pub description: String,
    /// Price per ticket
    pub price: Money,
    /// Early-bird discount percentage, only when offered
    pub early_bird_discount: Option<u8>,
}

/// Ticket row as stored
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketRecord {
    /// Ticket id
    pub id: TicketId,
    /// Owning event
    pub event: EventId,
    /// Ticket details
    #[serde(flatten)]
    pub details: TicketDraft,
}

/// Address picked in the geocoding widget
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuredAddress {
    /// Street number
    pub street_number: Option<String>,
    /// Street name
    pub route: Option<String>,
    /// City
    pub locality: Option<String>,
    /// State or province
    pub administrative_area: Option<String>,
    /// Country
    pub country: Option<String>,
    /// Postal code
    pub postal_code: Option<String>,
    /// Full human-readable address
    pub formatted: String,
    /// Latitude in degrees
    pub latitude: f64,
    /// Longitude in degrees
    pub longitude: f64,
}
