//! Step 1: event details and banner images.

use crate::form::{FieldErrors, FormValues, ValidationContext};
use crate::types::{CategoryId, EventDraft, EventDuration, ImageUpload, parse_time_slot};
use crate::validation::required;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Fields of the event form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EventField {
    /// Event name
    Name,
    /// Category select
    Category,
    /// Date (`YYYY-MM-DD`)
    Date,
    /// Start time (`HH:MM`)
    Time,
    /// Duration select
    Duration,
    /// Description
    Description,
    /// Banner images
    Images,
}

/// Raw input of the event form
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventValues {
    /// Event name
    pub name: String,
    /// Selected category id
    pub category: String,
    /// Date text
    pub date: String,
    /// Start time text
    pub time: String,
    /// Duration value
    pub duration: String,
    /// Description
    pub description: String,
    /// Picked banner images
    pub images: Vec<ImageUpload>,
}

impl Default for EventValues {
    fn default() -> Self {
        Self {
            name: String::new(),
            category: String::new(),
            date: String::new(),
            time: String::new(),
            duration: EventDuration::default().as_str().to_string(),
            description: String::new(),
            images: Vec::new(),
        }
    }
}

/// A change to the event form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EventEdit {
    /// Set the name
    Name(String),
    /// Select a category
    Category(String),
    /// Set the date
    Date(String),
    /// Set the start time
    Time(String),
    /// Select a duration
    Duration(String),
    /// Set the description
    Description(String),
    /// Append picked images
    AddImages(Vec<ImageUpload>),
    /// Remove the image at an index; out-of-range indexes are ignored
    RemoveImage(usize),
}

impl EventEdit {
    /// Apply this change
    pub fn apply(self, values: &mut EventValues) {
        match self {
            Self::Name(name) => values.name = name,
            Self::Category(category) => values.category = category,
            Self::Date(date) => values.date = date,
            Self::Time(time) => values.time = time,
            Self::Duration(duration) => values.duration = duration,
            Self::Description(description) => values.description = description,
            Self::AddImages(images) => values.images.extend(images),
            Self::RemoveImage(index) => {
                if index < values.images.len() {
                    values.images.remove(index);
                }
            },
        }
    }
}

impl FormValues for EventValues {
    type Field = EventField;
    type Draft = EventDraft;

    const FIELDS: &'static [EventField] = &[
        EventField::Name,
        EventField::Category,
        EventField::Date,
        EventField::Time,
        EventField::Duration,
        EventField::Description,
        EventField::Images,
    ];

    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<EventDraft, FieldErrors<EventField>> {
        let mut errors = FieldErrors::new();

        let title = required(&self.name);
        if title.is_none() {
            errors.insert(EventField::Name, "Event name is required");
        }

        let category = match required(&self.category) {
            None => {
                errors.insert(EventField::Category, "Category is required");
                None
            },
            Some(raw) => {
                let known = |id: &CategoryId| {
                    ctx.categories.is_empty() || ctx.categories.iter().any(|c| c.id == *id)
                };
                let parsed = raw.parse::<CategoryId>().ok().filter(known);
                if parsed.is_none() {
                    errors.insert(EventField::Category, "Select a category from the list");
                }
                parsed
            },
        };

        let date = match required(&self.date) {
            None => {
                errors.insert(EventField::Date, "Event date is required");
                None
            },
            Some(raw) => {
                let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok();
                if parsed.is_none() {
                    errors.insert(EventField::Date, "Event date must be YYYY-MM-DD");
                }
                parsed
            },
        };

        let start_time = match required(&self.time) {
            None => {
                errors.insert(EventField::Time, "Event time is required");
                None
            },
            Some(raw) => {
                let parsed = parse_time_slot(raw);
                if parsed.is_none() {
                    errors.insert(EventField::Time, "Pick a start time in 15-minute steps");
                }
                parsed
            },
        };

        let duration = match required(&self.duration) {
            None => {
                errors.insert(EventField::Duration, "Event duration is required");
                None
            },
            Some(raw) => {
                let parsed = raw.parse::<EventDuration>().ok();
                if parsed.is_none() {
                    errors.insert(EventField::Duration, "Pick one of 30m, 1h, 2h, or 3h");
                }
                parsed
            },
        };

        let description = required(&self.description);
        if description.is_none() {
            errors.insert(EventField::Description, "Event description is required");
        }

        if self.images.is_empty() {
            errors.insert(EventField::Images, "At least one image is required");
        } else if self.images.len() > ctx.max_banner_images {
            errors.insert(
                EventField::Images,
                format!("At most {} images are allowed", ctx.max_banner_images),
            );
        }

        match (title, category, date, start_time, duration, description) {
            (Some(title), Some(category), Some(date), Some(start_time), Some(duration), Some(description))
                if errors.is_empty() =>
            {
                Ok(EventDraft {
                    title: title.to_string(),
                    description: description.to_string(),
                    date,
                    start_time,
                    duration,
                    category,
                    images: self.images.clone(),
                })
            },
            _ => Err(errors),
        }
    }
}
