//! Step 2: event location.

use crate::form::{FieldErrors, FormValues, ValidationContext};
use crate::types::{LocationDraft, StructuredAddress};
use crate::validation::{coordinate, optional, positive_count, required};
use serde::{Deserialize, Serialize};

/// Fields of the location form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LocationField {
    /// Venue name
    Venue,
    /// Street address
    AddressLine1,
    /// Apartment, suite, etc.
    AddressLine2,
    /// City
    City,
    /// State or province
    State,
    /// Country
    Country,
    /// Zip or postal code
    PostalCode,
    /// Venue capacity
    Capacity,
    /// Latitude
    Latitude,
    /// Longitude
    Longitude,
}

/// Raw input of the location form
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocationValues {
    /// Venue name
    pub venue: String,
    /// Street address
    pub address_line_1: String,
    /// Apartment, suite, etc.
    pub address_line_2: String,
    /// City
    pub city: String,
    /// State or province
    pub state: String,
    /// Country
    pub country: String,
    /// Zip or postal code
    pub postal_code: String,
    /// Capacity text
    pub capacity: String,
    /// Latitude text
    pub latitude: String,
    /// Longitude text
    pub longitude: String,
}

/// A change to the location form
#[derive(Clone, Debug, PartialEq)]
pub enum LocationEdit {
    /// Set the venue name
    Venue(String),
    /// Set address line 1
    AddressLine1(String),
    /// Set address line 2
    AddressLine2(String),
    /// Set the city
    City(String),
    /// Set the state
    State(String),
    /// Set the country
    Country(String),
    /// Set the postal code
    PostalCode(String),
    /// Set the capacity
    Capacity(String),
    /// Set the latitude
    Latitude(String),
    /// Set the longitude
    Longitude(String),
    /// Fill the form from an address picked in the autocomplete widget
    Prefill(StructuredAddress),
    /// Move the map pin
    MapPosition {
        /// Latitude in degrees
        latitude: f64,
        /// Longitude in degrees
        longitude: f64,
    },
}

impl LocationEdit {
    /// Apply this change
    pub fn apply(self, values: &mut LocationValues) {
        match self {
            Self::Venue(venue) => values.venue = venue,
            Self::AddressLine1(line) => values.address_line_1 = line,
            Self::AddressLine2(line) => values.address_line_2 = line,
            Self::City(city) => values.city = city,
            Self::State(state) => values.state = state,
            Self::Country(country) => values.country = country,
            Self::PostalCode(code) => values.postal_code = code,
            Self::Capacity(capacity) => values.capacity = capacity,
            Self::Latitude(latitude) => values.latitude = latitude,
            Self::Longitude(longitude) => values.longitude = longitude,
            Self::Prefill(address) => {
                values.venue = address.formatted;
                values.address_line_1 = address.street_number.unwrap_or_default();
                values.address_line_2 = address.route.unwrap_or_default();
                values.city = address.locality.unwrap_or_default();
                values.state = address.administrative_area.unwrap_or_default();
                values.country = address.country.unwrap_or_default();
                values.postal_code = address.postal_code.unwrap_or_default();
                values.latitude = address.latitude.to_string();
                values.longitude = address.longitude.to_string();
            },
            Self::MapPosition {
                latitude,
                longitude,
            } => {
                values.latitude = latitude.to_string();
                values.longitude = longitude.to_string();
            },
        }
    }
}

impl FormValues for LocationValues {
    type Field = LocationField;
    type Draft = LocationDraft;

    const FIELDS: &'static [LocationField] = &[
        LocationField::Venue,
        LocationField::AddressLine1,
        LocationField::AddressLine2,
        LocationField::City,
        LocationField::State,
        LocationField::Country,
        LocationField::PostalCode,
        LocationField::Capacity,
        LocationField::Latitude,
        LocationField::Longitude,
    ];

    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<LocationDraft, FieldErrors<LocationField>> {
        let mut errors = FieldErrors::new();

        let mut require = |field, value: &str, message: &str| {
            let value = required(value).map(str::to_string);
            if value.is_none() {
                errors.insert(field, message);
            }
            value.unwrap_or_default()
        };

        let venue = require(LocationField::Venue, &self.venue, "Venue is required");
        let address_line_1 = require(
            LocationField::AddressLine1,
            &self.address_line_1,
            "Address line 1 is required",
        );
        let city = require(LocationField::City, &self.city, "City is required");
        let state = require(LocationField::State, &self.state, "State is required");
        let country = require(LocationField::Country, &self.country, "Country is required");
        let postal_code = require(
            LocationField::PostalCode,
            &self.postal_code,
            "Zip/Post Code is required",
        );

        let capacity = if required(&self.capacity).is_some() {
            positive_count(&self.capacity, "Capacity")
                .map(Some)
                .unwrap_or_else(|message| {
                    errors.insert(LocationField::Capacity, message);
                    None
                })
        } else {
            None
        };

        let latitude = coordinate(&self.latitude, "Latitude", 90.0).unwrap_or_else(|message| {
            errors.insert(LocationField::Latitude, message);
            None
        });
        let longitude = coordinate(&self.longitude, "Longitude", 180.0).unwrap_or_else(|message| {
            errors.insert(LocationField::Longitude, message);
            None
        });

        errors.into_result(|| LocationDraft {
            venue,
            address_line_1,
            address_line_2: optional(&self.address_line_2),
            city,
            state,
            country,
            postal_code,
            capacity,
            latitude,
            longitude,
        })
    }
}
