//! Step 3: ticket types.

use crate::form::{FieldErrors, FormValues, ValidationContext};
use crate::types::{Money, ParseMoneyError, TicketDraft};
use crate::validation::{percentage, positive_count, required};
use serde::{Deserialize, Serialize};

/// Fields of the ticket form
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TicketField {
    /// Ticket name
    Name,
    /// Total tickets available
    Quantity,
    /// Maximum tickets per customer
    PerCustomerLimit,
    /// Display order
    DisplayOrder,
    /// Description
    Description,
    /// Price
    Price,
    /// Early-bird discount percentage
    Discount,
}

/// Raw input of the ticket form
///
/// Toggling an "unlimited" or "early bird" switch keeps whatever text was
/// typed in the matching field; validation ignores it while the switch
/// makes it irrelevant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketValues {
    /// Ticket name
    pub name: String,
    /// No cap on total tickets
    pub unlimited_total: bool,
    /// Total tickets text
    pub quantity: String,
    /// No cap per customer
    pub unlimited_per_customer: bool,
    /// Per-customer limit text
    pub per_customer_limit: String,
    /// Display order text
    pub display_order: String,
    /// Description
    pub description: String,
    /// Price text
    pub price: String,
    /// Offer an early-bird discount
    pub early_bird: bool,
    /// Discount percentage text
    pub discount: String,
}

impl TicketValues {
    /// Fresh form for the ticket shown at position `order`
    #[must_use]
    pub fn for_order(order: usize) -> Self {
        Self {
            display_order: order.max(1).to_string(),
            ..Self::default()
        }
    }
}

impl Default for TicketValues {
    fn default() -> Self {
        Self {
            name: String::new(),
            unlimited_total: true,
            quantity: String::new(),
            unlimited_per_customer: false,
            per_customer_limit: String::new(),
            display_order: "1".to_string(),
            description: String::new(),
            price: String::new(),
            early_bird: false,
            discount: String::new(),
        }
    }
}

/// A change to the ticket form
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TicketEdit {
    /// Set the name
    Name(String),
    /// Toggle unlimited total
    UnlimitedTotal(bool),
    /// Set the total
    Quantity(String),
    /// Toggle unlimited per customer
    UnlimitedPerCustomer(bool),
    /// Set the per-customer limit
    PerCustomerLimit(String),
    /// Set the display order
    DisplayOrder(String),
    /// Set the description
    Description(String),
    /// Set the price
    Price(String),
    /// Toggle the early-bird discount
    EarlyBird(bool),
    /// Set the discount percentage
    Discount(String),
}

impl TicketEdit {
    /// Apply this change
    pub fn apply(self, values: &mut TicketValues) {
        match self {
            Self::Name(name) => values.name = name,
            Self::UnlimitedTotal(on) => values.unlimited_total = on,
            Self::Quantity(quantity) => values.quantity = quantity,
            Self::UnlimitedPerCustomer(on) => values.unlimited_per_customer = on,
            Self::PerCustomerLimit(limit) => values.per_customer_limit = limit,
            Self::DisplayOrder(order) => values.display_order = order,
            Self::Description(description) => values.description = description,
            Self::Price(price) => values.price = price,
            Self::EarlyBird(on) => values.early_bird = on,
            Self::Discount(discount) => values.discount = discount,
        }
    }
}

fn price_message(error: ParseMoneyError) -> &'static str {
    match error {
        ParseMoneyError::Empty => "Price is required",
        ParseMoneyError::Invalid => "Price must be a non-negative amount",
        ParseMoneyError::TooPrecise => "Price can have at most two decimal places",
        ParseMoneyError::Overflow => "Price is too large",
    }
}

impl FormValues for TicketValues {
    type Field = TicketField;
    type Draft = TicketDraft;

    const FIELDS: &'static [TicketField] = &[
        TicketField::Name,
        TicketField::Quantity,
        TicketField::PerCustomerLimit,
        TicketField::DisplayOrder,
        TicketField::Description,
        TicketField::Price,
        TicketField::Discount,
    ];

    fn validate(&self, _ctx: &ValidationContext<'_>) -> Result<TicketDraft, FieldErrors<TicketField>> {
        let mut errors = FieldErrors::new();

        let name = required(&self.name).map(str::to_string);
        if name.is_none() {
            errors.insert(TicketField::Name, "Ticket name is required");
        }

        let description = required(&self.description).map(str::to_string);
        if description.is_none() {
            errors.insert(TicketField::Description, "Ticket description is required");
        }

        let price = self.price.parse::<Money>().map_err(|error| {
            errors.insert(TicketField::Price, price_message(error));
        });

        let quantity = if self.unlimited_total {
            None
        } else {
            positive_count(&self.quantity, "Total tickets")
                .map_err(|message| errors.insert(TicketField::Quantity, message))
                .ok()
        };

        let per_customer_limit = if self.unlimited_per_customer {
            None
        } else {
            positive_count(&self.per_customer_limit, "Tickets per customer")
                .map_err(|message| errors.insert(TicketField::PerCustomerLimit, message))
                .ok()
        };

        let display_order = positive_count(&self.display_order, "Ticket order")
            .map_err(|message| errors.insert(TicketField::DisplayOrder, message))
            .ok();

        let early_bird_discount = if self.early_bird {
            if required(&self.discount).is_none() {
                errors.insert(TicketField::Discount, "Discount is required for early bird tickets");
                None
            } else {
                percentage(&self.discount)
                    .map_err(|message| errors.insert(TicketField::Discount, message))
                    .ok()
            }
        } else {
            None
        };

        match (name, description, price, display_order) {
            (Some(name), Some(description), Ok(price), Some(display_order)) if errors.is_empty() => {
                Ok(TicketDraft {
                    name,
                    quantity,
                    per_customer_limit,
                    display_order,
                    description,
                    price,
                    early_bird_discount,
                })
            },
            _ => Err(errors),
        }
    }
}
