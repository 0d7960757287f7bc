//! Serializable form model shared by the three wizard steps.
//!
//! A form is `{ values, errors, touched }`. Values are the raw input, errors
//! come from running the step's validator over the values, and only touched
//! fields show their errors. Submitting touches every field.

use crate::types::Category;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt::Debug;

/// Everything a validator may look at besides the form's own values
#[derive(Clone, Copy, Debug)]
pub struct ValidationContext<'a> {
    /// Categories loaded for this session (empty if loading failed)
    pub categories: &'a [Category],
    /// Upper bound on banner images per event
    pub max_banner_images: usize,
}

/// Raw input of one step's form
pub trait FormValues: Clone + Default {
    /// Field identifier
    type Field: Copy + Ord + Debug + Serialize + DeserializeOwned + 'static;

    /// Validated output
    type Draft;

    /// Every field, in display order
    const FIELDS: &'static [Self::Field];

    /// Validate all fields.
    ///
    /// # Errors
    ///
    /// Returns one message per offending field.
    fn validate(&self, ctx: &ValidationContext<'_>) -> Result<Self::Draft, FieldErrors<Self::Field>>;
}

/// One message per offending field
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldErrors<F: Ord> {
    errors: BTreeMap<F, String>,
}

impl<F: Ord + Copy> FieldErrors<F> {
    /// No errors
    #[must_use]
    pub const fn new() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }

    /// Record an error; the first message for a field wins
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.errors.entry(field).or_insert_with(|| message.into());
    }

    /// Message for `field`
    #[must_use]
    pub fn get(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// Whether `field` has an error
    #[must_use]
    pub fn contains(&self, field: F) -> bool {
        self.errors.contains_key(&field)
    }

    /// True when no field has an error
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Number of offending fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.errors.len()
    }

    /// Offending fields, in field order
    pub fn fields(&self) -> impl Iterator<Item = F> + '_ {
        self.errors.keys().copied()
    }

    /// `(field, message)` pairs, in field order
    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> + '_ {
        self.errors.iter().map(|(field, message)| (*field, message.as_str()))
    }

    /// `Ok(value)` if there are no errors, otherwise `Err(self)`
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one field failed.
    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, Self> {
        if self.is_empty() { Ok(value()) } else { Err(self) }
    }
}

impl<F: Ord> Default for FieldErrors<F> {
    fn default() -> Self {
        Self {
            errors: BTreeMap::new(),
        }
    }
}

/// Form state of one step
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(bound(serialize = "V: Serialize", deserialize = "V: Deserialize<'de>"))]
pub struct Form<V: FormValues> {
    values: V,
    errors: FieldErrors<V::Field>,
    touched: BTreeSet<V::Field>,
}

impl<V: FormValues> Default for Form<V> {
    fn default() -> Self {
        Self::new(V::default())
    }
}

impl<V: FormValues> Form<V> {
    /// Untouched form over `values`
    #[must_use]
    pub fn new(values: V) -> Self {
        Self {
            values,
            errors: FieldErrors::default(),
            touched: BTreeSet::new(),
        }
    }

    /// Current input
    pub const fn values(&self) -> &V {
        &self.values
    }

    /// Apply a value change and re-validate
    pub fn edit(&mut self, change: impl FnOnce(&mut V), ctx: &ValidationContext<'_>) {
        change(&mut self.values);
        self.revalidate(ctx);
    }

    /// Mark `field` touched and re-validate
    pub fn blur(&mut self, field: V::Field, ctx: &ValidationContext<'_>) {
        self.touched.insert(field);
        self.revalidate(ctx);
    }

    /// Mark every field touched
    pub fn touch_all(&mut self) {
        self.touched.extend(V::FIELDS.iter().copied());
    }

    /// Re-run the validator, returning the draft when the form is valid
    pub fn validate(&mut self, ctx: &ValidationContext<'_>) -> Option<V::Draft> {
        match self.values.validate(ctx) {
            Ok(draft) => {
                self.errors = FieldErrors::default();
                Some(draft)
            },
            Err(errors) => {
                self.errors = errors;
                None
            },
        }
    }

    /// Submit: touch everything, then validate
    pub fn submit(&mut self, ctx: &ValidationContext<'_>) -> Option<V::Draft> {
        self.touch_all();
        self.validate(ctx)
    }

    fn revalidate(&mut self, ctx: &ValidationContext<'_>) {
        let _ = self.validate(ctx);
    }

    /// Visible error for `field` (touched fields only)
    #[must_use]
    pub fn error(&self, field: V::Field) -> Option<&str> {
        if self.touched.contains(&field) {
            self.errors.get(field)
        } else {
            None
        }
    }

    /// Every visible error
    #[must_use]
    pub fn visible_errors(&self) -> FieldErrors<V::Field> {
        let mut visible = FieldErrors::new();
        for (field, message) in self.errors.iter() {
            if self.touched.contains(&field) {
                visible.insert(field, message);
            }
        }
        visible
    }

    /// Every error, touched or not
    pub const fn errors(&self) -> &FieldErrors<V::Field> {
        &self.errors
    }

    /// Whether `field` was blurred or submitted
    #[must_use]
    pub fn is_touched(&self, field: V::Field) -> bool {
        self.touched.contains(&field)
    }
}
