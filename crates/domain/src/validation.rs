//! Structured validation results shared by every form.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;

/// Error messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    /// Creates an empty set of errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Returns the messages recorded for a field.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// Returns true if no field has an error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the names of the fields that have errors.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Returns `Ok(value)` if empty, `Err(self)` otherwise.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{field}: {}", messages.join(", ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Errors for one row of a collection: per-field plus row-wide messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowErrors {
    pub fields: FieldErrors,
    pub row: Vec<String>,
}

impl RowErrors {
    /// Returns true if the row has no errors.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.row.is_empty()
    }
}

/// Trims a text input, mapping blank values to `None`.
pub fn clean_text(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Checks a cleaned text value against a maximum length in characters.
pub fn check_max_length(errors: &mut FieldErrors, field: &str, value: Option<&str>, max: usize) {
    if let Some(value) = value {
        let len = value.chars().count();
        if len > max {
            errors.add(
                field,
                format!("ensure this value has at most {max} characters (it has {len})"),
            );
        }
    }
}

/// Largest amount a `NUMERIC(10, 2)` column holds, exclusive.
pub const MAX_AMOUNT_EXCLUSIVE: Decimal = Decimal::from_parts(100_000_000, 0, 0, false, 0);

/// Checks that an amount is non-negative and fits `NUMERIC(10, 2)`.
pub fn check_amount(errors: &mut FieldErrors, field: &str, value: Decimal) {
    if value.is_sign_negative() && !value.is_zero() {
        errors.add(field, "ensure this value is greater than or equal to 0");
    }
    if value.normalize().scale() > 2 {
        errors.add(field, "ensure that there are no more than 2 decimal places");
    }
    if value.abs() >= MAX_AMOUNT_EXCLUSIVE {
        errors.add(field, "ensure that there are no more than 10 digits in total");
    }
}
