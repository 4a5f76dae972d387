//! Form cleaning.
//!
//! Forms hold submitted values as raw strings, exactly as they arrive from
//! an urlencoded body, so an invalid submission can be re-rendered with the
//! user's input intact. `clean` turns a form into a typed input or an
//! [`Error::Invalid`] carrying per-field messages; `save` cleans and writes,
//! mapping constraint failures raised by the store back onto fields.

mod car;
mod driver;
mod login;
mod manufacturer;

pub use car::CarForm;
pub use driver::{DriverCreationForm, DriverLicenseUpdateForm};
pub use login::LoginForm;
pub use manufacturer::ManufacturerForm;

use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::error::{Error, Result};

/// Key for errors not tied to a single field.
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Default maximum length of a text field.
pub const MAX_TEXT_LENGTH: usize = 255;

/// Maximum length of a username.
pub const MAX_USERNAME_LENGTH: usize = 150;

pub const REQUIRED_MESSAGE: &str = "This field is required.";
pub const INVALID_CHOICE_MESSAGE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Validation messages keyed by field name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Record a message not tied to a field.
    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages for a field, empty when it is valid.
    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// `Ok(value)` when no errors were recorded, otherwise [`Error::Invalid`].
    pub fn finish<T>(self, value: impl FnOnce() -> T) -> Result<T> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(Error::Invalid(self))
        }
    }

    /// A single-field error.
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }
}

impl fmt::Display for FormErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        Ok(())
    }
}

pub fn max_length_message(max: usize, actual: usize) -> String {
    format!("Ensure this value has at most {max} characters (it has {actual}).")
}

/// Clean a text field: surrounding whitespace is stripped, then the value
/// is checked against `required` and `max` (in characters).
///
/// Returns the stripped value; on failure the message is recorded and an
/// empty string returned.
pub(crate) fn clean_text(
    errors: &mut FormErrors,
    field: &str,
    raw: &str,
    required: bool,
    max: usize,
) -> String {
    let value = raw.trim();
    if value.is_empty() {
        if required {
            errors.add(field, REQUIRED_MESSAGE);
        }
        return String::new();
    }

    let length = value.chars().count();
    if length > max {
        errors.add(field, max_length_message(max, length));
        return String::new();
    }

    value.to_string()
}

/// Parse a submitted primary key. Non-numeric input is an invalid choice.
pub(crate) fn parse_id(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|id| *id > 0)
}
