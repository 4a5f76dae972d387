use serde::{Deserialize, Serialize};

use super::{clean_text, FormErrors, MAX_TEXT_LENGTH, MAX_USERNAME_LENGTH, REQUIRED_MESSAGE};
use crate::entity::{Driver, NewDriver};
use crate::error::{Error, Result};
use crate::license::LicenseNumber;
use crate::storage::{FleetStore, LICENSE_NUMBER_FIELD, USERNAME_FIELD};

pub const DUPLICATE_USERNAME_MESSAGE: &str = "A user with that username already exists.";
pub const DUPLICATE_LICENSE_MESSAGE: &str = "Driver with this License number already exists.";
pub const PASSWORD_MISMATCH_MESSAGE: &str = "The two password fields didn't match.";
pub const INVALID_USERNAME_MESSAGE: &str = "Enter a valid username. This value may contain only \
     letters, numbers, and @/./+/-/_ characters.";

fn is_valid_username(username: &str) -> bool {
    username
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}

/// Clean the license field: required, well-formed, and not held by any
/// driver other than `exclude_id`.
fn clean_license(
    errors: &mut FormErrors,
    store: &FleetStore,
    raw: &str,
    exclude_id: Option<u64>,
) -> Result<Option<LicenseNumber>> {
    let raw = clean_text(errors, LICENSE_NUMBER_FIELD, raw, true, MAX_TEXT_LENGTH);
    if raw.is_empty() {
        return Ok(None);
    }

    match LicenseNumber::parse(&raw) {
        Ok(license) => {
            if store.is_license_available(&license, exclude_id)? {
                Ok(Some(license))
            } else {
                errors.add(LICENSE_NUMBER_FIELD, DUPLICATE_LICENSE_MESSAGE);
                Ok(None)
            }
        }
        Err(violation) => {
            errors.add(LICENSE_NUMBER_FIELD, violation.to_string());
            Ok(None)
        }
    }
}

/// Unique-index conflicts raised inside the write transaction, mapped to
/// the field they belong to.
fn map_unique_violation(err: Error) -> Error {
    match err {
        Error::UniqueViolation {
            field: USERNAME_FIELD,
            ..
        } => Error::Invalid(FormErrors::single(USERNAME_FIELD, DUPLICATE_USERNAME_MESSAGE)),
        Error::UniqueViolation {
            field: LICENSE_NUMBER_FIELD,
            ..
        } => Error::Invalid(FormErrors::single(
            LICENSE_NUMBER_FIELD,
            DUPLICATE_LICENSE_MESSAGE,
        )),
        other => other,
    }
}

/// Account registration form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverCreationForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password1: String,
    #[serde(skip_serializing)]
    pub password2: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: String,
}

impl DriverCreationForm {
    pub fn clean(&self, store: &FleetStore) -> Result<NewDriver> {
        let mut errors = FormErrors::new();

        let username = clean_text(
            &mut errors,
            USERNAME_FIELD,
            &self.username,
            true,
            MAX_USERNAME_LENGTH,
        );
        if !username.is_empty() {
            if !is_valid_username(&username) {
                errors.add(USERNAME_FIELD, INVALID_USERNAME_MESSAGE);
            } else if !store.is_username_available(&username)? {
                errors.add(USERNAME_FIELD, DUPLICATE_USERNAME_MESSAGE);
            }
        }

        // Passwords are taken verbatim.
        if self.password1.is_empty() {
            errors.add("password1", REQUIRED_MESSAGE);
        }
        if self.password2.is_empty() {
            errors.add("password2", REQUIRED_MESSAGE);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            errors.add("password2", PASSWORD_MISMATCH_MESSAGE);
        }

        let first_name = clean_text(
            &mut errors,
            "first_name",
            &self.first_name,
            false,
            MAX_USERNAME_LENGTH,
        );
        let last_name = clean_text(
            &mut errors,
            "last_name",
            &self.last_name,
            false,
            MAX_USERNAME_LENGTH,
        );
        let license_number = clean_license(&mut errors, store, &self.license_number, None)?;

        errors.finish(|| NewDriver {
            username,
            password: self.password1.clone(),
            first_name,
            last_name,
            license_number,
            is_staff: false,
        })
    }

    pub fn save(&self, store: &FleetStore) -> Result<Driver> {
        store
            .create_driver(self.clean(store)?)
            .map_err(map_unique_violation)
    }
}

/// Standalone license update form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverLicenseUpdateForm {
    pub license_number: String,
}

impl DriverLicenseUpdateForm {
    pub fn from_instance(driver: &Driver) -> Self {
        Self {
            license_number: driver
                .license_number
                .as_ref()
                .map(|l| l.to_string())
                .unwrap_or_default(),
        }
    }

    /// Clean for the driver `driver_id`, who may keep their current number.
    pub fn clean(&self, store: &FleetStore, driver_id: u64) -> Result<LicenseNumber> {
        let mut errors = FormErrors::new();
        let license = clean_license(&mut errors, store, &self.license_number, Some(driver_id))?;
        match license {
            Some(license) if errors.is_empty() => Ok(license),
            _ => Err(Error::Invalid(errors)),
        }
    }

    pub fn save(&self, store: &FleetStore, driver_id: u64) -> Result<Driver> {
        store.get::<Driver>(driver_id)?;
        let license = self.clean(store, driver_id)?;
        store
            .update_driver_license(driver_id, Some(license))
            .map_err(map_unique_violation)
    }
}
