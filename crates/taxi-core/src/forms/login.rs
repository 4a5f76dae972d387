use serde::{Deserialize, Serialize};

use super::{FormErrors, REQUIRED_MESSAGE};
use crate::entity::Driver;
use crate::error::{Error, Result};
use crate::storage::FleetStore;

pub const INVALID_LOGIN_MESSAGE: &str = "Please enter a correct username and password.";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub username: String,
    #[serde(skip_serializing)]
    pub password: String,
}

impl LoginForm {
    /// Check the credentials and return the matching driver.
    pub fn authenticate(&self, store: &FleetStore) -> Result<Driver> {
        let mut errors = FormErrors::new();
        let username = self.username.trim();
        if username.is_empty() {
            errors.add("username", REQUIRED_MESSAGE);
        }
        if self.password.is_empty() {
            errors.add("password", REQUIRED_MESSAGE);
        }
        if !errors.is_empty() {
            return Err(Error::Invalid(errors));
        }

        match store.authenticate(username, &self.password)? {
            Some(driver) => Ok(driver),
            None => {
                tracing::debug!(username, "login rejected");
                let mut errors = FormErrors::new();
                errors.add_non_field(INVALID_LOGIN_MESSAGE);
                Err(Error::Invalid(errors))
            }
        }
    }
}
