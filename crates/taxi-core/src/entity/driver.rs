use std::cmp::Ordering;
use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use serde::Serialize as SerdeSerialize;

use super::Entity;
use crate::license::LicenseNumber;
use crate::password;

/// A licensed driver. Drivers are also the service's user accounts.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize)]
pub struct Driver {
    pub id: u64,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: Option<LicenseNumber>,
    pub is_staff: bool,
}

impl Driver {
    pub fn check_password(&self, raw: &str) -> bool {
        password::verify_password(raw, &self.password_hash)
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }

    pub fn absolute_url(&self) -> String {
        format!("/drivers/{}/", self.id)
    }
}

/// Fields for creating a driver. The password is raw and is hashed by the
/// store on insert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewDriver {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub license_number: Option<LicenseNumber>,
    pub is_staff: bool,
}

impl NewDriver {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            first_name: String::new(),
            last_name: String::new(),
            license_number: None,
            is_staff: false,
        }
    }

    pub fn with_name(mut self, first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self.last_name = last_name.into();
        self
    }

    pub fn with_license(mut self, license_number: LicenseNumber) -> Self {
        self.license_number = Some(license_number);
        self
    }

    pub fn staff(mut self) -> Self {
        self.is_staff = true;
        self
    }
}

rkyv_record!(Driver);

impl Entity for Driver {
    const NAME: &'static str = "driver";
    const TREE: &'static str = "drivers";
    const SEARCH_FIELD: &'static str = "username";

    fn id(&self) -> u64 {
        self.id
    }

    fn search_value(&self) -> &str {
        &self.username
    }

    fn default_order(&self, other: &Self) -> Ordering {
        self.username.cmp(&other.username)
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({} {})",
            self.username, self.first_name, self.last_name
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn driver() -> Driver {
        Driver {
            id: 3,
            username: "test".to_string(),
            password_hash: password::hash_password("PASSWORD", 1_000),
            first_name: "test_first".to_string(),
            last_name: "test_last".to_string(),
            license_number: Some(LicenseNumber::parse("ABC12345").unwrap()),
            is_staff: false,
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(driver().to_string(), "test (test_first test_last)");
    }

    #[test]
    fn test_absolute_url() {
        assert_eq!(driver().absolute_url(), "/drivers/3/");
    }

    #[test]
    fn test_check_password() {
        let driver = driver();
        assert!(driver.check_password("PASSWORD"));
        assert!(!driver.check_password("wrong"));
    }

    #[test]
    fn test_json_hides_password_hash() {
        let json = serde_json::to_value(driver()).unwrap();
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["license_number"], "ABC12345");
        assert_eq!(json["username"], "test");
    }
}
