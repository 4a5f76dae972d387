//! Per-request identity.

use serde::Serialize;

use crate::entity::Driver;

/// The authenticated driver on whose behalf an operation runs.
///
/// Built by the web layer from the request's session and passed explicitly
/// into every operation that depends on who is asking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Actor {
    pub driver_id: u64,
    pub username: String,
    pub is_staff: bool,
}

impl Actor {
    pub fn new(driver_id: u64, username: impl Into<String>) -> Self {
        Self {
            driver_id,
            username: username.into(),
            is_staff: false,
        }
    }
}

impl From<&Driver> for Actor {
    fn from(driver: &Driver) -> Self {
        Self {
            driver_id: driver.id,
            username: driver.username.clone(),
            is_staff: driver.is_staff,
        }
    }
}
