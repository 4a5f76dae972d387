use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use serde::Serialize as SerdeSerialize;

use super::Entity;

/// A car, owned by one manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize)]
pub struct Car {
    pub id: u64,
    pub model: String,
    pub manufacturer_id: u64,
}

impl Car {
    pub fn absolute_url(&self) -> String {
        format!("/cars/{}/", self.id)
    }
}

/// Validated fields for creating or updating a car.
///
/// `driver_ids` replaces the car's full assigned-driver set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCar {
    pub model: String,
    pub manufacturer_id: u64,
    pub driver_ids: Vec<u64>,
}

impl NewCar {
    pub fn new(model: impl Into<String>, manufacturer_id: u64) -> Self {
        Self {
            model: model.into(),
            manufacturer_id,
            driver_ids: Vec::new(),
        }
    }

    pub fn with_drivers(mut self, driver_ids: impl IntoIterator<Item = u64>) -> Self {
        self.driver_ids = driver_ids.into_iter().collect();
        self
    }
}

rkyv_record!(Car);

impl Entity for Car {
    const NAME: &'static str = "car";
    const TREE: &'static str = "cars";
    const SEARCH_FIELD: &'static str = "model";

    fn id(&self) -> u64 {
        self.id
    }

    fn search_value(&self) -> &str {
        &self.model
    }
}

impl fmt::Display for Car {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.model)
    }
}
