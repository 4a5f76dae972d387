use serde::{Deserialize, Serialize};

use super::{clean_text, parse_id, FormErrors, INVALID_CHOICE_MESSAGE, MAX_TEXT_LENGTH, REQUIRED_MESSAGE};
use crate::entity::{Car, Driver, Manufacturer, NewCar};
use crate::error::{Error, Result};
use crate::storage::FleetStore;

/// Create/update form for a car and its driver set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarForm {
    pub model: String,
    /// Manufacturer id.
    pub manufacturer: String,
    /// Assigned driver ids. Submitted as a repeated `drivers` key.
    pub drivers: Vec<String>,
}

fn invalid_driver_message(value: &str) -> String {
    format!("Select a valid choice. {value} is not one of the available choices.")
}

impl CarForm {
    pub fn from_instance(car: &Car, driver_ids: &[u64]) -> Self {
        Self {
            model: car.model.clone(),
            manufacturer: car.manufacturer_id.to_string(),
            drivers: driver_ids.iter().map(u64::to_string).collect(),
        }
    }

    /// Clean against the store: the manufacturer and every driver must exist.
    pub fn clean(&self, store: &FleetStore) -> Result<NewCar> {
        let mut errors = FormErrors::new();
        let model = clean_text(&mut errors, "model", &self.model, true, MAX_TEXT_LENGTH);

        let mut manufacturer_id = 0;
        if self.manufacturer.trim().is_empty() {
            errors.add("manufacturer", REQUIRED_MESSAGE);
        } else {
            match parse_id(&self.manufacturer) {
                Some(id) if store.find::<Manufacturer>(id)?.is_some() => manufacturer_id = id,
                _ => errors.add("manufacturer", INVALID_CHOICE_MESSAGE),
            }
        }

        let mut driver_ids = Vec::with_capacity(self.drivers.len());
        for raw in &self.drivers {
            match parse_id(raw) {
                Some(id) if store.find::<Driver>(id)?.is_some() => driver_ids.push(id),
                _ => errors.add("drivers", invalid_driver_message(raw.trim())),
            }
        }

        errors.finish(|| NewCar {
            model,
            manufacturer_id,
            driver_ids,
        })
    }

    pub fn create(&self, store: &FleetStore) -> Result<Car> {
        store
            .create_car(self.clean(store)?)
            .map_err(Self::map_store_error)
    }

    pub fn update(&self, store: &FleetStore, id: u64) -> Result<Car> {
        let input = self.clean(store)?;
        // The car itself going missing stays a NotFound.
        store.get::<Car>(id)?;
        store.update_car(id, input).map_err(Self::map_store_error)
    }

    /// A manufacturer or driver removed between cleaning and writing is
    /// reported like any other invalid choice.
    fn map_store_error(err: Error) -> Error {
        match err {
            Error::NotFound {
                entity: "manufacturer",
                ..
            } => Error::Invalid(FormErrors::single("manufacturer", INVALID_CHOICE_MESSAGE)),
            Error::NotFound {
                entity: "driver",
                id,
            } => Error::Invalid(FormErrors::single(
                "drivers",
                invalid_driver_message(&id.to_string()),
            )),
            other => other,
        }
    }
}
