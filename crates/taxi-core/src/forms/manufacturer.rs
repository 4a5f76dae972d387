use serde::{Deserialize, Serialize};

use super::{clean_text, FormErrors, MAX_TEXT_LENGTH};
use crate::entity::{Manufacturer, NewManufacturer};
use crate::error::Result;
use crate::storage::FleetStore;

/// Create/update form for a manufacturer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManufacturerForm {
    pub name: String,
    pub country: String,
}

impl ManufacturerForm {
    /// A form pre-filled from an existing manufacturer.
    pub fn from_instance(manufacturer: &Manufacturer) -> Self {
        Self {
            name: manufacturer.name.clone(),
            country: manufacturer.country.clone(),
        }
    }

    pub fn clean(&self) -> Result<NewManufacturer> {
        let mut errors = FormErrors::new();
        let name = clean_text(&mut errors, "name", &self.name, true, MAX_TEXT_LENGTH);
        let country = clean_text(&mut errors, "country", &self.country, true, MAX_TEXT_LENGTH);
        errors.finish(|| NewManufacturer { name, country })
    }

    pub fn create(&self, store: &FleetStore) -> Result<Manufacturer> {
        store.create_manufacturer(self.clean()?)
    }

    pub fn update(&self, store: &FleetStore, id: u64) -> Result<Manufacturer> {
        store.update_manufacturer(id, self.clean()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::forms::REQUIRED_MESSAGE;

    #[test]
    fn test_clean_valid() {
        let form = ManufacturerForm {
            name: "Toyota".into(),
            country: " Japan ".into(),
        };
        assert_eq!(form.clean().unwrap(), NewManufacturer::new("Toyota", "Japan"));
    }

    #[test]
    fn test_clean_reports_every_field() {
        let err = ManufacturerForm::default().clean().unwrap_err();
        let Error::Invalid(errors) = err else {
            panic!("expected form errors");
        };
        assert_eq!(errors.get("name"), [REQUIRED_MESSAGE]);
        assert_eq!(errors.get("country"), [REQUIRED_MESSAGE]);
    }

    #[test]
    fn test_create_and_update() {
        let store = FleetStore::temporary().unwrap();
        let form = ManufacturerForm {
            name: "Audi".into(),
            country: "Germany".into(),
        };
        let created = form.create(&store).unwrap();

        let mut edit = ManufacturerForm::from_instance(&created);
        edit.name = "Audi AG".into();
        let updated = edit.update(&store, created.id).unwrap();
        assert_eq!(updated.name, "Audi AG");
        assert_eq!(updated.country, "Germany");

        // Invalid update leaves the record alone.
        edit.country.clear();
        assert!(edit.update(&store, created.id).is_err());
        assert_eq!(store.get::<Manufacturer>(created.id).unwrap(), updated);
    }
}
