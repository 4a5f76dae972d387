use std::cmp::Ordering;
use std::fmt;

use rkyv::{Archive, Deserialize, Serialize};
use serde::Serialize as SerdeSerialize;

use super::Entity;

/// A car manufacturer.
#[derive(Debug, Clone, PartialEq, Eq, Archive, Serialize, Deserialize, SerdeSerialize)]
pub struct Manufacturer {
    pub id: u64,
    pub name: String,
    pub country: String,
}

/// Validated fields for creating or updating a manufacturer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewManufacturer {
    pub name: String,
    pub country: String,
}

impl NewManufacturer {
    pub fn new(name: impl Into<String>, country: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            country: country.into(),
        }
    }
}

rkyv_record!(Manufacturer);

impl Entity for Manufacturer {
    const NAME: &'static str = "manufacturer";
    const TREE: &'static str = "manufacturers";
    const SEARCH_FIELD: &'static str = "name";

    fn id(&self) -> u64 {
        self.id
    }

    fn search_value(&self) -> &str {
        &self.name
    }

    fn default_order(&self, other: &Self) -> Ordering {
        self.name.cmp(&other.name).then(self.id.cmp(&other.id))
    }
}

impl fmt::Display for Manufacturer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.country)
    }
}
