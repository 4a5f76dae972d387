//! Taxi Core - Domain model, validation and storage for the taxi fleet service.
//!
//! This crate holds everything below the HTTP layer: the entities, the
//! license number validator, password hashing, form cleaning and the
//! sled-backed [`FleetStore`] with its assignment relation table.

#[cfg(feature = "mimalloc")]
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

pub mod actor;
pub mod entity;
pub mod error;
pub mod filter;
pub mod forms;
pub mod license;
pub mod password;
pub mod storage;

pub use actor::Actor;
pub use entity::{Car, Driver, Entity, Manufacturer, NewCar, NewDriver, NewManufacturer, Record};
pub use error::{Error, Result};
pub use filter::{CarFilter, SearchFilter};
pub use forms::{
    CarForm, DriverCreationForm, DriverLicenseUpdateForm, FormErrors, LoginForm, ManufacturerForm,
};
pub use license::{validate_license_number, LicenseError, LicenseNumber};
pub use storage::{FleetStats, FleetStore, Membership, StoreConfig};
