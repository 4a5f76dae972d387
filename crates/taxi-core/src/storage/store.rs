//! The fleet store.

use std::collections::BTreeSet;

use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionResult,
    TransactionalTree,
};
use sled::{Db, Transactional, Tree};

use super::assignment::{AssignmentTable, Membership};
use super::config::StoreConfig;
use super::key::encode_id;
use super::unique_index::UniqueIndex;
use crate::actor::Actor;
use crate::entity::{
    Car, Driver, Entity, Manufacturer, NewCar, NewDriver, NewManufacturer, Record,
};
use crate::error::{Error, Result};
use crate::filter::{CarFilter, SearchFilter};
use crate::license::LicenseNumber;
use crate::password;

/// Unique field: driver username.
pub const USERNAME_FIELD: &str = "username";

/// Unique field: driver license number.
pub const LICENSE_NUMBER_FIELD: &str = "license_number";

/// Attempts at a driver-set rewrite before a concurrent change is reported.
const MAX_SNAPSHOT_ATTEMPTS: usize = 8;

/// Entity counts shown on the index page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    pub num_drivers: usize,
    pub num_cars: usize,
    pub num_manufacturers: usize,
}

/// Persistent store of manufacturers, cars, drivers and assignments.
pub struct FleetStore {
    db: Db,
    manufacturers: Tree,
    cars: Tree,
    drivers: Tree,
    unique: UniqueIndex,
    assignments: AssignmentTable,
    password_iterations: u32,
}

impl FleetStore {
    /// Open or create a store with the given configuration.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let db = config.to_sled_config().open()?;

        let store = Self {
            manufacturers: db.open_tree(Manufacturer::TREE)?,
            cars: db.open_tree(Car::TREE)?,
            drivers: db.open_tree(Driver::TREE)?,
            unique: UniqueIndex::open(&db)?,
            assignments: AssignmentTable::open(&db)?,
            password_iterations: config.password_iterations,
            db,
        };

        tracing::debug!(
            temporary = config.temporary,
            recovered = store.db.was_recovered(),
            "fleet store opened"
        );

        Ok(store)
    }

    /// Open a throwaway store.
    pub fn temporary() -> Result<Self> {
        Self::open(StoreConfig::temporary())
    }

    /// Flush dirty pages to disk.
    pub fn flush(&self) -> Result<()> {
        self.db.flush()?;
        Ok(())
    }

    fn next_id(&self) -> Result<u64> {
        Ok(self.db.generate_id()? + 1)
    }

    // ========== Generic entity access ==========

    /// Look up an entity by id.
    pub fn find<E: Entity>(&self, id: u64) -> Result<Option<E>> {
        let tree = self.db.open_tree(E::TREE)?;
        tree.get(encode_id(id))?
            .map(|bytes| E::from_bytes(&bytes))
            .transpose()
    }

    /// Get an entity by id, failing with [`Error::NotFound`].
    pub fn get<E: Entity>(&self, id: u64) -> Result<E> {
        self.find(id)?.ok_or_else(|| Error::not_found(E::NAME, id))
    }

    /// List entities matching `filter`, in the entity's default order.
    pub fn list<E: Entity>(&self, filter: &SearchFilter) -> Result<Vec<E>> {
        let tree = self.db.open_tree(E::TREE)?;
        let mut items = Vec::new();

        for value in tree.iter().values() {
            let entity = E::from_bytes(&value?)?;
            if filter.matches(&entity) {
                items.push(entity);
            }
        }

        items.sort_by(|a, b| a.default_order(b));
        Ok(items)
    }

    /// Number of stored entities of a type.
    pub fn count<E: Entity>(&self) -> Result<usize> {
        Ok(self.db.open_tree(E::TREE)?.len())
    }

    pub fn stats(&self) -> Result<FleetStats> {
        Ok(FleetStats {
            num_drivers: self.drivers.len(),
            num_cars: self.cars.len(),
            num_manufacturers: self.manufacturers.len(),
        })
    }

    // ========== Manufacturers ==========

    pub fn create_manufacturer(&self, input: NewManufacturer) -> Result<Manufacturer> {
        let manufacturer = Manufacturer {
            id: self.next_id()?,
            name: input.name,
            country: input.country,
        };

        self.manufacturers
            .insert(encode_id(manufacturer.id), manufacturer.to_bytes()?)?;

        tracing::debug!(id = manufacturer.id, name = %manufacturer.name, "manufacturer created");
        Ok(manufacturer)
    }

    pub fn update_manufacturer(&self, id: u64, input: NewManufacturer) -> Result<Manufacturer> {
        let result: TransactionResult<Manufacturer, Error> = self.manufacturers.transaction(|tx| {
            let mut manufacturer: Manufacturer = tx_require(tx, id)?;
            manufacturer.name = input.name.clone();
            manufacturer.country = input.country.clone();
            tx_put(tx, &manufacturer)?;
            Ok(manufacturer)
        });
        let manufacturer = result?;

        tracing::debug!(id, "manufacturer updated");
        Ok(manufacturer)
    }

    /// Delete a manufacturer together with its cars and their assignments.
    ///
    /// The manufacturer goes first. Car creation and car updates require
    /// their manufacturer inside their own transaction, so no car can join
    /// it afterwards and the sweep below sees the final set. Returns the
    /// number of cars removed.
    pub fn delete_manufacturer(&self, id: u64) -> Result<usize> {
        let result: TransactionResult<(), Error> = self.manufacturers.transaction(|tx| {
            tx_require::<Manufacturer>(tx, id)?;
            tx.remove(encode_id(id).to_vec())?;
            Ok(())
        });
        result?;

        let mut cars_removed = 0;
        for car in self.list_cars(&CarFilter::new(None, Some(id)))? {
            if self.delete_owned_car(car.id, id)? {
                cars_removed += 1;
            }
        }

        tracing::info!(id, cars_removed, "manufacturer deleted");
        Ok(cars_removed)
    }

    // ========== Cars ==========

    /// List cars matching a model search and optional manufacturer.
    pub fn list_cars(&self, filter: &CarFilter) -> Result<Vec<Car>> {
        let mut cars = self.list::<Car>(&filter.model)?;
        cars.retain(|car| filter.matches(car));
        Ok(cars)
    }

    /// Create a car and assign its initial drivers.
    pub fn create_car(&self, input: NewCar) -> Result<Car> {
        let car = Car {
            id: self.next_id()?,
            model: input.model,
            manufacturer_id: input.manufacturer_id,
        };
        let driver_ids: BTreeSet<u64> = input.driver_ids.into_iter().collect();

        (
            &self.manufacturers,
            &self.cars,
            &self.drivers,
            self.assignments.by_car(),
            self.assignments.by_driver(),
        )
            .transaction(|(manufacturers, cars, drivers, by_car, by_driver)| {
                tx_require::<Manufacturer>(manufacturers, car.manufacturer_id)?;
                for driver_id in &driver_ids {
                    tx_require::<Driver>(drivers, *driver_id)?;
                    AssignmentTable::tx_insert(by_car, by_driver, *driver_id, car.id)?;
                }
                tx_put(cars, &car)
            })?;

        tracing::debug!(id = car.id, model = %car.model, drivers = driver_ids.len(), "car created");
        Ok(car)
    }

    /// Update a car's fields and replace its assigned-driver set.
    pub fn update_car(&self, id: u64, input: NewCar) -> Result<Car> {
        let wanted: BTreeSet<u64> = input.driver_ids.iter().copied().collect();

        let car = self.with_driver_snapshot(id, |current, version| {
            let result: TransactionResult<Car, Error> = (
                &self.manufacturers,
                &self.cars,
                &self.drivers,
                self.assignments.by_car(),
                self.assignments.by_driver(),
            )
                .transaction(|(manufacturers, cars, drivers, by_car, by_driver)| {
                    let mut car: Car = tx_require(cars, id)?;
                    tx_require::<Manufacturer>(manufacturers, input.manufacturer_id)?;
                    Self::tx_replace_drivers(
                        drivers, by_car, by_driver, id, current, version, &wanted,
                    )?;

                    car.model = input.model.clone();
                    car.manufacturer_id = input.manufacturer_id;
                    tx_put(cars, &car)?;
                    Ok(car)
                });
            Ok(result?)
        })?;

        tracing::debug!(id, "car updated");
        Ok(car)
    }

    /// Replace the full set of drivers assigned to a car.
    pub fn set_car_drivers(&self, car_id: u64, driver_ids: &[u64]) -> Result<()> {
        let wanted: BTreeSet<u64> = driver_ids.iter().copied().collect();

        self.with_driver_snapshot(car_id, |current, version| {
            let result: TransactionResult<(), Error> = (
                &self.cars,
                &self.drivers,
                self.assignments.by_car(),
                self.assignments.by_driver(),
            )
                .transaction(|(cars, drivers, by_car, by_driver)| {
                    tx_require::<Car>(cars, car_id)?;
                    Self::tx_replace_drivers(
                        drivers, by_car, by_driver, car_id, current, version, &wanted,
                    )
                });
            Ok(result?)
        })
    }

    /// Run `write` against a scan of the car's current drivers and the
    /// assignment version read before it. `write` fails with
    /// [`Error::Conflict`] when the version moved in between, in which case
    /// the scan is retaken.
    fn with_driver_snapshot<T>(
        &self,
        car_id: u64,
        write: impl Fn(&BTreeSet<u64>, u64) -> Result<T>,
    ) -> Result<T> {
        let mut attempt = 1;
        loop {
            let version = self.assignments.version(car_id)?;
            let current: BTreeSet<u64> = self
                .assignments
                .drivers_for_car(car_id)?
                .into_iter()
                .collect();

            match write(&current, version) {
                Err(Error::Conflict { .. }) if attempt < MAX_SNAPSHOT_ATTEMPTS => {
                    tracing::debug!(car_id, attempt, "assignments moved, rescanning");
                    attempt += 1;
                }
                result => return result,
            }
        }
    }

    fn tx_replace_drivers(
        drivers: &TransactionalTree,
        by_car: &TransactionalTree,
        by_driver: &TransactionalTree,
        car_id: u64,
        current: &BTreeSet<u64>,
        version: u64,
        wanted: &BTreeSet<u64>,
    ) -> ConflictableTransactionResult<(), Error> {
        if AssignmentTable::tx_version(by_car, car_id)? != version {
            return Err(ConflictableTransactionError::Abort(Error::Conflict {
                entity: Car::NAME,
                id: car_id,
            }));
        }
        for driver_id in current.difference(wanted) {
            AssignmentTable::tx_remove(by_car, by_driver, *driver_id, car_id)?;
        }
        for driver_id in wanted.difference(current) {
            tx_require::<Driver>(drivers, *driver_id)?;
            AssignmentTable::tx_insert(by_car, by_driver, *driver_id, car_id)?;
        }
        Ok(())
    }

    /// Delete a car and its assignments.
    pub fn delete_car(&self, id: u64) -> Result<()> {
        let result: TransactionResult<(), Error> = self.cars.transaction(|cars| {
            tx_require::<Car>(cars, id)?;
            cars.remove(encode_id(id).to_vec())?;
            Ok(())
        });
        result?;
        self.sweep_car_rows(id)?;

        tracing::info!(id, "car deleted");
        Ok(())
    }

    /// Delete a car only if it still belongs to `manufacturer_id`.
    fn delete_owned_car(&self, car_id: u64, manufacturer_id: u64) -> Result<bool> {
        let result: TransactionResult<bool, Error> = self.cars.transaction(|cars| {
            match tx_get::<Car>(cars, car_id)? {
                Some(car) if car.manufacturer_id == manufacturer_id => {
                    cars.remove(encode_id(car_id).to_vec())?;
                    Ok(true)
                }
                _ => Ok(false),
            }
        });
        let removed = result?;
        if removed {
            self.sweep_car_rows(car_id)?;
        }
        Ok(removed)
    }

    /// Remove every assignment row of a deleted car.
    ///
    /// Assigning requires the car inside the same transaction, so once the
    /// record is gone the scan cannot miss a row.
    fn sweep_car_rows(&self, car_id: u64) -> Result<()> {
        let driver_ids = self.assignments.drivers_for_car(car_id)?;

        let result: TransactionResult<(), Error> =
            (self.assignments.by_car(), self.assignments.by_driver()).transaction(
                |(by_car, by_driver)| {
                    for driver_id in &driver_ids {
                        AssignmentTable::tx_remove(by_car, by_driver, *driver_id, car_id)?;
                    }
                    AssignmentTable::tx_clear_version(by_car, car_id)?;
                    Ok(())
                },
            );
        result?;
        Ok(())
    }

    // ========== Drivers ==========

    /// Create a driver, hashing the raw password.
    ///
    /// Username and license number are claimed in the unique index in the
    /// same transaction that writes the record.
    pub fn create_driver(&self, input: NewDriver) -> Result<Driver> {
        let driver = Driver {
            id: self.next_id()?,
            username: input.username,
            password_hash: password::hash_password(&input.password, self.password_iterations),
            first_name: input.first_name,
            last_name: input.last_name,
            license_number: input.license_number,
            is_staff: input.is_staff,
        };

        (&self.drivers, self.unique.tree()).transaction(|(drivers, unique)| {
            UniqueIndex::claim(unique, Driver::NAME, USERNAME_FIELD, &driver.username, driver.id)?;
            if let Some(license) = &driver.license_number {
                UniqueIndex::claim(
                    unique,
                    Driver::NAME,
                    LICENSE_NUMBER_FIELD,
                    license.as_str(),
                    driver.id,
                )?;
            }
            tx_put(drivers, &driver)
        })?;

        tracing::info!(id = driver.id, username = %driver.username, "driver created");
        Ok(driver)
    }

    /// Replace a driver's license number.
    pub fn update_driver_license(
        &self,
        id: u64,
        license_number: Option<LicenseNumber>,
    ) -> Result<Driver> {
        let result: TransactionResult<Driver, Error> =
            (&self.drivers, self.unique.tree()).transaction(|(drivers, unique)| {
                let mut driver: Driver = tx_require(drivers, id)?;
                if driver.license_number == license_number {
                    return Ok(driver);
                }

                if let Some(old) = &driver.license_number {
                    UniqueIndex::release(unique, Driver::NAME, LICENSE_NUMBER_FIELD, old.as_str())?;
                }
                if let Some(new) = &license_number {
                    UniqueIndex::claim(unique, Driver::NAME, LICENSE_NUMBER_FIELD, new.as_str(), id)?;
                }

                driver.license_number = license_number.clone();
                tx_put(drivers, &driver)?;
                Ok(driver)
            });
        let driver = result?;

        tracing::debug!(id, "driver license updated");
        Ok(driver)
    }

    /// Replace a driver's password.
    pub fn set_password(&self, id: u64, raw: &str) -> Result<Driver> {
        let password_hash = password::hash_password(raw, self.password_iterations);

        let result: TransactionResult<Driver, Error> = self.drivers.transaction(|drivers| {
            let mut driver: Driver = tx_require(drivers, id)?;
            driver.password_hash = password_hash.clone();
            tx_put(drivers, &driver)?;
            Ok(driver)
        });

        Ok(result?)
    }

    /// Delete a driver, its unique index entries and its assignments.
    ///
    /// The record goes first, then its rows are swept. Assigning requires the
    /// driver inside the same transaction, so no row can appear after the
    /// record is gone.
    pub fn delete_driver(&self, id: u64) -> Result<()> {
        let result: TransactionResult<(), Error> = (&self.drivers, self.unique.tree())
            .transaction(|(drivers, unique)| {
                let driver: Driver = tx_require(drivers, id)?;
                UniqueIndex::release(unique, Driver::NAME, USERNAME_FIELD, &driver.username)?;
                if let Some(license) = &driver.license_number {
                    UniqueIndex::release(
                        unique,
                        Driver::NAME,
                        LICENSE_NUMBER_FIELD,
                        license.as_str(),
                    )?;
                }
                drivers.remove(encode_id(id).to_vec())?;
                Ok(())
            });
        result?;

        let car_ids = self.assignments.cars_for_driver(id)?;
        let result: TransactionResult<(), Error> =
            (self.assignments.by_car(), self.assignments.by_driver()).transaction(
                |(by_car, by_driver)| {
                    for car_id in &car_ids {
                        AssignmentTable::tx_remove(by_car, by_driver, id, *car_id)?;
                    }
                    Ok(())
                },
            );
        result?;

        tracing::info!(id, "driver deleted");
        Ok(())
    }

    pub fn find_driver_by_username(&self, username: &str) -> Result<Option<Driver>> {
        match self.unique.lookup(Driver::NAME, USERNAME_FIELD, username)? {
            Some(id) => self.find(id),
            None => Ok(None),
        }
    }

    /// Check credentials, returning the driver on success.
    pub fn authenticate(&self, username: &str, raw_password: &str) -> Result<Option<Driver>> {
        Ok(self
            .find_driver_by_username(username)?
            .filter(|driver| driver.check_password(raw_password)))
    }

    pub fn is_username_available(&self, username: &str) -> Result<bool> {
        self.unique
            .is_available(Driver::NAME, USERNAME_FIELD, username, None)
    }

    /// Whether a license number is free, or already belongs to `exclude_id`.
    pub fn is_license_available(
        &self,
        license_number: &LicenseNumber,
        exclude_id: Option<u64>,
    ) -> Result<bool> {
        self.unique.is_available(
            Driver::NAME,
            LICENSE_NUMBER_FIELD,
            license_number.as_str(),
            exclude_id,
        )
    }

    // ========== Assignments ==========

    pub fn is_assigned(&self, driver_id: u64, car_id: u64) -> Result<bool> {
        self.assignments.contains(driver_id, car_id)
    }

    /// Add a driver to a car. Returns false when already assigned.
    pub fn assign(&self, driver_id: u64, car_id: u64) -> Result<bool> {
        self.set_membership(driver_id, car_id, Some(Membership::Assigned))
            .map(|(changed, _)| changed)
    }

    /// Remove a driver from a car. Returns false when not assigned.
    pub fn unassign(&self, driver_id: u64, car_id: u64) -> Result<bool> {
        self.set_membership(driver_id, car_id, Some(Membership::Unassigned))
            .map(|(changed, _)| changed)
    }

    /// Flip the acting driver's membership in a car's driver set.
    ///
    /// The membership read and the write happen in one transaction.
    pub fn toggle_assignment(&self, actor: &Actor, car_id: u64) -> Result<Membership> {
        let (_, membership) = self.set_membership(actor.driver_id, car_id, None)?;

        tracing::info!(
            driver_id = actor.driver_id,
            car_id,
            assigned = membership.is_assigned(),
            "assignment toggled"
        );
        Ok(membership)
    }

    /// Move a (driver, car) pair to `target`, or invert it when `target` is
    /// None. Returns whether anything changed and the resulting membership.
    fn set_membership(
        &self,
        driver_id: u64,
        car_id: u64,
        target: Option<Membership>,
    ) -> Result<(bool, Membership)> {
        let result: TransactionResult<(bool, Membership), Error> = (
            &self.cars,
            &self.drivers,
            self.assignments.by_car(),
            self.assignments.by_driver(),
        )
            .transaction(|(cars, drivers, by_car, by_driver)| {
                tx_require::<Car>(cars, car_id)?;
                tx_require::<Driver>(drivers, driver_id)?;

                let current = Membership::from(AssignmentTable::tx_contains(
                    by_car, driver_id, car_id,
                )?);
                let next = target.unwrap_or(match current {
                    Membership::Assigned => Membership::Unassigned,
                    Membership::Unassigned => Membership::Assigned,
                });

                if next == current {
                    return Ok((false, current));
                }
                match next {
                    Membership::Assigned => {
                        AssignmentTable::tx_insert(by_car, by_driver, driver_id, car_id)?
                    }
                    Membership::Unassigned => {
                        AssignmentTable::tx_remove(by_car, by_driver, driver_id, car_id)?
                    }
                }
                Ok((true, next))
            });

        Ok(result?)
    }

    /// Cars a driver is assigned to, by id.
    pub fn cars_for_driver(&self, driver_id: u64) -> Result<Vec<Car>> {
        self.load_all(self.assignments.cars_for_driver(driver_id)?)
    }

    /// Drivers assigned to a car, by id.
    pub fn drivers_for_car(&self, car_id: u64) -> Result<Vec<Driver>> {
        self.load_all(self.assignments.drivers_for_car(car_id)?)
    }

    fn load_all<E: Entity>(&self, ids: Vec<u64>) -> Result<Vec<E>> {
        let mut items = Vec::with_capacity(ids.len());
        for id in ids {
            match self.find::<E>(id)? {
                Some(entity) => items.push(entity),
                None => tracing::warn!(entity = E::NAME, id, "dangling assignment row"),
            }
        }
        Ok(items)
    }
}

fn tx_get<E: Entity>(
    tree: &TransactionalTree,
    id: u64,
) -> ConflictableTransactionResult<Option<E>, Error> {
    match tree.get(encode_id(id))? {
        Some(bytes) => E::from_bytes(&bytes)
            .map(Some)
            .map_err(ConflictableTransactionError::Abort),
        None => Ok(None),
    }
}

fn tx_require<E: Entity>(
    tree: &TransactionalTree,
    id: u64,
) -> ConflictableTransactionResult<E, Error> {
    tx_get(tree, id)?.ok_or(ConflictableTransactionError::Abort(Error::not_found(E::NAME, id)))
}

fn tx_put<E: Entity>(tree: &TransactionalTree, entity: &E) -> ConflictableTransactionResult<(), Error> {
    let bytes = entity
        .to_bytes()
        .map_err(ConflictableTransactionError::Abort)?;
    tree.insert(encode_id(entity.id()).to_vec(), bytes)?;
    Ok(())
}
