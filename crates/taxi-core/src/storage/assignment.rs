//! Driver/car assignment relation table.
//!
//! Each assignment is stored twice, once keyed `(car_id, driver_id)` and once
//! keyed `(driver_id, car_id)`, so both "drivers of a car" and "cars of a
//! driver" are prefix scans. The two rows are always written in the same
//! transaction.
//!
//! `assign:by_car` also holds one 8-byte version key per car, bumped by every
//! change to that car's rows. Writers that rebuild a car's driver set from a
//! scan taken outside their transaction compare it to detect interleaved
//! toggles.

use serde::Serialize;
use sled::transaction::{
    ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree,
};
use sled::Tree;

use super::key::{decode_id, encode_id, PairKey, PAIR_KEY_SIZE};
use crate::error::Error;

/// Tree name for rows keyed by car.
pub const BY_CAR_TREE: &str = "assign:by_car";

/// Tree name for rows keyed by driver.
pub const BY_DRIVER_TREE: &str = "assign:by_driver";

const EMPTY: &[u8] = &[];

/// Membership of a driver in a car's assigned-driver set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Membership {
    Assigned,
    Unassigned,
}

impl Membership {
    pub fn is_assigned(self) -> bool {
        self == Membership::Assigned
    }
}

impl From<bool> for Membership {
    fn from(assigned: bool) -> Self {
        if assigned {
            Membership::Assigned
        } else {
            Membership::Unassigned
        }
    }
}

/// The assignment relation table.
pub struct AssignmentTable {
    by_car: Tree,
    by_driver: Tree,
}

impl AssignmentTable {
    /// Open or create the relation trees.
    pub fn open(db: &sled::Db) -> Result<Self, Error> {
        Ok(Self {
            by_car: db.open_tree(BY_CAR_TREE)?,
            by_driver: db.open_tree(BY_DRIVER_TREE)?,
        })
    }

    pub fn contains(&self, driver_id: u64, car_id: u64) -> Result<bool, Error> {
        Ok(self.by_car.contains_key(PairKey::new(car_id, driver_id).encode())?)
    }

    /// Ids of drivers assigned to a car, ascending.
    pub fn drivers_for_car(&self, car_id: u64) -> Result<Vec<u64>, Error> {
        Self::scan_right(&self.by_car, car_id)
    }

    /// Ids of cars a driver is assigned to, ascending.
    pub fn cars_for_driver(&self, driver_id: u64) -> Result<Vec<u64>, Error> {
        Self::scan_right(&self.by_driver, driver_id)
    }

    /// Change counter of a car's rows. Zero when never assigned.
    pub fn version(&self, car_id: u64) -> Result<u64, Error> {
        match self.by_car.get(encode_id(car_id))? {
            Some(bytes) => decode_id(&bytes).ok_or(Error::InvalidKey),
            None => Ok(0),
        }
    }

    fn scan_right(tree: &Tree, left: u64) -> Result<Vec<u64>, Error> {
        let mut ids = Vec::new();
        for key in tree.scan_prefix(PairKey::prefix(left)).keys() {
            let key = key?;
            // Skip the car's version key.
            if key.len() != PAIR_KEY_SIZE {
                continue;
            }
            ids.push(PairKey::decode(&key).ok_or(Error::InvalidKey)?.right);
        }
        Ok(ids)
    }

    pub(crate) fn by_car(&self) -> &Tree {
        &self.by_car
    }

    pub(crate) fn by_driver(&self) -> &Tree {
        &self.by_driver
    }

    // ========== Transactional row operations ==========

    pub(crate) fn tx_contains(
        by_car: &TransactionalTree,
        driver_id: u64,
        car_id: u64,
    ) -> ConflictableTransactionResult<bool, Error> {
        Ok(by_car
            .get(PairKey::new(car_id, driver_id).encode().to_vec())?
            .is_some())
    }

    pub(crate) fn tx_version(
        by_car: &TransactionalTree,
        car_id: u64,
    ) -> ConflictableTransactionResult<u64, Error> {
        match by_car.get(encode_id(car_id).to_vec())? {
            Some(bytes) => decode_id(&bytes)
                .ok_or(ConflictableTransactionError::Abort(Error::InvalidKey)),
            None => Ok(0),
        }
    }

    fn tx_bump_version(
        by_car: &TransactionalTree,
        car_id: u64,
    ) -> ConflictableTransactionResult<(), Error> {
        let next = Self::tx_version(by_car, car_id)?.wrapping_add(1);
        by_car.insert(encode_id(car_id).to_vec(), encode_id(next).to_vec())?;
        Ok(())
    }

    /// Drop a deleted car's version key.
    pub(crate) fn tx_clear_version(
        by_car: &TransactionalTree,
        car_id: u64,
    ) -> ConflictableTransactionResult<(), Error> {
        by_car.remove(encode_id(car_id).to_vec())?;
        Ok(())
    }

    /// Insert both rows. A no-op when the pair is already assigned.
    pub(crate) fn tx_insert(
        by_car: &TransactionalTree,
        by_driver: &TransactionalTree,
        driver_id: u64,
        car_id: u64,
    ) -> ConflictableTransactionResult<(), Error> {
        let previous = by_car.insert(PairKey::new(car_id, driver_id).encode().to_vec(), EMPTY)?;
        by_driver.insert(PairKey::new(driver_id, car_id).encode().to_vec(), EMPTY)?;
        if previous.is_none() {
            Self::tx_bump_version(by_car, car_id)?;
        }
        Ok(())
    }

    /// Remove both rows. A no-op when the pair is not assigned.
    pub(crate) fn tx_remove(
        by_car: &TransactionalTree,
        by_driver: &TransactionalTree,
        driver_id: u64,
        car_id: u64,
    ) -> ConflictableTransactionResult<(), Error> {
        let previous = by_car.remove(PairKey::new(car_id, driver_id).encode().to_vec())?;
        by_driver.remove(PairKey::new(driver_id, car_id).encode().to_vec())?;
        if previous.is_some() {
            Self::tx_bump_version(by_car, car_id)?;
        }
        Ok(())
    }
}
