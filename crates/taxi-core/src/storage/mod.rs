//! Storage layer.
//!
//! A single sled database holds one tree per entity, the unique index, and
//! the two halves of the assignment relation table. Every write that must
//! keep several trees consistent runs in one sled transaction.

mod assignment;
mod config;
mod store;
mod unique_index;

pub mod key;

pub use assignment::{AssignmentTable, Membership, BY_CAR_TREE, BY_DRIVER_TREE};
pub use config::StoreConfig;
pub use store::{FleetStats, FleetStore, LICENSE_NUMBER_FIELD, USERNAME_FIELD};
pub use unique_index::{UniqueIndex, UNIQUE_INDEX_TREE};
