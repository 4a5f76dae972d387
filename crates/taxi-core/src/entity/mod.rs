//! Domain entities.
//!
//! Each entity is stored whole (id included) as an rkyv record in its own
//! sled tree. The [`Entity`] trait carries what generic list/detail code
//! needs to know about a type: where it lives, which field the list search
//! matches against, and its default ordering.

/// Implement [`Record`] for an rkyv-archivable type.
macro_rules! rkyv_record {
    ($ty:ty) => {
        impl $crate::entity::Record for $ty {
            fn to_bytes(&self) -> $crate::error::Result<Vec<u8>> {
                rkyv::to_bytes::<rkyv::rancor::Error>(self)
                    .map(|v| v.to_vec())
                    .map_err(|e| $crate::error::Error::Serialization(e.to_string()))
            }

            fn from_bytes(bytes: &[u8]) -> $crate::error::Result<Self> {
                rkyv::from_bytes::<Self, rkyv::rancor::Error>(bytes)
                    .map_err(|e| $crate::error::Error::Deserialization(e.to_string()))
            }
        }
    };
}

mod car;
mod driver;
mod manufacturer;

pub use car::{Car, NewCar};
pub use driver::{Driver, NewDriver};
pub use manufacturer::{Manufacturer, NewManufacturer};

use std::cmp::Ordering;

use crate::error::Result;

/// Byte encoding of a stored record.
pub trait Record: Sized {
    /// Serialize the record to bytes.
    fn to_bytes(&self) -> Result<Vec<u8>>;

    /// Deserialize a record from bytes.
    fn from_bytes(bytes: &[u8]) -> Result<Self>;
}

/// A persisted domain entity.
pub trait Entity: Record + Clone + Send + Sync + 'static {
    /// Singular lowercase name, used in errors and template names.
    const NAME: &'static str;

    /// Sled tree holding the records.
    const TREE: &'static str;

    /// Field the list search matches against.
    const SEARCH_FIELD: &'static str;

    fn id(&self) -> u64;

    /// Value of [`Entity::SEARCH_FIELD`].
    fn search_value(&self) -> &str;

    /// Default list ordering. Insertion (id) order unless overridden.
    fn default_order(&self, other: &Self) -> Ordering {
        self.id().cmp(&other.id())
    }
}
