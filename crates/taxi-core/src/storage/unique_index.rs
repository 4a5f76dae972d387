//! Secondary index for enforcing unique fields.
//!
//! Maps `entity\0field\0value` to the owning entity id. Claims and releases
//! run inside the caller's sled transaction so the uniqueness check and the
//! record write commit together.

use sled::transaction::{ConflictableTransactionError, ConflictableTransactionResult, TransactionalTree};
use sled::Tree;

use super::key::{decode_id, encode_id};
use crate::error::Error;

/// Tree name for the unique index.
pub const UNIQUE_INDEX_TREE: &str = "index:unique";

/// Secondary index for enforcing unique constraints.
pub struct UniqueIndex {
    tree: Tree,
}

impl UniqueIndex {
    /// Open or create the unique index from a sled database.
    pub fn open(db: &sled::Db) -> Result<Self, Error> {
        let tree = db.open_tree(UNIQUE_INDEX_TREE)?;
        Ok(Self { tree })
    }

    /// Build the index key for a field value.
    fn build_key(entity: &str, field: &str, value: &str) -> Vec<u8> {
        let mut key = Vec::with_capacity(entity.len() + field.len() + value.len() + 2);
        key.extend_from_slice(entity.as_bytes());
        key.push(0);
        key.extend_from_slice(field.as_bytes());
        key.push(0);
        key.extend_from_slice(value.as_bytes());
        key
    }

    /// Look up the id holding a value.
    pub fn lookup(&self, entity: &str, field: &str, value: &str) -> Result<Option<u64>, Error> {
        match self.tree.get(Self::build_key(entity, field, value))? {
            Some(bytes) => Ok(Some(decode_id(&bytes).ok_or(Error::InvalidKey)?)),
            None => Ok(None),
        }
    }

    /// Whether a value is free, or already held by `exclude_id`.
    pub fn is_available(
        &self,
        entity: &str,
        field: &str,
        value: &str,
        exclude_id: Option<u64>,
    ) -> Result<bool, Error> {
        Ok(match self.lookup(entity, field, value)? {
            Some(existing) => exclude_id == Some(existing),
            None => true,
        })
    }

    /// Claim a value for `id` inside a transaction.
    ///
    /// Aborts with [`Error::UniqueViolation`] when another id holds it.
    pub fn claim(
        tx: &TransactionalTree,
        entity: &'static str,
        field: &'static str,
        value: &str,
        id: u64,
    ) -> ConflictableTransactionResult<(), Error> {
        let key = Self::build_key(entity, field, value);

        if let Some(existing) = tx.get(&key)? {
            if decode_id(&existing) != Some(id) {
                return Err(ConflictableTransactionError::Abort(Error::UniqueViolation {
                    entity,
                    field,
                    value: value.to_string(),
                }));
            }
        }

        tx.insert(key, encode_id(id).to_vec())?;
        Ok(())
    }

    /// Release a value inside a transaction.
    pub fn release(
        tx: &TransactionalTree,
        entity: &str,
        field: &str,
        value: &str,
    ) -> ConflictableTransactionResult<(), Error> {
        tx.remove(Self::build_key(entity, field, value))?;
        Ok(())
    }

    pub(crate) fn tree(&self) -> &Tree {
        &self.tree
    }

    /// Get the number of entries in the index.
    pub fn len(&self) -> usize {
        self.tree.len()
    }

    /// Check if the index is empty.
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sled::transaction::TransactionResult;

    fn test_index() -> UniqueIndex {
        let db = sled::Config::new().temporary(true).open().unwrap();
        UniqueIndex::open(&db).unwrap()
    }

    fn claim(index: &UniqueIndex, value: &str, id: u64) -> TransactionResult<(), Error> {
        index
            .tree()
            .transaction(|tx| UniqueIndex::claim(tx, "driver", "license_number", value, id))
    }

    #[test]
    fn test_claim_and_lookup() {
        let index = test_index();
        claim(&index, "ABC12345", 1).unwrap();

        assert_eq!(
            index.lookup("driver", "license_number", "ABC12345").unwrap(),
            Some(1)
        );
        assert_eq!(
            index.lookup("driver", "license_number", "ABC12346").unwrap(),
            None
        );
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_unique_violation() {
        let index = test_index();
        claim(&index, "ABC12345", 1).unwrap();

        let result = claim(&index, "ABC12345", 2);
        match result.map_err(Error::from) {
            Err(Error::UniqueViolation { field, value, .. }) => {
                assert_eq!(field, "license_number");
                assert_eq!(value, "ABC12345");
            }
            other => panic!("expected UniqueViolation, got {other:?}"),
        }

        // The first holder keeps the value.
        assert_eq!(
            index.lookup("driver", "license_number", "ABC12345").unwrap(),
            Some(1)
        );
    }

    #[test]
    fn test_reclaim_by_same_id() {
        let index = test_index();
        claim(&index, "ABC12345", 1).unwrap();
        claim(&index, "ABC12345", 1).unwrap();
        assert_eq!(index.len(), 1);
    }

    #[test]
    fn test_release_and_availability() {
        let index = test_index();
        claim(&index, "ABC12345", 1).unwrap();

        assert!(!index.is_available("driver", "license_number", "ABC12345", None).unwrap());
        assert!(!index.is_available("driver", "license_number", "ABC12345", Some(2)).unwrap());
        assert!(index.is_available("driver", "license_number", "ABC12345", Some(1)).unwrap());

        index
            .tree()
            .transaction(|tx| UniqueIndex::release(tx, "driver", "license_number", "ABC12345"))
            .unwrap();
        assert!(index.is_available("driver", "license_number", "ABC12345", None).unwrap());
        assert!(index.is_empty());
    }

    #[test]
    fn test_fields_are_separate_namespaces() {
        let index = test_index();
        index
            .tree()
            .transaction(|tx| {
                UniqueIndex::claim(tx, "driver", "username", "ABC12345", 1)?;
                UniqueIndex::claim(tx, "driver", "license_number", "ABC12345", 2)
            })
            .unwrap();
        assert_eq!(index.lookup("driver", "username", "ABC12345").unwrap(), Some(1));
        assert_eq!(
            index.lookup("driver", "license_number", "ABC12345").unwrap(),
            Some(2)
        );
    }
}
