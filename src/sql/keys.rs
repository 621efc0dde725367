use serde::{Deserialize, Serialize};

use crate::{
    error::Result,
    sql::catalog::ObjectId,
    storage::keycode::{deserialize_key, serialize_key},
};

/// Storage key of a table row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Key {
    /// (schema id, table id, row id)
    Row(ObjectId, ObjectId, u64),
}

impl Key {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serialize_key(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self> {
        deserialize_key(bytes)
    }
}

/// Key prefixes for scans. Variants line up with `Key` so that an encoded
/// prefix is a byte prefix of the matching keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum KeyPrefix {
    /// Every row of one table
    Row(ObjectId, ObjectId),
}

impl KeyPrefix {
    pub fn encode(&self) -> Result<Vec<u8>> {
        serialize_key(self)
    }
}

#[cfg(test)]
mod tests {
    use super::{Key, KeyPrefix};
    use crate::error::Result;

    #[test]
    fn test_row_key_prefix() -> Result<()> {
        let key = Key::Row(2, 3, 300).encode()?;
        let prefix = KeyPrefix::Row(2, 3).encode()?;
        assert!(key.starts_with(&prefix));
        assert!(!key.starts_with(&KeyPrefix::Row(2, 4).encode()?));
        assert_eq!(Key::decode(&key)?, Key::Row(2, 3, 300));
        Ok(())
    }

    #[test]
    fn test_row_keys_sort_by_row_id() -> Result<()> {
        let low = Key::Row(1, 1, 2).encode()?;
        let high = Key::Row(1, 1, 256).encode()?;
        assert!(low < high);
        // a later table sorts after every row of an earlier one
        assert!(high < Key::Row(1, 2, 0).encode()?);
        Ok(())
    }
}
