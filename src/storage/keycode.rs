//! Order-preserving key encoding.
//!
//! Keys are bincode with big-endian fixed-width integers, so the byte order
//! of encoded keys matches the numeric order of their fields, and an enum
//! variant's encoding is a prefix of every key built from that variant.

use bincode::Options;
use serde::{Deserialize, Serialize};

use crate::error::Result;

fn key_options() -> impl Options {
    bincode::DefaultOptions::new()
        .with_big_endian()
        .with_fixint_encoding()
        .reject_trailing_bytes()
}

pub fn serialize_key<T: Serialize>(key: &T) -> Result<Vec<u8>> {
    Ok(key_options().serialize(key)?)
}

pub fn deserialize_key<'a, T: Deserialize<'a>>(bytes: &'a [u8]) -> Result<T> {
    Ok(key_options().deserialize(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::{deserialize_key, serialize_key};
    use crate::error::Result;

    #[test]
    fn test_integers_sort_numerically() -> Result<()> {
        let small = serialize_key(&(1u32, 2u64))?;
        let large = serialize_key(&(1u32, 256u64))?;
        assert_eq!(small, vec![0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0, 2]);
        assert!(small < large);

        let (a, b): (u32, u64) = deserialize_key(&large)?;
        assert_eq!((a, b), (1, 256));
        Ok(())
    }

    #[test]
    fn test_trailing_bytes_rejected() -> Result<()> {
        let mut bytes = serialize_key(&7u32)?;
        bytes.push(0);
        assert!(deserialize_key::<u32>(&bytes).is_err());
        Ok(())
    }
}
