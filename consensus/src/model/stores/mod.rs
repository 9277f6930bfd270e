pub mod canonical;
pub mod chain;
pub mod head;
pub mod headers;
pub mod total_difficulty;

pub use ferra_database::prelude::DB;

use ferra_hashes::{Hash, HASH_SIZE};
use std::fmt::{Debug, Display};
use std::mem::size_of;

pub const BLOCK_KEY_SIZE: usize = size_of::<u64>() + HASH_SIZE;

/// Key for header-indexed tables: `big_endian(number) || hash`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockKey([u8; BLOCK_KEY_SIZE]);

impl BlockKey {
    pub fn new(number: u64, hash: Hash) -> Self {
        let mut bytes = [0u8; BLOCK_KEY_SIZE];
        bytes[..size_of::<u64>()].copy_from_slice(&number.to_be_bytes());
        bytes[size_of::<u64>()..].copy_from_slice(hash.as_ref());
        Self(bytes)
    }

    pub fn number(&self) -> u64 {
        u64::from_be_bytes(self.0[..size_of::<u64>()].try_into().unwrap())
    }

    pub fn hash(&self) -> Hash {
        Hash::from_slice(&self.0[size_of::<u64>()..])
    }
}

impl AsRef<[u8]> for BlockKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.number(), self.hash())
    }
}

impl Debug for BlockKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Key for number-indexed tables: `big_endian(number)`
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NumberKey([u8; size_of::<u64>()]);

impl NumberKey {
    pub fn new(number: u64) -> Self {
        Self(number.to_be_bytes())
    }

    pub fn number(&self) -> u64 {
        u64::from_be_bytes(self.0)
    }
}

impl AsRef<[u8]> for NumberKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Display for NumberKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(&self.number(), f)
    }
}

impl Debug for NumberKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_key_layout() {
        let hash = Hash::from_u64(3);
        let key = BlockKey::new(0x0102030405060708, hash);
        assert_eq!(&key.as_ref()[..8], &[1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(&key.as_ref()[8..], hash.as_ref());
        assert_eq!(key.number(), 0x0102030405060708);
        assert_eq!(key.hash(), hash);
    }

    #[test]
    fn test_number_key_layout() {
        let key = NumberKey::new(258);
        assert_eq!(key.as_ref(), &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(key.to_string(), "258");
    }
}
