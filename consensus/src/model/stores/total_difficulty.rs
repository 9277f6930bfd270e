use super::BlockKey;
use ferra_consensus_core::Td;
use ferra_database::prelude::{BatchDbWriter, CachedDbAccess, StoreResult, DB};
use ferra_database::registry::DatabaseStorePrefixes;
use ferra_hashes::Hash;
use rocksdb::WriteBatch;
use serde::{de::Visitor, Deserialize, Deserializer, Serialize, Serializer};
use std::sync::Arc;

/// Total difficulty persisted as a minimal big-endian byte string. The binary
/// codec supplies the length prefix, keeping stored values compact regardless
/// of magnitude.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompactTd(Td);

impl CompactTd {
    pub fn new(td: Td) -> Self {
        Self(td)
    }

    pub fn td(&self) -> Td {
        self.0
    }
}

impl Serialize for CompactTd {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_bytes(&self.0.to_be_bytes_trimmed_vec())
    }
}

impl<'de> Deserialize<'de> for CompactTd {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CompactTdVisitor;

        impl Visitor<'_> for CompactTdVisitor {
            type Value = CompactTd;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                formatter.write_str("a big-endian byte string of at most 32 bytes")
            }

            fn visit_bytes<E: serde::de::Error>(self, v: &[u8]) -> Result<Self::Value, E> {
                Td::try_from_be_slice(v).map(CompactTd).ok_or_else(|| E::custom("total difficulty exceeds 256 bits"))
            }
        }

        deserializer.deserialize_bytes(CompactTdVisitor)
    }
}

pub trait TdStoreReader {
    fn get(&self, number: u64, hash: Hash) -> StoreResult<Td>;
}

/// A DB + cache implementation of the total-difficulty table
#[derive(Clone)]
pub struct DbTdStore {
    access: CachedDbAccess<BlockKey, CompactTd>,
}

impl DbTdStore {
    pub fn new(db: Arc<DB>, cache_size: u64) -> Self {
        Self { access: CachedDbAccess::new(db, cache_size, DatabaseStorePrefixes::TotalDifficulty.into()) }
    }

    pub fn insert_many(&self, batch: &mut WriteBatch, entries: &mut impl Iterator<Item = (u64, Hash, Td)>) -> StoreResult<()> {
        self.access.write_many_without_cache(
            BatchDbWriter::new(batch),
            &mut entries.map(|(number, hash, td)| (BlockKey::new(number, hash), CompactTd::new(td))),
        )
    }
}

impl TdStoreReader for DbTdStore {
    fn get(&self, number: u64, hash: Hash) -> StoreResult<Td> {
        Ok(self.access.read(BlockKey::new(number, hash))?.td())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compact_td_round_trip() {
        for value in [0u64, 1, 5, u64::MAX] {
            let td = CompactTd::new(Td::from(value));
            let bytes = bincode::serialize(&td).unwrap();
            let decoded: CompactTd = bincode::deserialize(&bytes).unwrap();
            assert_eq!(decoded, td);
        }

        let big = CompactTd::new(Td::MAX);
        let decoded: CompactTd = bincode::deserialize(&bincode::serialize(&big).unwrap()).unwrap();
        assert_eq!(decoded, big);
    }

    #[test]
    fn test_compact_td_is_length_prefixed_minimal_be() {
        let bytes = bincode::serialize(&CompactTd::new(Td::from(5u64))).unwrap();
        // u64 little-endian length prefix followed by the single significant byte
        assert_eq!(bytes, vec![1, 0, 0, 0, 0, 0, 0, 0, 5]);

        let bytes = bincode::serialize(&CompactTd::new(Td::from(0x0100u64))).unwrap();
        assert_eq!(bytes, vec![2, 0, 0, 0, 0, 0, 0, 0, 1, 0]);
    }
}
