use crate::{hashing, BlockNumber, Td};
use ferra_hashes::Hash;
use serde::{Deserialize, Serialize};

/// An immutable block header. Created by deserialization from the wire and
/// finalized once; never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Cached hash
    pub hash: Hash,
    pub parent_hash: Hash,
    pub number: BlockNumber,
    pub difficulty: Td,
    /// Timestamp is in seconds
    pub timestamp: u64,
}

impl Header {
    pub fn new_finalized(parent_hash: Hash, number: BlockNumber, difficulty: Td, timestamp: u64) -> Self {
        let mut header = Self {
            hash: Default::default(), // Temp init before the finalize below
            parent_hash,
            number,
            difficulty,
            timestamp,
        };
        header.finalize();
        header
    }

    /// Finalizes the header and recomputes the header hash
    pub fn finalize(&mut self) {
        self.hash = hashing::header::hash(self);
    }

    /// WARNING: To be used for test purposes only
    pub fn from_precomputed_hash(hash: Hash, parent_hash: Hash, number: BlockNumber) -> Header {
        Header { hash, parent_hash, number, difficulty: Td::ZERO, timestamp: 0 }
    }
}

impl AsRef<Header> for Header {
    fn as_ref(&self) -> &Header {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    #[test]
    fn test_header_ser() {
        let header = Header::new_finalized(Hash::from_u64(1), 5, Td::from(1_000_000u64), 234);
        let json = serde_json::to_string(&header).unwrap();

        let v = serde_json::from_str::<Value>(&json).unwrap();
        let number = v.get("number").expect("missing `number` property");
        assert_eq!(number.as_u64().expect("number is not a u64 compatible value"), 5);

        let h = serde_json::from_str::<Header>(&json).unwrap();
        assert!(h.difficulty == header.difficulty && h.hash == header.hash);
    }

    #[test]
    fn test_binary_round_trip() {
        let header = Header::new_finalized(Hash::from_u64(2), 7, Td::from(42u64), 1234);
        let bytes = bincode::serialize(&header).unwrap();
        let decoded: Header = bincode::deserialize(&bytes).unwrap();
        assert_eq!(decoded, header);
    }
}
