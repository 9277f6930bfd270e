pub mod api;
pub mod hashing;
pub mod header;

/// Sequential block index from genesis
pub type BlockNumber = u64;

/// The type used to represent header difficulty and accumulated (total) difficulty
pub type Td = alloy_primitives::U256;
