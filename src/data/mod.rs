//! Season record ingestion
//!
//! Flat CSV tables of games, picks and team metadata held in memory.

pub mod records;
pub mod store;

pub use records::{AtsResult, GameKey, GameRecord, PickRecord, TeamMeta, Weather};
pub use store::{RecordStore, StoreStats};

#[cfg(test)]
pub(crate) mod testutil;
