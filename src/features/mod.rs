//! Feature extraction and encoding
//!
//! Converts games and hypothetical matchups into model-ready rows.

pub mod schema;
pub mod weather;

pub use schema::{ConferenceMap, FeatureKind, FeatureSchema, Matchup};
pub use weather::WeatherMarkers;
