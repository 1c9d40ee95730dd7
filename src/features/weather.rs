//! Weather markers parsed from free-text game conditions

use regex::Regex;

use crate::{PickemError, Result};

const INDOOR_PATTERN: &str = r"(?i)indoor|retractable";
const PRECIPITATION_PATTERN: &str = r"(?i)rain|snow";

/// Case-insensitive matchers for the weather detail column
#[derive(Debug, Clone)]
pub struct WeatherMarkers {
    indoor: Regex,
    precipitation: Regex,
}

impl WeatherMarkers {
    pub fn new() -> Result<Self> {
        let compile = |pattern: &str| {
            Regex::new(pattern)
                .map_err(|e| PickemError::Config(format!("Bad weather pattern {}: {}", pattern, e)))
        };
        Ok(WeatherMarkers {
            indoor: compile(INDOOR_PATTERN)?,
            precipitation: compile(PRECIPITATION_PATTERN)?,
        })
    }

    /// Dome or retractable roof; missing detail counts as outdoor
    pub fn is_indoor(&self, detail: Option<&str>) -> bool {
        detail.map_or(false, |d| self.indoor.is_match(d))
    }

    pub fn has_precipitation(&self, detail: Option<&str>) -> bool {
        detail.map_or(false, |d| self.precipitation.is_match(d))
    }
}
