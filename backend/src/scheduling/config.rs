// Scheduling configuration - business hours, search window and job-type tables

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::availability::TimeWindow;
use super::catalog::{self, DurationTable, SkillTable};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid business hours: {0}")]
    InvalidBusinessHours(String),
    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),
}

/// Working day, expressed in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessHours {
    pub start: u32,
    pub end: u32,
    pub lunch_start: u32,
    pub lunch_end: u32,
}

impl Default for BusinessHours {
    fn default() -> Self {
        Self::from_hours(8, 18, 12, 13)
    }
}

impl BusinessHours {
    pub fn from_hours(start: u32, end: u32, lunch_start: u32, lunch_end: u32) -> Self {
        Self {
            start: start * 60,
            end: end * 60,
            lunch_start: lunch_start * 60,
            lunch_end: lunch_end * 60,
        }
    }

    pub fn lunch(&self) -> TimeWindow {
        TimeWindow::new(self.lunch_start, self.lunch_end)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.end > 24 * 60 {
            return Err(ConfigError::InvalidBusinessHours(format!(
                "closing time {} is past midnight",
                self.end
            )));
        }
        if self.start >= self.end {
            return Err(ConfigError::InvalidBusinessHours(format!(
                "opening time {} is not before closing time {}",
                self.start, self.end
            )));
        }
        if self.lunch_start > self.lunch_end {
            return Err(ConfigError::InvalidBusinessHours(format!(
                "lunch starts at {} but ends at {}",
                self.lunch_start, self.lunch_end
            )));
        }
        Ok(())
    }
}

/// Everything the scheduling components need, handed to each at construction.
#[derive(Debug, Clone)]
pub struct SchedulingConfig {
    pub business_hours: BusinessHours,
    /// Spacing between candidate start times.
    pub slot_granularity_minutes: u32,
    /// Rolling window searched when no preferred date is given.
    pub search_window_days: u32,
    /// Search-then-commit rounds before giving up on a contended calendar.
    pub max_allocation_attempts: u32,
    pub durations: DurationTable,
    pub skills: SkillTable,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            business_hours: BusinessHours::default(),
            slot_granularity_minutes: 30,
            search_window_days: 7,
            max_allocation_attempts: 3,
            durations: catalog::standard_durations(),
            skills: catalog::standard_skills(),
        }
    }
}

impl SchedulingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.business_hours.validate()?;
        if self.slot_granularity_minutes == 0 {
            return Err(ConfigError::MustBePositive("slot_granularity_minutes"));
        }
        if self.search_window_days == 0 {
            return Err(ConfigError::MustBePositive("search_window_days"));
        }
        if self.max_allocation_attempts == 0 {
            return Err(ConfigError::MustBePositive("max_allocation_attempts"));
        }
        Ok(())
    }
}
