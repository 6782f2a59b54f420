// Storage collaborator for the scheduling core
//
// The scheduler never keeps state between calls; every read and the single
// allocation write go through a SchedulingStore.

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Timelike, Utc};
use hvacpro_shared::{Customer, JobType, JobWithDetails, Technician};
use rust_decimal::Decimal;
use std::time::Duration;
use thiserror::Error;

use crate::scheduling::availability::TimeWindow;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("Storage call timed out after {0:?}")]
    Timeout(Duration),
    #[error("Technician {technician_id} is already booked on {date} at {time}")]
    SlotTaken {
        technician_id: i64,
        date: NaiveDate,
        time: NaiveTime,
    },
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// An existing, non-cancelled assignment occupying a technician's calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookedInterval {
    pub technician_id: i64,
    pub start: NaiveTime,
    pub duration_minutes: u32,
}

impl BookedInterval {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(minutes_of(self.start), self.duration_minutes)
    }
}

/// Fields of a job about to be written in `scheduled` status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewJob {
    pub customer_id: i64,
    pub technician_id: i64,
    pub job_type: JobType,
    pub priority: i32,
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub estimated_duration: u32,
    pub notes: Option<String>,
}

impl NewJob {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::starting_at(minutes_of(self.scheduled_time), self.estimated_duration)
    }

    pub fn slot_taken(&self) -> StorageError {
        StorageError::SlotTaken {
            technician_id: self.technician_id,
            date: self.scheduled_date,
            time: self.scheduled_time,
        }
    }
}

pub fn minutes_of(time: NaiveTime) -> u32 {
    time.hour() * 60 + time.minute()
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SchedulingStore: Send + Sync {
    async fn customer(&self, id: i64) -> StorageResult<Option<Customer>>;

    /// All customers ordered by name.
    async fn customers(&self) -> StorageResult<Vec<Customer>>;

    /// Active technicians in ascending id order.
    async fn active_technicians(&self) -> StorageResult<Vec<Technician>>;

    /// Assignments on `date` that still hold a technician's time.
    async fn booked_intervals(&self, date: NaiveDate) -> StorageResult<Vec<BookedInterval>>;

    /// Writes the job and returns its id in one transaction. Fails with
    /// `StorageError::SlotTaken` when the technician already has an
    /// overlapping non-cancelled job that day.
    async fn insert_job(&self, job: &NewJob) -> StorageResult<i64>;

    async fn job_with_details(&self, id: i64) -> StorageResult<Option<JobWithDetails>>;

    /// Every job on `date`, ordered by start time.
    async fn jobs_on(&self, date: NaiveDate) -> StorageResult<Vec<JobWithDetails>>;

    async fn completed_revenue_since(&self, since: DateTime<Utc>) -> StorageResult<Decimal>;

    async fn completed_count_since(&self, since: DateTime<Utc>) -> StorageResult<i64>;

    /// Moves a scheduled job to completed. Returns false if it was not scheduled.
    async fn complete_job(
        &self,
        id: i64,
        job_value: Decimal,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<bool>;

    /// Moves a scheduled job to cancelled. Returns false if it was not scheduled.
    async fn cancel_job(&self, id: i64) -> StorageResult<bool>;
}
