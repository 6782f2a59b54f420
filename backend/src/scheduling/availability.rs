//! Availability index.
//!
//! Turns a date and a job duration into the ordered list of start times
//! inside business hours, each paired with the first technician (by
//! ascending id) who has nothing booked over that interval.
//!
//! # Time Model
//! Times are minutes since midnight. Intervals are half-open `[start, end)`,
//! so a job ending at 10:00 does not collide with one starting at 10:00.

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use std::sync::Arc;

use super::config::{BusinessHours, SchedulingConfig};
use crate::store::{BookedInterval, SchedulingStore, StorageResult};

/// A time interval [start, end) in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: u32,
    pub end: u32,
}

impl TimeWindow {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn starting_at(start: u32, duration: u32) -> Self {
        Self::new(start, start + duration)
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Whether two windows share any minute. An empty window overlaps nothing.
    pub fn overlaps(&self, other: &Self) -> bool {
        !self.is_empty() && !other.is_empty() && self.start < other.end && other.start < self.end
    }
}

/// A start time and the technician who would take it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct OpenSlot {
    pub time: NaiveTime,
    pub technician_id: i64,
}

/// Candidate start times for a job of `duration` minutes, stepping by
/// `granularity` from opening to the last start that still ends by closing.
/// Any start whose interval touches lunch is dropped.
pub fn candidate_starts(hours: &BusinessHours, granularity: u32, duration: u32) -> Vec<u32> {
    if duration == 0 || granularity == 0 || hours.start + duration > hours.end {
        return Vec::new();
    }

    let lunch = hours.lunch();
    (hours.start..=hours.end - duration)
        .step_by(granularity as usize)
        .filter(|&start| !TimeWindow::starting_at(start, duration).overlaps(&lunch))
        .collect()
}

/// Pairs each candidate start with the first free technician.
///
/// `technician_ids` must already be in the order technicians are tried.
/// A pairing listed in `held` is skipped without blocking any other start.
/// Start times with nobody free are left out.
pub fn open_slots(
    hours: &BusinessHours,
    granularity: u32,
    duration: u32,
    technician_ids: &[i64],
    booked: &[BookedInterval],
    held: &[OpenSlot],
) -> Vec<OpenSlot> {
    candidate_starts(hours, granularity, duration)
        .into_iter()
        .filter_map(|start| {
            let time = time_of(start);
            let wanted = TimeWindow::starting_at(start, duration);
            technician_ids
                .iter()
                .copied()
                .map(|technician_id| OpenSlot { time, technician_id })
                .find(|slot| {
                    !held.contains(slot)
                        && !booked.iter().any(|existing| {
                            existing.technician_id == slot.technician_id && existing.window().overlaps(&wanted)
                        })
                })
        })
        .collect()
}

pub fn time_of(minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(minutes / 60, minutes % 60, 0).unwrap_or(NaiveTime::MIN)
}

#[derive(Clone)]
pub struct AvailabilityIndex {
    store: Arc<dyn SchedulingStore>,
    config: Arc<SchedulingConfig>,
}

impl AvailabilityIndex {
    pub fn new(store: Arc<dyn SchedulingStore>, config: Arc<SchedulingConfig>) -> Self {
        Self { store, config }
    }

    /// Open slots on `date` across every active technician.
    pub async fn available_slots(&self, date: NaiveDate, duration: u32) -> StorageResult<Vec<OpenSlot>> {
        let mut technician_ids: Vec<i64> = self
            .store
            .active_technicians()
            .await?
            .into_iter()
            .filter(|t| t.active)
            .map(|t| t.id)
            .collect();
        technician_ids.sort_unstable();

        self.available_slots_among(date, duration, &technician_ids, &[]).await
    }

    /// Open slots on `date` considering only `technician_ids`, never
    /// offering one of the exact pairings in `held`.
    pub async fn available_slots_among(
        &self,
        date: NaiveDate,
        duration: u32,
        technician_ids: &[i64],
        held: &[OpenSlot],
    ) -> StorageResult<Vec<OpenSlot>> {
        if technician_ids.is_empty() {
            return Ok(Vec::new());
        }

        let booked = self.store.booked_intervals(date).await?;

        Ok(open_slots(
            &self.config.business_hours,
            self.config.slot_granularity_minutes,
            duration,
            technician_ids,
            &booked,
            held,
        ))
    }
}
