//! Slot search.
//!
//! First-fit walk over candidate dates, then start times, then technician
//! ids. The first slot that suits the customer's preferred day-parts wins;
//! priority is carried on the job but never reorders the walk.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Timelike, Weekday};
use hvacpro_shared::DayPart;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::availability::{AvailabilityIndex, OpenSlot};
use super::config::SchedulingConfig;
use super::matcher::TechnicianMatcher;
use super::service::ScheduleRequest;
use crate::store::{SchedulingStore, StorageResult};

/// A feasible assignment that has not been committed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SlotCandidate {
    pub technician_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub duration_minutes: u32,
}

impl SlotCandidate {
    fn as_open_slot(&self) -> OpenSlot {
        OpenSlot {
            time: self.time,
            technician_id: self.technician_id,
        }
    }
}

/// Why a request could not be placed. These are expected answers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoSlotReason {
    UnknownCustomer,
    NoEligibleTechnician,
    NoAvailableSlot,
}

impl NoSlotReason {
    pub fn describe(&self) -> &'static str {
        match self {
            NoSlotReason::UnknownCustomer => "Customer does not exist",
            NoSlotReason::NoEligibleTechnician => "No technician has the skills for this job type",
            NoSlotReason::NoAvailableSlot => "No available slots found.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchOutcome {
    Found(SlotCandidate),
    NotFound(NoSlotReason),
}

/// Parses a `YYYY-MM-DD` preferred date. Anything unparseable counts as absent.
pub fn parse_preferred_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }

    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(e) => {
            warn!(preferred_date = raw, error = %e, "Ignoring invalid preferred date");
            None
        }
    }
}

/// Exactly the preferred date when there is one, otherwise `window_days`
/// consecutive days starting today.
pub fn candidate_dates(today: NaiveDate, preferred: Option<NaiveDate>, window_days: u32) -> Vec<NaiveDate> {
    match preferred {
        Some(date) => vec![date],
        None => (0..window_days as i64)
            .map(|offset| today + Duration::days(offset))
            .collect(),
    }
}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// No preference accepts anything.
pub fn suits_preferences(preferences: &BTreeSet<DayPart>, time: NaiveTime) -> bool {
    preferences.is_empty() || preferences.contains(&DayPart::from_hour(time.hour()))
}

#[derive(Clone)]
pub struct SlotSearch {
    store: Arc<dyn SchedulingStore>,
    config: Arc<SchedulingConfig>,
    index: AvailabilityIndex,
    matcher: TechnicianMatcher,
}

impl SlotSearch {
    pub fn new(store: Arc<dyn SchedulingStore>, config: Arc<SchedulingConfig>) -> Self {
        Self {
            index: AvailabilityIndex::new(store.clone(), config.clone()),
            matcher: TechnicianMatcher::new(store.clone(), config.clone()),
            store,
            config,
        }
    }

    /// Finds the first acceptable slot for `request`.
    ///
    /// Only technicians eligible for the job type are paired with start
    /// times, so a free but unqualified technician never hides a qualified one.
    ///
    /// `held` lists slots lost to a concurrent commit. Each exact
    /// technician, date and time is skipped; the winner's booking is
    /// already visible in storage.
    pub async fn find_slot(
        &self,
        request: &ScheduleRequest,
        today: NaiveDate,
        held: &[SlotCandidate],
    ) -> StorageResult<SearchOutcome> {
        let Some(customer) = self.store.customer(request.customer_id).await? else {
            return Ok(SearchOutcome::NotFound(NoSlotReason::UnknownCustomer));
        };
        let preferences = customer.day_parts();

        let eligible = self.matcher.eligible_technician_ids(request.job_type).await?;
        if eligible.is_empty() {
            debug!(job_type = %request.job_type, "No eligible technicians");
            return Ok(SearchOutcome::NotFound(NoSlotReason::NoEligibleTechnician));
        }
        // BTreeSet iterates in ascending id order
        let eligible: Vec<i64> = eligible.into_iter().collect();

        let duration = *self.config.durations.get(request.job_type);
        let preferred = parse_preferred_date(request.preferred_date.as_deref());

        for date in candidate_dates(today, preferred, self.config.search_window_days) {
            if is_weekend(date) {
                debug!(%date, "Skipping weekend");
                continue;
            }

            let held_on_date: Vec<OpenSlot> = held
                .iter()
                .filter(|slot| slot.date == date)
                .map(SlotCandidate::as_open_slot)
                .collect();

            let slots = self
                .index
                .available_slots_among(date, duration, &eligible, &held_on_date)
                .await?;
            debug!(%date, open = slots.len(), "Checked availability");

            if let Some(slot) = slots
                .into_iter()
                .find(|slot| suits_preferences(&preferences, slot.time))
            {
                return Ok(SearchOutcome::Found(SlotCandidate {
                    technician_id: slot.technician_id,
                    date,
                    time: slot.time,
                    duration_minutes: duration,
                }));
            }
        }

        Ok(SearchOutcome::NotFound(NoSlotReason::NoAvailableSlot))
    }
}
