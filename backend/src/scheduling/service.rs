// Scheduling service - public entry point composing search and allocation,
// plus the read-only queries behind the dashboard.

use chrono::{Datelike, Duration, NaiveDate};
use hvacpro_shared::{Customer, DashboardKpis, JobType, JobWithDetails, Technician};
use rust_decimal::Decimal;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{instrument, warn};
use validator::Validate;

use super::allocator::{Allocation, JobAllocator};
use super::availability::{AvailabilityIndex, OpenSlot};
use super::clock::Clock;
use super::config::SchedulingConfig;
use super::matcher::TechnicianMatcher;
use super::search::{NoSlotReason, SearchOutcome, SlotCandidate, SlotSearch};
use crate::store::{NewJob, SchedulingStore, StorageResult};

pub const DEFAULT_PRIORITY: i32 = 3;

/// Trailing window for the open-invoice proxy.
const OPEN_INVOICE_WINDOW_DAYS: i64 = 30;

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ScheduleRequest {
    pub customer_id: i64,
    pub job_type: JobType,
    #[serde(default = "default_priority")]
    #[validate(range(min = 1, max = 5))]
    pub priority: i32,
    /// `YYYY-MM-DD`; unparseable values fall back to the rolling window.
    #[serde(default)]
    pub preferred_date: Option<String>,
    #[serde(default)]
    #[validate(length(max = 2000))]
    pub notes: String,
}

impl ScheduleRequest {
    pub fn new(customer_id: i64, job_type: JobType) -> Self {
        Self {
            customer_id,
            job_type,
            priority: DEFAULT_PRIORITY,
            preferred_date: None,
            notes: String::new(),
        }
    }

    pub fn preferred_date(mut self, date: impl Into<String>) -> Self {
        self.preferred_date = Some(date.into());
        self
    }

    fn to_new_job(&self, slot: &SlotCandidate) -> NewJob {
        let notes = self.notes.trim();
        NewJob {
            customer_id: self.customer_id,
            technician_id: slot.technician_id,
            job_type: self.job_type,
            priority: self.priority,
            scheduled_date: slot.date,
            scheduled_time: slot.time,
            estimated_duration: slot.duration_minutes,
            notes: (!notes.is_empty()).then(|| notes.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub enum ScheduleOutcome {
    Scheduled(JobWithDetails),
    Unschedulable(NoSlotReason),
}

/// Start of the current week: the most recent Sunday, today included.
pub fn week_start(today: NaiveDate) -> NaiveDate {
    today - Duration::days(today.weekday().num_days_from_sunday() as i64)
}

pub struct SchedulingService {
    store: Arc<dyn SchedulingStore>,
    config: Arc<SchedulingConfig>,
    clock: Arc<dyn Clock>,
    index: AvailabilityIndex,
    matcher: TechnicianMatcher,
    search: SlotSearch,
    allocator: JobAllocator,
}

impl SchedulingService {
    pub fn new(store: Arc<dyn SchedulingStore>, config: SchedulingConfig, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(config);
        Self {
            index: AvailabilityIndex::new(store.clone(), config.clone()),
            matcher: TechnicianMatcher::new(store.clone(), config.clone()),
            search: SlotSearch::new(store.clone(), config.clone()),
            allocator: JobAllocator::new(store.clone()),
            store,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &SchedulingConfig {
        &self.config
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Finds the first acceptable slot and books it.
    ///
    /// A commit that loses a race to another request does not fail the call:
    /// the lost slot is held out and the search runs again, up to
    /// `max_allocation_attempts` rounds.
    #[instrument(skip(self, request), fields(customer_id = request.customer_id, job_type = %request.job_type))]
    pub async fn auto_schedule_job(&self, request: ScheduleRequest) -> StorageResult<ScheduleOutcome> {
        let today = self.clock.today();
        let mut lost: Vec<SlotCandidate> = Vec::new();

        for attempt in 1..=self.config.max_allocation_attempts {
            let slot = match self.search.find_slot(&request, today, &lost).await? {
                SearchOutcome::Found(slot) => slot,
                SearchOutcome::NotFound(reason) => return Ok(ScheduleOutcome::Unschedulable(reason)),
            };

            match self.allocator.allocate(&request.to_new_job(&slot)).await? {
                Allocation::Committed(job) => return Ok(ScheduleOutcome::Scheduled(job)),
                Allocation::Conflict => {
                    warn!(attempt, technician_id = slot.technician_id, "Retrying after allocation conflict");
                    lost.push(slot);
                }
            }
        }

        warn!(attempts = self.config.max_allocation_attempts, "Gave up after repeated allocation conflicts");
        Ok(ScheduleOutcome::Unschedulable(NoSlotReason::NoAvailableSlot))
    }

    pub async fn available_slots(&self, date: NaiveDate, duration_minutes: u32) -> StorageResult<Vec<OpenSlot>> {
        self.index.available_slots(date, duration_minutes).await
    }

    pub async fn eligible_technician_ids(&self, job_type: JobType) -> StorageResult<BTreeSet<i64>> {
        self.matcher.eligible_technician_ids(job_type).await
    }

    pub async fn job(&self, id: i64) -> StorageResult<Option<JobWithDetails>> {
        self.store.job_with_details(id).await
    }

    pub async fn jobs_by_date(&self, date: NaiveDate) -> StorageResult<Vec<JobWithDetails>> {
        self.store.jobs_on(date).await
    }

    /// Value of jobs completed since the most recent Sunday.
    pub async fn weekly_revenue(&self) -> StorageResult<Decimal> {
        let since = self.clock.start_of_day(week_start(self.clock.today()));
        self.store.completed_revenue_since(since).await
    }

    /// Jobs completed in the trailing 30 days, standing in for unpaid invoices.
    pub async fn open_invoice_count(&self) -> StorageResult<i64> {
        let since = self
            .clock
            .start_of_day(self.clock.today() - Duration::days(OPEN_INVOICE_WINDOW_DAYS));
        self.store.completed_count_since(since).await
    }

    pub async fn dashboard_kpis(&self) -> StorageResult<DashboardKpis> {
        let jobs_today = self.jobs_by_date(self.clock.today()).await?.len() as i64;
        Ok(DashboardKpis {
            jobs_today,
            revenue_this_week: self.weekly_revenue().await?,
            open_invoices: self.open_invoice_count().await?,
        })
    }

    pub async fn customers(&self) -> StorageResult<Vec<Customer>> {
        self.store.customers().await
    }

    /// Active technicians ordered by name, for pickers.
    pub async fn active_technicians(&self) -> StorageResult<Vec<Technician>> {
        let mut technicians = self.store.active_technicians().await?;
        technicians.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(technicians)
    }

    pub async fn complete_job(&self, id: i64, job_value: Decimal) -> StorageResult<bool> {
        self.store.complete_job(id, job_value, self.clock.now()).await
    }

    pub async fn cancel_job(&self, id: i64) -> StorageResult<bool> {
        self.store.cancel_job(id).await
    }
}
