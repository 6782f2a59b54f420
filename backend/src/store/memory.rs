// In-memory scheduling store
//
// Used when no DATABASE_URL is configured, and by the tests. The overlap
// check and the insert happen under one write lock, matching the exclusion
// constraint the Postgres schema enforces.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use hvacpro_shared::{Customer, Job, JobStatus, JobWithDetails, Technician};
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

use super::{BookedInterval, NewJob, SchedulingStore, StorageError, StorageResult};

#[derive(Debug, Default)]
struct Tables {
    customers: BTreeMap<i64, Customer>,
    technicians: BTreeMap<i64, Technician>,
    jobs: BTreeMap<i64, Job>,
    last_id: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    fn details(&self, job: &Job) -> Option<JobWithDetails> {
        let customer = self.customers.get(&job.customer_id)?;
        Some(JobWithDetails {
            job: job.clone(),
            customer_name: customer.name.clone(),
            customer_address: customer.address.clone(),
            technician_name: job
                .technician_id
                .and_then(|id| self.technicians.get(&id))
                .map(|t| t.name.clone()),
        })
    }

    fn booked(job: &Job) -> Option<BookedInterval> {
        if job.status == JobStatus::Cancelled {
            return None;
        }
        Some(BookedInterval {
            technician_id: job.technician_id?,
            start: job.scheduled_time,
            duration_minutes: job.estimated_duration.max(0) as u32,
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// The two customers and two technicians a fresh install starts with.
    pub async fn with_sample_data() -> Self {
        let store = Self::new();
        store
            .add_customer("John Smith", Some("123 Main St, Nashua, NH"), &["morning"])
            .await;
        store
            .add_customer("Sarah Johnson", Some("456 Oak Ave, Nashua, NH"), &["afternoon"])
            .await;
        store
            .add_technician("Bob Martinez", &["residential", "commercial"], Decimal::new(4500, 2), true)
            .await;
        store
            .add_technician("Lisa Chen", &["residential", "electrical"], Decimal::new(4000, 2), true)
            .await;
        store
    }

    pub async fn add_customer(&self, name: &str, address: Option<&str>, preferred_time: &[&str]) -> Customer {
        let mut tables = self.tables.write().await;
        let customer = Customer {
            id: tables.next_id(),
            name: name.to_string(),
            phone: None,
            email: None,
            address: address.map(str::to_string),
            notes: None,
            preferred_time: preferred_time.iter().map(|s| s.to_string()).collect(),
            created_at: Utc::now(),
        };
        tables.customers.insert(customer.id, customer.clone());
        customer
    }

    pub async fn add_technician(&self, name: &str, skills: &[&str], hourly_rate: Decimal, active: bool) -> Technician {
        let mut tables = self.tables.write().await;
        let technician = Technician {
            id: tables.next_id(),
            name: name.to_string(),
            phone: None,
            email: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            hourly_rate,
            active,
            created_at: Utc::now(),
        };
        tables.technicians.insert(technician.id, technician.clone());
        technician
    }

    pub async fn job_count(&self) -> usize {
        self.tables.read().await.jobs.len()
    }

    fn set_status(tables: &mut Tables, id: i64, status: JobStatus) -> Option<&mut Job> {
        let job = tables.jobs.get_mut(&id)?;
        if job.status != JobStatus::Scheduled {
            return None;
        }
        job.status = status;
        Some(job)
    }
}

#[async_trait]
impl SchedulingStore for MemoryStore {
    async fn customer(&self, id: i64) -> StorageResult<Option<Customer>> {
        Ok(self.tables.read().await.customers.get(&id).cloned())
    }

    async fn customers(&self) -> StorageResult<Vec<Customer>> {
        let mut customers: Vec<Customer> = self.tables.read().await.customers.values().cloned().collect();
        customers.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        Ok(customers)
    }

    async fn active_technicians(&self) -> StorageResult<Vec<Technician>> {
        Ok(self
            .tables
            .read()
            .await
            .technicians
            .values()
            .filter(|t| t.active)
            .cloned()
            .collect())
    }

    async fn booked_intervals(&self, date: NaiveDate) -> StorageResult<Vec<BookedInterval>> {
        Ok(self
            .tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| job.scheduled_date == date)
            .filter_map(Tables::booked)
            .collect())
    }

    async fn insert_job(&self, new_job: &NewJob) -> StorageResult<i64> {
        let mut tables = self.tables.write().await;

        if !tables.customers.contains_key(&new_job.customer_id) {
            return Err(StorageError::InvalidData(format!("customer {} does not exist", new_job.customer_id)));
        }
        if !tables.technicians.contains_key(&new_job.technician_id) {
            return Err(StorageError::InvalidData(format!("technician {} does not exist", new_job.technician_id)));
        }
        let duration = i32::try_from(new_job.estimated_duration)
            .map_err(|_| StorageError::InvalidData(format!("duration {} out of range", new_job.estimated_duration)))?;

        let wanted = new_job.window();
        let overlaps = tables
            .jobs
            .values()
            .filter(|job| job.scheduled_date == new_job.scheduled_date)
            .filter_map(Tables::booked)
            .any(|b| b.technician_id == new_job.technician_id && b.window().overlaps(&wanted));
        if overlaps {
            return Err(new_job.slot_taken());
        }

        let id = tables.next_id();
        tables.jobs.insert(
            id,
            Job {
                id,
                customer_id: new_job.customer_id,
                technician_id: Some(new_job.technician_id),
                job_type: new_job.job_type,
                priority: new_job.priority,
                scheduled_date: new_job.scheduled_date,
                scheduled_time: new_job.scheduled_time,
                estimated_duration: duration,
                status: JobStatus::Scheduled,
                notes: new_job.notes.clone(),
                job_value: Decimal::ZERO,
                completed_at: None,
                followup_sent: false,
                created_at: Utc::now(),
            },
        );
        Ok(id)
    }

    async fn job_with_details(&self, id: i64) -> StorageResult<Option<JobWithDetails>> {
        let tables = self.tables.read().await;
        Ok(tables.jobs.get(&id).and_then(|job| tables.details(job)))
    }

    async fn jobs_on(&self, date: NaiveDate) -> StorageResult<Vec<JobWithDetails>> {
        let tables = self.tables.read().await;
        let mut jobs: Vec<JobWithDetails> = tables
            .jobs
            .values()
            .filter(|job| job.scheduled_date == date)
            .filter_map(|job| tables.details(job))
            .collect();
        jobs.sort_by(|a, b| {
            a.job
                .scheduled_time
                .cmp(&b.job.scheduled_time)
                .then(a.job.id.cmp(&b.job.id))
        });
        Ok(jobs)
    }

    async fn completed_revenue_since(&self, since: DateTime<Utc>) -> StorageResult<Decimal> {
        Ok(self
            .tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Completed && job.completed_at.is_some_and(|at| at >= since))
            .map(|job| job.job_value)
            .sum())
    }

    async fn completed_count_since(&self, since: DateTime<Utc>) -> StorageResult<i64> {
        Ok(self
            .tables
            .read()
            .await
            .jobs
            .values()
            .filter(|job| job.status == JobStatus::Completed && job.completed_at.is_some_and(|at| at >= since))
            .count() as i64)
    }

    async fn complete_job(
        &self,
        id: i64,
        job_value: Decimal,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(match Self::set_status(&mut tables, id, JobStatus::Completed) {
            Some(job) => {
                job.job_value = job_value;
                job.completed_at = Some(completed_at);
                true
            }
            None => false,
        })
    }

    async fn cancel_job(&self, id: i64) -> StorageResult<bool> {
        let mut tables = self.tables.write().await;
        Ok(Self::set_status(&mut tables, id, JobStatus::Cancelled).is_some())
    }
}
