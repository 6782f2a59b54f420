// PostgreSQL-backed scheduling store
//
// Double booking is prevented by the `jobs_no_technician_overlap` exclusion
// constraint; a violation surfaces as StorageError::SlotTaken.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use hvacpro_shared::{Customer, JobWithDetails, Technician};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgPool};
use std::future::Future;
use std::time::Duration;

use super::{BookedInterval, NewJob, SchedulingStore, StorageError, StorageResult};

/// SQLSTATE for exclusion_violation.
const EXCLUSION_VIOLATION: &str = "23P01";

const JOB_DETAILS_SELECT: &str = r#"
    SELECT
        j.id, j.customer_id, j.technician_id, j.job_type, j.priority,
        j.scheduled_date, j.scheduled_time, j.estimated_duration, j.status,
        j.notes, j.job_value, j.completed_at, j.followup_sent, j.created_at,
        c.name AS customer_name,
        c.address AS customer_address,
        t.name AS technician_name
    FROM jobs j
    JOIN customers c ON j.customer_id = c.id
    LEFT JOIN technicians t ON j.technician_id = t.id
"#;

#[derive(Debug, FromRow)]
struct BookedRow {
    technician_id: i64,
    scheduled_time: NaiveTime,
    estimated_duration: i32,
}

impl From<BookedRow> for BookedInterval {
    fn from(row: BookedRow) -> Self {
        BookedInterval {
            technician_id: row.technician_id,
            start: row.scheduled_time,
            duration_minutes: row.estimated_duration.max(0) as u32,
        }
    }
}

#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Runs one storage call under the configured timeout.
    async fn bounded<T, E, F>(&self, call: F) -> StorageResult<T>
    where
        F: Future<Output = Result<T, E>>,
        StorageError: From<E>,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(StorageError::from),
            Err(_) => Err(StorageError::Timeout(self.timeout)),
        }
    }

    async fn insert_job_tx(&self, job: &NewJob) -> StorageResult<i64> {
        let duration = i32::try_from(job.estimated_duration)
            .map_err(|_| StorageError::InvalidData(format!("duration {} out of range", job.estimated_duration)))?;

        let mut tx = self.pool.begin().await?;

        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO jobs (
                customer_id, technician_id, job_type, priority,
                scheduled_date, scheduled_time, estimated_duration, status, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, 'scheduled', $8)
            RETURNING id
            "#,
        )
        .bind(job.customer_id)
        .bind(job.technician_id)
        .bind(job.job_type.as_str())
        .bind(job.priority)
        .bind(job.scheduled_date)
        .bind(job.scheduled_time)
        .bind(duration)
        .bind(&job.notes)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| {
            let is_overlap = e
                .as_database_error()
                .and_then(|db| db.code())
                .is_some_and(|code| code == EXCLUSION_VIOLATION);
            if is_overlap {
                job.slot_taken()
            } else {
                StorageError::Database(e)
            }
        })?;

        tx.commit().await?;
        Ok(id)
    }

    async fn transition(&self, id: i64, sql: &'static str, extra: Option<(Decimal, DateTime<Utc>)>) -> StorageResult<bool> {
        let mut query = sqlx::query(sql).bind(id);
        if let Some((job_value, completed_at)) = extra {
            query = query.bind(job_value).bind(completed_at);
        }
        let result = self.bounded(query.execute(&self.pool)).await?;
        Ok(result.rows_affected() == 1)
    }
}

#[async_trait]
impl SchedulingStore for PgStore {
    async fn customer(&self, id: i64) -> StorageResult<Option<Customer>> {
        self.bounded(
            sqlx::query_as::<_, Customer>(
                r#"
                SELECT id, name, phone, email, address, notes, preferred_time, created_at
                FROM customers
                WHERE id = $1
                "#,
            )
            .bind(id)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn customers(&self) -> StorageResult<Vec<Customer>> {
        self.bounded(
            sqlx::query_as::<_, Customer>(
                r#"
                SELECT id, name, phone, email, address, notes, preferred_time, created_at
                FROM customers
                ORDER BY name, id
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn active_technicians(&self) -> StorageResult<Vec<Technician>> {
        self.bounded(
            sqlx::query_as::<_, Technician>(
                r#"
                SELECT id, name, phone, email, skills, hourly_rate, active, created_at
                FROM technicians
                WHERE active = true
                ORDER BY id
                "#,
            )
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn booked_intervals(&self, date: NaiveDate) -> StorageResult<Vec<BookedInterval>> {
        let rows = self
            .bounded(
                sqlx::query_as::<_, BookedRow>(
                    r#"
                    SELECT technician_id, scheduled_time, estimated_duration
                    FROM jobs
                    WHERE scheduled_date = $1
                      AND status <> 'cancelled'
                      AND technician_id IS NOT NULL
                    "#,
                )
                .bind(date)
                .fetch_all(&self.pool),
            )
            .await?;

        Ok(rows.into_iter().map(BookedInterval::from).collect())
    }

    async fn insert_job(&self, job: &NewJob) -> StorageResult<i64> {
        self.bounded(self.insert_job_tx(job)).await
    }

    async fn job_with_details(&self, id: i64) -> StorageResult<Option<JobWithDetails>> {
        let sql = format!("{} WHERE j.id = $1", JOB_DETAILS_SELECT);
        self.bounded(
            sqlx::query_as::<_, JobWithDetails>(&sql)
                .bind(id)
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn jobs_on(&self, date: NaiveDate) -> StorageResult<Vec<JobWithDetails>> {
        let sql = format!(
            "{} WHERE j.scheduled_date = $1 ORDER BY j.scheduled_time, j.id",
            JOB_DETAILS_SELECT
        );
        self.bounded(
            sqlx::query_as::<_, JobWithDetails>(&sql)
                .bind(date)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn completed_revenue_since(&self, since: DateTime<Utc>) -> StorageResult<Decimal> {
        self.bounded(
            sqlx::query_scalar::<_, Decimal>(
                r#"
                SELECT COALESCE(SUM(job_value), 0)
                FROM jobs
                WHERE status = 'completed' AND completed_at >= $1
                "#,
            )
            .bind(since)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn completed_count_since(&self, since: DateTime<Utc>) -> StorageResult<i64> {
        self.bounded(
            sqlx::query_scalar::<_, i64>(
                r#"
                SELECT COUNT(id)
                FROM jobs
                WHERE status = 'completed' AND completed_at >= $1
                "#,
            )
            .bind(since)
            .fetch_one(&self.pool),
        )
        .await
    }

    async fn complete_job(
        &self,
        id: i64,
        job_value: Decimal,
        completed_at: DateTime<Utc>,
    ) -> StorageResult<bool> {
        self.transition(
            id,
            r#"
            UPDATE jobs
            SET status = 'completed', job_value = $2, completed_at = $3
            WHERE id = $1 AND status = 'scheduled'
            "#,
            Some((job_value, completed_at)),
        )
        .await
    }

    async fn cancel_job(&self, id: i64) -> StorageResult<bool> {
        self.transition(
            id,
            "UPDATE jobs SET status = 'cancelled' WHERE id = $1 AND status = 'scheduled'",
            None,
        )
        .await
    }
}
