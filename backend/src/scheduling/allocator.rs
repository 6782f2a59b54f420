// Job allocator - commits a chosen slot as a scheduled job

use hvacpro_shared::JobWithDetails;
use std::sync::Arc;
use tracing::{info, warn};

use crate::store::{NewJob, SchedulingStore, StorageError, StorageResult};

#[derive(Debug, Clone)]
pub enum Allocation {
    Committed(JobWithDetails),
    /// Someone else booked an overlapping interval first; nothing was written.
    Conflict,
}

#[derive(Clone)]
pub struct JobAllocator {
    store: Arc<dyn SchedulingStore>,
}

impl JobAllocator {
    pub fn new(store: Arc<dyn SchedulingStore>) -> Self {
        Self { store }
    }

    pub async fn allocate(&self, job: &NewJob) -> StorageResult<Allocation> {
        let id = match self.store.insert_job(job).await {
            Ok(id) => id,
            Err(StorageError::SlotTaken { technician_id, date, time }) => {
                warn!(technician_id, %date, %time, "Slot taken before commit");
                return Ok(Allocation::Conflict);
            }
            Err(e) => return Err(e),
        };

        let details = self
            .store
            .job_with_details(id)
            .await?
            .ok_or_else(|| StorageError::InvalidData(format!("job {} missing after insert", id)))?;

        info!(
            job_id = id,
            technician_id = job.technician_id,
            date = %job.scheduled_date,
            time = %job.scheduled_time,
            "Job scheduled"
        );

        Ok(Allocation::Committed(details))
    }
}
