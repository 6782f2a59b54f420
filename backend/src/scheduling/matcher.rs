// Technician matcher - which active technicians can take a given job type

use hvacpro_shared::{JobType, Technician};
use std::collections::BTreeSet;
use std::sync::Arc;

use super::config::SchedulingConfig;
use crate::store::{SchedulingStore, StorageResult};

#[derive(Clone)]
pub struct TechnicianMatcher {
    store: Arc<dyn SchedulingStore>,
    config: Arc<SchedulingConfig>,
}

impl TechnicianMatcher {
    pub fn new(store: Arc<dyn SchedulingStore>, config: Arc<SchedulingConfig>) -> Self {
        Self { store, config }
    }

    /// Ids of active technicians holding at least one skill the job type needs.
    /// An empty set is a normal answer, not an error.
    pub async fn eligible_technician_ids(&self, job_type: JobType) -> StorageResult<BTreeSet<i64>> {
        let technicians = self.store.active_technicians().await?;
        Ok(self.eligible_among(&technicians, job_type))
    }

    pub fn eligible_among(&self, technicians: &[Technician], job_type: JobType) -> BTreeSet<i64> {
        let required = self.config.skills.get(job_type);
        technicians
            .iter()
            .filter(|t| t.active && t.has_any_skill(required))
            .map(|t| t.id)
            .collect()
    }
}
