//! Job-type lookup tables.
//!
//! Duration and required-skill data are plain values keyed by [`JobType`],
//! with a fallback entry for anything not listed explicitly.

use hvacpro_shared::JobType;
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Clone, PartialEq)]
pub struct JobTypeTable<V> {
    entries: HashMap<JobType, V>,
    fallback: V,
}

impl<V> JobTypeTable<V> {
    pub fn new(fallback: V) -> Self {
        Self {
            entries: HashMap::new(),
            fallback,
        }
    }

    pub fn with(mut self, job_type: JobType, value: V) -> Self {
        self.entries.insert(job_type, value);
        self
    }

    pub fn get(&self, job_type: JobType) -> &V {
        self.entries.get(&job_type).unwrap_or(&self.fallback)
    }
}

/// Estimated duration in minutes.
pub type DurationTable = JobTypeTable<u32>;

/// Skills of which a technician needs at least one.
pub type SkillTable = JobTypeTable<BTreeSet<String>>;

pub fn standard_durations() -> DurationTable {
    JobTypeTable::new(120)
        .with(JobType::Maintenance, 90)
        .with(JobType::Repair, 120)
        .with(JobType::Installation, 180)
        .with(JobType::Electrical, 150)
}

pub fn standard_skills() -> SkillTable {
    let field = skill_set(&["residential", "commercial"]);

    JobTypeTable::new(skill_set(&["residential"]))
        .with(JobType::Maintenance, field.clone())
        .with(JobType::Repair, field.clone())
        .with(JobType::Installation, field)
        .with(JobType::Electrical, skill_set(&["electrical"]))
}

pub fn skill_set(skills: &[&str]) -> BTreeSet<String> {
    skills.iter().map(|s| s.to_string()).collect()
}
