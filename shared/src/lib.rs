use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Coarse time-of-day bucket a customer can ask to be visited in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPart {
    Morning,
    Afternoon,
    Evening,
}

impl DayPart {
    /// 06-11 morning, 12-16 afternoon, anything else evening.
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            6..=11 => DayPart::Morning,
            12..=16 => DayPart::Afternoon,
            _ => DayPart::Evening,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DayPart::Morning => "morning",
            DayPart::Afternoon => "afternoon",
            DayPart::Evening => "evening",
        }
    }

    pub fn parse(tag: &str) -> Option<Self> {
        match tag.trim().to_ascii_lowercase().as_str() {
            "morning" => Some(DayPart::Morning),
            "afternoon" => Some(DayPart::Afternoon),
            "evening" => Some(DayPart::Evening),
            _ => None,
        }
    }
}

impl fmt::Display for DayPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kind of service visit. Anything unrecognised falls into `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum JobType {
    Maintenance,
    Repair,
    Installation,
    Electrical,
    Other,
}

impl JobType {
    pub const ALL: [JobType; 5] = [
        JobType::Maintenance,
        JobType::Repair,
        JobType::Installation,
        JobType::Electrical,
        JobType::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JobType::Maintenance => "maintenance",
            JobType::Repair => "repair",
            JobType::Installation => "installation",
            JobType::Electrical => "electrical",
            JobType::Other => "other",
        }
    }

    /// Lenient parse used for request input and stored rows.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "maintenance" => JobType::Maintenance,
            "repair" => JobType::Repair,
            "installation" => JobType::Installation,
            "electrical" => JobType::Electrical,
            _ => JobType::Other,
        }
    }
}

impl From<String> for JobType {
    fn from(value: String) -> Self {
        JobType::parse(&value)
    }
}

impl fmt::Display for JobType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Scheduled => "scheduled",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Scheduled)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownJobStatus(pub String);

impl fmt::Display for UnknownJobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown job status '{}'", self.0)
    }
}

impl std::error::Error for UnknownJobStatus {}

impl TryFrom<String> for JobStatus {
    type Error = UnknownJobStatus;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        match value.as_str() {
            "scheduled" => Ok(JobStatus::Scheduled),
            "completed" => Ok(JobStatus::Completed),
            "cancelled" => Ok(JobStatus::Cancelled),
            _ => Err(UnknownJobStatus(value)),
        }
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub notes: Option<String>,
    pub preferred_time: Vec<String>, // morning, afternoon, evening
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Preferred day-parts; unknown tags are ignored, empty means no preference.
    pub fn day_parts(&self) -> BTreeSet<DayPart> {
        self.preferred_time
            .iter()
            .filter_map(|tag| DayPart::parse(tag))
            .collect()
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Technician {
    pub id: i64,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub skills: Vec<String>, // residential, commercial, electrical, ...
    pub hourly_rate: Decimal,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl Technician {
    /// Any-match: true when at least one of the technician's skills is required.
    pub fn has_any_skill(&self, required: &BTreeSet<String>) -> bool {
        self.skills.iter().any(|skill| required.contains(skill))
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    pub customer_id: i64,
    pub technician_id: Option<i64>,
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub job_type: JobType,
    pub priority: i32, // lower is more urgent
    pub scheduled_date: NaiveDate,
    pub scheduled_time: NaiveTime,
    pub estimated_duration: i32, // minutes
    #[cfg_attr(feature = "sqlx", sqlx(try_from = "String"))]
    pub status: JobStatus,
    pub notes: Option<String>,
    pub job_value: Decimal,
    pub completed_at: Option<DateTime<Utc>>,
    pub followup_sent: bool,
    pub created_at: DateTime<Utc>,
}

/// A job joined with the names a caller usually wants to display.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobWithDetails {
    #[cfg_attr(feature = "sqlx", sqlx(flatten))]
    #[serde(flatten)]
    pub job: Job,
    pub customer_name: String,
    pub customer_address: Option<String>,
    pub technician_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardKpis {
    pub jobs_today: i64,
    pub revenue_this_week: Decimal,
    /// Jobs completed in the trailing 30 days; a stand-in until invoices are tracked.
    pub open_invoices: i64,
}
