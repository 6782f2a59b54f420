// Job scheduling engine
//
// Assigns a pending service job to an active, suitably skilled technician at
// the first free slot inside business hours. Components are built from an
// explicit SchedulingConfig and a SchedulingStore; none keeps state between calls.

pub mod allocator;
pub mod availability;
pub mod catalog;
pub mod clock;
pub mod config;
pub mod matcher;
pub mod search;
pub mod service;

pub use availability::OpenSlot;
pub use clock::{Clock, SystemClock};
pub use config::{BusinessHours, ConfigError, SchedulingConfig};
pub use search::NoSlotReason;
pub use service::{ScheduleOutcome, ScheduleRequest, SchedulingService};
