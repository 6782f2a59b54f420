use chrono::{DateTime, Local, NaiveDate, NaiveTime, TimeZone, Utc};

pub trait Clock: Send + Sync {
    /// The business's local calendar date.
    fn today(&self) -> NaiveDate;
    fn now(&self) -> DateTime<Utc>;
    /// The instant `date` begins in the same calendar `today` reads from.
    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        let midnight = date.and_time(NaiveTime::MIN);
        // A DST gap can swallow midnight; fall back to reading it as UTC
        Local
            .from_local_datetime(&midnight)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| midnight.and_utc())
    }
}

/// Always reports the same instant; `today` is that instant's UTC date.
#[cfg(test)]
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

#[cfg(test)]
impl Clock for FixedClock {
    fn today(&self) -> NaiveDate {
        self.0.date_naive()
    }

    fn now(&self) -> DateTime<Utc> {
        self.0
    }

    fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        date.and_time(NaiveTime::MIN).and_utc()
    }
}
