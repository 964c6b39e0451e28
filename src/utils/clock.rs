use chrono::{DateTime, Local};

/// Represents an entity responsible for providing "now" across application. Statistics never
/// read the wall clock directly, which keeps them deterministic in tests.
#[cfg_attr(test, mockall::automock)]
pub trait Clock: Sync + Send + 'static {
    fn time(&self) -> DateTime<Local>;
}

pub struct DefaultClock;

impl Clock for DefaultClock {
    fn time(&self) -> DateTime<Local> {
        Local::now()
    }
}
