//! Wall clock snapshots read once per tick.

use std::fmt;

use chrono::{Datelike, Local, NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};

const WEEKDAYS: [&str; 7] = ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"];
const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// A broken down local time.
///
/// `month` and `day` start at 1, `weekday` counts from Sunday = 0 and
/// `yearday` from January 1st = 0.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateTime {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
    pub second: u32,
    pub weekday: u32,
    pub yearday: u32,
}

impl DateTime {
    /// Hour on a 12 hour dial: midnight and noon read 12.
    pub const fn hour12(&self) -> u32 {
        match self.hour % 12 {
            0 => 12,
            hour => hour,
        }
    }

    pub const fn is_pm(&self) -> bool {
        self.hour >= 12
    }
}

impl From<NaiveDateTime> for DateTime {
    fn from(time: NaiveDateTime) -> Self {
        Self {
            year: time.year(),
            month: time.month(),
            day: time.day(),
            hour: time.hour(),
            minute: time.minute(),
            second: time.second(),
            weekday: time.weekday().num_days_from_sunday(),
            yearday: time.ordinal0(),
        }
    }
}

/// `Www Mmm dd hh:mm:ss yyyy`
impl fmt::Display for DateTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let weekday = WEEKDAYS.get(self.weekday as usize).unwrap_or(&"???");
        let month = self
            .month
            .checked_sub(1)
            .and_then(|m| MONTHS.get(m as usize))
            .unwrap_or(&"???");
        write!(
            f,
            "{weekday} {month} {:>2} {:02}:{:02}:{:02} {}",
            self.day, self.hour, self.minute, self.second, self.year
        )
    }
}

pub trait Clock {
    fn now(&self) -> DateTime;
}

/// Local time of the host.
#[derive(Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime {
        Local::now().naive_local().into()
    }
}

/// Always reports the same time.
#[derive(Clone, Copy, Default)]
pub struct FixedClock(pub DateTime);

impl Clock for FixedClock {
    fn now(&self) -> DateTime {
        self.0
    }
}
