use core::fmt;
use core::str::FromStr;
use std::time::Instant;

use chrono::Timelike;

use crate::error::{Error, Result};

/// Length of a formatted `HH:MM:SS` string.
pub const TIME_TEXT_LEN: usize = 8;

/// Wall-clock snapshot: hour, minute and second of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockState {
    pub hours: u8,
    pub mins: u8,
    pub secs: u8,
}

impl ClockState {
    pub fn new(hours: u8, mins: u8, secs: u8) -> Self {
        Self { hours, mins, secs }
    }

    /// Advances one second, wrapping at midnight.
    pub fn tick(&mut self) {
        self.secs = (self.secs + 1) % 60;
        if self.secs > 0 {
            return;
        }
        self.mins = (self.mins + 1) % 60;
        if self.mins == 0 {
            self.hours = (self.hours + 1) % 24;
        }
    }

    fn is_valid(&self) -> bool {
        self.hours < 24 && self.mins < 60 && self.secs < 60
    }
}

impl fmt::Display for ClockState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}:{:02}", self.hours, self.mins, self.secs)
    }
}

impl FromStr for ClockState {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidTime(s.to_string());

        let mut fields = s.split(':').map(|field| {
            if field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit()) {
                field.parse::<u8>().ok()
            } else {
                None
            }
        });
        let (Some(Some(hours)), Some(Some(mins)), Some(Some(secs)), None) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            return Err(invalid());
        };

        let state = Self::new(hours, mins, secs);
        if state.is_valid() {
            Ok(state)
        } else {
            Err(invalid())
        }
    }
}

/// Formats `state` as zero-padded `HH:MM:SS` into `buf` without allocating.
pub fn format_time<'a>(state: &ClockState, buf: &'a mut [u8; TIME_TEXT_LEN]) -> Result<&'a str> {
    if !state.is_valid() {
        return Err(Error::InvalidTime(format!("{state:?}")));
    }
    format_no_std::show(
        buf,
        format_args!("{:02}:{:02}:{:02}", state.hours, state.mins, state.secs),
    )
    .map_err(|_| Error::InvalidTime(format!("{state:?}")))
}

/// Where the clock loop reads the current time from.
pub trait TimeSource {
    fn now(&mut self) -> ClockState;
}

/// Local system time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl TimeSource for SystemClock {
    fn now(&mut self) -> ClockState {
        let now = chrono::Local::now();
        ClockState::new(now.hour() as u8, now.minute() as u8, now.second() as u8)
    }
}

/// Starts at a fixed time and ticks once per elapsed monotonic second.
#[derive(Debug, Clone, Copy)]
pub struct FreeRunningClock {
    current: ClockState,
    ticks: u64,
    origin: Instant,
}

impl FreeRunningClock {
    pub fn new(start: ClockState) -> Self {
        Self::since(start, Instant::now())
    }

    /// A clock that showed `start` at `origin`.
    pub fn since(start: ClockState, origin: Instant) -> Self {
        Self {
            current: start,
            ticks: 0,
            origin,
        }
    }
}

impl TimeSource for FreeRunningClock {
    fn now(&mut self) -> ClockState {
        let elapsed = self.origin.elapsed().as_secs();
        while self.ticks < elapsed {
            self.current.tick();
            self.ticks += 1;
        }
        self.current
    }
}
