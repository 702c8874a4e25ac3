//! Rewrites every cue timestamp in WebVTT or SubRip text by a signed offset.
//!
//! Only the timestamps change. Everything between them, including cue
//! numbers, settings and styling, is copied through untouched, and each
//! timestamp keeps its own sub-second separator.

use std::fmt;
use std::sync::LazyLock;

use log::debug;
use regex::{Captures, Regex};

const MS_PER_HOUR: u64 = 3_600_000;
const MS_PER_MINUTE: u64 = 60_000;
const MS_PER_SECOND: u64 = 1_000;

/// `[HH:]MM:SS.mmm` or `[HH:]MM:SS,mmm`. Hours take two or more digits.
/// ASCII digits only; other scripts' digits are plain text.
static TIMESTAMP_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([0-9]{2,}:)?([0-9]{2}):([0-9]{2})([.,])([0-9]{3})").expect("timestamp regex is valid")
});

/// Sub-second separator: `.` in WebVTT, `,` in SubRip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    Dot,
    Comma,
}

impl Marker {
    fn parse(s: &str) -> Option<Self> {
        match s {
            "." => Some(Marker::Dot),
            "," => Some(Marker::Comma),
            _ => None,
        }
    }

    pub fn as_char(self) -> char {
        match self {
            Marker::Dot => '.',
            Marker::Comma => ',',
        }
    }
}

/// One cue timestamp as written in the caption text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp {
    /// `None` when the token was written as `MM:SS.mmm`.
    pub hours: Option<u64>,
    pub minutes: u64,
    pub seconds: u64,
    pub millis: u64,
    pub marker: Marker,
}

impl Timestamp {
    fn from_captures(caps: &Captures<'_>) -> Option<Self> {
        let hours = match caps.get(1) {
            Some(m) => Some(m.as_str().trim_end_matches(':').parse().ok()?),
            None => None,
        };
        Some(Self {
            hours,
            minutes: caps.get(2)?.as_str().parse().ok()?,
            seconds: caps.get(3)?.as_str().parse().ok()?,
            marker: Marker::parse(caps.get(4)?.as_str())?,
            millis: caps.get(5)?.as_str().parse().ok()?,
        })
    }

    /// Absolute position in milliseconds, or `None` if it overflows.
    pub fn total_ms(&self) -> Option<u64> {
        self.hours
            .unwrap_or(0)
            .checked_mul(MS_PER_HOUR)?
            .checked_add(self.minutes * MS_PER_MINUTE)?
            .checked_add(self.seconds * MS_PER_SECOND)?
            .checked_add(self.millis)
    }

    /// Moves the timestamp by `offset_ms`, clamping at zero. Keeps the hour
    /// group if the token was written with one or the new time needs it.
    pub fn shifted(&self, offset_ms: i64) -> Option<Self> {
        let moved = (i128::from(self.total_ms()?) + i128::from(offset_ms)).max(0);
        let total = u64::try_from(moved).ok()?;
        let hours = total / MS_PER_HOUR;
        Some(Self {
            hours: (hours > 0 || self.hours.is_some()).then_some(hours),
            minutes: (total % MS_PER_HOUR) / MS_PER_MINUTE,
            seconds: (total % MS_PER_MINUTE) / MS_PER_SECOND,
            millis: total % MS_PER_SECOND,
            marker: self.marker,
        })
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(hours) = self.hours {
            write!(f, "{hours:02}:")?;
        }
        write!(
            f,
            "{:02}:{:02}{}{:03}",
            self.minutes,
            self.seconds,
            self.marker.as_char(),
            self.millis
        )
    }
}

/// Timestamps found in `text`, in order. Tokens that fail to parse are skipped.
pub fn timestamps(text: &str) -> impl Iterator<Item = Timestamp> + '_ {
    TIMESTAMP_REGEX
        .captures_iter(text)
        .filter_map(|caps| Timestamp::from_captures(&caps))
}

/// Shifts every timestamp in `text` by `offset_ms` (positive delays the
/// captions, negative advances them). Results below zero clamp to zero.
/// A token that cannot be parsed or represented is left as it was.
pub fn shift_timestamps(text: &str, offset_ms: i64) -> String {
    TIMESTAMP_REGEX
        .replace_all(text, |caps: &Captures<'_>| {
            match Timestamp::from_captures(caps).and_then(|ts| ts.shifted(offset_ms)) {
                Some(shifted) => shifted.to_string(),
                None => {
                    debug!("leaving unparseable timestamp {:?} as is", &caps[0]);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}
