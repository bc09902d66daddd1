//! Timestamp codec.
//!
//! Transcript generators disagree on how they write time: plain seconds,
//! `HH:MM:SS`, `MM:SS`, SRT-style `HH:MM:SS,mmm`, or a `start - end` range.
//! Everything here degrades instead of failing, since a bad timestamp should
//! never take a transcript down with it.

use std::fmt;

use serde::Deserialize;

/// Seconds assumed for a segment whose display timestamp has no end.
pub const DEFAULT_WINDOW_SECONDS: f64 = 10.0;

/// A raw time field as it appears in transcript JSON.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TimeValue {
    Seconds(f64),
    Text(String),
}

impl TimeValue {
    /// Parsed seconds; malformed text yields `0.0`.
    pub fn seconds(&self) -> f64 {
        match self {
            TimeValue::Seconds(s) => *s,
            TimeValue::Text(t) => parse_timestamp(t),
        }
    }

    pub fn as_seconds(&self) -> Option<f64> {
        match self {
            TimeValue::Seconds(s) => Some(*s),
            TimeValue::Text(_) => None,
        }
    }

    /// Empty text counts as absent when resolving fields.
    pub fn is_present(&self) -> bool {
        match self {
            TimeValue::Seconds(s) => s.is_finite(),
            TimeValue::Text(t) => !t.is_empty(),
        }
    }

    /// Label shown in the transcript: numbers are formatted, text passes through.
    pub fn display(&self) -> String {
        match self {
            TimeValue::Seconds(s) => format_seconds(*s),
            TimeValue::Text(t) => t.clone(),
        }
    }
}

/// Raw rendering, used when building `from - to` labels.
impl fmt::Display for TimeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeValue::Seconds(s) => write!(f, "{}", s),
            TimeValue::Text(t) => f.write_str(t),
        }
    }
}

/// Parse a timestamp string into seconds, or `0.0` when it cannot be read.
pub fn parse_timestamp(input: &str) -> f64 {
    try_parse(input).unwrap_or(0.0)
}

/// Like [`parse_timestamp`] but reports failure instead of degrading to zero.
///
/// Every component must be a complete number: `12s` or `1.5:30` fail rather
/// than yielding whatever numeric prefix they start with.
pub fn try_parse(input: &str) -> Option<f64> {
    let input = input.trim();

    if input.contains(':') {
        let parts: Vec<&str> = input.split(':').collect();
        return match parts.as_slice() {
            [hours, minutes, seconds] => Some(
                whole(hours)? * 3600.0 + whole(minutes)? * 60.0 + decimal_seconds(seconds)?,
            ),
            [minutes, seconds] => Some(whole(minutes)? * 60.0 + decimal_seconds(seconds)?),
            _ => None,
        };
    }

    input.parse::<f64>().ok().filter(|s| s.is_finite())
}

/// Parse `HH:MM:SS` with an optional `,mmm` millisecond suffix.
///
/// Returns `None` when any component is non-numeric; callers use that to
/// suppress a seek rather than jumping to zero.
pub fn parse_precise(input: &str) -> Option<f64> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    let (clock, millis) = match input.split_once(',') {
        Some((clock, millis)) => (clock, Some(millis)),
        None => (input, None),
    };

    let parts = clock
        .split(':')
        .map(|p| p.trim().parse::<f64>().ok())
        .collect::<Option<Vec<_>>>()?;
    let [hours, minutes, seconds] = parts.as_slice() else {
        return None;
    };

    let mut total = hours * 3600.0 + minutes * 60.0 + seconds;
    if let Some(millis) = millis.filter(|m| !m.is_empty()) {
        total += millis.trim().parse::<u32>().ok()? as f64 / 1000.0;
    }

    Some(total).filter(|t| t.is_finite())
}

/// Format seconds as `MM:SS`, or `HH:MM:SS` once there is a whole hour.
pub fn format_seconds(seconds: f64) -> String {
    let total = if seconds.is_finite() && seconds > 0.0 {
        seconds.floor() as u64
    } else {
        0
    };

    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let secs = total % 60;

    if hours > 0 {
        format!("{:02}:{:02}:{:02}", hours, minutes, secs)
    } else {
        format!("{:02}:{:02}", minutes, secs)
    }
}

/// The stretch of playback a transcript row covers, `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TimeWindow {
    pub start: f64,
    pub end: f64,
}

impl TimeWindow {
    /// Window for a display label such as `00:00:05 - 00:00:10` or `01:15`.
    pub fn from_display(display: &str) -> Option<Self> {
        let (start, end) = split_range(display);
        let start = try_parse(start)?;
        let end = end
            .and_then(try_parse)
            .unwrap_or(start + DEFAULT_WINDOW_SECONDS);
        Some(Self { start, end })
    }

    pub fn contains(&self, seconds: f64) -> bool {
        seconds >= self.start && seconds < self.end
    }
}

/// Split `start - end`; a single timestamp has no end.
pub fn split_range(display: &str) -> (&str, Option<&str>) {
    match display.split_once('-') {
        Some((start, end)) if !start.trim().is_empty() => (start.trim(), Some(end.trim())),
        _ => (display.trim(), None),
    }
}

fn whole(part: &str) -> Option<f64> {
    part.trim().parse::<i64>().ok().map(|v| v as f64)
}

fn decimal_seconds(part: &str) -> Option<f64> {
    part.trim()
        .replacen(',', ".", 1)
        .parse::<f64>()
        .ok()
        .filter(|s| s.is_finite())
}
