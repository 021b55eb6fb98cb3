//! Compact duration literal parsing (`10s`, `5m`, `2h`, `1d`).
//!
//! The grammar is anchored only at the start: trailing characters after the
//! first valid match are tolerated (`"10sx"` resolves as 10 seconds), kept
//! for compatibility with existing callers of the wire API.

use std::time::{SystemTime, UNIX_EPOCH};

/// Resolves a duration literal into an absolute expiration, seconds since
/// the Unix epoch, relative to now.
pub fn resolve(literal: &str) -> Result<f64, DurationError> {
    let (count, unit) = parse(literal)?;
    Ok(now() + (count as f64) * unit.multiplier())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Unit {
    Seconds,
    Minutes,
    Hours,
    Days,
}

impl Unit {
    fn multiplier(self) -> f64 {
        match self {
            Unit::Seconds => 1.0,
            Unit::Minutes => 60.0,
            Unit::Hours => 3600.0,
            Unit::Days => 86400.0,
        }
    }

    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Unit::Seconds),
            'm' => Some(Unit::Minutes),
            'h' => Some(Unit::Hours),
            'd' => Some(Unit::Days),
            _ => None,
        }
    }
}

fn parse(literal: &str) -> Result<(u64, Unit), DurationError> {
    let digit_end = literal
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(literal.len(), |(i, _)| i);

    if digit_end == 0 {
        return Err(DurationError(literal.to_string()));
    }

    let count: u64 = literal[..digit_end]
        .parse()
        .map_err(|_| DurationError(literal.to_string()))?;

    let unit = literal[digit_end..]
        .chars()
        .next()
        .and_then(Unit::from_char)
        .ok_or_else(|| DurationError(literal.to_string()))?;

    Ok((count, unit))
}

fn now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs_f64()
}

#[derive(Debug, Clone)]
pub struct DurationError(pub String);

impl std::fmt::Display for DurationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "invalid duration literal '{}' (expected e.g. '10s', '5m', '2h', '1d')",
            self.0
        )
    }
}

impl std::error::Error for DurationError {}
