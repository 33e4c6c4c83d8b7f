//! Human-readable duration formatting and parsing utilities

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Invalid duration format: {0}")]
    InvalidFormat(String),

    #[error("Invalid number: {0}")]
    InvalidNumber(#[from] std::num::ParseIntError),

    #[error("Invalid unit: {0}")]
    InvalidUnit(String),

    #[error("Duration out of range: {0}")]
    Overflow(String),
}

/// Duration in whole seconds with human-readable parsing ("600", "10m", "1h30m")
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct HumanDuration(pub u64);

impl HumanDuration {
    pub fn from_secs(secs: u64) -> Self {
        HumanDuration(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn as_duration(&self) -> Duration {
        Duration::from_secs(self.0)
    }

    pub fn to_human_readable(&self) -> String {
        if self.0 == 0 {
            return "0s".to_string();
        }

        let hours = self.0 / 3600;
        let minutes = (self.0 % 3600) / 60;
        let seconds = self.0 % 60;

        let mut out = String::new();
        if hours > 0 {
            out.push_str(&format!("{}h", hours));
        }
        if minutes > 0 {
            out.push_str(&format!("{}m", minutes));
        }
        if seconds > 0 {
            out.push_str(&format!("{}s", seconds));
        }
        out
    }
}

impl From<HumanDuration> for Duration {
    fn from(value: HumanDuration) -> Self {
        value.as_duration()
    }
}

impl<'de> Deserialize<'de> for HumanDuration {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct HumanDurationVisitor;

        impl<'de> serde::de::Visitor<'de> for HumanDurationVisitor {
            type Value = HumanDuration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration as string (e.g., \"90s\", \"10m\") or integer seconds")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(HumanDuration(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                u64::try_from(v)
                    .map(HumanDuration)
                    .map_err(|_| E::custom(format!("duration must not be negative: {}", v)))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                v.parse::<HumanDuration>().map_err(serde::de::Error::custom)
            }
        }

        deserializer.deserialize_any(HumanDurationVisitor)
    }
}

impl FromStr for HumanDuration {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim().to_lowercase();

        // Plain number means seconds
        if let Ok(num) = s.parse::<u64>() {
            return Ok(HumanDuration(num));
        }

        if s.is_empty() {
            return Err(ParseError::InvalidFormat(s));
        }

        let mut total = 0u64;
        let mut rest = s.as_str();

        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .ok_or_else(|| ParseError::InvalidFormat(s.clone()))?;
            if digits_end == 0 {
                return Err(ParseError::InvalidFormat(s.clone()));
            }

            let num: u64 = rest[..digits_end].parse()?;
            let after = &rest[digits_end..];
            let unit_end = after
                .find(|c: char| c.is_ascii_digit())
                .unwrap_or(after.len());
            let unit = &after[..unit_end];

            let multiplier = match unit.trim() {
                "s" | "sec" | "secs" => 1,
                "m" | "min" | "mins" => 60,
                "h" | "hr" | "hrs" => 3600,
                _ => return Err(ParseError::InvalidUnit(unit.to_string())),
            };

            total = num
                .checked_mul(multiplier)
                .and_then(|secs| total.checked_add(secs))
                .ok_or_else(|| ParseError::Overflow(s.clone()))?;
            rest = &after[unit_end..];
        }

        Ok(HumanDuration(total))
    }
}

impl fmt::Display for HumanDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_human_readable())
    }
}
