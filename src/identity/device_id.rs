//! Validated device identifiers
//!
//! A `DeviceId` names one participating replica. It is the key of every
//! vector-clock entry and the final tie-breaker in timestamp ordering, so it
//! must be stable, printable and comparable by exact value.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::clock::{Clock, SystemClock};
use crate::error::ValidationError;

/// Maximum length of a device id after trimming
pub const MAX_DEVICE_ID_LEN: usize = 64;

/// Prefix used by [`DeviceId::generate_random`]
pub const DEFAULT_GENERATED_PREFIX: &str = "device";

const SHORT_ID_THRESHOLD: usize = 8;
const LOCAL_PREFIX: &str = "local-";
const LOCALHOST_MARKER: &str = "localhost";

/// Identifier of a device taking part in synchronization.
///
/// Equality and ordering are by exact, case-sensitive value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Validate and wrap a raw identifier. Surrounding whitespace is trimmed.
    pub fn create(raw: &str) -> Result<Self, ValidationError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(ValidationError::EmptyOrInvalidType);
        }

        let length = trimmed.chars().count();
        if length > MAX_DEVICE_ID_LEN {
            return Err(ValidationError::TooLong { length });
        }

        if let Some(character) = trimmed.chars().find(|c| !is_allowed_char(*c)) {
            return Err(ValidationError::InvalidCharacter { character });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Generate a fresh id of the form `device-<time>-<random>`, both parts base36.
    pub fn generate_random() -> Self {
        // The default prefix plus two base36 segments always fits in 64 characters
        Self(random_id(&SystemClock, DEFAULT_GENERATED_PREFIX))
    }

    /// Like [`generate_random`](Self::generate_random) but with an explicit
    /// time source and prefix. Fails if the prefix would make an invalid id.
    pub fn generate_random_with(clock: &dyn Clock, prefix: &str) -> Result<Self, ValidationError> {
        if let Some(character) = prefix.chars().find(|c| !is_allowed_char(*c)) {
            return Err(ValidationError::InvalidCharacter { character });
        }
        Self::create(&random_id(clock, prefix))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn equals(&self, other: &DeviceId) -> bool {
        self == other
    }

    /// Whether this id names the local machine (`local-` prefix or `localhost`).
    pub fn is_local_device(&self) -> bool {
        self.0.starts_with(LOCAL_PREFIX) || self.0.contains(LOCALHOST_MARKER)
    }

    /// Abbreviated form for display: `abcd...wxyz` for ids longer than 8 characters.
    pub fn short_id(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= SHORT_ID_THRESHOLD {
            return self.0.clone();
        }
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

fn random_id(clock: &dyn Clock, prefix: &str) -> String {
    let millis = clock.now().timestamp_millis().max(0) as u64;
    let suffix: u64 = rand::random();
    format!("{}-{}-{}", prefix, to_base36(millis), to_base36(suffix))
}

fn is_allowed_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DeviceId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::create(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::create(&value)
    }
}

impl From<DeviceId> for String {
    fn from(id: DeviceId) -> Self {
        id.0
    }
}
