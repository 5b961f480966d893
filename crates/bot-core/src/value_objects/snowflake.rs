//! Snowflake ID - the upstream 64-bit entity identifier
//!
//! Structure:
//! - Bits 63-22: Timestamp (milliseconds since the upstream epoch)
//! - Bits 21-17: Internal worker ID
//! - Bits 16-12: Internal process ID
//! - Bits 11-0:  Increment

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Opaque entity id, unique per entity kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Snowflake(u64);

impl Snowflake {
    /// Upstream epoch: 2015-01-01 00:00:00 UTC (milliseconds)
    pub const EPOCH: u64 = 1_420_070_400_000;

    /// Create a new Snowflake from a raw value
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Get the inner value
    #[inline]
    pub const fn into_inner(self) -> u64 {
        self.0
    }

    /// Check if the Snowflake is zero (uninitialized)
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Extract timestamp (milliseconds since Unix epoch)
    #[inline]
    pub fn timestamp(&self) -> u64 {
        (self.0 >> 22) + Self::EPOCH
    }

    /// Convert timestamp to DateTime<Utc>
    pub fn created_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        chrono::DateTime::from_timestamp_millis(self.timestamp() as i64)
    }

    /// Parse from string representation
    pub fn parse(s: &str) -> Result<Self, SnowflakeParseError> {
        s.parse::<u64>()
            .map(Snowflake)
            .map_err(|_| SnowflakeParseError::InvalidFormat)
    }
}

/// Error when parsing a Snowflake from string
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SnowflakeParseError {
    #[error("invalid snowflake format")]
    InvalidFormat,
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Snowflake {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<Snowflake> for u64 {
    fn from(id: Snowflake) -> Self {
        id.0
    }
}

impl std::str::FromStr for Snowflake {
    type Err = SnowflakeParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Snowflake::parse(s)
    }
}

// Serialize as string, as the upstream sends ids
impl Serialize for Snowflake {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0.to_string())
    }
}

// Deserialize from string or number
impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        use serde::de::{self, Visitor};

        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a string or integer representing a snowflake ID")
            }

            fn visit_i64<E>(self, value: i64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                u64::try_from(value)
                    .map(Snowflake)
                    .map_err(|_| de::Error::custom("negative snowflake"))
            }

            fn visit_u64<E>(self, value: u64) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                Ok(Snowflake(value))
            }

            fn visit_str<E>(self, value: &str) -> Result<Snowflake, E>
            where
                E: de::Error,
            {
                value
                    .parse::<u64>()
                    .map(Snowflake)
                    .map_err(|_| de::Error::custom("invalid snowflake string"))
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
