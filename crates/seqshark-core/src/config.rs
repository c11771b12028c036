//! Engine configuration and validation.
//!
//! `EngineConfig` is the plain, serializable parameter set. `Engine` is the
//! validated form handed to the analysis entry points; constructing it is the
//! only place configuration can fail.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::protocols::payload::{self, layout};

/// Errors raised while validating an `EngineConfig`.
///
/// # Examples
/// ```
/// use seqshark_core::{ConfigError, Engine, EngineConfig};
///
/// let config = EngineConfig {
///     malformed_marker_hex: "31z".to_string(),
///     ..EngineConfig::default()
/// };
/// let err = Engine::new(config).unwrap_err();
/// assert!(matches!(err, ConfigError::InvalidMarker { .. }));
/// ```
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid multicast prefix '{prefix}': {reason}")]
    InvalidPrefix { prefix: String, reason: &'static str },
    #[error("invalid malformed marker '{marker}': {reason}")]
    InvalidMarker { marker: String, reason: &'static str },
    #[error("sequence byte offset {offset} is too large")]
    OffsetOverflow { offset: usize },
}

/// Filtering and decoding parameters of the analysis engine.
///
/// Missing fields take their defaults when deserialized.
///
/// # Examples
/// ```
/// use seqshark_core::EngineConfig;
///
/// let config: EngineConfig = serde_json::from_str(r#"{"multicast_prefix":"239.1."}"#).unwrap();
/// assert_eq!(config.multicast_prefix, "239.1.");
/// assert_eq!(config.sequence_byte_offset, 10);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Destination address prefix of the multicast groups of interest.
    pub multicast_prefix: String,
    /// Hex marker that starts a known short malformed frame.
    pub malformed_marker_hex: String,
    /// Frames starting with the marker are malformed up to this length (inclusive).
    pub malformed_max_length: u64,
    /// Byte offset of the 4-byte sequence number in the payload.
    pub sequence_byte_offset: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            multicast_prefix: layout::DEFAULT_MULTICAST_PREFIX.to_string(),
            malformed_marker_hex: layout::DEFAULT_MALFORMED_MARKER.to_string(),
            malformed_max_length: layout::DEFAULT_MALFORMED_MAX_LENGTH,
            sequence_byte_offset: layout::DEFAULT_SEQUENCE_OFFSET,
        }
    }
}

/// Validated engine configuration.
///
/// # Examples
/// ```
/// use seqshark_core::{Engine, EngineConfig};
///
/// let engine = Engine::new(EngineConfig::default()).unwrap();
/// assert_eq!(engine.sequence_number(Some("000000000000000000000000007b")), Some(123));
/// ```
#[derive(Debug, Clone)]
pub struct Engine {
    config: EngineConfig,
    marker: String,
}

impl Engine {
    pub fn new(config: EngineConfig) -> Result<Self, ConfigError> {
        validate_prefix(&config.multicast_prefix)?;
        let marker = validate_marker(&config.malformed_marker_hex)?;
        if layout::sequence_hex_range(config.sequence_byte_offset).is_none() {
            return Err(ConfigError::OffsetOverflow {
                offset: config.sequence_byte_offset,
            });
        }
        Ok(Self { config, marker })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn sequence_number(&self, payload_hex: Option<&str>) -> Option<u32> {
        payload::extract_sequence_number(payload_hex, self.config.sequence_byte_offset)
    }

    pub fn is_group_of_interest(&self, destination: &str) -> bool {
        destination.starts_with(&self.config.multicast_prefix)
    }

    pub fn is_short_marked_frame(&self, payload_hex: Option<&str>, length: u64) -> bool {
        length <= self.config.malformed_max_length && payload::has_marker(payload_hex, &self.marker)
    }
}

fn validate_prefix(prefix: &str) -> Result<(), ConfigError> {
    let invalid = |reason| ConfigError::InvalidPrefix {
        prefix: prefix.to_string(),
        reason,
    };
    if prefix.is_empty() {
        return Err(invalid("prefix is empty"));
    }
    if !prefix
        .chars()
        .all(|c| c.is_ascii_hexdigit() || c == '.' || c == ':')
    {
        return Err(invalid("expected dotted IPv4 or IPv6 address text"));
    }
    Ok(())
}

fn validate_marker(marker: &str) -> Result<String, ConfigError> {
    let invalid = |reason| ConfigError::InvalidMarker {
        marker: marker.to_string(),
        reason,
    };
    if marker.is_empty() {
        return Err(invalid("marker is empty"));
    }
    if marker.len() % layout::HEX_CHARS_PER_BYTE != 0 {
        return Err(invalid("marker must be whole bytes"));
    }
    if !marker.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(invalid("marker must be hexadecimal"));
    }
    Ok(marker.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::{ConfigError, Engine, EngineConfig};

    #[test]
    fn defaults_validate() {
        let engine = Engine::new(EngineConfig::default()).unwrap();
        assert_eq!(engine.config().multicast_prefix, "239.50.");
        assert_eq!(engine.config().malformed_marker_hex, "3100");
        assert_eq!(engine.config().malformed_max_length, 65);
    }

    #[test]
    fn empty_prefix_rejected() {
        let config = EngineConfig {
            multicast_prefix: String::new(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(ConfigError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn non_address_prefix_rejected() {
        let config = EngineConfig {
            multicast_prefix: "239.50.*".to_string(),
            ..EngineConfig::default()
        };
        assert!(matches!(
            Engine::new(config),
            Err(ConfigError::InvalidPrefix { .. })
        ));
    }

    #[test]
    fn ipv6_prefix_accepted() {
        let config = EngineConfig {
            multicast_prefix: "ff15:".to_string(),
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        assert!(engine.is_group_of_interest("ff15::1"));
    }

    #[test]
    fn odd_marker_rejected() {
        let config = EngineConfig {
            malformed_marker_hex: "310".to_string(),
            ..EngineConfig::default()
        };
        let err = Engine::new(config).unwrap_err();
        assert!(err.to_string().contains("whole bytes"));
    }

    #[test]
    fn offset_overflow_rejected() {
        let config = EngineConfig {
            sequence_byte_offset: usize::MAX,
            ..EngineConfig::default()
        };
        assert_eq!(
            Engine::new(config).unwrap_err(),
            ConfigError::OffsetOverflow { offset: usize::MAX }
        );
    }

    #[test]
    fn marker_match_is_case_insensitive() {
        let config = EngineConfig {
            malformed_marker_hex: "AB00".to_string(),
            ..EngineConfig::default()
        };
        let engine = Engine::new(config).unwrap();
        assert!(engine.is_short_marked_frame(Some("ab00ffff"), 60));
        assert!(!engine.is_short_marked_frame(Some("ab00ffff"), 66));
    }

    #[test]
    fn partial_json_uses_defaults() {
        let config: EngineConfig = serde_json::from_str(r#"{"malformed_max_length": 80}"#).unwrap();
        assert_eq!(config.malformed_max_length, 80);
        assert_eq!(config.multicast_prefix, "239.50.");
    }
}
