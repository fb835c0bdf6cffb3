//! Error types for the QuietCool bridge

use std::fmt;
use thiserror::Error;

/// Which side of the speed mapping table a value failed to resolve on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MappingDomain {
    /// Host-facing rotation speed percentage
    Percentage,
    /// Controller-native speed code
    ProtocolCode,
}

impl fmt::Display for MappingDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MappingDomain::Percentage => f.write_str("percentage"),
            MappingDomain::ProtocolCode => f.write_str("protocol speed code"),
        }
    }
}

/// Core error type for QuietCool operations
#[derive(Error, Debug)]
pub enum QuietCoolError {
    /// The controller call failed (transport, HTTP status, or device-reported failure)
    #[error("Controller error: {0}")]
    Protocol(String),

    /// A value fell outside the closed speed mapping table
    #[error("Unmapped {domain} value: {value}")]
    UnmappedValue { domain: MappingDomain, value: u32 },

    /// One discovered device could not be turned into an accessory
    #[error("Skipped device {uid}: {reason}")]
    DiscoveryPartialFailure { uid: String, reason: String },

    /// The device stream ended without the controller's completion signal
    #[error("Discovery ended before the controller signalled completion ({found} devices seen)")]
    DiscoveryIncomplete { found: usize },

    /// A discovery descriptor is missing required fields
    #[error("Invalid device descriptor: {0}")]
    InvalidDescriptor(String),

    /// Invalid input or arguments
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The accessory does not expose the requested characteristic
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// No accessory registered under this uid
    #[error("Accessory not found: {0}")]
    AccessoryNotFound(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl QuietCoolError {
    /// Whether a blind repeat of the same read could succeed.
    ///
    /// Only controller failures qualify; mapping and input errors are
    /// deterministic.
    pub fn is_transient(&self) -> bool {
        matches!(self, QuietCoolError::Protocol(_))
    }
}

/// Result type alias for QuietCool operations
pub type Result<T> = std::result::Result<T, QuietCoolError>;

impl From<serde_json::Error> for QuietCoolError {
    fn from(err: serde_json::Error) -> Self {
        QuietCoolError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serde_json_error_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("invalid json").unwrap_err();
        let err: QuietCoolError = json_err.into();

        match err {
            QuietCoolError::Serialization(msg) => {
                assert!(!msg.is_empty());
            }
            _ => panic!("Expected Serialization error"),
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: QuietCoolError = io_err.into();

        match err {
            QuietCoolError::Io(e) => {
                assert_eq!(e.kind(), std::io::ErrorKind::NotFound);
            }
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_error_display() {
        let err = QuietCoolError::Protocol("connection refused".to_string());
        assert_eq!(format!("{}", err), "Controller error: connection refused");

        let err = QuietCoolError::UnmappedValue {
            domain: MappingDomain::Percentage,
            value: 25,
        };
        assert_eq!(format!("{}", err), "Unmapped percentage value: 25");

        let err = QuietCoolError::UnmappedValue {
            domain: MappingDomain::ProtocolCode,
            value: 7,
        };
        assert_eq!(format!("{}", err), "Unmapped protocol speed code value: 7");

        let err = QuietCoolError::DiscoveryIncomplete { found: 2 };
        assert_eq!(
            format!("{}", err),
            "Discovery ended before the controller signalled completion (2 devices seen)"
        );

        let err = QuietCoolError::DiscoveryPartialFailure {
            uid: "abc".to_string(),
            reason: "missing name".to_string(),
        };
        assert_eq!(format!("{}", err), "Skipped device abc: missing name");
    }

    #[test]
    fn test_only_protocol_errors_are_transient() {
        assert!(QuietCoolError::Protocol("timeout".to_string()).is_transient());
        assert!(!QuietCoolError::UnmappedValue {
            domain: MappingDomain::ProtocolCode,
            value: 2,
        }
        .is_transient());
        assert!(!QuietCoolError::InvalidInput("x".to_string()).is_transient());
    }
}
