/// Error types for the ip2geo library
use std::fmt;

/// Result type alias for database operations
pub type Result<T> = std::result::Result<T, GeoError>;

/// Main error type for database operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoError {
    /// Path does not reference a regular, readable file
    DatabaseNotFound(String),

    /// File too short or header fields inconsistent with the file
    CorruptHeader(String),

    /// Query input is not an IPv4 or IPv6 address
    InvalidAddress(String),

    /// A row or string pointer reaches outside the mapped region
    CorruptRecord(String),

    /// Translation table input could not be loaded
    Translation(String),

    /// I/O errors
    Io(String),

    /// The database handle has been closed
    Closed,
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::DatabaseNotFound(path) => write!(f, "Database not found: {}", path),
            GeoError::CorruptHeader(msg) => write!(f, "Corrupt header: {}", msg),
            GeoError::InvalidAddress(input) => {
                write!(f, "Invalid address: {:?} is not an IPv4 or IPv6 address", input)
            }
            GeoError::CorruptRecord(msg) => write!(f, "Corrupt record: {}", msg),
            GeoError::Translation(msg) => write!(f, "Translation table error: {}", msg),
            GeoError::Io(msg) => write!(f, "I/O error: {}", msg),
            GeoError::Closed => write!(f, "Database handle is closed"),
        }
    }
}

impl std::error::Error for GeoError {}

impl From<std::io::Error> for GeoError {
    fn from(err: std::io::Error) -> Self {
        GeoError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for GeoError {
    fn from(err: serde_json::Error) -> Self {
        GeoError::Translation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        assert_eq!(
            GeoError::DatabaseNotFound("/nonexistent".to_string()).to_string(),
            "Database not found: /nonexistent"
        );
        assert_eq!(
            GeoError::InvalidAddress("not-an-ip".to_string()).to_string(),
            "Invalid address: \"not-an-ip\" is not an IPv4 or IPv6 address"
        );
        assert_eq!(GeoError::Closed.to_string(), "Database handle is closed");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(GeoError::from(io), GeoError::Io(msg) if msg.contains("denied")));
    }
}
