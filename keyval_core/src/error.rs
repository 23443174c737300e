use std::fmt;

/// Runtime errors surfaced by storage operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreError {
    /// An operation expected one value shape but the key holds the other.
    /// The operation never mutates state when this is returned.
    WrongType,
    /// `shutdown` was called on an already-shut-down store.
    Closed,
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::WrongType => {
                write!(f, "operation against a key holding the wrong kind of value")
            }
            StoreError::Closed => write!(f, "store is already shut down"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Construction and configuration errors. These are fatal at startup and
/// never occur at steady state.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(err) => write!(f, "failed to read config: {}", err),
            ConfigError::Parse(err) => write!(f, "failed to parse config: {}", err),
            ConfigError::Invalid(reason) => write!(f, "invalid config: {}", reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            ConfigError::Invalid(_) => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrong_type_message() {
        assert_eq!(
            StoreError::WrongType.to_string(),
            "operation against a key holding the wrong kind of value"
        );
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Invalid("shards must be at least 1".to_string());
        assert_eq!(err.to_string(), "invalid config: shards must be at least 1");
    }
}
