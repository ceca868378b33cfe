/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// A registered type satisfies neither the rule-based nor the
    /// type-declared schema contract (or is missing from the type table).
    InvalidSchemaSource { type_name: String },
    /// A route entry references handler information that cannot be resolved
    /// against the registry. Contained at the per-route boundary.
    UnresolvableHandler { route: String, message: String },
    InvalidArgument(String),
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::InvalidSchemaSource { type_name } => {
                write!(f, "invalid schema source: {}", type_name)
            }
            Error::UnresolvableHandler { route, message } => {
                write!(f, "unresolvable handler for {}: {}", route, message)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
