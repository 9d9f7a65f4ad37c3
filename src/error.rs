use std::path::PathBuf;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// Malformed configuration file or routes file
    Config { file: PathBuf, message: String },
    /// A `strategies` entry names a strategy the registry does not know
    UnknownStrategy { stage: String, name: String },
    /// A route's handler class/method could not be resolved (broken wiring)
    HandlerResolution { route: String, message: String },
    SerializationError(String),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::Config { file, message } => {
                write!(f, "configuration error in {}: {}", file.display(), message)
            }
            Error::UnknownStrategy { stage, name } => {
                write!(f, "unknown strategy '{}' configured for stage '{}'", name, stage)
            }
            Error::HandlerResolution { route, message } => {
                write!(f, "cannot resolve handler for route '{}': {}", route, message)
            }
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
        Error::SerializationError(format!("JSON error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML error: {}", err))
    }
}
