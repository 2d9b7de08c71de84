use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for the library
pub type Result<T> = std::result::Result<T, Error>;

/// Error types raised while building a specification
#[derive(Debug, Error)]
pub enum Error {
    /// A handler reference could not be mapped to a qualified name.
    ///
    /// Non-fatal: the caller falls back to defaults for every handler field.
    #[error("cannot resolve handler identity `{0}`")]
    Resolution(String),

    #[error("failed to parse {}: {message}", file.display())]
    Parse { file: PathBuf, message: String },

    /// A recognised annotation tag carried an unparsable value.
    #[error("malformed annotation on `{symbol}`: `{line}` ({reason})")]
    MalformedAnnotation {
        symbol: String,
        line: String,
        reason: String,
    },

    #[error("invalid validation clause `{clause}` on field `{field}`: {reason}")]
    SchemaConstraint {
        field: String,
        clause: String,
        reason: String,
    },

    #[error("no source declaration found for handler `{symbol}`")]
    SourceNotFound { symbol: String },

    #[error("route {method} {path} is registered more than once")]
    DuplicateRoute { method: String, path: String },

    /// Wraps any failure with the route it happened on.
    #[error("route {method} {path}: {source}")]
    Route {
        method: String,
        path: String,
        #[source]
        source: Box<Error>,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(String),
}

impl Error {
    /// Attaches the offending route to an error.
    pub fn at_route(self, method: impl Into<String>, path: impl Into<String>) -> Self {
        match self {
            // Already identifies its route
            Error::Route { .. } | Error::DuplicateRoute { .. } => self,
            other => Error::Route {
                method: method.into(),
                path: path.into(),
                source: Box::new(other),
            },
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(format!("JSON: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::Serialization(format!("YAML: {}", err))
    }
}
