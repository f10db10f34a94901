use std::path::PathBuf;

/// Result alias that carries the custom [`ScopeError`] type.
pub type Result<T> = std::result::Result<T, ScopeError>;

/// Common error type for the core crate.
///
/// Nothing on the capture path returns this type. Every variant originates in
/// setup, configuration or export, all of which run outside the audio thread.
#[derive(Debug, thiserror::Error)]
pub enum ScopeError {
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// The configuration file could not be parsed or serialised.
    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    /// The audio engine could not be opened, configured or started.
    #[error("audio setup failed: {0}")]
    Setup(String),
    /// The export destination could not be opened or written.
    #[error("cannot export to `{}`: {source}", .path.display())]
    Export {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// A line of an exported point file is malformed.
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

impl ScopeError {
    pub fn setup<T: Into<String>>(msg: T) -> Self {
        Self::Setup(msg.into())
    }
}
