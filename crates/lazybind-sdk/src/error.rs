//! Error types shared between hosts and the engine

/// Result type for reflector calls
pub type NativeResult<T> = Result<T, NativeError>;

/// Errors a native reflector (or an installed callable) may raise.
///
/// The engine never lets these escape into the accessing script: anything
/// raised below the interception boundary is logged and degraded to
/// "member not found".
#[derive(Debug, Clone, thiserror::Error)]
pub enum NativeError {
    /// The reflection query itself failed (malformed name, security
    /// restriction, unloadable type)
    #[error("Resolution error: {0}")]
    Resolution(String),

    /// A marshaled value had the wrong shape for the access
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch {
        /// Expected shape
        expected: String,
        /// Actual shape
        got: String,
    },

    /// Invalid argument passed to a callable
    #[error("Argument error: {0}")]
    ArgumentError(String),

    /// The host does not support the requested operation
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

impl From<String> for NativeError {
    fn from(s: String) -> Self {
        NativeError::Resolution(s)
    }
}

impl From<&str> for NativeError {
    fn from(s: &str) -> Self {
        NativeError::Resolution(s.to_string())
    }
}
