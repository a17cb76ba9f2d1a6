//! CLI-specific error types and exit code mapping

use opsforge_core::error::{CompileError, OpsforgeError};

/// CLI-specific error type.
///
/// The `exit_code()` method maps each error to the process exit status.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Settings or input file could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),

    /// The unified configuration failed to compile.
    #[error("{0}")]
    Compile(#[from] CompileError),

    /// One or more backends rejected the configuration during `validate`.
    #[error("configuration is invalid for {failed} of {checked} backend(s)")]
    Invalid { failed: usize, checked: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (input read, output write, stdout).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<OpsforgeError> for CliError {
    fn from(err: OpsforgeError) -> Self {
        match err {
            OpsforgeError::Config(e) => Self::Config(e.to_string()),
            OpsforgeError::Compile(e) => Self::Compile(e),
            OpsforgeError::Io(e) => Self::Io(e),
        }
    }
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                          |
    /// |------|----------------------------------|
    /// | 0    | Success                          |
    /// | 1    | Compile error / invalid config   |
    /// | 2    | Settings or usage error          |
    /// | 3    | IO error                         |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Compile(_) | Self::Invalid { .. } | Self::JsonSerialize(_) => 1,
            Self::Config(_) => 2,
            Self::Io(_) => 3,
        }
    }
}
