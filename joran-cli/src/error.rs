//! CLI-specific error types and exit code mapping

use joran_core::error::{JoranError, ParseError};

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to standard Unix exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// The document was interpreted but recorded recoverable errors.
    #[error("{0} error(s) recorded while interpreting the document")]
    Recoverable(usize),

    /// The document could not be parsed; nothing was applied.
    #[error("document rejected: {0}")]
    Document(#[from] ParseError),

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<JoranError> for CliError {
    fn from(e: JoranError) -> Self {
        match e {
            JoranError::Config(e) => Self::Config(e.to_string()),
            JoranError::Parse(e) => Self::Document(e),
            JoranError::Io(e) => Self::Io(e),
        }
    }
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                                 |
    /// |------|-----------------------------------------|
    /// | 0    | Success                                 |
    /// | 1    | General / command error                 |
    /// | 2    | Configuration error                     |
    /// | 5    | Document recorded recoverable errors    |
    /// | 6    | Document rejected (malformed, too big)  |
    /// | 10   | IO error                                |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => 2,
            Self::Recoverable(_) => 5,
            Self::Document(_) => 6,
            Self::Io(_) => 10,
            Self::JsonSerialize(_) | Self::Command(_) => 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use joran_core::error::ConfigError;

    #[test]
    fn test_exit_code_config_error() {
        let err = CliError::Config("test error".to_owned());
        assert_eq!(err.exit_code(), 2, "config error should return exit code 2");
    }

    #[test]
    fn test_exit_code_recoverable() {
        let err = CliError::Recoverable(3);
        assert_eq!(err.exit_code(), 5, "recoverable errors should return exit code 5");
    }

    #[test]
    fn test_exit_code_document() {
        let err = CliError::Document(ParseError::TooLarge { size: 10, max: 5 });
        assert_eq!(err.exit_code(), 6, "rejected document should return exit code 6");
    }

    #[test]
    fn test_exit_code_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err = CliError::Io(io_err);
        assert_eq!(err.exit_code(), 10, "io error should return exit code 10");
    }

    #[test]
    fn test_exit_code_command_error() {
        let err = CliError::Command("test error".to_owned());
        assert_eq!(err.exit_code(), 1, "command error should return exit code 1");
    }

    #[test]
    fn test_exit_code_json_serialize_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{invalid json")
            .expect_err("should fail parsing");
        let err = CliError::JsonSerialize(json_err);
        assert_eq!(err.exit_code(), 1, "json serialize error should return exit code 1");
    }

    #[test]
    fn test_from_joran_error_keeps_category() {
        let err: CliError = JoranError::Config(ConfigError::FileNotFound {
            path: "joran.toml".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("joran.toml"));

        let err: CliError = JoranError::Parse(ParseError::Xml {
            line: 3,
            column: 7,
            reason: "unexpected end".to_owned(),
        })
        .into();
        assert_eq!(err.exit_code(), 6);
        assert!(err.to_string().contains("line 3"));

        let err: CliError =
            JoranError::Io(std::io::Error::new(std::io::ErrorKind::Other, "boom")).into();
        assert_eq!(err.exit_code(), 10);
    }

    #[test]
    fn test_error_display_recoverable() {
        let err = CliError::Recoverable(2);
        assert_eq!(err.to_string(), "2 error(s) recorded while interpreting the document");
    }

    #[test]
    fn test_error_display_config() {
        let err = CliError::Config("missing field".to_owned());
        assert_eq!(err.to_string(), "configuration error: missing field");
    }
}
