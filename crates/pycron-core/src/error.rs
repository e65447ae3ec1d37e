//! Error taxonomy and exit-code mapping.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum PycronError {
    #[error("the minutes field must be encompassed from 0 up to 59 (got {0})")]
    IntervalOutOfRange(String),

    #[error("{0} not found")]
    PathNotFound(PathBuf),

    #[error("no python interpreter was resolved; pass a valid --py before any verb can run")]
    InterpreterUnresolved,

    #[error("module mode needs both a module directory and a module name")]
    MalformedModuleRequest,

    #[error("{0}")]
    InvalidUpdateRequest(String),

    #[error("`{command}` failed: {detail}")]
    CommandFailed { command: String, detail: String },

    #[error(
        "crontab state is unknown: the table no longer reads back as the committed text; \
         inspect `crontab -l` before retrying"
    )]
    TableStateUnknown,

    #[error("invalid match pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PycronError {
    /// Process exit code for this error class: 2 for validation failures,
    /// 4 for external command failures, 5 when the table may be partially lost.
    pub fn exit_code(&self) -> i32 {
        match self {
            PycronError::IntervalOutOfRange(_)
            | PycronError::PathNotFound(_)
            | PycronError::InterpreterUnresolved
            | PycronError::MalformedModuleRequest
            | PycronError::InvalidUpdateRequest(_) => 2,
            PycronError::CommandFailed { .. }
            | PycronError::Pattern(_)
            | PycronError::Io(_) => 4,
            PycronError::TableStateUnknown => 5,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_per_class() {
        assert_eq!(PycronError::IntervalOutOfRange("61".into()).exit_code(), 2);
        assert_eq!(PycronError::PathNotFound("/no/such".into()).exit_code(), 2);
        assert_eq!(PycronError::InterpreterUnresolved.exit_code(), 2);
        assert_eq!(
            PycronError::CommandFailed {
                command: "crontab -l".into(),
                detail: "spawn failed".into(),
            }
            .exit_code(),
            4
        );
        assert_eq!(PycronError::TableStateUnknown.exit_code(), 5);
    }
}
