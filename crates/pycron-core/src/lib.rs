//! pycron-core: crontab entry specs and the in-memory table document.
//!
//! Pure building blocks shared by the crontab session layer and the CLI:
//! no process I/O happens here.

pub mod document;
pub mod entry;
pub mod error;

pub use document::CrontabDocument;
pub use entry::CronEntrySpec;
pub use error::PycronError;

/// How an operation left the crontab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The table was mutated and committed.
    Applied,
    /// The requested entry was already present; nothing was written.
    AlreadyPresent,
    /// No matching entry was found; nothing was written.
    NotFound,
}

/// Result of one CRUD operation against the crontab.
#[derive(Debug, Clone, Copy)]
pub struct OperationReport {
    pub outcome: Outcome,
    /// Whether the table text was changed by this operation.
    pub was_modified: bool,
    /// Whether a crontab existed for the user before the operation ran.
    pub table_existed: bool,
}

impl OperationReport {
    pub fn applied(table_existed: bool) -> Self {
        Self {
            outcome: Outcome::Applied,
            was_modified: true,
            table_existed,
        }
    }

    pub fn unchanged(outcome: Outcome, table_existed: bool) -> Self {
        Self {
            outcome,
            was_modified: false,
            table_existed,
        }
    }

    /// Process exit code for this outcome. Idempotent no-ops exit 0 since
    /// the post-state equals the requested state.
    pub fn exit_code(&self) -> i32 {
        match self.outcome {
            Outcome::Applied | Outcome::AlreadyPresent => 0,
            Outcome::NotFound => 3,
        }
    }
}
