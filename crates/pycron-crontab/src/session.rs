//! One read-modify-write cycle against the external table.

use tracing::{debug, info};

use pycron_core::{CrontabDocument, PycronError};

use crate::runner::CrontabRunner;

/// A fetch-fresh snapshot plus the commit path. Holds no OS-level lock of
/// its own; callers serialize sessions through the manager's lock.
pub struct Session<'a> {
    runner: &'a dyn CrontabRunner,
    pub document: CrontabDocument,
    table_existed: bool,
}

impl<'a> Session<'a> {
    /// Fetch the current table. A "no table" listing yields an empty
    /// document, not an error.
    pub async fn open(runner: &'a dyn CrontabRunner) -> Result<Session<'a>, PycronError> {
        let listing = runner.list().await?;
        let table_existed = listing.is_some();
        let document = match listing {
            Some(text) => CrontabDocument::from_listing(&text),
            None => CrontabDocument::empty(),
        };
        debug!(lines = document.len(), table_existed, "fetched crontab snapshot");
        Ok(Session {
            runner,
            document,
            table_existed,
        })
    }

    pub fn table_existed(&self) -> bool {
        self.table_existed
    }

    /// Install the mutated document as the full new table.
    ///
    /// Commit order is replace-then-verify: `crontab -` swaps the whole
    /// table in one step, so a failed replace leaves the previous content
    /// intact. The new text is then re-listed and compared; a mismatch is
    /// surfaced as [`PycronError::TableStateUnknown`] since the table may
    /// be partially lost. `crontab -r` is issued only for an emptied
    /// document, where there is nothing left to install.
    pub async fn commit(self) -> Result<(), PycronError> {
        if self.document.is_empty() {
            if self.table_existed {
                self.runner.clear().await?;
                info!("cleared crontab, no entries remain");
            }
            return Ok(());
        }

        let rendered = self.document.render();
        self.runner.replace(&rendered).await?;

        match self.runner.list().await {
            Ok(Some(read_back)) if read_back.trim_end() == rendered.trim_end() => {
                info!(lines = self.document.len(), "crontab committed");
                Ok(())
            }
            _ => Err(PycronError::TableStateUnknown),
        }
    }
}
