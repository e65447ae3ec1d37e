//! Adapter over the external `crontab` utility.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use pycron_core::PycronError;

/// The three operations consumed from the external table utility.
#[async_trait]
pub trait CrontabRunner: Send + Sync {
    /// Full current table text, or `None` when no table exists for this
    /// user (the utility's nonzero "no crontab" exit, not an error).
    async fn list(&self) -> Result<Option<String>, PycronError>;

    /// Install `table` as the full new content, overwriting prior content.
    async fn replace(&self, table: &str) -> Result<(), PycronError>;

    /// Remove all entries for this user.
    async fn clear(&self) -> Result<(), PycronError>;
}

/// Runner backed by the system `crontab` binary.
pub struct SystemCrontab;

impl SystemCrontab {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SystemCrontab {
    fn default() -> Self {
        Self::new()
    }
}

fn command_failed(command: &str, detail: impl Into<String>) -> PycronError {
    PycronError::CommandFailed {
        command: command.to_string(),
        detail: detail.into(),
    }
}

#[async_trait]
impl CrontabRunner for SystemCrontab {
    async fn list(&self) -> Result<Option<String>, PycronError> {
        let output = Command::new("crontab")
            .arg("-l")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| command_failed("crontab -l", e.to_string()))?;
        if !output.status.success() {
            debug!(code = ?output.status.code(), "crontab -l nonzero exit, treating as empty table");
            return Ok(None);
        }
        Ok(Some(String::from_utf8_lossy(&output.stdout).into_owned()))
    }

    async fn replace(&self, table: &str) -> Result<(), PycronError> {
        let mut child = Command::new("crontab")
            .arg("-")
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_failed("crontab -", e.to_string()))?;
        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| command_failed("crontab -", "stdin not captured"))?;
        stdin
            .write_all(table.as_bytes())
            .await
            .map_err(|e| command_failed("crontab -", e.to_string()))?;
        drop(stdin);

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| command_failed("crontab -", e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(command_failed("crontab -", stderr.trim().to_string()));
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), PycronError> {
        let output = Command::new("crontab")
            .arg("-r")
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| command_failed("crontab -r", e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(command_failed("crontab -r", stderr.trim().to_string()));
        }
        Ok(())
    }
}

/// In-memory runner used by tests; mimics a per-user crontab including the
/// "no table" listing behavior.
pub struct MemoryCrontab {
    table: std::sync::Mutex<Option<String>>,
    fail_replace: std::sync::atomic::AtomicBool,
    /// When set, `replace` reports success but the stored table keeps its
    /// old content, so the commit round-trip check must fire.
    drop_writes: std::sync::atomic::AtomicBool,
}

impl MemoryCrontab {
    pub fn new() -> Self {
        Self {
            table: std::sync::Mutex::new(None),
            fail_replace: std::sync::atomic::AtomicBool::new(false),
            drop_writes: std::sync::atomic::AtomicBool::new(false),
        }
    }

    pub fn with_table(text: &str) -> Self {
        let runner = Self::new();
        *runner.table.lock().unwrap() = Some(text.to_string());
        runner
    }

    pub fn fail_replace(&self) {
        self.fail_replace
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn drop_writes(&self) {
        self.drop_writes
            .store(true, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Option<String> {
        self.table.lock().unwrap().clone()
    }
}

impl Default for MemoryCrontab {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CrontabRunner for MemoryCrontab {
    async fn list(&self) -> Result<Option<String>, PycronError> {
        Ok(self.table.lock().unwrap().clone())
    }

    async fn replace(&self, table: &str) -> Result<(), PycronError> {
        if self.fail_replace.load(std::sync::atomic::Ordering::SeqCst) {
            return Err(command_failed("crontab -", "simulated failure"));
        }
        if !self.drop_writes.load(std::sync::atomic::Ordering::SeqCst) {
            *self.table.lock().unwrap() = Some(table.to_string());
        }
        Ok(())
    }

    async fn clear(&self) -> Result<(), PycronError> {
        *self.table.lock().unwrap() = None;
        Ok(())
    }
}
