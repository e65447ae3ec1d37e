//! The four CRUD verbs over the managed crontab entry.
//!
//! Every verb shares one shape: build spec(s) from the resolved
//! interpreter, open a session, decide, mutate, commit, report. Requests
//! are a closed set of typed variants dispatched through one function.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use pycron_core::{CronEntrySpec, Outcome, OperationReport, PycronError};

use crate::runner::CrontabRunner;
use crate::session::Session;

/// What the managed entry runs.
#[derive(Debug, Clone)]
pub enum JobSource {
    /// `<interpreter> <script>`
    Script(PathBuf),
    /// `cd <dir> && <interpreter> -m <module>`
    Module { dir: PathBuf, name: String },
}

/// One (interval, source) pair from the CLI.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub interval: u32,
    pub source: JobSource,
}

/// The closed set of verb requests.
#[derive(Debug, Clone)]
pub enum Request {
    /// Create the entry; no-op if the exact entry is already managed.
    Install(JobRequest),
    /// Append the entry unless it already exists; installs a fresh table
    /// when none exists.
    Insert(JobRequest),
    /// Remove every line equal to the built entry.
    Remove(JobRequest),
    /// Full-spec update: replace the first line equal to `old`'s entry
    /// with `new`'s entry.
    Update { old: JobRequest, new: JobRequest },
    /// Legacy interval-only update: rewrite the step digits of the first
    /// line matching `<interpreter> <script>`.
    UpdateInterval(JobRequest),
}

/// Owns the runner and the process-wide session lock. One managed job
/// identity per invocation; concurrent dispatches serialize, they never
/// interleave fetch/commit.
pub struct CronManager {
    runner: Arc<dyn CrontabRunner>,
    session_lock: Mutex<()>,
}

impl CronManager {
    pub fn new(runner: Arc<dyn CrontabRunner>) -> Self {
        Self {
            runner,
            session_lock: Mutex::new(()),
        }
    }

    /// Run one verb to completion. Validation failures surface before the
    /// external table is touched; no partial mutation is possible.
    pub async fn dispatch(
        &self,
        interpreter: &Path,
        request: Request,
    ) -> Result<OperationReport, PycronError> {
        let _guard = self.session_lock.lock().await;
        match request {
            Request::Install(job) => self.install(interpreter, &job).await,
            Request::Insert(job) => self.insert(interpreter, &job).await,
            Request::Remove(job) => self.remove(interpreter, &job).await,
            Request::Update { old, new } => self.update(interpreter, &old, &new).await,
            Request::UpdateInterval(job) => self.update_interval(interpreter, &job).await,
        }
    }

    fn spec_for(
        &self,
        interpreter: &Path,
        job: &JobRequest,
    ) -> Result<CronEntrySpec, PycronError> {
        match &job.source {
            JobSource::Script(script) => {
                CronEntrySpec::script(job.interval, interpreter, script)
            }
            JobSource::Module { dir, name } => {
                CronEntrySpec::module(job.interval, interpreter, dir, name)
            }
        }
    }

    /// Install appends alongside unrelated lines; only an exact existing
    /// managed line turns it into a committed-unmodified no-op. Mere table
    /// existence is not the trigger.
    async fn install(
        &self,
        interpreter: &Path,
        job: &JobRequest,
    ) -> Result<OperationReport, PycronError> {
        let entry = self.spec_for(interpreter, job)?.build();
        let mut session = Session::open(self.runner.as_ref()).await?;
        let table_existed = session.table_existed();

        if session.document.find_exact(&entry).is_some() {
            info!(%entry, "entry already managed, nothing to install");
            return Ok(OperationReport::unchanged(Outcome::AlreadyPresent, table_existed));
        }
        session.document.append(&entry);
        session.commit().await?;
        Ok(OperationReport::applied(table_existed))
    }

    async fn insert(
        &self,
        interpreter: &Path,
        job: &JobRequest,
    ) -> Result<OperationReport, PycronError> {
        let entry = self.spec_for(interpreter, job)?.build();
        let mut session = Session::open(self.runner.as_ref()).await?;
        let table_existed = session.table_existed();

        if session.document.find_exact(&entry).is_some() {
            info!(%entry, "duplicate insert skipped");
            return Ok(OperationReport::unchanged(Outcome::AlreadyPresent, table_existed));
        }
        if !table_existed {
            drop(session);
            return self.install(interpreter, job).await;
        }
        session.document.append(&entry);
        session.commit().await?;
        Ok(OperationReport::applied(table_existed))
    }

    async fn remove(
        &self,
        interpreter: &Path,
        job: &JobRequest,
    ) -> Result<OperationReport, PycronError> {
        let entry = self.spec_for(interpreter, job)?.build();
        let mut session = Session::open(self.runner.as_ref()).await?;
        let table_existed = session.table_existed();

        let removed = session.document.remove_exact(&entry);
        if removed == 0 {
            return Ok(OperationReport::unchanged(Outcome::NotFound, table_existed));
        }
        info!(%entry, removed, "removing cron entry");
        session.commit().await?;
        Ok(OperationReport::applied(table_existed))
    }

    /// Both specs are built before any matching so that `old` is never
    /// lost by rebuilding shared state for `new`.
    async fn update(
        &self,
        interpreter: &Path,
        old: &JobRequest,
        new: &JobRequest,
    ) -> Result<OperationReport, PycronError> {
        let old_entry = self.spec_for(interpreter, old)?.build();
        let new_entry = self.spec_for(interpreter, new)?.build();
        let mut session = Session::open(self.runner.as_ref()).await?;
        let table_existed = session.table_existed();

        if !session.document.replace_first(&old_entry, &new_entry) {
            return Ok(OperationReport::unchanged(Outcome::NotFound, table_existed));
        }
        info!(old = %old_entry, new = %new_entry, "updating cron entry");
        session.commit().await?;
        Ok(OperationReport::applied(table_existed))
    }

    async fn update_interval(
        &self,
        interpreter: &Path,
        job: &JobRequest,
    ) -> Result<OperationReport, PycronError> {
        // Validates interval and script path up front, same as the verbs
        // that build a full entry.
        let spec = self.spec_for(interpreter, job)?;
        let JobSource::Script(script) = &job.source else {
            return Err(PycronError::MalformedModuleRequest);
        };
        let mut session = Session::open(self.runner.as_ref()).await?;
        let table_existed = session.table_existed();

        let interpreter_token = interpreter.display().to_string();
        let script_token = script.display().to_string();
        let rewritten = session.document.rewrite_interval(
            spec.interval(),
            &interpreter_token,
            &script_token,
        )?;
        if !rewritten {
            return Ok(OperationReport::unchanged(Outcome::NotFound, table_existed));
        }
        info!(interval = spec.interval(), script = %script_token, "rewriting entry interval");
        session.commit().await?;
        Ok(OperationReport::applied(table_existed))
    }
}
