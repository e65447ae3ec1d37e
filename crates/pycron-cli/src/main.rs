use std::path::PathBuf;
use std::sync::Arc;

use clap::{ArgGroup, Parser};
use tracing::warn;

use pycron_core::entry::{parse_interval, split_module_request, validate_path};
use pycron_core::{OperationReport, Outcome, PycronError};
use pycron_crontab::{CronManager, JobRequest, JobSource, Request, SystemCrontab, gate};

#[derive(Parser)]
#[command(
    name = "pycron",
    about = "Manage a periodic python job as one entry of the user's crontab",
    group(
        ArgGroup::new("verb")
            .args(["init", "insert", "update", "delete"])
            .required(true)
            .multiple(false)
    )
)]
struct Cli {
    /// Put an entry into the crontab with the given interval in minutes
    /// and path to a python script; no-op if the exact entry exists
    #[arg(long, short = 'i', num_args = 2, value_names = ["INTERVAL", "PATH"])]
    init: Option<Vec<String>>,

    /// Insert a new entry unless it already exists
    #[arg(long, num_args = 2, value_names = ["INTERVAL", "PATH"])]
    insert: Option<Vec<String>>,

    /// Update an entry. With --old/--new pairs the whole entry is
    /// replaced; with two inline values only the interval of the matching
    /// entry is rewritten (legacy form)
    #[arg(long, short = 'u', num_args = 0..=2, value_names = ["INTERVAL", "PATH"])]
    update: Option<Vec<String>>,

    /// Remove every entry matching the given interval and path
    #[arg(long, short = 'd', num_args = 2, value_names = ["INTERVAL", "PATH"])]
    delete: Option<Vec<String>>,

    /// The entry to replace, as an (interval, path) pair
    #[arg(long, num_args = 2, value_names = ["INTERVAL", "PATH"], requires = "update")]
    old: Option<Vec<String>>,

    /// The replacement entry, as an (interval, path) pair
    #[arg(long, num_args = 2, value_names = ["INTERVAL", "PATH"], requires = "update")]
    new: Option<Vec<String>>,

    /// Path to the python interpreter used to run the job
    #[arg(long, required = true)]
    py: PathBuf,

    /// Interpret PATH as "<dir> <module>" and schedule
    /// `cd <dir> && <py> -m <module>` instead of a script invocation
    #[arg(long, short = 'm')]
    module: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Verb {
    Init,
    Insert,
    Update,
    Delete,
}

fn job_request(values: &[String], module: bool) -> Result<JobRequest, PycronError> {
    let interval = parse_interval(&values[0])?;
    let source = if module {
        let (dir, name) = split_module_request(&values[1])?;
        JobSource::Module { dir, name }
    } else {
        JobSource::Script(PathBuf::from(&values[1]))
    };
    Ok(JobRequest { interval, source })
}

fn build_request(cli: &Cli) -> Result<(Verb, Request), PycronError> {
    if let Some(values) = &cli.init {
        return Ok((Verb::Init, Request::Install(job_request(values, cli.module)?)));
    }
    if let Some(values) = &cli.insert {
        return Ok((Verb::Insert, Request::Insert(job_request(values, cli.module)?)));
    }
    if let Some(values) = &cli.delete {
        return Ok((Verb::Delete, Request::Remove(job_request(values, cli.module)?)));
    }
    if let Some(values) = &cli.update {
        return match values.len() {
            2 => {
                if cli.old.is_some() || cli.new.is_some() {
                    return Err(PycronError::InvalidUpdateRequest(
                        "use either the legacy inline INTERVAL PATH form or --old/--new pairs, not both".into(),
                    ));
                }
                if cli.module {
                    return Err(PycronError::InvalidUpdateRequest(
                        "the legacy interval-only update does not support --module".into(),
                    ));
                }
                Ok((Verb::Update, Request::UpdateInterval(job_request(values, false)?)))
            }
            0 => match (&cli.old, &cli.new) {
                (Some(old), Some(new)) => Ok((
                    Verb::Update,
                    Request::Update {
                        old: job_request(old, cli.module)?,
                        new: job_request(new, cli.module)?,
                    },
                )),
                _ => Err(PycronError::InvalidUpdateRequest(
                    "a full update needs both --old and --new (interval, path) pairs".into(),
                )),
            },
            _ => Err(PycronError::InvalidUpdateRequest(
                "--update takes either two inline values (INTERVAL PATH) or none with --old/--new".into(),
            )),
        };
    }
    // The clap verb group is required, so one of the arms above matched.
    Err(PycronError::InvalidUpdateRequest("no verb flag provided".into()))
}

fn print_status(verb: Verb, report: &OperationReport) {
    let user = std::env::var("USER").unwrap_or_else(|_| "unknown".into());
    match (verb, report.outcome) {
        (Verb::Init, Outcome::Applied) if !report.table_existed => {
            println!("Generating a new crontab for {user} user...");
        }
        (Verb::Init, Outcome::Applied) => {
            println!("Adding the cron entry for {user} user...");
        }
        (Verb::Init, Outcome::AlreadyPresent) => {
            println!("{user} user already has this cron entry. Call --update to alter it");
        }
        (Verb::Insert, Outcome::Applied) if !report.table_existed => {
            println!("No crontab found. Initializing one for {user} user...");
        }
        (Verb::Insert, Outcome::Applied) => println!("Inserting a new cron entry..."),
        (Verb::Insert, Outcome::AlreadyPresent) => println!("This cron entry already exists"),
        (Verb::Delete, Outcome::Applied) => println!("Removing the cron entry..."),
        (Verb::Delete, Outcome::NotFound) => {
            println!("No entry found to be deleted with the provided parameters");
        }
        (Verb::Update, Outcome::Applied) => println!("Updating the cron entry..."),
        (Verb::Update, Outcome::NotFound) => {
            println!("No correspondent cron entry found to be updated");
        }
        _ => {}
    }
    if report.was_modified {
        println!("Done!");
    }
}

fn preflight() {
    if which::which("crontab").is_err() {
        warn!("crontab binary not found on PATH; install cron before scheduling jobs");
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let (verb, request) = match build_request(&cli) {
        Ok(pair) => pair,
        Err(e) => {
            eprintln!("{e}");
            return Ok(e.exit_code());
        }
    };

    let (resolver, waiter) = gate();

    // Interpreter resolution runs as its own task; the verb task
    // rendezvouses at the gate before building any entry.
    let py = cli.py.clone();
    let resolve_task = tokio::spawn(async move {
        match validate_path(&py) {
            Ok(()) => {
                resolver.resolve(py);
                Ok(())
            }
            // Dropping the resolver leaves the gate unresolved.
            Err(e) => Err(e),
        }
    });

    let manager = CronManager::new(Arc::new(SystemCrontab::new()));
    let verb_task = tokio::spawn(async move {
        let interpreter = waiter.await_interpreter().await?;
        manager.dispatch(&interpreter, request).await
    });

    let (resolved, dispatched) = tokio::join!(resolve_task, verb_task);
    if let Err(e) = resolved? {
        eprintln!("{e}");
        return Ok(e.exit_code());
    }
    match dispatched? {
        Ok(report) => {
            print_status(verb, &report);
            Ok(report.exit_code())
        }
        Err(e) => {
            eprintln!("{e}");
            Ok(e.exit_code())
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    preflight();

    let rt = tokio::runtime::Runtime::new()?;
    let code = rt.block_on(run(cli))?;
    if code != 0 {
        std::process::exit(code);
    }
    Ok(())
}
