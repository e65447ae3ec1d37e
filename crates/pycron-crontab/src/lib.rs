//! pycron-crontab: the external `crontab` adapter and the CRUD operations.
//!
//! Layering: [`runner::CrontabRunner`] is the only point of contact with
//! the external utility; [`session::Session`] wraps one fetch-fresh
//! snapshot and the safe commit order; [`ops::CronManager`] dispatches the
//! typed verb requests, serialized through one in-process lock.

pub mod gate;
pub mod ops;
pub mod runner;
pub mod session;

pub use gate::{GateResolver, InterpreterGate, gate};
pub use ops::{CronManager, JobRequest, JobSource, Request};
pub use runner::{CrontabRunner, SystemCrontab};
pub use session::Session;
