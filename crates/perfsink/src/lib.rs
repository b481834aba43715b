//! `perfsink` - A fire-and-forget sink for performance run submissions
//!
//! Payloads that parse as JSON are appended, unchanged, to a run file named
//! after the Unix second they arrived in. Everything else is dropped without
//! telling the caller.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod payload;
pub mod server;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use payload::{Payload, Rejection};
pub use storage::{IngestOutcome, LockedAppend, RunFile, RunStore};
