//! This library implements the job generation and dispatch side of
//! fitness landscape parameter sweeps.
//!
//! A sweep is described by a [`SweepConfig`]. Its grid part is expanded into
//! the full, ordered list of [`JobDescriptor`]s by [`grid::enumerate`], each
//! descriptor being one invocation of an external simulation program. The
//! [`Dispatcher`] then runs those jobs as OS processes, never more than the
//! configured number at once, and tells a [`ProgressReporter`] about every
//! job that finishes.
//!
//! The simulation programs themselves are opaque to this library. Only
//! their command line contract and their termination are of interest here.
//!
//! # Example
//!
//! ```ignore
//! use sweep_core::{grid, ConsoleReporter, Dispatcher, JobQueue, ProcessLauncher, SweepConfig};
//!
//! let config = SweepConfig::from_path("sweep.toml")?;
//! let jobs = grid::enumerate(&config.grid)?;
//! let mut dispatcher = Dispatcher::new(&config.dispatch, ProcessLauncher, ConsoleReporter::stdout())?;
//! let summary = dispatcher.run(JobQueue::new(jobs))?;
//! ```
//!
//! [`SweepConfig`]: config/struct.SweepConfig.html
//! [`JobDescriptor`]: job/struct.JobDescriptor.html
//! [`grid::enumerate`]: grid/fn.enumerate.html
//! [`Dispatcher`]: dispatch/struct.Dispatcher.html
//! [`ProgressReporter`]: progress/trait.ProgressReporter.html

#[macro_use]
extern crate serde;
#[macro_use]
extern crate log;

// reexports
pub use config::{DispatchConfig, Strategy, SweepConfig};
pub use dispatch::{Dispatcher, Outcome, ProcessLauncher, Retirement, Snapshot, Summary};
pub use error::{Error, Result};
pub use grid::{GridConfig, Mode, Variant};
pub use job::{JobDescriptor, JobQueue};
pub use progress::{ConsoleReporter, ProgressReporter};

pub mod config;
pub mod dispatch;
pub mod error;
pub mod grid;
pub mod job;
pub mod progress;

mod util;
