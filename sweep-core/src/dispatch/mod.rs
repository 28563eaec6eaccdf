//! Bounded-concurrency dispatch of jobs.
//!
//! # Overview
//!
//! The [`Dispatcher`] drains a [`JobQueue`] while never running more than
//! `parallelism` jobs at once. Jobs are launched in queue order as slots
//! free up, a slot is freed only once the job occupying it is observed to
//! have terminated. Every termination retires the job, whatever its exit
//! status, and the reporter is told about it right away.
//!
//! # Strategies
//!
//! Terminations are learned about in one of two ways:
//!
//! - `Poll`: a single loop fills free slots, checks active jobs without
//!   blocking and retires at most one terminated job per cycle. When a
//!   cycle makes no progress the loop sleeps for the poll interval.
//! - `Notify`: each launched job gets a waiter thread blocking on its
//!   completion. Waiters send the outcome over a channel and the
//!   coordinating loop retires jobs one message at a time.
//!
//! Either way all bookkeeping happens on the thread calling
//! [`Dispatcher::run`], so `completed + active + queued == total` holds at
//! every observation point.
//!
//! [`Dispatcher`]: struct.Dispatcher.html
//! [`JobQueue`]: ../job/struct.JobQueue.html
//! [`Dispatcher::run`]: struct.Dispatcher.html#method.run

pub mod launch;

mod notify;
mod poll;

pub use launch::{JobHandle, Launcher, Outcome, ProcessHandle, ProcessLauncher};

use std::time::Duration;

use crate::config::{DispatchConfig, Strategy};
use crate::error::{Error, Result};
use crate::job::{JobDescriptor, JobQueue};
use crate::progress::ProgressReporter;

/// Retired job together with the progress at the time of its retirement.
#[derive(Debug, Clone, PartialEq)]
pub struct Retirement {
    /// Position of the job in the original queue
    pub index: usize,
    pub job: JobDescriptor,
    pub outcome: Outcome,
    /// Number of retired jobs, this one included
    pub completed: usize,
    pub total: usize,
}

/// Dispatcher state at an observation point.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Snapshot {
    pub completed: usize,
    pub active: usize,
    pub queued: usize,
    pub total: usize,
}

/// Result of a finished sweep.
#[derive(Debug, Clone, Default)]
pub struct Summary {
    pub total: usize,
    pub completed: usize,
    /// Retirements with an unsuccessful outcome, in retirement order
    pub failed: Vec<Retirement>,
}

impl Summary {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Job that left the queue and is occupying a slot.
pub(crate) struct Active {
    pub index: usize,
    pub job: JobDescriptor,
}

/// Bookkeeping shared by both strategies.
pub(crate) struct Tally<'r, R: ProgressReporter> {
    reporter: &'r mut R,
    total: usize,
    completed: usize,
    failed: Vec<Retirement>,
}

impl<'r, R: ProgressReporter> Tally<'r, R> {
    fn new(reporter: &'r mut R, total: usize) -> Self {
        Tally {
            reporter,
            total,
            completed: 0,
            failed: Vec::new(),
        }
    }

    pub fn observe(&mut self, active: usize, queued: usize) {
        let snapshot = Snapshot {
            completed: self.completed,
            active,
            queued,
            total: self.total,
        };
        debug_assert_eq!(
            snapshot.completed + snapshot.active + snapshot.queued,
            snapshot.total
        );
        self.reporter.observe(&snapshot);
    }

    /// Retires a job. `active` and `queued` describe the state after the
    /// job was removed from the active set.
    pub fn retire(&mut self, job: Active, outcome: Outcome, active: usize, queued: usize) {
        self.completed += 1;
        debug!("job #{} {}", job.index, outcome);
        let retirement = Retirement {
            index: job.index,
            job: job.job,
            outcome,
            completed: self.completed,
            total: self.total,
        };
        self.reporter.retired(&retirement);
        if !retirement.outcome.is_success() {
            self.failed.push(retirement);
        }
        self.observe(active, queued);
    }

    fn into_summary(self) -> Summary {
        Summary {
            total: self.total,
            completed: self.completed,
            failed: self.failed,
        }
    }
}

/// Launches a job, turning a failure into the run-aborting spawn error.
pub(crate) fn launch<L: Launcher>(
    launcher: &L,
    index: usize,
    job: &JobDescriptor,
) -> Result<Box<dyn JobHandle>> {
    match launcher.launch(job) {
        Ok(handle) => {
            info!("launched job #{} (pid {}): {}", index, handle.id(), job);
            Ok(handle)
        }
        Err(e) => {
            error!("failed launching job #{}: {}", index, e);
            Err(Error::SpawnError {
                index,
                job: job.clone(),
                reason: e.to_string(),
            })
        }
    }
}

/// Drains job queues under a fixed concurrency bound.
pub struct Dispatcher<L: Launcher, R: ProgressReporter> {
    launcher: L,
    reporter: R,
    parallelism: usize,
    strategy: Strategy,
    poll_interval: Duration,
}

impl<L: Launcher, R: ProgressReporter> Dispatcher<L, R> {
    pub fn new(config: &DispatchConfig, launcher: L, reporter: R) -> Result<Self> {
        config.validate()?;
        Ok(Dispatcher {
            launcher,
            reporter,
            parallelism: config.parallelism,
            strategy: config.strategy,
            poll_interval: config.poll_interval(),
        })
    }

    pub fn parallelism(&self) -> usize {
        self.parallelism
    }

    pub fn reporter(&self) -> &R {
        &self.reporter
    }

    pub fn into_reporter(self) -> R {
        self.reporter
    }

    /// Runs every job in the queue to completion.
    ///
    /// Returns once the queue and the active set are both empty. Failing to
    /// launch a job aborts the run immediately, without launching anything
    /// else. Jobs already running at that point are left to finish on their
    /// own.
    pub fn run(&mut self, queue: JobQueue) -> Result<Summary> {
        let total = queue.total();
        info!(
            "dispatching {} job(s), at most {} at a time ({:?})",
            total, self.parallelism, self.strategy
        );
        let mut tally = Tally::new(&mut self.reporter, total);
        match self.strategy {
            Strategy::Poll => poll::run(
                &self.launcher,
                &mut tally,
                queue,
                self.parallelism,
                self.poll_interval,
            )?,
            Strategy::Notify => notify::run(&self.launcher, &mut tally, queue, self.parallelism)?,
        }
        let summary = tally.into_summary();
        info!(
            "all {} job(s) retired, {} failed",
            summary.completed,
            summary.failed.len()
        );
        Ok(summary)
    }
}
