//! Launching jobs as external processes.
//!
//! The dispatcher only talks to the [`Launcher`] and [`JobHandle`] traits,
//! which lets tests substitute processes with controllable fakes.

use std::fmt;
use std::io;
use std::process::{Child, ExitStatus};

use crate::job::JobDescriptor;

/// How a retired job terminated.
///
/// Termination of any kind retires the job, the outcome is carried along so
/// failures stay visible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Process exited with the given code
    Exited(i32),
    /// Process was terminated by a signal
    Signaled(Option<i32>),
    /// Waiting on the process failed, its fate is unknown
    Lost(String),
}

impl Outcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Outcome::Exited(0))
    }
}

impl From<ExitStatus> for Outcome {
    fn from(status: ExitStatus) -> Self {
        match status.code() {
            Some(code) => Outcome::Exited(code),
            None => Outcome::Signaled(signal(&status)),
        }
    }
}

#[cfg(unix)]
fn signal(status: &ExitStatus) -> Option<i32> {
    use std::os::unix::process::ExitStatusExt;
    status.signal()
}

#[cfg(not(unix))]
fn signal(_status: &ExitStatus) -> Option<i32> {
    None
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Outcome::Exited(0) => write!(f, "succeeded"),
            Outcome::Exited(code) => write!(f, "failed with exit code {}", code),
            Outcome::Signaled(Some(sig)) => write!(f, "terminated by signal {}", sig),
            Outcome::Signaled(None) => write!(f, "terminated by signal"),
            Outcome::Lost(reason) => write!(f, "lost: {}", reason),
        }
    }
}

/// Handle to a launched job.
pub trait JobHandle: Send {
    /// Identifier of the underlying process.
    fn id(&self) -> u32;

    /// Checks for termination without blocking.
    fn try_wait(&mut self) -> io::Result<Option<Outcome>>;

    /// Blocks until the job terminates.
    fn wait(&mut self) -> io::Result<Outcome>;
}

/// Starts jobs.
pub trait Launcher {
    fn launch(&self, job: &JobDescriptor) -> io::Result<Box<dyn JobHandle>>;
}

impl<L: Launcher + ?Sized> Launcher for &L {
    fn launch(&self, job: &JobDescriptor) -> io::Result<Box<dyn JobHandle>> {
        (**self).launch(job)
    }
}

/// Launches every job as an OS process.
#[derive(Debug, Default, Copy, Clone)]
pub struct ProcessLauncher;

impl Launcher for ProcessLauncher {
    fn launch(&self, job: &JobDescriptor) -> io::Result<Box<dyn JobHandle>> {
        let child = job.to_command().spawn()?;
        Ok(Box::new(ProcessHandle { child }))
    }
}

pub struct ProcessHandle {
    child: Child,
}

impl JobHandle for ProcessHandle {
    fn id(&self) -> u32 {
        self.child.id()
    }

    fn try_wait(&mut self) -> io::Result<Option<Outcome>> {
        Ok(self.child.try_wait()?.map(Outcome::from))
    }

    fn wait(&mut self) -> io::Result<Outcome> {
        Ok(self.child.wait()?.into())
    }
}
