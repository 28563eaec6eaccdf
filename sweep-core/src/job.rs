//! Job descriptors and the pending job queue.

use std::collections::VecDeque;
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// One invocation of an external program.
///
/// The argument order is significant, the external program parses
/// positional and flag syntax from it. Descriptors are never mutated after
/// construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    executable: PathBuf,
    arguments: Vec<String>,
}

impl JobDescriptor {
    pub fn new<P: Into<PathBuf>>(executable: P, arguments: Vec<String>) -> Self {
        JobDescriptor {
            executable: executable.into(),
            arguments,
        }
    }

    pub fn executable(&self) -> &Path {
        &self.executable
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    /// Builds the command that launches this job.
    ///
    /// Standard input is closed, output streams are inherited from the
    /// dispatching process.
    pub fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(&self.arguments)
            .stdin(Stdio::null())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        cmd
    }
}

impl fmt::Display for JobDescriptor {
    /// Renders the job as a shell-quoted command line.
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let exe = self.executable.to_string_lossy();
        write!(f, "{}", shlex::quote(&exe))?;
        for arg in &self.arguments {
            write!(f, " {}", shlex::quote(arg))?;
        }
        Ok(())
    }
}

/// Ordered sequence of pending jobs, consumed front to back.
///
/// A job leaves the queue exactly once, at the moment it's launched, and
/// never re-enters it.
#[derive(Debug, Clone, Default)]
pub struct JobQueue {
    pending: VecDeque<JobDescriptor>,
    /// Number of jobs the queue was built with
    total: usize,
}

impl JobQueue {
    pub fn new(jobs: Vec<JobDescriptor>) -> Self {
        JobQueue {
            total: jobs.len(),
            pending: jobs.into(),
        }
    }

    /// Removes the next job, returning it together with its position in
    /// the original sequence.
    pub fn pop_front(&mut self) -> Option<(usize, JobDescriptor)> {
        let index = self.total - self.pending.len();
        self.pending.pop_front().map(|job| (index, job))
    }

    pub fn front(&self) -> Option<&JobDescriptor> {
        self.pending.front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Total number of jobs, launched or not.
    pub fn total(&self) -> usize {
        self.total
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobDescriptor> {
        self.pending.iter()
    }
}

impl From<Vec<JobDescriptor>> for JobQueue {
    fn from(jobs: Vec<JobDescriptor>) -> Self {
        JobQueue::new(jobs)
    }
}
