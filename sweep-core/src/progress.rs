//! Progress reporting.

use std::io::{self, Stdout, Write};

use crate::dispatch::{Retirement, Snapshot};

/// Receives notifications from the dispatcher.
///
/// `retired` is called synchronously exactly once per retired job, in
/// retirement order. `observe` is called at every observation point, that
/// is after each launch and each retirement.
pub trait ProgressReporter {
    fn retired(&mut self, retirement: &Retirement);

    fn observe(&mut self, _snapshot: &Snapshot) {}
}

impl<R: ProgressReporter + ?Sized> ProgressReporter for &mut R {
    fn retired(&mut self, retirement: &Retirement) {
        (**self).retired(retirement)
    }

    fn observe(&mut self, snapshot: &Snapshot) {
        (**self).observe(snapshot)
    }
}

/// Formats the line emitted for each retirement.
pub fn progress_line(completed: usize, total: usize) -> String {
    format!("{}/{} processes complete.", completed, total)
}

/// Writes one progress line per retirement to the given output, stdout by
/// default.
///
/// Failed jobs are additionally reported through the log, together with
/// their command line and exit status.
pub struct ConsoleReporter<W: Write = Stdout> {
    out: W,
}

impl ConsoleReporter<Stdout> {
    pub fn stdout() -> Self {
        ConsoleReporter { out: io::stdout() }
    }
}

impl Default for ConsoleReporter<Stdout> {
    fn default() -> Self {
        ConsoleReporter::stdout()
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W) -> Self {
        ConsoleReporter { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> ProgressReporter for ConsoleReporter<W> {
    fn retired(&mut self, retirement: &Retirement) {
        if !retirement.outcome.is_success() {
            warn!(
                "job #{} {} ({})",
                retirement.index, retirement.outcome, retirement.job
            );
        }
        let line = progress_line(retirement.completed, retirement.total);
        if let Err(e) = writeln!(self.out, "{}", line).and_then(|_| self.out.flush()) {
            error!("failed writing progress: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::Outcome;
    use crate::job::JobDescriptor;

    fn retirement(completed: usize, outcome: Outcome) -> Retirement {
        Retirement {
            index: completed - 1,
            job: JobDescriptor::new("sim", vec![]),
            outcome,
            completed,
            total: 3,
        }
    }

    #[test]
    fn one_line_per_retirement() {
        let mut reporter = ConsoleReporter::new(Vec::new());
        reporter.retired(&retirement(1, Outcome::Exited(0)));
        reporter.retired(&retirement(2, Outcome::Exited(3)));
        reporter.retired(&retirement(3, Outcome::Signaled(Some(9))));
        let out = String::from_utf8(reporter.into_inner()).unwrap();
        assert_eq!(
            out,
            "1/3 processes complete.\n2/3 processes complete.\n3/3 processes complete.\n"
        );
    }

    #[test]
    fn line_format() {
        assert_eq!(progress_line(5, 5), "5/5 processes complete.");
    }
}
