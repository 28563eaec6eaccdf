//! Completion-driven dispatch loop.
//!
//! Each launched job is handed over to its own waiter thread. The waiter
//! blocks until the job terminates and sends the outcome back to the
//! coordinating loop, which never blocks on any single job.

use std::collections::HashMap;
use std::io;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};

use super::{launch, Active, JobHandle, Launcher, Outcome, Tally};
use crate::error::{Error, Result};
use crate::job::{JobDescriptor, JobQueue};
use crate::progress::ProgressReporter;

/// Termination message sent by waiter threads.
type Done = (usize, Outcome);

/// Reports the job as lost if the waiter goes away without reporting.
struct Waiter {
    index: usize,
    tx: Sender<Done>,
    sent: bool,
}

impl Waiter {
    fn send(mut self, outcome: Outcome) {
        self.sent = true;
        let _ = self.tx.send((self.index, outcome));
    }
}

impl Drop for Waiter {
    fn drop(&mut self) {
        if !self.sent {
            let _ = self
                .tx
                .send((self.index, Outcome::Lost("waiter thread died".to_string())));
        }
    }
}

fn spawn_waiter(index: usize, mut handle: Box<dyn JobHandle>, tx: Sender<Done>) -> io::Result<()> {
    let waiter = Waiter {
        index,
        tx,
        sent: false,
    };
    thread::Builder::new()
        .name(format!("job-{}", index))
        .spawn(move || {
            let outcome = match handle.wait() {
                Ok(outcome) => outcome,
                Err(e) => Outcome::Lost(e.to_string()),
            };
            waiter.send(outcome);
        })?;
    Ok(())
}

/// The job is already running when its waiter can't be started, so the
/// error names it the same way a failed launch does.
fn waiter_failed(index: usize, job: &JobDescriptor, e: io::Error) -> Error {
    error!("failed starting waiter for job #{}: {}", index, e);
    Error::SpawnError {
        index,
        job: job.clone(),
        reason: format!("failed starting waiter thread: {}", e),
    }
}

/// Blocks until some waiter reports. Errors once every sender is gone.
fn next_done(rx: &Receiver<Done>, active: usize) -> Result<Done> {
    rx.recv().map_err(|_| Error::ChannelDisconnected(active))
}

pub(crate) fn run<L: Launcher, R: ProgressReporter>(
    launcher: &L,
    tally: &mut Tally<R>,
    mut queue: JobQueue,
    parallelism: usize,
) -> Result<()> {
    let (tx, rx) = unbounded::<Done>();
    // dropped once the queue is drained, from then on only waiters hold senders
    let mut tx = Some(tx);
    let mut active: HashMap<usize, Active> = HashMap::with_capacity(parallelism);

    while !queue.is_empty() || !active.is_empty() {
        while active.len() < parallelism {
            let sender = match &tx {
                Some(tx) => tx.clone(),
                None => break,
            };
            let (index, job) = match queue.pop_front() {
                Some(next) => next,
                None => break,
            };
            let handle = launch(launcher, index, &job)?;
            spawn_waiter(index, handle, sender).map_err(|e| waiter_failed(index, &job, e))?;
            active.insert(index, Active { index, job });
            tally.observe(active.len(), queue.len());
        }
        if queue.is_empty() {
            tx = None;
        }

        if active.is_empty() {
            continue;
        }

        let (index, outcome) = next_done(&rx, active.len())?;
        match active.remove(&index) {
            Some(job) => tally.retire(job, outcome, active.len(), queue.len()),
            None => warn!("termination reported for unknown job #{}", index),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dropped_waiter_reports_job_as_lost() {
        let (tx, rx) = unbounded::<Done>();
        drop(Waiter {
            index: 3,
            tx,
            sent: false,
        });
        match next_done(&rx, 1).unwrap() {
            (3, Outcome::Lost(_)) => (),
            other => panic!("unexpected message {:?}", other),
        }
    }

    #[test]
    fn sent_waiter_reports_once() {
        let (tx, rx) = unbounded::<Done>();
        let waiter = Waiter {
            index: 1,
            tx,
            sent: false,
        };
        waiter.send(Outcome::Exited(0));
        assert_eq!(next_done(&rx, 1).unwrap(), (1, Outcome::Exited(0)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn receiving_without_senders_is_an_error() {
        let (tx, rx) = unbounded::<Done>();
        drop(tx);
        assert!(matches!(
            next_done(&rx, 2),
            Err(Error::ChannelDisconnected(2))
        ));
    }

    #[test]
    fn waiter_failure_names_the_job() {
        let job = JobDescriptor::new("/opt/sim/ecoevo_landscapes", vec!["--null".to_string()]);
        let err = waiter_failed(4, &job, io::Error::new(io::ErrorKind::Other, "no threads"));
        match &err {
            Error::SpawnError { index, job: j, reason } => {
                assert_eq!(*index, 4);
                assert_eq!(j, &job);
                assert!(reason.contains("no threads"));
            }
            other => panic!("unexpected error {:?}", other),
        }
        assert!(err.to_string().contains("ecoevo_landscapes --null"));
    }
}
