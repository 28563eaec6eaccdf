//! Polling dispatch loop.

use std::thread;
use std::time::Duration;

use super::{launch, Active, Launcher, Outcome, Tally};
use crate::error::Result;
use crate::job::JobQueue;
use crate::progress::ProgressReporter;

/// Active job with its handle.
struct Slot {
    job: Active,
    handle: Box<dyn super::JobHandle>,
}

pub(crate) fn run<L: Launcher, R: ProgressReporter>(
    launcher: &L,
    tally: &mut Tally<R>,
    mut queue: JobQueue,
    parallelism: usize,
    interval: Duration,
) -> Result<()> {
    let mut active: Vec<Slot> = Vec::with_capacity(parallelism);

    while !queue.is_empty() || !active.is_empty() {
        let mut progressed = false;

        // fill free slots
        while active.len() < parallelism {
            let (index, job) = match queue.pop_front() {
                Some(next) => next,
                None => break,
            };
            let handle = launch(launcher, index, &job)?;
            active.push(Slot {
                job: Active { index, job },
                handle,
            });
            progressed = true;
            tally.observe(active.len(), queue.len());
        }

        // retire the first terminated job found, if any
        let mut terminated = None;
        for (n, slot) in active.iter_mut().enumerate() {
            match slot.handle.try_wait() {
                Ok(Some(outcome)) => {
                    terminated = Some((n, outcome));
                    break;
                }
                Ok(None) => (),
                Err(e) => {
                    warn!("failed checking job #{}: {}", slot.job.index, e);
                    terminated = Some((n, Outcome::Lost(e.to_string())));
                    break;
                }
            }
        }
        if let Some((n, outcome)) = terminated {
            let slot = active.remove(n);
            tally.retire(slot.job, outcome, active.len(), queue.len());
            progressed = true;
        }

        if !progressed {
            thread::sleep(interval);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};
    use std::time::Instant;

    use super::super::testing::{config, fake_job, FakeLauncher, Recorder};
    use super::super::{Dispatcher, JobHandle, Retirement};
    use crate::config::Strategy;
    use crate::job::{JobDescriptor, JobQueue};
    use crate::progress::ProgressReporter;
    use crate::Outcome;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Checked(usize),
        Retired(usize),
    }

    type Log = Arc<Mutex<Vec<Event>>>;

    /// Job that terminates on its n-th `try_wait`.
    struct CountingHandle {
        index: usize,
        checks_left: usize,
        log: Log,
    }

    impl JobHandle for CountingHandle {
        fn id(&self) -> u32 {
            self.index as u32
        }

        fn try_wait(&mut self) -> io::Result<Option<Outcome>> {
            self.log.lock().unwrap().push(Event::Checked(self.index));
            self.checks_left = self.checks_left.saturating_sub(1);
            if self.checks_left == 0 {
                Ok(Some(Outcome::Exited(0)))
            } else {
                Ok(None)
            }
        }

        fn wait(&mut self) -> io::Result<Outcome> {
            Ok(Outcome::Exited(0))
        }
    }

    /// Hands out counting handles, the first argument being the number of
    /// checks until termination.
    struct CountingLauncher {
        launched: Mutex<usize>,
        log: Log,
    }

    impl super::Launcher for CountingLauncher {
        fn launch(&self, job: &JobDescriptor) -> io::Result<Box<dyn JobHandle>> {
            let mut launched = self.launched.lock().unwrap();
            let index = *launched;
            *launched += 1;
            let checks = job.arguments()[0].parse().unwrap();
            Ok(Box::new(CountingHandle {
                index,
                checks_left: checks,
                log: self.log.clone(),
            }))
        }
    }

    struct LogReporter(Log);

    impl ProgressReporter for LogReporter {
        fn retired(&mut self, retirement: &Retirement) {
            self.0.lock().unwrap().push(Event::Retired(retirement.index));
        }
    }

    fn checks_job(checks: usize) -> JobDescriptor {
        JobDescriptor::new("counting", vec![checks.to_string()])
    }

    #[test]
    fn one_retirement_per_cycle_in_scan_order() {
        use Event::*;
        let log = Log::default();
        let launcher = CountingLauncher {
            launched: Mutex::new(0),
            log: log.clone(),
        };
        // job 0 needs four checks, jobs 1 and 2 are done by their first one
        let jobs = vec![checks_job(4), checks_job(1), checks_job(1)];
        let mut dispatcher = Dispatcher::new(
            &config(3, Strategy::Poll),
            &launcher,
            LogReporter(log.clone()),
        )
        .unwrap();
        let summary = dispatcher.run(JobQueue::new(jobs)).unwrap();
        assert_eq!(summary.completed, 3);

        let events = log.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                Checked(0),
                Checked(1),
                Retired(1),
                Checked(0),
                Checked(2),
                Retired(2),
                Checked(0),
                Checked(0),
                Retired(0),
            ]
        );
    }

    #[test]
    fn busy_cycles_do_not_sleep() {
        let launcher = FakeLauncher::default();
        let jobs: Vec<_> = (0..6).map(|_| fake_job(0, 0)).collect();
        let mut dispatch_config = config(2, Strategy::Poll);
        dispatch_config.poll_interval = 500;
        let mut dispatcher =
            Dispatcher::new(&dispatch_config, &launcher, Recorder::default()).unwrap();

        let start = Instant::now();
        let summary = dispatcher.run(JobQueue::new(jobs)).unwrap();
        assert_eq!(summary.completed, 6);
        assert!(
            start.elapsed().as_millis() < 500,
            "took {:?}",
            start.elapsed()
        );
    }

    #[test]
    fn idle_cycles_sleep_for_the_interval() {
        let launcher = FakeLauncher::default();
        let mut dispatch_config = config(1, Strategy::Poll);
        dispatch_config.poll_interval = 100;
        let mut dispatcher =
            Dispatcher::new(&dispatch_config, &launcher, Recorder::default()).unwrap();

        let start = Instant::now();
        dispatcher
            .run(JobQueue::new(vec![fake_job(20, 0)]))
            .unwrap();
        assert!(start.elapsed().as_millis() >= 100, "took {:?}", start.elapsed());
    }
}
