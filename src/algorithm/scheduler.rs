//! Bounded worker pool fan-out/fan-in over work units
//!
//! Every unit becomes one task on a dedicated rayon pool of `workers` threads.
//! Workers share no mutable state; each sends its [`WorkResult`] back over a
//! channel and the calling thread collects them all before returning. Results
//! are stored by submission index, so the returned order never depends on
//! completion order.

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError};
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use rayon::{ThreadPool, ThreadPoolBuilder};

use crate::algorithm::accumulator::UnitAccumulator;
use crate::algorithm::unit::{UnitFailure, UnitSource, WorkResult};
use crate::io::configuration::WORKER_THREAD_PREFIX;
use crate::io::error::{AggregationError, FailureCategory, Result, invalid_configuration};

enum WorkerMessage {
    Started {
        index: usize,
        at: Instant,
    },
    Finished {
        index: usize,
        result: WorkResult,
        elapsed: Duration,
    },
}

/// Calls [`UnitSource::release`] when the unit leaves the worker, whatever the exit path
struct ReleaseGuard {
    identifier: String,
    source: Box<dyn UnitSource>,
}

impl Drop for ReleaseGuard {
    fn drop(&mut self) {
        if let Err(error) = self.source.release() {
            warn!("Releasing unit {} failed: {error}", self.identifier);
        }
    }
}

/// Fans units out across a bounded pool and collects one result per unit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkScheduler {
    workers: usize,
    unit_timeout: Option<Duration>,
}

impl WorkScheduler {
    /// Create a scheduler with `workers` threads and an optional per-unit budget
    ///
    /// # Errors
    ///
    /// Returns a configuration error if `workers` is zero or the budget is zero
    pub fn new(workers: usize, unit_timeout: Option<Duration>) -> Result<Self> {
        if workers == 0 {
            return Err(invalid_configuration(
                "workers",
                &workers,
                &"at least one worker is required",
            ));
        }
        if unit_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(invalid_configuration(
                "unit_timeout",
                &"0s",
                &"a time budget must be positive; omit it to disable",
            ));
        }
        Ok(Self {
            workers,
            unit_timeout,
        })
    }

    /// Maximum number of concurrently processed units
    pub const fn workers(&self) -> usize {
        self.workers
    }

    /// Per-unit time budget, if any
    pub const fn unit_timeout(&self) -> Option<Duration> {
        self.unit_timeout
    }

    /// Process every unit and return their results in submission order
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the worker pool cannot be built.
    /// Per-unit problems never surface here; they become
    /// [`WorkResult::Failure`] entries.
    pub fn run(
        &self,
        units: Vec<Box<dyn UnitSource>>,
        accumulator: UnitAccumulator,
    ) -> Result<Vec<WorkResult>> {
        self.run_with_observer(units, accumulator, |_, _| {})
    }

    /// Like [`WorkScheduler::run`], calling `observer` on the collecting
    /// thread as each unit is resolved
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the worker pool cannot be built
    pub fn run_with_observer<F>(
        &self,
        units: Vec<Box<dyn UnitSource>>,
        accumulator: UnitAccumulator,
        mut observer: F,
    ) -> Result<Vec<WorkResult>>
    where
        F: FnMut(usize, &WorkResult),
    {
        let pool = self.build_pool()?;
        let total = units.len();
        info!(
            "Dispatching {total} units across {} workers",
            pool.current_num_threads()
        );

        let identifiers: Vec<String> = units.iter().map(|unit| unit.identifier()).collect();
        let (sender, receiver) = mpsc::channel();
        let mut cancel_flags = Vec::with_capacity(total);

        for (index, source) in units.into_iter().enumerate() {
            let sender = sender.clone();
            let cancel = Arc::new(AtomicBool::new(false));
            cancel_flags.push(Arc::clone(&cancel));
            let guard = ReleaseGuard {
                identifier: identifiers.get(index).cloned().unwrap_or_default(),
                source,
            };

            pool.spawn(move || {
                if cancel.load(Ordering::Relaxed) {
                    return;
                }
                let at = Instant::now();
                if sender.send(WorkerMessage::Started { index, at }).is_err() {
                    return;
                }
                let result = process_unit(&guard, &accumulator, &cancel);
                drop(guard);
                let _ = sender.send(WorkerMessage::Finished {
                    index,
                    result,
                    elapsed: at.elapsed(),
                });
            });
        }
        drop(sender);

        let collector = Collector {
            workers: self.workers,
            unit_timeout: self.unit_timeout,
            results: (0..total).map(|_| None).collect(),
            identifiers,
            cancel_flags,
            running: HashMap::new(),
            timed_out: HashSet::new(),
            resolved: 0,
        };
        Ok(collector.collect(&receiver, &mut observer))
    }

    fn build_pool(&self) -> Result<ThreadPool> {
        ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .thread_name(|i| format!("{WORKER_THREAD_PREFIX}-{i}"))
            .build()
            .map_err(|e| invalid_configuration("workers", &self.workers, &e))
    }
}

/// Fan-in state owned by the calling thread
struct Collector {
    workers: usize,
    unit_timeout: Option<Duration>,
    results: Vec<Option<WorkResult>>,
    identifiers: Vec<String>,
    cancel_flags: Vec<Arc<AtomicBool>>,
    /// Units that reported a start and have not been resolved
    running: HashMap<usize, Instant>,
    /// Units resolved as timed out whose worker is still busy
    timed_out: HashSet<usize>,
    resolved: usize,
}

impl Collector {
    fn collect<F>(mut self, receiver: &Receiver<WorkerMessage>, observer: &mut F) -> Vec<WorkResult>
    where
        F: FnMut(usize, &WorkResult),
    {
        while self.resolved < self.results.len() {
            // A busy channel must not postpone expiry
            if self
                .next_deadline()
                .is_some_and(|deadline| deadline <= Instant::now())
            {
                self.expire_stalled(observer);
                continue;
            }

            let message = match self.next_deadline() {
                Some(deadline) => {
                    match receiver.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                        Ok(message) => Some(message),
                        Err(RecvTimeoutError::Timeout) => None,
                        Err(RecvTimeoutError::Disconnected) => break,
                    }
                }
                None => match receiver.recv() {
                    Ok(message) => Some(message),
                    Err(_) => break,
                },
            };

            match message {
                Some(WorkerMessage::Started { index, at }) => {
                    if self.is_pending(index) {
                        self.running.insert(index, at);
                    }
                }
                Some(WorkerMessage::Finished {
                    index,
                    result,
                    elapsed,
                }) => {
                    self.running.remove(&index);
                    if self.timed_out.remove(&index) || !self.is_pending(index) {
                        debug!(
                            "Discarding late result of {} after {elapsed:?}",
                            result.unit()
                        );
                        continue;
                    }
                    if let Some(limit) = self.unit_timeout
                        && elapsed > limit
                    {
                        debug!(
                            "Unit {} finished after its budget, in {elapsed:?}",
                            result.unit()
                        );
                        let failure = self.timeout_failure(index, limit);
                        self.resolve(index, failure, observer);
                        continue;
                    }
                    debug!("Unit {} finished in {elapsed:?}", result.unit());
                    self.resolve(index, result, observer);
                }
                None => self.expire_stalled(observer),
            }
        }

        // Every sender is gone, so nothing else can arrive for these units
        let unreported: Vec<usize> = (0..self.results.len())
            .filter(|&index| self.is_pending(index))
            .collect();
        for index in unreported {
            let failure = UnitFailure::new(
                self.identifier(index),
                FailureCategory::Internal,
                "worker exited without reporting a result",
            );
            self.resolve(index, WorkResult::Failure(failure), observer);
        }

        self.results.into_iter().flatten().collect()
    }

    fn is_pending(&self, index: usize) -> bool {
        self.results.get(index).is_some_and(Option::is_none)
    }

    fn identifier(&self, index: usize) -> String {
        self.identifiers.get(index).cloned().unwrap_or_default()
    }

    fn timeout_failure(&self, index: usize, limit: Duration) -> WorkResult {
        let error = AggregationError::Timeout {
            unit: self.identifier(index),
            limit_ms: limit.as_millis(),
        };
        WorkResult::Failure(UnitFailure::from_error(self.identifier(index), &error))
    }

    fn next_deadline(&self) -> Option<Instant> {
        let timeout = self.unit_timeout?;
        self.running.values().map(|&at| at + timeout).min()
    }

    fn cancel(&self, index: usize) {
        if let Some(flag) = self.cancel_flags.get(index) {
            flag.store(true, Ordering::Relaxed);
        }
    }

    fn resolve<F>(&mut self, index: usize, result: WorkResult, observer: &mut F)
    where
        F: FnMut(usize, &WorkResult),
    {
        let Some(slot) = self.results.get_mut(index) else {
            return;
        };
        if slot.is_some() {
            return;
        }
        if let WorkResult::Failure(failure) = &result {
            warn!("Unit failed: {failure}");
        }
        observer(index, &result);
        *slot = Some(result);
        self.resolved += 1;
    }

    /// Fail units past their budget, and queued units once every worker is stalled
    fn expire_stalled<F>(&mut self, observer: &mut F)
    where
        F: FnMut(usize, &WorkResult),
    {
        let Some(timeout) = self.unit_timeout else {
            return;
        };
        let now = Instant::now();

        let mut expired: Vec<usize> = self
            .running
            .iter()
            .filter(|&(_, &at)| now.duration_since(at) >= timeout)
            .map(|(&index, _)| index)
            .collect();
        expired.sort_unstable();

        for index in expired {
            self.running.remove(&index);
            self.cancel(index);
            self.timed_out.insert(index);
            let failure = self.timeout_failure(index, timeout);
            self.resolve(index, failure, observer);
        }

        if self.timed_out.len() < self.workers {
            return;
        }

        let queued: Vec<usize> = (0..self.results.len())
            .filter(|&index| self.is_pending(index) && !self.running.contains_key(&index))
            .collect();
        for index in queued {
            self.cancel(index);
            let failure = UnitFailure::new(
                self.identifier(index),
                FailureCategory::Timeout,
                "not started: every worker is occupied by a stalled unit",
            );
            self.resolve(index, WorkResult::Failure(failure), observer);
        }
    }
}

fn process_unit(
    guard: &ReleaseGuard,
    accumulator: &UnitAccumulator,
    cancel: &AtomicBool,
) -> WorkResult {
    let unit = guard.identifier.clone();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
        let raster = guard.source.load()?;
        accumulator.accumulate_until(&raster, cancel)
    }));

    match outcome {
        Ok(Ok(partial)) => WorkResult::Success { unit, partial },
        Ok(Err(error)) => WorkResult::Failure(UnitFailure::from_error(unit, &error)),
        Err(payload) => {
            let reason = format!("worker panicked: {}", panic_message(payload.as_ref()));
            WorkResult::Failure(UnitFailure::new(unit, FailureCategory::Internal, reason))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic payload".to_string())
}
