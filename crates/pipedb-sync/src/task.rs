//! Managed background tasks
//!
//! A [`ManagedTask`] runs a [`Worker`] on its own OS thread. The worker
//! body is expected to poll [`TaskSignal::started`] (or sleep through
//! [`TaskSignal::pause`]) and return once the task has been stopped.
//!
//! `N` bounds how many times the task may ever be started. Start and stop
//! are serialized on the task's handle gate, so racing callers see at most
//! one worker thread alive at a time.

use crate::gate::Gate;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Body of a background task
pub trait Worker: Send + Sync + 'static {
    /// Name given to the worker thread
    fn name(&self) -> &str {
        "pipedb-task"
    }

    /// Loop until `signal.started()` turns false.
    fn run(&self, signal: &TaskSignal);
}

#[derive(Debug, Default)]
struct TaskFlags {
    started: AtomicBool,
    stopping: AtomicBool,
}

/// View of the owning task's state handed to the worker
#[derive(Debug, Clone)]
pub struct TaskSignal {
    flags: Arc<TaskFlags>,
}

impl TaskSignal {
    /// True until the task is asked to stop
    pub fn started(&self) -> bool {
        self.flags.started.load(Ordering::SeqCst)
    }

    /// Sleep for `duration` or until the task is stopped.
    ///
    /// Returns whether the task is still started.
    pub fn pause(&self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        while self.started() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            thread::park_timeout(deadline - now);
        }
        self.started()
    }
}

/// Background worker thread with a bounded number of starts
pub struct ManagedTask<W: Worker, const N: usize = 1> {
    worker: Arc<W>,
    flags: Arc<TaskFlags>,
    runs: AtomicUsize,
    handle: Gate<Option<JoinHandle<()>>>,
}

impl<W: Worker, const N: usize> ManagedTask<W, N> {
    pub fn new(worker: W) -> Self {
        Self {
            worker: Arc::new(worker),
            flags: Arc::new(TaskFlags::default()),
            runs: AtomicUsize::new(0),
            handle: Gate::new(None),
        }
    }

    /// Spawn the worker thread.
    ///
    /// Returns false without spawning if the task is running, is being
    /// stopped, or has already been started `N` times.
    pub fn start(&self) -> bool {
        // worker code never runs under the handle gate
        let name = self.worker.name().to_string();
        let mut handle = self.handle.acquire_write();
        if handle.is_some()
            || self.flags.stopping.load(Ordering::SeqCst)
            || self.runs.load(Ordering::SeqCst) >= N
        {
            return false;
        }
        if self.flags.started.swap(true, Ordering::SeqCst) {
            return false;
        }
        if self
            .runs
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |r| {
                (r < N).then_some(r + 1)
            })
            .is_err()
        {
            self.flags.started.store(false, Ordering::SeqCst);
            return false;
        }

        let worker = Arc::clone(&self.worker);
        let signal = TaskSignal {
            flags: Arc::clone(&self.flags),
        };
        let spawned = thread::Builder::new()
            .name(name.clone())
            .spawn(move || worker.run(&signal));

        match spawned {
            Ok(h) => {
                info!(task = %name, "task started");
                *handle = Some(h);
                true
            }
            Err(e) => {
                error!(task = %name, "failed to spawn task thread: {}", e);
                self.flags.started.store(false, Ordering::SeqCst);
                self.runs.fetch_sub(1, Ordering::SeqCst);
                false
            }
        }
    }

    /// Ask the worker to return and wait for its thread to exit.
    ///
    /// No-op if the task is not started or another stop is in progress.
    /// Called from the worker thread itself, the thread is detached instead
    /// of joined.
    pub fn stop(&self) {
        if !self.flags.started.load(Ordering::SeqCst)
            || self.flags.stopping.swap(true, Ordering::SeqCst)
        {
            return;
        }
        self.flags.started.store(false, Ordering::SeqCst);

        let taken = self.handle.acquire_write().take();
        if let Some(h) = taken {
            h.thread().unpark();
            if h.thread().id() == thread::current().id() {
                debug!(task = self.worker.name(), "task stopped from its own thread");
            } else if h.join().is_err() {
                error!(task = self.worker.name(), "task worker panicked");
            }
        }

        info!(task = self.worker.name(), "task stopped");
        self.flags.stopping.store(false, Ordering::SeqCst);
    }

    pub fn started(&self) -> bool {
        self.flags.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> bool {
        !self.started()
    }

    /// Number of successful starts so far
    pub fn runs(&self) -> usize {
        self.runs.load(Ordering::SeqCst)
    }

    pub fn worker(&self) -> &W {
        &self.worker
    }
}

impl<W: Worker, const N: usize> Drop for ManagedTask<W, N> {
    fn drop(&mut self) {
        self.stop();
    }
}

impl<W: Worker, const N: usize> fmt::Debug for ManagedTask<W, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManagedTask")
            .field("name", &self.worker.name())
            .field("started", &self.started())
            .field("runs", &self.runs())
            .field("max_runs", &N)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicU64;
    use std::sync::{OnceLock, Weak};

    #[derive(Default)]
    struct Counter {
        entered: AtomicU64,
        exited: AtomicU64,
    }

    impl Worker for Counter {
        fn name(&self) -> &str {
            "counter"
        }

        fn run(&self, signal: &TaskSignal) {
            self.entered.fetch_add(1, Ordering::SeqCst);
            while signal.pause(Duration::from_millis(5)) {}
            self.exited.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_start_stop() {
        let task: ManagedTask<Counter> = ManagedTask::new(Counter::default());
        assert!(task.stopped());
        assert!(task.start());
        assert!(task.started());
        assert!(!task.start());

        task.stop();
        assert!(task.stopped());
        assert_eq!(task.worker().entered.load(Ordering::SeqCst), 1);
        assert_eq!(task.worker().exited.load(Ordering::SeqCst), 1);

        // a single-run task cannot be restarted
        assert!(!task.start());
        assert_eq!(task.runs(), 1);
    }

    #[test]
    fn test_run_bound() {
        let task: ManagedTask<Counter, 2> = ManagedTask::new(Counter::default());
        for _ in 0..2 {
            assert!(task.start());
            task.stop();
        }
        assert!(!task.start());
        assert_eq!(task.runs(), 2);
        assert_eq!(task.worker().exited.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_concurrent_starts_spawn_one_worker() {
        let task: ManagedTask<Counter> = ManagedTask::new(Counter::default());
        let wins = AtomicUsize::new(0);
        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    if task.start() {
                        wins.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });
        assert_eq!(wins.load(Ordering::SeqCst), 1);
        task.stop();
        assert_eq!(task.worker().entered.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let task: ManagedTask<Counter> = ManagedTask::new(Counter::default());
        task.stop();
        assert!(task.start());
        thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| task.stop());
            }
        });
        task.stop();
        assert!(task.stopped());
        assert_eq!(task.worker().exited.load(Ordering::SeqCst), 1);
    }

    struct Panicker;

    impl Worker for Panicker {
        fn run(&self, _signal: &TaskSignal) {
            panic!("worker failure");
        }
    }

    #[test]
    fn test_panicking_worker_is_contained() {
        let task: ManagedTask<Panicker> = ManagedTask::new(Panicker);
        assert!(task.start());
        task.stop();
        assert!(task.stopped());
    }

    struct Sleeper;

    impl Worker for Sleeper {
        fn run(&self, signal: &TaskSignal) {
            signal.pause(Duration::from_secs(60));
        }
    }

    #[test]
    fn test_stop_interrupts_pause() {
        let task: ManagedTask<Sleeper> = ManagedTask::new(Sleeper);
        assert!(task.start());
        thread::sleep(Duration::from_millis(20));
        let begin = Instant::now();
        task.stop();
        assert!(begin.elapsed() < Duration::from_secs(10));
    }

    #[test]
    fn test_drop_joins_worker() {
        let counter = {
            let task: ManagedTask<Counter> = ManagedTask::new(Counter::default());
            assert!(task.start());
            Arc::clone(&task.worker)
        };
        assert_eq!(counter.exited.load(Ordering::SeqCst), 1);
    }

    #[derive(Default)]
    struct SelfStopper {
        task: OnceLock<Weak<ManagedTask<SelfStopper>>>,
        done: AtomicBool,
    }

    impl Worker for SelfStopper {
        fn run(&self, _signal: &TaskSignal) {
            if let Some(task) = self.task.get().and_then(Weak::upgrade) {
                task.stop();
            }
            self.done.store(true, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_stop_from_worker_thread_detaches() {
        let task = Arc::new(ManagedTask::<SelfStopper>::new(SelfStopper::default()));
        assert!(task.worker().task.set(Arc::downgrade(&task)).is_ok());
        assert!(task.start());

        let deadline = Instant::now() + Duration::from_secs(5);
        while !task.worker().done.load(Ordering::SeqCst) && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(5));
        }
        assert!(task.worker().done.load(Ordering::SeqCst));
        assert!(task.stopped());

        task.stop();
        assert!(task.stopped());
        assert!(!task.start());
        drop(task);
    }

    /// Names itself after inspecting the owning task's handle gate
    #[derive(Default)]
    struct GateInspector {
        task: OnceLock<Weak<ManagedTask<GateInspector>>>,
        inspections: AtomicU64,
    }

    impl Worker for GateInspector {
        fn name(&self) -> &str {
            if let Some(task) = self.task.get().and_then(Weak::upgrade) {
                let _running = task.handle.acquire_read().is_some();
                self.inspections.fetch_add(1, Ordering::SeqCst);
            }
            "gate-inspector"
        }

        fn run(&self, signal: &TaskSignal) {
            while signal.pause(Duration::from_millis(5)) {}
        }
    }

    #[test]
    fn test_worker_name_called_outside_the_gate() {
        let task = Arc::new(ManagedTask::<GateInspector>::new(GateInspector::default()));
        assert!(task.worker().task.set(Arc::downgrade(&task)).is_ok());

        // would deadlock if the name were read while the gate is held
        assert!(task.start());
        task.stop();
        assert!(task.worker().inspections.load(Ordering::SeqCst) >= 1);
        assert!(task.stopped());
    }
}
