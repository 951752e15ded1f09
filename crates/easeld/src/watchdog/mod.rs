//! Background maintenance thread.
//!
//! The watchdog runs periodic component safety checks, renews the backend's
//! identity-service session, and executes utility tasks queued by
//! components. At shutdown it drains the queue, runs one last safety check,
//! unloads every component, and drains the queue again so work queued by
//! those final hooks still runs before its thread exits.

use std::fmt;
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use crossbeam_channel::{Receiver, Sender};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::components::{ComponentRegistry, HookError};
use crate::identity::IdentityProvider;

const WATCHDOG_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::watchdog");

/// Default period between safety checks.
pub const DEFAULT_SAFETY_INTERVAL: Duration = Duration::from_secs(30 * 60);
/// Default period between service-session renewals.
pub const DEFAULT_RENEWAL_INTERVAL: Duration = Duration::from_secs(60);

type Action = Box<dyn FnOnce() -> Result<(), HookError> + Send>;

/// Work the watchdog thread can be asked to do.
pub enum UtilityTask {
    /// Run every component's safety check now.
    SafetyCheck,
    /// Renew the backend's identity-service session now.
    RenewSession,
    /// Run an arbitrary action.
    Action {
        /// Name used in logs.
        label: String,
        /// The work itself.
        action: Action,
    },
}

impl UtilityTask {
    /// Wraps a closure as a task.
    pub fn action(
        label: impl Into<String>,
        action: impl FnOnce() -> Result<(), HookError> + Send + 'static,
    ) -> Self {
        Self::Action {
            label: label.into(),
            action: Box::new(action),
        }
    }
}

impl fmt::Debug for UtilityTask {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SafetyCheck => formatter.write_str("SafetyCheck"),
            Self::RenewSession => formatter.write_str("RenewSession"),
            Self::Action { label, .. } => formatter
                .debug_struct("Action")
                .field("label", label)
                .finish_non_exhaustive(),
        }
    }
}

/// Timer periods for the watchdog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WatchdogSettings {
    /// Period between safety checks.
    pub safety_interval: Duration,
    /// Period between service-session renewals.
    pub renewal_interval: Duration,
}

impl Default for WatchdogSettings {
    fn default() -> Self {
        Self {
            safety_interval: DEFAULT_SAFETY_INTERVAL,
            renewal_interval: DEFAULT_RENEWAL_INTERVAL,
        }
    }
}

/// Errors raised by the watchdog.
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// The watchdog thread could not be spawned.
    #[error("failed to spawn the watchdog thread: {source}")]
    Spawn {
        /// Underlying OS error.
        #[source]
        source: io::Error,
    },
    /// The watchdog has stopped and no longer accepts tasks.
    #[error("the watchdog has stopped")]
    Stopped,
    /// The watchdog thread panicked.
    #[error("watchdog thread panicked")]
    ThreadPanic,
}

/// Cloneable producer side of the task queue.
#[derive(Debug, Clone)]
pub struct WatchdogQueue {
    tasks: Sender<UtilityTask>,
}

impl WatchdogQueue {
    /// Queues `task` for the watchdog thread.
    ///
    /// Tasks queued before the watchdog starts run once it does.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Stopped`] once the watchdog has exited.
    pub fn enqueue(&self, task: UtilityTask) -> Result<(), WatchdogError> {
        self.tasks.send(task).map_err(|_| WatchdogError::Stopped)
    }
}

/// A watchdog that has not started yet.
#[derive(Debug)]
pub struct Watchdog {
    settings: WatchdogSettings,
    tasks: Receiver<UtilityTask>,
}

impl Watchdog {
    /// Creates a watchdog and the queue that feeds it.
    #[must_use]
    pub fn new(settings: WatchdogSettings) -> (Self, WatchdogQueue) {
        let (sender, receiver) = crossbeam_channel::unbounded();
        (
            Self {
                settings,
                tasks: receiver,
            },
            WatchdogQueue { tasks: sender },
        )
    }

    /// Spawns the watchdog thread.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::Spawn`] when the thread cannot be created.
    pub fn start(
        self,
        registry: Arc<ComponentRegistry>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<WatchdogHandle, WatchdogError> {
        let (stop, stop_requested) = crossbeam_channel::bounded(1);
        let worker = Worker {
            registry,
            identity,
        };
        let settings = self.settings;
        let tasks = self.tasks;
        let thread = thread::Builder::new()
            .name("easel-watchdog".to_owned())
            .spawn(move || worker.run(settings, tasks, &stop_requested))
            .map_err(|source| WatchdogError::Spawn { source })?;
        Ok(WatchdogHandle {
            stop: Some(stop),
            thread: Some(thread),
        })
    }
}

/// Handle to the running watchdog thread.
///
/// Dropping the handle also stops the watchdog but does not wait for it.
#[derive(Debug)]
pub struct WatchdogHandle {
    stop: Option<Sender<()>>,
    thread: Option<thread::JoinHandle<()>>,
}

impl WatchdogHandle {
    /// Stops the watchdog and blocks until its final safety check and
    /// unload pass have finished.
    ///
    /// # Errors
    ///
    /// Returns [`WatchdogError::ThreadPanic`] when the thread panicked.
    pub fn stop(mut self) -> Result<(), WatchdogError> {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| WatchdogError::ThreadPanic),
            None => Ok(()),
        }
    }
}

impl Drop for WatchdogHandle {
    fn drop(&mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
    }
}

struct Worker {
    registry: Arc<ComponentRegistry>,
    identity: Arc<dyn IdentityProvider>,
}

impl Worker {
    fn run(&self, settings: WatchdogSettings, tasks: Receiver<UtilityTask>, stop: &Receiver<()>) {
        info!(
            target: WATCHDOG_TARGET,
            safety_interval_secs = settings.safety_interval.as_secs(),
            renewal_interval_secs = settings.renewal_interval.as_secs(),
            "watchdog started"
        );
        let safety = crossbeam_channel::tick(settings.safety_interval);
        let renewal = crossbeam_channel::tick(settings.renewal_interval);
        let mut queue = tasks.clone();

        loop {
            let mut queue_closed = false;
            crossbeam_channel::select! {
                recv(queue) -> task => match task {
                    Ok(task) => self.run_task(task),
                    Err(_) => queue_closed = true,
                },
                recv(safety) -> _ => self.safety_check(),
                recv(renewal) -> _ => self.renew_session(),
                recv(stop) -> _ => break,
            }
            if queue_closed {
                // Every queue handle is gone; keep serving the timers.
                queue = crossbeam_channel::never();
            }
        }

        let drained = self.drain(&tasks);
        debug!(target: WATCHDOG_TARGET, drained, "task queue drained");

        self.safety_check();
        let failures = self.registry.unload_all();
        // Hooks in the final pass may still queue follow-up work.
        let late_tasks = self.drain(&tasks);
        info!(
            target: WATCHDOG_TARGET,
            unload_failures = failures.len(),
            late_tasks,
            "watchdog stopped"
        );
    }

    /// Runs queued tasks until the queue is empty, including tasks queued
    /// by the tasks themselves.
    fn drain(&self, tasks: &Receiver<UtilityTask>) -> usize {
        let mut drained = 0_usize;
        while let Ok(task) = tasks.try_recv() {
            self.run_task(task);
            drained += 1;
        }
        drained
    }

    fn run_task(&self, task: UtilityTask) {
        match task {
            UtilityTask::SafetyCheck => self.safety_check(),
            UtilityTask::RenewSession => self.renew_session(),
            UtilityTask::Action { label, action } => {
                match panic::catch_unwind(AssertUnwindSafe(action)) {
                    Ok(Ok(())) => {
                        debug!(target: WATCHDOG_TARGET, task = %label, "task completed");
                    }
                    Ok(Err(error)) => {
                        warn!(target: WATCHDOG_TARGET, task = %label, error = %error, "task failed");
                    }
                    Err(_) => {
                        warn!(target: WATCHDOG_TARGET, task = %label, "task panicked");
                    }
                }
            }
        }
    }

    fn safety_check(&self) {
        let failures = self.registry.safety_check_all();
        debug!(
            target: WATCHDOG_TARGET,
            components = self.registry.len(),
            failures = failures.len(),
            "safety check completed"
        );
    }

    fn renew_session(&self) {
        if let Err(error) = self.identity.renew_service_session() {
            warn!(
                target: WATCHDOG_TARGET,
                error = %error,
                "service session renewal failed"
            );
        }
    }
}
