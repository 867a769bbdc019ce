//! Bounded polling after a mutation.
//!
//! [`PollingController`] invokes a tick closure every `interval`, stops by
//! itself after `max_ticks` invocations, and can be stopped early at any
//! time. A failing tick is reported and polling carries on.

use log::{debug, warn};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::constants::LOG_POLL_TICK_FAILED;

type ErrorHook = Box<dyn Fn(anyhow::Error) + Send + Sync>;
type CompleteHook = Box<dyn FnOnce() + Send>;

/// Optional callbacks for a polling run.
#[derive(Default)]
pub struct PollHooks {
    /// Called with each tick error; defaults to a log line
    pub on_error: Option<ErrorHook>,
    /// Called once after the last tick of a run that was not stopped
    pub on_complete: Option<CompleteHook>,
}

impl PollHooks {
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: Fn(anyhow::Error) + Send + Sync + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    pub fn on_complete<F>(mut self, hook: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_complete = Some(Box::new(hook));
        self
    }
}

pub struct PollingController {
    handle: Option<JoinHandle<()>>,
    ticks: Arc<AtomicU32>,
    cancelled: Arc<AtomicBool>,
}

impl PollingController {
    pub fn new() -> Self {
        Self {
            handle: None,
            ticks: Arc::new(AtomicU32::new(0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start polling. A run already in progress is stopped first.
    ///
    /// The first tick fires one `interval` after the call.
    pub fn start<F, Fut>(&mut self, mut on_tick: F, interval: Duration, max_ticks: u32, hooks: PollHooks)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        self.stop();

        // Fresh counters per run so an aborted run cannot touch the new one.
        self.ticks = Arc::new(AtomicU32::new(0));
        self.cancelled = Arc::new(AtomicBool::new(false));
        let ticks = Arc::clone(&self.ticks);
        let cancelled = Arc::clone(&self.cancelled);
        let PollHooks { on_error, on_complete } = hooks;
        debug!("Polling every {:?} for at most {} ticks", interval, max_ticks);

        self.handle = Some(tokio::spawn(async move {
            let mut timer = interval_at(Instant::now() + interval, interval);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            while ticks.load(Ordering::SeqCst) < max_ticks {
                timer.tick().await;
                if cancelled.load(Ordering::SeqCst) {
                    return;
                }
                let tick_no = ticks.fetch_add(1, Ordering::SeqCst) + 1;
                if let Err(e) = on_tick().await {
                    match &on_error {
                        Some(hook) => hook(e),
                        None => warn!("{} ({}/{}): {}", LOG_POLL_TICK_FAILED, tick_no, max_ticks, e),
                    }
                }
            }

            debug!("Polling finished after {} ticks", max_ticks);
            if let Some(hook) = on_complete {
                hook();
            }
        }));
    }

    /// Cancel the current run and reset the tick counter.
    ///
    /// No tick starts after this returns. A tick already awaiting a network
    /// call is dropped, so its result is never applied.
    pub fn stop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
        self.ticks.store(0, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Ticks invoked in the current (or last finished) run.
    pub fn ticks(&self) -> u32 {
        self.ticks.load(Ordering::SeqCst)
    }
}

impl Default for PollingController {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for PollingController {
    fn drop(&mut self) {
        self.cancelled.store(true, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
