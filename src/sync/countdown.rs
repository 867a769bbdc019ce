//! Background refresh countdown.
//!
//! While a finite cap has free working slots, a countdown runs down once per
//! second. At zero it triggers a snapshot refresh, shows a short
//! "refreshing" phase, then starts over. With no free slot (or an unlimited
//! cap) the countdown is idle.

use async_trait::async_trait;
use log::{debug, info};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::config::CountdownConfig;
use crate::entities::Cap;
use crate::queue::has_open_capacity;
use crate::utils::datetime::format_countdown;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CountdownPhase {
    Idle,
    Counting { remaining_secs: u64 },
    Refreshing { remaining_secs: u64 },
}

impl CountdownPhase {
    /// `mm:ss` while counting, `None` otherwise.
    pub fn display(&self) -> Option<String> {
        match self {
            CountdownPhase::Counting { remaining_secs } => Some(format_countdown(*remaining_secs)),
            _ => None,
        }
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(self, CountdownPhase::Refreshing { .. })
    }
}

/// Countdown state advanced one second at a time.
#[derive(Debug, Clone)]
pub struct Countdown {
    duration_secs: u64,
    refreshing_hold_secs: u64,
    phase: CountdownPhase,
}

impl Countdown {
    pub fn new(duration_secs: u64, refreshing_hold_secs: u64) -> Self {
        Self {
            duration_secs: duration_secs.max(1),
            refreshing_hold_secs,
            phase: CountdownPhase::Idle,
        }
    }

    pub fn from_config(config: &CountdownConfig) -> Self {
        Self::new(config.duration_secs, config.refreshing_hold_secs)
    }

    pub fn phase(&self) -> &CountdownPhase {
        &self.phase
    }

    /// Advance by one second. Returns true when a refresh is due now.
    ///
    /// `eligible` is whether the Active bucket currently has open capacity.
    pub fn tick(&mut self, eligible: bool) -> bool {
        match self.phase {
            CountdownPhase::Idle => {
                if eligible {
                    self.phase = CountdownPhase::Counting {
                        remaining_secs: self.duration_secs,
                    };
                }
                false
            }
            CountdownPhase::Counting { .. } if !eligible => {
                self.phase = CountdownPhase::Idle;
                false
            }
            CountdownPhase::Counting { remaining_secs } => {
                let remaining_secs = remaining_secs.saturating_sub(1);
                if remaining_secs == 0 {
                    self.phase = CountdownPhase::Refreshing {
                        remaining_secs: self.refreshing_hold_secs,
                    };
                    true
                } else {
                    self.phase = CountdownPhase::Counting { remaining_secs };
                    false
                }
            }
            CountdownPhase::Refreshing { remaining_secs } => {
                let remaining_secs = remaining_secs.saturating_sub(1);
                self.phase = if remaining_secs > 0 {
                    CountdownPhase::Refreshing { remaining_secs }
                } else if eligible {
                    CountdownPhase::Counting {
                        remaining_secs: self.duration_secs,
                    }
                } else {
                    CountdownPhase::Idle
                };
                false
            }
        }
    }
}

/// What the refresh timer observes and drives.
#[async_trait]
pub trait RefreshTarget: Send + Sync + 'static {
    /// Working count and cap of the current snapshot, `None` when not loaded.
    async fn capacity(&self) -> Option<(u32, Cap)>;

    async fn refresh(&self);

    /// Called whenever the phase changes (every second while counting).
    fn countdown_changed(&self, _phase: &CountdownPhase) {}
}

/// Owns the background task running a [`Countdown`].
pub struct RefreshTimer {
    handle: Option<JoinHandle<()>>,
    phase: Arc<Mutex<CountdownPhase>>,
}

impl RefreshTimer {
    pub fn new() -> Self {
        Self {
            handle: None,
            phase: Arc::new(Mutex::new(CountdownPhase::Idle)),
        }
    }

    /// Start the timer, replacing any previous run.
    pub fn start<T: RefreshTarget>(&mut self, mut countdown: Countdown, target: Arc<T>) {
        self.stop();
        let phase = Arc::clone(&self.phase);

        self.handle = Some(tokio::spawn(async move {
            // First tick is immediate so a countdown starts at full length.
            let mut timer = interval_at(Instant::now(), TICK);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                timer.tick().await;
                let eligible = target
                    .capacity()
                    .await
                    .map(|(working, cap)| has_open_capacity(working, cap))
                    .unwrap_or(false);

                let before = countdown.phase().clone();
                let refresh_due = countdown.tick(eligible);
                if countdown.phase() != &before {
                    if let Ok(mut shared) = phase.lock() {
                        *shared = countdown.phase().clone();
                    }
                    target.countdown_changed(countdown.phase());
                }

                if refresh_due {
                    info!("⏰ Countdown elapsed, refreshing queue");
                    target.refresh().await;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Stopping refresh countdown");
            handle.abort();
        }
        if let Ok(mut shared) = self.phase.lock() {
            *shared = CountdownPhase::Idle;
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    pub fn phase(&self) -> CountdownPhase {
        self.phase.lock().map(|p| p.clone()).unwrap_or(CountdownPhase::Idle)
    }
}

impl Default for RefreshTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for RefreshTimer {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}
