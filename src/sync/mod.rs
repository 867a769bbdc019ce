//! Queue session module for the Manage My Queue widget.
//!
//! This module provides the [`QueueSession`] struct which keeps one account's
//! queue in step with the remote system of record. It wires the synchronous
//! [`QueueEngine`] to a [`QueueService`], starts bounded polling after every
//! confirmed mutation, and runs the background refresh countdown.
//!
//! The session offers:
//! - Optimistic, locally staged Hold-bucket reordering with explicit apply/cancel
//! - Capacity-gated play/pause that is applied only after remote confirmation
//! - Automatic rollback to the last confirmed snapshot when a reorder is rejected
//! - A [`QueueEvent`] stream the host renders as toasts, banners and countdown

pub mod countdown;
pub mod engine;
pub mod events;
pub mod outcome;
pub mod polling;

use anyhow::Result;
use async_trait::async_trait;
use log::{error, info};
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use uuid::Uuid;

use crate::backend::{factory, QueueService};
use crate::config::Config;
use crate::constants::SUCCESS_QUEUE_LOADED;
use crate::entities::{Cap, QueueSnapshot, Task};
use crate::logger::{self, Logger};

pub use countdown::{Countdown, CountdownPhase, RefreshTarget, RefreshTimer};
pub use engine::{EngineState, LoadTicket, QueueEngine, QueueView, ReorderSubmission};
pub use events::{MutationStrategy, NoticeLevel, QueueAction, QueueEvent};
pub use outcome::{Outcome, QueueError};
pub use polling::{PollHooks, PollingController};

/// State shared between the session and its background tasks.
#[derive(Clone)]
struct SessionCore {
    session_id: Uuid,
    engine: Arc<Mutex<QueueEngine>>,
    service: Arc<dyn QueueService>,
    events: mpsc::UnboundedSender<QueueEvent>,
    logger: Logger,
}

impl SessionCore {
    /// Fetch a snapshot without holding the engine across the network call,
    /// so overlapping loads can race and be fenced by the engine.
    async fn load(&self) -> Outcome {
        let ticket = self.engine.lock().await.begin_load();
        let result = self.service.fetch_snapshot(&ticket.account).await;
        let outcome = self.engine.lock().await.complete_load(ticket, result);
        if outcome.is_done() {
            self.emit(QueueEvent::SnapshotUpdated);
        }
        outcome
    }

    fn emit(&self, event: QueueEvent) {
        // The host may have dropped the receiver; the queue keeps working regardless.
        let _ = self.events.send(event);
    }

    /// Publish the outcome's toast, if it has one.
    fn report(&self, outcome: &Outcome) {
        let level = match outcome {
            Outcome::Done { .. } => NoticeLevel::Success,
            Outcome::Failed(_) => NoticeLevel::Warning,
            Outcome::Unchanged => return,
        };
        if let Some(message) = outcome.notice() {
            self.logger.log(format!("[{}] {}", self.short_id(), message));
            self.emit(QueueEvent::Notice { level, message });
        }
    }

    fn short_id(&self) -> String {
        self.session_id.simple().to_string()[..8].to_string()
    }
}

#[async_trait]
impl RefreshTarget for SessionCore {
    async fn capacity(&self) -> Option<(u32, Cap)> {
        let engine = self.engine.lock().await;
        let capacity = engine.snapshot().map(|s| (engine.working_count(), s.cap));
        capacity
    }

    async fn refresh(&self) {
        let outcome = self.load().await;
        if outcome.is_failed() {
            self.report(&outcome);
        }
    }

    fn countdown_changed(&self, phase: &CountdownPhase) {
        self.emit(QueueEvent::Countdown(phase.clone()));
    }
}

/// One account's queue, kept in step with the remote service.
///
/// # Example
/// ```rust,no_run
/// use manage_my_queue::config::Config;
/// use manage_my_queue::sync::{QueueAction, QueueSession};
///
/// # async fn example() -> anyhow::Result<()> {
/// let (mut session, mut events) = QueueSession::from_config(Config::for_account("ACC-1"))?;
/// session.load().await;
///
/// // Drag the first Hold task to the third slot, then save.
/// session.dispatch(QueueAction::ReorderHold { from_index: 0, to_index: 2 }).await;
/// let outcome = session.dispatch(QueueAction::ApplyReorder).await;
/// if let Some(message) = outcome.notice() {
///     println!("{}", message);
/// }
/// # while let Ok(_event) = events.try_recv() {}
/// # Ok(())
/// # }
/// ```
pub struct QueueSession {
    core: SessionCore,
    config: Config,
    poller: PollingController,
    countdown: RefreshTimer,
}

impl QueueSession {
    /// Create a session over an existing service.
    ///
    /// Returns the session and the receiving end of its event channel.
    pub fn new(config: Config, service: Arc<dyn QueueService>) -> (Self, mpsc::UnboundedReceiver<QueueEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let session_id = Uuid::new_v4();
        let engine = QueueEngine::new(config.account.clone(), config.features.fence_loads);

        info!(
            "Queue session {} created for account '{}' ({} service)",
            session_id,
            config.account,
            service.service_type()
        );

        (
            Self {
                core: SessionCore {
                    session_id,
                    engine: Arc::new(Mutex::new(engine)),
                    service,
                    events: tx,
                    logger: Logger::new(),
                },
                config,
                poller: PollingController::new(),
                countdown: RefreshTimer::new(),
            },
            rx,
        )
    }

    /// Create a session backed by the HTTP service described by `config`,
    /// installing the configured log dispatcher first.
    pub fn from_config(config: Config) -> Result<(Self, mpsc::UnboundedReceiver<QueueEvent>)> {
        logger::init_logging(&config.logging)?;
        let service = factory::create_service(&config)?;
        Ok(Self::new(config, service))
    }

    pub fn session_id(&self) -> Uuid {
        self.core.session_id
    }

    pub fn account(&self) -> &str {
        &self.config.account
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// In-memory log of the notices this session has raised.
    pub fn logger(&self) -> &Logger {
        &self.core.logger
    }

    pub async fn state(&self) -> EngineState {
        self.core.engine.lock().await.state().clone()
    }

    pub async fn view(&self) -> QueueView {
        self.core.engine.lock().await.view()
    }

    pub async fn snapshot(&self) -> Option<QueueSnapshot> {
        self.core.engine.lock().await.snapshot().cloned()
    }

    pub async fn tasks(&self) -> Vec<Task> {
        self.core.engine.lock().await.tasks().to_vec()
    }

    pub async fn active_tasks(&self) -> Vec<Task> {
        self.core.engine.lock().await.active_tasks()
    }

    pub async fn hold_tasks(&self) -> Vec<Task> {
        self.core.engine.lock().await.hold_tasks()
    }

    pub async fn has_pending_mutation(&self) -> bool {
        self.core.engine.lock().await.has_pending_mutation()
    }

    pub fn is_polling(&self) -> bool {
        self.poller.is_running()
    }

    pub fn countdown_phase(&self) -> CountdownPhase {
        self.countdown.phase()
    }

    /// Route an operator action to the matching operation.
    pub async fn dispatch(&mut self, action: QueueAction) -> Outcome {
        log::debug!("[{}] dispatch {:?} ({:?})", self.core.short_id(), action, action.strategy());
        match action {
            QueueAction::Refresh => self.refresh().await,
            QueueAction::ReorderHold { from_index, to_index } => self.reorder_hold(from_index, to_index).await,
            QueueAction::ApplyReorder => self.apply_pending_reorder().await,
            QueueAction::CancelReorder => self.cancel_pending_reorder().await,
            QueueAction::SetRunState { task_id, to_active } => self.set_task_run_state(&task_id, to_active).await,
            QueueAction::SwitchAccount(account) => self.switch_account(account).await,
        }
    }

    /// Fetch a fresh snapshot and replace local state with it.
    pub async fn load(&mut self) -> Outcome {
        let outcome = self.core.load().await;
        if outcome.is_failed() {
            self.core.report(&outcome);
        }
        self.ensure_countdown();
        outcome
    }

    /// Explicit operator refresh: a load that also confirms success.
    pub async fn refresh(&mut self) -> Outcome {
        match self.load().await {
            Outcome::Done { .. } => {
                let outcome = Outcome::done(SUCCESS_QUEUE_LOADED);
                self.core.report(&outcome);
                outcome
            }
            other => other,
        }
    }

    /// Stage a Hold-bucket move locally. Nothing is sent.
    pub async fn reorder_hold(&mut self, from_index: usize, to_index: usize) -> Outcome {
        let outcome = self.core.engine.lock().await.reorder_hold(from_index, to_index);
        match &outcome {
            Outcome::Done { .. } => self.core.emit(QueueEvent::SnapshotUpdated),
            Outcome::Failed(_) => self.core.report(&outcome),
            Outcome::Unchanged => {}
        }
        outcome
    }

    /// Submit the staged Hold order; roll back if the remote rejects it.
    pub async fn apply_pending_reorder(&mut self) -> Outcome {
        let prepared = self.core.engine.lock().await.prepare_reorder_submission();
        let submission = match prepared {
            Ok(submission) => submission,
            Err(outcome) => {
                self.core.report(&outcome);
                return outcome;
            }
        };

        info!(
            "[{}] Submitting order #{} of {} hold tasks",
            self.core.short_id(),
            submission.id,
            submission.entries.len()
        );
        let result = self.core.service.reorder(&submission.entries).await;
        let outcome = self
            .core
            .engine
            .lock()
            .await
            .complete_reorder_submission(&submission, result);

        self.core.emit(QueueEvent::SnapshotUpdated);
        self.core.report(&outcome);
        if outcome.is_done() {
            self.start_polling();
        }
        outcome
    }

    /// Discard the staged Hold order.
    pub async fn cancel_pending_reorder(&mut self) -> Outcome {
        let outcome = self.core.engine.lock().await.cancel_pending_reorder();
        if outcome.is_done() {
            self.core.emit(QueueEvent::SnapshotUpdated);
            self.core.report(&outcome);
        }
        outcome
    }

    /// Play (`to_active = true`) or pause a task.
    ///
    /// Playing a hold-marked task while the cap is reached is refused locally.
    pub async fn set_task_run_state(&mut self, task_id: &str, to_active: bool) -> Outcome {
        let prepared = self.core.engine.lock().await.prepare_run_state(task_id, to_active);
        let request = match prepared {
            Ok(request) => request,
            Err(outcome) => {
                self.core.report(&outcome);
                return outcome;
            }
        };

        info!(
            "[{}] Sending {} for task {} at position {}",
            self.core.short_id(),
            request.action.as_str(),
            request.task_id,
            request.position
        );
        let result = self.core.service.play_pause(&request).await;
        let outcome = self.core.engine.lock().await.complete_run_state(&request, result);

        self.core.report(&outcome);
        if outcome.is_done() {
            self.core.emit(QueueEvent::SnapshotUpdated);
            self.start_polling();
        }
        outcome
    }

    /// Drop the current account's state and load `account` instead.
    ///
    /// Backs the account override control; the host decides whether to show it
    /// via `features.show_account_override`.
    pub async fn switch_account(&mut self, account: String) -> Outcome {
        if account.trim().is_empty() {
            let outcome = Outcome::Failed(QueueError::Validation("account must not be empty".to_string()));
            self.core.report(&outcome);
            return outcome;
        }

        info!("[{}] Switching account '{}' -> '{}'", self.core.short_id(), self.config.account, account);
        self.shutdown();
        self.core.engine.lock().await.reset(account.clone());
        self.config.account = account;
        self.load().await
    }

    /// Stop post-mutation polling early.
    pub fn stop_polling(&mut self) {
        self.poller.stop();
    }

    /// Stop every background task owned by the session.
    pub fn shutdown(&mut self) {
        self.poller.stop();
        self.countdown.stop();
    }

    fn start_polling(&mut self) {
        let core = self.core.clone();
        let completion = self.core.clone();
        let failures = self.core.clone();

        let hooks = PollHooks::default()
            .on_complete(move || completion.emit(QueueEvent::PollFinished))
            .on_error(move |e| {
                error!("[{}] Poll refresh failed: {}", failures.short_id(), e);
                failures.logger.log(format!("Poll refresh failed: {}", e));
            });

        self.poller.start(
            move || {
                let core = core.clone();
                async move {
                    match core.load().await {
                        Outcome::Failed(e) => Err(anyhow::anyhow!(e.warning())),
                        _ => Ok(()),
                    }
                }
            },
            self.config.polling.interval(),
            self.config.polling.max_ticks,
            hooks,
        );
    }

    fn ensure_countdown(&mut self) {
        if self.config.countdown.enabled && !self.countdown.is_running() {
            self.countdown
                .start(Countdown::from_config(&self.config.countdown), Arc::new(self.core.clone()));
        }
    }
}

impl Drop for QueueSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}
