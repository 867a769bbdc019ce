use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

use manage_my_queue::backend::{
    BackendError, PlayPauseRequest, PlayPauseResponse, QueueService, ReorderAck, ReorderEntry,
};
use manage_my_queue::config::Config;
use manage_my_queue::constants::{
    SUCCESS_REORDER_APPLIED, SUCCESS_TASK_PAUSED, WARNING_CAPACITY_REACHED, WARNING_REORDER_FAILED,
};
use manage_my_queue::entities::{Cap, QueueSnapshot, Task};
use manage_my_queue::sync::{
    CountdownPhase, NoticeLevel, Outcome, QueueAction, QueueError, QueueEvent, QueueSession, QueueView,
};

/// In-memory queue service that records every call.
struct RecordingService {
    snapshot: Mutex<QueueSnapshot>,
    reorder_result: Mutex<Result<ReorderAck, BackendError>>,
    play_pause_result: Mutex<Result<PlayPauseResponse, BackendError>>,
    calls: Mutex<Vec<String>>,
    reorders: Mutex<Vec<Vec<ReorderEntry>>>,
}

impl RecordingService {
    fn new(tasks: Vec<Task>, cap: Cap) -> Arc<Self> {
        Arc::new(Self {
            snapshot: Mutex::new(QueueSnapshot {
                account: String::new(),
                active_task_count: 0,
                tasks,
                cap,
                org_label: "Acme Ops".to_string(),
            }),
            reorder_result: Mutex::new(Ok(ReorderAck::default())),
            play_pause_result: Mutex::new(Ok(PlayPauseResponse {
                status: "On Hold".to_string(),
                active: true,
                due_date: None,
                badge_color: None,
            })),
            calls: Mutex::new(Vec::new()),
            reorders: Mutex::new(Vec::new()),
        })
    }

    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn count(&self, prefix: &str) -> usize {
        self.calls().iter().filter(|c| c.starts_with(prefix)).count()
    }
}

#[async_trait]
impl QueueService for RecordingService {
    fn service_type(&self) -> &str {
        "recording"
    }

    async fn fetch_snapshot(&self, account: &str) -> Result<QueueSnapshot, BackendError> {
        self.calls.lock().unwrap().push(format!("fetch:{}", account));
        let mut snapshot = self.snapshot.lock().unwrap().clone();
        snapshot.account = account.to_string();
        Ok(snapshot)
    }

    async fn reorder(&self, entries: &[ReorderEntry]) -> Result<ReorderAck, BackendError> {
        self.calls.lock().unwrap().push("reorder".to_string());
        self.reorders.lock().unwrap().push(entries.to_vec());
        self.reorder_result.lock().unwrap().clone()
    }

    async fn play_pause(&self, request: &PlayPauseRequest) -> Result<PlayPauseResponse, BackendError> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("{}:{}", request.action.as_str(), request.task_id));
        self.play_pause_result.lock().unwrap().clone()
    }
}

fn config() -> Config {
    let mut config = Config::for_account("ACC-1");
    config.countdown.enabled = false;
    config
}

fn working(id: &str) -> Task {
    Task::new(id, id, "In Progress", true)
}

fn parked(id: &str) -> Task {
    Task::new(id, id, "On Hold", true)
}

fn queued(id: &str, position: i64) -> Task {
    Task::new(id, id, "Queued", false).with_position(position)
}

fn drain(rx: &mut UnboundedReceiver<QueueEvent>) -> Vec<QueueEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn notices(events: &[QueueEvent], level: NoticeLevel) -> Vec<String> {
    events
        .iter()
        .filter_map(|e| match e {
            QueueEvent::Notice { level: l, message } if *l == level => Some(message.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_load_publishes_snapshot() {
    let service = RecordingService::new(vec![working("A"), queued("B", 1)], Cap::Limited(3));
    let (mut session, mut events) = QueueSession::new(config(), service.clone());

    assert_eq!(session.view().await, QueueView::Loading);
    assert!(session.load().await.is_done());

    assert_eq!(service.calls(), vec!["fetch:ACC-1"]);
    assert!(drain(&mut events).contains(&QueueEvent::SnapshotUpdated));
    assert_eq!(session.active_tasks().await.len(), 1);
    assert_eq!(session.hold_tasks().await.len(), 1);
    assert_eq!(session.snapshot().await.unwrap().account, "ACC-1");
}

#[tokio::test]
async fn test_play_blocked_sends_no_request() {
    let service = RecordingService::new(vec![working("A"), working("B"), parked("P")], Cap::Limited(2));
    let (mut session, mut events) = QueueSession::new(config(), service.clone());
    session.load().await;
    drain(&mut events);

    let outcome = session.set_task_run_state("P", true).await;
    assert_eq!(
        outcome,
        Outcome::Failed(QueueError::CapacityExceeded { working: 2, cap: 2 })
    );
    assert_eq!(service.count("play"), 0);
    assert!(!session.is_polling());

    let warnings = notices(&drain(&mut events), NoticeLevel::Warning);
    assert_eq!(warnings, vec![WARNING_CAPACITY_REACHED.to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_apply_reorder_starts_polling() {
    let service = RecordingService::new(vec![queued("A", 1), queued("B", 2), queued("C", 3)], Cap::Limited(5));
    let (mut session, mut events) = QueueSession::new(config(), service.clone());
    session.load().await;

    session.dispatch(QueueAction::ReorderHold { from_index: 2, to_index: 0 }).await;
    assert!(session.has_pending_mutation().await);
    assert_eq!(service.count("reorder"), 0);

    let outcome = session.dispatch(QueueAction::ApplyReorder).await;
    assert_eq!(outcome, Outcome::done(SUCCESS_REORDER_APPLIED));
    assert!(session.is_polling());

    let submitted = service.reorders.lock().unwrap()[0].clone();
    let order: Vec<(String, i64)> = submitted.into_iter().map(|e| (e.task_id, e.position)).collect();
    assert_eq!(
        order,
        vec![("C".to_string(), 1), ("A".to_string(), 2), ("B".to_string(), 3)]
    );

    // Ten polls at two second intervals, then the run ends on its own.
    tokio::time::sleep(Duration::from_secs(25)).await;
    assert_eq!(service.count("fetch"), 11);
    assert!(!session.is_polling());

    let events = drain(&mut events);
    assert!(events.contains(&QueueEvent::PollFinished));
    assert_eq!(
        notices(&events, NoticeLevel::Success),
        vec![SUCCESS_REORDER_APPLIED.to_string()]
    );
}

#[tokio::test]
async fn test_rejected_reorder_rolls_back() {
    let service = RecordingService::new(vec![queued("A", 1), queued("B", 2), queued("C", 3)], Cap::Limited(5));
    *service.reorder_result.lock().unwrap() = Err(BackendError::Status {
        status: 500,
        detail: "Position conflict".to_string(),
    });
    let (mut session, mut events) = QueueSession::new(config(), service.clone());
    session.load().await;
    drain(&mut events);

    session.reorder_hold(0, 2).await;
    let outcome = session.apply_pending_reorder().await;
    assert!(outcome.is_failed());
    assert!(!session.is_polling());

    let hold: Vec<String> = session.hold_tasks().await.into_iter().map(|t| t.id).collect();
    assert_eq!(hold, vec!["A", "B", "C"]);
    assert!(!session.has_pending_mutation().await);

    let warnings = notices(&drain(&mut events), NoticeLevel::Warning);
    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].starts_with(WARNING_REORDER_FAILED));
    assert!(warnings[0].contains("Position conflict"));
    assert!(session.logger().get_logs()[0].contains("Position conflict"));
}

#[tokio::test]
async fn test_cancel_reorder_sends_nothing() {
    let service = RecordingService::new(vec![queued("A", 1), queued("B", 2)], Cap::Unlimited);
    let (mut session, _events) = QueueSession::new(config(), service.clone());
    session.load().await;

    session.reorder_hold(1, 0).await;
    assert!(session.dispatch(QueueAction::CancelReorder).await.is_done());
    assert_eq!(service.count("reorder"), 0);

    let hold: Vec<String> = session.hold_tasks().await.into_iter().map(|t| t.id).collect();
    assert_eq!(hold, vec!["A", "B"]);
}

#[tokio::test]
async fn test_pause_applies_confirmed_state() {
    let service = RecordingService::new(vec![working("A"), queued("B", 1)], Cap::Limited(2));
    let (mut session, mut events) = QueueSession::new(config(), service.clone());
    session.load().await;

    let outcome = session
        .dispatch(QueueAction::SetRunState {
            task_id: "A".to_string(),
            to_active: false,
        })
        .await;
    assert_eq!(outcome, Outcome::done(SUCCESS_TASK_PAUSED));
    assert_eq!(service.count("pause:A"), 1);
    assert!(session.is_polling());

    let task = session.tasks().await.into_iter().find(|t| t.id == "A").unwrap();
    assert!(task.is_on_hold());
    assert!(notices(&drain(&mut events), NoticeLevel::Success).contains(&SUCCESS_TASK_PAUSED.to_string()));

    session.stop_polling();
    assert!(!session.is_polling());
}

#[tokio::test]
async fn test_switch_account_reloads() {
    let service = RecordingService::new(vec![working("A")], Cap::Unlimited);
    let (mut session, _events) = QueueSession::new(config(), service.clone());
    session.load().await;

    let outcome = session.dispatch(QueueAction::SwitchAccount("ACC-2".to_string())).await;
    assert!(outcome.is_done());
    assert_eq!(session.account(), "ACC-2");
    assert_eq!(service.calls(), vec!["fetch:ACC-1", "fetch:ACC-2"]);
    assert_eq!(session.snapshot().await.unwrap().account, "ACC-2");
}

#[tokio::test(start_paused = true)]
async fn test_countdown_refreshes_when_slots_free() {
    let service = RecordingService::new(vec![working("A"), queued("B", 1)], Cap::Limited(3));
    let mut config = config();
    config.countdown.enabled = true;
    config.countdown.duration_secs = 3;
    let (mut session, mut events) = QueueSession::new(config, service.clone());
    session.load().await;

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(session.countdown_phase(), CountdownPhase::Counting { remaining_secs: 3 });

    // The refresh fires a full countdown after the load, not one tick later.
    tokio::time::sleep(Duration::from_millis(2_400)).await;
    assert_eq!(service.count("fetch"), 1);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert_eq!(service.count("fetch"), 2);
    assert!(session.countdown_phase().is_refreshing());
    assert!(drain(&mut events)
        .iter()
        .any(|e| matches!(e, QueueEvent::Countdown(CountdownPhase::Refreshing { .. }))));

    session.shutdown();
    assert_eq!(session.countdown_phase(), CountdownPhase::Idle);
}

#[tokio::test(start_paused = true)]
async fn test_countdown_idle_at_capacity() {
    let service = RecordingService::new(vec![working("A"), working("B")], Cap::Limited(2));
    let mut config = config();
    config.countdown.enabled = true;
    let (mut session, _events) = QueueSession::new(config, service.clone());
    session.load().await;

    tokio::time::sleep(Duration::from_secs(600)).await;
    assert_eq!(session.countdown_phase(), CountdownPhase::Idle);
    assert_eq!(service.count("fetch"), 1);
}
