//! Tests for what the engine reports once a change has been committed.
//!
//! A committed join, leave or serve must succeed and publish even when the
//! store stops answering reads right after the change, and events of one
//! point must arrive in commit order.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use boothline_core::error::StoreError;
use boothline_core::point::{Point, PointInput, PointSpec};
use boothline_core::settings::Settings;
use boothline_core::store::{
    DeleteOutcome, InsertOutcome, PointRegistry, SettingsStore, StoreResult, TicketStore,
    Transition,
};
use boothline_core::ticket::Ticket;
use boothline_core::types::DbId;
use boothline_engine::{JoinOutcome, LeaveTarget, MemoryStore, QueueEngine};
use boothline_events::{EventBus, QueueChange};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Memory store whose queue reads fail after every committed mutation
/// until [`ReadsFailAfterWrite::recover`] is called.
#[derive(Default)]
struct ReadsFailAfterWrite {
    inner: MemoryStore,
    failing: AtomicBool,
}

impl ReadsFailAfterWrite {
    fn recover(&self) {
        self.failing.store(false, Ordering::SeqCst);
    }

    fn read<T>(&self, value: StoreResult<T>) -> StoreResult<T> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(StoreError::Transient("blip".into()));
        }
        value
    }

    fn wrote<T>(&self, committed: bool, value: T) -> StoreResult<T> {
        if committed {
            self.failing.store(true, Ordering::SeqCst);
        }
        Ok(value)
    }
}

#[async_trait]
impl PointRegistry for ReadsFailAfterWrite {
    async fn get_point(&self, id: DbId) -> StoreResult<Option<Point>> {
        self.inner.get_point(id).await
    }

    async fn list_points(&self, include_inactive: bool) -> StoreResult<Vec<Point>> {
        self.inner.list_points(include_inactive).await
    }

    async fn create_point(&self, spec: &PointSpec) -> StoreResult<Point> {
        self.inner.create_point(spec).await
    }

    async fn update_point(&self, id: DbId, spec: &PointSpec) -> StoreResult<Option<Point>> {
        self.inner.update_point(id, spec).await
    }

    async fn set_point_active(&self, id: DbId, is_active: bool) -> StoreResult<Option<Point>> {
        self.inner.set_point_active(id, is_active).await
    }

    async fn delete_point(&self, id: DbId) -> StoreResult<DeleteOutcome> {
        self.inner.delete_point(id).await
    }
}

#[async_trait]
impl TicketStore for ReadsFailAfterWrite {
    async fn active_tickets_for_point(&self, point_id: DbId) -> StoreResult<Vec<Ticket>> {
        self.read(self.inner.active_tickets_for_point(point_id).await)
    }

    async fn active_tickets_for_user(&self, user_id: &str) -> StoreResult<Vec<Ticket>> {
        self.read(self.inner.active_tickets_for_user(user_id).await)
    }

    async fn find_active(&self, user_id: &str, point_id: DbId) -> StoreResult<Option<Ticket>> {
        self.read(self.inner.find_active(user_id, point_id).await)
    }

    async fn find_ticket(&self, ticket_id: DbId) -> StoreResult<Option<Ticket>> {
        self.read(self.inner.find_ticket(ticket_id).await)
    }

    async fn active_counts(&self) -> StoreResult<HashMap<DbId, u32>> {
        self.read(self.inner.active_counts().await)
    }

    async fn insert(&self, user_id: &str, point_id: DbId) -> StoreResult<InsertOutcome> {
        let outcome = self.inner.insert(user_id, point_id).await?;
        let committed = matches!(outcome, InsertOutcome::Inserted { .. });
        self.wrote(committed, outcome)
    }

    async fn cancel(&self, ticket_id: DbId, user_id: &str) -> StoreResult<Option<Transition>> {
        let changed = self.inner.cancel(ticket_id, user_id).await?;
        self.wrote(changed.is_some(), changed)
    }

    async fn serve_next(&self, point_id: DbId) -> StoreResult<Option<Transition>> {
        let changed = self.inner.serve_next(point_id).await?;
        self.wrote(changed.is_some(), changed)
    }

    async fn mark_served(&self, ticket_id: DbId) -> StoreResult<Option<Transition>> {
        let changed = self.inner.mark_served(ticket_id).await?;
        self.wrote(changed.is_some(), changed)
    }
}

#[async_trait]
impl SettingsStore for ReadsFailAfterWrite {
    async fn get_settings(&self) -> StoreResult<Settings> {
        self.inner.get_settings().await
    }

    async fn save_settings(&self, settings: &Settings) -> StoreResult<()> {
        self.inner.save_settings(settings).await
    }
}

fn point_input(max_queue: i64) -> PointInput {
    PointInput {
        name: "T-City".to_string(),
        sector: "Sector 2".to_string(),
        avg_service_time_sec: Some(90),
        max_queue: Some(max_queue),
        ..Default::default()
    }
}

// ---------------------------------------------------------------------------
// Test: a committed join succeeds even if the queue cannot be re-read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn committed_join_reports_success_and_publishes() {
    let store = Arc::new(ReadsFailAfterWrite::default());
    let engine = QueueEngine::new(store.clone(), Arc::new(EventBus::default()));
    let point_id = engine.create_point(point_input(0)).await.unwrap().id;
    engine.join("alice", point_id).await.unwrap();
    store.recover();
    let mut rx = engine.subscribe();

    let outcome = engine.join("bob", point_id).await;

    let receipt = match outcome {
        Ok(JoinOutcome::Joined(receipt)) => receipt,
        other => panic!("expected a fresh ticket, got {other:?}"),
    };
    assert_eq!(receipt.position, 2);
    assert_eq!(receipt.eta_minutes, 3);

    let event = rx.try_recv().expect("join must be published");
    assert_eq!(event.change, QueueChange::Joined);
    assert_eq!(event.queued_count, 2);
}

// ---------------------------------------------------------------------------
// Test: a committed leave or serve succeeds without a follow-up read
// ---------------------------------------------------------------------------

#[tokio::test]
async fn committed_leave_and_serve_publish_new_counts() {
    let store = Arc::new(ReadsFailAfterWrite::default());
    let engine = QueueEngine::new(store.clone(), Arc::new(EventBus::default()));
    let point_id = engine.create_point(point_input(0)).await.unwrap().id;
    for user in ["a", "b", "c"] {
        engine.join(user, point_id).await.unwrap();
        store.recover();
    }
    let mut rx = engine.subscribe();

    let left = engine.leave("b", LeaveTarget::Point(point_id)).await.unwrap();
    assert!(left.changed);
    store.recover();

    let served = engine.serve_next(point_id).await.unwrap().unwrap();
    assert_eq!(served.user_id, "a");

    let counts: Vec<(QueueChange, u32)> = std::iter::from_fn(|| rx.try_recv().ok())
        .map(|e| (e.change, e.queued_count))
        .collect();
    assert_eq!(counts, vec![(QueueChange::Left, 2), (QueueChange::Served, 1)]);
}

// ---------------------------------------------------------------------------
// Test: events of one point are published in commit order
// ---------------------------------------------------------------------------

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_changes_publish_counts_in_commit_order() {
    let engine = Arc::new(QueueEngine::new(
        Arc::new(MemoryStore::new()),
        Arc::new(EventBus::default()),
    ));
    let point_id = engine.create_point(point_input(0)).await.unwrap().id;
    let mut rx = engine.subscribe();

    let tasks: Vec<_> = (0..40)
        .map(|i| {
            let engine = Arc::clone(&engine);
            tokio::spawn(async move {
                let user = format!("visitor-{i}");
                engine.join(&user, point_id).await.unwrap();
                tokio::task::yield_now().await;
                engine.leave(&user, LeaveTarget::Point(point_id)).await.unwrap();
            })
        })
        .collect();
    for task in futures::future::join_all(tasks).await {
        task.unwrap();
    }

    // Every change moves the count by exactly one from the last published value.
    let mut last = 0u32;
    for _ in 0..80 {
        let event = rx.recv().await.unwrap();
        let expected = match event.change {
            QueueChange::Joined => last + 1,
            QueueChange::Left => last - 1,
            other => panic!("unexpected change {other:?}"),
        };
        assert_eq!(event.queued_count, expected, "out-of-order count after {last}");
        last = event.queued_count;
    }
    assert_eq!(last, 0);
    assert!(rx.try_recv().is_err());
}
