//! Full admission-path coverage over the real SQLite store: scheduling
//! service, per-user cache, approval gate, and broadcast notifier wired the
//! same way the application context wires them.

use std::sync::Arc;

use taskbridge_core::cache::UserTaskCache;
use taskbridge_core::tasks::ports::{ChangeNotifier, TaskRepository};
use taskbridge_core::tasks::query::TaskQuery;
use taskbridge_core::tasks::service::{AdmissionMode, SchedulingService};
use taskbridge_core::ApprovalService;
use taskbridge_domain::{
    BoundaryPolicy, ChangeEvent, Frequency, QueuedRequest, RecurrenceRule, TaskAction,
    TaskBridgeError, TaskDraft, UserRecord,
};
use taskbridge_infra::database::{
    DbManager, SqliteAuditLogRepository, SqliteQueueRepository, SqliteTaskRepository,
    SqliteUserRepository,
};
use taskbridge_infra::notify::BroadcastNotifier;
use tempfile::TempDir;

struct Stack {
    #[allow(dead_code)]
    temp_dir: TempDir,
    tasks: Arc<SqliteTaskRepository>,
    scheduler: Arc<SchedulingService>,
    approvals: ApprovalService,
    notifier: Arc<BroadcastNotifier>,
}

async fn stack() -> Stack {
    let temp_dir = TempDir::new().expect("temporary directory should be created");
    let manager = DbManager::new(temp_dir.path().join("flow.db"), 4)
        .expect("database manager should initialise");
    manager.run_migrations().expect("schema migrations should apply");
    let pool = Arc::clone(manager.pool());

    let tasks = Arc::new(SqliteTaskRepository::new(Arc::clone(&pool)));
    let users = Arc::new(SqliteUserRepository::new(Arc::clone(&pool)));
    let queue = Arc::new(SqliteQueueRepository::new(Arc::clone(&pool)));
    let logs = Arc::new(SqliteAuditLogRepository::new(pool));
    let notifier = Arc::new(BroadcastNotifier::new());

    let cache = Arc::new(UserTaskCache::new(tasks.clone() as Arc<dyn TaskRepository>));
    let scheduler = Arc::new(SchedulingService::new(
        tasks.clone(),
        users,
        logs.clone(),
        cache,
        notifier.clone() as Arc<dyn ChangeNotifier>,
    ));

    let now = chrono::Utc::now();
    scheduler
        .ensure_user(&UserRecord {
            id: "u1".into(),
            display_name: "integration user".into(),
            boundary_policy: BoundaryPolicy::Exclusive,
            week_offset: 0,
            created_at: now,
            updated_at: now,
        })
        .await
        .expect("user materializes");

    let approvals = ApprovalService::new(
        queue,
        logs,
        notifier.clone() as Arc<dyn ChangeNotifier>,
        scheduler.clone(),
    );

    Stack { temp_dir, tasks, scheduler, approvals, notifier }
}

fn draft(name: &str, start: &str, end: &str) -> TaskDraft {
    TaskDraft {
        name: name.to_string(),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        ..TaskDraft::default()
    }
}

#[tokio::test(flavor = "multi_thread")]
async fn recurring_admission_lands_in_store_cache_and_channel() {
    let stack = stack().await;
    let mut rx = stack.notifier.subscribe("u1");

    let mut input = draft("standup", "2026-03-02 09:00:00", "2026-03-02 09:15:00");
    input.recurrence_rule = Some(RecurrenceRule {
        freq: Frequency::Daily,
        interval: 1,
        count: Some(3),
        until: None,
        by_day: None,
    });

    let outcome = stack
        .scheduler
        .admit("u1", input, AdmissionMode::Advisory)
        .await
        .expect("admission succeeds");
    let summary = outcome.expansion.expect("rule expands");
    assert_eq!(summary.created_count, 2);

    // Store, cache, and occurrence listing all agree
    let all = stack.tasks.all_tasks("u1").await.expect("store listing");
    assert_eq!(all.len(), 3);
    assert_eq!(stack.scheduler.cache().snapshot("u1").len(), 3);
    let occurrences = stack
        .scheduler
        .occurrences("u1", &outcome.task.id)
        .await
        .expect("occurrence listing");
    assert_eq!(occurrences.len(), 2);

    // The push channel carried the root's creation
    let mut saw_created = false;
    while let Ok(event) = rx.try_recv() {
        if matches!(event, ChangeEvent::TaskChanged { action: TaskAction::Created, .. }) {
            saw_created = true;
        }
    }
    assert!(saw_created, "creation event reached the subscriber");
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_approval_round_trip_over_sqlite() {
    let stack = stack().await;

    let request = QueuedRequest {
        draft: draft("seminar", "2026-03-04 14:00:00", "2026-03-04 15:00:00"),
        source: Some("Fwd: departmental seminar".into()),
    };
    let entry = stack.approvals.enqueue("u1", request).await.expect("enqueue");

    // Nothing exists until the human approves
    assert!(stack
        .scheduler
        .list("u1", &TaskQuery::default())
        .await
        .expect("listing")
        .is_empty());

    let outcome = stack.approvals.approve("u1", &entry.id).await.expect("approve");
    assert_eq!(outcome.task.name, "seminar");

    let listed = stack.scheduler.list("u1", &TaskQuery::default()).await.expect("listing");
    assert_eq!(listed.len(), 1, "exactly one task after approval");
    assert!(stack.approvals.list("u1").await.expect("queue").is_empty(), "entry removed");
}

#[tokio::test(flavor = "multi_thread")]
async fn queue_rejection_leaves_no_task_behind() {
    let stack = stack().await;

    let request = QueuedRequest {
        draft: draft("spam invite", "2026-03-04 14:00:00", "2026-03-04 15:00:00"),
        source: None,
    };
    let entry = stack.approvals.enqueue("u1", request).await.expect("enqueue");
    stack.approvals.reject("u1", &entry.id).await.expect("reject");

    assert!(stack
        .scheduler
        .list("u1", &TaskQuery::default())
        .await
        .expect("listing")
        .is_empty());
    assert!(stack.approvals.list("u1").await.expect("queue").is_empty());
}

#[tokio::test(flavor = "multi_thread")]
async fn near_simultaneous_blocking_admissions_cannot_both_land() {
    let stack = stack().await;

    let first = stack
        .scheduler
        .admit(
            "u1",
            draft("early", "2026-03-02 09:00:00", "2026-03-02 10:00:00"),
            AdmissionMode::Blocking,
        )
        .await;
    let second = stack
        .scheduler
        .admit(
            "u1",
            draft("late", "2026-03-02 09:30:00", "2026-03-02 10:30:00"),
            AdmissionMode::Blocking,
        )
        .await;

    assert!(first.is_ok());
    assert!(matches!(second, Err(TaskBridgeError::Conflict(_))));
    assert_eq!(stack.tasks.all_tasks("u1").await.expect("listing").len(), 1);
}

#[tokio::test(flavor = "multi_thread")]
async fn patch_and_cascade_delete_flow() {
    let stack = stack().await;

    let mut input = draft("lecture", "2026-03-02 09:00:00", "2026-03-02 10:00:00");
    input.recurrence_rule = Some(RecurrenceRule {
        freq: Frequency::Daily,
        interval: 1,
        count: Some(3),
        until: None,
        by_day: None,
    });
    let outcome = stack
        .scheduler
        .admit("u1", input, AdmissionMode::Advisory)
        .await
        .expect("admission");

    let completed = stack
        .scheduler
        .complete("u1", &outcome.task.id)
        .await
        .expect("completion");
    assert!(completed.task.completed);

    let removed = stack
        .scheduler
        .delete("u1", &outcome.task.id, true)
        .await
        .expect("cascade delete");
    assert!(removed);
    assert!(stack.tasks.all_tasks("u1").await.expect("listing").is_empty());
    assert!(stack.scheduler.cache().snapshot("u1").is_empty());
}
