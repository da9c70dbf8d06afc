//! Occurrence-start scanner.
//!
//! On a fixed interval, walks every user's cached task list and announces
//! tasks whose start time has just elapsed. A process-lifetime set of
//! announced ids prevents duplicate announcements; a task completed before
//! its start arrived gets a cancellation instead of a start signal.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use taskbridge_core::cache::UserTaskCache;
use taskbridge_core::tasks::ports::{ChangeNotifier, UserRepository};
use taskbridge_domain::ChangeEvent;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use super::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the occurrence scanner.
#[derive(Debug, Clone)]
pub struct OccurrenceScannerConfig {
    /// Scan interval
    pub interval: Duration,
    /// How far past a start time still counts as "just elapsed"; anything
    /// older is left alone so a restart does not replay the entire past
    pub lookback: Duration,
}

impl Default for OccurrenceScannerConfig {
    fn default() -> Self {
        Self { interval: Duration::from_secs(60), lookback: Duration::from_secs(120) }
    }
}

struct ScanContext {
    users: Arc<dyn UserRepository>,
    cache: Arc<UserTaskCache>,
    notifier: Arc<dyn ChangeNotifier>,
    announced: Arc<Mutex<HashSet<String>>>,
}

/// Fixed-interval scanner announcing started (or preemptively canceled)
/// occurrences.
pub struct OccurrenceScanner {
    context: ScanContext,
    config: OccurrenceScannerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl OccurrenceScanner {
    pub fn new(
        users: Arc<dyn UserRepository>,
        cache: Arc<UserTaskCache>,
        notifier: Arc<dyn ChangeNotifier>,
        config: OccurrenceScannerConfig,
    ) -> Self {
        Self {
            context: ScanContext {
                users,
                cache,
                notifier,
                announced: Arc::new(Mutex::new(HashSet::new())),
            },
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the scanner loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "starting occurrence scanner");

        self.cancellation_token = CancellationToken::new();
        let context = ScanContext {
            users: Arc::clone(&self.context.users),
            cache: Arc::clone(&self.context.cache),
            notifier: Arc::clone(&self.context.notifier),
            announced: Arc::clone(&self.context.announced),
        };
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("occurrence scan loop cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(config.interval) => {
                        Self::scan_once(&context, &config).await;
                    }
                }
            }
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the scanner gracefully.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) -> SchedulerResult<()> {
        if !self.is_running() {
            return Err(SchedulerError::NotRunning);
        }

        self.cancellation_token.cancel();
        if let Some(handle) = self.task_handle.lock().await.take() {
            let join_timeout = Duration::from_secs(5);
            tokio::time::timeout(join_timeout, handle)
                .await
                .map_err(|source| SchedulerError::Timeout { duration: join_timeout, source })??;
        }

        info!("occurrence scanner stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// One scan pass over every user's cached view.
    async fn scan_once(context: &ScanContext, config: &OccurrenceScannerConfig) {
        let users = match context.users.list_users().await {
            Ok(users) => users,
            Err(err) => {
                error!(error = %err, "occurrence scan could not list users");
                return;
            }
        };

        let now = Utc::now();
        let lookback = chrono::Duration::from_std(config.lookback)
            .unwrap_or_else(|_| chrono::Duration::seconds(120));

        for user in users {
            for task in context.cache.snapshot(&user.id) {
                let Some(start) = task.start_time else {
                    continue;
                };
                if start > now || now - start > lookback {
                    continue;
                }

                {
                    let mut announced = context.announced.lock().await;
                    if !announced.insert(task.id.clone()) {
                        continue;
                    }
                }

                let event = if task.completed {
                    ChangeEvent::OccurrenceCanceled { task: task.summary() }
                } else {
                    ChangeEvent::OccurrenceStarting { task: task.summary() }
                };
                debug!(user_id = %user.id, task_id = %task.id, completed = task.completed, "occurrence announced");
                context.notifier.publish(&user.id, event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use taskbridge_core::testing::{
        sample_user, InMemoryTaskRepository, InMemoryUserRepository, RecordingNotifier,
    };
    use taskbridge_core::tasks::ports::TaskRepository;

    use super::*;

    struct Harness {
        context: ScanContext,
        config: OccurrenceScannerConfig,
        tasks: Arc<InMemoryTaskRepository>,
        notifier: Arc<RecordingNotifier>,
    }

    async fn harness() -> Harness {
        let tasks = Arc::new(InMemoryTaskRepository::default());
        let users = Arc::new(InMemoryUserRepository::default());
        users.seed(vec![sample_user("u1")]);
        let cache = Arc::new(UserTaskCache::new(tasks.clone() as Arc<dyn TaskRepository>));
        let notifier = Arc::new(RecordingNotifier::default());

        Harness {
            context: ScanContext {
                users: users.clone(),
                cache,
                notifier: notifier.clone(),
                announced: Arc::new(Mutex::new(HashSet::new())),
            },
            config: OccurrenceScannerConfig::default(),
            tasks,
            notifier,
        }
    }

    fn just_started(id: &str) -> taskbridge_domain::Task {
        let mut task = taskbridge_core::testing::sample_task(id, "u1");
        task.start_time = Some(Utc::now() - chrono::Duration::seconds(10));
        task.end_time = Some(Utc::now() + chrono::Duration::seconds(3600));
        task
    }

    #[tokio::test]
    async fn started_task_is_announced_exactly_once() {
        let h = harness().await;
        h.tasks.seed(vec![just_started("t1")]);
        h.context.cache.load("u1").await.expect("cache load");

        OccurrenceScanner::scan_once(&h.context, &h.config).await;
        OccurrenceScanner::scan_once(&h.context, &h.config).await;

        let events = h.notifier.events_for("u1");
        assert_eq!(events.len(), 1, "no duplicate announcements");
        assert!(matches!(events[0], ChangeEvent::OccurrenceStarting { .. }));
    }

    #[tokio::test]
    async fn preemptively_completed_task_is_announced_as_canceled() {
        let h = harness().await;
        let mut task = just_started("t1");
        task.completed = true;
        h.tasks.seed(vec![task]);
        h.context.cache.load("u1").await.expect("cache load");

        OccurrenceScanner::scan_once(&h.context, &h.config).await;

        let events = h.notifier.events_for("u1");
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], ChangeEvent::OccurrenceCanceled { .. }));
    }

    #[tokio::test]
    async fn future_and_stale_tasks_are_ignored() {
        let h = harness().await;

        let mut future = taskbridge_core::testing::sample_task("future", "u1");
        future.start_time = Some(Utc::now() + chrono::Duration::seconds(600));

        let mut ancient = taskbridge_core::testing::sample_task("ancient", "u1");
        ancient.start_time = Some(Utc::now() - chrono::Duration::days(2));

        h.tasks.seed(vec![future, ancient]);
        h.context.cache.load("u1").await.expect("cache load");

        OccurrenceScanner::scan_once(&h.context, &h.config).await;
        assert!(h.notifier.events_for("u1").is_empty());
    }
}
