//! External task-list export scheduler.
//!
//! Periodically pushes completed, not-yet-exported tasks to the external
//! task list. Each push runs under the bounded retry policy; a task whose
//! push still fails after the budget stays unlatched and is retried on the
//! next cycle. `pushed_to_mstodo` is set only after a confirmed push, so a
//! task is never exported twice.

use std::sync::Arc;
use std::time::Duration;

use taskbridge_common::resilience::{retry_with_config, RetryConfig};
use taskbridge_core::tasks::ports::{TaskExportGateway, TaskRepository};
use taskbridge_domain::constants::EXPORT_BATCH_LIMIT;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

use super::error::{SchedulerError, SchedulerResult};

type TaskHandle = Arc<Mutex<Option<JoinHandle<()>>>>;

/// Configuration for the export scheduler.
#[derive(Debug, Clone)]
pub struct ExportSchedulerConfig {
    /// Push cycle interval
    pub interval: Duration,
    /// Maximum tasks pushed per cycle
    pub batch_size: usize,
    /// Retry budget per individual push
    pub retry: RetryConfig,
}

impl Default for ExportSchedulerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(900),
            batch_size: EXPORT_BATCH_LIMIT,
            retry: RetryConfig::default(),
        }
    }
}

/// Periodic push of completed tasks to the external task list.
pub struct ExportScheduler {
    tasks: Arc<dyn TaskRepository>,
    gateway: Arc<dyn TaskExportGateway>,
    config: ExportSchedulerConfig,
    cancellation_token: CancellationToken,
    task_handle: TaskHandle,
}

impl ExportScheduler {
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        gateway: Arc<dyn TaskExportGateway>,
        config: ExportSchedulerConfig,
    ) -> Self {
        Self {
            tasks,
            gateway,
            config,
            cancellation_token: CancellationToken::new(),
            task_handle: Arc::new(Mutex::new(None)),
        }
    }

    /// Start the export loop.
    #[instrument(skip(self))]
    pub async fn start(&mut self) -> SchedulerResult<()> {
        if self.is_running() {
            return Err(SchedulerError::AlreadyRunning);
        }

        info!(interval_secs = self.config.interval.as_secs(), "starting export scheduler");

        self.cancellation_token = CancellationToken::new();
        let tasks = Arc::clone(&self.tasks);
        let gateway = Arc::clone(&self.gateway);
        let config = self.config.clone();
        let cancel = self.cancellation_token.clone();

        let handle = tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        debug!("export loop cancelled");
                        break;
                    }
                    _ = tokio::time::sleep(config.interval) => {
                        Self::push_cycle(&tasks, &gateway, &config).await;
                    }
                }
            }
        });

        *self.task_handle.lock().await = Some(handle);
        Ok(())
    }

    /// Stop the export loop gracefully.
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

        info!("export scheduler stopped");
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.task_handle
            .try_lock()
            .ok()
            .and_then(|guard| guard.as_ref().map(|handle| !handle.is_finished()))
            .unwrap_or(false)
    }

    /// One push cycle: fetch the pending batch and push each task
    /// independently.
    async fn push_cycle(
        tasks: &Arc<dyn TaskRepository>,
        gateway: &Arc<dyn TaskExportGateway>,
        config: &ExportSchedulerConfig,
    ) {
        let pending = match tasks.pending_export(config.batch_size).await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "could not load export batch");
                return;
            }
        };
        if pending.is_empty() {
            return;
        }
        debug!(count = pending.len(), "pushing completed tasks to external list");

        for task in pending {
            let push = retry_with_config(&config.retry, "todo_export", || {
                gateway.push_task(&task)
            })
            .await;

            match push {
                Ok(()) => {
                    if let Err(err) = tasks.mark_pushed(&task.user_id, &task.id).await {
                        error!(task_id = %task.id, error = %err, "push succeeded but latch failed");
                    }
                }
                Err(err) => {
                    // Abandoned for this cycle; the next scan retries it
                    warn!(task_id = %task.id, error = %err, "export push failed");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, Ordering};

    use async_trait::async_trait;
    use taskbridge_common::resilience::BackoffStrategy;
    use taskbridge_core::testing::{sample_task, InMemoryTaskRepository};
    use taskbridge_domain::{Result as DomainResult, Task, TaskBridgeError};

    use super::*;

    /// Gateway failing the first `failures` pushes, then succeeding.
    struct FlakyGateway {
        failures: u32,
        calls: AtomicU32,
    }

    #[async_trait]
    impl TaskExportGateway for FlakyGateway {
        async fn push_task(&self, _task: &Task) -> DomainResult<()> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call < self.failures {
                Err(TaskBridgeError::Network("simulated outage".into()))
            } else {
                Ok(())
            }
        }
    }

    fn fast_retry(max_attempts: u32) -> RetryConfig {
        RetryConfig {
            max_attempts,
            backoff: BackoffStrategy::Fixed(Duration::from_millis(1)),
            jitter: false,
        }
    }

    fn completed_task(id: &str) -> Task {
        let mut task = sample_task(id, "u1");
        task.completed = true;
        task
    }

    #[tokio::test]
    async fn successful_push_latches_the_task() {
        let tasks = Arc::new(InMemoryTaskRepository::default());
        tasks.seed(vec![completed_task("t1")]);
        let gateway = Arc::new(FlakyGateway { failures: 0, calls: AtomicU32::new(0) });

        let config = ExportSchedulerConfig { retry: fast_retry(3), ..Default::default() };
        ExportScheduler::push_cycle(
            &(tasks.clone() as Arc<dyn TaskRepository>),
            &(gateway.clone() as Arc<dyn TaskExportGateway>),
            &config,
        )
        .await;

        let pending = tasks.pending_export(10).await.expect("pending query");
        assert!(pending.is_empty(), "latched task leaves the pending set");
    }

    #[tokio::test]
    async fn transient_failure_is_retried_within_the_budget() {
        let tasks = Arc::new(InMemoryTaskRepository::default());
        tasks.seed(vec![completed_task("t1")]);
        let gateway = Arc::new(FlakyGateway { failures: 2, calls: AtomicU32::new(0) });

        let config = ExportSchedulerConfig { retry: fast_retry(3), ..Default::default() };
        ExportScheduler::push_cycle(
            &(tasks.clone() as Arc<dyn TaskRepository>),
            &(gateway.clone() as Arc<dyn TaskExportGateway>),
            &config,
        )
        .await;

        assert_eq!(gateway.calls.load(Ordering::SeqCst), 3);
        assert!(tasks.pending_export(10).await.expect("pending query").is_empty());
    }

    #[tokio::test]
    async fn exhausted_budget_leaves_the_task_for_the_next_cycle() {
        let tasks = Arc::new(InMemoryTaskRepository::default());
        tasks.seed(vec![completed_task("t1")]);
        let gateway = Arc::new(FlakyGateway { failures: 100, calls: AtomicU32::new(0) });

        let config = ExportSchedulerConfig { retry: fast_retry(2), ..Default::default() };
        ExportScheduler::push_cycle(
            &(tasks.clone() as Arc<dyn TaskRepository>),
            &(gateway.clone() as Arc<dyn TaskExportGateway>),
            &config,
        )
        .await;

        let pending = tasks.pending_export(10).await.expect("pending query");
        assert_eq!(pending.len(), 1, "unlatched task stays pending for retry");
    }
}
