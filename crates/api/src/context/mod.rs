//! Application context - dependency injection container.

use std::sync::Arc;
use std::time::Duration;

use taskbridge_core::cache::UserTaskCache;
use taskbridge_core::tasks::ports::{
    AuditLogRepository, ChangeNotifier, TaskRepository, UserRepository,
};
use taskbridge_core::{ApprovalService, IntentRouter, SchedulingService};
use taskbridge_domain::{Config, Result};
use taskbridge_infra::database::{
    DbManager, SqliteAuditLogRepository, SqliteQueueRepository, SqliteTaskRepository,
    SqliteUserRepository,
};
use taskbridge_infra::integrations::{
    ExchangeCalendarClient, MsTodoClient, TimetableClient, TimetableImporter,
};
use taskbridge_infra::notify::BroadcastNotifier;
use taskbridge_infra::scheduling::{
    ExportScheduler, ExportSchedulerConfig, OccurrenceScanner, OccurrenceScannerConfig,
};
use tokio::sync::Mutex;
use tracing::{info, warn};

/// Application context - holds all services and dependencies.
pub struct AppContext {
    pub config: Config,
    pub db: Arc<DbManager>,
    pub scheduler: Arc<SchedulingService>,
    pub approvals: Arc<ApprovalService>,
    pub intents: Arc<IntentRouter>,
    pub notifier: Arc<BroadcastNotifier>,
    pub users: Arc<dyn UserRepository>,
    pub logs: Arc<dyn AuditLogRepository>,
    pub importer: Option<Arc<TimetableImporter>>,
    background: Mutex<BackgroundJobs>,
}

struct BackgroundJobs {
    scanner: OccurrenceScanner,
    exporter: Option<ExportScheduler>,
}

impl AppContext {
    /// Wire the full stack from configuration: pool, migrations,
    /// repositories, cache, services, schedulers.
    pub async fn new(config: Config) -> Result<Self> {
        let db = Arc::new(DbManager::new(&config.database.path, config.database.pool_size)?);
        db.run_migrations()?;

        let pool = Arc::clone(db.pool());
        let tasks: Arc<dyn TaskRepository> =
            Arc::new(SqliteTaskRepository::new(Arc::clone(&pool)));
        let users: Arc<dyn UserRepository> =
            Arc::new(SqliteUserRepository::new(Arc::clone(&pool)));
        let queue = Arc::new(SqliteQueueRepository::new(Arc::clone(&pool)));
        let logs: Arc<dyn AuditLogRepository> =
            Arc::new(SqliteAuditLogRepository::new(pool));

        let notifier = Arc::new(BroadcastNotifier::new());
        let cache = Arc::new(UserTaskCache::new(Arc::clone(&tasks)));

        let mut scheduler = SchedulingService::new(
            Arc::clone(&tasks),
            Arc::clone(&users),
            Arc::clone(&logs),
            Arc::clone(&cache),
            notifier.clone() as Arc<dyn ChangeNotifier>,
        );

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| taskbridge_domain::TaskBridgeError::Config(e.to_string()))?;

        let mut importer = None;
        let mut exporter = None;
        if config.sync.enabled {
            scheduler = scheduler.with_calendar(Arc::new(ExchangeCalendarClient::new(
                http.clone(),
                config.sync.calendar_api_base.clone(),
            )));
        }
        let scheduler = Arc::new(scheduler);
        if config.sync.enabled {
            importer = Some(Arc::new(TimetableImporter::new(
                TimetableClient::new(http.clone(), config.sync.timetable_api_base.clone()),
                Arc::clone(&scheduler),
            )));
            exporter = Some(ExportScheduler::new(
                Arc::clone(&tasks),
                Arc::new(MsTodoClient::new(http, config.sync.todo_api_base.clone())),
                ExportSchedulerConfig {
                    interval: Duration::from_secs(config.scheduler.export_interval_secs),
                    ..ExportSchedulerConfig::default()
                },
            ));
        }

        // Warm the per-user caches for everyone already on record
        for user in users.list_users().await? {
            let count = cache.load(&user.id).await?;
            info!(user_id = %user.id, tasks = count, "cache warmed");
        }

        let approvals = Arc::new(ApprovalService::new(
            queue,
            Arc::clone(&logs),
            notifier.clone() as Arc<dyn ChangeNotifier>,
            Arc::clone(&scheduler),
        ));
        let intents = Arc::new(IntentRouter::new(
            Arc::clone(&scheduler),
            Arc::clone(&approvals),
            Arc::clone(&logs),
            notifier.clone() as Arc<dyn ChangeNotifier>,
        ));

        let scanner = OccurrenceScanner::new(
            Arc::clone(&users),
            cache,
            notifier.clone() as Arc<dyn ChangeNotifier>,
            OccurrenceScannerConfig {
                interval: Duration::from_secs(config.scheduler.occurrence_scan_interval_secs),
                ..OccurrenceScannerConfig::default()
            },
        );

        Ok(Self {
            config,
            db,
            scheduler,
            approvals,
            intents,
            notifier,
            users,
            logs,
            importer,
            background: Mutex::new(BackgroundJobs { scanner, exporter }),
        })
    }

    /// Start the background schedulers.
    pub async fn start_background(&self) -> Result<()> {
        let mut jobs = self.background.lock().await;
        if let Err(err) = jobs.scanner.start().await {
            warn!(error = %err, "occurrence scanner did not start");
        }
        if let Some(exporter) = jobs.exporter.as_mut() {
            if let Err(err) = exporter.start().await {
                warn!(error = %err, "export scheduler did not start");
            }
        }
        Ok(())
    }

    /// Stop the background schedulers gracefully.
    pub async fn shutdown(&self) {
        let mut jobs = self.background.lock().await;
        if jobs.scanner.is_running() {
            if let Err(err) = jobs.scanner.stop().await {
                warn!(error = %err, "occurrence scanner did not stop cleanly");
            }
        }
        if let Some(exporter) = jobs.exporter.as_mut() {
            if exporter.is_running() {
                if let Err(err) = exporter.stop().await {
                    warn!(error = %err, "export scheduler did not stop cleanly");
                }
            }
        }
        info!("background schedulers stopped");
    }
}
