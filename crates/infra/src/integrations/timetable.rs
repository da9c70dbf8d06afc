//! Timetable portal import.
//!
//! The portal adapter returns normalized events; the importer retracts the
//! previous timetable batch by id pattern and re-admits the fresh batch in
//! advisory mode, so a changed timetable never leaves orphaned entries and
//! overlaps with the user's own tasks surface as warnings instead of
//! dropping classes.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use taskbridge_core::tasks::service::{AdmissionMode, SchedulingService};
use taskbridge_domain::constants::TIMETABLE_ID_PREFIX;
use taskbridge_domain::Result;
use tracing::{info, instrument, warn};

use super::NormalizedEvent;
use crate::errors::to_domain;

/// Fetches a user's normalized timetable events from the portal adapter.
pub struct TimetableClient {
    http: reqwest::Client,
    base_url: String,
}

impl TimetableClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>) -> Self {
        Self { http, base_url: base_url.into() }
    }

    #[instrument(skip(self))]
    pub async fn fetch_events(&self, user_id: &str) -> Result<Vec<NormalizedEvent>> {
        let response = self
            .http
            .get(format!("{}/timetable/{user_id}", self.base_url))
            .send()
            .await
            .map_err(to_domain)?
            .error_for_status()
            .map_err(to_domain)?;

        response.json::<Vec<NormalizedEvent>>().await.map_err(to_domain)
    }
}

/// Result of one import run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub retracted: usize,
    pub imported: usize,
    pub conflicted: usize,
    pub failed: usize,
}

/// Retract-then-reimport of the whole timetable batch for one user.
pub struct TimetableImporter {
    client: TimetableClient,
    scheduler: Arc<SchedulingService>,
}

impl TimetableImporter {
    pub fn new(client: TimetableClient, scheduler: Arc<SchedulingService>) -> Self {
        Self { client, scheduler }
    }

    #[instrument(skip(self))]
    pub async fn import(&self, user_id: &str) -> Result<ImportSummary> {
        let events = self.client.fetch_events(user_id).await?;

        let retracted = self
            .scheduler
            .delete_by_pattern(user_id, &format!("{TIMETABLE_ID_PREFIX}%"))
            .await?;
        let mut summary = ImportSummary { retracted, ..ImportSummary::default() };

        for event in events {
            let forced_id = format!("{TIMETABLE_ID_PREFIX}{}", event.id);
            let draft = event.into_draft(Some(forced_id));

            match self.scheduler.admit(user_id, draft, AdmissionMode::Advisory).await {
                Ok(outcome) => {
                    summary.imported += 1;
                    if !outcome.conflicts.is_empty() {
                        summary.conflicted += 1;
                    }
                }
                Err(err) => {
                    // One bad event must not sink the rest of the batch
                    warn!(user_id, error = %err, "timetable event failed to admit");
                    summary.failed += 1;
                }
            }
        }

        info!(
            user_id,
            retracted = summary.retracted,
            imported = summary.imported,
            conflicted = summary.conflicted,
            failed = summary.failed,
            "timetable import finished"
        );
        Ok(summary)
    }
}
