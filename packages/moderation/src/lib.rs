#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Moderation pipeline: accept or reject pending crowd reports.
//!
//! Accept is a two-phase move across the pending and canonical stores:
//! derive the marker, insert it with the source report id as the
//! idempotency key, and only after a confirmed insert delete the pending
//! report. The insert is never blindly retried; the delete is idempotent
//! and retried with backoff. A pending report can be the source of at most
//! one marker.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use incident_map_incident_models::{CrimeMarker, NewCrimeMarker, PendingReport};
use serde::Deserialize;

/// Number of delete retries after a confirmed promotion insert.
///
/// With the doubling backoff (100ms, 200ms, 400ms) a transient storage
/// blip gets ~700ms to clear before the pipeline gives up and surfaces
/// the orphaned pending report as an error.
const MAX_DELETE_RETRIES: u32 = 3;

/// Base delay before the first delete retry.
const DELETE_RETRY_BASE_DELAY: Duration = Duration::from_millis(100);

/// A storage operation failed in a transient, retryable way.
#[derive(Debug, Clone, thiserror::Error)]
#[error("storage error: {message}")]
pub struct StoreError {
    /// Description of what went wrong.
    pub message: String,
}

/// Errors produced by the moderation pipeline.
#[derive(Debug, thiserror::Error)]
pub enum ModerationError {
    /// The referenced pending report does not exist, either because it
    /// never did or because a racing accept/reject already consumed it.
    #[error("pending report {id} not found")]
    NotFound {
        /// The missing pending report id.
        id: i64,
    },

    /// A storage operation failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
}

/// Read and consume operations over the pending report collection.
#[async_trait]
pub trait PendingReportStore: Send + Sync {
    /// Finds a pending report by id.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage operation fails.
    async fn find_by_id(&self, id: i64) -> Result<Option<PendingReport>, StoreError>;

    /// Deletes a pending report by id, reporting whether a record matched.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage operation fails.
    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError>;
}

/// Insert operations over the canonical marker collection.
#[async_trait]
pub trait MarkerStore: Send + Sync {
    /// Inserts a marker derived from a pending report.
    ///
    /// The marker's `source_report_id` is the idempotency key: if a marker
    /// promoted from the same report already exists, nothing is inserted
    /// and `None` is returned.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the storage operation fails.
    async fn insert_promoted(
        &self,
        marker: &NewCrimeMarker,
    ) -> Result<Option<CrimeMarker>, StoreError>;
}

/// Moderator-supplied field overrides for an accept decision.
///
/// A `None` field keeps the value the reporter submitted.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AcceptOverrides {
    /// Authoritative case number.
    pub case_number: Option<String>,
    /// Authoritative legal act / section reference.
    pub act: Option<String>,
    /// Authoritative primary classification.
    pub primary_type: Option<String>,
}

/// Orchestrates the pending-report lifecycle against injected stores.
pub struct ModerationPipeline {
    pending: Arc<dyn PendingReportStore>,
    markers: Arc<dyn MarkerStore>,
}

impl ModerationPipeline {
    /// Creates a pipeline over the given stores.
    #[must_use]
    pub fn new(pending: Arc<dyn PendingReportStore>, markers: Arc<dyn MarkerStore>) -> Self {
        Self { pending, markers }
    }

    /// Promotes a pending report into a canonical marker.
    ///
    /// Reads the report, derives the marker (overrides win over reporter
    /// values, the description gains the contact address), inserts it, and
    /// deletes the consumed report. The insert runs exactly once; only the
    /// trailing delete is retried.
    ///
    /// # Errors
    ///
    /// Returns [`ModerationError::NotFound`] if the report does not exist
    /// or was already consumed by a racing accept, or
    /// [`ModerationError::Storage`] if storage fails, including a delete
    /// that still fails after the insert was confirmed.
    pub async fn accept(
        &self,
        id: i64,
        overrides: &AcceptOverrides,
    ) -> Result<CrimeMarker, ModerationError> {
        let Some(report) = self.pending.find_by_id(id).await? else {
            return Err(ModerationError::NotFound { id });
        };

        let marker = derive_marker(&report, overrides);

        let Some(created) = self.markers.insert_promoted(&marker).await? else {
            // Lost the race: another accept already promoted this report.
            log::warn!("pending report {id} was already promoted");
            return Err(ModerationError::NotFound { id });
        };

        self.delete_consumed(id).await?;

        Ok(created)
    }

    /// Rejects a pending report, removing it without promotion.
    ///
    /// # Errors
    ///
    /// Returns [`ModerationError::NotFound`] if no pending report matched
    /// (including one already consumed), or [`ModerationError::Storage`]
    /// if the delete fails.
    pub async fn reject(&self, id: i64) -> Result<(), ModerationError> {
        if self.pending.delete_by_id(id).await? {
            Ok(())
        } else {
            Err(ModerationError::NotFound { id })
        }
    }

    /// Deletes the consumed pending report, retrying transient failures.
    ///
    /// The marker insert is already confirmed at this point, so giving up
    /// would leave an accepted report in the pending store; a no-match
    /// delete is fine (a racer removed it first).
    async fn delete_consumed(&self, id: i64) -> Result<(), ModerationError> {
        let mut last_error = None;

        for attempt in 0..=MAX_DELETE_RETRIES {
            if attempt > 0 {
                let delay = DELETE_RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                log::warn!(
                    "retrying delete of consumed pending report {id} \
                     ({attempt}/{MAX_DELETE_RETRIES}) in {delay:?}"
                );
                tokio::time::sleep(delay).await;
            }

            match self.pending.delete_by_id(id).await {
                Ok(_) => return Ok(()),
                Err(e) => last_error = Some(e),
            }
        }

        let error = last_error.unwrap_or_else(|| StoreError {
            message: "delete failed after all retries".to_string(),
        });
        log::error!("pending report {id} was promoted but could not be deleted: {error}");
        Err(ModerationError::Storage(error))
    }
}

/// Derives the canonical marker for a pending report, applying moderator
/// overrides and folding the reporter's contact address into the
/// description.
fn derive_marker(report: &PendingReport, overrides: &AcceptOverrides) -> NewCrimeMarker {
    NewCrimeMarker {
        case_number: overrides
            .case_number
            .clone()
            .unwrap_or_else(|| report.case_number.clone()),
        lat: report.lat,
        lng: report.lng,
        time: report.time,
        date: report.date,
        primary_type: overrides
            .primary_type
            .clone()
            .unwrap_or_else(|| report.primary_type.clone()),
        description: format!("{} (contact address: {})", report.description, report.address),
        act: overrides.act.clone().unwrap_or_else(|| report.act.clone()),
        station_id: report.station_id,
        source_report_id: Some(report.id),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    use super::*;

    /// In-memory pending store. `stale_reads` makes `find_by_id` keep
    /// returning a report after deletion, simulating the window where two
    /// accepts both read the same report before either consumes it.
    /// `failing_deletes` makes that many delete calls fail first.
    #[derive(Default)]
    struct MemPendingStore {
        reports: Mutex<BTreeMap<i64, PendingReport>>,
        stale_reads: bool,
        failing_deletes: AtomicU32,
        delete_calls: AtomicU32,
    }

    impl MemPendingStore {
        fn with_report(report: PendingReport) -> Self {
            let store = Self::default();
            store.reports.lock().unwrap().insert(report.id, report);
            store
        }
    }

    #[async_trait]
    impl PendingReportStore for MemPendingStore {
        async fn find_by_id(&self, id: i64) -> Result<Option<PendingReport>, StoreError> {
            if self.stale_reads {
                return Ok(Some(sample_report(id)));
            }
            Ok(self.reports.lock().unwrap().get(&id).cloned())
        }

        async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            if self
                .failing_deletes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
            {
                return Err(StoreError {
                    message: "connection reset".to_string(),
                });
            }
            Ok(self.reports.lock().unwrap().remove(&id).is_some())
        }
    }

    #[derive(Default)]
    struct MemMarkerStore {
        markers: Mutex<Vec<CrimeMarker>>,
    }

    #[async_trait]
    impl MarkerStore for MemMarkerStore {
        async fn insert_promoted(
            &self,
            marker: &NewCrimeMarker,
        ) -> Result<Option<CrimeMarker>, StoreError> {
            let mut markers = self.markers.lock().unwrap();
            if markers
                .iter()
                .any(|m| m.source_report_id == marker.source_report_id)
            {
                return Ok(None);
            }
            let id = i64::try_from(markers.len()).unwrap() + 1;
            let created = CrimeMarker {
                id,
                case_number: marker.case_number.clone(),
                lat: marker.lat,
                lng: marker.lng,
                time: marker.time,
                date: marker.date,
                primary_type: marker.primary_type.clone(),
                description: marker.description.clone(),
                act: marker.act.clone(),
                station_id: marker.station_id,
                source_report_id: marker.source_report_id,
            };
            markers.push(created.clone());
            Ok(Some(created))
        }
    }

    fn sample_report(id: i64) -> PendingReport {
        PendingReport {
            id,
            first_name: "Asha".to_string(),
            last_name: "Verma".to_string(),
            phone: "+91-98100-12345".to_string(),
            address: "14 Rajpur Road".to_string(),
            description: "Reported by Asha Verma (+91-98100-12345): phone snatching".to_string(),
            photo: "uploads/report-831.jpg".to_string(),
            verified: false,
            lat: 28.6519,
            lng: 77.2315,
            time: 2140,
            date: 1_628_985_600,
            station_id: 7,
            case_number: "FIR-2021-0831".to_string(),
            act: "IPC 379".to_string(),
            primary_type: "THEFT".to_string(),
        }
    }

    fn pipeline(
        pending: Arc<MemPendingStore>,
        markers: Arc<MemMarkerStore>,
    ) -> ModerationPipeline {
        ModerationPipeline::new(pending, markers)
    }

    #[tokio::test]
    async fn accept_promotes_and_removes_the_report() {
        let pending = Arc::new(MemPendingStore::with_report(sample_report(1)));
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending.clone(), markers.clone());

        let marker = pipeline.accept(1, &AcceptOverrides::default()).await.unwrap();

        assert_eq!(marker.time, 2140);
        assert_eq!(marker.date, 1_628_985_600);
        assert_eq!(marker.source_report_id, Some(1));
        assert!(pending.reports.lock().unwrap().is_empty());
        assert_eq!(markers.markers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn accept_applies_overrides_and_keeps_reporter_values_otherwise() {
        let pending = Arc::new(MemPendingStore::with_report(sample_report(1)));
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers);

        let overrides = AcceptOverrides {
            case_number: Some("FIR-2021-0950".to_string()),
            act: None,
            primary_type: Some("ROBBERY".to_string()),
        };
        let marker = pipeline.accept(1, &overrides).await.unwrap();

        assert_eq!(marker.case_number, "FIR-2021-0950");
        assert_eq!(marker.primary_type, "ROBBERY");
        assert_eq!(marker.act, "IPC 379");
    }

    #[tokio::test]
    async fn accept_description_carries_reporter_identity_and_address() {
        let pending = Arc::new(MemPendingStore::with_report(sample_report(1)));
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers);

        let marker = pipeline.accept(1, &AcceptOverrides::default()).await.unwrap();

        assert!(marker.description.contains("Asha Verma"));
        assert!(marker.description.contains("+91-98100-12345"));
        assert!(marker.description.contains("14 Rajpur Road"));
        assert!(marker.description.contains("phone snatching"));
    }

    #[tokio::test]
    async fn accept_of_missing_report_is_not_found() {
        let pending = Arc::new(MemPendingStore::default());
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers);

        assert!(matches!(
            pipeline.accept(42, &AcceptOverrides::default()).await,
            Err(ModerationError::NotFound { id: 42 })
        ));
    }

    #[tokio::test]
    async fn racing_accepts_promote_exactly_once() {
        // Stale reads let both accepts get past the initial find; the
        // promotion insert's idempotency key decides the winner.
        let pending = Arc::new(MemPendingStore {
            reports: Mutex::new(BTreeMap::from([(1, sample_report(1))])),
            stale_reads: true,
            ..MemPendingStore::default()
        });
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers.clone());

        let first = pipeline.accept(1, &AcceptOverrides::default()).await;
        let second = pipeline.accept(1, &AcceptOverrides::default()).await;

        assert!(first.is_ok());
        assert!(matches!(second, Err(ModerationError::NotFound { id: 1 })));
        assert_eq!(markers.markers.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reject_removes_the_report() {
        let pending = Arc::new(MemPendingStore::with_report(sample_report(1)));
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending.clone(), markers);

        pipeline.reject(1).await.unwrap();
        assert!(pending.reports.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn second_reject_is_not_found() {
        let pending = Arc::new(MemPendingStore::with_report(sample_report(1)));
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers);

        pipeline.reject(1).await.unwrap();
        assert!(matches!(
            pipeline.reject(1).await,
            Err(ModerationError::NotFound { id: 1 })
        ));
    }

    #[tokio::test]
    async fn transient_delete_failure_is_retried_not_reinserted() {
        let pending = Arc::new(MemPendingStore {
            reports: Mutex::new(BTreeMap::from([(1, sample_report(1))])),
            failing_deletes: AtomicU32::new(2),
            ..MemPendingStore::default()
        });
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending.clone(), markers.clone());

        let marker = pipeline.accept(1, &AcceptOverrides::default()).await.unwrap();

        assert_eq!(marker.source_report_id, Some(1));
        assert_eq!(markers.markers.lock().unwrap().len(), 1);
        assert!(pending.reports.lock().unwrap().is_empty());
        assert_eq!(pending.delete_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn exhausted_delete_retries_surface_storage_error() {
        let pending = Arc::new(MemPendingStore {
            reports: Mutex::new(BTreeMap::from([(1, sample_report(1))])),
            failing_deletes: AtomicU32::new(u32::MAX),
            ..MemPendingStore::default()
        });
        let markers = Arc::new(MemMarkerStore::default());
        let pipeline = pipeline(pending, markers.clone());

        let result = pipeline.accept(1, &AcceptOverrides::default()).await;

        // The marker was created exactly once; the orphaned pending
        // report is surfaced instead of being silently dropped.
        assert!(matches!(result, Err(ModerationError::Storage(_))));
        assert_eq!(markers.markers.lock().unwrap().len(), 1);
    }
}
