//! Production implementations of the moderation store traits.
//!
//! [`DbStores`] adapts the relational queries to the storage seam the
//! moderation pipeline is injected with, mapping [`DbError`] into the
//! pipeline's transient [`StoreError`].

use std::sync::Arc;

use async_trait::async_trait;
use incident_map_incident_models::{CrimeMarker, NewCrimeMarker, PendingReport};
use incident_map_moderation::{MarkerStore, PendingReportStore, StoreError};
use switchy_database::Database;

use crate::{DbError, queries};

/// Store implementation backed by the shared database connection.
#[derive(Clone)]
pub struct DbStores {
    db: Arc<dyn Database>,
}

impl DbStores {
    /// Creates stores over the given connection.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }
}

fn store_err(e: DbError) -> StoreError {
    StoreError {
        message: e.to_string(),
    }
}

#[async_trait]
impl PendingReportStore for DbStores {
    async fn find_by_id(&self, id: i64) -> Result<Option<PendingReport>, StoreError> {
        queries::get_pending_report(self.db.as_ref(), id)
            .await
            .map_err(store_err)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, StoreError> {
        queries::delete_pending_report(self.db.as_ref(), id)
            .await
            .map_err(store_err)
    }
}

#[async_trait]
impl MarkerStore for DbStores {
    async fn insert_promoted(
        &self,
        marker: &NewCrimeMarker,
    ) -> Result<Option<CrimeMarker>, StoreError> {
        queries::insert_promoted_marker(self.db.as_ref(), marker)
            .await
            .map_err(store_err)
    }
}
