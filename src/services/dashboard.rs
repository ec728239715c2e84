//! Dashboard service: owns the current connection, runs refreshes, and keeps
//! the latest published snapshot.
//!
//! Each refresh snapshots the build list (with its version) and the
//! connection `Arc` before fanning out, so a re-authentication mid-flight
//! never leaks into a running batch. Starting a refresh aborts the one in
//! flight, and a finished refresh is published only if nothing newer started
//! and the build list did not change underneath it.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use futures_util::future::{AbortHandle, Abortable};
use tokio::sync::RwLock;
use tokio::time::interval;
use tracing::{error, info, warn};

use crate::error::{AggregationError, FetchError};
use crate::models::{ConnectionInfo, DashboardSnapshot, ReportRecord};
use crate::services::batch::{RetryPolicy, fetch_all};
use crate::services::build_registry::BuildRegistry;
use crate::services::jenkins_client::{JenkinsClient, JenkinsConnection};
use crate::services::metrics;
use crate::services::report_fetcher::{ReportFetcher, ReportSource};

/// Produces Jenkins-facing components bound to a connection snapshot.
#[async_trait]
pub trait JenkinsBackend: Send + Sync {
    fn report_source(&self, connection: Arc<JenkinsConnection>) -> Box<dyn ReportSource>;

    /// Connectivity probe; returns visible job names.
    async fn probe(&self, connection: Arc<JenkinsConnection>) -> Result<Vec<String>, FetchError>;
}

/// Backend talking to a real Jenkins over HTTP.
#[derive(Clone)]
pub struct HttpJenkinsBackend {
    http_client: reqwest::Client,
    request_timeout: Duration,
}

impl HttpJenkinsBackend {
    pub fn new(http_client: reqwest::Client, request_timeout: Duration) -> Self {
        Self {
            http_client,
            request_timeout,
        }
    }

    fn client(&self, connection: Arc<JenkinsConnection>) -> JenkinsClient {
        JenkinsClient::new(self.http_client.clone(), connection, self.request_timeout)
    }
}

#[async_trait]
impl JenkinsBackend for HttpJenkinsBackend {
    fn report_source(&self, connection: Arc<JenkinsConnection>) -> Box<dyn ReportSource> {
        Box::new(ReportFetcher::new(self.client(connection)))
    }

    async fn probe(&self, connection: Arc<JenkinsConnection>) -> Result<Vec<String>, FetchError> {
        self.client(connection).probe().await
    }
}

/// Build a snapshot and its derived views from a finished batch.
pub fn build_snapshot(
    generation: u64,
    config_version: u64,
    records: Vec<ReportRecord>,
) -> DashboardSnapshot {
    DashboardSnapshot {
        generation,
        config_version,
        completed_at: Utc::now(),
        trend: metrics::trend(&records),
        flaky_tests: metrics::flaky_tests(&records),
        environments: metrics::environment_rollup(&records),
        reauthenticate_required: DashboardSnapshot::requires_reauthentication(&records),
        records,
    }
}

/// Refresh coordinator.
pub struct DashboardService {
    registry: Arc<BuildRegistry>,
    backend: Arc<dyn JenkinsBackend>,
    retry: RetryPolicy,
    connection: RwLock<Arc<JenkinsConnection>>,
    generation: AtomicU64,
    in_flight: Mutex<Option<(u64, AbortHandle)>>,
    latest: RwLock<Option<Arc<DashboardSnapshot>>>,
}

impl DashboardService {
    pub fn new(
        registry: Arc<BuildRegistry>,
        backend: Arc<dyn JenkinsBackend>,
        connection: JenkinsConnection,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            registry,
            backend,
            retry,
            connection: RwLock::new(Arc::new(connection)),
            generation: AtomicU64::new(0),
            in_flight: Mutex::new(None),
            latest: RwLock::new(None),
        }
    }

    pub fn registry(&self) -> &Arc<BuildRegistry> {
        &self.registry
    }

    /// Current connection snapshot.
    pub async fn connection(&self) -> Arc<JenkinsConnection> {
        Arc::clone(&*self.connection.read().await)
    }

    pub async fn connection_info(&self) -> ConnectionInfo {
        let connection = self.connection().await;
        ConnectionInfo {
            jenkins_base_url: connection.base_url().to_string(),
            has_session: connection.has_session(),
        }
    }

    /// Replace the connection. Refreshes already running keep their snapshot.
    pub async fn update_connection(&self, connection: JenkinsConnection) {
        info!("Jenkins connection updated: {:?}", connection);
        *self.connection.write().await = Arc::new(connection);
    }

    /// Probe Jenkins with the current connection.
    pub async fn probe(&self) -> Result<Vec<String>, FetchError> {
        let connection = self.connection().await;
        self.backend.probe(connection).await
    }

    /// Last published snapshot, if any.
    pub async fn latest(&self) -> Option<Arc<DashboardSnapshot>> {
        self.latest.read().await.clone()
    }

    /// Latest snapshot if it matches the current build list, otherwise refresh.
    pub async fn current(&self) -> Result<Arc<DashboardSnapshot>, AggregationError> {
        if let Some(snapshot) = self.latest().await
            && snapshot.config_version == self.registry.version().await
        {
            return Ok(snapshot);
        }
        self.refresh().await
    }

    /// Run a full refresh and publish its snapshot.
    pub async fn refresh(&self) -> Result<Arc<DashboardSnapshot>, AggregationError> {
        let list = self.registry.snapshot().await;
        let source = self.backend.report_source(self.connection().await);

        // Numbering and handle install share one critical section, so a
        // refresh can only ever abort refreshes older than itself.
        let (abort_handle, registration) = AbortHandle::new_pair();
        let generation = {
            let mut in_flight = self.lock_in_flight();
            let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
            if let Some((previous, handle)) = in_flight.replace((generation, abort_handle)) {
                info!("Refresh {} supersedes in-flight refresh {}", generation, previous);
                handle.abort();
            }
            generation
        };

        let batch = Abortable::new(
            fetch_all(source.as_ref(), &list.builds, self.retry),
            registration,
        )
        .await;

        {
            let mut in_flight = self.lock_in_flight();
            if in_flight.as_ref().is_some_and(|(g, _)| *g == generation) {
                *in_flight = None;
            }
        }

        let records = match batch {
            Ok(result) => result?,
            Err(_aborted) => {
                info!("Refresh {} was aborted", generation);
                return Err(AggregationError::Superseded { generation });
            }
        };

        if self.generation.load(Ordering::SeqCst) != generation {
            info!("Discarding refresh {}: a newer refresh started", generation);
            return Err(AggregationError::Superseded { generation });
        }
        if self.registry.version().await != list.version {
            info!(
                "Discarding refresh {}: build list changed since version {}",
                generation, list.version
            );
            return Err(AggregationError::Superseded { generation });
        }

        let snapshot = Arc::new(build_snapshot(generation, list.version, records));

        let mut latest = self.latest.write().await;
        if latest.as_ref().is_some_and(|s| s.generation > generation) {
            return Err(AggregationError::Superseded { generation });
        }
        *latest = Some(Arc::clone(&snapshot));

        if snapshot.reauthenticate_required {
            warn!("Jenkins rejected the session during refresh {}", generation);
        }
        info!(
            "Published refresh {} ({} ok, {} error)",
            generation,
            snapshot.ok_count(),
            snapshot.error_count()
        );
        Ok(snapshot)
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, Option<(u64, AbortHandle)>> {
        // A poisoned lock only means another refresh panicked; the slot is still usable.
        self.in_flight
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Start the background refresh task.
///
/// Spawns a tokio task that refreshes the dashboard every `interval_secs`.
pub fn start_refresh_task(service: Arc<DashboardService>, interval_secs: u64) {
    tokio::spawn(async move {
        info!(
            "Starting refresh service (interval: {} seconds)",
            interval_secs
        );

        let mut ticker = interval(Duration::from_secs(interval_secs));

        loop {
            ticker.tick().await;

            match service.refresh().await {
                Ok(_) => {}
                Err(AggregationError::Superseded { generation }) => {
                    info!("Scheduled refresh {} superseded", generation)
                }
                Err(e) => error!("Refresh task error: {}", e),
            }
        }
    });
}
