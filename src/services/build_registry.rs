//! Build registry: the ordered list of tracked builds, persisted as JSON.
//!
//! Every mutation bumps a version number. A refresh remembers the version it
//! started from; if the list changed meanwhile, the refresh is stale.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::{BuildConfig, BuildIdentity, NewBuildConfig};
use crate::services::batch::validate_configs;
use crate::services::url_resolver;

/// Registry errors.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error(transparent)]
    Resolution(#[from] crate::error::ResolutionError),

    #[error("Build {0} is already configured")]
    Duplicate(BuildIdentity),

    #[error("Build {0} not found")]
    NotFound(BuildIdentity),

    #[error("Failed to read or write build file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Build file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),
}

impl From<RegistryError> for AppError {
    fn from(err: RegistryError) -> Self {
        match err {
            RegistryError::Resolution(e) => e.into(),
            RegistryError::Duplicate(_) => AppError::Conflict(err.to_string()),
            RegistryError::NotFound(id) => AppError::NotFound(format!("Build {}", id)),
            RegistryError::Io(_) | RegistryError::Format(_) => AppError::Storage(err.to_string()),
        }
    }
}

/// Snapshot of the build list at one version.
#[derive(Debug, Clone)]
pub struct BuildListSnapshot {
    pub version: u64,
    pub builds: Vec<Arc<BuildConfig>>,
}

struct RegistryState {
    version: u64,
    builds: Vec<Arc<BuildConfig>>,
}

/// Ordered, versioned list of tracked builds.
pub struct BuildRegistry {
    path: Option<PathBuf>,
    state: RwLock<RegistryState>,
}

impl BuildRegistry {
    /// In-memory registry, not persisted.
    pub fn in_memory(builds: Vec<BuildConfig>) -> Self {
        Self {
            path: None,
            state: RwLock::new(RegistryState {
                version: 0,
                builds: builds.into_iter().map(Arc::new).collect(),
            }),
        }
    }

    /// Load the registry from `path`. A missing file is an empty list.
    ///
    /// Later entries naming an already listed build are dropped.
    pub async fn load(path: impl Into<PathBuf>) -> Result<Self, RegistryError> {
        let path = path.into();
        let stored: Vec<BuildConfig> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No build file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(e.into()),
        };

        let mut seen = HashSet::with_capacity(stored.len());
        let mut builds = Vec::with_capacity(stored.len());
        for build in stored {
            if !seen.insert(build.identity()) {
                warn!(
                    "Build file lists {} more than once; keeping the first entry",
                    build.identity()
                );
                continue;
            }
            builds.push(build);
        }

        for build in &builds {
            match url_resolver::resolve(&build.build_url) {
                Ok(id) if id != build.identity() => warn!(
                    "Build '{}' caches {} but its URL resolves to {}",
                    build.name,
                    build.identity(),
                    id
                ),
                Ok(_) => {}
                Err(e) => warn!("Build '{}' has an unusable URL: {}", build.name, e),
            }
        }

        info!("Loaded {} builds from {}", builds.len(), path.display());
        Ok(Self {
            path: Some(path),
            state: RwLock::new(RegistryState {
                version: 0,
                builds: builds.into_iter().map(Arc::new).collect(),
            }),
        })
    }

    /// Current list and version.
    pub async fn snapshot(&self) -> BuildListSnapshot {
        let state = self.state.read().await;
        BuildListSnapshot {
            version: state.version,
            builds: state.builds.clone(),
        }
    }

    pub async fn version(&self) -> u64 {
        self.state.read().await.version
    }

    /// Track a new build. Its URL must resolve and must not already be tracked.
    pub async fn add(&self, request: NewBuildConfig) -> Result<Arc<BuildConfig>, RegistryError> {
        let identity = url_resolver::resolve(&request.build_url)?;
        let config = Arc::new(BuildConfig::from_request(request, identity));

        let mut state = self.state.write().await;
        if state.builds.iter().any(|b| b.identity() == config.identity()) {
            return Err(RegistryError::Duplicate(config.identity()));
        }

        let mut builds = state.builds.clone();
        builds.push(Arc::clone(&config));
        self.persist(&builds).await?;

        state.builds = builds;
        state.version += 1;
        info!("Added build {} (version {})", config.identity(), state.version);
        Ok(config)
    }

    /// Stop tracking a build.
    pub async fn remove(&self, identity: &BuildIdentity) -> Result<(), RegistryError> {
        let mut state = self.state.write().await;
        let builds: Vec<_> = state
            .builds
            .iter()
            .filter(|b| !b.identity().matches(identity))
            .cloned()
            .collect();
        if builds.len() == state.builds.len() {
            return Err(RegistryError::NotFound(identity.clone()));
        }

        self.persist(&builds).await?;
        state.builds = builds;
        state.version += 1;
        info!("Removed build {} (version {})", identity, state.version);
        Ok(())
    }

    /// Replace the whole list. All URLs must resolve and be distinct.
    pub async fn replace_all(
        &self,
        requests: Vec<NewBuildConfig>,
    ) -> Result<BuildListSnapshot, RegistryError> {
        let mut builds = Vec::with_capacity(requests.len());
        for request in requests {
            let identity = url_resolver::resolve(&request.build_url)?;
            builds.push(Arc::new(BuildConfig::from_request(request, identity)));
        }
        if let Err(crate::error::AggregationError::DuplicateBuild(id)) = validate_configs(&builds)
        {
            return Err(RegistryError::Duplicate(id));
        }

        let mut state = self.state.write().await;
        self.persist(&builds).await?;
        state.builds = builds;
        state.version += 1;
        info!(
            "Replaced build list with {} builds (version {})",
            state.builds.len(),
            state.version
        );
        Ok(BuildListSnapshot {
            version: state.version,
            builds: state.builds.clone(),
        })
    }

    /// Write the list to disk: temp file, then rename over the old one.
    async fn persist(&self, builds: &[Arc<BuildConfig>]) -> Result<(), RegistryError> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };

        let json = serde_json::to_vec_pretty(builds)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = tmp_path(path);
        tokio::fs::write(&tmp, json).await?;
        tokio::fs::rename(&tmp, path).await?;
        Ok(())
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
