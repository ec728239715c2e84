//! Build configuration models: which Jenkins builds the dashboard tracks.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Environment key used when a build declares none.
pub const DEFAULT_ENVIRONMENT: &str = "default";

/// Resolved identity of a Jenkins build.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildIdentity {
    /// Job path segment, verbatim from the build URL
    pub job_name: String,
    pub build_number: u64,
}

impl BuildIdentity {
    pub fn new(job_name: impl Into<String>, build_number: u64) -> Self {
        BuildIdentity {
            job_name: job_name.into(),
            build_number,
        }
    }

    /// `{base}/job/{job}/{n}` with any trailing slash on `base` removed.
    pub fn build_path(&self, base_url: &str) -> String {
        format!(
            "{}/job/{}/{}",
            base_url.trim_end_matches('/'),
            self.job_name,
            self.build_number
        )
    }

    /// Job name with percent-encoding removed, for display only.
    pub fn display_job_name(&self) -> String {
        urlencoding::decode(&self.job_name)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| self.job_name.clone())
    }

    /// Same build, comparing job names after percent-decoding.
    ///
    /// Route parameters arrive decoded while stored names keep the URL's
    /// encoding, so `UI%20Tests` and `UI Tests` name the same job.
    pub fn matches(&self, other: &BuildIdentity) -> bool {
        self.build_number == other.build_number
            && (self.job_name == other.job_name
                || self.display_job_name() == other.display_job_name())
    }
}

impl std::fmt::Display for BuildIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}#{}", self.job_name, self.build_number)
    }
}

/// Display links derived from a build identity. Never fetched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildLinks {
    /// Allure HTML report
    pub report: String,
    /// Console log
    pub console: String,
    /// Build workspace
    pub workspace: String,
}

impl BuildLinks {
    pub fn derive(identity: &BuildIdentity, base_url: &str) -> Self {
        let build = identity.build_path(base_url);
        BuildLinks {
            report: format!("{}/allure/", build),
            console: format!("{}/console", build),
            workspace: format!("{}/ws/", build),
        }
    }
}

/// A user-declared pointer to one Jenkins build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BuildConfig {
    /// Display label
    pub name: String,
    /// Canonical build URL; the source of truth for identity
    pub build_url: String,
    /// Cached from `build_url` when the config was created
    pub job_name: String,
    /// Cached from `build_url` when the config was created
    pub build_number: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub tags: BTreeSet<String>,
}

impl BuildConfig {
    /// Build a config from a request and the identity resolved from its URL.
    pub fn from_request(request: NewBuildConfig, identity: BuildIdentity) -> Self {
        let name = request
            .name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| {
                format!(
                    "{} #{}",
                    identity.display_job_name(),
                    identity.build_number
                )
            });

        BuildConfig {
            name,
            build_url: request.build_url,
            job_name: identity.job_name,
            build_number: identity.build_number,
            description: request.description.filter(|d| !d.trim().is_empty()),
            environment: request
                .environment
                .map(|e| e.trim().to_string())
                .filter(|e| !e.is_empty()),
            tags: request
                .tags
                .into_iter()
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .collect(),
        }
    }

    /// Cached identity of this build.
    pub fn identity(&self) -> BuildIdentity {
        BuildIdentity::new(self.job_name.clone(), self.build_number)
    }

    /// Grouping key, `"default"` when unset.
    pub fn environment_key(&self) -> &str {
        self.environment.as_deref().unwrap_or(DEFAULT_ENVIRONMENT)
    }
}

/// Request to track a new build.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NewBuildConfig {
    /// Display label; defaults to `"<job> #<number>"`
    #[serde(default)]
    pub name: Option<String>,
    pub build_url: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub environment: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl NewBuildConfig {
    pub fn from_url(build_url: impl Into<String>) -> Self {
        NewBuildConfig {
            name: None,
            build_url: build_url.into(),
            description: None,
            environment: None,
            tags: Vec::new(),
        }
    }
}
