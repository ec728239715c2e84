//! Maps Jenkins build URLs to a job name and build number.
//!
//! Convention: the first `job` path segment is followed by the job name and
//! then the build number, e.g. `http://jenkins/job/ui-tests/42/allure/`.

use reqwest::Url;

use crate::error::ResolutionError;
use crate::models::BuildIdentity;

/// Resolve a build URL into its identity.
pub fn resolve(build_url: &str) -> Result<BuildIdentity, ResolutionError> {
    let url = Url::parse(build_url.trim()).map_err(|e| ResolutionError::MalformedUrl {
        url: build_url.to_string(),
        reason: e.to_string(),
    })?;

    let unrecognized = || ResolutionError::UnrecognizedPattern(build_url.to_string());

    let segments: Vec<&str> = url.path_segments().ok_or_else(unrecognized)?.collect();
    let job_idx = segments
        .iter()
        .position(|s| *s == "job")
        .ok_or_else(unrecognized)?;

    let job_name = segments
        .get(job_idx + 1)
        .filter(|s| !s.is_empty())
        .ok_or_else(unrecognized)?;
    let build_number = segments
        .get(job_idx + 2)
        .filter(|s| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit()))
        .and_then(|s| s.parse::<u64>().ok())
        .ok_or_else(unrecognized)?;

    Ok(BuildIdentity::new(*job_name, build_number))
}
