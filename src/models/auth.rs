//! Authentication models.

use secrecy::SecretString;
use serde::{Deserialize, Deserializer, Serialize};
use utoipa::ToSchema;

/// Session credential and Jenkins location supplied by the user.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AuthenticationConfig {
    /// Value of the Jenkins `JSESSIONID` cookie, or a full `name=value` cookie pair
    #[schema(value_type = String)]
    #[serde(deserialize_with = "deserialize_secret")]
    pub jsession_id: SecretString,
    pub jenkins_base_url: String,
}

/// Wrap the raw value immediately so it is never held as a plain `String`.
fn deserialize_secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<SecretString, D::Error> {
    String::deserialize(deserializer).map(SecretString::from)
}

/// Connection as shown to clients. Never includes the credential.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionInfo {
    pub jenkins_base_url: String,
    pub has_session: bool,
}

/// Result of a connectivity probe.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProbeResponse {
    pub connected: bool,
    pub jenkins_base_url: String,
    /// Top-level job names visible with the current session
    pub jobs: Vec<String>,
}
