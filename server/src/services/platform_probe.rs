//! Startup reachability check against the platform's auth health endpoint.

#[cfg(test)]
#[path = "platform_probe_test.rs"]
mod tests;

use std::time::Duration;

use markbook_client::net::types::PublicConfig;

const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("platform unreachable: {0}")]
    Unreachable(String),
    #[error("platform health returned {status}: {body}")]
    Status { status: u16, body: String },
}

/// `GET <base>/auth/v1/health`.
pub fn health_url(base_url: &str) -> String {
    format!("{}/auth/v1/health", base_url.trim_end_matches('/'))
}

/// Ask the platform whether its auth service is up.
pub async fn probe(config: &PublicConfig) -> Result<(), ProbeError> {
    let client = reqwest::Client::builder()
        .timeout(PROBE_TIMEOUT)
        .build()
        .map_err(|e| ProbeError::Unreachable(e.to_string()))?;
    let resp = client
        .get(health_url(&config.supabase_url))
        .header("apikey", &config.supabase_anon_key)
        .send()
        .await
        .map_err(|e| ProbeError::Unreachable(e.to_string()))?;

    if !resp.status().is_success() {
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        return Err(ProbeError::Status { status, body });
    }
    Ok(())
}
