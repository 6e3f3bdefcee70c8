//! Local model endpoint detection
//!
//! DELIBERATE-level judgments may consult an external model. At boot the
//! kernel probes the well-known loopback endpoints and records the result
//! in `~/.cynic/llm-detection.json`; consultation is only attempted when a
//! probe succeeded. Without the `deliberate` feature the artifact simply
//! records `available: false`.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cynic_core::Result;

/// Probed loopback endpoints and the model servers they usually mean
#[cfg(feature = "deliberate")]
const PROBE_TARGETS: [(&str, &str); 3] = [
    ("ollama", "http://127.0.0.1:11434/api/tags"),
    ("lmstudio", "http://127.0.0.1:1234/v1/models"),
    ("llamacpp", "http://127.0.0.1:8080/v1/models"),
];

/// Per-target probe timeout; the whole pass fits the 8 s external budget
#[cfg(feature = "deliberate")]
const PROBE_TIMEOUT_MS: u64 = 2_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbedEndpoint {
    pub name: String,
    pub url: String,
    pub available: bool,
    pub latency_ms: Option<u64>,
}

/// The whole `llm-detection.json` artifact
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmDetection {
    pub probed_at: DateTime<Utc>,
    pub available: bool,
    pub endpoints: Vec<ProbedEndpoint>,
}

/// Probe local endpoints and write the detection artifact
pub async fn detect_and_write(path: &Path) -> Result<LlmDetection> {
    let detection = probe().await;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, serde_json::to_vec_pretty(&detection)?)?;
    std::fs::rename(&temp, path)?;
    info!(available = detection.available, "llm detection written");
    Ok(detection)
}

#[cfg(feature = "deliberate")]
async fn probe() -> LlmDetection {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_millis(PROBE_TIMEOUT_MS))
        .build();
    let mut endpoints = Vec::new();

    for (name, url) in PROBE_TARGETS {
        let started = std::time::Instant::now();
        let available = match &client {
            Ok(client) => client
                .get(url)
                .send()
                .await
                .map(|r| r.status().is_success())
                .unwrap_or(false),
            Err(_) => false,
        };
        endpoints.push(ProbedEndpoint {
            name: name.to_string(),
            url: url.to_string(),
            available,
            latency_ms: available.then(|| started.elapsed().as_millis() as u64),
        });
    }

    LlmDetection {
        probed_at: Utc::now(),
        available: endpoints.iter().any(|e| e.available),
        endpoints,
    }
}

#[cfg(not(feature = "deliberate"))]
async fn probe() -> LlmDetection {
    LlmDetection {
        probed_at: Utc::now(),
        available: false,
        endpoints: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_artifact_written_even_without_models() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("llm-detection.json");
        let detection = detect_and_write(&path).await.unwrap();
        assert!(path.exists());
        let raw = std::fs::read_to_string(&path).unwrap();
        let loaded: LlmDetection = serde_json::from_str(&raw).unwrap();
        assert_eq!(loaded.available, detection.available);
    }
}
