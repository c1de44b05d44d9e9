use super::extractor::Extractor;
use crate::config::ExtractionConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::process::Output;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

pub struct YtDlpExtractor {
    binary: String,
    timeout: Option<Duration>,
}

impl YtDlpExtractor {
    pub fn new(binary: impl Into<String>, timeout: Option<Duration>) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn from_config(config: &ExtractionConfig) -> Self {
        Self::new(config.binary.clone(), config.timeout())
    }

    async fn run(&self, url: &str) -> Result<Output> {
        let mut command = Command::new(&self.binary);
        command
            .arg("--dump-single-json")
            .arg("--no-download")
            .arg("--no-playlist")
            .arg("--quiet")
            .arg("--no-warnings")
            .arg("--")
            .arg(url)
            .kill_on_drop(true);

        let output = match self.timeout {
            Some(timeout) => tokio::time::timeout(timeout, command.output())
                .await
                .context("Media metadata extraction timed out")?,
            None => command.output().await,
        };

        output.with_context(|| format!("Failed to run {}", self.binary))
    }
}

#[async_trait]
impl Extractor for YtDlpExtractor {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn extract_info(&self, url: &str) -> Result<Value> {
        debug!("Extracting metadata with yt-dlp for: {}", url);

        let output = self.run(url).await?;

        if !output.status.success() {
            let error = String::from_utf8_lossy(&output.stderr);
            let error = error.trim();
            if error.is_empty() {
                return Err(anyhow::anyhow!(
                    "{} exited with {}",
                    self.binary,
                    output.status
                ));
            }
            return Err(anyhow::anyhow!("{}", error));
        }

        let json_str = String::from_utf8_lossy(&output.stdout);
        debug!("yt-dlp returned {} bytes of JSON", json_str.len());

        serde_json::from_str(&json_str).context("Failed to parse media metadata")
    }

    async fn test_availability(&self) -> bool {
        match Command::new(&self.binary).arg("--version").output().await {
            Ok(output) => {
                if output.status.success() {
                    let version = String::from_utf8_lossy(&output.stdout);
                    info!("✅ yt-dlp is available, version: {}", version.trim());
                    true
                } else {
                    warn!("❌ yt-dlp command failed");
                    false
                }
            }
            Err(e) => {
                warn!("❌ yt-dlp not found at {}: {}", self.binary, e);
                false
            }
        }
    }
}
