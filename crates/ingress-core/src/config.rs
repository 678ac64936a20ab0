//! Exporter configuration.
//!
//! Loaded once at startup: built-in defaults, then an optional TOML file,
//! then the `KUBE_CONFIG` / `CONTEXT` / `HTTP_PROXY` environment variables.
//! CLI overrides are applied by the daemon on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable naming the kubeconfig file.
pub const ENV_KUBE_CONFIG: &str = "KUBE_CONFIG";
/// Environment variable naming the kubeconfig context.
pub const ENV_CONTEXT: &str = "CONTEXT";
/// Environment variable carrying an HTTP proxy URL for cluster access.
pub const ENV_HTTP_PROXY: &str = "HTTP_PROXY";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    pub server: ServerConfig,
    pub kubectl: KubectlConfig,
    pub discovery: DiscoveryConfig,
    pub logs: LogsConfig,
    pub demo: DemoConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub port: u16,
}

/// How to reach the cluster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KubectlConfig {
    /// Executable used for discovery and log retrieval.
    pub program: String,
    pub kubeconfig: Option<PathBuf>,
    pub context: Option<String>,
    pub proxy: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoveryConfig {
    /// Service label key identifying ingress controller services.
    pub label_key: String,
    pub label_value: String,
    pub timeout_secs: u64,
    /// Scrape every pod behind a service instead of only the first.
    pub all_pods: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogsConfig {
    /// Upper bound on retrieving and parsing one pod's logs.
    pub timeout_secs: u64,
    pub tail_lines: Option<u64>,
    pub container: Option<String>,
}

/// The synthetic workload feeding `request_processing_seconds`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    pub enabled: bool,
}

// --- Default implementations ---

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for KubectlConfig {
    fn default() -> Self {
        Self {
            program: "kubectl".to_string(),
            kubeconfig: None,
            context: None,
            proxy: None,
        }
    }
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            label_key: "service-type".to_string(),
            label_value: "ingress-controller-service".to_string(),
            timeout_secs: 10,
            all_pods: false,
        }
    }
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            tail_lines: None,
            container: None,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self { enabled: true }
    }
}

impl DiscoveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// `key=value` selector for ingress controller services.
    pub fn label_selector(&self) -> String {
        format!("{}={}", self.label_key, self.label_value)
    }
}

impl LogsConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl ExporterConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Overlay the environment, read through `lookup`.
    ///
    /// Empty values are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(path) = get(ENV_KUBE_CONFIG) {
            self.kubectl.kubeconfig = Some(PathBuf::from(path));
        }
        if let Some(context) = get(ENV_CONTEXT) {
            self.kubectl.context = Some(context);
        }
        if let Some(proxy) = get(ENV_HTTP_PROXY) {
            warn!(%proxy, "setting proxy for cluster access");
            self.kubectl.proxy = Some(proxy);
        }
    }

    /// Overlay the process environment.
    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.server.port == 0 {
            bail!("server.port must be non-zero");
        }
        if self.discovery.timeout_secs == 0 {
            bail!("discovery.timeout_secs must be greater than zero");
        }
        if self.logs.timeout_secs == 0 {
            bail!("logs.timeout_secs must be greater than zero");
        }
        if self.discovery.label_key.is_empty() || self.discovery.label_value.is_empty() {
            bail!("discovery.label_key and discovery.label_value must be set");
        }
        if self.kubectl.program.is_empty() {
            bail!("kubectl.program must be set");
        }
        Ok(())
    }
}
