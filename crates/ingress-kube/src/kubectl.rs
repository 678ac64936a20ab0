//! Shared `kubectl` invocation.

use std::ffi::OsStr;
use std::path::PathBuf;
use std::process::Stdio;

use serde::de::DeserializeOwned;
use tokio::process::Command;
use tracing::debug;

use ingress_core::config::KubectlConfig;
use ingress_core::DiscoveryError;

/// How to run `kubectl` against the configured cluster.
#[derive(Debug, Clone)]
pub struct Kubectl {
    program: String,
    kubeconfig: Option<PathBuf>,
    context: Option<String>,
    proxy: Option<String>,
}

impl Kubectl {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            kubeconfig: None,
            context: None,
            proxy: None,
        }
    }

    pub fn from_config(config: &KubectlConfig) -> Self {
        Self {
            program: config.program.clone(),
            kubeconfig: config.kubeconfig.clone(),
            context: config.context.clone(),
            proxy: config.proxy.clone(),
        }
    }

    pub fn with_kubeconfig(mut self, path: impl Into<PathBuf>) -> Self {
        self.kubeconfig = Some(path.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Build a command: cluster flags first, then `args`.
    ///
    /// The child is killed when its handle is dropped.
    pub fn command<I, S>(&self, args: I) -> Command
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut cmd = Command::new(&self.program);
        if let Some(path) = &self.kubeconfig {
            cmd.arg("--kubeconfig").arg(path);
        }
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        if let Some(proxy) = &self.proxy {
            cmd.env("HTTP_PROXY", proxy).env("HTTPS_PROXY", proxy);
        }
        cmd.stdin(Stdio::null()).kill_on_drop(true);
        cmd
    }

    /// Run a read-only query and decode its JSON output.
    pub async fn get_json<T: DeserializeOwned>(&self, args: &[&str]) -> Result<T, DiscoveryError> {
        debug!(program = %self.program, ?args, "running kubectl query");

        let output = self
            .command(args)
            .output()
            .await
            .map_err(|source| DiscoveryError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(classify_failure(output.status.to_string(), stderr));
        }

        serde_json::from_slice(&output.stdout).map_err(|e| DiscoveryError::Decode(e.to_string()))
    }
}

/// Map a failed `kubectl` run to the matching discovery error.
pub fn classify_failure(status: String, stderr: String) -> DiscoveryError {
    let lower = stderr.to_lowercase();
    const UNREACHABLE: &[&str] = &[
        "unable to connect to the server",
        "connection refused",
        "no such host",
        "i/o timeout",
        "was refused",
    ];
    const UNAUTHORIZED: &[&str] = &[
        "unauthorized",
        "forbidden",
        "you must be logged in",
        "provide credentials",
    ];

    if UNREACHABLE.iter().any(|m| lower.contains(m)) {
        DiscoveryError::Unreachable(stderr)
    } else if UNAUTHORIZED.iter().any(|m| lower.contains(m)) {
        DiscoveryError::Unauthorized(stderr)
    } else {
        DiscoveryError::Command { status, stderr }
    }
}
