//! Error taxonomy for discovery and log retrieval.
//!
//! A line that fails to parse or decode is not an error at all; it simply
//! contributes nothing. Only the two adapter seams can fail.

use std::time::Duration;

use thiserror::Error;

use crate::types::Target;

/// Failure to enumerate scrape targets. Aborts the whole cycle.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("control plane unreachable: {0}")]
    Unreachable(String),

    #[error("not authorized against control plane: {0}")]
    Unauthorized(String),

    #[error("no services match label selector {selector}")]
    NoTargets { selector: String },

    #[error("service {namespace}/{service} has no selector")]
    MissingSelector { namespace: String, service: String },

    #[error("no pod backs service {namespace}/{service} (selector {selector})")]
    NoBackingPod {
        namespace: String,
        service: String,
        selector: String,
    },

    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("discovery command failed ({status}): {stderr}")]
    Command { status: String, stderr: String },

    #[error("malformed discovery response: {0}")]
    Decode(String),

    #[error("discovery timed out after {0:?}")]
    Timeout(Duration),
}

impl DiscoveryError {
    /// Short stable label used in logs to tell failures apart.
    pub fn kind(&self) -> &'static str {
        match self {
            DiscoveryError::Unreachable(_) => "unreachable",
            DiscoveryError::Unauthorized(_) => "unauthorized",
            DiscoveryError::NoTargets { .. } => "no_targets",
            DiscoveryError::MissingSelector { .. } => "missing_selector",
            DiscoveryError::NoBackingPod { .. } => "no_backing_pod",
            DiscoveryError::Spawn { .. } => "spawn",
            DiscoveryError::Command { .. } => "command",
            DiscoveryError::Decode(_) => "decode",
            DiscoveryError::Timeout(_) => "timeout",
        }
    }
}

/// Failure to retrieve one pod's log lines. Scoped to that pod.
#[derive(Debug, Error)]
pub enum LogSourceError {
    #[error("failed to spawn log retrieval for {target}: {source}")]
    Spawn {
        target: Target,
        #[source]
        source: std::io::Error,
    },

    #[error("log stream for {target} broke: {source}")]
    Io {
        target: Target,
        #[source]
        source: std::io::Error,
    },

    #[error("log retrieval for {target} exited with {status}: {stderr}")]
    Exited {
        target: Target,
        status: String,
        stderr: String,
    },

    #[error("log retrieval for {target} timed out after {after:?}")]
    Timeout { target: Target, after: Duration },
}

impl LogSourceError {
    pub fn kind(&self) -> &'static str {
        match self {
            LogSourceError::Spawn { .. } => "spawn",
            LogSourceError::Io { .. } => "io",
            LogSourceError::Exited { .. } => "exited",
            LogSourceError::Timeout { .. } => "timeout",
        }
    }
}
