//! Adapter seams between the collector and the cluster.
//!
//! Both traits are object-safe so the collector can hold them as
//! `Arc<dyn ...>` built once at startup.

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::error::{DiscoveryError, LogSourceError};
use crate::types::Target;

/// Raw log lines for one pod, without their trailing newline.
///
/// The stream is finite and cannot be restarted. An `Err` item ends
/// retrieval for that pod.
pub type LineStream = BoxStream<'static, Result<Vec<u8>, LogSourceError>>;

/// Enumerates the front-end pods to scrape.
#[async_trait]
pub trait Discovery: Send + Sync {
    async fn list_targets(&self) -> Result<Vec<Target>, DiscoveryError>;
}

/// Opens the log stream of a single pod.
#[async_trait]
pub trait LogSource: Send + Sync {
    async fn stream_lines(&self, target: &Target) -> Result<LineStream, LogSourceError>;
}
