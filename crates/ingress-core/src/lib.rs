//! ingress-core: shared building blocks for the ingress log exporter.
//!
//! Holds the domain types that flow between crates, the error taxonomy,
//! the startup configuration, and the two adapter seams the collector
//! depends on.
//!
//! # Architecture
//!
//! ```text
//! Discovery  ── list_targets() ──► Vec<Target>
//! LogSource  ── stream_lines(&Target) ──► LineStream (raw byte lines)
//! ```
//!
//! Concrete adapters live in `ingress-kube`; the in-memory ones in
//! [`memory`] back tests and dry runs.

pub mod adapter;
pub mod config;
pub mod error;
pub mod memory;
pub mod types;

pub use adapter::{Discovery, LineStream, LogSource};
pub use config::ExporterConfig;
pub use error::{DiscoveryError, LogSourceError};
pub use types::*;
