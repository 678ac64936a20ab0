//! In-memory adapters.
//!
//! `StaticDiscovery` returns a fixed target list (or a fixed failure) and
//! `StaticLogSource` replays canned lines per pod. Both are used by the
//! collector and router tests; they never touch a cluster.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;

use crate::adapter::{Discovery, LineStream, LogSource};
use crate::error::{DiscoveryError, LogSourceError};
use crate::types::Target;

/// Discovery that always answers the same way.
pub struct StaticDiscovery {
    targets: Vec<Target>,
    fail_with: Option<String>,
    delay: Option<Duration>,
}

impl StaticDiscovery {
    pub fn new(targets: Vec<Target>) -> Self {
        Self {
            targets,
            fail_with: None,
            delay: None,
        }
    }

    /// Discovery that reports the control plane as unreachable.
    pub fn unreachable(reason: impl Into<String>) -> Self {
        Self {
            targets: Vec::new(),
            fail_with: Some(reason.into()),
            delay: None,
        }
    }

    /// Sleep before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl Discovery for StaticDiscovery {
    async fn list_targets(&self) -> Result<Vec<Target>, DiscoveryError> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        match &self.fail_with {
            Some(reason) => Err(DiscoveryError::Unreachable(reason.clone())),
            None => Ok(self.targets.clone()),
        }
    }
}

/// Canned behaviour for one pod.
#[derive(Debug, Clone)]
enum PodScript {
    /// Yield these lines, then end cleanly.
    Lines(Vec<Vec<u8>>),
    /// Yield these lines, then fail with a non-zero exit.
    LinesThenExit(Vec<Vec<u8>>),
    /// Refuse to open the stream at all.
    SpawnFailure,
    /// Yield these lines, then never end.
    Hang(Vec<Vec<u8>>),
}

/// Log source that replays scripted lines per target.
///
/// Targets without a script yield an empty stream.
#[derive(Default)]
pub struct StaticLogSource {
    scripts: HashMap<Target, PodScript>,
}

impl StaticLogSource {
    pub fn new() -> Self {
        Self::default()
    }

    fn set(mut self, target: Target, script: PodScript) -> Self {
        self.scripts.insert(target, script);
        self
    }

    /// Serve `lines` for `target`.
    pub fn with_lines<I, L>(self, target: Target, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        self.set(target, PodScript::Lines(lines.into_iter().map(Into::into).collect()))
    }

    /// Serve `lines` for `target`, then report a failed exit.
    pub fn with_lines_then_exit<I, L>(self, target: Target, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        self.set(
            target,
            PodScript::LinesThenExit(lines.into_iter().map(Into::into).collect()),
        )
    }

    /// Fail to open the stream for `target`.
    pub fn with_spawn_failure(self, target: Target) -> Self {
        self.set(target, PodScript::SpawnFailure)
    }

    /// Serve `lines` for `target`, then block forever.
    pub fn with_hang<I, L>(self, target: Target, lines: I) -> Self
    where
        I: IntoIterator<Item = L>,
        L: Into<Vec<u8>>,
    {
        self.set(target, PodScript::Hang(lines.into_iter().map(Into::into).collect()))
    }

    fn script_for(&self, target: &Target) -> PodScript {
        self.scripts
            .get(target)
            .cloned()
            .unwrap_or(PodScript::Lines(Vec::new()))
    }
}

#[async_trait]
impl LogSource for StaticLogSource {
    async fn stream_lines(&self, target: &Target) -> Result<LineStream, LogSourceError> {
        let stream: LineStream = match self.script_for(target) {
            PodScript::Lines(lines) => futures::stream::iter(lines.into_iter().map(Ok)).boxed(),
            PodScript::LinesThenExit(lines) => {
                let failure = LogSourceError::Exited {
                    target: target.clone(),
                    status: "exit status: 1".to_string(),
                    stderr: "scripted failure".to_string(),
                };
                futures::stream::iter(lines.into_iter().map(Ok))
                    .chain(futures::stream::once(async move { Err(failure) }))
                    .boxed()
            }
            PodScript::SpawnFailure => {
                return Err(LogSourceError::Spawn {
                    target: target.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::NotFound, "scripted"),
                });
            }
            PodScript::Hang(lines) => futures::stream::iter(lines.into_iter().map(Ok))
                .chain(futures::stream::pending())
                .boxed(),
        };
        Ok(stream)
    }
}
