//! Log retrieval via `kubectl logs`.
//!
//! Each call spawns one child and streams its stdout line by line. When
//! stdout ends the exit status is checked; a failed exit becomes the last
//! item of the stream, carrying whatever the child wrote to stderr.

use std::process::Stdio;

use async_trait::async_trait;
use futures::StreamExt;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStdout};
use tokio::task::JoinHandle;
use tracing::debug;

use ingress_core::config::LogsConfig;
use ingress_core::{LineStream, LogSource, LogSourceError, Target};

use crate::kubectl::Kubectl;

/// Longest stderr excerpt kept in an error.
const STDERR_LIMIT: usize = 2048;

/// Streams a pod's access log through `kubectl -n <ns> logs <pod>`.
pub struct KubectlLogSource {
    kubectl: Kubectl,
    tail_lines: Option<u64>,
    container: Option<String>,
}

impl KubectlLogSource {
    pub fn new(kubectl: Kubectl) -> Self {
        Self {
            kubectl,
            tail_lines: None,
            container: None,
        }
    }

    pub fn from_config(kubectl: Kubectl, config: &LogsConfig) -> Self {
        Self {
            kubectl,
            tail_lines: config.tail_lines,
            container: config.container.clone(),
        }
    }

    /// Only fetch the last `n` lines of each pod's log.
    pub fn with_tail_lines(mut self, n: u64) -> Self {
        self.tail_lines = Some(n);
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = Some(container.into());
        self
    }

    fn args(&self, target: &Target) -> Vec<String> {
        let mut args = vec![
            "-n".to_string(),
            target.namespace.clone(),
            "logs".to_string(),
            target.pod.clone(),
        ];
        if let Some(n) = self.tail_lines {
            args.push(format!("--tail={n}"));
        }
        if let Some(container) = &self.container {
            args.push(format!("--container={container}"));
        }
        args
    }
}

#[async_trait]
impl LogSource for KubectlLogSource {
    async fn stream_lines(&self, target: &Target) -> Result<LineStream, LogSourceError> {
        let args = self.args(target);
        debug!(%target, ?args, "streaming pod logs");

        let mut child = self
            .kubectl
            .command(&args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| LogSourceError::Spawn {
                target: target.clone(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| LogSourceError::Spawn {
            target: target.clone(),
            source: std::io::Error::other("child stdout was not captured"),
        })?;
        let stderr = child.stderr.take().map(|mut stderr| {
            tokio::spawn(async move {
                let mut buf = Vec::new();
                let _ = stderr.read_to_end(&mut buf).await;
                String::from_utf8_lossy(&buf).into_owned()
            })
        });

        let reader = LineReader {
            target: target.clone(),
            child,
            stdout: BufReader::new(stdout),
            stderr,
            done: false,
        };

        Ok(futures::stream::unfold(reader, |mut reader| async move {
            reader.next_line().await.map(|item| (item, reader))
        })
        .boxed())
    }
}

struct LineReader {
    target: Target,
    child: Child,
    stdout: BufReader<ChildStdout>,
    stderr: Option<JoinHandle<String>>,
    done: bool,
}

impl LineReader {
    async fn next_line(&mut self) -> Option<Result<Vec<u8>, LogSourceError>> {
        if self.done {
            return None;
        }

        let mut buf = Vec::new();
        match self.stdout.read_until(b'\n', &mut buf).await {
            Ok(0) => {
                self.done = true;
                self.finish().await.err().map(Err)
            }
            Ok(_) => {
                strip_line_ending(&mut buf);
                Some(Ok(buf))
            }
            Err(source) => {
                self.done = true;
                Some(Err(LogSourceError::Io {
                    target: self.target.clone(),
                    source,
                }))
            }
        }
    }

    /// Reap the child and turn a failed exit into an error.
    async fn finish(&mut self) -> Result<(), LogSourceError> {
        let status = self.child.wait().await.map_err(|source| LogSourceError::Io {
            target: self.target.clone(),
            source,
        })?;

        if status.success() {
            return Ok(());
        }

        let stderr = match self.stderr.take() {
            Some(handle) => handle.await.unwrap_or_default(),
            None => String::new(),
        };
        Err(LogSourceError::Exited {
            target: self.target.clone(),
            status: status.to_string(),
            stderr: truncate(stderr.trim(), STDERR_LIMIT),
        })
    }
}

fn strip_line_ending(buf: &mut Vec<u8>) {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
}

fn truncate(s: &str, limit: usize) -> String {
    if s.len() <= limit {
        return s.to_string();
    }
    let mut end = limit;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &s[..end])
}
