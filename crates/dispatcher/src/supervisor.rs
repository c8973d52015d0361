//! Process supervision - spawning the test tool and collecting its output
//!
//! Each run gets its own task. Two reader tasks forward stdout and stderr
//! chunks over a channel to the run task, which owns the accumulators. Once
//! both streams are closed and the process has exited, the run task
//! classifies the outcome and applies the single terminal transition.

use bytes::{Bytes, BytesMut};
use std::process::Stdio;
use std::time::Instant;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::args::CommandLine;
use crate::classifier::{classify, ProcessOutcome};
use crate::config::DispatcherConfig;
use crate::registry::RunRegistry;
use cukerun_common::{Error, Result, RunToken, RunTransition};

const READ_CHUNK: usize = 8 * 1024;

/// Which output stream a chunk came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Stdout,
    Stderr,
}

#[derive(Debug)]
struct Chunk {
    stream: StreamKind,
    data: Bytes,
}

/// Cumulative stdout/stderr buffers of one run
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    chunks: usize,
}

impl OutputAccumulator {
    pub fn append(&mut self, stream: StreamKind, data: &[u8]) {
        match stream {
            StreamKind::Stdout => self.stdout.extend_from_slice(data),
            StreamKind::Stderr => self.stderr.extend_from_slice(data),
        }
        self.chunks += 1;
    }

    pub fn chunks(&self) -> usize {
        self.chunks
    }

    pub fn into_outcome(self, exit_code: Option<i32>) -> ProcessOutcome {
        ProcessOutcome::from_bytes(exit_code, &self.stdout, &self.stderr)
    }
}

/// Spawns test processes
#[derive(Debug, Clone)]
pub struct Supervisor {
    config: DispatcherConfig,
}

impl Supervisor {
    pub fn new(config: DispatcherConfig) -> Self {
        Self { config }
    }

    /// Spawn the process without waiting on it.
    ///
    /// Must be called from within a tokio runtime. Returns
    /// `Error::SpawnFailure` when the process could not be started.
    pub fn launch(&self, token: RunToken, command: &CommandLine) -> Result<RunHandle> {
        if command.program.is_empty() {
            return Err(Error::SpawnFailure {
                program: String::new(),
                reason: "no program configured".to_string(),
            });
        }

        let mut cmd = Command::new(&command.program);
        cmd.args(&command.args)
            .envs(&self.config.env)
            .env("FORCE_COLOR", "0")
            .env("NO_COLOR", "1")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        if let Some(dir) = &self.config.working_dir {
            cmd.current_dir(dir);
        }

        debug!("Spawning run {}: {}", token, command.display());

        let spawn_failure = |reason: String| Error::SpawnFailure {
            program: command.program.clone(),
            reason,
        };

        let mut child = cmd.spawn().map_err(|e| spawn_failure(e.to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| spawn_failure("stdout was not captured".to_string()))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| spawn_failure("stderr was not captured".to_string()))?;

        info!("Started run {} (pid: {:?})", token, child.id());

        Ok(RunHandle {
            token,
            child,
            stdout,
            stderr,
        })
    }
}

/// A spawned process whose streams have not been drained yet
pub struct RunHandle {
    token: RunToken,
    child: Child,
    stdout: ChildStdout,
    stderr: ChildStderr,
}

impl RunHandle {
    /// Drive the run to its terminal state on a background task.
    pub fn supervise(self, registry: RunRegistry) -> JoinHandle<()> {
        tokio::spawn(async move {
            let token = self.token;
            let start = Instant::now();
            let transition = self.wait().await;
            let status = transition.status();

            match registry.update(&token, transition) {
                Ok(()) => info!(
                    "Run {} finished as {} ({} ms)",
                    token,
                    status,
                    start.elapsed().as_millis()
                ),
                Err(e) => warn!("Dropping result of run {}: {}", token, e),
            }
        })
    }

    /// Drain both streams, wait for exit and classify.
    pub async fn wait(self) -> RunTransition {
        let RunHandle {
            token,
            mut child,
            stdout,
            stderr,
        } = self;

        let (tx, mut rx) = mpsc::channel::<Chunk>(64);
        let stdout_task = tokio::spawn(pump(token, StreamKind::Stdout, stdout, tx.clone()));
        let stderr_task = tokio::spawn(pump(token, StreamKind::Stderr, stderr, tx));

        // The channel closes once both readers have hit end of stream.
        let mut acc = OutputAccumulator::default();
        while let Some(chunk) = rx.recv().await {
            acc.append(chunk.stream, &chunk.data);
        }
        let _ = tokio::join!(stdout_task, stderr_task);

        match child.wait().await {
            Ok(status) => {
                debug!(
                    "Run {} exited with {} after {} chunk(s)",
                    token,
                    status,
                    acc.chunks()
                );
                classify(&acc.into_outcome(status.code()))
            }
            Err(e) => RunTransition::Failed {
                error: format!("Failed to wait for process: {}", e),
                output: None,
            },
        }
    }
}

async fn pump<R>(token: RunToken, stream: StreamKind, mut reader: R, tx: mpsc::Sender<Chunk>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    loop {
        match reader.read_buf(&mut buf).await {
            Ok(0) => break,
            Ok(_) => {
                let data = buf.split().freeze();
                if tx.send(Chunk { stream, data }).await.is_err() {
                    break;
                }
                buf.reserve(READ_CHUNK);
            }
            Err(e) => {
                warn!("Run {}: error reading {:?}: {}", token, stream, e);
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accumulator_keeps_streams_apart() {
        let mut acc = OutputAccumulator::default();
        acc.append(StreamKind::Stdout, b"{\"a\":");
        acc.append(StreamKind::Stderr, b"warn ");
        acc.append(StreamKind::Stdout, b"1}");
        acc.append(StreamKind::Stderr, b"again");
        assert_eq!(acc.chunks(), 4);

        let outcome = acc.into_outcome(Some(0));
        assert_eq!(outcome.stdout, "{\"a\":1}");
        assert_eq!(outcome.stderr, "warn again");
    }

    #[tokio::test]
    async fn test_empty_program_is_spawn_failure() {
        let supervisor = Supervisor::new(DispatcherConfig::default());
        let command = CommandLine {
            program: String::new(),
            args: vec![],
        };
        let err = supervisor.launch(RunToken::new(), &command).err().unwrap();
        assert!(matches!(err, Error::SpawnFailure { .. }));
    }
}
