//! Lifecycle management for one long-lived UCI engine process.

use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, warn};

use crate::config::AnalyzerConfig;
use crate::engine::info::{parse_info, PvCollector};
use crate::error::{Error, Result};
use crate::types::{PositionEval, PvLine};

/// Where a session sits in the UCI conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Process spawned, no commands sent yet.
    Uninitialized,
    /// `uci` sent, waiting for `uciok`.
    Handshaking,
    /// Handshake done, ready to accept a search.
    Ready,
    /// A `go` command is outstanding.
    Running,
    /// `quit` sent and the process reaped.
    Terminated,
    /// The conversation broke; the session must not be reused.
    Failed,
}

/// Result of one completed search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Retained principal variations in rank order.
    pub pvs: Vec<PvLine>,
    /// Maximum depth reached across all ranks.
    pub depth: u32,
}

impl SearchResult {
    /// Stamp the result into a persistable record for `fen`.
    pub fn into_eval(self, fen: &str) -> PositionEval {
        PositionEval {
            fen: fen.to_string(),
            depth: self.depth,
            pvs: self.pvs,
            analyzed_at: chrono::Utc::now(),
        }
    }
}

/// One engine process plus the state machine around its stdio conversation.
///
/// Sessions are long-lived: a worker performs the handshake once and then
/// reuses the session for many searches. The child is spawned with
/// `kill_on_drop`, so the process is reclaimed on every exit path even if
/// [`EngineSession::shutdown`] is never reached.
pub struct EngineSession {
    child: Child,
    stdin: ChildStdin,
    lines: Lines<BufReader<ChildStdout>>,
    state: SessionState,
    config: AnalyzerConfig,
}

impl EngineSession {
    /// Spawn the engine process with piped stdio.
    pub fn spawn(config: &AnalyzerConfig) -> Result<Self> {
        let mut child = Command::new(&config.engine_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| Error::Protocol("engine stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Protocol("engine stdout unavailable".to_string()))?;

        Ok(Self {
            child,
            stdin,
            lines: BufReader::new(stdout).lines(),
            state: SessionState::Uninitialized,
            config: config.clone(),
        })
    }

    /// Current conversation state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    async fn send(&mut self, command: &str) -> Result<()> {
        debug!(command, "engine <-");
        self.stdin.write_all(command.as_bytes()).await?;
        self.stdin.write_all(b"\n").await?;
        self.stdin.flush().await?;
        Ok(())
    }

    /// Read lines until one equals `token`, bounded by the handshake timeout.
    async fn await_token(&mut self, token: &str) -> Result<()> {
        let deadline = self.config.handshake_timeout;
        let wait = async {
            loop {
                match self.lines.next_line().await? {
                    Some(line) if line.trim() == token => return Ok(()),
                    Some(_) => continue,
                    None => {
                        return Err(Error::Protocol(format!(
                            "engine stream closed before `{token}`"
                        )))
                    }
                }
            }
        };

        match tokio::time::timeout(deadline, wait).await {
            Ok(result) => result,
            Err(_) => Err(Error::Protocol(format!(
                "timed out after {deadline:?} waiting for `{token}`"
            ))),
        }
    }

    /// Perform the `uci` handshake. Fails with [`Error::Protocol`] if the
    /// stream ends or no `uciok` arrives within the handshake timeout.
    pub async fn start(&mut self) -> Result<()> {
        if self.state != SessionState::Uninitialized {
            return Err(Error::Protocol(format!(
                "start() called in state {:?}",
                self.state
            )));
        }

        self.state = SessionState::Handshaking;
        self.send("uci").await?;
        if let Err(err) = self.await_token("uciok").await {
            self.state = SessionState::Failed;
            return Err(err);
        }
        self.state = SessionState::Ready;
        Ok(())
    }

    /// Apply the fixed per-run engine options and confirm readiness.
    /// Only valid from `Ready`, and intended to be called once.
    pub async fn configure(&mut self) -> Result<()> {
        if self.state != SessionState::Ready {
            return Err(Error::Protocol(format!(
                "configure() called in state {:?}",
                self.state
            )));
        }

        if self.config.chess960 {
            self.send("setoption name UCI_Chess960 value true").await?;
        }
        self.send(&format!(
            "setoption name Threads value {}",
            self.config.engine_threads
        ))
        .await?;
        self.send(&format!(
            "setoption name MultiPV value {}",
            self.config.multipv
        ))
        .await?;

        self.send("isready").await?;
        if let Err(err) = self.await_token("readyok").await {
            self.state = SessionState::Failed;
            return Err(err);
        }
        Ok(())
    }

    /// Run one bounded-time search and collect its principal variations.
    ///
    /// Consumes output lines until a `bestmove` terminator. Lines that do
    /// not parse into a scored variant are dropped; the deepest line per
    /// rank wins, ties keeping the most recent.
    pub async fn analyze(&mut self, fen: &str) -> Result<SearchResult> {
        if self.state != SessionState::Ready {
            return Err(Error::Protocol(format!(
                "analyze() called in state {:?}",
                self.state
            )));
        }
        self.state = SessionState::Running;

        if let Err(err) = self.send_search(fen).await {
            self.state = SessionState::Failed;
            return Err(err);
        }

        let mut collector = PvCollector::new();
        loop {
            let line = match self.lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => {
                    self.state = SessionState::Failed;
                    return Err(Error::Protocol(
                        "engine stream closed mid-search".to_string(),
                    ));
                }
                Err(err) => {
                    self.state = SessionState::Failed;
                    return Err(err.into());
                }
            };

            if line.starts_with("bestmove") {
                break;
            }
            if let Some(info) = parse_info(&line) {
                collector.observe(info);
            }
        }

        self.state = SessionState::Ready;
        let (pvs, depth) = collector.finish(self.config.multipv);
        Ok(SearchResult { pvs, depth })
    }

    async fn send_search(&mut self, fen: &str) -> Result<()> {
        self.send("ucinewgame").await?;
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go movetime {}", self.config.movetime.as_millis()))
            .await
    }

    /// Send `quit` and reap the process, killing it after a bounded wait.
    pub async fn shutdown(mut self) {
        // The engine may already be gone; quit is best-effort.
        if let Err(err) = self.send("quit").await {
            debug!(error = %err, "quit command not delivered");
        }

        match tokio::time::timeout(self.config.quit_timeout, self.child.wait()).await {
            Ok(Ok(status)) => debug!(?status, "engine exited"),
            Ok(Err(err)) => warn!(error = %err, "failed to reap engine process"),
            Err(_) => {
                warn!("engine ignored quit; killing");
                if let Err(err) = self.child.kill().await {
                    warn!(error = %err, "failed to kill engine process");
                }
            }
        }
        self.state = SessionState::Terminated;
    }
}
