//! Async oracle client over tokio process pipes.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::debug;

use crate::protocol::{accumulate, Analysis};
use crate::OracleError;

/// A UCI engine process driven asynchronously. The session awaits a call
/// here only for the move being validated; nothing else suspends.
///
/// One instance talks to one process, and `&mut self` receivers serialize
/// requests on the channel. To share an engine across tasks wrap it in
/// `Arc<tokio::sync::Mutex<UciEngine>>`; overlapping callers then queue
/// rather than interleave.
pub struct UciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl UciEngine {
    /// Spawn the engine process and run the UCI handshake.
    pub async fn spawn(path: &str) -> Result<Self, OracleError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .spawn()
            .map_err(|e| OracleError::Spawn(format!("failed to spawn {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| OracleError::Spawn("engine stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| OracleError::Spawn("engine stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;
        engine.send("setoption name Threads value 1").await?;
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        Ok(engine)
    }

    async fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        debug!(cmd, "oracle <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| OracleError::Channel(format!("failed to write to engine: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| OracleError::Channel(format!("failed to flush engine stdin: {e}")))?;
        Ok(())
    }

    async fn wait_for(&mut self, expected: &str) -> Result<(), OracleError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| OracleError::Channel(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(OracleError::Channel("engine closed the channel".into()));
            }
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Analyze a position to the given depth: `position fen …`, `go depth
    /// …`, then fold `info` score lines until `bestmove`.
    pub async fn analyze(&mut self, fen: &str, depth: u32) -> Result<Analysis, OracleError> {
        self.send(&format!("position fen {fen}")).await?;
        self.send(&format!("go depth {depth}")).await?;

        let mut analysis = Analysis::default();
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .await
                .map_err(|e| OracleError::Channel(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(OracleError::Channel("engine closed the channel".into()));
            }
            debug!(line = line.trim(), "oracle >");
            if accumulate(&mut analysis, &line) {
                return Ok(analysis);
            }
        }
    }

    /// The engine's best move for a position, if it has one.
    pub async fn best_move(
        &mut self,
        fen: &str,
        depth: u32,
    ) -> Result<Option<String>, OracleError> {
        Ok(self.analyze(fen, depth).await?.best_move)
    }

    /// Send quit and wait for the process to exit.
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
    }
}

impl Drop for UciEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}
