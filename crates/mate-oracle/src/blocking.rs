//! Blocking oracle client over std::process pipes.

use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::debug;

use crate::protocol::{accumulate, Analysis};
use crate::{MateOracle, OracleError};

/// A UCI engine process driven synchronously. Each call blocks the caller
/// until the engine's `bestmove` arrives; `&mut self` receivers keep the
/// channel to a single in-flight request.
pub struct BlockingUciEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl BlockingUciEngine {
    /// Spawn the engine and run the UCI handshake. A failure here is
    /// permanent: the caller should report it once and fall back to
    /// canonical-only validation.
    pub fn spawn(path: &str) -> Result<Self, OracleError> {
        let mut process = Command::new(path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
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

        engine.send("uci")?;
        engine.wait_for("uciok")?;
        engine.send("setoption name Threads value 1")?;
        engine.send("isready")?;
        engine.wait_for("readyok")?;

        Ok(engine)
    }

    fn send(&mut self, cmd: &str) -> Result<(), OracleError> {
        debug!(cmd, "oracle <");
        writeln!(self.stdin, "{cmd}")
            .and_then(|_| self.stdin.flush())
            .map_err(|e| OracleError::Channel(format!("failed to write to engine: {e}")))
    }

    fn wait_for(&mut self, expected: &str) -> Result<(), OracleError> {
        let mut line = String::new();
        loop {
            line.clear();
            let n = self
                .stdout
                .read_line(&mut line)
                .map_err(|e| OracleError::Channel(format!("failed to read from engine: {e}")))?;
            if n == 0 {
                return Err(OracleError::Channel("engine closed the channel".into()));
            }
            if line.trim() == expected {
                return Ok(());
            }
        }
    }

    /// Tell the engine to quit and reap the process.
    pub fn quit(mut self) {
        let _ = self.send("quit");
        let _ = self.process.wait();
    }
}

impl MateOracle for BlockingUciEngine {
    fn analyze(&mut self, fen: &str, depth: u32) -> Result<Analysis, OracleError> {
        self.send(&format!("position fen {fen}"))?;
        self.send(&format!("go depth {depth}"))?;
        read_analysis(&mut self.stdout)
    }
}

impl Drop for BlockingUciEngine {
    fn drop(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

/// Read response lines until `bestmove`, folding score lines as we go.
/// Split out over `BufRead` so the loop is testable without a process.
pub fn read_analysis(reader: &mut impl BufRead) -> Result<Analysis, OracleError> {
    let mut analysis = Analysis::default();
    let mut line = String::new();
    loop {
        line.clear();
        let n = reader
            .read_line(&mut line)
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::MateScore;
    use std::io::Cursor;

    #[test]
    fn read_analysis_tolerates_chatter() {
        let reply = "info string low memory warning\n\
                     info depth 3 score cp 900 pv a1a7\n\
                     garbage line the parser has never seen\n\
                     info depth 6 score mate -1 pv a1a7 g8h8\n\
                     bestmove a1a7 ponder g8h8\n";
        let analysis = read_analysis(&mut Cursor::new(reply)).unwrap();
        assert_eq!(analysis.mate, Some(MateScore::Defender(1)));
        assert_eq!(analysis.best_move, Some("a1a7".to_string()));
    }

    #[test]
    fn closed_channel_is_an_error() {
        let err = read_analysis(&mut Cursor::new("info depth 1 score cp 0\n")).unwrap_err();
        assert!(matches!(err, OracleError::Channel(_)));
    }
}
