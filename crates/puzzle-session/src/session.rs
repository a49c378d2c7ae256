//! The puzzle session state machine.
//!
//! A session owns one `Position` and drives one puzzle attempt: move
//! submission and validation, the opponent's forced replies, undo/redo, and
//! the terminal outcomes. Oracle round-trips are explicit suspension
//! points: `submit_move` can return `NeedsVerdict` and `opponent_plan` can
//! return `NeedsBestMove`, and the caller (blocking or async) feeds the
//! answer back in. The session never blocks on the oracle itself.

use tracing::{debug, info, warn};

use chess_core::{Move, Position};
use mate_oracle::{Analysis, MateOracle, MateScore, UciEngine};

use crate::error::{PuzzleError, RejectReason, SessionError};
use crate::puzzle::{Puzzle, PuzzleRecord};

/// Where a session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Loading,
    PlayerTurn,
    OpponentTurn,
    ShowingSolution,
    CompletedSuccess,
    CompletedFailed,
    GameOver,
}

/// Notifications for the presentation layer, drained after each call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    PuzzleLoaded { id: String },
    MoveMade { from: chess_core::Square, to: chess_core::Square, accepted: bool },
    OpponentMoving { from: chess_core::Square, to: chess_core::Square },
    PuzzleCompleted { success: bool },
    HistoryChanged { can_undo: bool, can_redo: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mover {
    Player,
    Opponent,
}

/// One applied move: the snapshot taken immediately before it plus enough
/// bookkeeping to undo and redo without recomputation.
#[derive(Debug, Clone)]
struct HistoryEntry {
    snapshot: Position,
    move_index_before: usize,
    move_index_after: usize,
    mv: Move,
    mover: Mover,
    /// Whether the move matched the canonical solution at its index.
    canonical: bool,
}

/// A player move that diverged from the canonical line and is waiting on
/// the oracle. Dropping it abandons the submission; the position is
/// untouched until `resolve_pending` accepts.
#[derive(Debug)]
pub struct PendingValidation {
    mv: Move,
    move_index: usize,
    /// FEN after the hypothetical move; what the oracle should analyze.
    pub fen_after: String,
    /// Suggested `go depth` for the analysis.
    pub search_depth: u32,
    /// Player moves (including the submitted one) the mate must fit in.
    pub remaining: u32,
}

/// Outcome of a submission step.
#[derive(Debug)]
pub enum SubmitStep {
    Accepted { checkmate: bool },
    Rejected(RejectReason),
    NeedsVerdict(PendingValidation),
}

/// How the opponent's reply will be produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OpponentPlan {
    /// Play the next canonical solution move.
    Canonical(Move),
    /// Canonical line exhausted (or abandoned): ask the oracle.
    NeedsBestMove { fen: String, depth: u32 },
}

/// Search depth for a remaining mate distance. Short mates settle well
/// inside the floor; longer ones get four plies of budget per move.
fn search_depth(remaining: u32) -> u32 {
    (remaining * 4).max(15)
}

pub struct PuzzleSession {
    puzzle: Puzzle,
    position: Position,
    state: SessionState,
    /// Index into the canonical solution; advances once per applied move.
    move_index: usize,
    /// Failed attempts: rejected submissions plus resets.
    attempts: u32,
    /// Set once on the first oracle failure; validation then degrades to
    /// exact canonical matching.
    oracle_down: bool,
    history: Vec<HistoryEntry>,
    cursor: usize,
    events: Vec<SessionEvent>,
}

impl PuzzleSession {
    /// Validate a record and start a session on it. Replaces nothing: the
    /// caller drops any previous session wholesale.
    pub fn load(record: &PuzzleRecord) -> Result<PuzzleSession, PuzzleError> {
        let puzzle = Puzzle::from_record(record)?;
        let mut session = PuzzleSession {
            position: puzzle.start.clone(),
            state: SessionState::Loading,
            move_index: 0,
            attempts: 0,
            oracle_down: false,
            history: Vec::new(),
            cursor: 0,
            events: Vec::new(),
            puzzle,
        };
        session.events.push(SessionEvent::PuzzleLoaded {
            id: session.puzzle.id.clone(),
        });
        session.state = session.initial_turn();
        info!(
            puzzle = %session.puzzle.id,
            mate_in = session.puzzle.mate_in,
            opponent_leads = session.puzzle.opponent_leads,
            "puzzle loaded"
        );
        Ok(session)
    }

    fn initial_turn(&self) -> SessionState {
        if self.puzzle.opponent_leads {
            SessionState::OpponentTurn
        } else {
            SessionState::PlayerTurn
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn puzzle(&self) -> &Puzzle {
        &self.puzzle
    }

    /// Read-only view of the owned position; clone it for anything else.
    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn fen(&self) -> String {
        self.position.to_fen()
    }

    pub fn move_index(&self) -> usize {
        self.move_index
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.history.len()
    }

    /// Take all queued events.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Player moves applied so far, derived from the history prefix.
    fn player_moves_made(&self) -> u32 {
        self.history[..self.cursor]
            .iter()
            .filter(|e| e.mover == Mover::Player)
            .count() as u32
    }

    /// Is this attempt still on the canonical solution line? Hints and
    /// opponent replies come from the solution only while this holds.
    pub fn on_canonical_line(&self) -> bool {
        !self.diverged()
    }

    /// Has this attempt left the canonical line?
    fn diverged(&self) -> bool {
        self.history[..self.cursor].iter().any(|e| !e.canonical)
    }

    /// Player moves (counting the one being submitted) the mate must still
    /// fit in.
    fn remaining_depth(&self) -> u32 {
        self.puzzle
            .mate_in
            .saturating_sub(self.player_moves_made())
            .max(1)
    }

    fn mark_oracle_down(&mut self) {
        if !self.oracle_down {
            self.oracle_down = true;
            warn!(
                puzzle = %self.puzzle.id,
                "oracle unavailable; falling back to canonical-only validation"
            );
        }
    }

    fn push_history_changed(&mut self) {
        self.events.push(SessionEvent::HistoryChanged {
            can_undo: self.can_undo(),
            can_redo: self.can_redo(),
        });
    }

    fn reject(&mut self, mv: &Move, reason: RejectReason) -> SubmitStep {
        self.attempts += 1;
        debug!(puzzle = %self.puzzle.id, mv = %mv, %reason, "move rejected");
        self.events.push(SessionEvent::MoveMade {
            from: mv.from,
            to: mv.to,
            accepted: false,
        });
        SubmitStep::Rejected(reason)
    }

    fn accept(&mut self, mv: Move, canonical: bool) -> SubmitStep {
        self.apply_move(mv, Mover::Player, canonical);
        self.events.push(SessionEvent::MoveMade {
            from: mv.from,
            to: mv.to,
            accepted: true,
        });
        self.push_history_changed();

        let checkmate = self.position.is_checkmate();
        if checkmate {
            self.state = SessionState::CompletedSuccess;
            self.events
                .push(SessionEvent::PuzzleCompleted { success: true });
            info!(puzzle = %self.puzzle.id, attempts = self.attempts, "puzzle solved");
        } else {
            self.state = SessionState::OpponentTurn;
        }
        SubmitStep::Accepted { checkmate }
    }

    /// Apply an already-validated move, recording a history entry. Drops
    /// any redo tail first.
    fn apply_move(&mut self, mv: Move, mover: Mover, canonical: bool) {
        self.history.truncate(self.cursor);
        self.history.push(HistoryEntry {
            snapshot: self.position.clone(),
            move_index_before: self.move_index,
            move_index_after: self.move_index + 1,
            mv,
            mover,
            canonical,
        });
        self.cursor += 1;
        self.position.play_unchecked(&mv);
        self.move_index += 1;
    }

    /// Submit the player's move. Valid only in `PlayerTurn`; any other
    /// state is a `StateViolation` and nothing changes.
    ///
    /// The canonical move is accepted immediately. A divergent legal move
    /// either checkmates on the spot (accepted) or comes back as
    /// `NeedsVerdict`, to be settled with [`resolve_pending`] once the
    /// oracle has looked at the resulting position.
    ///
    /// [`resolve_pending`]: PuzzleSession::resolve_pending
    pub fn submit_move(&mut self, mv: Move) -> Result<SubmitStep, SessionError> {
        if self.state != SessionState::PlayerTurn {
            return Err(SessionError::StateViolation(self.state));
        }

        let mover_color = self.position.piece_at(mv.from).map(|p| p.color);
        if mover_color != Some(self.puzzle.player_color)
            || !self.position.legal_moves_from(mv.from).contains(&mv)
        {
            return Ok(self.reject(&mv, RejectReason::IllegalMove));
        }

        let canonical =
            !self.diverged() && self.puzzle.canonical_move(self.move_index) == Some(&mv);
        if canonical {
            return Ok(self.accept(mv, true));
        }

        // Divergent move: without the oracle only exact matches count.
        if self.oracle_down {
            return Ok(self.reject(&mv, RejectReason::OracleUnavailable));
        }

        let remaining = self.remaining_depth();
        let mut probe = self.position.clone();
        probe.play_unchecked(&mv);
        if probe.is_checkmate() {
            // An equally fast alternate mate; no oracle needed.
            return Ok(self.accept(mv, false));
        }

        Ok(SubmitStep::NeedsVerdict(PendingValidation {
            mv,
            move_index: self.move_index,
            fen_after: probe.to_fen(),
            search_depth: search_depth(remaining),
            remaining,
        }))
    }

    /// Settle a pending divergent move with the oracle's analysis of
    /// `fen_after`. `None` means the oracle could not answer; the session
    /// degrades and rejects.
    ///
    /// In `fen_after` the defender is to move, so `Defender(n)` means the
    /// player mates in `n + 1` moves counting the submitted one; the move
    /// is accepted iff that total fits the remaining depth. Equal or
    /// faster mates pass, slower or absent mates are rejected.
    pub fn resolve_pending(
        &mut self,
        pending: PendingValidation,
        analysis: Option<&Analysis>,
    ) -> Result<SubmitStep, SessionError> {
        if self.state != SessionState::PlayerTurn || pending.move_index != self.move_index {
            return Err(SessionError::StateViolation(self.state));
        }

        let Some(analysis) = analysis else {
            self.mark_oracle_down();
            return Ok(self.reject(&pending.mv, RejectReason::OracleUnavailable));
        };

        match analysis.mate {
            Some(MateScore::Defender(n)) => {
                let total = n + 1;
                if total <= pending.remaining {
                    Ok(self.accept(pending.mv, false))
                } else {
                    Ok(self.reject(
                        &pending.mv,
                        RejectReason::SlowerMate {
                            found: total,
                            required: pending.remaining,
                        },
                    ))
                }
            }
            // The mover-to-be (our opponent) mating, or no mate at all.
            _ => Ok(self.reject(&pending.mv, RejectReason::NoForcedMate)),
        }
    }

    /// Blocking convenience: submit and, if needed, consult the oracle.
    pub fn submit_move_with(
        &mut self,
        mv: Move,
        oracle: &mut dyn MateOracle,
    ) -> Result<SubmitStep, SessionError> {
        match self.submit_move(mv)? {
            SubmitStep::NeedsVerdict(pending) => {
                match oracle.analyze(&pending.fen_after, pending.search_depth) {
                    Ok(analysis) => self.resolve_pending(pending, Some(&analysis)),
                    Err(e) => {
                        warn!(error = %e, "oracle analysis failed");
                        self.resolve_pending(pending, None)
                    }
                }
            }
            step => Ok(step),
        }
    }

    /// Async convenience: only the move being validated awaits; the rest of
    /// the session is untouched while the engine thinks.
    pub async fn submit_move_async(
        &mut self,
        mv: Move,
        engine: &mut UciEngine,
    ) -> Result<SubmitStep, SessionError> {
        match self.submit_move(mv)? {
            SubmitStep::NeedsVerdict(pending) => {
                match engine.analyze(&pending.fen_after, pending.search_depth).await {
                    Ok(analysis) => self.resolve_pending(pending, Some(&analysis)),
                    Err(e) => {
                        warn!(error = %e, "oracle analysis failed");
                        self.resolve_pending(pending, None)
                    }
                }
            }
            step => Ok(step),
        }
    }

    /// How the opponent's reply should be produced. Valid only in
    /// `OpponentTurn`.
    pub fn opponent_plan(&self) -> Result<OpponentPlan, SessionError> {
        if self.state != SessionState::OpponentTurn {
            return Err(SessionError::StateViolation(self.state));
        }
        if !self.diverged() {
            if let Some(mv) = self.puzzle.canonical_move(self.move_index) {
                return Ok(OpponentPlan::Canonical(*mv));
            }
        }
        if self.oracle_down {
            return Err(SessionError::OracleUnavailable);
        }
        Ok(OpponentPlan::NeedsBestMove {
            fen: self.position.to_fen(),
            depth: search_depth(self.remaining_depth()),
        })
    }

    /// Apply the opponent's reply. Returns `true` when the reply delivered
    /// checkmate (the attempt has failed), `false` when play returns to
    /// the player.
    pub fn play_opponent_move(&mut self, mv: Move) -> Result<bool, SessionError> {
        if self.state != SessionState::OpponentTurn {
            return Err(SessionError::StateViolation(self.state));
        }
        let mover_color = self.position.piece_at(mv.from).map(|p| p.color);
        if mover_color != Some(self.puzzle.player_color.opponent())
            || !self.position.legal_moves_from(mv.from).contains(&mv)
        {
            return Err(SessionError::IllegalReply(mv));
        }

        let canonical =
            !self.diverged() && self.puzzle.canonical_move(self.move_index) == Some(&mv);
        self.events.push(SessionEvent::OpponentMoving {
            from: mv.from,
            to: mv.to,
        });
        self.apply_move(mv, Mover::Opponent, canonical);
        self.push_history_changed();

        if self.position.is_checkmate() {
            self.state = SessionState::CompletedFailed;
            self.events
                .push(SessionEvent::PuzzleCompleted { success: false });
            info!(puzzle = %self.puzzle.id, "opponent delivered mate; attempt failed");
            return Ok(true);
        }
        self.state = SessionState::PlayerTurn;
        Ok(false)
    }

    /// Blocking convenience: plan the reply, consult the oracle if the
    /// canonical line is exhausted, and play it.
    pub fn advance_opponent_with(
        &mut self,
        oracle: &mut dyn MateOracle,
    ) -> Result<bool, SessionError> {
        match self.opponent_plan()? {
            OpponentPlan::Canonical(mv) => self.play_opponent_move(mv),
            OpponentPlan::NeedsBestMove { fen, depth } => {
                let analysis = oracle.analyze(&fen, depth).map_err(|e| {
                    warn!(error = %e, "oracle best-move query failed");
                    self.mark_oracle_down();
                    SessionError::OracleUnavailable
                })?;
                let mv = self.parse_reply(analysis.best_move)?;
                self.play_opponent_move(mv)
            }
        }
    }

    /// Async convenience for [`advance_opponent_with`].
    ///
    /// [`advance_opponent_with`]: PuzzleSession::advance_opponent_with
    pub async fn advance_opponent_async(
        &mut self,
        engine: &mut UciEngine,
    ) -> Result<bool, SessionError> {
        match self.opponent_plan()? {
            OpponentPlan::Canonical(mv) => self.play_opponent_move(mv),
            OpponentPlan::NeedsBestMove { fen, depth } => {
                match engine.analyze(&fen, depth).await {
                    Ok(analysis) => {
                        let mv = self.parse_reply(analysis.best_move)?;
                        self.play_opponent_move(mv)
                    }
                    Err(e) => {
                        warn!(error = %e, "oracle best-move query failed");
                        self.mark_oracle_down();
                        Err(SessionError::OracleUnavailable)
                    }
                }
            }
        }
    }

    fn parse_reply(&mut self, best_move: Option<String>) -> Result<Move, SessionError> {
        let Some(text) = best_move else {
            warn!(puzzle = %self.puzzle.id, "oracle reported no best move");
            return Err(SessionError::OracleUnavailable);
        };
        text.parse().map_err(|_| {
            warn!(puzzle = %self.puzzle.id, reply = %text, "oracle best move unparseable");
            SessionError::OracleUnavailable
        })
    }

    /// Step back one applied move. Restores the snapshot taken just before
    /// it; a pure function of the history and cursor.
    pub fn undo(&mut self) -> bool {
        let undoable = matches!(
            self.state,
            SessionState::PlayerTurn
                | SessionState::OpponentTurn
                | SessionState::CompletedSuccess
                | SessionState::CompletedFailed
        );
        if !undoable || self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        let entry = &self.history[self.cursor];
        self.position = entry.snapshot.clone();
        self.move_index = entry.move_index_before;
        self.state = match entry.mover {
            Mover::Player => SessionState::PlayerTurn,
            Mover::Opponent => SessionState::OpponentTurn,
        };
        self.push_history_changed();
        true
    }

    /// Step forward again, replaying the next history entry's move through
    /// the executor.
    pub fn redo(&mut self) -> bool {
        if self.cursor >= self.history.len() || self.state == SessionState::ShowingSolution {
            return false;
        }
        let entry = self.history[self.cursor].clone();
        self.cursor += 1;
        self.position = entry.snapshot;
        self.position.play_unchecked(&entry.mv);
        self.move_index = entry.move_index_after;

        // Navigation only: the completion event already went out when the
        // move was first applied, so re-entering the terminal stays silent.
        if self.position.is_checkmate() {
            self.state = match entry.mover {
                Mover::Player => SessionState::CompletedSuccess,
                Mover::Opponent => SessionState::CompletedFailed,
            };
        } else {
            self.state = match entry.mover {
                Mover::Player => SessionState::OpponentTurn,
                Mover::Opponent => SessionState::PlayerTurn,
            };
        }
        self.push_history_changed();
        true
    }

    /// Start the attempt over: initial position, empty history, one more
    /// attempt on the counter.
    pub fn reset(&mut self) {
        self.position = self.puzzle.start.clone();
        self.move_index = 0;
        self.history.clear();
        self.cursor = 0;
        self.attempts += 1;
        self.state = self.initial_turn();
        self.push_history_changed();
    }

    /// Give up and walk the canonical solution from the start.
    pub fn show_solution(&mut self) -> Result<(), SessionError> {
        let allowed = matches!(
            self.state,
            SessionState::PlayerTurn
                | SessionState::OpponentTurn
                | SessionState::CompletedSuccess
                | SessionState::CompletedFailed
        );
        if !allowed {
            return Err(SessionError::StateViolation(self.state));
        }
        self.position = self.puzzle.start.clone();
        self.move_index = 0;
        self.history.clear();
        self.cursor = 0;
        self.state = SessionState::ShowingSolution;
        self.push_history_changed();
        Ok(())
    }

    /// Play the next canonical move of the shown solution. After the last
    /// move the session lands in `CompletedFailed` (watching the answer is
    /// not a solve).
    pub fn advance_solution(&mut self) -> Result<Option<Move>, SessionError> {
        if self.state != SessionState::ShowingSolution {
            return Err(SessionError::StateViolation(self.state));
        }
        let Some(mv) = self.puzzle.canonical_move(self.move_index).copied() else {
            return Ok(None);
        };
        // The solution was fully validated at load; replay directly.
        self.position.play_unchecked(&mv);
        self.move_index += 1;
        let player_move = self.position.side_to_move() != self.puzzle.player_color;
        if player_move {
            self.events.push(SessionEvent::MoveMade {
                from: mv.from,
                to: mv.to,
                accepted: true,
            });
        } else {
            self.events.push(SessionEvent::OpponentMoving {
                from: mv.from,
                to: mv.to,
            });
        }
        if self.move_index == self.puzzle.solution.len() {
            self.state = SessionState::CompletedFailed;
            self.events
                .push(SessionEvent::PuzzleCompleted { success: false });
        }
        Ok(Some(mv))
    }

    /// Leave a completed session. A new `load` starts the next puzzle.
    pub fn finish(&mut self) -> Result<(), SessionError> {
        match self.state {
            SessionState::CompletedSuccess | SessionState::CompletedFailed => {
                self.state = SessionState::GameOver;
                Ok(())
            }
            state => Err(SessionError::StateViolation(state)),
        }
    }
}
