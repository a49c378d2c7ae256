/// End-to-end puzzle session flows.
///
/// The flow being tested:
/// 1. JsonPuzzleStore selects a record by filter
/// 2. PuzzleSession validates the record and drives the attempt
/// 3. Divergent moves suspend on the oracle and resolve from its verdict
use mate_oracle::{Analysis, MateOracle, MateScore, OracleError};
use puzzle_session::{
    JsonPuzzleStore, OpponentPlan, PuzzleFilter, PuzzleRecord, PuzzleSession, PuzzleStore,
    RejectReason, SessionEvent, SessionState, SubmitStep,
};

/// Oracle that replays a fixed script of analyses, failing when exhausted.
struct ScriptedOracle {
    script: Vec<Analysis>,
}

impl ScriptedOracle {
    fn new(script: Vec<Analysis>) -> ScriptedOracle {
        let mut script = script;
        script.reverse();
        ScriptedOracle { script }
    }

    fn dead() -> ScriptedOracle {
        ScriptedOracle { script: Vec::new() }
    }
}

impl MateOracle for ScriptedOracle {
    fn analyze(&mut self, _fen: &str, _depth: u32) -> Result<Analysis, OracleError> {
        self.script
            .pop()
            .ok_or_else(|| OracleError::Channel("script exhausted".to_string()))
    }
}

fn defender_mate(n: u32, best: &str) -> Analysis {
    Analysis {
        best_move: Some(best.to_string()),
        mate: Some(MateScore::Defender(n)),
        cp: None,
    }
}

fn best_only(best: &str) -> Analysis {
    Analysis {
        best_move: Some(best.to_string()),
        mate: None,
        cp: Some(0),
    }
}

/// Two-rook ladder mate: 1.Ra7 Kg8 2.Rbb8#, with 1.Rb7 forcing the same
/// mate one file over.
fn ladder_record() -> PuzzleRecord {
    PuzzleRecord {
        id: "ladder".to_string(),
        fen: "7k/8/8/8/8/8/R7/1R5K w - - 0 1".to_string(),
        moves: "a2a7 h8g8 b1b8".to_string(),
        rating: 1400,
        mate_in: 2,
        themes: vec!["mateIn2".to_string(), "rookEndgame".to_string()],
    }
}

#[test]
fn test_store_filter_selects_matching_record() {
    let other = PuzzleRecord {
        id: "other".to_string(),
        fen: "6k1/5ppp/8/8/8/8/8/RR4K1 w - - 0 1".to_string(),
        moves: "a1a8".to_string(),
        rating: 900,
        mate_in: 1,
        themes: vec!["mateIn1".to_string(), "backRankMate".to_string()],
    };
    let store = JsonPuzzleStore::from_records(vec![other, ladder_record()]);

    let filter = PuzzleFilter {
        mate_in: Some(2),
        min_rating: Some(1000),
        max_rating: None,
        theme: Some("rookEndgame".to_string()),
    };
    assert_eq!(store.get_puzzle(&filter).unwrap().id, "ladder");

    let filter = PuzzleFilter {
        mate_in: Some(3),
        ..PuzzleFilter::default()
    };
    assert!(store.get_puzzle(&filter).is_err());
}

#[test]
fn test_store_loads_records_from_json_file() {
    let json = serde_json::to_string(&vec![ladder_record()]).unwrap();
    let path = std::env::temp_dir().join(format!(
        "mate-trainer-store-{}.json",
        std::process::id()
    ));
    std::fs::write(&path, json).unwrap();

    let store = JsonPuzzleStore::from_path(&path).unwrap();
    std::fs::remove_file(&path).unwrap();

    assert_eq!(store.len(), 1);
    let record = store.get_puzzle(&PuzzleFilter::default()).unwrap();
    assert_eq!(record.id, "ladder");
    assert_eq!(record.mate_in, 2);
}

#[test]
fn test_canonical_flow_emits_expected_events() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::PuzzleLoaded {
        id: "ladder".to_string()
    }));

    let step = session.submit_move("a2a7".parse().unwrap()).unwrap();
    assert!(matches!(step, SubmitStep::Accepted { checkmate: false }));
    assert_eq!(
        session.opponent_plan().unwrap(),
        OpponentPlan::Canonical("h8g8".parse().unwrap())
    );
    session.play_opponent_move("h8g8".parse().unwrap()).unwrap();
    let step = session.submit_move("b1b8".parse().unwrap()).unwrap();
    assert!(matches!(step, SubmitStep::Accepted { checkmate: true }));
    assert_eq!(session.state(), SessionState::CompletedSuccess);
    assert_eq!(session.attempts(), 0);

    let events = session.drain_events();
    assert!(events.contains(&SessionEvent::PuzzleCompleted { success: true }));
}

#[test]
fn test_divergent_equal_speed_mate_accepted_via_oracle() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    let mut oracle = ScriptedOracle::new(vec![
        // Verdict on 1.Rb7: defender mates the board in 1 more player move.
        defender_mate(1, "h8g8"),
        // Best defense once off book.
        best_only("h8g8"),
    ]);

    let step = session
        .submit_move_with("b1b7".parse().unwrap(), &mut oracle)
        .unwrap();
    assert!(matches!(step, SubmitStep::Accepted { checkmate: false }));

    // Off the canonical line the opponent asks the oracle for its reply.
    assert!(matches!(
        session.opponent_plan().unwrap(),
        OpponentPlan::NeedsBestMove { .. }
    ));
    let mated = session.advance_opponent_with(&mut oracle).unwrap();
    assert!(!mated);
    assert_eq!(session.state(), SessionState::PlayerTurn);

    // 2.Ra8 checkmates on the spot; no oracle round-trip needed.
    let step = session
        .submit_move_with("a2a8".parse().unwrap(), &mut oracle)
        .unwrap();
    assert!(matches!(step, SubmitStep::Accepted { checkmate: true }));
    assert_eq!(session.state(), SessionState::CompletedSuccess);
}

#[test]
fn test_slower_mate_rejected_and_position_untouched() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    let before = session.fen();
    let mut oracle = ScriptedOracle::new(vec![defender_mate(2, "h8g8")]);

    let step = session
        .submit_move_with("a2a6".parse().unwrap(), &mut oracle)
        .unwrap();
    match step {
        SubmitStep::Rejected(RejectReason::SlowerMate { found, required }) => {
            assert_eq!(found, 3);
            assert_eq!(required, 2);
        }
        other => panic!("unexpected step: {other:?}"),
    }
    assert_eq!(session.fen(), before);
    assert_eq!(session.state(), SessionState::PlayerTurn);
    assert_eq!(session.attempts(), 1);
}

#[test]
fn test_oracle_outage_degrades_to_canonical_only() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    let mut oracle = ScriptedOracle::dead();

    let step = session
        .submit_move_with("b1b7".parse().unwrap(), &mut oracle)
        .unwrap();
    assert!(matches!(
        step,
        SubmitStep::Rejected(RejectReason::OracleUnavailable)
    ));

    // Degraded: further divergence is rejected without an oracle call.
    let step = session.submit_move("a2a6".parse().unwrap()).unwrap();
    assert!(matches!(
        step,
        SubmitStep::Rejected(RejectReason::OracleUnavailable)
    ));

    // The canonical line still solves the puzzle.
    session.submit_move("a2a7".parse().unwrap()).unwrap();
    session.play_opponent_move("h8g8".parse().unwrap()).unwrap();
    let step = session.submit_move("b1b8".parse().unwrap()).unwrap();
    assert!(matches!(step, SubmitStep::Accepted { checkmate: true }));
}

#[test]
fn test_undo_redo_walk_the_whole_attempt() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    let fen0 = session.fen();
    session.submit_move("a2a7".parse().unwrap()).unwrap();
    let fen1 = session.fen();
    session.play_opponent_move("h8g8".parse().unwrap()).unwrap();
    session.submit_move("b1b8".parse().unwrap()).unwrap();
    let fen3 = session.fen();
    assert_eq!(session.state(), SessionState::CompletedSuccess);

    assert!(session.undo());
    assert!(session.undo());
    assert!(session.undo());
    assert_eq!(session.fen(), fen0);
    assert_eq!(session.move_index(), 0);
    assert_eq!(session.state(), SessionState::PlayerTurn);

    assert!(session.redo());
    assert_eq!(session.fen(), fen1);
    assert!(session.redo());
    assert!(session.redo());
    assert_eq!(session.fen(), fen3);
    assert_eq!(session.state(), SessionState::CompletedSuccess);
    assert!(!session.redo());
}

#[test]
fn test_show_solution_ends_in_failed_terminal() {
    let mut session = PuzzleSession::load(&ladder_record()).unwrap();
    session.submit_move("a2a7".parse().unwrap()).unwrap();

    session.show_solution().unwrap();
    let mut replayed = Vec::new();
    while let Some(mv) = session.advance_solution().unwrap() {
        replayed.push(mv.to_string());
    }
    assert_eq!(replayed, vec!["a2a7", "h8g8", "b1b8"]);
    assert_eq!(session.state(), SessionState::CompletedFailed);
    assert!(session.position().is_checkmate());

    session.finish().unwrap();
    assert_eq!(session.state(), SessionState::GameOver);
}

#[test]
fn test_load_rejects_record_whose_line_does_not_mate() {
    let record = PuzzleRecord {
        id: "bogus".to_string(),
        fen: "7k/8/8/8/8/8/R7/1R5K w - - 0 1".to_string(),
        moves: "a2a7".to_string(),
        rating: 1400,
        mate_in: 1,
        themes: vec![],
    };
    assert!(PuzzleSession::load(&record).is_err());
}
