/// Cross-module rules checks: FEN in, legal play, FEN out.
use chess_core::{Move, Position, START_FEN};

#[test]
fn test_starting_position_has_twenty_moves_for_both_sides() {
    let mut pos = Position::startpos();
    assert_eq!(pos.legal_moves().len(), 20);

    pos.play(&"e2e4".parse::<Move>().unwrap()).unwrap();
    assert_eq!(pos.legal_moves().len(), 20);
}

#[test]
fn test_fen_round_trips_through_play() {
    let mut pos = Position::startpos();
    assert_eq!(pos.to_fen(), START_FEN);

    for text in ["e2e4", "c7c5", "g1f3"] {
        pos.play(&text.parse::<Move>().unwrap()).unwrap();
    }
    let fen = pos.to_fen();
    assert_eq!(
        fen,
        "rnbqkbnr/pp1ppppp/8/2p5/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
    );
    assert_eq!(Position::from_fen(&fen).unwrap().to_fen(), fen);
}

#[test]
fn test_fools_mate_is_checkmate() {
    let mut pos = Position::startpos();
    for text in ["f2f3", "e7e5", "g2g4", "d8h4"] {
        pos.play(&text.parse::<Move>().unwrap()).unwrap();
    }
    assert!(pos.is_checkmate());
    assert!(pos.legal_moves().is_empty());
}
