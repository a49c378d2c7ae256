//! Interactive mate-puzzle trainer.
//!
//! Loads puzzles from a JSON file, drives one session at a time, and
//! consults a UCI engine for off-book moves. Moves are entered in UCI
//! coordinate form (`e2e4`, `g7g8q`).

use std::io::{self, BufRead, Write};

use tracing::{info, warn};

use mate_oracle::UciEngine;
use puzzle_session::{
    JsonPuzzleStore, OpponentPlan, PuzzleFilter, PuzzleSession, PuzzleStore, RejectReason,
    SessionState, SubmitStep,
};

/// Parse `--flag value` pairs out of the argument list.
fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}

fn build_filter(args: &[String]) -> PuzzleFilter {
    PuzzleFilter {
        mate_in: flag_value(args, "--mate-in").and_then(|v| v.parse().ok()),
        min_rating: flag_value(args, "--min-rating").and_then(|v| v.parse().ok()),
        max_rating: flag_value(args, "--max-rating").and_then(|v| v.parse().ok()),
        theme: flag_value(args, "--theme"),
    }
}

fn print_board(session: &PuzzleSession) {
    println!("{}", session.position());
    println!("fen: {}", session.fen());
}

fn print_help() {
    println!("commands:");
    println!("  <move>    play a move in UCI form, e.g. e2e4 or g7g8q");
    println!("  hint      show the starting square of the expected move");
    println!("  undo      take back the last move");
    println!("  redo      replay an undone move");
    println!("  reset     restart the puzzle (counts as an attempt)");
    println!("  solution  give up and watch the canonical line");
    println!("  quit      exit");
}

async fn run_opponent(session: &mut PuzzleSession, engine: &mut UciEngine) -> anyhow::Result<()> {
    while session.state() == SessionState::OpponentTurn {
        let mv = match session.opponent_plan()? {
            OpponentPlan::Canonical(mv) => mv,
            OpponentPlan::NeedsBestMove { .. } => {
                // Delegates planning and the engine round-trip.
                session.advance_opponent_async(engine).await?;
                continue;
            }
        };
        println!("opponent plays {mv}");
        session.play_opponent_move(mv)?;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    // Load .env file for local dev
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(puzzle_path) = args.iter().find(|a| !a.starts_with("--")).cloned() else {
        eprintln!(
            "usage: mate-trainer <puzzles.json> [--mate-in N] [--min-rating N] \
             [--max-rating N] [--theme NAME]"
        );
        std::process::exit(2);
    };
    let filter = build_filter(&args);

    let store = JsonPuzzleStore::from_path(&puzzle_path)?;
    info!(path = %puzzle_path, puzzles = store.len(), "puzzle store loaded");

    let stockfish_path =
        std::env::var("STOCKFISH_PATH").unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());
    let mut engine = UciEngine::spawn(&stockfish_path).await?;

    let record = store.get_puzzle(&filter)?;
    let mut session = PuzzleSession::load(&record)?;
    println!(
        "puzzle {} (rating {}): mate in {}",
        record.id, record.rating, record.mate_in
    );

    // March through any leading opponent move before handing over.
    run_opponent(&mut session, &mut engine).await?;
    print_board(&session);
    print_help();

    let stdin = io::stdin();
    loop {
        print!("> ");
        io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim();

        match input {
            "" => continue,
            "quit" | "exit" => break,
            "help" => print_help(),
            "hint" => {
                if session.state() != SessionState::PlayerTurn {
                    println!("no hint available here");
                    continue;
                }
                let canonical = session
                    .on_canonical_line()
                    .then(|| session.puzzle().canonical_move(session.move_index()))
                    .flatten();
                match canonical {
                    Some(mv) => println!("try the piece on {}", mv.from),
                    // Off book: ask the engine instead.
                    None => match engine.analyze(&session.fen(), 15).await {
                        Ok(analysis) => {
                            let best = analysis
                                .best_move
                                .as_deref()
                                .and_then(|b| b.parse::<chess_core::Move>().ok());
                            match best {
                                Some(mv) => println!("try the piece on {}", mv.from),
                                None => println!("no hint available here"),
                            }
                        }
                        Err(e) => println!("hint unavailable: {e}"),
                    },
                }
            }
            "undo" => {
                if session.undo() {
                    print_board(&session);
                } else {
                    println!("nothing to undo");
                }
            }
            "redo" => {
                if session.redo() {
                    print_board(&session);
                } else {
                    println!("nothing to redo");
                }
            }
            "reset" => {
                session.reset();
                run_opponent(&mut session, &mut engine).await?;
                print_board(&session);
            }
            "solution" => {
                session.show_solution()?;
                while let Some(mv) = session.advance_solution()? {
                    println!("  {mv}");
                }
                print_board(&session);
            }
            text => {
                let mv = match text.parse() {
                    Ok(mv) => mv,
                    Err(e) => {
                        println!("not a move: {e} (type `help` for commands)");
                        continue;
                    }
                };
                if session.state() != SessionState::PlayerTurn {
                    println!("not your turn (state: {:?})", session.state());
                    continue;
                }
                match session.submit_move_async(mv, &mut engine).await? {
                    SubmitStep::Accepted { .. } => {
                        run_opponent(&mut session, &mut engine).await?;
                        print_board(&session);
                    }
                    SubmitStep::Rejected(RejectReason::IllegalMove) => {
                        println!("illegal move");
                    }
                    SubmitStep::Rejected(reason) => {
                        warn!(%reason, "move rejected");
                        println!("rejected: {reason}");
                    }
                    SubmitStep::NeedsVerdict(_) => unreachable!("settled by submit_move_async"),
                }
            }
        }

        match session.state() {
            SessionState::CompletedSuccess => {
                println!("solved in {} attempt(s), well done", session.attempts() + 1);
                break;
            }
            SessionState::CompletedFailed => {
                println!("puzzle over; run again to retry");
                break;
            }
            _ => {}
        }
    }

    engine.quit().await;
    Ok(())
}
