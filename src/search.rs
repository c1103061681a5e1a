use crate::board::{Color, PieceId, Square};
use crate::error::{ChessError, Result};
use crate::evaluation::Evaluator;
use crate::game::{GameState, Phase};
use log::{debug, trace};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    /// The root move with the highest minimax value, when that value is
    /// above zero.
    Best {
        piece: PieceId,
        from: Square,
        to: Square,
        score: i32,
    },
    /// Nothing scored above zero; callers fall back to a random legal move.
    NoImprovingMove { score: i32 },
}

/// Plain fixed-depth minimax over material.
///
/// Every simulated move happens on a scratch copy of the game, bracketed by a
/// snapshot push and pop, so the game passed in is never touched.
pub struct Search {
    evaluator: Evaluator,
    max_depth: u32,
    nodes_searched: u64,
    best_root_move: Option<(PieceId, Square)>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    pub fn new() -> Self {
        Self {
            evaluator: Evaluator::new(),
            max_depth: 1,
            nodes_searched: 0,
            best_root_move: None,
            cancel: None,
        }
    }

    pub fn with_evaluator(evaluator: Evaluator) -> Self {
        Self {
            evaluator,
            ..Self::new()
        }
    }

    /// Searches for the side to move. Values are material balances from that
    /// side's point of view.
    pub fn find_best_move(&mut self, game: &GameState) -> Result<SearchOutcome> {
        self.nodes_searched = 0;
        self.best_root_move = None;

        let team = game.active_color();
        let mut scratch = game.scratch_copy();
        let value = self.minimax(&mut scratch, self.max_depth, true, team, true)?;
        debug_assert_eq!(scratch.snapshot_depth(), 0);

        // Only a strictly positive balance counts as improving.
        let outcome = match self.best_root_move {
            Some((piece, to)) if value > 0 => SearchOutcome::Best {
                piece,
                from: game.piece(piece).square,
                to,
                score: value,
            },
            _ => SearchOutcome::NoImprovingMove { score: value },
        };
        debug!(
            "search depth {} for {}: {:?} after {} nodes",
            self.max_depth, team, outcome, self.nodes_searched
        );
        Ok(outcome)
    }

    fn minimax(
        &mut self,
        game: &mut GameState,
        depth: u32,
        maximizing: bool,
        team: Color,
        root: bool,
    ) -> Result<i32> {
        self.check_cancelled()?;
        self.nodes_searched += 1;

        if depth == 0 || game.current_phase() == Phase::Finished {
            return Ok(self.evaluator.evaluate(game, team));
        }

        let side = if maximizing { team } else { team.opposite() };
        let moves = game.legal_moves_of(side);
        if moves.is_empty() {
            // Undetected stalemate: score the node as it stands.
            return Ok(self.evaluator.evaluate(game, team));
        }

        let mut best = if maximizing { i32::MIN } else { i32::MAX };
        for (piece, to) in moves {
            game.push_snapshot();
            game.simulate_move(piece, to);
            let value = self.minimax(game, depth - 1, !maximizing, team, false);
            game.pop_snapshot();
            let value = value?;
            trace!("depth {} {} {:?} -> {}: {}", depth, side, piece, to, value);

            // Ties go to the move examined last.
            if maximizing {
                if value >= best {
                    best = value;
                    if root {
                        self.best_root_move = Some((piece, to));
                    }
                }
            } else if value <= best {
                best = value;
            }
        }
        Ok(best)
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(ChessError::SearchCancelled),
            _ => Ok(()),
        }
    }

    pub fn set_max_depth(&mut self, depth: u32) {
        self.max_depth = depth;
    }

    pub fn set_cancel_flag(&mut self, flag: Arc<AtomicBool>) {
        self.cancel = Some(flag);
    }

    pub fn get_nodes_searched(&self) -> u64 {
        self.nodes_searched
    }
}

/// Result of a background search, tagged with the game generation and side
/// it was started for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchResult {
    pub generation: u64,
    pub team: Color,
    pub outcome: Result<SearchOutcome>,
}

/// A search running on a worker thread. The single result arrives on a
/// channel; `cancel` makes the worker stop at its next node.
pub struct SearchTask {
    receiver: Receiver<SearchResult>,
    cancel: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl SearchTask {
    /// Searches for the side to move of `game` at `depth`.
    pub fn spawn(game: &GameState, depth: u32) -> Self {
        let scratch = game.scratch_copy();
        let team = scratch.active_color();
        let generation = scratch.generation();
        let cancel = Arc::new(AtomicBool::new(false));
        let (tx, rx) = mpsc::channel();

        let flag = Arc::clone(&cancel);
        let handle = thread::spawn(move || {
            let mut search = Search::new();
            search.set_max_depth(depth);
            search.set_cancel_flag(flag);
            let outcome = search.find_best_move(&scratch);
            // The receiver may already be gone after a restart.
            let _ = tx.send(SearchResult {
                generation,
                team,
                outcome,
            });
        });

        Self {
            receiver: rx,
            cancel,
            handle: Some(handle),
        }
    }

    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Blocks until the worker reports.
    pub fn wait(mut self) -> Result<SearchResult> {
        let result = self.receiver.recv().map_err(|_| ChessError::SearchCancelled);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
        result
    }
}

impl Drop for SearchTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
