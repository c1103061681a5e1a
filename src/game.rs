//! The turn controller.
//!
//! `GameState` owns the position, both rosters and the lifecycle
//! (`Init` -> `Play` -> `Finished`). Presentation layers drive it through
//! `select_or_move_at` and observe it through read-only queries and the
//! event channel from `subscribe`. The search engine works on
//! `scratch_copy`s and the snapshot stack, never on the live instance.

use crate::board::{Board, Color, Piece, PieceId, PieceKind, Square};
use crate::error::Result;
use crate::layout::BoardLayout;
use crate::legality::LegalityFilter;
use crate::player::Player;
use crate::search::{Search, SearchOutcome, SearchResult};
use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Play,
    Finished,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    TurnCompleted {
        color: Color,
        piece: PieceId,
        kind: PieceKind,
        from: Square,
        to: Square,
        captured: Option<PieceKind>,
        promoted: bool,
    },
    GameFinished {
        winner: Color,
    },
    GameRestarted,
}

/// What a single gesture did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Selected(PieceId),
    Deselected,
    Moved { piece: PieceId, from: Square, to: Square },
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComputerTurn {
    Searched {
        piece: PieceId,
        from: Square,
        to: Square,
        score: i32,
    },
    Random {
        piece: PieceId,
        from: Square,
        to: Square,
    },
    NoLegalMove,
    Skipped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSummary {
    pub piece: PieceId,
    pub from: Square,
    pub to: Square,
    pub captured: Option<PieceId>,
    pub promoted_to: Option<PieceId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameConfig {
    /// Side played by the search engine; `None` for two human players.
    pub computer: Option<Color>,
    pub search_depth: u32,
    /// Seed for the fallback move picker. Entropy when unset.
    pub rng_seed: Option<u64>,
    /// Play the computer's reply as soon as its turn starts.
    pub auto_play: bool,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            computer: Some(Color::Black),
            search_depth: 1,
            rng_seed: None,
            auto_play: true,
        }
    }
}

impl GameConfig {
    pub fn with_computer(mut self, computer: Option<Color>) -> Self {
        self.computer = computer;
        self
    }

    pub fn with_search_depth(mut self, depth: u32) -> Self {
        self.search_depth = depth;
        self
    }

    pub fn with_rng_seed(mut self, seed: u64) -> Self {
        self.rng_seed = Some(seed);
        self
    }

    pub fn with_auto_play(mut self, auto_play: bool) -> Self {
        self.auto_play = auto_play;
        self
    }
}

/// Everything needed to put a game back exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MoveRecord {
    board: Board,
    players: [Player; 2],
    active: Color,
    phase: Phase,
    winner: Option<Color>,
    selected: Option<PieceId>,
}

impl MoveRecord {
    pub fn capture(game: &GameState) -> Self {
        Self {
            board: game.board.clone(),
            players: game.players.clone(),
            active: game.active,
            phase: game.phase,
            winner: game.winner,
            selected: game.selected,
        }
    }

    fn restore(self, game: &mut GameState) {
        game.board = self.board;
        game.players = self.players;
        game.active = self.active;
        game.phase = self.phase;
        game.winner = self.winner;
        game.selected = self.selected;
    }
}

#[derive(Debug, Clone)]
pub struct GameState {
    board: Board,
    players: [Player; 2],
    active: Color,
    phase: Phase,
    winner: Option<Color>,
    selected: Option<PieceId>,
    layout: BoardLayout,
    config: GameConfig,
    filter: LegalityFilter,
    snapshots: Vec<MoveRecord>,
    observers: Vec<Sender<GameEvent>>,
    rng: StdRng,
    generation: u64,
}

impl GameState {
    /// An empty game in `Init`. Call `initialize_from_layout` to start it.
    pub fn new(config: GameConfig) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            board: Board::new(),
            players: [Player::new(Color::White), Player::new(Color::Black)],
            active: Color::White,
            phase: Phase::Init,
            winner: None,
            selected: None,
            layout: BoardLayout::default(),
            config,
            filter: LegalityFilter::new(),
            snapshots: Vec::new(),
            observers: Vec::new(),
            rng,
            generation: 0,
        }
    }

    pub fn with_layout(layout: &BoardLayout, config: GameConfig) -> Result<Self> {
        let mut game = GameState::new(config);
        game.initialize_from_layout(layout)?;
        Ok(game)
    }

    pub fn standard(config: GameConfig) -> Result<Self> {
        GameState::with_layout(&BoardLayout::standard(), config)
    }

    /// Replaces the current game with `layout`, White to move. Any invalid
    /// entry aborts setup and leaves an empty game in `Init`.
    pub fn initialize_from_layout(&mut self, layout: &BoardLayout) -> Result<()> {
        self.teardown();
        let pieces = layout.validate().map_err(|e| {
            warn!("rejected board layout: {}", e);
            e
        })?;

        for (square, kind, color) in pieces {
            self.create_piece(square, kind, color);
        }
        self.layout = layout.clone();
        self.active = Color::White;

        // Treat setup as a Black turn that just ended so White starts with
        // filtered moves and Black's candidates serve as attack sets.
        self.refresh_moves(Color::Black);
        self.phase = Phase::Play;
        info!(
            "game started: White {} Black {}",
            self.player(Color::White).score(),
            self.player(Color::Black).score()
        );

        self.maybe_play_computer();
        Ok(())
    }

    /// Tears down all pieces and players and sets the last layout up again.
    pub fn restart(&mut self) -> Result<()> {
        self.generation += 1;
        self.publish(GameEvent::GameRestarted);
        let layout = self.layout.clone();
        self.initialize_from_layout(&layout)
    }

    fn teardown(&mut self) {
        self.phase = Phase::Init;
        self.board.clear();
        for player in &mut self.players {
            player.clear();
        }
        self.active = Color::White;
        self.winner = None;
        self.selected = None;
        self.snapshots.clear();
    }

    fn create_piece(&mut self, square: Square, kind: PieceKind, color: Color) -> PieceId {
        let id = self.board.add_piece(Piece::new(kind, color, square));
        self.board.place(square, Some(id));
        self.players[color.index()].add_piece(id);
        id
    }

    // ----- queries -----

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn player(&self, color: Color) -> &Player {
        &self.players[color.index()]
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        self.board.piece(id)
    }

    pub fn piece_at(&self, square: Square) -> Option<&Piece> {
        self.board.piece_on(square)
    }

    /// Cached destinations of a piece. Empty for captured pieces.
    pub fn legal_destinations(&self, id: PieceId) -> &[Square] {
        if self.board.is_live(id) {
            &self.board.piece(id).legal_moves
        } else {
            &[]
        }
    }

    /// Every (piece, destination) pair `color` holds. Only fully filtered
    /// for the side to move.
    pub fn legal_moves_of(&self, color: Color) -> Vec<(PieceId, Square)> {
        let board = &self.board;
        self.player(color)
            .live_pieces(board)
            .flat_map(move |id| board.piece(id).legal_moves.iter().map(move |&to| (id, to)))
            .collect()
    }

    pub fn has_legal_moves(&self, color: Color) -> bool {
        self.player(color)
            .live_pieces(&self.board)
            .any(|id| !self.board.piece(id).legal_moves.is_empty())
    }

    pub fn is_in_check(&self, color: Color) -> bool {
        let mut board = self.board.clone();
        let attacker = self.player(color.opposite());
        self.filter.generator().generate_all_moves(&mut board, attacker);
        self.filter.is_king_attacked(&board, attacker)
    }

    pub fn current_phase(&self) -> Phase {
        self.phase
    }

    /// The side that delivered checkmate. `None` unless the game is finished.
    pub fn winning_team(&self) -> Option<Color> {
        match self.phase {
            Phase::Finished => self.winner,
            _ => None,
        }
    }

    pub fn active_color(&self) -> Color {
        self.active
    }

    pub fn selected(&self) -> Option<PieceId> {
        self.selected
    }

    /// Bumped on every completed turn and on restart.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_computer_turn(&self) -> bool {
        self.phase == Phase::Play && self.config.computer == Some(self.active)
    }

    pub fn subscribe(&mut self) -> Receiver<GameEvent> {
        let (tx, rx) = mpsc::channel();
        self.observers.push(tx);
        rx
    }

    fn publish(&mut self, event: GameEvent) {
        self.observers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    // ----- selection protocol -----

    /// A user gesture on `square`. Gestures outside `Play`, during the
    /// computer's turn or on squares that mean nothing are ignored.
    pub fn select_or_move_at(&mut self, square: Square) -> Selection {
        if self.is_computer_turn() {
            return Selection::Ignored;
        }
        self.apply_selection(square)
    }

    fn apply_selection(&mut self, square: Square) -> Selection {
        if self.phase != Phase::Play {
            return Selection::Ignored;
        }

        let target = self.board.piece_at(square);
        let own_piece = target.filter(|&id| self.board.piece(id).color == self.active);

        let selected = match self.selected {
            Some(selected) => selected,
            None => {
                return match own_piece {
                    Some(id) => {
                        self.selected = Some(id);
                        Selection::Selected(id)
                    }
                    None => Selection::Ignored,
                };
            }
        };

        if target == Some(selected) {
            self.selected = None;
            return Selection::Deselected;
        }
        if let Some(id) = own_piece {
            self.selected = Some(id);
            return Selection::Selected(id);
        }
        if self.board.piece(selected).can_move_to(square) {
            let summary = self.execute_move(selected, square);
            self.selected = None;
            self.finish_turn(summary);
            return Selection::Moved {
                piece: summary.piece,
                from: summary.from,
                to: summary.to,
            };
        }
        Selection::Ignored
    }

    // ----- move execution -----

    /// Captures whatever stands on `to`, relocates the piece and promotes a
    /// pawn reaching the last rank. No legality check.
    fn execute_move(&mut self, piece: PieceId, to: Square) -> MoveSummary {
        let (from, color, kind) = {
            let p = self.board.piece(piece);
            (p.square, p.color, p.kind)
        };

        let captured = self
            .board
            .piece_at(to)
            .filter(|&id| self.board.piece(id).color != color);
        if let Some(victim) = captured {
            self.board.place(to, None);
            self.players[color.opposite().index()].remove_piece(victim);
        }

        self.board.place(from, None);
        self.board.place(to, Some(piece));
        {
            let moved = self.board.piece_mut(piece);
            moved.square = to;
            moved.has_moved = true;
        }

        let promoted_to = if kind == PieceKind::Pawn && to.rank == color.last_rank() {
            Some(self.promote(piece))
        } else {
            None
        };

        MoveSummary {
            piece,
            from,
            to,
            captured,
            promoted_to,
        }
    }

    /// Pawns only ever promote to a queen.
    fn promote(&mut self, pawn: PieceId) -> PieceId {
        let (square, color) = {
            let p = self.board.piece(pawn);
            (p.square, p.color)
        };
        self.board.place(square, None);
        self.players[color.index()].remove_piece(pawn);
        let queen = self.create_piece(square, PieceKind::Queen, color);
        self.board.piece_mut(queen).has_moved = true;
        queen
    }

    /// Mover's candidates first, then the opponent's, then filter the
    /// opponent (next to move) against the mover. Scores last.
    fn refresh_moves(&mut self, mover: Color) {
        let opponent = mover.opposite();
        let generator = *self.filter.generator();
        generator.generate_all_moves(&mut self.board, &self.players[mover.index()]);
        generator.generate_all_moves(&mut self.board, &self.players[opponent.index()]);
        self.filter.prune_all_moves(
            &mut self.board,
            &self.players[opponent.index()],
            &self.players[mover.index()],
        );
        for player in &mut self.players {
            player.recompute_score(&self.board);
        }
    }

    /// Recomputes moves and scores, then either finishes the game or hands
    /// the turn over.
    fn end_turn(&mut self) {
        let mover = self.active;
        self.refresh_moves(mover);

        let checkmate = self.filter.detect_checkmate(
            &mut self.board,
            &self.players[mover.index()],
            &self.players[mover.opposite().index()],
        );
        if checkmate {
            self.phase = Phase::Finished;
            self.winner = Some(mover);
        } else {
            self.active = mover.opposite();
        }
    }

    fn finish_turn(&mut self, summary: MoveSummary) {
        let mover = self.active;
        let kind = self.board.piece(summary.piece).kind;
        let captured = summary.captured.map(|id| self.board.piece(id).kind);

        self.end_turn();
        self.generation += 1;
        debug!(
            "{} {} {} -> {}; scores White {} Black {}",
            mover,
            kind,
            summary.from,
            summary.to,
            self.player(Color::White).score(),
            self.player(Color::Black).score()
        );

        self.publish(GameEvent::TurnCompleted {
            color: mover,
            piece: summary.piece,
            kind,
            from: summary.from,
            to: summary.to,
            captured,
            promoted: summary.promoted_to.is_some(),
        });

        if self.phase == Phase::Finished {
            info!("game over: {} wins", mover);
            self.publish(GameEvent::GameFinished { winner: mover });
        } else {
            self.maybe_play_computer();
        }
    }

    // ----- simulation support for the search -----

    /// A detached copy for simulation: no observers, no pending snapshots,
    /// no automatic computer replies.
    pub fn scratch_copy(&self) -> GameState {
        let mut copy = self.clone();
        copy.observers.clear();
        copy.snapshots.clear();
        copy.config.auto_play = false;
        copy
    }

    pub fn push_snapshot(&mut self) {
        let record = MoveRecord::capture(self);
        self.snapshots.push(record);
    }

    /// Restores the most recent snapshot. Returns false if the stack was empty.
    pub fn pop_snapshot(&mut self) -> bool {
        match self.snapshots.pop() {
            Some(record) => {
                record.restore(self);
                true
            }
            None => false,
        }
    }

    pub fn snapshot_depth(&self) -> usize {
        self.snapshots.len()
    }

    /// Plays a move for the side to move without publishing anything.
    pub fn simulate_move(&mut self, piece: PieceId, to: Square) -> MoveSummary {
        let summary = self.execute_move(piece, to);
        self.end_turn();
        summary
    }

    // ----- computer turn -----

    fn maybe_play_computer(&mut self) {
        if self.config.auto_play && self.is_computer_turn() {
            self.play_computer_turn();
        }
    }

    /// Searches on a copy of this game and plays the result, or a random
    /// legal move when no line ends with the computer ahead in material.
    pub fn play_computer_turn(&mut self) -> ComputerTurn {
        if !self.is_computer_turn() {
            return ComputerTurn::Skipped;
        }
        let mut search = Search::new();
        search.set_max_depth(self.config.search_depth);
        match search.find_best_move(self) {
            Ok(outcome) => self.apply_outcome(outcome),
            Err(e) => {
                warn!("computer search failed: {}", e);
                ComputerTurn::Skipped
            }
        }
    }

    /// Plays the result of a background search if it still belongs to this
    /// game and turn.
    pub fn apply_search_result(&mut self, result: SearchResult) -> ComputerTurn {
        if result.generation != self.generation
            || result.team != self.active
            || !self.is_computer_turn()
        {
            debug!("discarding stale search result");
            return ComputerTurn::Skipped;
        }
        match result.outcome {
            Ok(outcome) => self.apply_outcome(outcome),
            Err(e) => {
                warn!("background search failed: {}", e);
                ComputerTurn::Skipped
            }
        }
    }

    fn apply_outcome(&mut self, outcome: SearchOutcome) -> ComputerTurn {
        match outcome {
            SearchOutcome::Best { piece, to, score, .. }
                if self.board.is_live(piece) && self.board.piece(piece).can_move_to(to) =>
            {
                let from = self.board.piece(piece).square;
                info!(
                    "best piece to move: {} {} to {} (score {})",
                    self.board.piece(piece).kind,
                    from,
                    to,
                    score
                );
                self.play_gesture_pair(from, to);
                ComputerTurn::Searched {
                    piece,
                    from,
                    to,
                    score,
                }
            }
            _ => {
                info!("no improving move found, playing a random move");
                self.play_random_move()
            }
        }
    }

    fn play_random_move(&mut self) -> ComputerTurn {
        let moves = self.legal_moves_of(self.active);
        let (piece, to) = match moves.choose(&mut self.rng) {
            Some(&choice) => choice,
            None => {
                warn!("{} has no legal move but is not checkmated", self.active);
                return ComputerTurn::NoLegalMove;
            }
        };
        let from = self.board.piece(piece).square;
        self.play_gesture_pair(from, to);
        ComputerTurn::Random { piece, from, to }
    }

    /// Select then move, the same two gestures a user would make.
    fn play_gesture_pair(&mut self, from: Square, to: Square) {
        self.selected = None;
        self.apply_selection(from);
        if !matches!(self.apply_selection(to), Selection::Moved { .. }) {
            warn!("computer gesture {} -> {} was not accepted", from, to);
            self.selected = None;
        }
    }
}
