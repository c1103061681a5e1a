use crate::board::{Board, Color, PieceId, PieceKind};

/// One side of the game: its roster of active pieces and a cached material score.
///
/// The score is only brought up to date by `recompute_score`; callers that
/// mutate the roster are expected to recompute before reading it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub color: Color,
    pieces: Vec<PieceId>,
    score: i32,
}

impl Player {
    pub fn new(color: Color) -> Self {
        Self {
            color,
            pieces: Vec::new(),
            score: 0,
        }
    }

    pub fn pieces(&self) -> &[PieceId] {
        &self.pieces
    }

    pub fn add_piece(&mut self, id: PieceId) {
        if !self.pieces.contains(&id) {
            self.pieces.push(id);
        }
    }

    pub fn remove_piece(&mut self, id: PieceId) {
        self.pieces.retain(|&p| p != id);
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    pub fn recompute_score(&mut self, board: &Board) -> i32 {
        self.score = self
            .pieces
            .iter()
            .map(|&id| board.piece(id).kind.value())
            .sum();
        self.score
    }

    /// Roster pieces currently standing on the grid. A roster piece can be
    /// off the grid only while the legality filter has it displaced.
    pub fn live_pieces<'a>(&'a self, board: &'a Board) -> impl Iterator<Item = PieceId> + 'a {
        self.pieces.iter().copied().filter(move |&id| board.is_live(id))
    }

    pub fn king(&self, board: &Board) -> Option<PieceId> {
        self.pieces
            .iter()
            .copied()
            .find(|&id| board.piece(id).kind == PieceKind::King)
    }

    pub fn clear(&mut self) {
        self.pieces.clear();
        self.score = 0;
    }
}
