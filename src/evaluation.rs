use crate::board::{Board, Color, PieceKind};
use crate::game::GameState;
use crate::player::Player;

/// Material evaluator. Values default to the engine's material table and
/// can be overridden per kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluator {
    pub king_value: i32,
    pub queen_value: i32,
    pub rook_value: i32,
    pub bishop_value: i32,
    pub knight_value: i32,
    pub pawn_value: i32,
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl Evaluator {
    pub fn new() -> Self {
        Self {
            king_value: PieceKind::King.value(),
            queen_value: PieceKind::Queen.value(),
            rook_value: PieceKind::Rook.value(),
            bishop_value: PieceKind::Bishop.value(),
            knight_value: PieceKind::Knight.value(),
            pawn_value: PieceKind::Pawn.value(),
        }
    }

    pub fn piece_value(&self, kind: PieceKind) -> i32 {
        match kind {
            PieceKind::King => self.king_value,
            PieceKind::Queen => self.queen_value,
            PieceKind::Rook => self.rook_value,
            PieceKind::Bishop => self.bishop_value,
            PieceKind::Knight => self.knight_value,
            PieceKind::Pawn => self.pawn_value,
        }
    }

    pub fn material(&self, board: &Board, player: &Player) -> i32 {
        player
            .pieces()
            .iter()
            .map(|&id| self.piece_value(board.piece(id).kind))
            .sum()
    }

    /// `team`'s material minus its opponent's, positive when `team` is ahead.
    pub fn evaluate(&self, game: &GameState, team: Color) -> i32 {
        let board = game.board();
        self.material(board, game.player(team)) - self.material(board, game.player(team.opposite()))
    }
}
