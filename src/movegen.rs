use crate::board::{Board, PieceId, PieceKind, Square};
use crate::player::Player;

#[rustfmt::skip]
const KNIGHT_OFFSETS: [(i8, i8); 8] = [
    (2, 1), (2, -1), (1, 2), (1, -2),
    (-2, 1), (-2, -1), (-1, 2), (-1, -2),
];

#[rustfmt::skip]
const KING_OFFSETS: [(i8, i8); 8] = [
    (-1, -1), (-1, 0), (-1, 1),
    (0, -1), (0, 1),
    (1, -1), (1, 0), (1, 1),
];

const ROOK_DIRECTIONS: [(i8, i8); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

const BISHOP_DIRECTIONS: [(i8, i8); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

#[rustfmt::skip]
const QUEEN_DIRECTIONS: [(i8, i8); 8] = [
    (1, 0), (-1, 0), (0, 1), (0, -1),
    (1, 1), (1, -1), (-1, 1), (-1, -1),
];

/// Candidate destination generator, one rule per piece kind.
///
/// Candidates only respect board edges and friendly occupancy; whether a move
/// leaves the mover's king attacked is decided by the legality filter.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveGenerator;

impl MoveGenerator {
    pub fn new() -> Self {
        MoveGenerator
    }

    pub fn candidate_squares(&self, board: &Board, id: PieceId) -> Vec<Square> {
        let mut moves = Vec::new();
        match board.piece(id).kind {
            PieceKind::King => self.step_moves(board, id, &KING_OFFSETS, &mut moves),
            PieceKind::Knight => self.step_moves(board, id, &KNIGHT_OFFSETS, &mut moves),
            PieceKind::Rook => self.ray_moves(board, id, &ROOK_DIRECTIONS, &mut moves),
            PieceKind::Bishop => self.ray_moves(board, id, &BISHOP_DIRECTIONS, &mut moves),
            PieceKind::Queen => self.ray_moves(board, id, &QUEEN_DIRECTIONS, &mut moves),
            PieceKind::Pawn => self.pawn_moves(board, id, &mut moves),
        }
        moves
    }

    /// Replaces the piece's cached list with fresh candidates.
    pub fn generate_piece_moves(&self, board: &mut Board, id: PieceId) {
        let moves = self.candidate_squares(board, id);
        board.piece_mut(id).legal_moves = moves;
    }

    /// Regenerates every roster piece that is on the grid. Displaced pieces
    /// keep whatever list they had.
    pub fn generate_all_moves(&self, board: &mut Board, player: &Player) {
        for &id in player.pieces() {
            if board.is_live(id) {
                self.generate_piece_moves(board, id);
            }
        }
    }

    fn can_land_on(&self, board: &Board, id: PieceId, target: Square) -> bool {
        if !board.is_on_board(target) {
            return false;
        }
        match board.piece_on(target) {
            Some(occupant) => !occupant.is_from_same_team(board.piece(id)),
            None => true,
        }
    }

    fn step_moves(
        &self,
        board: &Board,
        id: PieceId,
        offsets: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        let from = board.piece(id).square;
        for &(df, dr) in offsets {
            let target = from.offset(df, dr);
            if self.can_land_on(board, id, target) {
                moves.push(target);
            }
        }
    }

    fn ray_moves(
        &self,
        board: &Board,
        id: PieceId,
        directions: &[(i8, i8)],
        moves: &mut Vec<Square>,
    ) {
        let from = board.piece(id).square;
        for &(df, dr) in directions {
            let mut target = from.offset(df, dr);
            while board.is_on_board(target) {
                if board.piece_at(target).is_some() {
                    if self.can_land_on(board, id, target) {
                        moves.push(target);
                    }
                    break;
                }
                moves.push(target);
                target = target.offset(df, dr);
            }
        }
    }

    fn pawn_moves(&self, board: &Board, id: PieceId, moves: &mut Vec<Square>) {
        let pawn = board.piece(id);
        let dir = pawn.color.pawn_direction();

        let single = pawn.square.offset(0, dir);
        if board.is_on_board(single) && board.piece_at(single).is_none() {
            moves.push(single);

            let double = pawn.square.offset(0, 2 * dir);
            if !pawn.has_moved && board.is_on_board(double) && board.piece_at(double).is_none() {
                moves.push(double);
            }
        }

        for df in [-1, 1] {
            let target = pawn.square.offset(df, dir);
            if let Some(occupant) = board.piece_on(target) {
                if !occupant.is_from_same_team(pawn) {
                    moves.push(target);
                }
            }
        }
    }

    /// True if one of the piece's cached destinations holds an opposing piece of `kind`.
    pub fn is_attacking_kind(&self, board: &Board, id: PieceId, kind: PieceKind) -> bool {
        let attacker = board.piece(id);
        attacker.legal_moves.iter().any(|&square| {
            board
                .piece_on(square)
                .map_or(false, |target| target.kind == kind && target.color != attacker.color)
        })
    }

    pub fn attacking_pieces(
        &self,
        board: &Board,
        player: &Player,
        kind: PieceKind,
    ) -> Vec<PieceId> {
        player
            .live_pieces(board)
            .filter(|&id| self.is_attacking_kind(board, id, kind))
            .collect()
    }

    pub fn is_attacking(&self, board: &Board, player: &Player, kind: PieceKind) -> bool {
        player
            .live_pieces(board)
            .any(|id| self.is_attacking_kind(board, id, kind))
    }
}
