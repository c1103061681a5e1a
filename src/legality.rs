use crate::board::{Board, PieceId, PieceKind, Square};
use crate::movegen::MoveGenerator;
use crate::player::Player;

/// Undo record for a move tried on the grid and taken back before anything
/// else observes it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProvisionalMove {
    piece: PieceId,
    from: Square,
    to: Square,
    displaced: Option<PieceId>,
}

impl ProvisionalMove {
    pub fn apply(board: &mut Board, piece: PieceId, to: Square) -> Self {
        let from = board.piece(piece).square;
        let displaced = board.piece_at(to);
        board.place(from, None);
        board.place(to, Some(piece));
        board.piece_mut(piece).square = to;
        Self {
            piece,
            from,
            to,
            displaced,
        }
    }

    pub fn revert(self, board: &mut Board) {
        board.place(self.to, self.displaced);
        board.place(self.from, Some(self.piece));
        board.piece_mut(self.piece).square = self.from;
    }
}

/// Simulate-and-revert king safety checks.
///
/// Every method leaves the grid exactly as it found it and finishes by
/// regenerating the attacking side's candidates from the restored position.
#[derive(Debug, Clone, Copy, Default)]
pub struct LegalityFilter {
    generator: MoveGenerator,
}

impl LegalityFilter {
    pub fn new() -> Self {
        Self {
            generator: MoveGenerator::new(),
        }
    }

    pub fn generator(&self) -> &MoveGenerator {
        &self.generator
    }

    /// Drops every destination of `piece` after which `opponent` could take
    /// the mover's king.
    pub fn prune_moves_exposing_king(&self, board: &mut Board, opponent: &Player, piece: PieceId) {
        self.filter_destinations(board, opponent, piece);
        self.generator.generate_all_moves(board, opponent);
    }

    /// Prunes the lists of all of `mover`'s pieces against `opponent`.
    pub fn prune_all_moves(&self, board: &mut Board, mover: &Player, opponent: &Player) {
        let pieces: Vec<PieceId> = mover.live_pieces(board).collect();
        for id in pieces {
            self.filter_destinations(board, opponent, id);
        }
        self.generator.generate_all_moves(board, opponent);
    }

    fn filter_destinations(&self, board: &mut Board, opponent: &Player, piece: PieceId) {
        let candidates = board.piece(piece).legal_moves.clone();
        let mut kept = Vec::with_capacity(candidates.len());
        for to in candidates {
            let provisional = ProvisionalMove::apply(board, piece, to);
            self.generator.generate_all_moves(board, opponent);
            let exposed = self.generator.is_attacking(board, opponent, PieceKind::King);
            provisional.revert(board);
            if !exposed {
                kept.push(to);
            }
        }
        board.piece_mut(piece).legal_moves = kept;
    }

    /// True if `attacker`'s current candidates reach the other side's king.
    pub fn is_king_attacked(&self, board: &Board, attacker: &Player) -> bool {
        self.generator.is_attacking(board, attacker, PieceKind::King)
    }

    /// Checkmate of `defender` by `attacker`, given `attacker`'s candidate
    /// lists are current. A king with no moves that is not attacked is not
    /// reported: stalemate is not a terminal state here.
    pub fn detect_checkmate(
        &self,
        board: &mut Board,
        attacker: &Player,
        defender: &Player,
    ) -> bool {
        if self
            .generator
            .attacking_pieces(board, attacker, PieceKind::King)
            .is_empty()
        {
            return false;
        }
        let king = match defender.king(board) {
            Some(king) => king,
            None => return false,
        };

        self.prune_moves_exposing_king(board, attacker, king);
        if !board.piece(king).legal_moves.is_empty() {
            return false;
        }

        !self.can_block_check(board, attacker, defender)
    }

    /// Brute force: does any single move by any of `defender`'s pieces end the attack?
    fn can_block_check(&self, board: &mut Board, attacker: &Player, defender: &Player) -> bool {
        let pieces: Vec<PieceId> = defender.live_pieces(board).collect();
        let mut blocked = false;
        'search: for id in pieces {
            let destinations = board.piece(id).legal_moves.clone();
            for to in destinations {
                let provisional = ProvisionalMove::apply(board, id, to);
                self.generator.generate_all_moves(board, attacker);
                let still_attacked = self.generator.is_attacking(board, attacker, PieceKind::King);
                provisional.revert(board);
                if !still_attacked {
                    blocked = true;
                    break 'search;
                }
            }
        }
        self.generator.generate_all_moves(board, attacker);
        blocked
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::{Color, Piece};

    #[test]
    fn test_provisional_move_round_trip() {
        let mut board = Board::new();
        let rook = board.add_piece(Piece::new(PieceKind::Rook, Color::White, Square::new(0, 0)));
        board.place(Square::new(0, 0), Some(rook));
        let pawn = board.add_piece(Piece::new(PieceKind::Pawn, Color::Black, Square::new(0, 5)));
        board.place(Square::new(0, 5), Some(pawn));
        let before = board.clone();

        let provisional = ProvisionalMove::apply(&mut board, rook, Square::new(0, 5));
        assert_eq!(board.piece_at(Square::new(0, 5)), Some(rook));
        assert!(!board.is_live(pawn));
        provisional.revert(&mut board);

        assert_eq!(board, before);
    }
}
