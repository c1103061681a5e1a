use crate::error::ChessError;
use std::fmt;
use std::str::FromStr;

pub const BOARD_SIZE: i8 = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Color {
    White,
    Black,
}

impl Color {
    pub const ALL: [Color; 2] = [Color::White, Color::Black];

    pub fn opposite(&self) -> Color {
        match self {
            Color::White => Color::Black,
            Color::Black => Color::White,
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Color::White => 0,
            Color::Black => 1,
        }
    }

    /// Rank step of a pawn push for this side.
    pub fn pawn_direction(self) -> i8 {
        match self {
            Color::White => 1,
            Color::Black => -1,
        }
    }

    /// Rank on which this side's pawns promote.
    pub fn last_rank(self) -> i8 {
        match self {
            Color::White => BOARD_SIZE - 1,
            Color::Black => 0,
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Color::White => write!(f, "White"),
            Color::Black => write!(f, "Black"),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "white" | "w" => Ok(Color::White),
            "black" | "b" => Ok(Color::Black),
            _ => Err(format!("unknown team color: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    King,
    Queen,
    Rook,
    Bishop,
    Knight,
    Pawn,
}

impl PieceKind {
    pub const ALL: [PieceKind; 6] = [
        PieceKind::King,
        PieceKind::Queen,
        PieceKind::Rook,
        PieceKind::Bishop,
        PieceKind::Knight,
        PieceKind::Pawn,
    ];

    /// Material value used for scores and the minimax evaluation.
    pub const fn value(self) -> i32 {
        match self {
            PieceKind::King => 900,
            PieceKind::Queen => 90,
            PieceKind::Rook => 50,
            PieceKind::Bishop => 30,
            PieceKind::Knight => 30,
            PieceKind::Pawn => 10,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            PieceKind::King => "King",
            PieceKind::Queen => "Queen",
            PieceKind::Rook => "Rook",
            PieceKind::Bishop => "Bishop",
            PieceKind::Knight => "Knight",
            PieceKind::Pawn => "Pawn",
        }
    }

    pub fn symbol(self, color: Color) -> char {
        let c = match self {
            PieceKind::King => 'k',
            PieceKind::Queen => 'q',
            PieceKind::Rook => 'r',
            PieceKind::Bishop => 'b',
            PieceKind::Knight => 'n',
            PieceKind::Pawn => 'p',
        };
        match color {
            Color::White => c.to_ascii_uppercase(),
            Color::Black => c,
        }
    }
}

impl fmt::Display for PieceKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for PieceKind {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PieceKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ChessError::UnknownPieceKind(s.to_string()))
    }
}

/// A (file, rank) pair. Coordinates are signed so move generation can step
/// off the edge and ask `is_on_board` afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Square {
    pub file: i8,
    pub rank: i8,
}

impl Square {
    pub const fn new(file: i8, rank: i8) -> Self {
        Self { file, rank }
    }

    pub fn offset(self, d_file: i8, d_rank: i8) -> Square {
        Square::new(self.file + d_file, self.rank + d_rank)
    }

    pub fn is_on_board(self) -> bool {
        (0..BOARD_SIZE).contains(&self.file) && (0..BOARD_SIZE).contains(&self.rank)
    }

    /// Every square of the board, rank by rank from a1.
    pub fn all() -> impl Iterator<Item = Square> {
        (0..BOARD_SIZE).flat_map(|rank| (0..BOARD_SIZE).map(move |file| Square::new(file, rank)))
    }
}

impl fmt::Display for Square {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.is_on_board() {
            write!(f, "{}{}", (b'a' + self.file as u8) as char, self.rank + 1)
        } else {
            write!(f, "({},{})", self.file, self.rank)
        }
    }
}

impl FromStr for Square {
    type Err = ChessError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        if bytes.len() != 2 {
            return Err(ChessError::InvalidSquare(s.to_string()));
        }
        let file = bytes[0].to_ascii_lowercase().wrapping_sub(b'a') as i8;
        let rank = bytes[1].wrapping_sub(b'1') as i8;
        let square = Square::new(file, rank);
        if square.is_on_board() {
            Ok(square)
        } else {
            Err(ChessError::InvalidSquare(s.to_string()))
        }
    }
}

/// Slot of a piece in the board's arena. Ids stay valid after capture so a
/// simulated capture can be rolled back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PieceId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub color: Color,
    pub square: Square,
    pub has_moved: bool,
    /// Cached destinations; pseudo-legal or filtered depending on whose turn it is.
    pub legal_moves: Vec<Square>,
}

impl Piece {
    pub fn new(kind: PieceKind, color: Color, square: Square) -> Self {
        Self {
            kind,
            color,
            square,
            has_moved: false,
            legal_moves: Vec::new(),
        }
    }

    pub fn can_move_to(&self, square: Square) -> bool {
        self.legal_moves.contains(&square)
    }

    pub fn is_from_same_team(&self, other: &Piece) -> bool {
        self.color == other.color
    }
}

/// The position: an 8x8 grid of non-owning piece ids plus the arena the ids
/// point into. Detached (captured) pieces stay in the arena.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    grid: [[Option<PieceId>; BOARD_SIZE as usize]; BOARD_SIZE as usize],
    pieces: Vec<Piece>,
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

impl Board {
    pub fn new() -> Self {
        Self {
            grid: [[None; BOARD_SIZE as usize]; BOARD_SIZE as usize],
            pieces: Vec::new(),
        }
    }

    pub fn is_on_board(&self, square: Square) -> bool {
        square.is_on_board()
    }

    pub fn piece_at(&self, square: Square) -> Option<PieceId> {
        if !self.is_on_board(square) {
            return None;
        }
        self.grid[square.file as usize][square.rank as usize]
    }

    pub fn piece_on(&self, square: Square) -> Option<&Piece> {
        self.piece_at(square).map(|id| self.piece(id))
    }

    /// Overwrites a cell. Off-board squares are ignored.
    pub fn place(&mut self, square: Square, piece: Option<PieceId>) {
        if self.is_on_board(square) {
            self.grid[square.file as usize][square.rank as usize] = piece;
        }
    }

    pub fn has_live_piece(&self, id: PieceId) -> bool {
        self.grid.iter().flatten().any(|cell| *cell == Some(id))
    }

    /// O(1) form of `has_live_piece`: the cell at the piece's recorded square
    /// still holds it.
    pub fn is_live(&self, id: PieceId) -> bool {
        self.piece_at(self.piece(id).square) == Some(id)
    }

    pub fn piece(&self, id: PieceId) -> &Piece {
        &self.pieces[id.0]
    }

    pub fn piece_mut(&mut self, id: PieceId) -> &mut Piece {
        &mut self.pieces[id.0]
    }

    /// Adds a piece to the arena without placing it on the grid.
    pub fn add_piece(&mut self, piece: Piece) -> PieceId {
        self.pieces.push(piece);
        PieceId(self.pieces.len() - 1)
    }

    pub fn occupied_count(&self) -> usize {
        self.grid.iter().flatten().filter(|cell| cell.is_some()).count()
    }

    pub fn clear(&mut self) {
        *self = Board::new();
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut result = String::new();
        for rank in (0..BOARD_SIZE).rev() {
            result.push((b'1' + rank as u8) as char);
            result.push(' ');
            for file in 0..BOARD_SIZE {
                match self.piece_on(Square::new(file, rank)) {
                    Some(piece) => result.push(piece.kind.symbol(piece.color)),
                    None => result.push('.'),
                }
                if file < BOARD_SIZE - 1 {
                    result.push(' ');
                }
            }
            result.push('\n');
        }
        result.push_str("  a b c d e f g h\n");
        write!(f, "{}", result)
    }
}
