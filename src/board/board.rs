use core::fmt;
use strum::IntoEnumIterator;

use crate::{
    board::{
        history::{History, Snapshot},
        zobrist::ZOBRIST,
    },
    moves::{
        movegenerator::{generate_legal, MG},
        moves::{Castle, Move, CASTLING_RIGHTS},
    },
    types::{
        bitboard::Bitboard,
        pieces::{Color, Piece, PieceName, NUM_PIECES},
        square::Square,
    },
};

#[derive(Clone, PartialEq)]
pub struct Board {
    piece_bbs: [[Bitboard; NUM_PIECES]; 2],
    color_occ: [Bitboard; 2],
    all_occ: Bitboard,
    pub stm: Color,
    /// Castle availability, one bit per right: WK = 1, WQ = 2, BK = 4, BQ = 8
    pub castling_rights: u8,
    pub en_passant_square: Option<Square>,
    /// Whether each side has actually castled this game. Informational only; no rule reads it.
    pub has_castled: [bool; 2],
    pub halfmove_clock: u32,
    pub fullmove_number: u32,
    /// Plies played since this board was constructed; indexes the history ring
    pub ply: usize,
    pub zobrist: u64,
    history: History,
}

impl Default for Board {
    fn default() -> Self {
        Self {
            piece_bbs: [[Bitboard::EMPTY; NUM_PIECES]; 2],
            color_occ: [Bitboard::EMPTY; 2],
            all_occ: Bitboard::EMPTY,
            stm: Color::White,
            castling_rights: 0,
            en_passant_square: None,
            has_castled: [false; 2],
            halfmove_clock: 0,
            fullmove_number: 1,
            ply: 0,
            zobrist: 0,
            history: History::default(),
        }
    }
}

impl Board {
    pub fn bitboard(&self, side: Color, piece: PieceName) -> Bitboard {
        self.piece_bbs[side.idx()][piece]
    }

    /// Both colors' pieces of one type
    pub fn piece(&self, piece: PieceName) -> Bitboard {
        self.piece_bbs[0][piece] | self.piece_bbs[1][piece]
    }

    pub fn color(&self, color: Color) -> Bitboard {
        self.color_occ[color.idx()]
    }

    pub fn occupancies(&self) -> Bitboard {
        self.all_occ
    }

    pub fn piece_at(&self, sq: Square) -> Option<PieceName> {
        if !sq.is_valid() || self.all_occ.empty(sq) {
            return None;
        }
        PieceName::iter().find(|&p| self.piece(p).occupied(sq))
    }

    pub fn color_at(&self, sq: Square) -> Option<Color> {
        if sq.is_valid() && self.color_occ[0].occupied(sq) {
            Some(Color::White)
        } else if sq.is_valid() && self.color_occ[1].occupied(sq) {
            Some(Color::Black)
        } else {
            None
        }
    }

    pub fn colored_piece_at(&self, sq: Square) -> Option<Piece> {
        Some(Piece::new(self.piece_at(sq)?, self.color_at(sq)?))
    }

    pub fn king_square(&self, color: Color) -> Square {
        self.bitboard(color, PieceName::King).lsb()
    }

    pub(crate) fn place_piece(&mut self, piece: PieceName, color: Color, sq: Square) {
        self.piece_bbs[color.idx()][piece] ^= sq.bitboard();
        self.color_occ[color.idx()] ^= sq.bitboard();
        self.all_occ ^= sq.bitboard();
        self.zobrist ^= ZOBRIST.pieces[color.idx()][piece.idx()][sq.idx()];
    }

    fn remove_piece(&mut self, sq: Square) {
        if let (Some(piece), Some(color)) = (self.piece_at(sq), self.color_at(sq)) {
            self.piece_bbs[color.idx()][piece] ^= sq.bitboard();
            self.color_occ[color.idx()] ^= sq.bitboard();
            self.all_occ ^= sq.bitboard();
            self.zobrist ^= ZOBRIST.pieces[color.idx()][piece.idx()][sq.idx()];
        }
    }

    fn move_piece(&mut self, color: Color, piece: PieceName, from: Square, to: Square) {
        let toggle = from.bitboard() | to.bitboard();
        self.piece_bbs[color.idx()][piece] ^= toggle;
        self.color_occ[color.idx()] ^= toggle;
        self.all_occ ^= toggle;
        self.zobrist ^= ZOBRIST.piece_move(color, piece, from.idx(), to.idx());
    }

    /// Every piece of either color that attacks `sq` through the given occupancy
    pub fn attackers(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        self.attackers_for_side(Color::White, sq, occupancy)
            | self.attackers_for_side(Color::Black, sq, occupancy)
    }

    pub fn attackers_for_side(&self, attacker: Color, sq: Square, occupancy: Bitboard) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        let bishops = self.piece(PieceName::Queen) | self.piece(PieceName::Bishop);
        let rooks = self.piece(PieceName::Queen) | self.piece(PieceName::Rook);
        let pawn_attacks = MG.pawn_attacks(sq, !attacker) & self.piece(PieceName::Pawn);
        let knight_attacks = MG.knight_attacks(sq) & self.piece(PieceName::Knight);
        let bishop_attacks = MG.bishop_attacks(sq, occupancy) & bishops;
        let rook_attacks = MG.rook_attacks(sq, occupancy) & rooks;
        let king_attacks = MG.king_attacks(sq) & self.piece(PieceName::King);
        (pawn_attacks | knight_attacks | bishop_attacks | rook_attacks | king_attacks)
            & self.color(attacker)
    }

    /// Sliders of either color that reach `sq` once the given occupancy is in effect, masked by
    /// that occupancy. Exchange evaluation calls this after lifting a piece off the board to
    /// discover what was hiding behind it.
    pub fn xray_attackers(&self, sq: Square, occupancy: Bitboard) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        let queens = self.piece(PieceName::Queen);
        let rooks = (self.piece(PieceName::Rook) | queens) & occupancy;
        let bishops = (self.piece(PieceName::Bishop) | queens) & occupancy;
        (MG.rook_attacks(sq, occupancy) & rooks) | (MG.bishop_attacks(sq, occupancy) & bishops)
    }

    pub fn square_attacked(&self, attacker: Color, sq: Square) -> bool {
        self.attackers_for_side(attacker, sq, self.all_occ) != Bitboard::EMPTY
    }

    pub fn in_check(&self, side: Color) -> bool {
        let king_square = self.king_square(side);
        king_square.is_valid() && self.square_attacked(!side, king_square)
    }

    /// True when either king stands attacked by the opposing side
    pub fn is_check(&self) -> bool {
        self.in_check(Color::White) || self.in_check(Color::Black)
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            piece_bbs: self.piece_bbs,
            color_occ: self.color_occ,
            all_occ: self.all_occ,
            stm: self.stm,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            has_castled: self.has_castled,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            zobrist: self.zobrist,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.piece_bbs = snapshot.piece_bbs;
        self.color_occ = snapshot.color_occ;
        self.all_occ = snapshot.all_occ;
        self.stm = snapshot.stm;
        self.castling_rights = snapshot.castling_rights;
        self.en_passant_square = snapshot.en_passant_square;
        self.has_castled = snapshot.has_castled;
        self.halfmove_clock = snapshot.halfmove_clock;
        self.fullmove_number = snapshot.fullmove_number;
        self.zobrist = snapshot.zobrist;
    }

    /// Applies a move and reports whether it was legal. Illegal moves (wrong color on the origin
    /// square, or leaving one's own king attacked) are rolled back through the history ring and
    /// leave the board unchanged.
    #[must_use]
    pub fn make(&mut self, m: Move) -> bool {
        let snapshot = self.snapshot();
        self.history.store(self.ply, snapshot);
        self.ply += 1;
        self.halfmove_clock += 1;

        let us = self.stm;
        let them = !us;
        let from = m.from();
        let to = m.to();
        let piece = m.piece();

        if !self.bitboard(us, piece).occupied(from) {
            self.undo();
            return false;
        }

        if m.is_capture() || m.is_en_passant() {
            // The en-passant victim sits one rank behind the destination
            let victim_sq = if m.is_en_passant() {
                match us {
                    Color::White => Square(to.0 - 8),
                    Color::Black => Square(to.0 + 8),
                }
            } else {
                to
            };
            self.remove_piece(victim_sq);
            self.halfmove_clock = 0;
        }

        if let Some(ep) = self.en_passant_square.take() {
            self.zobrist ^= ZOBRIST.en_passant_file[ep.file() as usize];
        }

        match piece {
            PieceName::Pawn => {
                self.halfmove_clock = 0;
                if let Some(promotion) = m.promotion() {
                    self.remove_piece(from);
                    self.place_piece(promotion, us, to);
                } else {
                    self.move_piece(us, PieceName::Pawn, from, to);
                    if to.0.abs_diff(from.0) == 16 {
                        let ep = Square((from.0 + to.0) / 2);
                        self.en_passant_square = Some(ep);
                        self.zobrist ^= ZOBRIST.en_passant_file[ep.file() as usize];
                    }
                }
            }
            PieceName::King => {
                let castle = m.castle_type(us);
                if castle != Castle::None {
                    self.move_piece(us, PieceName::Rook, castle.rook_src(), castle.rook_dest());
                    self.has_castled[us.idx()] = true;
                }
                self.move_piece(us, PieceName::King, from, to);
            }
            _ => self.move_piece(us, piece, from, to),
        }

        let new_rights = self.castling_rights & CASTLING_RIGHTS[from] & CASTLING_RIGHTS[to];
        let changed = self.castling_rights ^ new_rights;
        for bit in 0..4 {
            if changed & (1 << bit) != 0 {
                self.zobrist ^= ZOBRIST.castling[bit];
            }
        }
        self.castling_rights = new_rights;

        if self.in_check(us) {
            self.undo();
            return false;
        }

        self.stm = them;
        self.zobrist ^= ZOBRIST.side_to_move;
        if us == Color::Black {
            self.fullmove_number += 1;
        }
        true
    }

    /// Rolls the board back one ply. Does nothing at the base position.
    pub fn undo(&mut self) {
        if self.ply == 0 {
            return;
        }
        let snapshot = self.history.get(self.ply - 1);
        self.restore(snapshot);
        self.ply -= 1;
    }

    /// Passes the turn without moving a piece, for null-move pruning. Undone with `undo`.
    pub fn make_null(&mut self) {
        let snapshot = self.snapshot();
        self.history.store(self.ply, snapshot);
        self.ply += 1;
        if let Some(ep) = self.en_passant_square.take() {
            self.zobrist ^= ZOBRIST.en_passant_file[ep.file() as usize];
        }
        self.stm = !self.stm;
        self.zobrist ^= ZOBRIST.side_to_move;
    }

    pub fn can_castle(&self, c: Castle) -> bool {
        self.castling_rights & c as u8 != 0
    }

    /// Material total for one side, kings excluded
    pub fn material(&self, side: Color) -> i32 {
        PieceName::iter()
            .filter(|&p| p != PieceName::King)
            .map(|p| self.bitboard(side, p).count_bits() as i32 * p.value())
            .sum()
    }

    /// Non-pawn, non-king material; the null-move guard wants to know a real piece remains
    pub fn piece_material(&self, side: Color) -> i32 {
        PieceName::iter()
            .filter(|&p| p != PieceName::King && p != PieceName::Pawn)
            .map(|p| self.bitboard(side, p).count_bits() as i32 * p.value())
            .sum()
    }

    /// Piece count for one side, king excluded
    pub fn piece_count(&self, side: Color) -> i32 {
        (self.color(side).count_bits() - 1) as i32
    }

    pub fn is_mate(&mut self) -> bool {
        self.in_check(self.stm) && generate_legal(self).is_empty()
    }

    pub fn is_draw(&mut self) -> bool {
        if self.halfmove_clock >= 50 || self.only_kings() || self.is_repetition() {
            return true;
        }
        !self.in_check(self.stm) && generate_legal(self).is_empty()
    }

    /// One legal-move generation answering both mate and stalemate, for the search's
    /// end-of-game gate
    pub fn is_game_over(&mut self) -> bool {
        self.halfmove_clock >= 50
            || self.only_kings()
            || self.is_repetition()
            || generate_legal(self).is_empty()
    }

    fn only_kings(&self) -> bool {
        self.all_occ == self.piece(PieceName::King)
    }

    /// Walks prior positions with the same side to move across the reversible tail of the game,
    /// counting how often the current position already stood
    fn is_repetition(&self) -> bool {
        let mut count = 0;
        let mut i = self.ply.saturating_sub(self.halfmove_clock as usize);
        while i + 2 <= self.ply {
            if self.history.key(i) == self.zobrist {
                count += 1;
            }
            i += 2;
        }
        count >= 2
    }

    /// The evaluator switches king tables and shield logic on this. Both sides must be reduced:
    /// queenless with at most one rook, or a queen alongside exactly one minor and nothing else.
    pub fn is_endgame(&self) -> bool {
        Color::iter().all(|side| {
            let queens = self.bitboard(side, PieceName::Queen).count_bits();
            let rooks = self.bitboard(side, PieceName::Rook).count_bits();
            let bishops = self.bitboard(side, PieceName::Bishop).count_bits();
            let knights = self.bitboard(side, PieceName::Knight).count_bits();
            (queens == 0 && rooks <= 1)
                || (queens > 0 && knights == 1 && bishops == 0 && rooks == 0)
                || (queens > 0 && bishops == 1 && knights == 0 && rooks == 0)
        })
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        for row in (0..8).rev() {
            write!(f, "{} | ", row + 1)?;
            for col in 0..8 {
                let sq = Square(row * 8 + col);
                match self.colored_piece_at(sq) {
                    Some(piece) => write!(f, "{} | ", piece.char())?,
                    None => write!(f, "_ | ")?,
                }
            }
            writeln!(f)?;
        }
        writeln!(f, "    a   b   c   d   e   f   g   h")
    }
}

impl fmt::Debug for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} to move",
            match self.stm {
                Color::White => "White",
                Color::Black => "Black",
            }
        )?;
        write!(f, "{self}")?;
        write!(f, "Castles available: ")?;
        for (c, ch) in [
            (Castle::WhiteKing, 'K'),
            (Castle::WhiteQueen, 'Q'),
            (Castle::BlackKing, 'k'),
            (Castle::BlackQueen, 'q'),
        ] {
            if self.can_castle(c) {
                write!(f, "{ch}")?;
            }
        }
        writeln!(f)?;
        match self.en_passant_square {
            Some(sq) => writeln!(f, "En passant square: {sq}")?,
            None => writeln!(f, "En passant square: none")?,
        }
        writeln!(f, "Plies played: {}", self.ply)
    }
}

#[cfg(test)]
mod board_tests {
    use super::*;
    use crate::board::fen::{parse_fen, STARTING_FEN};
    use crate::moves::moves::MoveFlag;

    fn find_move(board: &mut Board, from: &str, to: &str) -> Move {
        let from = Square::from_algebraic(from).unwrap();
        let to = Square::from_algebraic(to).unwrap();
        *generate_legal(board)
            .iter()
            .find(|m| m.from() == from && m.to() == to)
            .expect("move should be legal")
    }

    #[test]
    fn test_make_undo_restores_everything() {
        let mut board =
            parse_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
        let reference = board.clone();
        for m in generate_legal(&mut board) {
            assert!(board.make(m), "{m} generated as legal");
            board.undo();
            assert_eq!(board.zobrist, reference.zobrist, "key differs after {m}");
            assert_eq!(board.to_fen(), reference.to_fen(), "state differs after {m}");
            assert_eq!(board.ply, reference.ply);
        }
    }

    #[test]
    fn test_incremental_key_matches_rebuilt_key() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        for (from, to) in [("e2", "e4"), ("d7", "d5"), ("e4", "d5"), ("d8", "d5"), ("e1", "e2")] {
            let m = find_move(&mut board, from, to);
            assert!(board.make(m));
            assert_eq!(board.zobrist, board.generate_key(), "after {from}{to}");
        }
    }

    #[test]
    fn test_occupancy_caches_stay_consistent() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        for (from, to) in [("g1", "f3"), ("g8", "f6"), ("d2", "d4"), ("d7", "d5")] {
            let m = find_move(&mut board, from, to);
            assert!(board.make(m));
            let mut white = Bitboard::EMPTY;
            let mut black = Bitboard::EMPTY;
            for p in PieceName::iter() {
                white |= board.bitboard(Color::White, p);
                black |= board.bitboard(Color::Black, p);
                for q in PieceName::iter() {
                    if p != q {
                        assert_eq!(board.piece(p) & board.piece(q), Bitboard::EMPTY);
                    }
                }
            }
            assert_eq!(white, board.color(Color::White));
            assert_eq!(black, board.color(Color::Black));
            assert_eq!(white | black, board.occupancies());
        }
    }

    #[test]
    fn test_wrong_color_move_rejected() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        let key = board.zobrist;
        // Black pawn push while white is to move
        let m = Move::new(
            Square::from_algebraic("e7").unwrap(),
            Square::from_algebraic("e5").unwrap(),
            PieceName::Pawn,
            false,
            MoveFlag::Normal,
        );
        assert!(!board.make(m));
        assert_eq!(board.zobrist, key);
        assert_eq!(board.ply, 0);
    }

    #[test]
    fn test_fools_mate() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        for (from, to) in [("f2", "f3"), ("e7", "e5"), ("g2", "g4"), ("d8", "h4")] {
            let m = find_move(&mut board, from, to);
            assert!(board.make(m));
        }
        assert!(board.is_check());
        assert!(board.is_mate());
        assert!(generate_legal(&mut board).is_empty());
    }

    #[test]
    fn test_castling_moves_rook_and_clears_rights() {
        let mut board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let moves = generate_legal(&mut board);
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleKing));
        assert!(moves.iter().any(|m| m.flag() == MoveFlag::CastleQueen));

        let m = find_move(&mut board, "e1", "g1");
        assert_eq!(m.flag(), MoveFlag::CastleKing);
        assert!(board.make(m));
        assert_eq!(board.piece_at(Square::G1), Some(PieceName::King));
        assert_eq!(board.piece_at(Square::F1), Some(PieceName::Rook));
        assert_eq!(board.piece_at(Square::H1), None);
        assert!(!board.can_castle(Castle::WhiteKing));
        assert!(!board.can_castle(Castle::WhiteQueen));
        assert!(board.can_castle(Castle::BlackKing));
        assert!(board.has_castled[Color::White.idx()]);
    }

    #[test]
    fn test_en_passant_capture() {
        let mut board =
            parse_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
        let m = find_move(&mut board, "e5", "f6");
        assert_eq!(m.flag(), MoveFlag::EnPassant);
        assert!(board.make(m));
        assert_eq!(board.piece_at(Square::from_algebraic("f5").unwrap()), None);
        assert_eq!(
            board.piece_at(Square::from_algebraic("f6").unwrap()),
            Some(PieceName::Pawn)
        );
        assert_eq!(board.en_passant_square, None);
    }

    #[test]
    fn test_threefold_repetition() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        let shuffle = [
            ("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8"),
            ("g1", "f3"), ("g8", "f6"), ("f3", "g1"), ("f6", "g8"),
        ];
        for (i, (from, to)) in shuffle.iter().enumerate() {
            assert!(!board.is_draw(), "draw before shuffle move {i}");
            let m = find_move(&mut board, from, to);
            assert!(board.make(m));
        }
        assert!(board.is_draw());
        assert!(!board.is_mate());
    }

    #[test]
    fn test_bare_kings_draw() {
        let mut board = parse_fen("8/4k3/8/8/8/8/3K4/8 w - - 0 1").unwrap();
        assert!(board.is_draw());
    }

    #[test]
    fn test_endgame_patterns() {
        // Rook endings and queen-plus-single-minor both qualify
        assert!(parse_fen("4k3/8/8/8/8/8/8/R3K3 w - - 0 1").unwrap().is_endgame());
        assert!(parse_fen("4kq1n/8/8/8/8/8/8/4KQ1N w - - 0 1").unwrap().is_endgame());
        // Full starting armies do not
        assert!(!parse_fen(STARTING_FEN).unwrap().is_endgame());
        // A queen beside a rook does not
        assert!(!parse_fen("4k3/8/8/8/8/8/8/QR2K3 w - - 0 1").unwrap().is_endgame());
    }

    #[test]
    fn test_mate_implies_check_and_no_moves() {
        let mut mated = parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
            .unwrap();
        assert!(mated.is_mate());
        assert!(mated.is_check());
        assert_eq!(generate_legal(&mut mated).len(), 0);
    }
}
