use lazy_static::lazy_static;

use crate::{
    board::board::Board,
    moves::{
        attack_boards::{self, RANK2, RANK7},
        magics::Magics,
        movelist::MoveList,
        moves::{Castle, Direction, Move, MoveFlag},
    },
    types::{
        bitboard::Bitboard,
        pieces::{Color, PieceName},
        square::Square,
    },
};

lazy_static! {
    /// Process-wide attack tables, built once on first use and read-only afterwards
    pub static ref MG: MoveGenerator = MoveGenerator::default();
}

pub struct MoveGenerator {
    magics: Magics,
}

impl Default for MoveGenerator {
    fn default() -> Self {
        Self { magics: Magics::default() }
    }
}

impl MoveGenerator {
    pub fn rook_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        self.magics.rook_attacks(sq, occupied)
    }

    pub fn bishop_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        self.magics.bishop_attacks(sq, occupied)
    }

    pub fn queen_attacks(&self, sq: Square, occupied: Bitboard) -> Bitboard {
        self.rook_attacks(sq, occupied) | self.bishop_attacks(sq, occupied)
    }

    pub fn knight_attacks(&self, sq: Square) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        attack_boards::knight_attacks(sq)
    }

    pub fn king_attacks(&self, sq: Square) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        attack_boards::king_attacks(sq)
    }

    pub fn pawn_attacks(&self, sq: Square, attacker: Color) -> Bitboard {
        if !sq.is_valid() {
            return Bitboard::EMPTY;
        }
        attack_boards::pawn_attacks(sq, attacker)
    }

    pub fn rook_mask(&self, sq: Square) -> Bitboard {
        self.magics.rook_mask(sq)
    }

    pub fn bishop_mask(&self, sq: Square) -> Bitboard {
        self.magics.bishop_mask(sq)
    }
}

/// Fills `moves` with every pseudo-legal move for the side to move, pawns first, then knights,
/// king, rooks, bishops and queens. Returns the count. Moves that leave the king attacked are
/// filtered later by make/undo.
pub fn generate_pseudo_legal(board: &Board, moves: &mut MoveList) -> usize {
    generate_pawn_moves(board, moves);
    generate_piece_moves(board, PieceName::Knight, moves);
    generate_king_moves(board, moves);
    generate_piece_moves(board, PieceName::Rook, moves);
    generate_piece_moves(board, PieceName::Bishop, moves);
    generate_piece_moves(board, PieceName::Queen, moves);
    moves.len()
}

/// Pseudo-legal generation followed by the make/undo legality filter
pub fn generate_legal(board: &mut Board) -> MoveList {
    let mut pseudo = MoveList::default();
    generate_pseudo_legal(board, &mut pseudo);
    let mut legal = MoveList::default();
    for &m in &pseudo {
        if board.make(m) {
            board.undo();
            legal.push(m);
        }
    }
    legal
}

/// Legal captures and promotions only, for quiescence
pub fn generate_captures_and_promotions(board: &mut Board) -> MoveList {
    generate_legal(board).into_iter().filter(|m| m.is_tactical()).collect()
}

fn generate_pawn_moves(board: &Board, moves: &mut MoveList) {
    let us = board.stm;
    let pawns = board.bitboard(us, PieceName::Pawn);
    let vacancies = !board.occupancies();
    let enemies = board.color(!us);

    let (up, start_rank, promo_rank) = match us {
        Color::White => (Direction::North, RANK2, attack_boards::RANK8),
        Color::Black => (Direction::South, RANK7, attack_boards::RANK1),
    };
    let down = up.opp();
    let (up_left, up_right) = match us {
        Color::White => (Direction::NorthWest, Direction::NorthEast),
        Color::Black => (Direction::SouthEast, Direction::SouthWest),
    };

    let push = |moves: &mut MoveList, dest: Square, src: Square, capture: bool| {
        if promo_rank.occupied(dest) {
            for flag in [
                MoveFlag::QueenPromotion,
                MoveFlag::KnightPromotion,
                MoveFlag::RookPromotion,
                MoveFlag::BishopPromotion,
            ] {
                moves.push(Move::new(src, dest, PieceName::Pawn, capture, flag));
            }
        } else {
            moves.push(Move::new(src, dest, PieceName::Pawn, capture, MoveFlag::Normal));
        }
    };

    // Single pushes, promotions included
    for dest in pawns.shift(up) & vacancies {
        push(moves, dest, dest.shift(down), false);
    }

    // Double pushes from the starting rank, both squares vacant
    let first_step = (pawns & start_rank).shift(up) & vacancies;
    for dest in first_step.shift(up) & vacancies {
        moves.push(Move::new(
            dest.shift(down).shift(down),
            dest,
            PieceName::Pawn,
            false,
            MoveFlag::Normal,
        ));
    }

    // Diagonal captures, capture-promotions included
    for dest in pawns.shift(up_left) & enemies {
        push(moves, dest, dest.shift(up_left.opp()), true);
    }
    for dest in pawns.shift(up_right) & enemies {
        push(moves, dest, dest.shift(up_right.opp()), true);
    }

    // En passant: our pawns standing where an enemy pawn of the target square would strike
    if let Some(ep) = board.en_passant_square {
        for src in MG.pawn_attacks(ep, !us) & pawns {
            moves.push(Move::new(src, ep, PieceName::Pawn, true, MoveFlag::EnPassant));
        }
    }
}

fn generate_king_moves(board: &Board, moves: &mut MoveList) {
    let us = board.stm;
    let enemies = board.color(!us);
    for src in board.bitboard(us, PieceName::King) {
        for dest in MG.king_attacks(src) & !board.color(us) {
            moves.push(Move::new(src, dest, PieceName::King, enemies.occupied(dest), MoveFlag::Normal));
        }
    }
    generate_castling_moves(board, moves);
}

fn generate_castling_moves(board: &Board, moves: &mut MoveList) {
    let us = board.stm;
    let (castles, king_src) = match us {
        Color::White => ([Castle::WhiteKing, Castle::WhiteQueen], Square::E1),
        Color::Black => ([Castle::BlackKing, Castle::BlackQueen], Square::E8),
    };
    if !board.bitboard(us, PieceName::King).occupied(king_src) {
        return;
    }
    'castles: for castle in castles {
        if !board.can_castle(castle)
            || !board.bitboard(us, PieceName::Rook).occupied(castle.rook_src())
            || castle.empty_squares() & board.occupancies() != Bitboard::EMPTY
        {
            continue;
        }
        // The king may not castle out of, through, or into an attack
        for sq in castle.check_squares() {
            if board.square_attacked(!us, sq) {
                continue 'castles;
            }
        }
        let flag = match castle {
            Castle::WhiteKing | Castle::BlackKing => MoveFlag::CastleKing,
            _ => MoveFlag::CastleQueen,
        };
        moves.push(Move::new(king_src, castle.king_dest(), PieceName::King, false, flag));
    }
}

fn generate_piece_moves(board: &Board, piece: PieceName, moves: &mut MoveList) {
    let us = board.stm;
    let enemies = board.color(!us);
    let occupancies = board.occupancies();
    for src in board.bitboard(us, piece) {
        let attacks = match piece {
            PieceName::Knight => MG.knight_attacks(src),
            PieceName::Rook => MG.rook_attacks(src, occupancies),
            PieceName::Bishop => MG.bishop_attacks(src, occupancies),
            PieceName::Queen => MG.queen_attacks(src, occupancies),
            _ => unreachable!("pawns and kings have dedicated generators"),
        };
        for dest in attacks & !board.color(us) {
            moves.push(Move::new(src, dest, piece, enemies.occupied(dest), MoveFlag::Normal));
        }
    }
}

#[cfg(test)]
mod movegen_tests {
    use super::*;
    use crate::board::fen::{parse_fen, STARTING_FEN};

    #[test]
    fn test_start_position_move_counts() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        let mut pseudo = MoveList::default();
        let n = generate_pseudo_legal(&board, &mut pseudo);
        assert_eq!(n, 20);
        // Nothing is pinned in the opening position, so the filter keeps everything
        assert_eq!(generate_legal(&mut board).len(), 20);
    }

    #[test]
    fn test_legal_filter_removes_pinned_piece_moves() {
        // The e4 knight is pinned against the white king by the e8 rook
        let mut board = parse_fen("4r1k1/8/8/8/4N3/8/8/4K3 w - - 0 1").unwrap();
        let legal = generate_legal(&mut board);
        assert!(legal.iter().all(|m| m.piece() != PieceName::Knight));
        let mut pseudo = MoveList::default();
        generate_pseudo_legal(&board, &mut pseudo);
        assert!(pseudo.len() > legal.len());
    }

    #[test]
    fn test_promotions_emitted_in_order() {
        let mut board = parse_fen("8/P7/8/8/8/8/k6K/8 w - - 0 1").unwrap();
        let legal = generate_legal(&mut board);
        let promos: Vec<MoveFlag> = legal
            .iter()
            .filter(|m| m.piece() == PieceName::Pawn && m.promotion().is_some())
            .map(|m| m.flag())
            .collect();
        assert_eq!(
            promos,
            vec![
                MoveFlag::QueenPromotion,
                MoveFlag::KnightPromotion,
                MoveFlag::RookPromotion,
                MoveFlag::BishopPromotion
            ]
        );
    }

    #[test]
    fn test_castling_requires_clear_safe_path() {
        // Both castles available and playable
        let mut board = parse_fen("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1").unwrap();
        let legal = generate_legal(&mut board);
        assert_eq!(legal.iter().filter(|m| m.is_castle()).count(), 2);

        // A rook eyeing f1 forbids kingside but not queenside
        let mut board = parse_fen("5r2/8/8/8/8/8/8/R3K2R w KQ - 0 1").unwrap();
        let legal = generate_legal(&mut board);
        let castles: Vec<Move> = legal.iter().filter(|m| m.is_castle()).copied().collect();
        assert_eq!(castles.len(), 1);
        assert_eq!(castles[0].flag(), MoveFlag::CastleQueen);

        // Occupied transit square forbids castling regardless of rights
        let mut board = parse_fen("4k3/8/8/8/8/8/8/R2QK2R w KQ - 0 1").unwrap();
        let legal = generate_legal(&mut board);
        assert_eq!(legal.iter().filter(|m| m.flag() == MoveFlag::CastleQueen).count(), 0);
        assert_eq!(legal.iter().filter(|m| m.flag() == MoveFlag::CastleKing).count(), 1);
    }

    #[test]
    fn test_captures_and_promotions_only_tactical() {
        let mut board =
            parse_fen("rnbqkbnr/ppp1p1pp/8/3pPp2/8/8/PPPP1PPP/RNBQKBNR w KQkq f6 0 3").unwrap();
        let tactical = generate_captures_and_promotions(&mut board);
        assert!(!tactical.is_empty());
        assert!(tactical.iter().all(|m| m.is_capture() || m.promotion().is_some()));
        // The en passant capture on f6 is among them
        assert!(tactical.iter().any(|m| m.flag() == MoveFlag::EnPassant));
    }

    #[test]
    fn test_en_passant_respects_pins() {
        // Capturing en passant would expose the white king to the h5 rook
        let mut board = parse_fen("8/8/8/K2pP2r/8/8/8/4k3 w - d6 0 1").unwrap();
        let legal = generate_legal(&mut board);
        assert!(legal.iter().all(|m| m.flag() != MoveFlag::EnPassant));
    }
}
