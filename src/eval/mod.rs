pub mod tables;

use crate::{
    board::board::Board,
    moves::{movegenerator::MG, moves::Direction},
    search::{DRAW, MATE},
    types::{bitboard::Bitboard, pieces::Color, pieces::PieceName},
};

use self::tables::*;

/// The seam between board knowledge and the searcher. Scores are centipawns from the
/// side-to-move's perspective; mates score `-MATE` plus the ply count so nearer mates dominate.
pub trait Evaluate {
    fn evaluate(&self, board: &mut Board) -> i32;
}

/// Material, piece placement, pawn structure, king tropism and king shelter
#[derive(Clone, Copy, Default)]
pub struct Evaluator;

impl Evaluate for Evaluator {
    fn evaluate(&self, board: &mut Board) -> i32 {
        if board.is_mate() {
            return -MATE + board.ply as i32;
        }
        if board.is_draw() {
            return DRAW;
        }
        let endgame = board.is_endgame();
        let score = self.side_score(board, Color::White, endgame)
            - self.side_score(board, Color::Black, endgame)
            + imbalance(board);
        match board.stm {
            Color::White => score,
            Color::Black => -score,
        }
    }
}

/// Being ahead is worth more when the board is emptier: trading pieces flatters the side with
/// the material edge
fn imbalance(board: &Board) -> i32 {
    let white = board.material(Color::White);
    let black = board.material(Color::Black);
    let white_count = board.piece_count(Color::White);
    let black_count = board.piece_count(Color::Black);
    if white > black {
        45 + 3 * white_count - 6 * black_count
    } else if black > white {
        -(45 + 3 * black_count - 6 * white_count)
    } else {
        0
    }
}

impl Evaluator {
    fn side_score(&self, board: &Board, side: Color, endgame: bool) -> i32 {
        let mut score = board.material(side);

        for (piece, table) in [
            (PieceName::Pawn, &PAWN_PST),
            (PieceName::Knight, &KNIGHT_PST),
            (PieceName::Bishop, &BISHOP_PST),
            (PieceName::Rook, &ROOK_PST),
            (PieceName::Queen, &QUEEN_PST),
        ] {
            for sq in board.bitboard(side, piece) {
                score += pst(table, side, sq);
            }
        }

        score += self.pawn_structure(board, side);
        score += self.king_tropism(board, side, endgame);
        if board.bitboard(side, PieceName::Bishop).count_bits() >= 2 {
            score += BISHOP_PAIR_BONUS;
        }
        score += self.rook_bonuses(board, side);
        score += self.king_score(board, side, endgame);
        score
    }

    fn pawn_structure(&self, board: &Board, side: Color) -> i32 {
        let mut score = 0;
        let own_pawns = board.bitboard(side, PieceName::Pawn);
        let enemy_pawns = board.bitboard(!side, PieceName::Pawn);
        let forward = match side {
            Color::White => Direction::North,
            Color::Black => Direction::South,
        };
        for sq in own_pawns {
            if (PASSED_PAWN_MASKS[side.idx()][sq.idx()] & enemy_pawns).is_empty() {
                score += PASSED_PAWN_BONUS;
            }
            if (ISOLATED_PAWN_MASKS[sq.idx()] & own_pawns).is_empty() {
                score -= ISOLATED_PAWN_PENALTY;
            }
            // Backward: the stop square is covered by an enemy pawn and no friend can defend it
            if let Some(stop) = sq.checked_shift(forward) {
                let stop_attacked = MG.pawn_attacks(stop, side) & enemy_pawns != Bitboard::EMPTY;
                if stop_attacked
                    && (BACKWARD_PAWN_MASKS[side.idx()][sq.idx()] & own_pawns).is_empty()
                {
                    score -= BACKWARD_PAWN_PENALTY;
                }
            }
            if sq.file_bitboard() & own_pawns & !sq.bitboard() != Bitboard::EMPTY {
                score -= DOUBLED_PAWN_PENALTY;
            }
        }
        score
    }

    fn king_tropism(&self, board: &Board, side: Color, endgame: bool) -> i32 {
        let enemy_king = board.king_square(!side);
        if !enemy_king.is_valid() {
            return 0;
        }
        let mut score = 0;
        for sq in board.bitboard(side, PieceName::Pawn) {
            let d = sq.dist(enemy_king) as usize;
            score += OPP_PAWN_TROPISM[d];
            if endgame {
                score += OWN_PAWN_TROPISM[d];
            }
        }
        for (piece, table) in [
            (PieceName::Knight, KNIGHT_TROPISM),
            (PieceName::Bishop, BISHOP_TROPISM),
            (PieceName::Rook, ROOK_TROPISM),
            (PieceName::Queen, QUEEN_TROPISM),
        ] {
            for sq in board.bitboard(side, piece) {
                score += table[sq.dist(enemy_king) as usize];
            }
        }
        score
    }

    fn rook_bonuses(&self, board: &Board, side: Color) -> i32 {
        let mut score = 0;
        let own_pawns = board.bitboard(side, PieceName::Pawn);
        let enemy_pawns = board.bitboard(!side, PieceName::Pawn);
        let rooks = board.bitboard(side, PieceName::Rook);
        for sq in rooks {
            let file = sq.file_bitboard();
            for pawn_sq in file & own_pawns {
                let passed =
                    (PASSED_PAWN_MASKS[side.idx()][pawn_sq.idx()] & enemy_pawns).is_empty();
                let behind = match side {
                    Color::White => sq < pawn_sq,
                    Color::Black => sq > pawn_sq,
                };
                if passed && behind {
                    score += ROOK_BEHIND_PASSER_BONUS;
                    break;
                }
            }
            if (file & enemy_pawns).is_empty() {
                score += ROOK_OPEN_FILE_BONUS;
                if file & rooks & !sq.bitboard() != Bitboard::EMPTY {
                    score += DOUBLED_ROOKS_OPEN_FILE_BONUS;
                }
            }
        }
        score
    }

    fn king_score(&self, board: &Board, side: Color, endgame: bool) -> i32 {
        let king = board.king_square(side);
        if !king.is_valid() {
            return 0;
        }
        if endgame {
            return pst(&KING_ENDGAME_PST, side, king);
        }
        let mut score = pst(&KING_MIDGAME_PST, side, king);
        let king_bb = king.bitboard();
        let own_pawns = board.bitboard(side, PieceName::Pawn);
        let strong = match side {
            Color::White => {
                king_bb.shift(Direction::NorthWest)
                    | king_bb.shift(Direction::North)
                    | king_bb.shift(Direction::NorthEast)
            }
            Color::Black => {
                king_bb.shift(Direction::SouthEast)
                    | king_bb.shift(Direction::South)
                    | king_bb.shift(Direction::SouthWest)
            }
        };
        let weak = match side {
            Color::White => strong.shift(Direction::North),
            Color::Black => strong.shift(Direction::South),
        };
        score += STRONG_SHIELD_BONUS * (strong & own_pawns).count_bits() as i32;
        score += WEAK_SHIELD_BONUS * (weak & own_pawns).count_bits() as i32;
        score
    }
}
