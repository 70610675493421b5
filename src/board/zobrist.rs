use lazy_static::lazy_static;
use strum::IntoEnumIterator;

use crate::{
    board::board::Board,
    moves::magics::SplitMix64,
    types::{
        bitboard::Bitboard,
        pieces::{Color, PieceName, NUM_PIECES},
    },
};

const KEY_SEED: u64 = 0xD15E_A5E5_B0A7_10AD;

lazy_static! {
    pub static ref ZOBRIST: Zobrist = Zobrist::new();
}

/// Random keys hashed together to identify a position. Drawn once from a fixed-seed generator so
/// hashes are stable across runs, which keeps tests and repetition histories reproducible.
pub struct Zobrist {
    pub pieces: [[[u64; 64]; NUM_PIECES]; 2],
    /// One key per castling right, in the order WK, WQ, BK, BQ (matching the rights bits)
    pub castling: [u64; 4],
    pub en_passant_file: [u64; 8],
    pub side_to_move: u64,
}

impl Zobrist {
    fn new() -> Self {
        let mut rng = SplitMix64::new(KEY_SEED);
        let mut pieces = [[[0; 64]; NUM_PIECES]; 2];
        for color in &mut pieces {
            for piece in color.iter_mut() {
                for sq in piece.iter_mut() {
                    *sq = rng.next_u64();
                }
            }
        }
        let castling = [rng.next_u64(), rng.next_u64(), rng.next_u64(), rng.next_u64()];
        let mut en_passant_file = [0; 8];
        for file in &mut en_passant_file {
            *file = rng.next_u64();
        }
        let side_to_move = rng.next_u64();
        Self { pieces, castling, en_passant_file, side_to_move }
    }

    /// Combined key of the piece leaving `from` and arriving at `to`
    pub fn piece_move(&self, color: Color, piece: PieceName, from: usize, to: usize) -> u64 {
        self.pieces[color.idx()][piece.idx()][from] ^ self.pieces[color.idx()][piece.idx()][to]
    }
}

impl Board {
    /// Rebuilds the position key from scratch. The incrementally maintained key must always
    /// agree with this.
    pub fn generate_key(&self) -> u64 {
        let mut key = 0;
        for color in Color::iter() {
            for piece in PieceName::iter() {
                let mut bb = self.bitboard(color, piece);
                while bb != Bitboard::EMPTY {
                    let sq = bb.pop_lsb();
                    key ^= ZOBRIST.pieces[color.idx()][piece.idx()][sq.idx()];
                }
            }
        }
        for bit in 0..4 {
            if self.castling_rights & (1 << bit) != 0 {
                key ^= ZOBRIST.castling[bit];
            }
        }
        if let Some(ep) = self.en_passant_square {
            key ^= ZOBRIST.en_passant_file[ep.file() as usize];
        }
        if self.stm == Color::Black {
            key ^= ZOBRIST.side_to_move;
        }
        key
    }
}
