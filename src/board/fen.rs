use std::str::FromStr;

use thiserror::Error;

use crate::{
    moves::moves::Castle,
    types::{
        pieces::{Color, Piece},
        square::Square,
    },
};

use super::board::Board;

/// Fen string for the starting position of a board
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum FenError {
    #[error("missing {0} field")]
    MissingField(&'static str),
    #[error("expected 8 ranks, found {0}")]
    BadRankCount(usize),
    #[error("rank {0} does not describe 8 squares")]
    BadRankWidth(usize),
    #[error("invalid side to move {0:?}")]
    BadSideToMove(String),
    #[error("invalid castling availability {0:?}")]
    BadCastling(String),
    #[error("invalid en passant target {0:?}")]
    BadEnPassant(String),
    #[error("invalid clock field {0:?}")]
    BadClock(String),
}

/// Builds a board from a FEN record: piece placement, side to move, castling availability,
/// en passant target, then the optional halfmove and fullmove clocks
pub fn parse_fen(fen: &str) -> Result<Board, FenError> {
    let mut board = Board::default();
    let mut fields = fen.split_whitespace();

    let placement = fields.next().ok_or(FenError::MissingField("piece placement"))?;
    let ranks: Vec<&str> = placement.split('/').collect();
    if ranks.len() != 8 {
        return Err(FenError::BadRankCount(ranks.len()));
    }
    for (i, rank_str) in ranks.iter().enumerate() {
        // FEN lists the top rank first; our squares count from a1
        let rank = 7 - i;
        let mut file = 0usize;
        for c in rank_str.chars() {
            if let Some(gap) = c.to_digit(10) {
                file += gap as usize;
            } else if let Some(piece) = Piece::from_char(c) {
                if file >= 8 {
                    return Err(FenError::BadRankWidth(rank + 1));
                }
                board.place_piece(piece.name, piece.color, Square((rank * 8 + file) as u32));
                file += 1;
            }
            // Anything else in a rank descriptor is tolerated and skipped
        }
        if file > 8 {
            return Err(FenError::BadRankWidth(rank + 1));
        }
    }

    let side = fields.next().ok_or(FenError::MissingField("side to move"))?;
    board.stm = match side {
        "w" => Color::White,
        "b" => Color::Black,
        _ => return Err(FenError::BadSideToMove(side.to_string())),
    };

    let castling = fields.next().ok_or(FenError::MissingField("castling availability"))?;
    board.castling_rights = parse_castling(castling)
        .ok_or_else(|| FenError::BadCastling(castling.to_string()))?;

    let en_passant = fields.next().ok_or(FenError::MissingField("en passant target"))?;
    board.en_passant_square = match en_passant {
        "-" => None,
        s => {
            let sq = Square::from_algebraic(s)
                .filter(|sq| sq.rank() == 2 || sq.rank() == 5)
                .ok_or_else(|| FenError::BadEnPassant(s.to_string()))?;
            Some(sq)
        }
    };

    // Clock fields are commonly omitted in test positions; default them when absent
    if let Some(halfmove) = fields.next() {
        board.halfmove_clock =
            halfmove.parse().map_err(|_| FenError::BadClock(halfmove.to_string()))?;
    }
    if let Some(fullmove) = fields.next() {
        board.fullmove_number =
            fullmove.parse().map_err(|_| FenError::BadClock(fullmove.to_string()))?;
    }

    board.zobrist = board.generate_key();
    Ok(board)
}

fn parse_castling(field: &str) -> Option<u8> {
    if field == "-" {
        return Some(0);
    }
    let mut rights = 0;
    for c in field.chars() {
        rights |= match c {
            'K' => Castle::WhiteKing as u8,
            'Q' => Castle::WhiteQueen as u8,
            'k' => Castle::BlackKing as u8,
            'q' => Castle::BlackQueen as u8,
            _ => return None,
        };
    }
    Some(rights)
}

impl FromStr for Board {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_fen(s)
    }
}

impl Board {
    /// Serializes the position back into a FEN record
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();
        for rank in (0..8).rev() {
            let mut gap = 0;
            for file in 0..8 {
                match self.colored_piece_at(Square(rank * 8 + file)) {
                    Some(piece) => {
                        if gap > 0 {
                            fen.push(char::from_digit(gap, 10).unwrap());
                            gap = 0;
                        }
                        fen.push(piece.char());
                    }
                    None => gap += 1,
                }
            }
            if gap > 0 {
                fen.push(char::from_digit(gap, 10).unwrap());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(match self.stm {
            Color::White => 'w',
            Color::Black => 'b',
        });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (castle, c) in [
                (Castle::WhiteKing, 'K'),
                (Castle::WhiteQueen, 'Q'),
                (Castle::BlackKing, 'k'),
                (Castle::BlackQueen, 'q'),
            ] {
                if self.can_castle(castle) {
                    fen.push(c);
                }
            }
        }

        match self.en_passant_square {
            Some(sq) => fen.push_str(&format!(" {sq}")),
            None => fen.push_str(" -"),
        }
        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }
}
