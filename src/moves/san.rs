use crate::{
    board::board::Board,
    moves::{
        movegenerator::generate_legal,
        moves::{Move, MoveFlag},
    },
    types::pieces::PieceName,
};

/// Renders a legal move in standard algebraic notation against the position it is played from.
/// The board is used as scratch space to decide the check/mate suffix and is left unchanged.
pub fn san(board: &mut Board, m: Move) -> String {
    let legal = generate_legal(board);
    let mut out = String::new();

    if m.is_castle() {
        out.push_str(match m.flag() {
            MoveFlag::CastleKing => "O-O",
            _ => "O-O-O",
        });
    } else {
        let piece = m.piece();
        if piece == PieceName::Pawn {
            if m.is_capture() {
                out.push((b'a' + m.from().file() as u8) as char);
            }
        } else {
            out.push(piece.letter());
            disambiguate(&mut out, m, legal.as_slice());
        }
        if m.is_capture() {
            out.push('x');
        }
        out.push_str(&m.to().to_string());
        if let Some(promotion) = m.promotion() {
            out.push('=');
            out.push(promotion.letter());
        }
    }

    if board.make(m) {
        if board.is_mate() {
            out.push('#');
        } else if board.in_check(board.stm) {
            out.push('+');
        }
        board.undo();
    }

    out
}

/// Appends the origin file, rank, or full square when another piece of the same type could also
/// reach the destination
fn disambiguate(out: &mut String, m: Move, legal: &[Move]) {
    let rivals: Vec<&Move> = legal
        .iter()
        .filter(|other| {
            other.from() != m.from()
                && other.to() == m.to()
                && other.piece() == m.piece()
                && other.promotion() == m.promotion()
        })
        .collect();
    if rivals.is_empty() {
        return;
    }
    let shares_file = rivals.iter().any(|other| other.from().file() == m.from().file());
    let shares_rank = rivals.iter().any(|other| other.from().rank() == m.from().rank());
    let file = (b'a' + m.from().file() as u8) as char;
    let rank = (b'1' + m.from().rank() as u8) as char;
    if !shares_file {
        out.push(file);
    } else if !shares_rank {
        out.push(rank);
    } else {
        out.push(file);
        out.push(rank);
    }
}
