use strum::IntoEnumIterator;

use crate::{
    board::board::Board,
    moves::moves::Move,
    types::{bitboard::Bitboard, pieces::PieceName},
};

impl Board {
    /// Static exchange evaluation: the net material outcome of playing out every capture on the
    /// destination square, each side always recapturing with its least valuable attacker and
    /// standing pat as soon as continuing would lose material. Positive means the side to move
    /// comes out ahead.
    pub fn see(&self, m: Move) -> i32 {
        let dest = m.to();
        let mut gain = [0i32; 32];
        gain[0] = if m.is_en_passant() {
            PieceName::Pawn.value()
        } else {
            self.piece_at(dest).map_or(0, PieceName::value)
        };

        let mut side = !self.stm;
        let mut occupied = self.occupancies();
        let mut attackers = self.attackers(dest, occupied);
        let mut from_bb = m.from().bitboard();
        let mut moving_piece = m.piece();
        let mut depth = 0;

        while depth + 1 < gain.len() {
            depth += 1;
            gain[depth] = moving_piece.value() - gain[depth - 1];

            // Lift the capturer off the board; sliders hiding behind it join the fray
            attackers &= !from_bb;
            occupied &= !from_bb;
            if matches!(
                moving_piece,
                PieceName::Pawn | PieceName::Bishop | PieceName::Rook | PieceName::Queen
            ) {
                attackers |= self.xray_attackers(dest, occupied);
            }

            let my_attackers = attackers & self.color(side);
            if my_attackers == Bitboard::EMPTY {
                break;
            }
            let mut next = None;
            for p in PieceName::iter() {
                let bb = my_attackers & self.bitboard(side, p);
                if bb != Bitboard::EMPTY {
                    next = Some((p, bb.lsb_bb()));
                    break;
                }
            }
            let (piece, bb) = next.expect("an attacker was present");
            moving_piece = piece;
            from_bb = bb;
            side = !side;
        }

        // Collapse the swap list: at every step the capturer may instead stand pat. The entry at
        // the final depth was stored before the attacker search came up empty, so it is skipped.
        while depth > 1 {
            depth -= 1;
            gain[depth - 1] = -((-gain[depth - 1]).max(gain[depth]));
        }
        gain[0]
    }
}
