use std::cmp::Reverse;

use crate::{
    board::board::Board,
    moves::{movegenerator::generate_captures_and_promotions, moves::Move},
    search::{search::Searcher, MAX_PLY},
};

impl Searcher {
    /// Extends the search past its nominal depth through captures and promotions only, so the
    /// static evaluation is never taken in the middle of an exchange. In check the position is
    /// not quiet at all and a one-ply full-width search handles the evasions.
    pub(crate) fn quiescence(
        &mut self,
        board: &mut Board,
        mut alpha: i32,
        beta: i32,
        ply: usize,
    ) -> i32 {
        self.ctx.pv_len[ply] = ply;
        if ply >= MAX_PLY - 1 {
            return self.evaluate(board);
        }
        if board.in_check(board.stm) {
            return self.alpha_beta(board, alpha, beta, 1, ply);
        }
        self.ctx.stats.qnodes += 1;

        let stand_pat = self.evaluate(board);
        if stand_pat >= beta {
            return stand_pat;
        }
        alpha = alpha.max(stand_pat);

        // Losing exchanges are dropped outright; the rest are tried best trade first
        let mut captures: Vec<(Move, i32)> = generate_captures_and_promotions(board)
            .into_iter()
            .map(|m| (m, board.see(m)))
            .filter(|&(_, see)| see >= 0)
            .collect();
        captures.sort_by_key(|&(_, see)| Reverse(see));

        for (m, _) in captures {
            if !board.make(m) {
                continue;
            }
            let score = -self.quiescence(board, -beta, -alpha, ply + 1);
            board.undo();
            if score >= beta {
                return score;
            }
            if score > alpha {
                alpha = score;
                self.ctx.record_pv(ply, m);
            }
        }
        alpha
    }
}

#[cfg(test)]
mod quiescence_tests {
    use crate::board::fen::parse_fen;
    use crate::search::search::Searcher;
    use crate::search::INFINITY;

    #[test]
    fn test_stand_pat_bounds_quiet_positions() {
        let mut board = parse_fen("4k3/8/8/8/8/8/8/4K3 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(2);
        let score = searcher.quiescence(&mut board, -INFINITY, INFINITY, 0);
        // Bare kings: the draw score comes straight back
        assert_eq!(score, 0);
    }

    #[test]
    fn test_does_not_stop_mid_exchange() {
        use crate::eval::{Evaluate, Evaluator};

        // White queen takes a rook that is defended by a pawn; quiescence must see the
        // recapture rather than trusting the material count after QxR
        let mut board = parse_fen("4k3/2p5/3r4/8/8/8/3Q4/4K3 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(2);
        let score = searcher.quiescence(&mut board, -INFINITY, INFINITY, 0);
        // Qxd6 loses the queen for a rook, so the best line is to stand pat
        let mut quiet = parse_fen("4k3/2p5/3r4/8/8/8/3Q4/4K3 w - - 0 1").unwrap();
        assert_eq!(score, Evaluator.evaluate(&mut quiet));
    }
}
