use std::time::Instant;

use crate::{
    board::board::Board,
    eval::{Evaluate, Evaluator},
    moves::{
        movegenerator::generate_pseudo_legal,
        movelist::MoveList,
        moves::Move,
    },
    search::{SearchContext, SearchStats, INFINITY, MAX_PLY, NULL_MOVE_MATERIAL, NULL_MOVE_REDUCTION},
    types::pieces::Color,
};

pub const DEFAULT_DEPTH: usize = 5;

/// Iterative-deepening negamax searcher with alpha-beta pruning, principal variation search,
/// null-move pruning and a quiescence tail. One searcher owns one `SearchContext`; separate
/// searchers never share state, so independent games can search concurrently.
pub struct Searcher {
    max_depth: usize,
    evaluator: Box<dyn Evaluate>,
    pub(crate) ctx: Box<SearchContext>,
    /// Print a Titan-style info line after each deepening iteration
    pub verbose: bool,
}

impl Default for Searcher {
    fn default() -> Self {
        Self::new(DEFAULT_DEPTH)
    }
}

impl Searcher {
    pub fn new(max_depth: usize) -> Self {
        Self {
            max_depth,
            evaluator: Box::new(Evaluator),
            ctx: Box::<SearchContext>::default(),
            verbose: false,
        }
    }

    pub fn set_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluate>) {
        self.evaluator = evaluator;
    }

    pub fn stats(&self) -> SearchStats {
        self.ctx.stats
    }

    pub(crate) fn evaluate(&self, board: &mut Board) -> i32 {
        self.evaluator.evaluate(board)
    }

    pub fn principal_variation(&self) -> &[Move] {
        self.ctx.principal_variation()
    }

    /// The searcher's choice of move, or `Move::NULL` when the position has none
    pub fn best_move(&mut self, board: &mut Board) -> Move {
        self.move_list(board).first().copied().unwrap_or(Move::NULL)
    }

    /// Runs the deepening loop and returns the root move buffer as it was ordered during the
    /// final iteration, best move first
    pub fn move_list(&mut self, board: &mut Board) -> Vec<Move> {
        self.ctx.reset();
        let start = Instant::now();
        for depth in 1..self.max_depth {
            self.ctx.clear_pv();
            self.ctx.follow_pv = true;
            self.ctx.allow_null = true;
            let score = self.alpha_beta(board, -INFINITY, INFINITY, depth as i32, 0);
            self.ctx.stats.elapsed = start.elapsed();
            if self.verbose {
                self.print_iteration(depth, score);
            }
        }
        self.ctx.root_moves.clone()
    }

    fn print_iteration(&self, depth: usize, score: i32) {
        print!(
            "info depth {depth} score cp {score} nodes {} time {} pv",
            self.ctx.stats.nodes + self.ctx.stats.qnodes,
            self.ctx.stats.elapsed.as_millis(),
        );
        for m in &self.ctx.last_pv {
            print!(" {m}");
        }
        println!();
    }

    pub(crate) fn alpha_beta(
        &mut self,
        board: &mut Board,
        mut alpha: i32,
        beta: i32,
        depth: i32,
        ply: usize,
    ) -> i32 {
        self.ctx.pv_len[ply] = ply;
        if ply >= MAX_PLY - 1 {
            return self.evaluate(board);
        }
        if depth <= 0 {
            self.ctx.follow_pv = false;
            return self.quiescence(board, alpha, beta, ply);
        }
        self.ctx.stats.nodes += 1;

        if board.is_game_over() {
            self.ctx.follow_pv = false;
            return self.evaluate(board);
        }

        let us = board.stm;
        let in_check = board.in_check(us);

        // A side with real pieces that cannot beat beta even after passing is not worth
        // searching at full depth
        if self.ctx.allow_null
            && !self.ctx.follow_pv
            && board.piece_material(us) > NULL_MOVE_MATERIAL
            && !in_check
        {
            self.ctx.allow_null = false;
            board.make_null();
            let score = -self.alpha_beta(board, -beta, -beta + 1, depth - NULL_MOVE_REDUCTION, ply);
            board.undo();
            self.ctx.allow_null = true;
            if score >= beta {
                return score;
            }
        }
        self.ctx.allow_null = true;

        let mut buf = MoveList::default();
        let count = generate_pseudo_legal(board, &mut buf);
        let mut moves_found = 0;

        for i in 0..count {
            self.promote_best_to_front(&mut buf, i, depth, ply, us);
            let m = buf[i];
            if !board.make(m) {
                continue;
            }
            let score = if moves_found > 0 {
                // Null window around alpha; re-search with the full window on a fail-high
                let mut score = -self.alpha_beta(board, -alpha - 1, -alpha, depth - 1, ply + 1);
                if score > alpha && score < beta {
                    score = -self.alpha_beta(board, -beta, -alpha, depth - 1, ply + 1);
                }
                score
            } else {
                -self.alpha_beta(board, -beta, -alpha, depth - 1, ply + 1)
            };
            board.undo();

            if score >= beta {
                self.bump_history(us, m, depth);
                return beta;
            }
            if score > alpha {
                alpha = score;
                moves_found += 1;
                self.ctx.record_pv(ply, m);
                if ply == 0 {
                    self.ctx.last_pv = self.ctx.pv_table[0][..self.ctx.pv_len[0]].to_vec();
                }
            }
        }

        if moves_found > 0 {
            let best = self.ctx.pv_table[ply][ply];
            self.bump_history(us, best, depth);
        }
        if ply == 0 && depth as usize == self.max_depth - 1 && count > 0 {
            self.ctx.root_moves = buf.to_vec();
        }
        alpha
    }

    fn bump_history(&mut self, side: Color, m: Move, depth: i32) {
        self.ctx.history[side.idx()][m.from().idx()][m.to().idx()] += depth * depth;
    }

    /// Brings the most promising unexamined move to position `next`: the previous iteration's
    /// PV move while we are still on that path, otherwise the best history score
    fn promote_best_to_front(
        &self,
        buf: &mut MoveList,
        next: usize,
        depth: i32,
        ply: usize,
        side: Color,
    ) {
        if self.ctx.follow_pv && depth > 1 && ply < self.ctx.last_pv.len() {
            let pv_move = self.ctx.last_pv[ply];
            for i in next..buf.len() {
                if buf[i] == pv_move {
                    buf.swap(i, next);
                    return;
                }
            }
        }
        let history = &self.ctx.history[side.idx()];
        let mut best = next;
        for i in (next + 1)..buf.len() {
            if history[buf[i].from().idx()][buf[i].to().idx()]
                > history[buf[best].from().idx()][buf[best].to().idx()]
            {
                best = i;
            }
        }
        buf.swap(best, next);
    }
}

#[cfg(test)]
mod search_tests {
    use super::*;
    use crate::board::fen::{parse_fen, STARTING_FEN};
    use crate::moves::movegenerator::generate_legal;
    use crate::types::square::Square;

    #[test]
    fn test_finds_back_rank_mate_in_one() {
        let mut board = parse_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(3);
        let best = searcher.best_move(&mut board);
        assert_eq!(best.from(), Square::from_algebraic("a1").unwrap());
        assert_eq!(best.to(), Square::from_algebraic("a8").unwrap());
        assert!(board.make(best));
        assert!(board.is_mate());
    }

    #[test]
    fn test_takes_the_hanging_queen() {
        let mut board = parse_fen("k7/8/8/3q4/8/8/3R4/K7 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(4);
        let best = searcher.best_move(&mut board);
        assert_eq!(best.to(), Square::from_algebraic("d5").unwrap());
    }

    #[test]
    fn test_no_legal_moves_yields_null() {
        let mut mated =
            parse_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3").unwrap();
        let mut searcher = Searcher::new(3);
        assert_eq!(searcher.best_move(&mut mated), Move::NULL);
        assert!(searcher.move_list(&mut mated).is_empty());
    }

    #[test]
    fn test_move_list_covers_the_root_buffer() {
        let mut board = parse_fen(STARTING_FEN).unwrap();
        let mut searcher = Searcher::new(3);
        let list = searcher.move_list(&mut board);
        // The root buffer is pseudo-legal; in the opening nothing is pinned so the counts agree
        assert_eq!(list.len(), generate_legal(&mut board).len());
        assert_eq!(list[0], searcher.best_move(&mut board));
        // The board comes back untouched
        assert_eq!(board.to_fen(), STARTING_FEN);
    }

    #[test]
    fn test_search_leaves_board_unchanged() {
        let mut board =
            parse_fen("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1")
                .unwrap();
        let fen = board.to_fen();
        let key = board.zobrist;
        let mut searcher = Searcher::new(3);
        let best = searcher.best_move(&mut board);
        assert_ne!(best, Move::NULL);
        assert_eq!(board.to_fen(), fen);
        assert_eq!(board.zobrist, key);
    }

    #[test]
    fn test_deeper_search_prefers_faster_mate() {
        // Mate in one is available; a deeper search must still pick it over slower wins
        let mut board = parse_fen("7k/6pp/8/8/8/8/8/K2R4 w - - 0 1").unwrap();
        let mut searcher = Searcher::new(5);
        let best = searcher.best_move(&mut board);
        assert!(board.make(best));
        assert!(board.is_mate());
    }
}
