use rand::Rng;

use crate::{
    board::{board::Board, fen::STARTING_FEN},
    eval::Evaluate,
    moves::{movegenerator::generate_legal, moves::Move, san::san},
    search::search::Searcher,
    types::{pieces::Color, square::Square},
};

/// Game-facing facade over a board and a searcher. This is the whole surface a UI or console
/// harness needs: play moves by value or by screen coordinates, query piece placement and game
/// status, and ask the engine for its own move.
pub struct Engine {
    board: Board,
    searcher: Searcher,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(STARTING_FEN.parse().expect("the starting position parses"))
    }
}

impl Engine {
    pub fn new(board: Board) -> Self {
        Self { board, searcher: Searcher::default() }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// Throws the game away and racks up the starting position again
    pub fn reset(&mut self) {
        self.board = STARTING_FEN.parse().expect("the starting position parses");
    }

    pub fn set_search_depth(&mut self, depth: usize) {
        self.searcher.set_depth(depth);
    }

    pub fn set_evaluator(&mut self, evaluator: Box<dyn Evaluate>) {
        self.searcher.set_evaluator(evaluator);
    }

    /// Plays `m` if it is legal in the current position
    pub fn make_move(&mut self, m: Move) -> bool {
        if !generate_legal(&mut self.board).contains(m) {
            return false;
        }
        self.board.make(m)
    }

    /// Plays a move given in screen coordinates, where y = 0 is the top row from white's
    /// perspective. Promotions resolve to the queen. Out-of-range coordinates are rejected.
    pub fn make_move_coords(&mut self, from_x: i32, from_y: i32, to_x: i32, to_y: i32) -> bool {
        let Some((from, to)) = screen_square(from_x, from_y).zip(screen_square(to_x, to_y)) else {
            return false;
        };
        let candidate = generate_legal(&mut self.board)
            .into_iter()
            .find(|m| m.from() == from && m.to() == to);
        match candidate {
            Some(m) => self.board.make(m),
            None => false,
        }
    }

    /// The piece on a square as FEN letters, or a space for an empty or out-of-range square
    pub fn piece_char(&self, square: i32) -> char {
        if !(0..64).contains(&square) {
            return ' ';
        }
        self.board
            .colored_piece_at(Square(square as u32))
            .map_or(' ', |piece| piece.char())
    }

    pub fn white_wins(&mut self) -> bool {
        self.board.stm == Color::Black && self.board.is_mate()
    }

    pub fn black_wins(&mut self) -> bool {
        self.board.stm == Color::White && self.board.is_mate()
    }

    pub fn is_draw(&mut self) -> bool {
        self.board.is_draw()
    }

    /// The searcher's move for the current position, `Move::NULL` when there is none
    pub fn best_engine_move(&mut self) -> Move {
        self.searcher.best_move(&mut self.board)
    }

    /// A weighted random pick from the searcher's ordered move list: with n moves, the first is
    /// n times as likely as the last
    pub fn random_engine_move(&mut self) -> Move {
        let ranked = self.searcher.move_list(&mut self.board);
        let ranked = self.playable(ranked);
        let n = ranked.len();
        if n == 0 {
            return Move::NULL;
        }
        let total = n * (n + 1) / 2;
        let mut ticket = rand::thread_rng().gen_range(0..total);
        for (i, m) in ranked.iter().enumerate() {
            let weight = n - i;
            if ticket < weight {
                return *m;
            }
            ticket -= weight;
        }
        *ranked.last().expect("list was non-empty")
    }

    /// One search, every returned move rendered in standard algebraic notation, best first
    pub fn suggested_moves(&mut self) -> Vec<(Move, String)> {
        let ranked = self.searcher.move_list(&mut self.board);
        let ranked = self.playable(ranked);
        ranked
            .into_iter()
            .map(|m| {
                let notation = san(&mut self.board, m);
                (m, notation)
            })
            .collect()
    }

    /// Rolls back the latest human-and-engine move pair, or a lone ply when only one was played
    pub fn takeback(&mut self) {
        for _ in 0..2 {
            if self.board.ply == 0 {
                break;
            }
            self.board.undo();
        }
    }

    /// The searcher's root buffer is pseudo-legal and may hold stale entries from pruned
    /// branches; keep only the moves actually playable right now, in order
    fn playable(&mut self, ranked: Vec<Move>) -> Vec<Move> {
        let legal = generate_legal(&mut self.board);
        ranked.into_iter().filter(|&m| m != Move::NULL && legal.contains(m)).collect()
    }
}

/// Screen coordinates count y downward from black's back rank; square 0 is a1
fn screen_square(x: i32, y: i32) -> Option<Square> {
    if (0..8).contains(&x) && (0..8).contains(&y) {
        Some(Square(((7 - y) * 8 + x) as u32))
    } else {
        None
    }
}
