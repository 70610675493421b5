pub mod board;
pub mod engine;
pub mod eval;
pub mod moves;
pub mod perft;
pub mod search;
pub mod types;

pub use board::board::Board;
pub use board::fen::{parse_fen, FenError, STARTING_FEN};
pub use engine::Engine;
pub use eval::{Evaluate, Evaluator};
pub use moves::moves::Move;
pub use search::search::Searcher;

/// Eagerly builds the shared attack tables and Zobrist keys. Optional: first use builds them
/// lazily; calling this at startup just moves the cost off the first search.
pub fn init() {
    lazy_static::initialize(&moves::movegenerator::MG);
    lazy_static::initialize(&board::zobrist::ZOBRIST);
}
