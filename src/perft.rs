use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};

use crate::{board::board::Board, moves::movegenerator::generate_legal};

/// Counts the leaves of the full legal-move tree to the given depth. The standard
/// move-generator acceptance test: any discrepancy with the published counts pins down a class
/// of generation or make/unmake bugs.
pub fn perft(board: &mut Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal(board);
    if depth == 1 {
        return moves.len() as u64;
    }
    let mut nodes = 0;
    for &m in &moves {
        let legal = board.make(m);
        assert!(legal, "generated move was not legal");
        nodes += perft(board, depth - 1);
        board.undo();
    }
    nodes
}

/// Perft split by root move, printed one line per move; handy for diffing against another engine
pub fn perft_divide(board: &mut Board, depth: usize) -> u64 {
    let mut total = 0;
    for &m in &generate_legal(board) {
        let legal = board.make(m);
        assert!(legal, "generated move was not legal");
        let nodes = perft(board, depth.saturating_sub(1));
        board.undo();
        println!("{m}: {nodes}");
        total += nodes;
    }
    println!("\nNodes searched: {total}");
    total
}

/// Root-parallel perft: each first move explores its own cloned board on the rayon pool
pub fn perft_parallel(board: &Board, depth: usize) -> u64 {
    if depth == 0 {
        return 1;
    }
    let moves = generate_legal(&mut board.clone());
    moves
        .as_slice()
        .par_iter()
        .map(|&m| {
            let mut local = board.clone();
            let legal = local.make(m);
            assert!(legal, "generated move was not legal");
            perft(&mut local, depth - 1)
        })
        .sum()
}
