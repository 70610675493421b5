use std::time::Duration;

use crate::moves::moves::Move;

pub mod quiescence;
pub mod search;
pub mod see;

/// Search tree depth ceiling; the PV triangle and context arrays are sized to this
pub const MAX_PLY: usize = 64;

pub const DRAW: i32 = 0;
/// Mate scores are offset from this by the ply count, so nearer mates compare higher. Kept far
/// below `INFINITY` and far above any positional score; negation can never overflow.
pub const MATE: i32 = 1_000_000;
pub const INFINITY: i32 = 9_999_999;

pub const NULL_MOVE_REDUCTION: i32 = 4;
/// Null-move pruning is only trusted while the side to move keeps more than a minor piece of
/// non-pawn material, which sidesteps most zugzwang blindness
pub const NULL_MOVE_MATERIAL: i32 = 319;

/// Everything one search session owns: the per-side history heuristic, the triangular principal
/// variation, the PV carried over from the previous deepening iteration, and the ordered root
/// move list handed back to the caller. Bundling this keeps searches reentrant; nothing here is
/// shared between searchers.
pub struct SearchContext {
    pub history: [[[i32; 64]; 64]; 2],
    pub pv_table: [[Move; MAX_PLY]; MAX_PLY],
    pub pv_len: [usize; MAX_PLY],
    pub last_pv: Vec<Move>,
    pub follow_pv: bool,
    pub allow_null: bool,
    pub root_moves: Vec<Move>,
    pub stats: SearchStats,
}

impl Default for SearchContext {
    fn default() -> Self {
        Self {
            history: [[[0; 64]; 64]; 2],
            pv_table: [[Move::NULL; MAX_PLY]; MAX_PLY],
            pv_len: [0; MAX_PLY],
            last_pv: Vec::new(),
            follow_pv: false,
            allow_null: true,
            root_moves: Vec::new(),
            stats: SearchStats::default(),
        }
    }
}

impl SearchContext {
    /// Fresh state for a new search session. History bonuses persist only across the deepening
    /// iterations within one session.
    pub(crate) fn reset(&mut self) {
        *self = SearchContext::default();
    }

    /// Zeroed between deepening iterations; history intentionally survives
    pub(crate) fn clear_pv(&mut self) {
        self.pv_table = [[Move::NULL; MAX_PLY]; MAX_PLY];
        self.pv_len = [0; MAX_PLY];
    }

    /// Stores `m` as the best move at `ply` and pulls the child's continuation up behind it
    pub(crate) fn record_pv(&mut self, ply: usize, m: Move) {
        self.pv_table[ply][ply] = m;
        let child_len = self.pv_len[ply + 1];
        for i in (ply + 1)..child_len {
            self.pv_table[ply][i] = self.pv_table[ply + 1][i];
        }
        self.pv_len[ply] = child_len.max(ply + 1);
    }

    pub fn principal_variation(&self) -> &[Move] {
        &self.last_pv
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    pub nodes: u64,
    pub qnodes: u64,
    pub elapsed: Duration,
}
