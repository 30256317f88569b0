//! Mastery statistics per rank.

use crate::catalog::Catalog;
use crate::memory::MemoryStore;
use crate::models::{RankStats, RANKS};

/// Mastered share of every rank, computed from the catalog and current levels.
pub fn rank_stats(catalog: &Catalog, memory: &MemoryStore) -> Vec<RankStats> {
    RANKS
        .iter()
        .map(|&rank| {
            let total = catalog.count_rank(rank);
            let mastered = catalog
                .entries()
                .iter()
                .filter(|e| e.rank == rank && memory.is_mastered(&e.word))
                .count();
            RankStats {
                rank,
                total,
                mastered,
                percentage: percentage(mastered, total),
            }
        })
        .collect()
}

fn percentage(part: usize, whole: usize) -> u32 {
    if whole == 0 {
        return 0;
    }
    (100.0 * part as f64 / whole as f64).round() as u32
}
