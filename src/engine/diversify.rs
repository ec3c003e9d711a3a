//! Category-diversity re-ranking.
//!
//! Naive top-k by pure similarity tends to cluster results from one
//! category when the corpus is imbalanced (backend files dominate this
//! corpus). Round-robin interleaving across categories restores diversity
//! without dropping any available result.

use crate::models::{Category, RetrievalResult};

/// Reorder similarity-ranked results by round-robin across categories.
///
/// Groups preserve their internal score order; each round visits categories
/// in the fixed priority order (backend, frontend, other), taking one item
/// from each non-exhausted group, until `target_count` items are selected
/// or all groups run dry. A category with no candidates contributes nothing
/// (no padding with irrelevant chunks, so `target_count` is a soft target).
pub fn diversify(results: Vec<RetrievalResult>, target_count: usize) -> Vec<RetrievalResult> {
    if results.is_empty() || target_count == 0 {
        return Vec::new();
    }

    let mut groups: Vec<Vec<RetrievalResult>> = Category::PRIORITY.iter().map(|_| Vec::new()).collect();
    for r in results {
        let slot = Category::PRIORITY
            .iter()
            .position(|c| *c == r.chunk.category)
            .unwrap_or(Category::PRIORITY.len() - 1);
        groups[slot].push(r);
    }

    let mut cursors = vec![0usize; groups.len()];
    let mut out = Vec::with_capacity(target_count);

    while out.len() < target_count {
        let mut took_any = false;
        for (gi, group) in groups.iter().enumerate() {
            if out.len() >= target_count {
                break;
            }
            if cursors[gi] < group.len() {
                out.push(group[cursors[gi]].clone());
                cursors[gi] += 1;
                took_any = true;
            }
        }
        if !took_any {
            break;
        }
    }

    out
}
