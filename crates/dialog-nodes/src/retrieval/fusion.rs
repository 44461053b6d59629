//! Reciprocal-rank fusion of the dense and sparse candidate lists.
//!
//! Fusion is rank-based, never score-based: cosine similarities and raw
//! term-overlap weights live on incomparable scales, so only each
//! candidate's position within its own list contributes. A candidate's fused
//! score is the sum over the lists containing it of `1 / (rank + constant)`,
//! rank counted from 1. Ties keep first-seen order, dense list first.

use std::collections::HashMap;

use dialog_engine::Passage;
use providers::IndexHit;

/// Fuse two ranked candidate lists into the final ordered passages.
///
/// The result is truncated to `limit` entries and replaces any previous
/// retrieval outcome entirely.
pub fn reciprocal_rank_fusion(
    dense: &[IndexHit],
    sparse: &[IndexHit],
    constant: f64,
    limit: usize,
) -> Vec<Passage> {
    let mut order: Vec<Passage> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();

    for (rank, hit) in dense.iter().chain(sparse.iter()).enumerate() {
        // Ranks restart at the head of the sparse list.
        let rank_in_list = if rank < dense.len() {
            rank + 1
        } else {
            rank - dense.len() + 1
        };
        let contribution = 1.0 / (rank_in_list as f64 + constant);

        match positions.get(hit.id.as_str()) {
            Some(&pos) => order[pos].score += contribution,
            None => {
                positions.insert(hit.id.as_str(), order.len());
                order.push(Passage {
                    text: hit.text.clone(),
                    source_url: hit.source_url.clone(),
                    score: contribution,
                });
            }
        }
    }

    // Stable sort: equal scores keep insertion order (dense candidates
    // first, each list in its own rank order).
    order.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
    order.truncate(limit);
    order
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(id: &str, score: f64) -> IndexHit {
        IndexHit {
            id: id.to_string(),
            text: format!("passage {id}"),
            source_url: format!("https://example.tw/{id}"),
            rank_score: score,
        }
    }

    const RRF_K: f64 = 60.0;

    #[test]
    fn test_dual_list_candidate_outranks_single_list() {
        // "b" appears in both lists at modest ranks; "a" tops only one.
        let dense = vec![hit("a", 0.9), hit("b", 0.5)];
        let sparse = vec![hit("b", 12.0), hit("c", 3.0)];

        let fused = reciprocal_rank_fusion(&dense, &sparse, RRF_K, 5);
        assert_eq!(fused[0].text, "passage b");
        // 1/(2+60) + 1/(1+60) vs 1/(1+60)
        assert!(fused[0].score > fused[1].score);
    }

    #[test]
    fn test_fusion_is_rank_order_only() {
        // Same rank order, wildly different scores: identical fused output.
        let dense_a = vec![hit("a", 0.9), hit("b", 0.5)];
        let dense_b = vec![hit("a", 99.0), hit("b", 1.0)];
        let sparse = vec![hit("b", 7.0), hit("c", 2.0)];

        let fused_a = reciprocal_rank_fusion(&dense_a, &sparse, RRF_K, 5);
        let fused_b = reciprocal_rank_fusion(&dense_b, &sparse, RRF_K, 5);

        let order_a: Vec<&str> = fused_a.iter().map(|p| p.text.as_str()).collect();
        let order_b: Vec<&str> = fused_b.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(order_a, order_b);
    }

    #[test]
    fn test_ties_break_dense_first() {
        // Disjoint lists: every rank-1 candidate scores 1/(1+60), etc.
        // Dense candidates must come out ahead of equally ranked sparse ones.
        let dense = vec![hit("d1", 0.9), hit("d2", 0.8)];
        let sparse = vec![hit("s1", 5.0), hit("s2", 4.0)];

        let fused = reciprocal_rank_fusion(&dense, &sparse, RRF_K, 5);
        let order: Vec<&str> = fused.iter().map(|p| p.text.as_str()).collect();
        assert_eq!(
            order,
            vec!["passage d1", "passage s1", "passage d2", "passage s2"]
        );
    }

    #[test]
    fn test_truncation_to_result_size() {
        let dense = vec![hit("a", 0.9), hit("b", 0.8), hit("c", 0.7)];
        let sparse = vec![hit("d", 3.0), hit("e", 2.0)];

        let fused = reciprocal_rank_fusion(&dense, &sparse, RRF_K, 2);
        assert_eq!(fused.len(), 2);
    }

    #[test]
    fn test_idempotent_for_identical_inputs() {
        let dense = vec![hit("a", 0.9), hit("b", 0.5), hit("c", 0.4)];
        let sparse = vec![hit("c", 9.0), hit("a", 8.0), hit("x", 1.0)];

        let first = reciprocal_rank_fusion(&dense, &sparse, RRF_K, 5);
        let second = reciprocal_rank_fusion(&dense, &sparse, RRF_K, 5);
        assert_eq!(first, second);
    }

    #[test]
    fn test_empty_lists() {
        assert!(reciprocal_rank_fusion(&[], &[], RRF_K, 5).is_empty());

        let dense = vec![hit("a", 0.9)];
        let fused = reciprocal_rank_fusion(&dense, &[], RRF_K, 5);
        assert_eq!(fused.len(), 1);
        assert!((fused[0].score - 1.0 / 61.0).abs() < 1e-12);
    }
}
