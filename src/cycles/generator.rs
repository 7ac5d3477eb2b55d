//! Candidate cycle enumeration
//!
//! Pure and stateless. Short cycles are enumerated eagerly; the 4-hop space
//! is ranked by a static liquidity heuristic and truncated, and anything
//! longer comes only from the curated allow-list. Every emitted path starts
//! and ends at the base asset.

use crate::types::tokens::{CURATED_FIVE_HOP, TokenInfo, find_token};

pub type CyclePath = Vec<TokenInfo>;

/// All base→A→B→base cycles over the unordered pairs of non-base tokens.
pub fn three_hop_cycles(base: &TokenInfo, tokens: &[TokenInfo]) -> Vec<CyclePath> {
    let intermediates: Vec<&TokenInfo> = tokens.iter().filter(|t| t.mint != base.mint).collect();
    let mut paths = Vec::new();

    for i in 0..intermediates.len() {
        for j in (i + 1)..intermediates.len() {
            paths.push(vec![
                base.clone(),
                intermediates[i].clone(),
                intermediates[j].clone(),
                base.clone(),
            ]);
        }
    }

    paths
}

/// Ordered triples of distinct non-base tokens, best-ranked first, truncated
/// to `cap`. 4 hops is where enumeration starts to explode, so candidates are
/// scored statically (deeper books first) instead of quoted exhaustively.
pub fn four_hop_cycles(base: &TokenInfo, tokens: &[TokenInfo], cap: usize) -> Vec<CyclePath> {
    let intermediates: Vec<&TokenInfo> = tokens.iter().filter(|t| t.mint != base.mint).collect();
    let mut candidates = Vec::new();

    for a in &intermediates {
        for b in &intermediates {
            if b.mint == a.mint {
                continue;
            }
            for c in &intermediates {
                if c.mint == a.mint || c.mint == b.mint {
                    continue;
                }
                let score = a.category.liquidity_weight()
                    + b.category.liquidity_weight()
                    + c.category.liquidity_weight();
                candidates.push((
                    score,
                    vec![
                        base.clone(),
                        (*a).clone(),
                        (*b).clone(),
                        (*c).clone(),
                        base.clone(),
                    ],
                ));
            }
        }
    }

    candidates.sort_by(|(sa, _), (sb, _)| sb.cmp(sa));
    candidates.truncate(cap);
    candidates.into_iter().map(|(_, path)| path).collect()
}

/// Curated long routes resolved against the live universe. Routes naming a
/// token that is not in the universe are skipped.
pub fn curated_cycles(base: &TokenInfo, tokens: &[TokenInfo]) -> Vec<CyclePath> {
    CURATED_FIVE_HOP
        .iter()
        .filter_map(|route| {
            if route.first() != Some(&base.symbol) || route.last() != Some(&base.symbol) {
                return None;
            }
            route
                .iter()
                .map(|symbol| find_token(tokens, symbol).cloned())
                .collect::<Option<CyclePath>>()
        })
        .collect()
}

pub fn is_round_trip(path: &[TokenInfo]) -> bool {
    path.len() >= 3
        && path.first().map(|t| t.mint) == path.last().map(|t| t.mint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use crate::types::tokens::{SOL, TOKEN_UNIVERSE};

    #[test]
    fn three_hop_emits_every_unordered_pair_once() {
        let paths = three_hop_cycles(&SOL, &TOKEN_UNIVERSE);
        let n = TOKEN_UNIVERSE.len() - 1;
        assert_eq!(paths.len(), n * (n - 1) / 2);

        for path in &paths {
            assert_eq!(path.len(), 4);
            assert!(is_round_trip(path));
            assert_ne!(path[1].mint, path[2].mint);
            assert_ne!(path[1].mint, SOL.mint);
            assert_ne!(path[2].mint, SOL.mint);
        }
    }

    #[test]
    fn four_hop_respects_cap_and_distinctness() {
        let cap = 10;
        let paths = four_hop_cycles(&SOL, &TOKEN_UNIVERSE, cap);
        assert!(paths.len() <= cap);

        for path in &paths {
            assert_eq!(path.len(), 5);
            assert!(is_round_trip(path));
            // All intermediates distinct, none of them the base.
            for i in 1..4 {
                assert_ne!(path[i].mint, SOL.mint);
                for j in (i + 1)..4 {
                    assert_ne!(path[i].mint, path[j].mint);
                }
            }
        }
    }

    #[test]
    fn four_hop_ranks_deep_books_first() {
        let paths = four_hop_cycles(&SOL, &TOKEN_UNIVERSE, 3);
        // The top-ranked candidates route exclusively through stables and
        // majors; a volatile token cannot out-rank them.
        for path in &paths {
            assert!(path[1..4].iter().all(|t| !t.is_volatile()), "{path:?}");
        }
    }

    #[test]
    fn curated_cycles_resolve_against_universe() {
        let paths = curated_cycles(&SOL, &TOKEN_UNIVERSE);
        assert_eq!(paths.len(), CURATED_FIVE_HOP.len());
        for path in &paths {
            assert_eq!(path.len(), 6);
            assert!(is_round_trip(path));
        }
    }

    proptest! {
        // Round-trip invariant over arbitrary sub-universes.
        #[test]
        fn every_generated_path_returns_to_base(subset in proptest::sample::subsequence(TOKEN_UNIVERSE.clone(), 0..TOKEN_UNIVERSE.len()), cap in 0usize..40) {
            let mut paths = three_hop_cycles(&SOL, &subset);
            paths.extend(four_hop_cycles(&SOL, &subset, cap));
            paths.extend(curated_cycles(&SOL, &subset));
            for path in paths {
                prop_assert!(is_round_trip(&path));
                prop_assert_eq!(path.first().map(|t| t.mint), Some(SOL.mint));
            }
        }
    }
}
