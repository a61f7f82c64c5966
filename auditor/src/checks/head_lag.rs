use chainwatch_common::verdict::Verdict;

/// Chain-head lag comparison: `lag = node_head - indexed_top`, pass iff
/// `lag < threshold`. Both heights are point-in-time snapshots supplied by
/// the caller, fetched back to back.
///
/// A negative lag (indexer ahead of the node, e.g. while the node reorgs)
/// passes.
pub fn evaluate(node_head: u64, indexed_top: u64, threshold: i64) -> Verdict {
    let lag = node_head as i64 - indexed_top as i64;
    Verdict::from_observed(lag, threshold, || {
        format!(
            "indexed top block {} lags node head {} by {} blocks",
            indexed_top, node_head, lag
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_lag_under_threshold_passes() {
        // lag 15 < 20
        assert!(evaluate(1000, 985, 20).is_pass());
    }

    #[test]
    fn test_lag_over_threshold_fails() {
        // lag 25 >= 20
        let verdict = evaluate(1000, 975, 20);
        assert!(matches!(
            verdict,
            Verdict::Fail {
                observed: 25,
                threshold: 20,
                ..
            }
        ));
    }

    #[test]
    fn test_lag_at_threshold_fails() {
        assert!(!evaluate(1000, 980, 20).is_pass());
        assert!(evaluate(1000, 981, 20).is_pass());
    }

    #[test]
    fn test_indexer_ahead_passes() {
        assert!(evaluate(1000, 1005, 20).is_pass());
    }

    proptest! {
        #[test]
        fn test_pass_iff_lag_below_threshold(
            node_head in 0u64..2_000_000,
            indexed_top in 0u64..2_000_000,
            threshold in 0i64..1_000,
        ) {
            let verdict = evaluate(node_head, indexed_top, threshold);
            let lag = node_head as i64 - indexed_top as i64;
            prop_assert_eq!(verdict.is_pass(), lag < threshold);
        }
    }
}
