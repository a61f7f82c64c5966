use chainwatch_common::verdict::Verdict;

/// Missed-tipset comparison: `deficit = max_height - tipset_count`, pass iff
/// `deficit < threshold`. Expects one tipset per height from 0 upward, so
/// every gap lowers the count below the top height.
///
/// The formula assumes heights are contiguous starting near zero; a chain
/// with a nonzero genesis height would over-report the deficit.
pub fn evaluate(tipset_count: u64, max_height: u64, threshold: i64) -> Verdict {
    let deficit = max_height as i64 - tipset_count as i64;
    Verdict::from_observed(deficit, threshold, || {
        format!(
            "{} tipsets indexed up to height {}, deficit of {}",
            tipset_count, max_height, deficit
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_contiguous_chain_passes() {
        // heights 0..=100 fully indexed: count 101, deficit -1
        assert!(evaluate(101, 100, 10).is_pass());
    }

    #[test]
    fn test_gaps_raise_the_deficit() {
        // 20 heights missing out of 0..=100
        let verdict = evaluate(81, 100, 10);
        assert!(matches!(
            verdict,
            Verdict::Fail {
                observed: 19,
                threshold: 10,
                ..
            }
        ));
    }

    #[test]
    fn test_deficit_at_threshold_fails() {
        assert!(!evaluate(90, 100, 10).is_pass());
        assert!(evaluate(91, 100, 10).is_pass());
    }

    proptest! {
        #[test]
        fn test_pass_iff_deficit_below_threshold(
            tipset_count in 0u64..2_000_000,
            max_height in 0u64..2_000_000,
            threshold in 0i64..1_000,
        ) {
            let verdict = evaluate(tipset_count, max_height, threshold);
            let deficit = max_height as i64 - tipset_count as i64;
            prop_assert_eq!(verdict.is_pass(), deficit < threshold);
        }
    }
}
