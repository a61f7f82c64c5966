use chainwatch_common::verdict::Verdict;

/// Missed-block comparison: pass iff the number of structurally incomplete
/// tipsets stays under the threshold. The count itself comes from the
/// store's cross-referencing query; a tipset is incomplete when its declared
/// block set cardinality differs from the number of block records indexed at
/// its height.
pub fn evaluate(incomplete: u64, threshold: i64) -> Verdict {
    Verdict::from_observed(incomplete as i64, threshold, || {
        format!("{} structurally incomplete tipsets", incomplete)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_incomplete_tipsets_passes() {
        assert!(evaluate(0, 1).is_pass());
        assert!(evaluate(0, 10).is_pass());
    }

    #[test]
    fn test_count_at_threshold_fails() {
        assert!(!evaluate(10, 10).is_pass());
        assert!(evaluate(9, 10).is_pass());
    }

    #[test]
    fn test_fail_reports_the_count() {
        let verdict = evaluate(12, 10);
        assert!(matches!(
            verdict,
            Verdict::Fail {
                observed: 12,
                threshold: 10,
                ..
            }
        ));
    }
}
