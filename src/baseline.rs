//! Baseline correction
//!
//! A trial's test-period proportions are compared against the proportions
//! from its own pre-stimulus baseline period. Correction is a plain
//! per-bucket subtraction with no clamping, so negative values are expected
//! whenever looking at an object dropped relative to baseline.

use crate::types::OnObjectProportions;

impl OnObjectProportions {
    /// `self - baseline`, bucket by bucket
    pub fn baseline_corrected(&self, baseline: &OnObjectProportions) -> OnObjectProportions {
        baseline_correct(self, baseline)
    }
}

/// Subtract baseline proportions from test proportions
pub fn baseline_correct(
    test: &OnObjectProportions,
    baseline: &OnObjectProportions,
) -> OnObjectProportions {
    OnObjectProportions {
        interesting: test.interesting - baseline.interesting,
        boring: test.boring - baseline.boring,
        familiar: test.familiar - baseline.familiar,
    }
}

/// Per-bucket mean, or `None` for no input
pub fn mean_proportions<'a, I>(values: I) -> Option<OnObjectProportions>
where
    I: IntoIterator<Item = &'a OnObjectProportions>,
{
    let mut count = 0usize;
    let mut sum = OnObjectProportions::default();
    for value in values {
        sum.interesting += value.interesting;
        sum.boring += value.boring;
        sum.familiar += value.familiar;
        count += 1;
    }

    if count == 0 {
        return None;
    }

    let n = count as f64;
    Some(OnObjectProportions {
        interesting: sum.interesting / n,
        boring: sum.boring / n,
        familiar: sum.familiar / n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn props(interesting: f64, boring: f64, familiar: f64) -> OnObjectProportions {
        OnObjectProportions {
            interesting,
            boring,
            familiar,
        }
    }

    #[test]
    fn test_correction_can_be_negative() {
        let test = props(0.5, 0.3, 0.2);
        let baseline = props(0.7, 0.1, 0.2);
        let corrected = test.baseline_corrected(&baseline);

        assert!((corrected.interesting + 0.2).abs() < 1e-12);
        assert!((corrected.boring - 0.2).abs() < 1e-12);
        assert!(corrected.familiar.abs() < 1e-12);
    }

    #[test]
    fn test_zero_baseline_is_identity() {
        let test = props(0.6, 0.4, 0.0);
        assert_eq!(
            baseline_correct(&test, &OnObjectProportions::default()),
            test
        );
    }

    #[test]
    fn test_mean_proportions() {
        let values = [props(0.2, 0.4, 0.0), props(0.4, -0.2, 0.1)];
        let mean = mean_proportions(&values).unwrap();

        assert!((mean.interesting - 0.3).abs() < 1e-12);
        assert!((mean.boring - 0.1).abs() < 1e-12);
        assert!((mean.familiar - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_mean_of_nothing() {
        let empty: [OnObjectProportions; 0] = [];
        assert!(mean_proportions(&empty).is_none());
    }
}
