//! Folding per-trial size samples into per-label sample lists.

use std::collections::BTreeMap;

use crate::contender::Sizes;

/// Label to one sample per trial that reported it, in trial order.
pub type Samples = BTreeMap<String, Vec<u64>>;

/// Contender name to its samples.
pub type FoldedMetrics = BTreeMap<String, Samples>;

/// Append every labeled value of `sample` to `acc`. Labels seen for the
/// first time start a new list, so the label set may grow over a run.
pub fn fold(mut acc: Samples, sample: &Sizes) -> Samples {
    for (label, value) in sample {
        acc.entry(label.clone()).or_default().push(*value);
    }
    return acc;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sizes(entries: &[(&str, u64)]) -> Sizes {
        return entries
            .iter()
            .map(|(label, value)| (label.to_string(), *value))
            .collect();
    }

    #[test]
    fn fold_appends_and_grows() {
        let acc = fold(Samples::new(), &sizes(&[("a", 1)]));
        let acc = fold(acc, &sizes(&[("a", 2), ("b", 3)]));

        assert_eq!(acc["a"], vec![1, 2]);
        assert_eq!(acc["b"], vec![3]);
        assert_eq!(acc.len(), 2);
    }

    #[test]
    fn empty_sample_changes_nothing() {
        let acc = fold(Samples::new(), &sizes(&[("a", 1)]));
        assert_eq!(fold(acc.clone(), &Sizes::new()), acc);
    }
}
