//! Per-bird size-index aggregation.

use std::collections::BTreeMap;

use crate::size_index::round3;

/// Ordered size-index histories, one per dense bird id.
///
/// Dense ids are sequential in first-seen order, so ascending key order is
/// first-seen order throughout.
#[derive(Debug, Default)]
pub struct SizeIndexAggregator {
    history: BTreeMap<u32, Vec<f64>>,
}

impl SizeIndexAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one observation, creating the history on first use. A history
    /// is never empty once its key exists.
    pub fn record(&mut self, bird_id: u32, value: f64) {
        self.history.entry(bird_id).or_default().push(value);
    }

    /// Arithmetic mean per bird, rounded to three decimal digits, keyed in
    /// first-seen order. Birds never recorded do not appear.
    ///
    /// Does not mutate stored histories: calling it again without
    /// intervening `record`s returns an identical mapping.
    pub fn finalize(&self) -> BTreeMap<u32, f64> {
        self.history
            .iter()
            .map(|(&id, values)| {
                let mean = values.iter().sum::<f64>() / values.len() as f64;
                (id, round3(mean))
            })
            .collect()
    }

    /// Bird ids with at least one observation, in first-seen order.
    pub fn tracked_ids(&self) -> Vec<u32> {
        self.history.keys().copied().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn means_are_rounded_to_three_digits() {
        let mut agg = SizeIndexAggregator::new();
        for value in [0.2, 0.4, 0.6] {
            agg.record(1, value);
        }
        agg.record(2, 0.1);
        agg.record(2, 0.2);

        let means = agg.finalize();
        assert_eq!(means[&1], 0.4);
        assert_eq!(means[&2], 0.15);
    }

    #[test]
    fn unrecorded_ids_are_absent() {
        let mut agg = SizeIndexAggregator::new();
        agg.record(3, 0.5);
        let means = agg.finalize();
        assert!(!means.contains_key(&1));
        assert_eq!(means.len(), 1);
    }

    #[test]
    fn finalize_is_idempotent() {
        let mut agg = SizeIndexAggregator::new();
        agg.record(1, 0.25);
        agg.record(1, 0.75);
        agg.record(2, 1.0);
        assert_eq!(agg.finalize(), agg.finalize());
    }

    #[test]
    fn keys_follow_first_seen_order() {
        let mut agg = SizeIndexAggregator::new();
        // Dense ids arrive in allocation order by construction.
        agg.record(1, 0.3);
        agg.record(2, 0.9);
        agg.record(1, 0.5);
        let ids: Vec<u32> = agg.finalize().keys().copied().collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(agg.tracked_ids(), vec![1, 2]);
    }
}
