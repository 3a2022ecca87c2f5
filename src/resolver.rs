use crate::schema::{PruneReason, ResolverConfig, RowStatus};
use crate::utils::is_close;
use log::debug;

/// Classifies rows as Layer-1 leaves or aggregates of the leaves above them.
///
/// Rows are visited top to bottom. For each row the candidate windows are
/// tried from the earliest allowed start towards the row itself, so the
/// widest matching span of leaves wins. Within a window the row is first
/// tested as a plain subtotal, then as a net figure (one contiguous group of
/// leaves minus the rest). A pruned row stops being a leaf for every later row.
pub struct SubtotalResolver {
    config: ResolverConfig,
}

impl SubtotalResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn resolve(&self, row_sums: &[f64]) -> Vec<RowStatus> {
        let mut statuses = vec![RowStatus::Kept; row_sums.len()];

        for i in 0..row_sums.len() {
            if let Some(reason) = self.find_aggregate(i, row_sums, &statuses) {
                debug!("Row {} ({:.2}): {}", i, row_sums[i], reason);
                statuses[i] = RowStatus::Pruned(reason);
            }
        }

        statuses
    }

    fn find_aggregate(
        &self,
        i: usize,
        row_sums: &[f64],
        statuses: &[RowStatus],
    ) -> Option<PruneReason> {
        let target = row_sums[i];
        if target.abs() < self.config.zero_threshold {
            return None;
        }

        let window_start = i.saturating_sub(self.config.lookback);

        // Leaves of the widest window. Narrowing the window start only ever
        // drops leaves from the front, so every window's leaf list is a
        // suffix of this one and windows sharing a suffix give the same answer.
        let leaves: Vec<usize> = (window_start..i)
            .filter(|&k| statuses[k].is_kept() && row_sums[k].abs() > self.config.zero_threshold)
            .collect();

        for first in 0..leaves.len() {
            let active = &leaves[first..];
            let values: Vec<f64> = active.iter().map(|&k| row_sums[k]).collect();
            let total: f64 = values.iter().sum();

            if self.matches(target, total) {
                return Some(PruneReason::Subtotal {
                    first: active[0],
                    last: active[active.len() - 1],
                });
            }

            if self.is_net_calculation(target, &values, total) {
                return Some(PruneReason::NetCalculation);
            }
        }

        None
    }

    fn is_net_calculation(&self, target: f64, values: &[f64], total: f64) -> bool {
        let mut head = 0.0;
        for split in 1..values.len() {
            head += values[split - 1];
            let tail = total - head;
            if self.matches(target, head - tail) || self.matches(target, tail - head) {
                return true;
            }
        }
        false
    }

    fn matches(&self, target: f64, aggregate: f64) -> bool {
        is_close(
            target,
            aggregate,
            self.config.tolerance,
            self.config.relative_tolerance,
        )
    }
}

impl Default for SubtotalResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolve(sums: &[f64]) -> Vec<RowStatus> {
        SubtotalResolver::default().resolve(sums)
    }

    fn subtotal(first: usize, last: usize) -> RowStatus {
        RowStatus::Pruned(PruneReason::Subtotal { first, last })
    }

    #[test]
    fn test_simple_subtotal() {
        let statuses = resolve(&[12.0, 7.0, 11.0, 30.0]);
        assert_eq!(
            statuses,
            vec![RowStatus::Kept, RowStatus::Kept, RowStatus::Kept, subtotal(0, 2)]
        );
        assert_eq!(statuses[3].to_string(), "Pruned: Subtotal of rows 0-2");
    }

    #[test]
    fn test_repeated_value_is_a_single_row_subtotal() {
        let statuses = resolve(&[10.0, 10.0]);
        assert_eq!(statuses, vec![RowStatus::Kept, subtotal(0, 0)]);
    }

    #[test]
    fn test_window_narrows_until_match() {
        let statuses = resolve(&[5.0, 8.0, 12.0, 20.0]);
        assert_eq!(statuses[3], subtotal(1, 2));
    }

    #[test]
    fn test_widest_window_is_preferred() {
        // Rows 2..=3 also sum to 10, but rows 0..=3 are tried first.
        let statuses = resolve(&[7.0, -7.0, 4.0, 6.0, 10.0]);
        assert!(statuses[..4].iter().all(RowStatus::is_kept));
        assert_eq!(statuses[4], subtotal(0, 3));
    }

    #[test]
    fn test_net_calculation_either_sign() {
        let statuses = resolve(&[100.0, 40.0, 60.0]);
        assert_eq!(statuses[2], RowStatus::Pruned(PruneReason::NetCalculation));

        let statuses = resolve(&[40.0, 100.0, 60.0]);
        assert_eq!(statuses[2], RowStatus::Pruned(PruneReason::NetCalculation));
    }

    #[test]
    fn test_signed_expense_resolves_as_subtotal() {
        let statuses = resolve(&[100.0, -40.0, 60.0]);
        assert_eq!(statuses[2], subtotal(0, 1));
    }

    #[test]
    fn test_pruned_rows_are_not_leaves() {
        let statuses = resolve(&[12.0, 7.0, 19.0, 4.0, 23.0]);
        assert_eq!(statuses[2], subtotal(0, 1));
        assert_eq!(statuses[3], RowStatus::Kept);
        assert_eq!(statuses[4], subtotal(0, 3));
    }

    #[test]
    fn test_near_zero_rows_stay_kept_and_contribute_nothing() {
        let statuses = resolve(&[5.0, -5.0, 0.0, 0.005, 5.0]);
        assert!(statuses[2].is_kept());
        assert!(statuses[3].is_kept());
        // Rows 2 and 3 are skipped as leaves, leaving only 5 and -5.
        assert!(statuses[4].is_kept());
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let statuses = resolve(&[100.0, 7.0, 107.5]);
        assert_eq!(statuses[2], subtotal(0, 1));

        let statuses = resolve(&[100.0, 7.0, 107.6]);
        assert!(statuses[2].is_kept());
    }

    #[test]
    fn test_lookback_bounds_the_search() {
        let mut sums = vec![0.0; 202];
        sums[0] = 1000.0;
        sums[200] = 1000.0;
        sums[201] = 1000.0;
        let statuses = resolve(&sums);
        assert_eq!(statuses[200], subtotal(0, 0));
        assert!(statuses[201].is_kept());
    }

    #[test]
    fn test_relative_tolerance_widens_large_matches() {
        let config = ResolverConfig {
            relative_tolerance: 1e-5,
            ..ResolverConfig::default()
        };
        let resolver = SubtotalResolver::new(config);
        let statuses = resolver.resolve(&[1_000_000.0, 500_000.0, 1_500_003.0]);
        assert_eq!(statuses[2], subtotal(0, 1));

        let statuses = resolve(&[1_000_000.0, 500_000.0, 1_500_003.0]);
        assert!(statuses[2].is_kept());
    }

    #[test]
    fn test_deterministic() {
        let sums = [120.0, 45.5, 165.5, -30.0, 80.0, 50.0, 215.5, 3.0];
        assert_eq!(resolve(&sums), resolve(&sums));
    }
}
