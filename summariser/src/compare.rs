use std::collections::BTreeMap;

use itertools::Itertools;

use crate::model::{AggregateStat, ClusterComparison};

/// Cross-cluster comparison: for every query aggregated on more than one cluster, the relative
/// speedup between each pair of clusters.
///
/// Pairs where either side has no duration data, or where the candidate mean is zero, are
/// omitted rather than producing infinity or NaN. The baseline within a pair is the cluster
/// that sorts first, so the output is deterministic.
pub fn compare(stats: &[AggregateStat]) -> Vec<ClusterComparison> {
    let mut by_query: BTreeMap<&str, Vec<&AggregateStat>> = BTreeMap::new();
    for stat in stats {
        by_query.entry(stat.query.as_str()).or_default().push(stat);
    }

    let mut comparisons = Vec::new();
    for (query, mut group) in by_query {
        group.sort_by(|a, b| a.cluster.cmp(&b.cluster));

        for (baseline, candidate) in group.iter().tuple_combinations() {
            let (Some(base), Some(cand)) = (&baseline.duration, &candidate.duration) else {
                continue;
            };
            if cand.mean_s == 0.0 {
                continue;
            }

            comparisons.push(ClusterComparison {
                query: query.to_string(),
                baseline: baseline.cluster.clone(),
                candidate: candidate.cluster.clone(),
                speedup: base.mean_s / cand.mean_s,
            });
        }
    }

    comparisons
}
