use std::collections::BTreeMap;

use anyhow::Context;
use itertools::Itertools;
use lakebench_instruments::RunRecord;

use crate::model::{AggregateStat, DurationStats, ResourceUsage};

/// Reduce run records to one [AggregateStat] per (cluster, query) group.
///
/// Pure function of the record set: grouping uses a BTreeMap and duration statistics are
/// computed from sorted samples, so the output does not depend on input order. Every record is
/// validated first; an inconsistent record means a bug in the run executor and is a fatal
/// error, not something to tolerate.
pub fn aggregate(records: &[RunRecord]) -> anyhow::Result<Vec<AggregateStat>> {
    for record in records {
        record
            .validate()
            .context("Aggregation received an inconsistent run record")?;
    }

    let mut groups: BTreeMap<(&str, &str), Vec<&RunRecord>> = BTreeMap::new();
    for record in records {
        groups
            .entry((record.cluster.as_str(), record.query.as_str()))
            .or_default()
            .push(record);
    }

    let stats = groups
        .into_iter()
        .map(|((cluster, query), runs)| {
            let success_durations = runs
                .iter()
                .filter(|r| r.is_success())
                .map(|r| r.duration_s)
                .sorted_by(f64::total_cmp)
                .collect::<Vec<_>>();

            AggregateStat {
                cluster: cluster.to_string(),
                query: query.to_string(),
                runs: runs.len(),
                successes: success_durations.len(),
                success_rate: success_durations.len() as f64 / runs.len() as f64,
                duration: duration_stats(&success_durations),
                resources: resource_usage(&runs),
            }
        })
        .collect();

    Ok(stats)
}

fn duration_stats(sorted: &[f64]) -> Option<DurationStats> {
    if sorted.is_empty() {
        return None;
    }

    Some(DurationStats {
        mean_s: sorted.iter().sum::<f64>() / sorted.len() as f64,
        min_s: sorted[0],
        max_s: sorted[sorted.len() - 1],
        median_s: percentile(sorted, 50.0),
        p95_s: percentile(sorted, 95.0),
    })
}

fn resource_usage(runs: &[&RunRecord]) -> ResourceUsage {
    let mean_of = |values: Vec<f64>| {
        if values.is_empty() {
            None
        } else {
            Some(values.iter().sum::<f64>() / values.len() as f64)
        }
    };

    ResourceUsage {
        mean_cpu_pct: mean_of(
            runs.iter()
                .filter_map(|r| r.resources.mean_cpu_pct)
                .collect(),
        ),
        mean_mem_mb: mean_of(runs.iter().filter_map(|r| r.resources.mean_mem_mb).collect()),
    }
}

/// Percentile by linear interpolation between closest ranks: the p-th percentile of n sorted
/// samples sits at rank `p/100 * (n-1)` and fractional ranks interpolate between neighbours.
/// This choice is fixed, downstream fixtures assert exact values.
fn percentile(sorted: &[f64], p: f64) -> f64 {
    let rank = p / 100.0 * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}
