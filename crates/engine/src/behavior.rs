//! Behavior profiling — hour/day engagement histograms, circular
//! quiet-window search, and usage-pattern classification.

use chrono::{DateTime, Datelike, Timelike, Utc};
use notify_core::types::{
    FrequencyPreference, InteractionRecord, QuietWindow, UsagePattern, UserBehaviorData,
    QUIET_WINDOW_HOURS,
};

const MAX_ACTIVE_HOURS: usize = 8;
const MAX_PREFERRED_DAYS: usize = 4;
const DEFAULT_RESPONSE_MINS: f64 = 60.0;

/// Build a profile from one fetch window of history rows.
///
/// Histograms count only rows with a read timestamp, so they model
/// engagement rather than exposure.
pub(crate) fn build_profile(
    user_id: &str,
    rows: &[InteractionRecord],
    now: DateTime<Utc>,
    time_zone: &str,
) -> UserBehaviorData {
    let mut hour_counts = [0u32; 24];
    let mut day_counts = [0u32; 7];
    for row in rows {
        if let Some(read_at) = row.read_at {
            hour_counts[read_at.hour() as usize] += 1;
            day_counts[read_at.weekday().num_days_from_sunday() as usize] += 1;
        }
    }

    let engagement_rate = engagement_rate(rows);

    UserBehaviorData {
        user_id: user_id.to_string(),
        active_hours: rank_buckets(&hour_counts, MAX_ACTIVE_HOURS),
        preferred_days: rank_buckets(&day_counts, MAX_PREFERRED_DAYS),
        avg_response_mins: average_response_mins(rows),
        engagement_rate,
        quiet_hours: QuietWindow::starting_at(quietest_window_start(&hour_counts)),
        usage_pattern: dominant_usage_pattern(&hour_counts),
        frequency_preference: FrequencyPreference::from_rate(engagement_rate),
        last_active: now,
        time_zone: time_zone.to_string(),
    }
}

/// Non-zero bucket indices sorted by count descending; count ties resolve
/// to the lower index. At most `keep` survive.
pub(crate) fn rank_buckets(counts: &[u32], keep: usize) -> Vec<u32> {
    let mut ranked: Vec<(usize, u32)> = counts
        .iter()
        .copied()
        .enumerate()
        .filter(|&(_, count)| count > 0)
        .collect();
    ranked.sort_by(bucket_order);
    ranked.truncate(keep);
    ranked.into_iter().map(|(index, _)| index as u32).collect()
}

/// Count descending, then bucket index ascending.
fn bucket_order(a: &(usize, u32), b: &(usize, u32)) -> std::cmp::Ordering {
    b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0))
}

/// Start of the 8-hour circular window with the smallest read count.
/// The earliest start wins ties.
pub(crate) fn quietest_window_start(hour_counts: &[u32; 24]) -> u32 {
    let mut best_start = 0usize;
    let mut best_sum = u32::MAX;
    for start in 0..24 {
        let sum: u32 = (0..QUIET_WINDOW_HOURS as usize)
            .map(|offset| hour_counts[(start + offset) % 24])
            .sum();
        if sum < best_sum {
            best_sum = sum;
            best_start = start;
        }
    }
    best_start as u32
}

/// Which fixed day window carries the most reads. Non-zero ties resolve in
/// the order morning, afternoon, evening, night; a histogram with no reads
/// carries no signal and classifies as mixed.
pub(crate) fn dominant_usage_pattern(hour_counts: &[u32; 24]) -> UsagePattern {
    let window_sum = |hours: &[usize]| -> u32 { hours.iter().map(|&h| hour_counts[h]).sum() };
    let morning = window_sum(&[6, 7, 8, 9, 10, 11]);
    let afternoon = window_sum(&[12, 13, 14, 15, 16]);
    let evening = window_sum(&[17, 18, 19, 20, 21]);
    let night = window_sum(&[22, 23, 0, 1, 2, 3, 4, 5]);

    if morning + afternoon + evening + night == 0 {
        return UsagePattern::Mixed;
    }

    let mut best = (UsagePattern::Morning, morning);
    for candidate in [
        (UsagePattern::Afternoon, afternoon),
        (UsagePattern::Evening, evening),
        (UsagePattern::Night, night),
    ] {
        if candidate.1 > best.1 {
            best = candidate;
        }
    }
    best.0
}

fn engagement_rate(rows: &[InteractionRecord]) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    let engaged = rows
        .iter()
        .filter(|r| r.clicked_at.is_some() || r.action_taken)
        .count();
    (engaged as f64 / rows.len() as f64).clamp(0.0, 1.0)
}

/// Mean minutes between send and read; rows missing the read timestamp do
/// not contribute.
fn average_response_mins(rows: &[InteractionRecord]) -> f64 {
    let deltas: Vec<f64> = rows
        .iter()
        .filter_map(|r| {
            r.read_at
                .map(|read| (read - r.sent_at).num_seconds() as f64 / 60.0)
        })
        .collect();
    if deltas.is_empty() {
        return DEFAULT_RESPONSE_MINS;
    }
    deltas.iter().sum::<f64>() / deltas.len() as f64
}
