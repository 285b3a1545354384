//! Engagement insights — per-kind rates, ranked preferences, and
//! threshold-driven recommendations.

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use notify_core::types::{
    EngagementInsights, InteractionRecord, KindEngagement, NotificationKind, UsagePattern,
    UserBehaviorData,
};

/// Mean response time above which timing adjustments are suggested.
const SLOW_RESPONSE_MINS: f64 = 240.0;
const LOW_ENGAGEMENT_RATE: f64 = 0.3;
const TOP_KINDS: usize = 3;
const BOTTOM_KINDS: usize = 2;

pub(crate) fn build(
    user_id: &str,
    rows: &[InteractionRecord],
    profile: &UserBehaviorData,
    now: DateTime<Utc>,
) -> EngagementInsights {
    let frequency = kind_breakdown(rows);
    let (preferred_kinds, low_engagement_kinds) = rank_kinds(&frequency);
    let best_hour = profile.active_hours.first().copied().unwrap_or(9);

    EngagementInsights {
        user_id: user_id.to_string(),
        best_engagement_time: clock_label(best_hour),
        preferred_kinds,
        recommendations: build_recommendations(profile, low_engagement_kinds.first().copied()),
        low_engagement_kinds,
        frequency,
        behavior_pattern: pattern_sentence(profile.usage_pattern).to_string(),
        generated_at: now,
    }
}

/// Per-kind sent/engaged tallies. Engaged means clicked or acted on.
pub(crate) fn kind_breakdown(
    rows: &[InteractionRecord],
) -> HashMap<NotificationKind, KindEngagement> {
    let mut tally: HashMap<NotificationKind, KindEngagement> = HashMap::new();
    for row in rows {
        let entry = tally.entry(row.kind).or_insert(KindEngagement {
            sent: 0,
            engaged: 0,
            rate: 0.0,
        });
        entry.sent += 1;
        if row.clicked_at.is_some() || row.action_taken {
            entry.engaged += 1;
        }
    }
    for stats in tally.values_mut() {
        if stats.sent > 0 {
            stats.rate = (stats.engaged as f64 / stats.sent as f64).clamp(0.0, 1.0);
        }
    }
    tally
}

/// Rate descending; ties resolve on the wire name so ranking is stable.
fn rate_desc(a: &(NotificationKind, f64), b: &(NotificationKind, f64)) -> Ordering {
    b.1.partial_cmp(&a.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.as_str().cmp(b.0.as_str()))
}

/// Rate ascending; same tie-break as `rate_desc`.
fn rate_asc(a: &(NotificationKind, f64), b: &(NotificationKind, f64)) -> Ordering {
    a.1.partial_cmp(&b.1)
        .unwrap_or(Ordering::Equal)
        .then_with(|| a.0.as_str().cmp(b.0.as_str()))
}

/// Top kinds by engagement rate and the bottom of the table, lowest first.
pub(crate) fn rank_kinds(
    frequency: &HashMap<NotificationKind, KindEngagement>,
) -> (Vec<NotificationKind>, Vec<NotificationKind>) {
    let by_rate: Vec<(NotificationKind, f64)> =
        frequency.iter().map(|(k, v)| (*k, v.rate)).collect();

    let mut descending = by_rate.clone();
    descending.sort_by(rate_desc);
    let preferred = descending
        .iter()
        .take(TOP_KINDS)
        .map(|(kind, _)| *kind)
        .collect();

    let mut ascending = by_rate;
    ascending.sort_by(rate_asc);
    let low = ascending
        .iter()
        .take(BOTTOM_KINDS)
        .map(|(kind, _)| *kind)
        .collect();

    (preferred, low)
}

/// 12-hour clock label, e.g. 18 -> "6:00 PM", 0 -> "12:00 AM".
pub(crate) fn clock_label(hour: u32) -> String {
    let suffix = if hour < 12 { "AM" } else { "PM" };
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    format!("{display}:00 {suffix}")
}

fn build_recommendations(
    profile: &UserBehaviorData,
    least_engaging: Option<NotificationKind>,
) -> Vec<String> {
    let mut recommendations = Vec::new();
    if profile.engagement_rate < LOW_ENGAGEMENT_RATE {
        recommendations.push(
            "Engagement is low; consider receiving fewer notifications each day.".to_string(),
        );
    }
    if profile.avg_response_mins > SLOW_RESPONSE_MINS {
        recommendations.push(
            "Notifications sit unread for hours; shifting delivery into your active hours could help."
                .to_string(),
        );
    }
    if let Some(kind) = least_engaging {
        recommendations.push(format!(
            "You rarely engage with {}; consider muting them.",
            kind.label()
        ));
    }
    recommendations
}

fn pattern_sentence(pattern: UsagePattern) -> &'static str {
    match pattern {
        UsagePattern::Morning => "You check the app most in the morning, before noon.",
        UsagePattern::Afternoon => "You check the app most in the afternoon.",
        UsagePattern::Evening => "You check the app most in the evening.",
        UsagePattern::Night => "You check the app most late at night.",
        UsagePattern::Mixed => "Your activity is spread across the day with no dominant window.",
    }
}
