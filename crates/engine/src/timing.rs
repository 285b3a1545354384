//! Optimal-send-time recommendation — picks the next instant a
//! notification is likely to be seen, given the user's profile.

use chrono::{DateTime, Duration, TimeZone, Timelike, Utc};
use notify_core::types::{OptimalTiming, PersonalizationSettings, Urgency, UserBehaviorData};
use notify_core::{NotifyError, NotifyResult};

/// Morning hour used when a profile carries no active hours.
const FALLBACK_HOUR: u32 = 9;
/// Fallback delay when recommendation itself fails.
const FALLBACK_DELAY_MINS: i64 = 5;

pub(crate) fn recommend(
    now: DateTime<Utc>,
    profile: &UserBehaviorData,
    settings: &PersonalizationSettings,
    urgency: Urgency,
    jitter_mins: i64,
) -> NotifyResult<OptimalTiming> {
    let in_quiet = profile.quiet_hours.contains(now.hour());

    if urgency == Urgency::High && !in_quiet {
        return Ok(OptimalTiming {
            recommended_time: now,
            confidence: 0.9,
            reason: "high urgency, delivering immediately".to_string(),
            alternatives: Vec::new(),
        });
    }

    // High urgency inside quiet hours intentionally falls through here:
    // urgency does not override a quiet window.
    if settings.delivery.respect_quiet_hours && in_quiet {
        return Ok(OptimalTiming {
            recommended_time: next_active_time(now, &profile.active_hours)?,
            confidence: 0.8,
            reason: "delayed for quiet hours".to_string(),
            alternatives: vec![now],
        });
    }

    if let Some(hour) = earliest_later_today(now, &profile.active_hours) {
        // Jitter spreads deliveries so a popular hour does not become a
        // notification storm.
        let recommended = at_hour(now, hour)? + Duration::minutes(jitter_mins);
        return Ok(OptimalTiming {
            recommended_time: recommended,
            confidence: 0.8,
            reason: "aligned with your active hours".to_string(),
            alternatives: alternatives_on(now, hour, &profile.active_hours)?,
        });
    }

    let hour = profile
        .active_hours
        .iter()
        .copied()
        .min()
        .unwrap_or(FALLBACK_HOUR);
    let tomorrow = now + Duration::days(1);
    Ok(OptimalTiming {
        recommended_time: at_hour(tomorrow, hour)?,
        confidence: 0.6,
        reason: "scheduled for tomorrow's first active hour".to_string(),
        alternatives: alternatives_on(tomorrow, hour, &profile.active_hours)?,
    })
}

/// Recommendation used when analysis fails: a short safe delay.
pub(crate) fn fallback(now: DateTime<Utc>) -> OptimalTiming {
    OptimalTiming {
        recommended_time: now + Duration::minutes(FALLBACK_DELAY_MINS),
        confidence: 0.3,
        reason: "behavior analysis unavailable, using short delay".to_string(),
        alternatives: Vec::new(),
    }
}

/// Earliest active hour later today, else tomorrow's earliest active hour.
pub(crate) fn next_active_time(
    now: DateTime<Utc>,
    active_hours: &[u32],
) -> NotifyResult<DateTime<Utc>> {
    if let Some(hour) = earliest_later_today(now, active_hours) {
        return at_hour(now, hour);
    }
    let hour = active_hours.iter().copied().min().unwrap_or(FALLBACK_HOUR);
    at_hour(now + Duration::days(1), hour)
}

fn earliest_later_today(now: DateTime<Utc>, active_hours: &[u32]) -> Option<u32> {
    active_hours.iter().copied().filter(|&h| h > now.hour()).min()
}

/// Same calendar date as `base`, at `hour`:00:00.
fn at_hour(base: DateTime<Utc>, hour: u32) -> NotifyResult<DateTime<Utc>> {
    base.date_naive()
        .and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .ok_or_else(|| NotifyError::Internal(anyhow::anyhow!("hour {hour} out of range")))
}

/// Up to 3 other active hours, in profile (engagement) order, on the same
/// date as the recommendation.
fn alternatives_on(
    base: DateTime<Utc>,
    chosen: u32,
    active_hours: &[u32],
) -> NotifyResult<Vec<DateTime<Utc>>> {
    active_hours
        .iter()
        .copied()
        .filter(|&h| h != chosen)
        .take(3)
        .map(|h| at_hour(base, h))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn profile_at(now: DateTime<Utc>) -> UserBehaviorData {
        UserBehaviorData::baseline("u1", now, "UTC")
    }

    fn settings() -> PersonalizationSettings {
        PersonalizationSettings::seeded("u1")
    }

    #[test]
    fn test_high_urgency_outside_quiet_is_immediate() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::High, 0).unwrap();

        assert_eq!(timing.recommended_time, now);
        assert!((timing.recommended_time - now).num_seconds().abs() < 1);
        assert_eq!(timing.confidence, 0.9);
        assert!(timing.alternatives.is_empty());
    }

    #[test]
    fn test_quiet_hours_delay_to_next_active_time() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::Medium, 0).unwrap();

        // Baseline quiet window is 22-6 and no active hour remains today,
        // so tomorrow's earliest active hour (9) wins.
        let expected = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        assert_eq!(timing.recommended_time, expected);
        assert_eq!(timing.confidence, 0.8);
        assert_eq!(timing.reason, "delayed for quiet hours");
        assert_eq!(timing.alternatives, vec![now]);
    }

    #[test]
    fn test_high_urgency_does_not_override_quiet_hours() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::High, 0).unwrap();

        assert_eq!(timing.reason, "delayed for quiet hours");
        assert_eq!(timing.confidence, 0.8);
    }

    #[test]
    fn test_next_active_hour_today_with_jitter() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::Medium, 17).unwrap();

        // Earliest active hour after 10 is 12, plus 17 minutes of jitter.
        let expected = Utc.with_ymd_and_hms(2026, 3, 2, 12, 17, 0).unwrap();
        assert_eq!(timing.recommended_time, expected);
        assert_eq!(timing.confidence, 0.8);
    }

    #[test]
    fn test_alternatives_exclude_chosen_and_cap_at_three() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::Medium, 0).unwrap();

        assert_eq!(timing.alternatives.len(), 3);
        for alt in &timing.alternatives {
            assert_ne!(*alt, timing.recommended_time);
            assert_eq!(alt.date_naive(), timing.recommended_time.date_naive());
        }
    }

    #[test]
    fn test_tomorrow_when_no_active_hours_remain() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap();
        let timing = recommend(now, &profile_at(now), &settings(), Urgency::Medium, 0).unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        assert_eq!(timing.recommended_time, expected);
        assert_eq!(timing.confidence, 0.6);
    }

    #[test]
    fn test_empty_profile_defaults_to_nine_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap();
        let mut profile = profile_at(now);
        profile.active_hours.clear();
        let timing = recommend(now, &profile, &settings(), Urgency::Medium, 0).unwrap();

        let expected = Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap();
        assert_eq!(timing.recommended_time, expected);
        assert!(timing.alternatives.is_empty());
    }

    #[test]
    fn test_quiet_hours_ignored_when_preference_disabled() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let mut prefs = settings();
        prefs.delivery.respect_quiet_hours = false;
        let timing = recommend(now, &profile_at(now), &prefs, Urgency::Medium, 0).unwrap();

        // Falls through to tomorrow's first active hour instead of the
        // quiet-hours branch.
        assert_eq!(timing.confidence, 0.6);
        assert_ne!(timing.reason, "delayed for quiet hours");
    }

    #[test]
    fn test_fallback_is_five_minutes_out() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let timing = fallback(now);
        assert_eq!(timing.recommended_time, now + Duration::minutes(5));
        assert_eq!(timing.confidence, 0.3);
    }

    #[test]
    fn test_next_active_time_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 23, 0, 0).unwrap();
        let next = next_active_time(now, &[9, 12]).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 3, 9, 0, 0).unwrap());

        let midday = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let next = next_active_time(midday, &[9, 12]).unwrap();
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 2, 12, 0, 0).unwrap());
    }
}
