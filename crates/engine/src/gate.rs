//! Delivery gate — send/suppress decision combining urgency, quiet hours,
//! activity likelihood, and per-kind daily frequency caps.

use chrono::{DateTime, Timelike, Utc};
use notify_core::types::{
    DeliveryDecision, NotificationKind, PersonalizationSettings, Urgency, UserBehaviorData,
};

use crate::timing::next_active_time;

/// Suggested retry delay once the daily cap is exhausted.
const CAP_RETRY_MINS: i64 = 1440;
/// Suggested retry delay outside active hours.
const OFF_HOURS_RETRY_MINS: i64 = 60;
/// Even high-urgency sends hold during this late-night stretch (inclusive).
const LATE_NIGHT_START: u32 = 1;
const LATE_NIGHT_END: u32 = 5;
const LATE_NIGHT_RELEASE_HOUR: i64 = 6;

/// Built-in per-kind daily caps, overridable per user.
pub(crate) fn default_daily_cap(kind: NotificationKind) -> u32 {
    match kind {
        NotificationKind::FriendPost => 10,
        NotificationKind::Comment => 15,
        NotificationKind::Reaction => 20,
        NotificationKind::Mention => 10,
        NotificationKind::FriendRequest => 5,
        NotificationKind::DirectMessage => 30,
        NotificationKind::SystemAnnouncement => 2,
        NotificationKind::WeeklyProgress => 1,
        NotificationKind::Other => 5,
    }
}

pub(crate) fn effective_cap(settings: &PersonalizationSettings, kind: NotificationKind) -> u32 {
    settings
        .custom_frequency
        .get(&kind)
        .copied()
        .unwrap_or_else(|| default_daily_cap(kind))
}

/// Rules that need no store access; `None` means the frequency cap decides.
pub(crate) fn decide_before_cap(
    now: DateTime<Utc>,
    profile: &UserBehaviorData,
    settings: &PersonalizationSettings,
    urgency: Urgency,
) -> Option<DeliveryDecision> {
    let hour = now.hour();

    if urgency == Urgency::High {
        if (LATE_NIGHT_START..=LATE_NIGHT_END).contains(&hour) {
            let delay =
                LATE_NIGHT_RELEASE_HOUR * 60 - i64::from(hour) * 60 - i64::from(now.minute());
            return Some(DeliveryDecision::suppress("held until 6:00 AM", delay));
        }
        return Some(DeliveryDecision::send("high urgency"));
    }

    if settings.delivery.respect_quiet_hours && profile.quiet_hours.contains(hour) {
        let delay = next_active_time(now, &profile.active_hours)
            .map(|next| (next - now).num_minutes())
            .unwrap_or(OFF_HOURS_RETRY_MINS);
        return Some(DeliveryDecision::suppress("inside quiet hours", delay));
    }

    if urgency == Urgency::Low && !profile.active_hours.contains(&hour) {
        return Some(DeliveryDecision::suppress(
            "outside active hours",
            OFF_HOURS_RETRY_MINS,
        ));
    }

    None
}

/// Final cap check once today's sent count is known.
pub(crate) fn decide_with_cap(sent_today: u64, cap: u32) -> DeliveryDecision {
    if sent_today >= u64::from(cap) {
        return DeliveryDecision::suppress("daily frequency cap reached", CAP_RETRY_MINS);
    }
    DeliveryDecision::send("optimal time")
}
