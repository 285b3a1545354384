//! Content personalization — rewrites notification title/body against the
//! user's preferences and behavior profile. Inputs are never mutated.

use chrono::{DateTime, Timelike, Utc};
use notify_core::types::{
    Notification, NotificationKind, PersonalizationSettings, UserBehaviorData,
};
use serde_json::json;

/// Body length above which short-message truncation kicks in.
const SHORT_BODY_LIMIT: usize = 100;
const TRUNCATED_BODY_CHARS: usize = 97;
/// Engagement rate below which the re-engagement treatment applies.
const LOW_ENGAGEMENT_RATE: f64 = 0.3;

const ATTENTION_EMOJI: &str = "✨";
const FALLBACK_EMOJI: &str = "🔔";

fn kind_emoji(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::FriendPost => "📸",
        NotificationKind::Comment => "💬",
        NotificationKind::Reaction => "❤️",
        NotificationKind::Mention => "👋",
        NotificationKind::FriendRequest => "🤝",
        NotificationKind::DirectMessage => "✉️",
        NotificationKind::SystemAnnouncement => "📢",
        NotificationKind::WeeklyProgress => "📊",
        NotificationKind::Other => FALLBACK_EMOJI,
    }
}

pub(crate) fn greeting_for_hour(hour: u32) -> &'static str {
    if hour < 12 {
        "Good morning! "
    } else if hour < 17 {
        "Good afternoon! "
    } else {
        "Good evening! "
    }
}

/// Build the personalized copy of `notification`.
pub(crate) fn personalize(
    notification: &Notification,
    settings: &PersonalizationSettings,
    profile: &UserBehaviorData,
    now: DateTime<Utc>,
) -> Notification {
    let mut out = notification.clone();

    if settings.content.short_messages && out.body.chars().count() > SHORT_BODY_LIMIT {
        out.body = out.body.chars().take(TRUNCATED_BODY_CHARS).collect::<String>() + "...";
    }

    if settings.content.use_emojis {
        out.title = format!("{} {}", kind_emoji(out.kind), out.title);
    }

    // Re-engagement treatment for disengaged users.
    if profile.engagement_rate < LOW_ENGAGEMENT_RATE {
        out.title = format!("{ATTENTION_EMOJI} {}", out.title);
        out.data.insert("priority".to_string(), json!("high"));
        out.data.insert("sound".to_string(), json!("default"));
    }

    if matches!(
        out.kind,
        NotificationKind::SystemAnnouncement | NotificationKind::WeeklyProgress
    ) {
        out.body = format!("{}{}", greeting_for_hour(now.hour()), out.body);
    }

    out
}
