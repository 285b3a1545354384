use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Length of the quiet-hours window.
pub const QUIET_WINDOW_HOURS: u32 = 8;

/// Kind of notification the app can deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    FriendPost,
    Comment,
    Reaction,
    Mention,
    FriendRequest,
    DirectMessage,
    SystemAnnouncement,
    WeeklyProgress,
    /// Kinds introduced after this build; carried through with generic handling.
    #[serde(other)]
    Other,
}

impl NotificationKind {
    /// Wire name as stored in the history table.
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::FriendPost => "friend_post",
            NotificationKind::Comment => "comment",
            NotificationKind::Reaction => "reaction",
            NotificationKind::Mention => "mention",
            NotificationKind::FriendRequest => "friend_request",
            NotificationKind::DirectMessage => "direct_message",
            NotificationKind::SystemAnnouncement => "system_announcement",
            NotificationKind::WeeklyProgress => "weekly_progress",
            NotificationKind::Other => "other",
        }
    }

    /// Parse a wire name; unknown kinds map to `Other`.
    pub fn from_wire(s: &str) -> Self {
        match s {
            "friend_post" => NotificationKind::FriendPost,
            "comment" => NotificationKind::Comment,
            "reaction" => NotificationKind::Reaction,
            "mention" => NotificationKind::Mention,
            "friend_request" => NotificationKind::FriendRequest,
            "direct_message" => NotificationKind::DirectMessage,
            "system_announcement" => NotificationKind::SystemAnnouncement,
            "weekly_progress" => NotificationKind::WeeklyProgress,
            _ => NotificationKind::Other,
        }
    }

    /// Human-readable plural label for user-facing text.
    pub fn label(&self) -> &'static str {
        match self {
            NotificationKind::FriendPost => "friend posts",
            NotificationKind::Comment => "comments",
            NotificationKind::Reaction => "reactions",
            NotificationKind::Mention => "mentions",
            NotificationKind::FriendRequest => "friend requests",
            NotificationKind::DirectMessage => "direct messages",
            NotificationKind::SystemAnnouncement => "announcements",
            NotificationKind::WeeklyProgress => "weekly progress digests",
            NotificationKind::Other => "miscellaneous notifications",
        }
    }
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Caller-supplied priority tier gating delivery rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
}

/// One row of notification-interaction history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub kind: NotificationKind,
    pub sent_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
    pub clicked_at: Option<DateTime<Utc>>,
    pub action_taken: bool,
}

/// Circular do-not-disturb window over hours of the day.
/// `end` is always `(start + QUIET_WINDOW_HOURS) % 24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuietWindow {
    pub start: u32,
    pub end: u32,
}

impl QuietWindow {
    pub fn starting_at(start: u32) -> Self {
        let start = start % 24;
        Self {
            start,
            end: (start + QUIET_WINDOW_HOURS) % 24,
        }
    }

    /// Whether `hour` falls inside the window, handling the midnight wrap.
    pub fn contains(&self, hour: u32) -> bool {
        if self.start <= self.end {
            hour >= self.start && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }
}

/// Which fixed day window carries most of the user's activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UsagePattern {
    Morning,
    Afternoon,
    Evening,
    Night,
    Mixed,
}

/// How many notifications the user is likely to tolerate per day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyPreference {
    High,
    Medium,
    Low,
}

impl FrequencyPreference {
    /// Derived from engagement rate: >0.7 high, >0.4 medium, else low.
    pub fn from_rate(rate: f64) -> Self {
        if rate > 0.7 {
            FrequencyPreference::High
        } else if rate > 0.4 {
            FrequencyPreference::Medium
        } else {
            FrequencyPreference::Low
        }
    }
}

/// Derived behavior profile for one user. Recomputed on demand by the
/// analyzer and replaced whole; individual fields are never mutated in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserBehaviorData {
    pub user_id: String,
    /// Hours of day (0-23) ranked by historical read count, at most 8.
    pub active_hours: Vec<u32>,
    /// Days of week (0 = Sunday) ranked by historical read count, at most 4.
    pub preferred_days: Vec<u32>,
    /// Mean minutes between send and read over rows with both timestamps.
    pub avg_response_mins: f64,
    /// Fraction of history with a click or recorded action, in [0, 1].
    pub engagement_rate: f64,
    pub quiet_hours: QuietWindow,
    pub usage_pattern: UsagePattern,
    pub frequency_preference: FrequencyPreference,
    pub last_active: DateTime<Utc>,
    pub time_zone: String,
}

impl UserBehaviorData {
    /// Conservative profile used until enough history exists, and whenever
    /// analysis cannot run.
    pub fn baseline(user_id: &str, now: DateTime<Utc>, time_zone: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            active_hours: vec![9, 12, 15, 18, 20],
            preferred_days: vec![1, 2, 3, 4, 5],
            avg_response_mins: 60.0,
            engagement_rate: 0.5,
            quiet_hours: QuietWindow { start: 22, end: 6 },
            usage_pattern: UsagePattern::Mixed,
            frequency_preference: FrequencyPreference::Medium,
            last_active: now,
            time_zone: time_zone.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPreferences {
    pub show_images: bool,
    pub show_previews: bool,
    pub use_emojis: bool,
    pub short_messages: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPreferences {
    pub batch_similar: bool,
    pub delay_non_urgent: bool,
    pub respect_quiet_hours: bool,
    pub adapt_to_activity: bool,
}

/// Per-user personalization settings, seeded with defaults on first access
/// and changed only by explicit update calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalizationSettings {
    pub user_id: String,
    pub preferred_kinds: Vec<NotificationKind>,
    pub muted_kinds: Vec<NotificationKind>,
    /// Per-kind daily caps overriding the built-in defaults.
    pub custom_frequency: HashMap<NotificationKind, u32>,
    pub content: ContentPreferences,
    pub delivery: DeliveryPreferences,
}

impl PersonalizationSettings {
    pub fn seeded(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            preferred_kinds: Vec::new(),
            muted_kinds: Vec::new(),
            custom_frequency: HashMap::new(),
            content: ContentPreferences {
                show_images: true,
                show_previews: true,
                use_emojis: true,
                short_messages: false,
            },
            delivery: DeliveryPreferences {
                batch_similar: true,
                delay_non_urgent: true,
                respect_quiet_hours: true,
                adapt_to_activity: true,
            },
        }
    }
}

/// A notification about to be delivered. `data` carries transport hints
/// (priority, sound) consumed downstream.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub data: HashMap<String, serde_json::Value>,
}

/// Recommended future delivery instant for one notification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimalTiming {
    pub recommended_time: DateTime<Utc>,
    pub confidence: f64,
    pub reason: String,
    /// Up to 3 alternative instants on the same date as the recommendation.
    pub alternatives: Vec<DateTime<Utc>>,
}

/// Send-or-suppress outcome with a suggested retry delay when suppressed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryDecision {
    pub should_send: bool,
    pub reason: String,
    pub suggested_delay_mins: Option<i64>,
}

impl DeliveryDecision {
    pub fn send(reason: &str) -> Self {
        Self {
            should_send: true,
            reason: reason.to_string(),
            suggested_delay_mins: None,
        }
    }

    pub fn suppress(reason: &str, delay_mins: i64) -> Self {
        Self {
            should_send: false,
            reason: reason.to_string(),
            suggested_delay_mins: Some(delay_mins),
        }
    }
}

/// Engagement tally for a single notification kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KindEngagement {
    pub sent: u64,
    pub engaged: u64,
    pub rate: f64,
}

/// Aggregate, display-oriented view of a user's notification engagement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngagementInsights {
    pub user_id: String,
    pub best_engagement_time: String,
    pub preferred_kinds: Vec<NotificationKind>,
    pub low_engagement_kinds: Vec<NotificationKind>,
    pub frequency: HashMap<NotificationKind, KindEngagement>,
    pub behavior_pattern: String,
    pub recommendations: Vec<String>,
    pub generated_at: DateTime<Utc>,
}
