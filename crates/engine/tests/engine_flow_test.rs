//! End-to-end engine flow over the in-memory stores.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use notify_core::config::EngineConfig;
use notify_core::types::{
    InteractionRecord, Notification, NotificationKind, Urgency, UsagePattern,
};
use notify_core::{NotifyError, NotifyResult};
use notify_engine::NotificationEngine;
use notify_store::{HistoryStore, MemoryHistoryStore, MemoryKvStore};
use uuid::Uuid;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("notify_engine=debug")
        .try_init();
}

fn engine_over(
    history: Arc<MemoryHistoryStore>,
    kv: Arc<MemoryKvStore>,
) -> NotificationEngine {
    NotificationEngine::new(history, kv, EngineConfig::default())
}

fn read_row(kind: NotificationKind, sent_at: DateTime<Utc>, clicked: bool) -> InteractionRecord {
    InteractionRecord {
        kind,
        sent_at,
        read_at: Some(sent_at + Duration::minutes(15)),
        clicked_at: clicked.then(|| sent_at + Duration::minutes(16)),
        action_taken: false,
    }
}

fn sent_row(kind: NotificationKind, sent_at: DateTime<Utc>) -> InteractionRecord {
    InteractionRecord {
        kind,
        sent_at,
        read_at: None,
        clicked_at: None,
        action_taken: false,
    }
}

/// History store whose every call fails, for exercising degradation paths.
struct FailingHistory;

#[async_trait]
impl HistoryStore for FailingHistory {
    async fn recent_interactions(
        &self,
        _user_id: &str,
        _limit: usize,
    ) -> NotifyResult<Vec<InteractionRecord>> {
        Err(NotifyError::History("connection reset".to_string()))
    }

    async fn sent_today(
        &self,
        _user_id: &str,
        _kind: NotificationKind,
        _now: DateTime<Utc>,
    ) -> NotifyResult<u64> {
        Err(NotifyError::History("connection reset".to_string()))
    }
}

#[tokio::test]
async fn test_empty_history_yields_baseline_profile() {
    init_tracing();
    let engine = engine_over(Arc::new(MemoryHistoryStore::new()), Arc::new(MemoryKvStore::new()));

    let profile = engine.analyze_user_behavior("u1").await;

    assert_eq!(profile.active_hours, vec![9, 12, 15, 18, 20]);
    assert_eq!(profile.preferred_days, vec![1, 2, 3, 4, 5]);
    assert_eq!(profile.avg_response_mins, 60.0);
    assert_eq!(profile.engagement_rate, 0.5);
    assert_eq!(profile.quiet_hours.start, 22);
    assert_eq!(profile.quiet_hours.end, 6);
    assert_eq!(profile.usage_pattern, UsagePattern::Mixed);
}

#[tokio::test]
async fn test_analysis_caches_profile_for_later_calls() {
    let history = Arc::new(MemoryHistoryStore::new());
    let base = Utc::now() - Duration::days(3);
    for i in 0..10 {
        history.push(
            "u1",
            read_row(NotificationKind::FriendPost, base + Duration::hours(i), i % 2 == 0),
        );
    }

    let engine = engine_over(history, Arc::new(MemoryKvStore::new()));
    let analyzed = engine.analyze_user_behavior("u1").await;

    let cached = engine.profiles().profile("u1").await.unwrap();
    assert_eq!(cached, analyzed);
}

#[tokio::test]
async fn test_profile_survives_into_a_fresh_engine() {
    let history = Arc::new(MemoryHistoryStore::new());
    let kv = Arc::new(MemoryKvStore::new());
    let base = Utc::now() - Duration::days(2);
    for i in 0..6 {
        history.push(
            "u1",
            read_row(NotificationKind::Comment, base + Duration::hours(i), true),
        );
    }

    let first = engine_over(history, kv.clone());
    let analyzed = first.analyze_user_behavior("u1").await;

    // Fresh engine, no history store access, same durable layer.
    let second = engine_over(Arc::new(MemoryHistoryStore::new()), kv);
    let reloaded = second.profiles().profile("u1").await.unwrap();
    assert_eq!(reloaded, analyzed);
}

#[tokio::test]
async fn test_frequency_cap_suppresses_for_a_day() {
    let history = Arc::new(MemoryHistoryStore::new());
    let now = Utc::now();
    history.push("u1", sent_row(NotificationKind::WeeklyProgress, now));

    let engine = engine_over(history, Arc::new(MemoryKvStore::new()));

    // Keep the decision on the cap path regardless of wall-clock hour.
    let mut settings = engine.profiles().personalization("u1").await;
    settings.delivery.respect_quiet_hours = false;
    engine.profiles().update_personalization(settings).await;

    let decision = engine
        .should_send_now("u1", NotificationKind::WeeklyProgress, Urgency::Medium)
        .await;
    assert!(!decision.should_send);
    assert_eq!(decision.suggested_delay_mins, Some(1440));

    let under_cap = engine
        .should_send_now("u1", NotificationKind::FriendPost, Urgency::Medium)
        .await;
    assert!(under_cap.should_send);
    assert_eq!(under_cap.reason, "optimal time");
}

#[tokio::test]
async fn test_personalization_leaves_input_untouched() {
    let engine = engine_over(Arc::new(MemoryHistoryStore::new()), Arc::new(MemoryKvStore::new()));

    let input = Notification {
        id: Uuid::new_v4(),
        user_id: "u1".to_string(),
        kind: NotificationKind::FriendPost,
        title: "New post from Sam".to_string(),
        body: "Sam shared a photo.".to_string(),
        data: HashMap::new(),
    };
    let before = input.clone();

    let out = engine.personalize_content("u1", &input).await;

    assert_eq!(input, before);
    assert!(out.title.starts_with("📸 "));
}

#[tokio::test]
async fn test_insights_report_rates_and_is_cached() {
    let history = Arc::new(MemoryHistoryStore::new());
    let base = Utc::now() - Duration::hours(5);
    history.push("u1", sent_row(NotificationKind::FriendPost, base));
    history.push(
        "u1",
        read_row(NotificationKind::FriendPost, base + Duration::hours(1), true),
    );

    let engine = engine_over(history, Arc::new(MemoryKvStore::new()));
    let insights = engine.generate_insights("u1").await;

    let stats = &insights.frequency[&NotificationKind::FriendPost];
    assert_eq!(stats.sent, 2);
    assert_eq!(stats.engaged, 1);
    assert!((stats.rate - 0.5).abs() < 1e-9);

    let cached = engine.profiles().cached_insights("u1").await.unwrap();
    assert_eq!(cached, insights);
}

#[tokio::test]
async fn test_history_outage_degrades_but_never_errors() {
    let engine = NotificationEngine::new(
        Arc::new(FailingHistory),
        Arc::new(MemoryKvStore::new()),
        EngineConfig::default(),
    );

    // Analysis falls back to the baseline profile.
    let profile = engine.analyze_user_behavior("u1").await;
    assert_eq!(profile.engagement_rate, 0.5);

    // The gate fails open when the cap lookup is unavailable.
    let mut settings = engine.profiles().personalization("u1").await;
    settings.delivery.respect_quiet_hours = false;
    engine.profiles().update_personalization(settings).await;

    let decision = engine
        .should_send_now("u1", NotificationKind::FriendPost, Urgency::Medium)
        .await;
    assert!(decision.should_send);
    assert_eq!(decision.reason, "default due to error");

    // Insights degrade to an empty-but-valid report.
    let insights = engine.generate_insights("u1").await;
    assert!(insights.frequency.is_empty());
    assert!(insights.preferred_kinds.is_empty());
}
