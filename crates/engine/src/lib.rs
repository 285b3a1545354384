//! Notification intelligence engine — behavior profiling, delivery timing,
//! send/suppress gating, content personalization, and engagement insights.
//!
//! One `NotificationEngine` is constructed at startup and shared behind
//! `Arc`; there is no global instance. Per-user state lives in the profile
//! store's sharded maps. Two concurrent analyses of the same user race
//! last-writer-wins; callers are expected to analyze a given user
//! sequentially.
//!
//! Every public entry point is total: data producers degrade to the
//! baseline profile or empty insights, the delivery gate fails open.

pub mod behavior;
pub mod gate;
pub mod insights;
pub mod personalize;
pub mod timing;

use std::sync::Arc;

use chrono::Utc;
use notify_core::config::EngineConfig;
use notify_core::types::{
    DeliveryDecision, EngagementInsights, Notification, NotificationKind, OptimalTiming, Urgency,
    UserBehaviorData,
};
use notify_store::{HistoryStore, KeyValueStore, ProfileStore};
use rand::Rng;
use tracing::{debug, warn};

pub struct NotificationEngine {
    history: Arc<dyn HistoryStore>,
    profiles: ProfileStore,
    config: EngineConfig,
}

impl NotificationEngine {
    pub fn new(
        history: Arc<dyn HistoryStore>,
        kv: Arc<dyn KeyValueStore>,
        config: EngineConfig,
    ) -> Self {
        Self {
            history,
            profiles: ProfileStore::new(kv),
            config,
        }
    }

    /// The underlying profile store, for settings updates and cached
    /// insights reads.
    pub fn profiles(&self) -> &ProfileStore {
        &self.profiles
    }

    /// Recompute the user's behavior profile from recent history.
    ///
    /// Empty history or a failed fetch yields the baseline profile and
    /// leaves previously cached state untouched.
    pub async fn analyze_user_behavior(&self, user_id: &str) -> UserBehaviorData {
        let now = Utc::now();
        let rows = match self
            .history
            .recent_interactions(user_id, self.config.analysis_history_limit)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                metrics::counter!("engine.analyze.fetch_error").increment(1);
                warn!(user_id, error = %e, "History fetch failed; returning baseline profile");
                return UserBehaviorData::baseline(user_id, now, &self.config.time_zone);
            }
        };

        if rows.is_empty() {
            return UserBehaviorData::baseline(user_id, now, &self.config.time_zone);
        }

        let profile = behavior::build_profile(user_id, &rows, now, &self.config.time_zone);
        self.profiles.store_profile(&profile).await;
        profile
    }

    /// Recommended delivery instant for a notification of `kind`.
    pub async fn optimal_notification_time(
        &self,
        user_id: &str,
        kind: NotificationKind,
        urgency: Urgency,
    ) -> OptimalTiming {
        let now = Utc::now();
        debug!(user_id, kind = %kind, "Timing recommendation requested");

        let profile = self.profile_or_baseline(user_id).await;
        let settings = self.profiles.personalization(user_id).await;
        let jitter_mins = rand::thread_rng().gen_range(0..=30);

        match timing::recommend(now, &profile, &settings, urgency, jitter_mins) {
            Ok(timing) => timing,
            Err(e) => {
                metrics::counter!("engine.timing.fallback").increment(1);
                warn!(user_id, error = %e, "Timing computation failed; using fallback");
                timing::fallback(now)
            }
        }
    }

    /// Personalized copy of `notification`; the input is never mutated.
    pub async fn personalize_content(
        &self,
        user_id: &str,
        notification: &Notification,
    ) -> Notification {
        let now = Utc::now();
        let profile = self.profile_or_baseline(user_id).await;
        let settings = self.profiles.personalization(user_id).await;
        personalize::personalize(notification, &settings, &profile, now)
    }

    /// Whether a notification of `kind` should go out right now.
    ///
    /// Fails open: any evaluation error produces a send decision, favoring
    /// availability over strict policy adherence.
    pub async fn should_send_now(
        &self,
        user_id: &str,
        kind: NotificationKind,
        urgency: Urgency,
    ) -> DeliveryDecision {
        let now = Utc::now();
        let profile = self.profile_or_baseline(user_id).await;
        let settings = self.profiles.personalization(user_id).await;

        if let Some(decision) = gate::decide_before_cap(now, &profile, &settings, urgency) {
            return decision;
        }

        let cap = gate::effective_cap(&settings, kind);
        match self.history.sent_today(user_id, kind, now).await {
            Ok(sent) => gate::decide_with_cap(sent, cap),
            Err(e) => {
                metrics::counter!("engine.gate.fail_open").increment(1);
                warn!(user_id, kind = %kind, error = %e, "Cap lookup failed; failing open");
                DeliveryDecision::send("default due to error")
            }
        }
    }

    /// Aggregate engagement insights, cached best-effort for display.
    pub async fn generate_insights(&self, user_id: &str) -> EngagementInsights {
        let now = Utc::now();
        let rows = match self
            .history
            .recent_interactions(user_id, self.config.insights_history_limit)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                metrics::counter!("engine.insights.fetch_error").increment(1);
                warn!(user_id, error = %e, "History fetch failed; generating empty insights");
                Vec::new()
            }
        };

        let profile = self.profile_or_baseline(user_id).await;
        let report = insights::build(user_id, &rows, &profile, now);
        self.profiles.cache_insights(user_id, &report).await;
        report
    }

    async fn profile_or_baseline(&self, user_id: &str) -> UserBehaviorData {
        match self.profiles.profile(user_id).await {
            Some(profile) => profile,
            None => UserBehaviorData::baseline(user_id, Utc::now(), &self.config.time_zone),
        }
    }
}
