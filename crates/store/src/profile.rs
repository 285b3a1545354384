//! Per-user profile store: DashMap L1 held for the process lifetime, with
//! a durable key-value layer underneath. Durable failures never propagate.

use std::sync::Arc;

use dashmap::DashMap;
use notify_core::types::{EngagementInsights, PersonalizationSettings, UserBehaviorData};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::kv::KeyValueStore;

pub struct ProfileStore {
    kv: Arc<dyn KeyValueStore>,
    profiles: DashMap<String, UserBehaviorData>,
    settings: DashMap<String, PersonalizationSettings>,
}

fn behavior_key(user_id: &str) -> String {
    format!("behavior:{user_id}")
}

fn settings_key(user_id: &str) -> String {
    format!("personalization:{user_id}")
}

fn insights_key(user_id: &str) -> String {
    format!("insights:{user_id}")
}

impl ProfileStore {
    pub fn new(kv: Arc<dyn KeyValueStore>) -> Self {
        Self {
            kv,
            profiles: DashMap::new(),
            settings: DashMap::new(),
        }
    }

    /// Cached behavior profile: L1 first, then the durable layer.
    pub async fn profile(&self, user_id: &str) -> Option<UserBehaviorData> {
        if let Some(profile) = self.profiles.get(user_id) {
            metrics::counter!("profile_store.l1.hit").increment(1);
            return Some(profile.clone());
        }
        metrics::counter!("profile_store.l1.miss").increment(1);

        let loaded: Option<UserBehaviorData> = self.load(&behavior_key(user_id)).await;
        if let Some(profile) = &loaded {
            self.profiles.insert(user_id.to_string(), profile.clone());
        }
        loaded
    }

    /// Replace the cached profile and persist best-effort.
    pub async fn store_profile(&self, profile: &UserBehaviorData) {
        self.profiles
            .insert(profile.user_id.clone(), profile.clone());
        self.persist(&behavior_key(&profile.user_id), profile).await;
    }

    /// Personalization settings, seeding defaults on first access.
    pub async fn personalization(&self, user_id: &str) -> PersonalizationSettings {
        if let Some(settings) = self.settings.get(user_id) {
            return settings.clone();
        }
        if let Some(settings) = self
            .load::<PersonalizationSettings>(&settings_key(user_id))
            .await
        {
            self.settings.insert(user_id.to_string(), settings.clone());
            return settings;
        }

        let seeded = PersonalizationSettings::seeded(user_id);
        self.settings.insert(user_id.to_string(), seeded.clone());
        self.persist(&settings_key(user_id), &seeded).await;
        seeded
    }

    /// Replace the stored settings (explicit user update).
    pub async fn update_personalization(&self, settings: PersonalizationSettings) {
        self.settings
            .insert(settings.user_id.clone(), settings.clone());
        self.persist(&settings_key(&settings.user_id), &settings)
            .await;
    }

    /// Cache generated insights for later display.
    pub async fn cache_insights(&self, user_id: &str, insights: &EngagementInsights) {
        self.persist(&insights_key(user_id), insights).await;
    }

    /// Last insights generated for this user, if any survive durably.
    pub async fn cached_insights(&self, user_id: &str) -> Option<EngagementInsights> {
        self.load(&insights_key(user_id)).await
    }

    async fn load<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.kv.get(key).await {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!(key, error = %e, "Discarding undecodable cache entry");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                metrics::counter!("profile_store.durable.read_error").increment(1);
                warn!(key, error = %e, "Durable cache read failed");
                None
            }
        }
    }

    async fn persist<T: Serialize>(&self, key: &str, value: &T) {
        let json = match serde_json::to_string(value) {
            Ok(json) => json,
            Err(e) => {
                warn!(key, error = %e, "Failed to encode cache entry");
                return;
            }
        };
        if let Err(e) = self.kv.set(key, &json).await {
            metrics::counter!("profile_store.durable.write_error").increment(1);
            warn!(key, error = %e, "Durable cache write failed; keeping in-memory copy");
        }
    }
}
