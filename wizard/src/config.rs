//! Configuration management for the event wizard.
//!
//! Loads configuration from environment variables with sensible defaults.

use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Wizard configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WizardConfig {
    /// Upper bound on every remote call, in milliseconds
    pub remote_timeout_ms: u64,
    /// Object storage bucket for banner images
    pub image_bucket: String,
    /// Maximum number of banner images on one event
    pub max_banner_images: usize,
    /// Number of notifications kept in feedback history
    pub feedback_capacity: usize,
    /// Window in which a repeated notification is dropped, in milliseconds
    pub feedback_dedupe_ms: u64,
}

impl WizardConfig {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    ///
    /// - `EVENT_WIZARD_REMOTE_TIMEOUT_MS`: remote call bound (default: 15000)
    /// - `EVENT_WIZARD_IMAGE_BUCKET`: banner bucket (default: `event-images`)
    /// - `EVENT_WIZARD_MAX_BANNER_IMAGES`: images per event (default: 10)
    /// - `EVENT_WIZARD_FEEDBACK_CAPACITY`: notification history (default: 16)
    /// - `EVENT_WIZARD_FEEDBACK_DEDUPE_MS`: dedupe window (default: 2000)
    ///
    /// Unparseable values fall back to the default.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            remote_timeout_ms: lookup("EVENT_WIZARD_REMOTE_TIMEOUT_MS")
                .and_then(|s| s.parse().ok())
                .filter(|ms| *ms > 0)
                .unwrap_or(defaults.remote_timeout_ms),
            image_bucket: lookup("EVENT_WIZARD_IMAGE_BUCKET")
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(defaults.image_bucket),
            max_banner_images: lookup("EVENT_WIZARD_MAX_BANNER_IMAGES")
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.max_banner_images),
            feedback_capacity: lookup("EVENT_WIZARD_FEEDBACK_CAPACITY")
                .and_then(|s| s.parse().ok())
                .filter(|n| *n > 0)
                .unwrap_or(defaults.feedback_capacity),
            feedback_dedupe_ms: lookup("EVENT_WIZARD_FEEDBACK_DEDUPE_MS")
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.feedback_dedupe_ms),
        }
    }

    /// Remote call bound as a `Duration`
    #[must_use]
    pub const fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }

    /// Feedback dedupe window as a `Duration`
    #[must_use]
    pub const fn feedback_dedupe(&self) -> Duration {
        Duration::from_millis(self.feedback_dedupe_ms)
    }
}

impl Default for WizardConfig {
    fn default() -> Self {
        Self {
            remote_timeout_ms: 15_000,
            image_bucket: "event-images".to_string(),
            max_banner_images: 10,
            feedback_capacity: 16,
            feedback_dedupe_ms: 2_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = WizardConfig::from_lookup(lookup(&[]));
        assert_eq!(config, WizardConfig::default());
        assert_eq!(config.remote_timeout(), Duration::from_secs(15));
    }

    #[test]
    fn reads_overrides() {
        let config = WizardConfig::from_lookup(lookup(&[
            ("EVENT_WIZARD_REMOTE_TIMEOUT_MS", "500"),
            ("EVENT_WIZARD_IMAGE_BUCKET", "banners"),
            ("EVENT_WIZARD_MAX_BANNER_IMAGES", "3"),
            ("EVENT_WIZARD_FEEDBACK_CAPACITY", "4"),
            ("EVENT_WIZARD_FEEDBACK_DEDUPE_MS", "0"),
        ]));

        assert_eq!(config.remote_timeout(), Duration::from_millis(500));
        assert_eq!(config.image_bucket, "banners");
        assert_eq!(config.max_banner_images, 3);
        assert_eq!(config.feedback_capacity, 4);
        assert_eq!(config.feedback_dedupe(), Duration::ZERO);
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = WizardConfig::from_lookup(lookup(&[
            ("EVENT_WIZARD_REMOTE_TIMEOUT_MS", "soon"),
            ("EVENT_WIZARD_MAX_BANNER_IMAGES", "0"),
            ("EVENT_WIZARD_IMAGE_BUCKET", "  "),
        ]));

        assert_eq!(config.remote_timeout_ms, 15_000);
        assert_eq!(config.max_banner_images, 10);
        assert_eq!(config.image_bucket, "event-images");
    }
}
