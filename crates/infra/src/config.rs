//! Runtime settings, read from `BAZAAR_*` environment variables.
//!
//! Missing variables fall back to defaults silently; malformed ones fall
//! back with a warning.

use serde::{Deserialize, Serialize};

use bazaar_inventory::DEFAULT_MAX_ATTEMPTS;
use bazaar_notifications::AnnouncementSettings;

pub const ENV_STOCK_RETRY_ATTEMPTS: &str = "BAZAAR_STOCK_RETRY_ATTEMPTS";
pub const ENV_ANNOUNCE_ENABLED: &str = "BAZAAR_ANNOUNCE_ENABLED";
pub const ENV_ANNOUNCE_NEW_PRODUCT: &str = "BAZAAR_ANNOUNCE_NEW_PRODUCT";
pub const ENV_ANNOUNCE_NEW_REVIEW: &str = "BAZAAR_ANNOUNCE_NEW_REVIEW";
pub const ENV_INVOICE_FROM: &str = "BAZAAR_INVOICE_FROM";
pub const ENV_SESSION_TTL_HOURS: &str = "BAZAAR_SESSION_TTL_HOURS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Optimistic retries of a contended stock decrement.
    pub stock_retry_attempts: u32,
    pub announcements: AnnouncementSettings,
    /// Sender address of invoice emails.
    pub invoice_from: String,
    pub session_ttl_hours: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            stock_retry_attempts: DEFAULT_MAX_ATTEMPTS,
            announcements: AnnouncementSettings::default(),
            invoice_from: "no-reply@bazaar.test".to_string(),
            session_ttl_hours: 24 * 14,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup (the environment, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            stock_retry_attempts: parse_or(&lookup, ENV_STOCK_RETRY_ATTEMPTS, defaults.stock_retry_attempts, |v| {
                v.parse::<u32>().ok().filter(|n| *n > 0)
            }),
            announcements: AnnouncementSettings {
                enabled: parse_or(&lookup, ENV_ANNOUNCE_ENABLED, defaults.announcements.enabled, parse_bool),
                new_product: parse_or(
                    &lookup,
                    ENV_ANNOUNCE_NEW_PRODUCT,
                    defaults.announcements.new_product,
                    parse_bool,
                ),
                new_review: parse_or(&lookup, ENV_ANNOUNCE_NEW_REVIEW, defaults.announcements.new_review, parse_bool),
            },
            invoice_from: parse_or(&lookup, ENV_INVOICE_FROM, defaults.invoice_from, |v| {
                Some(v.trim().to_string()).filter(|s| s.contains('@'))
            }),
            session_ttl_hours: parse_or(&lookup, ENV_SESSION_TTL_HOURS, defaults.session_ttl_hours, |v| {
                v.parse::<u32>().ok().filter(|n| *n > 0)
            }),
        }
    }
}

fn parse_or<T, L, P>(lookup: &L, key: &str, default: T, parse: P) -> T
where
    T: core::fmt::Debug,
    L: Fn(&str) -> Option<String>,
    P: Fn(&str) -> Option<T>,
{
    let Some(raw) = lookup(key) else {
        return default;
    };

    match parse(raw.trim()) {
        Some(value) => value,
        None => {
            tracing::warn!(key, value = %raw, default = ?default, "invalid setting; using default");
            default
        }
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
