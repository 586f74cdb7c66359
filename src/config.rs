use anyhow::{anyhow, Result};
use tracing::{debug, warn};

use crate::bookmark::User;

const DEFAULT_TABLE: &str = "bookmarks";
const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Connection settings for the hosted store and the signed-in session
#[derive(Debug, Clone)]
pub struct Config {
    /// Project base URL, e.g. https://xyz.example.co
    pub store_url: String,

    /// Public project key sent as `apikey`
    pub api_key: String,

    /// Session token of the signed-in user
    pub access_token: String,

    pub user_id: String,

    pub user_email: String,

    /// Relation holding bookmark rows
    pub table: String,

    /// Capacity of the controller's inbound channel
    pub channel_capacity: usize,
}

impl Config {
    /// Read settings from `LINKDECK_*` variables, loading `.env` first if present
    pub fn from_env() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => debug!("Loaded environment from {:?}", path),
            Err(e) if e.not_found() => {}
            Err(e) => warn!("⚠️  Ignoring unreadable .env file: {}", e),
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let channel_capacity = match lookup("LINKDECK_CHANNEL_CAPACITY") {
            Some(raw) => raw
                .parse()
                .map_err(|_| anyhow!("LINKDECK_CHANNEL_CAPACITY must be a positive integer, got {:?}", raw))?,
            None => DEFAULT_CHANNEL_CAPACITY,
        };

        let config = Self {
            store_url: lookup("LINKDECK_STORE_URL").unwrap_or_default(),
            api_key: lookup("LINKDECK_API_KEY").unwrap_or_default(),
            access_token: lookup("LINKDECK_ACCESS_TOKEN").unwrap_or_default(),
            user_id: lookup("LINKDECK_USER_ID").unwrap_or_default(),
            user_email: lookup("LINKDECK_USER_EMAIL").unwrap_or_default(),
            table: lookup("LINKDECK_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string()),
            channel_capacity,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that cannot reach the store
    pub fn validate(&self) -> Result<()> {
        if self.store_url.is_empty() {
            return Err(anyhow!("❌ LINKDECK_STORE_URL is not set"));
        }
        if !self.store_url.starts_with("http://") && !self.store_url.starts_with("https://") {
            return Err(anyhow!("❌ LINKDECK_STORE_URL must be an http(s) URL, got {}", self.store_url));
        }
        if self.api_key.is_empty() {
            return Err(anyhow!("❌ LINKDECK_API_KEY is not set"));
        }
        if self.access_token.is_empty() || self.user_id.is_empty() {
            return Err(anyhow!("❌ No signed-in session: set LINKDECK_ACCESS_TOKEN and LINKDECK_USER_ID"));
        }
        if self.table.is_empty() {
            return Err(anyhow!("❌ LINKDECK_TABLE must not be empty"));
        }
        if self.channel_capacity == 0 {
            return Err(anyhow!("❌ LINKDECK_CHANNEL_CAPACITY must be at least 1"));
        }
        Ok(())
    }

    pub fn user(&self) -> User {
        User {
            id: self.user_id.clone(),
            email: self.user_email.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn complete() -> Vec<(&'static str, &'static str)> {
        vec![
            ("LINKDECK_STORE_URL", "https://project.example.co"),
            ("LINKDECK_API_KEY", "anon-key"),
            ("LINKDECK_ACCESS_TOKEN", "jwt"),
            ("LINKDECK_USER_ID", "u1"),
            ("LINKDECK_USER_EMAIL", "u1@example.com"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup_from(&complete())).unwrap();
        assert_eq!(config.table, "bookmarks");
        assert_eq!(config.channel_capacity, 64);
        assert_eq!(config.user().email, "u1@example.com");
    }

    #[test]
    fn test_missing_session_rejected() {
        let pairs: Vec<_> = complete()
            .into_iter()
            .filter(|(k, _)| *k != "LINKDECK_ACCESS_TOKEN")
            .collect();
        let err = Config::from_lookup(lookup_from(&pairs)).unwrap_err();
        assert!(err.to_string().contains("No signed-in session"));
    }

    #[test]
    fn test_bad_capacity_rejected() {
        let mut pairs = complete();
        pairs.push(("LINKDECK_CHANNEL_CAPACITY", "lots"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());

        let mut pairs = complete();
        pairs.push(("LINKDECK_CHANNEL_CAPACITY", "0"));
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }

    #[test]
    fn test_non_http_url_rejected() {
        let mut pairs = complete();
        pairs[0] = ("LINKDECK_STORE_URL", "ftp://project.example.co");
        assert!(Config::from_lookup(lookup_from(&pairs)).is_err());
    }
}
