//! Account queries: which subscriptions and locations the user can target.

use crate::config::UserConfig;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pub id: String,
    pub name: String,
}

impl fmt::Display for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.id {
            write!(f, "{}", self.id)
        } else {
            write!(f, "{} ({})", self.name, self.id)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub name: String,
    pub display_name: String,
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.name == self.display_name {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.display_name, self.name)
        }
    }
}

#[async_trait]
pub trait AccountManager: Send + Sync {
    async fn subscriptions(&self) -> Result<Vec<Subscription>>;

    /// Subscription id to preselect, if the user has one configured.
    async fn default_subscription(&self) -> Result<Option<String>>;

    async fn locations(&self, subscription_id: &str) -> Result<Vec<Location>>;

    async fn default_location(&self) -> Result<Option<String>>;
}

/// Account manager backed by the user's `config.toml`.
#[derive(Debug, Clone, Default)]
pub struct LocalAccountManager {
    config: UserConfig,
}

impl LocalAccountManager {
    pub fn new(config: UserConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl AccountManager for LocalAccountManager {
    async fn subscriptions(&self) -> Result<Vec<Subscription>> {
        let mut subs: Vec<Subscription> = self
            .config
            .subscriptions
            .iter()
            .map(|s| Subscription {
                id: s.id.clone(),
                name: s.name.clone().unwrap_or_else(|| s.id.clone()),
            })
            .collect();
        // A default that isn't listed is still a usable subscription.
        if let Some(default) = &self.config.defaults.subscription
            && !subs.iter().any(|s| &s.id == default)
        {
            subs.push(Subscription {
                id: default.clone(),
                name: default.clone(),
            });
        }
        Ok(subs)
    }

    async fn default_subscription(&self) -> Result<Option<String>> {
        Ok(self.config.defaults.subscription.clone())
    }

    async fn locations(&self, _subscription_id: &str) -> Result<Vec<Location>> {
        let mut locations: Vec<Location> = self
            .config
            .locations
            .iter()
            .map(|l| Location {
                name: l.name.clone(),
                display_name: l.display_name.clone().unwrap_or_else(|| l.name.clone()),
            })
            .collect();
        if let Some(default) = &self.config.defaults.location
            && !locations.iter().any(|l| &l.name == default)
        {
            locations.push(Location {
                name: default.clone(),
                display_name: default.clone(),
            });
        }
        Ok(locations)
    }

    async fn default_location(&self) -> Result<Option<String>> {
        Ok(self.config.defaults.location.clone())
    }
}
