use super::types::{ResolutionStatus, ServiceConfig, ServiceEntry};

use anyhow::{Context, Result};
use dashmap::DashMap;
use reqwest::Url;
use std::net::SocketAddr;
use std::sync::Arc;

const FALLBACK_HOST: &str = "localhost";

/// Logical collection name -> base address of the node serving it.
///
/// Entries are created once from configuration. Afterwards only the discovery resolver touches
/// them, and only to swap between the configured and the fallback address.
pub struct ServiceDirectory {
    entries: DashMap<String, ServiceEntry>,
}

impl ServiceDirectory {
    pub fn new(configs: &[ServiceConfig]) -> Result<Arc<Self>> {
        let entries = DashMap::new();
        for config in configs {
            let configured_url = normalize_url(&config.url)
                .with_context(|| format!("invalid URL for service '{}'", config.name))?;
            let fallback_url = match &config.fallback {
                Some(url) => normalize_url(url)
                    .with_context(|| format!("invalid fallback for service '{}'", config.name))?,
                None => derive_fallback(&configured_url)?,
            };

            entries.insert(
                config.name.clone(),
                ServiceEntry {
                    name: config.name.clone(),
                    active_url: configured_url.clone(),
                    configured_url,
                    fallback_url,
                    status: ResolutionStatus::Unchecked,
                },
            );
        }

        Ok(Arc::new(Self { entries }))
    }

    pub fn empty() -> Arc<Self> {
        Arc::new(Self {
            entries: DashMap::new(),
        })
    }

    /// Address to use for calls to `name`, if the service is configured.
    pub fn base_url(&self, name: &str) -> Option<String> {
        self.entries.get(name).map(|entry| entry.active_url.clone())
    }

    pub fn entry(&self, name: &str) -> Option<ServiceEntry> {
        self.entries.get(name).map(|entry| entry.value().clone())
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.entries.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }

    pub fn mark_resolved(&self, name: &str, addrs: Vec<SocketAddr>) {
        if let Some(mut entry) = self.entries.get_mut(name) {
            entry.status = ResolutionStatus::Resolved { addrs };
        }
    }

    /// Switches `name` to its fallback address.
    ///
    /// Returns the fallback URL when the switch happened now, `None` when the entry is unknown
    /// or already on its fallback.
    pub fn use_fallback(&self, name: &str, reason: &str) -> Option<String> {
        let mut entry = self.entries.get_mut(name)?;
        if entry.on_fallback() {
            return None;
        }
        entry.active_url = entry.fallback_url.clone();
        entry.status = ResolutionStatus::Fallback {
            reason: reason.to_string(),
        };
        Some(entry.active_url.clone())
    }

    /// Puts `name` back on its configured address. Returns it when the entry was on fallback.
    pub fn restore(&self, name: &str, addrs: Vec<SocketAddr>) -> Option<String> {
        let mut entry = self.entries.get_mut(name)?;
        if !entry.on_fallback() {
            return None;
        }
        entry.active_url = entry.configured_url.clone();
        entry.status = ResolutionStatus::Resolved { addrs };
        Some(entry.active_url.clone())
    }
}

fn normalize_url(raw: &str) -> Result<String> {
    let url = Url::parse(raw)?;
    if url.host_str().is_none() {
        return Err(anyhow::anyhow!("URL '{}' has no host", raw));
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

/// The configured address with its host swapped for the local machine, keeping scheme and port.
fn derive_fallback(configured: &str) -> Result<String> {
    let mut url = Url::parse(configured)?;
    url.set_host(Some(FALLBACK_HOST))
        .with_context(|| format!("cannot derive fallback for '{}'", configured))?;
    Ok(url.as_str().trim_end_matches('/').to_string())
}
