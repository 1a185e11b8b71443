//! Discovery Resolver
//!
//! Checks that every sibling service name in the directory resolves, and switches the ones that
//! don't to their fallback address.
//!
//! ## Behaviour
//! - **Startup check**: `check_all` runs once, in the background, and never fails startup.
//! - **Sticky fallback**: An entry on its fallback stays there; a repeated check reports
//!   `AlreadyOnFallback` instead of substituting (and logging) again.
//! - **Optional re-check**: With a re-check interval set, entries on fallback are resolved again
//!   periodically and restored once their configured host answers.

use super::directory::ServiceDirectory;
use super::types::DiscoveryOutcome;

use async_trait::async_trait;
use reqwest::Url;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Host name resolution.
#[async_trait]
pub trait NameResolver: Send + Sync {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>>;
}

/// System resolver (cluster DNS inside a pod).
pub struct DnsResolver;

#[async_trait]
impl NameResolver for DnsResolver {
    async fn resolve(&self, host: &str, port: u16) -> io::Result<Vec<SocketAddr>> {
        let addrs: Vec<SocketAddr> = tokio::net::lookup_host((host, port)).await?.collect();
        if addrs.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for {}", host),
            ));
        }
        Ok(addrs)
    }
}

pub struct DiscoveryResolver {
    directory: Arc<ServiceDirectory>,
    resolver: Arc<dyn NameResolver>,
}

impl DiscoveryResolver {
    pub fn new(directory: Arc<ServiceDirectory>, resolver: Arc<dyn NameResolver>) -> Arc<Self> {
        Arc::new(Self {
            directory,
            resolver,
        })
    }

    /// Runs the startup check in the background, then keeps re-checking fallbacks if asked to.
    pub fn start(self: Arc<Self>, recheck_interval: Option<Duration>) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.check_all().await;

            let Some(period) = recheck_interval else {
                return;
            };
            let mut interval = tokio::time::interval(period);
            interval.tick().await;
            loop {
                interval.tick().await;
                self.recheck_fallbacks().await;
            }
        })
    }

    /// Resolves every directory entry once.
    pub async fn check_all(&self) -> Vec<DiscoveryOutcome> {
        let names = self.directory.names();
        tracing::info!("Checking {} configured service address(es)", names.len());

        let mut outcomes = Vec::with_capacity(names.len());
        for name in names {
            outcomes.push(self.check(&name).await);
        }
        outcomes
    }

    pub async fn check(&self, name: &str) -> DiscoveryOutcome {
        let Some(entry) = self.directory.entry(name) else {
            return DiscoveryOutcome::Missing {
                name: name.to_string(),
            };
        };

        if entry.on_fallback() {
            tracing::debug!("{} already using fallback {}", name, entry.fallback_url);
            return DiscoveryOutcome::AlreadyOnFallback {
                name: name.to_string(),
            };
        }

        match self.resolve_url(&entry.configured_url).await {
            Ok(addrs) => {
                tracing::info!(
                    "Resolved {} ({}) to {:?}",
                    name,
                    entry.configured_url,
                    addrs
                );
                self.directory.mark_resolved(name, addrs.clone());
                DiscoveryOutcome::Resolved {
                    name: name.to_string(),
                    addrs,
                }
            }
            Err(e) => {
                let reason = e.to_string();
                tracing::warn!(
                    "Unable to resolve {} ({}): {}",
                    name,
                    entry.configured_url,
                    reason
                );
                match self.directory.use_fallback(name, &reason) {
                    Some(fallback_url) => {
                        tracing::warn!("Using fallback {} for {}", fallback_url, name);
                        DiscoveryOutcome::FellBack {
                            name: name.to_string(),
                            fallback_url,
                            reason,
                        }
                    }
                    None => DiscoveryOutcome::AlreadyOnFallback {
                        name: name.to_string(),
                    },
                }
            }
        }
    }

    /// Tries the configured address of every entry that is on its fallback.
    pub async fn recheck_fallbacks(&self) -> Vec<DiscoveryOutcome> {
        let mut outcomes = Vec::new();
        for name in self.directory.names() {
            let Some(entry) = self.directory.entry(&name) else {
                continue;
            };
            if !entry.on_fallback() {
                continue;
            }

            match self.resolve_url(&entry.configured_url).await {
                Ok(addrs) => {
                    if let Some(url) = self.directory.restore(&name, addrs) {
                        tracing::info!("{} resolves again, switching back to {}", name, url);
                        outcomes.push(DiscoveryOutcome::Restored { name, url });
                    }
                }
                Err(e) => {
                    tracing::debug!("{} still unresolvable: {}", name, e);
                    outcomes.push(DiscoveryOutcome::AlreadyOnFallback { name });
                }
            }
        }
        outcomes
    }

    async fn resolve_url(&self, url: &str) -> io::Result<Vec<SocketAddr>> {
        let parsed = Url::parse(url)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "URL has no host"))?;
        let port = parsed.port_or_known_default().unwrap_or(80);
        self.resolver.resolve(host, port).await
    }
}
