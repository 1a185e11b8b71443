//! Discovery Data Types

use std::net::SocketAddr;

/// Static configuration for one sibling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Logical collection name, e.g. `customers`.
    pub name: String,
    /// Base URL as configured, e.g. `http://customer-service`.
    pub url: String,
    /// Explicit fallback. When absent, the configured URL with its host replaced by `localhost`.
    pub fallback: Option<String>,
}

/// Result of the most recent name resolution for a directory entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionStatus {
    Unchecked,
    Resolved { addrs: Vec<SocketAddr> },
    Fallback { reason: String },
}

/// A routable sibling service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceEntry {
    pub name: String,
    pub configured_url: String,
    pub fallback_url: String,
    /// Address used for outbound calls; either `configured_url` or `fallback_url`.
    pub active_url: String,
    pub status: ResolutionStatus,
}

impl ServiceEntry {
    pub fn on_fallback(&self) -> bool {
        matches!(self.status, ResolutionStatus::Fallback { .. })
    }
}

/// What a single discovery check did to an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Resolved {
        name: String,
        addrs: Vec<SocketAddr>,
    },
    /// Resolution failed and the entry was switched to its fallback.
    FellBack {
        name: String,
        fallback_url: String,
        reason: String,
    },
    /// The entry was already using its fallback; nothing changed.
    AlreadyOnFallback { name: String },
    /// A periodic re-check resolved the configured host again.
    Restored { name: String, url: String },
    /// The entry vanished between listing and checking.
    Missing { name: String },
}

impl DiscoveryOutcome {
    pub fn name(&self) -> &str {
        match self {
            DiscoveryOutcome::Resolved { name, .. }
            | DiscoveryOutcome::FellBack { name, .. }
            | DiscoveryOutcome::AlreadyOnFallback { name }
            | DiscoveryOutcome::Restored { name, .. }
            | DiscoveryOutcome::Missing { name } => name,
        }
    }
}
