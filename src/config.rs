//! Node Configuration
//!
//! Built from `--flag value` command-line arguments, with a few environment variables as
//! defaults so the same image can be configured per deployment.

use crate::discovery::types::ServiceConfig;
use crate::node::service::ENDPOINT_HEALTHZ;
use crate::population::types::RetryPolicy;

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

pub const DEFAULT_BIND: &str = "0.0.0.0:3000";
pub const DEFAULT_SOURCE_URL: &str = "http://testdata-service/testdata";

/// The collection a node serves, with its primary key named explicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionConfig {
    pub name: String,
    pub primary_key: String,
}

#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub bind_addr: SocketAddr,
    pub collection: CollectionConfig,
    pub source_url: String,
    pub services: Vec<ServiceConfig>,
    /// Related collection name -> internal field holding its identifiers.
    pub relations: HashMap<String, String>,
    pub retry: RetryPolicy,
    pub fetch_timeout: Duration,
    pub relation_timeout: Duration,
    pub max_outbound: usize,
    pub recheck_interval: Option<Duration>,
    pub log_level: tracing::Level,
}

impl NodeConfig {
    pub const USAGE: &'static str = "Usage: collection-node --collection <name> --primary-key <field> \
[--bind <addr:port>] [--source <url>] [--service <name>=<url>]... [--fallback <name>=<url>]... \
[--relation <name>=<_field>]... [--retry-interval-ms <n>] [--retry-max-interval-ms <n>] \
[--max-attempts <n>] [--fetch-timeout-ms <n>] [--relation-timeout-ms <n>] [--max-outbound <n>] \
[--recheck-interval-secs <n>] [--log-level <level>]";

    /// Reads the process arguments and environment.
    pub fn from_env() -> Result<Self> {
        let env: HashMap<String, String> = std::env::vars().collect();
        Self::parse(std::env::args().skip(1), &env)
    }

    /// Parses `args` (without the program name), falling back to `env` for unset values.
    pub fn parse<I>(args: I, env: &HashMap<String, String>) -> Result<Self>
    where
        I: IntoIterator<Item = String>,
    {
        let args: Vec<String> = args.into_iter().collect();

        let mut bind = env.get("NODE_BIND").cloned();
        let mut collection = env.get("COLLECTION").cloned();
        let mut primary_key = env.get("PRIMARY_KEY").cloned();
        let mut source_url = env.get("SOURCE_URL").cloned();
        let mut log_level = env.get("LOG_LEVEL").cloned();
        let mut service_urls: Vec<(String, String)> = Vec::new();
        let mut fallbacks: HashMap<String, String> = HashMap::new();
        let mut relations: HashMap<String, String> = HashMap::new();
        let mut retry_interval = RetryPolicy::DEFAULT_INTERVAL;
        let mut retry_max_interval: Option<Duration> = None;
        let mut max_attempts = RetryPolicy::DEFAULT_MAX_ATTEMPTS;
        let mut fetch_timeout = Duration::from_secs(10);
        let mut relation_timeout = Duration::from_secs(5);
        let mut max_outbound = 32usize;
        let mut recheck_interval: Option<Duration> = None;

        let mut i = 0;
        while i < args.len() {
            let flag = args[i].as_str();
            let value = args
                .get(i + 1)
                .with_context(|| format!("{} requires a value", flag))?;

            match flag {
                "--bind" => bind = Some(value.clone()),
                "--collection" => collection = Some(value.clone()),
                "--primary-key" => primary_key = Some(value.clone()),
                "--source" => source_url = Some(value.clone()),
                "--log-level" => log_level = Some(value.clone()),
                "--service" => service_urls.push(split_pair(flag, value)?),
                "--fallback" => {
                    let (name, url) = split_pair(flag, value)?;
                    fallbacks.insert(name, url);
                }
                "--relation" => {
                    let (name, field) = split_pair(flag, value)?;
                    relations.insert(name, field);
                }
                "--retry-interval-ms" => retry_interval = Duration::from_millis(number(flag, value)?),
                "--retry-max-interval-ms" => {
                    retry_max_interval = Some(Duration::from_millis(number(flag, value)?))
                }
                "--max-attempts" => max_attempts = number(flag, value)?,
                "--fetch-timeout-ms" => fetch_timeout = Duration::from_millis(number(flag, value)?),
                "--relation-timeout-ms" => {
                    relation_timeout = Duration::from_millis(number(flag, value)?)
                }
                "--max-outbound" => max_outbound = number(flag, value)?,
                "--recheck-interval-secs" => {
                    recheck_interval = Some(Duration::from_secs(number(flag, value)?))
                }
                _ => return Err(anyhow::anyhow!("unknown argument '{}'\n{}", flag, Self::USAGE)),
            }
            i += 2;
        }

        let name = collection.context("--collection (or COLLECTION) is required")?;
        let primary_key = primary_key.context("--primary-key (or PRIMARY_KEY) is required")?;
        if name.is_empty() || name.contains('/') || format!("/{}", name) == ENDPOINT_HEALTHZ {
            return Err(anyhow::anyhow!("invalid collection name '{}'", name));
        }
        if primary_key.is_empty() {
            return Err(anyhow::anyhow!("primary key must not be empty"));
        }

        let bind_addr: SocketAddr = bind
            .as_deref()
            .unwrap_or(DEFAULT_BIND)
            .parse()
            .context("invalid bind address")?;

        if max_attempts == 0 {
            return Err(anyhow::anyhow!("--max-attempts must be at least 1"));
        }
        if max_outbound == 0 {
            return Err(anyhow::anyhow!("--max-outbound must be at least 1"));
        }
        if recheck_interval.is_some_and(|d| d.is_zero()) {
            return Err(anyhow::anyhow!("--recheck-interval-secs must be positive"));
        }

        let retry = match retry_max_interval {
            Some(max) if max < retry_interval => {
                return Err(anyhow::anyhow!(
                    "--retry-max-interval-ms must not be below --retry-interval-ms"
                ));
            }
            Some(max) => RetryPolicy::exponential(retry_interval, max, max_attempts),
            None => RetryPolicy::fixed(retry_interval, max_attempts),
        };

        for name in fallbacks.keys() {
            if !service_urls.iter().any(|(service, _)| service == name) {
                return Err(anyhow::anyhow!("--fallback given for unknown service '{}'", name));
            }
        }
        let services = service_urls
            .into_iter()
            .map(|(name, url)| ServiceConfig {
                fallback: fallbacks.get(&name).cloned(),
                name,
                url,
            })
            .collect();

        let log_level = match log_level {
            Some(level) => level
                .parse()
                .map_err(|_| anyhow::anyhow!("invalid log level '{}'", level))?,
            None => tracing::Level::INFO,
        };

        Ok(Self {
            bind_addr,
            collection: CollectionConfig { name, primary_key },
            source_url: source_url.unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string()),
            services,
            relations,
            retry,
            fetch_timeout,
            relation_timeout,
            max_outbound,
            recheck_interval,
            log_level,
        })
    }
}

fn split_pair(flag: &str, value: &str) -> Result<(String, String)> {
    match value.split_once('=') {
        Some((name, rest)) if !name.is_empty() && !rest.is_empty() => {
            Ok((name.to_string(), rest.to_string()))
        }
        _ => Err(anyhow::anyhow!("{} expects <name>=<value>, got '{}'", flag, value)),
    }
}

fn number<T>(flag: &str, value: &str) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e: T::Err| anyhow::anyhow!("{} expects a number, got '{}': {}", flag, value, e))
}
