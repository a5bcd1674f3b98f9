//! Environment Configuration
//!
//! Shard addresses, timeouts, and placement rules are read from the process
//! environment. Every variable has a default so that a local two-shard setup
//! needs no configuration at all.

use crate::error::{ClusterError, Result};
use crate::partition::policy::PartitionRules;
use crate::router::types::WritePolicy;

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_SHARD_A_PORT: u16 = 27017;
pub const DEFAULT_SHARD_B_PORT: u16 = 27018;
pub const DEFAULT_TIMEOUT_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct ShardEndpoint {
    pub host: String,
    pub port: u16,
}

impl ShardEndpoint {
    pub fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Clone)]
pub struct ClusterConfig {
    pub shard_a: ShardEndpoint,
    pub shard_b: ShardEndpoint,
    /// Upper bound for one round trip to one shard.
    pub request_timeout: Duration,
    pub rules: PartitionRules,
    pub placement_seed: Option<u64>,
    pub write_policy: WritePolicy,
    pub media_dir: Option<PathBuf>,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            shard_a: ShardEndpoint {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_SHARD_A_PORT,
            },
            shard_b: ShardEndpoint {
                host: "127.0.0.1".to_string(),
                port: DEFAULT_SHARD_B_PORT,
            },
            request_timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            rules: PartitionRules::default(),
            placement_seed: None,
            write_policy: WritePolicy::FirstMatch,
            media_dir: None,
        }
    }
}

impl ClusterConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        let rules = PartitionRules {
            region_a: lookup("REGION_A").unwrap_or(defaults.rules.region_a),
            region_b: lookup("REGION_B").unwrap_or(defaults.rules.region_b),
            category_a: lookup("CATEGORY_A").unwrap_or(defaults.rules.category_a),
            category_b: lookup("CATEGORY_B").unwrap_or(defaults.rules.category_b),
            category_a_affinity: parse_var(&lookup, "SCIENCE_AFFINITY")?
                .unwrap_or(defaults.rules.category_a_affinity),
        };
        if !(0.0..=1.0).contains(&rules.category_a_affinity) {
            return Err(ClusterError::Config(format!(
                "SCIENCE_AFFINITY must be within [0, 1], got {}",
                rules.category_a_affinity
            )));
        }

        Ok(Self {
            shard_a: ShardEndpoint {
                host: lookup("DBMS1_HOST").unwrap_or(defaults.shard_a.host),
                port: parse_var(&lookup, "DBMS1_PORT")?.unwrap_or(defaults.shard_a.port),
            },
            shard_b: ShardEndpoint {
                host: lookup("DBMS2_HOST").unwrap_or(defaults.shard_b.host),
                port: parse_var(&lookup, "DBMS2_PORT")?.unwrap_or(defaults.shard_b.port),
            },
            request_timeout: parse_var::<u64>(&lookup, "SHARD_TIMEOUT_MS")?
                .map(Duration::from_millis)
                .unwrap_or(defaults.request_timeout),
            rules,
            placement_seed: parse_var(&lookup, "PLACEMENT_SEED")?,
            write_policy: parse_var(&lookup, "WRITE_POLICY")?.unwrap_or(defaults.write_policy),
            media_dir: lookup("MEDIA_DIR").map(PathBuf::from),
        })
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ClusterError::Config(format!("{name}='{raw}': {e}"))),
    }
}
