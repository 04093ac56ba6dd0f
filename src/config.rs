use anyhow::Context;
use std::path::PathBuf;

pub const DEFAULT_CACHE_CAPACITY: usize = 64;

/// Startup settings read from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaemonConfig {
    pub workspace: Option<PathBuf>,
    pub cache_capacity: usize,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            workspace: None,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl DaemonConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let workspace = lookup("DATATABLED_WORKSPACE")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from);
        let cache_capacity = match lookup("DATATABLED_CACHE_CAPACITY") {
            Some(raw) => parse_usize(&raw).context("DATATABLED_CACHE_CAPACITY")?,
            None => DEFAULT_CACHE_CAPACITY,
        };
        Ok(Self {
            workspace,
            cache_capacity,
        })
    }
}

fn parse_usize(raw: &str) -> anyhow::Result<usize> {
    raw.trim()
        .parse::<usize>()
        .with_context(|| format!("expected a non-negative integer, got {:?}", raw))
}
