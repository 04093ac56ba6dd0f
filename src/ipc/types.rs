use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;

use crate::cache::QueryCache;
use crate::table::PluginRegistry;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub cache: QueryCache,
    pub plugins: PluginRegistry,
}

impl AppState {
    pub fn new(cache_capacity: usize) -> Self {
        Self {
            workspace: None,
            db: None,
            cache: QueryCache::new(cache_capacity),
            plugins: PluginRegistry::with_builtins(),
        }
    }
}
