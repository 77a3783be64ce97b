use std::path::PathBuf;

use rusqlite::Connection;
use serde::Deserialize;
use tokio::time::Instant;

use crate::search::QueryState;
use crate::store::Catalog;

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
    pub http: reqwest::Client,
    pub catalog: Option<Catalog>,
    pub query: QueryState,
    /// Deadline of a staged keystroke recomputation. Re-armed on every
    /// `search.input`, cleared by any synchronous recomputation.
    pub debounce_deadline: Option<Instant>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            http: reqwest::Client::new(),
            catalog: None,
            query: QueryState::default(),
            debounce_deadline: None,
        }
    }
}
