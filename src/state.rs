use std::collections::HashMap;

use crate::model::{Prospect, Stage};

#[derive(Clone)]
pub struct Config {
    /// Backend base URL, no trailing slash.
    pub api_base: String,
    /// Bearer credential attached to every request. Resolved once at
    /// startup; provisioning is out of scope.
    pub api_token: String,
    pub poll_secs: u64,
    /// Max activity entries shown in the feed.
    pub activity_limit: usize,
    /// Width of the stage chart segment bar, in cells.
    pub chart_width: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            api_base: std::env::var("API_BASE")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            api_token: std::env::var("API_TOKEN")
                .unwrap_or_else(|_| "dev-token".to_string()),
            poll_secs: std::env::var("POLL_SECS").ok().and_then(|v| v.parse().ok()).unwrap_or(30),
            activity_limit: std::env::var("ACTIVITY_LIMIT").ok().and_then(|v| v.parse().ok()).unwrap_or(10),
            chart_width: std::env::var("CHART_WIDTH").ok().and_then(|v| v.parse().ok()).unwrap_or(40),
        }
    }
}

/// Client-side prospect model. The stage advancer reads the current stage
/// from here, never from rendered output; the backend remains the source of
/// truth and this map is replaced wholesale on every successful list fetch.
#[derive(Default)]
pub struct DashboardModel {
    prospects: HashMap<String, Prospect>,
    last_refreshed: Option<String>,
}

impl DashboardModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_prospects(&mut self, prospects: &[Prospect]) {
        self.prospects = prospects
            .iter()
            .map(|p| (p.email.clone(), p.clone()))
            .collect();
    }

    pub fn stage_of(&self, email: &str) -> Option<Stage> {
        self.prospects.get(email).map(|p| p.current_stage)
    }

    pub fn len(&self) -> usize {
        self.prospects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prospects.is_empty()
    }

    pub fn mark_refreshed(&mut self, ts: String) {
        self.last_refreshed = Some(ts);
    }

    pub fn last_refreshed(&self) -> Option<&str> {
        self.last_refreshed.as_deref()
    }
}
