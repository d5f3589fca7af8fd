use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use url::Url;

use crate::model::{MetricsSnapshot, Prospect, Stage};
use crate::state::Config;

/// Backend contract consumed by the controller. A trait so tests can drive
/// the controller against a recorded stub instead of a live server.
#[async_trait(?Send)]
pub trait ProspectApi {
    async fn fetch_metrics(&self) -> Result<MetricsSnapshot>;
    async fn fetch_prospects(&self, q: Option<&str>) -> Result<Vec<Prospect>>;
    async fn update_stage(&self, email: &str, stage: Stage) -> Result<()>;
}

/// reqwest-backed client. The bearer credential rides on every request; no
/// timeout and no retry, failed calls surface as errors and the next poll
/// tick is the recovery path.
pub struct HttpApi {
    client: Client,
    base: String,
    token: String,
}

impl HttpApi {
    pub fn new(cfg: &Config) -> Self {
        Self {
            client: Client::new(),
            base: cfg.api_base.trim_end_matches('/').to_string(),
            token: cfg.api_token.clone(),
        }
    }

    fn prospects_url(&self, q: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/api/prospects", self.base))?;
        if let Some(q) = q {
            url.query_pairs_mut().append_pair("q", q);
        }
        Ok(url)
    }
}

#[async_trait(?Send)]
impl ProspectApi for HttpApi {
    async fn fetch_metrics(&self) -> Result<MetricsSnapshot> {
        let url = format!("{}/api/metrics", self.base);
        let resp = self
            .client
            .get(&url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("metrics failed: {} {}", status, body));
        }

        let metrics: MetricsSnapshot = resp.json().await?;
        Ok(metrics)
    }

    async fn fetch_prospects(&self, q: Option<&str>) -> Result<Vec<Prospect>> {
        let url = self.prospects_url(q)?;
        let resp = self
            .client
            .get(url)
            .bearer_auth(&self.token)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("prospects failed: {} {}", status, body));
        }

        let prospects: Vec<Prospect> = resp.json().await?;
        Ok(prospects)
    }

    async fn update_stage(&self, email: &str, stage: Stage) -> Result<()> {
        let url = format!("{}/api/stage/{}", self.base, email);
        let resp = self
            .client
            .put(&url)
            .bearer_auth(&self.token)
            .json(&json!({ "stage": stage.as_str() }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(anyhow!("stage update failed: {} {}", status, body));
        }
        Ok(())
    }
}

/// Location of the server-rendered search results page, query URL-encoded.
/// Pure construction; dispatch is the controller's concern.
pub fn search_url(base: &str, query: &str) -> Result<Url> {
    let mut url = Url::parse(&format!("{}/search", base.trim_end_matches('/')))?;
    url.query_pairs_mut().append_pair("q", query);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_query() {
        let url = search_url("http://localhost:5000", "a b&c@x.com").unwrap();
        assert_eq!(url.path(), "/search");
        assert_eq!(url.query(), Some("q=a+b%26c%40x.com"));
    }

    #[test]
    fn search_url_tolerates_trailing_slash() {
        let url = search_url("http://localhost:5000/", "demo").unwrap();
        assert_eq!(url.as_str(), "http://localhost:5000/search?q=demo");
    }

    #[test]
    fn prospects_url_filters_by_email() {
        let cfg = Config {
            api_base: "http://localhost:5000".to_string(),
            api_token: "t".to_string(),
            poll_secs: 30,
            activity_limit: 10,
            chart_width: 40,
        };
        let api = HttpApi::new(&cfg);
        let plain = api.prospects_url(None).unwrap();
        assert_eq!(plain.as_str(), "http://localhost:5000/api/prospects");
        let filtered = api.prospects_url(Some("a@x.com")).unwrap();
        assert_eq!(filtered.query(), Some("q=a%40x.com"));
    }
}
