// src/jobs/fetch.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
(KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

const QUERY_PLACEHOLDER: &str = "{query}";

/// Search endpoint of a job board: base URL plus a parameter template where
/// `{query}` is substituted per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SiteEndpoint {
    pub base_url: String,
    pub params: BTreeMap<String, String>,
}

impl SiteEndpoint {
    pub fn new(base_url: impl Into<String>, params: BTreeMap<String, String>) -> Self {
        Self {
            base_url: base_url.into(),
            params,
        }
    }

    /// Template parameters with the query substituted in.
    pub fn params_for(&self, query: &str) -> Vec<(String, String)> {
        self.params
            .iter()
            .map(|(k, v)| (k.clone(), v.replace(QUERY_PLACEHOLDER, query)))
            .collect()
    }

    /// Full request URL, query-string encoded.
    pub fn request_url(&self, query: &str) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .with_context(|| format!("invalid base url {}", self.base_url))?;
        if !self.params.is_empty() {
            url.query_pairs_mut().extend_pairs(self.params_for(query));
        }
        Ok(url)
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// GET the page and return its body. Non-2xx is an error.
    async fn fetch(&self, url: &Url) -> Result<String>;
}

/// Shared reqwest client carrying the browser-like user agent.
#[derive(Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(user_agent: &str, timeout: Option<Duration>) -> Result<Self> {
        let mut builder = reqwest::Client::builder().user_agent(user_agent);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        let client = builder.build().context("building http client")?;
        Ok(Self { client })
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<String> {
        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .with_context(|| format!("GET {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            anyhow::bail!("HTTP {status} for {url}");
        }
        resp.text().await.context("reading response body")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hh_endpoint() -> SiteEndpoint {
        let mut params = BTreeMap::new();
        params.insert("text".to_string(), "{query}".to_string());
        params.insert("area".to_string(), "1".to_string());
        params.insert("per_page".to_string(), "100".to_string());
        SiteEndpoint::new("https://hh.ru/search/vacancy", params)
    }

    #[test]
    fn query_is_substituted_and_static_params_kept() {
        let p = hh_endpoint().params_for("Data Scientist");
        assert!(p.contains(&("text".to_string(), "Data Scientist".to_string())));
        assert!(p.contains(&("area".to_string(), "1".to_string())));
        assert!(p.contains(&("per_page".to_string(), "100".to_string())));
    }

    #[test]
    fn request_url_is_encoded() {
        let url = hh_endpoint().request_url("Machine Learning").unwrap();
        assert_eq!(url.host_str(), Some("hh.ru"));
        assert_eq!(url.path(), "/search/vacancy");
        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert!(pairs.contains(&("text".to_string(), "Machine Learning".to_string())));
        assert!(url.as_str().contains("text=Machine+Learning"));
    }

    #[test]
    fn invalid_base_url_is_an_error() {
        let ep = SiteEndpoint::new("not a url", BTreeMap::new());
        assert!(ep.request_url("x").is_err());
    }
}
