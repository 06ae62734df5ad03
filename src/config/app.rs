// src/config/app.rs
use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;
use std::{env, fs};

use crate::jobs::fetch::DEFAULT_USER_AGENT;

pub const ENV_CONFIG_PATH: &str = "JOB_BOT_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config/job_bot.toml";

pub const ENV_BOT_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_CHAT_ID: &str = "TARGET_CHAT_ID";

fn default_interval_secs() -> u64 {
    3600
}
fn default_site_delay_ms() -> u64 {
    2000
}
fn default_send_delay_ms() -> u64 {
    500
}
fn default_state_path() -> PathBuf {
    PathBuf::from("sent_jobs.json")
}
fn default_user_agent() -> String {
    DEFAULT_USER_AGENT.to_string()
}
fn default_api_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_queries() -> Vec<String> {
    ["Python", "Data Scientist", "Machine Learning", "Backend Developer"]
        .into_iter()
        .map(String::from)
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Extractor key, "hh.ru" or "habr.com".
    pub name: String,
    pub base_url: String,
    /// Query-string template; `{query}` is replaced by the search term.
    #[serde(default)]
    pub params: BTreeMap<String, String>,
}

fn params(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn default_sites() -> Vec<SiteConfig> {
    vec![
        SiteConfig {
            name: "hh.ru".into(),
            base_url: "https://hh.ru/search/vacancy".into(),
            // area 1 = Moscow
            params: params(&[("text", "{query}"), ("area", "1"), ("per_page", "100")]),
        },
        SiteConfig {
            name: "habr.com".into(),
            base_url: "https://career.habr.com/vacancies".into(),
            params: params(&[("q", "{query}"), ("type", "all"), ("page", "1")]),
        },
    ]
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub exclude_keywords: Vec<String>,
    /// 0 disables the best-effort salary check.
    #[serde(default)]
    pub min_salary: u64,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            keywords: ["junior", "middle", "senior", "remote"]
                .into_iter()
                .map(String::from)
                .collect(),
            exclude_keywords: vec!["1+ years".into(), "3+ years".into()],
            min_salary: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_interval_secs")]
    pub parsing_interval_secs: u64,
    #[serde(default = "default_site_delay_ms")]
    pub site_delay_ms: u64,
    #[serde(default = "default_send_delay_ms")]
    pub send_delay_ms: u64,
    #[serde(default = "default_state_path")]
    pub state_path: PathBuf,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    /// No timeout unless set.
    #[serde(default)]
    pub http_timeout_secs: Option<u64>,
    #[serde(default = "default_api_bind")]
    pub api_bind: String,
    #[serde(default = "default_queries")]
    pub search_queries: Vec<String>,
    #[serde(default)]
    pub filters: FilterConfig,
    #[serde(default = "default_sites")]
    pub sites: Vec<SiteConfig>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            parsing_interval_secs: default_interval_secs(),
            site_delay_ms: default_site_delay_ms(),
            send_delay_ms: default_send_delay_ms(),
            state_path: default_state_path(),
            user_agent: default_user_agent(),
            http_timeout_secs: None,
            api_bind: default_api_bind(),
            search_queries: default_queries(),
            filters: FilterConfig::default(),
            sites: default_sites(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let cfg: AppConfig = toml::from_str(s).context("parsing job bot config")?;
        cfg.cleaned()
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Resolve the config file:
    /// 1) explicit path (must exist)
    /// 2) $JOB_BOT_CONFIG (must exist)
    /// 3) config/job_bot.toml if present
    /// 4) built-in defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(p) = explicit {
            return Self::load_from_file(p);
        }
        if let Ok(p) = env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("{ENV_CONFIG_PATH} points to non-existent path {}", pb.display()));
            }
            return Self::load_from_file(&pb);
        }
        let default_p = PathBuf::from(DEFAULT_CONFIG_PATH);
        if default_p.exists() {
            return Self::load_from_file(&default_p);
        }
        tracing::info!("no config file found, using built-in defaults");
        Self::default().cleaned()
    }

    fn cleaned(mut self) -> Result<Self> {
        self.search_queries = clean_list(self.search_queries);
        self.filters.keywords = clean_list(self.filters.keywords);
        self.filters.exclude_keywords = clean_list(self.filters.exclude_keywords);

        if self.sites.is_empty() {
            bail!("config has no sites");
        }
        if self.search_queries.is_empty() {
            bail!("config has no search queries");
        }
        if self.parsing_interval_secs == 0 {
            bail!("parsing_interval_secs must be positive");
        }
        Ok(self)
    }

    pub fn parsing_interval(&self) -> Duration {
        Duration::from_secs(self.parsing_interval_secs)
    }

    pub fn site_delay(&self) -> Duration {
        Duration::from_millis(self.site_delay_ms)
    }

    pub fn send_delay(&self) -> Duration {
        Duration::from_millis(self.send_delay_ms)
    }

    pub fn http_timeout(&self) -> Option<Duration> {
        self.http_timeout_secs.map(Duration::from_secs)
    }
}

/// Trim, drop empties, drop case-insensitive duplicates. First spelling wins,
/// order is kept (queries run in configured order).
fn clean_list(items: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    let mut out = Vec::with_capacity(items.len());
    for it in items {
        let t = it.trim();
        if t.is_empty() {
            continue;
        }
        if seen.insert(t.to_lowercase()) {
            out.push(t.to_string());
        }
    }
    out
}

/// Telegram credentials, read from the environment only.
#[derive(Clone)]
pub struct TelegramSecrets {
    pub bot_token: String,
    pub chat_id: String,
}

impl std::fmt::Debug for TelegramSecrets {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramSecrets")
            .field("bot_token", &"<redacted>")
            .field("chat_id", &self.chat_id)
            .finish()
    }
}

impl TelegramSecrets {
    pub fn from_env() -> Result<Self> {
        let bot_token = non_empty_env(ENV_BOT_TOKEN)?;
        let chat_id = non_empty_env(ENV_CHAT_ID)?;
        Ok(Self { bot_token, chat_id })
    }
}

fn non_empty_env(name: &str) -> Result<String> {
    match env::var(name) {
        Ok(v) if !v.trim().is_empty() => Ok(v.trim().to_string()),
        _ => Err(anyhow!("Missing {name} env var")),
    }
}
