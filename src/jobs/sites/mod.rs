// src/jobs/sites/mod.rs
//! Per-site HTML extractors. Selectors mirror each board's current markup;
//! when a board changes its markup the selectors stop matching and fields
//! silently fall back to their defaults.

pub mod habr_career;
pub mod hh_ru;

use anyhow::{anyhow, bail, Result};
use chrono::{DateTime, Local};
use scraper::{ElementRef, Selector};
use url::Url;

use crate::config::SiteConfig;
use crate::jobs::fetch::SiteEndpoint;
use crate::jobs::types::JobRecord;

pub trait SiteExtractor: Send + Sync {
    /// Site identifier stamped into every record, e.g. "hh.ru".
    fn source(&self) -> &'static str;

    fn endpoint(&self) -> &SiteEndpoint;

    /// Parse a search result page into one result per listing element.
    /// An `Err` entry means that single listing could not be parsed.
    fn parse_listings(&self, html: &str, query: &str, now: DateTime<Local>)
        -> Vec<Result<JobRecord>>;
}

/// Build extractors for the configured sites, preserving config order.
pub fn build_extractors(sites: &[SiteConfig]) -> Result<Vec<Box<dyn SiteExtractor>>> {
    let mut out: Vec<Box<dyn SiteExtractor>> = Vec::with_capacity(sites.len());
    for site in sites {
        let endpoint = SiteEndpoint::new(site.base_url.clone(), site.params.clone());
        match site.name.as_str() {
            hh_ru::SOURCE => out.push(Box::new(hh_ru::HhRuExtractor::new(endpoint)?)),
            habr_career::SOURCE => {
                out.push(Box::new(habr_career::HabrCareerExtractor::new(endpoint)?))
            }
            other => bail!("no extractor for site `{other}`"),
        }
    }
    Ok(out)
}

pub(crate) fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector `{css}`: {e}"))
}

pub(crate) fn base_url(endpoint: &SiteEndpoint) -> Result<Url> {
    Url::parse(&endpoint.base_url).map_err(|e| anyhow!("invalid base url {}: {e}", endpoint.base_url))
}

/// Text content with whitespace runs collapsed and ends trimmed.
pub(crate) fn element_text(el: ElementRef<'_>) -> String {
    let raw: String = el.text().collect();
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first match of `sel` under `item`, if any.
pub(crate) fn first_text(item: ElementRef<'_>, sel: &Selector) -> Option<String> {
    item.select(sel).next().map(element_text)
}
