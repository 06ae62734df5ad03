// src/jobs/sites/habr_career.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{base_url, element_text, first_text, selector, SiteExtractor};
use crate::jobs::fetch::SiteEndpoint;
use crate::jobs::types::{JobRecord, DEFAULT_COMPANY, DEFAULT_SALARY, DEFAULT_TITLE};

pub const SOURCE: &str = "habr.com";

/// career.habr.com vacancy cards. Card links are site-relative.
pub struct HabrCareerExtractor {
    endpoint: SiteEndpoint,
    base: Url,
    item: Selector,
    title: Selector,
    company: Selector,
    skills: Selector,
    salary: Selector,
}

impl HabrCareerExtractor {
    pub fn new(endpoint: SiteEndpoint) -> Result<Self> {
        Ok(Self {
            base: base_url(&endpoint)?,
            endpoint,
            item: selector("div.vacancy-card")?,
            title: selector("a.vacancy-card__title-link")?,
            company: selector("div.vacancy-card__company-title")?,
            skills: selector("div.vacancy-card__skills")?,
            salary: selector("div.vacancy-card__salary")?,
        })
    }

    fn parse_item(&self, item: ElementRef<'_>, query: &str, now: DateTime<Local>) -> Result<JobRecord> {
        let title_el = item.select(&self.title).next();
        let title = title_el
            .map(element_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        let link = match title_el.and_then(|el| el.value().attr("href")) {
            Some(href) => Some(
                self.base
                    .join(href)
                    .with_context(|| format!("bad vacancy href {href}"))?
                    .to_string(),
            ),
            None => None,
        };

        Ok(JobRecord {
            title,
            company: first_text(item, &self.company).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            description: first_text(item, &self.skills).unwrap_or_default(),
            salary: first_text(item, &self.salary).unwrap_or_else(|| DEFAULT_SALARY.to_string()),
            link,
            source: SOURCE.to_string(),
            query: query.to_string(),
            timestamp: now,
        })
    }
}

impl SiteExtractor for HabrCareerExtractor {
    fn source(&self) -> &'static str {
        SOURCE
    }

    fn endpoint(&self) -> &SiteEndpoint {
        &self.endpoint
    }

    fn parse_listings(&self, html: &str, query: &str, now: DateTime<Local>) -> Vec<Result<JobRecord>> {
        let doc = Html::parse_document(html);
        doc.select(&self.item)
            .map(|item| self.parse_item(item, query, now))
            .collect()
    }
}
