// src/jobs/sites/hh_ru.rs
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use scraper::{ElementRef, Html, Selector};
use url::Url;

use super::{base_url, element_text, first_text, selector, SiteExtractor};
use crate::jobs::fetch::SiteEndpoint;
use crate::jobs::types::{JobRecord, DEFAULT_COMPANY, DEFAULT_SALARY, DEFAULT_TITLE};

pub const SOURCE: &str = "hh.ru";

pub struct HhRuExtractor {
    endpoint: SiteEndpoint,
    base: Url,
    item: Selector,
    title: Selector,
    company: Selector,
    description: Selector,
    salary: Selector,
}

impl HhRuExtractor {
    pub fn new(endpoint: SiteEndpoint) -> Result<Self> {
        Ok(Self {
            base: base_url(&endpoint)?,
            endpoint,
            item: selector("div.vacancy-serp-item")?,
            title: selector(r#"a[data-qa="vacancy-serp__vacancy-title"]"#)?,
            company: selector(r#"a[data-qa="vacancy-serp__vacancy-employer"]"#)?,
            description: selector(
                r#"div[data-qa="vacancy-serp__vacancy_snippet_responsibility"]"#,
            )?,
            salary: selector(r#"span[data-qa="vacancy-serp__vacancy-compensation"]"#)?,
        })
    }

    fn parse_item(&self, item: ElementRef<'_>, query: &str, now: DateTime<Local>) -> Result<JobRecord> {
        let title_el = item.select(&self.title).next();
        let title = title_el
            .map(element_text)
            .unwrap_or_else(|| DEFAULT_TITLE.to_string());

        // A title anchor without href is malformed markup, not a missing field.
        let link = match title_el {
            Some(el) => {
                let href = el
                    .value()
                    .attr("href")
                    .context("vacancy title anchor has no href")?;
                let abs = self
                    .base
                    .join(href)
                    .with_context(|| format!("bad vacancy href {href}"))?;
                Some(abs.to_string())
            }
            None => None,
        };

        Ok(JobRecord {
            title,
            company: first_text(item, &self.company).unwrap_or_else(|| DEFAULT_COMPANY.to_string()),
            description: first_text(item, &self.description).unwrap_or_default(),
            salary: first_text(item, &self.salary).unwrap_or_else(|| DEFAULT_SALARY.to_string()),
            link,
            source: SOURCE.to_string(),
            query: query.to_string(),
            timestamp: now,
        })
    }
}

impl SiteExtractor for HhRuExtractor {
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
