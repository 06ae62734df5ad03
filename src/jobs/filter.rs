// src/jobs/filter.rs
use once_cell::sync::OnceCell;
use regex::Regex;

use crate::config::FilterConfig;
use crate::jobs::types::JobRecord;

/// Keyword predicate over title + description.
#[derive(Debug, Clone, Default)]
pub struct KeywordFilter {
    include: Vec<String>, // lowercased
    exclude: Vec<String>, // lowercased
    min_salary: u64,      // 0 = disabled
}

impl KeywordFilter {
    pub fn new(include: &[String], exclude: &[String], min_salary: u64) -> Self {
        Self {
            include: include.iter().map(|k| k.to_lowercase()).collect(),
            exclude: exclude.iter().map(|k| k.to_lowercase()).collect(),
            min_salary,
        }
    }

    pub fn from_config(cfg: &FilterConfig) -> Self {
        let f = Self::new(&cfg.keywords, &cfg.exclude_keywords, cfg.min_salary);
        if f.min_salary > 0 {
            tracing::info!(
                min_salary = f.min_salary,
                "best-effort salary filter enabled; unparseable salaries pass"
            );
        }
        f
    }

    pub fn passes(&self, job: &JobRecord) -> bool {
        let title = job.title.to_lowercase();
        let description = job.description.to_lowercase();
        let hit = |k: &String| title.contains(k.as_str()) || description.contains(k.as_str());

        if !self.include.is_empty() && !self.include.iter().any(hit) {
            return false;
        }
        if self.exclude.iter().any(hit) {
            return false;
        }
        if self.min_salary > 0 {
            if let Some(amount) = parse_salary_amount(&job.salary) {
                if amount < self.min_salary {
                    return false;
                }
            }
        }
        true
    }
}

/// First number in free-text salary, e.g. "от 150 000 ₽" -> 150000.
/// Digit groups split by plain, no-break or thin spaces are merged.
pub fn parse_salary_amount(s: &str) -> Option<u64> {
    static RE_NUM: OnceCell<Regex> = OnceCell::new();
    let re = RE_NUM.get_or_init(|| {
        Regex::new(r"\d{1,3}(?:[ \x{00A0}\x{202F}\x{2009}]\d{3})+|\d+").expect("static regex")
    });
    let m = re.find(s)?;
    let digits: String = m.as_str().chars().filter(char::is_ascii_digit).collect();
    digits.parse().ok()
}
