// src/jobs/types.rs
use chrono::{DateTime, Local};
use std::fmt;

pub const DEFAULT_TITLE: &str = "No title";
pub const DEFAULT_COMPANY: &str = "Company not specified";
pub const DEFAULT_SALARY: &str = "Salary not specified";

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct JobRecord {
    pub title: String,
    pub company: String,
    pub description: String, // may be empty
    pub salary: String,      // free text, never parsed here
    pub link: Option<String>,
    pub source: String, // e.g. "hh.ru", "habr.com"
    pub query: String,  // search term that produced the record
    pub timestamp: DateTime<Local>,
}

impl JobRecord {
    pub fn id(&self) -> JobId {
        JobId::new(&self.source, self.link.as_deref())
    }
}

/// Dedup key: `<source>_<link>`. Equal source and link means the same job,
/// whatever the title or description say.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct JobId(String);

impl JobId {
    pub fn new(source: &str, link: Option<&str>) -> Self {
        // absent link is stored as `None` in existing state files
        Self(format!("{}_{}", source, link.unwrap_or("None")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for JobId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Pipeline stage a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Request,
    RecordParse,
    Delivery,
    Persistence,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Request => "request",
            Stage::RecordParse => "record_parse",
            Stage::Delivery => "delivery",
            Stage::Persistence => "persistence",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub stage: Stage,
    pub context: String, // site/query/job the failure is about
    pub reason: String,
}

impl StageFailure {
    pub fn new(stage: Stage, context: impl Into<String>, err: &anyhow::Error) -> Self {
        Self {
            stage,
            context: context.into(),
            // `{:#}` keeps the whole anyhow context chain on one line
            reason: format!("{err:#}"),
        }
    }

    /// Emit the failure through `tracing`. Stages that lose data are errors.
    pub fn log(&self) {
        match self.stage {
            Stage::RecordParse => tracing::warn!(
                stage = %self.stage,
                context = %self.context,
                reason = %self.reason,
                "stage failed"
            ),
            _ => tracing::error!(
                stage = %self.stage,
                context = %self.context,
                reason = %self.reason,
                "stage failed"
            ),
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed for {}: {}", self.stage, self.context, self.reason)
    }
}

/// Result of one pipeline stage. Failures are values, the caller decides
/// whether to continue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome<T> {
    Success(T),
    Failure(StageFailure),
}

impl<T> StageOutcome<T> {
    pub fn from_result(
        res: anyhow::Result<T>,
        stage: Stage,
        context: impl Into<String>,
    ) -> Self {
        match res {
            Ok(v) => StageOutcome::Success(v),
            Err(e) => StageOutcome::Failure(StageFailure::new(stage, context, &e)),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, StageOutcome::Success(_))
    }

    /// Log a failure and fall back to `default`.
    pub fn unwrap_or_log(self, default: T) -> T {
        match self {
            StageOutcome::Success(v) => v,
            StageOutcome::Failure(f) => {
                f.log();
                default
            }
        }
    }
}
