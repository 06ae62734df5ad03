// src/notify/format.rs
use html_escape::{encode_double_quoted_attribute, encode_text};

use crate::jobs::types::JobRecord;

pub const DESCRIPTION_LIMIT: usize = 200;
const ELLIPSIS: &str = "...";

/// Cut to `DESCRIPTION_LIMIT` characters (not bytes) plus "..." when longer.
pub fn truncate_description(s: &str) -> String {
    if s.chars().count() > DESCRIPTION_LIMIT {
        let mut out: String = s.chars().take(DESCRIPTION_LIMIT).collect();
        out.push_str(ELLIPSIS);
        out
    } else {
        s.to_string()
    }
}

/// Telegram HTML message for one job. Interpolated text is escaped.
pub fn format_job_message(job: &JobRecord) -> String {
    let mut msg = format!(
        "🔍 <b>{}</b>\n\n🏢 Company: {}\n💰 Salary: {}\n\n",
        encode_text(&job.title),
        encode_text(&job.company),
        encode_text(&job.salary),
    );

    if !job.description.is_empty() {
        msg.push_str(&format!(
            "📝 {}\n\n",
            encode_text(&truncate_description(&job.description))
        ));
    }

    msg.push_str(&format!(
        "🌐 Source: {}\n🔎 Query: {}\n📅 Date: {}\n\n",
        encode_text(&job.source),
        encode_text(&job.query),
        job.timestamp.format("%Y-%m-%d %H:%M"),
    ));

    if let Some(link) = &job.link {
        msg.push_str(&format!(
            "🔗 <a href=\"{}\">job link</a>",
            encode_double_quoted_attribute(link)
        ));
    }

    msg
}
