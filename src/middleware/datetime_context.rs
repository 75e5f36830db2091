// SPDX-License-Identifier: AGPL-3.0-or-later
// Copyright (C) 2025 Blackman Artificial Intelligence Technologies Inc.

//! Datetime context middleware
//!
//! Appends a fresh temporal block to the system message before each model
//! call so agents can interpret timestamps and relative dates. The block is
//! delimited by HTML-comment sentinels: each call strips any existing block
//! and appends a new one at the END of the system message, which keeps the
//! static prompt prefix cacheable by providers.
//!
//! Minimal mode (specialists) is a few lines; full mode (supervisor) adds a
//! table of pre-computed reference dates and a phrase-interpretation guide.
//! The full-mode reference table is cached for 60 seconds; the current-time
//! lines are always formatted fresh.

use async_trait::async_trait;
use chrono::{DateTime, Datelike, Duration as ChronoDuration, NaiveDate, Utc};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::error::Result;
use crate::llm::provider::ModelRequest;
use crate::middleware::Middleware;
use crate::prompts::DATETIME_PHRASE_GUIDE;

/// Sentinel opening the datetime block
pub const DATETIME_START: &str = "<!-- datetime:start -->";
/// Sentinel closing the datetime block
pub const DATETIME_END: &str = "<!-- datetime:end -->";

const TABLE_CACHE_TTL: Duration = Duration::from_secs(60);

/// Level of temporal detail injected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatetimeMode {
    /// Current date/time plus ISO string (~15 tokens); specialist default
    #[default]
    Minimal,
    /// Minimal plus reference dates and a phrase guide; supervisor mode
    Full,
}

/// Middleware that injects the datetime block
pub struct DatetimeContextMiddleware {
    mode: DatetimeMode,
    phrase_guide: Option<&'static str>,
    table_cache: Mutex<Option<(Instant, String)>>,
}

impl DatetimeContextMiddleware {
    /// Create the middleware for a mode, with the default phrase guide in
    /// full mode
    pub fn new(mode: DatetimeMode) -> Self {
        Self {
            mode,
            phrase_guide: match mode {
                DatetimeMode::Full => Some(DATETIME_PHRASE_GUIDE),
                DatetimeMode::Minimal => None,
            },
            table_cache: Mutex::new(None),
        }
    }

    /// Override the phrase-interpretation guide (locale substitution)
    pub fn with_phrase_guide(mut self, guide: Option<&'static str>) -> Self {
        self.phrase_guide = guide;
        self
    }

    /// Build the delimited block for a given instant
    pub fn format_block(&self, now: DateTime<Utc>) -> String {
        let mut body = format!(
            "Current UTC time: {}\nCurrent date: {}\nISO format: {}",
            now.format("%Y-%m-%d %H:%M:%S UTC"),
            now.format("%A, %B %d, %Y"),
            now.to_rfc3339(),
        );

        if self.mode == DatetimeMode::Full {
            body.push('\n');
            body.push_str(&self.cached_reference_table(now));
            if let Some(guide) = self.phrase_guide {
                body.push('\n');
                body.push_str(guide);
            }
        }

        format!("{}\n{}\n{}", DATETIME_START, body, DATETIME_END)
    }

    fn cached_reference_table(&self, now: DateTime<Utc>) -> String {
        let mut cache = self.table_cache.lock().unwrap();
        if let Some((at, table)) = cache.as_ref() {
            if at.elapsed() < TABLE_CACHE_TTL {
                return table.clone();
            }
        }
        let table = reference_table(now);
        *cache = Some((Instant::now(), table.clone()));
        table
    }

    /// Strip the existing block and append a fresh one at the end
    pub fn apply(&self, system: &mut Option<String>, now: DateTime<Utc>) {
        let existing = system.take().unwrap_or_default();
        let stripped = strip_datetime_block(&existing);
        let block = self.format_block(now);
        let combined = if stripped.is_empty() {
            block
        } else {
            format!("{}\n\n{}", stripped.trim_end(), block)
        };
        *system = Some(combined);
    }
}

#[async_trait]
impl Middleware for DatetimeContextMiddleware {
    fn name(&self) -> &str {
        "datetime_context"
    }

    async fn before_model(&self, request: &mut ModelRequest) -> Result<()> {
        self.apply(&mut request.system, Utc::now());
        Ok(())
    }
}

/// Remove any delimited datetime block from the text
pub fn strip_datetime_block(text: &str) -> String {
    let mut result = text.to_string();
    while let Some(start) = result.find(DATETIME_START) {
        let Some(end_rel) = result[start..].find(DATETIME_END) else {
            // Unterminated block: drop the tail
            result.truncate(start);
            break;
        };
        let end = start + end_rel + DATETIME_END.len();
        result.replace_range(start..end, "");
    }
    result.trim_end().to_string()
}

/// Pre-computed reference dates for full mode, each ISO 8601 UTC
fn reference_table(now: DateTime<Utc>) -> String {
    let today = now.date_naive();
    let yesterday = today - ChronoDuration::days(1);
    let last_24h = now - ChronoDuration::hours(24);
    let last_7d = now - ChronoDuration::days(7);
    let last_30d = now - ChronoDuration::days(30);
    let start_of_week = today - ChronoDuration::days(today.weekday().num_days_from_monday() as i64);
    let start_of_month = first_of_month(today);
    let start_of_last_month = first_of_previous_month(today);

    format!(
        "Reference dates:\n\
         - Yesterday: {}\n\
         - Last 24 hours since: {}\n\
         - Last 7 days since: {}\n\
         - Last 30 days since: {}\n\
         - Start of week (Monday): {}\n\
         - Start of month: {}\n\
         - Start of last month: {}",
        yesterday,
        last_24h.to_rfc3339(),
        last_7d.to_rfc3339(),
        last_30d.to_rfc3339(),
        start_of_week,
        start_of_month,
        start_of_last_month,
    )
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), date.month(), 1).unwrap_or(date)
}

fn first_of_previous_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 1 {
        (date.year() - 1, 12)
    } else {
        (date.year(), date.month() - 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}
