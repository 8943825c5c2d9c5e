use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A start or due date as delivered by the upstream task tracker.
///
/// Missing and unparseable dates are distinct states rather than falsy
/// values: a missing due date gets a default span, an unparseable one drops
/// the record from layout.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", content = "value", rename_all = "camelCase")]
pub enum TaskDate {
    #[default]
    Missing,
    Date(NaiveDate),
    Unparseable(String),
}

impl TaskDate {
    /// Parse a raw date field.
    ///
    /// Accepts ClickUp millisecond timestamps (converted to a calendar day in
    /// `offset`) and the usual spreadsheet date spellings. Blank input is
    /// `Missing`.
    pub fn parse(raw: &str, offset: FixedOffset) -> Self {
        let raw = raw.trim();
        if raw.is_empty() {
            return Self::Missing;
        }
        if let Ok(millis) = raw.parse::<i64>() {
            return match DateTime::from_timestamp_millis(millis) {
                Some(utc) => Self::Date(utc.with_timezone(&offset).date_naive()),
                None => Self::Unparseable(raw.to_string()),
            };
        }
        match parse_date(raw) {
            Some(d) => Self::Date(d),
            None => Self::Unparseable(raw.to_string()),
        }
    }

    pub fn date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            _ => None,
        }
    }

    pub fn is_unparseable(&self) -> bool {
        matches!(self, Self::Unparseable(_))
    }
}

impl From<NaiveDate> for TaskDate {
    fn from(date: NaiveDate) -> Self {
        Self::Date(date)
    }
}

impl From<Option<NaiveDate>> for TaskDate {
    fn from(date: Option<NaiveDate>) -> Self {
        date.map_or(Self::Missing, Self::Date)
    }
}

/// Try parsing a date string with several common formats.
pub(crate) fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    for fmt in &["%Y-%m-%d", "%d/%m/%Y", "%d-%m-%Y", "%d.%m.%Y", "%Y/%m/%d"] {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
    }
    // RFC 3339 timestamps such as "2026-03-02T09:00:00Z".
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}

/// A roadmap row. `key` is what task records reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    #[serde(alias = "id")]
    pub key: String,
    pub name: String,
}

impl Category {
    pub fn new(key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            name: name.into(),
        }
    }
}

/// A task record as fetched from the tracker, before any layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub start: TaskDate,
    #[serde(default)]
    pub due: TaskDate,
    pub category: String,
    #[serde(default)]
    pub tags: Vec<String>,
    /// Tracker priority label, e.g. "urgent".
    #[serde(default)]
    pub priority: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

impl TaskRecord {
    /// Create a record with a fresh id and no metadata.
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        start: impl Into<TaskDate>,
        due: impl Into<TaskDate>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            start: start.into(),
            due: due.into(),
            category: category.into(),
            tags: Vec::new(),
            priority: None,
            status: None,
            url: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    /// Case-insensitive tag lookup.
    pub fn has_tag(&self, tag: &str) -> bool {
        let wanted = tag.trim().to_lowercase();
        self.tags.iter().any(|t| t.trim().to_lowercase() == wanted)
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.has_tag(t))
    }
}

/// How a record is drawn on the roadmap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TaskKind {
    /// A bar that takes part in lane packing.
    Task,
    /// A one-day highlight drawn as a vertical line with a levelled label.
    Milestone,
    /// A starred entry stacked at the top of the event category.
    Event,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    #[test]
    fn parses_clickup_millis_in_offset() {
        // 2026-01-14T23:30:00Z is already the 15th in Paris (UTC+1).
        let raw = "1768433400000";
        assert_eq!(
            TaskDate::parse(raw, utc()).date(),
            NaiveDate::from_ymd_opt(2026, 1, 14)
        );
        let paris = FixedOffset::east_opt(3600).unwrap();
        assert_eq!(
            TaskDate::parse(raw, paris).date(),
            NaiveDate::from_ymd_opt(2026, 1, 15)
        );
    }

    #[test]
    fn parses_spreadsheet_spellings() {
        let expected = NaiveDate::from_ymd_opt(2026, 3, 2);
        for raw in ["2026-03-02", "02/03/2026", "02.03.2026", "2026-03-02T09:00:00Z"] {
            assert_eq!(TaskDate::parse(raw, utc()).date(), expected, "{raw}");
        }
    }

    #[test]
    fn blank_is_missing_and_garbage_is_unparseable() {
        assert_eq!(TaskDate::parse("  ", utc()), TaskDate::Missing);
        let bad = TaskDate::parse("next tuesday", utc());
        assert!(bad.is_unparseable());
        assert_eq!(bad.date(), None);
    }

    #[test]
    fn tags_match_case_insensitively() {
        let record = TaskRecord::new("Go Prod", "billetterie", TaskDate::Missing, TaskDate::Missing)
            .with_tags(["Temps Forts"]);
        assert!(record.has_tag("temps forts"));
        assert!(!record.has_tag("temps fort"));
    }

    #[test]
    fn new_records_get_unique_ids() {
        let a = TaskRecord::new("a", "pac", TaskDate::Missing, TaskDate::Missing);
        let b = TaskRecord::new("a", "pac", TaskDate::Missing, TaskDate::Missing);
        assert_ne!(a.id, b.id);
    }
}
