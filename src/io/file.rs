use std::path::Path;

use chrono::FixedOffset;
use serde::Deserialize;

use crate::error::{Result, RoadmapError};
use crate::model::{Category, Roadmap, TaskDate, TaskRecord};

/// A scalar the tracker sends either as a string or as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(i64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Number(n) => n.to_string(),
        }
    }
}

/// Fields the tracker nests in an object, e.g. `{"status": "in progress"}`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Labelled {
    Plain(String),
    Tag { name: String },
    Status { status: String },
    Priority { priority: String },
}

impl Labelled {
    fn into_label(self) -> String {
        match self {
            Labelled::Plain(s) => s,
            Labelled::Tag { name } => name,
            Labelled::Status { status } => status,
            Labelled::Priority { priority } => priority,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ListRef {
    id: Scalar,
}

/// One task as exported from the tracker API.
#[derive(Debug, Deserialize)]
struct RawTask {
    id: Scalar,
    name: String,
    #[serde(default, alias = "startDate")]
    start_date: Option<Scalar>,
    #[serde(default, alias = "dueDate")]
    due_date: Option<Scalar>,
    #[serde(default, alias = "row")]
    category: Option<String>,
    #[serde(default)]
    list: Option<ListRef>,
    #[serde(default)]
    tags: Vec<Labelled>,
    #[serde(default)]
    priority: Option<Labelled>,
    #[serde(default)]
    status: Option<Labelled>,
    #[serde(default)]
    url: Option<String>,
}

impl RawTask {
    fn into_record(self, offset: FixedOffset) -> TaskRecord {
        let date = |raw: Option<Scalar>| {
            raw.map_or(TaskDate::Missing, |s| TaskDate::parse(&s.into_string(), offset))
        };
        let category = self
            .category
            .or_else(|| self.list.map(|l| l.id.into_string()))
            .unwrap_or_default();

        TaskRecord {
            id: self.id.into_string(),
            name: self.name,
            start: date(self.start_date),
            due: date(self.due_date),
            category,
            tags: self.tags.into_iter().map(Labelled::into_label).collect(),
            priority: self.priority.map(Labelled::into_label),
            status: self.status.map(Labelled::into_label),
            url: self.url,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TaskFile {
    Wrapped { tasks: Vec<RawTask> },
    Bare(Vec<RawTask>),
}

fn read(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| RoadmapError::io(path, e))
}

/// Parse task records from tracker JSON: either a bare array or an object
/// with a `tasks` array. Timestamps are read in `offset`.
pub fn parse_task_records(json: &str, offset: FixedOffset) -> Result<Vec<TaskRecord>> {
    let raw = match serde_json::from_str(json)? {
        TaskFile::Wrapped { tasks } => tasks,
        TaskFile::Bare(tasks) => tasks,
    };
    Ok(raw.into_iter().map(|t| t.into_record(offset)).collect())
}

/// Load task records from a JSON file.
pub fn load_task_records(path: &Path, offset: FixedOffset) -> Result<Vec<TaskRecord>> {
    parse_task_records(&read(path)?, offset)
}

/// Load the ordered category list.
pub fn load_categories(path: &Path) -> Result<Vec<Category>> {
    Ok(serde_json::from_str(&read(path)?)?)
}

/// Save a computed roadmap to a JSON file.
pub fn save_roadmap(roadmap: &Roadmap, path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(roadmap)?;
    std::fs::write(path, json).map_err(|e| RoadmapError::io(path, e))
}

/// Load a roadmap written by [`save_roadmap`].
pub fn load_roadmap(path: &Path) -> Result<Roadmap> {
    Ok(serde_json::from_str(&read(path)?)?)
}
