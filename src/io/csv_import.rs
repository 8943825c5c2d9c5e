use std::path::Path;

use chrono::FixedOffset;
use log::warn;

use crate::error::{Result, RoadmapError};
use crate::model::{TaskDate, TaskRecord};

/// Columns a spreadsheet export can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Id,
    Name,
    Start,
    Due,
    Category,
    Tags,
    Status,
    Priority,
    Url,
}

/// Detect delimiter by checking the first line for common separators.
fn detect_delimiter(first_line: &str) -> u8 {
    let semicolons = first_line.matches(';').count();
    let commas = first_line.matches(',').count();
    let tabs = first_line.matches('\t').count();

    if semicolons >= commas && semicolons >= tabs {
        b';'
    } else if tabs >= commas {
        b'\t'
    } else {
        b','
    }
}

/// Normalize a header string to a canonical column key.
fn normalize_header(h: &str) -> String {
    h.trim().to_lowercase().replace([' ', '-', '_'], "")
}

fn header_to_column(normalized: &str) -> Option<Column> {
    match normalized {
        "id" | "taskid" => Some(Column::Id),
        "name" | "task" | "tasklabel" | "taskname" | "label" | "title" => Some(Column::Name),
        "start" | "startdate" | "from" | "begin" | "début" | "datedébut" => Some(Column::Start),
        "end" | "enddate" | "due" | "duedate" | "finish" | "to" | "fin" | "échéance" => {
            Some(Column::Due)
        }
        "category" | "row" | "list" | "catégorie" | "lane" => Some(Column::Category),
        "tags" | "tag" | "labels" | "étiquettes" => Some(Column::Tags),
        "status" | "state" | "statut" => Some(Column::Status),
        "priority" | "pri" | "priorité" => Some(Column::Priority),
        "url" | "link" | "lien" => Some(Column::Url),
        _ => None,
    }
}

/// Import task records from CSV text.
///
/// Auto-detects the delimiter and matches headers loosely. Rows without a
/// category fall into `default_category`. Rows without a name, or with a
/// date that cannot be read, are skipped and counted. Tags may be separated
/// by `|` or `,` inside one cell.
pub fn parse_csv(
    content: &str,
    default_category: &str,
    offset: FixedOffset,
) -> Result<(Vec<TaskRecord>, usize)> {
    let first_line = content.lines().next().unwrap_or("");
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(detect_delimiter(first_line))
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let headers = reader.headers()?.clone();
    let columns: Vec<Option<Column>> = headers
        .iter()
        .map(|h| header_to_column(&normalize_header(h)))
        .collect();

    let has = |c: Column| columns.contains(&Some(c));
    if !has(Column::Name) || !(has(Column::Start) || has(Column::Due)) {
        return Err(RoadmapError::MissingColumns {
            found: headers.iter().map(str::to_string).collect(),
        });
    }

    let mut records = Vec::new();
    let mut skipped = 0usize;

    for (i, result) in reader.records().enumerate() {
        let row = i + 2;
        let record = match result {
            Ok(r) => r,
            Err(e) => {
                warn!("event=csv_row_skipped row={row} reason={e}");
                skipped += 1;
                continue;
            }
        };

        let mut task = TaskRecord::new("", default_category, TaskDate::Missing, TaskDate::Missing);
        for (field, column) in record.iter().zip(&columns) {
            match column {
                Some(Column::Id) if !field.is_empty() => task.id = field.to_string(),
                Some(Column::Name) => task.name = field.to_string(),
                Some(Column::Start) => task.start = TaskDate::parse(field, offset),
                Some(Column::Due) => task.due = TaskDate::parse(field, offset),
                Some(Column::Category) if !field.is_empty() => task.category = field.to_string(),
                Some(Column::Tags) => {
                    task.tags = field
                        .split(['|', ','])
                        .map(str::trim)
                        .filter(|t| !t.is_empty())
                        .map(str::to_string)
                        .collect();
                }
                Some(Column::Status) if !field.is_empty() => task.status = Some(field.to_string()),
                Some(Column::Priority) if !field.is_empty() => {
                    task.priority = Some(field.to_string())
                }
                Some(Column::Url) if !field.is_empty() => task.url = Some(field.to_string()),
                _ => {}
            }
        }

        if task.name.is_empty() {
            skipped += 1;
            continue;
        }
        if task.start.is_unparseable() || task.due.is_unparseable() {
            warn!(
                "event=csv_row_skipped row={row} reason=invalid_date start={:?} due={:?}",
                task.start, task.due
            );
            skipped += 1;
            continue;
        }
        records.push(task);
    }

    if records.is_empty() {
        return Err(RoadmapError::NoTasks { skipped });
    }
    Ok((records, skipped))
}

/// Import task records from a CSV file. Returns `(records, skipped_count)`.
pub fn import_csv(
    path: &Path,
    default_category: &str,
    offset: FixedOffset,
) -> Result<(Vec<TaskRecord>, usize)> {
    let content = std::fs::read_to_string(path).map_err(|e| RoadmapError::io(path, e))?;
    parse_csv(&content, default_category, offset)
}
