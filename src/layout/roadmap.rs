//! Roadmap assembly: from raw tracker records to a complete layout.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::labels::{layout_milestones, Leveled, PointMarker};
use super::lanes::{pack_lanes, Placed};
use super::period::{apply_period_filter, project_markers, DisplayWindow, FilteredView, Projected};
use super::Interval;
use crate::config::RoadmapConfig;
use crate::model::{
    Category, PastDelivery, Roadmap, TaskKind, TaskRecord, TimeOrigin, TimelineTask,
};
use crate::model::roadmap::StackedEvent;

/// Lane-packed regular tasks for every category row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLayout {
    /// Placements grouped by category, in category order.
    pub placed_tasks: Vec<Placed<TimelineTask>>,
    pub category_heights: BTreeMap<String, f64>,
    pub uniform_task_height: f64,
}

/// Outcome of classifying one record.
#[derive(Debug, Clone, PartialEq)]
pub enum Classified {
    Timeline(TimelineTask),
    PastDelivery(PastDelivery),
    /// Dropped from layout; the reason is logged.
    Skipped,
}

/// Classify a record and place it on the canonical timeline.
///
/// A record with an unparseable date, or with neither date, is skipped. A
/// missing start falls back to the due day; a missing due date gives the bar
/// the configured default span. Records due before the origin become past
/// deliveries.
pub fn classify(record: &TaskRecord, config: &RoadmapConfig) -> Classified {
    if record.start.is_unparseable() || record.due.is_unparseable() {
        warn!(
            "event=task_skipped reason=unparseable_date id={} start={:?} due={:?}",
            record.id, record.start, record.due
        );
        return Classified::Skipped;
    }

    let start = record.start.date();
    let due = record.due.date();
    let Some(first_day) = start.or(due) else {
        debug!("event=task_skipped reason=no_dates id={}", record.id);
        return Classified::Skipped;
    };

    let origin = config.time_origin();
    let status = record
        .status
        .as_deref()
        .map(|s| s.trim().to_lowercase())
        .unwrap_or_default();

    if let Some(due_day) = due {
        if due_day < origin.date {
            return Classified::PastDelivery(PastDelivery {
                id: record.id.clone(),
                name: record.name.clone(),
                category: record.category.clone(),
                end_date: due_day,
                status,
            });
        }
    }

    let tags = &config.tags;
    let geometry = &config.tasks;
    let is_event = record.has_any_tag(&tags.event);
    let is_milestone =
        record.has_any_tag(&tags.milestone) && start.is_some() && start == due;
    let kind = if is_milestone {
        TaskKind::Milestone
    } else if is_event {
        TaskKind::Event
    } else {
        TaskKind::Task
    };

    let left = origin.date_to_position(first_day, false);
    let interval = if is_milestone {
        Interval::new(&record.id, &record.category, left, left + geometry.milestone_width)
    } else {
        let natural_end = match due {
            Some(day) => origin.date_to_position(day, true),
            None => left + geometry.missing_due_span,
        };
        Interval::with_min_width(&record.id, &record.category, left, natural_end, geometry.min_width)
    };

    let marker_date = match kind {
        TaskKind::Task => None,
        TaskKind::Milestone | TaskKind::Event => due.map(|d| d.format("%d/%m").to_string()),
    };

    Classified::Timeline(TimelineTask {
        interval,
        name: record.name.clone(),
        kind,
        delivered: record.has_any_tag(&tags.delivered),
        urgent: record
            .priority
            .as_deref()
            .is_some_and(|p| p.trim().eq_ignore_ascii_case(&tags.urgent_priority)),
        status,
        url: record.url.clone(),
        due_date: due,
        marker_date,
    })
}

/// Shared bar height: enough lines for the wordiest task, capped.
pub fn uniform_task_height(tasks: &[TimelineTask], config: &RoadmapConfig) -> f64 {
    let geometry = &config.tasks;
    let lines = tasks
        .iter()
        .map(|t| geometry.lines_needed(&t.name, t.interval.width()))
        .max()
        .unwrap_or(1)
        .clamp(1, geometry.max_lines.max(1));
    geometry.height_for_lines(lines)
}

/// Lane-pack `tasks` row by row.
///
/// Every category gets a height, empty ones the configured minimum. Tasks
/// whose category is not listed have no row to live in and are dropped.
pub fn layout_tasks(
    tasks: &[TimelineTask],
    categories: &[Category],
    config: &RoadmapConfig,
) -> TaskLayout {
    let uniform_task_height = uniform_task_height(tasks, config);

    let mut rows: BTreeMap<&str, Vec<TimelineTask>> = categories
        .iter()
        .map(|c| (c.key.as_str(), Vec::new()))
        .collect();
    for task in tasks {
        match rows.get_mut(task.interval.category.as_str()) {
            Some(row) => row.push(task.clone()),
            None => warn!(
                "event=task_skipped reason=unknown_category id={} category={}",
                task.interval.id, task.interval.category
            ),
        }
    }

    let mut placed_tasks = Vec::with_capacity(tasks.len());
    let mut category_heights = BTreeMap::new();
    for category in categories {
        let Some(row) = rows.remove(category.key.as_str()) else {
            warn!("event=category_duplicate key={}", category.key);
            continue;
        };
        let packed = pack_lanes(&row, uniform_task_height, &config.lanes);
        category_heights.insert(category.key.clone(), packed.row_height);
        placed_tasks.extend(packed.placed);
    }

    TaskLayout {
        placed_tasks,
        category_heights,
        uniform_task_height,
    }
}

/// Stack events top-down in date order. Returns them with the height they
/// take, zero when there are none.
fn stack_events(mut events: Vec<TimelineTask>, config: &RoadmapConfig) -> (Vec<StackedEvent>, f64) {
    if events.is_empty() {
        return (Vec::new(), 0.0);
    }
    events.sort_by(|a, b| a.interval.start.total_cmp(&b.interval.start));

    let settings = &config.events;
    let pitch = settings.height + settings.gap;
    let stacked: Vec<StackedEvent> = events
        .into_iter()
        .enumerate()
        .map(|(i, task)| StackedEvent {
            task,
            top: settings.top_padding + i as f64 * pitch,
        })
        .collect();
    let height = settings.top_padding + stacked.len() as f64 * pitch + settings.gap;
    (stacked, height)
}

/// Build the complete roadmap for `today`.
pub fn build_roadmap(
    records: &[TaskRecord],
    categories: &[Category],
    today: NaiveDate,
    config: &RoadmapConfig,
) -> Roadmap {
    let origin: TimeOrigin = config.time_origin();

    let mut regular = Vec::new();
    let mut milestones = Vec::new();
    let mut events = Vec::new();
    let mut past_deliveries = Vec::new();
    let mut skipped = 0usize;

    for record in records {
        match classify(record, config) {
            Classified::Timeline(mut task) => match task.kind {
                TaskKind::Task => regular.push(task),
                TaskKind::Milestone => milestones.push(task),
                TaskKind::Event => {
                    if let Some(row) = &config.event_category {
                        task.interval.category = row.clone();
                    }
                    events.push(task);
                }
            },
            Classified::PastDelivery(delivery) => past_deliveries.push(delivery),
            Classified::Skipped => skipped += 1,
        }
    }

    let (events, events_height) = stack_events(events, config);

    let TaskLayout {
        mut placed_tasks,
        mut category_heights,
        uniform_task_height,
    } = layout_tasks(&regular, categories, config);

    if let Some(row) = config.event_category.as_deref() {
        if events_height > 0.0 {
            for task in placed_tasks.iter_mut().filter(|t| t.item.interval.category == row) {
                task.top += events_height;
            }
            if let Some(height) = category_heights.get_mut(row) {
                *height += events_height;
            }
        }
    }

    let today_position = origin.today_position(today);
    let milestone_layout = layout_milestones(&milestones, Some(today_position), &config.labels);

    past_deliveries.sort_by_key(|d| d.end_date);

    let mut roadmap = Roadmap {
        tasks: placed_tasks,
        milestones: milestone_layout.placed_milestones,
        events,
        past_deliveries,
        categories: distinct_categories(categories),
        category_heights,
        task_height: uniform_task_height,
        today,
        today_position,
        today_level: milestone_layout.today_level,
        months: Vec::new(),
    };
    roadmap.months = origin.months(origin.months_to_cover(roadmap.max_end()));

    info!(
        "event=roadmap_built tasks={} milestones={} events={} past_deliveries={} skipped={} months={}",
        roadmap.tasks.len(),
        roadmap.milestones.len(),
        roadmap.events.len(),
        roadmap.past_deliveries.len(),
        skipped,
        roadmap.months.len()
    );
    roadmap
}

/// First occurrence of every category key, in order.
fn distinct_categories(categories: &[Category]) -> Vec<Category> {
    let mut distinct: Vec<Category> = Vec::with_capacity(categories.len());
    for category in categories {
        if !distinct.iter().any(|c| c.key == category.key) {
            distinct.push(category.clone());
        }
    }
    distinct
}

/// A roadmap seen through a display window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapView {
    #[serde(flatten)]
    pub filtered: FilteredView<Placed<TimelineTask>, Leveled<TimelineTask>>,
    pub events: Vec<Projected<StackedEvent>>,
    /// `None` when today falls outside the window.
    pub today: Option<Projected<Leveled<PointMarker>>>,
}

/// Clip and rescale every bar and marker of `roadmap` to `window`.
pub fn view_roadmap(roadmap: &Roadmap, window: &DisplayWindow) -> RoadmapView {
    let filtered = apply_period_filter(&roadmap.tasks, &roadmap.milestones, window);
    let events = project_markers(&roadmap.events, window);
    let today = project_markers(&[roadmap.today_marker()], window).pop();

    debug!(
        "event=roadmap_viewed start={} end={} scale={} tasks={} milestones={} events={} today_visible={}",
        window.start,
        window.end,
        window.scale,
        filtered.tasks.len(),
        filtered.milestones.len(),
        events.len(),
        today.is_some()
    );
    RoadmapView {
        filtered,
        events,
        today,
    }
}

/// One line of the delivery recap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryLine {
    pub id: String,
    pub name: String,
    pub end_date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySection {
    pub category: Category,
    pub lines: Vec<DeliveryLine>,
}

/// Delivery dates per category, earliest end first.
///
/// Dates come from the task's due date, or from its canonical end position
/// when it has none, never from a clipped display bound. Categories without
/// tasks are left out.
pub fn delivery_summary<'a, I>(
    tasks: I,
    categories: &[Category],
    origin: &TimeOrigin,
) -> Vec<DeliverySection>
where
    I: IntoIterator<Item = &'a TimelineTask>,
{
    let tasks: Vec<&TimelineTask> = tasks.into_iter().collect();

    categories
        .iter()
        .filter_map(|category| {
            let mut rows: Vec<&TimelineTask> = tasks
                .iter()
                .copied()
                .filter(|t| t.interval.category == category.key)
                .collect();
            if rows.is_empty() {
                return None;
            }
            rows.sort_by(|a, b| a.interval.end.total_cmp(&b.interval.end));
            let lines = rows
                .into_iter()
                .map(|t| DeliveryLine {
                    id: t.interval.id.clone(),
                    name: t.name.clone(),
                    end_date: t
                        .due_date
                        .unwrap_or_else(|| origin.position_to_date(t.interval.end)),
                })
                .collect();
            Some(DeliverySection {
                category: category.clone(),
                lines,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskDate;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn record(id: &str, category: &str, start: Option<NaiveDate>, due: Option<NaiveDate>) -> TaskRecord {
        TaskRecord::new(id, category, start, due).with_id(id)
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new("pac", "PAC"),
            Category::new("commercialisation", "COMMERCIALISATION"),
        ]
    }

    #[test]
    fn classify_regular_task_uses_start_and_end_of_day() {
        let config = RoadmapConfig::default();
        let Classified::Timeline(task) =
            classify(&record("t", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 31))), &config)
        else {
            panic!("expected a timeline task");
        };
        assert_eq!(task.kind, TaskKind::Task);
        assert_eq!(task.interval.start, 150.0);
        assert_eq!(task.interval.end, 300.0);
        assert_eq!(task.marker_date, None);
    }

    #[test]
    fn short_task_gets_min_width() {
        let config = RoadmapConfig::default();
        let Classified::Timeline(task) =
            classify(&record("t", "pac", Some(d(2026, 1, 5)), Some(d(2026, 1, 5))), &config)
        else {
            panic!("expected a timeline task");
        };
        assert_eq!(task.interval.width(), 40.0);
    }

    #[test]
    fn one_day_highlight_is_a_milestone() {
        let config = RoadmapConfig::default();
        let rec = record("m", "pac", Some(d(2026, 2, 27)), Some(d(2026, 2, 27))).with_tags(["Temps forts"]);
        let Classified::Timeline(task) = classify(&rec, &config) else {
            panic!("expected a timeline task");
        };
        assert_eq!(task.kind, TaskKind::Milestone);
        assert_eq!(task.interval.width(), 2.0);
        assert_eq!(task.marker_date.as_deref(), Some("27/02"));
    }

    #[test]
    fn multi_day_highlight_stays_a_task() {
        let config = RoadmapConfig::default();
        let rec = record("m", "pac", Some(d(2026, 2, 20)), Some(d(2026, 2, 27))).with_tags(["temps fort"]);
        let Classified::Timeline(task) = classify(&rec, &config) else {
            panic!("expected a timeline task");
        };
        assert_eq!(task.kind, TaskKind::Task);
    }

    #[test]
    fn missing_and_broken_dates() {
        let config = RoadmapConfig::default();
        assert_eq!(classify(&record("x", "pac", None, None), &config), Classified::Skipped);

        let mut broken = record("y", "pac", Some(d(2026, 1, 1)), None);
        broken.due = TaskDate::Unparseable("soon".into());
        assert_eq!(classify(&broken, &config), Classified::Skipped);

        let Classified::Timeline(no_due) = classify(&record("z", "pac", Some(d(2026, 1, 1)), None), &config)
        else {
            panic!("expected a timeline task");
        };
        assert_eq!(no_due.interval.width(), 100.0);

        let Classified::Timeline(no_start) = classify(&record("w", "pac", None, Some(d(2026, 1, 10))), &config)
        else {
            panic!("expected a timeline task");
        };
        assert_eq!(no_start.interval.start, config.time_origin().date_to_position(d(2026, 1, 10), false));
    }

    #[test]
    fn due_before_origin_is_a_past_delivery() {
        let config = RoadmapConfig::default();
        let mut rec = record("old", "pac", Some(d(2025, 10, 1)), Some(d(2025, 11, 20)));
        rec.status = Some(" Livré ".into());
        let Classified::PastDelivery(past) = classify(&rec, &config) else {
            panic!("expected a past delivery");
        };
        assert_eq!(past.end_label(), "20/11/2025");
        assert_eq!(past.status, "livré");
    }

    #[test]
    fn urgent_and_delivered_flags() {
        let config = RoadmapConfig::default();
        let mut rec = record("f", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 20)))
            .with_tags(["Livraison maintenue au planning"]);
        rec.priority = Some("URGENT".into());
        let Classified::Timeline(task) = classify(&rec, &config) else {
            panic!("expected a timeline task");
        };
        assert!(task.delivered);
        assert!(task.urgent);
    }

    #[test]
    fn uniform_height_is_capped() {
        let config = RoadmapConfig::default();
        let long = TimelineTask {
            interval: Interval::new("l", "pac", 0.0, 40.0),
            name: "a very long task name that wraps many many times".into(),
            kind: TaskKind::Task,
            delivered: false,
            urgent: false,
            status: String::new(),
            url: None,
            due_date: None,
            marker_date: None,
        };
        assert_eq!(uniform_task_height(&[long], &config), 3.0 * 13.0 + 8.0);
        assert_eq!(uniform_task_height(&[], &config), 21.0);
    }

    #[test]
    fn layout_tasks_fills_every_category() {
        let config = RoadmapConfig::default();
        let tasks: Vec<TimelineTask> = [
            record("A", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 20))),
            record("B", "pac", Some(d(2026, 1, 10)), Some(d(2026, 1, 31))),
            record("orphan", "nowhere", Some(d(2026, 1, 10)), Some(d(2026, 1, 31))),
        ]
        .iter()
        .filter_map(|r| match classify(r, &config) {
            Classified::Timeline(t) => Some(t),
            _ => None,
        })
        .collect();

        let layout = layout_tasks(&tasks, &categories(), &config);
        assert_eq!(layout.placed_tasks.len(), 2);
        assert_eq!(layout.uniform_task_height, 21.0);
        assert_eq!(layout.category_heights["pac"], 2.0 * (21.0 + 8.0) + 20.0);
        assert_eq!(layout.category_heights["commercialisation"], 60.0);
    }

    #[test]
    fn repeated_category_keeps_its_packed_height() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("a", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 31))),
            record("b", "pac", Some(d(2026, 1, 10)), Some(d(2026, 2, 10))),
        ];
        let pac = Category::new("pac", "PAC");
        let roadmap = build_roadmap(&records, &[pac.clone(), pac], d(2026, 1, 15), &config);

        let h = roadmap.task_height;
        let row = roadmap.category_heights["pac"];
        assert_eq!(row, 2.0 * (h + 8.0) + 20.0);
        assert_eq!(roadmap.categories.len(), 1);
        assert_eq!(roadmap.tasks.len(), 2);
        for task in &roadmap.tasks {
            assert!(task.top >= 10.0);
            assert!(task.top <= row - 10.0 - task.lane_height);
        }
    }

    #[test]
    fn events_stack_above_event_category_tasks() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("bar", "commercialisation", Some(d(2026, 1, 1)), Some(d(2026, 1, 20))),
            record("e2", "pac", Some(d(2026, 3, 26)), Some(d(2026, 3, 26))).with_tags(["Événement"]),
            record("e1", "pac", Some(d(2026, 1, 21)), Some(d(2026, 1, 21))).with_tags(["evenement"]),
        ];
        let roadmap = build_roadmap(&records, &categories(), d(2026, 1, 15), &config);

        let ids: Vec<&str> = roadmap.events.iter().map(|e| e.task.interval.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e2"]);
        assert!(roadmap
            .events
            .iter()
            .all(|e| e.task.interval.category == "commercialisation"));
        assert_eq!(roadmap.events[0].top, 8.0);
        assert_eq!(roadmap.events[1].top, 36.0);

        // 8 + 2 * 28 + 4
        let events_height = 68.0;
        let bar = roadmap.task("bar").unwrap();
        assert_eq!(bar.top, 10.0 + events_height);
        assert_eq!(
            roadmap.category_heights["commercialisation"],
            (21.0 + 8.0) + 20.0 + events_height
        );
        assert_eq!(roadmap.category_heights["pac"], 60.0);
    }

    #[test]
    fn build_roadmap_levels_milestones_with_today() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("m1", "pac", Some(d(2026, 1, 21)), Some(d(2026, 1, 21))).with_tags(["temps forts"]),
            record("m2", "pac", Some(d(2026, 1, 25)), Some(d(2026, 1, 25))).with_tags(["temps forts"]),
        ];
        let roadmap = build_roadmap(&records, &categories(), d(2026, 1, 22), &config);

        let levels: Vec<usize> = roadmap.milestones.iter().map(|m| m.level).collect();
        // m1 at 247, today at 252, m2 at 266: all within one label width.
        assert_eq!(levels, vec![0, 2]);
        assert_eq!(roadmap.today_level, Some(1));
        assert!(roadmap.tasks.is_empty());
    }

    #[test]
    fn months_cover_the_last_bar() {
        let config = RoadmapConfig::default();
        let records = vec![record("t", "pac", Some(d(2026, 1, 1)), Some(d(2026, 4, 30)))];
        let roadmap = build_roadmap(&records, &categories(), d(2026, 1, 1), &config);
        // Ends at 750 = 5 months, plus one trailing month.
        assert_eq!(roadmap.months.len(), 6);
        assert_eq!(roadmap.months.last().unwrap().name, "MAI");
    }

    #[test]
    fn past_deliveries_are_sorted_and_excluded_from_layout() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("late", "pac", None, Some(d(2025, 11, 28))),
            record("early", "pac", None, Some(d(2025, 9, 2))),
            record("now", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 9))),
        ];
        let roadmap = build_roadmap(&records, &categories(), d(2026, 1, 1), &config);
        let ids: Vec<&str> = roadmap.past_deliveries.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(roadmap.tasks.len(), 1);
    }

    #[test]
    fn summary_reports_true_end_dates_in_end_order() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("b", "pac", Some(d(2026, 1, 1)), Some(d(2026, 3, 15))),
            record("a", "pac", Some(d(2026, 1, 1)), Some(d(2026, 2, 10))),
        ];
        let roadmap = build_roadmap(&records, &categories(), d(2026, 1, 1), &config);
        let sections = delivery_summary(
            roadmap.tasks.iter().map(|t| &t.item),
            &roadmap.categories,
            &config.time_origin(),
        );
        assert_eq!(sections.len(), 1);
        assert_eq!(sections[0].category.key, "pac");
        let dates: Vec<NaiveDate> = sections[0].lines.iter().map(|l| l.end_date).collect();
        assert_eq!(dates, vec![d(2026, 2, 10), d(2026, 3, 15)]);
    }

    #[test]
    fn build_roadmap_is_idempotent() {
        let config = RoadmapConfig::default();
        let records = vec![
            record("A", "pac", Some(d(2026, 1, 1)), Some(d(2026, 1, 20))),
            record("B", "pac", Some(d(2026, 1, 10)), Some(d(2026, 2, 1))),
            record("C", "commercialisation", Some(d(2026, 2, 1)), Some(d(2026, 3, 1))),
        ];
        let first = build_roadmap(&records.clone(), &categories(), d(2026, 1, 5), &config);
        let second = build_roadmap(&records, &categories(), d(2026, 1, 5), &config);
        assert_eq!(first, second);
    }
}
