use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::task::{Category, TaskKind};
use super::timeline::MonthLabel;
use crate::layout::{Anchored, Interval, Leveled, Placed, PointMarker, Spanned};

/// A record after classification, positioned on the canonical timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineTask {
    #[serde(flatten)]
    pub interval: Interval,
    pub name: String,
    pub kind: TaskKind,
    /// Delivery kept on its initial date.
    pub delivered: bool,
    pub urgent: bool,
    /// Lower-cased tracker status, empty when unknown.
    pub status: String,
    pub url: Option<String>,
    pub due_date: Option<NaiveDate>,
    /// `DD/MM` label shown beside milestones and events.
    pub marker_date: Option<String>,
}

impl Spanned for TimelineTask {
    fn interval(&self) -> &Interval {
        &self.interval
    }
}

impl Anchored for TimelineTask {
    fn position(&self) -> f64 {
        self.interval.start
    }
}

/// An event entry stacked at the top of its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackedEvent {
    #[serde(flatten)]
    pub task: TimelineTask,
    pub top: f64,
}

impl Anchored for StackedEvent {
    fn position(&self) -> f64 {
        self.task.interval.start
    }
}

/// A task that was due before the timeline origin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastDelivery {
    pub id: String,
    pub name: String,
    #[serde(rename = "row")]
    pub category: String,
    pub end_date: NaiveDate,
    pub status: String,
}

impl PastDelivery {
    /// `DD/MM/YYYY`, as shown in the recap table.
    pub fn end_label(&self) -> String {
        self.end_date.format("%d/%m/%Y").to_string()
    }
}

/// Everything the roadmap page needs to render one snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub tasks: Vec<Placed<TimelineTask>>,
    pub milestones: Vec<Leveled<TimelineTask>>,
    pub events: Vec<StackedEvent>,
    pub past_deliveries: Vec<PastDelivery>,
    pub categories: Vec<Category>,
    pub category_heights: BTreeMap<String, f64>,
    /// Shared bar height of every regular task.
    pub task_height: f64,
    pub today: NaiveDate,
    pub today_position: f64,
    pub today_level: Option<usize>,
    pub months: Vec<MonthLabel>,
}

impl Roadmap {
    /// Rightmost position reached by a bar, milestone or event.
    pub fn max_end(&self) -> f64 {
        let bars = self.tasks.iter().map(|t| t.item.interval.end);
        let milestones = self.milestones.iter().map(|m| m.item.interval.start);
        let events = self.events.iter().map(|e| e.task.interval.start);
        bars.chain(milestones).chain(events).fold(0.0, f64::max)
    }

    pub fn total_height(&self) -> f64 {
        self.category_heights.values().sum()
    }

    pub fn task(&self, id: &str) -> Option<&Placed<TimelineTask>> {
        self.tasks.iter().find(|t| t.item.interval.id == id)
    }

    /// The today marker, labelled `DD/MM`, on the level it was given.
    pub fn today_marker(&self) -> Leveled<PointMarker> {
        Leveled {
            item: PointMarker::today(self.today_position, self.today.format("%d/%m").to_string()),
            level: self.today_level.unwrap_or(0),
        }
    }
}
