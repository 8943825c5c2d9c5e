//! Timeline layout engine.
//!
//! Every function here is a pure computation over its inputs: nothing is
//! cached between calls and the input collections are never mutated, so the
//! same tasks, dates and window always produce the same layout.

pub mod labels;
pub mod lanes;
pub mod period;
pub mod roadmap;

use serde::{Deserialize, Serialize};

pub use labels::{layout_milestones, Leveled, MarkerKind, MilestoneLayout, PointMarker};
pub use lanes::{pack_lanes, LaneSettings, Placed, PlacedInterval, RowLayout, SortKey};
pub use period::{
    apply_period_filter, project_markers, Clipped, DisplayWindow, FilteredView, Period, Projected,
};
pub use roadmap::{
    build_roadmap, delivery_summary, layout_tasks, view_roadmap, DeliveryLine, RoadmapView,
    TaskLayout,
};

/// Horizontal extent of a task on the canonical timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub id: String,
    #[serde(rename = "row")]
    pub category: String,
    #[serde(rename = "left")]
    pub start: f64,
    #[serde(rename = "right")]
    pub end: f64,
}

impl Interval {
    /// `end` is raised to `start` when the two are reversed.
    pub fn new(id: impl Into<String>, category: impl Into<String>, start: f64, end: f64) -> Self {
        Self {
            id: id.into(),
            category: category.into(),
            start,
            end: end.max(start),
        }
    }

    /// Like [`Interval::new`] but at least `min_width` wide.
    pub fn with_min_width(
        id: impl Into<String>,
        category: impl Into<String>,
        start: f64,
        end: f64,
        min_width: f64,
    ) -> Self {
        Self::new(id, category, start, end.max(start + min_width))
    }

    pub fn width(&self) -> f64 {
        self.end - self.start
    }

    /// Overlap-or-too-close test: true unless at least `gap` pixels separate
    /// the two intervals.
    pub fn is_near(&self, other: &Interval, gap: f64) -> bool {
        self.start < other.end + gap && other.start < self.end + gap
    }
}

/// Anything that owns a canonical interval.
pub trait Spanned {
    fn interval(&self) -> &Interval;
}

impl Spanned for Interval {
    fn interval(&self) -> &Interval {
        self
    }
}

/// Anything anchored at a single horizontal position.
pub trait Anchored {
    fn position(&self) -> f64;
}
