//! Display windows: clip and rescale the timeline to a visible sub-range.
//!
//! A window only produces a transformed view. The canonical intervals and
//! markers handed in are cloned into the output untouched, so reports that
//! need the true dates (delivery summaries) keep working on clipped views.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{Anchored, Interval, Spanned};
use crate::model::TimeOrigin;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayWindow {
    pub start: f64,
    pub end: f64,
    /// Display pixels per canonical pixel.
    pub scale: f64,
}

impl DisplayWindow {
    /// A window over `[start, end]` stretched to `available_width` pixels.
    ///
    /// The scale is `available_width / (months_in_window * month_width)`,
    /// which reduces to the window span in canonical pixels. A degenerate
    /// window keeps a scale of 1.
    pub fn new(start: f64, end: f64, available_width: f64) -> Self {
        let (start, end) = if end < start { (end, start) } else { (start, end) };
        let span = end - start;
        let scale = if span > 0.0 && available_width > 0.0 {
            available_width / span
        } else {
            1.0
        };
        Self { start, end, scale }
    }

    /// A window of `months` whole months starting at `start`.
    pub fn for_months(start: f64, months: u32, month_width: f64, available_width: f64) -> Self {
        Self::new(start, start + months as f64 * month_width, available_width)
    }

    /// Map a canonical position into window pixels.
    pub fn project(&self, position: f64) -> f64 {
        (position - self.start) * self.scale
    }

    pub fn contains(&self, position: f64) -> bool {
        position >= self.start && position <= self.end
    }

    /// The part of `interval` inside the window, in canonical pixels.
    ///
    /// An interval that only touches an edge has no visible part. A
    /// zero-width interval is treated as a point and kept when the window
    /// contains it.
    pub fn clip(&self, interval: &Interval) -> Option<(f64, f64)> {
        if interval.width() <= 0.0 {
            return self
                .contains(interval.start)
                .then_some((interval.start, interval.start));
        }
        let start = interval.start.max(self.start);
        let end = interval.end.min(self.end);
        (end > start).then_some((start, end))
    }
}

/// A user-selectable view period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Period {
    /// The whole timeline, unscaled.
    All,
    /// From the first day of the current month for `months` months.
    NextMonths { months: u32 },
    /// An explicit date range, both days included.
    Range { start: NaiveDate, end: NaiveDate },
}

impl Period {
    /// Resolve the period to a window. `All` needs no transform.
    pub fn window(
        &self,
        origin: &TimeOrigin,
        today: NaiveDate,
        available_width: f64,
    ) -> Option<DisplayWindow> {
        match *self {
            Period::All => None,
            Period::NextMonths { months } => {
                let first = today.with_day(1).unwrap_or(today);
                let start = origin.date_to_position(first, false);
                Some(DisplayWindow::for_months(
                    start,
                    months.max(1),
                    origin.month_width,
                    available_width,
                ))
            }
            Period::Range { start, end } => Some(DisplayWindow::new(
                origin.date_to_position(start, false),
                origin.date_to_position(end, true),
                available_width,
            )),
        }
    }
}

/// An interval item as seen through a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clipped<T> {
    /// The original item, with its unclipped bounds.
    pub original: T,
    /// Visible bounds in canonical pixels, before rescaling.
    pub visible_start: f64,
    pub visible_end: f64,
    /// Display position and width after rescaling.
    pub left: f64,
    pub width: f64,
    pub is_clipped: bool,
}

/// A point item as seen through a window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Projected<T> {
    pub original: T,
    pub left: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredView<T, M> {
    pub tasks: Vec<Clipped<T>>,
    pub milestones: Vec<Projected<M>>,
    pub window: DisplayWindow,
}

/// Keep what intersects `window`, clip interval bounds to it and rescale.
///
/// Intervals entirely outside the window, or touching it only at an edge,
/// are dropped, as are markers outside `[start, end]`.
pub fn apply_period_filter<T, M>(
    placed_tasks: &[T],
    placed_milestones: &[M],
    window: &DisplayWindow,
) -> FilteredView<T, M>
where
    T: Spanned + Clone,
    M: Anchored + Clone,
{
    let tasks = placed_tasks
        .iter()
        .filter_map(|task| {
            let interval = task.interval();
            let (visible_start, visible_end) = window.clip(interval)?;
            Some(Clipped {
                original: task.clone(),
                visible_start,
                visible_end,
                left: window.project(visible_start),
                width: (visible_end - visible_start) * window.scale,
                is_clipped: visible_start > interval.start || visible_end < interval.end,
            })
        })
        .collect();

    FilteredView {
        tasks,
        milestones: project_markers(placed_milestones, window),
        window: *window,
    }
}

/// Markers inside `[start, end]`, projected into window pixels.
pub fn project_markers<M>(markers: &[M], window: &DisplayWindow) -> Vec<Projected<M>>
where
    M: Anchored + Clone,
{
    markers
        .iter()
        .filter(|m| window.contains(m.position()))
        .map(|m| Projected {
            original: m.clone(),
            left: window.project(m.position()),
        })
        .collect()
}
