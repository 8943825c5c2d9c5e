//! Lane packing for the bars of one category row.

use log::debug;
use serde::{Deserialize, Serialize};

use super::{Interval, Spanned};

/// Which end of an interval drives the packing order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortKey {
    /// Earliest-finishing first.
    #[default]
    End,
    /// Earliest-starting first, as older dashboards did.
    Start,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LaneSettings {
    /// Minimum horizontal distance between two bars sharing a lane.
    pub horizontal_gap: f64,
    /// Space between stacked lanes.
    pub vertical_gap: f64,
    /// Padding above the first lane and below the last.
    pub min_padding: f64,
    /// Height of a row with nothing in it.
    pub empty_row_height: f64,
    pub sort_key: SortKey,
}

impl Default for LaneSettings {
    fn default() -> Self {
        Self {
            horizontal_gap: 1.0,
            vertical_gap: 8.0,
            min_padding: 10.0,
            empty_row_height: 60.0,
            sort_key: SortKey::End,
        }
    }
}

/// An item with its lane and vertical offset inside its row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Placed<T> {
    #[serde(flatten)]
    pub item: T,
    pub lane: usize,
    pub lane_height: f64,
    pub top: f64,
}

pub type PlacedInterval = Placed<Interval>;

impl<T: Spanned> Spanned for Placed<T> {
    fn interval(&self) -> &Interval {
        self.item.interval()
    }
}

/// Result of packing one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowLayout<T> {
    /// Placements in packing order.
    pub placed: Vec<Placed<T>>,
    pub row_height: f64,
    pub lanes_used: usize,
}

/// Assign every item a lane so that no two items closer than
/// `horizontal_gap` share one.
///
/// Items are visited in [`SortKey`] order (ties keep input order) and each
/// takes the lowest lane free of near neighbours. This is a deterministic
/// first-fit: depending on the order it can open more lanes than the peak
/// overlap of the row. Lanes are unbounded.
pub fn pack_lanes<T>(items: &[T], lane_height: f64, settings: &LaneSettings) -> RowLayout<T>
where
    T: Spanned + Clone,
{
    if items.is_empty() {
        return RowLayout {
            placed: Vec::new(),
            row_height: settings.empty_row_height,
            lanes_used: 0,
        };
    }

    let mut order: Vec<usize> = (0..items.len()).collect();
    match settings.sort_key {
        SortKey::End => order.sort_by(|&a, &b| {
            items[a].interval().end.total_cmp(&items[b].interval().end)
        }),
        SortKey::Start => order.sort_by(|&a, &b| {
            items[a].interval().start.total_cmp(&items[b].interval().start)
        }),
    }

    // Intervals already sitting in each lane.
    let mut lanes: Vec<Vec<&Interval>> = Vec::new();
    let mut assigned = Vec::with_capacity(items.len());

    for &idx in &order {
        let interval = items[idx].interval();
        let lane = lanes
            .iter()
            .position(|occupants| {
                !occupants
                    .iter()
                    .any(|other| interval.is_near(other, settings.horizontal_gap))
            })
            .unwrap_or(lanes.len());
        if lane == lanes.len() {
            lanes.push(Vec::new());
        }
        lanes[lane].push(interval);
        assigned.push((idx, lane));
    }

    let pitch = lane_height + settings.vertical_gap;
    let lanes_used = lanes.len();
    let row_height = lanes_used as f64 * pitch + 2.0 * settings.min_padding;

    let placed = assigned
        .into_iter()
        .map(|(idx, lane)| Placed {
            item: items[idx].clone(),
            lane,
            lane_height,
            top: lane as f64 * pitch + settings.min_padding,
        })
        .collect();

    debug!(
        "event=lanes_packed items={} lanes={} row_height={}",
        items.len(),
        lanes_used,
        row_height
    );

    RowLayout {
        placed,
        row_height,
        lanes_used,
    }
}
