//! Label levels for milestones and the "today" marker.
//!
//! Marker lines stay at their exact position; only their text labels are
//! moved up or down between a small fixed number of levels.

use serde::{Deserialize, Serialize};

use super::Anchored;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LabelSettings {
    /// Number of label levels available above the timeline.
    pub levels: usize,
    /// Approximate rendered width of one label.
    pub label_width: f64,
    pub min_gap: f64,
}

impl Default for LabelSettings {
    fn default() -> Self {
        Self {
            levels: 3,
            label_width: 130.0,
            min_gap: 10.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum MarkerKind {
    Milestone,
    Today,
}

/// A labelled point on the timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointMarker {
    #[serde(rename = "left")]
    pub position: f64,
    pub kind: MarkerKind,
    pub label: String,
}

impl PointMarker {
    pub fn milestone(position: f64, label: impl Into<String>) -> Self {
        Self {
            position,
            kind: MarkerKind::Milestone,
            label: label.into(),
        }
    }

    pub fn today(position: f64, label: impl Into<String>) -> Self {
        Self {
            position,
            kind: MarkerKind::Today,
            label: label.into(),
        }
    }
}

impl Anchored for PointMarker {
    fn position(&self) -> f64 {
        self.position
    }
}

/// An item with its label level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Leveled<T> {
    #[serde(flatten)]
    pub item: T,
    pub level: usize,
}

impl<T: Anchored> Anchored for Leveled<T> {
    fn position(&self) -> f64 {
        self.item.position()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MilestoneLayout<T> {
    /// Milestones in ascending position order.
    pub placed_milestones: Vec<Leveled<T>>,
    /// Level of the today marker, when one was given.
    pub today_level: Option<usize>,
}

/// Assign levels to positions that are already in ascending order.
///
/// Each level remembers where its last label ends. A position takes the
/// first level whose last label ends at or before it; when every level is
/// still busy the last level is reused and the labels overlap.
pub fn assign_levels(sorted_positions: &[f64], settings: &LabelSettings) -> Vec<usize> {
    let levels = settings.levels.max(1);
    let mut next_free = vec![0.0_f64; levels];

    sorted_positions
        .iter()
        .map(|&position| {
            match next_free.iter().position(|&free| free <= position) {
                Some(level) => {
                    next_free[level] = position + settings.label_width + settings.min_gap;
                    level
                }
                None => levels - 1,
            }
        })
        .collect()
}

/// Level the labels of `milestones`, with the today marker taking part in
/// the same pass when `today_position` is given.
///
/// At equal positions the today marker comes after the milestones.
pub fn layout_milestones<T>(
    milestones: &[T],
    today_position: Option<f64>,
    settings: &LabelSettings,
) -> MilestoneLayout<T>
where
    T: Anchored + Clone,
{
    // `None` is the today marker.
    let mut entries: Vec<(f64, Option<usize>)> = milestones
        .iter()
        .enumerate()
        .map(|(i, m)| (m.position(), Some(i)))
        .collect();
    if let Some(today) = today_position {
        entries.push((today, None));
    }
    entries.sort_by(|a, b| a.0.total_cmp(&b.0));

    let positions: Vec<f64> = entries.iter().map(|(p, _)| *p).collect();
    let levels = assign_levels(&positions, settings);

    let mut placed_milestones = Vec::with_capacity(milestones.len());
    let mut today_level = None;
    for ((_, source), level) in entries.into_iter().zip(levels) {
        match source {
            Some(i) => placed_milestones.push(Leveled {
                item: milestones[i].clone(),
                level,
            }),
            None => today_level = Some(level),
        }
    }

    MilestoneLayout {
        placed_milestones,
        today_level,
    }
}
