//! Key-value store for manually adjusted task positions.
//!
//! The dashboard lets users drag and resize bars; the adjusted geometry is
//! kept per task id and laid over the next computed roadmap. Backends only
//! need get-all, upsert and reset.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadmapError};
use crate::model::Roadmap;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StoredPosition {
    pub left: f64,
    pub top: f64,
    pub width: f64,
}

pub type PositionMap = BTreeMap<String, StoredPosition>;

pub trait PositionStore {
    fn get_all(&self) -> Result<PositionMap>;

    /// Insert or replace the given entries. Returns how many were written.
    fn save(&mut self, positions: &PositionMap) -> Result<usize>;

    /// Forget every stored position.
    fn reset(&mut self) -> Result<()>;
}

/// Process-local store, mostly for tests and one-shot CLI runs.
#[derive(Debug, Default, Clone)]
pub struct MemoryPositionStore {
    positions: PositionMap,
}

impl PositionStore for MemoryPositionStore {
    fn get_all(&self) -> Result<PositionMap> {
        Ok(self.positions.clone())
    }

    fn save(&mut self, positions: &PositionMap) -> Result<usize> {
        self.positions
            .extend(positions.iter().map(|(id, p)| (id.clone(), *p)));
        Ok(positions.len())
    }

    fn reset(&mut self) -> Result<()> {
        self.positions.clear();
        Ok(())
    }
}

/// Positions kept in a pretty-printed JSON object keyed by task id.
#[derive(Debug, Clone)]
pub struct JsonFilePositionStore {
    path: PathBuf,
}

impl JsonFilePositionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PositionStore for JsonFilePositionStore {
    fn get_all(&self) -> Result<PositionMap> {
        if !self.path.exists() {
            return Ok(PositionMap::new());
        }
        let json = std::fs::read_to_string(&self.path)
            .map_err(|e| RoadmapError::io(&self.path, e))?;
        Ok(serde_json::from_str(&json)?)
    }

    fn save(&mut self, positions: &PositionMap) -> Result<usize> {
        let mut all = self.get_all()?;
        all.extend(positions.iter().map(|(id, p)| (id.clone(), *p)));

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RoadmapError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&all)?;
        std::fs::write(&self.path, json).map_err(|e| RoadmapError::io(&self.path, e))?;

        info!(
            "event=positions_saved count={} total={} path={}",
            positions.len(),
            all.len(),
            self.path.display()
        );
        Ok(positions.len())
    }

    fn reset(&mut self) -> Result<()> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {
                info!("event=positions_reset path={}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(RoadmapError::io(&self.path, e)),
        }
    }
}

/// Snapshot the bar geometry of a roadmap, ready to be saved.
pub fn positions_of(roadmap: &Roadmap) -> PositionMap {
    roadmap
        .tasks
        .iter()
        .map(|t| {
            let interval = &t.item.interval;
            (
                interval.id.clone(),
                StoredPosition {
                    left: interval.start,
                    top: t.top,
                    width: interval.width(),
                },
            )
        })
        .collect()
}

/// A copy of `roadmap` with stored positions laid over its bars.
///
/// Bars without a stored entry keep their computed geometry; entries for
/// tasks that no longer exist are ignored.
pub fn apply_stored_positions(roadmap: &Roadmap, positions: &PositionMap) -> Roadmap {
    let mut adjusted = roadmap.clone();
    let mut applied = 0usize;
    for task in &mut adjusted.tasks {
        if let Some(stored) = positions.get(&task.item.interval.id) {
            task.item.interval.start = stored.left;
            task.item.interval.end = stored.left + stored.width.max(0.0);
            task.top = stored.top;
            applied += 1;
        }
    }
    debug!(
        "event=positions_applied applied={} stored={}",
        applied,
        positions.len()
    );
    adjusted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RoadmapConfig;
    use crate::layout::build_roadmap;
    use crate::model::{Category, TaskRecord};
    use chrono::NaiveDate;

    fn pos(left: f64, top: f64, width: f64) -> StoredPosition {
        StoredPosition { left, top, width }
    }

    fn sample_roadmap() -> Roadmap {
        let d = |m, day| NaiveDate::from_ymd_opt(2026, m, day).unwrap();
        let records = vec![
            TaskRecord::new("Exports PDF", "vente", d(1, 1), d(1, 20)).with_id("t1"),
            TaskRecord::new("Optimisation", "vente", d(1, 10), d(2, 20)).with_id("t2"),
        ];
        build_roadmap(
            &records,
            &[Category::new("vente", "VENTE")],
            d(1, 1),
            &RoadmapConfig::default(),
        )
    }

    #[test]
    fn memory_store_upserts_and_resets() {
        let mut store = MemoryPositionStore::default();
        store.save(&PositionMap::from([("a".into(), pos(1.0, 2.0, 3.0))])).unwrap();
        store.save(&PositionMap::from([("a".into(), pos(5.0, 2.0, 3.0)), ("b".into(), pos(0.0, 0.0, 40.0))])).unwrap();

        let all = store.get_all().unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all["a"].left, 5.0);

        store.reset().unwrap();
        assert!(store.get_all().unwrap().is_empty());
    }

    #[test]
    fn file_store_persists_between_instances() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("positions.json");

        let mut store = JsonFilePositionStore::new(&path);
        assert!(store.get_all().unwrap().is_empty());
        assert_eq!(store.save(&PositionMap::from([("t1".into(), pos(10.0, 45.0, 140.0))])).unwrap(), 1);

        let reopened = JsonFilePositionStore::new(&path);
        assert_eq!(reopened.get_all().unwrap()["t1"], pos(10.0, 45.0, 140.0));

        store.reset().unwrap();
        assert!(!path.exists());
        // Resetting twice is fine.
        store.reset().unwrap();
    }

    #[test]
    fn stored_positions_override_computed_bars() {
        let roadmap = sample_roadmap();
        let stored = PositionMap::from([
            ("t2".into(), pos(400.0, 5.0, 80.0)),
            ("gone".into(), pos(0.0, 0.0, 10.0)),
        ]);
        let adjusted = apply_stored_positions(&roadmap, &stored);

        let t2 = adjusted.task("t2").unwrap();
        assert_eq!(t2.item.interval.start, 400.0);
        assert_eq!(t2.item.interval.width(), 80.0);
        assert_eq!(t2.top, 5.0);
        assert_eq!(adjusted.task("t1"), roadmap.task("t1"));
        // The computed roadmap itself is untouched.
        assert_ne!(roadmap.task("t2").unwrap().item.interval.start, 400.0);
    }

    #[test]
    fn snapshot_round_trips_through_overlay() {
        let roadmap = sample_roadmap();
        let snapshot = positions_of(&roadmap);
        assert_eq!(snapshot.len(), 2);
        assert_eq!(apply_stored_positions(&roadmap, &snapshot), roadmap);
    }
}
