//! Roadmap configuration: persisted as JSON in the OS config directory.
//!
//! The configuration is an explicit value. It is loaded and migrated once at
//! startup by the caller and then passed by reference into every layout
//! call; nothing in the crate reads it implicitly.

use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDate, Offset, Utc};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, RoadmapError};
use crate::layout::labels::LabelSettings;
use crate::layout::lanes::{LaneSettings, SortKey};
use crate::model::TimeOrigin;

/// Version written by this build.
pub const CONFIG_VERSION: u32 = 2;

const CONFIG_FILE_NAME: &str = "config.json";

/// Bar sizing and text wrapping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TaskGeometry {
    /// Narrowest bar drawn for a regular task.
    pub min_width: f64,
    /// Width of a milestone line.
    pub milestone_width: f64,
    /// Span given to a task that has a start but no due date.
    pub missing_due_span: f64,
    /// Average glyph width of the bar font.
    pub char_width: f64,
    /// Total horizontal padding inside a bar.
    pub padding_h: f64,
    pub line_height: f64,
    /// Total vertical padding inside a bar.
    pub padding_v: f64,
    /// Bars never grow taller than this many text lines.
    pub max_lines: usize,
}

impl Default for TaskGeometry {
    fn default() -> Self {
        Self {
            min_width: 40.0,
            milestone_width: 2.0,
            missing_due_span: 100.0,
            char_width: 6.0,
            padding_h: 12.0,
            line_height: 13.0,
            padding_v: 8.0,
            max_lines: 3,
        }
    }
}

impl TaskGeometry {
    /// Lines needed to wrap `text` inside a bar of `width` pixels.
    pub fn lines_needed(&self, text: &str, width: f64) -> usize {
        let per_line = ((width - self.padding_h) / self.char_width).floor().max(1.0) as usize;
        text.chars().count().div_ceil(per_line).max(1)
    }

    pub fn height_for_lines(&self, lines: usize) -> f64 {
        lines as f64 * self.line_height + self.padding_v
    }
}

/// Stacking of event entries at the top of the event category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EventSettings {
    pub height: f64,
    pub gap: f64,
    pub top_padding: f64,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            height: 24.0,
            gap: 4.0,
            top_padding: 8.0,
        }
    }
}

/// Tracker tags that change how a record is drawn. Matching ignores case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TagConventions {
    /// A one-day task carrying one of these is a milestone.
    pub milestone: Vec<String>,
    pub event: Vec<String>,
    /// Marks a delivery kept on its initial date.
    pub delivered: Vec<String>,
    /// Priority label that flags a bar as urgent.
    pub urgent_priority: String,
}

impl Default for TagConventions {
    fn default() -> Self {
        Self {
            milestone: vec!["temps forts".into(), "temps fort".into()],
            event: vec!["événement".into(), "evenement".into()],
            delivered: vec!["livraison maintenue au planning".into()],
            urgent_priority: "urgent".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RoadmapConfig {
    /// Files without a version predate versioning and read as 0.
    #[serde(default)]
    pub version: u32,
    /// Day whose month is position 0.
    pub origin: NaiveDate,
    pub month_width: f64,
    /// Offset used to turn tracker timestamps into calendar days.
    pub timezone_offset_minutes: i32,
    /// Category that receives event entries.
    pub event_category: Option<String>,
    pub tasks: TaskGeometry,
    pub lanes: LaneSettings,
    pub labels: LabelSettings,
    pub events: EventSettings,
    pub tags: TagConventions,
}

impl Default for RoadmapConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            origin: NaiveDate::from_ymd_opt(2025, 12, 1).unwrap_or_default(),
            month_width: 150.0,
            timezone_offset_minutes: 0,
            event_category: Some("commercialisation".into()),
            tasks: TaskGeometry::default(),
            lanes: LaneSettings::default(),
            labels: LabelSettings::default(),
            events: EventSettings::default(),
            tags: TagConventions::default(),
        }
    }
}

impl RoadmapConfig {
    pub fn time_origin(&self) -> TimeOrigin {
        TimeOrigin::new(self.origin, self.month_width)
    }

    pub fn timezone(&self) -> FixedOffset {
        FixedOffset::east_opt(self.timezone_offset_minutes.saturating_mul(60))
            .unwrap_or_else(|| {
                warn!(
                    "event=config_timezone_invalid offset_minutes={} fallback=utc",
                    self.timezone_offset_minutes
                );
                Utc.fix()
            })
    }

    /// Bring a configuration read from disk up to [`CONFIG_VERSION`].
    ///
    /// Versions 0 and 1 always packed lanes by start position, so they keep
    /// that order explicitly. Newer versions are rejected.
    pub fn migrate(mut self) -> Result<Self> {
        if self.version > CONFIG_VERSION {
            return Err(RoadmapError::UnsupportedConfigVersion {
                found: self.version,
                supported: CONFIG_VERSION,
            });
        }
        if self.version < 2 {
            info!(
                "event=config_migrate from={} to={} sort_key=start",
                self.version, CONFIG_VERSION
            );
            self.lanes.sort_key = SortKey::Start;
            self.version = CONFIG_VERSION;
        }
        Ok(self)
    }

    /// Default location: `<config dir>/RoadmapLayout/config.json`.
    pub fn default_path() -> Result<PathBuf> {
        directories::ProjectDirs::from("", "", "RoadmapLayout")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
            .ok_or(RoadmapError::NoConfigDir)
    }

    /// Read and migrate a configuration file.
    pub fn load_from(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| RoadmapError::io(path, e))?;
        let config: Self = serde_json::from_str(&json)?;
        config.migrate()
    }

    /// Load from `path`, falling back to defaults when the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("event=config_default path={}", path.display());
            return Ok(Self::default());
        }
        Self::load_from(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RoadmapError::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).map_err(|e| RoadmapError::io(path, e))
    }
}
