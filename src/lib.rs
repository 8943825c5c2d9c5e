//! Deterministic layout engine for roadmap Gantt views.
//!
//! Tracker records go through the position mapper, get classified into
//! bars, milestones and events, are lane-packed per category row, and can
//! then be viewed through a clipped and rescaled period window.

pub mod config;
pub mod error;
pub mod io;
pub mod layout;
pub mod model;
pub mod store;

pub use config::RoadmapConfig;
pub use error::{Result, RoadmapError};
pub use layout::{
    apply_period_filter, build_roadmap, delivery_summary, layout_milestones, layout_tasks,
    pack_lanes, view_roadmap, DisplayWindow, Interval, Period, RoadmapView,
};
pub use model::{Category, Roadmap, TaskDate, TaskRecord, TimeOrigin};
pub use store::{JsonFilePositionStore, MemoryPositionStore, PositionStore, StoredPosition};
