pub mod roadmap;
pub mod task;
pub mod timeline;

pub use roadmap::{PastDelivery, Roadmap, TimelineTask};
pub use task::{Category, TaskDate, TaskKind, TaskRecord};
pub use timeline::{days_in_month, MonthLabel, TimeOrigin};
