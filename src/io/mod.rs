pub mod csv_export;
pub mod csv_import;
pub mod file;

pub use csv_export::{export_delivery_summary, export_delivery_summary_to};
pub use csv_import::{import_csv, parse_csv};
pub use file::{load_categories, load_roadmap, load_task_records, parse_task_records, save_roadmap};
