use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use log::info;

use roadmap_layout::io;
use roadmap_layout::layout::{delivery_summary, view_roadmap, Period};
use roadmap_layout::store::{
    apply_stored_positions, positions_of, JsonFilePositionStore, PositionStore,
};
use roadmap_layout::{build_roadmap, Category, RoadmapConfig, TaskRecord};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Lay out tracker tasks as a roadmap Gantt view", long_about = None)]
struct Cli {
    /// Configuration file (defaults to the OS config directory)
    #[clap(long, global = true)]
    config: Option<PathBuf>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the roadmap layout and print it as JSON
    Layout {
        #[clap(flatten)]
        input: Input,
        /// Stored manual positions to lay over the computed bars
        #[clap(long)]
        positions: Option<PathBuf>,
        /// Visible period: `all`, `next-months:N` or `YYYY-MM-DD..YYYY-MM-DD`
        #[clap(long, default_value = "all")]
        period: String,
        /// Available width in pixels for a period view
        #[clap(long, default_value_t = 1200.0)]
        width: f64,
        /// Write the JSON here instead of stdout
        #[clap(long, short)]
        output: Option<PathBuf>,
    },
    /// Export the delivery recap as CSV
    Summary {
        #[clap(flatten)]
        input: Input,
        /// Output CSV file
        #[clap(long, short)]
        output: PathBuf,
    },
    /// Manage stored manual positions
    Positions {
        /// Position store file
        #[clap(long)]
        store: PathBuf,
        #[clap(subcommand)]
        action: PositionAction,
    },
}

#[derive(Subcommand, Debug)]
enum PositionAction {
    /// Print stored positions
    Show,
    /// Store the current computed layout as manual positions
    Snapshot {
        #[clap(flatten)]
        input: Input,
    },
    /// Delete all stored positions
    Reset,
}

#[derive(clap::Args, Debug)]
struct Input {
    /// Tasks as tracker JSON or spreadsheet CSV
    tasks: PathBuf,
    /// Ordered category list (JSON array of {key, name})
    #[clap(long)]
    categories: Option<PathBuf>,
    /// Category for CSV rows that have none
    #[clap(long, default_value = "roadmap")]
    default_category: String,
    /// Reference day for the today marker (defaults to the local date)
    #[clap(long)]
    today: Option<NaiveDate>,
}

impl Input {
    fn load(&self, config: &RoadmapConfig) -> anyhow::Result<(Vec<TaskRecord>, Vec<Category>)> {
        let records = if has_extension(&self.tasks, "csv") {
            let (records, skipped) =
                io::import_csv(&self.tasks, &self.default_category, config.timezone())?;
            info!("event=csv_imported records={} skipped={}", records.len(), skipped);
            records
        } else {
            io::load_task_records(&self.tasks, config.timezone())?
        };

        let categories = match &self.categories {
            Some(path) => io::load_categories(path)?,
            None => categories_in_order_seen(&records),
        };
        Ok((records, categories))
    }

    fn today(&self) -> NaiveDate {
        self.today
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

fn has_extension(path: &Path, ext: &str) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// One row per distinct category, in first-seen order.
fn categories_in_order_seen(records: &[TaskRecord]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for record in records {
        if !categories.iter().any(|c| c.key == record.category) {
            categories.push(Category::new(&record.category, record.category.to_uppercase()));
        }
    }
    categories
}

fn parse_period(raw: &str) -> anyhow::Result<Period> {
    let raw = raw.trim();
    if raw.eq_ignore_ascii_case("all") {
        return Ok(Period::All);
    }
    if let Some(months) = raw.strip_prefix("next-months:") {
        let months = months
            .parse()
            .with_context(|| format!("invalid month count in period `{raw}`"))?;
        return Ok(Period::NextMonths { months });
    }
    if let Some((start, end)) = raw.split_once("..") {
        let start = NaiveDate::parse_from_str(start, "%Y-%m-%d")
            .with_context(|| format!("invalid period start `{start}`"))?;
        let end = NaiveDate::parse_from_str(end, "%Y-%m-%d")
            .with_context(|| format!("invalid period end `{end}`"))?;
        if end < start {
            bail!("period end {end} is before start {start}");
        }
        return Ok(Period::Range { start, end });
    }
    bail!("unknown period `{raw}`; use all, next-months:N or START..END")
}

fn load_config(path: Option<&Path>) -> anyhow::Result<RoadmapConfig> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => RoadmapConfig::default_path()?,
    };
    RoadmapConfig::load_or_default(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))
}

fn write_output(json: String, output: Option<&Path>) -> anyhow::Result<()> {
    match output {
        Some(path) => std::fs::write(path, json)
            .with_context(|| format!("failed to write {}", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Layout {
            input,
            positions,
            period,
            width,
            output,
        } => {
            let period = parse_period(&period)?;
            let (records, categories) = input.load(&config)?;
            let today = input.today();
            let mut roadmap = build_roadmap(&records, &categories, today, &config);

            if let Some(path) = positions {
                let stored = JsonFilePositionStore::new(path).get_all()?;
                roadmap = apply_stored_positions(&roadmap, &stored);
            }

            let json = match period.window(&config.time_origin(), today, width) {
                Some(window) => {
                    let view = view_roadmap(&roadmap, &window);
                    let mut out = serde_json::Map::new();
                    out.insert("roadmap".into(), serde_json::to_value(&roadmap)?);
                    out.insert("view".into(), serde_json::to_value(&view)?);
                    serde_json::Value::Object(out)
                }
                None => serde_json::to_value(&roadmap)?,
            };
            write_output(serde_json::to_string_pretty(&json)?, output.as_deref())
        }
        Command::Summary { input, output } => {
            let (records, categories) = input.load(&config)?;
            let roadmap = build_roadmap(&records, &categories, input.today(), &config);
            let sections = delivery_summary(
                roadmap.tasks.iter().map(|t| &t.item),
                &roadmap.categories,
                &config.time_origin(),
            );
            let rows =
                io::export_delivery_summary_to(&sections, &roadmap.past_deliveries, &output)?;
            info!("event=summary_exported rows={} path={}", rows, output.display());
            Ok(())
        }
        Command::Positions { store, action } => {
            let mut store = JsonFilePositionStore::new(store);
            match action {
                PositionAction::Show => {
                    write_output(serde_json::to_string_pretty(&store.get_all()?)?, None)
                }
                PositionAction::Snapshot { input } => {
                    let (records, categories) = input.load(&config)?;
                    let roadmap = build_roadmap(&records, &categories, input.today(), &config);
                    let count = store.save(&positions_of(&roadmap))?;
                    info!("event=positions_snapshot count={count}");
                    Ok(())
                }
                PositionAction::Reset => Ok(store.reset()?),
            }
        }
    }
}
