//! tsquery CLI
//!
//! Command-line interface for tsquery operations:
//! - Compile criteria to request documents
//! - Replay captured result rows through the decoder
//! - Enumerate series written from a samples file
//! - Generate a default config file

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tsquery::config::{generate_default_config, Config, OutputFormat};
use tsquery::engine::{read_rows_path, MemoryEngine};
use tsquery::model::{to_epoch, AggregateFunction, OrderBy, Predicate};
use tsquery::query::{
    parse_duration, AggregateCriteria, Criteria, GroupAggregateCriteria, JoinCriteria,
    MetadataCriteria, SelectCriteria,
};
use tsquery::{DecodedRow, Session};

#[derive(Parser)]
#[command(name = "tsquery")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Query criteria compiler and result decoder for time-series stores")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: ~/.config/tsquery/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, global = true)]
    pub format: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Print the request document of a criteria
    Compile {
        #[command(subcommand)]
        criteria: CriteriaCommand,
    },

    /// Decode scripted result rows as if a store returned them
    Replay {
        /// CSV file of series,timestamp,value[,value...] records
        #[arg(long)]
        rows: PathBuf,

        #[command(subcommand)]
        criteria: CriteriaCommand,
    },

    /// Write samples and list the resulting series
    Series {
        /// CSV file of series,timestamp,value records
        #[arg(long)]
        samples: PathBuf,

        /// Only list series of this metric
        #[arg(long)]
        metric: Option<String>,

        /// Tag filter, e.g. host=a,b (requires --metric)
        #[arg(long = "where")]
        where_tag: Option<String>,
    },

    /// Generate default config file
    Config {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
pub enum CriteriaCommand {
    /// Raw data points of one metric
    Select {
        metric: String,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// One aggregated value per series
    Aggregate {
        metric: String,
        /// Aggregate function (count, max, min, mean, sum, min_timestamp, max_timestamp, first, last)
        #[arg(long)]
        func: String,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        grouping: GroupingArgs,
    },

    /// Downsample metrics into fixed-width bins
    GroupAggregate {
        #[arg(required = true)]
        metrics: Vec<String>,
        /// Bin width, e.g. 30s or 5m (default from config)
        #[arg(long)]
        step: Option<String>,
        /// Aggregate functions, comma-separated
        #[arg(long, value_delimiter = ',', required = true)]
        func: Vec<String>,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        grouping: GroupingArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Several metrics aligned by series and time
    Join {
        #[arg(required = true)]
        metrics: Vec<String>,
        #[command(flatten)]
        range: RangeArgs,
        #[command(flatten)]
        tags: TagArgs,
        #[command(flatten)]
        output: OutputArgs,
    },

    /// Series-name enumeration
    Metadata {
        #[arg(long)]
        metric: Option<String>,
        #[command(flatten)]
        tags: TagArgs,
    },
}

#[derive(Args)]
pub struct RangeArgs {
    /// Range start: nanosecond epoch, RFC 3339, "now" or "now-<duration>"
    #[arg(long)]
    pub from: Option<String>,

    /// Range end, same forms as --from
    #[arg(long)]
    pub to: Option<String>,
}

#[derive(Args)]
pub struct TagArgs {
    /// Tag filter, e.g. host=a,b
    #[arg(long = "where")]
    pub where_tag: Option<String>,
}

#[derive(Args)]
pub struct GroupingArgs {
    /// Tags to remove from series names, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub group_by: Vec<String>,

    /// Tags to keep in series names, comma-separated
    #[arg(long, value_delimiter = ',')]
    pub pivot_by: Vec<String>,
}

#[derive(Args)]
pub struct OutputArgs {
    /// Row order (series, time)
    #[arg(long)]
    pub order_by: Option<String>,

    /// Value filter such as gt:10 (at most two)
    #[arg(long)]
    pub filter: Vec<String>,

    #[arg(long)]
    pub limit: Option<u64>,

    #[arg(long)]
    pub offset: Option<u64>,
}

/// A criteria built from the command line
enum Built {
    Query(Box<dyn Criteria>),
    Metadata(MetadataCriteria),
}

impl Built {
    fn document(&self) -> &str {
        match self {
            Built::Query(criteria) => criteria.compile(),
            Built::Metadata(criteria) => criteria.compile(),
        }
    }
}

/// Apply `--where` to a builder
macro_rules! apply_tags {
    ($builder:expr, $tags:expr) => {{
        let mut builder = $builder;
        if let Some((name, values)) = parse_where($tags.where_tag.as_deref())? {
            builder = builder.where_tag(name, values);
        }
        builder
    }};
}

/// Apply `--group-by` and `--pivot-by` to a builder
macro_rules! apply_grouping {
    ($builder:expr, $grouping:expr) => {{
        let mut builder = $builder;
        if !$grouping.group_by.is_empty() {
            builder = builder.group_by_tag($grouping.group_by.clone());
        }
        if !$grouping.pivot_by.is_empty() {
            builder = builder.pivot_by_tag($grouping.pivot_by.clone());
        }
        builder
    }};
}

/// Apply ordering, value filters, limit and offset to a builder
macro_rules! apply_output {
    ($builder:expr, $output:expr, $config:expr) => {{
        let mut builder = $builder;
        let order = match $output.order_by.as_deref() {
            Some(name) => Some(
                OrderBy::from_name(name).ok_or_else(|| anyhow!("unknown order '{}'", name))?,
            ),
            None => $config.query.order_by,
        };
        if let Some(order) = order {
            builder = builder.order_by(order);
        }
        match $output.filter.as_slice() {
            [] => {}
            [single] => {
                let (predicate, value) = parse_filter(single)?;
                builder = builder.filter(predicate, value)?;
            }
            [first, second] => {
                let (p1, v1) = parse_filter(first)?;
                let (p2, v2) = parse_filter(second)?;
                builder = builder.filter_range(p1, v1, p2, v2)?;
            }
            _ => bail!("at most two --filter values may be given"),
        }
        if let Some(limit) = $output.limit {
            builder = builder.limit(limit);
        }
        if let Some(offset) = $output.offset {
            builder = builder.offset(offset);
        }
        builder
    }};
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    if let Some(format) = &cli.format {
        config.output.format = OutputFormat::from_name(format)
            .ok_or_else(|| anyhow!("unknown output format '{}'", format))?;
    }

    tsquery::logging::init(&config.logging)?;
    tracing::debug!("tsquery v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Compile { criteria } => {
            let built = build_criteria(criteria, &config)?;
            println!("{}", built.document());
        }

        Commands::Replay { rows, criteria } => {
            let built = build_criteria(criteria, &config)?;
            let Built::Query(criteria) = built else {
                bail!("replay needs a query criteria; use `series` to list series names");
            };

            let engine = MemoryEngine::new();
            engine
                .load_script_csv(&rows)
                .with_context(|| format!("failed to load rows from {}", rows.display()))?;
            let session = Session::new(engine);

            let mut decoded = Vec::new();
            if let Some(mut cursor) = session.query(criteria.as_ref())? {
                while let Some(row) = cursor.next_row()? {
                    decoded.push(row.snapshot()?);
                }
                cursor.close()?;
            }
            tracing::debug!(document = criteria.compile(), rows = decoded.len(), "Replayed");
            print_rows(&decoded, config.output.format)?;
        }

        Commands::Series {
            samples,
            metric,
            where_tag,
        } => {
            let session = Session::new(MemoryEngine::new());
            let rows = read_rows_path(&samples)
                .with_context(|| format!("failed to read samples from {}", samples.display()))?;
            for row in &rows {
                let value = row
                    .values
                    .first()
                    .copied()
                    .ok_or_else(|| anyhow!("sample '{}' has no value", row.series))?;
                session.add(row.timestamp, &row.series, value)?;
            }

            let criteria = metadata_criteria(metric, &TagArgs { where_tag })?;
            let names = match session.metadata(&criteria)? {
                Some(cursor) => cursor.collect::<tsquery::Result<Vec<String>>>()?,
                None => Vec::new(),
            };
            match config.output.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&names)?),
                OutputFormat::Table => {
                    if names.is_empty() {
                        println!("No series found.");
                    }
                    for name in names {
                        println!("{}", name);
                    }
                }
            }
        }

        Commands::Config { output } => {
            let content = generate_default_config();

            if let Some(path) = output {
                std::fs::write(&path, &content)?;
                println!("Config written to: {}", path.display());
            } else {
                println!("{}", content);
            }
        }
    }

    Ok(())
}

fn build_criteria(command: CriteriaCommand, config: &Config) -> anyhow::Result<Built> {
    let built = match command {
        CriteriaCommand::Select {
            metric,
            range,
            tags,
            output,
        } => {
            let (from, to) = resolve_range(&range, config, true)?;
            let builder = SelectCriteria::builder().select(metric).from(from).to(to);
            let builder = apply_tags!(builder, tags);
            let builder = apply_output!(builder, output, config);
            Built::Query(Box::new(builder.build()?))
        }

        CriteriaCommand::Aggregate {
            metric,
            func,
            range,
            tags,
            grouping,
        } => {
            let (from, to) = resolve_range(&range, config, false)?;
            let builder = AggregateCriteria::builder()
                .aggregate(metric, parse_function(&func)?)
                .from(from)
                .to(to);
            let builder = apply_tags!(builder, tags);
            let builder = apply_grouping!(builder, grouping);
            Built::Query(Box::new(builder.build()?))
        }

        CriteriaCommand::GroupAggregate {
            metrics,
            step,
            func,
            range,
            tags,
            grouping,
            output,
        } => {
            let step = match step {
                Some(step) => parse_duration(&step)?,
                None => config.query.step()?,
            };
            let functions = func
                .iter()
                .map(|name| parse_function(name))
                .collect::<anyhow::Result<Vec<_>>>()?;
            let (from, to) = resolve_range(&range, config, true)?;

            let builder = GroupAggregateCriteria::builder()
                .group_aggregate(metrics, step, functions)
                .from(from)
                .to(to);
            let builder = apply_tags!(builder, tags);
            let builder = apply_grouping!(builder, grouping);
            let builder = apply_output!(builder, output, config);
            Built::Query(Box::new(builder.build()?))
        }

        CriteriaCommand::Join {
            metrics,
            range,
            tags,
            output,
        } => {
            let (from, to) = resolve_range(&range, config, true)?;
            let builder = JoinCriteria::builder().join(metrics).from(from).to(to);
            let builder = apply_tags!(builder, tags);
            let builder = apply_output!(builder, output, config);
            Built::Query(Box::new(builder.build()?))
        }

        CriteriaCommand::Metadata { metric, tags } => {
            Built::Metadata(metadata_criteria(metric, &tags)?)
        }
    };

    Ok(built)
}

fn metadata_criteria(metric: Option<String>, tags: &TagArgs) -> anyhow::Result<MetadataCriteria> {
    let mut builder = MetadataCriteria::builder();
    if let Some(metric) = metric {
        builder = builder.metric(metric);
    }
    let builder = apply_tags!(builder, tags);
    Ok(builder.build()?)
}

/// Resolve `--from`/`--to`, falling back to the configured lookback window
/// ending now when the criteria needs a range and neither was given
fn resolve_range(range: &RangeArgs, config: &Config, required: bool) -> anyhow::Result<(i64, i64)> {
    let now = Utc::now();
    let from = range
        .from
        .as_deref()
        .map(|s| parse_time(s, now))
        .transpose()?;
    let to = range.to.as_deref().map(|s| parse_time(s, now)).transpose()?;

    match (from, to) {
        (None, None) if required => {
            let lookback = chrono::Duration::from_std(config.query.lookback()?)
                .context("lookback window is too large")?;
            Ok((epoch(now - lookback)?, epoch(now)?))
        }
        (from, to) => Ok((from.unwrap_or(0), to.unwrap_or(0))),
    }
}

/// Parse a nanosecond epoch, an RFC 3339 instant, `now` or `now-<duration>`
fn parse_time(input: &str, now: DateTime<Utc>) -> anyhow::Result<i64> {
    if let Ok(epoch) = input.parse::<i64>() {
        return Ok(epoch);
    }
    if input == "now" {
        return epoch(now);
    }
    if let Some(ago) = input.strip_prefix("now-") {
        let ago = chrono::Duration::from_std(parse_duration(ago)?)
            .with_context(|| format!("duration '{}' is too large", ago))?;
        return epoch(now - ago);
    }
    let instant = DateTime::parse_from_rfc3339(input)
        .with_context(|| format!("invalid time '{}'", input))?;
    epoch(instant.with_timezone(&Utc))
}

fn epoch(instant: DateTime<Utc>) -> anyhow::Result<i64> {
    to_epoch(&instant).ok_or_else(|| anyhow!("{} is outside the nanosecond epoch range", instant))
}

fn parse_function(name: &str) -> anyhow::Result<AggregateFunction> {
    AggregateFunction::from_name(name)
        .ok_or_else(|| anyhow!("unknown aggregate function '{}'", name))
}

/// Parse `tag=v1,v2`
fn parse_where(input: Option<&str>) -> anyhow::Result<Option<(String, Vec<String>)>> {
    let Some(input) = input else {
        return Ok(None);
    };
    let (name, values) = input
        .split_once('=')
        .ok_or_else(|| anyhow!("tag filter '{}' must look like tag=v1,v2", input))?;
    let values = values
        .split(',')
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect();
    Ok(Some((name.to_string(), values)))
}

/// Parse `gt:10`
fn parse_filter(input: &str) -> anyhow::Result<(Predicate, f64)> {
    let (code, value) = input
        .split_once(':')
        .ok_or_else(|| anyhow!("filter '{}' must look like gt:10", input))?;
    let predicate =
        Predicate::from_code(code).ok_or_else(|| anyhow!("unknown predicate '{}'", code))?;
    let value = value
        .parse::<f64>()
        .with_context(|| format!("invalid filter value '{}'", value))?;
    Ok((predicate, value))
}

fn print_rows(rows: &[DecodedRow], format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(rows)?);
        }
        OutputFormat::Table => {
            if rows.is_empty() {
                println!("No data.");
                return Ok(());
            }

            println!("{:<32} {:<40} {}", "Time", "Series", "Values");
            println!("{}", "-".repeat(90));
            for row in rows {
                let values: Vec<String> = row.values.iter().map(|v| format!("{:.4}", v)).collect();
                println!(
                    "{:<32} {:<40} {}",
                    row.datetime.to_rfc3339(),
                    row.series,
                    values.join(", ")
                );
            }
            println!();
            println!("{} row(s)", rows.len());
        }
    }
    Ok(())
}
