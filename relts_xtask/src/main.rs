use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use relts_store::reshape::{
    partition_by_location, tables_per_location, to_columns, to_wide_table, DEFAULT_SEPARATOR,
};
use relts_store::{
    open_store, DictionaryApi, InsertValueInput, LatestQuery, Metadata, NameFilter, RangeQuery,
    Scalar, TimeSeries, UpsertLocationInput, UpsertParameterInput, ValueKind, ValueQueryApi,
    ValueRow, ValueSchema, ValueWriteApi,
};
use tracing_subscriber::EnvFilter;

/// 2018-01-01T00:00:00Z
const DEMO_EPOCH: i64 = 1_514_764_800;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("relts_store=info,relts=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Provision(args) => provision(&cli.datastore, args).await,
        Command::Demo(args) => demo(&cli.datastore, args).await.map(|_| ()),
        Command::UpsertLocation(args) => upsert_location(&cli.datastore, args).await,
        Command::UpsertParameter(args) => upsert_parameter(&cli.datastore, args).await,
        Command::Insert(args) => insert(&cli.datastore, args).await,
        Command::Range(args) => range(&cli.datastore, args).await,
        Command::Latest(args) => latest(&cli.datastore, args).await,
        Command::Prune(args) => prune(&cli.datastore, args).await,
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Developer utilities for relational time series"
)]
struct Cli {
    /// Directory holding relts.json and the default SQLite file.
    #[arg(long, global = true, default_value = ".relts")]
    datastore: PathBuf,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the tables of a time series (no-op when they exist).
    Provision(ProvisionArgs),
    /// Provision a series and run the sample session against it.
    Demo(DemoArgs),
    /// Create a location or replace its metadata.
    UpsertLocation(UpsertLocationArgs),
    /// Create a parameter or replace its unit and metadata.
    UpsertParameter(UpsertParameterArgs),
    /// Store one value.
    Insert(InsertArgs),
    /// Print stored values in a time range.
    Range(RangeArgs),
    /// Print the newest value of every location/parameter pair.
    Latest(LatestArgs),
    /// Delete values older than a timestamp.
    Prune(PruneArgs),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum KindArg {
    Integer,
    Float,
    Text,
}

impl From<KindArg> for ValueKind {
    fn from(value: KindArg) -> Self {
        match value {
            KindArg::Integer => ValueKind::Integer,
            KindArg::Float => ValueKind::Float,
            KindArg::Text => ValueKind::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON object per stored value.
    #[default]
    Long,
    /// One record per timestamp, one key per location/parameter pair.
    Table,
    /// One array per column, including `timestamp`.
    Columns,
    /// Values grouped by location.
    PerLocation,
    /// One table per location, keyed by parameter.
    TablesPerLocation,
}

#[derive(Parser)]
struct SeriesArg {
    /// Time series name; characters outside `[A-Za-z0-9_-]` are dropped.
    #[arg(long, default_value = "demo")]
    series: String,
}

#[derive(Parser)]
struct ProvisionArgs {
    #[command(flatten)]
    series: SeriesArg,
    #[arg(long, value_enum, default_value_t = KindArg::Float)]
    kind: KindArg,
    /// Raw column type handed to the database, e.g. `DECIMAL(8,2)`.
    #[arg(long)]
    sql_type: Option<String>,
    /// Also create the read-only info view.
    #[arg(long, default_value_t = false)]
    info_view: bool,
}

#[derive(Parser)]
struct DemoArgs {
    #[command(flatten)]
    series: SeriesArg,
    #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,
}

#[derive(Parser)]
struct UpsertLocationArgs {
    #[command(flatten)]
    series: SeriesArg,
    name: String,
    /// Metadata as a JSON object.
    #[arg(long)]
    details: Option<String>,
}

#[derive(Parser)]
struct UpsertParameterArgs {
    #[command(flatten)]
    series: SeriesArg,
    name: String,
    #[arg(long)]
    unit: Option<String>,
    /// Metadata as a JSON object.
    #[arg(long)]
    details: Option<String>,
}

#[derive(Parser)]
struct InsertArgs {
    #[command(flatten)]
    series: SeriesArg,
    location: String,
    parameter: String,
    timestamp: i64,
    value: String,
    /// Skip unknown names instead of failing.
    #[arg(long, default_value_t = false)]
    fail_silently: bool,
}

#[derive(Parser)]
struct FilterArgs {
    /// Restrict to these locations (repeatable).
    #[arg(long = "location")]
    locations: Vec<String>,
    /// Restrict to these parameters (repeatable).
    #[arg(long = "parameter")]
    parameters: Vec<String>,
    /// Fail on unknown names instead of skipping them.
    #[arg(long, default_value_t = false)]
    strict: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Long)]
    format: OutputFormat,
    /// Joins location and parameter in wide column labels.
    #[arg(long, default_value = DEFAULT_SEPARATOR)]
    separator: String,
}

#[derive(Parser)]
struct RangeArgs {
    #[command(flatten)]
    series: SeriesArg,
    #[arg(long)]
    start: Option<i64>,
    #[arg(long)]
    end: Option<i64>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Parser)]
struct LatestArgs {
    #[command(flatten)]
    series: SeriesArg,
    /// Drop entries older than this timestamp.
    #[arg(long)]
    since: Option<i64>,
    #[command(flatten)]
    filter: FilterArgs,
}

#[derive(Parser)]
struct PruneArgs {
    #[command(flatten)]
    series: SeriesArg,
    /// Values strictly older than this timestamp are removed.
    #[arg(long)]
    before: i64,
}

async fn open_series(datastore: &Path, series: &SeriesArg) -> Result<TimeSeries> {
    let store = open_store(datastore)
        .await
        .with_context(|| format!("open datastore {}", datastore.display()))?;
    Ok(store.open_series(&series.series).await?)
}

async fn provision(datastore: &Path, args: ProvisionArgs) -> Result<()> {
    let store = open_store(datastore)
        .await
        .with_context(|| format!("open datastore {}", datastore.display()))?;
    let schema = match args.sql_type {
        Some(sql_type) => ValueSchema::with_sql_type(args.kind.into(), sql_type),
        None => ValueSchema::new(args.kind.into()),
    };
    let series = store
        .provision_series(&args.series.series, schema, args.info_view)
        .await?;
    println!("Provisioned time series '{}'", series.name());
    Ok(())
}

async fn upsert_location(datastore: &Path, args: UpsertLocationArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let details = Metadata::from_json(args.details.as_deref())?;
    series
        .upsert_location(UpsertLocationInput::new(args.name).with_details(details))
        .await?;
    Ok(())
}

async fn upsert_parameter(datastore: &Path, args: UpsertParameterArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let mut input = UpsertParameterInput::new(args.name)
        .with_details(Metadata::from_json(args.details.as_deref())?);
    input.unit = args.unit;
    series.upsert_parameter(input).await?;
    Ok(())
}

async fn insert(datastore: &Path, args: InsertArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let value = parse_scalar(series.value_kind(), &args.value)?;
    let mut input = InsertValueInput::new(args.location, args.parameter, args.timestamp, value);
    input.fail_silently = args.fail_silently;
    let stored = series.insert_value(input).await?;
    if !stored {
        println!("Skipped: unknown location or parameter");
    }
    Ok(())
}

async fn range(datastore: &Path, args: RangeArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let mut query = RangeQuery::between(args.start, args.end)
        .locations(name_filter(&args.filter.locations))
        .parameters(name_filter(&args.filter.parameters));
    if args.filter.strict {
        query = query.strict();
    }
    let rows = series.range(query).await?;
    println!(
        "{}",
        render(&rows, args.filter.format, &args.filter.separator)?
    );
    Ok(())
}

async fn latest(datastore: &Path, args: LatestArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let mut query = LatestQuery::default()
        .locations(name_filter(&args.filter.locations))
        .parameters(name_filter(&args.filter.parameters));
    query.min_timestamp = args.since;
    if args.filter.strict {
        query = query.strict();
    }
    let rows = series.latest(query).await?;
    println!(
        "{}",
        render(&rows, args.filter.format, &args.filter.separator)?
    );
    Ok(())
}

async fn prune(datastore: &Path, args: PruneArgs) -> Result<()> {
    let series = open_series(datastore, &args.series).await?;
    let deleted = series.delete_values_older_than(args.before).await?;
    println!("Deleted {deleted} values older than {}", args.before);
    Ok(())
}

/// Replays the sample session: two locations, three parameters, out-of-order
/// inserts, one overwrite and a couple of lenient lookups.
async fn demo(datastore: &Path, args: DemoArgs) -> Result<TimeSeries> {
    let store = open_store(datastore)
        .await
        .with_context(|| format!("open datastore {}", datastore.display()))?;
    let series = store
        .provision_series(&args.series.series, ValueSchema::default(), true)
        .await?;

    series.upsert_location(UpsertLocationInput::new("here")).await?;
    series
        .upsert_location(
            UpsertLocationInput::new("there")
                .with_details(Metadata::new().with("where", "exactly there")),
        )
        .await?;
    series
        .upsert_location(
            UpsertLocationInput::new("here").with_details(Metadata::new().with("where", "not there")),
        )
        .await?;
    let locations = series.locations().await?;
    let listed: Vec<_> = locations.iter().collect();
    println!("{}", serde_json::to_string_pretty(&listed)?);

    series.upsert_parameter(UpsertParameterInput::new("aaa")).await?;
    series
        .upsert_parameter(UpsertParameterInput::new("bbb").with_unit("potatoes"))
        .await?;
    series
        .upsert_parameter(
            UpsertParameterInput::new("ccc").with_details(Metadata::new().with("si", false)),
        )
        .await?;
    series
        .upsert_parameter(
            UpsertParameterInput::new("ccc")
                .with_unit("kg")
                .with_details(Metadata::new().with("si", true)),
        )
        .await?;
    let parameters = series.parameters().await?;
    let listed: Vec<_> = parameters.iter().collect();
    println!("{}", serde_json::to_string_pretty(&listed)?);

    let minute = |n: i64| DEMO_EPOCH + n * 60;
    let samples: [(&str, &str, i64, Scalar); 7] = [
        ("here", "aaa", minute(0), 1.into()),
        ("here", "aaa", minute(4), (-3).into()),
        ("here", "aaa", minute(2), 1.567.into()),
        ("here", "aaa", minute(3), 1.56789.into()),
        ("here", "aaa", minute(1), 1.5.into()),
        ("there", "bbb", minute(1), 1.51.into()),
        ("there", "aaa", minute(1), 1.49.into()),
    ];
    for (location, parameter, timestamp, value) in samples {
        series
            .insert_value(InsertValueInput::new(location, parameter, timestamp, value))
            .await?;
    }
    series
        .insert_value(InsertValueInput::new("here", "aaa", minute(0), -1))
        .await?;

    let skipped = series
        .insert_value(InsertValueInput::new("xxyyzz", "xxyyzz", minute(0), 1).fail_silently())
        .await?;
    println!("Insert into unknown names (silent): {skipped}");
    if let Err(err) = series
        .insert_value(InsertValueInput::new("xxyyzz", "xxyyzz", minute(0), 1))
        .await
    {
        println!("Insert into unknown names (strict): {err}");
    }

    let all = series.range(RangeQuery::default()).await?;
    println!("{}", render(&all, OutputFormat::Long, DEFAULT_SEPARATOR)?);
    println!("{}", render(&all, args.format, DEFAULT_SEPARATOR)?);
    let here = series
        .range(RangeQuery::default().locations("here"))
        .await?;
    println!("{}", render(&here, OutputFormat::Long, DEFAULT_SEPARATOR)?);
    let unknown = series.range(RangeQuery::default().locations("asbasdf")).await?;
    println!("Values at unknown location: {}", unknown.len());

    for query in [
        LatestQuery::default(),
        LatestQuery::default().locations("there"),
        LatestQuery::default().parameters("bbb"),
        LatestQuery::default().locations("asbasdf"),
    ] {
        let rows = series.latest(query).await?;
        println!("{}", render(&rows, OutputFormat::Long, DEFAULT_SEPARATOR)?);
    }
    Ok(series)
}

fn name_filter(names: &[String]) -> NameFilter {
    if names.is_empty() {
        NameFilter::All
    } else {
        NameFilter::many(names.iter().cloned())
    }
}

fn parse_scalar(kind: ValueKind, raw: &str) -> Result<Scalar> {
    match kind {
        ValueKind::Integer => raw
            .parse::<i64>()
            .map(Scalar::Integer)
            .map_err(|err| anyhow!("'{raw}' is not an integer: {err}")),
        ValueKind::Float => raw
            .parse::<f64>()
            .map(Scalar::Float)
            .map_err(|err| anyhow!("'{raw}' is not a number: {err}")),
        ValueKind::Text => Ok(Scalar::Text(raw.to_string())),
    }
}

fn render(rows: &[ValueRow], format: OutputFormat, separator: &str) -> Result<String> {
    let json = match format {
        OutputFormat::Long => serde_json::to_string_pretty(rows)?,
        OutputFormat::Table => serde_json::to_string_pretty(&to_wide_table(rows, separator))?,
        OutputFormat::Columns => serde_json::to_string_pretty(&to_columns(rows, separator))?,
        OutputFormat::PerLocation => serde_json::to_string_pretty(&partition_by_location(rows))?,
        OutputFormat::TablesPerLocation => {
            serde_json::to_string_pretty(&tables_per_location(rows))?
        }
    };
    Ok(json)
}
