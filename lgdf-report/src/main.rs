use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use lgdf_core::DashboardConfig;
use lgdf_core::aggregation::SnapshotSort;
use lgdf_data::{
    BaseSeriesRow, BaseSnapshotRow, DatasetCache, DatasetLoader, ExportRow, ModeledRow, RankingRow,
    RateComparisonExportRow, export_to_path, to_rows,
};
use lgdf_report::format::{format_amount, format_count, format_rate, parse_decimal};
use lgdf_report::tables::{
    ModeledTableRow, RankingTableRow, RateComparisonTableRow, SeriesTableRow, SnapshotTableRow,
    impact_rows, render, summary_rows,
};
use lgdf_report::logging::{self, LogOptions};
use lgdf_report::{Dashboard, SessionState};

const DEFAULT_DATA_PATH: &str = "il_income_tax_INC_only_fy2012_2025.csv";

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Illinois municipal income-tax (LGDF) disbursement report.
///
/// Loads the disbursement CSV, applies the configured rate table and prints
/// the requested view. Every view can also be written as CSV.
#[derive(Debug, Parser)]
#[command(name = "lgdf-report", version, about, long_about = None)]
struct Cli {
    /// Disbursement CSV with fy, fy_total, local_government and tax columns.
    #[arg(long, global = true, default_value = DEFAULT_DATA_PATH)]
    data: PathBuf,

    /// TOML configuration. The bundled Illinois reference is used when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Tax category to keep, overriding the configuration (e.g. `INC`).
    #[arg(long, global = true)]
    category: Option<String>,

    /// Log filter: a level ("debug") or any EnvFilter directive.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Also append log output to this file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    /// Silence console log output.
    #[arg(short, long, global = true, default_value_t = false)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Args)]
struct RangeArgs {
    /// First fiscal year (defaults to the earliest in the dataset).
    #[arg(long)]
    from: Option<i32>,

    /// Last fiscal year (defaults to the latest in the dataset).
    #[arg(long)]
    to: Option<i32>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Dataset facts, load counts and rate coverage.
    Summary,

    /// Yearly totals for one municipality (or `all`).
    Chart {
        /// Municipality name, or `all` for the per-year roll-up.
        #[arg(short, long)]
        municipality: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Write the chart data as CSV.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// One fiscal year across municipalities.
    Table {
        /// Fiscal year (defaults to the latest in the dataset).
        #[arg(short, long)]
        year: Option<i32>,

        /// Keep municipalities whose name contains this text (any case).
        #[arg(short, long)]
        filter: Option<String>,

        /// Show modeled collection at this LGDF rate, in percent.
        #[arg(long, value_parser = parse_rate)]
        rate: Option<Decimal>,

        /// Sort column for the modeled table.
        #[arg(long, value_enum, default_value_t = SortArg::Actual)]
        sort: SortArg,

        /// Write the table as CSV.
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Modeled collection and forgone revenue for one municipality (or `all`).
    Model {
        /// Municipality name, or `all` for the per-year roll-up.
        #[arg(short, long)]
        municipality: Option<String>,

        #[command(flatten)]
        range: RangeArgs,

        /// Modeled LGDF rate in percent (defaults to the configured rate).
        #[arg(long, value_parser = parse_rate)]
        rate: Option<Decimal>,

        /// Write the modeled table as CSV.
        #[arg(long)]
        export: Option<PathBuf>,

        /// Write the rate comparison as CSV.
        #[arg(long)]
        comparison_export: Option<PathBuf>,
    },

    /// Municipalities ranked by forgone revenue.
    Top {
        #[command(flatten)]
        range: RangeArgs,

        /// Modeled LGDF rate in percent (defaults to the configured rate).
        #[arg(long, value_parser = parse_rate)]
        rate: Option<Decimal>,

        /// Number of municipalities to show (defaults to the first configured choice).
        #[arg(short = 'n', long)]
        count: Option<usize>,

        /// Write the ranking as CSV.
        #[arg(long)]
        export: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Actual,
    Forgone,
}

impl From<SortArg> for SnapshotSort {
    fn from(sort: SortArg) -> Self {
        match sort {
            SortArg::Actual => SnapshotSort::ActualTotal,
            SortArg::Forgone => SnapshotSort::ForgoneRevenue,
        }
    }
}

fn parse_rate(input: &str) -> Result<Decimal, String> {
    parse_decimal(input).map_err(|e| e.to_string())
}

// ─── setup ───────────────────────────────────────────────────────────────────

fn init_logging(cli: &Cli) -> Result<()> {
    logging::init_logging(&LogOptions {
        level: cli.log_level.as_deref(),
        quiet: cli.quiet,
        file: cli.log_file.as_deref(),
    })
}

fn load_config(cli: &Cli) -> Result<DashboardConfig> {
    let mut config = match &cli.config {
        Some(path) => DashboardConfig::from_path(path)
            .with_context(|| format!("Failed to load config: {}", path.display()))?,
        None => DashboardConfig::reference().context("Bundled reference config is invalid")?,
    };

    if let Some(category) = &cli.category {
        let category = category.trim().to_uppercase();
        if category.is_empty() {
            bail!("--category must not be blank");
        }
        config.tax_category = category;
    }

    debug!(tax_category = %config.tax_category, "configuration loaded");
    Ok(config)
}

fn open_dashboard(cli: &Cli) -> Result<Dashboard> {
    let config = load_config(cli)?;
    let cache = DatasetCache::new(DatasetLoader::new(&config.tax_category));

    let dataset = cache
        .get_or_load(&cli.data)
        .with_context(|| format!("Failed to load dataset: {}", cli.data.display()))?;

    info!(
        "Loaded {} rows | {} municipalities",
        format_count(dataset.len()),
        format_count(dataset.report().municipalities)
    );

    Dashboard::new(dataset, config).context("Failed to build dashboard")
}

fn apply_range(
    session: &mut SessionState,
    range: &RangeArgs,
) {
    let bounds = session.bounds();
    session.set_year_range(
        range.from.unwrap_or(bounds.min),
        range.to.unwrap_or(bounds.max),
    );
}

fn apply_rate(
    session: &mut SessionState,
    rate: Option<Decimal>,
) -> Result<()> {
    if let Some(rate) = rate {
        session.set_modeled_rate(rate)?;
    }
    Ok(())
}

fn export<T: ExportRow>(
    path: Option<&Path>,
    rows: &[T],
) -> Result<()> {
    if let Some(path) = path {
        export_to_path(path, rows)
            .with_context(|| format!("Failed to write export: {}", path.display()))?;
        println!("Wrote {} rows to {}", rows.len(), path.display());
    }
    Ok(())
}

// ─── commands ────────────────────────────────────────────────────────────────

fn run(cli: &Cli) -> Result<()> {
    let dashboard = open_dashboard(cli)?;
    let mut session = dashboard.new_session()?;

    match &cli.command {
        Command::Summary => {
            println!("{}", render(&summary_rows(&dashboard.summary())));
        }

        Command::Chart {
            municipality,
            range,
            export: path,
        } => {
            if let Some(name) = municipality {
                session.select_municipality(name)?;
            }
            apply_range(&mut session, range);

            let view = dashboard.chart(&session)?;
            println!(
                "{}: income tax totals, FY {}-{}",
                view.selection,
                view.years.start(),
                view.years.end()
            );
            println!("{}", render(&to_rows::<_, SeriesTableRow>(&view.table)));

            export(path.as_deref(), &to_rows::<_, BaseSeriesRow>(&view.chart))?;
        }

        Command::Table {
            year,
            filter,
            rate,
            sort,
            export: path,
        } => {
            if let Some(year) = year {
                session.set_fiscal_year(*year);
            }
            if let Some(filter) = filter {
                session.set_name_filter(filter);
            }
            session.set_sort((*sort).into());

            match rate {
                None => {
                    if *sort == SortArg::Forgone {
                        warn!("--sort forgone only applies with --rate; sorting by actual total");
                    }
                    let table = dashboard.fiscal_year_table(&session);
                    println!("FY {} income tax by municipality", table.fiscal_year);
                    println!("{}", render(&to_rows::<_, SnapshotTableRow>(&table.rows)));

                    export(path.as_deref(), &to_rows::<_, BaseSnapshotRow>(&table.rows))?;
                }
                Some(rate) => {
                    apply_rate(&mut session, Some(*rate))?;
                    let table = dashboard.modeled_fiscal_year_table(&session)?;
                    println!(
                        "FY {} modeled at {}",
                        table.fiscal_year,
                        format_rate(session.modeled_rate())
                    );
                    println!("{}", render(&to_rows::<_, ModeledTableRow>(&table.rows)));

                    export(path.as_deref(), &to_rows::<_, ModeledRow>(&table.rows))?;
                }
            }
        }

        Command::Model {
            municipality,
            range,
            rate,
            export: path,
            comparison_export,
        } => {
            if let Some(name) = municipality {
                session.select_municipality(name)?;
            }
            apply_range(&mut session, range);
            apply_rate(&mut session, *rate)?;

            let view = dashboard.model(&session)?;
            println!(
                "{}: modeled at {}, FY {}-{}",
                view.selection,
                format_rate(view.modeled_rate),
                view.years.start(),
                view.years.end()
            );
            println!("{}", render(&impact_rows(&view.impact)));
            println!("{}", render(&to_rows::<_, ModeledTableRow>(&view.table)));
            println!("{}", render(&to_rows::<_, RateComparisonTableRow>(&view.comparison)));

            export(path.as_deref(), &to_rows::<_, ModeledRow>(&view.table))?;
            export(
                comparison_export.as_deref(),
                &to_rows::<_, RateComparisonExportRow>(&view.comparison),
            )?;
        }

        Command::Top {
            range,
            rate,
            count,
            export: path,
        } => {
            apply_range(&mut session, range);
            apply_rate(&mut session, *rate)?;
            if let Some(count) = count {
                session.set_top_n(*count)?;
            }

            let ranking = dashboard.top(&session)?;
            let years = session.years();
            println!(
                "Top {} of {} municipalities by forgone revenue at {}, FY {}-{}",
                session.top_n(),
                ranking.municipalities_considered,
                format_rate(session.modeled_rate()),
                years.start(),
                years.end()
            );
            println!("{}", render(&to_rows::<_, RankingTableRow>(&ranking.rows)));
            println!(
                "All municipalities: actual {} | modeled {} | forgone {}",
                format_amount(ranking.grand_total_actual),
                format_amount(ranking.grand_total_modeled),
                format_amount(ranking.grand_total_forgone)
            );

            export(path.as_deref(), &to_rows::<_, RankingRow>(&ranking.rows))?;
        }
    }

    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli)?;

    let result = run(&cli);
    if let Err(error) = &result {
        tracing::error!(?error, "lgdf-report failed");
    }
    result
}
