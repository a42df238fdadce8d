use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use dealboard::config::DashboardConfig;
use dealboard::dashboard::{Dashboard, HistoryRequest, Palette};
use dealboard::deal::columns;
use dealboard::filter::{DealFilter, default_reporting_date, reporting_date_bounds};
use dealboard::input::{load_deals, parse_date};
use dealboard::output::print_sections;

#[derive(Parser)]
#[command(name = "dealboard", about = "Deal analytics tables for the dashboard")]
struct Cli {
    /// JSON configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// deal file, overrides the configured one
    #[arg(long)]
    data: Option<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,

    #[command(subcommand)]
    page: Page,
}

#[derive(Args)]
struct FilterArgs {
    /// reporting date (YYYY-MM-DD), defaults to the date of the first deal
    #[arg(long, global = true, value_parser = date_arg)]
    reporting_date: Option<NaiveDate>,

    /// look at every reporting date instead of a single one
    #[arg(long, global = true, conflicts_with = "reporting_date")]
    all_dates: bool,

    #[arg(long, global = true)]
    business_line: Vec<String>,

    #[arg(long, global = true)]
    product_line: Vec<String>,

    #[arg(long = "product", global = true)]
    product_name: Vec<String>,

    #[arg(long, global = true)]
    currency: Vec<String>,
}

#[derive(Subcommand)]
enum Page {
    /// KPI cards and the overview charts
    Overview,
    /// investor league table
    League {
        #[arg(long, default_value = columns::GROSS_MARGIN)]
        metric: String,
        /// number of investors, the configured league size when omitted
        #[arg(long)]
        count: Option<usize>,
    },
    /// metric distribution along one dimension
    Ventilation {
        #[arg(long, default_value = columns::CURRENCY)]
        by: String,
        #[arg(long, default_value = columns::PRODUCT_VOLUME)]
        metric: String,
    },
    /// daily trend lines
    Historical {
        #[arg(long = "metric", required = true)]
        metrics: Vec<String>,
        #[arg(long, value_parser = date_arg, requires = "to")]
        from: Option<NaiveDate>,
        #[arg(long, value_parser = date_arg, requires = "from")]
        to: Option<NaiveDate>,
    },
}

fn date_arg(raw: &str) -> Result<NaiveDate, String> {
    parse_date(raw).ok_or_else(|| format!("'{raw}' is not a date"))
}

/// An empty multi-select means "all", so it becomes no criterion at all
fn selection(values: &[String]) -> Option<BTreeSet<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().cloned().collect())
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => DashboardConfig::load(path)
            .with_context(|| format!("reading configuration {}", path.display()))?,
        None => DashboardConfig::default(),
    };
    if let Some(data) = cli.data {
        config.data_path = data;
    }

    let deals = load_deals(&config.data_path, config.delimiter_byte()?, config.strict)
        .with_context(|| format!("loading deals from {}", config.data_path.display()))?;
    if let Some((first, last)) = reporting_date_bounds(&deals) {
        log::info!("reporting dates from {first} to {last}");
    }

    let args = &cli.filter;
    let reporting_date = match (args.reporting_date, args.all_dates) {
        (_, true) => None,
        (Some(date), false) => Some(date),
        (None, false) => default_reporting_date(&deals),
    };
    let filter = DealFilter {
        reporting_date,
        business_lines: selection(&args.business_line),
        product_lines: selection(&args.product_line),
        product_names: selection(&args.product_name),
        currencies: selection(&args.currency),
    };

    let lookup = config.country_lookup();
    let palette = Palette::new(config.palette.clone())?;
    let dashboard = Dashboard::new(&deals, &lookup, palette);

    match cli.page {
        Page::Overview => print_sections(&dashboard.overview(&filter)?)?,
        Page::League { metric, count } => {
            let count = count.unwrap_or(config.league_size);
            print_sections(&dashboard.league(&filter, &metric, count)?)?
        }
        Page::Ventilation { by, metric } => {
            print_sections(&dashboard.ventilation(&filter, &by, &metric)?)?
        }
        Page::Historical { metrics, from, to } => {
            let window = match (from, to) {
                (Some(from), Some(to)) if from > to => bail!("--from {from} is after --to {to}"),
                (Some(from), Some(to)) => Some((from, to)),
                _ => None,
            };
            let request = HistoryRequest {
                metrics,
                window,
                business_lines: None,
            };
            print_sections(&dashboard.historical(&filter, &request)?)?
        }
    }
    Ok(())
}
