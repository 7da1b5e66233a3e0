// src/bin/portal.rs

use anyhow::{bail, Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use dealerdesk::{
    export::{write_export, EXPORT_FILE_NAME},
    fetch::{proxy::load_records, sheets::rows_from_values},
    pager::{self, Page},
    portal::{Action, Outcome, PortalState},
    records::{normalize_rows, Field, Record},
    search::{quick::QuickFilter, DateRange, FilterSpec},
};
use reqwest::Client;
use serde_json::Value;
use std::{
    num::NonZeroUsize,
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{info, Level};
use tracing_subscriber::{fmt, EnvFilter};
use url::Url;

/// Search the dealership order sheet from a terminal.
#[derive(Parser, Debug)]
#[command(about = "Search, page and export dealership vehicle-order records.")]
struct Args {
    /// Sheet-data endpoint of the proxy service.
    #[arg(
        long,
        value_name = "URL",
        default_value = "http://127.0.0.1:8080/api/sheet-data"
    )]
    endpoint: Url,

    /// Read raw sheet rows from a file instead (a Sheets `values` response,
    /// or a bare array of rows). Takes precedence over `--endpoint`.
    #[arg(long, value_name = "PATH")]
    rows: Option<PathBuf>,

    /// Free text matched against name, mobile, model, invoice, vehicle ID and customer ID.
    #[arg(short, long, default_value = "")]
    query: String,

    #[arg(long, default_value = "")]
    color: String,

    #[arg(long, default_value = "")]
    interior: String,

    #[arg(long, default_value = "")]
    model_line: String,

    #[arg(long, default_value = "")]
    transmission: String,

    #[arg(long, default_value = "")]
    fuel: String,

    #[arg(long, default_value = "")]
    channel: String,

    /// Substring of the main outlet name.
    #[arg(long, default_value = "")]
    outlet: String,

    #[arg(long, default_value = "")]
    finance: String,

    #[arg(long, default_value = "")]
    status: String,

    /// Order date lower bound (YYYY-MM-DD). Needs `--to` as well.
    #[arg(long, value_name = "DATE")]
    from: Option<NaiveDate>,

    /// Order date upper bound (YYYY-MM-DD). Needs `--from` as well.
    #[arg(long, value_name = "DATE")]
    to: Option<NaiveDate>,

    /// Quick filter presets, applied in order (repeatable):
    /// today-deliveries, pending-applications, electric-vehicles, walk-in-customers.
    #[arg(long, value_name = "PRESET")]
    quick: Vec<QuickFilter>,

    /// Results per page (the portal offers 10, 25 and 50).
    #[arg(long, default_value_t = pager::default_page_size())]
    page_size: NonZeroUsize,

    /// Page to show; out-of-range values are clamped.
    #[arg(long, default_value_t = 1)]
    page: usize,

    /// Write all matching records as CSV. A directory gets the default file name.
    #[arg(long, value_name = "PATH")]
    export: Option<PathBuf>,
}

impl Args {
    fn filters(&self) -> FilterSpec {
        FilterSpec {
            query: self.query.trim().to_string(),
            vehicle_color: self.color.clone(),
            interior_color: self.interior.clone(),
            model_line: self.model_line.clone(),
            transmission: self.transmission.clone(),
            fuel_type: self.fuel.clone(),
            channel: self.channel.clone(),
            main_outlet: self.outlet.clone(),
            finance_mode: self.finance.clone(),
            application_status: self.status.clone(),
            date_range: DateRange {
                start: self.from,
                end: self.to,
            },
        }
    }
}

fn read_rows_file(path: &Path) -> Result<Vec<Record>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading rows from {}", path.display()))?;
    let values = match serde_json::from_str::<Value>(&text)
        .with_context(|| format!("parsing rows in {}", path.display()))?
    {
        Value::Object(mut range) => match range.remove("values") {
            Some(values) => values,
            None => Value::Array(Vec::new()),
        },
        other => other,
    };
    let cells: Vec<Vec<Value>> = serde_json::from_value(values)
        .with_context(|| format!("{} is not an array of rows", path.display()))?;
    Ok(normalize_rows(rows_from_values(cells)))
}

fn show(record: &Record, field: Field) -> &str {
    record.get(field).unwrap_or("-")
}

fn lakhs(record: &Record) -> String {
    match record.total_value() {
        Some(v) => format!("₹{:.2}L", v / 100_000.0),
        None => "-".to_string(),
    }
}

fn print_card(position: usize, r: &Record) {
    println!(
        "{position:>4}. {} (ID: {})  {}  [{}]",
        show(r, Field::CustomerName),
        show(r, Field::CustomerId),
        show(r, Field::Mobile),
        show(r, Field::ApplicationStatus),
    );
    println!(
        "      {} {} | {} | {} | {} / {} | {}",
        show(r, Field::ModelText),
        r.get(Field::ModelSeries).unwrap_or_default(),
        show(r, Field::FuelType),
        show(r, Field::Transmission),
        show(r, Field::Color),
        show(r, Field::InteriorColor),
        show(r, Field::ModelLine),
    );
    println!(
        "      Order {}  Value {}  Channel {}  Finance {}",
        show(r, Field::DocumentDate),
        lakhs(r),
        show(r, Field::Channel),
        show(r, Field::FinanceMode),
    );
    println!(
        "      {} · {} · {}  Invoice {}  VIN {}",
        show(r, Field::EmployeeName),
        show(r, Field::BranchName),
        show(r, Field::MainOutlet),
        show(r, Field::InvoiceNumber),
        show(r, Field::VehicleId),
    );
}

fn page_strip(state: &PortalState) -> String {
    let nav = state.navigation();
    let mut strip = Vec::new();
    if nav.has_prev() {
        strip.push("‹ prev".to_string());
    }
    for n in nav.window() {
        strip.push(if n == nav.page() {
            format!("[{n}]")
        } else {
            n.to_string()
        });
    }
    if nav.has_next() {
        strip.push("next ›".to_string());
    }
    strip.join(" ")
}

fn print_page(state: &PortalState, page: &Page<'_>) {
    if let Some((first, last)) = page.range() {
        println!(
            "{} records found. Showing {first}-{last} of {}.",
            page.total_items, page.total_items
        );
    }
    println!();
    for (i, record) in page.items.iter().enumerate() {
        print_card(page.range().map_or(0, |(first, _)| first) + i, record);
    }
    println!();
    println!(
        "Page {} of {}   {}",
        page.number,
        page.total_pages,
        page_strip(state)
    );
}

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) init logging ─────────────────────────────────────────────
    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "warn".to_string());
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(log_level.parse().unwrap_or(Level::WARN.into())),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // ─── 2) load once ────────────────────────────────────────────────
    let mut state = PortalState::new();
    let loaded = match &args.rows {
        Some(path) => read_rows_file(path),
        None => load_records(&Client::new(), &args.endpoint)
            .await
            .map_err(anyhow::Error::from),
    };
    state = match loaded {
        Ok(records) => state.apply(Action::Loaded(Arc::from(records))),
        Err(e) => state.apply(Action::LoadFailed(format!("{e:#}"))),
    };

    // ─── 3) search ───────────────────────────────────────────────────
    state = state.apply(Action::Search(args.filters()));
    let today = Local::now().date_naive();
    for filter in &args.quick {
        info!(preset = filter.label(), "applying quick filter");
        state = state.apply(Action::QuickFilter {
            filter: *filter,
            today,
        });
    }
    if args.page_size != state.page_size() {
        state = state.apply(Action::SetPageSize(args.page_size));
    }
    state = state.apply(Action::GoToPage(args.page));

    // ─── 4) render ───────────────────────────────────────────────────
    match state.outcome() {
        Outcome::LoadFailed(reason) => bail!("could not load records: {reason}"),
        Outcome::Loading | Outcome::NotSearched => {}
        Outcome::NoData => println!("The sheet has no data rows."),
        Outcome::NoMatches => println!(
            "No records match your search criteria. Try adjusting your filters or search terms."
        ),
        Outcome::Matches(_) => print_page(&state, &state.current_page()?),
    }

    // ─── 5) export ───────────────────────────────────────────────────
    if let Some(path) = &args.export {
        let path = if path.is_dir() {
            path.join(EXPORT_FILE_NAME)
        } else {
            path.clone()
        };
        write_export(&path, state.results())?;
        println!("Exported {} records to {}", state.results().len(), path.display());
    }

    Ok(())
}
