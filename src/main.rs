mod db;
mod error;
mod fetch;
mod parser;
mod report;

use std::io::Write;
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use rusqlite::Connection;
use tracing::info;

use db::{CountryMode, SaveStats};
use parser::normalize::RowPolicy;
use report::Lang;

#[derive(Parser)]
#[command(
    name = "lunar_landings",
    about = "Scrape the list of moon landings into SQLite and print summary reports"
)]
struct Cli {
    /// Page holding the landings table
    #[arg(long, default_value = fetch::LANDINGS_URL)]
    url: String,
    /// Read the page from a local HTML file instead of fetching it
    #[arg(long, conflicts_with = "url")]
    input: Option<PathBuf>,
    /// SQLite database file (rebuilt on every run)
    #[arg(long, default_value = db::DEFAULT_DB_PATH)]
    db: PathBuf,
    /// Number of countries in the top list
    #[arg(short = 'n', long, default_value_t = report::DEFAULT_TOP)]
    top: usize,
    /// Report language
    #[arg(long, value_enum, default_value_t = Lang::Ru)]
    lang: Lang,
    /// Report format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,
    /// Store each country once and reuse it across landings
    #[arg(long)]
    dedup_countries: bool,
    /// Log and skip rows with an unparseable date instead of aborting
    #[arg(long)]
    skip_bad_rows: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Format {
    Text,
    Json,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let t0 = Instant::now();
    let cli = Cli::parse();

    let conn = db::connect(&cli.db)?;
    db::reset_schema(&conn)?;
    info!("Database: {:?}", cli.db);

    let html = match &cli.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?,
        None => {
            let client = fetch::client()?;
            let page = fetch::fetch_page(&client, &cli.url).await?;
            fetch::require_page(&cli.url, page)?
        }
    };

    let policy = if cli.skip_bad_rows {
        RowPolicy::Lenient
    } else {
        RowPolicy::Strict
    };
    let mode = if cli.dedup_countries {
        CountryMode::Unique
    } else {
        CountryMode::PerOccurrence
    };
    ingest(&conn, &html, policy, mode)?;
    let counts = db::table_counts(&conn)?;
    info!(
        "Store holds {} landings, {} countries, {} associations",
        counts.landings, counts.countries, counts.associations
    );

    let report = report::build_report(&conn, cli.top)?;
    let mut out = std::io::stdout().lock();
    match cli.format {
        Format::Text => report::render_text(&report, cli.lang, &mut out)?,
        Format::Json => report::render_json(&report, &mut out)?,
    }
    out.flush()?;

    info!("Done in {}", format_duration(t0.elapsed()));
    Ok(())
}

/// Parse `html` and save its landings into an already reset store.
fn ingest(conn: &Connection, html: &str, policy: RowPolicy, mode: CountryMode) -> Result<SaveStats> {
    let records = parser::parse_landings(html, policy)?;

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} landings")?
            .progress_chars("=> "),
    );
    let stats = db::save_landings(conn, &records, mode, &pb)?;
    pb.finish_and_clear();
    Ok(stats)
}

fn format_duration(d: std::time::Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else {
        format!("{}m {}s", secs / 60, secs % 60)
    }
}
