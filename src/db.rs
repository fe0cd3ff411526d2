use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use rusqlite::Connection;
use tracing::info;

use crate::parser::normalize::LandingRecord;

pub const DEFAULT_DB_PATH: &str = "moon_landings.db";

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).with_context(|| format!("Failed to create {:?}", dir))?;
    }
    let conn = Connection::open(path).with_context(|| format!("Failed to open {:?}", path))?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

#[cfg(test)]
pub fn connect_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    conn.execute_batch("PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Drop and recreate all tables. Every run starts from an empty store.
pub fn reset_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        DROP TABLE IF EXISTS country_landings;
        DROP TABLE IF EXISTS countries;
        DROP TABLE IF EXISTS moon_landings;

        CREATE TABLE countries (
            id   INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL
        );

        CREATE TABLE moon_landings (
            id           INTEGER PRIMARY KEY AUTOINCREMENT,
            name         TEXT NOT NULL,
            location     TEXT NOT NULL,
            landing_date DATE NOT NULL
        );

        CREATE TABLE country_landings (
            country_id INTEGER REFERENCES countries(id),
            landing_id INTEGER REFERENCES moon_landings(id),
            PRIMARY KEY (country_id, landing_id)
        );
        ",
    )
    .context("Failed to reset schema")?;
    Ok(())
}

/// How country rows are created while saving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CountryMode {
    /// One `countries` row per (landing, country) occurrence.
    #[default]
    PerOccurrence,
    /// One `countries` row per distinct name, reused across landings.
    Unique,
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct SaveStats {
    pub landings: usize,
    pub countries: usize,
    pub associations: usize,
}

/// Insert all records in a single transaction. Nothing is committed on error.
pub fn save_landings(
    conn: &Connection,
    records: &[LandingRecord],
    mode: CountryMode,
    pb: &ProgressBar,
) -> Result<SaveStats> {
    let tx = conn.unchecked_transaction()?;
    let mut stats = SaveStats::default();
    {
        let mut landing_stmt = tx.prepare(
            "INSERT INTO moon_landings (name, location, landing_date) VALUES (?1, ?2, ?3)",
        )?;
        let mut country_stmt = tx.prepare("INSERT INTO countries (name) VALUES (?1)")?;
        let mut link_stmt =
            tx.prepare("INSERT INTO country_landings (country_id, landing_id) VALUES (?1, ?2)")?;

        let mut known: HashMap<&str, i64> = HashMap::new();

        for rec in records {
            let landing_id = landing_stmt
                .insert(rusqlite::params![rec.name, rec.location, rec.landing_date])
                .with_context(|| format!("Failed to insert landing {:?}", rec.name))?;
            stats.landings += 1;

            for country in &rec.countries {
                let country_id = match (mode, known.get(country.as_str())) {
                    (CountryMode::Unique, Some(&id)) => id,
                    _ => {
                        let id = country_stmt.insert(rusqlite::params![country])?;
                        known.insert(country.as_str(), id);
                        stats.countries += 1;
                        id
                    }
                };
                link_stmt.execute(rusqlite::params![country_id, landing_id])?;
                stats.associations += 1;
            }
            pb.inc(1);
        }
    }
    tx.commit()?;
    info!(
        "Saved {} landings, {} countries, {} associations",
        stats.landings, stats.countries, stats.associations
    );
    Ok(stats)
}

#[derive(Debug, PartialEq, Eq)]
pub struct TableCounts {
    pub countries: usize,
    pub landings: usize,
    pub associations: usize,
}

pub fn table_counts(conn: &Connection) -> Result<TableCounts> {
    let countries: usize = conn.query_row("SELECT COUNT(*) FROM countries", [], |r| r.get(0))?;
    let landings: usize = conn.query_row("SELECT COUNT(*) FROM moon_landings", [], |r| r.get(0))?;
    let associations: usize =
        conn.query_row("SELECT COUNT(*) FROM country_landings", [], |r| r.get(0))?;
    Ok(TableCounts {
        countries,
        landings,
        associations,
    })
}
