use std::io::{self, Write};

use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;

pub const DEFAULT_TOP: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryCount {
    pub country: String,
    pub landings: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountryLanding {
    pub country: String,
    pub landing: String,
    pub location: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub location: String,
    pub landings: u32,
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub top: usize,
    pub top_countries: Vec<CountryCount>,
    pub by_country: Vec<CountryLanding>,
    pub by_location: Vec<LocationCount>,
}

// ── Queries ──

/// Countries ranked by number of landings. Ties go to the alphabetically first name.
pub fn top_countries(conn: &Connection, n: usize) -> Result<Vec<CountryCount>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, COUNT(DISTINCT cl.landing_id) AS landing_count
         FROM countries c
         JOIN country_landings cl ON cl.country_id = c.id
         GROUP BY c.name
         ORDER BY landing_count DESC, c.name ASC
         LIMIT ?1",
    )?;
    let rows = stmt
        .query_map([n as i64], |row| {
            Ok(CountryCount {
                country: row.get(0)?,
                landings: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn landings_by_country(conn: &Connection) -> Result<Vec<CountryLanding>> {
    let mut stmt = conn.prepare(
        "SELECT c.name, ml.name, ml.location, ml.landing_date
         FROM countries c
         JOIN country_landings cl ON cl.country_id = c.id
         JOIN moon_landings ml ON ml.id = cl.landing_id
         ORDER BY c.name ASC, ml.landing_date ASC, ml.id ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(CountryLanding {
                country: row.get(0)?,
                landing: row.get(1)?,
                location: row.get(2)?,
                date: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn landings_by_location(conn: &Connection) -> Result<Vec<LocationCount>> {
    let mut stmt = conn.prepare(
        "SELECT location, COUNT(id) AS landing_count
         FROM moon_landings
         GROUP BY location
         ORDER BY landing_count DESC, location ASC",
    )?;
    let rows = stmt
        .query_map([], |row| {
            Ok(LocationCount {
                location: row.get(0)?,
                landings: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn build_report(conn: &Connection, top: usize) -> Result<Report> {
    Ok(Report {
        top,
        top_countries: top_countries(conn, top)?,
        by_country: landings_by_country(conn)?,
        by_location: landings_by_location(conn)?,
    })
}

// ── Rendering ──

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum Lang {
    #[default]
    Ru,
    En,
}

impl Lang {
    fn top_title(self, n: usize) -> String {
        match self {
            Lang::Ru => format!("Топ {} стран по числу прилунений:", n),
            Lang::En => format!("Top {} countries by number of moon landings:", n),
        }
    }

    fn by_country_title(self) -> &'static str {
        match self {
            Lang::Ru => "Прилунения с группировкой по странам:",
            Lang::En => "Moon landings grouped by country:",
        }
    }

    fn by_location_title(self) -> &'static str {
        match self {
            Lang::Ru => "Прилунения с группировкой по местам:",
            Lang::En => "Moon landings grouped by location:",
        }
    }

    fn landings_unit(self) -> &'static str {
        match self {
            Lang::Ru => "прилунений",
            Lang::En => "landings",
        }
    }

    fn detail_line(self, r: &CountryLanding) -> String {
        match self {
            Lang::Ru => format!(
                "Страна: {}, Название прилунения: {}, Место: {}, Дата: {}",
                r.country, r.landing, r.location, r.date
            ),
            Lang::En => format!(
                "Country: {}, Landing: {}, Location: {}, Date: {}",
                r.country, r.landing, r.location, r.date
            ),
        }
    }
}

pub fn render_text<W: Write>(report: &Report, lang: Lang, out: &mut W) -> io::Result<()> {
    let unit = lang.landings_unit();

    writeln!(out, "{}", lang.top_title(report.top))?;
    for (i, c) in report.top_countries.iter().enumerate() {
        writeln!(out, "{}. {}: {} {}", i + 1, c.country, c.landings, unit)?;
    }

    writeln!(out, "\n{}", lang.by_country_title())?;
    for r in &report.by_country {
        writeln!(out, "{}", lang.detail_line(r))?;
    }

    writeln!(out, "\n{}", lang.by_location_title())?;
    for (i, l) in report.by_location.iter().enumerate() {
        writeln!(out, "{}. {}: {} {}", i + 1, l.location, l.landings, unit)?;
    }
    Ok(())
}

pub fn render_json<W: Write>(report: &Report, out: &mut W) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, report)?;
    writeln!(out)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::{record, store_with};
    use crate::db::CountryMode;

    fn abc_store(mode: CountryMode) -> Connection {
        // B is inserted before A so the tiebreak, not insertion order, decides.
        store_with(
            &[
                record("b1", &["B"], "Mare Imbrium", (1970, 1, 1)),
                record("a1", &["A"], "Mare Imbrium", (1970, 2, 1)),
                record("ab", &["A", "B"], "Mare Nubium", (1971, 1, 1)),
                record("abc", &["A", "B", "C"], "Oceanus Procellarum", (1972, 1, 1)),
            ],
            mode,
        )
    }

    #[test]
    fn top_countries_ranked() {
        for mode in [CountryMode::PerOccurrence, CountryMode::Unique] {
            let top = top_countries(&abc_store(mode), 5).unwrap();
            let got: Vec<(&str, u32)> = top.iter().map(|c| (c.country.as_str(), c.landings)).collect();
            assert_eq!(got, [("A", 3), ("B", 3), ("C", 1)], "{:?}", mode);
        }
    }

    #[test]
    fn top_countries_limited() {
        let top = top_countries(&abc_store(CountryMode::PerOccurrence), 2).unwrap();
        assert_eq!(top.len(), 2);
        assert!(top.iter().all(|c| c.country != "C"));
    }

    #[test]
    fn by_country_sorted_by_name() {
        let rows = landings_by_country(&abc_store(CountryMode::PerOccurrence)).unwrap();
        assert_eq!(rows.len(), 7);
        let countries: Vec<&str> = rows.iter().map(|r| r.country.as_str()).collect();
        assert_eq!(countries, ["A", "A", "A", "B", "B", "B", "C"]);
        assert_eq!(rows[0].landing, "a1");
        assert_eq!(rows[0].location, "Mare Imbrium");
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(1970, 2, 1).unwrap());
    }

    #[test]
    fn by_location_counts() {
        let rows = landings_by_location(&abc_store(CountryMode::PerOccurrence)).unwrap();
        let got: Vec<(&str, u32)> = rows.iter().map(|l| (l.location.as_str(), l.landings)).collect();
        assert_eq!(
            got,
            [("Mare Imbrium", 2), ("Mare Nubium", 1), ("Oceanus Procellarum", 1)]
        );
    }

    #[test]
    fn empty_store_reports_nothing() {
        let report = build_report(&store_with(&[], CountryMode::PerOccurrence), 5).unwrap();
        assert!(report.top_countries.is_empty());
        assert!(report.by_country.is_empty());
        assert!(report.by_location.is_empty());
    }

    #[test]
    fn russian_text() {
        let conn = store_with(
            &[record("Аполлон-11", &["США"], "Море Спокойствия", (1969, 7, 20))],
            CountryMode::PerOccurrence,
        );
        let report = build_report(&conn, 5).unwrap();
        let mut out = Vec::new();
        render_text(&report, Lang::Ru, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "Топ 5 стран по числу прилунений:\n\
             1. США: 1 прилунений\n\
             \n\
             Прилунения с группировкой по странам:\n\
             Страна: США, Название прилунения: Аполлон-11, Место: Море Спокойствия, Дата: 1969-07-20\n\
             \n\
             Прилунения с группировкой по местам:\n\
             1. Море Спокойствия: 1 прилунений\n"
        );
    }

    #[test]
    fn english_text_sections_in_order() {
        let report = build_report(&abc_store(CountryMode::Unique), 3).unwrap();
        let mut out = Vec::new();
        render_text(&report, Lang::En, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        let top = text.find("Top 3 countries").unwrap();
        let by_country = text.find("grouped by country").unwrap();
        let by_location = text.find("grouped by location").unwrap();
        assert!(top < by_country && by_country < by_location);
        assert!(text.contains("1. A: 3 landings"));
        assert!(text.contains("Country: C, Landing: abc, Location: Oceanus Procellarum, Date: 1972-01-01"));
    }

    #[test]
    fn json_output() {
        let report = build_report(&abc_store(CountryMode::PerOccurrence), 1).unwrap();
        let mut out = Vec::new();
        render_json(&report, &mut out).unwrap();
        let v: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(v["top"], 1);
        assert_eq!(v["top_countries"][0]["country"], "A");
        assert_eq!(v["top_countries"][0]["landings"], 3);
        assert_eq!(v["by_country"].as_array().unwrap().len(), 7);
        assert_eq!(v["by_location"][0]["location"], "Mare Imbrium");
        assert_eq!(v["by_country"][0]["date"], "1970-02-01");
    }
}
