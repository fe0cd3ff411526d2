use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tracing::warn;

use super::table::RawRow;
use crate::error::LandingError;

static DATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\d{2}\.\d{2}\.\d{4}$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LandingRecord {
    pub name: String,
    /// Distinct country names, first-seen order.
    pub countries: Vec<String>,
    pub location: String,
    pub landing_date: NaiveDate,
}

/// What to do with a row whose fields cannot be normalized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RowPolicy {
    /// First bad row aborts the run.
    #[default]
    Strict,
    /// Bad rows are logged and dropped.
    Lenient,
}

/// Parse a `DD.MM.YYYY` date. Nothing else is accepted.
pub fn parse_date(text: &str) -> Result<NaiveDate, LandingError> {
    if !DATE_RE.is_match(text) {
        return Err(LandingError::BadDate(text.to_string()));
    }
    NaiveDate::parse_from_str(text, "%d.%m.%Y").map_err(|_| LandingError::BadDate(text.to_string()))
}

pub fn normalize(row: &RawRow) -> Result<LandingRecord, LandingError> {
    let landing_date = parse_date(&row.date_text)?;

    let mut countries: Vec<String> = Vec::with_capacity(row.country_links.len());
    for c in &row.country_links {
        if !countries.contains(c) {
            countries.push(c.clone());
        }
    }

    Ok(LandingRecord {
        name: row.name.clone(),
        countries,
        location: row.location.clone(),
        landing_date,
    })
}

pub fn normalize_all(rows: &[RawRow], policy: RowPolicy) -> Result<Vec<LandingRecord>, LandingError> {
    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        match normalize(row) {
            Ok(rec) => {
                if rec.countries.is_empty() {
                    warn!("{:?} has no linked countries", rec.name);
                }
                records.push(rec);
            }
            Err(e) if policy == RowPolicy::Lenient => {
                warn!("Skipping row {} ({:?}): {}", row.row, row.name, e);
            }
            Err(e) => {
                return Err(LandingError::BadRow {
                    row: row.row,
                    name: row.name.clone(),
                    source: Box::new(e),
                });
            }
        }
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(name: &str, countries: &[&str], date: &str) -> RawRow {
        RawRow {
            row: 1,
            name: name.to_string(),
            country_links: countries.iter().map(|c| c.to_string()).collect(),
            location: "Mare Tranquillitatis".to_string(),
            date_text: date.to_string(),
        }
    }

    #[test]
    fn apollo_11_date() {
        assert_eq!(parse_date("20.07.1969").unwrap(), NaiveDate::from_ymd_opt(1969, 7, 20).unwrap());
    }

    #[test]
    fn iso_date_rejected() {
        assert!(matches!(parse_date("1969-07-20"), Err(LandingError::BadDate(s)) if s == "1969-07-20"));
    }

    #[test]
    fn other_formats_rejected() {
        for bad in ["", "2.7.1969", "20.7.1969", "20.07.69", "20/07/1969", "20 июля 1969", "20.07.1969[1]", " 20.07.1969"] {
            assert!(parse_date(bad).is_err(), "accepted {:?}", bad);
        }
    }

    #[test]
    fn impossible_dates_rejected() {
        assert!(parse_date("31.02.1970").is_err());
        assert!(parse_date("00.01.1970").is_err());
        assert!(parse_date("01.13.1970").is_err());
    }

    #[test]
    fn leap_day() {
        assert_eq!(parse_date("29.02.2024").unwrap(), NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
    }

    #[test]
    fn fields_carried_over() {
        let rec = normalize(&row("Apollo 11", &["USA"], "20.07.1969")).unwrap();
        assert_eq!(rec.name, "Apollo 11");
        assert_eq!(rec.location, "Mare Tranquillitatis");
        assert_eq!(rec.countries, ["USA"]);
    }

    #[test]
    fn repeated_country_collapsed() {
        let rec = normalize(&row("X", &["USA", "USSR", "USA"], "01.01.1970")).unwrap();
        assert_eq!(rec.countries, ["USA", "USSR"]);
    }

    #[test]
    fn empty_countries_kept() {
        let recs = normalize_all(&[row("X", &[], "01.01.1970")], RowPolicy::Strict).unwrap();
        assert_eq!(recs.len(), 1);
        assert!(recs[0].countries.is_empty());
    }

    #[test]
    fn strict_aborts_on_bad_date() {
        // Page row 2 was a short layout row, so "B" is the third data row.
        let rows = [
            RawRow { row: 1, ..row("A", &["USA"], "20.07.1969") },
            RawRow { row: 3, ..row("B", &["USA"], "n/a") },
        ];
        let err = normalize_all(&rows, RowPolicy::Strict).unwrap_err();
        assert!(matches!(err, LandingError::BadRow { row: 3, ref name, .. } if name == "B"));
        assert_eq!(err.to_string(), "row 3 (\"B\") could not be normalized");
    }

    #[test]
    fn lenient_skips_bad_date() {
        let rows = [
            row("A", &["USA"], "20.07.1969"),
            row("B", &["USA"], "n/a"),
            row("C", &["USSR"], "03.02.1966"),
        ];
        let recs = normalize_all(&rows, RowPolicy::Lenient).unwrap();
        let names: Vec<&str> = recs.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, ["A", "C"]);
    }
}
