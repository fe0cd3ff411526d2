use std::sync::LazyLock;

use scraper::{ElementRef, Html, Selector};
use tracing::debug;

use crate::error::LandingError;

static TABLE_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("table.wikitable").unwrap());
static ROW_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("tr").unwrap());
static CELL_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("td").unwrap());
static LINK_SEL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("a").unwrap());

/// Rows with fewer data cells than this are layout rows (year separators,
/// partial entries) and are dropped.
pub const MIN_CELLS: usize = 5;

/// One table row as it appears on the page, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRow {
    /// 1-based position among the data rows of the table, short rows included.
    pub row: usize,
    pub name: String,
    pub country_links: Vec<String>,
    pub location: String,
    pub date_text: String,
}

#[derive(Debug, Default)]
pub struct ExtractReport {
    pub rows: Vec<RawRow>,
    pub skipped_short: usize,
}

/// Pull landing rows out of the first `wikitable` in `html`.
///
/// The first `<tr>` is treated as the header. Column layout:
/// 0 name, 1 countries (one `<a>` each), 2 location, 3 date; the rest is ignored.
pub fn extract_rows(html: &str) -> Result<ExtractReport, LandingError> {
    let doc = Html::parse_document(html);
    let table = doc.select(&TABLE_SEL).next().ok_or(LandingError::TableNotFound)?;

    let mut report = ExtractReport::default();
    for (i, tr) in table.select(&ROW_SEL).skip(1).enumerate() {
        let row = i + 1;
        let cells: Vec<ElementRef> = tr.select(&CELL_SEL).collect();
        if cells.len() < MIN_CELLS {
            debug!("Skipping row {} with {} cells", row, cells.len());
            report.skipped_short += 1;
            continue;
        }

        report.rows.push(RawRow {
            row,
            name: cell_text(&cells[0]),
            country_links: link_texts(&cells[1]),
            location: cell_text(&cells[2]),
            date_text: cell_text(&cells[3]),
        });
    }

    Ok(report)
}

fn cell_text(cell: &ElementRef) -> String {
    cell.text().collect::<String>().trim().to_string()
}

// Flag icons are links too, but carry only an <img>; their text is empty.
fn link_texts(cell: &ElementRef) -> Vec<String> {
    cell.select(&LINK_SEL)
        .map(|a| cell_text(&a))
        .filter(|t| !t.is_empty())
        .collect()
}
