pub mod normalize;
pub mod table;

use tracing::info;

use crate::error::LandingError;
use normalize::{LandingRecord, RowPolicy};

/// Two-pass pipeline: html → raw rows → landing records.
pub fn parse_landings(html: &str, policy: RowPolicy) -> Result<Vec<LandingRecord>, LandingError> {
    let report = table::extract_rows(html)?;
    info!(
        "Extracted {} rows ({} short rows skipped)",
        report.rows.len(),
        report.skipped_short
    );
    normalize::normalize_all(&report.rows, policy)
}
