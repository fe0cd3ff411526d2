use thiserror::Error;

#[derive(Debug, Error)]
pub enum LandingError {
    #[error("fetch of {url} did not return HTTP 200")]
    FetchFailed { url: String },

    #[error("no <table class=\"wikitable\"> found in page")]
    TableNotFound,

    #[error("landing date {0:?} is not in DD.MM.YYYY format")]
    BadDate(String),

    /// A row that passed the cell-count filter but could not be normalized.
    /// `row` counts data rows on the page from 1, header excluded.
    #[error("row {row} ({name:?}) could not be normalized")]
    BadRow {
        row: usize,
        name: String,
        #[source]
        source: Box<LandingError>,
    },
}
