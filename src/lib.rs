//! Créditos - per-issuer credit totals from NF-e CSV exports
//!
//! Upload one or more NF-e exports (UTF-16, tab-separated) and get back a
//! dashboard: credit totals grouped by issuer, a top-10 ranking, credits
//! per month, a CNPJ lookup, and a pie chart per issuer comparing invoice
//! value with credits.
//!
//! # Overview
//!
//! There are two sides:
//!
//! 1. **Selection** ([`selection`]): choose files to send. Only `.csv`
//!    files are kept, the same file is never added twice, and folders are
//!    expanded when recursion is enabled. The selection is then posted to
//!    the server as a multipart form.
//!
//! 2. **Dashboard** ([`ledger`], [`report`], [`serve`]): the server decodes
//!    the uploads, groups the rows and renders the page. Each summary row
//!    gets a pie chart built by [`chart`].
//!
//! # Quick Start
//!
//! ```no_run
//! use creditos::selection::{Entry, HttpUploader, SelectionState};
//!
//! let mut selection = SelectionState::new();
//! let entry = Entry::from_path("exports/").unwrap();
//! selection.accept(vec![entry], true);
//!
//! let uploader = HttpUploader::new("http://127.0.0.1:5000").unwrap();
//! match selection.submit(&uploader) {
//!     Ok(page) => println!("{} bytes of HTML", page.len()),
//!     Err(e) => eprintln!("{}", e),
//! }
//! ```
//!
//! # Chart colors
//!
//! | Créditos | Slices |
//! |----------|--------|
//! | 0 | both red (warning) |
//! | > 0 | light blue Valor NF, green Créditos |
//!
//! # Modules
//!
//! - [`selection`]: file selection rules and submission
//! - [`chart`]: pie-chart configuration per summary item
//! - [`ledger`]: CSV decoding and aggregation
//! - [`report`]: HTML output
//! - [`serve`]: HTTP server
//! - [`locale`]: pt-BR number and month formatting

pub mod chart;
pub mod error;
pub mod ledger;
pub mod locale;
pub mod report;
pub mod selection;
pub mod serve;

pub use chart::{PieChart, SummaryItem};
pub use error::{Error, Result};
pub use ledger::{Dashboard, SummaryRow, UploadedFile};
pub use selection::{Entry, SelectionState};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is re-exported from the root.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let state = SelectionState::new();
        assert!(state.is_empty());
        let dashboard = Dashboard::default();
        assert!(dashboard.summary.is_empty());
    }

    #[test]
    fn test_error_accessible() {
        let err: Error = Error::NoFilesSelected;
        let result: Result<()> = Err(err);
        assert!(result.is_err());
    }
}
