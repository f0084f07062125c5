//! Page rendering for the dashboard
//!
//! - **Dashboard page**: upload form, summary table with one pie chart per
//!   row, ranking, monthly totals, CNPJ lookup. Served by [`crate::serve`]
//!   and written to disk by [`generate`].
//! - **Chart page**: charts only, for an externally supplied `summaryData`
//!   collection ([`charts`]).
//!
//! # Usage
//!
//! ```ignore
//! use creditos::{report, Dashboard};
//!
//! let dashboard = Dashboard::from_files(&uploads)?;
//! report::generate("creditos.html", &dashboard)?;
//! ```

pub mod html;

use crate::chart::SummaryItem;
use crate::error::Result;
use crate::ledger::{paginate, total_pages, CnpjLookup, Dashboard, SummaryRow, PER_PAGE};
use std::collections::BTreeMap;
use std::io::Write;
use std::path::Path;

/// Everything one rendered page shows.
#[derive(Debug, Clone, Default)]
pub struct Page {
    /// Rows of the current page only
    pub summary: Vec<SummaryRow>,
    pub ranking: Vec<SummaryRow>,
    pub monthly_totals: BTreeMap<String, f64>,
    pub error_message: Option<String>,
    pub search_query: String,
    pub page: usize,
    pub total_pages: usize,
    pub cnpj_lookup: Option<CnpjLookup>,
}

impl Page {
    /// Filter by `search`, then cut out page `page` (1-based).
    pub fn for_dashboard(dashboard: &Dashboard, search: &str, page: usize) -> Self {
        let matching: Vec<&SummaryRow> = dashboard.search(search);
        let total = total_pages(matching.len(), PER_PAGE);
        let page = page.max(1);

        Self {
            summary: paginate(&matching, page, PER_PAGE)
                .iter()
                .map(|row| (*row).clone())
                .collect(),
            ranking: dashboard.ranking.clone(),
            monthly_totals: dashboard.monthly_totals.clone(),
            error_message: None,
            search_query: search.to_string(),
            page,
            total_pages: total,
            cnpj_lookup: None,
        }
    }

    /// A failed upload: empty summary and months, ranking from before.
    pub fn failed_upload(dashboard: &Dashboard, message: String, search: &str, page: usize) -> Self {
        Self {
            ranking: dashboard.ranking.clone(),
            error_message: Some(message),
            search_query: search.to_string(),
            page: page.max(1),
            total_pages: total_pages(dashboard.summary.len(), PER_PAGE),
            ..Self::default()
        }
    }

    pub fn with_error(mut self, message: String) -> Self {
        self.error_message = Some(message);
        self
    }

    pub fn with_lookup(mut self, lookup: CnpjLookup) -> Self {
        self.cnpj_lookup = Some(lookup);
        self
    }

    /// Localized rows for the chart script, in table order.
    pub fn summary_items(&self) -> Vec<SummaryItem> {
        self.summary.iter().map(SummaryRow::to_item).collect()
    }
}

/// Write the full dashboard (first page, no filter) to an HTML file.
pub fn generate<P: AsRef<Path>>(path: P, dashboard: &Dashboard) -> Result<()> {
    let mut file = std::fs::File::create(path.as_ref())?;
    let page = Page::for_dashboard(dashboard, "", 1);
    html::write_page(&mut file, &page)?;
    file.flush()?;
    Ok(())
}

/// Write a chart-only page for a `summaryData` JSON collection.
pub fn charts<W: Write>(writer: &mut W, summary_data: &serde_json::Value) -> Result<()> {
    let items = SummaryItem::from_collection(summary_data)?;
    html::write_charts(writer, &items)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use serde_json::json;

    fn row(emitente: &str, creditos: f64) -> SummaryRow {
        SummaryRow {
            emitente: emitente.to_string(),
            cnpj: "00.000.000/0001-00".to_string(),
            situacao: "Liberado".to_string(),
            total_valor_nf: creditos * 10.0,
            total_creditos: creditos,
            notas: 1,
            ticket_medio: creditos,
            ranking: 0,
        }
    }

    fn dashboard(n: usize) -> Dashboard {
        let summary: Vec<SummaryRow> = (0..n).map(|i| row(&format!("EMPRESA {}", i), 1.0)).collect();
        Dashboard {
            ranking: summary.iter().take(10).cloned().collect(),
            summary,
            monthly_totals: BTreeMap::from([("Março 2024".to_string(), 5.0)]),
        }
    }

    // ==========================================================================
    // PAGE MODEL
    // ==========================================================================

    #[test]
    fn test_page_slices_summary() {
        let page = Page::for_dashboard(&dashboard(120), "", 3);
        assert_eq!(page.summary.len(), 20);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.summary[0].emitente, "EMPRESA 100");
    }

    #[test]
    fn test_page_applies_search_before_paging() {
        let page = Page::for_dashboard(&dashboard(120), "empresa 11", 1);
        // EMPRESA 11 and EMPRESA 110..119
        assert_eq!(page.summary.len(), 11);
        assert_eq!(page.total_pages, 1);
    }

    #[test]
    fn test_failed_upload_keeps_ranking_only() {
        let d = dashboard(3);
        let page = Page::failed_upload(&d, "Erro".to_string(), "", 1);
        assert!(page.summary.is_empty());
        assert!(page.monthly_totals.is_empty());
        assert_eq!(page.ranking.len(), 3);
        assert_eq!(page.error_message.as_deref(), Some("Erro"));
    }

    #[test]
    fn test_summary_items_are_localized() {
        let mut d = dashboard(1);
        d.summary[0].total_valor_nf = 1234.56;
        let items = Page::for_dashboard(&d, "", 1).summary_items();
        assert_eq!(items[0].total_valor_nf, "1.234,56");
        assert_eq!(items[0].total_creditos, "1,00");
    }

    // ==========================================================================
    // FILE OUTPUT
    // ==========================================================================

    #[test]
    fn test_generate_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("relatorio.html");
        generate(&path, &dashboard(2)).unwrap();

        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("pieChart1"));
        assert!(html.contains("EMPRESA 0"));
    }

    #[test]
    fn test_charts_rejects_incomplete_items() {
        let mut out = Vec::new();
        let data = json!([{ "Emitente": "X", "Total Valor NF": "1,00" }]);
        assert!(matches!(charts(&mut out, &data), Err(Error::MissingField(_))));
    }

    #[test]
    fn test_charts_page_has_one_canvas_per_item() {
        let mut out = Vec::new();
        let data = json!([
            { "Emitente": "A", "Total Valor NF": "100,00", "Total Créditos": "300,00" },
            { "Emitente": "B", "Total Valor NF": "1.000,00", "Total Créditos": "0,00" }
        ]);
        charts(&mut out, &data).unwrap();
        let html = String::from_utf8(out).unwrap();
        assert!(html.contains("id=\"pieChart0\""));
        assert!(html.contains("id=\"pieChart1\""));
        assert!(html.contains("75.00%"));
    }
}
