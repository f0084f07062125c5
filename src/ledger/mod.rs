//! Credit totals computed from uploaded NF-e exports
//!
//! Uploaded files are concatenated, their amounts converted, and the rows
//! grouped per issuer (Emitente, CNPJ, Situação do Crédito). The resulting
//! [`Dashboard`] backs every page the server renders: the paginated
//! summary table, the top-10 ranking, monthly credit totals and the CNPJ
//! lookup.
//!
//! # Required columns
//!
//! | Column | Use |
//! |--------|-----|
//! | `Emitente` | group key, search |
//! | `CNPJ emit.` | group key, search, lookup |
//! | `Situação do Crédito` | group key |
//! | `Valor NF` | summed |
//! | `Créditos` | summed, ranking order, monthly totals |
//! | `Data Emissão` | month bucket |
//! | `No.` | note count |

pub mod reader;

use crate::chart::SummaryItem;
use crate::error::{Error, Result};
use crate::locale::{format_currency, month_label};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;

pub use reader::{read_table, Table, UploadedFile};

pub const PER_PAGE: usize = 50;
pub const RANKING_SIZE: usize = 10;

const COL_EMITENTE: &str = "Emitente";
const COL_CNPJ: &str = "CNPJ emit.";
const COL_SITUACAO: &str = "Situação do Crédito";
const COL_VALOR_NF: &str = "Valor NF";
const COL_CREDITOS: &str = "Créditos";
const COL_DATA: &str = "Data Emissão";
const COL_NUMERO: &str = "No.";

/// One invoice line after conversion.
#[derive(Debug, Clone)]
struct Invoice {
    emitente: String,
    cnpj: String,
    situacao: String,
    valor_nf: f64,
    creditos: f64,
    month: String,
    has_number: bool,
}

/// Totals for one (Emitente, CNPJ, Situação) group.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryRow {
    pub emitente: String,
    pub cnpj: String,
    pub situacao: String,
    pub total_valor_nf: f64,
    pub total_creditos: f64,
    /// Number of notes (`No.` values) in the group
    pub notas: usize,
    /// Credits per note
    pub ticket_medio: f64,
    /// 1-based position by credit total
    pub ranking: usize,
}

impl SummaryRow {
    /// The localized view published to the chart script.
    pub fn to_item(&self) -> SummaryItem {
        SummaryItem {
            emitente: self.emitente.clone(),
            total_valor_nf: format_currency(self.total_valor_nf),
            total_creditos: format_currency(self.total_creditos),
        }
    }

    fn matches(&self, terms: &[String]) -> bool {
        let emitente = self.emitente.to_lowercase();
        terms
            .iter()
            .any(|term| emitente.contains(term.as_str()) || self.cnpj.contains(term.as_str()))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CnpjMatch {
    pub cnpj: String,
    pub emitente: String,
    pub total_creditos: f64,
    pub notas: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CnpjLookup {
    pub results: Vec<CnpjMatch>,
    pub total_creditos: f64,
    pub total_notas: usize,
}

#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    /// All groups, highest credit total first
    pub summary: Vec<SummaryRow>,
    /// The first [`RANKING_SIZE`] groups of `summary`
    pub ranking: Vec<SummaryRow>,
    /// Credit totals per month label, ordered by label
    pub monthly_totals: BTreeMap<String, f64>,
}

impl Dashboard {
    /// Build a dashboard from uploaded files. Nothing is kept on error.
    pub fn from_files(files: &[UploadedFile]) -> Result<Self> {
        if files.is_empty() {
            return Err(Error::NoCsvUploaded);
        }

        // Decode in parallel; the first failing file in upload order wins.
        let tables = files
            .par_iter()
            .map(read_table)
            .collect::<Vec<Result<Table>>>()
            .into_iter()
            .collect::<Result<Vec<Table>>>()?;
        log::info!("{} arquivo(s) concatenados com sucesso.", tables.len());

        let invoices = to_invoices(&tables)?;
        log::info!("Colunas numéricas convertidas com sucesso.");

        let dashboard = Self::from_invoices(&invoices);
        log::info!("Dados processados e agrupados com sucesso.");
        Ok(dashboard)
    }

    fn from_invoices(invoices: &[Invoice]) -> Self {
        let mut monthly_totals: BTreeMap<String, f64> = BTreeMap::new();
        for inv in invoices {
            *monthly_totals.entry(inv.month.clone()).or_insert(0.0) += inv.creditos;
        }

        // BTreeMap keeps groups in key order so the stable sort below breaks
        // ties deterministically.
        let mut groups: BTreeMap<(&str, &str, &str), (f64, f64, usize)> = BTreeMap::new();
        for inv in invoices {
            if inv.emitente.is_empty() || inv.cnpj.is_empty() || inv.situacao.is_empty() {
                continue;
            }
            let acc = groups
                .entry((inv.emitente.as_str(), inv.cnpj.as_str(), inv.situacao.as_str()))
                .or_insert((0.0, 0.0, 0));
            acc.0 += inv.valor_nf;
            acc.1 += inv.creditos;
            if inv.has_number {
                acc.2 += 1;
            }
        }

        let mut summary: Vec<SummaryRow> = groups
            .into_iter()
            .map(|((emitente, cnpj, situacao), (valor_nf, creditos, notas))| SummaryRow {
                emitente: emitente.to_string(),
                cnpj: cnpj.to_string(),
                situacao: situacao.to_string(),
                total_valor_nf: valor_nf,
                total_creditos: creditos,
                notas,
                ticket_medio: creditos / notas as f64,
                ranking: 0,
            })
            .collect();

        summary.sort_by(|a, b| b.total_creditos.total_cmp(&a.total_creditos));
        for (i, row) in summary.iter_mut().enumerate() {
            row.ranking = i + 1;
        }

        let ranking = summary.iter().take(RANKING_SIZE).cloned().collect();

        Self {
            summary,
            ranking,
            monthly_totals,
        }
    }

    /// Rows matching any comma-separated term, case-insensitive on the
    /// issuer name and literal on the CNPJ. A blank query matches all.
    /// Blank terms are skipped, so `"acme,"` matches only `acme`, not every row.
    pub fn search(&self, query: &str) -> Vec<&SummaryRow> {
        let terms: Vec<String> = query
            .to_lowercase()
            .split(',')
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .collect();

        if terms.is_empty() {
            return self.summary.iter().collect();
        }

        self.summary.iter().filter(|row| row.matches(&terms)).collect()
    }

    /// Totals for a newline-separated list of CNPJs, punctuation ignored.
    pub fn lookup_cnpjs(&self, input: &str) -> Result<CnpjLookup> {
        let wanted: Vec<String> = input
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(normalize_cnpj)
            .collect();

        if wanted.is_empty() {
            return Err(Error::NoCnpjGiven);
        }

        let mut lookup = CnpjLookup::default();
        for row in &self.summary {
            if wanted.contains(&normalize_cnpj(&row.cnpj)) {
                lookup.total_creditos += row.total_creditos;
                lookup.total_notas += row.notas;
                lookup.results.push(CnpjMatch {
                    cnpj: row.cnpj.clone(),
                    emitente: row.emitente.clone(),
                    total_creditos: row.total_creditos,
                    notas: row.notas,
                });
            }
        }
        Ok(lookup)
    }
}

/// Strip `.`, `/` and `-` so formatted and bare CNPJs compare equal.
pub fn normalize_cnpj(cnpj: &str) -> String {
    cnpj.chars().filter(|c| !matches!(c, '.' | '/' | '-')).collect()
}

pub fn total_pages(items: usize, per_page: usize) -> usize {
    items.div_ceil(per_page).max(1)
}

/// 1-based page slice. Pages past the end are empty.
pub fn paginate<T>(items: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_sub(1).saturating_mul(per_page);
    if start >= items.len() {
        return &[];
    }
    let end = (start + per_page).min(items.len());
    &items[start..end]
}

fn required(table: &Table, name: &str) -> std::result::Result<usize, String> {
    table
        .column(name)
        .ok_or_else(|| format!("coluna '{}' ausente", name))
}

fn to_invoices(tables: &[Table]) -> Result<Vec<Invoice>> {
    let mut invoices = Vec::new();

    for table in tables {
        let valor_idx = required(table, COL_VALOR_NF).map_err(Error::Conversion)?;
        let creditos_idx = required(table, COL_CREDITOS).map_err(Error::Conversion)?;
        let emitente_idx = required(table, COL_EMITENTE).map_err(Error::Processing)?;
        let cnpj_idx = required(table, COL_CNPJ).map_err(Error::Processing)?;
        let situacao_idx = required(table, COL_SITUACAO).map_err(Error::Processing)?;
        let data_idx = required(table, COL_DATA).map_err(Error::Processing)?;
        let numero_idx = required(table, COL_NUMERO).map_err(Error::Processing)?;

        for row in &table.rows {
            let cell = |idx: usize| row.get(idx).map(String::as_str).unwrap_or("");

            invoices.push(Invoice {
                emitente: cell(emitente_idx).to_string(),
                cnpj: cell(cnpj_idx).to_string(),
                situacao: cell(situacao_idx).to_string(),
                valor_nf: reader::parse_amount(cell(valor_idx)).map_err(Error::Conversion)?,
                creditos: reader::parse_amount(cell(creditos_idx)).map_err(Error::Conversion)?,
                month: month_label(cell(data_idx)),
                has_number: !cell(numero_idx).trim().is_empty(),
            });
        }
    }

    Ok(invoices)
}
