//! Pie-chart configuration for per-issuer summaries
//!
//! Each summary item becomes one two-slice pie chart (Valor NF vs Créditos)
//! drawn by Chart.js in the browser. Everything that depends on the data is
//! computed here: parsed values, colors, tooltip text and percentage
//! labels. The page only has to look up the canvas and hand the config to
//! Chart.js.
//!
//! # Color rule
//!
//! | Credit total | Valor NF slice | Créditos slice |
//! |--------------|----------------|----------------|
//! | exactly 0    | warning        | warning        |
//! | anything else| neutral        | accent         |

use crate::error::{Error, Result};
use crate::locale::parse_localized;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Canvas ids are `pieChart0`, `pieChart1`, ...
pub const CANVAS_PREFIX: &str = "pieChart";

pub const SLICE_LABELS: [&str; 2] = ["Total Valor NF", "Total Créditos"];

pub const WARNING_COLOR: &str = "rgba(255, 99, 132, 0.8)";
pub const NEUTRAL_COLOR: &str = "rgba(173, 216, 230, 0.8)";
pub const ACCENT_COLOR: &str = "rgba(75, 192, 192, 0.8)";

/// One row of pre-aggregated totals, as published in `summaryData`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SummaryItem {
    #[serde(rename = "Emitente")]
    pub emitente: String,
    /// Localized decimal, e.g. `1.234,56`
    #[serde(rename = "Total Valor NF")]
    pub total_valor_nf: String,
    /// Localized decimal, e.g. `0,00`
    #[serde(rename = "Total Créditos")]
    pub total_creditos: String,
}

impl SummaryItem {
    /// Validate a loosely-typed JSON object at the boundary.
    pub fn from_value(value: &Value) -> Result<Self> {
        let field = |name: &'static str| {
            value
                .get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or(Error::MissingField(name))
        };

        Ok(Self {
            emitente: field("Emitente")?,
            total_valor_nf: field("Total Valor NF")?,
            total_creditos: field("Total Créditos")?,
        })
    }

    /// Read a whole collection. Anything that is not an array counts as
    /// absent and yields no items.
    pub fn from_collection(value: &Value) -> Result<Vec<Self>> {
        match value {
            Value::Array(items) => items.iter().map(Self::from_value).collect(),
            _ => Ok(Vec::new()),
        }
    }

    pub fn valor_nf(&self) -> f64 {
        parse_localized(&self.total_valor_nf)
    }

    pub fn creditos(&self) -> f64 {
        parse_localized(&self.total_creditos)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Palette {
    /// Both slices in the warning color
    ZeroCredit,
    /// Neutral Valor NF, accent Créditos
    Standard,
}

impl Palette {
    pub fn for_credits(creditos: f64) -> Self {
        if creditos == 0.0 {
            Palette::ZeroCredit
        } else {
            Palette::Standard
        }
    }

    pub fn colors(self) -> [&'static str; 2] {
        match self {
            Palette::ZeroCredit => [WARNING_COLOR, WARNING_COLOR],
            Palette::Standard => [NEUTRAL_COLOR, ACCENT_COLOR],
        }
    }
}

// ============================================================================
// Chart.js configuration
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ChartConfig {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub data: ChartData,
    pub options: ChartOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartData {
    pub labels: [&'static str; 2],
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    /// Non-finite values serialize as `null`
    pub data: [f64; 2],
    pub background_color: [&'static str; 2],
    /// Read by the tooltip callback
    pub tooltip_labels: Vec<String>,
    /// Read by the data-label formatter
    pub percent_labels: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChartOptions {
    pub responsive: bool,
    pub plugins: Plugins,
}

#[derive(Debug, Clone, Serialize)]
pub struct Plugins {
    pub legend: Legend,
    pub datalabels: DataLabels,
}

#[derive(Debug, Clone, Serialize)]
pub struct Legend {
    pub display: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataLabels {
    pub color: &'static str,
    pub font: Font,
}

#[derive(Debug, Clone, Serialize)]
pub struct Font {
    pub weight: &'static str,
    pub size: &'static str,
}

/// A chart bound to its canvas.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PieChart {
    pub canvas_id: String,
    pub config: ChartConfig,
}

impl PieChart {
    pub fn build(index: usize, item: &SummaryItem) -> Self {
        let values = [item.valor_nf(), item.creditos()];
        let palette = Palette::for_credits(values[1]);

        let tooltip_labels = SLICE_LABELS
            .iter()
            .zip(values.iter())
            .map(|(label, value)| tooltip_label(label, *value))
            .collect();

        Self {
            canvas_id: canvas_id(index),
            config: ChartConfig {
                kind: "pie",
                data: ChartData {
                    labels: SLICE_LABELS,
                    datasets: vec![Dataset {
                        label: item.emitente.clone(),
                        data: values,
                        background_color: palette.colors(),
                        tooltip_labels,
                        percent_labels: percentage_labels(&values),
                    }],
                },
                options: ChartOptions {
                    responsive: true,
                    plugins: Plugins {
                        legend: Legend { display: false },
                        datalabels: DataLabels {
                            color: "#fff",
                            font: Font { weight: "bold", size: "16" },
                        },
                    },
                },
            },
        }
    }

    pub fn values(&self) -> [f64; 2] {
        self.config.data.datasets[0].data
    }

    pub fn colors(&self) -> [&'static str; 2] {
        self.config.data.datasets[0].background_color
    }
}

pub fn canvas_id(index: usize) -> String {
    format!("{}{}", CANVAS_PREFIX, index)
}

/// `"Total Créditos: R$ 150.00"`
pub fn tooltip_label(label: &str, value: f64) -> String {
    format!("{}: R$ {:.2}", label, value)
}

/// Share of each slice in the sum of this chart's slices, two decimals.
pub fn percentage_labels(values: &[f64]) -> Vec<String> {
    let total: f64 = values.iter().sum();
    values
        .iter()
        .map(|v| format!("{:.2}%", v / total * 100.0))
        .collect()
}

/// One chart per item, in order. An empty collection renders nothing.
pub fn render_all(items: &[SummaryItem]) -> Vec<PieChart> {
    items
        .iter()
        .enumerate()
        .map(|(i, item)| PieChart::build(i, item))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn item(valor: &str, creditos: &str) -> SummaryItem {
        SummaryItem {
            emitente: "ACME LTDA".to_string(),
            total_valor_nf: valor.to_string(),
            total_creditos: creditos.to_string(),
        }
    }

    // ==========================================================================
    // BOUNDARY VALIDATION
    // ==========================================================================

    #[test]
    fn test_from_value_reads_required_fields() {
        let value = json!({
            "Emitente": "ACME LTDA",
            "Total Valor NF": "1.234,56",
            "Total Créditos": "150,00",
            "CNPJ emit.": "12.345.678/0001-90"
        });
        let item = SummaryItem::from_value(&value).unwrap();
        assert_eq!(item.emitente, "ACME LTDA");
        assert!((item.valor_nf() - 1234.56).abs() < 1e-9);
        assert_eq!(item.creditos(), 150.0);
    }

    #[test]
    fn test_from_value_missing_field() {
        let value = json!({ "Emitente": "ACME", "Total Valor NF": "1,00" });
        match SummaryItem::from_value(&value) {
            Err(Error::MissingField(name)) => assert_eq!(name, "Total Créditos"),
            other => panic!("expected missing field, got {:?}", other),
        }
    }

    #[test]
    fn test_from_collection_absent_is_empty() {
        assert!(SummaryItem::from_collection(&Value::Null).unwrap().is_empty());
        assert!(SummaryItem::from_collection(&json!([])).unwrap().is_empty());
    }

    // ==========================================================================
    // COLOR RULE
    // ==========================================================================

    #[test]
    fn test_zero_credit_uses_warning_pair() {
        let chart = PieChart::build(0, &item("1.000,00", "0,00"));
        assert_eq!(chart.colors(), [WARNING_COLOR, WARNING_COLOR]);
    }

    #[test]
    fn test_nonzero_credit_uses_neutral_accent_pair() {
        let chart = PieChart::build(0, &item("1.000,00", "150,00"));
        assert_eq!(chart.colors(), [NEUTRAL_COLOR, ACCENT_COLOR]);
    }

    #[test]
    fn test_malformed_credit_is_not_zero() {
        // NaN never compares equal to zero
        assert_eq!(Palette::for_credits(f64::NAN), Palette::Standard);
    }

    // ==========================================================================
    // LABELS
    // ==========================================================================

    #[test]
    fn test_percentages_for_100_and_300() {
        let labels = percentage_labels(&[100.0, 300.0]);
        assert_eq!(labels, vec!["25.00%", "75.00%"]);
    }

    #[test]
    fn test_percentages_are_per_chart() {
        let charts = render_all(&[item("100,00", "300,00"), item("50,00", "50,00")]);
        assert_eq!(charts[0].config.data.datasets[0].percent_labels, vec!["25.00%", "75.00%"]);
        assert_eq!(charts[1].config.data.datasets[0].percent_labels, vec!["50.00%", "50.00%"]);
    }

    #[test]
    fn test_tooltip_currency_format() {
        assert_eq!(tooltip_label("Total Créditos", 150.0), "Total Créditos: R$ 150.00");
        let chart = PieChart::build(0, &item("1.234,56", "0,5"));
        assert_eq!(
            chart.config.data.datasets[0].tooltip_labels,
            vec!["Total Valor NF: R$ 1234.56", "Total Créditos: R$ 0.50"]
        );
    }

    // ==========================================================================
    // RENDERING
    // ==========================================================================

    #[test]
    fn test_render_all_indexes_canvases() {
        let charts = render_all(&[item("1,00", "1,00"), item("2,00", "0,00")]);
        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].canvas_id, "pieChart0");
        assert_eq!(charts[1].canvas_id, "pieChart1");
    }

    #[test]
    fn test_render_all_empty_is_noop() {
        assert!(render_all(&[]).is_empty());
    }

    #[test]
    fn test_config_serializes_for_chartjs() {
        let chart = PieChart::build(3, &item("100,00", "300,00"));
        let value = serde_json::to_value(&chart).unwrap();
        assert_eq!(value["canvasId"], "pieChart3");
        assert_eq!(value["config"]["type"], "pie");
        assert_eq!(value["config"]["options"]["plugins"]["legend"]["display"], false);
        assert_eq!(value["config"]["data"]["datasets"][0]["backgroundColor"][1], ACCENT_COLOR);
        assert_eq!(value["config"]["data"]["datasets"][0]["label"], "ACME LTDA");
    }

    #[test]
    fn test_malformed_value_serializes_as_null() {
        let chart = PieChart::build(0, &item("n/a", "10,00"));
        assert!(chart.values()[0].is_nan());
        let value = serde_json::to_value(&chart).unwrap();
        assert!(value["config"]["data"]["datasets"][0]["data"][0].is_null());
    }
}
