//! HTML rendering with Chart.js pie charts

use super::Page;
use crate::chart::{self, SummaryItem};
use crate::ledger::SummaryRow;
use crate::locale::format_currency;
use crate::selection::{DEFAULT_ACTION_LABEL, FIELD_NAME};
use std::io::{self, Write};

const HEAD: &str = r#"<!DOCTYPE html>
<html lang="pt-BR">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Análise de Créditos</title>
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css">
    <link rel="stylesheet" href="https://cdn.jsdelivr.net/npm/bootstrap-icons@1.11.3/font/bootstrap-icons.min.css">
    <script src="https://cdn.jsdelivr.net/npm/chart.js@4.4.1/dist/chart.umd.min.js"></script>
    <script src="https://cdn.jsdelivr.net/npm/chartjs-plugin-datalabels@2.2.0/dist/chartjs-plugin-datalabels.min.js"></script>
    <style>
        .drop-zone { border: 2px dashed #adb5bd; border-radius: 12px; padding: 2rem; text-align: center; cursor: pointer; }
        .drop-zone-active { border-color: #0d6efd; background: #e7f1ff; }
        .chart-cell canvas { max-width: 160px; max-height: 160px; }
        .zero-credit { color: #dc3545; font-weight: 600; }
    </style>
</head>
<body class="bg-light">
<div class="container py-4">
"#;

const TAIL: &str = "</div>\n</body>\n</html>\n";

/// Looks up each `pieChart<i>` canvas (throws if one is missing) and hands
/// the precomputed config to Chart.js.
const CHART_SCRIPT: &str = r#"<script>
document.addEventListener('DOMContentLoaded', function () {
    if (typeof summaryData === 'undefined' || summaryData.length === 0) {
        return;
    }
    chartConfigs.forEach(function (chart) {
        var ctx = document.getElementById(chart.canvasId).getContext('2d');
        var config = chart.config;
        var dataset = config.data.datasets[0];
        config.options.plugins.tooltip = {
            callbacks: {
                label: function (item) { return dataset.tooltipLabels[item.dataIndex]; }
            }
        };
        config.options.plugins.datalabels.formatter = function (value, context) {
            return dataset.percentLabels[context.dataIndex];
        };
        config.plugins = [ChartDataLabels];
        new Chart(ctx, config);
    });
});
</script>
"#;

/// Drop zone, recursive toggle and the action label. Selection rules live on
/// the server side of the upload.
const FORM_SCRIPT: &str = r#"<script>
document.addEventListener('DOMContentLoaded', function () {
    var form = document.getElementById('fileUploadForm');
    var dropZone = document.getElementById('dropZone');
    var fileInput = document.getElementById('csvFiles');
    var recursiveCheck = document.getElementById('recursiveCheck');
    var analyzeButton = document.getElementById('analyzeButton');
    function updateCount() {
        var count = Array.from(fileInput.files).filter(function (f) {
            return f.name.toLowerCase().endsWith('.csv');
        }).length;
        analyzeButton.textContent = count > 0 ? 'Analisar Arquivos (' + count + ')' : 'Analisar Arquivos';
    }
    dropZone.addEventListener('click', function () { fileInput.click(); });
    ['dragenter', 'dragover', 'dragleave', 'drop'].forEach(function (name) {
        dropZone.addEventListener(name, function (e) {
            e.preventDefault();
            e.stopPropagation();
        });
    });
    ['dragenter', 'dragover'].forEach(function (name) {
        dropZone.addEventListener(name, function () { dropZone.classList.add('drop-zone-active'); });
    });
    ['dragleave', 'drop'].forEach(function (name) {
        dropZone.addEventListener(name, function () { dropZone.classList.remove('drop-zone-active'); });
    });
    dropZone.addEventListener('drop', function (e) {
        fileInput.files = e.dataTransfer.files;
        fileInput.dispatchEvent(new Event('change'));
    });
    recursiveCheck.addEventListener('change', function () {
        fileInput.toggleAttribute('webkitdirectory', recursiveCheck.checked);
    });
    fileInput.addEventListener('change', updateCount);
    form.addEventListener('reset', function () {
        analyzeButton.disabled = false;
        analyzeButton.textContent = 'Analisar Arquivos';
    });
    form.addEventListener('submit', function (e) {
        if (fileInput.files.length === 0) {
            e.preventDefault();
            alert('Por favor, selecione pelo menos um arquivo para análise.');
            return;
        }
        analyzeButton.disabled = true;
        analyzeButton.innerHTML = '<span class="spinner-border spinner-border-sm" role="status" aria-hidden="true"></span> Analisando...';
    });
});
</script>
"#;

pub fn write_page<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    writer.write_all(HEAD.as_bytes())?;
    writeln!(writer, r#"<h1 class="mb-4"><i class="bi bi-pie-chart"></i> Análise de Créditos</h1>"#)?;

    write_upload_form(writer)?;

    if let Some(ref message) = page.error_message {
        writeln!(
            writer,
            r#"<div class="alert alert-danger" role="alert">{}</div>"#,
            escape(message)
        )?;
    }

    write_search(writer, &page.search_query)?;
    write_summary(writer, &page.summary)?;
    write_pagination(writer, page)?;
    write_ranking(writer, &page.ranking)?;
    write_monthly(writer, page)?;
    write_lookup(writer, page)?;
    write_shutdown(writer)?;

    write_chart_data(writer, &page.summary_items())?;
    writer.write_all(CHART_SCRIPT.as_bytes())?;
    writer.write_all(FORM_SCRIPT.as_bytes())?;
    writer.write_all(TAIL.as_bytes())
}

/// Charts only, one card per item.
pub fn write_charts<W: Write>(writer: &mut W, items: &[SummaryItem]) -> io::Result<()> {
    writer.write_all(HEAD.as_bytes())?;
    writeln!(writer, r#"<div class="row g-3">"#)?;
    for (i, item) in items.iter().enumerate() {
        writeln!(
            writer,
            r#"<div class="col-md-3"><div class="card"><div class="card-body chart-cell">
<h6 class="card-title">{}</h6><canvas id="{}"></canvas>
</div></div></div>"#,
            escape(&item.emitente),
            chart::canvas_id(i)
        )?;
    }
    writeln!(writer, "</div>")?;
    write_chart_data(writer, items)?;
    writer.write_all(CHART_SCRIPT.as_bytes())?;
    writer.write_all(TAIL.as_bytes())
}

fn write_upload_form<W: Write>(writer: &mut W) -> io::Result<()> {
    write!(
        writer,
        r#"<div class="card mb-4"><div class="card-body">
<form id="fileUploadForm" method="post" action="/" enctype="multipart/form-data">
    <div id="dropZone" class="drop-zone mb-3">
        <i class="bi bi-cloud-arrow-up fs-1"></i>
        <p class="mb-0">Arraste arquivos CSV ou clique para selecionar</p>
        <input type="file" id="{field}" name="{field}" accept=".csv" multiple hidden>
    </div>
    <div class="form-check mb-3">
        <input class="form-check-input" type="checkbox" id="recursiveCheck">
        <label class="form-check-label" for="recursiveCheck">Incluir subpastas</label>
    </div>
    <button type="submit" id="analyzeButton" class="btn btn-primary">{label}</button>
    <button type="reset" id="clearButton" class="btn btn-outline-secondary">Limpar</button>
</form>
</div></div>
"#,
        field = FIELD_NAME,
        label = DEFAULT_ACTION_LABEL
    )
}

fn write_search<W: Write>(writer: &mut W, query: &str) -> io::Result<()> {
    writeln!(
        writer,
        r#"<form class="row g-2 mb-3" method="get" action="/">
    <div class="col"><input class="form-control" name="search" value="{}" placeholder="Buscar por emitente ou CNPJ (separe por vírgulas)"></div>
    <div class="col-auto"><button class="btn btn-outline-primary" type="submit"><i class="bi bi-search"></i> Buscar</button></div>
</form>"#,
        escape(query)
    )
}

fn write_summary<W: Write>(writer: &mut W, rows: &[SummaryRow]) -> io::Result<()> {
    if rows.is_empty() {
        return writeln!(writer, r#"<p class="text-muted">Nenhum dado para exibir.</p>"#);
    }

    writeln!(
        writer,
        r#"<h2 class="h4">Resumo por Emitente</h2>
<table class="table table-striped align-middle">
<thead><tr><th>#</th><th>Emitente</th><th>CNPJ</th><th>Situação</th><th>Total Valor NF</th><th>Total Créditos</th><th>Notas</th><th>Ticket Médio</th><th>Gráfico</th></tr></thead>
<tbody>"#
    )?;

    for (i, row) in rows.iter().enumerate() {
        let credit_class = if row.total_creditos == 0.0 { " class=\"zero-credit\"" } else { "" };
        writeln!(
            writer,
            r#"<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>R$ {}</td><td{}>R$ {}</td><td>{}</td><td>R$ {}</td><td class="chart-cell"><canvas id="{}"></canvas></td></tr>"#,
            row.ranking,
            escape(&row.emitente),
            escape(&row.cnpj),
            escape(&row.situacao),
            format_currency(row.total_valor_nf),
            credit_class,
            format_currency(row.total_creditos),
            row.notas,
            format_currency(row.ticket_medio),
            chart::canvas_id(i)
        )?;
    }

    writeln!(writer, "</tbody></table>")
}

fn write_pagination<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    if page.total_pages <= 1 {
        return Ok(());
    }

    writeln!(writer, r#"<nav><ul class="pagination">"#)?;
    for n in 1..=page.total_pages {
        let query = serde_urlencoded::to_string([
            ("search", page.search_query.clone()),
            ("page", n.to_string()),
        ])
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e.to_string()))?;
        let active = if n == page.page { " active" } else { "" };
        writeln!(
            writer,
            r#"<li class="page-item{}"><a class="page-link" href="/?{}">{}</a></li>"#,
            active,
            escape(&query),
            n
        )?;
    }
    writeln!(writer, "</ul></nav>")
}

fn write_ranking<W: Write>(writer: &mut W, ranking: &[SummaryRow]) -> io::Result<()> {
    if ranking.is_empty() {
        return Ok(());
    }

    writeln!(
        writer,
        r#"<h2 class="h4 mt-4">Top 10 Emitentes por Créditos</h2>
<table class="table table-sm">
<thead><tr><th>Ranking</th><th>Emitente</th><th>CNPJ</th><th>Total Créditos</th><th>Ticket Médio</th><th>Situação</th></tr></thead>
<tbody>"#
    )?;
    for row in ranking {
        writeln!(
            writer,
            "<tr><td>{}</td><td>{}</td><td>{}</td><td>R$ {}</td><td>R$ {}</td><td>{}</td></tr>",
            row.ranking,
            escape(&row.emitente),
            escape(&row.cnpj),
            format_currency(row.total_creditos),
            format_currency(row.ticket_medio),
            escape(&row.situacao)
        )?;
    }
    writeln!(writer, "</tbody></table>")
}

fn write_monthly<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    if page.monthly_totals.is_empty() {
        return Ok(());
    }

    writeln!(writer, r#"<h2 class="h4 mt-4">Créditos por Mês</h2><ul class="list-group mb-4">"#)?;
    for (month, total) in &page.monthly_totals {
        writeln!(
            writer,
            r#"<li class="list-group-item d-flex justify-content-between"><span>{}</span><span>R$ {}</span></li>"#,
            escape(month),
            format_currency(*total)
        )?;
    }
    writeln!(writer, "</ul>")
}

fn write_lookup<W: Write>(writer: &mut W, page: &Page) -> io::Result<()> {
    writeln!(
        writer,
        r#"<h2 class="h4 mt-4">Consulta por CNPJ</h2>
<form method="post" action="/consulta_cnpj" class="mb-3">
    <textarea class="form-control mb-2" name="cnpjList" rows="4" placeholder="Um CNPJ por linha"></textarea>
    <button class="btn btn-outline-primary" type="submit">Consultar</button>
</form>"#
    )?;

    let Some(ref lookup) = page.cnpj_lookup else {
        return Ok(());
    };

    writeln!(
        writer,
        r#"<table class="table table-sm"><thead><tr><th>CNPJ</th><th>Emitente</th><th>Total Créditos</th><th>Notas</th></tr></thead><tbody>"#
    )?;
    for m in &lookup.results {
        writeln!(
            writer,
            "<tr><td>{}</td><td>{}</td><td>R$ {}</td><td>{}</td></tr>",
            escape(&m.cnpj),
            escape(&m.emitente),
            format_currency(m.total_creditos),
            m.notas
        )?;
    }
    writeln!(
        writer,
        r#"</tbody><tfoot><tr class="fw-bold"><td colspan="2">Total</td><td>R$ {}</td><td>{}</td></tr></tfoot></table>"#,
        format_currency(lookup.total_creditos),
        lookup.total_notas
    )
}

fn write_shutdown<W: Write>(writer: &mut W) -> io::Result<()> {
    writeln!(
        writer,
        r#"<form method="post" action="/shutdown" class="mt-4">
    <button class="btn btn-outline-danger btn-sm" type="submit"><i class="bi bi-power"></i> Encerrar servidor</button>
</form>"#
    )
}

fn write_chart_data<W: Write>(writer: &mut W, items: &[SummaryItem]) -> io::Result<()> {
    let charts = chart::render_all(items);
    writeln!(
        writer,
        "<script>\nconst summaryData = {};\nconst chartConfigs = {};\n</script>",
        script_json(&serde_json::to_string(items)?),
        script_json(&serde_json::to_string(&charts)?)
    )
}

/// Keep `</script>` inside data from closing the tag.
fn script_json(json: &str) -> String {
    json.replace("</", "<\\/")
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
