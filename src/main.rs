use chrono::Local;
use clap::{Parser, Subcommand};
use creditos::selection::{Entry, HttpUploader, SelectionState, BUSY_ACTION_LABEL};
use creditos::{report, serve, Dashboard, Error, UploadedFile};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "creditos")]
#[command(author, version, about = "Resumo de créditos por emitente a partir de exportações CSV de NF-e")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Write log lines to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the dashboard web server
    Serve {
        /// Address to bind
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to listen on
        #[arg(short, long, default_value = "5000", env = "CREDITOS_PORT")]
        port: u16,

        /// Don't open the browser
        #[arg(long)]
        no_open: bool,
    },

    /// Select CSV files and send them to a running dashboard
    Send {
        /// Files or folders to send
        paths: Vec<PathBuf>,

        /// Expand folders, including subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Dashboard base URL
        #[arg(long, default_value = "http://127.0.0.1:5000", env = "CREDITOS_URL")]
        url: String,

        /// Where to save the returned page
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Directory for auto-named result pages
        #[arg(long, default_value = "creditos-reports")]
        report_dir: PathBuf,

        /// Don't open the result in the browser
        #[arg(long)]
        no_open: bool,

        /// Pick files with a dialog (auto-enabled when no path is given)
        #[arg(long)]
        gui: bool,
    },

    /// Build the dashboard locally and write it as an HTML file
    Report {
        /// Files or folders to analyze
        paths: Vec<PathBuf>,

        /// Expand folders, including subfolders
        #[arg(short, long)]
        recursive: bool,

        /// Output HTML file
        #[arg(short, long, default_value = "creditos.html")]
        output: PathBuf,

        /// Don't open the report
        #[arg(long)]
        no_open: bool,
    },

    /// Render pie charts for a summaryData JSON file
    Charts {
        /// JSON array of {"Emitente", "Total Valor NF", "Total Créditos"}
        data: PathBuf,

        /// Output HTML file
        #[arg(short, long, default_value = "graficos.html")]
        output: PathBuf,
    },
}

fn main() {
    let args = Args::parse();
    init_logging(args.log_file.as_deref());

    let code = match args.command {
        Command::Serve { host, port, no_open } => {
            let config = serve::Config { host, port, open_browser: !no_open };
            match serve::start(&config) {
                Ok(()) => 0,
                Err(e) => {
                    eprintln!("Erro no servidor: {}", e);
                    1
                }
            }
        }
        Command::Send { paths, recursive, url, output, report_dir, no_open, gui } => {
            let paths = resolve_paths(paths, gui);
            send(&paths, recursive, &url, output, &report_dir, no_open)
        }
        Command::Report { paths, recursive, output, no_open } => {
            local_report(&paths, recursive, &output, no_open)
        }
        Command::Charts { data, output } => charts(&data, &output),
    };

    std::process::exit(code);
}

fn init_logging(log_file: Option<&Path>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));

    if let Some(path) = log_file {
        match std::fs::File::create(path) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(file)));
            }
            Err(e) => eprintln!("Não foi possível abrir {}: {}", path.display(), e),
        }
    }

    builder.init();
}

/// Apply the selection rules to command-line paths.
fn select(paths: &[PathBuf], recursive: bool) -> SelectionState {
    let entries: Vec<Entry> = paths
        .iter()
        .filter_map(|p| match Entry::from_path(p) {
            Ok(entry) => Some(entry),
            Err(e) => {
                eprintln!("Ignorando {}: {}", p.display(), e);
                None
            }
        })
        .collect();

    let mut state = SelectionState::new();
    state.accept(entries, recursive);
    state
}

fn print_selection(state: &SelectionState) {
    if state.list_visible() {
        eprintln!("\x1b[1mArquivos selecionados\x1b[0m");
        eprintln!("{}", "─".repeat(60));
        for row in state.rows() {
            eprintln!("  \x1b[34m•\x1b[0m {}", row.path);
        }
        eprintln!("{}", "─".repeat(60));
    }
    if state.duplicate_warning() {
        eprintln!("\x1b[33m! Arquivos duplicados foram ignorados.\x1b[0m");
    }
    eprintln!("{}", state.action().label);
}

fn send(
    paths: &[PathBuf],
    recursive: bool,
    url: &str,
    output: Option<PathBuf>,
    report_dir: &Path,
    no_open: bool,
) -> i32 {
    let mut state = select(paths, recursive);
    print_selection(&state);

    let uploader = match HttpUploader::new(url) {
        Ok(u) => u,
        Err(e) => {
            eprintln!("{}", e);
            return 1;
        }
    };

    let spinner = if state.is_empty() {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.set_message(BUSY_ACTION_LABEL);
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let result = state.submit(&uploader);
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let page = match result {
        Ok(page) => page,
        Err(e @ Error::NoFilesSelected) => {
            eprintln!("{}", e);
            return 1;
        }
        Err(e) => {
            eprintln!("\x1b[31m{}\x1b[0m", e);
            eprintln!("{}", state.action().label);
            return 1;
        }
    };

    let output_path = output.unwrap_or_else(|| {
        std::fs::create_dir_all(report_dir).ok();
        let timestamp = Local::now().format("%Y%m%d_%H%M%S");
        report_dir.join(format!("creditos_{}.html", timestamp))
    });

    if let Err(e) = std::fs::write(&output_path, page) {
        eprintln!("Falha ao salvar {}: {}", output_path.display(), e);
        return 1;
    }
    eprintln!("\n\x1b[32mResultado salvo: {}\x1b[0m", output_path.display());

    if !no_open {
        if let Err(e) = open::that(&output_path) {
            eprintln!("Falha ao abrir o resultado: {}", e);
        }
    }
    0
}

fn local_report(paths: &[PathBuf], recursive: bool, output: &Path, no_open: bool) -> i32 {
    let state = select(paths, recursive);
    print_selection(&state);

    if state.is_empty() {
        eprintln!("{}", Error::NoFilesSelected);
        return 1;
    }

    let mut uploads = Vec::with_capacity(state.len());
    for entry in state.entries() {
        match std::fs::read(&entry.file.source) {
            Ok(bytes) => uploads.push(UploadedFile { name: entry.path.clone(), bytes }),
            Err(e) => {
                eprintln!("Falha ao ler {}: {}", entry.file.source.display(), e);
                return 1;
            }
        }
    }

    let dashboard = match Dashboard::from_files(&uploads) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("\x1b[31m{}\x1b[0m", e);
            return 1;
        }
    };

    if let Err(e) = report::generate(output, &dashboard) {
        eprintln!("Falha ao gerar relatório: {}", e);
        return 1;
    }
    eprintln!(
        "\n\x1b[32mRelatório salvo: {}\x1b[0m ({} emitentes)",
        output.display(),
        dashboard.summary.len()
    );

    if !no_open {
        let _ = open::that(output);
    }
    0
}

fn charts(data: &Path, output: &Path) -> i32 {
    let result = std::fs::read_to_string(data)
        .map_err(Error::from)
        .and_then(|text| serde_json::from_str::<serde_json::Value>(&text).map_err(Error::from))
        .and_then(|value| {
            let mut file = std::fs::File::create(output)?;
            report::charts(&mut file, &value)
        });

    match result {
        Ok(()) => {
            eprintln!("\x1b[32mGráficos salvos: {}\x1b[0m", output.display());
            0
        }
        Err(e) => {
            eprintln!("{}", e);
            1
        }
    }
}

#[cfg(feature = "gui")]
fn resolve_paths(paths: Vec<PathBuf>, gui: bool) -> Vec<PathBuf> {
    if !gui && !paths.is_empty() {
        return paths;
    }

    // First try folder picker
    if let Some(folder) = rfd::FileDialog::new()
        .set_title("Selecione a pasta com os arquivos CSV (ou Cancelar para escolher arquivos)")
        .pick_folder()
    {
        return vec![folder];
    }

    // If cancelled, offer file picker
    rfd::FileDialog::new()
        .set_title("Selecione os arquivos CSV")
        .add_filter("CSV", &["csv", "CSV"])
        .pick_files()
        .unwrap_or_default()
}

#[cfg(not(feature = "gui"))]
fn resolve_paths(paths: Vec<PathBuf>, gui: bool) -> Vec<PathBuf> {
    if gui {
        eprintln!("Seleção por janela não disponível nesta versão.");
    }
    paths
}
