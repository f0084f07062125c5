//! HTTP server for the dashboard
//!
//! `creditos serve` → starts server, opens browser, accepts CSV uploads
//!
//! Requests are handled one at a time on the calling thread, so the
//! dashboard needs no locking: the loop owns it and replaces it after each
//! successful upload.

use crate::error::Error;
use crate::ledger::{Dashboard, UploadedFile, PER_PAGE};
use crate::report::{html, Page};
use crate::selection::{is_csv_name, FIELD_NAME};
use multipart::server::Multipart;
use serde::Deserialize;
use std::io::{self, Read};
use tiny_http::{Header, Method, Request, Response, Server};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub open_browser: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            open_browser: true,
        }
    }
}

#[derive(Debug)]
struct IndexQuery {
    search: String,
    page: usize,
}

fn first_page() -> usize { 1 }

#[derive(Deserialize, Debug)]
struct LookupForm {
    #[serde(rename = "cnpjList", default)]
    cnpj_list: String,
}

/// What the loop should do after a request.
#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Shutdown,
}

/// Start server, open browser, serve until `POST /shutdown`
pub fn start(config: &Config) -> io::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let server = Server::http(&addr).map_err(|e| {
        io::Error::new(io::ErrorKind::Other, e.to_string())
    })?;

    let url = format!("http://{}", addr);
    eprintln!("\n\x1b[1;32m📊 Créditos\x1b[0m");
    eprintln!("   {}\n", url);
    log::info!("Servidor ouvindo em {}", url);

    if config.open_browser {
        let _ = open::that(&url);
    }

    let mut dashboard = Dashboard::default();
    for request in server.incoming_requests() {
        match handle_request(request, &mut dashboard) {
            Ok(Flow::Continue) => {}
            Ok(Flow::Shutdown) => {
                log::info!("Servidor encerrado a pedido do usuário");
                break;
            }
            Err(e) => log::error!("Erro: {}", e),
        }
    }

    Ok(())
}

fn handle_request(mut request: Request, dashboard: &mut Dashboard) -> io::Result<Flow> {
    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or("/");
    let query = parse_query(url.split('?').nth(1));
    let method = request.method().clone();
    log::info!("{} {}", method, path);

    match (&method, path) {
        (&Method::Get, "/") => {
            log::info!("Página atual: {}, Itens por página: {}", query.page, PER_PAGE);
            let page = Page::for_dashboard(dashboard, &query.search, query.page);
            respond_page(request, &page)?;
        }

        (&Method::Post, "/") => {
            let page = match read_uploads(&mut request)? {
                Some(files) => match Dashboard::from_files(&files) {
                    Ok(fresh) => {
                        *dashboard = fresh;
                        Page::for_dashboard(dashboard, &query.search, query.page)
                    }
                    Err(e) => {
                        log::error!("{}", e);
                        Page::failed_upload(dashboard, e.to_string(), &query.search, query.page)
                    }
                },
                None => Page::for_dashboard(dashboard, &query.search, query.page),
            };
            respond_page(request, &page)?;
        }

        (&Method::Post, "/consulta_cnpj") => {
            let mut body = String::new();
            request.as_reader().read_to_string(&mut body)?;
            let form: LookupForm = serde_urlencoded::from_str(&body)
                .unwrap_or(LookupForm { cnpj_list: String::new() });

            let page = Page::for_dashboard(dashboard, "", 1);
            let page = match dashboard.lookup_cnpjs(&form.cnpj_list) {
                Ok(lookup) => page.with_lookup(lookup),
                Err(e) => {
                    if !matches!(e, Error::NoCnpjGiven) {
                        log::error!("Erro na consulta de CNPJs: {}", e);
                    }
                    page.with_error(e.to_string())
                }
            };
            respond_page(request, &page)?;
        }

        (&Method::Post, "/shutdown") => {
            request.respond(Response::from_string("Servidor encerrado."))?;
            return Ok(Flow::Shutdown);
        }

        // 404
        _ => {
            let response = Response::from_string("Não encontrado").with_status_code(404);
            request.respond(response)?;
        }
    }

    Ok(Flow::Continue)
}

/// `search` and `page` are read independently; a bad page number falls
/// back to the first page without losing the search term.
fn parse_query(query: Option<&str>) -> IndexQuery {
    let pairs: Vec<(String, String)> = query
        .and_then(|q| serde_urlencoded::from_str(q).ok())
        .unwrap_or_default();
    let value = |key: &str| pairs.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str());

    IndexQuery {
        search: value("search").unwrap_or_default().to_string(),
        page: value("page").and_then(|p| p.trim().parse().ok()).unwrap_or_else(first_page),
    }
}

fn respond_page(request: Request, page: &Page) -> io::Result<()> {
    let mut body = Vec::new();
    html::write_page(&mut body, page)?;

    let mut response = Response::from_data(body);
    if let Ok(header) = Header::from_bytes(&b"Content-Type"[..], &b"text/html; charset=utf-8"[..]) {
        response = response.with_header(header);
    }
    request.respond(response)
}

/// Files from the `csvFiles` field, or `None` when the request has no such
/// field. The empty part a browser sends for an untouched input is skipped,
/// as are files without a `.csv` suffix.
fn read_uploads(request: &mut Request) -> io::Result<Option<Vec<UploadedFile>>> {
    let boundary = request
        .headers()
        .iter()
        .find(|h| h.field.equiv("Content-Type"))
        .and_then(|h| multipart_boundary(h.value.as_str()));

    let Some(boundary) = boundary else {
        return Ok(None);
    };

    let mut multipart = Multipart::with_body(request.as_reader(), boundary);
    let mut files = Vec::new();
    let mut saw_field = false;

    while let Some(mut field) = multipart.read_entry()? {
        if &*field.headers.name != FIELD_NAME {
            continue;
        }
        saw_field = true;

        let name = field.headers.filename.clone().unwrap_or_default();
        let mut bytes = Vec::new();
        field.data.read_to_end(&mut bytes)?;

        if name.is_empty() && bytes.is_empty() {
            continue;
        }
        if !is_csv_name(&name) {
            log::info!("Ignorando arquivo que não é CSV: {}", name);
            continue;
        }
        files.push(UploadedFile { name, bytes });
    }

    Ok(saw_field.then_some(files))
}

fn multipart_boundary(content_type: &str) -> Option<String> {
    let (mime, params) = content_type.split_once(';')?;
    if !mime.trim().eq_ignore_ascii_case("multipart/form-data") {
        return None;
    }

    params
        .split(';')
        .filter_map(|param| param.trim().split_once('='))
        .find(|(key, _)| key.trim().eq_ignore_ascii_case("boundary"))
        .map(|(_, value)| value.trim().trim_matches('"').to_string())
}
