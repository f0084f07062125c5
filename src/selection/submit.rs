//! Sending the selection to the dashboard server
//!
//! Exactly the retained entries are sent, each as a `csvFiles` part named by
//! its relative path. One attempt is made; there is no retry and no
//! cancellation.

use super::{SelectedFile, SelectionState};
use crate::error::{Error, Result};
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use std::time::Duration;

/// Multipart field the server reads uploads from.
pub const FIELD_NAME: &str = "csvFiles";

/// Transport for a finished selection. Returns the response page.
pub trait Uploader {
    fn upload(&self, files: &[SelectedFile]) -> Result<String>;
}

/// `POST {base}/` with a multipart body.
pub struct HttpUploader {
    client: Client,
    endpoint: String,
}

impl HttpUploader {
    pub fn new(base_url: &str) -> Result<Self> {
        // Analysis of large exports can take a while; wait as long as the
        // server needs.
        let client = Client::builder().timeout(None::<Duration>).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/", base_url.trim_end_matches('/')),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Uploader for HttpUploader {
    fn upload(&self, files: &[SelectedFile]) -> Result<String> {
        let mut form = Form::new();
        for selected in files {
            let part = Part::file(&selected.file.source)?.file_name(selected.path.clone());
            form = form.part(FIELD_NAME, part);
        }

        let response = self.client.post(&self.endpoint).multipart(form).send()?;
        log::info!("Resposta {} de {}", response.status(), self.endpoint);
        Ok(response.text()?)
    }
}

impl SelectionState {
    /// Upload the selection and return the page that replaces the form.
    ///
    /// An empty selection is refused before any request is made. On
    /// success the selection is discarded; on failure the action control
    /// is restored and the selection kept so the user can try again.
    pub fn submit<U: Uploader + ?Sized>(&mut self, uploader: &U) -> Result<String> {
        if self.is_empty() {
            return Err(Error::NoFilesSelected);
        }

        self.begin_submit();
        match uploader.upload(self.entries()) {
            Ok(page) => {
                self.clear();
                Ok(page)
            }
            Err(err) => {
                log::error!("Erro: {}", detail(&err));
                self.submit_failed();
                Err(match err {
                    Error::Upload(_) => err,
                    other => Error::Upload(detail(&other)),
                })
            }
        }
    }
}

fn detail(err: &Error) -> String {
    match err {
        Error::Upload(msg) => msg.clone(),
        other => other.to_string(),
    }
}
