//! Error type shared by the ledger, selection and server modules
//!
//! Every variant renders as the Portuguese message shown to the user, so
//! callers can put `err.to_string()` straight into an alert or page banner.

use std::io;

#[derive(Debug)]
pub enum Error {
    /// Submit was attempted with an empty selection
    NoFilesSelected,
    /// An upload request carried no CSV files
    NoCsvUploaded,
    /// The submission request failed in transport
    Upload(String),
    /// A CSV file could not be decoded or read
    Read { file: String, reason: String },
    /// A numeric column held a value that is not a number
    Conversion(String),
    /// A required column was absent or the data could not be grouped
    Processing(String),
    /// A summary item crossed the chart boundary without a required field
    MissingField(&'static str),
    /// No CNPJ was given to the lookup form
    NoCnpjGiven,
    Io(io::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::NoFilesSelected => {
                write!(f, "Por favor, selecione pelo menos um arquivo para análise.")
            }
            Error::NoCsvUploaded => write!(f, "Nenhum arquivo CSV foi carregado."),
            Error::Upload(_) => write!(
                f,
                "Ocorreu um erro ao enviar os arquivos. Por favor, tente novamente."
            ),
            Error::Read { file, reason } => {
                write!(f, "Erro ao ler o arquivo {}: {}", file, reason)
            }
            Error::Conversion(msg) => write!(f, "Erro ao converter colunas numéricas: {}", msg),
            Error::Processing(msg) => write!(f, "Erro ao processar os dados: {}", msg),
            Error::MissingField(field) => write!(f, "Campo obrigatório ausente: {}", field),
            Error::NoCnpjGiven => write!(f, "Nenhum CNPJ informado"),
            Error::Io(e) => write!(f, "Erro de E/S: {}", e),
            Error::Json(e) => write!(f, "Erro de JSON: {}", e),
        }
    }
}

impl std::error::Error for Error {}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Json(e)
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Upload(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_portuguese() {
        assert_eq!(
            Error::NoFilesSelected.to_string(),
            "Por favor, selecione pelo menos um arquivo para análise."
        );
    }

    #[test]
    fn test_upload_message_hides_transport_detail() {
        let err = Error::Upload("connection refused".to_string());
        assert!(!err.to_string().contains("connection refused"));
        assert!(err.to_string().contains("tente novamente"));
    }

    #[test]
    fn test_read_message_names_file() {
        let err = Error::Read {
            file: "jan.csv".to_string(),
            reason: "UTF-16 inválido".to_string(),
        };
        assert_eq!(err.to_string(), "Erro ao ler o arquivo jan.csv: UTF-16 inválido");
    }
}
