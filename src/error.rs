use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("File I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Date parsing error: {0}")]
    DateParse(#[from] chrono::ParseError),

    #[error("GeoJSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Invalid date '{value}' on line {line}")]
    InvalidDate { value: String, line: u64 },

    #[error("Unknown {kind}: '{value}'")]
    UnknownIdentifier { kind: &'static str, value: String },

    #[error("Missing required data: {0}")]
    MissingData(String),

    #[error("Model fit failed: {0}")]
    ModelFit(String),

    #[error("Invalid data format: {0}")]
    InvalidFormat(String),

    #[error("Async task error: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

impl DashboardError {
    pub fn unknown(kind: &'static str, value: impl Into<String>) -> Self {
        DashboardError::UnknownIdentifier {
            kind,
            value: value.into(),
        }
    }

    /// Whether the error stems from caller input rather than server state.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DashboardError::UnknownIdentifier { .. }
                | DashboardError::Validation(_)
                | DashboardError::DateParse(_)
                | DashboardError::InvalidFormat(_)
        )
    }
}
