use sea_orm::SqlErr;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("transient network failure: {0}")]
    TransientNetwork(String),

    #[error("catalog rejected credentials: {0}")]
    Authentication(String),

    #[error("unexpected payload shape: {0}")]
    SchemaMismatch(String),

    #[error("storage conflict: {0}")]
    StorageConflict(String),

    #[error("{0}")]
    Guardrail(String),

    #[error(transparent)]
    Database(sea_orm::DbErr),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(msg)) => Self::StorageConflict(msg),
            _ => Self::Database(err),
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.is_request() {
            Self::TransientNetwork(err.to_string())
        } else if err.is_decode() {
            Self::SchemaMismatch(err.to_string())
        } else {
            Self::Other(anyhow::Error::new(err))
        }
    }
}

impl From<jiff::Error> for AppError {
    fn from(err: jiff::Error) -> Self {
        Self::Other(anyhow::Error::new(err))
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::SchemaMismatch(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        Self::Other(anyhow::Error::new(err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
