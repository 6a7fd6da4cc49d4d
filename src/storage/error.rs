use thiserror::Error;

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("http transport error: {0}")]
    Http(#[from] Box<ureq::Error>),

    #[error("malformed api response: {0}")]
    Json(#[from] serde_json::Error),

    // Response::into_json surfaces body read failures as io errors
    #[error("io error reading response: {0}")]
    Io(#[from] std::io::Error),

    #[error("api error {code}: {info}")]
    Api { code: String, info: String },

    #[error("page {0} not found")]
    PageNotFound(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("edit conflict on {0}")]
    EditConflict(String),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ureq::Error> for StorageError {
    fn from(err: ureq::Error) -> Self {
        StorageError::Http(Box::new(err))
    }
}
