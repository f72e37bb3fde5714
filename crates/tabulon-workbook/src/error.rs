use thiserror::Error;

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("{backend}: {message}")]
    Backend { backend: String, message: String },

    #[error("sheet `{0}` not found in workbook")]
    SheetNotFound(String),

    #[error("unsupported {feature}: {context}")]
    Unsupported { feature: String, context: String },

    #[error("failed to encode {format}: {message}")]
    Encode { format: String, message: String },
}

impl IoError {
    pub fn from_backend(backend: &str, err: impl std::fmt::Display) -> Self {
        IoError::Backend {
            backend: backend.to_string(),
            message: err.to_string(),
        }
    }
}
