pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Unknown layer type: {layer_type}")]
    UnknownLayerType { layer_type: String },

    #[error("Invalid model format: {message}")]
    InvalidModelFormat { message: String },

    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn invalid_format(message: impl Into<String>) -> Self {
        Self::InvalidModelFormat {
            message: message.into(),
        }
    }
}
