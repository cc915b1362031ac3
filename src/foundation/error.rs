/// Convenience result type used across viewcap.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// Top-level error taxonomy used by capture and export APIs.
///
/// Setup failures (`Validation`, `Unsupported`) surface before any frame is rendered. Everything
/// else aborts an export that is already running.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// Invalid user-provided settings.
    #[error("validation error: {0}")]
    Validation(String),

    /// A codec, container or encoder configuration that cannot be resolved.
    #[error("unsupported configuration: {0}")]
    Unsupported(String),

    /// Renderer or readback failure while producing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Still-image or video encoder failure.
    #[error("encode error: {0}")]
    Encode(String),

    /// The export was cancelled at a frame boundary.
    #[error("export cancelled")]
    Cancelled,

    /// File or pipe IO failure.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Wrapped lower-level error from dependencies.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CaptureError {
    /// Build a [`CaptureError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CaptureError::Unsupported`] value.
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`CaptureError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`CaptureError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Return `true` for errors raised while validating an export, before rendering starts.
    pub fn is_setup(&self) -> bool {
        matches!(self, Self::Validation(_) | Self::Unsupported(_))
    }
}

impl From<image::ImageError> for CaptureError {
    fn from(e: image::ImageError) -> Self {
        Self::Encode(e.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
