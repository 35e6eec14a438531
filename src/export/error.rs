use crate::platform::{DownloadError, RasterError};

/// Message shown when a failure carries no text of its own.
pub const GENERIC_FAILURE: &str = "export failed";

/// Why an export call produced no download.
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("preview element missing")]
    PreviewMissing,
    #[error("SVG content missing")]
    ContentMissing,
    #[error("SVG element missing")]
    SvgMissing,
    #[error(transparent)]
    Raster(#[from] RasterError),
    #[error(transparent)]
    Download(#[from] DownloadError),
}

impl ExportError {
    /// The message stored in the exporter's error state.
    pub fn user_message(&self) -> String {
        message_or_generic(&self.to_string())
    }
}

fn message_or_generic(message: &str) -> String {
    if message.trim().is_empty() {
        GENERIC_FAILURE.to_string()
    } else {
        message.to_string()
    }
}
