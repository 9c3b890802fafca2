//! Error type shared by the canvas model, the export pipeline and the host.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    #[error("PDF error: {0}")]
    Pdf(#[from] printpdf::Error),

    /// The selected file is not one of the supported image types.
    #[error("Unsupported image file: {path:?}")]
    UnsupportedImage { path: PathBuf },

    #[error("No image loaded to export.")]
    NoImage,

    #[error("An export is already in progress.")]
    ExportInProgress,

    #[error("render error: {0}")]
    Render(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, AppError>;
