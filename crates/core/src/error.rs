//! Error types for slide-deck validation.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while validating a slide deck.
///
/// None of these are retried: any error aborts the validation run.
#[derive(Error, Debug)]
pub enum Error {
    /// Failed to open or read the input file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// The file format is not supported or could not be detected.
    #[error("Unsupported or unrecognized file format: {0}")]
    UnsupportedFormat(String),

    /// The PPTX package is missing a required part or is structurally invalid.
    #[error("PPTX parsing error: {0}")]
    PptxParseError(String),

    /// ZIP archive error (for PPTX).
    #[error("ZIP error: {0}")]
    ZipError(String),

    /// XML parsing error (for PPTX).
    #[error("XML parsing error: {0}")]
    XmlError(String),

    /// Failed to write the CSV report.
    #[error("Report error: {0}")]
    ReportError(#[from] csv::Error),

    /// The session has not passed the access gate.
    #[error("Access denied: session is not authenticated")]
    AccessDenied,

    /// An unknown rule name was requested.
    #[error("Unknown validation rule: {0}")]
    UnknownRule(String),
}
