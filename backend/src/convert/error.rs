//! Error taxonomy for the conversion pipeline

use thiserror::Error;

/// Errors a conversion attempt can end in
#[derive(Error, Debug)]
pub enum ConvertError {
    /// The source file could not be read into its transportable form
    #[error("failed to read file: {0}")]
    Read(String),

    /// The network call could not be completed
    #[error("conversion request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The remote service answered with a non-success status
    #[error("conversion service error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The service reported success but returned no usable output file
    #[error("the conversion returned no output file")]
    EmptyResult,
}
