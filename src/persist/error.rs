use polars::error::PolarsError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("Nothing to write, call fetch first")]
    NotFetched,

    #[error("No GLM table to write, call convert_to_glm_format first")]
    NotConverted,

    #[error("Output directory '{0}' does not exist or is not a directory")]
    DirectoryMissing(PathBuf),

    #[error("Invalid output file name '{0}'")]
    InvalidFileName(String),

    #[error("I/O error writing '{0}'")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Encoding error writing CSV '{0}'")]
    CsvWrite(PathBuf, #[source] PolarsError),

    #[error("Encoding error writing JSON '{0}'")]
    JsonWrite(PathBuf, #[source] serde_json::Error),

    #[error("Failed writing zip archive '{0}'")]
    Zip(PathBuf, #[source] zip::result::ZipError),
}
