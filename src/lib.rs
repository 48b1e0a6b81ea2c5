//! Page count estimation for uploaded documents.
//!
//! The format is taken from the filename suffix and never sniffed from the
//! content. Each format is handled by one [`PageCounter`] strategy; see
//! [`estimators`] for the table.
//!
//! ```no_run
//! use page_counter::{DocumentFormat, estimate};
//!
//! let format = DocumentFormat::from_filename("thesis.pdf")?;
//! let estimate = estimate("uploads/thesis.pdf", format)?;
//! println!("{} pages", estimate.pages);
//! # Ok::<(), page_counter::EstimatorError>(())
//! ```

pub mod assembly;
pub mod estimators;
pub mod file_utils;
mod legacy_doc;
mod office;
mod pdf;
pub mod schema;
#[cfg(feature = "server")]
pub mod server;

#[cfg(test)]
mod fixtures;

use std::path::Path;
use tracing::debug;

pub use estimators::PageCounter;
pub use file_utils::DocumentFormat;
pub use schema::{EstimateOptions, EstimationMethod, EstimatorError, PageEstimate};

/// Estimates the page count of the file at `path`, declared to be `format`.
///
/// The format is trusted as declared; the file's content is not sniffed.
///
/// # Arguments
///
/// * `path` - Document on disk
/// * `format` - Format selecting the estimation strategy
///
/// # Returns
///
/// The page count and the method used, or an [`EstimatorError`] when the
/// file cannot be read or parsed.
pub fn estimate(
    path: impl AsRef<Path>,
    format: DocumentFormat,
) -> Result<PageEstimate, EstimatorError> {
    estimate_with_options(path, format, &EstimateOptions::default())
}

/// [`estimate`] with explicit heuristic densities.
pub fn estimate_with_options(
    path: impl AsRef<Path>,
    format: DocumentFormat,
    options: &EstimateOptions,
) -> Result<PageEstimate, EstimatorError> {
    let path = path.as_ref();
    let bytes = file_utils::read_document(path)?;
    debug!(path = %path.display(), %format, size = bytes.len(), "estimating page count");
    estimate_bytes(&bytes, format, options)
}

/// Estimates the page count of an in-memory document.
pub fn estimate_bytes(
    bytes: &[u8],
    format: DocumentFormat,
    options: &EstimateOptions,
) -> Result<PageEstimate, EstimatorError> {
    let estimate = format.counter().count_pages(bytes, options)?;
    debug!(%format, pages = estimate.pages, method = ?estimate.method, "page count estimated");
    Ok(estimate)
}

/// Estimates a file whose format is taken from its own name.
///
/// Fails with [`EstimatorError::UnsupportedFormat`] when the extension is not
/// one of [`DocumentFormat::ALL`].
pub fn estimate_file(path: impl AsRef<Path>) -> Result<PageEstimate, EstimatorError> {
    let path = path.as_ref();
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_default();
    let format = DocumentFormat::from_filename(&name)?;
    estimate(path, format)
}
