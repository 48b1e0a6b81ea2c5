//! Data structures and types for page count estimation.
//!
//! This module defines the core types used throughout the page counter library,
//! including error types, configuration options, and result structures.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during page count estimation.
///
/// Only the DOCX estimator recovers from metadata errors locally; every other
/// variant reaches the caller unchanged.
#[derive(Debug, Error)]
pub enum EstimatorError {
    /// The declared format tag is not one of the supported formats.
    #[error("Unsupported file type: {0}")]
    UnsupportedFormat(String),
    /// The document could not be read from storage.
    #[error("Could not read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The ZIP container of a DOCX, ODT or PPTX file is corrupt or lacks an entry.
    #[error("Archive error: {0}")]
    ArchiveError(#[from] zip::result::ZipError),
    /// Embedded XML metadata is malformed.
    #[error("Metadata parse error: {0}")]
    MetadataError(String),
    /// An error occurred while parsing a PDF document.
    #[error("PDF parse error: {0}")]
    PdfError(String),
    /// The legacy Word binary could not be decoded.
    #[error("DOC parse error: {0}")]
    DocError(String),
}

impl From<quick_xml::Error> for EstimatorError {
    fn from(err: quick_xml::Error) -> Self {
        EstimatorError::MetadataError(err.to_string())
    }
}

/// How a page count was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EstimationMethod {
    /// Page tree of a PDF document catalog.
    DocumentCatalog,
    /// A page statistic declared in the document's own properties.
    EmbeddedMetadata,
    /// Word density heuristic.
    WordCount,
    /// Segments between form feed characters.
    FormFeed,
    /// Line density heuristic.
    LineCount,
    /// Number of top-level `<section>` elements.
    SectionCount,
    /// Number of slide parts in a presentation.
    SlideCount,
}

/// The result of a page count estimation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageEstimate {
    /// Estimated total page count for the document.
    pub pages: usize,
    /// Strategy that produced `pages`.
    pub method: EstimationMethod,
}

impl PageEstimate {
    /// Creates a new estimate.
    ///
    /// # Arguments
    ///
    /// * `pages` - Estimated page count
    /// * `method` - Strategy that produced the count
    pub fn new(pages: usize, method: EstimationMethod) -> Self {
        Self { pages, method }
    }
}

/// Configuration options for the heuristic estimators.
///
/// All fields are optional when deserialized. When not provided, the defaults
/// below are used.
///
/// # Examples
///
/// Using the defaults (250 words, 50 lines per page):
/// ```json
/// {}
/// ```
///
/// Denser text layout:
/// ```json
/// { "words_per_page": 500, "lines_per_page": 60 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimateOptions {
    /// Words per page for DOC files and the DOCX fallback.
    pub words_per_page: usize,
    /// Lines per page for TXT and RTF files without form feeds.
    pub lines_per_page: usize,
}

impl EstimateOptions {
    pub(crate) fn words_per_page(&self) -> usize {
        self.words_per_page.max(1)
    }

    pub(crate) fn lines_per_page(&self) -> usize {
        self.lines_per_page.max(1)
    }
}

impl Default for EstimateOptions {
    fn default() -> Self {
        Self {
            words_per_page: 250,
            lines_per_page: 50,
        }
    }
}
