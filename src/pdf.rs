//! PDF page counting from the document catalog.
//!
//! The catalog (`/Root`) references the root of the page tree, whose `/Count`
//! is the number of leaf pages. When `/Count` is missing or unusable the tree
//! is walked instead, which is what PDF readers do for damaged files.

use crate::estimators::PageCounter;
use crate::schema::{EstimateOptions, EstimationMethod, EstimatorError, PageEstimate};
use lopdf::Document;
use tracing::debug;

fn pdf_error(err: impl std::fmt::Display) -> EstimatorError {
    EstimatorError::PdfError(err.to_string())
}

/// PDF: the page tree's `/Count`, or its leaf pages when `/Count` is unusable.
///
/// Fails with [`EstimatorError::PdfError`] when the file does not parse or
/// has no catalog.
pub struct PdfCounter;

impl PageCounter for PdfCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        _options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let doc = Document::load_mem(bytes).map_err(pdf_error)?;

        let pages = match declared_page_count(&doc) {
            Some(count) => count,
            None => {
                debug!("page tree root has no usable /Count, walking the tree");
                doc.get_pages().len()
            }
        };

        Ok(PageEstimate::new(pages, EstimationMethod::DocumentCatalog))
    }
}

/// `/Count` of the page tree root referenced by the catalog.
fn declared_page_count(doc: &Document) -> Option<usize> {
    let catalog = doc.catalog().ok()?;
    let pages_id = catalog.get(b"Pages").and_then(|o| o.as_reference()).ok()?;
    let count = doc
        .get_dictionary(pages_id)
        .and_then(|pages| pages.get(b"Count"))
        .and_then(|o| o.as_i64())
        .ok()?;
    usize::try_from(count).ok()
}
