//! # Page Count Estimators
//!
//! Each supported [`DocumentFormat`] maps to exactly one [`PageCounter`]
//! strategy. Strategies are stateless unit structs; the same bytes always
//! produce the same estimate.
//!
//! ## Estimation Strategy
//!
//! - **PDF** - page tree of the document catalog ([`crate::pdf`])
//! - **DOCX / ODT** - page statistic in the embedded metadata ([`crate::office`])
//! - **PPTX** - number of slide parts in the archive ([`crate::office`])
//! - **DOC** - word density over the extracted text ([`crate::legacy_doc`])
//! - **TXT / RTF** - form feed segments, else line density
//! - **TEX** - one page per source line
//! - **HTML** - number of top-level `<section>` elements
//!
//! Heuristic estimates round up so documents are never undercounted.

use crate::file_utils::{DocumentFormat, decode_text};
use crate::legacy_doc::LegacyDocCounter;
use crate::office::{DocxCounter, OdtCounter, PptxSlideCounter};
use crate::pdf::PdfCounter;
use crate::schema::{EstimateOptions, EstimationMethod, EstimatorError, PageEstimate};
use scraper::{ElementRef, Html, Selector};

/// A page counting strategy for one family of formats.
pub trait PageCounter: Sync {
    /// Produces a page estimate from the complete document bytes.
    fn count_pages(
        &self,
        bytes: &[u8],
        options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError>;
}

impl DocumentFormat {
    /// The strategy responsible for this format.
    pub fn counter(self) -> &'static dyn PageCounter {
        match self {
            DocumentFormat::Pdf => &PdfCounter,
            DocumentFormat::Docx => &DocxCounter,
            DocumentFormat::Doc => &LegacyDocCounter,
            DocumentFormat::Html => &HtmlSectionCounter,
            DocumentFormat::Txt | DocumentFormat::Rtf => &FormFeedCounter,
            DocumentFormat::Odt => &OdtCounter,
            DocumentFormat::Tex => &TexLineCounter,
            DocumentFormat::Pptx => &PptxSlideCounter,
        }
    }
}

/// Counts whitespace-separated words.
pub fn count_words(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Converts a word count into pages, rounding up. Zero words is zero pages.
///
/// # Arguments
///
/// * `words` - Number of words in the document
/// * `options` - Supplies `words_per_page` (250 unless overridden)
///
/// # Example
///
/// ```
/// use page_counter::EstimateOptions;
/// use page_counter::estimators::pages_from_words;
///
/// let options = EstimateOptions::default();
/// assert_eq!(pages_from_words(0, &options), 0);
/// assert_eq!(pages_from_words(251, &options), 2);
/// ```
pub fn pages_from_words(words: usize, options: &EstimateOptions) -> usize {
    words.div_ceil(options.words_per_page())
}

/// Number of `\n`-delimited lines; `\r\n` counts once and empty text is one line.
fn count_lines(text: &str) -> usize {
    text.split('\n').count()
}

/// Plain text and RTF: explicit page breaks first, line density otherwise.
pub struct FormFeedCounter;

impl PageCounter for FormFeedCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let content = decode_text(bytes);

        let segments = content.split('\x0c').count();
        if segments > 1 {
            return Ok(PageEstimate::new(segments, EstimationMethod::FormFeed));
        }

        let lines = count_lines(&content);
        let pages = lines.div_ceil(options.lines_per_page()).max(1);
        Ok(PageEstimate::new(pages, EstimationMethod::LineCount))
    }
}

/// LaTeX source: one page per line, unadjusted.
pub struct TexLineCounter;

impl PageCounter for TexLineCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        _options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let lines = count_lines(&decode_text(bytes));
        Ok(PageEstimate::new(lines, EstimationMethod::LineCount))
    }
}

/// HTML: each top-level `<section>` is a page; a document without any is one page.
pub struct HtmlSectionCounter;

impl PageCounter for HtmlSectionCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        _options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let document = Html::parse_document(&decode_text(bytes));
        let selector = Selector::parse("section")
            .map_err(|e| EstimatorError::MetadataError(format!("{:?}", e)))?;

        let sections = document
            .select(&selector)
            .filter(|section| !has_section_ancestor(section))
            .count();

        Ok(PageEstimate::new(
            sections.max(1),
            EstimationMethod::SectionCount,
        ))
    }
}

fn has_section_ancestor(element: &ElementRef<'_>) -> bool {
    element
        .ancestors()
        .filter_map(ElementRef::wrap)
        .any(|ancestor| ancestor.value().name() == "section")
}
