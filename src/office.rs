//! ZIP-based office formats: DOCX, ODT and PPTX.
//!
//! Every reader opens its own [`ZipArchive`] over the document bytes and drops
//! it before returning, whether the entry parsed or not.

use crate::estimators::{PageCounter, count_words, pages_from_words};
use crate::file_utils::parse_leading_number;
use crate::schema::{EstimateOptions, EstimationMethod, EstimatorError, PageEstimate};
use quick_xml::Reader;
use quick_xml::events::Event;
use std::io::{Cursor, Read};
use tracing::warn;
use zip::ZipArchive;
use zip::result::ZipError;

const DOCX_APP_PROPERTIES: &str = "docProps/app.xml";
const DOCX_BODY: &str = "word/document.xml";
const ODT_META: &str = "meta.xml";
const PPTX_SLIDE_PREFIX: &str = "ppt/slides/slide";

/// Reads one archive entry as UTF-8 text.
fn read_entry(bytes: &[u8], name: &str) -> Result<String, EstimatorError> {
    let mut archive = ZipArchive::new(Cursor::new(bytes))?;
    let mut entry = archive.by_name(name)?;
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .map_err(ZipError::from)?;
    Ok(content)
}

fn metadata_error(err: impl std::fmt::Display) -> EstimatorError {
    EstimatorError::MetadataError(err.to_string())
}

/// DOCX: `<Pages>` from the extended properties, word density as fallback.
pub struct DocxCounter;

impl PageCounter for DocxCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        match read_entry(bytes, DOCX_APP_PROPERTIES).and_then(|xml| declared_docx_pages(&xml)) {
            Ok(pages) => Ok(PageEstimate::new(
                pages.filter(|&p| p > 0).unwrap_or(1),
                EstimationMethod::EmbeddedMetadata,
            )),
            Err(err) => {
                warn!(
                    error = %err,
                    "Could not read DOCX metadata, falling back to word count estimation"
                );
                let words = count_words(&docx_body_text(bytes)?);
                Ok(PageEstimate::new(
                    pages_from_words(words, options),
                    EstimationMethod::WordCount,
                ))
            }
        }
    }
}

/// Value of the `<Pages>` property; `None` when absent or not numeric.
///
/// The whole document is read so that malformed XML anywhere is reported.
fn declared_docx_pages(xml: &str) -> Result<Option<usize>, EstimatorError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut in_pages = false;
    let mut pages = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"Pages" => in_pages = true,
            Event::End(e) if e.local_name().as_ref() == b"Pages" => in_pages = false,
            Event::Text(e) if in_pages => {
                let text = e.unescape().map_err(metadata_error)?;
                pages = parse_leading_number(&text);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

/// Raw text of the main document part, one paragraph per line pair.
pub(crate) fn docx_body_text(bytes: &[u8]) -> Result<String, EstimatorError> {
    let xml = read_entry(bytes, DOCX_BODY)?;
    let mut reader = Reader::from_str(&xml);

    let mut in_text = false;
    let mut text = String::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => text.push_str("\n\n"),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => text.push('\t'),
                b"br" | b"cr" => text.push('\n'),
                _ => {}
            },
            Event::Text(e) if in_text => {
                text.push_str(&e.unescape().map_err(metadata_error)?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text)
}

/// ODT: `meta:page-count` of the document statistics; 1 when not declared.
pub struct OdtCounter;

impl PageCounter for OdtCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        _options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let xml = read_entry(bytes, ODT_META)?;
        let pages = declared_odt_pages(&xml)?;
        Ok(PageEstimate::new(
            pages.filter(|&p| p > 0).unwrap_or(1),
            EstimationMethod::EmbeddedMetadata,
        ))
    }
}

fn declared_odt_pages(xml: &str) -> Result<Option<usize>, EstimatorError> {
    let mut reader = Reader::from_str(xml);
    let mut pages = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) | Event::Empty(e)
                if e.name().as_ref() == b"meta:document-statistic" =>
            {
                for attr in e.attributes() {
                    let attr = attr.map_err(metadata_error)?;
                    if attr.key.as_ref() == b"meta:page-count" {
                        let value = attr.unescape_value().map_err(metadata_error)?;
                        pages = parse_leading_number(&value);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(pages)
}

/// PPTX: number of `ppt/slides/slide<N>.xml` parts.
pub struct PptxSlideCounter;

impl PageCounter for PptxSlideCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        _options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let archive = ZipArchive::new(Cursor::new(bytes))?;
        let slides = archive.file_names().filter(|name| is_slide_part(name)).count();
        Ok(PageEstimate::new(slides, EstimationMethod::SlideCount))
    }
}

fn is_slide_part(name: &str) -> bool {
    name.strip_prefix(PPTX_SLIDE_PREFIX)
        .and_then(|rest| rest.strip_suffix(".xml"))
        .is_some_and(|number| !number.is_empty() && number.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{docx_document, zip_archive};
    use pretty_assertions::assert_eq;

    fn app_xml(pages: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Application>Microsoft Office Word</Application>
  <Pages>{pages}</Pages>
  <Words>1200</Words>
</Properties>"#
        )
    }

    fn meta_xml(statistic: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<office:document-meta xmlns:office="urn:oasis:names:tc:opendocument:xmlns:office:1.0" xmlns:meta="urn:oasis:names:tc:opendocument:xmlns:meta:1.0">
  <office:meta>
    <meta:generator>LibreOffice</meta:generator>
    {statistic}
  </office:meta>
</office:document-meta>"#
        )
    }

    fn count(counter: &dyn PageCounter, bytes: &[u8]) -> Result<PageEstimate, EstimatorError> {
        counter.count_pages(bytes, &EstimateOptions::default())
    }

    #[test]
    fn test_docx_reads_declared_pages() {
        let bytes = docx_document(Some(app_xml("5").as_str()), 10);
        assert_eq!(
            count(&DocxCounter, &bytes).unwrap(),
            PageEstimate::new(5, EstimationMethod::EmbeddedMetadata)
        );
    }

    #[test]
    fn test_docx_zero_or_missing_pages_is_one() {
        let zero = docx_document(Some(app_xml("0").as_str()), 2000);
        assert_eq!(count(&DocxCounter, &zero).unwrap().pages, 1);

        let no_pages = docx_document(Some("<Properties><Words>9</Words></Properties>"), 2000);
        assert_eq!(
            count(&DocxCounter, &no_pages).unwrap(),
            PageEstimate::new(1, EstimationMethod::EmbeddedMetadata)
        );
    }

    #[test]
    fn test_docx_corrupted_metadata_falls_back_to_words() {
        let bytes = docx_document(Some("<Properties><Pages>5</Page></Properties>"), 1000);
        assert_eq!(
            count(&DocxCounter, &bytes).unwrap(),
            PageEstimate::new(4, EstimationMethod::WordCount)
        );
    }

    #[test]
    fn test_docx_missing_metadata_falls_back_to_words() {
        let bytes = docx_document(None, 251);
        assert_eq!(
            count(&DocxCounter, &bytes).unwrap(),
            PageEstimate::new(2, EstimationMethod::WordCount)
        );
    }

    #[test]
    fn test_docx_fallback_with_no_words_is_zero() {
        let bytes = docx_document(None, 0);
        assert_eq!(count(&DocxCounter, &bytes).unwrap().pages, 0);
    }

    #[test]
    fn test_docx_not_an_archive_fails_after_fallback() {
        let err = count(&DocxCounter, b"not a zip file").unwrap_err();
        assert!(matches!(err, EstimatorError::ArchiveError(_)));
    }

    #[test]
    fn test_docx_body_text_joins_runs() {
        let body = r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>
            <w:p><w:r><w:t>Hel</w:t></w:r><w:r><w:t>lo</w:t></w:r><w:r><w:tab/><w:t xml:space="preserve"> big </w:t></w:r></w:p>
            <w:p><w:r><w:t>world &amp; more</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let bytes = zip_archive(&[("word/document.xml", body)]);
        let text = docx_body_text(&bytes).unwrap();
        assert_eq!(text, "Hello\t big \n\nworld & more\n\n");
        assert_eq!(count_words(&text), 5);
    }

    #[test]
    fn test_odt_reads_page_count_attribute() {
        let statistic = r#"<meta:document-statistic meta:table-count="0" meta:page-count="7" meta:word-count="900"/>"#;
        let bytes = zip_archive(&[("meta.xml", meta_xml(statistic).as_str())]);
        assert_eq!(
            count(&OdtCounter, &bytes).unwrap(),
            PageEstimate::new(7, EstimationMethod::EmbeddedMetadata)
        );
    }

    #[test]
    fn test_odt_missing_or_invalid_attribute_is_one() {
        let absent = zip_archive(&[(
            "meta.xml",
            meta_xml(r#"<meta:document-statistic meta:word-count="900"/>"#).as_str(),
        )]);
        assert_eq!(count(&OdtCounter, &absent).unwrap().pages, 1);

        let garbage = zip_archive(&[(
            "meta.xml",
            meta_xml(r#"<meta:document-statistic meta:page-count="many"/>"#).as_str(),
        )]);
        assert_eq!(count(&OdtCounter, &garbage).unwrap().pages, 1);

        let no_statistic = zip_archive(&[("meta.xml", meta_xml("").as_str())]);
        assert_eq!(count(&OdtCounter, &no_statistic).unwrap().pages, 1);
    }

    #[test]
    fn test_odt_failures_propagate() {
        let malformed = zip_archive(&[(
            "meta.xml",
            "<office:document-meta><office:meta></office:document-meta>",
        )]);
        assert!(matches!(
            count(&OdtCounter, &malformed),
            Err(EstimatorError::MetadataError(_))
        ));

        let missing = zip_archive(&[("content.xml", "<x/>")]);
        assert!(matches!(
            count(&OdtCounter, &missing),
            Err(EstimatorError::ArchiveError(_))
        ));
    }

    #[test]
    fn test_pptx_counts_slide_parts() {
        let bytes = zip_archive(&[
            ("ppt/presentation.xml", "<p:presentation/>"),
            ("ppt/slides/slide1.xml", "<p:sld/>"),
            ("ppt/slides/slide2.xml", "<p:sld/>"),
            ("ppt/slides/_rels/slide1.xml.rels", "<Relationships/>"),
            ("ppt/slideLayouts/slideLayout1.xml", "<p:sldLayout/>"),
        ]);
        assert_eq!(
            count(&PptxSlideCounter, &bytes).unwrap(),
            PageEstimate::new(2, EstimationMethod::SlideCount)
        );
    }

    #[test]
    fn test_pptx_without_slides_is_zero() {
        let bytes = zip_archive(&[("ppt/presentation.xml", "<p:presentation/>")]);
        assert_eq!(count(&PptxSlideCounter, &bytes).unwrap().pages, 0);
    }

    #[test]
    fn test_pptx_corrupt_archive_propagates() {
        assert!(matches!(
            count(&PptxSlideCounter, b"PK\x03\x04 truncated"),
            Err(EstimatorError::ArchiveError(_))
        ));
    }

    #[test]
    fn test_is_slide_part() {
        assert!(is_slide_part("ppt/slides/slide12.xml"));
        assert!(!is_slide_part("ppt/slides/slide.xml"));
        assert!(!is_slide_part("ppt/slides/slideA.xml"));
        assert!(!is_slide_part("ppt/slides/_rels/slide1.xml.rels"));
    }
}
