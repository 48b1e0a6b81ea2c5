use crate::schema::EstimatorError;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Document formats the estimator knows how to count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Pdf,
    Docx,
    Doc,
    Html,
    Txt,
    Rtf,
    Odt,
    Tex,
    Pptx,
}

impl DocumentFormat {
    /// Every supported format, in the order their tags are listed to users.
    pub const ALL: [DocumentFormat; 9] = [
        DocumentFormat::Pdf,
        DocumentFormat::Docx,
        DocumentFormat::Doc,
        DocumentFormat::Html,
        DocumentFormat::Txt,
        DocumentFormat::Rtf,
        DocumentFormat::Odt,
        DocumentFormat::Tex,
        DocumentFormat::Pptx,
    ];

    /// The lower-case extension tag for this format.
    pub fn as_str(self) -> &'static str {
        match self {
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Docx => "docx",
            DocumentFormat::Doc => "doc",
            DocumentFormat::Html => "html",
            DocumentFormat::Txt => "txt",
            DocumentFormat::Rtf => "rtf",
            DocumentFormat::Odt => "odt",
            DocumentFormat::Tex => "tex",
            DocumentFormat::Pptx => "pptx",
        }
    }

    /// Derives the format from a filename's trailing suffix.
    ///
    /// The suffix is everything after the last `.`, compared case-insensitively.
    /// Content is never inspected. A name without a dot is treated as its own
    /// suffix, which is never a supported tag.
    ///
    /// # Example
    ///
    /// ```
    /// use page_counter::DocumentFormat;
    ///
    /// assert_eq!(DocumentFormat::from_filename("Report.PDF").unwrap(), DocumentFormat::Pdf);
    /// assert!(DocumentFormat::from_filename("archive.tar.xyz").is_err());
    /// ```
    pub fn from_filename(filename: &str) -> Result<Self, EstimatorError> {
        let suffix = filename
            .rsplit_once('.')
            .map_or(filename, |(_, ext)| ext);
        suffix.parse()
    }
}

impl FromStr for DocumentFormat {
    type Err = EstimatorError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let lower = tag.to_lowercase();
        DocumentFormat::ALL
            .into_iter()
            .find(|format| format.as_str() == lower)
            .ok_or(EstimatorError::UnsupportedFormat(lower))
    }
}

impl fmt::Display for DocumentFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reads a whole document, attaching the path to any I/O failure.
pub fn read_document(path: &Path) -> Result<Vec<u8>, EstimatorError> {
    std::fs::read(path).map_err(|source| EstimatorError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reduces a client-supplied filename to a safe single path component.
///
/// Directory parts are dropped and every character outside
/// `[A-Za-z0-9._-]` becomes `_`. Names that reduce to nothing, `.` or `..`
/// become `upload`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() || cleaned.chars().all(|c| c == '.') {
        "upload".into()
    } else {
        cleaned
    }
}

/// Decodes document text, replacing invalid UTF-8 sequences.
pub fn decode_text(bytes: &[u8]) -> std::borrow::Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Parses the leading decimal digits of a metadata value.
///
/// Surrounding whitespace is ignored; `None` when no digit leads the value.
pub fn parse_leading_number(value: &str) -> Option<usize> {
    let trimmed = value.trim();
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    trimmed[..end].parse().ok()
}
