//! Word 97-2003 (.doc) text extraction.
//!
//! The binary format is an OLE2/CFB container. The main text lives in the
//! `WordDocument` stream, scattered into pieces described by the piece table
//! (`Clx`) stored in the `0Table` or `1Table` stream. Only the main document
//! story (the first `ccpText` characters) is extracted.

use crate::estimators::{PageCounter, count_words, pages_from_words};
use crate::office::docx_body_text;
use crate::schema::{EstimateOptions, EstimationMethod, EstimatorError, PageEstimate};
use std::io::{Cursor, Read, Seek};
use std::ops::Range;

/// `wIdent` of a Word binary File Information Block.
const WORD_IDENT: u16 = 0xA5EC;
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

const FLAG_ENCRYPTED: u16 = 0x0100;
const FLAG_WHICH_TABLE: u16 = 0x0200;

/// Index of the `fcClx`/`lcbClx` pair in `FibRgFcLcb97`.
const CLX_PAIR_INDEX: usize = 33;

fn doc_error(err: impl std::fmt::Display) -> EstimatorError {
    EstimatorError::DocError(err.to_string())
}

/// `start..start + len`, failing instead of wrapping on 32-bit targets.
fn span(start: usize, len: usize) -> Result<Range<usize>, EstimatorError> {
    start
        .checked_add(len)
        .map(|end| start..end)
        .ok_or_else(|| doc_error(format!("length {len} at offset {start} overflows")))
}

fn read_u16(data: &[u8], offset: usize) -> Result<u16, EstimatorError> {
    data.get(span(offset, 2)?)
        .map(|b| u16::from_le_bytes([b[0], b[1]]))
        .ok_or_else(|| doc_error(format!("truncated structure at offset {offset}")))
}

fn read_u32(data: &[u8], offset: usize) -> Result<u32, EstimatorError> {
    data.get(span(offset, 4)?)
        .map(|b| u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| doc_error(format!("truncated structure at offset {offset}")))
}

/// Legacy Word: word density over the extracted text.
///
/// Files that are really ZIP packages (a DOCX saved with a `.doc` name) are
/// read as DOCX body text.
pub struct LegacyDocCounter;

impl PageCounter for LegacyDocCounter {
    fn count_pages(
        &self,
        bytes: &[u8],
        options: &EstimateOptions,
    ) -> Result<PageEstimate, EstimatorError> {
        let text = if bytes.starts_with(ZIP_MAGIC) {
            docx_body_text(bytes)?
        } else {
            word97_text(bytes)?
        };
        let words = count_words(&text);
        Ok(PageEstimate::new(
            pages_from_words(words, options),
            EstimationMethod::WordCount,
        ))
    }
}

/// The fields of the File Information Block needed to find the text.
#[derive(Debug)]
struct Fib {
    table_stream: &'static str,
    ccp_text: u32,
    fc_clx: usize,
    lcb_clx: usize,
}

impl Fib {
    fn parse(word: &[u8]) -> Result<Self, EstimatorError> {
        if read_u16(word, 0)? != WORD_IDENT {
            return Err(doc_error("not a Word 97-2003 document"));
        }
        let flags = read_u16(word, 0x0A)?;
        if flags & FLAG_ENCRYPTED != 0 {
            return Err(doc_error("encrypted documents are not supported"));
        }
        let table_stream = if flags & FLAG_WHICH_TABLE != 0 {
            "/1Table"
        } else {
            "/0Table"
        };

        // FibBase is 32 bytes, followed by three counted arrays.
        let csw = read_u16(word, 32)? as usize;
        let rg_lw = 34 + csw * 2 + 2;
        let cslw = read_u16(word, rg_lw - 2)? as usize;
        let ccp_text = read_u32(word, rg_lw + 3 * 4)?;

        let rg_fc_lcb = rg_lw + cslw * 4 + 2;
        let cb_rg_fc_lcb = read_u16(word, rg_fc_lcb - 2)? as usize;
        if cb_rg_fc_lcb <= CLX_PAIR_INDEX {
            return Err(doc_error("file information block has no piece table"));
        }
        let clx_pair = rg_fc_lcb + CLX_PAIR_INDEX * 8;

        Ok(Fib {
            table_stream,
            ccp_text,
            fc_clx: read_u32(word, clx_pair)? as usize,
            lcb_clx: read_u32(word, clx_pair + 4)? as usize,
        })
    }
}

/// A run of characters `[cp_start, cp_end)` stored at `fc` in `WordDocument`.
#[derive(Debug, PartialEq)]
struct Piece {
    cp_start: u32,
    cp_end: u32,
    fc: u32,
    compressed: bool,
}

fn parse_piece_table(clx: &[u8]) -> Result<Vec<Piece>, EstimatorError> {
    let mut pos = 0;
    while pos < clx.len() {
        match clx[pos] {
            // Prc: property modifiers, skipped
            0x01 => {
                let cb = read_u16(clx, pos + 1)? as usize;
                pos = span(pos, 3 + cb)?.end;
            }
            // Pcdt: the piece table proper
            0x02 => {
                let lcb = read_u32(clx, pos + 1)? as usize;
                let plc = clx
                    .get(span(pos + 5, lcb)?)
                    .ok_or_else(|| doc_error("piece table is truncated"))?;
                if lcb < 4 || (lcb - 4) % 12 != 0 {
                    return Err(doc_error(format!("invalid piece table length {lcb}")));
                }
                let count = (lcb - 4) / 12;
                let descriptors = (count + 1) * 4;
                return (0..count)
                    .map(|i| {
                        let raw_fc = read_u32(plc, descriptors + i * 8 + 2)?;
                        Ok(Piece {
                            cp_start: read_u32(plc, i * 4)?,
                            cp_end: read_u32(plc, (i + 1) * 4)?,
                            fc: raw_fc & 0x3FFF_FFFF,
                            compressed: raw_fc & 0x4000_0000 != 0,
                        })
                    })
                    .collect();
            }
            marker => {
                return Err(doc_error(format!(
                    "unexpected piece table marker 0x{marker:02x}"
                )));
            }
        }
    }
    Err(doc_error("piece table not found"))
}

fn read_stream<F: Read + Seek>(
    compound: &mut cfb::CompoundFile<F>,
    name: &str,
) -> Result<Vec<u8>, EstimatorError> {
    let mut stream = compound
        .open_stream(name)
        .map_err(|e| doc_error(format!("{name}: {e}")))?;
    let mut data = Vec::new();
    stream.read_to_end(&mut data).map_err(doc_error)?;
    Ok(data)
}

/// Plain text of the main document story of a Word 97-2003 binary.
pub(crate) fn word97_text(bytes: &[u8]) -> Result<String, EstimatorError> {
    let mut compound = cfb::CompoundFile::open(Cursor::new(bytes)).map_err(doc_error)?;
    let word = read_stream(&mut compound, "/WordDocument")?;
    let fib = Fib::parse(&word)?;
    let table = read_stream(&mut compound, fib.table_stream)?;

    let clx = table
        .get(span(fib.fc_clx, fib.lcb_clx)?)
        .ok_or_else(|| doc_error("piece table lies outside the table stream"))?;

    let mut raw = String::new();
    for piece in parse_piece_table(clx)? {
        if piece.cp_start >= fib.ccp_text {
            break;
        }
        let len = piece.cp_end.min(fib.ccp_text).saturating_sub(piece.cp_start) as usize;
        if piece.compressed {
            let start = (piece.fc / 2) as usize;
            let chunk = word
                .get(span(start, len)?)
                .ok_or_else(|| doc_error("text piece lies outside the document stream"))?;
            raw.extend(chunk.iter().map(|&b| char::from(b)));
        } else {
            let start = piece.fc as usize;
            let bytes = len
                .checked_mul(2)
                .ok_or_else(|| doc_error(format!("text piece of {len} characters overflows")))?;
            let chunk = word
                .get(span(start, bytes)?)
                .ok_or_else(|| doc_error("text piece lies outside the document stream"))?;
            let units = chunk.chunks_exact(2).map(|b| u16::from_le_bytes([b[0], b[1]]));
            raw.extend(char::decode_utf16(units).map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER)));
        }
    }

    Ok(strip_word_controls(&raw))
}

/// Drops field instructions and turns Word control marks into whitespace.
///
/// A field is `0x13 instructions [0x14 result] 0x15`; only the result is text.
fn strip_word_controls(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    // one entry per open field, true while still in its instructions
    let mut fields: Vec<bool> = Vec::new();

    for c in raw.chars() {
        match c {
            '\u{13}' => {
                fields.push(true);
                out.push(' ');
            }
            '\u{14}' => {
                if let Some(in_instructions) = fields.last_mut() {
                    *in_instructions = false;
                }
                out.push(' ');
            }
            '\u{15}' => {
                fields.pop();
                out.push(' ');
            }
            _ if fields.iter().any(|&in_instructions| in_instructions) => {}
            c if c.is_control() => out.push(' '),
            c => out.push(c),
        }
    }
    out
}
