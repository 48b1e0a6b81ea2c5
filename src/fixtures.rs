//! In-memory sample documents for unit tests.

use lopdf::{Document, Object, dictionary};
use std::io::{Cursor, Write};
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

pub fn zip_archive(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A DOCX whose body holds `words` words spread over paragraphs of ten.
pub fn docx_document(app_xml: Option<&str>, words: usize) -> Vec<u8> {
    let paragraphs: String = (0..words)
        .collect::<Vec<_>>()
        .chunks(10)
        .map(|chunk| {
            let text = chunk
                .iter()
                .map(|i| format!("word{i}"))
                .collect::<Vec<_>>()
                .join(" ");
            format!("<w:p><w:r><w:t>{text}</w:t></w:r></w:p>")
        })
        .collect();
    let body = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{paragraphs}</w:body></w:document>"#
    );

    let mut entries = vec![
        ("[Content_Types].xml", "<Types/>"),
        ("word/document.xml", body.as_str()),
    ];
    if let Some(app) = app_xml {
        entries.push(("docProps/app.xml", app));
    }
    zip_archive(&entries)
}

/// A PDF whose page tree holds `pages` leaves and declares `declared_count`.
pub fn pdf_document(pages: usize, declared_count: Option<i64>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..pages)
        .map(|_| {
            doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
            })
            .into()
        })
        .collect();

    let mut pages_dict = dictionary! {
        "Type" => "Pages",
        "Kids" => kids,
    };
    if let Some(count) = declared_count {
        pages_dict.set("Count", count);
    }
    doc.objects.insert(pages_id, Object::Dictionary(pages_dict));

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).unwrap();
    bytes
}

pub fn pdf_with_pages(pages: usize) -> Vec<u8> {
    pdf_document(pages, Some(pages as i64))
}

/// A Word 97 binary holding `text` as a single compressed (8-bit) piece.
pub fn word97_document(text: &str) -> Vec<u8> {
    const TEXT_OFFSET: usize = 0x400;
    let encoded: Vec<u8> = text.chars().map(|c| c as u8).collect();
    let cp_len = encoded.len() as u32;

    let mut word = vec![0u8; TEXT_OFFSET];
    word[0..2].copy_from_slice(&0xA5ECu16.to_le_bytes());
    word[2..4].copy_from_slice(&0x00C1u16.to_le_bytes());
    // fWhichTblStm: table stream is 1Table
    word[0x0A..0x0C].copy_from_slice(&0x0200u16.to_le_bytes());
    word[32..34].copy_from_slice(&14u16.to_le_bytes());
    word[62..64].copy_from_slice(&22u16.to_le_bytes());
    word[76..80].copy_from_slice(&cp_len.to_le_bytes());
    word[152..154].copy_from_slice(&0x005Du16.to_le_bytes());
    word.extend_from_slice(&encoded);

    let fc = ((TEXT_OFFSET * 2) as u32) | 0x4000_0000;
    let mut clx = vec![0x02u8];
    clx.extend_from_slice(&16u32.to_le_bytes());
    clx.extend_from_slice(&0u32.to_le_bytes());
    clx.extend_from_slice(&cp_len.to_le_bytes());
    clx.extend_from_slice(&[0, 0]);
    clx.extend_from_slice(&fc.to_le_bytes());
    clx.extend_from_slice(&[0, 0]);

    let fc_clx_offset = 154 + 33 * 8;
    word[fc_clx_offset..fc_clx_offset + 4].copy_from_slice(&0u32.to_le_bytes());
    word[fc_clx_offset + 4..fc_clx_offset + 8].copy_from_slice(&(clx.len() as u32).to_le_bytes());

    let mut compound = cfb::CompoundFile::create(Cursor::new(Vec::new())).unwrap();
    {
        let mut stream = compound.create_stream("/WordDocument").unwrap();
        stream.write_all(&word).unwrap();
        stream.flush().unwrap();
    }
    {
        let mut stream = compound.create_stream("/1Table").unwrap();
        stream.write_all(&clx).unwrap();
        stream.flush().unwrap();
    }
    compound.flush().unwrap();
    compound.into_inner().into_inner()
}
