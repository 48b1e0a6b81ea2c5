//! # Assembly Module
//!
//! JSON bridge for callers that hold document bytes rather than a file, such
//! as JavaScript through WebAssembly.
//!
//! [`estimate_document_json`] is always available. With the `wasm` feature the
//! module also exports `estimate_document` and `estimate_document_base64` via
//! `wasm-bindgen`, which return the same JSON serialized to a string.
//!
//! ## Success Response
//!
//! ```json
//! { "file": "report.pdf", "format": "pdf", "pages": 12, "method": "document_catalog" }
//! ```
//!
//! ## Error Response
//!
//! ```json
//! { "file": "notes.xyz", "error": "Unsupported file type: xyz" }
//! ```

use crate::file_utils::DocumentFormat;
use crate::schema::EstimateOptions;
use serde_json::{Value, json};

/// Estimates the page count of in-memory document bytes.
///
/// # Parameters
///
/// * `bytes` - The complete binary content of the document.
/// * `filename` - Filename including extension; the extension selects the
///   estimator.
/// * `options_json` - Optional JSON matching [`EstimateOptions`]. When absent
///   or invalid, the defaults are used.
pub fn estimate_document_json(bytes: &[u8], filename: &str, options_json: Option<&str>) -> Value {
    let options: EstimateOptions = match options_json {
        Some(s) => serde_json::from_str(s).unwrap_or_default(),
        None => EstimateOptions::default(),
    };

    let result = DocumentFormat::from_filename(filename).and_then(|format| {
        crate::estimate_bytes(bytes, format, &options).map(|estimate| (format, estimate))
    });

    match result {
        Ok((format, estimate)) => json!({
            "file": filename,
            "format": format,
            "pages": estimate.pages,
            "method": estimate.method,
        }),
        Err(err) => json!({"file": filename, "error": err.to_string()}),
    }
}

#[cfg(feature = "wasm")]
mod bindings {
    use super::estimate_document_json;
    use base64::Engine;
    use serde_json::json;
    use wasm_bindgen::JsValue;
    use wasm_bindgen::prelude::wasm_bindgen;

    /// Estimates the number of pages in a document from raw byte data.
    ///
    /// ```javascript
    /// const result = JSON.parse(estimate_document(new Uint8Array(data), "report.docx", null));
    /// if (result.error) console.error(result.error);
    /// else console.log(`${result.pages} pages`);
    /// ```
    #[wasm_bindgen]
    pub fn estimate_document(bytes: &[u8], filename: String, options_json: Option<String>) -> JsValue {
        let value = estimate_document_json(bytes, &filename, options_json.as_deref());
        JsValue::from_str(&value.to_string())
    }

    /// Base64 convenience wrapper around `estimate_document`.
    #[wasm_bindgen]
    pub fn estimate_document_base64(
        base64_bytes: &str,
        filename: String,
        options_json: Option<String>,
    ) -> JsValue {
        match base64::engine::general_purpose::STANDARD.decode(base64_bytes) {
            Ok(bytes) => estimate_document(&bytes, filename, options_json),
            Err(e) => JsValue::from_str(
                &json!({"file": filename, "error": format!("base64 decode failed: {e}")})
                    .to_string(),
            ),
        }
    }
}
