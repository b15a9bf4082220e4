//! Read-back of produced documents: metadata and plain text.

use std::collections::BTreeMap;

use crate::PdfError;

/// Best-effort decoding of raw PDF string bytes into a Rust `String`.
///
/// Handles three cases in order:
/// 1. UTF-16BE with BOM (`\xFE\xFF` prefix)
/// 2. Valid UTF-8
/// 3. Latin-1, each byte mapped to its Unicode code point
pub fn decode_text_simple(bytes: &[u8]) -> String {
    if let Some(payload) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let code_units: Vec<u16> = payload
            .chunks_exact(2)
            .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
            .collect();
        return String::from_utf16_lossy(&code_units);
    }

    if let Ok(s) = std::str::from_utf8(bytes) {
        return s.to_string();
    }

    bytes.iter().map(|&b| b as char).collect()
}

pub(crate) struct LoadedDocument {
    doc: lopdf::Document,
}

impl LoadedDocument {
    pub fn load_bytes(data: &[u8]) -> Result<Self, PdfError> {
        let doc = lopdf::Document::load_mem(data).map_err(|e| PdfError::Parse(e.to_string()))?;

        if doc.is_encrypted() {
            return Err(PdfError::Encrypted);
        }

        Ok(Self { doc })
    }

    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Text of every page, in page order.
    pub fn text(&self) -> Result<String, PdfError> {
        let pages: Vec<u32> = self.doc.get_pages().keys().copied().collect();
        self.doc
            .extract_text(&pages)
            .map_err(|e| PdfError::Parse(e.to_string()))
    }

    /// String entries of the trailer's Info dictionary.
    pub fn metadata(&self) -> BTreeMap<String, String> {
        let mut meta = BTreeMap::new();

        let info = match self.doc.trailer.get(b"Info") {
            Ok(lopdf::Object::Reference(id)) => match self.doc.get_object(*id) {
                Ok(lopdf::Object::Dictionary(d)) => d,
                _ => return meta,
            },
            Ok(lopdf::Object::Dictionary(d)) => d,
            _ => return meta,
        };

        for (key, value) in info.iter() {
            let value = match value {
                lopdf::Object::String(bytes, _) => decode_text_simple(bytes),
                lopdf::Object::Name(bytes) => String::from_utf8_lossy(bytes).into_owned(),
                _ => continue,
            };
            meta.insert(String::from_utf8_lossy(key).into_owned(), value);
        }

        meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_text_simple_utf8() {
        assert_eq!(decode_text_simple("Hello, world!".as_bytes()), "Hello, world!");
    }

    #[test]
    fn decode_text_simple_latin1() {
        let input: &[u8] = &[0x63, 0x61, 0x66, 0xE9];
        assert_eq!(decode_text_simple(input), "caf\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be() {
        let input: &[u8] = &[0xFE, 0xFF, 0x00, 0x41, 0x00, 0xE9];
        assert_eq!(decode_text_simple(input), "A\u{00E9}");
    }

    #[test]
    fn decode_text_simple_utf16be_empty_payload() {
        assert_eq!(decode_text_simple(&[0xFE, 0xFF]), "");
    }

    #[test]
    fn load_rejects_garbage() {
        assert!(matches!(
            LoadedDocument::load_bytes(b"not a pdf"),
            Err(PdfError::Parse(_))
        ));
    }
}
