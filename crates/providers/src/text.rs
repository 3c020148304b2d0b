use crate::mime::OCTET_STREAM;
use crate::{ExtractError, Extraction, MetadataExtractor};
use std::fs;
use std::io::Read;
use std::path::Path;

const DEFAULT_MAX_BYTES: usize = 64 * 1024;

/// Reads the head of text-like files. PDFs and EXIF are handled when the matching features are on.
#[derive(Debug, Clone)]
pub struct PlainTextExtractor {
    max_bytes: usize,
}

impl PlainTextExtractor {
    pub fn new(max_bytes: usize) -> Self {
        Self { max_bytes }
    }
}

impl Default for PlainTextExtractor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_BYTES)
    }
}

impl MetadataExtractor for PlainTextExtractor {
    fn extract(&self, path: &Path, mime: &str) -> Result<Extraction, ExtractError> {
        // Opening up front surfaces permission problems for every file type.
        let file = fs::File::open(path).map_err(|e| ExtractError::io(path, e))?;

        if mime == "application/pdf" {
            return pdf_extraction(path);
        }

        let mut extraction = Extraction::default();
        if mime.starts_with("image/") {
            exif_metadata(path, &mut extraction);
            return Ok(extraction);
        }
        if !is_texty(mime) && mime != OCTET_STREAM {
            return Ok(extraction);
        }

        let mut buf = Vec::with_capacity(self.max_bytes.min(8192));
        file.take(self.max_bytes as u64)
            .read_to_end(&mut buf)
            .map_err(|e| ExtractError::io(path, e))?;
        // Unknown types only count as text when they look like it.
        if mime == OCTET_STREAM && buf.contains(&0) {
            return Ok(extraction);
        }
        extraction.content = String::from_utf8_lossy(&buf).into_owned();
        Ok(extraction)
    }
}

fn is_texty(mime: &str) -> bool {
    mime.starts_with("text/")
        || mime.contains("json")
        || mime.contains("yaml")
        || mime.contains("xml")
        || mime.contains("javascript")
}

#[cfg(feature = "pdf")]
fn pdf_extraction(path: &Path) -> Result<Extraction, ExtractError> {
    use lopdf::{Document, Object};

    let mut extraction = Extraction::default();
    let doc = Document::load(path)
        .map_err(|e| ExtractError::Parse(format!("{}: {}", path.display(), e)))?;
    let info = doc
        .trailer
        .get(b"Info")
        .and_then(|obj| match obj {
            Object::Reference(id) => doc.get_object(*id),
            other => Ok(other),
        })
        .and_then(|obj| obj.as_dict());
    if let Ok(info) = info {
        for (key, value) in info.iter() {
            if let Object::String(bytes, _) = value {
                let key = String::from_utf8_lossy(key).to_lowercase();
                let key = match key.as_str() {
                    "creationdate" => "created".to_string(),
                    _ => key,
                };
                extraction.insert_metadata(&key, &decode_pdf_string(bytes));
            }
        }
    }
    extraction.content = pdf_extract::extract_text(path)
        .map_err(|e| ExtractError::Parse(format!("{}: {}", path.display(), e)))?;
    Ok(extraction)
}

#[cfg(feature = "pdf")]
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return char::decode_utf16(units)
            .map(|c| c.unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(not(feature = "pdf"))]
fn pdf_extraction(_path: &Path) -> Result<Extraction, ExtractError> {
    Ok(Extraction::default())
}

#[cfg(feature = "exif")]
fn exif_metadata(path: &Path, extraction: &mut Extraction) {
    let Ok(file) = fs::File::open(path) else {
        return;
    };
    let mut reader = std::io::BufReader::new(file);
    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(data) => {
            for field in data.fields() {
                extraction.insert_metadata(
                    &field.tag.to_string(),
                    &field.display_value().to_string(),
                );
            }
        }
        Err(e) => tracing::debug!("no exif data in {}: {}", path.display(), e),
    }
}

#[cfg(not(feature = "exif"))]
fn exif_metadata(_path: &Path, _extraction: &mut Extraction) {}
