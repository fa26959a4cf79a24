//! Source ingestion: turns a file path into one text blob.
//!
//! PDFs are recognised by their `%PDF-` magic (or extension) and extracted
//! through the optional `pdf` feature; everything else is decoded with an
//! explicit character encoding.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::{Error, Result};

pub trait SourceReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct FileSourceReader {
    encoding: String,
}

impl Default for FileSourceReader {
    fn default() -> Self {
        Self { encoding: "utf-8".to_string() }
    }
}

impl FileSourceReader {
    /// `encoding` is a WHATWG label such as `utf-8`, `latin1` or `windows-1256`.
    pub fn new(encoding: impl Into<String>) -> Self {
        Self { encoding: encoding.into() }
    }

    pub fn encoding(&self) -> &str {
        &self.encoding
    }
}

impl SourceReader for FileSourceReader {
    fn read(&self, path: &Path) -> Result<String> {
        if looks_like_pdf(path) {
            tracing::info!(path = %path.display(), "source looks like a PDF; using PDF extraction");
            return read_pdf(path);
        }
        let bytes = fs::read(path).map_err(|e| source_err(path, e))?;
        tracing::debug!(path = %path.display(), bytes = bytes.len(), encoding = %self.encoding, "read text source");
        decode_text(&bytes, &self.encoding, path)
    }
}

/// True when the file starts with `%PDF-`, or, if it cannot be opened,
/// when its extension is `.pdf`.
pub fn looks_like_pdf(path: &Path) -> bool {
    let mut head = [0u8; 5];
    match fs::File::open(path).and_then(|mut f| f.read_exact(&mut head)) {
        Ok(()) => &head == b"%PDF-",
        Err(_) => path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("pdf")),
    }
}

fn decode_text(bytes: &[u8], label: &str, path: &Path) -> Result<String> {
    let encoding = Encoding::for_label(label.trim().as_bytes()).ok_or_else(|| Error::SourceRead {
        path: path.to_path_buf(),
        reason: format!("unknown text encoding '{label}'"),
    })?;
    let (text, had_errors) = encoding.decode_with_bom_removal(bytes);
    if had_errors {
        return Err(Error::SourceRead {
            path: path.to_path_buf(),
            reason: format!(
                "content is not valid {}; pass the correct encoding (e.g. latin1)",
                encoding.name()
            ),
        });
    }
    Ok(text.into_owned())
}

#[cfg(feature = "pdf")]
fn read_pdf(path: &Path) -> Result<String> {
    let text = pdf_extract::extract_text(path).map_err(|e| source_err(path, e))?;
    if text.trim().is_empty() {
        tracing::warn!(path = %path.display(), "PDF produced no text; it may be image-based");
    }
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn read_pdf(path: &Path) -> Result<String> {
    Err(Error::SourceRead {
        path: path.to_path_buf(),
        reason: "PDF support is not compiled in (enable the `pdf` feature)".to_string(),
    })
}

fn source_err(path: &Path, e: impl std::fmt::Display) -> Error {
    Error::SourceRead { path: PathBuf::from(path), reason: e.to_string() }
}
