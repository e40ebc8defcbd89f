//! Text extraction for uploaded documents and images.
//!
//! Turns a file on disk into plain UTF-8 text. Format is chosen by file
//! extension; PDFs go through `pdf-extract`, Word documents are read
//! straight out of the OOXML archive, and images are handed to the
//! `tesseract` binary. Any failure here is fatal to a pipeline run.

use std::io::Read;
use std::path::Path;

use thiserror::Error;

use crate::config::{OcrConfig, UploadsConfig};

/// Upper bound on decompressed bytes read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tiff"];
const TEXT_EXTENSIONS: &[&str] = &["txt", "md"];

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("unsupported file type: {0}")]
    UnsupportedFormat(String),
    #[error("file too large: {size} bytes (limit {limit} bytes)")]
    TooLarge { size: u64, limit: u64 },
    #[error("failed to read file: {0}")]
    Io(#[from] std::io::Error),
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("DOCX extraction failed: {0}")]
    Docx(String),
    #[error("OCR failed: {0}")]
    Ocr(String),
}

/// The document kinds we know how to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Pdf,
    Docx,
    Image,
    Text,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Result<Self, ExtractError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Ok(SourceKind::Pdf),
            "docx" => Ok(SourceKind::Docx),
            e if IMAGE_EXTENSIONS.contains(&e) => Ok(SourceKind::Image),
            e if TEXT_EXTENSIONS.contains(&e) => Ok(SourceKind::Text),
            "" => Err(ExtractError::UnsupportedFormat("(no extension)".into())),
            other => Err(ExtractError::UnsupportedFormat(format!(".{}", other))),
        }
    }
}

/// Extracts text from files according to upload limits and OCR settings.
#[derive(Debug, Clone)]
pub struct Extractor {
    max_bytes: u64,
    ocr: OcrConfig,
}

impl Extractor {
    pub fn new(uploads: &UploadsConfig, ocr: &OcrConfig) -> Self {
        Self {
            max_bytes: uploads.max_file_size_bytes(),
            ocr: ocr.clone(),
        }
    }

    /// Validate type and size, then extract. Errors are never retried.
    pub async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let kind = SourceKind::from_path(path)?;
        let size = tokio::fs::metadata(path).await?.len();
        if size > self.max_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_bytes,
            });
        }

        match kind {
            SourceKind::Text => {
                let bytes = tokio::fs::read(path).await?;
                Ok(String::from_utf8_lossy(&bytes).into_owned())
            }
            SourceKind::Pdf => {
                let bytes = tokio::fs::read(path).await?;
                spawn_parser(move || extract_pdf(&bytes)).await
            }
            SourceKind::Docx => {
                let bytes = tokio::fs::read(path).await?;
                spawn_parser(move || extract_docx(&bytes)).await
            }
            SourceKind::Image => self.ocr_image(path).await,
        }
    }

    async fn ocr_image(&self, path: &Path) -> Result<String, ExtractError> {
        // `tesseract <image> stdout -l <langs>` writes recognised text to stdout.
        let output = tokio::process::Command::new(&self.ocr.tesseract_bin)
            .arg(path)
            .arg("stdout")
            .arg("-l")
            .arg(&self.ocr.languages)
            .output()
            .await
            .map_err(|e| ExtractError::Ocr(format!("{}: {}", self.ocr.tesseract_bin, e)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(ExtractError::Ocr(format!(
                "tesseract exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

async fn spawn_parser<F>(f: F) -> Result<String, ExtractError>
where
    F: FnOnce() -> Result<String, ExtractError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ExtractError::Io(std::io::Error::other(e.to_string())))?
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked".into()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    let entry = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx("word/document.xml not found".into()))?;

    let xml = read_bounded(entry, MAX_XML_ENTRY_BYTES)?;
    docx_paragraphs(&xml).map(|paras| paras.join("\n"))
}

/// Read at most `limit` bytes. One extra byte is read so an entry of exactly
/// `limit` bytes is accepted and anything longer is not.
fn read_bounded(reader: impl Read, limit: u64) -> Result<Vec<u8>, ExtractError> {
    let mut buf = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut buf)
        .map_err(|e| ExtractError::Docx(e.to_string()))?;
    if buf.len() as u64 > limit {
        return Err(ExtractError::Docx(
            "word/document.xml exceeds size limit".into(),
        ));
    }
    Ok(buf)
}

/// Collect the text of every `w:p` paragraph, concatenating its `w:t` runs.
fn docx_paragraphs(xml: &[u8]) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    let mut reader = quick_xml::Reader::from_reader(xml);
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut in_text = false;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"p" => current.clear(),
                b"t" => in_text = true,
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t
                    .unescape()
                    .map_err(|e| ExtractError::Docx(e.to_string()))?;
                current.push_str(&text);
            }
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"tab" => current.push('\t'),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => paragraphs.push(std::mem::take(&mut current)),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Docx(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}
