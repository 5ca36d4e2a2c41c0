//! Resume text extraction
//!
//! Pulls raw text out of uploaded pdf/doc/docx files before the
//! language model summarizes it.

use std::io::{Cursor, Read};

use regex::Regex;

use avatar_core::{Error, Result};

/// Supported upload formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeFormat {
    Pdf,
    Docx,
}

impl ResumeFormat {
    /// Map a file extension to a format; anything else is unsupported
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(ResumeFormat::Pdf),
            "doc" | "docx" => Some(ResumeFormat::Docx),
            _ => None,
        }
    }
}

/// Extract raw text from an uploaded resume
pub fn extract_text(format: ResumeFormat, bytes: &[u8]) -> Result<String> {
    match format {
        ResumeFormat::Pdf => extract_pdf(bytes),
        ResumeFormat::Docx => extract_docx(bytes),
    }
}

fn extract_pdf(bytes: &[u8]) -> Result<String> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| Error::Other(format!("pdf extraction failed: {e}")))
}

/// Pull the document body text out of the docx zip container
fn extract_docx(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .map_err(|e| Error::Other(format!("not a docx archive: {e}")))?;

    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| Error::Other(format!("docx missing document.xml: {e}")))?
        .read_to_string(&mut xml)
        .map_err(|e| Error::Other(format!("docx read failed: {e}")))?;

    Ok(strip_document_xml(&xml))
}

/// Reduce WordprocessingML to plain text: paragraph breaks become
/// newlines, all other tags are dropped, entities are decoded.
fn strip_document_xml(xml: &str) -> String {
    let with_breaks = xml.replace("</w:p>", "\n");
    let tag_re = Regex::new(r"<[^>]+>").expect("static regex");
    let text = tag_re.replace_all(&with_breaks, "");

    decode_xml_entities(&text)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn decode_xml_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
}

/// User name convention from the client: the filename prefix before the
/// first underscore identifies the user
pub fn user_name_from_filename(filename: &str) -> String {
    filename.split('_').next().unwrap_or(filename).to_string()
}

/// File extension of an uploaded filename
pub fn extension(filename: &str) -> Option<&str> {
    filename.rsplit_once('.').map(|(_, ext)| ext)
}
