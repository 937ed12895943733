//! Supported document extensions.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Extensions (with leading dot) that docwatch treats as documents.
pub const SUPPORTED_EXTENSIONS: &[&str] = &[".pdf", ".doc", ".docx"];

/// A document type docwatch detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentExtension {
    #[serde(rename = ".pdf")]
    Pdf,
    #[serde(rename = ".doc")]
    Doc,
    #[serde(rename = ".docx")]
    Docx,
}

impl DocumentExtension {
    /// Extension with leading dot, lowercase.
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentExtension::Pdf => ".pdf",
            DocumentExtension::Doc => ".doc",
            DocumentExtension::Docx => ".docx",
        }
    }

    /// Parse a bare extension, with or without the leading dot.
    pub fn parse(ext: &str) -> Option<Self> {
        let ext = ext.strip_prefix('.').unwrap_or(ext);
        if ext.eq_ignore_ascii_case("pdf") {
            Some(DocumentExtension::Pdf)
        } else if ext.eq_ignore_ascii_case("doc") {
            Some(DocumentExtension::Doc)
        } else if ext.eq_ignore_ascii_case("docx") {
            Some(DocumentExtension::Docx)
        } else {
            None
        }
    }

    /// Extension of a file name or path, if it is a supported document.
    ///
    /// Accepts both `/` and `\` separated paths regardless of the host OS,
    /// since command lines and window titles come from Windows processes.
    pub fn of(path: &str) -> Option<Self> {
        let name = path.rsplit(['\\', '/']).next().unwrap_or(path);
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() {
            return None;
        }
        Self::parse(ext)
    }

    /// Same as [`DocumentExtension::of`] for a native path.
    pub fn of_path(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?;
        Self::of(name)
    }
}

impl std::fmt::Display for DocumentExtension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
