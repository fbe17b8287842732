//! Document model for statement extraction
//!
//! A document is an ordered list of pages. Each page carries its text and the
//! tables detected on it. PDFs are read through `pdf-extract` (the `pdf`
//! feature); tests and callers with their own backend build documents from
//! pages directly.

use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{Error, Result};

/// A table as a grid of cells; the first row is the header
///
/// Cells are optional because some layouts leave merged or blank cells with
/// no text at all.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    pub rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Build a table where every cell is present
    pub fn from_rows<R, C, S>(rows: R) -> Self
    where
        R: IntoIterator<Item = C>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            rows: rows
                .into_iter()
                .map(|row| row.into_iter().map(|cell| Some(cell.into())).collect())
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn header(&self) -> Option<&[Option<String>]> {
        self.rows.first().map(|r| r.as_slice())
    }
}

/// One page of a document
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub text: String,
    pub tables: Vec<Table>,
}

impl Page {
    /// Page with text and no tables
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tables: Vec::new(),
        }
    }

    /// Page whose tables are detected from its text layout
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        let tables = detect_tables(&text);
        Self { text, tables }
    }

    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        self.tables = tables;
        self
    }
}

/// An ordered collection of pages
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub pages: Vec<Page>,
}

impl Document {
    pub fn from_pages(pages: Vec<Page>) -> Self {
        Self { pages }
    }

    /// Read a PDF from memory
    ///
    /// Pages are split on form feeds and tables detected from the text layout.
    #[cfg(feature = "pdf")]
    pub fn from_pdf_bytes(bytes: &[u8]) -> Result<Self> {
        let full_text = pdf_extract::extract_text_from_mem(bytes)
            .map_err(|e| Error::Document(format!("failed to read PDF text: {}", e)))?;
        Ok(Self::from_extracted_text(&full_text))
    }

    #[cfg(not(feature = "pdf"))]
    pub fn from_pdf_bytes(_bytes: &[u8]) -> Result<Self> {
        Err(Error::BackendUnavailable(
            "tally-core was built without the `pdf` feature".to_string(),
        ))
    }

    /// Read a PDF file
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::NotFound(format!("PDF not found: {}", path.display())));
        }
        let bytes = std::fs::read(path)?;
        Self::from_pdf_bytes(&bytes)
    }

    /// Build pages from backend text where pages are separated by form feeds
    pub fn from_extracted_text(full_text: &str) -> Self {
        let pages: Vec<Page> = full_text
            .split('\u{000C}')
            .filter(|s| !s.trim().is_empty())
            .map(Page::from_text)
            .collect();
        debug!(
            "Loaded {} pages ({} tables detected)",
            pages.len(),
            pages.iter().map(|p| p.tables.len()).sum::<usize>()
        );
        Self { pages }
    }

    /// All page texts joined with newlines
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn column_gap_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\t+| {2,}").expect("column gap regex"))
}

/// Split a text line into cells on column gaps (tabs or runs of 2+ spaces)
fn split_cells(line: &str) -> Vec<String> {
    column_gap_re()
        .split(line.trim())
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect()
}

/// Best-effort table detection from laid-out text
///
/// A run of consecutive lines that each split into two or more cells forms a
/// table whose first line is the header. A blank or single-cell line ends it.
pub fn detect_tables(text: &str) -> Vec<Table> {
    let mut tables = Vec::new();
    let mut current: Vec<Vec<Option<String>>> = Vec::new();

    for line in text.lines() {
        let line = line.replace('\u{00A0}', " ");
        let cells = split_cells(&line);
        if cells.len() >= 2 {
            current.push(cells.into_iter().map(Some).collect());
        } else if !current.is_empty() {
            tables.push(Table {
                rows: std::mem::take(&mut current),
            });
        }
    }
    if !current.is_empty() {
        tables.push(Table { rows: current });
    }

    tables
}
