use crate::error::{Result, SplitError};
use crate::pdf::PdfDocument;
use clap::ValueEnum;
use std::path::Path;

/// Anything that can hand out page text one page at a time.
pub trait PageSource {
    fn page_count(&self) -> u32;

    /// Text of a 1-indexed page.
    fn page_text(&mut self, page: u32) -> Result<String>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum TextEngine {
    /// Per-page extraction with lopdf
    #[default]
    Lopdf,
    /// Whole-document extraction with pdf-extract, split by page
    PdfExtract,
}

/// Build the page source for `engine` over an opened document.
pub fn page_source<'a>(
    doc: &'a PdfDocument,
    engine: TextEngine,
) -> Result<Box<dyn PageSource + 'a>> {
    let source: Box<dyn PageSource + 'a> = match engine {
        TextEngine::Lopdf => Box::new(LopdfText::new(doc)),
        TextEngine::PdfExtract => Box::new(PdfExtractText::load(&doc.path, doc.page_count())?),
    };
    Ok(source)
}

/// Reads text lazily, page by page, from the open document.
pub struct LopdfText<'a> {
    doc: &'a PdfDocument,
    total: u32,
}

impl<'a> LopdfText<'a> {
    pub fn new(doc: &'a PdfDocument) -> Self {
        LopdfText {
            doc,
            total: doc.page_count(),
        }
    }
}

impl PageSource for LopdfText<'_> {
    fn page_count(&self) -> u32 {
        self.total
    }

    fn page_text(&mut self, page: u32) -> Result<String> {
        if page == 0 || page > self.total {
            return Err(SplitError::PageOutOfRange {
                page,
                total: self.total,
            });
        }
        self.doc
            .doc
            .extract_text(&[page])
            .map_err(|e| SplitError::PageText {
                page,
                source: e.into(),
            })
    }
}

/// pdf-extract has no lazy per-page API, so the document is extracted up front.
pub struct PdfExtractText {
    pages: Vec<String>,
}

impl PdfExtractText {
    pub fn load<P: AsRef<Path>>(path: P, expected_pages: u32) -> Result<Self> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|source| SplitError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes).map_err(|source| {
            SplitError::DocumentText {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let found = pages.len() as u32;
        if found != expected_pages {
            return Err(SplitError::PageCountMismatch {
                expected: expected_pages,
                found,
            });
        }

        Ok(PdfExtractText { pages })
    }
}

impl PageSource for PdfExtractText {
    fn page_count(&self) -> u32 {
        self.pages.len() as u32
    }

    fn page_text(&mut self, page: u32) -> Result<String> {
        let total = self.page_count();
        if page == 0 || page > total {
            return Err(SplitError::PageOutOfRange { page, total });
        }
        // Each page is consumed once, no need to keep it around
        Ok(std::mem::take(&mut self.pages[(page - 1) as usize]))
    }
}
