use crate::error::Result;
use crate::pdf::PdfDocument;
use crate::segmenter::Segment;
use std::path::{Path, PathBuf};

/// Turns a finished segment into an output file.
pub trait SegmentWriter {
    /// Write `segment` as `file_name` and return where it went.
    fn materialize(&mut self, segment: &Segment, file_name: &str) -> Result<PathBuf>;
}

/// Copies page ranges of the source document into new PDFs.
pub struct PdfExtractor<'a> {
    source: &'a PdfDocument,
    output_dir: PathBuf,
}

impl<'a> PdfExtractor<'a> {
    pub fn new(source: &'a PdfDocument, output_dir: impl Into<PathBuf>) -> Self {
        PdfExtractor {
            source,
            output_dir: output_dir.into(),
        }
    }
}

impl SegmentWriter for PdfExtractor<'_> {
    fn materialize(&mut self, segment: &Segment, file_name: &str) -> Result<PathBuf> {
        let geometry = self.source.page_geometry(segment.start)?;
        let (width, height) = geometry.display_size();
        log::debug!(
            "Page {} is {}x{}pt, rotated {}°",
            segment.start,
            width,
            height,
            geometry.rotation.degrees()
        );

        let mut new_doc = self.source.extract_range(segment.start, segment.end)?;
        let path = self.output_dir.join(file_name);
        PdfDocument::save_atomic(&mut new_doc, &path)?;

        log::info!(
            "Wrote {} page(s) ({}-{}) to {}",
            segment.page_count(),
            segment.start,
            segment.end,
            path.display()
        );
        Ok(path)
    }
}

/// Resolves output paths without writing anything.
pub struct DryRun {
    output_dir: PathBuf,
}

impl DryRun {
    pub fn new<P: AsRef<Path>>(output_dir: P) -> Self {
        DryRun {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }
}

impl SegmentWriter for DryRun {
    fn materialize(&mut self, _segment: &Segment, file_name: &str) -> Result<PathBuf> {
        Ok(self.output_dir.join(file_name))
    }
}
