use crate::error::{Result, SplitError};
use lopdf::{Document, Object, ObjectId};
use std::io::Write;
use std::path::{Path, PathBuf};

/// US Letter, used when no page in the tree declares a MediaBox.
const DEFAULT_MEDIA_BOX: [f32; 4] = [0.0, 0.0, 612.0, 792.0];

pub struct PdfDocument {
    pub doc: Document,
    pub path: PathBuf,
}

impl PdfDocument {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let doc = Document::load(path).map_err(|source| SplitError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(PdfDocument {
            doc,
            path: path.to_path_buf(),
        })
    }

    #[cfg(test)]
    pub fn from_document(doc: Document, path: impl Into<PathBuf>) -> Self {
        PdfDocument {
            doc,
            path: path.into(),
        }
    }

    pub fn page_count(&self) -> u32 {
        self.doc.get_pages().len() as u32
    }

    /// Get 1-indexed page object IDs
    pub fn page_ids(&self) -> Vec<(u32, ObjectId)> {
        let mut pages: Vec<_> = self.doc.get_pages().into_iter().collect();
        pages.sort_by_key(|(num, _)| *num);
        pages
    }

    fn page_id(&self, page: u32) -> Result<ObjectId> {
        self.doc
            .get_pages()
            .get(&page)
            .copied()
            .ok_or(SplitError::PageOutOfRange {
                page,
                total: self.page_count(),
            })
    }

    /// Size and rotation of a page, resolving attributes inherited from the page tree.
    pub fn page_geometry(&self, page: u32) -> Result<PageGeometry> {
        let page_id = self.page_id(page)?;

        let media_box = self
            .inherited(page_id, b"MediaBox")
            .and_then(|obj| parse_rect(&self.doc, obj))
            .unwrap_or(DEFAULT_MEDIA_BOX);

        let rotation = self
            .inherited(page_id, b"Rotate")
            .and_then(|obj| obj.as_i64().ok())
            .map(Rotation::from_degrees)
            .unwrap_or(Rotation::None);

        Ok(PageGeometry {
            media_box,
            rotation,
        })
    }

    /// Walk from a page up through its `Parent` chain looking for `key`.
    fn inherited(&self, page_id: ObjectId, key: &[u8]) -> Option<&Object> {
        let mut node = self.doc.get_dictionary(page_id).ok()?;
        // Bounded walk, page trees with cycles exist in the wild
        for _ in 0..64 {
            if let Ok(value) = node.get(key) {
                return Some(value);
            }
            let parent = node.get(b"Parent").ok()?.as_reference().ok()?;
            node = self.doc.get_dictionary(parent).ok()?;
        }
        None
    }

    /// Copy pages `start..=end` into a new document, in order.
    pub fn extract_range(&self, start: u32, end: u32) -> Result<Document> {
        let total = self.page_count();
        for page in [start, end] {
            if page == 0 || page > total {
                return Err(SplitError::PageOutOfRange { page, total });
            }
        }

        let mut new_doc = self.doc.clone();

        let pages_to_delete: Vec<u32> = self
            .page_ids()
            .iter()
            .map(|(num, _)| *num)
            .filter(|num| *num < start || *num > end)
            .collect();

        if !pages_to_delete.is_empty() {
            new_doc.delete_pages(&pages_to_delete);
            new_doc.prune_objects();
        }

        Ok(new_doc)
    }

    /// Save through a temporary file in the target directory, renamed into place
    /// only once the whole document is written. On failure nothing is left at `path`.
    pub fn save_atomic<P: AsRef<Path>>(doc: &mut Document, path: P) -> Result<()> {
        let path = path.as_ref();
        let write_err = |source: anyhow::Error| SplitError::Write {
            path: path.to_path_buf(),
            source,
        };

        let dir = match path.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };

        let mut tmp = tempfile::Builder::new()
            .prefix(".keysplit-")
            .suffix(".part")
            .tempfile_in(dir)
            .map_err(|e| write_err(e.into()))?;

        doc.save_to(tmp.as_file_mut())
            .map_err(|e| write_err(e.into()))?;
        tmp.as_file_mut()
            .flush()
            .map_err(|e| write_err(e.into()))?;
        tmp.persist(path).map_err(|e| write_err(e.error.into()))?;

        Ok(())
    }
}

/// Page rotation, from the `/Rotate` entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rotation {
    None,
    Right, // 90° clockwise
    Down,  // 180°
    Left,  // 270° clockwise
}

impl Rotation {
    pub fn from_degrees(degrees: i64) -> Self {
        match degrees.rem_euclid(360) {
            90 => Rotation::Right,
            180 => Rotation::Down,
            270 => Rotation::Left,
            _ => Rotation::None,
        }
    }

    pub fn degrees(self) -> i64 {
        match self {
            Rotation::None => 0,
            Rotation::Right => 90,
            Rotation::Down => 180,
            Rotation::Left => 270,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageGeometry {
    pub media_box: [f32; 4],
    pub rotation: Rotation,
}

impl PageGeometry {
    /// Width and height as displayed, after rotation.
    pub fn display_size(&self) -> (f32, f32) {
        let [x0, y0, x1, y1] = self.media_box;
        let (w, h) = ((x1 - x0).abs(), (y1 - y0).abs());
        match self.rotation {
            Rotation::Right | Rotation::Left => (h, w),
            _ => (w, h),
        }
    }
}

fn parse_rect(doc: &Document, obj: &Object) -> Option<[f32; 4]> {
    let obj = match obj {
        Object::Reference(id) => doc.get_object(*id).ok()?,
        other => other,
    };
    let values: Vec<f32> = obj
        .as_array()
        .ok()?
        .iter()
        .filter_map(|v| v.as_float().ok())
        .collect();
    match values.as_slice() {
        [a, b, c, d] => Some([*a, *b, *c, *d]),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{build_pdf, FixturePage};

    fn sample() -> PdfDocument {
        let doc = build_pdf(&[
            FixturePage::text("Key: A"),
            FixturePage::text("Key: A").rotated(90),
            FixturePage::text("Key: B").sized(0, 0, 842, 595),
            FixturePage::text("Key: B"),
        ]);
        PdfDocument::from_document(doc, "sample.pdf")
    }

    #[test]
    fn test_page_count() {
        assert_eq!(sample().page_count(), 4);
    }

    #[test]
    fn test_inherited_geometry() {
        let geometry = sample().page_geometry(1).unwrap();
        assert_eq!(geometry.media_box, [0.0, 0.0, 595.0, 842.0]);
        assert_eq!(geometry.rotation, Rotation::None);
    }

    #[test]
    fn test_page_level_geometry() {
        let doc = sample();
        assert_eq!(doc.page_geometry(2).unwrap().rotation, Rotation::Right);
        assert_eq!(doc.page_geometry(2).unwrap().display_size(), (842.0, 595.0));
        assert_eq!(
            doc.page_geometry(3).unwrap().media_box,
            [0.0, 0.0, 842.0, 595.0]
        );
    }

    #[test]
    fn test_geometry_out_of_range() {
        assert!(matches!(
            sample().page_geometry(5),
            Err(SplitError::PageOutOfRange { page: 5, total: 4 })
        ));
    }

    #[test]
    fn test_rotation_degrees() {
        assert_eq!(Rotation::from_degrees(-90), Rotation::Left);
        assert_eq!(Rotation::from_degrees(450), Rotation::Right);
        assert_eq!(Rotation::Down.degrees(), 180);
    }

    #[test]
    fn test_extract_range_keeps_geometry() {
        let source = sample();
        let extracted = PdfDocument::from_document(source.extract_range(2, 3).unwrap(), "out.pdf");
        assert_eq!(extracted.page_count(), 2);
        assert_eq!(
            extracted.page_geometry(1).unwrap(),
            source.page_geometry(2).unwrap()
        );
        assert_eq!(
            extracted.page_geometry(2).unwrap(),
            source.page_geometry(3).unwrap()
        );
    }

    #[test]
    fn test_extract_range_out_of_range() {
        assert!(matches!(
            sample().extract_range(3, 9),
            Err(SplitError::PageOutOfRange { page: 9, total: 4 })
        ));
        assert!(sample().extract_range(0, 1).is_err());
    }

    #[test]
    fn test_save_atomic() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("A.pdf");
        let mut doc = sample().extract_range(1, 2).unwrap();
        PdfDocument::save_atomic(&mut doc, &path).unwrap();

        assert_eq!(PdfDocument::open(&path).unwrap().page_count(), 2);
        let leftovers: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().ends_with(".part"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[test]
    fn test_save_atomic_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("A.pdf");
        let mut doc = sample().extract_range(1, 1).unwrap();
        assert!(matches!(
            PdfDocument::save_atomic(&mut doc, &path),
            Err(SplitError::Write { .. })
        ));
        assert!(!path.exists());
    }
}
