use crate::error::Result;
use crate::pattern::{KeyGroup, KeyPattern};
use crate::pdf::text::{page_source, PageSource, TextEngine};
use crate::pdf::PdfDocument;
use std::path::Path;

#[derive(Debug, Clone)]
pub struct PageKey {
    pub page: u32,
    pub key: Option<String>,
}

/// The key the pattern captures on each page, without splitting anything.
pub fn page_keys<P: AsRef<Path>>(
    path: P,
    pattern: &KeyPattern,
    engine: TextEngine,
) -> Result<Vec<PageKey>> {
    let doc = PdfDocument::open(&path)?;
    let mut source = page_source(&doc, engine)?;
    collect_keys(source.as_mut(), pattern)
}

fn collect_keys<S>(source: &mut S, pattern: &KeyPattern) -> Result<Vec<PageKey>>
where
    S: PageSource + ?Sized,
{
    (1..=source.page_count())
        .map(|page| {
            let text = source.page_text(page)?;
            Ok(PageKey {
                page,
                key: pattern.key_for(&text),
            })
        })
        .collect()
}

pub fn run<P: AsRef<Path>>(
    path: P,
    pattern: &str,
    group: KeyGroup,
    case_insensitive: bool,
    engine: TextEngine,
) -> anyhow::Result<()> {
    let pattern = KeyPattern::compile(pattern, group, case_insensitive)?;
    let keys = page_keys(&path, &pattern, engine)?;

    for entry in &keys {
        match &entry.key {
            Some(key) => println!("p{}: {}", entry.page, key),
            None => println!("p{}: (no match)", entry.page),
        }
    }

    let matched = keys.iter().filter(|k| k.key.is_some()).count();
    println!("\n{} of {} page(s) matched.", matched, keys.len());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pdf::fixtures::{keyed_pages, write_pdf, FixturePage};

    #[test]
    fn test_page_keys() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.pdf");
        let mut pages = keyed_pages(&["A1", "A1"]);
        pages.push(FixturePage::text("summary"));
        write_pdf(&input, &pages);

        let pattern = KeyPattern::compile(r"Account: (\w+)", KeyGroup::default(), false).unwrap();
        let keys = page_keys(&input, &pattern, TextEngine::Lopdf).unwrap();

        let found: Vec<_> = keys.iter().map(|k| k.key.as_deref()).collect();
        assert_eq!(found, vec![Some("A1"), Some("A1"), None]);
    }
}
