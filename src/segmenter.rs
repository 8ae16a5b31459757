//! Key-match segmentation.
//!
//! Pages are fed in order. The key captured on each page is compared with the
//! key of the open segment, and a change of key closes that segment at the
//! previous page. A page where the pattern captures nothing carries the
//! current key forward. The open segment is always flushed by [`Segmenter::finish`].

use crate::naming::NamingPolicy;
use crate::pattern::KeyPattern;

/// A contiguous run of pages sharing one key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub start: u32,
    pub end: u32,
    pub key: String,
    pub output_name: String,
}

impl Segment {
    pub fn page_count(&self) -> u32 {
        self.end - self.start + 1
    }
}

#[derive(Debug)]
enum State {
    Idle,
    Accumulating {
        key: String,
        start: u32,
        output_name: String,
    },
}

#[derive(Debug)]
pub struct Segmenter {
    pattern: KeyPattern,
    naming: NamingPolicy,
    state: State,
    last_page: u32,
}

impl Segmenter {
    pub fn new(pattern: KeyPattern, naming: NamingPolicy) -> Self {
        Segmenter {
            pattern,
            naming,
            state: State::Idle,
            last_page: 0,
        }
    }

    pub fn pattern(&self) -> &KeyPattern {
        &self.pattern
    }

    /// Feed the text of the next page. Returns the segment closed by this page, if any.
    pub fn process_page(&mut self, page: u32, text: &str) -> Option<Segment> {
        let candidate = self.pattern.key_for(text);
        self.observe(page, candidate)
    }

    /// Feed an already extracted key for the next page.
    pub fn observe(&mut self, page: u32, candidate: Option<String>) -> Option<Segment> {
        debug_assert_eq!(page, self.last_page + 1, "pages must be fed in order");
        self.last_page = page;

        if matches!(self.state, State::Idle) {
            self.begin(page, candidate.unwrap_or_default());
            return None;
        }

        let candidate = match (&self.state, candidate) {
            (State::Accumulating { key, .. }, Some(candidate)) if candidate != *key => candidate,
            _ => return None,
        };

        let closed = self.close(page - 1);
        self.begin(page, candidate);
        closed
    }

    /// Flush the open segment at end of input. `None` only when no page was fed.
    pub fn finish(mut self) -> Option<Segment> {
        let last = self.last_page;
        self.close(last)
    }

    fn begin(&mut self, page: u32, key: String) {
        log::info!("New document at page: {} (key {:?})", page, key);
        let output_name = self.naming.name_for(&key);
        self.state = State::Accumulating {
            key,
            start: page,
            output_name,
        };
    }

    fn close(&mut self, end: u32) -> Option<Segment> {
        match std::mem::replace(&mut self.state, State::Idle) {
            State::Idle => None,
            State::Accumulating {
                key,
                start,
                output_name,
            } => Some(Segment {
                start,
                end,
                key,
                output_name,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::KeyGroup;

    fn segmenter() -> Segmenter {
        let pattern = KeyPattern::compile(r"Key: (\w+)", KeyGroup::default(), false).unwrap();
        Segmenter::new(pattern, NamingPolicy::new(None, "input"))
    }

    fn run(pages: &[&str]) -> Vec<Segment> {
        let mut seg = segmenter();
        let mut out = Vec::new();
        for (i, text) in pages.iter().enumerate() {
            out.extend(seg.process_page(i as u32 + 1, text));
        }
        out.extend(seg.finish());
        out
    }

    fn ranges(segments: &[Segment]) -> Vec<(u32, u32, &str)> {
        segments
            .iter()
            .map(|s| (s.start, s.end, s.key.as_str()))
            .collect()
    }

    #[test]
    fn test_two_segments() {
        let segments = run(&["Key: A", "Key: A", "Key: B", "Key: B", "Key: B"]);
        assert_eq!(ranges(&segments), vec![(1, 2, "A"), (3, 5, "B")]);
        assert_eq!(segments[0].output_name, "A.pdf");
        assert_eq!(segments[1].output_name, "B.pdf");
    }

    #[test]
    fn test_final_segment_is_flushed() {
        let segments = run(&["Key: A", "Key: B"]);
        assert_eq!(segments.last().map(|s| s.end), Some(2));
    }

    #[test]
    fn test_never_matching() {
        let segments = run(&["x", "y", "z", "w"]);
        assert_eq!(ranges(&segments), vec![(1, 4, "")]);
        assert_eq!(segments[0].output_name, "input.pdf");
    }

    #[test]
    fn test_key_changes_every_page() {
        let segments = run(&["Key: A", "Key: B", "Key: C"]);
        assert_eq!(ranges(&segments), vec![(1, 1, "A"), (2, 2, "B"), (3, 3, "C")]);
    }

    #[test]
    fn test_unmatched_pages_carry_forward() {
        let segments = run(&["Key: A", "continued", "Key: A", "blank", "Key: B", ""]);
        assert_eq!(ranges(&segments), vec![(1, 4, "A"), (5, 6, "B")]);
    }

    #[test]
    fn test_unmatched_first_page_starts_empty_segment() {
        let segments = run(&["cover", "Key: A", "Key: A"]);
        assert_eq!(ranges(&segments), vec![(1, 1, ""), (2, 3, "A")]);
    }

    #[test]
    fn test_repeated_key_is_new_segment() {
        let segments = run(&["Key: A", "Key: B", "Key: A"]);
        assert_eq!(ranges(&segments), vec![(1, 1, "A"), (2, 2, "B"), (3, 3, "A")]);
        assert_eq!(segments[0].output_name, segments[2].output_name);
    }

    #[test]
    fn test_keys_are_case_sensitive() {
        let segments = run(&["Key: a", "Key: A"]);
        assert_eq!(segments.len(), 2);
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(run(&[]), vec![]);
    }

    #[test]
    fn test_segments_partition_pages() {
        let keys = ["A", "A", "B", "-", "C", "C", "-", "A", "B", "B", "-"];
        let pages: Vec<String> = keys
            .iter()
            .map(|k| match *k {
                "-" => "no key".to_string(),
                k => format!("Key: {}", k),
            })
            .collect();
        let refs: Vec<&str> = pages.iter().map(String::as_str).collect();
        let segments = run(&refs);

        assert_eq!(segments.first().map(|s| s.start), Some(1));
        assert_eq!(segments.last().map(|s| s.end), Some(keys.len() as u32));
        for pair in segments.windows(2) {
            assert_eq!(pair[0].end + 1, pair[1].start);
            assert_ne!(pair[0].key, pair[1].key);
        }
        let total: u32 = segments.iter().map(Segment::page_count).sum();
        assert_eq!(total, keys.len() as u32);
    }
}
