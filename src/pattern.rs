use crate::error::{Result, SplitError};
use regex::{Captures, Regex, RegexBuilder};
use std::fmt;
use std::str::FromStr;

/// Which capture group of the key pattern holds the segment key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeyGroup {
    Index(usize),
    Name(String),
}

impl Default for KeyGroup {
    fn default() -> Self {
        KeyGroup::Index(1)
    }
}

impl FromStr for KeyGroup {
    type Err = String;

    /// Numbers select a group by position, anything else by name.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("Empty capture group".to_string());
        }
        match s.parse::<usize>() {
            Ok(0) => Err("Capture group 0 is the whole match, use 1 or higher".to_string()),
            Ok(n) => Ok(KeyGroup::Index(n)),
            Err(_) => Ok(KeyGroup::Name(s.to_string())),
        }
    }
}

impl fmt::Display for KeyGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyGroup::Index(n) => write!(f, "{}", n),
            KeyGroup::Name(name) => write!(f, "{}", name),
        }
    }
}

/// A compiled key pattern. Built once per run and never changed.
#[derive(Debug, Clone)]
pub struct KeyPattern {
    regex: Regex,
    group: KeyGroup,
}

impl KeyPattern {
    pub fn compile(pattern: &str, group: KeyGroup, case_insensitive: bool) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .multi_line(true)
            .case_insensitive(case_insensitive)
            .build()?;

        // captures_len counts the implicit whole-match group
        if regex.captures_len() < 2 {
            return Err(SplitError::NoCaptureGroups);
        }

        let exists = match &group {
            KeyGroup::Index(n) => *n >= 1 && *n < regex.captures_len(),
            KeyGroup::Name(name) => regex.capture_names().flatten().any(|n| n == name),
        };
        if !exists {
            return Err(SplitError::MissingGroup(group.to_string()));
        }

        Ok(KeyPattern { regex, group })
    }

    /// The key on a page: the key group of the first match in which it took part.
    pub fn key_for(&self, text: &str) -> Option<String> {
        self.regex
            .captures_iter(text)
            .find_map(|caps| self.key_group(&caps).map(|m| m.as_str().to_string()))
    }

    /// Every match on a page with all of its groups, for the explicit trace.
    pub fn explain(&self, text: &str) -> Vec<MatchReport> {
        self.regex
            .captures_iter(text)
            .map(|caps| {
                let whole = caps.get(0).map(|m| m.start()).unwrap_or_default();
                let groups = (1..caps.len())
                    .map(|i| GroupReport {
                        index: i,
                        text: caps.get(i).map(|m| m.as_str().to_string()),
                        position: caps.get(i).map(|m| m.start()),
                    })
                    .collect();
                MatchReport {
                    position: whole,
                    groups,
                }
            })
            .collect()
    }

    fn key_group<'t>(&self, caps: &Captures<'t>) -> Option<regex::Match<'t>> {
        match &self.group {
            KeyGroup::Index(n) => caps.get(*n),
            KeyGroup::Name(name) => caps.name(name),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchReport {
    pub position: usize,
    pub groups: Vec<GroupReport>,
}

#[derive(Debug, Clone)]
pub struct GroupReport {
    pub index: usize,
    pub text: Option<String>,
    pub position: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_group_parse() {
        assert_eq!("2".parse::<KeyGroup>().unwrap(), KeyGroup::Index(2));
        assert_eq!(
            "account".parse::<KeyGroup>().unwrap(),
            KeyGroup::Name("account".to_string())
        );
        assert!("0".parse::<KeyGroup>().is_err());
        assert!("".parse::<KeyGroup>().is_err());
    }

    #[test]
    fn test_key_from_first_group() {
        let pattern = KeyPattern::compile(r"Invoice: (\w+)", KeyGroup::default(), false).unwrap();
        assert_eq!(
            pattern.key_for("Header\nInvoice: A100\nInvoice: B200"),
            Some("A100".to_string())
        );
        assert_eq!(pattern.key_for("nothing here"), None);
    }

    #[test]
    fn test_multiline_anchors() {
        let pattern = KeyPattern::compile(r"^Account (\d+)$", KeyGroup::default(), false).unwrap();
        assert_eq!(
            pattern.key_for("Statement\nAccount 42\nTotal"),
            Some("42".to_string())
        );
    }

    #[test]
    fn test_named_group() {
        let pattern = KeyPattern::compile(
            r"(?P<kind>INV|CRN)-(?P<id>\d+)",
            KeyGroup::Name("id".to_string()),
            false,
        )
        .unwrap();
        assert_eq!(pattern.key_for("ref CRN-7781"), Some("7781".to_string()));
    }

    #[test]
    fn test_skips_matches_without_key_group() {
        let pattern = KeyPattern::compile(r"ID(?:: (\w+))?", KeyGroup::Index(1), false).unwrap();
        assert_eq!(pattern.key_for("ID\nID: X9"), Some("X9".to_string()));
    }

    #[test]
    fn test_case_insensitive_pattern() {
        let pattern = KeyPattern::compile(r"invoice: (\w+)", KeyGroup::default(), true).unwrap();
        assert_eq!(pattern.key_for("INVOICE: Ab"), Some("Ab".to_string()));
    }

    #[test]
    fn test_invalid_pattern() {
        assert!(matches!(
            KeyPattern::compile(r"(unclosed", KeyGroup::default(), false),
            Err(SplitError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_pattern_without_groups() {
        assert!(matches!(
            KeyPattern::compile(r"Invoice", KeyGroup::default(), false),
            Err(SplitError::NoCaptureGroups)
        ));
    }

    #[test]
    fn test_missing_group() {
        assert!(matches!(
            KeyPattern::compile(r"(a)(b)", KeyGroup::Index(3), false),
            Err(SplitError::MissingGroup(_))
        ));
        assert!(matches!(
            KeyPattern::compile(r"(?P<x>a)", KeyGroup::Name("y".to_string()), false),
            Err(SplitError::MissingGroup(_))
        ));
    }

    #[test]
    fn test_explain_lists_all_groups() {
        let pattern = KeyPattern::compile(r"(\w)-(\d)?", KeyGroup::default(), false).unwrap();
        let reports = pattern.explain("a-1 b-");
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0].groups[1].text.as_deref(), Some("1"));
        assert_eq!(reports[1].groups[0].position, Some(4));
        assert_eq!(reports[1].groups[1].text, None);
    }
}
