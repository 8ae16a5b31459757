use crate::error::{Result, SplitError};
use chrono::NaiveDate;
use clap::ValueEnum;
use std::collections::HashSet;

pub const OUTPUT_EXTENSION: &str = ".pdf";

/// Builds output file names from segment keys.
#[derive(Debug, Clone)]
pub struct NamingPolicy {
    date: Option<NaiveDate>,
    fallback: String,
}

impl NamingPolicy {
    /// `date` enables the `YYYYMMDD_` prefix. `fallback` stands in for an empty key.
    pub fn new(date: Option<NaiveDate>, fallback: impl Into<String>) -> Self {
        NamingPolicy {
            date,
            fallback: fallback.into(),
        }
    }

    /// Today's date when dated names are requested, sampled once.
    pub fn with_today(dated: bool, fallback: impl Into<String>) -> Self {
        let date = dated.then(|| chrono::Local::now().date_naive());
        Self::new(date, fallback)
    }

    pub fn name_for(&self, key: &str) -> String {
        let mut stem = sanitize(key);
        if stem.is_empty() {
            stem = sanitize(&self.fallback);
        }

        match self.date {
            Some(date) => format!("{}_{}{}", date.format("%Y%m%d"), stem, OUTPUT_EXTENSION),
            None => format!("{}{}", stem, OUTPUT_EXTENSION),
        }
    }
}

/// Replace characters that cannot appear in a file name.
fn sanitize(key: &str) -> String {
    key.trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// What to do when a segment asks for a name already written in this run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum CollisionPolicy {
    /// Append `_2`, `_3`, ... before the extension
    #[default]
    Suffix,
    /// Abort the run
    Fail,
    /// Replace the earlier file
    Overwrite,
}

/// Tracks names claimed during one run.
#[derive(Debug, Default)]
pub struct NameRegistry {
    policy: CollisionPolicy,
    claimed: HashSet<String>,
    reserved: HashSet<String>,
}

impl NameRegistry {
    pub fn new(policy: CollisionPolicy) -> Self {
        NameRegistry {
            policy,
            claimed: HashSet::new(),
            reserved: HashSet::new(),
        }
    }

    /// Mark `name` as never writable in this run, whatever the policy.
    /// Used for the input document when it sits in the output directory.
    pub fn reserve(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.claimed.insert(name.clone());
        self.reserved.insert(name);
    }

    /// Reserve `requested`, or a variant of it, according to the policy.
    pub fn claim(&mut self, requested: &str) -> Result<String> {
        if self.claimed.insert(requested.to_string()) {
            return Ok(requested.to_string());
        }

        let reserved = self.reserved.contains(requested);
        match self.policy {
            CollisionPolicy::Overwrite | CollisionPolicy::Fail if reserved => {
                Err(SplitError::OverwritesInput(requested.to_string()))
            }
            CollisionPolicy::Overwrite => Ok(requested.to_string()),
            CollisionPolicy::Fail => Err(SplitError::NameCollision(requested.to_string())),
            CollisionPolicy::Suffix => {
                let (stem, ext) = match requested.strip_suffix(OUTPUT_EXTENSION) {
                    Some(stem) => (stem, OUTPUT_EXTENSION),
                    None => (requested, ""),
                };
                let mut n = 2u32;
                loop {
                    let candidate = format!("{}_{}{}", stem, n, ext);
                    if self.claimed.insert(candidate.clone()) {
                        log::warn!("{} already taken, using {}", requested, candidate);
                        return Ok(candidate);
                    }
                    n += 1;
                }
            }
        }
    }
}
