use crate::error::{Result, SplitError};
use crate::extractor::{DryRun, PdfExtractor, SegmentWriter};
use crate::naming::{CollisionPolicy, NameRegistry, NamingPolicy};
use crate::pattern::{KeyGroup, KeyPattern};
use crate::pdf::text::{page_source, PageSource, TextEngine};
use crate::pdf::PdfDocument;
use crate::segmenter::{Segment, Segmenter};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default)]
pub struct SplitOptions {
    pub input: PathBuf,
    pub output_dir: PathBuf,
    pub pattern: Option<String>,
    pub key_group: KeyGroup,
    pub case_insensitive: bool,
    pub dated: bool,
    pub explicit: bool,
    pub on_collision: CollisionPolicy,
    pub text_engine: TextEngine,
    pub dry_run: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitReport {
    pub input: PathBuf,
    pub page_count: u32,
    pub dry_run: bool,
    pub outputs: Vec<SplitOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SplitOutput {
    pub start: u32,
    pub end: u32,
    pub key: String,
    pub path: PathBuf,
}

/// Checks made before anything is opened, in the order their exit codes imply.
pub fn check_preconditions(options: &SplitOptions) -> Result<&str> {
    let input = &options.input;
    log::info!("Input File:\t{}", input.display());
    if !input.is_file() {
        return Err(SplitError::InputMissing(input.clone()));
    }

    let is_pdf = input
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    if !is_pdf {
        return Err(SplitError::NotPdf(input.clone()));
    }

    log::info!("Output to:\t{}", options.output_dir.display());
    if !options.output_dir.is_dir() {
        return Err(SplitError::OutputDirMissing(options.output_dir.clone()));
    }

    match options.pattern.as_deref() {
        Some(pattern) if !pattern.is_empty() => Ok(pattern),
        _ => Err(SplitError::NoSplitMode),
    }
}

pub fn split(options: &SplitOptions) -> Result<SplitReport> {
    let pattern = check_preconditions(options)?;

    log::info!("split type:\tKey");
    log::info!("Key regex:\t{} (group {})", pattern, options.key_group);
    let pattern = KeyPattern::compile(pattern, options.key_group.clone(), options.case_insensitive)?;

    let fallback = options
        .input
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("document");
    let naming = NamingPolicy::with_today(options.dated, fallback);

    let doc = PdfDocument::open(&options.input)?;
    let mut source = page_source(&doc, options.text_engine)?;
    let mut names = NameRegistry::new(options.on_collision);
    if let Some(name) = input_in_output_dir(&options.input, &options.output_dir) {
        log::info!("Input lives in the output directory, {} is reserved", name);
        names.reserve(name);
    }

    let outputs = if options.dry_run {
        let mut writer = DryRun::new(&options.output_dir);
        split_pages(
            source.as_mut(),
            Segmenter::new(pattern, naming),
            &mut names,
            &mut writer,
            options.explicit,
        )?
    } else {
        let mut writer = PdfExtractor::new(&doc, &options.output_dir);
        split_pages(
            source.as_mut(),
            Segmenter::new(pattern, naming),
            &mut names,
            &mut writer,
            options.explicit,
        )?
    };

    Ok(SplitReport {
        input: options.input.clone(),
        page_count: doc.page_count(),
        dry_run: options.dry_run,
        outputs,
    })
}

/// File name of the input when writing into `output_dir` could land on it.
fn input_in_output_dir(input: &Path, output_dir: &Path) -> Option<String> {
    let input = std::fs::canonicalize(input).ok()?;
    let output_dir = std::fs::canonicalize(output_dir).ok()?;
    if input.parent()? != output_dir {
        return None;
    }
    input.file_name()?.to_str().map(str::to_string)
}

/// Single pass over the pages. Each closed segment is written before the next page is read.
pub fn split_pages<S, W>(
    source: &mut S,
    mut segmenter: Segmenter,
    names: &mut NameRegistry,
    writer: &mut W,
    explicit: bool,
) -> Result<Vec<SplitOutput>>
where
    S: PageSource + ?Sized,
    W: SegmentWriter + ?Sized,
{
    let mut outputs = Vec::new();

    for page in 1..=source.page_count() {
        let text = source.page_text(page)?;
        if explicit {
            print_trace(segmenter.pattern(), page, &text);
        }
        if let Some(segment) = segmenter.process_page(page, &text) {
            outputs.push(emit(segment, names, writer)?);
        }
    }

    if let Some(segment) = segmenter.finish() {
        outputs.push(emit(segment, names, writer)?);
    }

    Ok(outputs)
}

fn emit<W: SegmentWriter + ?Sized>(
    segment: Segment,
    names: &mut NameRegistry,
    writer: &mut W,
) -> Result<SplitOutput> {
    let file_name = names.claim(&segment.output_name)?;
    let path = writer.materialize(&segment, &file_name)?;
    Ok(SplitOutput {
        start: segment.start,
        end: segment.end,
        key: segment.key,
        path,
    })
}

fn print_trace(pattern: &KeyPattern, page: u32, text: &str) {
    println!("Page: {}", page);
    for (i, m) in pattern.explain(text).iter().enumerate() {
        println!("Match: {} (position {})", i + 1, m.position);
        for group in &m.groups {
            match (&group.text, group.position) {
                (Some(text), Some(pos)) => {
                    println!("Group {} = '{}', Position={}", group.index, text, pos)
                }
                _ => println!("Group {} = ''", group.index),
            }
        }
    }
}

pub fn run(options: &SplitOptions) -> anyhow::Result<()> {
    let report = split(options)?;
    print_report(&report, &options.output_dir);
    Ok(())
}

fn print_report(report: &SplitReport, output_dir: &Path) {
    for output in &report.outputs {
        let action = if report.dry_run { "would write" } else { "wrote" };
        println!(
            "p{}-{}: {} {} ({})",
            output.start,
            output.end,
            action,
            output.path.display(),
            output.key
        );
    }

    println!(
        "\nSplit {} pages into {} file(s) in {}",
        report.page_count,
        report.outputs.len(),
        output_dir.display()
    );
}
