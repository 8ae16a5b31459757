use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, SplitError>;

/// Broad class of a failure, used to pick the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Input,
    Output,
}

#[derive(Debug, thiserror::Error)]
pub enum SplitError {
    #[error("Input file does not exist: {}", .0.display())]
    InputMissing(PathBuf),

    #[error("Input file is not a PDF: {}", .0.display())]
    NotPdf(PathBuf),

    #[error("Output directory does not exist: {}", .0.display())]
    OutputDirMissing(PathBuf),

    #[error("No split mode selected (use --matching-key-split <REGEX>)")]
    NoSplitMode,

    #[error("Invalid key pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    #[error("Key pattern has no capture groups")]
    NoCaptureGroups,

    #[error("Key pattern has no capture group {0}")]
    MissingGroup(String),

    #[error("Failed to open PDF: {}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: lopdf::Error,
    },

    #[error("Failed to read PDF: {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to extract text from page {page}")]
    PageText {
        page: u32,
        #[source]
        source: anyhow::Error,
    },

    #[error("Failed to extract text from PDF: {}", path.display())]
    DocumentText {
        path: PathBuf,
        #[source]
        source: pdf_extract::OutputError,
    },

    #[error("Text engine found {found} page(s), document has {expected}")]
    PageCountMismatch { expected: u32, found: u32 },

    #[error("Page {page} is out of range (1-{total})")]
    PageOutOfRange { page: u32, total: u32 },

    #[error("Output file name already used in this run: {0}")]
    NameCollision(String),

    #[error("Output file would replace the input document: {0}")]
    OverwritesInput(String),

    #[error("Failed to write PDF: {}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: anyhow::Error,
    },
}

impl SplitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::NoSplitMode
            | SplitError::InvalidPattern(_)
            | SplitError::NoCaptureGroups
            | SplitError::MissingGroup(_) => ErrorKind::Configuration,
            SplitError::InputMissing(_)
            | SplitError::NotPdf(_)
            | SplitError::Open { .. }
            | SplitError::Read { .. }
            | SplitError::PageText { .. }
            | SplitError::DocumentText { .. }
            | SplitError::PageCountMismatch { .. }
            | SplitError::PageOutOfRange { .. } => ErrorKind::Input,
            SplitError::OutputDirMissing(_)
            | SplitError::NameCollision(_)
            | SplitError::OverwritesInput(_)
            | SplitError::Write { .. } => ErrorKind::Output,
        }
    }

    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            SplitError::InputMissing(_) => 1,
            SplitError::NotPdf(_) | SplitError::Open { .. } | SplitError::Read { .. } => 2,
            SplitError::OutputDirMissing(_) => 3,
            SplitError::NoSplitMode => 4,
            SplitError::InvalidPattern(_)
            | SplitError::NoCaptureGroups
            | SplitError::MissingGroup(_) => 5,
            SplitError::PageText { .. }
            | SplitError::DocumentText { .. }
            | SplitError::PageCountMismatch { .. }
            | SplitError::PageOutOfRange { .. } => 6,
            SplitError::NameCollision(_)
            | SplitError::OverwritesInput(_)
            | SplitError::Write { .. } => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_exit_codes() {
        assert_eq!(SplitError::InputMissing("a.pdf".into()).exit_code(), 1);
        assert_eq!(SplitError::NotPdf("a.txt".into()).exit_code(), 2);
        assert_eq!(SplitError::OutputDirMissing("out".into()).exit_code(), 3);
        assert_eq!(SplitError::NoSplitMode.exit_code(), 4);
    }

    #[test]
    fn test_kinds() {
        assert_eq!(SplitError::NoSplitMode.kind(), ErrorKind::Configuration);
        assert_eq!(
            SplitError::PageOutOfRange { page: 9, total: 3 }.kind(),
            ErrorKind::Input
        );
        assert_eq!(
            SplitError::NameCollision("A.pdf".into()).kind(),
            ErrorKind::Output
        );
    }
}
