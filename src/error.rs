//! Error type shared by every stage of the bake pipeline.
//!
//! Parse-time errors are fatal for the invocation. Compile and load
//! failures come from the external compiler and are passed through, with
//! diagnostics re-annotated to build-file lines where possible.

use snafu::Snafu;

use crate::compile::Diagnostic;

pub type KakeResult<T> = Result<T, KakeError>;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum KakeError {
    /// A target section resumed on a line that is not a target header.
    #[snafu(display("line {}: not a target", line + 1))]
    NotATarget { line: usize },

    /// Internal invariant: a code block was assembled from a gap in the source.
    #[snafu(display(
        "code block is not from consecutive lines (expected line {}, found line {})",
        expected + 1,
        found + 1
    ))]
    NonConsecutiveCodeBlock { expected: usize, found: usize },

    #[snafu(display("source must be advanced before reading the current line"))]
    SourceNotAdvanced,

    #[snafu(display("failed to read build file: {source}"))]
    Read { source: std::io::Error },

    #[snafu(display("library `{name}` could not be resolved"))]
    UnresolvedLibrary { name: String },

    #[snafu(display("compilation failed with {} diagnostic(s)", diagnostics.len()))]
    Compilation { diagnostics: Vec<Diagnostic> },

    #[snafu(display("failed to load compiled module: {message}"))]
    Load { message: String },
}

impl KakeError {
    /// Zero-based build-file line the error points at, if any.
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::NotATarget { line } => Some(*line),
            Self::NonConsecutiveCodeBlock { found, .. } => Some(*found),
            Self::Compilation { diagnostics } => {
                diagnostics.iter().find_map(|d| d.build_file_line())
            }
            _ => None,
        }
    }
}
