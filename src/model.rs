//! Immutable structural model of one parsed build file.
//!
//! Everything here is built once by the parser and never mutated
//! afterwards; the synthesizer only reads it.

use serde::Serialize;

use crate::error::{KakeResult, NonConsecutiveCodeBlockSnafu};

/// One physical line of the build file, terminator stripped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    index: usize,
    text: String,
}

impl Line {
    pub fn new(index: usize, text: impl Into<String>) -> Self {
        Self {
            index,
            text: text.into(),
        }
    }

    /// Zero-based position in the build file.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

/// A `@name arg…` directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Meta {
    name: String,
    args: Vec<String>,
    line: usize,
}

impl Meta {
    pub fn new(name: impl Into<String>, args: Vec<String>, line: usize) -> Self {
        Self {
            name: name.into(),
            args,
            line,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    /// Line the directive was written on.
    pub fn line(&self) -> usize {
        self.line
    }
}

/// Verbatim text of consecutive source lines, each followed by `\n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodeBlock {
    start_line: usize,
    code: String,
}

impl CodeBlock {
    /// Joins `lines` into a block.
    ///
    /// Returns `Ok(None)` for an empty slice. Lines must be strictly
    /// consecutive (`index == previous + 1`); anything else is an
    /// invariant violation reported as `NonConsecutiveCodeBlock`.
    pub fn from_lines(lines: &[Line]) -> KakeResult<Option<Self>> {
        let Some(first) = lines.first() else {
            return Ok(None);
        };

        let start_line = first.index();
        let mut code = String::new();
        for (offset, line) in lines.iter().enumerate() {
            let expected = start_line + offset;
            if line.index() != expected {
                return NonConsecutiveCodeBlockSnafu {
                    expected,
                    found: line.index(),
                }
                .fail();
            }
            code.push_str(line.text());
            code.push('\n');
        }

        Ok(Some(Self { start_line, code }))
    }

    pub fn start_line(&self) -> usize {
        self.start_line
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    /// Number of source lines the block spans.
    pub fn line_count(&self) -> usize {
        self.code.matches('\n').count()
    }
}

/// A named target with its own directives and action body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Target {
    name: String,
    line: usize,
    meta: Vec<Meta>,
    code: Option<CodeBlock>,
}

impl Target {
    pub fn new(name: impl Into<String>, line: usize, meta: Vec<Meta>, code: Option<CodeBlock>) -> Self {
        Self {
            name: name.into(),
            line,
            meta,
            code,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Line of the `name:` header.
    pub fn line(&self) -> usize {
        self.line
    }

    pub fn meta(&self) -> &[Meta] {
        &self.meta
    }

    pub fn code(&self) -> Option<&CodeBlock> {
        self.code.as_ref()
    }
}

/// Complete parse result of one build file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildUnit {
    meta: Vec<Meta>,
    code: Option<CodeBlock>,
    targets: Vec<Target>,
}

impl BuildUnit {
    pub fn new(meta: Vec<Meta>, code: Option<CodeBlock>, targets: Vec<Target>) -> Self {
        Self {
            meta,
            code,
            targets,
        }
    }

    pub fn meta(&self) -> &[Meta] {
        &self.meta
    }

    pub fn code(&self) -> Option<&CodeBlock> {
        self.code.as_ref()
    }

    pub fn targets(&self) -> &[Target] {
        &self.targets
    }

    pub fn target(&self, name: &str) -> Option<&Target> {
        self.targets.iter().find(|t| t.name == name)
    }
}
