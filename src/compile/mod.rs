//! Boundary to whatever compiles and loads the synthesized program.
//!
//! The compiler and the library resolver are traits; this module only
//! prepares their input and translates their failures. Diagnostics that
//! land inside embedded code are moved back onto build-file lines.
pub mod registry;

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

use crate::error::{CompilationSnafu, KakeResult, LoadSnafu, UnresolvedLibrarySnafu};
use crate::processor::program::SynthesizedProgram;
use crate::writer::csharp::{self, RenderedSource, SourceMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
    Info,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Info => "info",
        };
        f.write_str(s)
    }
}

/// Zero-based line a diagnostic points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "in", content = "line", rename_all = "snake_case")]
pub enum DiagnosticLine {
    /// Line of the rendered program text.
    Generated(usize),
    /// Line of the build file.
    BuildFile(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub message: String,
    pub line: Option<DiagnosticLine>,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, line: Option<DiagnosticLine>) -> Self {
        Self {
            severity: Severity::Error,
            message: message.into(),
            line,
        }
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }

    pub fn build_file_line(&self) -> Option<usize> {
        match self.line {
            Some(DiagnosticLine::BuildFile(line)) => Some(line),
            _ => None,
        }
    }

    /// Rewrites a generated-line position that falls inside embedded code.
    pub fn remapped(mut self, map: &SourceMap) -> Self {
        if let Some(DiagnosticLine::Generated(generated)) = self.line
            && let Some(original) = map.to_build_file(generated)
        {
            self.line = Some(DiagnosticLine::BuildFile(original));
        }
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(DiagnosticLine::BuildFile(line)) => {
                write!(f, "line {}: {}: {}", line + 1, self.severity, self.message)
            }
            Some(DiagnosticLine::Generated(line)) => write!(
                f,
                "generated line {}: {}: {}",
                line + 1,
                self.severity,
                self.message
            ),
            None => write!(f, "{}: {}", self.severity, self.message),
        }
    }
}

/// Artifacts needed to reference one library while compiling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LibraryExport {
    pub name: String,
    pub metadata_references: Vec<PathBuf>,
    pub source_files: Vec<PathBuf>,
}

impl LibraryExport {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

pub trait LibraryResolver {
    fn resolve(&self, name: &str) -> Option<LibraryExport>;
}

/// Resolver backed by a fixed set of libraries; names match ignoring
/// ASCII case.
#[derive(Debug, Clone, Default)]
pub struct LibraryCatalog {
    libraries: HashMap<String, LibraryExport>,
}

impl LibraryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_library(mut self, export: LibraryExport) -> Self {
        self.insert(export);
        self
    }

    pub fn insert(&mut self, export: LibraryExport) {
        self.libraries
            .insert(export.name.to_ascii_lowercase(), export);
    }
}

impl LibraryResolver for LibraryCatalog {
    fn resolve(&self, name: &str) -> Option<LibraryExport> {
        self.libraries.get(&name.to_ascii_lowercase()).cloned()
    }
}

/// Everything a compiler may want to look at: the abstract program and
/// its rendered text.
#[derive(Debug, Clone, Copy)]
pub struct CompilationUnit<'a> {
    pub program: &'a SynthesizedProgram,
    pub source: &'a RenderedSource,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileFailure {
    /// The program did not compile.
    Diagnostics(Vec<Diagnostic>),
    /// It compiled but the result could not be loaded.
    Load(String),
}

pub trait CompileService {
    type Module;

    fn compile(
        &self,
        unit: &CompilationUnit<'_>,
        references: &[LibraryExport],
    ) -> Result<Self::Module, CompileFailure>;
}

/// Resolve references, render, compile and load `program`.
///
/// Failures are reported once, never retried.
pub fn build_module<C, L>(
    program: &SynthesizedProgram,
    compiler: &C,
    resolver: &L,
) -> KakeResult<C::Module>
where
    C: CompileService + ?Sized,
    L: LibraryResolver + ?Sized,
{
    let mut references = Vec::with_capacity(program.references.len());
    for name in &program.references {
        let Some(export) = resolver.resolve(name) else {
            return UnresolvedLibrarySnafu { name: name.as_str() }.fail();
        };
        references.push(export);
    }

    let source = csharp::render(program);
    let unit = CompilationUnit {
        program,
        source: &source,
    };

    match compiler.compile(&unit, &references) {
        Ok(module) => Ok(module),
        Err(CompileFailure::Diagnostics(diagnostics)) => CompilationSnafu {
            diagnostics: remap_diagnostics(diagnostics, &source.source_map),
        }
        .fail(),
        Err(CompileFailure::Load(message)) => LoadSnafu { message }.fail(),
    }
}

pub fn remap_diagnostics(diagnostics: Vec<Diagnostic>, map: &SourceMap) -> Vec<Diagnostic> {
    diagnostics.into_iter().map(|d| d.remapped(map)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::KakeError;
    use crate::parser::parse_str;
    use crate::processor::{SynthesisOptions, synthesize};

    /// Fails with fixed diagnostics, or "loads" the rendered text.
    struct FakeCompiler {
        failure: Option<CompileFailure>,
    }

    impl CompileService for FakeCompiler {
        type Module = (String, Vec<String>);

        fn compile(
            &self,
            unit: &CompilationUnit<'_>,
            references: &[LibraryExport],
        ) -> Result<Self::Module, CompileFailure> {
            match &self.failure {
                Some(failure) => Err(failure.clone()),
                None => Ok((
                    unit.source.text.clone(),
                    references.iter().map(|r| r.name.clone()).collect(),
                )),
            }
        }
    }

    fn program(src: &str) -> SynthesizedProgram {
        let unit = parse_str(src).unwrap();
        synthesize(&unit, "build.kake", &SynthesisOptions::default())
    }

    fn catalog() -> LibraryCatalog {
        LibraryCatalog::new()
            .with_library(LibraryExport::named("Kake"))
            .with_library(LibraryExport::named("Tools"))
    }

    #[test]
    fn references_are_resolved_in_order() {
        let compiler = FakeCompiler { failure: None };
        let (text, refs) = build_module(&program("@load tools\n"), &compiler, &catalog()).unwrap();

        assert_eq!(refs, ["Tools", "Kake"]);
        assert!(text.contains("public class Build : Kake.Module"));
    }

    #[test]
    fn unresolved_library_fails_before_compiling() {
        let compiler = FakeCompiler { failure: None };
        let err = build_module(&program("@load Missing\n"), &compiler, &catalog()).unwrap_err();
        assert!(matches!(err, KakeError::UnresolvedLibrary { ref name } if name == "Missing"));
    }

    #[test]
    fn diagnostics_inside_embedded_code_point_at_build_file() {
        // Rendered line 8 holds `Broken(` (build-file line 1).
        let compiler = FakeCompiler {
            failure: Some(CompileFailure::Diagnostics(vec![
                Diagnostic::error("; expected", Some(DiagnosticLine::Generated(8))),
                Diagnostic::error("type not found", Some(DiagnosticLine::Generated(3))),
                Diagnostic::error("no location", None),
            ])),
        };
        let err = build_module(&program("@using System\nBroken(\n"), &compiler, &catalog()).unwrap_err();

        let KakeError::Compilation { diagnostics } = err else {
            panic!("expected a compilation error");
        };
        assert_eq!(diagnostics[0].line, Some(DiagnosticLine::BuildFile(1)));
        assert_eq!(diagnostics[1].line, Some(DiagnosticLine::Generated(3)));
        assert_eq!(diagnostics[2].line, None);
        assert_eq!(diagnostics[0].to_string(), "line 2: error: ; expected");
    }

    #[test]
    fn load_failures_pass_through() {
        let compiler = FakeCompiler {
            failure: Some(CompileFailure::Load("bad image".into())),
        };
        let err = build_module(&program("go:\n"), &compiler, &catalog()).unwrap_err();
        assert!(matches!(err, KakeError::Load { ref message } if message == "bad image"));
    }
}
