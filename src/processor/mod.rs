//! The functional core: turns a parsed `BuildUnit` into a
//! `SynthesizedProgram`.
//!
//! Statement order inside the entry routine is fixed:
//!   1. `@include` calls, in the order written,
//!   2. every other top-level directive call, in the order written,
//!   3. the top-level code block,
//!   4. one registration per target, in declaration order.
//!
//! `@using` and `@load` never become calls; they feed the program's
//! imports and library references instead.
pub mod program;
pub mod sanitize;

use std::path::Path;

use crate::model::{BuildUnit, Meta};

use program::{EmbeddedBody, HandlerCall, Stmt, SynthesizedProgram, TargetRegistration};
use sanitize::sanitize_name;

pub const USING: &str = "using";
pub const LOAD: &str = "load";
pub const INCLUDE: &str = "include";

/// Names the synthesized program depends on outside the build file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Contract the generated module type derives from.
    pub base_contract: String,
    /// Overridable routine that receives the statements.
    pub entry_routine: String,
    /// Always referenced, whatever `@load` says.
    pub runtime_library: String,
}

impl Default for SynthesisOptions {
    fn default() -> Self {
        Self {
            base_contract: "Kake.Module".into(),
            entry_routine: "Configure".into(),
            runtime_library: "Kake".into(),
        }
    }
}

/// Top-level directives sorted by what they turn into.
#[derive(Debug, Default)]
pub struct Directives<'a> {
    pub imports: Vec<String>,
    pub loads: Vec<String>,
    /// Remaining directives, includes first.
    pub calls: Vec<&'a Meta>,
}

/// Pulls `@using` and `@load` out of `meta` and orders the rest.
pub fn split_directives(meta: &[Meta]) -> Directives<'_> {
    let mut out = Directives::default();
    let mut others = Vec::new();

    for m in meta {
        match m.name() {
            USING => {
                for arg in m.args() {
                    if !out.imports.contains(arg) {
                        out.imports.push(arg.clone());
                    }
                }
            }
            LOAD => {
                for arg in m.args() {
                    if !out.loads.iter().any(|l| l.eq_ignore_ascii_case(arg)) {
                        out.loads.push(arg.clone());
                    }
                }
            }
            INCLUDE => out.calls.push(m),
            _ => others.push(m),
        }
    }

    out.calls.extend(others);
    out
}

fn handler_call(meta: &Meta) -> HandlerCall {
    HandlerCall {
        handler: sanitize_name(meta.name()),
        directive: meta.name().to_string(),
        args: meta.args().to_vec(),
        line: meta.line(),
    }
}

const FALLBACK_TYPE_NAME: &str = "Build";

/// Name of the generated module type for `file_name`, `Build` when the
/// name has no usable stem.
pub fn type_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    match sanitize_name(stem) {
        name if name.is_empty() => FALLBACK_TYPE_NAME.to_string(),
        name => name,
    }
}

/// Builds the program for `unit`, read from `file_name`.
///
/// Code blocks are copied without being looked at; whether they compile
/// is for the external compiler to decide.
pub fn synthesize(
    unit: &BuildUnit,
    file_name: &str,
    options: &SynthesisOptions,
) -> SynthesizedProgram {
    let directives = split_directives(unit.meta());

    let mut references = directives.loads;
    if !references
        .iter()
        .any(|r| r.eq_ignore_ascii_case(&options.runtime_library))
    {
        references.push(options.runtime_library.clone());
    }

    let mut body: Vec<Stmt> = directives
        .calls
        .into_iter()
        .map(|m| Stmt::Call(handler_call(m)))
        .collect();

    if let Some(code) = unit.code() {
        body.push(Stmt::Embedded(EmbeddedBody::from(code)));
    }

    for target in unit.targets() {
        body.push(Stmt::Register(TargetRegistration {
            name: target.name().to_string(),
            line: target.line(),
            calls: target.meta().iter().map(handler_call).collect(),
            action: target.code().map(EmbeddedBody::from),
        }));
    }

    SynthesizedProgram {
        file_name: file_name.to_string(),
        type_name: type_name(file_name),
        base_contract: options.base_contract.clone(),
        entry_routine: options.entry_routine.clone(),
        imports: directives.imports,
        references,
        body,
    }
}
