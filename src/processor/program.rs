//! Abstract form of the synthesized program, before it is rendered to
//! source text.

use serde::Serialize;

use crate::model::CodeBlock;

/// Call to a directive handler, e.g. `@include a` → `Include("a")`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerCall {
    /// Sanitized handler name.
    pub handler: String,
    /// Directive name as written in the build file.
    pub directive: String,
    pub args: Vec<String>,
    /// Build-file line of the directive.
    pub line: usize,
}

/// Opaque statements copied verbatim from the build file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddedBody {
    /// Build-file line of the first statement line.
    pub start_line: usize,
    pub code: String,
}

impl EmbeddedBody {
    pub fn line_count(&self) -> usize {
        self.code.matches('\n').count()
    }
}

impl From<&CodeBlock> for EmbeddedBody {
    fn from(block: &CodeBlock) -> Self {
        Self {
            start_line: block.start_line(),
            code: block.code().to_string(),
        }
    }
}

/// `Target("name")` with its chained configuration calls and action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetRegistration {
    pub name: String,
    pub line: usize,
    pub calls: Vec<HandlerCall>,
    pub action: Option<EmbeddedBody>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Stmt {
    Call(HandlerCall),
    Embedded(EmbeddedBody),
    Register(TargetRegistration),
}

/// One module type deriving the build contract, with a single entry
/// routine holding every statement in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SynthesizedProgram {
    /// Build file the program was generated from; embedded code maps
    /// back to it.
    pub file_name: String,
    pub type_name: String,
    pub base_contract: String,
    pub entry_routine: String,
    pub imports: Vec<String>,
    /// Libraries the compiler must reference, runtime library included.
    pub references: Vec<String>,
    pub body: Vec<Stmt>,
}

impl SynthesizedProgram {
    pub fn calls(&self) -> impl Iterator<Item = &HandlerCall> {
        self.body.iter().filter_map(|s| match s {
            Stmt::Call(call) => Some(call),
            _ => None,
        })
    }

    pub fn registrations(&self) -> impl Iterator<Item = &TargetRegistration> {
        self.body.iter().filter_map(|s| match s {
            Stmt::Register(reg) => Some(reg),
            _ => None,
        })
    }
}
