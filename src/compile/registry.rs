//! Directive handlers and the in-process module compiler.
//!
//! Every `@name` directive turns into a call to the handler registered
//! under the sanitized name. Lookups happen when the program is compiled,
//! so an unknown directive parses and synthesizes fine and only fails
//! here, reported on the line it was written on.

use std::collections::HashMap;

use serde::Serialize;

use super::{CompilationUnit, CompileFailure, CompileService, Diagnostic, DiagnosticLine, LibraryExport};
use crate::processor::program::{EmbeddedBody, HandlerCall, Stmt, TargetRegistration};
use crate::processor::sanitize::sanitize_name;

/// Where a handler may be called from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Top-level directives, called on the module.
    Module,
    /// Target directives, chained onto a target registration.
    Target,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TargetSpec {
    pub name: String,
    pub depends_on: Vec<String>,
    pub action: Option<EmbeddedBody>,
}

/// Description of a compiled build file: what it includes, its setup code
/// and its targets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Module {
    pub type_name: String,
    pub imports: Vec<String>,
    pub references: Vec<String>,
    pub includes: Vec<String>,
    pub default_target: Option<String>,
    pub setup: Vec<EmbeddedBody>,
    pub targets: Vec<TargetSpec>,
}

impl Module {
    pub fn target(&self, name: &str) -> Option<&TargetSpec> {
        self.targets.iter().find(|t| t.name == name)
    }
}

/// What a handler gets to change while it runs.
pub struct HandlerContext<'a> {
    module: &'a mut Module,
    target: Option<usize>,
}

impl HandlerContext<'_> {
    pub fn module(&mut self) -> &mut Module {
        &mut *self.module
    }

    /// Target the directive is attached to.
    pub fn target(&mut self) -> Result<&mut TargetSpec, String> {
        let outside = || "directive is only valid inside a target".to_string();
        let idx = self.target.ok_or_else(outside)?;
        self.module.targets.get_mut(idx).ok_or_else(outside)
    }
}

pub trait DirectiveHandler: Send + Sync {
    fn handle(&self, args: &[String], cx: &mut HandlerContext<'_>) -> Result<(), String>;
}

impl<F> DirectiveHandler for F
where
    F: Fn(&[String], &mut HandlerContext<'_>) -> Result<(), String> + Send + Sync,
{
    fn handle(&self, args: &[String], cx: &mut HandlerContext<'_>) -> Result<(), String> {
        self(args, cx)
    }
}

fn at_least_one(args: &[String]) -> Result<(), String> {
    if args.is_empty() {
        return Err("expected at least one argument".into());
    }
    Ok(())
}

fn include(args: &[String], cx: &mut HandlerContext<'_>) -> Result<(), String> {
    at_least_one(args)?;
    cx.module().includes.extend_from_slice(args);
    Ok(())
}

fn default_target(args: &[String], cx: &mut HandlerContext<'_>) -> Result<(), String> {
    let [name] = args else {
        return Err(format!("expected exactly one target name, got {}", args.len()));
    };
    cx.module().default_target = Some(name.clone());
    Ok(())
}

fn depends_on(args: &[String], cx: &mut HandlerContext<'_>) -> Result<(), String> {
    at_least_one(args)?;
    cx.target()?.depends_on.extend_from_slice(args);
    Ok(())
}

#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<(Scope, String), Box<dyn DirectiveHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// `Include` and `Default` on the module, `DependsOn` on targets.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Scope::Module, "include", include);
        registry.register(Scope::Module, "default", default_target);
        registry.register(Scope::Target, "dependsOn", depends_on);
        registry
    }

    /// Registers `handler` under the sanitized form of `name`, replacing
    /// any previous handler.
    pub fn register<H>(&mut self, scope: Scope, name: &str, handler: H)
    where
        H: DirectiveHandler + 'static,
    {
        self.handlers
            .insert((scope, sanitize_name(name)), Box::new(handler));
    }

    pub fn get(&self, scope: Scope, handler: &str) -> Option<&dyn DirectiveHandler> {
        self.handlers
            .get(&(scope, handler.to_string()))
            .map(|h| h.as_ref())
    }

    pub fn contains(&self, scope: Scope, handler: &str) -> bool {
        self.get(scope, handler).is_some()
    }
}

/// Compiles a synthesized program by running its directive calls against
/// a `HandlerRegistry`. Embedded code is carried along untouched.
pub struct ModuleCompiler {
    registry: HandlerRegistry,
}

impl Default for ModuleCompiler {
    fn default() -> Self {
        Self::new(HandlerRegistry::with_builtins())
    }
}

impl ModuleCompiler {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    fn call(
        &self,
        scope: Scope,
        call: &HandlerCall,
        cx: &mut HandlerContext<'_>,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        let line = Some(DiagnosticLine::BuildFile(call.line));
        let Some(handler) = self.registry.get(scope, &call.handler) else {
            diagnostics.push(Diagnostic::error(
                format!("no handler named `{}` for directive `@{}`", call.handler, call.directive),
                line,
            ));
            return;
        };
        if let Err(message) = handler.handle(&call.args, cx) {
            diagnostics.push(Diagnostic::error(
                format!("@{}: {message}", call.directive),
                line,
            ));
        }
    }

    fn register(
        &self,
        module: &mut Module,
        reg: &TargetRegistration,
        diagnostics: &mut Vec<Diagnostic>,
    ) {
        if module.target(&reg.name).is_some() {
            diagnostics.push(Diagnostic::error(
                format!("target `{}` is defined more than once", reg.name),
                Some(DiagnosticLine::BuildFile(reg.line)),
            ));
            return;
        }

        module.targets.push(TargetSpec {
            name: reg.name.clone(),
            depends_on: Vec::new(),
            action: reg.action.clone(),
        });
        let mut cx = HandlerContext {
            target: Some(module.targets.len() - 1),
            module,
        };
        for call in &reg.calls {
            self.call(Scope::Target, call, &mut cx, diagnostics);
        }
    }
}

impl CompileService for ModuleCompiler {
    type Module = Module;

    fn compile(
        &self,
        unit: &CompilationUnit<'_>,
        references: &[LibraryExport],
    ) -> Result<Module, CompileFailure> {
        let program = unit.program;
        let mut module = Module {
            type_name: program.type_name.clone(),
            imports: program.imports.clone(),
            references: references.iter().map(|r| r.name.clone()).collect(),
            ..Module::default()
        };
        let mut diagnostics = Vec::new();

        for stmt in &program.body {
            match stmt {
                Stmt::Call(call) => {
                    let mut cx = HandlerContext {
                        module: &mut module,
                        target: None,
                    };
                    self.call(Scope::Module, call, &mut cx, &mut diagnostics);
                }
                Stmt::Embedded(body) => module.setup.push(body.clone()),
                Stmt::Register(reg) => self.register(&mut module, reg, &mut diagnostics),
            }
        }

        if diagnostics.iter().any(Diagnostic::is_error) {
            return Err(CompileFailure::Diagnostics(diagnostics));
        }
        Ok(module)
    }
}
