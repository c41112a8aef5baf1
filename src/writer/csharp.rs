//! Render the synthesized program as C# source.
//!
//! Embedded code is wrapped in `#line` directives so the compiler reports
//! positions inside it against the build file. The same information is
//! kept in a `SourceMap` for compilers that ignore the directives.

use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;

use crate::processor::program::{EmbeddedBody, HandlerCall, Stmt, SynthesizedProgram, TargetRegistration};

const INDENT: &str = "    ";

/// Registration call opening every target chain.
pub const REGISTER_CALL: &str = "Target";
/// Chained call attaching a target's action body.
pub const ACTION_CALL: &str = "Action";

/// Generated lines `[generated_start, generated_start + line_count)` hold
/// build-file lines starting at `original_start`. All zero-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineMapping {
    pub generated_start: usize,
    pub original_start: usize,
    pub line_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SourceMap {
    mappings: Vec<LineMapping>,
}

impl SourceMap {
    pub fn mappings(&self) -> &[LineMapping] {
        &self.mappings
    }

    /// Build-file line for a generated line, if it lies inside embedded code.
    pub fn to_build_file(&self, generated: usize) -> Option<usize> {
        self.mappings
            .iter()
            .find(|m| generated >= m.generated_start && generated < m.generated_start + m.line_count)
            .map(|m| m.original_start + (generated - m.generated_start))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSource {
    pub file_name: String,
    pub text: String,
    pub source_map: SourceMap,
}

struct SourceWriter<'a> {
    file_name: &'a str,
    out: String,
    next_line: usize,
    map: SourceMap,
}

impl<'a> SourceWriter<'a> {
    fn new(file_name: &'a str) -> Self {
        Self {
            file_name,
            out: String::new(),
            next_line: 0,
            map: SourceMap::default(),
        }
    }

    fn line(&mut self, depth: usize, text: &str) {
        for _ in 0..depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
        self.next_line += 1;
    }

    fn blank(&mut self) {
        self.line(0, "");
    }

    /// Copies `body` verbatim between `#line` directives.
    fn embed(&mut self, body: &EmbeddedBody) {
        // `#line` numbers are one-based.
        let directive = format!(
            "#line {} \"{}\"",
            body.start_line + 1,
            line_file_name(self.file_name)
        );
        self.line(0, &directive);

        let line_count = body.line_count();
        self.map.mappings.push(LineMapping {
            generated_start: self.next_line,
            original_start: body.start_line,
            line_count,
        });
        self.out.push_str(&body.code);
        self.next_line += line_count;

        self.line(0, "#line default");
    }

    fn finish(self) -> RenderedSource {
        RenderedSource {
            file_name: self.file_name.to_string(),
            text: self.out,
            source_map: self.map,
        }
    }
}

/// File name as written inside `#line`: no escapes are recognised there, so
/// characters that cannot appear between the quotes are dropped.
fn line_file_name(name: &str) -> String {
    name.chars().filter(|&c| c != '"' && !c.is_control()).collect()
}

/// C# string literal for `value`.
pub fn literal(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\0' => out.push_str("\\0"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn invocation(name: &str, args: &[String]) -> String {
    let args: Vec<String> = args.iter().map(|a| literal(a)).collect();
    format!("{name}({})", args.join(", "))
}

fn call_statement(w: &mut SourceWriter<'_>, depth: usize, call: &HandlerCall) {
    let stmt = format!("{};", invocation(&call.handler, &call.args));
    w.line(depth, &stmt);
}

fn registration(w: &mut SourceWriter<'_>, depth: usize, reg: &TargetRegistration) {
    let mut chain = vec![invocation(REGISTER_CALL, std::slice::from_ref(&reg.name))];
    chain.extend(
        reg.calls
            .iter()
            .map(|c| format!(".{}", invocation(&c.handler, &c.args))),
    );

    let Some(action) = &reg.action else {
        let last = chain.len() - 1;
        for (i, link) in chain.iter().enumerate() {
            let indent = if i == 0 { depth } else { depth + 1 };
            if i == last {
                w.line(indent, &format!("{link};"));
            } else {
                w.line(indent, link);
            }
        }
        return;
    };

    for (i, link) in chain.iter().enumerate() {
        w.line(if i == 0 { depth } else { depth + 1 }, link);
    }
    w.line(depth + 1, &format!(".{ACTION_CALL}(async () =>"));
    w.line(depth + 1, "{");
    w.embed(action);
    w.line(depth + 1, "});");
}

/// Render `program` to source text plus its line map.
pub fn render(program: &SynthesizedProgram) -> RenderedSource {
    let mut w = SourceWriter::new(&program.file_name);

    w.line(0, &format!("// Auto-generated from {} – DO NOT EDIT", program.file_name));
    for import in &program.imports {
        w.line(0, &format!("using {import};"));
    }
    w.blank();

    w.line(
        0,
        &format!("public class {} : {}", program.type_name, program.base_contract),
    );
    w.line(0, "{");
    w.line(
        1,
        &format!(
            "public override async System.Threading.Tasks.Task {}()",
            program.entry_routine
        ),
    );
    w.line(1, "{");
    for stmt in &program.body {
        match stmt {
            Stmt::Call(call) => call_statement(&mut w, 2, call),
            Stmt::Embedded(body) => w.embed(body),
            Stmt::Register(reg) => registration(&mut w, 2, reg),
        }
    }
    w.line(1, "}");
    w.line(0, "}");

    w.finish()
}

/// Write the rendered text to `path`.
pub fn emit(rendered: &RenderedSource, path: &Path) -> io::Result<()> {
    fs::write(path, &rendered.text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_str;
    use crate::processor::{SynthesisOptions, synthesize};

    fn render_src(src: &str) -> RenderedSource {
        let unit = parse_str(src).unwrap();
        render(&synthesize(&unit, "build.kake", &SynthesisOptions::default()))
    }

    #[test]
    fn renders_module_with_line_directives() {
        let src = "@using System\n\
                   Console.WriteLine(\"hi\");\n\
                   go:\n  \
                   @dependsOn setup\n  \
                   DoWork();\n";
        let rendered = render_src(src);

        let expected = "\
// Auto-generated from build.kake – DO NOT EDIT
using System;

public class Build : Kake.Module
{
    public override async System.Threading.Tasks.Task Configure()
    {
#line 2 \"build.kake\"
Console.WriteLine(\"hi\");
#line default
        Target(\"go\")
            .DependsOn(\"setup\")
            .Action(async () =>
            {
#line 5 \"build.kake\"
  DoWork();
#line default
            });
    }
}
";
        assert_eq!(rendered.text, expected);
    }

    #[test]
    fn source_map_points_back_to_build_file() {
        let src = "@using System\n\
                   Console.WriteLine(\"hi\");\n\
                   go:\n  \
                   @dependsOn setup\n  \
                   DoWork();\n  \
                   More();\n";
        let rendered = render_src(src);
        let map = &rendered.source_map;

        assert_eq!(map.mappings().len(), 2);
        // Generated line 8 is the first embedded statement.
        assert_eq!(map.to_build_file(8), Some(1));
        assert_eq!(map.to_build_file(15), Some(4));
        assert_eq!(map.to_build_file(16), Some(5));
        assert_eq!(map.to_build_file(0), None);
        assert_eq!(map.to_build_file(7), None);
        assert_eq!(map.to_build_file(9), None);
        assert_eq!(map.to_build_file(17), None);

        let lines: Vec<&str> = rendered.text.lines().collect();
        assert_eq!(lines[8], "Console.WriteLine(\"hi\");");
        assert_eq!(lines[16], "  More();");
    }

    #[test]
    fn calls_and_bare_targets_end_with_semicolons() {
        let src = "@include common.kake\n@default all\nall:\n  @dependsOn a b\nb:\n";
        let rendered = render_src(src);

        assert!(rendered.text.contains("        Include(\"common.kake\");\n        Default(\"all\");\n"));
        assert!(rendered.text.contains("        Target(\"all\")\n            .DependsOn(\"a\", \"b\");\n"));
        assert!(rendered.text.contains("        Target(\"b\");\n"));
        assert!(rendered.source_map.mappings().is_empty());
    }

    #[test]
    fn line_directive_keeps_file_name_unescaped() {
        let unit = parse_str("Run();\n").unwrap();
        let program = synthesize(&unit, r"C:\work\build.kake", &SynthesisOptions::default());
        let rendered = render(&program);

        assert!(rendered.text.contains("#line 1 \"C:\\work\\build.kake\"\n"));
        assert_eq!(line_file_name("a\"b.kake"), "ab.kake");
    }

    #[test]
    fn lone_cr_in_body_keeps_lines_aligned() {
        let rendered = render_src("A();\rB();\nC();\n");
        let generated = rendered.text.lines().position(|l| l == "C();").unwrap();

        assert_eq!(rendered.source_map.to_build_file(generated), Some(2));
        assert!(!rendered.text.contains('\r'));
    }

    #[test]
    fn literals_are_escaped() {
        assert_eq!(literal("plain"), "\"plain\"");
        assert_eq!(literal("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn emit_writes_rendered_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Build.cs");
        let rendered = render_src("go:\n  Run();\n");

        emit(&rendered, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), rendered.text);
    }
}
