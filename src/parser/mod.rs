//! Line-oriented parser: build-file text → `BuildUnit`.
//!
//! The file is read in three phases:
//!   • top-level directives (blank lines skipped),
//!   • top-level code, up to the first target header,
//!   • targets, each a header followed by its own (indented) directives
//!     and code.
//!
//! Only the directive and header lines are interpreted; code lines are
//! carried verbatim together with their line numbers.
pub mod grammar;
pub mod source;

use std::io::BufRead;

use crate::error::{KakeResult, NotATargetSnafu};
use crate::model::{BuildUnit, CodeBlock, Meta, Target};

use grammar::DirectiveLine;
use source::Source;

/// Parse a whole build file from any line source.
pub fn parse<R: BufRead>(reader: R) -> KakeResult<BuildUnit> {
    let mut source = Source::new(reader);

    let meta = read_directives(&mut source, false)?;
    let code = read_code(&mut source)?;
    let targets = read_targets(&mut source)?;

    Ok(BuildUnit::new(meta, code, targets))
}

pub fn parse_str(text: &str) -> KakeResult<BuildUnit> {
    parse(text.as_bytes())
}

/// Reads lines while they are directives or blank.
///
/// The first line that is neither stays under the cursor for the next
/// phase.
fn read_directives<R: BufRead>(source: &mut Source<R>, indented: bool) -> KakeResult<Vec<Meta>> {
    let mut meta = Vec::new();
    while source.advance()? {
        let Some(line) = source.current()? else {
            break;
        };
        match grammar::directive_line(line.text(), indented) {
            Some(DirectiveLine::Blank) => {}
            Some(DirectiveLine::Directive { name, args }) => {
                meta.push(Meta::new(name, args, line.index()));
            }
            None => break,
        }
    }
    Ok(meta)
}

/// Collects the current line and its successors up to the next target
/// header (or end of stream) into one block.
fn read_code<R: BufRead>(source: &mut Source<R>) -> KakeResult<Option<CodeBlock>> {
    let mut lines = Vec::new();
    while let Some(line) = source.current()? {
        if grammar::is_target_header(line.text()) {
            break;
        }
        lines.push(line.clone());
        if !source.advance()? {
            break;
        }
    }
    CodeBlock::from_lines(&lines)
}

fn read_targets<R: BufRead>(source: &mut Source<R>) -> KakeResult<Vec<Target>> {
    let mut targets = Vec::new();
    while let Some(line) = source.current()? {
        let Some(name) = grammar::target_header(line.text()) else {
            return NotATargetSnafu { line: line.index() }.fail();
        };
        let header = line.index();

        let meta = read_directives(source, true)?;
        let code = read_code(source)?;
        targets.push(Target::new(name, header, meta, code));
    }
    Ok(targets)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_directives_code_and_target() {
        let src = "@using System\n\
                   Console.WriteLine(\"hi\");\n\
                   go:\n  \
                   @dependsOn setup\n  \
                   DoWork();\n";
        let unit = parse_str(src).unwrap();

        assert_eq!(unit.meta().len(), 1);
        assert_eq!(unit.meta()[0].name(), "using");
        assert_eq!(unit.meta()[0].args(), ["System"]);

        let code = unit.code().unwrap();
        assert_eq!(code.start_line(), 1);
        assert_eq!(code.code(), "Console.WriteLine(\"hi\");\n");

        assert_eq!(unit.targets().len(), 1);
        let go = &unit.targets()[0];
        assert_eq!(go.name(), "go");
        assert_eq!(go.line(), 2);
        assert_eq!(go.meta().len(), 1);
        assert_eq!(go.meta()[0].name(), "dependsOn");
        assert_eq!(go.meta()[0].args(), ["setup"]);
        assert_eq!(go.meta()[0].line(), 3);
        let body = go.code().unwrap();
        assert_eq!(body.start_line(), 4);
        assert_eq!(body.code(), "  DoWork();\n");
    }

    #[test]
    fn directives_then_single_target() {
        let src = "@default build\n\n@load Tools\nbuild:\n";
        let unit = parse_str(src).unwrap();

        assert_eq!(unit.meta().len(), 2);
        assert!(unit.code().is_none());
        assert_eq!(unit.targets().len(), 1);
        assert_eq!(unit.targets()[0].name(), "build");
        assert!(unit.targets()[0].meta().is_empty());
        assert!(unit.targets()[0].code().is_none());
    }

    #[test]
    fn blank_and_comment_lines_do_not_end_target_directives() {
        let src = "world:\n  @dependsOn hello\n  // greets the world\n\n  @dependsOn setup\n  Say();\n";
        let unit = parse_str(src).unwrap();

        let world = &unit.targets()[0];
        let deps: Vec<&str> = world.meta().iter().map(|m| m.args()[0].as_str()).collect();
        assert_eq!(deps, ["hello", "setup"]);
        assert_eq!(world.code().unwrap().start_line(), 5);
    }

    #[test]
    fn code_keeps_blank_lines_and_indented_headers() {
        let src = "var a = 1;\n\n  nested:\nvar b = 2;\nnext:\n";
        let unit = parse_str(src).unwrap();

        let code = unit.code().unwrap();
        assert_eq!(code.start_line(), 0);
        assert_eq!(code.code(), "var a = 1;\n\n  nested:\nvar b = 2;\n");
        assert_eq!(code.line_count(), 4);
        assert_eq!(unit.targets().len(), 1);
        assert_eq!(unit.targets()[0].name(), "next");
    }

    #[test]
    fn directive_after_code_is_code() {
        let src = "Setup();\n@using System\n";
        let unit = parse_str(src).unwrap();

        assert!(unit.meta().is_empty());
        assert_eq!(unit.code().unwrap().code(), "Setup();\n@using System\n");
    }

    #[test]
    fn targets_keep_declaration_order() {
        let src = "default:\n  @dependsOn world\n  Console.WriteLine(message);\n\
                   world: \n  @dependsOn hello\n\n  message += \" world!\";\n\
                   hello:\n  message = \"Hello\";\n";
        let unit = parse_str(src).unwrap();

        let names: Vec<&str> = unit.targets().iter().map(|t| t.name()).collect();
        assert_eq!(names, ["default", "world", "hello"]);
        assert_eq!(unit.targets()[1].code().unwrap().start_line(), 6);
        assert_eq!(unit.targets()[2].code().unwrap().code(), "  message = \"Hello\";\n");
    }

    #[test]
    fn empty_input_gives_empty_unit() {
        assert_eq!(parse_str("").unwrap(), BuildUnit::default());
        assert_eq!(parse_str("\n   \n").unwrap(), BuildUnit::default());
    }

    #[test]
    fn top_level_comment_is_blank() {
        let src = "// build file\n@using System\n";
        let unit = parse_str(src).unwrap();
        assert_eq!(unit.meta().len(), 1);
        assert!(unit.code().is_none());
    }

    #[test]
    fn cr_only_file_has_directives_and_targets() {
        let unit = parse_str("@using System\rSetup();\rgo:\r  Run();\r").unwrap();

        assert_eq!(unit.meta().len(), 1);
        assert_eq!(unit.meta()[0].args(), ["System"]);
        let code = unit.code().unwrap();
        assert_eq!((code.start_line(), code.code()), (1, "Setup();\n"));
        assert_eq!(unit.targets().len(), 1);
        assert_eq!(unit.targets()[0].code().unwrap().start_line(), 3);
    }

    #[test]
    fn parsing_is_deterministic() {
        let src = "@include a\n@b x\nRun();\nt1:\n  @c\n  A();\nt2:\n";
        assert_eq!(parse_str(src).unwrap(), parse_str(src).unwrap());
    }
}
