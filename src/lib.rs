pub mod cli;
pub mod compile;
pub mod config;
pub mod error;
pub mod model;
pub mod parser;
pub mod processor;
pub mod store;
pub mod writer;

use std::path::Path;

use anyhow::{Context, anyhow};
use clap::Parser;

pub use error::{KakeError, KakeResult};
pub use processor::SynthesisOptions;
pub use processor::program::SynthesizedProgram;

use cli::{Cli, Emit};
use compile::registry::ModuleCompiler;
use compile::{LibraryCatalog, LibraryExport, build_module};
use config::Config;

/// Parse a build file and synthesize its program with default options.
pub fn parse_and_synthesize(raw_text: &str, file_name: &str) -> KakeResult<SynthesizedProgram> {
    parse_and_synthesize_with(raw_text, file_name, &SynthesisOptions::default())
}

pub fn parse_and_synthesize_with(
    raw_text: &str,
    file_name: &str,
    options: &SynthesisOptions,
) -> KakeResult<SynthesizedProgram> {
    let unit = parser::parse_str(raw_text)?;
    Ok(processor::synthesize(&unit, file_name, options))
}

pub fn run() -> anyhow::Result<()> {
    let args = Cli::parse();
    let output = bake(&args)?;

    match &args.output {
        Some(path) => std::fs::write(path, output)
            .with_context(|| format!("Writing {}", path.display()))?,
        None => print!("{output}"),
    }
    Ok(())
}

/// Runs the pipeline for `args` and returns the requested artifact.
pub fn bake(args: &Cli) -> anyhow::Result<String> {
    let log = |msg: String| {
        if args.verbose {
            eprintln!("{msg}");
        }
    };

    // 1. ── Configure ──────────────────────────────────────────────────
    let config = match &args.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    let options = config.synthesis_options();

    // 2. ── Parse ──────────────────────────────────────────────────────
    let text = std::fs::read_to_string(&args.input)
        .with_context(|| format!("Reading {}", args.input.display()))?;
    log(format!("File loaded, size: {} bytes", text.len()));

    let unit = parser::parse_str(&text)
        .map_err(|e| describe(e, &args.input))
        .with_context(|| format!("Parsing {}", args.input.display()))?;
    log(format!(
        "Parsed {} directive(s), {} target(s)",
        unit.meta().len(),
        unit.targets().len()
    ));

    // 3. ── Synthesize ─────────────────────────────────────────────────
    let file_name = args
        .input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| args.input.display().to_string());
    let program = processor::synthesize(&unit, &file_name, &options);
    log(format!(
        "Synthesized `{}` with {} statement(s)",
        program.type_name,
        program.body.len()
    ));

    // 4. ── Write outputs ──────────────────────────────────────────────
    match args.emit {
        Emit::Source => Ok(writer::csharp::render(&program).text),
        Emit::Program => Ok(writer::json::program_to_string(&program)?),
        Emit::Module => {
            // The in-process compiler needs no artifacts, only names.
            let resolver = program
                .references
                .iter()
                .fold(LibraryCatalog::new(), |catalog, name| {
                    catalog.with_library(LibraryExport::named(name.as_str()))
                });
            let module = build_module(&program, &ModuleCompiler::default(), &resolver)
                .map_err(|e| describe(e, &args.input))
                .with_context(|| format!("Building {}", args.input.display()))?;
            log(format!("Built module with {} target(s)", module.targets.len()));
            Ok(writer::json::to_string(&module)?)
        }
        Emit::Unit => Ok(writer::json::unit_to_string(&unit)?),
    }
}

/// Error text naming the build file, with every diagnostic listed.
fn describe(err: KakeError, file: &Path) -> anyhow::Error {
    match err {
        KakeError::Compilation { diagnostics } => {
            let lines: Vec<String> = diagnostics
                .iter()
                .map(|d| format!("{}: {d}", file.display()))
                .collect();
            anyhow!(
                "compilation failed with {} diagnostic(s):\n{}",
                diagnostics.len(),
                lines.join("\n")
            )
        }
        other => anyhow::Error::new(other),
    }
}
