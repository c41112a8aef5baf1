use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "kake", author, version, about)]
pub struct Cli {
    /// Build file to bake
    pub input: PathBuf,
    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
    /// What to produce
    #[arg(long, value_enum, default_value_t = Emit::Source)]
    pub emit: Emit,
    /// JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
    /// Report progress on stderr
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Emit {
    /// Generated C# source
    Source,
    /// Synthesized program as JSON
    Program,
    /// Parsed build file as JSON
    Unit,
    /// Module built with the builtin directive handlers, as JSON
    Module,
}
