//! Output stage: everything that turns a parsed or synthesized build
//! file into text.
pub mod csharp;
pub mod json;
