//! Dump the parse result or the synthesized program as JSON.

use serde::Serialize;

use crate::model::BuildUnit;
use crate::processor::program::SynthesizedProgram;

pub fn to_string<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

pub fn unit_to_string(unit: &BuildUnit) -> serde_json::Result<String> {
    to_string(unit)
}

pub fn program_to_string(program: &SynthesizedProgram) -> serde_json::Result<String> {
    to_string(program)
}
