//! Builds the checked-in `defs/sample.isa` description and malformed variants of it.

mod errors;
mod table;

use std::path::PathBuf;

use isatab::isa::InstructionTable;
use isatab::loader::isa::IsaLoader;

pub fn sample_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("defs/sample.isa")
}

pub fn sample_source() -> String {
    std::fs::read_to_string(sample_path()).expect("read sample description")
}

pub fn load_sample() -> InstructionTable {
    IsaLoader::new()
        .load_table(sample_path())
        .expect("sample description builds")
}
