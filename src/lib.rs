//! Builds validated, bit-accurate instruction-encoding tables from `.isa` descriptions.
//!
//! [`loader::isa`] reads and parses documents; [`isa`] holds the model, the instruction
//! builder, and the validator that produce an [`isa::InstructionTable`].

pub mod isa;
pub mod loader;
