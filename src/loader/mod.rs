//! Front ends that turn description files into in-memory models.

pub mod isa;
