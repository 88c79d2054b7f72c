//! Instruction-encoding model and the staged pipeline that builds it.
//!
//! A parsed [`IsaDocument`](ast::IsaDocument) is turned into an [`EnumRegistry`] first, then
//! every instruction and group is expanded by the [`InstructionBuilder`](expand::InstructionBuilder)
//! against a [`ModifierCatalog`], and finally the [`Validator`](validator::Validator) checks
//! whole-table invariants before an [`InstructionTable`] is handed out.

pub mod ast;
pub mod bits;
pub mod builder;
pub mod diagnostic;
pub mod enums;
pub mod error;
pub mod expand;
pub mod ident;
pub mod instruction;
pub mod literal;
pub mod modifier;
pub mod operand;
pub mod table;
pub mod validator;

pub use builder::IsaBuilder;
pub use enums::{Enum, EnumRegistry, EnumValue};
pub use error::IsaError;
pub use ident::normalize;
pub use instruction::{Instruction, typesize};
pub use modifier::{Modifier, ModifierCatalog, ModifierSpec};
pub use operand::{Dest, Immediate, Source, SourceFlags, Staging};
pub use table::InstructionTable;
