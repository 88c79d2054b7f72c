//! The finished, validated instruction table.

use std::collections::BTreeMap;

use ahash::AHashMap;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::info;

use super::ast::{IsaDocument, IsaItem};
use super::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourceSpan};
use super::enums::EnumRegistry;
use super::error::IsaError;
use super::expand::InstructionBuilder;
use super::instruction::Instruction;
use super::modifier::ModifierCatalog;
use super::validator::Validator;

/// Name of the lookup table holding the immediate constant pool.
pub const IMMEDIATES_LUT: &str = "Immediates";

/// Immutable instruction table built from one document.
///
/// Instructions keep document order, with group members expanded in place.
#[derive(Debug, Clone, Serialize)]
pub struct InstructionTable {
    instructions: Vec<Instruction>,
    enums: EnumRegistry,
    luts: BTreeMap<String, Vec<u32>>,
    #[serde(skip)]
    by_name: AHashMap<String, usize>,
    #[serde(skip)]
    warnings: Vec<IsaDiagnostic>,
    #[serde(skip)]
    fingerprint: [u8; 32],
}

impl InstructionTable {
    /// Builds and validates every declaration of `doc`.
    ///
    /// Enums are registered before any instruction is built. Structural errors abort on the
    /// first offending declaration; validation failures are reported together.
    pub fn from_document(doc: &IsaDocument, catalog: &ModifierCatalog) -> Result<Self, IsaError> {
        let luts = collect_luts(doc)?;
        let enums = EnumRegistry::from_document(doc)?;

        let mut instructions = Vec::new();
        let mut spans: Vec<SourceSpan> = Vec::new();
        {
            let mut builder = InstructionBuilder::new(catalog, &enums);
            for item in &doc.items {
                match item {
                    IsaItem::Instruction(decl) => {
                        instructions.push(builder.build_instruction(decl)?);
                        spans.push(decl.span.clone());
                    }
                    IsaItem::Group(group) => {
                        instructions.extend(builder.build_group(group)?);
                        spans.extend(group.members.iter().map(|member| member.span.clone()));
                    }
                    IsaItem::Lut(_) | IsaItem::Enum(_) => {}
                }
            }
        }

        let report = Validator::new().validate(instructions.iter().zip(spans.iter().map(Some)))?;

        let by_name = instructions
            .iter()
            .enumerate()
            .map(|(idx, instr)| (instr.name.clone(), idx))
            .collect();
        let mut table = Self {
            instructions,
            enums,
            luts,
            by_name,
            warnings: report.warnings,
            fingerprint: [0; 32],
        };
        table.fingerprint = table.compute_fingerprint()?;
        info!(
            path = %doc.path.display(),
            instructions = table.len(),
            enums = table.enums.len(),
            warnings = table.warnings.len(),
            "instruction table built"
        );
        Ok(table)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Instruction> {
        self.instructions.iter()
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn get(&self, name: &str) -> Option<&Instruction> {
        self.by_name.get(name).map(|&idx| &self.instructions[idx])
    }

    /// All instructions sharing a primary opcode, in table order.
    pub fn by_opcode(&self, opcode: u32) -> impl Iterator<Item = &Instruction> {
        self.instructions
            .iter()
            .filter(move |instr| instr.opcode == opcode)
    }

    /// Exact match on the primary and secondary opcode.
    pub fn lookup(&self, opcode: u32, opcode2: Option<u32>) -> Option<&Instruction> {
        self.by_opcode(opcode).find(|instr| instr.opcode2 == opcode2)
    }

    pub fn enums(&self) -> &EnumRegistry {
        &self.enums
    }

    /// The immediate constant pool, empty when the document declares none.
    pub fn immediates(&self) -> &[u32] {
        self.luts
            .get(IMMEDIATES_LUT)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn luts(&self) -> &BTreeMap<String, Vec<u32>> {
        &self.luts
    }

    pub fn warnings(&self) -> &[IsaDiagnostic] {
        &self.warnings
    }

    /// SHA-256 over the canonical JSON form of the table.
    pub fn fingerprint(&self) -> [u8; 32] {
        self.fingerprint
    }

    pub fn fingerprint_hex(&self) -> String {
        self.fingerprint
            .iter()
            .map(|byte| format!("{byte:02x}"))
            .collect()
    }

    fn compute_fingerprint(&self) -> Result<[u8; 32], IsaError> {
        let canonical = serde_json::to_vec(self)
            .map_err(|err| IsaError::Build(format!("cannot serialize instruction table: {err}")))?;
        let digest = Sha256::digest(&canonical);
        let mut array = [0u8; 32];
        array.copy_from_slice(&digest);
        Ok(array)
    }
}

fn collect_luts(doc: &IsaDocument) -> Result<BTreeMap<String, Vec<u32>>, IsaError> {
    let mut luts = BTreeMap::new();
    let mut diagnostics = Vec::new();
    for lut in doc.luts() {
        if luts.insert(lut.name.clone(), lut.values.clone()).is_some() {
            diagnostics.push(IsaDiagnostic::error(
                DiagnosticPhase::Build,
                "build.lut.duplicate",
                format!("lookup table '{}' declared more than once", lut.name),
                Some(lut.span.clone()),
            ));
        }
    }
    if diagnostics.is_empty() {
        Ok(luts)
    } else {
        Err(IsaError::Diagnostics {
            phase: DiagnosticPhase::Build,
            diagnostics,
        })
    }
}
