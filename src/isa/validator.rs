//! Whole-table invariant checks run after every instruction has been built.

use std::collections::BTreeSet;

use ahash::AHashMap;
use tracing::warn;

use super::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourceSpan};
use super::error::IsaError;
use super::instruction::Instruction;

/// Non-fatal findings of a successful validation pass.
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub warnings: Vec<IsaDiagnostic>,
}

pub struct Validator {
    diagnostics: Vec<IsaDiagnostic>,
}

impl Default for Validator {
    fn default() -> Self {
        Self::new()
    }
}

impl Validator {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    /// Checks name uniqueness and secondary opcode/mask consistency.
    ///
    /// Every offending instruction is reported before failing.
    pub fn validate<'i>(
        &mut self,
        entries: impl IntoIterator<Item = (&'i Instruction, Option<&'i SourceSpan>)>,
    ) -> Result<ValidationReport, IsaError> {
        let entries: Vec<_> = entries.into_iter().collect();
        self.check_unique_names(&entries);
        let mut warned_modifiers = BTreeSet::new();
        for (instr, span) in &entries {
            self.check_opcode2_mask(instr, *span);
            self.check_modifier_capacity(instr, *span, &mut warned_modifiers);
        }

        let (errors, warnings): (Vec<_>, Vec<_>) = std::mem::take(&mut self.diagnostics)
            .into_iter()
            .partition(IsaDiagnostic::is_error);
        for warning in &warnings {
            warn!("{}", warning.format_human());
        }
        if errors.is_empty() {
            Ok(ValidationReport { warnings })
        } else {
            Err(IsaError::Diagnostics {
                phase: DiagnosticPhase::Validation,
                diagnostics: errors,
            })
        }
    }

    fn check_unique_names(&mut self, entries: &[(&Instruction, Option<&SourceSpan>)]) {
        let mut order: Vec<&str> = Vec::new();
        let mut counts: AHashMap<&str, (usize, Option<&SourceSpan>)> = AHashMap::new();
        for (instr, span) in entries {
            let slot = counts.entry(instr.name.as_str()).or_insert_with(|| {
                order.push(instr.name.as_str());
                (0, None)
            });
            slot.0 += 1;
            if slot.0 == 2 {
                slot.1 = *span;
            }
        }
        for name in order {
            let (count, span) = counts[name];
            if count != 1 {
                self.push_error(
                    "validation.duplicate-instruction",
                    format!("instruction '{name}' appeared {count} times"),
                    span.cloned(),
                );
            }
        }
    }

    fn check_opcode2_mask(&mut self, instr: &Instruction, span: Option<&SourceSpan>) {
        if instr.opcode2_fits_mask() {
            return;
        }
        let opcode2 = instr.opcode2.unwrap_or_default();
        self.push_error(
            "validation.opcode2-mask",
            format!(
                "instruction '{}' secondary opcode {opcode2:#x} has bits {:#x} outside mask {:#x}",
                instr.name,
                opcode2 & !instr.secondary_mask(),
                instr.secondary_mask()
            ),
            span.cloned(),
        );
    }

    fn check_modifier_capacity(
        &mut self,
        instr: &Instruction,
        span: Option<&SourceSpan>,
        warned: &mut BTreeSet<String>,
    ) {
        for modifier in &instr.modifiers {
            let capacity = modifier.range().capacity();
            if modifier.values.len() <= capacity || warned.contains(&modifier.name) {
                continue;
            }
            warned.insert(modifier.name.clone());
            self.diagnostics.push(IsaDiagnostic::warning(
                DiagnosticPhase::Validation,
                "validation.modifier.too-many-values",
                format!(
                    "modifier '{}' has {} values but its {}-bit field encodes only {capacity} (first used by '{}')",
                    modifier.name,
                    modifier.values.len(),
                    modifier.size,
                    instr.name
                ),
                span.cloned(),
            ));
        }
    }

    fn push_error(&mut self, code: &'static str, message: String, span: Option<SourceSpan>) {
        self.diagnostics.push(IsaDiagnostic::error(
            DiagnosticPhase::Validation,
            code,
            message,
            span,
        ));
    }
}
