//! Turns instruction and group declarations into concrete [`Instruction`]s.

use ahash::AHashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::ast::{BodyEntry, GroupDecl, InstructionDecl};
use super::diagnostic::{DiagnosticPhase, IsaDiagnostic, SourceSpan};
use super::enums::EnumRegistry;
use super::error::IsaError;
use super::instruction::{
    Instruction, InstructionOverrides, InstructionParts, InstructionTemplate, typesize,
};
use super::modifier::{Modifier, ModifierCatalog};
use super::operand::{Dest, Immediate, Source, Staging};

/// Builds instructions against one enum registry and modifier catalog.
///
/// Catalog modifiers are resolved on first use and cached for the rest of the build.
pub struct InstructionBuilder<'a> {
    catalog: &'a ModifierCatalog,
    enums: &'a EnumRegistry,
    resolved: AHashMap<String, Modifier>,
}

impl<'a> InstructionBuilder<'a> {
    pub fn new(catalog: &'a ModifierCatalog, enums: &'a EnumRegistry) -> Self {
        Self {
            catalog,
            enums,
            resolved: AHashMap::new(),
        }
    }

    pub fn build_instruction(&mut self, decl: &InstructionDecl) -> Result<Instruction, IsaError> {
        let template = InstructionTemplate {
            name: Some(decl.name.as_str()),
            opcode: decl.opcode,
            opcode2: decl.opcode2,
            shape: &decl.shape,
        };
        self.build(&template, &InstructionOverrides::default())
            .map_err(|err| located(err, &decl.name, &decl.span))
    }

    /// Expands a group: one instruction per member, each overriding name/opcode/opcode2.
    pub fn build_group(&mut self, group: &GroupDecl) -> Result<Vec<Instruction>, IsaError> {
        let template = InstructionTemplate {
            name: group.name.as_deref(),
            opcode: group.opcode,
            opcode2: group.opcode2,
            shape: &group.shape,
        };
        let mut built = Vec::with_capacity(group.members.len());
        for member in &group.members {
            let overrides = InstructionOverrides {
                name: Some(member.name.as_str()),
                opcode: member.opcode,
                opcode2: member.opcode2,
            };
            let instr = self
                .build(&template, &overrides)
                .map_err(|err| located(err, &member.name, &member.span))?;
            built.push(instr);
        }
        debug!(
            group = group.name.as_deref().unwrap_or("<anonymous>"),
            members = built.len(),
            "expanded instruction group"
        );
        Ok(built)
    }

    pub fn build(
        &mut self,
        template: &InstructionTemplate<'_>,
        overrides: &InstructionOverrides<'_>,
    ) -> Result<Instruction, IsaError> {
        let header = template.merge(overrides)?;
        let shape = template.shape;
        let width = typesize(&header.name);

        let mut sources: SmallVec<[Source; 4]> = SmallVec::new();
        for decl in shape.sources() {
            let index = operand_index(sources.len(), "source")?;
            sources.push(Source::from_decl(decl, index, width)?);
        }
        for _ in 0..shape.implicit_srcs {
            let index = operand_index(sources.len(), "source")?;
            sources.push(Source::plain(index, width));
        }

        let mut dests: SmallVec<[Dest; 2]> = shape.dests().map(Dest::from).collect();
        dests.extend((0..shape.implicit_dests).map(|_| Dest::default()));

        let mut staging: SmallVec<[Staging; 2]> = SmallVec::new();
        for decl in shape.staging() {
            let index = operand_index(staging.len(), "staging register")?;
            staging.push(Staging::from_decl(index, decl)?);
        }

        let immediates = shape.immediates().map(Immediate::from).collect();

        let mut modifiers = Vec::new();
        for entry in &shape.entries {
            match entry {
                BodyEntry::CatalogModifier(tag) => modifiers.push(self.catalog_modifier(tag)?),
                BodyEntry::Modifier(spec) => modifiers.push(Modifier::resolve(spec, self.enums)?),
                _ => {}
            }
        }

        Instruction::new(InstructionParts {
            name: header.name,
            opcode: header.opcode,
            opcode2: header.opcode2,
            sources,
            dests,
            staging,
            immediates,
            modifiers,
        })
    }

    fn catalog_modifier(&mut self, tag: &str) -> Result<Modifier, IsaError> {
        if let Some(modifier) = self.resolved.get(tag) {
            return Ok(modifier.clone());
        }
        let spec = self
            .catalog
            .get(tag)
            .ok_or_else(|| {
                IsaError::Build(format!(
                    "unknown modifier tag '{tag}' (known tags: {})",
                    self.catalog.tags().join(", ")
                ))
            })?;
        let modifier = Modifier::resolve(spec, self.enums)?;
        self.resolved.insert(tag.to_string(), modifier.clone());
        Ok(modifier)
    }
}

fn operand_index(position: usize, kind: &str) -> Result<u8, IsaError> {
    u8::try_from(position).map_err(|_| IsaError::Build(format!("too many {kind} operands")))
}

/// Pins a structural error to the declaration that caused it.
fn located(err: IsaError, name: &str, span: &SourceSpan) -> IsaError {
    match err {
        IsaError::Build(message) => IsaError::Diagnostics {
            phase: DiagnosticPhase::Build,
            diagnostics: vec![IsaDiagnostic::error(
                DiagnosticPhase::Build,
                "build.instruction",
                format!("instruction '{name}': {message}"),
                Some(span.clone()),
            )],
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::isa::ast::{ImmediateDecl, IsaItem, SourceDecl, StagingDecl};
    use crate::isa::bits::BitRange;
    use crate::isa::builder::IsaBuilder;
    use crate::isa::modifier::ModifierSpec;

    fn enums() -> EnumRegistry {
        let mut builder = IsaBuilder::new("expand.isa");
        builder
            .enumeration("round_mode")
            .default_value("rte")
            .value("rtp")
            .value("rtn")
            .value("rtz")
            .finish();
        EnumRegistry::from_document(&builder.build()).expect("enums")
    }

    fn single_instruction(builder: IsaBuilder) -> InstructionDecl {
        match builder.build().items.into_iter().next() {
            Some(IsaItem::Instruction(decl)) => decl,
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    fn single_group(builder: IsaBuilder) -> GroupDecl {
        match builder.build().items.into_iter().next() {
            Some(IsaItem::Group(decl)) => decl,
            other => panic!("expected group, got {other:?}"),
        }
    }

    #[test]
    fn builds_sources_with_inferred_width() {
        let mut builder = IsaBuilder::new("expand.isa");
        builder
            .instruction("FADD.f16", 0xA4)
            .source(SourceDecl {
                name: "A".into(),
                absneg: true,
                swizzle: true,
                ..SourceDecl::default()
            })
            .source(SourceDecl {
                size: Some(32),
                ..SourceDecl::default()
            })
            .implicit_srcs(1)
            .dest("D")
            .modifier("roundmode")
            .modifier("saturate")
            .finish();
        let decl = single_instruction(builder);
        let enums = enums();
        let catalog = ModifierCatalog::standard();
        let instr = InstructionBuilder::new(&catalog, &enums)
            .build_instruction(&decl)
            .expect("build");

        assert_eq!(instr.sources.len(), 3);
        assert_eq!(instr.sources[0].size, 16);
        assert_eq!(instr.sources[0].encoding.swizzle, Some(BitRange::new(28, 2)));
        assert_eq!(instr.sources[1].size, 32);
        assert_eq!(instr.sources[2].index, 2);
        assert_eq!(instr.sources[2].size, 16);
        assert_eq!(instr.dests.len(), 1);
        let names: Vec<_> = instr.modifiers.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["round_mode", "saturate"]);
        assert_eq!(instr.secondary_shift(), 24);
        assert_eq!(instr.secondary_mask(), 0);
    }

    #[test]
    fn group_members_override_header_only() {
        let mut builder = IsaBuilder::new("expand.isa");
        builder
            .group("FADD")
            .opcode(0x10)
            .implicit_srcs(2)
            .implicit_dests(1)
            .member("FADD.f32", None, Some(0x1))
            .member("FADD.v2f16", Some(0x11), None)
            .finish();
        let group = single_group(builder);
        let enums = EnumRegistry::new();
        let catalog = ModifierCatalog::standard();
        let built = InstructionBuilder::new(&catalog, &enums)
            .build_group(&group)
            .expect("build");
        assert_eq!(built.len(), 2);
        assert_eq!(built[0].name, "FADD.f32");
        assert_eq!((built[0].opcode, built[0].opcode2), (0x10, Some(0x1)));
        assert_eq!(built[0].sources[0].size, 32);
        assert_eq!(built[1].name, "FADD.v2f16");
        assert_eq!((built[1].opcode, built[1].opcode2), (0x11, None));
        assert_eq!(built[1].sources[0].size, 16);
        assert_eq!(built[1].dests.len(), 1);
    }

    #[test]
    fn explicit_modifiers_and_staging() {
        let mut builder = IsaBuilder::new("expand.isa");
        builder
            .instruction("STORE.i32", 0x61)
            .opcode2(0x2)
            .staging(StagingDecl {
                read: true,
                count: 1,
                ..StagingDecl::default()
            })
            .immediate(ImmediateDecl {
                name: "offset".into(),
                start: 8,
                size: 16,
                signed: true,
            })
            .explicit_modifier(ModifierSpec::flag("left", 34))
            .finish();
        let decl = single_instruction(builder);
        let enums = EnumRegistry::new();
        let catalog = ModifierCatalog::standard();
        let instr = InstructionBuilder::new(&catalog, &enums)
            .build_instruction(&decl)
            .expect("build");
        assert_eq!(instr.staging[0].encoded_flags, 0x40);
        assert_eq!(instr.immediates[0].range(), BitRange::new(8, 16));
        assert!(instr.modifier("left").is_some());
        assert_eq!((instr.secondary_shift(), instr.secondary_mask()), (27, 0x7));
    }

    #[test]
    fn unknown_tag_names_the_instruction() {
        let mut builder = IsaBuilder::new("expand.isa");
        builder.instruction("ODD", 0x1).modifier("bogus").finish();
        let decl = single_instruction(builder);
        let enums = EnumRegistry::new();
        let catalog = ModifierCatalog::standard();
        let err = InstructionBuilder::new(&catalog, &enums)
            .build_instruction(&decl)
            .unwrap_err();
        let diag = &err.diagnostics()[0];
        assert_eq!(diag.code, "build.instruction");
        assert!(diag.message.contains("instruction 'ODD'"), "{diag:?}");
        assert!(diag.message.contains("unknown modifier tag 'bogus'"), "{diag:?}");
        assert!(diag.message.contains("clamp, cmp, inactive_result"), "{diag:?}");
    }

    #[test]
    fn missing_group_opcode_is_reported_per_member() {
        let mut builder = IsaBuilder::new("expand.isa");
        builder
            .group("G")
            .member("HAS", Some(0x1), None)
            .member("LACKS", None, None)
            .finish();
        let group = single_group(builder);
        let enums = EnumRegistry::new();
        let catalog = ModifierCatalog::standard();
        let err = InstructionBuilder::new(&catalog, &enums)
            .build_group(&group)
            .unwrap_err();
        assert!(err.to_string().contains("'LACKS' is missing an opcode"), "{err}");
    }
}
