use std::fs;

use tempfile::tempdir;

use isatab::isa::IsaError;
use isatab::isa::diagnostic::DiagnosticPhase;
use isatab::loader::isa::IsaLoader;

use super::sample_source;

fn build_variant(extra: &str) -> IsaError {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("variant.isa");
    fs::write(&path, format!("{}\n{extra}", sample_source())).expect("write variant");
    IsaLoader::new()
        .load_table(&path)
        .expect_err("variant should fail")
}

#[test]
fn duplicate_names_are_all_reported() {
    let err = build_variant(
        ":ins NOP opcode=0x1\n:group opcode=0x2 srcs=2 {\n ins FADD.f32\n ins FADD.v2f16\n ins NOP\n}\n",
    );
    match &err {
        IsaError::Diagnostics {
            phase: DiagnosticPhase::Validation,
            diagnostics,
        } => {
            let messages: Vec<_> = diagnostics.iter().map(|diag| diag.message.as_str()).collect();
            assert_eq!(
                messages,
                [
                    "instruction 'NOP' appeared 3 times",
                    "instruction 'FADD.f32' appeared 2 times",
                    "instruction 'FADD.v2f16' appeared 2 times",
                ]
            );
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn stray_secondary_bits_fail_validation() {
    let err = build_variant(":ins LOAD.i8 opcode=0x60 opcode2=0x8 srcs=2 { sr write=true }\n");
    let diag = &err.diagnostics()[0];
    assert_eq!(diag.code, "validation.opcode2-mask");
    assert!(diag.message.contains("'LOAD.i8'"), "{diag:?}");
    let span = diag.span.as_ref().expect("span");
    assert!(span.path.ends_with("variant.isa"));
}

#[test]
fn multiple_enum_defaults_are_collected() {
    let err = build_variant(
        ":enum A { value x default=true value y default=true }\n:enum B { value p default=true value q default=true }\n",
    );
    let codes: Vec<_> = err.diagnostics().iter().map(|diag| diag.code).collect();
    assert_eq!(codes, ["build.enum.multiple-defaults", "build.enum.multiple-defaults"]);
}

#[test]
fn structural_errors_name_the_instruction() {
    let err = build_variant(":ins MIX opcode=0x3 { dest \"D\" sr read=true }\n");
    assert!(
        err.to_string().contains("instruction 'MIX'"),
        "unexpected error: {err}"
    );

    let err = build_variant(":ins SWZ.i8 opcode=0x4 { src swizzle=true }\n");
    assert!(err.to_string().contains("swizzles require 16 or 32"), "{err}");
}

#[test]
fn enum_backed_modifier_needs_its_enum() {
    let err = build_variant(":ins SUB opcode=0x5 srcs=1 { subgroup }\n");
    assert!(
        err.to_string().contains("no enum named 'subgroup_size'"),
        "unexpected error: {err}"
    );
}

#[test]
fn parse_errors_are_collected_across_directives() {
    let err = build_variant(":ins BAD1 opcode=0x1 bogus=1\n:ins BAD2 opcode=zz\n");
    match &err {
        IsaError::Diagnostics {
            phase: DiagnosticPhase::Parser,
            diagnostics,
        } => assert_eq!(diagnostics.len(), 2, "{diagnostics:?}"),
        other => panic!("unexpected error: {other:?}"),
    }
}
