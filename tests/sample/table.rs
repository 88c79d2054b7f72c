use pretty_assertions::assert_eq;

use isatab::isa::bits::BitRange;
use isatab::isa::normalize;
use isatab::loader::isa::IsaLoader;

use super::{load_sample, sample_source};

#[test]
fn builds_every_declared_instruction_in_order() {
    let table = load_sample();
    let names: Vec<_> = table.iter().map(|instr| instr.name.as_str()).collect();
    assert_eq!(
        names,
        [
            "NOP",
            "MOV.i32",
            "FADD.f32",
            "FADD.v2f16",
            "FMA.f32",
            "ICMP.u32",
            "ICMP.s32",
            "F32_TO_S32",
            "LSHIFT_OR.i32",
            "LOAD.i32",
            "STORE.i32",
        ]
    );
    assert_eq!(table.enums().len(), 5);
    assert_eq!(table.immediates().len(), 8);
    assert_eq!(table.immediates()[6], 0x3F80_0000);
    assert!(table.warnings().is_empty());
}

#[test]
fn names_are_unique_and_secondary_opcodes_fit() {
    let table = load_sample();
    for instr in table.iter() {
        assert_eq!(table.get(&instr.name).map(|found| found.opcode), Some(instr.opcode));
        if let Some(opcode2) = instr.opcode2 {
            assert_eq!(opcode2 & instr.secondary_mask(), opcode2, "{}", instr.name);
        }
    }
}

#[test]
fn enums_have_at_most_one_default() {
    let table = load_sample();
    for (name, values) in table.enums().iter() {
        let defaults = values.values.iter().filter(|value| value.is_default).count();
        assert!(defaults <= 1, "{name} has {defaults} defaults");
        assert_eq!(normalize(name), name);
    }
}

#[test]
fn group_members_share_shape_with_own_width() {
    let table = load_sample();
    let f32 = table.get("FADD.f32").expect("FADD.f32");
    let f16 = table.get("FADD.v2f16").expect("FADD.v2f16");
    assert_eq!((f32.opcode, f16.opcode), (0xA4, 0xA5));
    assert_eq!(f32.sources[0].size, 32);
    assert_eq!(f16.sources[0].size, 16);
    assert_eq!(f32.sources[1].encoding.swizzle, Some(BitRange::new(26, 2)));
    assert_eq!(f32.sources[0].encoding.neg, Some(BitRange::new(38, 1)));
    assert_eq!(f32.sources[0].encoding.abs, Some(BitRange::new(39, 1)));
    let round = f16.modifier("round_mode").expect("round mode");
    assert_eq!(round.values, ["rte", "rtp", "rtn", "rtz"]);
    assert_eq!(round.default, Some(0));
}

#[test]
fn secondary_mask_rules() {
    let table = load_sample();
    let mask = |name: &str| {
        let instr = table.get(name).expect(name);
        (instr.secondary_shift(), instr.secondary_mask())
    };
    assert_eq!(mask("NOP"), (16, 0x0));
    assert_eq!(mask("ICMP.u32"), (16, 0xF));
    assert_eq!(mask("FMA.f32"), (24, 0x3));
    assert_eq!(mask("F32_TO_S32"), (16, 0x1F));
    assert_eq!(mask("LSHIFT_OR.i32"), (24, 0x10F));
    assert_eq!(mask("LOAD.i32"), (27, 0x7));
    assert_eq!(mask("STORE.i32"), (27, 0x7));
}

#[test]
fn staging_and_immediates_are_placed() {
    let table = load_sample();
    let load = table.get("LOAD.i32").expect("load");
    assert!(load.dests.is_empty());
    assert_eq!(load.staging[0].start, 40);
    assert_eq!(load.staging[0].encoded_flags, 0x80);
    let store = table.get("STORE.i32").expect("store");
    assert_eq!(store.staging[0].encoded_flags, 0x40);
    let sr_count = store.modifier("staging_register_count").expect("sr_count");
    assert!(sr_count.implied);
    assert_eq!(sr_count.values.len(), 8);

    let fields = store.encoding_fields();
    assert!(fields.contains(&("sr0".to_string(), BitRange::new(40, 8))));
    assert!(fields.contains(&("imm.offset".to_string(), BitRange::new(8, 16))));
}

#[test]
fn lane_selector_uses_index_position() {
    let table = load_sample();
    let shift = table.get("LSHIFT_OR.i32").expect("lshift");
    assert_eq!(shift.sources[1].lane, Some(36));
    assert_eq!(shift.sources[1].encoding.lane, Some(BitRange::new(36, 2)));
    assert_eq!(shift.sources[0].encoding.not, Some(BitRange::new(35, 1)));
    assert!(shift.modifier("left").is_some_and(|left| left.is_flag()));
}

#[test]
fn opcode_lookup() {
    let table = load_sample();
    assert_eq!(
        table.lookup(0xF0, Some(0x2)).map(|instr| instr.name.as_str()),
        Some("ICMP.s32")
    );
    assert_eq!(table.by_opcode(0xF0).count(), 2);
    assert!(table.lookup(0xF0, None).is_none());
}

#[test]
fn rebuilding_yields_identical_tables() {
    let first = load_sample();
    let second = IsaLoader::new()
        .load_str("elsewhere.isa", &sample_source())
        .expect("rebuild");
    assert_eq!(first.fingerprint(), second.fingerprint());
    assert_eq!(
        serde_json::to_string(&first).expect("json"),
        serde_json::to_string(&second).expect("json")
    );
}
