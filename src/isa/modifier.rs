//! Named bitfield modifiers and the catalog of tags instructions refer to them by.

use ahash::AHashMap;
use serde::Serialize;

use super::bits::BitRange;
use super::enums::EnumRegistry;
use super::error::IsaError;

/// Unresolved modifier placement: where the bitfield lives and whether it is implied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModifierSpec {
    pub name: String,
    pub start: u8,
    pub size: u8,
    pub implied: bool,
}

impl ModifierSpec {
    pub fn new(name: impl Into<String>, start: u8, size: u8) -> Self {
        Self {
            name: name.into(),
            start,
            size,
            implied: false,
        }
    }

    pub fn flag(name: impl Into<String>, start: u8) -> Self {
        Self::new(name, start, 1)
    }

    pub fn implied(mut self) -> Self {
        self.implied = true;
        self
    }
}

/// A modifier with its value set resolved.
///
/// One-bit modifiers are flags rendered as `""` / their own name. Wider modifiers take the
/// values of the enum sharing their name; the default is the position of that enum's default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Modifier {
    pub name: String,
    pub start: u8,
    pub size: u8,
    pub implied: bool,
    pub values: Vec<String>,
    pub default: Option<usize>,
}

impl Modifier {
    pub fn resolve(spec: &ModifierSpec, enums: &EnumRegistry) -> Result<Self, IsaError> {
        match spec.size {
            0 => Err(IsaError::Build(format!(
                "modifier '{}' must be at least one bit wide",
                spec.name
            ))),
            1 => Ok(Self {
                name: spec.name.clone(),
                start: spec.start,
                size: 1,
                implied: spec.implied,
                values: vec![String::new(), spec.name.clone()],
                default: Some(0),
            }),
            size => {
                let values = enums.get(&spec.name).ok_or_else(|| {
                    IsaError::Build(format!(
                        "modifier '{}' is {size} bits wide but no enum named '{}' is declared",
                        spec.name, spec.name
                    ))
                })?;
                Ok(Self {
                    name: spec.name.clone(),
                    start: spec.start,
                    size,
                    implied: spec.implied,
                    values: values.bare_values().map(str::to_string).collect(),
                    default: values.default_index(),
                })
            }
        }
    }

    pub fn is_flag(&self) -> bool {
        self.size == 1
    }

    pub fn range(&self) -> BitRange {
        BitRange::new(self.start, self.size)
    }
}

/// Tag → modifier placement table. Passed into the builder so callers can swap it out.
#[derive(Debug, Clone, Default)]
pub struct ModifierCatalog {
    entries: AHashMap<String, ModifierSpec>,
}

impl ModifierCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog of the modifier tags understood by the stock instruction descriptions.
    pub fn standard() -> Self {
        let mut catalog = Self::new();
        catalog
            .insert("inactive_result", ModifierSpec::new("inactive_result", 22, 4))
            .insert("store_segment", ModifierSpec::new("store_segment", 24, 2))
            .insert("regfmt", ModifierSpec::new("register_format", 24, 3))
            .insert("vecsize", ModifierSpec::new("vector_size", 28, 2))
            .insert("slot", ModifierSpec::new("slot", 30, 3))
            .insert("roundmode", ModifierSpec::new("round_mode", 30, 2))
            .insert("result_type", ModifierSpec::new("result_type", 30, 2))
            .insert("saturate", ModifierSpec::flag("saturate", 30))
            .insert("not_result", ModifierSpec::flag("not_result", 30))
            .insert("lane_op", ModifierSpec::new("lane_operation", 32, 2))
            .insert("cmp", ModifierSpec::new("condition", 32, 3))
            .insert("clamp", ModifierSpec::new("clamp", 32, 2))
            .insert(
                "sr_count",
                ModifierSpec::new("staging_register_count", 33, 3).implied(),
            )
            .insert("subgroup", ModifierSpec::new("subgroup_size", 36, 2));
        catalog
    }

    pub fn insert(&mut self, tag: impl Into<String>, spec: ModifierSpec) -> &mut Self {
        self.entries.insert(tag.into(), spec);
        self
    }

    pub fn get(&self, tag: &str) -> Option<&ModifierSpec> {
        self.entries.get(tag)
    }

    /// Tags in sorted order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
