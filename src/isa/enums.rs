//! Named sets of symbolic values referenced by multi-bit modifiers.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

use super::ast::{EnumDecl, EnumEntryDecl, IsaDocument};
use super::diagnostic::{DiagnosticPhase, IsaDiagnostic};
use super::error::IsaError;
use super::ident::normalize;

/// Placeholder text recorded for `reserved` entries.
pub const RESERVED: &str = "reserved";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnumValue {
    pub text: String,
    pub is_default: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enum {
    pub name: String,
    pub values: Vec<EnumValue>,
}

impl Enum {
    /// Builds an enum from its declaration. At most one value may be marked default.
    pub fn from_decl(decl: &EnumDecl) -> Result<Self, IsaDiagnostic> {
        let values: Vec<EnumValue> = decl
            .entries
            .iter()
            .map(|entry| match entry {
                EnumEntryDecl::Value { text, default } => EnumValue {
                    text: text.clone(),
                    is_default: *default,
                },
                EnumEntryDecl::Reserved => EnumValue {
                    text: RESERVED.to_string(),
                    is_default: false,
                },
            })
            .collect();

        let defaults: Vec<&str> = values
            .iter()
            .filter(|value| value.is_default)
            .map(|value| value.text.as_str())
            .collect();
        if defaults.len() > 1 {
            return Err(IsaDiagnostic::error(
                DiagnosticPhase::Build,
                "build.enum.multiple-defaults",
                format!(
                    "enum '{}' marks {} values as default: {}",
                    decl.name,
                    defaults.len(),
                    defaults.join(", ")
                ),
                Some(decl.span.clone()),
            ));
        }

        Ok(Self {
            name: decl.name.clone(),
            values,
        })
    }

    pub fn default_index(&self) -> Option<usize> {
        self.values.iter().position(|value| value.is_default)
    }

    pub fn bare_values(&self) -> impl Iterator<Item = &str> {
        self.values.iter().map(|value| value.text.as_str())
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Mapping from normalized enum name to [`Enum`], populated before any instruction is built.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnumRegistry {
    enums: BTreeMap<String, Enum>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers every enum of the document, reporting all malformed enums together.
    pub fn from_document(doc: &IsaDocument) -> Result<Self, IsaError> {
        let mut registry = Self::new();
        let mut diagnostics = Vec::new();
        for decl in doc.enums() {
            match Enum::from_decl(decl) {
                Ok(built) => {
                    if let Err(diag) = registry.insert(built, decl) {
                        diagnostics.push(diag);
                    }
                }
                Err(diag) => diagnostics.push(diag),
            }
        }
        if !diagnostics.is_empty() {
            return Err(IsaError::Diagnostics {
                phase: DiagnosticPhase::Build,
                diagnostics,
            });
        }
        debug!(count = registry.len(), "enum registry populated");
        Ok(registry)
    }

    fn insert(&mut self, built: Enum, decl: &EnumDecl) -> Result<(), IsaDiagnostic> {
        let key = normalize(&built.name);
        if self.enums.contains_key(&key) {
            return Err(IsaDiagnostic::error(
                DiagnosticPhase::Build,
                "build.enum.duplicate",
                format!("enum '{}' normalizes to '{key}' which is already declared", built.name),
                Some(decl.span.clone()),
            ));
        }
        self.enums.insert(key, built);
        Ok(())
    }

    /// Looks up an enum by any spelling that normalizes to its key.
    pub fn get(&self, name: &str) -> Option<&Enum> {
        self.enums.get(&normalize(name))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Enum)> {
        self.enums.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn len(&self) -> usize {
        self.enums.len()
    }

    pub fn is_empty(&self) -> bool {
        self.enums.is_empty()
    }
}
