//! Type-reference resolution.
//!
//! After this pass every named type reference either maps to exactly one
//! declaration or is marked opaque. Names that stay unresolved are left
//! out of the map; the emitter treats reaching one as fatal rather than
//! guessing a type.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use crate::core::Declaration;

/// What a named type reference points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Resolution {
    Struct,
    Enum,
    Typedef,
    /// Unknown type referenced only behind pointers; bound as an opaque
    /// handle
    Opaque,
}

/// Name to resolution mapping for one declaration set.
#[derive(Debug, Clone, Default)]
pub struct ResolutionMap {
    map: HashMap<String, Resolution>,
}

impl ResolutionMap {
    pub fn get(&self, name: &str) -> Option<Resolution> {
        self.map.get(name).copied()
    }

    pub fn is_opaque(&self, name: &str) -> bool {
        self.get(name) == Some(Resolution::Opaque)
    }
}

/// Classify every named reference in the declaration set.
///
/// With `detect_opaque_pointers`, an undeclared name that only ever
/// appears behind a pointer is considered an opaque external handle
/// (window-system types, `Foo_T` handle tags). Undeclared names used by
/// value stay unresolved.
pub fn resolve(decls: &[Declaration], detect_opaque_pointers: bool) -> ResolutionMap {
    let mut map = HashMap::new();
    for decl in decls {
        let res = match decl {
            Declaration::Struct(_) => Resolution::Struct,
            Declaration::Enum(_) => Resolution::Enum,
            Declaration::Typedef(_) => Resolution::Typedef,
            _ => continue,
        };
        map.insert(decl.name().to_string(), res);
    }

    if detect_opaque_pointers {
        // name -> seen only behind pointers so far
        let mut unknown: BTreeMap<String, bool> = BTreeMap::new();
        let mut visit = |name: &str, behind_pointer: bool| {
            if !map.contains_key(name) {
                let entry = unknown.entry(name.to_string()).or_insert(true);
                *entry &= behind_pointer;
            }
        };

        for decl in decls {
            match decl {
                Declaration::Struct(s) => {
                    for field in &s.fields {
                        field.ty.visit_named(false, &mut visit);
                    }
                }
                Declaration::Function(f) => {
                    f.return_type.visit_named(false, &mut visit);
                    for p in &f.params {
                        p.ty.visit_named(false, &mut visit);
                    }
                }
                Declaration::Typedef(t) => t.underlying.visit_named(false, &mut visit),
                Declaration::Enum(_) | Declaration::Constant(_) => {}
            }
        }

        for (name, pointer_only) in unknown {
            if pointer_only {
                tracing::debug!("treating `{}` as an opaque handle", name);
                map.insert(name, Resolution::Opaque);
            }
        }
    }

    ResolutionMap { map }
}
