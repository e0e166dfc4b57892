//! Order-insensitive union of per-file parse results.
//!
//! Headers in a family include each other, so the same declaration shows
//! up through several files. Identical redeclarations collapse to one;
//! same name with a different shape is an input error. Units are sorted
//! by file path first, so the result is identical however the parallel
//! parse interleaved.

use std::collections::HashMap;

use crate::core::Declaration;
use crate::parser::{ParseError, ParsedUnit};

/// Merge parsed units into a single declaration sequence.
///
/// Declaration order follows first appearance in path-sorted unit order.
/// All shape conflicts are collected, not just the first.
pub fn merge_units(mut units: Vec<ParsedUnit>) -> Result<Vec<Declaration>, Vec<ParseError>> {
    units.sort_by(|a, b| a.file.cmp(&b.file));

    let mut merged: Vec<Declaration> = Vec::new();
    let mut index: HashMap<(&'static str, String), usize> = HashMap::new();
    let mut conflicts: Vec<ParseError> = Vec::new();

    for unit in units {
        for decl in unit.decls {
            let key = (decl.kind_str(), decl.name().to_string());
            match index.get(&key) {
                Some(&i) => {
                    let existing = &merged[i];
                    if !existing.same_shape(&decl) {
                        conflicts.push(ParseError::DuplicateMismatch {
                            kind: decl.kind_str(),
                            name: decl.name().to_string(),
                            first: existing.loc().clone(),
                            second: decl.loc().clone(),
                        });
                    }
                    // Identical duplicate: keep the first occurrence.
                }
                None => {
                    index.insert(key, merged.len());
                    merged.push(decl);
                }
            }
        }
    }

    if conflicts.is_empty() {
        Ok(merged)
    } else {
        Err(conflicts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declaration::{SourceLoc, TypedefDecl};
    use crate::core::CType;

    fn typedef_unit(file: &str, name: &str, underlying: CType) -> ParsedUnit {
        ParsedUnit {
            file: file.into(),
            decls: vec![Declaration::Typedef(TypedefDecl {
                name: name.to_string(),
                underlying,
                loc: SourceLoc::new(file, 1),
            })],
        }
    }

    #[test]
    fn test_identical_duplicates_collapse() {
        let units = vec![
            typedef_unit("a.h", "Flags", CType::UInt32),
            typedef_unit("b.h", "Flags", CType::UInt32),
        ];
        let merged = merge_units(units).unwrap();
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].loc().file, std::path::PathBuf::from("a.h"));
    }

    #[test]
    fn test_conflicting_duplicates_fail_naming_both() {
        let units = vec![
            typedef_unit("a.h", "Flags", CType::UInt32),
            typedef_unit("b.h", "Flags", CType::UInt64),
        ];
        let errs = merge_units(units).unwrap_err();
        assert_eq!(errs.len(), 1);
        match &errs[0] {
            ParseError::DuplicateMismatch { name, first, second, .. } => {
                assert_eq!(name, "Flags");
                assert_eq!(first.file, std::path::PathBuf::from("a.h"));
                assert_eq!(second.file, std::path::PathBuf::from("b.h"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_merge_is_order_insensitive() {
        let a = typedef_unit("a.h", "A", CType::UInt32);
        let b = typedef_unit("b.h", "B", CType::UInt64);

        let forward = merge_units(vec![a.clone(), b.clone()]).unwrap();
        let backward = merge_units(vec![b, a]).unwrap();

        let names: Vec<&str> = forward.iter().map(|d| d.name()).collect();
        let names_rev: Vec<&str> = backward.iter().map(|d| d.name()).collect();
        assert_eq!(names, names_rev);
    }
}
