//! The ordered rule pipeline.
//!
//! Applies the rule list to every declaration in sequence, then checks
//! the final identifiers for collisions. Applying the same rule list to
//! the same declaration sequence twice yields byte-identical output.

use std::collections::HashMap;

use crate::core::{Declaration, TransformedSymbol};
use crate::transform::rules::{
    ApplyMarshalling, Rule, RuleContext, StripEnumMemberPrefix, StripLeadingUnderscore,
    UnwrapUncheckedCast,
};
use crate::transform::CollisionError;

/// The built-in rules in their fixed order.
pub fn default_rules() -> Vec<Box<dyn Rule>> {
    vec![
        Box::new(UnwrapUncheckedCast),
        Box::new(StripEnumMemberPrefix),
        Box::new(StripLeadingUnderscore),
        Box::new(ApplyMarshalling),
    ]
}

/// Run the rule pipeline over a declaration sequence.
///
/// Declaration order is preserved. The input is never mutated; each rule
/// produces a new decorated symbol.
pub fn transform(
    decls: &[Declaration],
    rules: &[Box<dyn Rule>],
    cx: &RuleContext<'_>,
) -> Result<Vec<TransformedSymbol>, CollisionError> {
    let mut symbols = Vec::with_capacity(decls.len());
    for decl in decls {
        let mut sym = TransformedSymbol::seed(decl);
        for rule in rules {
            tracing::trace!(rule = rule.name(), symbol = %sym.source_name, "applying");
            sym = rule.apply(sym, cx);
        }
        symbols.push(sym);
    }

    check_collisions(decls, &symbols)?;
    Ok(symbols)
}

/// Fail on any two symbols mapping to one final identifier within a
/// namespace: the shared top-level scope, or one enum's member scope.
///
/// Rules rename in place but never add, drop, or reorder, so transformed
/// members align index-for-index with the source members; that is what
/// lets the report name the original spellings.
fn check_collisions(
    decls: &[Declaration],
    symbols: &[TransformedSymbol],
) -> Result<(), CollisionError> {
    let mut top_level: HashMap<&str, &TransformedSymbol> = HashMap::new();
    for sym in symbols {
        if let Some(first) = top_level.get(sym.final_name()) {
            return Err(CollisionError::TopLevel {
                identifier: sym.final_name().to_string(),
                first_kind: first.decl.kind_str(),
                first_name: first.source_name.clone(),
                first_loc: first.loc().clone(),
                second_kind: sym.decl.kind_str(),
                second_name: sym.source_name.clone(),
                second_loc: sym.loc().clone(),
            });
        }
        top_level.insert(sym.final_name(), sym);
    }

    for (decl, sym) in decls.iter().zip(symbols) {
        if let (Declaration::Enum(source), Declaration::Enum(e)) = (decl, &sym.decl) {
            let mut members: HashMap<&str, usize> = HashMap::new();
            for (i, member) in e.members.iter().enumerate() {
                if let Some(&first) = members.get(member.name.as_str()) {
                    return Err(CollisionError::EnumMember {
                        enum_name: e.name.clone(),
                        identifier: member.name.clone(),
                        first_name: source.members[first].name.clone(),
                        second_name: source.members[i].name.clone(),
                        loc: sym.loc().clone(),
                    });
                }
                members.insert(&member.name, i);
            }
        }
    }

    Ok(())
}
