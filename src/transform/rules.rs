//! The rename and marshalling rules.
//!
//! Each rule is a pure function from a symbol to a new decorated symbol.
//! Rules are applied in a fixed order; later rules observe the output of
//! earlier ones. No rule may look at any declaration other than the one
//! it is given, which keeps the pipeline deterministic under any
//! declaration order.

use crate::core::declaration::{Declaration, EnumMember};
use crate::core::symbol::{MarshalAs, Marshalling, TransformedSymbol};
use crate::core::{BoolMarshal, CType, GenerateOptions, StringMarshal};

/// Context shared by every rule application.
pub struct RuleContext<'a> {
    pub options: &'a GenerateOptions,
}

/// A pure transformation step.
pub trait Rule: Send + Sync {
    /// Rule name, for logs.
    fn name(&self) -> &'static str;

    /// Apply to one symbol, returning the decorated replacement.
    fn apply(&self, sym: TransformedSymbol, cx: &RuleContext<'_>) -> TransformedSymbol;
}

/// Replace enum member and constant values spelled as an explicit
/// unchecked cast with the inner literal: `unchecked((int)X)` becomes
/// `X`. Exact textual match only.
pub struct UnwrapUncheckedCast;

const UNCHECKED_PREFIX: &str = "unchecked((int)";

fn unwrap_cast(value: &str) -> Option<&str> {
    value
        .strip_prefix(UNCHECKED_PREFIX)
        .and_then(|rest| rest.strip_suffix(')'))
}

impl Rule for UnwrapUncheckedCast {
    fn name(&self) -> &'static str {
        "unwrap-unchecked-cast"
    }

    fn apply(&self, mut sym: TransformedSymbol, _cx: &RuleContext<'_>) -> TransformedSymbol {
        match &mut sym.decl {
            Declaration::Enum(e) => {
                for member in &mut e.members {
                    let unwrapped = member
                        .value_text
                        .as_deref()
                        .and_then(unwrap_cast)
                        .map(str::to_string);
                    if let Some(inner) = unwrapped {
                        *member = EnumMember::new(member.name.clone(), Some(inner));
                    }
                }
            }
            Declaration::Constant(c) => {
                if let Some(inner) = unwrap_cast(&c.value) {
                    c.value = inner.to_string();
                }
            }
            _ => {}
        }
        sym
    }
}

/// Strip the parent enum's identifier from the front of each member
/// name: if the member starts with the exact enum identifier, that
/// prefix is removed once. Case-sensitive, no partial matching.
pub struct StripEnumMemberPrefix;

impl Rule for StripEnumMemberPrefix {
    fn name(&self) -> &'static str {
        "strip-enum-member-prefix"
    }

    fn apply(&self, mut sym: TransformedSymbol, _cx: &RuleContext<'_>) -> TransformedSymbol {
        if let Declaration::Enum(e) = &mut sym.decl {
            let prefix = e.name.clone();
            let mut renames: Vec<(String, String)> = Vec::new();
            for member in &mut e.members {
                if let Some(stripped) = member.name.strip_prefix(&prefix) {
                    // Keep the identifier legal after the cut.
                    if stripped.is_empty() {
                        continue;
                    }
                    let new_name = if stripped.starts_with(|c: char| c.is_ascii_digit()) {
                        format!("_{}", stripped)
                    } else {
                        stripped.to_string()
                    };
                    renames.push((member.name.clone(), new_name.clone()));
                    member.name = new_name;
                }
            }
            // Alias members spell a sibling's name as their value; those
            // references must follow the rename.
            for member in &mut e.members {
                if let Some(value) = member.value_text.as_deref() {
                    if let Some((_, new_name)) =
                        renames.iter().find(|(old, _)| old == value.trim())
                    {
                        member.value_text = Some(new_name.clone());
                    }
                }
            }
        }
        sym
    }
}

/// Remove a single leading underscore from struct names: only once,
/// only at position zero.
pub struct StripLeadingUnderscore;

impl Rule for StripLeadingUnderscore {
    fn name(&self) -> &'static str {
        "strip-leading-underscore"
    }

    fn apply(&self, mut sym: TransformedSymbol, _cx: &RuleContext<'_>) -> TransformedSymbol {
        if let Declaration::Struct(s) = &mut sym.decl {
            if let Some(stripped) = s.name.strip_prefix('_') {
                if !stripped.is_empty() {
                    s.name = stripped.to_string();
                }
            }
        }
        sym
    }
}

/// Attach marshalling metadata from the declared C type shapes and the
/// configured strategies. The emitter consumes these hints verbatim.
pub struct ApplyMarshalling;

fn bool_hint(options: &GenerateOptions) -> MarshalAs {
    match options.bool_marshal {
        BoolMarshal::Byte => MarshalAs::BoolByte,
        BoolMarshal::Int => MarshalAs::BoolInt,
    }
}

fn string_hint(options: &GenerateOptions) -> MarshalAs {
    match options.string_marshal {
        StringMarshal::Utf8 => MarshalAs::StringUtf8,
        StringMarshal::Utf16 => MarshalAs::StringUtf16,
    }
}

fn value_hint(ty: &CType, options: &GenerateOptions) -> Option<MarshalAs> {
    match ty {
        CType::Bool => Some(bool_hint(options)),
        t if t.is_char_pointer() => Some(string_hint(options)),
        _ => None,
    }
}

impl Rule for ApplyMarshalling {
    fn name(&self) -> &'static str {
        "apply-marshalling"
    }

    fn apply(&self, mut sym: TransformedSymbol, cx: &RuleContext<'_>) -> TransformedSymbol {
        let options = cx.options;
        let mut marshal = Marshalling::default();

        match &sym.decl {
            Declaration::Function(f) => {
                marshal.ret = value_hint(&f.return_type, options);
                marshal.params = f
                    .params
                    .iter()
                    .map(|p| value_hint(&p.ty, options))
                    .collect();
            }
            Declaration::Struct(s) => {
                marshal.fields = s
                    .fields
                    .iter()
                    .map(|field| match &field.ty {
                        CType::Array(_, len) if options.fixed_size_buffers => {
                            Some(MarshalAs::FixedBuffer(*len))
                        }
                        ty => value_hint(ty, options),
                    })
                    .collect();
            }
            _ => {}
        }

        sym.marshal = marshal;
        sym
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declaration::{
        ConstantDecl, EnumDecl, Field, FunctionDecl, Param, SourceLoc, StructDecl,
    };

    fn loc() -> SourceLoc {
        SourceLoc::new("test.h", 1)
    }

    fn cx_options() -> GenerateOptions {
        GenerateOptions {
            namespace: "NS".into(),
            library: "lib".into(),
            ..Default::default()
        }
    }

    fn enum_sym(name: &str, members: &[(&str, Option<&str>)]) -> TransformedSymbol {
        TransformedSymbol::seed(&Declaration::Enum(EnumDecl {
            name: name.to_string(),
            members: members
                .iter()
                .map(|(n, v)| EnumMember::new(*n, v.map(str::to_string)))
                .collect(),
            loc: loc(),
        }))
    }

    #[test]
    fn test_enum_prefix_stripped_exactly_once() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym(
            "VkResult",
            &[("VkResultSuccess", None), ("VK_UNRELATED", None)],
        );
        let sym = StripEnumMemberPrefix.apply(sym, &cx);
        match &sym.decl {
            Declaration::Enum(e) => {
                assert_eq!(e.members[0].name, "Success");
                // Not a prefix match: unchanged.
                assert_eq!(e.members[1].name, "VK_UNRELATED");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_enum_prefix_strip_is_case_sensitive() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym("VkResult", &[("VKRESULT_LOWER", None)]);
        let sym = StripEnumMemberPrefix.apply(sym, &cx);
        match &sym.decl {
            Declaration::Enum(e) => assert_eq!(e.members[0].name, "VKRESULT_LOWER"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_enum_prefix_strip_keeps_identifier_legal() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym("Sample", &[("Sample4", None), ("Sample", None)]);
        let sym = StripEnumMemberPrefix.apply(sym, &cx);
        match &sym.decl {
            Declaration::Enum(e) => {
                assert_eq!(e.members[0].name, "_4");
                // Whole name equals the prefix: left alone.
                assert_eq!(e.members[1].name, "Sample");
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_enum_alias_member_value_follows_rename() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym(
            "Format",
            &[("FormatFirst", Some("0")), ("FormatBegin", Some("FormatFirst"))],
        );
        let sym = StripEnumMemberPrefix.apply(sym, &cx);
        match &sym.decl {
            Declaration::Enum(e) => {
                assert_eq!(e.members[1].name, "Begin");
                assert_eq!(e.members[1].value_text.as_deref(), Some("First"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unwrap_unchecked_cast() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym(
            "E",
            &[
                ("A", Some("unchecked((int)0x80000000)")),
                ("B", Some("0x1")),
            ],
        );
        let sym = UnwrapUncheckedCast.apply(sym, &cx);
        match &sym.decl {
            Declaration::Enum(e) => {
                assert_eq!(e.members[0].value_text.as_deref(), Some("0x80000000"));
                assert_eq!(e.members[1].value_text.as_deref(), Some("0x1"));
            }
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_unwrap_unchecked_cast_on_constant() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = TransformedSymbol::seed(&Declaration::Constant(ConstantDecl {
            name: "BIG".into(),
            value: "unchecked((int)0xFFFFFFFF)".into(),
            ty: None,
            loc: loc(),
        }));
        let sym = UnwrapUncheckedCast.apply(sym, &cx);
        match &sym.decl {
            Declaration::Constant(c) => assert_eq!(c.value, "0xFFFFFFFF"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_struct_underscore_stripped_once_only() {
        let options = cx_options();
        let cx = RuleContext { options: &options };

        let sym = TransformedSymbol::seed(&Declaration::Struct(StructDecl {
            name: "__Buffer".into(),
            fields: vec![],
            packed: false,
            loc: loc(),
        }));
        let sym = StripLeadingUnderscore.apply(sym, &cx);
        match &sym.decl {
            // One application removes one underscore, not both.
            Declaration::Struct(s) => assert_eq!(s.name, "_Buffer"),
            _ => unreachable!(),
        }
    }

    #[test]
    fn test_underscore_rule_ignores_other_kinds() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = enum_sym("_Color", &[]);
        let sym = StripLeadingUnderscore.apply(sym, &cx);
        assert_eq!(sym.final_name(), "_Color");
    }

    #[test]
    fn test_marshalling_bool_param_as_byte() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = TransformedSymbol::seed(&Declaration::Function(FunctionDecl {
            name: "set_enabled".into(),
            return_type: CType::Void,
            params: vec![
                Param::new("enabled", CType::Bool),
                Param::new("count", CType::Int32),
            ],
            calling_convention: Default::default(),
            variadic: false,
            loc: loc(),
        }));
        let sym = ApplyMarshalling.apply(sym, &cx);
        assert_eq!(sym.marshal.params[0], Some(MarshalAs::BoolByte));
        assert_eq!(sym.marshal.params[1], None);
        assert_eq!(sym.marshal.ret, None);
    }

    #[test]
    fn test_marshalling_bool_as_int_when_configured() {
        let mut options = cx_options();
        options.bool_marshal = BoolMarshal::Int;
        let cx = RuleContext { options: &options };
        let sym = TransformedSymbol::seed(&Declaration::Function(FunctionDecl {
            name: "f".into(),
            return_type: CType::Bool,
            params: vec![Param::new("b", CType::Bool)],
            calling_convention: Default::default(),
            variadic: false,
            loc: loc(),
        }));
        let sym = ApplyMarshalling.apply(sym, &cx);
        assert_eq!(sym.marshal.params[0], Some(MarshalAs::BoolInt));
        assert_eq!(sym.marshal.ret, Some(MarshalAs::BoolInt));
    }

    #[test]
    fn test_marshalling_string_and_fixed_buffer() {
        let options = cx_options();
        let cx = RuleContext { options: &options };
        let sym = TransformedSymbol::seed(&Declaration::Struct(StructDecl {
            name: "Info".into(),
            fields: vec![
                Field::new("name", CType::Array(Box::new(CType::Char), 256)),
                Field::new("label", CType::ConstPointer(Box::new(CType::Char))),
                Field::new("id", CType::UInt32),
            ],
            packed: false,
            loc: loc(),
        }));
        let sym = ApplyMarshalling.apply(sym, &cx);
        assert_eq!(sym.marshal.fields[0], Some(MarshalAs::FixedBuffer(256)));
        assert_eq!(sym.marshal.fields[1], Some(MarshalAs::StringUtf8));
        assert_eq!(sym.marshal.fields[2], None);
    }

    #[test]
    fn test_fixed_buffers_disabled() {
        let mut options = cx_options();
        options.fixed_size_buffers = false;
        let cx = RuleContext { options: &options };
        let sym = TransformedSymbol::seed(&Declaration::Struct(StructDecl {
            name: "Info".into(),
            fields: vec![Field::new("name", CType::Array(Box::new(CType::Char), 16))],
            packed: false,
            loc: loc(),
        }));
        let sym = ApplyMarshalling.apply(sym, &cx);
        assert_eq!(sym.marshal.fields[0], None);
    }
}
