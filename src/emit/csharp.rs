//! C# source emission.
//!
//! Renders the transformed symbols as one C# compilation unit: typedefs
//! as using-aliases, enums as closed constant sets, structs with
//! sequential layout and exact field order, and functions as
//! `LibraryImport` declarations bound to the configured native library.
//! Every type reference is defined earlier in the unit; struct order is
//! a stable topological sort on by-value references.

use std::collections::HashMap;

use crate::core::declaration::{
    CallingConvention, ConstantDecl, Declaration, EnumDecl, FunctionDecl, StructDecl, TypedefDecl,
};
use crate::core::symbol::{MarshalAs, TransformedSymbol};
use crate::core::{CType, GenerateOptions};
use crate::emit::writer::CodeWriter;
use crate::emit::EmissionError;
use crate::transform::{Resolution, ResolutionMap};

/// Generator for C# bindings.
pub struct CSharpGenerator<'a> {
    options: &'a GenerateOptions,
    resolution: &'a ResolutionMap,
}

impl<'a> CSharpGenerator<'a> {
    pub fn new(options: &'a GenerateOptions, resolution: &'a ResolutionMap) -> Self {
        CSharpGenerator {
            options,
            resolution,
        }
    }

    /// Name of the single output file.
    pub fn output_file_name(&self) -> String {
        format!("{}.cs", self.options.class)
    }

    /// Render the whole unit.
    pub fn generate(&self, symbols: &'a [TransformedSymbol]) -> Result<String, EmissionError> {
        let cx = EmitContext::build(symbols, self.resolution, self.options);

        let mut enums: Vec<(&TransformedSymbol, &EnumDecl)> = Vec::new();
        let mut structs: Vec<(&TransformedSymbol, &StructDecl)> = Vec::new();
        let mut typedefs: Vec<(&TransformedSymbol, &TypedefDecl)> = Vec::new();
        let mut functions: Vec<(&TransformedSymbol, &FunctionDecl)> = Vec::new();
        let mut constants: Vec<(&TransformedSymbol, &ConstantDecl)> = Vec::new();

        for sym in symbols {
            match &sym.decl {
                Declaration::Enum(d) => enums.push((sym, d)),
                Declaration::Struct(d) => structs.push((sym, d)),
                Declaration::Typedef(d) => typedefs.push((sym, d)),
                Declaration::Function(d) => functions.push((sym, d)),
                Declaration::Constant(d) => constants.push((sym, d)),
            }
        }

        let structs = order_structs(&structs, &cx)?;

        let needs_callconv = functions
            .iter()
            .any(|(_, f)| f.calling_convention != CallingConvention::Cdecl);

        let mut w = CodeWriter::new();
        w.line("// <auto-generated>");
        w.line(format!(
            "// Bindings for the native `{}` library. Do not edit by hand.",
            self.options.library
        ));
        w.line("// </auto-generated>");
        w.line("using System;");
        if needs_callconv {
            w.line("using System.Runtime.CompilerServices;");
        }
        w.line("using System.Runtime.InteropServices;");
        w.blank();
        w.line(format!("namespace {}", self.options.namespace));
        w.open();

        // Using-alias directives must precede all member declarations,
        // which conveniently puts every typedef ahead of its first use.
        for (sym, td) in &typedefs {
            self.emit_typedef(&mut w, &cx, sym, td)?;
        }
        if !typedefs.is_empty() {
            w.blank();
        }

        for (i, (sym, e)) in enums.iter().enumerate() {
            if i > 0 {
                w.blank();
            }
            self.emit_enum(&mut w, sym, e);
        }

        for (i, (sym, s)) in structs.iter().enumerate() {
            if i > 0 || !enums.is_empty() {
                w.blank();
            }
            self.emit_struct(&mut w, &cx, sym, s)?;
        }

        w.blank();
        w.line(format!("public static partial class {}", self.options.class));
        w.open();
        w.line(format!(
            "public const string LibraryName = \"{}\";",
            self.options.library
        ));

        for (sym, c) in &constants {
            self.emit_constant(&mut w, sym, c);
        }

        for (sym, f) in &functions {
            if f.variadic {
                tracing::warn!(
                    "skipping variadic function `{}`: not representable as a LibraryImport",
                    sym.final_name()
                );
                continue;
            }
            w.blank();
            self.emit_function(&mut w, &cx, sym, f)?;
        }

        w.close();
        w.close();

        Ok(w.into_string())
    }

    fn emit_typedef(
        &self,
        w: &mut CodeWriter,
        cx: &EmitContext<'_>,
        sym: &TransformedSymbol,
        td: &TypedefDecl,
    ) -> Result<(), EmissionError> {
        let target = cx.alias_target(&td.underlying, sym)?;
        w.line(format!("using {} = {};", sym.final_name(), target));
        Ok(())
    }

    fn emit_enum(&self, w: &mut CodeWriter, _sym: &TransformedSymbol, e: &EnumDecl) {
        w.line(format!("public enum {}", e.name));
        w.open();
        for member in &e.members {
            match member.value_text.as_deref() {
                Some(value) => w.line(format!("{} = {},", member.name, normalize_literal(value))),
                None => w.line(format!("{},", member.name)),
            }
        }
        w.close();
    }

    fn emit_struct(
        &self,
        w: &mut CodeWriter,
        cx: &EmitContext<'_>,
        sym: &TransformedSymbol,
        s: &StructDecl,
    ) -> Result<(), EmissionError> {
        let has_fixed = sym
            .marshal
            .fields
            .iter()
            .any(|m| matches!(m, Some(MarshalAs::FixedBuffer(_))));

        let layout = if s.packed {
            "[StructLayout(LayoutKind.Sequential, Pack = 1)]"
        } else {
            "[StructLayout(LayoutKind.Sequential)]"
        };
        w.line(layout);
        let unsafe_kw = if has_fixed { "unsafe " } else { "" };
        w.line(format!("public {}struct {}", unsafe_kw, s.name));
        w.open();

        // Field order is binary layout; emitted exactly as parsed.
        for (i, field) in s.fields.iter().enumerate() {
            let hint = sym.marshal.fields.get(i).copied().flatten();
            let name = escape_keyword(&field.name);
            match (&field.ty, hint) {
                (CType::Array(elem, len), Some(MarshalAs::FixedBuffer(_))) => {
                    let elem_cs = cx.cs_type(elem, sym)?;
                    if is_fixable_primitive(&elem_cs) {
                        w.line(format!("public fixed {} {}[{}];", elem_cs, name, len));
                    } else {
                        // Structured elements cannot be `fixed`.
                        w.line(format!(
                            "[MarshalAs(UnmanagedType.ByValArray, SizeConst = {})]",
                            len
                        ));
                        w.line(format!("public {}[] {};", elem_cs, name));
                    }
                }
                (CType::Array(elem, len), _) => {
                    let elem_cs = cx.cs_type(elem, sym)?;
                    w.line(format!(
                        "[MarshalAs(UnmanagedType.ByValArray, SizeConst = {})]",
                        len
                    ));
                    w.line(format!("public {}[] {};", elem_cs, name));
                }
                (ty, Some(hint @ (MarshalAs::BoolByte | MarshalAs::BoolInt))) => {
                    w.line(format!("[MarshalAs({})]", unmanaged_type(hint)));
                    w.line(format!("public {} {};", cx.cs_type(ty, sym)?, name));
                }
                (_, Some(hint @ (MarshalAs::StringUtf8 | MarshalAs::StringUtf16))) => {
                    w.line(format!("[MarshalAs({})]", unmanaged_type(hint)));
                    w.line(format!("public string {};", name));
                }
                (ty, _) => {
                    let suffix = match field.bit_width {
                        Some(bits) => format!(" // bits: {}", bits),
                        None => String::new(),
                    };
                    w.line(format!("public {} {};{}", cx.cs_type(ty, sym)?, name, suffix));
                }
            }
        }

        w.close();
        Ok(())
    }

    fn emit_constant(&self, w: &mut CodeWriter, sym: &TransformedSymbol, c: &ConstantDecl) {
        let cs_ty = match &c.ty {
            Some(CType::Int32) => "int",
            Some(CType::UInt32) => "uint",
            Some(CType::Int64) => "long",
            Some(CType::UInt64) => "ulong",
            Some(CType::Float) => "float",
            Some(CType::Double) => "double",
            Some(CType::Char) => "char",
            Some(CType::ConstPointer(inner)) if matches!(**inner, CType::Char) => "string",
            _ => {
                tracing::warn!(
                    "skipping constant `{}`: no inferable target type",
                    sym.final_name()
                );
                return;
            }
        };
        w.line(format!(
            "public const {} {} = {};",
            cs_ty,
            sym.final_name(),
            normalize_literal(&c.value)
        ));
    }

    fn emit_function(
        &self,
        w: &mut CodeWriter,
        cx: &EmitContext<'_>,
        sym: &TransformedSymbol,
        f: &FunctionDecl,
    ) -> Result<(), EmissionError> {
        w.line("[LibraryImport(LibraryName)]");
        match f.calling_convention {
            CallingConvention::Cdecl => {}
            CallingConvention::Stdcall => {
                w.line("[UnmanagedCallConv(CallConvs = new[] { typeof(CallConvStdcall) })]");
            }
            CallingConvention::Fastcall => {
                w.line("[UnmanagedCallConv(CallConvs = new[] { typeof(CallConvFastcall) })]");
            }
        }
        if let Some(hint) = sym.marshal.ret {
            w.line(format!("[return: MarshalAs({})]", unmanaged_type(hint)));
        }

        let ret = match sym.marshal.ret {
            Some(MarshalAs::StringUtf8 | MarshalAs::StringUtf16) => "string".to_string(),
            _ => cx.cs_type(&f.return_type, sym)?,
        };

        let mut params = Vec::with_capacity(f.params.len());
        for (i, p) in f.params.iter().enumerate() {
            let hint = sym.marshal.params.get(i).copied().flatten();
            let name = if p.name.is_empty() {
                format!("arg{}", i)
            } else {
                escape_keyword(&p.name)
            };
            let rendered = match hint {
                Some(h @ (MarshalAs::StringUtf8 | MarshalAs::StringUtf16)) => {
                    format!("[MarshalAs({})] string {}", unmanaged_type(h), name)
                }
                Some(h @ (MarshalAs::BoolByte | MarshalAs::BoolInt)) => {
                    format!("[MarshalAs({})] bool {}", unmanaged_type(h), name)
                }
                _ => format!("{} {}", cx.cs_type(&p.ty, sym)?, name),
            };
            params.push(rendered);
        }

        w.line(format!(
            "public static partial {} {}({});",
            ret,
            sym.final_name(),
            params.join(", ")
        ));
        Ok(())
    }
}

/// Lookup state shared by the emission methods.
struct EmitContext<'a> {
    /// Source name -> final name, for every type-introducing symbol
    renames: HashMap<&'a str, &'a str>,

    /// Source name -> typedef symbol, for alias chain resolution
    typedefs: HashMap<&'a str, &'a TypedefDecl>,

    /// Source name -> symbol index, structs only
    struct_index: HashMap<&'a str, usize>,

    resolution: &'a ResolutionMap,
    namespace: &'a str,
}

impl<'a> EmitContext<'a> {
    fn build(
        symbols: &'a [TransformedSymbol],
        resolution: &'a ResolutionMap,
        options: &'a GenerateOptions,
    ) -> Self {
        let mut renames = HashMap::new();
        let mut typedefs = HashMap::new();
        let mut struct_index = HashMap::new();
        let mut struct_count = 0usize;

        for sym in symbols {
            match &sym.decl {
                Declaration::Struct(_) => {
                    renames.insert(sym.source_name.as_str(), sym.final_name());
                    struct_index.insert(sym.source_name.as_str(), struct_count);
                    struct_count += 1;
                }
                Declaration::Enum(_) => {
                    renames.insert(sym.source_name.as_str(), sym.final_name());
                }
                Declaration::Typedef(td) => {
                    renames.insert(sym.source_name.as_str(), sym.final_name());
                    typedefs.insert(sym.source_name.as_str(), td);
                }
                _ => {}
            }
        }

        EmitContext {
            renames,
            typedefs,
            struct_index,
            resolution,
            namespace: &options.namespace,
        }
    }

    fn unresolved(&self, owner: &TransformedSymbol, name: &str) -> EmissionError {
        EmissionError::UnresolvedType {
            symbol: owner.final_name().to_string(),
            type_name: name.to_string(),
            loc: owner.loc().clone(),
        }
    }

    /// C# spelling of a C type at a use site.
    fn cs_type(&self, ty: &CType, owner: &TransformedSymbol) -> Result<String, EmissionError> {
        Ok(match ty {
            CType::Void => "void".to_string(),
            CType::Int8 => "sbyte".to_string(),
            CType::Int16 => "short".to_string(),
            CType::Int32 => "int".to_string(),
            CType::Int64 => "long".to_string(),
            CType::UInt8 => "byte".to_string(),
            CType::UInt16 => "ushort".to_string(),
            CType::UInt32 => "uint".to_string(),
            CType::UInt64 => "ulong".to_string(),
            CType::Float => "float".to_string(),
            CType::Double => "double".to_string(),
            CType::Bool => "bool".to_string(),
            CType::Char | CType::UChar => "byte".to_string(),
            CType::WChar => "char".to_string(),
            CType::Size => "nuint".to_string(),
            CType::SSize | CType::PtrDiff => "nint".to_string(),
            CType::Pointer(_) | CType::ConstPointer(_) => "IntPtr".to_string(),
            CType::Array(_, _) => "IntPtr".to_string(), // decayed outside field context
            CType::FunctionPointer { .. } => "IntPtr".to_string(),
            CType::Named(name) => match self.resolution.get(name) {
                Some(Resolution::Struct | Resolution::Enum | Resolution::Typedef) => self
                    .renames
                    .get(name.as_str())
                    .ok_or_else(|| self.unresolved(owner, name))?
                    .to_string(),
                Some(Resolution::Opaque) => "IntPtr".to_string(),
                None => return Err(self.unresolved(owner, name)),
            },
        })
    }

    /// Target of a using-alias directive. Aliases cannot reference other
    /// aliases, so typedef chains resolve to their base spelling; names
    /// declared in the unit are namespace-qualified.
    fn alias_target(
        &self,
        ty: &CType,
        owner: &TransformedSymbol,
    ) -> Result<String, EmissionError> {
        self.alias_target_inner(ty, owner, 0)
    }

    fn alias_target_inner(
        &self,
        ty: &CType,
        owner: &TransformedSymbol,
        depth: usize,
    ) -> Result<String, EmissionError> {
        if depth > 64 {
            return Err(EmissionError::TypedefCycle {
                name: owner.final_name().to_string(),
                loc: owner.loc().clone(),
            });
        }
        Ok(match ty {
            CType::Void => "System.IntPtr".to_string(), // `typedef void X` has no value shape
            CType::Int8 => "System.SByte".to_string(),
            CType::Int16 => "System.Int16".to_string(),
            CType::Int32 => "System.Int32".to_string(),
            CType::Int64 => "System.Int64".to_string(),
            CType::UInt8 => "System.Byte".to_string(),
            CType::UInt16 => "System.UInt16".to_string(),
            CType::UInt32 => "System.UInt32".to_string(),
            CType::UInt64 => "System.UInt64".to_string(),
            CType::Float => "System.Single".to_string(),
            CType::Double => "System.Double".to_string(),
            CType::Bool => "System.Boolean".to_string(),
            CType::Char | CType::UChar => "System.Byte".to_string(),
            CType::WChar => "System.Char".to_string(),
            CType::Size => "System.UIntPtr".to_string(),
            CType::SSize | CType::PtrDiff => "System.IntPtr".to_string(),
            CType::Pointer(_) | CType::ConstPointer(_) => "System.IntPtr".to_string(),
            CType::Array(_, _) => "System.IntPtr".to_string(),
            CType::FunctionPointer { .. } => "System.IntPtr".to_string(),
            CType::Named(name) => match self.resolution.get(name) {
                Some(Resolution::Struct | Resolution::Enum) => {
                    let final_name = self
                        .renames
                        .get(name.as_str())
                        .ok_or_else(|| self.unresolved(owner, name))?;
                    format!("{}.{}", self.namespace, final_name)
                }
                Some(Resolution::Typedef) => {
                    let td = self
                        .typedefs
                        .get(name.as_str())
                        .ok_or_else(|| self.unresolved(owner, name))?;
                    self.alias_target_inner(&td.underlying, owner, depth + 1)?
                }
                Some(Resolution::Opaque) => "System.IntPtr".to_string(),
                None => return Err(self.unresolved(owner, name)),
            },
        })
    }

    /// Source struct name a by-value reference bottoms out at, following
    /// typedef chains.
    fn by_value_struct(&self, name: &str, depth: usize) -> Option<&'a str> {
        if depth > 64 {
            return None;
        }
        match self.resolution.get(name)? {
            Resolution::Struct => {
                // Normalize through the index key (source name).
                self.struct_index.get_key_value(name).map(|(k, _)| *k)
            }
            Resolution::Typedef => match &self.typedefs.get(name)?.underlying {
                CType::Named(inner) => self.by_value_struct(inner, depth + 1),
                CType::Array(inner, _) => match inner.as_ref() {
                    CType::Named(inner) => self.by_value_struct(inner, depth + 1),
                    _ => None,
                },
                _ => None,
            },
            _ => None,
        }
    }
}

/// Stable topological order over by-value struct references: every
/// struct is emitted after the structs its fields embed. Pointer
/// references do not constrain the order.
fn order_structs<'a>(
    structs: &[(&'a TransformedSymbol, &'a StructDecl)],
    cx: &EmitContext<'_>,
) -> Result<Vec<(&'a TransformedSymbol, &'a StructDecl)>, EmissionError> {
    let count = structs.len();

    // deps[i] = indices of structs that must precede struct i
    let mut deps: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (i, (_, s)) in structs.iter().enumerate() {
        for field in &s.fields {
            field.ty.visit_named(false, &mut |name, behind_pointer| {
                if behind_pointer {
                    return;
                }
                if let Some(source) = cx.by_value_struct(name, 0) {
                    if let Some(&j) = cx.struct_index.get(source) {
                        if j != i && !deps[i].contains(&j) {
                            deps[i].push(j);
                        }
                    }
                }
            });
        }
    }

    let mut emitted = vec![false; count];
    let mut order = Vec::with_capacity(count);
    loop {
        let before = order.len();
        for i in 0..count {
            if !emitted[i] && deps[i].iter().all(|&j| emitted[j]) {
                emitted[i] = true;
                order.push(structs[i]);
            }
        }
        if order.len() == count {
            break;
        }
        if order.len() == before {
            let names: Vec<&str> = (0..count)
                .filter(|&i| !emitted[i])
                .map(|i| structs[i].1.name.as_str())
                .collect();
            return Err(EmissionError::StructCycle {
                names: names.join(", "),
            });
        }
    }

    Ok(order)
}

fn unmanaged_type(hint: MarshalAs) -> &'static str {
    match hint {
        MarshalAs::BoolByte => "UnmanagedType.U1",
        MarshalAs::BoolInt => "UnmanagedType.I4",
        MarshalAs::StringUtf8 => "UnmanagedType.LPUTF8Str",
        MarshalAs::StringUtf16 => "UnmanagedType.LPWStr",
        MarshalAs::FixedBuffer(_) => "UnmanagedType.ByValArray",
    }
}

/// Whether a C# type can be the element of a `fixed` buffer.
fn is_fixable_primitive(cs: &str) -> bool {
    matches!(
        cs,
        "bool" | "byte" | "sbyte" | "short" | "ushort" | "int" | "uint" | "long" | "ulong"
            | "char" | "float" | "double"
    )
}

/// Normalize C integer literal suffixes to C# spellings.
fn normalize_literal(value: &str) -> String {
    let trimmed = value.trim();
    for (c_suffix, cs_suffix) in [
        ("ULL", "UL"),
        ("ull", "UL"),
        ("LL", "L"),
        ("ll", "L"),
    ] {
        if let Some(head) = trimmed.strip_suffix(c_suffix) {
            if head.chars().next_back().is_some_and(|c| c.is_ascii_hexdigit()) {
                return format!("{}{}", head, cs_suffix);
            }
        }
    }
    trimmed.to_string()
}

/// Escape C# keywords used as identifiers.
fn escape_keyword(name: &str) -> String {
    const KEYWORDS: &[&str] = &[
        "abstract", "base", "bool", "byte", "char", "class", "const", "decimal", "default",
        "delegate", "double", "enum", "event", "fixed", "float", "in", "int", "internal", "lock",
        "long", "namespace", "new", "null", "object", "out", "params", "private", "public",
        "readonly", "ref", "sbyte", "sealed", "short", "static", "string", "struct", "this",
        "uint", "ulong", "ushort", "using", "void",
    ];
    if KEYWORDS.contains(&name) {
        format!("@{}", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::declaration::{
        EnumMember, Field, Param, SourceLoc,
    };
    use crate::core::GenerateOptions;
    use crate::transform::{default_rules, resolve, transform, RuleContext};

    fn options() -> GenerateOptions {
        GenerateOptions {
            namespace: "Vulkan".into(),
            library: "vulkan".into(),
            class: "Vk".into(),
            ..Default::default()
        }
    }

    fn loc() -> SourceLoc {
        SourceLoc::new("test.h", 1)
    }

    fn generate(decls: Vec<Declaration>, opts: &GenerateOptions) -> Result<String, EmissionError> {
        let resolution = resolve(&decls, opts.detect_opaque_pointers);
        let cx = RuleContext { options: opts };
        let symbols = transform(&decls, &default_rules(), &cx).unwrap();
        CSharpGenerator::new(opts, &resolution).generate(&symbols)
    }

    fn struct_decl(name: &str, fields: Vec<Field>) -> Declaration {
        Declaration::Struct(StructDecl {
            name: name.into(),
            fields,
            packed: false,
            loc: loc(),
        })
    }

    #[test]
    fn test_struct_field_order_preserved() {
        let decls = vec![struct_decl(
            "Extent",
            vec![
                Field::new("width", CType::UInt32),
                Field::new("height", CType::UInt16),
                Field::new("depth", CType::Float),
            ],
        )];
        let out = generate(decls, &options()).unwrap();
        let width = out.find("public uint width;").unwrap();
        let height = out.find("public ushort height;").unwrap();
        let depth = out.find("public float depth;").unwrap();
        assert!(width < height && height < depth);
        assert!(out.contains("[StructLayout(LayoutKind.Sequential)]"));
    }

    #[test]
    fn test_struct_topological_order() {
        // `Outer` embeds `Inner` by value but is declared first; the
        // emitted unit must define `Inner` earlier.
        let decls = vec![
            struct_decl(
                "Outer",
                vec![Field::new("inner", CType::Named("Inner".into()))],
            ),
            struct_decl("Inner", vec![Field::new("x", CType::Int32)]),
        ];
        let out = generate(decls, &options()).unwrap();
        let inner = out.find("struct Inner").unwrap();
        let outer = out.find("struct Outer").unwrap();
        assert!(inner < outer);
    }

    #[test]
    fn test_pointer_reference_does_not_force_order() {
        let decls = vec![
            struct_decl(
                "Node",
                vec![Field::new(
                    "next",
                    CType::Pointer(Box::new(CType::Named("Node".into()))),
                )],
            ),
        ];
        // Self-referential behind a pointer: fine.
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public IntPtr next;"));
    }

    #[test]
    fn test_by_value_cycle_is_an_error() {
        let decls = vec![
            struct_decl("A", vec![Field::new("b", CType::Named("B".into()))]),
            struct_decl("B", vec![Field::new("a", CType::Named("A".into()))]),
        ];
        let err = generate(decls, &options()).unwrap_err();
        assert!(matches!(err, EmissionError::StructCycle { .. }));
    }

    #[test]
    fn test_unresolved_type_is_fatal_and_cites_symbol() {
        let decls = vec![struct_decl(
            "Holder",
            vec![Field::new("missing", CType::Named("Mystery".into()))],
        )];
        let err = generate(decls, &options()).unwrap_err();
        match err {
            EmissionError::UnresolvedType { symbol, type_name, .. } => {
                assert_eq!(symbol, "Holder");
                assert_eq!(type_name, "Mystery");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_opaque_pointer_becomes_intptr() {
        let decls = vec![
            Declaration::Typedef(TypedefDecl {
                name: "Instance".into(),
                underlying: CType::Pointer(Box::new(CType::Named("Instance_T".into()))),
                loc: loc(),
            }),
            Declaration::Function(FunctionDecl {
                name: "destroy_instance".into(),
                return_type: CType::Void,
                params: vec![Param::new("instance", CType::Named("Instance".into()))],
                calling_convention: CallingConvention::Cdecl,
                variadic: false,
                loc: loc(),
            }),
        ];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("using Instance = System.IntPtr;"));
        assert!(out.contains("public static partial void destroy_instance(Instance instance);"));
    }

    #[test]
    fn test_enum_emission_with_verbatim_values() {
        let decls = vec![Declaration::Enum(EnumDecl {
            name: "Result".into(),
            members: vec![
                EnumMember::new("ResultSuccess", Some("0".into())),
                EnumMember::new("ResultNotReady", Some("0x1".into())),
                EnumMember::new("ResultImplicit", None),
            ],
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public enum Result"));
        assert!(out.contains("Success = 0,"));
        assert!(out.contains("NotReady = 0x1,"));
        assert!(out.contains("Implicit,"));
    }

    #[test]
    fn test_function_emission_with_library_binding() {
        let decls = vec![Declaration::Function(FunctionDecl {
            name: "vkGetVersion".into(),
            return_type: CType::UInt32,
            params: vec![],
            calling_convention: CallingConvention::Cdecl,
            variadic: false,
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public const string LibraryName = \"vulkan\";"));
        assert!(out.contains("[LibraryImport(LibraryName)]"));
        assert!(out.contains("public static partial uint vkGetVersion();"));
    }

    #[test]
    fn test_bool_param_byte_annotation_and_nothing_else() {
        let decls = vec![Declaration::Function(FunctionDecl {
            name: "set_enabled".into(),
            return_type: CType::Void,
            params: vec![Param::new("enabled", CType::Bool)],
            calling_convention: CallingConvention::Cdecl,
            variadic: false,
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("[MarshalAs(UnmanagedType.U1)] bool enabled"));
        // The byte annotation and no other marshalling attribute.
        assert_eq!(out.matches("MarshalAs").count(), 1);
        assert!(!out.contains("UnmanagedType.I4"));
    }

    #[test]
    fn test_string_param_utf8() {
        let decls = vec![Declaration::Function(FunctionDecl {
            name: "set_name".into(),
            return_type: CType::Void,
            params: vec![Param::new(
                "name",
                CType::ConstPointer(Box::new(CType::Char)),
            )],
            calling_convention: CallingConvention::Cdecl,
            variadic: false,
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("[MarshalAs(UnmanagedType.LPUTF8Str)] string name"));
    }

    #[test]
    fn test_fixed_buffer_field() {
        let decls = vec![struct_decl(
            "DeviceProps",
            vec![
                Field::new("name", CType::Array(Box::new(CType::Char), 256)),
                Field::new("id", CType::UInt32),
            ],
        )];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public unsafe struct DeviceProps"));
        assert!(out.contains("public fixed byte name[256];"));
    }

    #[test]
    fn test_stdcall_attribute() {
        let decls = vec![Declaration::Function(FunctionDecl {
            name: "WinProc".into(),
            return_type: CType::Void,
            params: vec![],
            calling_convention: CallingConvention::Stdcall,
            variadic: false,
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("using System.Runtime.CompilerServices;"));
        assert!(out.contains("typeof(CallConvStdcall)"));
    }

    #[test]
    fn test_variadic_function_skipped() {
        let decls = vec![Declaration::Function(FunctionDecl {
            name: "log_printf".into(),
            return_type: CType::Void,
            params: vec![Param::new("fmt", CType::ConstPointer(Box::new(CType::Char)))],
            calling_convention: CallingConvention::Cdecl,
            variadic: true,
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(!out.contains("log_printf"));
    }

    #[test]
    fn test_constant_emission() {
        let decls = vec![Declaration::Constant(ConstantDecl {
            name: "HEADER_VERSION".into(),
            value: "231".into(),
            ty: Some(CType::Int32),
            loc: loc(),
        })];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public const int HEADER_VERSION = 231;"));
    }

    #[test]
    fn test_emission_is_idempotent() {
        let decls = vec![
            struct_decl(
                "_Extent",
                vec![
                    Field::new("width", CType::UInt32),
                    Field::new("height", CType::UInt32),
                ],
            ),
            Declaration::Typedef(TypedefDecl {
                name: "Flags".into(),
                underlying: CType::UInt32,
                loc: loc(),
            }),
        ];
        let opts = options();
        let a = generate(decls.clone(), &opts).unwrap();
        let b = generate(decls, &opts).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_keyword_field_escaped() {
        let decls = vec![struct_decl(
            "Options",
            vec![Field::new("params", CType::UInt32)],
        )];
        let out = generate(decls, &options()).unwrap();
        assert!(out.contains("public uint @params;"));
    }

    #[test]
    fn test_literal_suffix_normalization() {
        assert_eq!(normalize_literal("100ULL"), "100UL");
        assert_eq!(normalize_literal("0x7FFFFFFF"), "0x7FFFFFFF");
        assert_eq!(normalize_literal("5LL"), "5L");
        assert_eq!(normalize_literal("42"), "42");
    }
}
