//! Declaration extraction from preprocessed header text.
//!
//! Regex-driven: enough C to cover the declaration styles binding
//! generation cares about (functions, structs, enums, scalar and
//! function-pointer typedefs, object-like constants). Nested anonymous
//! aggregates and function-like macro bodies are out of scope.

use std::path::{Path, PathBuf};

use regex::Regex;

use crate::core::declaration::{
    parse_int_literal, CallingConvention, ConstantDecl, Declaration, EnumDecl, EnumMember, Field,
    FunctionDecl, Param, SourceLoc, StructDecl, TypedefDecl,
};
use crate::core::CType;
use crate::parser::preprocess::{preprocess, DefineSet};
use crate::parser::ParseError;

/// The declarations parsed out of one header file.
#[derive(Debug, Clone)]
pub struct ParsedUnit {
    /// Source file path
    pub file: PathBuf,

    /// Declarations in source order
    pub decls: Vec<Declaration>,
}

/// Parser for C header files.
pub struct HeaderParser {
    re_func: Regex,
    re_struct: Regex,
    re_enum: Regex,
    re_typedef: Regex,
    re_fnptr_typedef: Regex,
}

impl Default for HeaderParser {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaderParser {
    /// Create a new header parser with its patterns compiled once.
    pub fn new() -> Self {
        HeaderParser {
            re_func: Regex::new(
                r"(?:extern\s+)?(?:static\s+|inline\s+)*([\w][\w\s*]*?)\s+(__cdecl\s+|__stdcall\s+|__fastcall\s+|WINAPI\s+)?(\w+)\s*\(([^)]*)\)\s*;",
            )
            .unwrap(),
            re_struct: Regex::new(r"(?:typedef\s+)?struct\s+(\w+)?\s*\{([^}]*)\}\s*(\w+)?\s*;")
                .unwrap(),
            re_enum: Regex::new(r"(?:typedef\s+)?enum\s+(\w+)?\s*\{([^}]*)\}\s*(\w+)?\s*;")
                .unwrap(),
            re_typedef: Regex::new(r"typedef\s+([\w][\w\s*]*?)\s*(\*?)\s*(\w+)\s*;").unwrap(),
            re_fnptr_typedef: Regex::new(
                r"typedef\s+([\w][\w\s*]*?)\s*\(\s*\*\s*(\w+)\s*\)\s*\(([^)]*)\)\s*;",
            )
            .unwrap(),
        }
    }

    /// Parse a header file.
    ///
    /// `defines` is the run-global define set; each file works on its own
    /// copy so include-guard defines cannot leak between files (and the
    /// per-file parse stays order-independent and parallelizable).
    pub fn parse_file(&self, path: &Path, defines: &DefineSet) -> Result<ParsedUnit, ParseError> {
        let content = std::fs::read_to_string(path).map_err(|source| ParseError::Io {
            file: path.to_path_buf(),
            source,
        })?;
        self.parse_source(&content, path, defines)
    }

    /// Parse header content.
    pub fn parse_source(
        &self,
        source: &str,
        path: &Path,
        defines: &DefineSet,
    ) -> Result<ParsedUnit, ParseError> {
        let mut local_defines = defines.clone();
        let pre = preprocess(source, path, &mut local_defines)?;
        let text = &pre.text;

        // (byte offset, declaration) pairs, sorted at the end so the unit
        // preserves source order across the separate extraction passes.
        let mut found: Vec<(usize, Declaration)> = Vec::new();

        self.extract_enums(text, path, &mut found)?;
        self.extract_structs(text, path, &local_defines, &mut found)?;
        self.extract_typedefs(text, path, &mut found)?;

        // Spans already claimed by the passes above; the function pattern
        // must not re-match inside their bodies.
        let claimed: Vec<(usize, usize)> = found
            .iter()
            .map(|(start, _)| (*start, end_guess(text, *start)))
            .collect();
        self.extract_functions(text, path, &claimed, &mut found)?;

        for raw in &pre.constants {
            found.push((
                offset_of_line(text, raw.line),
                Declaration::Constant(ConstantDecl {
                    name: raw.name.clone(),
                    value: raw.value.clone(),
                    ty: infer_constant_type(&raw.value),
                    loc: SourceLoc::new(path, raw.line),
                }),
            ));
        }

        found.sort_by_key(|(offset, _)| *offset);

        Ok(ParsedUnit {
            file: path.to_path_buf(),
            decls: found.into_iter().map(|(_, d)| d).collect(),
        })
    }

    fn extract_enums(
        &self,
        text: &str,
        path: &Path,
        found: &mut Vec<(usize, Declaration)>,
    ) -> Result<(), ParseError> {
        for cap in self.re_enum.captures_iter(text) {
            let whole = cap.get(0).unwrap();
            let line = line_of(text, whole.start());
            let enum_name = cap.get(1).map_or("", |m| m.as_str());
            let body = cap.get(2).map_or("", |m| m.as_str());
            let typedef_name = cap.get(3).map_or("", |m| m.as_str());

            // Prefer the typedef name over the tag, like the C API does.
            let name = if !typedef_name.is_empty() {
                typedef_name
            } else if !enum_name.is_empty() {
                enum_name
            } else {
                continue; // anonymous enum
            };

            let mut members = Vec::new();
            for item in split_top_level(body, ',') {
                let item = item.trim();
                if item.is_empty() {
                    continue;
                }
                match item.split_once('=') {
                    Some((member, value)) => {
                        let member = member.trim();
                        if !is_identifier(member) {
                            return Err(ParseError::Malformed {
                                file: path.to_path_buf(),
                                line,
                                message: format!(
                                    "malformed member `{}` in enum `{}`",
                                    item, name
                                ),
                            });
                        }
                        members.push(EnumMember::new(member, Some(value.trim().to_string())));
                    }
                    None => {
                        if !is_identifier(item) {
                            return Err(ParseError::Malformed {
                                file: path.to_path_buf(),
                                line,
                                message: format!(
                                    "malformed member `{}` in enum `{}`",
                                    item, name
                                ),
                            });
                        }
                        members.push(EnumMember::new(item, None));
                    }
                }
            }

            found.push((
                whole.start(),
                Declaration::Enum(EnumDecl {
                    name: name.to_string(),
                    members,
                    loc: SourceLoc::new(path, line),
                }),
            ));
        }
        Ok(())
    }

    fn extract_structs(
        &self,
        text: &str,
        path: &Path,
        defines: &DefineSet,
        found: &mut Vec<(usize, Declaration)>,
    ) -> Result<(), ParseError> {
        for cap in self.re_struct.captures_iter(text) {
            let whole = cap.get(0).unwrap();
            let line = line_of(text, whole.start());
            let struct_name = cap.get(1).map_or("", |m| m.as_str());
            let body = cap.get(2).map_or("", |m| m.as_str());
            let typedef_name = cap.get(3).map_or("", |m| m.as_str());

            let name = if !typedef_name.is_empty() {
                typedef_name
            } else if !struct_name.is_empty() {
                struct_name
            } else {
                continue; // anonymous struct
            };

            let mut fields = Vec::new();
            for raw_field in body.split(';') {
                let raw_field = raw_field.trim();
                if raw_field.is_empty() {
                    continue;
                }
                fields.push(parse_field(raw_field, defines).ok_or_else(|| {
                    ParseError::Malformed {
                        file: path.to_path_buf(),
                        line,
                        message: format!(
                            "unparseable field `{}` in struct `{}`",
                            raw_field, name
                        ),
                    }
                })?);
            }

            found.push((
                whole.start(),
                Declaration::Struct(StructDecl {
                    name: name.to_string(),
                    fields,
                    packed: false,
                    loc: SourceLoc::new(path, line),
                }),
            ));
        }
        Ok(())
    }

    fn extract_typedefs(
        &self,
        text: &str,
        path: &Path,
        found: &mut Vec<(usize, Declaration)>,
    ) -> Result<(), ParseError> {
        for cap in self.re_fnptr_typedef.captures_iter(text) {
            let whole = cap.get(0).unwrap();
            let return_text = cap.get(1).map_or("", |m| m.as_str()).trim();
            let name = cap.get(2).map_or("", |m| m.as_str());
            let params_text = cap.get(3).map_or("", |m| m.as_str());

            let (params, _) = parse_params(params_text);
            found.push((
                whole.start(),
                Declaration::Typedef(TypedefDecl {
                    name: name.to_string(),
                    underlying: CType::FunctionPointer {
                        return_type: Box::new(CType::parse(return_text)),
                        param_types: params.into_iter().map(|p| p.ty).collect(),
                    },
                    loc: SourceLoc::new(path, line_of(text, whole.start())),
                }),
            ));
        }

        for cap in self.re_typedef.captures_iter(text) {
            let whole = cap.get(0).unwrap();
            let underlying = cap.get(1).map_or("", |m| m.as_str()).trim();
            let star = cap.get(2).map_or("", |m| m.as_str());
            let name = cap.get(3).map_or("", |m| m.as_str());

            // struct/enum typedefs with bodies are handled by their own
            // passes; `typedef struct Tag Alias;` forwards to the tag.
            if underlying.contains('{') || name.is_empty() {
                continue;
            }
            let first_word = underlying.split_whitespace().next().unwrap_or("");
            if (first_word == "struct" || first_word == "enum" || first_word == "union")
                && underlying.split_whitespace().count() == 1
            {
                continue;
            }

            let mut ty = CType::parse(underlying);
            if star == "*" {
                ty = CType::Pointer(Box::new(ty));
            }
            // `typedef struct X X;` forwards a tag to itself; the struct
            // definition is the declaration.
            if ty == CType::Named(name.to_string()) {
                continue;
            }
            found.push((
                whole.start(),
                Declaration::Typedef(TypedefDecl {
                    name: name.to_string(),
                    underlying: ty,
                    loc: SourceLoc::new(path, line_of(text, whole.start())),
                }),
            ));
        }
        Ok(())
    }

    fn extract_functions(
        &self,
        text: &str,
        path: &Path,
        claimed: &[(usize, usize)],
        found: &mut Vec<(usize, Declaration)>,
    ) -> Result<(), ParseError> {
        for cap in self.re_func.captures_iter(text) {
            let whole = cap.get(0).unwrap();
            if claimed
                .iter()
                .any(|(s, e)| whole.start() >= *s && whole.start() < *e)
            {
                continue;
            }

            let return_text = cap.get(1).map_or("", |m| m.as_str()).trim();
            let conv_text = cap.get(2).map_or("", |m| m.as_str()).trim();
            let name = cap.get(3).map_or("", |m| m.as_str());
            let params_text = cap.get(4).map_or("", |m| m.as_str());

            if return_text.is_empty() || name.is_empty() {
                continue;
            }
            // Keyword starts mean this matched the tail of something else.
            let first = return_text.split_whitespace().next().unwrap_or("");
            if matches!(first, "typedef" | "struct" | "enum" | "union" | "return") {
                continue;
            }

            let calling_convention = match conv_text.to_lowercase().as_str() {
                "__stdcall" | "winapi" => CallingConvention::Stdcall,
                "__fastcall" => CallingConvention::Fastcall,
                _ => CallingConvention::Cdecl,
            };

            let (params, variadic) = parse_params(params_text);

            found.push((
                whole.start(),
                Declaration::Function(FunctionDecl {
                    name: name.to_string(),
                    return_type: CType::parse(return_text),
                    params,
                    calling_convention,
                    variadic,
                    loc: SourceLoc::new(path, line_of(text, whole.start())),
                }),
            ));
        }
        Ok(())
    }
}

/// 1-based line number of a byte offset.
fn line_of(text: &str, offset: usize) -> u32 {
    text[..offset].bytes().filter(|b| *b == b'\n').count() as u32 + 1
}

/// Byte offset of the start of a 1-based line.
fn offset_of_line(text: &str, line: u32) -> usize {
    if line <= 1 {
        return 0;
    }
    let mut seen = 0u32;
    for (i, b) in text.bytes().enumerate() {
        if b == b'\n' {
            seen += 1;
            if seen == line - 1 {
                return i + 1;
            }
        }
    }
    text.len()
}

/// Rough end offset of a declaration that started at `start`: the next
/// `;` at top level, good enough for span exclusion.
fn end_guess(text: &str, start: usize) -> usize {
    let mut depth = 0i32;
    for (i, b) in text[start..].bytes().enumerate() {
        match b {
            b'{' | b'(' => depth += 1,
            b'}' | b')' => depth -= 1,
            b';' if depth <= 0 => return start + i + 1,
            _ => {}
        }
    }
    text.len()
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Split on a separator, ignoring separators nested in parentheses or
/// braces (enum values like `MAKE(1, 2)` contain commas).
fn split_top_level(s: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '(' | '{' | '[' => depth += 1,
            ')' | '}' | ']' => depth -= 1,
            c if c == sep && depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Parse one struct field: `type name`, `type name[len]`, `type name : width`.
fn parse_field(raw: &str, defines: &DefineSet) -> Option<Field> {
    let raw = raw.trim();

    // Bitfield: type name : width
    let (raw, bit_width) = match split_top_level(raw, ':').as_slice() {
        [decl, width] => (decl.trim(), width.trim().parse::<u32>().ok()),
        _ => (raw, None),
    };

    // Array suffix: name[len], where len may be a #define constant.
    let (raw, array_len) = match raw.split_once('[') {
        Some((head, rest)) => {
            let len_text = rest.strip_suffix(']')?.trim();
            let len = parse_int_literal(len_text)
                .or_else(|| {
                    defines
                        .object_value(len_text)
                        .and_then(parse_int_literal)
                })?
                .try_into()
                .ok()?;
            (head.trim(), Some(len))
        }
        None => (raw, None),
    };

    let (ty_text, name) = split_declarator(raw)?;
    let mut ty = CType::parse(&ty_text);
    if let Some(len) = array_len {
        ty = CType::Array(Box::new(ty), len);
    }

    Some(Field {
        name,
        ty,
        bit_width,
    })
}

/// Parse a parameter list; returns the parameters and the variadic flag.
fn parse_params(params_text: &str) -> (Vec<Param>, bool) {
    let mut params = Vec::new();
    let mut variadic = false;

    let trimmed = params_text.trim();
    if trimmed == "void" || trimmed.is_empty() {
        return (params, false);
    }

    for param in split_top_level(params_text, ',') {
        let param = param.trim();
        if param == "..." {
            variadic = true;
            continue;
        }
        match split_declarator(param) {
            Some((ty_text, name)) => params.push(Param::new(name, CType::parse(&ty_text))),
            // Unnamed parameter: just a type
            None => params.push(Param::new("", CType::parse(param))),
        }
    }

    (params, variadic)
}

/// Split a declarator into (type text, name).
fn split_declarator(s: &str) -> Option<(String, String)> {
    let s = s.trim();

    // Pointer declarators: the last word is the name if it carries no `*`.
    if s.contains('*') {
        let parts: Vec<&str> = s.split_whitespace().collect();
        if parts.len() >= 2 {
            let last = *parts.last().unwrap();
            if !last.contains('*') && is_identifier(last) {
                let ty = s[..s.len() - last.len()].trim().to_string();
                return Some((ty, last.to_string()));
            }
            // `char *name` style: name glued to the star.
            if let Some(name) = last.strip_prefix('*') {
                if is_identifier(name) {
                    let mut ty = s[..s.len() - last.len()].trim().to_string();
                    ty.push('*');
                    return Some((ty, name.to_string()));
                }
            }
        }
        return None;
    }

    let mut parts: Vec<&str> = s.rsplitn(2, char::is_whitespace).collect();
    parts.reverse();
    if parts.len() == 2 && is_identifier(parts[1]) {
        return Some((parts[0].to_string(), parts[1].to_string()));
    }
    None
}

/// Try to infer a constant's type from its value.
fn infer_constant_type(value: &str) -> Option<CType> {
    let value = value.trim();

    // String literal
    if value.starts_with('"') && value.ends_with('"') {
        return Some(CType::ConstPointer(Box::new(CType::Char)));
    }

    // Character literal
    if value.starts_with('\'') && value.ends_with('\'') {
        return Some(CType::Char);
    }

    let lower = value.to_lowercase();
    let is_hex = lower.starts_with("0x");
    if is_hex || value.chars().next().is_some_and(|c| c.is_ascii_digit() || c == '-') {
        // Float
        if !is_hex && (value.contains('.') || lower.ends_with('f')) {
            return Some(if lower.ends_with('f') {
                CType::Float
            } else {
                CType::Double
            });
        }
        if lower.ends_with("ull") || lower.ends_with("ul") {
            return Some(CType::UInt64);
        }
        if lower.ends_with("ll") || lower.ends_with('l') {
            return Some(CType::Int64);
        }
        if lower.ends_with('u') {
            return Some(CType::UInt32);
        }
        if parse_int_literal(value).is_some() {
            return Some(CType::Int32);
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(content: &str) -> ParsedUnit {
        parse_with_defines(content, &[])
    }

    fn parse_with_defines(content: &str, args: &[&str]) -> ParsedUnit {
        let parser = HeaderParser::new();
        let defines = DefineSet::from_args(args);
        parser
            .parse_source(content, Path::new("test.h"), &defines)
            .unwrap()
    }

    fn functions(unit: &ParsedUnit) -> Vec<&FunctionDecl> {
        unit.decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Function(f) => Some(f),
                _ => None,
            })
            .collect()
    }

    fn structs(unit: &ParsedUnit) -> Vec<&StructDecl> {
        unit.decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Struct(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    fn enums(unit: &ParsedUnit) -> Vec<&EnumDecl> {
        unit.decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Enum(e) => Some(e),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_parse_simple_function() {
        let unit = parse("int add(int a, int b);");
        let funcs = functions(&unit);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "add");
        assert_eq!(funcs[0].return_type, CType::Int32);
        assert_eq!(funcs[0].params.len(), 2);
        assert_eq!(funcs[0].params[0].name, "a");
        assert_eq!(funcs[0].params[1].name, "b");
    }

    #[test]
    fn test_parse_pointer_function() {
        let unit = parse("char* get_string(void);");
        let funcs = functions(&unit);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "get_string");
        assert!(funcs[0].return_type.is_pointer());
        assert!(funcs[0].params.is_empty());
    }

    #[test]
    fn test_parse_function_with_attribute_macros() {
        let src = "\
#define VKAPI_ATTR
#define VKAPI_CALL
VKAPI_ATTR VkResult VKAPI_CALL vkCreateInstance(const VkInstanceCreateInfo* pCreateInfo, VkInstance* pInstance);
";
        let unit = parse(src);
        let funcs = functions(&unit);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "vkCreateInstance");
        assert_eq!(funcs[0].return_type, CType::Named("VkResult".to_string()));
        assert_eq!(funcs[0].params.len(), 2);
        assert_eq!(funcs[0].params[0].name, "pCreateInfo");
    }

    #[test]
    fn test_parse_struct_field_order() {
        let unit = parse("typedef struct _Extent { uint32_t width; uint32_t height; float depth; } Extent;");
        let st = structs(&unit);
        assert_eq!(st.len(), 1);
        assert_eq!(st[0].name, "Extent");
        let names: Vec<&str> = st[0].fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["width", "height", "depth"]);
    }

    #[test]
    fn test_parse_anonymous_typedef_struct() {
        let unit = parse("typedef struct { float x; float y; } Vec2;");
        let st = structs(&unit);
        assert_eq!(st.len(), 1);
        assert_eq!(st[0].name, "Vec2");
        assert_eq!(st[0].fields.len(), 2);
    }

    #[test]
    fn test_parse_struct_array_field_with_define_length() {
        let src = "\
#define MAX_NAME_SIZE 256
typedef struct Device { char name[MAX_NAME_SIZE]; int id; } Device;
";
        let unit = parse(src);
        let st = structs(&unit);
        assert_eq!(
            st[0].fields[0].ty,
            CType::Array(Box::new(CType::Char), 256)
        );
    }

    #[test]
    fn test_unresolvable_array_length_is_an_error() {
        let parser = HeaderParser::new();
        let err = parser
            .parse_source(
                "typedef struct S { char name[UNKNOWN_LEN]; } S;",
                Path::new("test.h"),
                &DefineSet::new(),
            )
            .unwrap_err();
        assert!(matches!(err, ParseError::Malformed { .. }));
    }

    #[test]
    fn test_parse_enum_with_values() {
        let unit = parse("typedef enum Color { RED = 0, GREEN = 0x1, BLUE = 2, } Color;");
        let es = enums(&unit);
        assert_eq!(es.len(), 1);
        assert_eq!(es[0].name, "Color");
        assert_eq!(es[0].members.len(), 3);
        assert_eq!(es[0].members[0].value, Some(0));
        assert_eq!(es[0].members[1].value_text.as_deref(), Some("0x1"));
        assert_eq!(es[0].members[1].value, Some(1));
    }

    #[test]
    fn test_parse_enum_macro_value_kept_textually() {
        let unit = parse("enum Limits { MAX = MAKE_LIMIT(1, 2) };");
        let es = enums(&unit);
        assert_eq!(es[0].members.len(), 1);
        assert_eq!(
            es[0].members[0].value_text.as_deref(),
            Some("MAKE_LIMIT(1, 2)")
        );
        assert_eq!(es[0].members[0].value, None);
    }

    #[test]
    fn test_parse_scalar_typedef() {
        let unit = parse("typedef uint32_t VkFlags;");
        match &unit.decls[0] {
            Declaration::Typedef(t) => {
                assert_eq!(t.name, "VkFlags");
                assert_eq!(t.underlying, CType::UInt32);
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_handle_typedef() {
        let unit = parse("typedef struct VkInstance_T* VkInstance;");
        match &unit.decls[0] {
            Declaration::Typedef(t) => {
                assert_eq!(t.name, "VkInstance");
                assert_eq!(
                    t.underlying,
                    CType::Pointer(Box::new(CType::Named("VkInstance_T".to_string())))
                );
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_parse_function_pointer_typedef() {
        let unit = parse("typedef void (*PFN_vkVoidFunction)(void);");
        match &unit.decls[0] {
            Declaration::Typedef(t) => {
                assert_eq!(t.name, "PFN_vkVoidFunction");
                assert!(matches!(t.underlying, CType::FunctionPointer { .. }));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn test_forward_typedef_of_own_tag_skipped() {
        let unit = parse("typedef struct Point Point;\nstruct Point { int x; };");
        assert_eq!(unit.decls.len(), 1);
        assert_eq!(unit.decls[0].kind_str(), "struct");
    }

    #[test]
    fn test_parse_constants() {
        let src = "#define VK_HEADER_VERSION 231\n#define VK_NAME \"vulkan\"\n";
        let unit = parse(src);
        let consts: Vec<&ConstantDecl> = unit
            .decls
            .iter()
            .filter_map(|d| match d {
                Declaration::Constant(c) => Some(c),
                _ => None,
            })
            .collect();
        assert_eq!(consts.len(), 2);
        assert_eq!(consts[0].name, "VK_HEADER_VERSION");
        assert_eq!(consts[0].ty, Some(CType::Int32));
        assert_eq!(consts[1].ty, Some(CType::ConstPointer(Box::new(CType::Char))));
    }

    #[test]
    fn test_variadic_function() {
        let unit = parse("int printf_like(const char* fmt, ...);");
        let funcs = functions(&unit);
        assert!(funcs[0].variadic);
        assert_eq!(funcs[0].params.len(), 1);
    }

    #[test]
    fn test_stdcall_detection() {
        let unit = parse("int __stdcall WinFunc(int x);");
        let funcs = functions(&unit);
        assert_eq!(funcs[0].calling_convention, CallingConvention::Stdcall);
    }

    #[test]
    fn test_declaration_order_preserved_across_kinds() {
        let src = "\
typedef uint32_t Flags;
typedef enum Color { RED } Color;
typedef struct Point { int x; int y; } Point;
void draw(Point p);
";
        let unit = parse(src);
        let kinds: Vec<&str> = unit.decls.iter().map(|d| d.kind_str()).collect();
        assert_eq!(kinds, ["typedef", "enum", "struct", "function"]);
    }

    #[test]
    fn test_declarations_carry_locations() {
        let src = "typedef uint32_t Flags;\nint get_flags(void);\n";
        let unit = parse(src);
        assert_eq!(unit.decls[0].loc().line, 1);
        assert_eq!(unit.decls[1].loc().line, 2);
    }

    #[test]
    fn test_platform_guarded_function_skipped() {
        let src = "\
#ifdef USE_WIN32
void win32_only(void);
#endif
void always(void);
";
        let unit = parse(src);
        let funcs = functions(&unit);
        assert_eq!(funcs.len(), 1);
        assert_eq!(funcs[0].name, "always");

        let unit = parse_with_defines(src, &["USE_WIN32"]);
        assert_eq!(functions(&unit).len(), 2);
    }

    #[test]
    fn test_bitfield_width() {
        let unit = parse("struct Packed { unsigned int flags : 3; };");
        let st = structs(&unit);
        assert_eq!(st[0].fields[0].bit_width, Some(3));
    }

    #[test]
    fn test_infer_constant_type() {
        assert_eq!(infer_constant_type("42"), Some(CType::Int32));
        assert_eq!(infer_constant_type("0x10u"), Some(CType::UInt32));
        assert_eq!(infer_constant_type("100ULL"), Some(CType::UInt64));
        assert_eq!(infer_constant_type("1.5f"), Some(CType::Float));
        assert_eq!(infer_constant_type("1.5"), Some(CType::Double));
        assert_eq!(infer_constant_type("(~0U)"), None);
    }
}
