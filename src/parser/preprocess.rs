//! Conditional preprocessing.
//!
//! Platform-conditional header sections are handled by threading an
//! explicit active define set through the walk, so the same parser can be
//! run repeatedly with different target-platform configurations and no
//! shared mutable state. The output preserves the line structure of the
//! input: inactive regions and directives become blank lines, which keeps
//! byte offsets meaningful for error reporting in the extraction step.

use std::collections::BTreeMap;
use std::path::Path;

use crate::parser::ParseError;

/// A recorded macro definition.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Macro {
    /// Object-like macro with its replacement text (possibly empty)
    Object(String),
    /// Function-like macro; tracked for `defined()` only, never expanded
    Function,
}

/// The set of active preprocessor defines.
///
/// Ordered map so iteration (and therefore behavior) is deterministic
/// regardless of insertion order.
#[derive(Debug, Clone, Default)]
pub struct DefineSet {
    map: BTreeMap<String, Macro>,
}

impl DefineSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from command-line style defines: `NAME` (defined to `1`,
    /// matching `-D NAME`) or `NAME=VALUE`.
    pub fn from_args<S: AsRef<str>>(defines: &[S]) -> Self {
        let mut set = DefineSet::new();
        for d in defines {
            let d = d.as_ref();
            match d.split_once('=') {
                Some((name, value)) => set.define(name, value),
                None => set.define(d, "1"),
            }
        }
        set
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.map
            .insert(name.to_string(), Macro::Object(value.to_string()));
    }

    fn define_function(&mut self, name: &str) {
        self.map.insert(name.to_string(), Macro::Function);
    }

    pub fn undef(&mut self, name: &str) {
        self.map.remove(name);
    }

    pub fn is_defined(&self, name: &str) -> bool {
        self.map.contains_key(name)
    }

    /// Replacement text of an object-like macro.
    pub fn object_value(&self, name: &str) -> Option<&str> {
        match self.map.get(name) {
            Some(Macro::Object(v)) => Some(v.as_str()),
            _ => None,
        }
    }
}

/// An object-like `#define NAME VALUE` seen in an active region,
/// surfaced to the header parser as a constant candidate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawDefine {
    pub name: String,
    pub value: String,
    pub line: u32,
}

/// Preprocessing result.
#[derive(Debug)]
pub struct Preprocessed {
    /// Active program text, line structure identical to the input
    pub text: String,

    /// Object-like defines with non-empty values, in order of appearance
    pub constants: Vec<RawDefine>,
}

struct Frame {
    /// Whether the enclosing region was active when this frame opened
    outer: bool,
    /// Whether the current branch is active
    active: bool,
    /// Whether any branch of this conditional has been taken
    taken: bool,
    seen_else: bool,
    /// Line of the opening directive
    line: u32,
}

/// Run the conditional preprocessor over one translation unit.
///
/// `defines` is mutated as `#define`/`#undef` directives are walked, so
/// include guards behave; callers clone the global set per file.
pub fn preprocess(
    source: &str,
    file: &Path,
    defines: &mut DefineSet,
) -> Result<Preprocessed, ParseError> {
    let decommented = strip_comments(source);
    let logical = splice_continuations(&decommented);

    let mut out: Vec<String> = vec![String::new(); logical.len()];
    let mut constants = Vec::new();
    let mut stack: Vec<Frame> = Vec::new();

    for (idx, line) in logical.iter().enumerate() {
        let line_no = idx as u32 + 1;
        let active = stack.last().map(|f| f.active).unwrap_or(true);

        let trimmed = line.trim_start();
        if let Some(rest) = trimmed.strip_prefix('#') {
            let rest = rest.trim_start();
            let (directive, args) = split_directive(rest);
            match directive {
                "ifdef" | "ifndef" => {
                    let name = args.trim();
                    let mut cond = defines.is_defined(name);
                    if directive == "ifndef" {
                        cond = !cond;
                    }
                    stack.push(Frame {
                        outer: active,
                        active: active && cond,
                        taken: cond,
                        seen_else: false,
                        line: line_no,
                    });
                }
                "if" => {
                    // Tolerate unevaluable expressions in regions that are
                    // inactive anyway (untargeted platforms).
                    let cond = if active {
                        eval_expr(args, defines).map_err(|message| ParseError::Directive {
                            file: file.to_path_buf(),
                            line: line_no,
                            message,
                        })? != 0
                    } else {
                        false
                    };
                    stack.push(Frame {
                        outer: active,
                        active: active && cond,
                        taken: cond,
                        seen_else: false,
                        line: line_no,
                    });
                }
                "elif" => {
                    let frame = stack.last_mut().ok_or_else(|| ParseError::Directive {
                        file: file.to_path_buf(),
                        line: line_no,
                        message: "#elif without matching #if".to_string(),
                    })?;
                    if frame.seen_else {
                        return Err(ParseError::Directive {
                            file: file.to_path_buf(),
                            line: line_no,
                            message: "#elif after #else".to_string(),
                        });
                    }
                    if frame.outer && !frame.taken {
                        let cond = eval_expr(args, defines).map_err(|message| {
                            ParseError::Directive {
                                file: file.to_path_buf(),
                                line: line_no,
                                message,
                            }
                        })? != 0;
                        frame.active = cond;
                        frame.taken = cond;
                    } else {
                        frame.active = false;
                    }
                }
                "else" => {
                    let frame = stack.last_mut().ok_or_else(|| ParseError::Directive {
                        file: file.to_path_buf(),
                        line: line_no,
                        message: "#else without matching #if".to_string(),
                    })?;
                    if frame.seen_else {
                        return Err(ParseError::Directive {
                            file: file.to_path_buf(),
                            line: line_no,
                            message: "duplicate #else".to_string(),
                        });
                    }
                    frame.active = frame.outer && !frame.taken;
                    frame.taken = true;
                    frame.seen_else = true;
                }
                "endif" => {
                    if stack.pop().is_none() {
                        return Err(ParseError::Directive {
                            file: file.to_path_buf(),
                            line: line_no,
                            message: "#endif without matching #if".to_string(),
                        });
                    }
                }
                "define" if active => {
                    let (name, body) = parse_define(args).ok_or_else(|| {
                        ParseError::Directive {
                            file: file.to_path_buf(),
                            line: line_no,
                            message: "malformed #define".to_string(),
                        }
                    })?;
                    match body {
                        DefineBody::Function => defines.define_function(name),
                        DefineBody::Object(value) => {
                            if !value.is_empty() {
                                constants.push(RawDefine {
                                    name: name.to_string(),
                                    value: value.to_string(),
                                    line: line_no,
                                });
                            }
                            defines.define(name, value);
                        }
                    }
                }
                "undef" if active => {
                    defines.undef(args.trim());
                }
                "error" if active => {
                    return Err(ParseError::Directive {
                        file: file.to_path_buf(),
                        line: line_no,
                        message: format!("#error: {}", args.trim()),
                    });
                }
                // #include, #pragma, #warning, inactive define/undef/error
                _ => {}
            }
            // Directive lines never reach the extraction step.
            continue;
        }

        if active {
            out[idx] = erase_empty_macros(line, defines);
        }
    }

    if let Some(frame) = stack.last() {
        return Err(ParseError::Unterminated {
            file: file.to_path_buf(),
            line: frame.line,
            construct: "conditional",
        });
    }

    Ok(Preprocessed {
        text: out.join("\n"),
        constants,
    })
}

/// Split a directive into its name and argument text.
fn split_directive(rest: &str) -> (&str, &str) {
    let end = rest
        .char_indices()
        .find(|(_, c)| !c.is_ascii_alphanumeric())
        .map(|(i, _)| i)
        .unwrap_or(rest.len());
    (&rest[..end], &rest[end..])
}

enum DefineBody<'a> {
    Object(&'a str),
    Function,
}

fn parse_define(args: &str) -> Option<(&str, DefineBody<'_>)> {
    let args = args.trim_start();
    let name_end = args
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_alphanumeric() || *c == '_'))
        .map(|(i, _)| i)
        .unwrap_or(args.len());
    if name_end == 0 {
        return None;
    }
    let name = &args[..name_end];
    let rest = &args[name_end..];
    if rest.starts_with('(') {
        // Function-like macro: recorded for `defined()` but never expanded.
        return Some((name, DefineBody::Function));
    }
    Some((name, DefineBody::Object(rest.trim())))
}

/// Remove identifiers that are defined to an empty replacement.
///
/// This is the one-token-deep expansion the declaration extractor needs:
/// attribute macros like `VKAPI_ATTR` defined to nothing would otherwise
/// pollute return types and parameter lists.
fn erase_empty_macros(line: &str, defines: &DefineSet) -> String {
    let mut out = String::with_capacity(line.len());
    let mut iter = line.char_indices().peekable();
    while let Some((start, c)) = iter.next() {
        if c.is_ascii_alphabetic() || c == '_' {
            let mut end = start + c.len_utf8();
            while let Some(&(i, c2)) = iter.peek() {
                if c2.is_ascii_alphanumeric() || c2 == '_' {
                    iter.next();
                    end = i + c2.len_utf8();
                } else {
                    break;
                }
            }
            let ident = &line[start..end];
            if defines.object_value(ident) != Some("") {
                out.push_str(ident);
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Strip block and line comments while preserving newlines, so line
/// numbers in later errors still point at the original source.
fn strip_comments(source: &str) -> String {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        Normal,
        Line,
        Block,
        Str(char),
    }

    let mut out = String::with_capacity(source.len());
    let mut state = State::Normal;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        match state {
            State::Normal => match c {
                '/' if chars.peek() == Some(&'/') => {
                    chars.next();
                    state = State::Line;
                    out.push(' ');
                }
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    state = State::Block;
                    out.push(' ');
                }
                '"' | '\'' => {
                    state = State::Str(c);
                    out.push(c);
                }
                _ => out.push(c),
            },
            State::Line => {
                if c == '\n' {
                    state = State::Normal;
                    out.push('\n');
                }
            }
            State::Block => {
                if c == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    state = State::Normal;
                } else if c == '\n' {
                    out.push('\n');
                }
            }
            State::Str(quote) => {
                out.push(c);
                if c == '\\' {
                    if let Some(escaped) = chars.next() {
                        out.push(escaped);
                    }
                } else if c == quote {
                    state = State::Normal;
                }
            }
        }
    }

    out
}

/// Join backslash-continued lines, leaving blanks behind so the line
/// count is unchanged.
fn splice_continuations(source: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    let mut pending: Option<String> = None;
    let mut pending_blanks = 0usize;

    for line in source.split('\n') {
        if let Some(stripped) = line.trim_end().strip_suffix('\\') {
            match pending.as_mut() {
                Some(p) => {
                    p.push(' ');
                    p.push_str(stripped.trim());
                    pending_blanks += 1;
                }
                None => pending = Some(stripped.to_string()),
            }
        } else if let Some(mut p) = pending.take() {
            p.push(' ');
            p.push_str(line.trim());
            out.push(p);
            for _ in 0..pending_blanks {
                out.push(String::new());
            }
            out.push(String::new());
            pending_blanks = 0;
        } else {
            out.push(line.to_string());
        }
    }
    if let Some(p) = pending.take() {
        out.push(p);
        for _ in 0..pending_blanks {
            out.push(String::new());
        }
    }

    out
}

// --- #if expression evaluation -------------------------------------------

#[derive(Debug, Clone, PartialEq)]
enum Tok {
    Int(i64),
    Ident(String),
    Defined,
    Not,
    AndAnd,
    OrOr,
    Eq,
    Ne,
    Lt,
    Gt,
    Le,
    Ge,
    LParen,
    RParen,
}

fn lex(expr: &str) -> Result<Vec<Tok>, String> {
    let mut toks = Vec::new();
    let bytes = expr.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' => i += 1,
            '(' => {
                toks.push(Tok::LParen);
                i += 1;
            }
            ')' => {
                toks.push(Tok::RParen);
                i += 1;
            }
            '!' if bytes.get(i + 1) == Some(&b'=') => {
                toks.push(Tok::Ne);
                i += 2;
            }
            '!' => {
                toks.push(Tok::Not);
                i += 1;
            }
            '&' if bytes.get(i + 1) == Some(&b'&') => {
                toks.push(Tok::AndAnd);
                i += 2;
            }
            '|' if bytes.get(i + 1) == Some(&b'|') => {
                toks.push(Tok::OrOr);
                i += 2;
            }
            '=' if bytes.get(i + 1) == Some(&b'=') => {
                toks.push(Tok::Eq);
                i += 2;
            }
            '<' if bytes.get(i + 1) == Some(&b'=') => {
                toks.push(Tok::Le);
                i += 2;
            }
            '>' if bytes.get(i + 1) == Some(&b'=') => {
                toks.push(Tok::Ge);
                i += 2;
            }
            '<' => {
                toks.push(Tok::Lt);
                i += 1;
            }
            '>' => {
                toks.push(Tok::Gt);
                i += 1;
            }
            c if c.is_ascii_digit() => {
                let start = i;
                while i < bytes.len() && (bytes[i] as char).is_ascii_alphanumeric() {
                    i += 1;
                }
                let text = &expr[start..i];
                let value = crate::core::declaration::parse_int_literal(text)
                    .ok_or_else(|| format!("invalid integer `{}`", text))?;
                toks.push(Tok::Int(value));
            }
            c if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len()
                    && ((bytes[i] as char).is_ascii_alphanumeric() || bytes[i] == b'_')
                {
                    i += 1;
                }
                let ident = &expr[start..i];
                if ident == "defined" {
                    toks.push(Tok::Defined);
                } else {
                    toks.push(Tok::Ident(ident.to_string()));
                }
            }
            other => return Err(format!("unexpected character `{}` in #if expression", other)),
        }
    }
    Ok(toks)
}

struct ExprParser<'a> {
    toks: &'a [Tok],
    pos: usize,
    defines: &'a DefineSet,
}

impl<'a> ExprParser<'a> {
    fn peek(&self) -> Option<&Tok> {
        self.toks.get(self.pos)
    }

    fn next(&mut self) -> Option<&Tok> {
        let t = self.toks.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }

    fn parse_or(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_and()?;
        while self.peek() == Some(&Tok::OrOr) {
            self.next();
            let rhs = self.parse_and()?;
            lhs = i64::from(lhs != 0 || rhs != 0);
        }
        Ok(lhs)
    }

    fn parse_and(&mut self) -> Result<i64, String> {
        let mut lhs = self.parse_cmp()?;
        while self.peek() == Some(&Tok::AndAnd) {
            self.next();
            let rhs = self.parse_cmp()?;
            lhs = i64::from(lhs != 0 && rhs != 0);
        }
        Ok(lhs)
    }

    fn parse_cmp(&mut self) -> Result<i64, String> {
        let lhs = self.parse_unary()?;
        let op = match self.peek() {
            Some(Tok::Eq) => Tok::Eq,
            Some(Tok::Ne) => Tok::Ne,
            Some(Tok::Lt) => Tok::Lt,
            Some(Tok::Gt) => Tok::Gt,
            Some(Tok::Le) => Tok::Le,
            Some(Tok::Ge) => Tok::Ge,
            _ => return Ok(lhs),
        };
        self.next();
        let rhs = self.parse_unary()?;
        Ok(i64::from(match op {
            Tok::Eq => lhs == rhs,
            Tok::Ne => lhs != rhs,
            Tok::Lt => lhs < rhs,
            Tok::Gt => lhs > rhs,
            Tok::Le => lhs <= rhs,
            Tok::Ge => lhs >= rhs,
            _ => unreachable!(),
        }))
    }

    fn parse_unary(&mut self) -> Result<i64, String> {
        match self.peek() {
            Some(Tok::Not) => {
                self.next();
                let v = self.parse_unary()?;
                Ok(i64::from(v == 0))
            }
            _ => self.parse_primary(),
        }
    }

    fn parse_primary(&mut self) -> Result<i64, String> {
        match self.next().cloned() {
            Some(Tok::Int(v)) => Ok(v),
            Some(Tok::Defined) => {
                let parenthesized = self.peek() == Some(&Tok::LParen);
                if parenthesized {
                    self.next();
                }
                let name = match self.next() {
                    Some(Tok::Ident(name)) => name.clone(),
                    _ => return Err("expected identifier after `defined`".to_string()),
                };
                if parenthesized && self.next() != Some(&Tok::RParen) {
                    return Err("expected `)` after defined(NAME".to_string());
                }
                Ok(i64::from(self.defines.is_defined(&name)))
            }
            Some(Tok::Ident(name)) => {
                // Undefined identifiers evaluate to 0, like a C preprocessor.
                Ok(self
                    .defines
                    .object_value(&name)
                    .and_then(crate::core::declaration::parse_int_literal)
                    .unwrap_or(0))
            }
            Some(Tok::LParen) => {
                let v = self.parse_or()?;
                if self.next() != Some(&Tok::RParen) {
                    return Err("expected `)`".to_string());
                }
                Ok(v)
            }
            other => Err(format!("unexpected token {:?} in #if expression", other)),
        }
    }
}

fn eval_expr(expr: &str, defines: &DefineSet) -> Result<i64, String> {
    let toks = lex(expr.trim())?;
    if toks.is_empty() {
        return Err("empty #if expression".to_string());
    }
    let mut parser = ExprParser {
        toks: &toks,
        pos: 0,
        defines,
    };
    let v = parser.parse_or()?;
    if parser.pos != parser.toks.len() {
        return Err("trailing tokens in #if expression".to_string());
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn run(source: &str, args: &[&str]) -> Result<(String, DefineSet), ParseError> {
        let mut defines = DefineSet::from_args(args);
        let pre = preprocess(source, &PathBuf::from("test.h"), &mut defines)?;
        Ok((pre.text, defines))
    }

    #[test]
    fn test_inactive_platform_section_is_skipped() {
        let src = "\
#ifdef USE_WIN32
typedef int WinThing;
#endif
typedef int Always;
";
        let (text, _) = run(src, &[]).unwrap();
        assert!(!text.contains("WinThing"));
        assert!(text.contains("Always"));

        let (text, _) = run(src, &["USE_WIN32"]).unwrap();
        assert!(text.contains("WinThing"));
    }

    #[test]
    fn test_disabling_define_suppresses_guarded_body() {
        // The original tool disabled whole platform headers by predefining
        // their include guards.
        let src = "\
#ifndef HEADER_GUARD_H_
#define HEADER_GUARD_H_
typedef int Guarded;
#endif
";
        let (text, _) = run(src, &["HEADER_GUARD_H_="]).unwrap();
        assert!(!text.contains("Guarded"));

        let (text, _) = run(src, &[]).unwrap();
        assert!(text.contains("Guarded"));
    }

    #[test]
    fn test_else_and_elif() {
        let src = "\
#if defined(A)
typedef int WithA;
#elif defined(B)
typedef int WithB;
#else
typedef int Neither;
#endif
";
        let (text, _) = run(src, &["A"]).unwrap();
        assert!(text.contains("WithA") && !text.contains("WithB") && !text.contains("Neither"));

        let (text, _) = run(src, &["B"]).unwrap();
        assert!(text.contains("WithB") && !text.contains("WithA"));

        let (text, _) = run(src, &[]).unwrap();
        assert!(text.contains("Neither"));
    }

    #[test]
    fn test_nested_conditionals() {
        let src = "\
#ifdef OUTER
#ifdef INNER
typedef int Both;
#endif
typedef int OuterOnly;
#endif
";
        let (text, _) = run(src, &["OUTER"]).unwrap();
        assert!(!text.contains("Both"));
        assert!(text.contains("OuterOnly"));

        let (text, _) = run(src, &["OUTER", "INNER"]).unwrap();
        assert!(text.contains("Both"));
    }

    #[test]
    fn test_error_directive_fails_with_location() {
        let src = "#ifdef BAD\n#error unsupported platform\n#endif\n";
        let err = run(src, &["BAD"]).unwrap_err();
        match err {
            ParseError::Directive { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("unsupported platform"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
        // Inactive #error is fine.
        run(src, &[]).unwrap();
    }

    #[test]
    fn test_unbalanced_conditional() {
        let err = run("#ifdef X\nint a;\n", &[]).unwrap_err();
        assert!(matches!(err, ParseError::Unterminated { line: 1, .. }));

        let err = run("#endif\n", &[]).unwrap_err();
        assert!(matches!(err, ParseError::Directive { .. }));
    }

    #[test]
    fn test_line_structure_preserved() {
        let src = "int a;\n#ifdef X\nint b;\n#endif\nint c;\n";
        let (text, _) = run(src, &[]).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0], "int a;");
        assert_eq!(lines[1], "");
        assert_eq!(lines[2], "");
        assert_eq!(lines[4], "int c;");
    }

    #[test]
    fn test_empty_macro_erasure() {
        let src = "#define VKAPI_ATTR\nVKAPI_ATTR int VKAPI_ATTR f(void);\n";
        let (text, _) = run(src, &[]).unwrap();
        assert!(text.contains(" int  f(void);"));
    }

    #[test]
    fn test_comments_stripped_lines_kept() {
        let src = "int a; // trailing\n/* block\nspanning */ int b;\n";
        let (text, _) = run(src, &[]).unwrap();
        let lines: Vec<&str> = text.split('\n').collect();
        assert_eq!(lines[0].trim(), "int a;");
        assert_eq!(lines[2].trim(), "int b;");
    }

    #[test]
    fn test_continuation_splice() {
        let src = "#define LONG_VALUE 1 + \\\n 2\nint a;\n";
        let (text, defines) = run(src, &[]).unwrap();
        assert_eq!(defines.object_value("LONG_VALUE"), Some("1 + 2"));
        assert_eq!(text.split('\n').nth(2).unwrap(), "int a;");
    }

    #[test]
    fn test_expr_eval() {
        let defines = DefineSet::from_args(&["A", "VERSION=7"]);
        assert_eq!(eval_expr("defined(A)", &defines), Ok(1));
        assert_eq!(eval_expr("defined A", &defines), Ok(1));
        assert_eq!(eval_expr("!defined(A)", &defines), Ok(0));
        assert_eq!(eval_expr("defined(A) && !defined(B)", &defines), Ok(1));
        assert_eq!(eval_expr("defined(B) || defined(A)", &defines), Ok(1));
        assert_eq!(eval_expr("VERSION >= 5", &defines), Ok(1));
        assert_eq!(eval_expr("VERSION == 7", &defines), Ok(1));
        assert_eq!(eval_expr("UNDEFINED", &defines), Ok(0));
        assert_eq!(eval_expr("(defined(B) || defined(A)) && 1", &defines), Ok(1));
        assert!(eval_expr("&&", &defines).is_err());
    }

    #[test]
    fn test_function_like_macro_not_a_constant() {
        let src = "#define MAKE_VERSION(a, b) ((a) << 16 | (b))\n#define PLAIN 42\n";
        let mut defines = DefineSet::new();
        let pre = preprocess(src, &PathBuf::from("test.h"), &mut defines).unwrap();
        assert_eq!(pre.constants.len(), 1);
        assert_eq!(pre.constants[0].name, "PLAIN");
        assert_eq!(pre.constants[0].value, "42");
        assert!(defines.is_defined("MAKE_VERSION"));
    }

    #[test]
    fn test_undef() {
        let src = "#define X 1\n#undef X\n#ifdef X\nint present;\n#endif\n";
        let (text, defines) = run(src, &[]).unwrap();
        assert!(!text.contains("present"));
        assert!(!defines.is_defined("X"));
    }
}
