//! Go-style interface source parser.
//!
//! A line-oriented reader for the subset of Go that service definitions use:
//! - `//` comments directly above `package` → file documentation
//! - `type X interface { ... }` with one method signature per line, or a
//!   signature wrapped over several lines until its parentheses close
//! - `type X struct { ... }` with one field (or `A, B T` group) per line
//! - `type X = T` / `type X T` → alias
//!
//! Comment runs directly above a declaration become its documentation; a
//! blank line breaks the run. Lines outside these forms (imports, funcs,
//! constants) are ignored.

use crate::decl::{FieldDecl, FileDecl, InterfaceDecl, MethodDecl, ParamDecl, TypeDecl, TypeDeclKind};
use crate::error::ParseError;
use crate::types::TypeExpr;
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

// -- Regex patterns -----------------------------------------------------------

static RE_COMMENT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^//\s?(.*)$").unwrap());

static RE_PACKAGE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^package\s+\w+").unwrap());

static RE_INTERFACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^type\s+([A-Za-z_]\w*)\s+interface\s*\{$").unwrap());

static RE_STRUCT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^type\s+([A-Za-z_]\w*)\s+struct\s*\{$").unwrap());

static RE_ALIAS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^type\s+([A-Za-z_]\w*)\s*(?:=\s*)?(\S.*)$").unwrap());

static RE_METHOD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s*\(").unwrap());

static RE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([A-Za-z_]\w*(?:\s*,\s*[A-Za-z_]\w*)*)\s+([^`]+?)\s*(?:`[^`]*`)?$").unwrap()
});

static RE_NAMED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([A-Za-z_]\w*)\s+(\S.*)$").unwrap());

// -- Parser -------------------------------------------------------------------

enum Block {
    Top,
    Interface(InterfaceDecl),
    /// A method signature still waiting for its closing parenthesis.
    Signature {
        iface: InterfaceDecl,
        text: String,
        docs: String,
    },
    Struct(TypeDecl, Vec<FieldDecl>),
}

struct Reader<'a> {
    path: &'a Path,
    line: usize,
}

impl Reader<'_> {
    fn error(&self, message: impl ToString) -> ParseError {
        ParseError::new(self.path, format!("line {}", self.line), message)
    }

    fn type_expr(&self, src: &str) -> Result<TypeExpr, ParseError> {
        src.trim().parse().map_err(|e| self.error(e))
    }
}

/// Parse one Go-style source file into a declaration record.
pub fn parse(input: &str, path: &Path) -> Result<FileDecl, ParseError> {
    let mut file = FileDecl {
        path: path.to_path_buf(),
        ..FileDecl::default()
    };
    let mut reader = Reader { path, line: 0 };
    let mut pending: Vec<String> = Vec::new();
    let mut block = Block::Top;

    for (idx, raw) in input.lines().enumerate() {
        reader.line = idx + 1;
        let line = raw.trim();

        if line.is_empty() {
            pending.clear();
            continue;
        }
        if let Some(caps) = RE_COMMENT.captures(line) {
            if !matches!(block, Block::Signature { .. }) {
                pending.push(caps[1].to_string());
            }
            continue;
        }

        let (code, trailing) = split_trailing_comment(line);
        let docs = take_docs(&mut pending, trailing);

        block = match block {
            Block::Top => top_level(&reader, &mut file, code, docs)?,
            Block::Interface(mut iface) => {
                if code == "}" {
                    file.interfaces.push(iface);
                    Block::Top
                } else if RE_METHOD.is_match(code) && paren_depth(code) > 0 {
                    Block::Signature {
                        iface,
                        text: code.to_string(),
                        docs,
                    }
                } else {
                    if RE_METHOD.is_match(code) {
                        iface.methods.push(method(&reader, code, docs)?);
                    }
                    // Embedded interfaces are not expanded.
                    Block::Interface(iface)
                }
            }
            Block::Signature {
                mut iface,
                mut text,
                docs: method_docs,
            } => {
                text.push(' ');
                text.push_str(code);
                if paren_depth(&text) > 0 {
                    Block::Signature {
                        iface,
                        text,
                        docs: method_docs,
                    }
                } else {
                    iface.methods.push(method(&reader, &text, method_docs)?);
                    Block::Interface(iface)
                }
            }
            Block::Struct(mut decl, mut fields) => {
                if code == "}" {
                    decl.kind = TypeDeclKind::Struct { fields };
                    file.types.push(decl);
                    Block::Top
                } else {
                    if let Some(caps) = RE_FIELD.captures(code) {
                        let ty = reader.type_expr(&caps[2])?;
                        for name in caps[1].split(',') {
                            fields.push(FieldDecl {
                                name: name.trim().to_string(),
                                ty: ty.clone(),
                                docs: docs.clone(),
                            });
                        }
                    }
                    Block::Struct(decl, fields)
                }
            }
        };
    }

    match block {
        Block::Top => Ok(file),
        Block::Interface(iface) => Err(reader.error(format!("unterminated interface {}", iface.name))),
        Block::Signature { iface, text, .. } => Err(reader.error(format!(
            "unterminated method signature `{text}` in interface {}",
            iface.name
        ))),
        Block::Struct(decl, _) => Err(reader.error(format!("unterminated struct {}", decl.name))),
    }
}

fn top_level(reader: &Reader<'_>, file: &mut FileDecl, code: &str, docs: String) -> Result<Block, ParseError> {
    if RE_PACKAGE.is_match(code) {
        file.docs = docs;
        return Ok(Block::Top);
    }
    if let Some(caps) = RE_INTERFACE.captures(code) {
        return Ok(Block::Interface(InterfaceDecl {
            name: caps[1].to_string(),
            docs,
            methods: Vec::new(),
        }));
    }
    if let Some(caps) = RE_STRUCT.captures(code) {
        let decl = TypeDecl {
            name: caps[1].to_string(),
            docs,
            kind: TypeDeclKind::Struct { fields: Vec::new() },
        };
        return Ok(Block::Struct(decl, Vec::new()));
    }
    if let Some(caps) = RE_ALIAS.captures(code) {
        file.types.push(TypeDecl {
            name: caps[1].to_string(),
            docs,
            kind: TypeDeclKind::Alias {
                target: reader.type_expr(&caps[2])?,
            },
        });
    }
    Ok(Block::Top)
}

/// `Name(params) results` → method declaration.
fn method(reader: &Reader<'_>, code: &str, docs: String) -> Result<MethodDecl, ParseError> {
    let open = code.find('(').unwrap_or(code.len());
    let name = code[..open].trim().to_string();
    let (params, rest) =
        balanced(&code[open..]).ok_or_else(|| reader.error(format!("unbalanced parameter list in {name}")))?;

    let rest = rest.trim();
    let results = if rest.is_empty() {
        Vec::new()
    } else if rest.starts_with('(') {
        let (inner, tail) =
            balanced(rest).ok_or_else(|| reader.error(format!("unbalanced result list in {name}")))?;
        if !tail.trim().is_empty() {
            return Err(reader.error(format!("unexpected `{}` after results of {name}", tail.trim())));
        }
        items(reader, inner)?
    } else {
        vec![ParamDecl::new("", reader.type_expr(rest)?)]
    };

    Ok(MethodDecl {
        name,
        docs,
        params: items(reader, params)?,
        results,
    })
}

/// Parse a comma-separated parameter list, honouring `a, b T` grouping.
fn items(reader: &Reader<'_>, list: &str) -> Result<Vec<ParamDecl>, ParseError> {
    let parts: Vec<&str> = split_top_level(list).into_iter().filter(|p| !p.is_empty()).collect();
    let named = parts.iter().any(|p| named_item(p).is_some());

    if !named {
        return parts
            .iter()
            .map(|p| Ok(ParamDecl::new("", reader.type_expr(p)?)))
            .collect();
    }

    let mut out = Vec::with_capacity(parts.len());
    let mut waiting: Vec<&str> = Vec::new();
    for part in parts {
        match named_item(part) {
            Some((name, ty)) => {
                let ty = reader.type_expr(ty)?;
                for grouped in waiting.drain(..) {
                    out.push(ParamDecl::new(grouped, ty.clone()));
                }
                out.push(ParamDecl::new(name, ty));
            }
            None => waiting.push(part),
        }
    }
    if let Some(name) = waiting.first() {
        return Err(reader.error(format!("parameter `{name}` has no type")));
    }
    Ok(out)
}

/// `name Type` → (`name`, `Type`). Type keywords never name a parameter.
fn named_item(item: &str) -> Option<(&str, &str)> {
    let caps = RE_NAMED_ITEM.captures(item)?;
    let name = caps.get(1)?.as_str();
    if matches!(name, "chan" | "func" | "map" | "struct" | "interface") {
        return None;
    }
    Some((name, caps.get(2)?.as_str()))
}

/// Split `(inner) rest` at the matching close paren.
fn balanced(s: &str) -> Option<(&str, &str)> {
    let mut depth = 0usize;
    for (i, c) in s.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some((&s[1..i], &s[i + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

/// Open parentheses minus closed ones.
fn paren_depth(s: &str) -> i32 {
    s.chars().fold(0, |depth, c| match c {
        '(' => depth + 1,
        ')' => depth - 1,
        _ => depth,
    })
}

/// Split on commas outside brackets, braces and parens.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, c) in s.char_indices() {
        match c {
            '[' | '{' | '(' => depth += 1,
            ']' | '}' | ')' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(s[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(s[start..].trim());
    parts
}

/// Split `code // comment`, ignoring `//` inside quotes or backquotes.
fn split_trailing_comment(line: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let bytes = line.as_bytes();
    for (i, c) in line.char_indices() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => {}
            None if c == '"' || c == '`' => quote = Some(c),
            None if c == '/' && bytes.get(i + 1) == Some(&b'/') => {
                return (line[..i].trim_end(), Some(line[i + 2..].trim()));
            }
            None => {}
        }
    }
    (line, None)
}

fn take_docs(pending: &mut Vec<String>, trailing: Option<&str>) -> String {
    let mut lines: Vec<String> = std::mem::take(pending);
    if let Some(comment) = trailing {
        lines.push(comment.to_string());
    }
    lines.join("\n")
}
