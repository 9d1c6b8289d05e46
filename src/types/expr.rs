//! Raw type references as they appear in declaration signatures.
//!
//! Grammar (Go-flavoured, one expression per reference):
//!
//! ```text
//! expr := '*' expr | '[' digits? ']' expr | 'map' '[' expr ']' expr
//!       | 'struct' '{' (ident expr (';' | ',')?)* '}'
//!       | 'interface' '{' '}' | 'any' | ident ('.' ident)*
//! ```

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A parsed, not yet canonicalized, type reference.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum TypeExpr {
    /// Built-in, declared or package-qualified name.
    Named(String),
    Pointer(Box<TypeExpr>),
    /// Slices and fixed arrays alike.
    Slice(Box<TypeExpr>),
    Map(Box<TypeExpr>, Box<TypeExpr>),
    /// Inline anonymous struct.
    Struct(Vec<(String, TypeExpr)>),
    /// `interface{}` / `any`.
    Interface,
}

impl TypeExpr {
    pub fn named(name: &str) -> Self {
        TypeExpr::Named(name.to_string())
    }

    /// True for the designated failure-channel shape.
    pub fn is_error(&self) -> bool {
        matches!(self, TypeExpr::Named(name) if name == "error")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid type `{input}`: {message}")]
pub struct TypeExprError {
    pub input: String,
    pub message: String,
}

impl FromStr for TypeExpr {
    type Err = TypeExprError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let fail = |message: String| TypeExprError {
            input: input.to_string(),
            message,
        };
        let mut cursor = Cursor { src: input, pos: 0 };
        let expr = cursor.expr().map_err(fail)?;
        cursor.skip_ws();
        if cursor.pos < input.len() {
            return Err(fail(format!(
                "unexpected `{}` at offset {}",
                &input[cursor.pos..],
                cursor.pos
            )));
        }
        Ok(expr)
    }
}

impl TryFrom<String> for TypeExpr {
    type Error = TypeExprError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TypeExpr> for String {
    fn from(value: TypeExpr) -> Self {
        value.to_string()
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Named(name) => f.write_str(name),
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Slice(inner) => write!(f, "[]{inner}"),
            TypeExpr::Map(key, value) => write!(f, "map[{key}]{value}"),
            TypeExpr::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, (name, ty)) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(";")?;
                    }
                    write!(f, " {name} {ty}")?;
                }
                if !fields.is_empty() {
                    f.write_str(" ")?;
                }
                f.write_str("}")
            }
            TypeExpr::Interface => f.write_str("interface{}"),
        }
    }
}

struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl Cursor<'_> {
    fn rest(&self) -> &str {
        &self.src[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.src.len() - trimmed.len();
    }

    fn eat(&mut self, token: &str) -> bool {
        self.skip_ws();
        if self.rest().starts_with(token) {
            self.pos += token.len();
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: &str) -> Result<(), String> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(format!("expected `{token}` at offset {}", self.pos))
        }
    }

    fn ident(&mut self) -> &str {
        self.skip_ws();
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '.'))
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.src[start..self.pos]
    }

    fn expr(&mut self) -> Result<TypeExpr, String> {
        if self.eat("*") {
            return Ok(TypeExpr::Pointer(Box::new(self.expr()?)));
        }
        if self.eat("[") {
            let digits = self.rest().len() - self.rest().trim_start_matches(|c: char| c.is_ascii_digit()).len();
            self.pos += digits;
            self.expect("]")?;
            return Ok(TypeExpr::Slice(Box::new(self.expr()?)));
        }

        let at = self.pos;
        let ident = self.ident().to_string();
        match ident.as_str() {
            "" => Err(format!("expected a type at offset {at}")),
            "map" => {
                self.expect("[")?;
                let key = self.expr()?;
                self.expect("]")?;
                let value = self.expr()?;
                Ok(TypeExpr::Map(Box::new(key), Box::new(value)))
            }
            "struct" => self.struct_body(),
            "interface" => {
                self.expect("{")?;
                self.expect("}")?;
                Ok(TypeExpr::Interface)
            }
            "any" => Ok(TypeExpr::Interface),
            "chan" | "func" => Err(format!("`{ident}` types are not supported")),
            _ if ident.starts_with('.') || ident.ends_with('.') || ident.contains("..") => {
                Err(format!("malformed qualified name `{ident}`"))
            }
            _ => Ok(TypeExpr::Named(ident)),
        }
    }

    fn struct_body(&mut self) -> Result<TypeExpr, String> {
        self.expect("{")?;
        let mut fields = Vec::new();
        loop {
            if self.eat("}") {
                return Ok(TypeExpr::Struct(fields));
            }
            let name = self.ident().to_string();
            if name.is_empty() {
                return Err(format!("expected a field name at offset {}", self.pos));
            }
            let ty = self.expr()?;
            self.skip_struct_tag()?;
            fields.push((name, ty));
            if !self.eat(";") {
                self.eat(",");
            }
        }
    }

    /// Skip a backquoted struct tag; its content is the source parser's concern.
    fn skip_struct_tag(&mut self) -> Result<(), String> {
        if !self.eat("`") {
            return Ok(());
        }
        match self.rest().find('`') {
            Some(end) => {
                self.pos += end + 1;
                Ok(())
            }
            None => Err("unterminated struct tag".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> TypeExpr {
        s.parse().unwrap()
    }

    #[test]
    fn parses_composites() {
        assert_eq!(
            parse("[]*Item"),
            TypeExpr::Slice(Box::new(TypeExpr::Pointer(Box::new(TypeExpr::named("Item")))))
        );
        assert_eq!(
            parse("map[string][]int"),
            TypeExpr::Map(
                Box::new(TypeExpr::named("string")),
                Box::new(TypeExpr::Slice(Box::new(TypeExpr::named("int"))))
            )
        );
        assert_eq!(parse("[4]byte"), TypeExpr::Slice(Box::new(TypeExpr::named("byte"))));
    }

    #[test]
    fn parses_qualified_and_any() {
        assert_eq!(parse("time.Time"), TypeExpr::named("time.Time"));
        assert_eq!(parse("any"), TypeExpr::Interface);
        assert_eq!(parse("interface{ }"), TypeExpr::Interface);
    }

    #[test]
    fn parses_inline_struct() {
        let expr = parse("struct{ Name string `json:\"name\"`; Tags []string }");
        assert_eq!(
            expr,
            TypeExpr::Struct(vec![
                ("Name".to_string(), TypeExpr::named("string")),
                ("Tags".to_string(), TypeExpr::Slice(Box::new(TypeExpr::named("string")))),
            ])
        );
        assert_eq!(expr.to_string(), "struct{ Name string; Tags []string }");
    }

    #[test]
    fn display_matches_input_for_simple_forms() {
        for src in ["*Item", "[]string", "map[string]*Node", "pkg.Type", "interface{}"] {
            assert_eq!(parse(src).to_string(), src);
        }
    }

    #[test]
    fn rejects_unsupported_and_garbage() {
        assert!("chan int".parse::<TypeExpr>().is_err());
        assert!("func()".parse::<TypeExpr>().is_err());
        assert!("".parse::<TypeExpr>().is_err());
        assert!("map[string".parse::<TypeExpr>().is_err());
        assert!("Item extra".parse::<TypeExpr>().is_err());
        assert!("pkg..Type".parse::<TypeExpr>().is_err());
    }

    #[test]
    fn error_shape_detection() {
        assert!(parse("error").is_error());
        assert!(!parse("*error").is_error());
    }

    #[test]
    fn deserializes_from_json_string() {
        let expr: TypeExpr = serde_json::from_str("\"[]Item\"").unwrap();
        assert_eq!(expr, TypeExpr::Slice(Box::new(TypeExpr::named("Item"))));
        assert!(serde_json::from_str::<TypeExpr>("\"chan int\"").is_err());
    }
}
