//! Template parsing
//!
//! Templates use the brace syntax of named format strings:
//! `"The {bar} is a {baz!r:>10}, took {@time:.3f}s"`. Parsing happens once,
//! when a dog is built, so every malformed template is rejected before any
//! guarded call is made.
//!
//! A format spec may itself contain replacement fields, one level deep
//! (`{bar:>{width}}`). Such a spec is only checked once it has been
//! assembled at render time.

use std::fmt;

use super::format_spec::FormatSpec;
use crate::error::{DogError, DogResult};

/// One step of an accessor chain after the root name
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Accessor {
    /// `.name`
    Attr(String),
    /// `[key]`
    Index(String),
}

impl fmt::Display for Accessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Accessor::Attr(name) => write!(f, ".{name}"),
            Accessor::Index(key) => write!(f, "[{key}]"),
        }
    }
}

/// Conversion applied before formatting (`!s`, `!r`, `!a`)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    Str,
    Repr,
    Ascii,
}

impl Conversion {
    fn from_char(c: char) -> Option<Self> {
        match c {
            's' => Some(Conversion::Str),
            'r' => Some(Conversion::Repr),
            'a' => Some(Conversion::Ascii),
            _ => None,
        }
    }
}

/// A `{...}` replacement field
#[derive(Debug, Clone, PartialEq)]
pub struct ReplacementField {
    /// Root name, e.g. `bar` for `{bar.baz[0]}`
    pub root: String,
    pub accessors: Vec<Accessor>,
    pub conversion: Option<Conversion>,
    pub spec: FormatSpec,
    /// Pieces of a spec built from replacement fields; empty when `spec` is fixed
    pub nested_spec: Vec<Piece>,
}

impl ReplacementField {
    /// The full field name as written, without conversion and spec
    pub fn field_name(&self) -> String {
        let mut name = self.root.clone();
        for accessor in &self.accessors {
            name.push_str(&accessor.to_string());
        }
        name
    }

    /// Replacement fields inside the format spec
    pub fn nested_fields(&self) -> impl Iterator<Item = &ReplacementField> {
        fields_of(&self.nested_spec)
    }
}

fn fields_of(pieces: &[Piece]) -> impl Iterator<Item = &ReplacementField> {
    pieces.iter().filter_map(|piece| match piece {
        Piece::Field(field) => Some(field),
        Piece::Literal(_) => None,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    Literal(String),
    Field(ReplacementField),
}

/// A parsed template
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedTemplate {
    source: String,
    pieces: Vec<Piece>,
}

impl ParsedTemplate {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn pieces(&self) -> &[Piece] {
        &self.pieces
    }

    pub fn fields(&self) -> impl Iterator<Item = &ReplacementField> {
        fields_of(&self.pieces)
    }

    /// Root names in order of appearance, repeats and spec fields included
    pub fn field_names(&self) -> Vec<String> {
        self.fields()
            .flat_map(|f| std::iter::once(f).chain(f.nested_fields()))
            .map(|f| f.root.clone())
            .collect()
    }
}

/// Parse a template, rejecting malformed and positional fields
pub fn parse_template(template: &str) -> DogResult<ParsedTemplate> {
    let pieces = Parser::new(template).parse()?;
    let parsed = ParsedTemplate {
        source: template.to_string(),
        pieces,
    };

    if parsed.field_names().iter().any(|name| is_positional(name)) {
        return Err(DogError::positional_field(template));
    }
    Ok(parsed)
}

/// Root names referenced by a template
pub fn field_names(template: &str) -> DogResult<Vec<String>> {
    parse_template(template).map(|parsed| parsed.field_names())
}

/// Whether a root name refers to a positional argument
pub fn is_positional(name: &str) -> bool {
    name.is_empty() || is_int_like(name)
}

/// Whether `s` reads as an integer literal: surrounding whitespace, an
/// optional sign, and digits with single underscores between them
pub fn is_int_like(s: &str) -> bool {
    let s = s.trim();
    let digits = s.strip_prefix(['+', '-']).unwrap_or(s);
    if digits.is_empty() || digits.starts_with('_') || digits.ends_with('_') {
        return false;
    }
    let mut previous_underscore = false;
    for c in digits.chars() {
        match c {
            '_' if previous_underscore => return false,
            '_' => previous_underscore = true,
            c if c.is_ascii_digit() => previous_underscore = false,
            _ => return false,
        }
    }
    true
}

struct Parser<'a> {
    template: &'a str,
    chars: Vec<char>,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(template: &'a str) -> Self {
        Self {
            template,
            chars: template.chars().collect(),
            pos: 0,
        }
    }

    /// A parser for a format spec, reporting errors against the whole template
    fn nested(&self, spec: &str) -> Parser<'a> {
        Self {
            template: self.template,
            chars: spec.chars().collect(),
            pos: 0,
        }
    }

    fn error(&self, message: &str) -> DogError {
        DogError::format_syntax(self.template, message)
    }

    fn parse(mut self) -> DogResult<Vec<Piece>> {
        let mut pieces = Vec::new();
        let mut literal = String::new();

        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            self.pos += 1;
            match c {
                '{' | '}' => {
                    let next = self.chars.get(self.pos).copied();
                    if next == Some(c) {
                        literal.push(c);
                        self.pos += 1;
                        continue;
                    }
                    if c == '}' {
                        return Err(self.error("Single '}' encountered in format string"));
                    }
                    if next.is_none() {
                        return Err(self.error("Single '{' encountered in format string"));
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    let body = self.field_body()?;
                    pieces.push(Piece::Field(self.parse_field(&body)?));
                }
                c => literal.push(c),
            }
        }

        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }
        Ok(pieces)
    }

    /// Everything between a field's `{` and its matching `}`
    fn field_body(&mut self) -> DogResult<Vec<char>> {
        let start = self.pos;
        let mut depth = 1usize;
        while self.pos < self.chars.len() {
            let c = self.chars[self.pos];
            self.pos += 1;
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.chars[start..self.pos - 1].to_vec());
                    }
                }
                _ => {}
            }
        }
        Err(self.error("expected '}' before end of string"))
    }

    fn parse_field(&self, body: &[char]) -> DogResult<ReplacementField> {
        // The name ends at the first ':' or '!' outside of brackets
        let mut i = 0;
        let mut terminator = None;
        while i < body.len() {
            let c = body[i];
            i += 1;
            match c {
                '{' => return Err(self.error("unexpected '{' in field name")),
                '[' => {
                    while i < body.len() && body[i] != ']' {
                        i += 1;
                    }
                }
                ':' | '!' => {
                    terminator = Some(c);
                    break;
                }
                _ => {}
            }
        }

        let name_end = if terminator.is_some() { i - 1 } else { i };
        let field_name: String = body[..name_end].iter().collect();

        let mut conversion = None;
        let mut spec_start = body.len();
        match terminator {
            Some('!') => {
                let Some(&c) = body.get(i) else {
                    // the closing brace is taken as the conversion
                    let message = if self.pos >= self.chars.len() {
                        "unmatched '{' in format spec"
                    } else {
                        "expected ':' after conversion specifier"
                    };
                    return Err(self.error(message));
                };
                i += 1;
                if i < body.len() {
                    if body[i] != ':' {
                        return Err(self.error("expected ':' after conversion specifier"));
                    }
                    i += 1;
                }
                conversion = Some(Conversion::from_char(c).ok_or_else(|| {
                    self.error(&format!("Unknown conversion specifier {c}"))
                })?);
                spec_start = i;
            }
            Some(_) => spec_start = i,
            None => {}
        }

        let spec_text: String = body[spec_start.min(body.len())..].iter().collect();
        let (spec, nested_spec) = if spec_text.contains(['{', '}']) {
            let pieces = self.nested(&spec_text).parse()?;
            if fields_of(&pieces).any(|f| !f.nested_spec.is_empty()) {
                return Err(self.error("Max string recursion exceeded"));
            }
            (FormatSpec::default(), pieces)
        } else {
            let spec = FormatSpec::parse(&spec_text).map_err(|message| self.error(&message))?;
            (spec, Vec::new())
        };

        let (root, accessors) = self.split_field_name(&field_name)?;
        Ok(ReplacementField {
            root,
            accessors,
            conversion,
            spec,
            nested_spec,
        })
    }

    fn split_field_name(&self, field_name: &str) -> DogResult<(String, Vec<Accessor>)> {
        let chars: Vec<char> = field_name.chars().collect();
        let mut i = chars
            .iter()
            .position(|c| *c == '.' || *c == '[')
            .unwrap_or(chars.len());
        let root: String = chars[..i].iter().collect();

        let mut accessors = Vec::new();
        while i < chars.len() {
            let c = chars[i];
            i += 1;
            let accessor = match c {
                '.' => {
                    let start = i;
                    while i < chars.len() && chars[i] != '.' && chars[i] != '[' {
                        i += 1;
                    }
                    Accessor::Attr(chars[start..i].iter().collect())
                }
                '[' => {
                    let start = i;
                    while i < chars.len() && chars[i] != ']' {
                        i += 1;
                    }
                    if i >= chars.len() {
                        return Err(self.error("Missing ']' in format string"));
                    }
                    let key: String = chars[start..i].iter().collect();
                    i += 1;
                    Accessor::Index(key)
                }
                _ => {
                    return Err(self.error(
                        "Only '.' or '[' may follow ']' in format field specifier",
                    ))
                }
            };

            let empty = match &accessor {
                Accessor::Attr(name) => name.is_empty(),
                Accessor::Index(key) => key.is_empty(),
            };
            if empty {
                return Err(self.error("Empty attribute in format string"));
            }
            accessors.push(accessor);
        }

        Ok((root, accessors))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn syntax_error(template: &str) -> String {
        match parse_template(template) {
            Err(DogError::FormatSyntax { message, .. }) => message,
            other => panic!("expected a syntax error for {template:?}, got {other:?}"),
        }
    }

    #[test]
    fn test_field_names_in_order() {
        let names = field_names("The {bar} is a {baz}, {bar.x[0]} and {@ret!r:>10}").unwrap();
        assert_eq!(names, ["bar", "baz", "bar", "@ret"]);
    }

    #[test]
    fn test_plain_text_has_no_fields() {
        assert!(field_names("I am entering").unwrap().is_empty());
        assert!(field_names("").unwrap().is_empty());
        assert!(field_names("{{literal}}").unwrap().is_empty());
    }

    #[test]
    fn test_escapes_become_literals() {
        let parsed = parse_template("a {{b}} {c}").unwrap();
        assert_eq!(parsed.pieces()[0], Piece::Literal("a {b} ".into()));
    }

    #[test]
    fn test_accessor_chain() {
        let parsed = parse_template("{bar.baz[0][key]}").unwrap();
        let field = parsed.fields().next().unwrap();
        assert_eq!(field.root, "bar");
        assert_eq!(
            field.accessors,
            vec![
                Accessor::Attr("baz".into()),
                Accessor::Index("0".into()),
                Accessor::Index("key".into()),
            ]
        );
        assert_eq!(field.field_name(), "bar.baz[0][key]");
    }

    #[test]
    fn test_brackets_may_contain_terminators() {
        let parsed = parse_template("{bar[a:b]!r}").unwrap();
        let field = parsed.fields().next().unwrap();
        assert_eq!(field.accessors, vec![Accessor::Index("a:b".into())]);
        assert_eq!(field.conversion, Some(Conversion::Repr));
    }

    #[test]
    fn test_broken_templates() {
        assert_eq!(syntax_error("abc {bar def"), "expected '}' before end of string");
        assert_eq!(syntax_error("abc bar} def"), "Single '}' encountered in format string");
        assert_eq!(syntax_error("abc {"), "Single '{' encountered in format string");
        assert_eq!(syntax_error("abc {bar[} def"), "Missing ']' in format string");
        assert_eq!(syntax_error("abc {bar.} def"), "Empty attribute in format string");
        assert_eq!(syntax_error("abc {bar[]} def"), "Empty attribute in format string");
        assert_eq!(
            syntax_error("abc {bar!} def"),
            "expected ':' after conversion specifier"
        );
        assert_eq!(syntax_error("abc {bar!}"), "unmatched '{' in format spec");
        assert_eq!(syntax_error("abc {bar!x} def"), "Unknown conversion specifier x");
        assert_eq!(
            syntax_error("abc {bar!rr} def"),
            "expected ':' after conversion specifier"
        );
        assert_eq!(
            syntax_error("{bar[0]x}"),
            "Only '.' or '[' may follow ']' in format field specifier"
        );
        assert_eq!(syntax_error("{b{ar}}"), "unexpected '{' in field name");
        assert_eq!(syntax_error("{bar:.70000f}"), "Too many decimal digits in format string");
    }

    #[test]
    fn test_fields_inside_format_spec() {
        let parsed = parse_template("{bar:>{width}.{digits}f} {baz}").unwrap();
        assert_eq!(parsed.field_names(), ["bar", "width", "digits", "baz"]);

        let field = parsed.fields().next().unwrap();
        assert!(field.spec.is_empty());
        let nested: Vec<&str> = field.nested_fields().map(|f| f.root.as_str()).collect();
        assert_eq!(nested, ["width", "digits"]);
        assert_eq!(field.nested_spec[0], Piece::Literal(">".into()));

        assert_eq!(syntax_error("{bar:{baz:{qux}}}"), "Max string recursion exceeded");
        assert!(matches!(
            parse_template("{bar:{}}"),
            Err(DogError::PositionalField { .. })
        ));
    }

    #[test]
    fn test_positional_fields_rejected() {
        for template in ["what does {0} mean", "what does {} mean", "{ 1 }", "{-2}", "{1_0.x}"] {
            assert!(
                matches!(parse_template(template), Err(DogError::PositionalField { .. })),
                "{template:?} should be positional"
            );
        }
    }

    #[test]
    fn test_syntax_errors_win_over_positional() {
        assert!(matches!(
            parse_template("{0} {bar!x}"),
            Err(DogError::FormatSyntax { .. })
        ));
    }

    #[test]
    fn test_is_int_like() {
        assert!(is_int_like("0"));
        assert!(is_int_like(" +12 "));
        assert!(is_int_like("1_000"));
        assert!(!is_int_like("1__0"));
        assert!(!is_int_like("_1"));
        assert!(!is_int_like("1a"));
        assert!(!is_int_like("-"));
        assert!(!is_int_like("bar"));
    }
}
