//! Template rendering and the lazily rendered message object

use std::fmt;

use once_cell::unsync::OnceCell;
use serde_json::Value;
use thiserror::Error;

use super::format_spec::FormatSpec;
use super::parser::{Accessor, Conversion, ParsedTemplate, Piece, ReplacementField};

/// Values available to a template, keyed by root arg-name
pub type ArgMap = serde_json::Map<String, Value>;

/// Errors raised while substituting values into a template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    #[error("no value for {0:?}")]
    MissingField(String),

    #[error("{field:?} has no {accessor}")]
    MissingAccessor { field: String, accessor: String },

    #[error("can not format {field:?}: {message}")]
    Format { field: String, message: String },
}

/// Plain text form of a value: strings as-is, everything else as compact JSON
pub fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn ascii_repr(value: &Value) -> String {
    let mut escaped = String::new();
    for c in value.to_string().chars() {
        if c.is_ascii() {
            escaped.push(c);
        } else {
            let mut units = [0u16; 2];
            for unit in c.encode_utf16(&mut units) {
                escaped.push_str(&format!("\\u{unit:04x}"));
            }
        }
    }
    escaped
}

fn resolve<'v>(field: &ReplacementField, args: &'v ArgMap) -> Result<&'v Value, RenderError> {
    let mut value = args
        .get(&field.root)
        .ok_or_else(|| RenderError::MissingField(field.root.clone()))?;

    for accessor in &field.accessors {
        let next = match (accessor, value) {
            (Accessor::Attr(name), Value::Object(map)) => map.get(name),
            (Accessor::Index(key), Value::Array(items)) => {
                key.parse::<usize>().ok().and_then(|i| items.get(i))
            }
            (Accessor::Index(key), Value::Object(map)) => map.get(key),
            _ => None,
        };
        value = next.ok_or_else(|| RenderError::MissingAccessor {
            field: field.field_name(),
            accessor: accessor.to_string(),
        })?;
    }
    Ok(value)
}

fn render_field(field: &ReplacementField, args: &ArgMap) -> Result<String, RenderError> {
    let value = resolve(field, args)?;
    let format_error = |message| RenderError::Format {
        field: field.field_name(),
        message,
    };

    let assembled;
    let spec = if field.nested_spec.is_empty() {
        &field.spec
    } else {
        let text = render_pieces(&field.nested_spec, args)?;
        assembled = FormatSpec::parse(&text).map_err(format_error)?;
        &assembled
    };

    let formatted = match field.conversion {
        None => spec.apply(value, &display_value(value)),
        Some(Conversion::Str) => spec.apply_str(&display_value(value)),
        Some(Conversion::Repr) => spec.apply_str(&value.to_string()),
        Some(Conversion::Ascii) => spec.apply_str(&ascii_repr(value)),
    };
    formatted.map_err(format_error)
}

fn render_pieces(pieces: &[Piece], args: &ArgMap) -> Result<String, RenderError> {
    let mut out = String::new();
    for piece in pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Field(field) => out.push_str(&render_field(field, args)?),
        }
    }
    Ok(out)
}

/// Substitute `args` into a parsed template
pub fn render(template: &ParsedTemplate, args: &ArgMap) -> Result<String, RenderError> {
    render_pieces(template.pieces(), args)
}

/// A log message whose text is produced on first use
///
/// The argument builder runs at most once, and only if a sink asks for the
/// text, so sinks that drop a record by level never pay for formatting.
pub struct Message<'a> {
    template: &'a ParsedTemplate,
    builder: Box<dyn Fn() -> ArgMap + 'a>,
    rendered: OnceCell<String>,
}

impl<'a> Message<'a> {
    pub fn new(template: &'a ParsedTemplate, builder: impl Fn() -> ArgMap + 'a) -> Self {
        Self {
            template,
            builder: Box::new(builder),
            rendered: OnceCell::new(),
        }
    }

    pub fn template(&self) -> &str {
        self.template.source()
    }

    /// Render the message, or return the cached text
    pub fn text(&self) -> &str {
        self.rendered.get_or_init(|| {
            let args = (self.builder)();
            render(self.template, &args).unwrap_or_else(|err| {
                tracing::warn!(template = self.template.source(), error = %err, "failed to render log message");
                format!("<unrenderable message {:?}: {err}>", self.template.source())
            })
        })
    }

    /// Whether the text has been produced already
    pub fn is_rendered(&self) -> bool {
        self.rendered.get().is_some()
    }
}

impl fmt::Display for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.text())
    }
}

impl fmt::Debug for Message<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Message")
            .field("template", &self.template.source())
            .field("rendered", &self.rendered.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::parse_template;
    use serde_json::json;
    use std::cell::Cell;

    fn args(value: Value) -> ArgMap {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    fn render_str(template: &str, value: Value) -> Result<String, RenderError> {
        render(&parse_template(template).unwrap(), &args(value))
    }

    #[test]
    fn test_render_simple_fields() {
        let text = render_str("The {bar} is a {baz}!", json!({"bar": "cake", "baz": "lie"})).unwrap();
        assert_eq!(text, "The cake is a lie!");
    }

    #[test]
    fn test_render_accessors() {
        let fixture = json!({
            "@traceback": [["src/lib.rs", 3, "foo"]],
            "@logger": {"name": "tests"},
            "bar": {"0": "zero", "items": [1, 2]},
        });
        assert_eq!(render_str("{@traceback[0][2]}", fixture.clone()).unwrap(), "foo");
        assert_eq!(render_str("{@logger.name}", fixture.clone()).unwrap(), "tests");
        assert_eq!(render_str("{bar[0]} {bar.items[1]}", fixture).unwrap(), "zero 2");
    }

    #[test]
    fn test_render_non_strings_as_json() {
        let text = render_str("{bar} is a {baz}", json!({"bar": ["super", "cali"], "baz": {"a": 1}})).unwrap();
        assert_eq!(text, r#"["super","cali"] is a {"a":1}"#);
    }

    #[test]
    fn test_render_conversions() {
        let fixture = json!({"bar": "café"});
        assert_eq!(render_str("{bar!s}", fixture.clone()).unwrap(), "café");
        assert_eq!(render_str("{bar!r}", fixture.clone()).unwrap(), "\"café\"");
        assert_eq!(render_str("{bar!a}", fixture.clone()).unwrap(), "\"caf\\u00e9\"");
        assert_eq!(render_str("{bar!r:>8}", fixture).unwrap(), "  \"café\"");
    }

    #[test]
    fn test_render_spec_with_fields() {
        let fixture = json!({"bar": 3.14159, "width": 8, "digits": 2, "fill": "*"});
        assert_eq!(render_str("[{bar:>{width}.{digits}f}]", fixture.clone()).unwrap(), "[    3.14]");
        assert_eq!(render_str("{bar:{fill}<{width}.1f}", fixture.clone()).unwrap(), "3.1*****");
        assert!(matches!(
            render_str("{bar:{fill}}", fixture),
            Err(RenderError::Format { .. })
        ));
    }

    #[test]
    fn test_render_errors() {
        assert_eq!(
            render_str("{bar}", json!({})),
            Err(RenderError::MissingField("bar".into()))
        );
        assert!(matches!(
            render_str("{bar.baz}", json!({"bar": "x"})),
            Err(RenderError::MissingAccessor { .. })
        ));
        assert!(matches!(
            render_str("{bar:d}", json!({"bar": "x"})),
            Err(RenderError::Format { .. })
        ));
    }

    #[test]
    fn test_message_renders_once_and_lazily() {
        let parsed = parse_template("{bar}").unwrap();
        let calls = Cell::new(0);
        let message = Message::new(&parsed, || {
            calls.set(calls.get() + 1);
            args(json!({"bar": "cake"}))
        });

        assert_eq!(calls.get(), 0);
        assert!(!message.is_rendered());
        assert_eq!(message.to_string(), "cake");
        assert_eq!(message.text(), "cake");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn test_message_with_render_failure_degrades() {
        let parsed = parse_template("{bar.baz}").unwrap();
        let message = Message::new(&parsed, || args(json!({"bar": 1})));
        assert!(message.text().starts_with("<unrenderable message \"{bar.baz}\""));
    }
}
