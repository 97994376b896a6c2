//! Format templates: parsing, validation and lazy rendering

mod format_spec;
mod parser;
mod render;

pub use format_spec::{Align, FormatSpec, Sign};
pub use parser::{
    field_names, is_int_like, is_positional, parse_template, Accessor, Conversion,
    ParsedTemplate, Piece, ReplacementField,
};
pub use render::{display_value, render, ArgMap, Message, RenderError};
