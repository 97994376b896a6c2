//! Simplified tracebacks for the `@traceback` arg-name
//!
//! A traceback is a list of `(file, line, function)` frames. The first frame
//! is always the guarded function itself; the rest come from a backtrace
//! captured where the guard intercepts the error, innermost first. Symbol
//! resolution depends on the platform and build profile, so anything past
//! the first frame is best-effort.

use std::backtrace::Backtrace;

use serde::Serialize;
use serde_json::{json, Value};

const CAPTURE_PREFIXES: [&str; 3] = ["std::backtrace", "dogging_core::traceback::Traceback", "<unknown>"];

/// One frame of a simplified traceback
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TraceFrame {
    pub file: String,
    pub line: u32,
    pub function: String,
}

impl TraceFrame {
    pub fn new(file: impl Into<String>, line: u32, function: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            line,
            function: function.into(),
        }
    }

    pub fn to_value(&self) -> Value {
        json!([self.file, self.line, self.function])
    }
}

/// An ordered, restartable list of frames
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Traceback {
    frames: Vec<TraceFrame>,
}

impl Traceback {
    pub fn new(frames: Vec<TraceFrame>) -> Self {
        Self { frames }
    }

    /// Capture the current stack, starting with `origin`
    ///
    /// `boundary` is the symbol prefix of the frames that intercepted the
    /// error, see [`Traceback::from_backtrace_text`].
    pub fn capture(origin: TraceFrame, boundary: &str) -> Self {
        let backtrace = Backtrace::force_capture();
        let mut traceback = Self::from_backtrace_text(&backtrace.to_string(), boundary);
        traceback.frames.insert(0, origin);
        traceback
    }

    /// Parse the standard backtrace rendering, short or full
    ///
    /// Everything up to and including the first run of frames whose symbol
    /// starts with `boundary` is dropped. When no such frame can be found
    /// (inlined, or no symbols), only the capture machinery is dropped.
    pub fn from_backtrace_text(text: &str, boundary: &str) -> Self {
        let frames = parse_frames(text);
        let is_boundary = |frame: &TraceFrame| {
            frame
                .function
                .trim_start_matches('<')
                .starts_with(boundary)
        };

        let frames = match frames.iter().position(|f| is_boundary(f)) {
            Some(first) => frames
                .into_iter()
                .skip(first)
                .skip_while(|f| is_boundary(f))
                .collect(),
            None => frames
                .into_iter()
                .skip_while(|f| CAPTURE_PREFIXES.iter().any(|p| f.function.starts_with(p)))
                .collect(),
        };
        Self { frames }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TraceFrame> {
        self.frames.iter()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn to_value(&self) -> Value {
        Value::Array(self.frames.iter().map(TraceFrame::to_value).collect())
    }
}

impl<'a> IntoIterator for &'a Traceback {
    type Item = &'a TraceFrame;
    type IntoIter = std::slice::Iter<'a, TraceFrame>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl From<&Traceback> for Value {
    fn from(traceback: &Traceback) -> Self {
        traceback.to_value()
    }
}

fn parse_frames(text: &str) -> Vec<TraceFrame> {
    let mut frames: Vec<TraceFrame> = Vec::new();
    for line in text.lines() {
        let trimmed = line.trim();
        if let Some(location) = trimmed.strip_prefix("at ") {
            if let Some(frame) = frames.last_mut() {
                if frame.line == 0 {
                    let (file, line) = split_location(location);
                    frame.file = file;
                    frame.line = line;
                }
            }
        } else if let Some((index, function)) = trimmed.split_once(": ") {
            if !index.is_empty() && index.bytes().all(|b| b.is_ascii_digit()) {
                frames.push(TraceFrame::new("<unknown>", 0, symbol_name(function.trim())));
            }
        }
    }
    frames
}

/// Symbol without the full format's address prefix and hash suffix
fn symbol_name(function: &str) -> &str {
    let function = match function.split_once(" - ") {
        Some((address, rest)) if address.starts_with("0x") => rest,
        _ => function,
    };
    match function.rsplit_once("::") {
        Some((path, hash))
            if hash.len() == 17
                && hash.starts_with('h')
                && hash[1..].bytes().all(|b| b.is_ascii_hexdigit()) =>
        {
            path
        }
        _ => function,
    }
}

/// Split `path:line:column` into the path and line
fn split_location(location: &str) -> (String, u32) {
    let mut parts = location.rsplitn(3, ':');
    let column = parts.next();
    let line = parts.next();
    let path = parts.next();
    match (path, line, column) {
        (Some(path), Some(line), Some(_)) => match line.parse() {
            Ok(line) => (path.to_string(), line),
            Err(_) => (location.to_string(), 0),
        },
        _ => (location.to_string(), 0),
    }
}
