//! Format spec mini-language
//!
//! Supported grammar: `[[fill]align][sign][#][0][width][,|_][.precision][type]`
//! with align in `< > ^ =`, sign in `+ - space`, and type one of
//! `s d n c x X o b f F e E g G %`. `n` uses no locale: it formats like `d`
//! for integers and like `g` for floats.

use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Right,
    Center,
    /// Padding goes between the sign and the digits
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Plus,
    Minus,
    Space,
}

/// A parsed format spec
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormatSpec {
    pub fill: Option<char>,
    pub align: Option<Align>,
    pub sign: Option<Sign>,
    pub alternate: bool,
    pub zero_pad: bool,
    pub width: Option<usize>,
    pub grouping: Option<char>,
    pub precision: Option<usize>,
    pub kind: Option<char>,
}

const KINDS: &str = "sdncxXobfFeEgG%";

/// Widths and precisions past this panic in `format!`
const MAX_NUMBER: usize = u16::MAX as usize;

fn align_from(c: char) -> Option<Align> {
    match c {
        '<' => Some(Align::Left),
        '>' => Some(Align::Right),
        '^' => Some(Align::Center),
        '=' => Some(Align::AfterSign),
        _ => None,
    }
}

impl FormatSpec {
    pub fn is_empty(&self) -> bool {
        *self == FormatSpec::default()
    }

    pub fn parse(spec: &str) -> Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut parsed = FormatSpec::default();
        let mut i = 0;

        if chars.len() >= 2 && align_from(chars[1]).is_some() {
            parsed.fill = Some(chars[0]);
            parsed.align = align_from(chars[1]);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|c| align_from(*c)) {
            parsed.align = Some(align);
            i = 1;
        }

        if let Some(c) = chars.get(i) {
            let sign = match c {
                '+' => Some(Sign::Plus),
                '-' => Some(Sign::Minus),
                ' ' => Some(Sign::Space),
                _ => None,
            };
            if sign.is_some() {
                parsed.sign = sign;
                i += 1;
            }
        }

        if chars.get(i) == Some(&'#') {
            parsed.alternate = true;
            i += 1;
        }

        if chars.get(i) == Some(&'0') {
            parsed.zero_pad = true;
            i += 1;
        }

        let (width, next) = read_number(&chars, i)?;
        parsed.width = width;
        i = next;

        if let Some(c @ (',' | '_')) = chars.get(i) {
            parsed.grouping = Some(*c);
            i += 1;
        }

        if chars.get(i) == Some(&'.') {
            let (precision, next) = read_number(&chars, i + 1)?;
            if precision.is_none() {
                return Err("Format specifier missing precision".to_string());
            }
            parsed.precision = precision;
            i = next;
        }

        match &chars[i..] {
            [] => {}
            [kind] if KINDS.contains(*kind) => parsed.kind = Some(*kind),
            _ => return Err(format!("Invalid format specifier {spec:?}")),
        }

        Ok(parsed)
    }

    /// Format an already converted string
    pub fn apply_str(&self, text: &str) -> Result<String, String> {
        if let Some(kind) = self.kind.filter(|k| *k != 's') {
            return Err(format!("Unknown format code '{kind}' for a string"));
        }
        if self.sign.is_some() {
            return Err("Sign not allowed in string format specifier".to_string());
        }
        if self.align == Some(Align::AfterSign) {
            return Err("'=' alignment not allowed in string format specifier".to_string());
        }
        let body: String = match self.precision {
            Some(p) => text.chars().take(p).collect(),
            None => text.to_string(),
        };
        Ok(self.pad("", &body, Align::Left))
    }

    /// Format a value; `display` is its plain text form
    pub fn apply(&self, value: &Value, display: &str) -> Result<String, String> {
        match value {
            Value::Number(number) if self.kind != Some('s') => {
                if let Some(int) = number.as_i64() {
                    self.apply_int(int as i128)
                } else if let Some(int) = number.as_u64() {
                    self.apply_int(int as i128)
                } else {
                    self.apply_float(number.as_f64().unwrap_or(f64::NAN), display)
                }
            }
            _ => self.apply_str(display),
        }
    }

    fn apply_int(&self, value: i128) -> Result<String, String> {
        let magnitude = value.unsigned_abs();
        let digits = match self.kind {
            None | Some('d' | 'n') => group(&magnitude.to_string(), self.grouping),
            Some('c') => {
                if self.sign.is_some() {
                    return Err("Sign not allowed with integer format specifier 'c'".to_string());
                }
                let c = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| "%c arg not in range(0x110000)".to_string())?;
                return Ok(self.pad("", &c.to_string(), Align::Right));
            }
            Some('x') => format!("{}{magnitude:x}", if self.alternate { "0x" } else { "" }),
            Some('X') => format!("{}{magnitude:X}", if self.alternate { "0X" } else { "" }),
            Some('o') => format!("{}{magnitude:o}", if self.alternate { "0o" } else { "" }),
            Some('b') => format!("{}{magnitude:b}", if self.alternate { "0b" } else { "" }),
            Some(_) => return self.apply_float(value as f64, ""),
        };
        Ok(self.pad(self.sign_str(value < 0), &digits, Align::Right))
    }

    fn apply_float(&self, value: f64, display: &str) -> Result<String, String> {
        if let Some(kind @ ('d' | 'c' | 'x' | 'X' | 'o' | 'b')) = self.kind {
            return Err(format!("Unknown format code '{kind}' for a float"));
        }
        let negative = value.is_sign_negative() && value != 0.0;
        let magnitude = value.abs();

        let body = if !magnitude.is_finite() {
            let text = if magnitude.is_nan() { "nan" } else { "inf" };
            match self.kind {
                Some('F' | 'E' | 'G') => text.to_uppercase(),
                _ => text.to_string(),
            }
        } else {
            match (self.kind, self.precision) {
                (None, None) => display.trim_start_matches('-').to_string(),
                (Some('f' | 'F'), p) => fixed(magnitude, p.unwrap_or(6), self.grouping),
                (Some('%'), p) => format!("{}%", fixed(magnitude * 100.0, p.unwrap_or(6), self.grouping)),
                (Some(kind @ ('e' | 'E')), p) => scientific(magnitude, p.unwrap_or(6), kind == 'E'),
                (Some(kind @ ('g' | 'G' | 'n')), p) => general(magnitude, p.unwrap_or(6), kind == 'G', self.alternate),
                (None, Some(p)) => general(magnitude, p, false, self.alternate),
                (Some(kind), _) => return Err(format!("Unknown format code '{kind}' for a float")),
            }
        };
        Ok(self.pad(self.sign_str(negative), &body, Align::Right))
    }

    fn sign_str(&self, negative: bool) -> &'static str {
        match (negative, self.sign) {
            (true, _) => "-",
            (false, Some(Sign::Plus)) => "+",
            (false, Some(Sign::Space)) => " ",
            (false, _) => "",
        }
    }

    fn pad(&self, sign: &str, body: &str, default_align: Align) -> String {
        let (fill, align) = match (self.fill, self.align) {
            (fill, Some(align)) => (fill.unwrap_or(' '), align),
            (_, None) if self.zero_pad && default_align == Align::Right => ('0', Align::AfterSign),
            (_, None) => (' ', default_align),
        };

        let len = sign.chars().count() + body.chars().count();
        let missing = self.width.unwrap_or(0).saturating_sub(len);
        let padding = |n: usize| std::iter::repeat(fill).take(n).collect::<String>();

        match align {
            Align::Left => format!("{sign}{body}{}", padding(missing)),
            Align::Right => format!("{}{sign}{body}", padding(missing)),
            Align::Center => {
                let left = missing / 2;
                format!("{}{sign}{body}{}", padding(left), padding(missing - left))
            }
            Align::AfterSign => format!("{sign}{}{body}", padding(missing)),
        }
    }
}

fn read_number(chars: &[char], mut i: usize) -> Result<(Option<usize>, usize), String> {
    let start = i;
    while i < chars.len() && chars[i].is_ascii_digit() {
        i += 1;
    }
    if i == start {
        return Ok((None, i));
    }
    let text: String = chars[start..i].iter().collect();
    match text.parse::<usize>() {
        Ok(number) if number <= MAX_NUMBER => Ok((Some(number), i)),
        _ => Err("Too many decimal digits in format string".to_string()),
    }
}

/// Insert a separator every three digits of the integer part
fn group(digits: &str, separator: Option<char>) -> String {
    let Some(separator) = separator else {
        return digits.to_string();
    };
    let (integer, rest) = match digits.find('.') {
        Some(dot) => digits.split_at(dot),
        None => (digits, ""),
    };
    let mut grouped = String::new();
    for (i, c) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

fn fixed(value: f64, precision: usize, grouping: Option<char>) -> String {
    group(&format!("{value:.precision$}"), grouping)
}

fn scientific(value: f64, precision: usize, upper: bool) -> String {
    let rendered = format!("{value:.precision$e}");
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let text = format!("{mantissa}e{sign}{:02}", exponent.abs());
    if upper {
        text.to_uppercase()
    } else {
        text
    }
}

fn general(value: f64, precision: usize, upper: bool, keep_zeros: bool) -> String {
    let precision = precision.max(1);
    if value == 0.0 {
        let digits = precision - 1;
        return if keep_zeros {
            format!("{:.digits$}", 0.0)
        } else {
            "0".to_string()
        };
    }

    let digits = precision - 1;
    let rounded = format!("{value:.digits$e}");
    let exponent: i32 = rounded
        .split_once('e')
        .and_then(|(_, e)| e.parse().ok())
        .unwrap_or(0);

    let text = if exponent >= -4 && exponent < precision as i32 {
        let decimals = ((precision as i32 - 1 - exponent).max(0) as usize).min(MAX_NUMBER);
        let text = format!("{value:.decimals$}");
        if keep_zeros {
            text
        } else {
            strip_zeros(&text)
        }
    } else {
        let text = scientific(value, precision - 1, false);
        match text.split_once('e') {
            Some((mantissa, exp)) if !keep_zeros => format!("{}e{exp}", strip_zeros(mantissa)),
            _ => text,
        }
    };

    if upper {
        text.to_uppercase()
    } else {
        text
    }
}

fn strip_zeros(text: &str) -> String {
    if text.contains('.') {
        text.trim_end_matches('0').trim_end_matches('.').to_string()
    } else {
        text.to_string()
    }
}
