//! printf-style template substitution.
//!
//! Supports the conversions `d i u f F e E g G x X o c s %` with the flags
//! `-+ 0#`, a field width and a precision. C length modifiers (`l`, `ll`,
//! `z` and the like) are accepted and ignored. A placeholder without a matching
//! argument is copied to the output unchanged; surplus arguments are
//! ignored.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;
use std::fmt;
use std::path::Path;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"%([-+ 0#]*)(\d+)?(?:\.(\d+))?(?:hh|h|ll|l|j|z|t|L)?([diufFeEgGxXocs%])").expect("valid placeholder regex")
});

/// One positional argument of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatArg<'a> {
    /// Signed integer
    Int(i64),
    /// Unsigned integer
    UInt(u64),
    /// Floating point
    Float(f64),
    /// Single character
    Char(char),
    /// Text
    Str(Cow<'a, str>),
}

macro_rules! format_arg_from {
    ($variant:ident as $target:ty: $($source:ty),*) => {
        $(
            impl From<$source> for FormatArg<'_> {
                fn from(value: $source) -> Self {
                    FormatArg::$variant(value as $target)
                }
            }
        )*
    };
}

format_arg_from!(Int as i64: i8, i16, i32, i64, isize);
format_arg_from!(UInt as u64: u8, u16, u32, u64, usize);
format_arg_from!(Float as f64: f32, f64);

impl From<char> for FormatArg<'_> {
    fn from(value: char) -> Self {
        FormatArg::Char(value)
    }
}

impl From<bool> for FormatArg<'_> {
    fn from(value: bool) -> Self {
        FormatArg::Int(i64::from(value))
    }
}

impl<'a> From<&'a str> for FormatArg<'a> {
    fn from(value: &'a str) -> Self {
        FormatArg::Str(Cow::Borrowed(value))
    }
}

impl<'a> From<&'a String> for FormatArg<'a> {
    fn from(value: &'a String) -> Self {
        FormatArg::Str(Cow::Borrowed(value.as_str()))
    }
}

impl From<String> for FormatArg<'_> {
    fn from(value: String) -> Self {
        FormatArg::Str(Cow::Owned(value))
    }
}

impl<'a> From<&'a Path> for FormatArg<'a> {
    fn from(value: &'a Path) -> Self {
        FormatArg::Str(value.to_string_lossy())
    }
}

impl FormatArg<'_> {
    fn as_i64(&self) -> i64 {
        match self {
            FormatArg::Int(i) => *i,
            FormatArg::UInt(u) => *u as i64,
            FormatArg::Float(f) => *f as i64,
            FormatArg::Char(c) => *c as i64,
            FormatArg::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }

    fn as_f64(&self) -> f64 {
        match self {
            FormatArg::Int(i) => *i as f64,
            FormatArg::UInt(u) => *u as f64,
            FormatArg::Float(f) => *f,
            FormatArg::Char(c) => f64::from(*c as u32),
            FormatArg::Str(s) => s.trim().parse().unwrap_or(0.0),
        }
    }
}

impl fmt::Display for FormatArg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormatArg::Int(i) => write!(f, "{}", i),
            FormatArg::UInt(u) => write!(f, "{}", u),
            FormatArg::Float(x) => write!(f, "{}", x),
            FormatArg::Char(c) => write!(f, "{}", c),
            FormatArg::Str(s) => f.write_str(s),
        }
    }
}

/// Build a `[FormatArg; N]` from heterogeneous values.
///
/// ```
/// use keel_core::args;
/// use keel_core::log::printf::sprintf;
///
/// assert_eq!(sprintf("%d + %d == %s ?", &args![1, 1, "two"]), "1 + 1 == two ?");
/// ```
#[macro_export]
macro_rules! args {
    ($($arg:expr),* $(,)?) => {
        [$($crate::log::FormatArg::from($arg)),*]
    };
}

struct Spec<'c> {
    flags: &'c str,
    width: usize,
    precision: Option<usize>,
}

impl Spec<'_> {
    fn has(&self, flag: char) -> bool {
        self.flags.contains(flag)
    }

    /// Pad `sign + prefix + body` to the field width.
    fn pad(&self, sign: &str, prefix: &str, body: &str, numeric: bool) -> String {
        let len = sign.len() + prefix.len() + body.chars().count();
        if len >= self.width {
            return format!("{}{}{}", sign, prefix, body);
        }
        let fill = self.width - len;
        if self.has('-') {
            format!("{}{}{}{}", sign, prefix, body, " ".repeat(fill))
        } else if numeric && self.has('0') {
            format!("{}{}{}{}", sign, prefix, "0".repeat(fill), body)
        } else {
            format!("{}{}{}{}", " ".repeat(fill), sign, prefix, body)
        }
    }

    fn sign(&self, negative: bool) -> &'static str {
        if negative {
            "-"
        } else if self.has('+') {
            "+"
        } else if self.has(' ') {
            " "
        } else {
            ""
        }
    }
}

/// Substitute `args` into `template`.
pub fn sprintf(template: &str, args: &[FormatArg<'_>]) -> String {
    let mut next = 0;
    PLACEHOLDER
        .replace_all(template, |caps: &Captures<'_>| {
            let conversion = caps[4].chars().next().unwrap_or('s');
            if conversion == '%' {
                return "%".to_string();
            }
            let Some(arg) = args.get(next) else {
                return caps[0].to_string();
            };
            next += 1;

            let spec = Spec {
                flags: caps.get(1).map_or("", |m| m.as_str()),
                width: caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(0),
                precision: caps.get(3).and_then(|m| m.as_str().parse().ok()),
            };
            convert(conversion, &spec, arg)
        })
        .into_owned()
}

fn convert(conversion: char, spec: &Spec<'_>, arg: &FormatArg<'_>) -> String {
    match conversion {
        'd' | 'i' => {
            let value = arg.as_i64();
            spec.pad(spec.sign(value < 0), "", &value.unsigned_abs().to_string(), true)
        }
        'u' => {
            let value = match arg {
                FormatArg::UInt(u) => *u,
                other => other.as_i64() as u64,
            };
            spec.pad("", "", &value.to_string(), true)
        }
        'x' | 'X' | 'o' => {
            let value = arg.as_i64() as u64;
            let (body, prefix) = match conversion {
                'x' => (format!("{:x}", value), "0x"),
                'X' => (format!("{:X}", value), "0X"),
                _ => (format!("{:o}", value), "0"),
            };
            let prefix = if spec.has('#') && value != 0 { prefix } else { "" };
            spec.pad("", prefix, &body, true)
        }
        'f' | 'F' => {
            let value = arg.as_f64();
            let body = format!("{:.*}", spec.precision.unwrap_or(6), value.abs());
            spec.pad(spec.sign(value.is_sign_negative()), "", &body, true)
        }
        'e' | 'E' => {
            let value = arg.as_f64();
            let body = exponential(value.abs(), spec.precision.unwrap_or(6), conversion == 'E');
            spec.pad(spec.sign(value.is_sign_negative()), "", &body, true)
        }
        'g' | 'G' => {
            let value = arg.as_f64();
            let body = general(value.abs(), spec, conversion == 'G');
            spec.pad(spec.sign(value.is_sign_negative()), "", &body, true)
        }
        'c' => {
            let c = match arg {
                FormatArg::Char(c) => *c,
                FormatArg::Str(s) => s.chars().next().unwrap_or(' '),
                other => char::from_u32(other.as_i64() as u32).unwrap_or('?'),
            };
            spec.pad("", "", &c.to_string(), false)
        }
        _ => {
            let text = arg.to_string();
            let text = match spec.precision {
                Some(p) => text.chars().take(p).collect(),
                None => text,
            };
            spec.pad("", "", &text, false)
        }
    }
}

/// C-style `%e` body: mantissa, `e`, sign, at least two exponent digits.
fn exponential(value: f64, precision: usize, upper: bool) -> String {
    let rendered = format!("{:.*e}", precision, value);
    let (mantissa, exponent) = rendered.split_once('e').unwrap_or((&rendered, "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let e = if upper { 'E' } else { 'e' };
    format!("{}{}{}{:02}", mantissa, e, sign, exponent.abs())
}

/// C-style `%g` body.
fn general(value: f64, spec: &Spec<'_>, upper: bool) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    let precision = match spec.precision {
        Some(0) => 1,
        Some(p) => p,
        None => 6,
    };
    let exponent = if value == 0.0 {
        0
    } else {
        // Exponent after rounding to the requested significant digits.
        let rendered = format!("{:.*e}", precision - 1, value);
        rendered
            .split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };

    let body = if exponent < -4 || exponent >= precision as i32 {
        exponential(value, precision - 1, upper)
    } else {
        let decimals = (precision as i32 - 1 - exponent).max(0) as usize;
        format!("{:.*}", decimals, value)
    };

    if spec.has('#') {
        body
    } else {
        strip_trailing_zeros(&body)
    }
}

fn strip_trailing_zeros(body: &str) -> String {
    let (number, exponent) = match body.find(|c| c == 'e' || c == 'E') {
        Some(idx) => body.split_at(idx),
        None => (body, ""),
    };
    if !number.contains('.') {
        return body.to_string();
    }
    let trimmed = number.trim_end_matches('0').trim_end_matches('.');
    format!("{}{}", trimmed, exponent)
}
