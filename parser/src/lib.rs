//! Parsing library for [`postform`](https://github.com/postform-rs/postform) format strings.
//!
//! Postform format strings are printf-style: a specifier is `%`, an optional
//! size modifier (`hh`, `h`, `l`, `ll`), and a conversion character
//! (`s`, `d`, `i`, `u`, `o`, `x`, `p`, `k`). `%%` escapes a literal percent
//! sign. Everything else after a `%` is an error; the log macros turn those
//! errors into compile errors, so validation is deliberately conservative.

use std::borrow::Cow;

mod types;


pub use types::{Type, Width};

/// Log level of a postform message.
///
/// Each level owns one linker section of interned strings; the host decoder
/// recovers the level of a record from the section its format string lives in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
}

impl Level {
    /// Lowercase name, also the suffix of the `.interned_strings.*` section.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
        }
    }
}

/// A `%` specifier found in a format string, in source order.
#[derive(Clone, Debug, PartialEq)]
pub struct Parameter {
    /// The type of the argument consumed by this specifier.
    pub ty: Type,
    /// Byte offset of the `%` within the format string.
    pub position: usize,
}

/// Parses a format string into the list of parameters its arguments must
/// match, one per specifier, in order.
pub fn parse(format_string: &str) -> Result<Vec<Parameter>, Cow<'static, str>> {
    let mut params = vec![];
    let bytes = format_string.as_bytes();
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] != b'%' {
            i += 1;
            continue;
        }

        let position = i;
        i += 1;

        if bytes[i..].starts_with(b"%") {
            i += 1;
            continue;
        }

        let width = if bytes[i..].starts_with(b"hh") {
            i += 2;
            Some(Width::Char)
        } else if bytes[i..].starts_with(b"ll") {
            i += 2;
            Some(Width::LongLong)
        } else if bytes[i..].starts_with(b"h") {
            i += 1;
            Some(Width::Short)
        } else if bytes[i..].starts_with(b"l") {
            i += 1;
            Some(Width::Long)
        } else {
            None
        };

        let conversion = match bytes.get(i) {
            Some(&c) => c as char,
            None => return Err("format string ends in the middle of a specifier".into()),
        };
        i += 1;

        let ty = match conversion {
            'd' | 'i' => Type::Signed(width.unwrap_or(Width::Default)),
            'u' => Type::Unsigned(width.unwrap_or(Width::Default)),
            'o' => Type::Octal(width.unwrap_or(Width::Default)),
            'x' => Type::Hex(width.unwrap_or(Width::Default)),
            's' | 'p' | 'k' => {
                if width.is_some() {
                    return Err(format!(
                        "size modifiers are not supported by `%{}`",
                        conversion
                    )
                    .into());
                }
                match conversion {
                    's' => Type::Str,
                    'p' => Type::Pointer,
                    _ => Type::Interned,
                }
            }
            _ => {
                return Err(format!("unknown conversion `%{}`", conversion).into());
            }
        };

        params.push(Parameter { ty, position });
    }

    Ok(params)
}
