//! Default decoder for quoted values and its inverse.
//!
//! [`unquote`] receives the whole quoted span, delimiters included, and
//! understands the usual string-literal escapes. [`quote`] produces a
//! double-quoted literal that [`unquote`] decodes back to the same text.

use std::fmt::Write as _;

use crate::error::UnquoteError;

/// Signature of a pluggable unquote strategy.
pub type UnquoteFn = fn(&str) -> Result<String, UnquoteError>;

/// Decode a quoted literal such as `"a\tb"`, `'x'` or `` `raw` ``.
pub fn unquote(input: &str) -> Result<String, UnquoteError> {
    let mut chars = input.chars();
    let (Some(open), Some(close)) = (chars.next(), chars.next_back()) else {
        return Err(UnquoteError::MissingDelimiters);
    };
    if open != close || !matches!(open, '"' | '\'' | '`') {
        return Err(UnquoteError::MissingDelimiters);
    }

    let body = &input[open.len_utf8()..input.len() - close.len_utf8()];

    if open == '`' {
        if body.contains('`') {
            return Err(UnquoteError::UnescapedQuote('`'));
        }
        return Ok(body.replace('\r', ""));
    }

    if body.contains('\n') {
        return Err(UnquoteError::Newline);
    }
    if open == '"' && !body.contains(['\\', '"']) {
        return Ok(body.to_owned());
    }

    let decoded = decode_escapes(body, open)?;
    if open == '\'' && decoded.chars().count() != 1 {
        return Err(UnquoteError::NotSingleChar);
    }
    Ok(decoded)
}

fn decode_escapes(body: &str, delimiter: char) -> Result<String, UnquoteError> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars();

    while let Some(ch) = chars.next() {
        if ch == delimiter {
            return Err(UnquoteError::UnescapedQuote(ch));
        }
        if ch != '\\' {
            push_char(&mut out, ch);
            continue;
        }

        let escape = chars.next().ok_or(UnquoteError::TruncatedEscape)?;
        match escape {
            'a' => out.push(0x07),
            'b' => out.push(0x08),
            'f' => out.push(0x0c),
            'n' => out.push(b'\n'),
            'r' => out.push(b'\r'),
            't' => out.push(b'\t'),
            'v' => out.push(0x0b),
            '\\' => out.push(b'\\'),
            '"' | '\'' if escape == delimiter => push_char(&mut out, escape),
            'x' => {
                let value = read_hex(&mut chars, 2)?;
                out.push(value as u8);
            }
            'u' | 'U' => {
                let digits = if escape == 'u' { 4 } else { 8 };
                let value = read_hex(&mut chars, digits)?;
                let ch = char::from_u32(value).ok_or(UnquoteError::InvalidCodePoint(value))?;
                push_char(&mut out, ch);
            }
            '0'..='7' => {
                let mut value = escape.to_digit(8).unwrap_or_default();
                for _ in 0..2 {
                    let digit = chars
                        .next()
                        .and_then(|ch| ch.to_digit(8))
                        .ok_or(UnquoteError::TruncatedEscape)?;
                    value = value * 8 + digit;
                }
                if value > 0o377 {
                    return Err(UnquoteError::OctalOverflow(value));
                }
                out.push(value as u8);
            }
            other => return Err(UnquoteError::UnknownEscape(other)),
        }
    }

    String::from_utf8(out).map_err(|_| UnquoteError::InvalidUtf8)
}

fn read_hex(chars: &mut std::str::Chars<'_>, digits: usize) -> Result<u32, UnquoteError> {
    let mut value = 0u32;
    for _ in 0..digits {
        let digit = chars
            .next()
            .and_then(|ch| ch.to_digit(16))
            .ok_or(UnquoteError::TruncatedEscape)?;
        value = value * 16 + digit;
    }
    Ok(value)
}

fn push_char(out: &mut Vec<u8>, ch: char) {
    let mut buf = [0u8; 4];
    out.extend_from_slice(ch.encode_utf8(&mut buf).as_bytes());
}

/// Encode `value` as a double-quoted literal accepted by [`unquote`].
pub fn quote(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\x0b' => out.push_str("\\v"),
            ch if ch.is_ascii_control() => {
                let _ = write!(out, "\\x{:02x}", ch as u32);
            }
            ch if ch.is_control() => {
                let _ = write!(out, "\\u{:04x}", ch as u32);
            }
            ch => out.push(ch),
        }
    }
    out.push('"');
    out
}
