//! Annotation attributes and the quoted-string reader.
//!
//! Declarations are marked with `__attribute__((annotate(...)))` spellings
//! produced by the macros in `include/reflectgen.h`:
//!
//! - `@leon` is a bare presence marker.
//! - `@leonkv "<key>" "<value>"` is a key/value marker. Both strings use
//!   C-style escape sequences and must be non-empty.

use std::iter::Peekable;
use std::str::Bytes;

use clang::{Entity, EntityKind};

use crate::reflect::ReflectError;

/// A single attribute attached to a declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Attr {
    /// Presence marker (`@leon`).
    Flag,
    /// Key/value marker (`@leonkv`).
    KeyValue { key: String, value: String },
}

impl Attr {
    /// Returns the key/value pair, if this is a key/value attribute.
    pub fn key_value(&self) -> Option<(&str, &str)> {
        match self {
            Attr::Flag => None,
            Attr::KeyValue { key, value } => Some((key, value)),
        }
    }
}

impl serde::Serialize for Attr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;
        let mut map = serializer.serialize_map(None)?;
        if let Attr::KeyValue { key, value } = self {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

fn digit_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

/// Read a quoted string out of the byte stream.
///
/// Skips everything up to the first `"`, then consumes up to the next
/// unescaped `"`. Recognizes `\a \b \f \n \r \t \v`, octal escapes of up to
/// three digits, `\x` followed by hex digits (accumulated, then appended as
/// one byte), and any other escaped character as itself. Hitting the end of
/// the stream before the closing quote yields the empty string.
pub(crate) fn read_quoted(stream: &mut Peekable<Bytes<'_>>) -> String {
    loop {
        match stream.next() {
            None => return String::new(),
            Some(b'"') => break,
            Some(_) => {}
        }
    }

    let mut out: Vec<u8> = Vec::new();

    loop {
        let c = match stream.next() {
            None => return String::new(),
            Some(b'"') => break,
            Some(c) => c,
        };

        if c != b'\\' {
            out.push(c);
            continue;
        }

        let e0 = match stream.next() {
            None => return String::new(),
            Some(e) => e,
        };

        match e0 {
            b'a' => out.push(0x07),
            b'b' => out.push(0x08),
            b'f' => out.push(0x0c),
            b'n' => out.push(b'\n'),
            b'r' => out.push(b'\r'),
            b't' => out.push(b'\t'),
            b'v' => out.push(0x0b),
            b'0'..=b'7' => {
                let mut value = u32::from(e0 - b'0');
                for _ in 0..2 {
                    match stream.peek().copied().and_then(digit_value) {
                        Some(d) if d < 8 => {
                            stream.next();
                            value = (value << 3) | u32::from(d);
                        }
                        _ => break,
                    }
                }
                out.push(value as u8);
            }
            b'x' => {
                let mut value: u8 = 0;
                while let Some(d) = stream.peek().copied().and_then(digit_value) {
                    stream.next();
                    value = (value << 4) | d;
                }
                out.push(value);
            }
            other => out.push(other),
        }
    }

    String::from_utf8_lossy(&out).into_owned()
}

/// Parse the spelling of an `AnnotateAttr` cursor into an [`Attr`].
///
/// `@leon` is a flag; anything else is treated as a key/value marker whose
/// two quoted strings must both be non-empty.
pub(crate) fn parse_annotation(src: &str) -> Result<Attr, ReflectError> {
    let token = src.split_whitespace().next().unwrap_or("");
    if token == "@leon" {
        return Ok(Attr::Flag);
    }

    let mut stream = src.bytes().peekable();
    let key = read_quoted(&mut stream);
    let value = read_quoted(&mut stream);
    if key.is_empty() || value.is_empty() {
        return Err(ReflectError::MalformedKeyValue);
    }

    Ok(Attr::KeyValue { key, value })
}

/// Collect the attributes attached to a declaration's children.
pub(crate) fn collect_attrs(entity: Entity) -> Result<Vec<Attr>, ReflectError> {
    let mut attrs = Vec::new();
    for child in entity.get_children() {
        if child.get_kind() == EntityKind::AnnotateAttr {
            let src = child.get_name().unwrap_or_default();
            attrs.push(parse_annotation(&src)?);
        }
    }
    Ok(attrs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(src: &str) -> String {
        read_quoted(&mut src.bytes().peekable())
    }

    #[test]
    fn test_read_plain_string() {
        assert_eq!(read(r#"  "hello world" trailing"#), "hello world");
    }

    #[test]
    fn test_read_skips_to_first_quote() {
        assert_eq!(read(r#"@leonkv "key""#), "key");
    }

    #[test]
    fn test_read_simple_escapes() {
        assert_eq!(read(r#""a\nb\tc""#), "a\nb\tc");
        assert_eq!(read(r#""\a\b\f\v\r""#), "\x07\x08\x0c\x0b\r");
    }

    #[test]
    fn test_read_escaped_quote_and_backslash() {
        assert_eq!(read(r#""say \"hi\"""#), "say \"hi\"");
        assert_eq!(read(r#""a\\b""#), "a\\b");
    }

    #[test]
    fn test_read_octal_escapes() {
        assert_eq!(read(r#""\7""#), "\x07");
        assert_eq!(read(r#""\101""#), "A");
        // Two digits followed by a non-octal digit.
        assert_eq!(read(r#""\118""#), "\x098");
    }

    #[test]
    fn test_read_hex_escape() {
        assert_eq!(read(r#""\x41""#), "A");
        assert_eq!(read(r#""\x7a!""#), "z!");
    }

    #[test]
    fn test_read_unknown_escape_is_literal() {
        assert_eq!(read(r#""\q""#), "q");
    }

    #[test]
    fn test_read_unterminated_is_empty() {
        assert_eq!(read(r#""never closed"#), "");
        assert_eq!(read("no quote at all"), "");
        assert_eq!(read(r#""ends in escape\"#), "");
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_annotation("@leon").unwrap(), Attr::Flag);
    }

    #[test]
    fn test_parse_key_value() {
        let attr = parse_annotation(r#"@leonkv "type" "engine""#).unwrap();
        assert_eq!(attr.key_value(), Some(("type", "engine")));
    }

    #[test]
    fn test_parse_value_as_flag_shorthand() {
        // LEON_V(value) expands to @leonkv "<value>" "true".
        let attr = parse_annotation(r#"@leonkv "serialize" "true""#).unwrap();
        assert_eq!(attr.key_value(), Some(("serialize", "true")));
    }

    #[test]
    fn test_parse_malformed_key_value() {
        assert!(matches!(
            parse_annotation(r#"@leonkv "" "value""#),
            Err(ReflectError::MalformedKeyValue)
        ));
        assert!(matches!(
            parse_annotation(r#"@leonkv "key""#),
            Err(ReflectError::MalformedKeyValue)
        ));
        assert!(matches!(
            parse_annotation("@leonkv"),
            Err(ReflectError::MalformedKeyValue)
        ));
    }
}
