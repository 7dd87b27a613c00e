//! Token and attribute helpers shared by the library readers.

use std::borrow::Cow;

use super::error::{ParseError, ParseResult};
use crate::xml::XmlNode;

/// Fetch a mandatory attribute.
pub fn required_attr<'a>(node: &'a XmlNode, name: &str) -> ParseResult<&'a str> {
    node.attribute(name)
        .ok_or_else(|| ParseError::missing(node.name(), name))
}

/// Fetch an optional unsigned attribute; present-but-garbage is an error.
pub fn uint_attr(node: &XmlNode, name: &str) -> ParseResult<Option<usize>> {
    match node.attribute(name) {
        Some(value) => parse_uint(value, node.name()).map(Some),
        None => Ok(None),
    }
}

/// Fetch a mandatory unsigned attribute.
pub fn required_uint_attr(node: &XmlNode, name: &str) -> ParseResult<usize> {
    let value = required_attr(node, name)?;
    parse_uint(value, node.name())
}

/// Fetch an optional signed attribute.
pub fn int_attr(node: &XmlNode, name: &str) -> ParseResult<Option<i64>> {
    match node.attribute(name) {
        Some(value) => value
            .trim()
            .parse::<i64>()
            .map(Some)
            .map_err(|_| invalid_number(node.name(), value)),
        None => Ok(None),
    }
}

pub fn parse_uint(value: &str, element: &str) -> ParseResult<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| invalid_number(element, value))
}

pub fn parse_float(value: &str, element: &str) -> ParseResult<f32> {
    let value = value.trim();
    value.parse::<f32>().map_err(|_| invalid_number(element, value))
}

/// Parse every whitespace separated float in `text`.
pub fn parse_floats(text: &str, element: &str) -> ParseResult<Vec<f32>> {
    text.split_ascii_whitespace()
        .map(|token| parse_float(token, element))
        .collect()
}

/// Read exactly `count` floats. Running short is an error; surplus tokens are ignored.
pub fn read_floats_exact(text: &str, count: usize, element: &str) -> ParseResult<Vec<f32>> {
    // Every value takes at least two bytes of text, separator included
    let mut values = Vec::with_capacity(count.min(text.len() / 2 + 1));
    let mut tokens = text.split_ascii_whitespace();
    for _ in 0..count {
        let token = tokens
            .next()
            .ok_or_else(|| ParseError::OutOfData(element.to_string()))?;
        values.push(parse_float(token, element)?);
    }
    Ok(values)
}

/// Read exactly `count` whitespace separated words.
pub fn read_strings_exact(text: &str, count: usize, element: &str) -> ParseResult<Vec<String>> {
    let mut tokens = text.split_ascii_whitespace();
    (0..count)
        .map(|_| {
            tokens
                .next()
                .map(str::to_string)
                .ok_or_else(|| ParseError::OutOfData(element.to_string()))
        })
        .collect()
}

/// Read a fixed-size float tuple from element text.
pub fn read_float_array<const N: usize>(node: &XmlNode) -> ParseResult<[f32; N]> {
    let values = read_floats_exact(node.text(), N, node.name())?;
    let mut out = [0.0; N];
    out.copy_from_slice(&values);
    Ok(out)
}

/// Parse an index stream. Negative tokens clamp to zero with a single warning.
pub fn parse_indices(text: &str, element: &str) -> ParseResult<Vec<usize>> {
    let mut clamped = 0usize;
    let mut indices = Vec::new();

    for token in text.split_ascii_whitespace() {
        let value = token
            .parse::<i64>()
            .map_err(|_| invalid_number(element, token))?;
        if value < 0 {
            clamped += 1;
            indices.push(0);
        } else {
            indices.push(value as usize);
        }
    }

    if clamped > 0 {
        log::warn!(
            "Collada: {} negative index value(s) in <{}> clamped to 0",
            clamped,
            element
        );
    }

    Ok(indices)
}

/// Parse a list of unsigned counts (e.g. `<vcount>`).
pub fn parse_uints(text: &str, element: &str) -> ParseResult<Vec<usize>> {
    text.split_ascii_whitespace()
        .map(|token| parse_uint(token, element))
        .collect()
}

/// Boolean text content: anything starting with `t`, `T` or `1` is true.
pub fn parse_bool(text: &str) -> bool {
    matches!(text.trim().chars().next(), Some('t' | 'T' | '1'))
}

/// Strip the leading `#` of a document-local URL.
pub fn local_url<'a>(url: &'a str, element: &str) -> ParseResult<&'a str> {
    url.strip_prefix('#')
        .ok_or_else(|| ParseError::bad_url(element, url))
}

/// Decode a file URI as written by exporters into a plain path.
///
/// Removes a `file://` scheme, the spurious slash in `/C:` style Windows
/// paths, and `%xx` escapes.
pub fn decode_uri(uri: &str) -> String {
    let mut bytes = uri.as_bytes();
    if let Some(rest) = bytes.strip_prefix(b"file://") {
        bytes = rest;
    }
    if bytes.len() >= 3 && bytes[0] == b'/' && bytes[1].is_ascii_alphabetic() && bytes[2] == b':' {
        bytes = &bytes[1..];
    }

    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hex = std::str::from_utf8(&bytes[i + 1..i + 3]).unwrap_or("");
            if let Ok(value) = u8::from_str_radix(hex, 16) {
                out.push(value);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    match String::from_utf8_lossy(&out) {
        Cow::Borrowed(s) => s.to_string(),
        Cow::Owned(s) => s,
    }
}

/// Decode a hex octet string (`<hex>` image payload).
pub fn decode_hex(text: &str, element: &str) -> ParseResult<Vec<u8>> {
    let digits: Vec<u8> = text.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    digits
        .chunks(2)
        .map(|pair| {
            let pair = std::str::from_utf8(pair).unwrap_or("");
            u8::from_str_radix(pair, 16).map_err(|_| invalid_number(element, pair))
        })
        .collect()
}

/// `authoring_tool` -> `AuthoringTool`.
pub fn camel_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len());
    let mut upper = true;
    for c in key.chars() {
        if c == '_' {
            upper = true;
            continue;
        }
        if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn invalid_number(element: &str, value: &str) -> ParseError {
    ParseError::InvalidNumber {
        element: element.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_floats_exact_whitespace() {
        let values = read_floats_exact("\n  1.0  2.5\t-3\n\n4e1 ", 4, "float_array").unwrap();
        assert_eq!(values, vec![1.0, 2.5, -3.0, 40.0]);
    }

    #[test]
    fn test_read_floats_exact_ignores_surplus() {
        let values = read_floats_exact("1 2 3 4", 2, "float_array").unwrap();
        assert_eq!(values, vec![1.0, 2.0]);
    }

    #[test]
    fn test_read_floats_exact_short_is_error() {
        let err = read_floats_exact("1 2", 3, "float_array").unwrap_err();
        assert!(matches!(err, ParseError::OutOfData(_)));
    }

    #[test]
    fn test_read_exact_huge_count_is_error() {
        assert!(matches!(
            read_floats_exact("1 2 3", usize::MAX, "float_array"),
            Err(ParseError::OutOfData(_))
        ));
        assert!(matches!(
            read_strings_exact("a b", usize::MAX, "Name_array"),
            Err(ParseError::OutOfData(_))
        ));
    }

    #[test]
    fn test_read_strings_exact() {
        let names = read_strings_exact(" joint0 joint1\njoint2 ", 3, "Name_array").unwrap();
        assert_eq!(names, vec!["joint0", "joint1", "joint2"]);
        assert!(read_strings_exact("a", 2, "Name_array").is_err());
    }

    #[test]
    fn test_parse_indices_clamps_negative() {
        let indices = parse_indices("0 -1 2 -7", "p").unwrap();
        assert_eq!(indices, vec![0, 0, 2, 0]);
    }

    #[test]
    fn test_parse_indices_rejects_garbage() {
        assert!(parse_indices("0 1 x", "p").is_err());
    }

    #[test]
    fn test_parse_bool() {
        assert!(parse_bool("true"));
        assert!(parse_bool(" 1"));
        assert!(!parse_bool("false"));
        assert!(!parse_bool(""));
    }

    #[test]
    fn test_local_url() {
        assert_eq!(local_url("#mesh-1", "instance_geometry").unwrap(), "mesh-1");
        assert!(local_url("mesh-1", "instance_geometry").is_err());
    }

    #[test]
    fn test_decode_uri() {
        assert_eq!(decode_uri("file:///C:/textures/My%20Image.png"), "C:/textures/My Image.png");
        assert_eq!(decode_uri("/home/user/tex.png"), "/home/user/tex.png");
        assert_eq!(decode_uri("tex%2"), "tex%2");
    }

    #[test]
    fn test_decode_hex() {
        assert_eq!(decode_hex("89504e47", "hex").unwrap(), vec![0x89, 0x50, 0x4e, 0x47]);
        assert!(decode_hex("zz", "hex").is_err());
    }

    #[test]
    fn test_camel_case() {
        assert_eq!(camel_case("authoring_tool"), "AuthoringTool");
        assert_eq!(camel_case("title"), "Title");
        assert_eq!(camel_case("source_data"), "SourceData");
    }
}
