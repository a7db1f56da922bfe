//! Character reference decoding for the tokenizer and escaping for the serializer.
//!
//! Decoding covers the full named-reference list (terminated and legacy
//! spellings) and semicolon-terminated numeric references. Malformed numerics
//! and unknown names are left verbatim.

use crate::entity_table::{MAX_LEGACY_LEN, MAX_NAME_LEN, NAMED_REFERENCES};

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Decodes character references in text content.
pub(crate) fn decode_entities(s: &str) -> String {
    decode(s, false)
}

/// Decodes character references in an attribute value.
///
/// A legacy name followed by an alphanumeric or `=` stays verbatim there
/// (`href="?a=1&copy=2"`).
pub(crate) fn decode_attribute(s: &str) -> String {
    decode(s, true)
}

fn decode(s: &str, in_attribute: bool) -> String {
    let bytes = s.as_bytes();
    let Some(first_amp) = memchr::memchr(b'&', bytes) else {
        return s.to_string();
    };

    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first_amp]);
    let mut i = first_amp;

    while i < bytes.len() {
        if bytes[i] != b'&' {
            let next = memchr::memchr(b'&', &bytes[i..]).map_or(bytes.len(), |rel| i + rel);
            out.push_str(&s[i..next]);
            i = next;
            continue;
        }

        if let Some((value, consumed)) = decode_named(s, i, in_attribute) {
            out.push_str(value);
            i += consumed;
            continue;
        }

        if let Some((ch, consumed)) = decode_numeric(s, i) {
            out.push(ch);
            i += consumed;
            continue;
        }

        out.push('&');
        i += 1;
    }

    out
}

fn lookup(name: &str) -> Option<&'static str> {
    NAMED_REFERENCES
        .binary_search_by(|(key, _)| key.cmp(&name))
        .ok()
        .map(|idx| NAMED_REFERENCES[idx].1)
}

/// Decodes `&name;` or a legacy `&name` at `start`; returns the replacement
/// and the number of bytes consumed.
fn decode_named(s: &str, start: usize, in_attribute: bool) -> Option<(&'static str, usize)> {
    let bytes = s.as_bytes();
    let name_start = start + 1;
    let mut end = name_start;
    while end < bytes.len() && end - name_start < MAX_NAME_LEN && bytes[end].is_ascii_alphanumeric() {
        end += 1;
    }
    if end == name_start {
        return None;
    }

    if bytes.get(end) == Some(&b';') {
        if let Some(value) = lookup(&s[name_start..=end]) {
            return Some((value, end + 1 - start));
        }
    }

    // Longest legacy prefix of the run, e.g. `&notin` -> `¬` + `in`.
    let longest = (end - name_start).min(MAX_LEGACY_LEN);
    for len in (2..=longest).rev() {
        let name_end = name_start + len;
        let Some(value) = lookup(&s[name_start..name_end]) else {
            continue;
        };
        if in_attribute
            && bytes
                .get(name_end)
                .is_some_and(|b| b.is_ascii_alphanumeric() || *b == b'=')
        {
            return None;
        }
        return Some((value, name_end - start));
    }
    None
}

/// Decodes `&#NNN;` / `&#xHHHH;` starting at `start`; returns the char and the
/// number of bytes consumed. Malformed or out-of-range references yield `None`.
fn decode_numeric(s: &str, start: usize) -> Option<(char, usize)> {
    let bytes = s.as_bytes();
    let rest = bytes.get(start..)?;
    if !rest.starts_with(b"&#") {
        return None;
    }
    let is_hex = matches!(rest.get(2), Some(b'x' | b'X'));
    let digits_start = start + if is_hex { 3 } else { 2 };
    let max_digits = if is_hex { MAX_HEX_DIGITS } else { MAX_DEC_DIGITS };

    let mut end = digits_start;
    while end < bytes.len() && end - digits_start <= max_digits {
        let b = bytes[end];
        let ok = if is_hex {
            b.is_ascii_hexdigit()
        } else {
            b.is_ascii_digit()
        };
        if !ok {
            break;
        }
        end += 1;
    }
    let digits = end - digits_start;
    if digits == 0 || digits > max_digits || bytes.get(end) != Some(&b';') {
        return None;
    }

    let radix = if is_hex { 16 } else { 10 };
    let value = u32::from_str_radix(&s[digits_start..end], radix).ok()?;
    let ch = char::from_u32(value)?;
    Some((ch, end + 1 - start))
}

/// Escapes text content for serialization outside raw-text elements.
pub(crate) fn escape_text(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

/// Escapes a double-quoted attribute value.
pub(crate) fn escape_attr(value: &str, out: &mut String) {
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\u{00A0}' => out.push_str("&nbsp;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_named_entities() {
        assert_eq!(decode_entities("a &amp; b"), "a & b");
        assert_eq!(decode_entities("&lt;tag&gt;"), "<tag>");
        assert_eq!(decode_entities("&quot;hi&quot; &apos;x&apos;"), "\"hi\" 'x'");
        assert_eq!(decode_entities("a&nbsp;b"), "a\u{00A0}b");
        assert_eq!(decode_entities("&copy; 2024 &mdash; &laquo;x&raquo;"), "\u{A9} 2024 \u{2014} \u{AB}x\u{BB}");
        assert_eq!(decode_entities("&NotNestedGreaterGreater;"), "\u{2AA2}\u{338}");
    }

    #[test]
    fn legacy_names_decode_without_semicolon() {
        assert_eq!(decode_entities("&copy 2024"), "\u{A9} 2024");
        assert_eq!(decode_entities("&amp"), "&");
        assert_eq!(decode_entities("&notin;"), "\u{2209}");
        assert_eq!(decode_entities("&notit;"), "\u{AC}it;");
    }

    #[test]
    fn attributes_keep_legacy_names_before_alphanumerics_and_equals() {
        assert_eq!(decode_attribute("?a=1&copy=2"), "?a=1&copy=2");
        assert_eq!(decode_attribute("?a=1&copyx"), "?a=1&copyx");
        assert_eq!(decode_attribute("&copy 2024"), "\u{A9} 2024");
        assert_eq!(decode_attribute("x &amp; y"), "x & y");
    }

    #[test]
    fn decodes_numeric_references() {
        assert_eq!(decode_entities("&#215;"), "×");
        assert_eq!(decode_entities("&#xD7;"), "×");
        assert_eq!(decode_entities("&#x10FFFF;"), "\u{10FFFF}");
    }

    #[test]
    fn leaves_unknown_and_malformed_references_alone() {
        for s in [
            "&",
            "&&",
            "&;",
            "&#;",
            "&#x;",
            "&unknown;",
            "&T",
            "&#xZZ;",
            "&#xD800;",
            "&#x110000;",
            "&#99999999;",
            "&#215 ",
        ] {
            assert_eq!(decode_entities(s), s, "input {s:?}");
        }
    }

    #[test]
    fn keeps_utf8_between_references() {
        assert_eq!(decode_entities("π &amp; σ"), "π & σ");
        assert_eq!(decode_entities("&#xZZ;&amp;"), "&#xZZ;&");
    }

    #[test]
    fn escaping_reverses_decoding_for_markup_characters() {
        let mut text = String::new();
        escape_text("a < b & c > d", &mut text);
        assert_eq!(text, "a &lt; b &amp; c &gt; d");
        assert_eq!(decode_entities(&text), "a < b & c > d");

        let mut attr = String::new();
        escape_attr("say \"hi\" & go", &mut attr);
        assert_eq!(attr, "say &quot;hi&quot; &amp; go");
    }

    #[test]
    fn no_break_space_is_written_as_a_reference() {
        let mut text = String::new();
        escape_text("120\u{00A0}mm", &mut text);
        assert_eq!(text, "120&nbsp;mm");

        let mut attr = String::new();
        escape_attr("a\u{00A0}b", &mut attr);
        assert_eq!(attr, "a&nbsp;b");
    }

    #[test]
    fn table_is_sorted_for_binary_search() {
        assert!(NAMED_REFERENCES.windows(2).all(|w| w[0].0 < w[1].0));
    }
}
