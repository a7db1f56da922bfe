//! Lenient HTML tokenizer with a constrained, practical tag-name character set.
//!
//! Supported tag-name characters (ASCII only): `[A-Za-z0-9:_-]`.
//! Attribute names additionally accept `.`, `@` and `$` so that framework
//! attributes (`@click`, `x-on:submit.prevent`) survive a round trip.
//!
//! Known limitations (intentional):
//! - Not an HTML5 state machine: no implied end tags, no foster parenting.
//! - A `<` that does not start a tag, comment or doctype is kept as text.
//! - Rawtext close-tag scanning accepts only ASCII whitespace before `>` (see
//!   `find_rawtext_close_tag`).
//! - Duplicate attributes keep the first occurrence.
use crate::entities::{decode_attribute, decode_entities};
use crate::types::{Attributes, Token};
use memchr::memchr;

const HTML_COMMENT_START: &str = "<!--";
const HTML_COMMENT_END: &str = "-->";

// Matches only start at ASCII '<', which never occurs inside a UTF-8 continuation byte.
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

pub(crate) fn is_void_element(name: &str) -> bool {
    matches!(
        name,
        "area"
            | "base"
            | "br"
            | "col"
            | "embed"
            | "hr"
            | "img"
            | "input"
            | "link"
            | "meta"
            | "param"
            | "source"
            | "track"
            | "wbr"
    )
}

pub(crate) fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

#[inline]
fn is_tag_name_char(c: u8) -> bool {
    c.is_ascii_alphanumeric() || c == b'-' || c == b'_' || c == b':'
}

#[inline]
fn is_attr_name_char(c: u8) -> bool {
    is_tag_name_char(c) || c == b'.' || c == b'@' || c == b'$'
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack.len() >= start + needle.len()
        && haystack[start..start + needle.len()].eq_ignore_ascii_case(needle)
}

/// Returns `(start, end)` of the first `</script\s*>` / `</style\s*>` in `haystack`.
fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = close_tag.len();
    debug_assert!(close_tag.starts_with(b"</"));
    let mut i = 0;
    while i + n <= len {
        i += memchr(b'<', &bytes[i..])?;
        if i + n > len {
            return None;
        }
        if bytes[i + 1] == b'/' && starts_with_ignore_ascii_case_at(bytes, i, close_tag) {
            let mut k = i + n;
            while k < len && bytes[k].is_ascii_whitespace() {
                k += 1;
            }
            if k < len && bytes[k] == b'>' {
                return Some((i, k + 1));
            }
        }
        i += 1;
    }
    None
}

/// Tokenizes `input` into a flat token list.
///
/// Tag and attribute names are ASCII-lowercased; text and attribute values have
/// character references decoded, except inside `<script>`/`<style>`.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokenizer = Tokenizer::new(input);
    tokenizer.run();
    log::trace!(target: "html.tokenizer", "tokenized {} bytes into {} tokens", input.len(), tokenizer.out.len());
    tokenizer.out
}

pub struct Tokenizer<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
    out: Vec<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            bytes: input.as_bytes(),
            pos: 0,
            out: Vec::new(),
        }
    }

    pub fn into_tokens(mut self) -> Vec<Token> {
        self.run();
        self.out
    }

    fn run(&mut self) {
        // Invariant: slice endpoints are only ever placed on ASCII structural bytes,
        // so they always fall on UTF-8 char boundaries.
        let mut text_start = 0;
        while self.pos < self.bytes.len() {
            let Some(rel) = memchr(b'<', &self.bytes[self.pos..]) else {
                self.pos = self.bytes.len();
                break;
            };
            let lt = self.pos + rel;
            self.pos = lt;
            if !self.starts_markup(lt) {
                // Stray '<': keep it as part of the surrounding text run.
                self.pos = lt + 1;
                continue;
            }
            self.flush_text(text_start, lt);
            self.markup();
            text_start = self.pos;
        }
        self.flush_text(text_start, self.bytes.len());
    }

    fn starts_markup(&self, lt: usize) -> bool {
        match self.bytes.get(lt + 1) {
            Some(b'!') | Some(b'?') => true,
            Some(b'/') => self.bytes.get(lt + 2).is_some_and(|b| is_tag_name_char(*b)),
            Some(b) => b.is_ascii_alphabetic(),
            None => false,
        }
    }

    fn flush_text(&mut self, start: usize, end: usize) {
        if start >= end {
            return;
        }
        debug_assert!(self.input.is_char_boundary(start));
        debug_assert!(self.input.is_char_boundary(end));
        let decoded = decode_entities(&self.input[start..end]);
        if !decoded.is_empty() {
            self.out.push(Token::Text(decoded));
        }
    }

    fn markup(&mut self) {
        let i = self.pos;
        if self.input[i..].starts_with(HTML_COMMENT_START) {
            self.comment();
        } else if starts_with_ignore_ascii_case_at(self.bytes, i, b"<!doctype") {
            self.doctype();
        } else if matches!(self.bytes[i + 1], b'!' | b'?') {
            self.bogus_comment();
        } else if self.bytes[i + 1] == b'/' {
            self.end_tag();
        } else {
            self.start_tag();
        }
    }

    fn comment(&mut self) {
        let body_start = self.pos + HTML_COMMENT_START.len();
        match self.input[body_start..].find(HTML_COMMENT_END) {
            Some(rel) => {
                let body_end = body_start + rel;
                self.out
                    .push(Token::Comment(self.input[body_start..body_end].to_string()));
                self.pos = body_end + HTML_COMMENT_END.len();
            }
            None => {
                self.out
                    .push(Token::Comment(self.input[body_start..].to_string()));
                self.pos = self.bytes.len();
            }
        }
    }

    fn doctype(&mut self) {
        let start = self.pos + 2;
        match memchr(b'>', &self.bytes[start..]) {
            Some(rel) => {
                self.out
                    .push(Token::Doctype(self.input[start..start + rel].trim().to_string()));
                self.pos = start + rel + 1;
            }
            None => self.pos = self.bytes.len(),
        }
    }

    /// `<!...>` and `<?...>` constructs that are neither comments nor doctypes.
    fn bogus_comment(&mut self) {
        let start = self.pos + 2;
        match memchr(b'>', &self.bytes[start..]) {
            Some(rel) => {
                self.out
                    .push(Token::Comment(self.input[start..start + rel].to_string()));
                self.pos = start + rel + 1;
            }
            None => {
                self.out.push(Token::Comment(self.input[start..].to_string()));
                self.pos = self.bytes.len();
            }
        }
    }

    fn scan_name(&self, start: usize, accept: fn(u8) -> bool) -> usize {
        let mut j = start;
        while j < self.bytes.len() && accept(self.bytes[j]) {
            j += 1;
        }
        j
    }

    fn end_tag(&mut self) {
        let start = self.pos + 2;
        let end = self.scan_name(start, is_tag_name_char);
        let name = self.input[start..end].to_ascii_lowercase();
        let close = memchr(b'>', &self.bytes[end..]).map_or(self.bytes.len(), |rel| end + rel + 1);
        self.out.push(Token::EndTag(name));
        self.pos = close;
    }

    fn start_tag(&mut self) {
        let start = self.pos + 1;
        let name_end = self.scan_name(start, is_tag_name_char);
        let name = self.input[start..name_end].to_ascii_lowercase();
        self.pos = name_end;

        let (attributes, mut self_closing) = self.attributes();
        if is_void_element(&name) {
            self_closing = true;
        }
        let rawtext = is_rawtext_element(&name) && !self_closing;
        self.out.push(Token::StartTag {
            name: name.clone(),
            attributes,
            self_closing,
        });

        if rawtext {
            self.rawtext(name);
        }
    }

    fn attributes(&mut self) -> (Attributes, bool) {
        let bytes = self.bytes;
        let len = bytes.len();
        let mut k = self.pos;
        let mut attributes: Attributes = Vec::new();
        let mut self_closing = false;

        let skip_whitespace = |k: &mut usize| {
            while *k < len && bytes[*k].is_ascii_whitespace() {
                *k += 1;
            }
        };

        loop {
            skip_whitespace(&mut k);
            if k >= len {
                break;
            }
            if bytes[k] == b'>' {
                k += 1;
                break;
            }
            if bytes[k] == b'/' {
                if k + 1 < len && bytes[k + 1] == b'>' {
                    self_closing = true;
                    k += 2;
                    break;
                }
                k += 1;
                continue;
            }
            let name_start = k;
            k = self.scan_name(k, is_attr_name_char);
            if name_start == k {
                k += 1;
                continue;
            }
            let attribute_name = self.input[name_start..k].to_ascii_lowercase();

            skip_whitespace(&mut k);
            let value = if k < len && bytes[k] == b'=' {
                k += 1;
                skip_whitespace(&mut k);
                Some(self.attribute_value(&mut k))
            } else {
                None
            };

            if !attributes.iter().any(|(existing, _)| *existing == attribute_name) {
                attributes.push((attribute_name, value));
            }
        }

        self.pos = k;
        (attributes, self_closing)
    }

    fn attribute_value(&self, k: &mut usize) -> String {
        let bytes = self.bytes;
        let len = bytes.len();
        if *k < len && (bytes[*k] == b'"' || bytes[*k] == b'\'') {
            let quote = bytes[*k];
            *k += 1;
            let vstart = *k;
            *k = memchr(quote, &bytes[vstart..]).map_or(len, |rel| vstart + rel);
            let raw = &self.input[vstart..*k];
            if *k < len {
                *k += 1;
            }
            return decode_attribute(raw);
        }
        let vstart = *k;
        while *k < len && !bytes[*k].is_ascii_whitespace() && bytes[*k] != b'>' {
            if bytes[*k] == b'/' && *k + 1 < len && bytes[*k + 1] == b'>' {
                break;
            }
            *k += 1;
        }
        decode_attribute(&self.input[vstart..*k])
    }

    fn rawtext(&mut self, name: String) {
        let close_tag = if name == "script" {
            SCRIPT_CLOSE_TAG
        } else {
            STYLE_CLOSE_TAG
        };
        let body_start = self.pos;
        match find_rawtext_close_tag(&self.input[body_start..], close_tag) {
            Some((rel_start, rel_end)) => {
                let raw = &self.input[body_start..body_start + rel_start];
                if !raw.is_empty() {
                    self.out.push(Token::Text(raw.to_string()));
                }
                self.out.push(Token::EndTag(name));
                self.pos = body_start + rel_end;
            }
            None => {
                // Missing close tag: the remainder is rawtext, closed implicitly.
                let raw = &self.input[body_start..];
                if !raw.is_empty() {
                    self.out.push(Token::Text(raw.to_string()));
                }
                self.out.push(Token::EndTag(name));
                self.pos = self.bytes.len();
            }
        }
    }
}
