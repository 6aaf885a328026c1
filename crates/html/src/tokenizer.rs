//! Tolerant HTML tokenizer.
//!
//! Covers what server-rendered markup needs to survive a reparse: comments
//! (kept verbatim, since they carry provenance markers), doctype, start/end
//! tags with quoted or bare attributes, void elements, and rawtext
//! `<script>`/`<style>` bodies. Tag and attribute names are ASCII
//! `[A-Za-z0-9:_-]` and lowercased.
//!
//! Known limitations:
//! - No HTML5 parse-error recovery beyond skipping stray bytes.
//! - Rawtext close-tag scanning accepts only ASCII whitespace before `>`.
use crate::entities::decode_entities;
use memchr::{memchr, memmem};

const COMMENT_START: &[u8] = b"<!--";
const COMMENT_END: &[u8] = b"-->";

// Matches only start at ASCII `<`, which never occurs in a UTF-8 continuation byte.
const SCRIPT_CLOSE_TAG: &[u8] = b"</script";
const STYLE_CLOSE_TAG: &[u8] = b"</style";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Token {
    Doctype(String),
    StartTag {
        name: String,
        attributes: Vec<(String, Option<String>)>,
        self_closing: bool,
    },
    EndTag(String),
    Comment(String),
    Text(String),
}

pub fn is_void_element(name: &str) -> bool {
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

pub fn is_rawtext_element(name: &str) -> bool {
    name == "script" || name == "style"
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_' || b == b':'
}

fn starts_with_ignore_ascii_case_at(haystack: &[u8], start: usize, needle: &[u8]) -> bool {
    haystack
        .get(start..start + needle.len())
        .is_some_and(|s| s.eq_ignore_ascii_case(needle))
}

fn find_rawtext_close_tag(haystack: &str, close_tag: &[u8]) -> Option<(usize, usize)> {
    let bytes = haystack.as_bytes();
    let len = bytes.len();
    let n = close_tag.len();
    let mut i = 0;
    while i + n <= len {
        i += memchr(b'<', &bytes[i..])?;
        if i + n > len {
            return None;
        }
        if starts_with_ignore_ascii_case_at(bytes, i, close_tag) {
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

/// Streaming tokenizer over one input string.
///
/// Every slice boundary it cuts falls on an ASCII structural byte or after an
/// ASCII-only run, so slices stay on UTF-8 char boundaries.
pub struct Tokenizer<'a> {
    input: &'a str,
    pos: usize,
    // Set after a rawtext start tag; the next call yields its body and end tag.
    rawtext: Option<String>,
    pending: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(input: &'a str) -> Self {
        Self {
            input,
            pos: 0,
            rawtext: None,
            pending: None,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.input.as_bytes()
    }

    fn skip_whitespace(&mut self) {
        let bytes = self.bytes();
        while self.pos < bytes.len() && bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
    }

    fn scan_name(&mut self) -> &'a str {
        let bytes = self.bytes();
        let start = self.pos;
        while self.pos < bytes.len() && is_name_byte(bytes[self.pos]) {
            self.pos += 1;
        }
        debug_assert!(self.input.is_char_boundary(start));
        &self.input[start..self.pos]
    }

    fn text(&mut self) -> Option<Token> {
        let start = self.pos;
        let rel = memchr(b'<', &self.bytes()[start..]).unwrap_or(self.input.len() - start);
        self.pos = start + rel;
        let decoded = decode_entities(&self.input[start..self.pos]);
        (!decoded.is_empty()).then_some(Token::Text(decoded))
    }

    fn comment(&mut self) -> Token {
        let body_start = self.pos + COMMENT_START.len();
        let rest = &self.bytes()[body_start..];
        match memmem::find(rest, COMMENT_END) {
            Some(end) => {
                self.pos = body_start + end + COMMENT_END.len();
                Token::Comment(self.input[body_start..body_start + end].to_string())
            }
            None => {
                self.pos = self.input.len();
                Token::Comment(self.input[body_start..].to_string())
            }
        }
    }

    fn doctype(&mut self) -> Option<Token> {
        let rest = &self.input[self.pos + 2..];
        let end = rest.find('>')?;
        self.pos += 2 + end + 1;
        Some(Token::Doctype(rest[..end].trim().to_string()))
    }

    fn end_tag(&mut self) -> Token {
        self.pos += 2;
        let name = self.scan_name().to_ascii_lowercase();
        let bytes = self.bytes();
        match memchr(b'>', &bytes[self.pos..]) {
            Some(rel) => self.pos += rel + 1,
            None => self.pos = bytes.len(),
        }
        Token::EndTag(name)
    }

    fn attribute_value(&mut self) -> String {
        let bytes = self.bytes();
        let len = bytes.len();
        if self.pos < len && (bytes[self.pos] == b'"' || bytes[self.pos] == b'\'') {
            let quote = bytes[self.pos];
            self.pos += 1;
            let start = self.pos;
            let rel = memchr(quote, &bytes[start..]).unwrap_or(len - start);
            self.pos = start + rel;
            let raw = &self.input[start..self.pos];
            if self.pos < len {
                self.pos += 1;
            }
            return decode_entities(raw);
        }
        let start = self.pos;
        while self.pos < len && !bytes[self.pos].is_ascii_whitespace() && bytes[self.pos] != b'>'
        {
            if bytes[self.pos] == b'/' && bytes.get(self.pos + 1) == Some(&b'>') {
                break;
            }
            self.pos += 1;
        }
        decode_entities(&self.input[start..self.pos])
    }

    fn start_tag(&mut self) -> Token {
        self.pos += 1;
        let name = self.scan_name().to_ascii_lowercase();
        let mut attributes: Vec<(String, Option<String>)> = Vec::new();
        let mut self_closing = false;
        let len = self.input.len();

        loop {
            self.skip_whitespace();
            let bytes = self.bytes();
            if self.pos >= len {
                break;
            }
            match bytes[self.pos] {
                b'>' => {
                    self.pos += 1;
                    break;
                }
                b'/' => {
                    self.pos += 1;
                    if bytes.get(self.pos) == Some(&b'>') {
                        self.pos += 1;
                        self_closing = true;
                        break;
                    }
                    continue;
                }
                _ => {}
            }
            let attr_name = self.scan_name();
            if attr_name.is_empty() {
                // Skip the byte, then any continuation bytes, to stay on a char boundary.
                self.pos += 1;
                while self.pos < len && !self.input.is_char_boundary(self.pos) {
                    self.pos += 1;
                }
                continue;
            }
            let attr_name = attr_name.to_ascii_lowercase();
            self.skip_whitespace();
            let value = if self.bytes().get(self.pos) == Some(&b'=') {
                self.pos += 1;
                self.skip_whitespace();
                Some(self.attribute_value())
            } else {
                None
            };
            // First occurrence wins, as in a browser.
            if !attributes.iter().any(|(n, _)| *n == attr_name) {
                attributes.push((attr_name, value));
            }
        }

        if is_void_element(&name) {
            self_closing = true;
        }
        if is_rawtext_element(&name) && !self_closing {
            self.rawtext = Some(name.clone());
        }
        Token::StartTag {
            name,
            attributes,
            self_closing,
        }
    }

    fn rawtext_body(&mut self, name: String) -> Option<Token> {
        let close_tag = if name == "script" {
            SCRIPT_CLOSE_TAG
        } else {
            STYLE_CLOSE_TAG
        };
        let start = self.pos;
        let (body_end, next) = match find_rawtext_close_tag(&self.input[start..], close_tag) {
            Some((rel_start, rel_end)) => (start + rel_start, start + rel_end),
            // Missing close tag: the remainder is rawtext and the element closes implicitly.
            None => (self.input.len(), self.input.len()),
        };
        self.pos = next;
        let end = Token::EndTag(name);
        if body_end > start {
            self.pending = Some(end);
            Some(Token::Text(self.input[start..body_end].to_string()))
        } else {
            Some(end)
        }
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(token) = self.pending.take() {
            return Some(token);
        }
        if let Some(name) = self.rawtext.take() {
            return self.rawtext_body(name);
        }
        let bytes = self.bytes();
        while self.pos < bytes.len() {
            if bytes[self.pos] != b'<' {
                if let Some(token) = self.text() {
                    return Some(token);
                }
                continue;
            }
            if bytes[self.pos..].starts_with(COMMENT_START) {
                return Some(self.comment());
            }
            if starts_with_ignore_ascii_case_at(bytes, self.pos, b"<!doctype") {
                let token = self.doctype();
                if token.is_none() {
                    self.pos = bytes.len();
                }
                return token;
            }
            match bytes.get(self.pos + 1) {
                Some(b'/') => return Some(self.end_tag()),
                Some(b) if b.is_ascii_alphabetic() => return Some(self.start_tag()),
                _ => {
                    // A lone `<` is text.
                    let start = self.pos;
                    self.pos += 1;
                    let rel = memchr(b'<', &bytes[self.pos..]).unwrap_or(bytes.len() - self.pos);
                    self.pos += rel;
                    return Some(Token::Text(decode_entities(&self.input[start..self.pos])));
                }
            }
        }
        None
    }
}

pub fn tokenize(input: &str) -> Vec<Token> {
    let tokens: Vec<Token> = Tokenizer::new(input).collect();
    log::trace!(
        target: "html.tokenizer",
        "tokenized {} bytes into {} tokens",
        input.len(),
        tokens.len()
    );
    tokens
}
