/// Named references decoded by [`decode_entities`]. Anything else passes through.
const NAMED: &[(&[u8], char)] = &[
    (b"&amp;", '&'),
    (b"&lt;", '<'),
    (b"&gt;", '>'),
    (b"&quot;", '"'),
    (b"&apos;", '\''),
    (b"&#39;", '\''),
    (b"&nbsp;", '\u{00A0}'),
];

const MAX_HEX_DIGITS: usize = 6; // 0x10FFFF
const MAX_DEC_DIGITS: usize = 7; // 1114111

/// Decode a narrow, stable subset of character references.
///
/// - Named: `&amp;`, `&lt;`, `&gt;`, `&quot;`, `&apos;`, `&nbsp;`.
/// - Numeric, only when semicolon-terminated and a valid scalar value:
///   `&#215;`, `&#xD7;`.
/// - Everything else, including missing semicolons, is left unchanged.
///
/// Marker payloads rely on `&quot;` decoding here, since attribute values
/// carry JSON with escaped quotes.
pub(crate) fn decode_entities(s: &str) -> String {
    let bytes = s.as_bytes();
    let Some(first) = memchr::memchr(b'&', bytes) else {
        return s.to_string();
    };
    let mut out = String::with_capacity(s.len());
    out.push_str(&s[..first]);
    let mut i = first;

    while i < bytes.len() {
        let Some(rel) = memchr::memchr(b'&', &bytes[i..]) else {
            out.push_str(&s[i..]);
            break;
        };
        out.push_str(&s[i..i + rel]);
        i += rel;

        if let Some((pat, ch)) = NAMED.iter().find(|(pat, _)| bytes[i..].starts_with(pat)) {
            out.push(*ch);
            i += pat.len();
            continue;
        }
        if let Some((ch, consumed)) = numeric_reference(&bytes[i..]) {
            out.push(ch);
            i += consumed;
            continue;
        }
        out.push('&');
        i += 1;
    }
    out
}

// `&#215;` / `&#xD7;` -> (char, bytes consumed). Digit runs are bounded so
// adversarial input stays linear.
fn numeric_reference(bytes: &[u8]) -> Option<(char, usize)> {
    let rest = bytes.strip_prefix(b"&#")?;
    let (hex, digits_at, max) = match rest.first() {
        Some(b'x' | b'X') => (true, 3, MAX_HEX_DIGITS),
        _ => (false, 2, MAX_DEC_DIGITS),
    };
    let digits = bytes[digits_at..]
        .iter()
        .take(max + 1)
        .take_while(|b| if hex { b.is_ascii_hexdigit() } else { b.is_ascii_digit() })
        .count();
    if digits == 0 || digits > max || bytes.get(digits_at + digits) != Some(&b';') {
        return None;
    }
    // Digits are ASCII, so this cannot fail.
    let text = std::str::from_utf8(&bytes[digits_at..digits_at + digits]).ok()?;
    let value = u32::from_str_radix(text, if hex { 16 } else { 10 }).ok()?;
    Some((char::from_u32(value)?, digits_at + digits + 1))
}
