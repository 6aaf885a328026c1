/// Minimal HTML escaping for serialized markup.
///
/// Text escapes `&`, `<`, `>`; attribute values additionally escape `"`.
/// Single quotes are left alone because attributes are always written
/// double-quoted.
pub fn escape_text(text: &str) -> String {
    escape(text, false)
}

pub fn escape_attr(value: &str) -> String {
    escape(value, true)
}

fn escape(s: &str, quotes: bool) -> String {
    let mut out = String::with_capacity(s.len());
    let mut copy_start = 0;
    for (i, b) in s.bytes().enumerate() {
        let replacement = match b {
            b'&' => "&amp;",
            b'<' => "&lt;",
            b'>' => "&gt;",
            b'"' if quotes => "&quot;",
            _ => continue,
        };
        out.push_str(&s[copy_start..i]);
        out.push_str(replacement);
        copy_start = i + 1;
    }
    out.push_str(&s[copy_start..]);
    out
}
