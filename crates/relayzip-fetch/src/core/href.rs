//! Anchor href extraction.
//!
//! A small start-tag tokenizer rather than a full HTML parser. It walks the
//! page tag by tag, honouring quoted attribute values, and skips comments
//! and the bodies of `<script>` and `<style>`. That is all the index pages
//! we scan ever need.

use std::borrow::Cow;

use crate::data::LinkPattern;

/// Collect every anchor href on `html` that matches `pattern`, in page order.
///
/// Each anchor counts once, so a page linking the same file twice yields two
/// entries. Character references in the attribute value are decoded before
/// matching.
pub fn extract_hrefs(html: &str, pattern: &LinkPattern) -> Vec<String> {
    StartTags::new(html)
        .filter(|tag| tag.name.eq_ignore_ascii_case("a"))
        .filter_map(|tag| tag.href)
        .map(|raw| decode_entities(raw).into_owned())
        .filter(|href| pattern.is_match(href))
        .collect()
}

struct StartTag<'a> {
    name: &'a str,
    /// First `href` attribute; an attribute without a value reads as empty.
    href: Option<&'a str>,
}

/// Iterator over the start tags of a page.
struct StartTags<'a> {
    html: &'a str,
    pos: usize,
}

impl<'a> StartTags<'a> {
    fn new(html: &'a str) -> Self {
        Self { html, pos: 0 }
    }

    /// Parse the start tag whose `<` is at `self.pos` and move past its `>`.
    fn start_tag(&mut self) -> StartTag<'a> {
        let html = self.html;
        let bytes = html.as_bytes();
        let len = bytes.len();

        let mut i = self.pos + 1;
        let name_start = i;
        while i < len && !is_tag_space(bytes[i]) && !matches!(bytes[i], b'>' | b'/') {
            i += 1;
        }
        let name = &html[name_start..i];

        let mut href = None;
        loop {
            while i < len && (is_tag_space(bytes[i]) || bytes[i] == b'/') {
                i += 1;
            }
            if i >= len {
                break;
            }
            if bytes[i] == b'>' {
                i += 1;
                break;
            }

            // A leading `=` belongs to the attribute name.
            let attr_start = i;
            while i < len
                && (i == attr_start
                    || !(is_tag_space(bytes[i]) || matches!(bytes[i], b'>' | b'/' | b'=')))
            {
                i += 1;
            }
            let attr = &html[attr_start..i];

            while i < len && is_tag_space(bytes[i]) {
                i += 1;
            }
            let mut value = None;
            if i < len && bytes[i] == b'=' {
                i += 1;
                while i < len && is_tag_space(bytes[i]) {
                    i += 1;
                }
                match bytes.get(i) {
                    Some(&quote @ (b'"' | b'\'')) => {
                        let start = i + 1;
                        let end = html[start..]
                            .find(char::from(quote))
                            .map_or(len, |at| start + at);
                        value = Some(&html[start..end]);
                        i = (end + 1).min(len);
                    }
                    _ => {
                        let start = i;
                        while i < len && !is_tag_space(bytes[i]) && bytes[i] != b'>' {
                            i += 1;
                        }
                        value = Some(&html[start..i]);
                    }
                }
            }

            if href.is_none() && attr.eq_ignore_ascii_case("href") {
                href = Some(value.unwrap_or(""));
            }
        }

        self.pos = i;
        StartTag { name, href }
    }

    /// Jump to the closing tag of a raw-text element, or to the end.
    fn skip_raw_text(&mut self, name: &str) {
        let closing = format!("</{}", name.to_ascii_lowercase());
        let rest = self.html[self.pos..].to_ascii_lowercase();
        self.pos = rest.find(&closing).map_or(self.html.len(), |at| self.pos + at);
    }
}

impl<'a> Iterator for StartTags<'a> {
    type Item = StartTag<'a>;

    fn next(&mut self) -> Option<StartTag<'a>> {
        loop {
            let lt = self.html[self.pos..].find('<')?;
            self.pos += lt;
            let rest = &self.html[self.pos..];

            if let Some(comment) = rest.strip_prefix("<!--") {
                self.pos = comment
                    .find("-->")
                    .map_or(self.html.len(), |end| self.pos + 4 + end + 3);
                continue;
            }

            if rest.as_bytes().get(1).is_some_and(u8::is_ascii_alphabetic) {
                let tag = self.start_tag();
                if tag.name.eq_ignore_ascii_case("script") || tag.name.eq_ignore_ascii_case("style") {
                    self.skip_raw_text(tag.name);
                }
                return Some(tag);
            }

            // End tags, doctypes and stray `<`
            self.pos += 1;
        }
    }
}

fn is_tag_space(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0c')
}

fn decode_entities(value: &str) -> Cow<'_, str> {
    if !value.contains('&') {
        return Cow::Borrowed(value);
    }
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = rest.find(';').and_then(|end| {
            let ch = match &rest[1..end] {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                num if num.starts_with("#x") || num.starts_with("#X") => {
                    u32::from_str_radix(&num[2..], 16).ok().and_then(char::from_u32)
                }
                num if num.starts_with('#') => num[1..].parse().ok().and_then(char::from_u32),
                _ => None,
            };
            ch.map(|c| (c, end))
        });
        match decoded {
            Some((c, end)) => {
                out.push(c);
                rest = &rest[end + 1..];
            }
            None => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
