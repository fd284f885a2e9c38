//! Locates the boundary between a document's prolog and its root element.
//!
//! Everything before the root start tag (XML declaration, DOCTYPE with an
//! optional internal subset, comments, processing instructions and the
//! whitespace between them) is kept verbatim as the `header`. The root start
//! tag itself is captured as written so the serializer can put it back
//! untouched.

use crate::error::{DocManagerError, Result};
use once_cell::sync::Lazy;
use regex::Regex;

const SPACE: &str = r"[ \t\r\n]";
const NAME: &str = r"[a-zA-Z_:][-a-zA-Z0-9._:]*";
const QUOTED: &str = r#"(?:'[^']*'|"[^"]*")"#;

static ANY_START_TAG: Lazy<Regex> =
    Lazy::new(|| start_tag_regex(None).expect("start tag pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub header: String,
    pub root_tag: String,
    pub root_markup: String,
    pub offset: usize,
}

impl Envelope {
    /// The part of `text` that follows the header.
    pub fn body<'a>(&self, text: &'a str) -> &'a str {
        &text[self.offset..]
    }
}

/// Builds the start-tag grammar, optionally pinned to one tag name.
///
/// The match is anchored at the start of the haystack.
pub fn start_tag_regex(tag: Option<&str>) -> Result<Regex> {
    let name = match tag {
        Some(tag) => regex::escape(tag),
        None => NAME.to_string(),
    };
    let value = r"[-a-zA-Z0-9.:+*%?!()_#=~]+";
    let attr = format!(
        "{SPACE}+{NAME}(?:{SPACE}*={SPACE}*(?:{QUOTED}|{value}))?",
        SPACE = SPACE,
        NAME = NAME,
        QUOTED = QUOTED,
        value = value
    );
    let pattern = format!(
        r"^<(?P<tagname>{name})(?P<attrs>(?:{attr})*){SPACE}*(?P<slash>/?)>",
        name = name,
        attr = attr,
        SPACE = SPACE
    );
    Regex::new(&pattern).map_err(|e| DocManagerError::Internal(e.to_string()))
}

/// Finds header, root tag name, root start tag markup and header length.
pub fn locate(text: &str) -> Result<Envelope> {
    let mut pos = 0;

    loop {
        pos += leading_space(&text[pos..]);
        let rest = &text[pos..];

        if rest.starts_with("<?") {
            pos += skip_past(rest, "?>")
                .ok_or_else(|| malformed("unterminated processing instruction"))?;
        } else if rest.starts_with("<!--") {
            pos += skip_past(rest, "-->").ok_or_else(|| malformed("unterminated comment"))?;
        } else if rest.starts_with("<!DOCTYPE") {
            pos += doctype_len(rest)?;
        } else if let Some(caps) = ANY_START_TAG.captures(rest) {
            let markup = caps.get(0).map(|m| m.as_str()).unwrap_or_default();
            let root_tag = caps
                .name("tagname")
                .map(|m| m.as_str())
                .unwrap_or_default();
            return Ok(Envelope {
                header: text[..pos].to_string(),
                root_tag: root_tag.to_string(),
                root_markup: markup.to_string(),
                offset: pos,
            });
        } else {
            return Err(malformed("no root start tag found"));
        }
    }
}

fn malformed(reason: &str) -> DocManagerError {
    DocManagerError::MalformedDocument(reason.to_string())
}

fn leading_space(s: &str) -> usize {
    s.char_indices()
        .find(|(_, c)| !matches!(c, ' ' | '\t' | '\r' | '\n' | '\u{feff}'))
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

fn skip_past(s: &str, end: &str) -> Option<usize> {
    s.find(end).map(|i| i + end.len())
}

/// Length of a `<!DOCTYPE ...>` declaration at the start of `s`.
///
/// Brackets of the internal subset are balanced; quoted literals and comments
/// inside the subset do not count.
fn doctype_len(s: &str) -> Result<usize> {
    static DOCTYPE_NAME: Lazy<Regex> = Lazy::new(|| {
        Regex::new(&format!("^<!DOCTYPE{}+{}", SPACE, NAME)).expect("doctype pattern is valid")
    });
    let head = DOCTYPE_NAME
        .find(s)
        .ok_or_else(|| malformed("DOCTYPE without a name"))?;

    let bytes = s.as_bytes();
    let mut depth = 0usize;
    let mut quote: Option<u8> = None;
    let mut i = head.end();

    while i < bytes.len() {
        let b = bytes[i];
        if let Some(q) = quote {
            if b == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match b {
            b'"' | b'\'' => quote = Some(b),
            b'<' if depth > 0 && s[i..].starts_with("<!--") => {
                i += skip_past(&s[i..], "-->")
                    .ok_or_else(|| malformed("unterminated comment in DOCTYPE"))?;
                continue;
            }
            b'[' => depth += 1,
            b']' => depth = depth.saturating_sub(1),
            b'>' if depth == 0 => return Ok(i + 1),
            _ => {}
        }
        i += 1;
    }

    Err(malformed("unterminated DOCTYPE"))
}
