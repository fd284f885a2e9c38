//! Reversible protection of entity references for the strict XML parser.
//!
//! `&name;` becomes `[[[name]]]` before parsing and is restored on output.
//! Numeric character references are left alone by [`encode`]; the loader
//! guards them separately with [`protect_char_refs`] so the tree library does
//! not expand them into literal characters. [`decode`] restores both forms.
//! Values handed out to callers go through [`resolve`] instead, which turns
//! the predefined entities and character references into the characters
//! they stand for.
//!
//! Text that already contains `[[[...]]]` is not escaped and will come back
//! as an entity reference after a write.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::borrow::Cow;

static NAMED_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([\w.-]+);").expect("entity pattern is valid"));
static CHAR_REF: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]+|#x[0-9a-fA-F]+);").expect("char ref pattern is valid")
});
static BRACKETED: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\[\[(#?[\w.-]+)\]\]\]").expect("bracket pattern is valid"));

pub fn encode(text: &str) -> Cow<'_, str> {
    NAMED_REF.replace_all(text, "[[[$1]]]")
}

pub fn protect_char_refs(text: &str) -> Cow<'_, str> {
    CHAR_REF.replace_all(text, "[[[$1]]]")
}

pub fn decode(text: &str) -> Cow<'_, str> {
    BRACKETED.replace_all(text, "&$1;")
}

/// Like [`decode`], but yields characters where the reference has a fixed meaning.
///
/// Entities declared by the document keep their `&name;` form.
pub fn resolve(text: &str) -> Cow<'_, str> {
    BRACKETED.replace_all(text, |caps: &Captures| {
        let name = &caps[1];
        match predefined(name).or_else(|| char_ref(name)) {
            Some(c) => c.to_string(),
            None => format!("&{};", name),
        }
    })
}

fn predefined(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

fn char_ref(name: &str) -> Option<char> {
    let number = name.strip_prefix('#')?;
    let code = match number.strip_prefix('x') {
        Some(hex) => u32::from_str_radix(hex, 16).ok()?,
        None => number.parse().ok()?,
    };
    char::from_u32(code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn named_entities_round_trip() {
        let encoded = encode("a &welt; b");
        assert_eq!(encoded, "a [[[welt]]] b");
        assert_eq!(decode(&encoded), "a &welt; b");
    }

    #[test]
    fn names_may_contain_dots_dashes_and_underscores() {
        let text = "&suse-prod.name_x; and &amp;";
        assert_eq!(encode(text), "[[[suse-prod.name_x]]] and [[[amp]]]");
        assert_eq!(decode(&encode(text)), text);
    }

    #[test]
    fn numeric_references_pass_through_encode() {
        assert_eq!(encode("x&#160;y&#x20AC;"), "x&#160;y&#x20AC;");
    }

    #[test]
    fn char_refs_are_guarded_and_restored() {
        let guarded = protect_char_refs("x&#160;y&#x20AC;&nbsp;");
        assert_eq!(guarded, "x[[[#160]]]y[[[#x20AC]]]&nbsp;");
        assert_eq!(decode(&guarded), "x&#160;y&#x20AC;&nbsp;");
    }

    #[test]
    fn resolve_expands_fixed_references_only() {
        let source = "R&amp;D &lt;team&gt; &quot;x&apos; &product;";
        let stored = protect_char_refs(&encode(source)).into_owned();
        assert_eq!(resolve(&stored), "R&D <team> \"x' &product;");

        let stored = protect_char_refs("A&#160;B&#x20AC;").into_owned();
        assert_eq!(resolve(&stored), "A\u{a0}B\u{20ac}");
    }

    #[test]
    fn invalid_char_refs_stay_references() {
        assert_eq!(resolve("[[[#xD800]]] [[[#99999999999]]]"), "&#xD800; &#99999999999;");
    }

    #[test]
    fn text_without_references_is_borrowed() {
        assert!(matches!(encode("plain"), Cow::Borrowed(_)));
        assert!(matches!(decode("plain"), Cow::Borrowed(_)));
        assert!(matches!(resolve("plain"), Cow::Borrowed(_)));
    }
}
