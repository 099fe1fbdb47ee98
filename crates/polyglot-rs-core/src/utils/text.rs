//! String utility functions.

use regex::Regex;
use std::sync::OnceLock;

/// Converts a string to a URL-friendly slug.
///
/// Converts to lowercase, removes non-alphanumeric characters (except hyphens,
/// underscores and spaces), replaces spaces with hyphens, and collapses
/// consecutive hyphens.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::utils::text::slugify;
///
/// assert_eq!(slugify("Hello World!"), "hello-world");
/// assert_eq!(slugify("  Spaced  Out  "), "spaced-out");
/// assert_eq!(slugify("pt_br"), "pt_br");
/// ```
pub fn slugify(s: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    static MULTI_HYPHEN: OnceLock<Regex> = OnceLock::new();

    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^\w\s-]").unwrap());
    let multi_hyphen = MULTI_HYPHEN.get_or_init(|| Regex::new(r"[-\s]+").unwrap());

    let s = s.to_lowercase();
    let s = non_alnum.replace_all(&s, "");
    let s = multi_hyphen.replace_all(&s, "-");
    let s = s.trim_matches('-');
    s.to_string()
}

/// Strips HTML tags from a string.
///
/// # Examples
///
/// ```
/// use polyglot_rs_core::utils::text::strip_tags;
///
/// assert_eq!(strip_tags("<b>Français</b>"), "Français");
/// ```
pub fn strip_tags(s: &str) -> String {
    static TAG_RE: OnceLock<Regex> = OnceLock::new();
    let tag_re = TAG_RE.get_or_init(|| Regex::new(r"<[^>]*>").unwrap());
    tag_re.replace_all(s, "").into_owned()
}
