//! Transliterating slugify
//!
//! Turns Russian titles into ASCII slugs: "Война и мир" becomes
//! `vojna-i-mir`. Characters that have no transliteration are dropped.

use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Cyrillic and typographic characters with their Latin replacements
const TRANSLIT_TABLE: &[(char, &str)] = &[
    ('‘', "'"),
    ('’', "'"),
    ('«', "\""),
    ('»', "\""),
    ('“', "\""),
    ('”', "\""),
    ('–', "-"),
    ('—', "-"),
    ('‒', "-"),
    ('−', "-"),
    ('…', "..."),
    ('№', "#"),
    ('щ', "sch"),
    ('ё', "yo"),
    ('ж', "zh"),
    ('ц', "ts"),
    ('ч', "ch"),
    ('ш', "sh"),
    ('ы', "yi"),
    ('ю', "yu"),
    ('я', "ya"),
    ('а', "a"),
    ('б', "b"),
    ('в', "v"),
    ('г', "g"),
    ('д', "d"),
    ('е', "e"),
    ('з', "z"),
    ('и', "i"),
    ('й', "j"),
    ('к', "k"),
    ('л', "l"),
    ('м', "m"),
    ('н', "n"),
    ('о', "o"),
    ('п', "p"),
    ('р', "r"),
    ('с', "s"),
    ('т', "t"),
    ('у', "u"),
    ('ф', "f"),
    ('х', "h"),
    ('ъ', "`"),
    ('ь', "'"),
    ('э', "e"),
    ('є', "ye"),
    ('і', "i"),
    ('ї', "yi"),
    ('ґ', "g"),
];

static TRANSLIT: Lazy<HashMap<char, &'static str>> =
    Lazy::new(|| TRANSLIT_TABLE.iter().copied().collect());

/// Whether a lowercased character survives the first filtering pass
fn in_alphabet(c: char) -> bool {
    TRANSLIT.contains_key(&c)
        || c.is_ascii_lowercase()
        || c.is_ascii_digit()
        || matches!(c, '-' | '\'' | '"' | '`' | '#')
}

/// Collapse every run of whitespace and hyphens into a single hyphen
fn collapse_separators(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_run = false;
    for c in input.chars() {
        if c == '-' || c.is_whitespace() {
            if !in_run {
                out.push('-');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out
}

/// Slugify `input`.
///
/// The result contains only ASCII lowercase letters, digits and hyphens.
/// It may be empty when nothing in the input can be transliterated.
pub fn slugify(input: &str) -> String {
    let lowered = input
        .to_lowercase()
        .replace("&amp;", " and ")
        .replace('&', " and ");

    let mut translified = String::with_capacity(lowered.len());
    for c in collapse_separators(&lowered).chars().filter(|c| in_alphabet(*c)) {
        match TRANSLIT.get(&c) {
            Some(latin) => translified.push_str(latin),
            None => translified.push(c),
        }
    }

    translified
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .trim()
        .to_lowercase()
}

/// Slug for a note title, cut to `max_len` characters
pub fn slug_from_title(title: &str, max_len: usize) -> String {
    slugify(title).chars().take(max_len).collect()
}
