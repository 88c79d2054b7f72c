//! Canonical identifiers for human-readable symbol text (enum names, value labels).

/// Characters rewritten before lowercasing. `Some('_')` substitutes, `None` deletes.
const SUBSTITUTIONS: &[(char, Option<char>)] = &[
    (' ', Some('_')),
    ('/', Some('_')),
    ('[', None),
    (']', None),
    ('(', None),
    (')', None),
    ('-', Some('_')),
    (':', None),
    ('.', None),
    (',', None),
    ('=', None),
    ('>', None),
    ('#', None),
    ('&', None),
    ('*', None),
    ('"', None),
    ('+', None),
    ('\'', None),
];

/// Converts arbitrary symbol text into a lowercase identifier token.
///
/// Punctuation is substituted or dropped, and the result is prefixed with `_` when it would
/// otherwise not start with a letter. Text that strips down to nothing yields `"_"`.
pub fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 1);
    for ch in text.chars() {
        match SUBSTITUTIONS.iter().find(|(from, _)| *from == ch) {
            Some((_, Some(replacement))) => out.push(*replacement),
            Some((_, None)) => {}
            None => out.push(ch),
        }
    }
    if !out.chars().next().is_some_and(char::is_alphabetic) {
        out.insert(0, '_');
    }
    out.to_lowercase()
}
