//! # Title Normalizer
//!
//! Reduces a title to the key used for index lookups. The same function runs
//! when titles are indexed and when a query title is looked up, so two titles
//! that normalize identically are indistinguishable to the index.
//!
//! Pipeline:
//! 1. Unicode compatibility decomposition, combining marks dropped, lowercase
//! 2. Character transliteration
//! 3. Decorative segment stripping (`[...]`, `{...}`, release-tag parentheses)
//! 4. Split on every non-alphanumeric character
//! 5. Word rules: media tags, numbering, stop words

use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Canonical comparison form of a title.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NormalizedKey(String);

impl NormalizedKey {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Empty keys are never indexed and never match.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for NormalizedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for NormalizedKey {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Normalizes a raw title into its lookup key.
///
/// Total and pure: never fails, worst case returns an empty key.
/// Idempotent: `normalize(normalize(x).as_str()) == normalize(x)`.
///
/// ```
/// use hakken_index::normalize;
///
/// assert_eq!(normalize("Steins;Gate"), normalize("steins gate"));
/// assert_eq!(normalize("COWBOY BEBOP").as_str(), "cowboy bebop");
/// ```
#[must_use]
pub fn normalize(raw: &str) -> NormalizedKey {
    let folded = fold(raw);
    let transliterated = transliterate(&folded);
    let undecorated = strip_decorations(&transliterated);
    let words = split_words(&undecorated);
    NormalizedKey(rewrite_words(words).join(" "))
}

// ── Unicode folding ───────────────────────────────────────────────────

/// NFKD folds width variants (`Ｆ` → `F`) and splits off diacritics, which
/// are then dropped (`é` → `e`).
fn fold(s: &str) -> String {
    s.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .collect::<String>()
        .to_lowercase()
}

// ── Transliteration ───────────────────────────────────────────────────

fn transliterate(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str(" and "),
            '@' => out.push('a'),
            '\u{00D7}' | '\u{2715}' | '\u{2716}' => out.push('x'), // ×, ✕, ✖
            // Apostrophes join rather than split: "JoJo's" → "jojos"
            '\'' | '`' | '\u{2018}' | '\u{2019}' | '\u{02BC}' => {}
            'æ' => out.push_str("ae"),
            'œ' => out.push_str("oe"),
            'ß' => out.push_str("ss"),
            'þ' => out.push_str("th"),
            'ø' => out.push('o'),
            'đ' | 'ð' => out.push('d'),
            'ł' => out.push('l'),
            c => out.push(c),
        }
    }
    out
}

// ── Decorative segments ───────────────────────────────────────────────

/// Bracket pairs whose content is filename decoration.
const BRACKETS: &[(char, char)] = &[('[', ']'), ('{', '}'), ('【', '】')];

/// Parenthesized content removed as a whole.
const RELEASE_TAGS: &[&str] = &[
    "tv",
    "ova",
    "ona",
    "oad",
    "oav",
    "special",
    "specials",
    "movie",
    "uncensored",
];

fn strip_decorations(s: &str) -> String {
    let without_brackets = remove_bracketed(s);
    // A title that is entirely bracketed ("[Oshi no Ko]") keeps its text
    let base = if without_brackets.chars().any(char::is_alphanumeric) {
        without_brackets
    } else {
        s.to_string()
    };
    strip_parenthesized_tags(&base)
}

fn remove_bracketed(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut closing: Option<char> = None;
    for c in s.chars() {
        match closing {
            Some(close) if c == close => {
                closing = None;
                out.push(' ');
            }
            Some(_) => {}
            None => match BRACKETS.iter().find(|(open, _)| *open == c) {
                Some(&(_, close)) => closing = Some(close),
                None => out.push(c),
            },
        }
    }
    out
}

fn strip_parenthesized_tags(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(open) = rest.find('(') {
        out.push_str(&rest[..open]);
        out.push(' ');
        let after = &rest[open + 1..];
        match after.find(')') {
            Some(close) => {
                let content = &after[..close];
                if !is_release_tag(content.trim()) {
                    out.push_str(content);
                    out.push(' ');
                }
                rest = &after[close + 1..];
            }
            None => rest = after,
        }
    }
    out.push_str(rest);
    out
}

/// Release-type markers and bare years/numbers: "(TV)", "(2011)".
fn is_release_tag(content: &str) -> bool {
    !content.is_empty()
        && (content.chars().all(|c| c.is_ascii_digit()) || RELEASE_TAGS.contains(&content))
}

// ── Word splitting ────────────────────────────────────────────────────

/// Splits on every run of non-alphanumeric characters.
fn split_words(s: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    for c in s.chars() {
        if is_combining_mark(c) {
            continue;
        }
        if c.is_alphanumeric() {
            current.push(c);
        } else if !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

// ── Word rules ────────────────────────────────────────────────────────

/// Resolution, codec, source and container words that leak into titles
/// when a release name was not fully split.
const MEDIA_TAGS: &[&str] = &[
    "x264", "x265", "h264", "h265", "hevc", "avc", "av1", "vp9", "xvid", "10bit", "8bit",
    "hi10p", "aac", "flac", "opus", "ac3", "eac3", "dts", "mp3", "truehd", "bd", "bdrip",
    "bdremux", "bluray", "webrip", "webdl", "hdtv", "dvdrip", "mkv", "mp4", "avi",
];

const RESOLUTIONS: &[&str] = &["360", "480", "540", "576", "720", "1080", "2160"];

/// Roman numerals converted to digits. Single letters are left alone
/// ("Hunter x Hunter").
const ROMAN_NUMERALS: &[(&str, u32)] = &[
    ("ii", 2),
    ("iii", 3),
    ("iv", 4),
    ("vi", 6),
    ("vii", 7),
    ("viii", 8),
    ("ix", 9),
    ("xi", 11),
    ("xii", 12),
    ("xiii", 13),
];

const STOP_WORDS: &[&str] = &["the", "season", "cour", "part", "tv"];

fn rewrite_words(words: Vec<String>) -> Vec<String> {
    let words = drop_unless_all(words, is_media_tag);
    let words = words
        .into_iter()
        .map(convert_numbering)
        .map(|word| season_number(&word).map(str::to_string).unwrap_or(word))
        .collect();
    drop_unless_all(words, |w| STOP_WORDS.contains(&w))
}

/// Drops matching words, unless every word matches: a title made only of
/// stop words ("The") or tags still needs a key.
fn drop_unless_all(words: Vec<String>, matches: impl Fn(&str) -> bool) -> Vec<String> {
    if words.iter().all(|w| matches(w.as_str())) {
        return words;
    }
    words.into_iter().filter(|w| !matches(w.as_str())).collect()
}

fn is_media_tag(word: &str) -> bool {
    MEDIA_TAGS.contains(&word) || is_resolution(word)
}

/// "1080p", "720i", "1920x1080"
fn is_resolution(word: &str) -> bool {
    if let Some(height) = word.strip_suffix(['p', 'i']) {
        return RESOLUTIONS.contains(&height);
    }
    word.split_once('x').is_some_and(|(w, h)| is_number(w) && is_number(h))
}

fn is_number(word: &str) -> bool {
    !word.is_empty() && word.chars().all(|c| c.is_ascii_digit())
}

/// Roman numerals and ordinals become plain numbers: "ii" → "2", "2nd" → "2".
fn convert_numbering(word: String) -> String {
    if let Some(&(_, value)) = ROMAN_NUMERALS.iter().find(|(roman, _)| *roman == word) {
        return value.to_string();
    }
    let ordinal = ["st", "nd", "rd", "th"]
        .iter()
        .find_map(|suffix| word.strip_suffix(*suffix))
        .filter(|number| is_number(number))
        .map(str::to_string);
    ordinal.unwrap_or(word)
}

/// "s2" → "2"
fn season_number(word: &str) -> Option<&str> {
    word.strip_prefix('s')
        .filter(|number| number.len() <= 2 && is_number(number))
}
