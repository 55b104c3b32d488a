// src/classifier/text.rs - Unicode-aware normalization and text-shape helpers

use std::collections::HashSet;

use regex::Regex;

/// Invisible code points stripped before most heuristics run: zero-width
/// spaces/joiners, variation selectors, the BOM, and the Unicode tag block
/// that chat clients use to append invisible suffixes.
fn is_invisible(c: char) -> bool {
    matches!(c as u32,
        0x200B..=0x200D | 0xFE00..=0xFE0F | 0xFEFF | 0xE0000..=0xE007F)
}

/// Remove invisible code points without touching any visible glyph.
/// Idempotent: stripping twice yields the same string.
pub fn strip_invisible(text: &str) -> String {
    text.chars().filter(|c| !is_invisible(*c)).collect()
}

/// Canonical form used by the dedup rules and most heuristics: invisible
/// code points removed, surrounding whitespace trimmed.
pub fn normalize(text: &str) -> String {
    strip_invisible(text).trim().to_string()
}

/// Code points rendered as standalone emoji: the supplemental symbol planes,
/// miscellaneous symbols, dingbats, and regional indicators.
pub fn is_emoji(c: char) -> bool {
    matches!(c as u32,
        0x1F000..=0x1FAFF
            | 0x1F1E6..=0x1F1FF
            | 0x2600..=0x26FF
            | 0x2700..=0x27BF
            | 0x2B00..=0x2BFF)
}

/// A token counts as emoji when every character is an emoji code point.
/// Pure-digit tokens must never be treated as emoji.
pub fn is_emoji_token(token: &str) -> bool {
    !token.is_empty()
        && !token.chars().all(|c| c.is_ascii_digit())
        && token.chars().all(is_emoji)
}

pub fn is_cyrillic(c: char) -> bool {
    ('\u{0400}'..='\u{04FF}').contains(&c)
}

/// The alphanumeric universe the heuristics reason over: ASCII letters and
/// digits plus the Cyrillic block.
pub fn is_chat_alphanumeric(c: char) -> bool {
    c.is_ascii_alphanumeric() || is_cyrillic(c)
}

/// Uppercase-letter ratio over all Unicode letters, or `None` when the text
/// carries fewer than `min_letters` letters.
pub fn uppercase_ratio(text: &str, min_letters: usize) -> Option<f64> {
    let letters = text.chars().filter(|c| c.is_alphabetic()).count();
    if letters < min_letters {
        return None;
    }
    let upper = text.chars().filter(|c| c.is_uppercase()).count();
    Some(upper as f64 / letters as f64)
}

/// Number of distinct characters in the text.
pub fn distinct_chars(text: &str) -> usize {
    text.chars().collect::<HashSet<_>>().len()
}

/// True when one alphanumeric character runs `min_run` or more times in a
/// row (other characters break the run).
pub fn has_repeated_char(text: &str, min_run: usize) -> bool {
    let mut prev = None;
    let mut run = 0usize;
    for c in text.chars().filter(|c| is_chat_alphanumeric(*c)) {
        if prev == Some(c) {
            run += 1;
        } else {
            prev = Some(c);
            run = 1;
        }
        if run >= min_run {
            return true;
        }
    }
    false
}

/// Detect a 2-3 character group repeating three or more times back to back
/// ("хахаха", "lolol"). The regex crate has no backreferences, so this is a
/// direct scan.
pub fn has_repeated_group(text: &str) -> bool {
    let chars: Vec<char> = text.chars().collect();
    for width in 2..=3usize {
        if chars.len() < width * 3 {
            continue;
        }
        'starts: for start in 0..=chars.len() - width * 3 {
            let group = &chars[start..start + width];
            for rep in 1..3 {
                let offset = start + rep * width;
                if chars[offset..offset + width] != *group {
                    continue 'starts;
                }
            }
            return true;
        }
    }
    false
}

const VOWELS: &str = "аеиоуієїяюaeiou";
const CONSONANTS: &str = "бвгґджзйклмнпрстфхцчшщbcdfghjklmnpqrstvwxyz";

/// Count vowel and consonant characters across the Latin and Ukrainian
/// Cyrillic alphabets, case-insensitively.
pub fn vowel_consonant_counts(text: &str) -> (usize, usize) {
    let mut vowels = 0;
    let mut consonants = 0;
    for c in text.chars().flat_map(|c| c.to_lowercase()) {
        if VOWELS.contains(c) {
            vowels += 1;
        } else if CONSONANTS.contains(c) {
            consonants += 1;
        }
    }
    (vowels, consonants)
}

/// Allow-list check for the foreign-alphabet rule: Latin and Cyrillic
/// letters, the Ukrainian apostrophe, digits, whitespace, punctuation and
/// symbol categories, and the emoji planes. Anything else is foreign.
pub fn has_foreign_chars(text: &str) -> bool {
    match Regex::new(r"[^a-zA-Z\u{0400}-\u{04FF}ʼ0-9\s\p{P}\p{S}\u{1F000}-\u{1FAFF}]") {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// `!command` shape: `!` followed by letters/digits/underscore from the
/// supported alphabets. Caller trims first.
pub fn is_command(text: &str) -> bool {
    match Regex::new(r"^![a-zA-Z\u{0400}-\u{04FF}0-9_]+") {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

/// URL-like shape: an explicit scheme or a `word.word/path` token.
pub fn has_link(text: &str) -> bool {
    match Regex::new(r"(?i)(https?://\S+|\w+\.\w+/\S+)") {
        Ok(re) => re.is_match(text),
        Err(_) => false,
    }
}

const MENTION_PATTERN: &str = r"@([A-Za-z0-9_]+)";

/// All `@name` mentions, lowercased.
pub fn find_mentions(text: &str) -> Vec<String> {
    match Regex::new(MENTION_PATTERN) {
        Ok(re) => re
            .captures_iter(text)
            .map(|caps| caps[1].to_lowercase())
            .collect(),
        Err(_) => Vec::new(),
    }
}

/// The text with all `@name` mentions removed.
pub fn strip_mentions(text: &str) -> String {
    match Regex::new(MENTION_PATTERN) {
        Ok(re) => re.replace_all(text, "").into_owned(),
        Err(_) => text.to_string(),
    }
}

/// Letter-runs of the lowercased text, so words adjacent to punctuation
/// still match vocabulary entries. Unicode letter class, not whitespace
/// splitting.
pub fn letter_words(text: &str) -> Vec<String> {
    let lowered = text.to_lowercase();
    match Regex::new(r"\p{L}+") {
        Ok(re) => re
            .find_iter(&lowered)
            .map(|m| m.as_str().to_string())
            .collect(),
        Err(_) => Vec::new(),
    }
}
