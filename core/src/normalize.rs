//! Token canonicalization shared by decoding, correction and prediction.
//!
//! Every dictionary key, n-gram context word and correction input passes
//! through `normalize`, which is what makes lookups case-insensitive.
use unicode_normalization::UnicodeNormalization;

/// Canonicalize a raw token.
///
/// - NFC-normalize and lowercase
/// - strip leading/trailing characters that are neither letters nor digits
///   (internal apostrophes survive: "don't" stays "don't")
/// - collapse runs of three or more identical letters to two ("soooo" -> "soo")
///
/// # Example
/// ```
/// use glide_core::normalize;
///
/// assert_eq!(normalize("Sooo!!"), "soo");
/// assert_eq!(normalize("don't"), "don't");
/// ```
pub fn normalize(token: &str) -> String {
    let lowered: String = token.nfc().collect::<String>().to_lowercase();
    let trimmed = lowered.trim_matches(|c: char| !c.is_alphanumeric());
    collapse_runs(trimmed)
}

fn collapse_runs(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev: Option<char> = None;
    let mut run = 0usize;
    for ch in s.chars() {
        if Some(ch) == prev {
            run += 1;
        } else {
            prev = Some(ch);
            run = 1;
        }
        if run <= 2 || !ch.is_alphabetic() {
            out.push(ch);
        }
    }
    out
}

/// True iff `token` is non-empty and every character is a letter (any script).
pub fn is_alphabetic(token: &str) -> bool {
    !token.is_empty() && token.chars().all(char::is_alphabetic)
}

/// Split text on whitespace and normalize each piece, dropping pieces that
/// normalize to nothing (bare punctuation).
pub fn tokenize(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(normalize)
        .filter(|t| !t.is_empty())
        .collect()
}

/// Split the text before the cursor into (finished words, word being typed).
///
/// The word being typed is the raw trailing run of non-whitespace characters;
/// it is empty when the text ends in whitespace.
///
/// # Example
/// ```
/// use glide_core::normalize::split_trailing;
///
/// let (prev, current) = split_trailing("I love yo");
/// assert_eq!(prev, vec!["i", "love"]);
/// assert_eq!(current, "yo");
///
/// let (prev, current) = split_trailing("good ");
/// assert_eq!(prev, vec!["good"]);
/// assert_eq!(current, "");
/// ```
pub fn split_trailing(text: &str) -> (Vec<String>, String) {
    if text.is_empty() || text.ends_with(char::is_whitespace) {
        return (tokenize(text), String::new());
    }
    match text.rfind(char::is_whitespace) {
        Some(idx) => {
            let (head, tail) = text.split_at(idx);
            (tokenize(head), tail.trim_start().to_string())
        }
        None => (Vec::new(), text.to_string()),
    }
}

/// Re-apply the capitalization pattern of `original` to `replacement`.
///
/// All-caps input yields an all-caps replacement; a leading capital is
/// carried over; anything else returns `replacement` unchanged.
pub fn match_case(original: &str, replacement: &str) -> String {
    let letters: Vec<char> = original.chars().filter(|c| c.is_alphabetic()).collect();
    if letters.len() > 1 && letters.iter().all(|c| c.is_uppercase()) {
        return replacement.to_uppercase();
    }
    match original.chars().next() {
        Some(first) if first.is_uppercase() => {
            let mut chars = replacement.chars();
            match chars.next() {
                Some(head) => head.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        }
        _ => replacement.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_elongation_and_punctuation() {
        assert_eq!(normalize("Sooo!!"), "soo");
        assert_eq!(normalize("soooooo"), "soo");
        assert_eq!(normalize("...Hello,"), "hello");
        assert_eq!(normalize("  Cool  "), "cool");
    }

    #[test]
    fn test_normalize_keeps_internal_apostrophe() {
        assert_eq!(normalize("don't"), "don't");
        assert_eq!(normalize("'quoted'"), "quoted");
    }

    #[test]
    fn test_normalize_keeps_digit_runs() {
        assert_eq!(normalize("1000"), "1000");
        assert_eq!(normalize("#42!"), "42");
    }

    #[test]
    fn test_normalize_other_scripts() {
        assert_eq!(normalize("Привет!"), "привет");
        assert_eq!(normalize("«Ёлка»"), "ёлка");
    }

    #[test]
    fn test_is_alphabetic() {
        assert!(is_alphabetic("run"));
        assert!(is_alphabetic("Straße"));
        assert!(!is_alphabetic("123"));
        assert!(!is_alphabetic(""));
        assert!(!is_alphabetic("don't"));
    }

    #[test]
    fn test_split_trailing() {
        let (prev, cur) = split_trailing("");
        assert!(prev.is_empty());
        assert_eq!(cur, "");

        let (prev, cur) = split_trailing("hel");
        assert!(prev.is_empty());
        assert_eq!(cur, "hel");

        let (prev, cur) = split_trailing("Thank you so much!! ");
        assert_eq!(prev, vec!["thank", "you", "so", "much"]);
        assert_eq!(cur, "");
    }

    #[test]
    fn test_match_case() {
        assert_eq!(match_case("Teh", "the"), "The");
        assert_eq!(match_case("TEH", "the"), "THE");
        assert_eq!(match_case("teh", "the"), "the");
    }
}
