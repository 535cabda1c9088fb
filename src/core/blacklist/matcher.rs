// Blacklist matcher - finds the first blacklisted word in a piece of text.
//
// A word matches when it appears with a non-letter (or the edge of the text)
// on both sides, ignoring case. Every word is tried twice: once against the
// raw text and once against the text with all ASCII punctuation removed, so
// "b.a.d" is caught as "bad". Whitespace is left alone, so "b a d" is not.

use regex::Regex;

/// Search `text` for the words of a blacklist, in list order.
///
/// Returns the first word that matches in either pass.
pub fn search<'w>(words: &'w [String], text: &str) -> Option<&'w str> {
    if text.is_empty() {
        return None;
    }

    let collapsed = strip_punctuation(text);

    words.iter().map(String::as_str).find(|word| {
        match word_pattern(word) {
            Some(pattern) => pattern.is_match(text) || pattern.is_match(&collapsed),
            None => false,
        }
    })
}

/// Remove every ASCII punctuation character, keeping everything else in place.
pub fn strip_punctuation(text: &str) -> String {
    text.chars().filter(|c| !c.is_ascii_punctuation()).collect()
}

/// Build the boundary pattern for one word. The word is matched literally.
fn word_pattern(word: &str) -> Option<Regex> {
    if word.is_empty() {
        return None;
    }

    let source = format!("(?i)(?:[^a-zA-Z]|^)(?:{})(?:[^a-zA-Z]|$)", regex::escape(word));
    match Regex::new(&source) {
        Ok(pattern) => Some(pattern),
        Err(e) => {
            // Only reachable for words that blow the regex size limit
            tracing::warn!(word, "Skipping blacklisted word that cannot be matched: {}", e);
            None
        }
    }
}
